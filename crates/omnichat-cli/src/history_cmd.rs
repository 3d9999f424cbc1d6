//! `omnichat history` — manage the stored conversation transcript.

use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use clap::Subcommand;
use colored::Colorize;

use omnichat_core::store::HistoryStore;
use omnichat_core::types::Role;
use omnichat_core::utils::truncate_string;

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// Show the most recent messages
    Show {
        /// Maximum number of messages to display
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },

    /// Delete all messages
    Clear,

    /// Delete messages by role (user, assistant, system)
    ClearRole { role: String },

    /// Delete messages in an inclusive date range (YYYY-MM-DD)
    ClearRange { start: NaiveDate, end: NaiveDate },

    /// Delete one message by id
    ClearId { id: i64 },
}

pub fn dispatch(action: HistoryCommands, history: &HistoryStore) -> Result<()> {
    match action {
        HistoryCommands::Show { limit } => {
            let messages = history.recent(limit)?;
            if messages.is_empty() {
                println!("{}", "(no messages)".dimmed());
                return Ok(());
            }
            for msg in messages {
                let role = match msg.role {
                    Role::User => "user".green(),
                    Role::Assistant => "assistant".cyan(),
                    Role::System => "system".yellow(),
                };
                println!(
                    "{:>6}  {}  {:>9}  {}",
                    msg.id.unwrap_or_default(),
                    msg.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    role,
                    truncate_string(&msg.content, 80)
                );
            }
        }
        HistoryCommands::Clear => {
            history.clear()?;
            println!("History cleared.");
        }
        HistoryCommands::ClearRole { role } => {
            let role: Role = role
                .parse()
                .map_err(|e| anyhow!("{e} (expected user, assistant, or system)"))?;
            let count = history.clear_by_role(role)?;
            println!("Deleted {count} {role} message(s).");
        }
        HistoryCommands::ClearRange { start, end } => {
            let count = history.clear_by_date_range(start, end)?;
            println!("Deleted {count} message(s) between {start} and {end}.");
        }
        HistoryCommands::ClearId { id } => {
            if history.clear_by_id(id)? {
                println!("Deleted message {id}.");
            } else {
                println!("No message with id {id}.");
            }
        }
    }
    Ok(())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
