//! Interactive REPL — rustyline loop around the orchestrator.
//!
//! Persists exactly the user input and the final reply around each turn;
//! the orchestrator's mid-turn tool messages stay ephemeral.

use anyhow::Result;
use rustyline::config::Configurer;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use omnichat_core::types::Role;

use crate::helpers;
use crate::Runtime;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

/// Run the interactive REPL loop.
pub async fn run(runtime: &Runtime) -> Result<()> {
    helpers::print_banner();

    let mut editor = create_editor()?;

    loop {
        let input = match editor.readline("You: ") {
            Ok(line) => line,
            Err(rustyline::error::ReadlineError::Interrupted) => {
                // Ctrl-C — exit cleanly
                break;
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                // Ctrl-D — exit cleanly
                break;
            }
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_exit_command(trimmed) {
            println!("\nGoodbye!");
            break;
        }

        let _ = editor.add_history_entry(&input);

        debug!(input = trimmed, "processing input");

        // Store the user message, then hand the bounded window to the
        // orchestrator. Fetch extra to make sure the window is full.
        runtime.history.append(Role::User, trimmed)?;
        let context = runtime.history.recent(runtime.context_window * 2)?;

        helpers::print_thinking();
        let response = runtime.orchestrator.process_message(&context).await;
        helpers::clear_thinking();

        runtime.history.append(Role::Assistant, &response)?;
        helpers::print_response(&response);
    }

    save_history(&mut editor);

    Ok(())
}

/// Create a rustyline editor with persistent history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save line-editing history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

/// Path to the line-editing history file.
fn history_path() -> std::path::PathBuf {
    omnichat_core::utils::get_data_path().join("cli_history")
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
