//! `omnichat onboard` — write a default config and seed the tool catalog.

use anyhow::{Context, Result};
use colored::Colorize;

use omnichat_adapters::{CalendarAdapter, GmailAdapter};
use omnichat_core::config::{get_config_path, load_config, save_config, Config};
use omnichat_core::store::CatalogStore;

use crate::db_path;

pub fn run() -> Result<()> {
    let config_path = get_config_path();

    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
    } else {
        save_config(&Config::default(), Some(&config_path))
            .with_context(|| format!("failed to write {}", config_path.display()))?;
        println!("{} {}", "Created".green(), config_path.display());
    }

    // Seed the tool catalog (idempotent — re-running onboard is safe).
    let config = load_config(None);
    let path = db_path(&config);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let catalog = CatalogStore::open(&path)?;
    catalog.register_descriptor(&CalendarAdapter::descriptor())?;
    catalog.register_descriptor(&GmailAdapter::descriptor())?;

    let tools = catalog.list_tools()?;
    println!("{} {} tool(s) in the catalog:", "Registered".green(), tools.len());
    for tool in tools {
        println!("  - {}", tool.full_name);
    }

    println!();
    println!("Next steps:");
    println!("  1. Set {} for the model client", "GEMINI_API_KEY".bold());
    println!(
        "  2. Set {} (or google.tokenFile) for the Google adapters",
        "GOOGLE_ACCESS_TOKEN".bold()
    );
    println!("  3. Run {} to start chatting", "omnichat chat".bold());

    Ok(())
}
