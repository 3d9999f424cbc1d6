//! `omnichat status` — show configuration, credentials, and catalog state.

use anyhow::Result;
use colored::Colorize;

use omnichat_core::config::{get_config_path, load_config};
use omnichat_core::store::CatalogStore;

use crate::db_path;

pub fn run() -> Result<()> {
    let config_path = get_config_path();
    let config = load_config(None);

    println!();
    println!("{}", "OmniChat status".cyan().bold());
    println!();

    let config_state = if config_path.exists() {
        "present".green()
    } else {
        "missing (using defaults)".yellow()
    };
    println!("Config:        {} ({})", config_path.display(), config_state);
    println!("Model:         {}", config.model.model);
    println!("API key:       {}", present(!config.model.api_key.is_empty()));
    println!(
        "Google token:  {}",
        present(!config.google.access_token.is_empty() || config.google.token_file.is_some())
    );

    let path = db_path(&config);
    println!("Database:      {}", path.display());

    if path.exists() {
        let catalog = CatalogStore::open(&path)?;
        let tools = catalog.list_tools()?;
        println!("Tools:         {}", tools.len());
        for tool in tools {
            let effects = if tool.side_effects {
                " [side effects]".yellow()
            } else {
                "".normal()
            };
            println!("  - {} — {}{}", tool.full_name, tool.description, effects);
        }
    } else {
        println!("Tools:         {}", "catalog not created (run `omnichat onboard`)".yellow());
    }

    println!();
    Ok(())
}

fn present(yes: bool) -> colored::ColoredString {
    if yes {
        "configured".green()
    } else {
        "not configured".red()
    }
}
