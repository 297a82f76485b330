//! `neno onboard` — initialize configuration and data directories.
//!
//! - Creates `~/.neno/config.json` with defaults (never overwrites)
//! - Creates `~/.neno/history/` for the REPL

use std::path::Path;

use anyhow::Result;
use colored::Colorize;

use neno_core::config::{get_config_path, save_config, Config};
use neno_core::utils::get_history_path;

/// Run the onboard command.
pub fn run() -> Result<()> {
    println!();
    println!("{}", "🤖 NENO — Setup".cyan().bold());
    println!();

    let config_path = get_config_path();
    if write_default_config(&config_path)? {
        println!("  {} created config at {}", "✓".green(), config_path.display());
    } else {
        println!(
            "  {} config already exists at {}",
            "✓".green(),
            config_path.display()
        );
    }

    let history_dir = get_history_path();
    std::fs::create_dir_all(&history_dir)?;
    println!("  {} history dir at {}", "✓".green(), history_dir.display());

    println!();
    println!(
        "  Add an API key under {} (or set OPENAI_API_KEY, GROQ_API_KEY, OPENROUTER_API_KEY, LOCAL_LLM_URL).",
        "providers".bold()
    );
    println!(
        "{}",
        "  Setup complete! Run `neno chat` to start chatting.".green()
    );
    println!();

    Ok(())
}

/// Write `Config::default()` to `path` unless a file is already there.
///
/// Returns whether a file was written.
fn write_default_config(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    save_config(&Config::default(), Some(path))?;
    Ok(true)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
