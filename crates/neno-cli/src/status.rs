//! `neno status` — show configuration, providers and cooperation status.

use anyhow::Result;
use colored::Colorize;

use neno_core::config::{get_config_path, load_config, Config};
use neno_providers::{ProviderRegistry, WhisperTranscriber, PROVIDERS};

use crate::build_orchestrator;

/// Run the status command.
pub fn run() -> Result<()> {
    let config = load_config(None);
    let config_path = get_config_path();

    println!();
    println!("{}", "🤖 NENO Status".cyan().bold());
    println!();

    println!(
        "  {:<18} {} {}",
        "Config:".bold(),
        config_path.display(),
        if config_path.exists() {
            "✓".green().to_string()
        } else {
            "(not found)".red().to_string()
        }
    );
    println!(
        "  {:<18} {} | max_tokens: {} | timeout: {}s",
        "Parameters:".bold(),
        format!("temp: {}", config.request.temperature).dimmed(),
        config.request.max_tokens,
        config.request.timeout_secs,
    );

    // Providers
    println!();
    println!("  {}", "Providers:".bold());
    for line in provider_lines(&config) {
        println!("    {line}");
    }

    // Priority
    println!();
    let registry = ProviderRegistry::from_config(&config)?;
    let priority = registry.priority();
    println!(
        "  {:<18} {}",
        "Priority:".bold(),
        if priority.is_empty() {
            "(no providers available)".red().to_string()
        } else {
            priority.join(" → ")
        }
    );

    // Cooperation
    println!();
    let coop = &config.cooperative;
    match build_orchestrator(&config) {
        Ok(orchestrator) => {
            let status = orchestrator.get_cooperation_status();
            println!(
                "  {:<18} {} | max workers: {} | threshold: {}",
                "Cooperation:".bold(),
                status.cooperative_system.green(),
                status.max_workers,
                status.complexity_threshold,
            );
        }
        Err(_) => println!(
            "  {:<18} {} | max workers: {} | threshold: {}",
            "Cooperation:".bold(),
            "inactive".dimmed(),
            coop.max_workers,
            coop.complexity_threshold,
        ),
    }
    println!(
        "  {:<18} {}",
        "Temperatures:".bold(),
        format!(
            "divide {} | subtask {} | combine {} | subtask timeout {}s",
            coop.division_temperature,
            coop.subtask_temperature,
            coop.combine_temperature,
            coop.subtask_timeout_secs
        )
        .dimmed()
    );

    // Transcription
    println!();
    let transcription_status = if WhisperTranscriber::from_config(&config.transcription).is_configured() {
        format!("{} ({})", "✓".green(), config.transcription.model)
    } else {
        format!("{}", "· not configured".dimmed())
    };
    println!("  {:<18} {}", "Transcription:".bold(), transcription_status);

    println!();

    Ok(())
}

/// One line per known vendor: configured state and model in use.
fn provider_lines(config: &Config) -> Vec<String> {
    PROVIDERS
        .iter()
        .map(|spec| {
            let status = match config.providers.get_by_name(spec.name) {
                Some(provider) if spec.is_enabled(provider) => {
                    let model = provider.model.as_deref().unwrap_or(spec.default_model);
                    format!("{} {}", "✓".green(), model)
                }
                _ => format!("{}", format!("· not configured ({})", spec.env_key).dimmed()),
            };
            format!("{:<20} {}", spec.display_name, status)
        })
        .collect()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use neno_core::config::ProviderConfig;

    #[test]
    fn lists_every_vendor() {
        colored::control::set_override(false);
        let lines = provider_lines(&Config::default());
        assert_eq!(lines.len(), PROVIDERS.len());
        assert!(lines.iter().all(|l| l.contains("not configured")));
    }

    #[test]
    fn configured_vendor_shows_model() {
        colored::control::set_override(false);
        let mut config = Config::default();
        config.providers.groq = ProviderConfig {
            api_key: "gsk-test".into(),
            model: Some("llama-3.3-70b-versatile".into()),
            ..Default::default()
        };

        let lines = provider_lines(&config);
        let groq = lines.iter().find(|l| l.starts_with("Groq")).unwrap();
        assert!(groq.contains("✓ llama-3.3-70b-versatile"));
    }
}
