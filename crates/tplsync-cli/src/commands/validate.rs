//! Validate command implementation

use std::path::Path;

use colored::Colorize;

use super::load_config;
use crate::error::Result;

/// Run the validate command
///
/// Loads and validates the config, then lists the selected rules without
/// fetching anything.
pub fn run_validate(config_path: &Path, profile: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let rules = config.rules_for_profile(profile)?;

    println!(
        "{} {} is valid: {} source(s), {} rule(s)",
        "OK".green().bold(),
        config_path.display(),
        config.sources.len(),
        rules.len()
    );

    for rule in rules {
        let url = config
            .sources
            .get(&rule.source)
            .map(|source| source.url.as_str())
            .unwrap_or_default();
        let mut line = format!("   {} {} <- {}", "-".cyan(), rule.path, url);
        if !rule.encoding.is_empty() {
            line.push_str(&format!(" [{}]", rule.encoding));
        }
        if !rule.extract.is_empty() {
            line.push_str(&format!(" extract={}", rule.extract));
        }
        if rule.expand_archive {
            line.push_str(" (expand)");
        }
        println!("{}", line);
    }

    Ok(())
}
