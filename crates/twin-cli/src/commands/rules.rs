//! Rules command: show the loaded categorization rule set.

use anyhow::{Context, Result};

use crate::Config;

pub fn run(config: &Config, json: bool) -> Result<()> {
    let rules = config.load_rules().context("failed to load category rules")?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&rules).context("failed to serialize rules")?
        );
        return Ok(());
    }

    if rules.is_empty() {
        println!(
            "No rules loaded ({}). Everything will be Uncategorized.",
            config.rules_path.display()
        );
        return Ok(());
    }

    let mut sorted = rules;
    sorted.sort_by_key(|r| r.priority);

    println!("{} rules from {}", sorted.len(), config.rules_path.display());
    for rule in &sorted {
        println!(
            "{:>4}  {} {} (apps: {})",
            rule.priority,
            rule.icon.as_deref().unwrap_or("·"),
            rule.label,
            if rule.apps.is_empty() {
                "-".to_string()
            } else {
                rule.apps.join(", ")
            },
        );
        for activity in &rule.activities {
            println!("        {}: {}", activity.name, activity.keywords.join(", "));
        }
    }

    Ok(())
}
