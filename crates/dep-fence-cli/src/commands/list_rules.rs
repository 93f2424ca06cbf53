//! List rules command implementation.

use std::fmt::Write;

use anyhow::Result;
use dep_fence_core::{Rule, RuleSet};
use dep_fence_presets::Preset;

use super::Status;
use crate::config_resolver::ConfigSource;

/// Runs the list-rules command.
pub fn run(source: &ConfigSource, presets: Option<&str>) -> Result<Status> {
    let config = source.load()?;
    let rules = super::resolve_rules(&config, presets)?;
    print!("{}", render(source, &rules));
    Ok(Status::Clean)
}

fn describe(rule: &Rule) -> String {
    if rule.is_circular() {
        if rule.from().is_unrestricted() {
            "any cycle".to_string()
        } else {
            format!("cycles through {}", rule.from())
        }
    } else {
        format!("{} -> {}", rule.from(), rule.to())
    }
}

fn render(source: &ConfigSource, rules: &RuleSet) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Config: {source}\n");
    let _ = writeln!(out, "Rules ({}):\n", rules.len());
    let _ = writeln!(out, "{:<34} {:<6} Forbids", "Name", "Level");
    let _ = writeln!(out, "{}", "-".repeat(80));

    for rule in rules {
        let _ = writeln!(
            out,
            "{:<34} {:<6} {}",
            rule.name(),
            rule.severity(),
            describe(rule)
        );
    }

    let _ = writeln!(out, "\nPresets:");
    for preset in Preset::ALL {
        let _ = writeln!(out, "  {:<10} - {}", preset.name(), preset.description());
    }
    let _ = writeln!(out, "\nUse --preset to list a combination, e.g.:");
    let _ = writeln!(out, "  dep-fence list-rules --preset base,ddd");
    out
}
