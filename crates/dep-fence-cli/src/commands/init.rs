//! Init command implementation.

use std::path::Path;

use anyhow::{bail, Context, Result};
use dep_fence_presets::Preset;

use super::Status;

const CONFIG_BODY: &str = r#"
# Lowest severity that fails `dep-fence check` (error, warn, info)
fail_on = "error"

[engine]
parallel = true
# max_cycles_per_rule = 50

# Project-specific rules, evaluated after the presets.
# [[forbidden]]
# name = "no-routes-to-db"
# comment = "routes must go through services"
# severity = "error"
# from = { path = "src/routes" }
# to = { path = "src/db" }

# Adjust a preset rule without redefining it.
# [rules.no-routes-to-services-directly]
# severity = "error"
"#;

fn render(presets: &[Preset]) -> String {
    let names = presets
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ");
    format!("# dep-fence configuration\n\nextends = [{names}]\n{CONFIG_BODY}")
}

/// Runs the init command.
pub fn run(project_dir: &Path, presets: &str, force: bool) -> Result<Status> {
    let presets = super::split_list(presets)
        .iter()
        .map(|name| Preset::from_name(name))
        .collect::<Result<Vec<_>, _>>()?;

    let config_path = project_dir.join("dep-fence.toml");
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, render(&presets))
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("Created {}", config_path.display());
    println!("\nNext steps:");
    println!("  1. Edit dep-fence.toml to configure rules");
    println!("  2. Run: depcruise src --output-type json > graph.json");
    println!("  3. Run: dep-fence check graph.json");

    Ok(Status::Clean)
}
