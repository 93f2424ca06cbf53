//! CLI subcommands and the plumbing they share.

pub mod check;
pub mod cycles;
pub mod init;
pub mod list_rules;
pub mod output;

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use dep_fence_core::{graph_from_json, Config, DependencyGraph, RuleSet};

/// Process outcome of a subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Nothing at or above the failure threshold.
    Clean,
    /// Violations (or cycles) that fail the run.
    Failed,
    /// Configuration or input could not be loaded.
    ConfigError,
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        match status {
            Status::Clean => Self::SUCCESS,
            Status::Failed => Self::from(1),
            Status::ConfigError => Self::from(2),
        }
    }
}

/// Composes the configured presets and local rules.
///
/// `presets` (comma-separated) replaces the configured `extends` list.
pub fn resolve_rules(config: &Config, presets: Option<&str>) -> Result<RuleSet> {
    let rules = match presets {
        Some(list) => {
            let config = Config {
                extends: split_list(list),
                ..config.clone()
            };
            dep_fence_presets::resolve(&config)
        }
        None => dep_fence_presets::resolve(config),
    };
    rules.context("Failed to compose rules")
}

/// Reads a JSON module graph from `path`, or stdin when `path` is `-`.
pub fn read_graph(path: &Path) -> Result<DependencyGraph> {
    let content = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read graph from stdin")?;
        buf
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read graph: {}", path.display()))?
    };
    graph_from_json(&content).with_context(|| format!("Invalid graph: {}", path.display()))
}

/// Splits a comma-separated list, dropping empty items.
pub fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
