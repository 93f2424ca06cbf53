//! Cycles command implementation.

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use dep_fence_core::{Cycle, CycleDetector, DependencyGraph};

use super::Status;
use crate::OutputFormat;

/// Arguments for `dep-fence cycles`.
#[derive(Debug, Clone, Args)]
pub struct CyclesArgs {
    /// JSON module graph (`-` for stdin)
    pub graph: PathBuf,

    /// Output format
    #[arg(short, long, default_value = "text")]
    pub format: OutputFormat,

    /// Stop after this many cycles
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Runs the cycles command.
///
/// Fails the run when the graph has any cycle.
pub fn run(args: &CyclesArgs) -> Result<Status> {
    let graph = super::read_graph(&args.graph)?;
    let (rendered, found) = render(&graph, args.format, args.limit)?;
    print!("{rendered}");

    Ok(if found == 0 {
        Status::Clean
    } else {
        Status::Failed
    })
}

fn render(
    graph: &DependencyGraph,
    format: OutputFormat,
    limit: Option<usize>,
) -> Result<(String, usize)> {
    let detector = CycleDetector::new(graph);
    let cycles: Vec<Cycle> = detector
        .cycles()
        .take(limit.unwrap_or(usize::MAX))
        .collect();

    let out = match format {
        OutputFormat::Json => {
            let paths: Vec<&[String]> = cycles.iter().map(Cycle::modules).collect();
            let mut json = serde_json::to_string_pretty(&paths)?;
            json.push('\n');
            json
        }
        OutputFormat::Compact => cycles.iter().map(|c| format!("{c}\n")).collect(),
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, cycle) in cycles.iter().enumerate() {
                let _ = writeln!(out, "{}. {cycle}", i + 1);
            }
            let _ = writeln!(
                out,
                "Found {} cycle(s) in {} strongly connected component(s)",
                cycles.len(),
                detector.components().len()
            );
            out
        }
    };
    Ok((out, cycles.len()))
}
