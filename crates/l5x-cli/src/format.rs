use std::fmt::Write as _;

use anyhow::{Context, Result};
use clap::ValueEnum;
use l5x_merge::ImportResult;

/// Output format for import and analysis results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary
    #[default]
    Text,
    /// JSON - machine-parseable
    Json,
}

impl OutputFormat {
    /// Render an import result.
    pub fn render(self, result: &ImportResult) -> Result<String> {
        match self {
            Self::Json => {
                serde_json::to_string_pretty(result).context("JSON serialization failed")
            }
            Self::Text => Ok(render_text(result)),
        }
    }
}

fn render_text(result: &ImportResult) -> String {
    let mut out = String::new();
    let status = if result.success { "ok" } else { "FAILED" };
    let _ = writeln!(out, "status: {status}");

    let counts = result.imported;
    let _ = writeln!(
        out,
        "imported: {} rungs, {} tags, {} udts, {} aois, {} routines, {} programs",
        counts.rungs, counts.tags, counts.udts, counts.aois, counts.routines, counts.programs
    );

    if result.conflicts.is_empty() {
        let _ = writeln!(out, "conflicts: none");
    } else {
        let _ = writeln!(out, "conflicts ({}):", result.conflict_count());
        for c in &result.conflicts {
            let _ = writeln!(out, "  [{}] {}: {}", c.category, c.name, c.description);
            let _ = writeln!(out, "      {}", c.source_detail);
            let _ = writeln!(out, "      {}", c.target_detail);
        }
    }

    if !result.skipped.is_empty() {
        let _ = writeln!(out, "skipped: {}", result.skipped.join(", "));
    }
    out
}
