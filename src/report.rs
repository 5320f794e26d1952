//! Output formatting for samplesync runs.
//!
//! Supports two output formats:
//! - Pretty: colored terminal output for human readability
//! - JSON: structured output for programmatic consumption

use colored::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::samples::RunSummary;

/// Output format selected with `--format`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Pretty,
    Json,
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pretty" => Ok(Format::Pretty),
            "json" => Ok(Format::Json),
            other => Err(format!("invalid format {:?}, must be 'pretty' or 'json'", other)),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Pretty => write!(f, "pretty"),
            Format::Json => write!(f, "json"),
        }
    }
}

// =============================================================================
// JSON Format
// =============================================================================

/// JSON report of one command.
#[derive(Serialize, Deserialize)]
pub struct JsonReport {
    pub version: String,
    pub config: String,
    pub passed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonReport {
    pub fn new(config_path: &str, summary: Option<&RunSummary>, error: Option<String>) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            config: config_path.to_string(),
            passed: error.is_none(),
            summary: summary.cloned(),
            error,
        }
    }
}

/// Write a run in JSON format. `error` is set when the run failed.
pub fn write_json(
    config_path: &str,
    summary: Option<&RunSummary>,
    error: Option<String>,
) -> anyhow::Result<()> {
    let report = JsonReport::new(config_path, summary, error);
    let json = serde_json::to_string_pretty(&report)?;
    println!("{}", json);
    Ok(())
}

// =============================================================================
// Pretty Format
// =============================================================================

/// Write a successful run in pretty format.
pub fn write_pretty(config_path: &str, summary: &RunSummary) {
    write_header(config_path, &summary.command);
    write_counters(summary);
    println!();

    if let Some(dir) = &summary.sources_dir {
        print!("  {}", "Sources:  ".dimmed());
        println!("{}", dir.display().to_string().blue());
        println!();
    }

    print!("  {}", "✓ PASS".green());
    if let Some(mode) = &summary.mode {
        print!("  {}", format!("(inline mode: {})", mode).dimmed());
    }
    println!();
    println!();
}

/// Write a failed run in pretty format. The error goes to stderr.
pub fn write_pretty_failure(config_path: &str, command: &str, error: &dyn fmt::Display) {
    write_header(config_path, command);
    eprintln!("  {}", "✗ FAIL".red());
    eprintln!();
    for line in error.to_string().lines() {
        eprintln!("    {}", line);
    }
    eprintln!();
}

fn write_header(config_path: &str, command: &str) {
    println!();
    print!("  ");
    print!("{}", "samplesync".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();

    print!("  {}", "Command:  ".dimmed());
    println!("{}", command);
    print!("  {}", "Config:   ".dimmed());
    println!("{}", config_path);
    println!();
}

fn write_counters(summary: &RunSummary) {
    println!("  {}", "Summary:".bold());

    let rows = [
        ("sample files", summary.sample_files),
        ("functions extracted", summary.functions_extracted),
        ("artifacts written", summary.artifacts_written),
        ("main files", summary.main_files),
        ("references resolved", summary.references_resolved),
        ("files inlined", summary.files_inlined),
        ("files restored", summary.files_restored),
    ];
    for (label, count) in rows {
        if count == 0 {
            println!("    {:<22} {}", label, count.to_string().dimmed());
        } else {
            println!("    {:<22} {}", label, count.to_string().green());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_parsing() {
        assert_eq!("pretty".parse::<Format>().unwrap(), Format::Pretty);
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert!("sarif".parse::<Format>().is_err());
    }

    #[test]
    fn test_json_report_shape() {
        let mut summary = RunSummary::new("check");
        summary.references_resolved = 3;

        let report = JsonReport::new("samplesync.yaml", Some(&summary), None);
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&report).unwrap()).unwrap();
        assert_eq!(value["passed"], true);
        assert_eq!(value["summary"]["command"], "check");
        assert_eq!(value["summary"]["references_resolved"], 3);
        assert!(value.get("error").is_none());

        let failed = JsonReport::new("samplesync.yaml", None, Some("boom".to_string()));
        assert!(!failed.passed);
        assert!(failed.summary.is_none());
    }
}
