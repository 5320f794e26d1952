//! Command-line interface for samplesync.

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::{Config, DEFAULT_CONFIG_NAMES};
use crate::error::SampleError;
use crate::report::{self, Format};
use crate::samples::{Pipeline, RunSummary};

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Environment variable naming the inlined sources for a consumer command.
pub const SOURCES_ENV: &str = "SAMPLESYNC_SOURCES";

const CONFIG_TEMPLATE: &str = include_str!("templates/samplesync.yaml");

/// Keep documentation code samples in sync with compiled sample sources.
///
/// Functions of sample sources are extracted as fenced Markdown samples and
/// inlined into the documentation comments of main sources that reference
/// them, then main sources are restored.
#[derive(Parser)]
#[command(name = "samplesync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration YAML file (default: auto-discover)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output format: pretty or json
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: Format,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract samples and check every reference without touching main sources
    Check,
    /// Extract samples from sample sources
    Extract,
    /// Inline samples into main sources (run 'restore' afterwards when in place)
    Inline,
    /// Restore main sources from the pending snapshot
    Restore,
    /// Inline samples, run a command, then restore main sources
    Run(RunArgs),
    /// Create a new samplesync configuration from a template
    Init(InitArgs),
}

/// Arguments for the run command.
#[derive(Parser)]
pub struct RunArgs {
    /// Command to run on the inlined sources, after `--`
    #[arg(last = true, required = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Arguments for the init command.
#[derive(Parser)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "samplesync.yaml")]
    pub output: PathBuf,
}

/// A loaded configuration ready to run.
struct Session {
    pipeline: Pipeline,
    config_path: String,
    format: Format,
}

impl Session {
    fn report(&self, summary: &RunSummary) -> anyhow::Result<()> {
        match self.format {
            Format::Json => report::write_json(&self.config_path, Some(summary), None),
            Format::Pretty => {
                report::write_pretty(&self.config_path, summary);
                Ok(())
            }
        }
    }

    fn report_failure(
        &self,
        command: &str,
        summary: Option<&RunSummary>,
        message: String,
    ) -> anyhow::Result<()> {
        match self.format {
            Format::Json => report::write_json(&self.config_path, summary, Some(message)),
            Format::Pretty => {
                report::write_pretty_failure(&self.config_path, command, &message);
                Ok(())
            }
        }
    }

    /// Report a stage result and pick the exit code.
    fn finish(&self, command: &str, result: Result<RunSummary, SampleError>) -> anyhow::Result<i32> {
        match result {
            Ok(summary) => {
                self.report(&summary)?;
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                self.report_failure(command, None, e.to_string())?;
                Ok(exit_code(&e))
            }
        }
    }
}

fn exit_code(error: &SampleError) -> i32 {
    if error.is_pipeline_failure() {
        EXIT_FAILED
    } else {
        EXIT_ERROR
    }
}

/// Discover a configuration file in the current directory.
fn discover_config() -> Option<PathBuf> {
    DEFAULT_CONFIG_NAMES
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Load the configuration: explicit path, discovered file, or defaults.
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<(Config, String)> {
    let path = match explicit {
        Some(p) => Some(p.to_path_buf()),
        None => discover_config(),
    };

    match path {
        Some(path) => {
            let config = Config::parse_file(&path)
                .with_context(|| format!("parsing configuration {}", path.display()))?;
            Ok((config, path.display().to_string()))
        }
        None => {
            tracing::info!(
                "no configuration found (looked for {}), using defaults",
                DEFAULT_CONFIG_NAMES.join(", ")
            );
            Ok((Config::with_base_dir("."), "(defaults)".to_string()))
        }
    }
}

fn open_session(cli: &Cli) -> anyhow::Result<Session> {
    let (config, config_path) = load_config(cli.config.as_deref())?;
    let pipeline = Pipeline::new(config).context("invalid configuration")?;
    Ok(Session {
        pipeline,
        config_path,
        format: cli.format,
    })
}

/// Run one of the check, extract, inline or restore commands.
pub fn run_stage(cli: &Cli) -> anyhow::Result<i32> {
    let session = open_session(cli)?;
    let pipeline = &session.pipeline;

    let (command, result) = match cli.command {
        Commands::Check => ("check", pipeline.check()),
        Commands::Extract => ("extract", pipeline.extract()),
        Commands::Inline => ("inline", pipeline.inline()),
        Commands::Restore => ("restore", pipeline.restore()),
        Commands::Run(_) | Commands::Init(_) => anyhow::bail!("not a pipeline stage"),
    };
    session.finish(command, result)
}

/// Run the run command.
pub fn run_consumer(cli: &Cli, args: &RunArgs) -> anyhow::Result<i32> {
    let session = open_session(cli)?;
    let (program, program_args) = args
        .command
        .split_first()
        .context("missing command to run")?;

    let result = session.pipeline.run(|summary| {
        let mut command = Command::new(program);
        command.args(program_args);
        if let Some(dir) = &summary.sources_dir {
            command.env(SOURCES_ENV, dir);
        }
        tracing::info!(program = %program, "running consumer command");
        command.status()
    });

    let (summary, status) = match result {
        Ok(done) => done,
        Err(e) => return session.finish("run", Err(e)),
    };

    match status {
        Ok(status) if status.success() => {
            session.report(&summary)?;
            Ok(EXIT_SUCCESS)
        }
        Ok(status) => {
            let message = format!("command '{}' failed: {}", args.command.join(" "), status);
            session.report_failure("run", Some(&summary), message)?;
            Ok(EXIT_FAILED)
        }
        Err(e) => {
            let message = format!("cannot run '{}': {}", program, e);
            session.report_failure("run", Some(&summary), message)?;
            Ok(EXIT_ERROR)
        }
    }
}

/// Run the init command.
pub fn run_init(args: &InitArgs) -> anyhow::Result<i32> {
    // Check if output already exists
    if args.output.exists() {
        eprintln!("Error: file already exists: {}", args.output.display());
        eprintln!("Remove it or use --output to specify a different path");
        return Ok(EXIT_ERROR);
    }

    // Create output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }

    std::fs::write(&args.output, CONFIG_TEMPLATE)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    println!("Created {}", args.output.display());
    println!();
    println!("Next steps:");
    println!("  1. Edit {} to match your source sets", args.output.display());
    println!("  2. Run: samplesync check --config {}", args.output.display());

    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_global_options() {
        let cli = Cli::try_parse_from(["samplesync", "check", "-vv", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::Check));
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, Format::Json);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "samplesync",
            "--config",
            "docs/samplesync.yaml",
            "run",
            "--",
            "./gradlew",
            "dokkaHtml",
            "--offline",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => assert_eq!(args.command, ["./gradlew", "dokkaHtml", "--offline"]),
            _ => panic!("expected run"),
        }
        assert_eq!(cli.config, Some(PathBuf::from("docs/samplesync.yaml")));
    }

    #[test]
    fn test_run_requires_command() {
        assert!(Cli::try_parse_from(["samplesync", "run"]).is_err());
        assert!(Cli::try_parse_from(["samplesync", "check", "--format", "sarif"]).is_err());
    }

    #[test]
    fn test_template_is_valid_config() {
        let config: Config = serde_yaml::from_str(CONFIG_TEMPLATE).unwrap();
        assert!(crate::config::validate(&config).is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("conf/samplesync.yaml");
        let args = InitArgs {
            output: output.clone(),
        };

        assert_eq!(run_init(&args).unwrap(), EXIT_SUCCESS);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), CONFIG_TEMPLATE);
        assert_eq!(run_init(&args).unwrap(), EXIT_ERROR);
    }

    #[test]
    fn test_load_explicit_config() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("samplesync.yaml");
        std::fs::write(&path, "artifacts_dir: out/samples\n").unwrap();

        let (config, shown) = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config.artifacts_dir(), temp.path().join("out/samples"));
        assert_eq!(shown, path.display().to_string());

        assert!(load_config(Some(temp.path().join("missing.yaml").as_path())).is_err());
    }
}
