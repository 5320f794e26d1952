//! Configuration schema for samplesync.
//!
//! A configuration file describes where sample sources and main sources live,
//! where extracted samples are written, and how main sources are backed up
//! while samples are inlined into them. Relative paths are resolved against
//! the directory holding the configuration file.

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default configuration file names to search for.
pub const DEFAULT_CONFIG_NAMES: &[&str] = &["samplesync.yaml", ".samplesync.yaml"];

/// How extracted samples are laid out in the artifacts directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactLayout {
    /// `<Base>.<function>.md` directly under the artifacts directory.
    #[default]
    Flat,
    /// `<package/dirs>/<Base>/<function>.md`, matching `SAMPLE: [pkg.Base.function]`.
    Qualified,
}

/// Where inlined main sources are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineMode {
    /// Rewrite main sources in place, protected by a backup snapshot.
    #[default]
    InPlace,
    /// Write inlined copies to a separate output directory.
    OutputDir,
}

impl std::fmt::Display for InlineMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InlineMode::InPlace => write!(f, "in_place"),
            InlineMode::OutputDir => write!(f, "output_dir"),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub version: String,
    /// Roots scanned for sample sources.
    #[serde(default = "default_src_roots")]
    pub sample_roots: Vec<PathBuf>,
    /// Roots scanned for main sources.
    #[serde(default = "default_src_roots")]
    pub main_roots: Vec<PathBuf>,
    /// Directory receiving extracted samples.
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    #[serde(default)]
    pub layout: ArtifactLayout,
    #[serde(default)]
    pub backup: BackupConfig,
    #[serde(default)]
    pub inline: InlineConfig,
    /// Fail when main sources already contain inlined samples (default: true)
    #[serde(default = "default_true")]
    pub fail_on_inlined_samples: bool,
    /// Directory the relative paths above are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Backup of main sources taken before inlining in place.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackupConfig {
    #[serde(default = "default_backup_source_root")]
    pub source_root: PathBuf,
    #[serde(default = "default_backup_dir")]
    pub directory: PathBuf,
    /// Glob patterns, relative to `source_root`, left out of the backup.
    #[serde(default = "default_backup_excludes")]
    pub exclude: Vec<String>,
}

/// Inlining options.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InlineConfig {
    #[serde(default)]
    pub mode: InlineMode,
    #[serde(default = "default_inline_output_dir")]
    pub output_dir: PathBuf,
}

fn default_true() -> bool {
    true
}

fn default_src_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("src")]
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("build/samples/extracted")
}

fn default_backup_source_root() -> PathBuf {
    PathBuf::from("src")
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("build/samples/sources-backup")
}

fn default_inline_output_dir() -> PathBuf {
    PathBuf::from("build/samples/inlined")
}

fn default_backup_excludes() -> Vec<String> {
    ["api/**", "*Sample/**", "sample/**", "*Test/**", "test/**"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            source_root: default_backup_source_root(),
            directory: default_backup_dir(),
            exclude: default_backup_excludes(),
        }
    }
}

impl Default for InlineConfig {
    fn default() -> Self {
        Self {
            mode: InlineMode::default(),
            output_dir: default_inline_output_dir(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: String::new(),
            sample_roots: default_src_roots(),
            main_roots: default_src_roots(),
            artifacts_dir: default_artifacts_dir(),
            layout: ArtifactLayout::default(),
            backup: BackupConfig::default(),
            inline: InlineConfig::default(),
            fail_on_inlined_samples: true,
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    /// Parse a configuration from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&content)?;
        config.base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Ok(config)
    }

    /// Default configuration rooted at `base_dir`.
    pub fn with_base_dir<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn sample_roots(&self) -> Vec<PathBuf> {
        self.sample_roots.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn main_roots(&self) -> Vec<PathBuf> {
        self.main_roots.iter().map(|p| self.resolve(p)).collect()
    }

    pub fn artifacts_dir(&self) -> PathBuf {
        self.resolve(&self.artifacts_dir)
    }

    pub fn backup_source_root(&self) -> PathBuf {
        self.resolve(&self.backup.source_root)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.resolve(&self.backup.directory)
    }

    pub fn inline_output_dir(&self) -> PathBuf {
        self.resolve(&self.inline.output_dir)
    }

    /// Compile the backup exclusion patterns.
    pub fn backup_excludes(&self) -> anyhow::Result<GlobSet> {
        build_globset(&self.backup.exclude)
    }
}

/// Compile glob patterns whose `*` never crosses a path separator.
pub fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| anyhow::anyhow!("invalid backup exclude pattern {:?}: {}", pattern, e))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Validate a configuration for correctness.
pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.sample_roots.is_empty() {
        anyhow::bail!("sample_roots must name at least one directory");
    }
    if config.main_roots.is_empty() {
        anyhow::bail!("main_roots must name at least one directory");
    }

    config.backup_excludes()?;

    // Snapshots and artifacts must not live inside the tree they are restored onto.
    if config.inline.mode == InlineMode::InPlace {
        let source_root = config.backup_source_root();
        for (name, dir) in [
            ("backup.directory", config.backup_dir()),
            ("artifacts_dir", config.artifacts_dir()),
        ] {
            if dir.starts_with(&source_root) {
                anyhow::bail!(
                    "{} ({}) must not be inside backup.source_root ({})",
                    name,
                    dir.display(),
                    source_root.display()
                );
            }
        }
    }

    validate_output_dir(config)
}

/// The output directory is wiped before each run, so it must not overlap
/// any tracked tree.
fn validate_output_dir(config: &Config) -> anyhow::Result<()> {
    let output_dir = config.inline_output_dir();
    let mut tracked: Vec<(&str, PathBuf)> = Vec::new();
    tracked.extend(config.main_roots().into_iter().map(|p| ("main_roots", p)));
    tracked.extend(config.sample_roots().into_iter().map(|p| ("sample_roots", p)));
    tracked.push(("artifacts_dir", config.artifacts_dir()));
    tracked.push(("backup.source_root", config.backup_source_root()));
    tracked.push(("backup.directory", config.backup_dir()));

    for (name, dir) in tracked {
        if output_dir.starts_with(&dir) || dir.starts_with(&output_dir) {
            anyhow::bail!(
                "inline.output_dir ({}) must not overlap {} ({})",
                output_dir.display(),
                name,
                dir.display()
            );
        }
    }

    if config.base_dir.starts_with(&output_dir) {
        anyhow::bail!(
            "inline.output_dir ({}) must not contain the configuration directory ({})",
            output_dir.display(),
            config.base_dir.display()
        );
    }

    Ok(())
}
