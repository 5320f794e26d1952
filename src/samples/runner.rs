//! Pipeline runner that orchestrates every stage.

use globset::GlobSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::backup::{self, BackupSnapshot, RestoreGuard};
use super::extract::extract_all;
use super::inline::{inline, inline_to};
use super::inlined::check_no_inlined;
use super::marker::find_references;
use super::resolve::resolve;
use super::scanner::{scan_main_sources, scan_sample_sources, MainSources};
use super::types::RunSummary;
use super::validate::validate_all;
use super::writer::write_all;
use crate::config::{self, Config, InlineMode};
use crate::error::{Result, SampleError};

/// Executes the sample pipeline for one configuration.
pub struct Pipeline {
    config: Config,
    excludes: GlobSet,
}

/// Main sources with samples inlined, waiting for their consumer.
struct Inlined {
    summary: RunSummary,
    guard: Option<RestoreGuard>,
}

impl Pipeline {
    /// Create a pipeline, rejecting invalid configurations.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        config::validate(&config)?;
        let excludes = config.backup_excludes()?;
        Ok(Self { config, excludes })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate sample sources and write their functions as artifacts.
    pub fn extract(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::new("extract");
        self.extract_into(&mut summary)?;
        Ok(summary)
    }

    /// Extract, then check that main sources are clean and that every
    /// reference resolves. Main sources are only read.
    pub fn check(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::new("check");
        self.check_into(&mut summary)?;
        Ok(summary)
    }

    /// Check, then inline samples.
    ///
    /// In place, the snapshot is left pending on success and main sources
    /// stay mutated until `restore`. A failure after the snapshot restores
    /// them before returning.
    pub fn inline(&self) -> Result<RunSummary> {
        let inlined = self.prepare("inline")?;
        if let Some(guard) = inlined.guard {
            guard.keep();
        }
        Ok(inlined.summary)
    }

    /// Restore the pending snapshot onto the backup source root.
    pub fn restore(&self) -> Result<RunSummary> {
        let backup_dir = self.config.backup_dir();
        let snapshot = BackupSnapshot::pending(&self.config.backup_source_root(), &backup_dir)
            .ok_or(SampleError::MissingSnapshot { path: backup_dir })?;

        let mut summary = RunSummary::new("restore").with_mode(InlineMode::InPlace);
        summary.files_restored = backup::restore(snapshot)?;
        summary.sources_dir = Some(self.config.backup_source_root());
        Ok(summary)
    }

    /// Run the whole pipeline around `consumer`.
    ///
    /// The consumer sees main sources with samples inlined. In place, the
    /// sources are restored afterwards whether the consumer succeeds, fails
    /// or panics.
    pub fn run<T, F>(&self, consumer: F) -> Result<(RunSummary, T)>
    where
        F: FnOnce(&RunSummary) -> T,
    {
        let Inlined { mut summary, guard } = self.prepare("run")?;
        let output = consumer(&summary);
        if let Some(guard) = guard {
            summary.files_restored = guard.finish()?;
        }
        Ok((summary, output))
    }

    fn extract_into(&self, summary: &mut RunSummary) -> Result<()> {
        let sources = scan_sample_sources(&self.config.sample_roots())?;
        summary.sample_files = sources.len();
        validate_all(&sources)?;

        let parsed = extract_all(&sources)?;
        summary.functions_extracted = parsed.iter().map(|p| p.functions.len()).sum();

        let written = write_all(&parsed, &self.config.artifacts_dir(), self.config.layout)?;
        summary.artifacts_written = written.len();
        Ok(())
    }

    fn check_into(&self, summary: &mut RunSummary) -> Result<Vec<MainSources>> {
        self.extract_into(summary)?;

        let mains = scan_main_sources(&self.config.main_roots())?;
        let files = all_files(&mains);
        summary.main_files = files.len();

        if self.config.fail_on_inlined_samples {
            check_no_inlined(&files)?;
        }
        let references = resolve(&files, &self.config.artifacts_dir())?;
        summary.references_resolved = references.len();
        Ok(mains)
    }

    fn prepare(&self, command: &str) -> Result<Inlined> {
        let mode = self.config.inline.mode;
        let mut summary = RunSummary::new(command).with_mode(mode);
        let mains = self.check_into(&mut summary)?;

        let guard = match mode {
            InlineMode::InPlace => Some(self.inline_in_place(&mains, &mut summary)?),
            InlineMode::OutputDir => {
                self.inline_to_output_dir(&mains, &mut summary)?;
                None
            }
        };
        Ok(Inlined { summary, guard })
    }

    fn inline_in_place(&self, mains: &[MainSources], summary: &mut RunSummary) -> Result<RestoreGuard> {
        let source_root = self.config.backup_source_root();
        let snapshot = backup::snapshot(&source_root, &self.config.backup_dir(), &self.excludes)?;
        let guard = RestoreGuard::new(snapshot);

        let files = all_files(mains);
        if let Some(snapshot) = guard.snapshot() {
            ensure_covered(snapshot, &files)?;
        }

        summary.files_inlined = inline(&files, &self.config.artifacts_dir())?.len();
        summary.sources_dir = Some(source_root);
        Ok(guard)
    }

    fn inline_to_output_dir(&self, mains: &[MainSources], summary: &mut RunSummary) -> Result<()> {
        let output_dir = self.config.inline_output_dir();
        if output_dir.exists() {
            fs::remove_dir_all(&output_dir).map_err(|e| SampleError::io(&output_dir, e))?;
        }

        let artifacts_dir = self.config.artifacts_dir();
        for main in mains {
            let target = output_target(&output_dir, &main.root, &self.config.base_dir, mains.len());
            summary.files_inlined += inline_to(&main.root, &main.files, &artifacts_dir, &target)?.len();
        }
        summary.sources_dir = Some(output_dir);
        Ok(())
    }
}

fn all_files(mains: &[MainSources]) -> Vec<PathBuf> {
    mains.iter().flat_map(|m| m.files.iter().cloned()).collect()
}

/// Several main roots are kept apart under their paths relative to the
/// configuration directory, so `library/src` and `types/src` never collide.
fn output_target(output_dir: &Path, root: &Path, base_dir: &Path, roots: usize) -> PathBuf {
    if roots <= 1 {
        return output_dir.to_path_buf();
    }
    let relative = root.strip_prefix(base_dir).unwrap_or(root);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name),
            _ => None,
        })
        .fold(output_dir.to_path_buf(), |target, name| target.join(name))
}

/// Every file about to be rewritten must be restorable from the snapshot.
fn ensure_covered(snapshot: &BackupSnapshot, files: &[PathBuf]) -> Result<()> {
    for file in files {
        if snapshot.covers(file) || find_references(file)?.is_empty() {
            continue;
        }
        return Err(SampleError::Validation {
            file: file.clone(),
            reason: format!(
                "The '{}' file has sample references but is not backed up from '{}'.",
                file.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default(),
                snapshot.original_root.display()
            ),
        });
    }
    Ok(())
}
