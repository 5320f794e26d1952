//! Core types flowing through the sample pipeline.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::InlineMode;
use crate::error::{Result, SampleError};
use crate::language::LanguageProfile;

/// A hand-authored file whose functions double as documentation samples.
#[derive(Debug, Clone)]
pub struct SampleSourceFile {
    pub path: PathBuf,
    pub language: &'static LanguageProfile,
}

impl SampleSourceFile {
    /// Build a sample source from a path relative to its scan root.
    ///
    /// Returns `None` when the file is not a sample source: its extension has
    /// no language profile, or it is not inside a sample source set.
    pub fn new(root: &Path, relative: &Path) -> Option<Self> {
        if !is_sample_path(relative) {
            return None;
        }
        let language = LanguageProfile::for_path(relative)?;
        Some(Self {
            path: root.join(relative),
            language,
        })
    }

    /// File name without its extension.
    pub fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    pub fn read(&self) -> Result<String> {
        std::fs::read_to_string(&self.path).map_err(|e| SampleError::io(&self.path, e))
    }
}

lazy_static! {
    static ref SAMPLE_SET: Regex = Regex::new(r"^(?:sample|[A-Za-z]+Sample)$").unwrap();
    static ref MAIN_SET: Regex = Regex::new(r"^(?:main|[A-Za-z]+Main)$").unwrap();
}

/// Whether some directory of the path names a sample source set
/// (`sample`, `commonSample`, `jvmSample`...).
pub fn is_sample_path(relative: &Path) -> bool {
    has_source_set(relative, &SAMPLE_SET)
}

/// Whether some directory of the path names a main source set
/// (`main`, `commonMain`, `jvmMain`...).
pub fn is_main_path(relative: &Path) -> bool {
    has_source_set(relative, &MAIN_SET)
}

fn has_source_set(relative: &Path, source_set: &Regex) -> bool {
    relative
        .parent()
        .map(|dir| {
            dir.components()
                .any(|c| source_set.is_match(&c.as_os_str().to_string_lossy()))
        })
        .unwrap_or(false)
}

/// Body of one sample function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedFunction {
    name: String,
    body_lines: Vec<String>,
}

impl ExtractedFunction {
    /// Create a function, rejecting blank names.
    pub fn new(name: impl Into<String>, body_lines: Vec<String>) -> std::result::Result<Self, String> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err("function name should not be blank".to_string());
        }
        Ok(Self { name, body_lines })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body_lines(&self) -> &[String] {
        &self.body_lines
    }
}

/// Everything extracted from one sample source file.
#[derive(Debug, Clone)]
pub struct ParsedSampleFile {
    pub source: SampleSourceFile,
    /// Package declared by the file, if any.
    pub package: Option<String>,
    pub functions: Vec<ExtractedFunction>,
}

/// A rendered sample ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleArtifact {
    /// `<Base>.<function>.md`
    pub derived_name: String,
    /// Location relative to the artifacts directory.
    pub relative_path: PathBuf,
    pub rendered_text: String,
}

/// Counters describing a pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    pub sample_files: usize,
    pub functions_extracted: usize,
    pub artifacts_written: usize,
    pub main_files: usize,
    pub references_resolved: usize,
    pub files_inlined: usize,
    pub files_restored: usize,
    /// Directory downstream consumers should read documentation sources from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_dir: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: InlineMode) -> Self {
        self.mode = Some(mode.to_string());
        self
    }
}
