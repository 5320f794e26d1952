//! Errors raised by the sample pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that abort a pipeline run.
#[derive(Error, Debug)]
pub enum SampleError {
    #[error("{reason}\nFile location: {}", .file.display())]
    Validation { file: PathBuf, reason: String },

    #[error("cannot extract samples from '{}': {reason}", .file.display())]
    Parse { file: PathBuf, reason: String },

    #[error(
        "'{}' wants to inline a non-existent '{identifier}' sample in documentation.\nFile location: {}",
        file_name(.host_file),
        .host_file.display()
    )]
    UnresolvedReference {
        host_file: PathBuf,
        identifier: String,
    },

    #[error(
        "'{}' shouldn't have inlined samples in documentation.\nFile location: {}\nFix it by running the 'samplesync restore' command.",
        file_name(.file),
        .file.display()
    )]
    InlinedSamples { file: PathBuf },

    #[error(
        "a snapshot of main sources is still pending in {}; run 'samplesync restore' first",
        .path.display()
    )]
    PendingSnapshot { path: PathBuf },

    #[error("no snapshot of main sources found in {}", .path.display())]
    MissingSnapshot { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("walking source tree: {0}")]
    Walk(#[from] walkdir::Error),
}

impl SampleError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SampleError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is a failed check of the sources, as opposed to an
    /// environment problem (I/O, directory walking).
    pub fn is_pipeline_failure(&self) -> bool {
        !matches!(self, SampleError::Io { .. } | SampleError::Walk(_))
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub type Result<T> = std::result::Result<T, SampleError>;
