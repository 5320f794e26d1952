//! Check that each sample source declares exactly one top-level type.
//!
//! Sample names are derived from the file name and the function name only,
//! so a second declaration in the same file would make them ambiguous.

use super::types::SampleSourceFile;
use crate::error::{Result, SampleError};
use crate::language::LanguageProfile;

/// Count the declaration lines of a sample source text.
pub fn count_declarations(source: &str, language: &LanguageProfile) -> usize {
    source
        .lines()
        .filter(|line| language.is_declaration(line))
        .count()
}

/// Validate that the file declares a single type.
pub fn validate_single_declaration(file: &SampleSourceFile) -> Result<()> {
    let source = file.read()?;
    let count = count_declarations(&source, file.language);
    if count == 1 {
        return Ok(());
    }

    let name = file
        .path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    Err(SampleError::Validation {
        file: file.path.clone(),
        reason: format!(
            "The '{}' file should have a single class, found {}.",
            name, count
        ),
    })
}

/// Validate every file, stopping at the first failure.
pub fn validate_all(files: &[SampleSourceFile]) -> Result<()> {
    for file in files {
        validate_single_declaration(file)?;
        tracing::debug!(file = %file.path.display(), "single declaration");
    }
    Ok(())
}
