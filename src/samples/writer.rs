//! Rendering and writing of extracted samples.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{ExtractedFunction, ParsedSampleFile, SampleArtifact};
use crate::config::ArtifactLayout;
use crate::error::{Result, SampleError};
use crate::language::LanguageProfile;

/// Closing fence of a rendered sample.
pub const CLOSING_FENCE: &str = "```";

/// Render a function body as a fenced code block.
pub fn render(function: &ExtractedFunction, language: &LanguageProfile) -> String {
    let mut lines = Vec::with_capacity(function.body_lines().len() + 2);
    lines.push(language.opening_fence());
    lines.extend(function.body_lines().iter().cloned());
    lines.push(CLOSING_FENCE.to_string());
    lines.join("\n")
}

/// `<Base>.<function>.md`
pub fn derived_name(base_name: &str, function_name: &str) -> String {
    format!("{}.{}.md", base_name, function_name)
}

/// Build the artifact of one function of a parsed file.
pub fn artifact(
    parsed: &ParsedSampleFile,
    function: &ExtractedFunction,
    layout: ArtifactLayout,
) -> SampleArtifact {
    let base_name = parsed.source.base_name();
    let derived_name = derived_name(&base_name, function.name());
    let relative_path = match layout {
        ArtifactLayout::Flat => PathBuf::from(&derived_name),
        ArtifactLayout::Qualified => {
            let mut path = PathBuf::new();
            if let Some(package) = &parsed.package {
                path.extend(package.split('.'));
            }
            path.push(&base_name);
            path.push(format!("{}.md", function.name()));
            path
        }
    };
    SampleArtifact {
        derived_name,
        relative_path,
        rendered_text: render(function, parsed.source.language),
    }
}

/// Write an artifact under `output_dir`, replacing any previous version.
pub fn write(artifact: &SampleArtifact, output_dir: &Path) -> Result<PathBuf> {
    let path = output_dir.join(&artifact.relative_path);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SampleError::io(parent, e))?;
    }
    fs::write(&path, &artifact.rendered_text).map_err(|e| SampleError::io(&path, e))?;
    Ok(path)
}

/// Write the artifacts of every parsed file.
///
/// Two functions mapping to the same artifact path are rejected before
/// anything is written.
pub fn write_all(
    parsed: &[ParsedSampleFile],
    output_dir: &Path,
    layout: ArtifactLayout,
) -> Result<Vec<PathBuf>> {
    let mut owners: HashMap<PathBuf, &Path> = HashMap::new();
    let mut artifacts = Vec::new();

    for file in parsed {
        for function in &file.functions {
            let sample = artifact(file, function, layout);
            if let Some(owner) = owners.insert(sample.relative_path.clone(), file.source.path.as_path()) {
                return Err(SampleError::Validation {
                    file: file.source.path.clone(),
                    reason: format!(
                        "The '{}' sample is also produced by '{}'.",
                        sample.relative_path.display(),
                        owner.display()
                    ),
                });
            }
            artifacts.push(sample);
        }
    }

    let written = artifacts
        .iter()
        .map(|a| write(a, output_dir))
        .collect::<Result<Vec<_>>>()?;
    tracing::info!(
        count = written.len(),
        dir = %output_dir.display(),
        "wrote extracted samples"
    );
    Ok(written)
}
