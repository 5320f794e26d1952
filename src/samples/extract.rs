//! Extraction of sample function bodies from sample sources.
//!
//! Extraction is line oriented and does not track braces: a header line
//! starts a capture, a terminator line ends it, and every line in between is
//! captured trimmed. Authored samples follow a convention that keeps this
//! unambiguous (Kotlin bodies close with `} // END`).
//!
//! A captured line may end with a `// TABS: <n>` directive. The directive is
//! removed and the code is indented by `n` groups of four spaces, which lets
//! a flat capture reproduce nested indentation in the rendered sample.

use lazy_static::lazy_static;
use rayon::prelude::*;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use super::types::{ExtractedFunction, ParsedSampleFile, SampleSourceFile};
use crate::error::{Result, SampleError};
use crate::language::LanguageProfile;

/// Indentation added per `TABS` level.
const TAB: &str = "    ";

/// Deepest indentation a `TABS` directive may ask for.
pub const MAX_TABS: usize = 32;

lazy_static! {
    static ref TABS_DIRECTIVE: Regex = Regex::new(r"^(.*?)//\s*TABS:\s*(\d+)\s*$").unwrap();
}

/// Apply the tab directive to an already trimmed line, if it carries one.
///
/// Fails when the directive asks for more than [`MAX_TABS`] levels.
pub fn apply_tab_directive(line: &str) -> std::result::Result<String, String> {
    let Some(caps) = TABS_DIRECTIVE.captures(line) else {
        return Ok(line.to_string());
    };
    let code = caps.get(1).map(|m| m.as_str().trim()).unwrap_or("");
    match caps[2].parse::<usize>() {
        Ok(tabs) if tabs <= MAX_TABS => Ok(format!("{}{}", TAB.repeat(tabs), code)),
        _ => Err(format!(
            "'TABS: {}' exceeds the maximum of {} levels",
            &caps[2], MAX_TABS
        )),
    }
}

/// Function currently being captured.
struct OpenFunction {
    name: String,
    body: Vec<String>,
}

/// Result of parsing sample source text.
#[derive(Debug, Clone, Default)]
pub struct ExtractedSource {
    pub package: Option<String>,
    pub functions: Vec<ExtractedFunction>,
}

/// Parse sample source text into its sample functions.
///
/// `path` is only used for error reporting.
pub fn extract_source(
    source: &str,
    language: &LanguageProfile,
    path: &Path,
) -> Result<ExtractedSource> {
    let parse_error = |reason: String| SampleError::Parse {
        file: path.to_path_buf(),
        reason,
    };

    let mut extracted = ExtractedSource::default();
    let mut names: HashSet<String> = HashSet::new();
    let mut current: Option<OpenFunction> = None;

    for (index, line) in source.lines().enumerate() {
        if let Some(name) = language.function_name(line) {
            if let Some(outer) = current.take() {
                tracing::warn!(
                    file = %path.display(),
                    line = index + 1,
                    outer = %outer.name,
                    inner = name,
                    "nested sample header, dropping the enclosing function"
                );
            }
            current = Some(OpenFunction {
                name: name.to_string(),
                body: Vec::new(),
            });
        } else if current.is_some() && language.is_terminator(line) {
            if let Some(open) = current.take() {
                if !names.insert(open.name.clone()) {
                    return Err(parse_error(format!(
                        "function '{}' is declared more than once",
                        open.name
                    )));
                }
                let function = ExtractedFunction::new(open.name, open.body).map_err(parse_error)?;
                extracted.functions.push(function);
            }
        } else if let Some(open) = current.as_mut() {
            let captured = apply_tab_directive(line.trim())
                .map_err(|reason| parse_error(format!("line {}: {}", index + 1, reason)))?;
            open.body.push(captured);
        } else if extracted.package.is_none() {
            if let Some(package) = language.package_name(line) {
                extracted.package = Some(package.to_string());
            }
        }
    }

    if let Some(open) = current {
        return Err(parse_error(format!(
            "function '{}' is never terminated",
            open.name
        )));
    }

    Ok(extracted)
}

/// Extract the sample functions of one file.
pub fn extract(file: &SampleSourceFile) -> Result<ParsedSampleFile> {
    let source = file.read()?;
    let extracted = extract_source(&source, file.language, &file.path)?;
    tracing::debug!(
        file = %file.path.display(),
        functions = extracted.functions.len(),
        "extracted samples"
    );
    Ok(ParsedSampleFile {
        source: file.clone(),
        package: extracted.package,
        functions: extracted.functions,
    })
}

/// Extract every file in parallel, keeping the input order.
///
/// The first failure in input order is reported.
pub fn extract_all(files: &[SampleSourceFile]) -> Result<Vec<ParsedSampleFile>> {
    files.par_iter().map(extract).collect::<Vec<_>>().into_iter().collect()
}
