//! Sample markers embedded in main source comments.
//!
//! Supported forms:
//! - `SAMPLE: [org.kotools.types.ZeroSample.equalsOverride]` resolves to
//!   `org/kotools/types/ZeroSample/equalsOverride.md`
//! - `SAMPLE: ZeroSample.equalsOverride.md` resolves to the literal path
//! - `INLINE: ZeroSample.equalsOverride.md` resolves to the literal path
//!
//! Every path stays below the artifacts directory: absolute paths and `..`
//! components never resolve.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, SampleError};

static MARKER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(SAMPLE|INLINE): (?:\[([^\]]*)\]?|(\S+))").unwrap());

/// Syntax a marker was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    /// `SAMPLE: [dotted.identifier]`
    Identifier,
    /// `SAMPLE: relative/path.md`
    SamplePath,
    /// `INLINE: relative/path`
    InlinePath,
}

/// A marker found on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker<'a> {
    /// Text preceding the marker token, repeated on every inlined line.
    pub prefix: &'a str,
    pub identifier: &'a str,
    pub kind: MarkerKind,
}

impl Marker<'_> {
    /// Path of the referenced artifact, relative to the artifacts directory.
    ///
    /// `None` when the path would leave the artifacts directory.
    pub fn artifact_path(&self) -> Option<PathBuf> {
        let path = match self.kind {
            MarkerKind::Identifier => {
                PathBuf::from(format!("{}.md", self.identifier.replace('.', "/")))
            }
            MarkerKind::SamplePath | MarkerKind::InlinePath => PathBuf::from(self.identifier),
        };
        is_contained(&path).then_some(path)
    }
}

fn is_contained(path: &Path) -> bool {
    path.components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Find the marker on a line, if any.
pub fn parse_marker(line: &str) -> Option<Marker<'_>> {
    let caps = MARKER_PATTERN.captures(line)?;
    let token = caps.get(0)?;
    let prefix = &line[..token.start()];
    let (identifier, kind) = match (caps.get(2), caps.get(3)) {
        (Some(id), _) => (id.as_str(), MarkerKind::Identifier),
        (None, Some(path)) if &caps[1] == "INLINE" => (path.as_str(), MarkerKind::InlinePath),
        (None, Some(path)) => (path.as_str(), MarkerKind::SamplePath),
        (None, None) => return None,
    };
    Some(Marker {
        prefix,
        identifier,
        kind,
    })
}

/// A marker located in a main source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub host_file: PathBuf,
    /// Zero-based line index.
    pub line_index: usize,
    pub prefix: String,
    pub identifier: String,
    /// `None` when the marker points outside the artifacts directory.
    pub artifact_path: Option<PathBuf>,
}

/// Collect the references of a main source file, in line order.
pub fn find_references(path: &Path) -> Result<Vec<Reference>> {
    let file = File::open(path).map_err(|e| SampleError::io(path, e))?;
    let reader = BufReader::new(file);
    let mut references = Vec::new();

    for (line_index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| SampleError::io(path, e))?;
        if let Some(marker) = parse_marker(&line) {
            references.push(Reference {
                host_file: path.to_path_buf(),
                line_index,
                prefix: marker.prefix.to_string(),
                identifier: marker.identifier.to_string(),
                artifact_path: marker.artifact_path(),
            });
        }
    }

    Ok(references)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_marker() {
        let marker = parse_marker("     * SAMPLE: [org.kotools.types.ZeroSample.equalsOverride]").unwrap();
        assert_eq!(marker.prefix, "     * ");
        assert_eq!(marker.identifier, "org.kotools.types.ZeroSample.equalsOverride");
        assert_eq!(marker.kind, MarkerKind::Identifier);
        assert_eq!(
            marker.artifact_path(),
            Some(PathBuf::from("org/kotools/types/ZeroSample/equalsOverride.md"))
        );
    }

    #[test]
    fn test_path_markers() {
        let sample = parse_marker(" * SAMPLE: EmailAddressSample.equals_override.md").unwrap();
        assert_eq!(sample.kind, MarkerKind::SamplePath);
        assert_eq!(sample.prefix, " * ");
        assert_eq!(
            sample.artifact_path(),
            Some(PathBuf::from("EmailAddressSample.equals_override.md"))
        );

        let inline = parse_marker("// INLINE: kotlin/Zero.md").unwrap();
        assert_eq!(inline.kind, MarkerKind::InlinePath);
        assert_eq!(inline.prefix, "// ");
        assert_eq!(inline.artifact_path(), Some(PathBuf::from("kotlin/Zero.md")));
    }

    #[test]
    fn test_paths_outside_artifacts_dir() {
        for line in [
            " * SAMPLE: /tmp/outside/secret.txt",
            " * SAMPLE: ../outside/secret.txt",
            "// INLINE: kotlin/../../secret.txt",
            " * SAMPLE: [..secret]",
        ] {
            let marker = parse_marker(line).unwrap();
            assert_eq!(marker.artifact_path(), None, "{}", line);
        }
        let marker = parse_marker("// INLINE: ./kotlin/Zero.md").unwrap();
        assert_eq!(marker.artifact_path(), Some(PathBuf::from("./kotlin/Zero.md")));
    }

    #[test]
    fn test_lines_without_markers() {
        assert!(parse_marker(" * Returns a sample of this value.").is_none());
        assert!(parse_marker(" * SAMPLES: [a.b]").is_none());
        assert!(parse_marker("").is_none());
    }

    #[test]
    fn test_find_references() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("Zero.kt");
        std::fs::write(
            &path,
            "/**\n * Zero.\n * SAMPLE: [x.Y]\n */\nclass Zero\n    // SAMPLE: Zero.md\n",
        )
        .unwrap();

        let refs = find_references(&path).unwrap();
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].line_index, 2);
        assert_eq!(refs[0].identifier, "x.Y");
        assert_eq!(refs[0].artifact_path, Some(PathBuf::from("x/Y.md")));
        assert_eq!(refs[1].prefix, "    // ");
        assert_eq!(refs[1].host_file, path);
    }
}
