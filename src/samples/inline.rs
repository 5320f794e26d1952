//! Inlining of extracted samples into main sources.
//!
//! Each marker line is replaced by the lines of the referenced artifact,
//! every one of them preceded by the text that preceded the marker (for
//! example `     * ` inside a documentation comment). Other lines pass
//! through unchanged.
//!
//! References must have been resolved beforehand: a missing artifact here is
//! reported as a plain read failure.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::marker::parse_marker;
use crate::error::{Result, SampleError};

/// Artifact texts already read during one inlining pass.
#[derive(Default)]
struct ArtifactCache {
    texts: HashMap<PathBuf, String>,
}

impl ArtifactCache {
    fn get(&mut self, path: PathBuf) -> Result<&str> {
        match self.texts.entry(path) {
            Entry::Occupied(entry) => Ok(entry.into_mut().as_str()),
            Entry::Vacant(entry) => {
                let text = read(entry.key())?;
                Ok(entry.insert(text).as_str())
            }
        }
    }
}

fn inline_lines(
    host: &Path,
    source: &str,
    artifacts_dir: &Path,
    cache: &mut ArtifactCache,
) -> Result<(Vec<String>, bool)> {
    let mut lines = Vec::new();
    let mut changed = false;

    for line in source.lines() {
        match parse_marker(line) {
            Some(marker) => {
                let path = marker
                    .artifact_path()
                    .ok_or_else(|| SampleError::UnresolvedReference {
                        host_file: host.to_path_buf(),
                        identifier: marker.identifier.to_string(),
                    })?;
                let text = cache.get(artifacts_dir.join(path))?;
                lines.extend(text.lines().map(|l| format!("{}{}", marker.prefix, l)));
                changed = true;
            }
            None => lines.push(line.to_string()),
        }
    }

    Ok((lines, changed))
}

/// Inline samples into the source text of `host`.
///
/// Returns `None` when the text has no marker. The result ends with a single
/// trailing newline.
pub fn inline_text(host: &Path, source: &str, artifacts_dir: &Path) -> Result<Option<String>> {
    let mut cache = ArtifactCache::default();
    let (lines, changed) = inline_lines(host, source, artifacts_dir, &mut cache)?;
    Ok(changed.then(|| join(&lines)))
}

fn join(lines: &[String]) -> String {
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| SampleError::io(path, e))
}

fn write(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SampleError::io(parent, e))?;
    }
    fs::write(path, text).map_err(|e| SampleError::io(path, e))
}

/// Rewrite main sources in place. Files without markers are left untouched.
///
/// Returns the files that were rewritten.
pub fn inline(main_files: &[PathBuf], artifacts_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut cache = ArtifactCache::default();
    let mut rewritten = Vec::new();

    for file in main_files {
        let source = read(file)?;
        let (lines, changed) = inline_lines(file, &source, artifacts_dir, &mut cache)?;
        if changed {
            write(file, &join(&lines))?;
            tracing::debug!(file = %file.display(), "inlined samples");
            rewritten.push(file.clone());
        }
    }

    tracing::info!(files = rewritten.len(), "inlined samples in place");
    Ok(rewritten)
}

/// Write inlined copies of main sources under `output_dir`, keeping their
/// path relative to `root`. The main sources themselves are never written.
///
/// Every file is copied, with or without markers, so `output_dir` is a
/// complete source tree. Returns the files that had samples inlined.
pub fn inline_to(
    root: &Path,
    main_files: &[PathBuf],
    artifacts_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let mut cache = ArtifactCache::default();
    let mut inlined = Vec::new();

    for file in main_files {
        let relative = file.strip_prefix(root).unwrap_or(file);
        let target = output_dir.join(relative);
        let source = read(file)?;
        let (lines, changed) = inline_lines(file, &source, artifacts_dir, &mut cache)?;
        if changed {
            write(&target, &join(&lines))?;
            inlined.push(target);
        } else {
            write(&target, &source)?;
        }
    }

    tracing::info!(
        files = inlined.len(),
        dir = %output_dir.display(),
        "inlined samples into output directory"
    );
    Ok(inlined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn artifacts(temp: &TempDir) -> PathBuf {
        let dir = temp.path().join("extracted");
        std::fs::create_dir_all(dir.join("x")).unwrap();
        std::fs::write(dir.join("x/Y.md"), "foo()\nbar()").unwrap();
        dir
    }

    #[test]
    fn test_prefix_repeated_on_every_line() {
        let temp = TempDir::new().unwrap();
        let dir = artifacts(&temp);

        let text = inline_text(Path::new("A.kt"), "fun a() {\n    // SAMPLE: [x.Y]\n}", &dir).unwrap().unwrap();
        assert_eq!(text, "fun a() {\n    // foo()\n    // bar()\n}\n");
    }

    #[test]
    fn test_fenced_artifact_in_doc_comment() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("extracted");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("ZeroSample.a.md"), "```kotlin\nprintln(Zero())\n```").unwrap();

        let source = "/**\n * Zero.\n *\n * SAMPLE: ZeroSample.a.md\n */\nclass Zero\n";
        let text = inline_text(Path::new("Zero.kt"), source, &dir).unwrap().unwrap();
        assert_eq!(
            text,
            "/**\n * Zero.\n *\n * ```kotlin\n * println(Zero())\n * ```\n */\nclass Zero\n"
        );
    }

    #[test]
    fn test_text_without_markers() {
        let temp = TempDir::new().unwrap();
        assert!(inline_text(Path::new("Zero.kt"), "class Zero\n", temp.path()).unwrap().is_none());
    }

    #[test]
    fn test_missing_artifact_is_io_error() {
        let temp = TempDir::new().unwrap();
        let err = inline_text(Path::new("Zero.kt"), " * SAMPLE: [a.Missing]", temp.path()).unwrap_err();
        assert!(matches!(err, SampleError::Io { .. }));
    }

    #[test]
    fn test_never_reads_outside_artifacts_dir() {
        let temp = TempDir::new().unwrap();
        let dir = artifacts(&temp);
        let secret = temp.path().join("secret.txt");
        std::fs::write(&secret, "TOPSECRET").unwrap();

        for source in [
            format!(" * SAMPLE: {}\n", secret.display()),
            " * INLINE: ../secret.txt\n".to_string(),
        ] {
            let err = inline_text(Path::new("Zero.kt"), &source, &dir).unwrap_err();
            match err {
                SampleError::UnresolvedReference { host_file, .. } => {
                    assert_eq!(host_file, PathBuf::from("Zero.kt"))
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_inline_in_place_only_rewrites_marked_files() {
        let temp = TempDir::new().unwrap();
        let dir = artifacts(&temp);
        let marked = temp.path().join("Marked.kt");
        let plain = temp.path().join("Plain.kt");
        std::fs::write(&marked, "// SAMPLE: [x.Y]").unwrap();
        std::fs::write(&plain, "class Plain").unwrap();

        let rewritten = inline(&[marked.clone(), plain.clone()], &dir).unwrap();
        assert_eq!(rewritten, vec![marked.clone()]);
        assert_eq!(std::fs::read_to_string(&marked).unwrap(), "// foo()\n// bar()\n");
        assert_eq!(std::fs::read_to_string(&plain).unwrap(), "class Plain");
    }

    #[test]
    fn test_inline_to_output_dir_leaves_sources_untouched() {
        let temp = TempDir::new().unwrap();
        let dir = artifacts(&temp);
        let root = temp.path().join("src");
        let marked = root.join("main/kotlin/Marked.kt");
        let plain = root.join("main/kotlin/Plain.kt");
        std::fs::create_dir_all(marked.parent().unwrap()).unwrap();
        std::fs::write(&marked, "// SAMPLE: [x.Y]\n").unwrap();
        std::fs::write(&plain, "class Plain").unwrap();

        let out = temp.path().join("inlined");
        let inlined = inline_to(&root, &[marked.clone(), plain.clone()], &dir, &out).unwrap();

        assert_eq!(inlined, vec![out.join("main/kotlin/Marked.kt")]);
        assert_eq!(std::fs::read_to_string(&marked).unwrap(), "// SAMPLE: [x.Y]\n");
        assert_eq!(
            std::fs::read_to_string(out.join("main/kotlin/Marked.kt")).unwrap(),
            "// foo()\n// bar()\n"
        );
        assert_eq!(
            std::fs::read_to_string(out.join("main/kotlin/Plain.kt")).unwrap(),
            "class Plain"
        );
    }
}
