//! Resolution of sample references against extracted samples.

use std::path::{Path, PathBuf};

use super::marker::{find_references, Reference};
use crate::error::{Result, SampleError};

/// Check that every reference of the main sources targets an existing
/// artifact under `artifacts_dir`. A path leading out of `artifacts_dir`
/// never resolves.
///
/// Stops at the first unresolved reference, in file then line order.
/// Returns every reference found when all of them resolve.
pub fn resolve(main_files: &[PathBuf], artifacts_dir: &Path) -> Result<Vec<Reference>> {
    let mut resolved = Vec::new();

    for file in main_files {
        for reference in find_references(file)? {
            let found = reference
                .artifact_path
                .as_ref()
                .is_some_and(|path| artifacts_dir.join(path).is_file());
            if !found {
                return Err(SampleError::UnresolvedReference {
                    host_file: reference.host_file,
                    identifier: reference.identifier,
                });
            }
            resolved.push(reference);
        }
    }

    tracing::info!(references = resolved.len(), "resolved sample references");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_all_references_resolve() {
        let temp = TempDir::new().unwrap();
        let artifacts = temp.path().join("extracted");
        write(&artifacts.join("a/b/Present.md"), "```kotlin\n```");
        write(&artifacts.join("ZeroSample.a.md"), "```kotlin\n```");

        let main = temp.path().join("Zero.kt");
        write(&main, " * SAMPLE: [a.b.Present]\n * SAMPLE: ZeroSample.a.md\nclass Zero\n");

        let refs = resolve(&[main], &artifacts).unwrap();
        assert_eq!(refs.len(), 2);
    }

    #[test]
    fn test_missing_artifact_fails_naming_host_and_identifier() {
        let temp = TempDir::new().unwrap();
        let artifacts = temp.path().join("extracted");
        std::fs::create_dir_all(&artifacts).unwrap();

        let main = temp.path().join("Zero.kt");
        write(&main, "/**\n * SAMPLE: [a.b.Missing]\n */\nclass Zero\n");

        let err = resolve(&[main.clone()], &artifacts).unwrap_err();
        match &err {
            SampleError::UnresolvedReference {
                host_file,
                identifier,
            } => {
                assert_eq!(host_file, &main);
                assert_eq!(identifier, "a.b.Missing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_unresolved_reference_is_reported() {
        let temp = TempDir::new().unwrap();
        let artifacts = temp.path().join("extracted");
        std::fs::create_dir_all(&artifacts).unwrap();

        let first = temp.path().join("A.kt");
        let second = temp.path().join("B.kt");
        write(&first, " * SAMPLE: [first.Missing]\n * SAMPLE: [first.Other]\n");
        write(&second, " * SAMPLE: [second.Missing]\n");

        let err = resolve(&[first, second], &artifacts).unwrap_err();
        assert!(err.to_string().contains("'first.Missing'"));
    }

    #[test]
    fn test_paths_leaving_artifacts_dir_are_unresolved() {
        let temp = TempDir::new().unwrap();
        let artifacts = temp.path().join("extracted");
        std::fs::create_dir_all(&artifacts).unwrap();
        let secret = temp.path().join("outside/secret.txt");
        write(&secret, "TOPSECRET");

        let main = temp.path().join("Zero.kt");
        for marker in [
            format!(" * SAMPLE: {}", secret.display()),
            " * INLINE: ../outside/secret.txt".to_string(),
        ] {
            write(&main, &format!("/**\n{}\n */\nclass Zero\n", marker));
            let err = resolve(&[main.clone()], &artifacts).unwrap_err();
            assert!(
                matches!(err, SampleError::UnresolvedReference { .. }),
                "{}: {}",
                marker,
                err
            );
        }
    }

    #[test]
    fn test_no_references() {
        let temp = TempDir::new().unwrap();
        let main = temp.path().join("Zero.kt");
        write(&main, "class Zero\n");
        assert!(resolve(&[main], temp.path()).unwrap().is_empty());
    }
}
