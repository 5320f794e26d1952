//! Backup and restore of main sources around in-place inlining.
//!
//! `snapshot` copies the source tree (minus excluded subtrees) into a build
//! directory, `restore` copies it back and removes the snapshot. A snapshot
//! directory that still exists therefore means the last inlining was never
//! restored, and a new snapshot is refused.

use globset::GlobSet;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::{Result, SampleError};

/// A byte-for-byte copy of a source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupSnapshot {
    pub original_root: PathBuf,
    pub snapshot_root: PathBuf,
}

impl BackupSnapshot {
    /// The snapshot left at `snapshot_root`, if any.
    pub fn pending(original_root: &Path, snapshot_root: &Path) -> Option<Self> {
        snapshot_root.is_dir().then(|| Self {
            original_root: original_root.to_path_buf(),
            snapshot_root: snapshot_root.to_path_buf(),
        })
    }

    /// Whether `file` (under the original root) is part of the snapshot.
    pub fn covers(&self, file: &Path) -> bool {
        file.strip_prefix(&self.original_root)
            .map(|relative| self.snapshot_root.join(relative).is_file())
            .unwrap_or(false)
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| SampleError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| SampleError::io(from, e))?;
    Ok(())
}

/// Copy every file under `from` into `to`, skipping relative paths matched by
/// `excludes`. Returns the number of files copied.
fn copy_tree(from: &Path, to: &Path, excludes: Option<&GlobSet>) -> Result<usize> {
    let mut copied = 0;
    for entry in WalkDir::new(from) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(from).unwrap_or(entry.path());
        if excludes.map(|set| set.is_match(relative)).unwrap_or(false) {
            continue;
        }
        copy_file(entry.path(), &to.join(relative))?;
        copied += 1;
    }
    Ok(copied)
}

/// Snapshot `source_root` into `snapshot_root`.
///
/// A copy that fails partway removes the partial snapshot, so it is never
/// mistaken for a pending one.
pub fn snapshot(source_root: &Path, snapshot_root: &Path, excludes: &GlobSet) -> Result<BackupSnapshot> {
    if snapshot_root.exists() {
        return Err(SampleError::PendingSnapshot {
            path: snapshot_root.to_path_buf(),
        });
    }
    fs::create_dir_all(snapshot_root).map_err(|e| SampleError::io(snapshot_root, e))?;

    let copied = match copy_tree(source_root, snapshot_root, Some(excludes)) {
        Ok(copied) => copied,
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(snapshot_root) {
                tracing::error!(
                    path = %snapshot_root.display(),
                    error = %cleanup,
                    "failed to remove partial snapshot"
                );
            }
            return Err(e);
        }
    };
    tracing::info!(
        files = copied,
        from = %source_root.display(),
        to = %snapshot_root.display(),
        "backed up main sources"
    );

    Ok(BackupSnapshot {
        original_root: source_root.to_path_buf(),
        snapshot_root: snapshot_root.to_path_buf(),
    })
}

/// Copy the snapshot back over its original root, then delete it.
///
/// Returns the number of restored files.
pub fn restore(snapshot: BackupSnapshot) -> Result<usize> {
    let restored = copy_tree(&snapshot.snapshot_root, &snapshot.original_root, None)?;
    fs::remove_dir_all(&snapshot.snapshot_root)
        .map_err(|e| SampleError::io(&snapshot.snapshot_root, e))?;
    tracing::info!(
        files = restored,
        to = %snapshot.original_root.display(),
        "restored main sources"
    );
    Ok(restored)
}

/// Restores a snapshot when finished or dropped, whichever comes first.
///
/// Dropping the guard (early return, panic unwinding) restores the snapshot
/// and logs any failure, since errors cannot propagate out of `drop`.
#[must_use = "dropping the guard restores the snapshot immediately"]
pub struct RestoreGuard {
    snapshot: Option<BackupSnapshot>,
}

impl RestoreGuard {
    pub fn new(snapshot: BackupSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
        }
    }

    pub fn snapshot(&self) -> Option<&BackupSnapshot> {
        self.snapshot.as_ref()
    }

    /// Restore now, reporting failures to the caller.
    pub fn finish(mut self) -> Result<usize> {
        match self.snapshot.take() {
            Some(snapshot) => restore(snapshot),
            None => Ok(0),
        }
    }

    /// Leave the snapshot pending for a later `restore`.
    pub fn keep(mut self) -> Option<BackupSnapshot> {
        self.snapshot.take()
    }
}

impl Drop for RestoreGuard {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            let location = snapshot.snapshot_root.clone();
            if let Err(e) = restore(snapshot) {
                tracing::error!(
                    snapshot = %location.display(),
                    "failed to restore main sources: {}",
                    e
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::build_globset;
    use tempfile::TempDir;

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn excludes() -> GlobSet {
        build_globset(&["api/**".to_string(), "*Test/**".to_string()]).unwrap()
    }

    fn tree(temp: &TempDir) -> PathBuf {
        let src = temp.path().join("src");
        write(&src.join("commonMain/kotlin/Zero.kt"), "/**\n * SAMPLE: [x.Y]\n */\nclass Zero");
        write(&src.join("commonMain/kotlin/One.kt"), "class One\r\n");
        write(&src.join("commonTest/kotlin/ZeroTest.kt"), "class ZeroTest\n");
        write(&src.join("api/library.api"), "public final class Zero\n");
        src
    }

    #[test]
    fn test_snapshot_skips_excluded_subtrees() {
        let temp = TempDir::new().unwrap();
        let src = tree(&temp);
        let backup = temp.path().join("build/backup");

        let snapshot = snapshot(&src, &backup, &excludes()).unwrap();
        assert!(backup.join("commonMain/kotlin/Zero.kt").is_file());
        assert!(!backup.join("commonTest/kotlin/ZeroTest.kt").exists());
        assert!(!backup.join("api/library.api").exists());
        assert!(snapshot.covers(&src.join("commonMain/kotlin/One.kt")));
        assert!(!snapshot.covers(&src.join("commonTest/kotlin/ZeroTest.kt")));
    }

    #[test]
    fn test_restore_reproduces_original_bytes() {
        let temp = TempDir::new().unwrap();
        let src = tree(&temp);
        let zero = src.join("commonMain/kotlin/Zero.kt");
        let one = src.join("commonMain/kotlin/One.kt");
        let before = (fs::read(&zero).unwrap(), fs::read(&one).unwrap());

        let backup = temp.path().join("build/backup");
        let snap = snapshot(&src, &backup, &excludes()).unwrap();
        fs::write(&zero, "mutated\n").unwrap();
        fs::write(&one, "mutated too\n").unwrap();

        let restored = restore(snap).unwrap();
        assert_eq!(restored, 2);
        assert_eq!((fs::read(&zero).unwrap(), fs::read(&one).unwrap()), before);
        assert!(!backup.exists());
    }

    #[test]
    fn test_pending_snapshot_is_refused() {
        let temp = TempDir::new().unwrap();
        let src = tree(&temp);
        let backup = temp.path().join("build/backup");

        let _first = snapshot(&src, &backup, &excludes()).unwrap();
        let err = snapshot(&src, &backup, &excludes()).unwrap_err();
        assert!(matches!(err, SampleError::PendingSnapshot { .. }));
        assert_eq!(
            BackupSnapshot::pending(&src, &backup),
            Some(BackupSnapshot {
                original_root: src.clone(),
                snapshot_root: backup.clone(),
            })
        );
    }

    #[test]
    fn test_failed_snapshot_leaves_nothing_pending() {
        let temp = TempDir::new().unwrap();
        let src = temp.path().join("missing/src");
        let backup = temp.path().join("build/backup");

        assert!(snapshot(&src, &backup, &excludes()).is_err());
        assert!(!backup.exists());
        assert!(BackupSnapshot::pending(&src, &backup).is_none());

        // The next attempt is not blocked by a leftover directory.
        let src = tree(&temp);
        assert!(snapshot(&src, &backup, &excludes()).is_ok());
    }

    #[test]
    fn test_guard_restores_on_drop() {
        let temp = TempDir::new().unwrap();
        let src = tree(&temp);
        let zero = src.join("commonMain/kotlin/Zero.kt");
        let before = fs::read(&zero).unwrap();
        let backup = temp.path().join("build/backup");

        {
            let _guard = RestoreGuard::new(snapshot(&src, &backup, &excludes()).unwrap());
            fs::write(&zero, "mutated\n").unwrap();
        }

        assert_eq!(fs::read(&zero).unwrap(), before);
        assert!(BackupSnapshot::pending(&src, &backup).is_none());
    }

    #[test]
    fn test_guard_finish_reports_count() {
        let temp = TempDir::new().unwrap();
        let src = tree(&temp);
        let backup = temp.path().join("build/backup");

        let guard = RestoreGuard::new(snapshot(&src, &backup, &excludes()).unwrap());
        assert!(guard.snapshot().is_some());
        assert_eq!(guard.finish().unwrap(), 2);
    }

    #[test]
    fn test_kept_snapshot_stays_pending() {
        let temp = TempDir::new().unwrap();
        let src = tree(&temp);
        let backup = temp.path().join("build/backup");

        let guard = RestoreGuard::new(snapshot(&src, &backup, &excludes()).unwrap());
        let kept = guard.keep().unwrap();
        assert!(backup.is_dir());
        assert_eq!(restore(kept).unwrap(), 2);
        assert!(!backup.exists());
    }
}
