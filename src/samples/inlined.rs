//! Detection of samples left inlined in main sources.
//!
//! Main sources only hold markers between builds. A fenced code block ending
//! a line means an inlining pass was never restored, and snapshotting such a
//! tree would make the inlined text permanent.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::{Result, SampleError};
use crate::language::LanguageProfile;

/// Whether a line ends with a documentation fence.
pub fn ends_with_fence(line: &str) -> bool {
    let line = line.trim_end();
    line.ends_with("```")
        || LanguageProfile::all().any(|profile| line.ends_with(&profile.opening_fence()))
}

/// Fail on the first main source holding an inlined sample.
pub fn check_no_inlined(main_files: &[PathBuf]) -> Result<()> {
    for path in main_files {
        let file = File::open(path).map_err(|e| SampleError::io(path, e))?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| SampleError::io(path, e))?;
            if ends_with_fence(&line) {
                return Err(SampleError::InlinedSamples { file: path.clone() });
            }
        }
    }
    Ok(())
}
