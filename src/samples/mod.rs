//! The documentation sample pipeline.
//!
//! Sample sources are scanned, validated and parsed into functions, which are
//! written as fenced artifacts. Main sources reference artifacts through
//! markers; references are resolved, then inlined either in place (between a
//! snapshot and its restore) or into a separate output directory.

mod backup;
mod extract;
mod inline;
mod inlined;
mod marker;
mod resolve;
mod runner;
mod scanner;
mod types;
mod validate;
mod writer;

pub use backup::{restore, snapshot, BackupSnapshot, RestoreGuard};
pub use extract::{apply_tab_directive, extract, extract_all, extract_source, ExtractedSource};
pub use inline::{inline, inline_text, inline_to};
pub use inlined::{check_no_inlined, ends_with_fence};
pub use marker::{find_references, parse_marker, Marker, MarkerKind, Reference};
pub use resolve::resolve;
pub use runner::Pipeline;
pub use scanner::{scan, scan_main_sources, scan_sample_sources, MainSources};
pub use types::{
    is_main_path, is_sample_path, ExtractedFunction, ParsedSampleFile, RunSummary,
    SampleArtifact, SampleSourceFile,
};
pub use validate::{count_declarations, validate_all, validate_single_declaration};
pub use writer::{artifact, derived_name, render, write, write_all, CLOSING_FENCE};
