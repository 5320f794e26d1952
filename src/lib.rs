//! samplesync - documentation samples kept in sync with compiled code.
//!
//! Sample functions are written in ordinary, compiled sample source files.
//! samplesync extracts each of them as a fenced Markdown snippet and inlines
//! the snippets into the documentation comments of main sources that
//! reference them, so published documentation always shows code that builds.
//!
//! # Architecture
//!
//! - `language`: per-language lexical rules (Kotlin, Java)
//! - `samples`: scanning, validation, extraction, writing, resolution,
//!   inlining, and the backup/restore around in-place inlining
//! - `config`: YAML configuration schema
//! - `error`: pipeline errors
//! - `report`: output formatting (pretty, JSON)
//! - `logging`: tracing subscriber setup
//!
//! # Adding a New Language
//!
//! Add a `LanguageProfile` in `src/language.rs` and register its file
//! extension in the profile map.

pub mod cli;
pub mod config;
pub mod error;
pub mod language;
pub mod logging;
pub mod report;
pub mod samples;

pub use config::Config;
pub use error::{Result, SampleError};
pub use language::{Language, LanguageProfile};
pub use samples::{Pipeline, RunSummary};
