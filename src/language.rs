//! Language profiles for sample sources.
//!
//! The supported languages differ only by keywords, patterns and the fence
//! identifier used when rendering a sample, so each one is a plain data value
//! looked up by file extension.

use lazy_static::lazy_static;
use phf::phf_map;
use regex::Regex;
use std::fmt;
use std::path::Path;

/// Tag of a supported sample language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Kotlin,
    Java,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Kotlin => "kotlin",
            Language::Java => "java",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a captured function body ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// The line ends with an explicit `} // END` marker.
    EndMarker,
    /// The line ends with `}` (or with `} // END`).
    ClosingBrace,
}

/// Marker closing a function body in authored samples.
pub const END_MARKER: &str = "} // END";

/// Static description of a sample language.
#[derive(Debug)]
pub struct LanguageProfile {
    pub tag: Language,
    pub file_extension: &'static str,
    pub function_keyword: &'static str,
    /// Keywords introducing a top-level declaration (`class`, `object`).
    pub declaration_keywords: &'static [&'static str],
    pub package_keyword: &'static str,
    /// Identifier written after the opening fence of a rendered sample.
    pub fence_identifier: &'static str,
    pub terminator: Terminator,
}

pub static KOTLIN: LanguageProfile = LanguageProfile {
    tag: Language::Kotlin,
    file_extension: "kt",
    function_keyword: "fun",
    declaration_keywords: &["class", "object"],
    package_keyword: "package",
    fence_identifier: "kotlin",
    terminator: Terminator::EndMarker,
};

pub static JAVA: LanguageProfile = LanguageProfile {
    tag: Language::Java,
    file_extension: "java",
    function_keyword: "void",
    declaration_keywords: &["class"],
    package_keyword: "package",
    fence_identifier: "java",
    terminator: Terminator::ClosingBrace,
};

/// Profiles keyed by file extension (without the dot).
static PROFILES: phf::Map<&'static str, &'static LanguageProfile> = phf_map! {
    "kt" => &KOTLIN,
    "java" => &JAVA,
};

/// Compiled patterns of a profile.
struct Patterns {
    header: Regex,
    declaration: Regex,
    package: Regex,
}

impl Patterns {
    fn new(profile: &LanguageProfile) -> Self {
        let declarations = profile.declaration_keywords.join("|");
        let package_end = match profile.tag {
            Language::Java => ";",
            Language::Kotlin => "",
        };
        Self {
            header: Regex::new(&format!(
                r"\b{}\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(",
                regex::escape(profile.function_keyword)
            ))
            .unwrap(),
            declaration: Regex::new(&format!(r"\b(?:{})\s+[A-Z][A-Za-z0-9_]*", declarations))
                .unwrap(),
            package: Regex::new(&format!(
                r"^\s*{}\s+([A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*)\s*{}\s*$",
                regex::escape(profile.package_keyword),
                package_end
            ))
            .unwrap(),
        }
    }
}

lazy_static! {
    static ref KOTLIN_PATTERNS: Patterns = Patterns::new(&KOTLIN);
    static ref JAVA_PATTERNS: Patterns = Patterns::new(&JAVA);
}

impl LanguageProfile {
    /// Look up the profile for a file extension (without the dot).
    pub fn for_extension(ext: &str) -> Option<&'static LanguageProfile> {
        PROFILES.get(ext).copied()
    }

    /// Look up the profile for a path by its extension.
    pub fn for_path(path: &Path) -> Option<&'static LanguageProfile> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::for_extension)
    }

    /// All supported profiles.
    pub fn all() -> impl Iterator<Item = &'static LanguageProfile> {
        PROFILES.values().copied()
    }

    fn patterns(&self) -> &'static Patterns {
        match self.tag {
            Language::Kotlin => &KOTLIN_PATTERNS,
            Language::Java => &JAVA_PATTERNS,
        }
    }

    /// Name of the function declared on this line, if it is a function header.
    pub fn function_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.patterns()
            .header
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether the line declares a top-level type.
    pub fn is_declaration(&self, line: &str) -> bool {
        self.patterns().declaration.is_match(line)
    }

    /// Package named by a package declaration line.
    pub fn package_name<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.patterns()
            .package
            .captures(line)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Whether the line closes the function body being captured.
    pub fn is_terminator(&self, line: &str) -> bool {
        let line = line.trim_end();
        match self.terminator {
            Terminator::EndMarker => line.ends_with(END_MARKER),
            Terminator::ClosingBrace => line.ends_with('}') || line.ends_with(END_MARKER),
        }
    }

    /// Opening fence of a rendered sample.
    pub fn opening_fence(&self) -> String {
        format!("```{}", self.fence_identifier)
    }
}
