//! Language identification from file extensions.

use std::path::Path;

/// Language identifier for `path`, derived from its extension.
pub fn detect_language(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match extension.as_str() {
        "rs" => "rust",
        "py" | "pyi" => "python",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "ts" | "tsx" | "mts" | "cts" => "typescript",
        "go" => "go",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "c" | "h" => "c",
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => "cpp",
        "cs" => "csharp",
        "rb" => "ruby",
        "php" => "php",
        "swift" => "swift",
        _ => return None
    };
    Some(language)
}

/// Groups of languages that share an import syntax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImportFamily {
    JavaScript,
    Python,
    Rust,
    Go,
    Jvm,
    CFamily,
    CSharp,
    Ruby,
    Php
}

impl ImportFamily {
    /// Family for a language identifier; `None` when imports are not
    /// extracted for that language.
    pub fn for_language(language: &str) -> Option<Self> {
        let family = match language.to_ascii_lowercase().as_str() {
            "javascript" | "typescript" | "javascriptreact" | "typescriptreact" => {
                Self::JavaScript
            }
            "python" => Self::Python,
            "rust" => Self::Rust,
            "go" => Self::Go,
            "java" | "kotlin" => Self::Jvm,
            "c" | "cpp" => Self::CFamily,
            "csharp" => Self::CSharp,
            "ruby" => Self::Ruby,
            "php" => Self::Php,
            _ => return None
        };
        Some(family)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("src/main.rs")), Some("rust"));
        assert_eq!(detect_language(Path::new("App.TSX")), Some("typescript"));
        assert_eq!(detect_language(Path::new("include/vec.hpp")), Some("cpp"));
        assert_eq!(detect_language(Path::new("README.md")), None);
        assert_eq!(detect_language(Path::new("Makefile")), None);
    }

    #[test]
    fn test_import_family() {
        assert_eq!(ImportFamily::for_language("Kotlin"), Some(ImportFamily::Jvm));
        assert_eq!(ImportFamily::for_language("typescript"), Some(ImportFamily::JavaScript));
        assert_eq!(ImportFamily::for_language("swift"), None);
        assert_eq!(ImportFamily::for_language("cobol"), None);
    }
}
