//! Declaration outline scanner used when no richer symbol service is
//! available.

use async_trait::async_trait;
use errors::ProviderError;
use regex::Regex;
use st_core::{Symbol, SymbolKind, SymbolProvider};
use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use crate::language::detect_language;

type Rules = Vec<(Regex, SymbolKind)>;

fn compile(rules: &[(&str, SymbolKind)]) -> Rules {
    rules
        .iter()
        .filter_map(|(pattern, kind)| Regex::new(pattern).ok().map(|re| (re, *kind)))
        .collect()
}

// First matching rule wins, so receivers and nested forms come first.
static OUTLINE_RULES: LazyLock<HashMap<&'static str, Rules>> = LazyLock::new(|| {
    let rust = compile(&[
        (
            r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const\s+)?(?:async\s+)?(?:unsafe\s+)?(?:extern\s+\S+\s+)?fn\s+(\w+)",
            SymbolKind::Function,
        ),
        (r"^\s*(?:pub(?:\([^)]*\))?\s+)?struct\s+(\w+)", SymbolKind::Struct),
        (r"^\s*(?:pub(?:\([^)]*\))?\s+)?enum\s+(\w+)", SymbolKind::Enum),
        (r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:unsafe\s+)?trait\s+(\w+)", SymbolKind::Trait),
        (r"^\s*(?:pub(?:\([^)]*\))?\s+)?mod\s+(\w+)", SymbolKind::Module),
        (r"^\s*(?:pub(?:\([^)]*\))?\s+)?type\s+(\w+)", SymbolKind::Type),
        (r"^\s*(?:pub(?:\([^)]*\))?\s+)?(?:const|static)\s+(?:mut\s+)?([A-Z][A-Z0-9_]*)\s*:", SymbolKind::Constant),
    ]);
    let python = compile(&[
        (r"^\s*(?:async\s+)?def\s+(\w+)", SymbolKind::Function),
        (r"^\s*class\s+(\w+)", SymbolKind::Class),
        (r"^([A-Z][A-Z0-9_]*)\s*(?::[^=]+)?=", SymbolKind::Constant),
    ]);
    let script = compile(&[
        (r"^\s*(?:export\s+)?(?:default\s+)?(?:async\s+)?function\*?\s+(\w+)", SymbolKind::Function),
        (r"^\s*(?:export\s+)?(?:default\s+)?(?:abstract\s+)?class\s+(\w+)", SymbolKind::Class),
        (r"^\s*(?:export\s+)?interface\s+(\w+)", SymbolKind::Interface),
        (r"^\s*(?:export\s+)?(?:const\s+)?enum\s+(\w+)", SymbolKind::Enum),
        (r"^\s*(?:export\s+)?type\s+(\w+)\s*(?:<[^>]*>)?\s*=", SymbolKind::Type),
        (
            r"^\s*(?:export\s+)?(?:const|let|var)\s+(\w+)\s*(?::[^=]+)?=\s*(?:async\s+)?(?:\([^)]*\)|\w+)\s*=>",
            SymbolKind::Function,
        ),
    ]);
    let go = compile(&[
        (r"^func\s+\([^)]*\)\s*(\w+)", SymbolKind::Method),
        (r"^func\s+(\w+)", SymbolKind::Function),
        (r"^type\s+(\w+)\s+struct\b", SymbolKind::Struct),
        (r"^type\s+(\w+)\s+interface\b", SymbolKind::Interface),
        (r"^type\s+(\w+)", SymbolKind::Type),
    ]);
    let jvm = compile(&[
        (r"^\s*(?:[\w@]+\s+)*interface\s+(\w+)", SymbolKind::Interface),
        (r"^\s*(?:[\w@]+\s+)*enum\s+(?:class\s+)?(\w+)", SymbolKind::Enum),
        (r"^\s*(?:[\w@]+\s+)*(?:class|record|object)\s+(\w+)", SymbolKind::Class),
        (r"^\s*(?:[\w@]+\s+)*fun\s+(?:<[^>]*>\s*)?(?:[\w.]+\.)?(\w+)\s*\(", SymbolKind::Function),
        (
            r"^\s*(?:public|protected|private)\s+(?:static\s+|final\s+|abstract\s+|synchronized\s+)*[\w<>\[\],.?\s]+?\s+(\w+)\s*\([^)]*\)\s*(?:throws\s+[\w.,\s]+)?\{?\s*$",
            SymbolKind::Method,
        ),
    ]);
    let csharp = compile(&[
        (r"^\s*(?:[\w]+\s+)*interface\s+(\w+)", SymbolKind::Interface),
        (r"^\s*(?:[\w]+\s+)*enum\s+(\w+)", SymbolKind::Enum),
        (r"^\s*(?:[\w]+\s+)*struct\s+(\w+)", SymbolKind::Struct),
        (r"^\s*(?:[\w]+\s+)*(?:class|record)\s+(\w+)", SymbolKind::Class),
        (r"^\s*namespace\s+([\w.]+)", SymbolKind::Module),
        (
            r"^\s*(?:public|protected|private|internal)\s+(?:static\s+|async\s+|virtual\s+|override\s+|abstract\s+)*[\w<>\[\],.?]+\s+(\w+)\s*\([^)]*\)\s*\{?\s*$",
            SymbolKind::Method,
        ),
    ]);
    let c_family = compile(&[
        (r"^\s*(?:typedef\s+)?struct\s+(\w+)\s*\{?\s*$", SymbolKind::Struct),
        (r"^\s*(?:typedef\s+)?enum\s+(?:class\s+)?(\w+)", SymbolKind::Enum),
        (r"^\s*(?:template\s*<[^>]*>\s*)?class\s+(\w+)\s*(?::[^{;]*)?\{?\s*$", SymbolKind::Class),
        (r"^\s*namespace\s+(\w+)", SymbolKind::Module),
        (
            r"^(?:static\s+|inline\s+|extern\s+|const\s+)*[A-Za-z_][\w:<>*&\s]*?[\s*&]+(\w+)\s*\([^;]*\)\s*(?:const\s*)?\{?\s*$",
            SymbolKind::Function,
        ),
    ]);
    let ruby = compile(&[
        (r"^\s*def\s+(?:self\.)?(\w+[?!=]?)", SymbolKind::Function),
        (r"^\s*class\s+([\w:]+)", SymbolKind::Class),
        (r"^\s*module\s+([\w:]+)", SymbolKind::Module),
    ]);
    let php = compile(&[
        (r"^\s*(?:(?:public|protected|private|static|abstract|final)\s+)*function\s+&?(\w+)", SymbolKind::Function),
        (r"^\s*(?:abstract\s+|final\s+)?class\s+(\w+)", SymbolKind::Class),
        (r"^\s*interface\s+(\w+)", SymbolKind::Interface),
        (r"^\s*trait\s+(\w+)", SymbolKind::Trait),
        (r"^\s*enum\s+(\w+)", SymbolKind::Enum),
    ]);
    let swift = compile(&[
        (r"^\s*(?:[\w@]+\s+)*func\s+(\w+)", SymbolKind::Function),
        (r"^\s*(?:[\w@]+\s+)*protocol\s+(\w+)", SymbolKind::Interface),
        (r"^\s*(?:[\w@]+\s+)*struct\s+(\w+)", SymbolKind::Struct),
        (r"^\s*(?:[\w@]+\s+)*enum\s+(\w+)", SymbolKind::Enum),
        (r"^\s*(?:[\w@]+\s+)*class\s+(\w+)", SymbolKind::Class),
    ]);

    let mut rules = HashMap::new();
    rules.insert("rust", rust);
    rules.insert("python", python);
    rules.insert("javascript", script.clone());
    rules.insert("typescript", script);
    rules.insert("go", go);
    rules.insert("java", jvm.clone());
    rules.insert("kotlin", jvm);
    rules.insert("csharp", csharp);
    rules.insert("c", c_family.clone());
    rules.insert("cpp", c_family);
    rules.insert("ruby", ruby);
    rules.insert("php", php);
    rules.insert("swift", swift);
    rules
});

const NOT_DECLARATIONS: &[&str] = &["if", "for", "while", "switch", "return", "catch", "else", "new"];

/// Line-based outline of top-level and nested declarations.
///
/// Functions declared on an indented line are reported as methods.
#[derive(Debug, Clone, Default)]
pub struct OutlineSymbolProvider;

impl OutlineSymbolProvider {
    pub fn new() -> Self {
        Self
    }

    /// Outline of `content` without going through the async seam.
    pub fn outline(&self, content: &str, language: &str) -> Vec<Symbol> {
        let Some(rules) = OUTLINE_RULES.get(language.to_ascii_lowercase().as_str()) else {
            return Vec::new();
        };

        let mut symbols = Vec::new();
        for (index, line) in content.lines().enumerate() {
            let trimmed = line.trim_start();
            let hash_comment = trimmed.starts_with('#') && !matches!(language, "c" | "cpp");
            if trimmed.starts_with("//") || hash_comment {
                continue;
            }

            for (pattern, kind) in rules {
                let Some(name) = pattern.captures(line).and_then(|caps| caps.get(1)) else {
                    continue;
                };
                let name = name.as_str();
                if NOT_DECLARATIONS.contains(&name) {
                    break;
                }

                let indented = line.len() != trimmed.len();
                let kind = match kind {
                    SymbolKind::Function if indented => SymbolKind::Method,
                    other => *other
                };
                symbols.push(Symbol::new(name, kind, index + 1));
                break;
            }
        }
        symbols
    }
}

#[async_trait]
impl SymbolProvider for OutlineSymbolProvider {
    fn name(&self) -> &str {
        "outline"
    }

    async fn document_symbols(
        &self,
        path: &Path,
        content: &str,
        language: Option<&str>
    ) -> Result<Vec<Symbol>, ProviderError> {
        let language = language.or_else(|| detect_language(path));
        Ok(language
            .map(|language| self.outline(content, language))
            .unwrap_or_default())
    }
}
