//! Import extraction, one pattern set per language family.
//!
//! Targets are reported in the order they first appear in the source;
//! repeats are dropped.

use crate::language::ImportFamily;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

macro_rules! pattern {
    ($name:ident, $re:expr) => {
        static $name: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new($re).ok());
    };
}

pattern!(
    JS_IMPORT,
    r#"(?m)^[ \t]*import[ \t]+(?:[\w*{}\s,$]+?\s+from\s+)?['"]([^'"]+)['"]"#
);
pattern!(JS_REQUIRE, r#"\brequire\(\s*['"]([^'"]+)['"]\s*\)"#);
pattern!(JS_DYNAMIC_IMPORT, r#"\bimport\(\s*['"]([^'"]+)['"]\s*\)"#);

pattern!(
    PY_IMPORT,
    r"(?m)^[ \t]*import[ \t]+([\w.]+(?:[ \t]+as[ \t]+\w+)?(?:[ \t]*,[ \t]*[\w.]+(?:[ \t]+as[ \t]+\w+)?)*)"
);
pattern!(PY_FROM_IMPORT, r"(?m)^[ \t]*from[ \t]+([\w.]+)[ \t]+import\b");

pattern!(
    RUST_USE,
    r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?[ \t]+)?use[ \t]+([^;]+);"
);
pattern!(RUST_EXTERN_CRATE, r"(?m)^[ \t]*extern[ \t]+crate[ \t]+(\w+)");
pattern!(
    RUST_MOD,
    r"(?m)^[ \t]*(?:pub(?:\([^)]*\))?[ \t]+)?mod[ \t]+(\w+)[ \t]*;"
);

pattern!(GO_IMPORT, r#"(?m)^[ \t]*import[ \t]+(?:[\w.]+[ \t]+)?"([^"]+)""#);
pattern!(GO_IMPORT_BLOCK, r"(?ms)^[ \t]*import[ \t]*\((.*?)\)");
pattern!(GO_QUOTED, r#""([^"]+)""#);

pattern!(
    JVM_IMPORT,
    r"(?m)^[ \t]*import[ \t]+(?:static[ \t]+)?([\w.]+\*?)"
);

pattern!(C_INCLUDE, r#"(?m)^[ \t]*#[ \t]*include[ \t]*[<"]([^>"]+)[>"]"#);

pattern!(
    CSHARP_USING,
    r"(?m)^[ \t]*(?:global[ \t]+)?using[ \t]+(?:static[ \t]+)?(?:\w+[ \t]*=[ \t]*)?([\w.]+)[ \t]*;"
);

pattern!(
    RUBY_REQUIRE,
    r#"(?m)^[ \t]*require(?:_relative)?[ \t]*\(?[ \t]*['"]([^'"]+)['"]"#
);

pattern!(
    PHP_USE,
    r"(?m)^[ \t]*use[ \t]+([\w\\]+)(?:[ \t]+as[ \t]+\w+)?[ \t]*;"
);
pattern!(
    PHP_REQUIRE,
    r#"\b(?:require|include)(?:_once)?[ \t]*\(?[ \t]*['"]([^'"]+)['"]"#
);

/// Import targets declared in `content`, interpreted as `language`.
///
/// Languages without a known import syntax yield an empty list.
pub fn extract_imports(content: &str, language: &str) -> Vec<String> {
    let Some(family) = ImportFamily::for_language(language) else {
        return Vec::new();
    };

    let mut found: Vec<(usize, String)> = Vec::new();
    match family {
        ImportFamily::JavaScript => {
            collect(JS_IMPORT.as_ref(), content, &mut found);
            collect(JS_REQUIRE.as_ref(), content, &mut found);
            collect(JS_DYNAMIC_IMPORT.as_ref(), content, &mut found);
        }
        ImportFamily::Python => {
            for caps in PY_IMPORT.iter().flat_map(|re| re.captures_iter(content)) {
                let Some(group) = caps.get(1) else { continue };
                for item in group.as_str().split(',') {
                    if let Some(module) = item.split_whitespace().next() {
                        found.push((group.start(), module.to_string()));
                    }
                }
            }
            collect(PY_FROM_IMPORT.as_ref(), content, &mut found);
        }
        ImportFamily::Rust => {
            for caps in RUST_USE.iter().flat_map(|re| re.captures_iter(content)) {
                let Some(group) = caps.get(1) else { continue };
                let path = group.as_str().split_whitespace().collect::<Vec<_>>().join(" ");
                found.push((group.start(), path));
            }
            collect(RUST_EXTERN_CRATE.as_ref(), content, &mut found);
            collect(RUST_MOD.as_ref(), content, &mut found);
        }
        ImportFamily::Go => {
            collect(GO_IMPORT.as_ref(), content, &mut found);
            let (Some(block_pattern), Some(quoted)) = (GO_IMPORT_BLOCK.as_ref(), GO_QUOTED.as_ref())
            else {
                return Vec::new();
            };
            for caps in block_pattern.captures_iter(content) {
                let Some(block) = caps.get(1) else { continue };
                for inner in quoted.captures_iter(block.as_str()) {
                    if let Some(target) = inner.get(1) {
                        found.push((block.start() + target.start(), target.as_str().to_string()));
                    }
                }
            }
        }
        ImportFamily::Jvm => collect(JVM_IMPORT.as_ref(), content, &mut found),
        ImportFamily::CFamily => collect(C_INCLUDE.as_ref(), content, &mut found),
        ImportFamily::CSharp => collect(CSHARP_USING.as_ref(), content, &mut found),
        ImportFamily::Ruby => collect(RUBY_REQUIRE.as_ref(), content, &mut found),
        ImportFamily::Php => {
            collect(PHP_USE.as_ref(), content, &mut found);
            collect(PHP_REQUIRE.as_ref(), content, &mut found);
        }
    }

    found.sort_by_key(|(offset, _)| *offset);

    let mut seen = HashSet::new();
    found
        .into_iter()
        .map(|(_, target)| target)
        .filter(|target| !target.is_empty() && seen.insert(target.clone()))
        .collect()
}

fn collect(pattern: Option<&Regex>, content: &str, found: &mut Vec<(usize, String)>) {
    let Some(pattern) = pattern else { return };
    for caps in pattern.captures_iter(content) {
        if let Some(group) = caps.get(1) {
            found.push((group.start(), group.as_str().trim().to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_javascript_imports() {
        let source = r#"
import React, { useState } from 'react';
import {
  render,
  screen
} from "@testing-library/react";
import './styles.css';
const fs = require('fs');
const lazy = () => import('./lazy-page');
import React from 'react';
"#;
        assert_eq!(
            extract_imports(source, "typescript"),
            vec![
                "react",
                "@testing-library/react",
                "./styles.css",
                "fs",
                "./lazy-page"
            ]
        );
    }

    #[test]
    fn test_python_imports() {
        let source = "import os, sys as system\nfrom collections import OrderedDict\nfrom . import sibling\n    import json\n";
        assert_eq!(
            extract_imports(source, "python"),
            vec!["os", "sys", "collections", ".", "json"]
        );
    }

    #[test]
    fn test_rust_imports() {
        let source = "extern crate serde;\nuse std::collections::HashMap;\npub(crate) use crate::{\n    a,\n    b\n};\nmod parser;\npub mod lexer;\nmod inline {}\n";
        assert_eq!(
            extract_imports(source, "rust"),
            vec![
                "serde",
                "std::collections::HashMap",
                "crate::{ a, b }",
                "parser",
                "lexer"
            ]
        );
    }

    #[test]
    fn test_go_imports() {
        let source = "package main\n\nimport \"fmt\"\nimport (\n\t\"net/http\"\n\tlog \"github.com/sirupsen/logrus\"\n\t\"fmt\"\n)\n";
        assert_eq!(
            extract_imports(source, "go"),
            vec!["fmt", "net/http", "github.com/sirupsen/logrus"]
        );
    }

    #[test]
    fn test_jvm_c_and_csharp_imports() {
        let java = "package a;\nimport java.util.List;\nimport static org.junit.Assert.*;\n";
        assert_eq!(
            extract_imports(java, "java"),
            vec!["java.util.List", "org.junit.Assert.*"]
        );

        let cpp = "#include <vector>\n#  include \"local.h\"\n";
        assert_eq!(extract_imports(cpp, "cpp"), vec!["vector", "local.h"]);

        let csharp = "using System;\nusing IO = System.IO;\nusing (var s = Open()) {}\n";
        assert_eq!(extract_imports(csharp, "csharp"), vec!["System", "System.IO"]);
    }

    #[test]
    fn test_ruby_and_php_imports() {
        let ruby = "require 'json'\nrequire_relative \"lib/helper\"\n";
        assert_eq!(extract_imports(ruby, "ruby"), vec!["json", "lib/helper"]);

        let php = "<?php\nuse App\\Models\\User;\nrequire_once 'vendor/autoload.php';\n";
        assert_eq!(
            extract_imports(php, "php"),
            vec!["App\\Models\\User", "vendor/autoload.php"]
        );
    }

    #[test]
    fn test_unsupported_language_yields_empty() {
        assert!(extract_imports("import Foundation", "swift").is_empty());
        assert!(extract_imports("anything", "brainfuck").is_empty());
    }
}
