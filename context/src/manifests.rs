//! Dependency discovery from well-known manifest files at a project root.
//!
//! Every manifest is parsed independently. A manifest that fails to parse
//! is logged and contributes no dependencies; the others are still read.

use errors::ContextError;
use regex::Regex;
use serde_json::Value as JsonValue;
use st_core::Dependency;
use std::path::Path;
use std::sync::LazyLock;
use toml::Value as TomlValue;
use tracing::{debug, warn};

/// Manifest formats recognised at a project root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ManifestKind {
    PackageJson,
    Requirements,
    PyProject,
    Pipfile,
    Cargo,
    GoMod,
    Maven,
    Gradle,
    GradleKotlin,
    Gemfile,
    Composer
}

impl ManifestKind {
    pub const ALL: &'static [ManifestKind] = &[
        Self::PackageJson,
        Self::Requirements,
        Self::PyProject,
        Self::Pipfile,
        Self::Cargo,
        Self::GoMod,
        Self::Maven,
        Self::Gradle,
        Self::GradleKotlin,
        Self::Gemfile,
        Self::Composer,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::PackageJson => "package.json",
            Self::Requirements => "requirements.txt",
            Self::PyProject => "pyproject.toml",
            Self::Pipfile => "Pipfile",
            Self::Cargo => "Cargo.toml",
            Self::GoMod => "go.mod",
            Self::Maven => "pom.xml",
            Self::Gradle => "build.gradle",
            Self::GradleKotlin => "build.gradle.kts",
            Self::Gemfile => "Gemfile",
            Self::Composer => "composer.json"
        }
    }

    pub fn parse(&self, content: &str) -> Result<Vec<Dependency>, ContextError> {
        let manifest = self.file_name();
        match self {
            Self::PackageJson => parse_package_json(content, manifest),
            Self::Requirements => Ok(parse_requirements(content, manifest)),
            Self::PyProject => parse_pyproject(content, manifest),
            Self::Pipfile => parse_pipfile(content, manifest),
            Self::Cargo => parse_cargo(content, manifest),
            Self::GoMod => Ok(parse_go_mod(content, manifest)),
            Self::Maven => Ok(parse_pom(content, manifest)),
            Self::Gradle | Self::GradleKotlin => Ok(parse_gradle(content, manifest)),
            Self::Gemfile => Ok(parse_gemfile(content, manifest)),
            Self::Composer => parse_composer(content, manifest)
        }
    }
}

/// True when `dir` holds any recognised manifest.
pub fn has_manifest(dir: &Path) -> bool {
    ManifestKind::ALL
        .iter()
        .any(|kind| dir.join(kind.file_name()).is_file())
}

/// Dependencies declared by every manifest found directly in `root`.
pub fn read_dependencies(root: &Path) -> Vec<Dependency> {
    let mut dependencies = Vec::new();

    for kind in ManifestKind::ALL {
        let path = root.join(kind.file_name());
        if !path.is_file() {
            continue;
        }

        let parsed = std::fs::read_to_string(&path)
            .map_err(|e| ContextError::Io {
                path: path.display().to_string(),
                reason: e.to_string()
            })
            .and_then(|content| kind.parse(&content));

        match parsed {
            Ok(found) => {
                debug!(manifest = %path.display(), count = found.len(), "Read manifest");
                dependencies.extend(found);
            }
            Err(e) => {
                warn!(manifest = %path.display(), error = %e, "Skipping unreadable manifest");
            }
        }
    }

    dependencies
}

fn parse_error(manifest: &str, reason: impl ToString) -> ContextError {
    ContextError::ManifestParse {
        manifest: manifest.to_string(),
        reason: reason.to_string()
    }
}

// ============================================================================
// JSON manifests
// ============================================================================

fn json_section(doc: &JsonValue, section: &str, manifest: &str, dev: bool) -> Vec<Dependency> {
    doc.get(section)
        .and_then(JsonValue::as_object)
        .map(|deps| {
            deps.iter()
                .map(|(name, version)| {
                    Dependency::new(name, version.as_str().map(str::to_string), manifest).dev(dev)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_package_json(content: &str, manifest: &str) -> Result<Vec<Dependency>, ContextError> {
    let doc: JsonValue = serde_json::from_str(content).map_err(|e| parse_error(manifest, e))?;

    let mut deps = json_section(&doc, "dependencies", manifest, false);
    deps.extend(json_section(&doc, "optionalDependencies", manifest, false));
    deps.extend(json_section(&doc, "peerDependencies", manifest, false));
    deps.extend(json_section(&doc, "devDependencies", manifest, true));
    Ok(deps)
}

fn parse_composer(content: &str, manifest: &str) -> Result<Vec<Dependency>, ContextError> {
    let doc: JsonValue = serde_json::from_str(content).map_err(|e| parse_error(manifest, e))?;

    let platform = |d: &Dependency| d.name == "php" || d.name.starts_with("ext-");
    let mut deps: Vec<_> = json_section(&doc, "require", manifest, false)
        .into_iter()
        .filter(|d| !platform(d))
        .collect();
    deps.extend(
        json_section(&doc, "require-dev", manifest, true)
            .into_iter()
            .filter(|d| !platform(d))
    );
    Ok(deps)
}

// ============================================================================
// Python
// ============================================================================

/// Split a PEP 508 requirement into name and version specifier.
fn split_requirement(line: &str) -> Option<(String, Option<String>)> {
    let line = line.split(';').next()?.trim();
    if line.is_empty() {
        return None;
    }

    let end = line
        .find(|c: char| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.')))
        .unwrap_or(line.len());
    let name = &line[..end];
    if name.is_empty() {
        return None;
    }

    let rest = line[end..].trim();
    let rest = if rest.starts_with('[') {
        rest.find(']').map_or("", |close| rest[close + 1..].trim())
    } else {
        rest
    };
    let version = (!rest.is_empty()).then(|| rest.trim_start_matches('@').trim().to_string());

    Some((name.to_string(), version))
}

fn parse_requirements(content: &str, manifest: &str) -> Vec<Dependency> {
    content
        .lines()
        .map(|line| line.split('#').next().unwrap_or_default().trim())
        .filter(|line| !line.is_empty() && !line.starts_with('-'))
        .filter_map(split_requirement)
        .map(|(name, version)| Dependency::new(name, version, manifest))
        .collect()
}

fn toml_version(value: &TomlValue) -> Option<String> {
    match value {
        TomlValue::String(version) => Some(version.clone()),
        TomlValue::Table(table) => table
            .get("version")
            .and_then(TomlValue::as_str)
            .map(str::to_string),
        _ => None
    }
}

fn toml_table_deps(
    table: Option<&TomlValue>,
    manifest: &str,
    dev: bool,
    skip: &[&str]
) -> Vec<Dependency> {
    table
        .and_then(TomlValue::as_table)
        .map(|deps| {
            deps.iter()
                .filter(|(name, _)| !skip.contains(&name.as_str()))
                .map(|(name, value)| Dependency::new(name, toml_version(value), manifest).dev(dev))
                .collect()
        })
        .unwrap_or_default()
}

fn pep508_list(value: Option<&TomlValue>, manifest: &str, dev: bool) -> Vec<Dependency> {
    value
        .and_then(TomlValue::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(TomlValue::as_str)
                .filter_map(split_requirement)
                .map(|(name, version)| Dependency::new(name, version, manifest).dev(dev))
                .collect()
        })
        .unwrap_or_default()
}

fn parse_pyproject(content: &str, manifest: &str) -> Result<Vec<Dependency>, ContextError> {
    let doc: toml::Table = toml::from_str(content).map_err(|e| parse_error(manifest, e))?;
    let mut deps = Vec::new();

    if let Some(project) = doc.get("project") {
        deps.extend(pep508_list(project.get("dependencies"), manifest, false));
        if let Some(extras) = project
            .get("optional-dependencies")
            .and_then(TomlValue::as_table)
        {
            for group in extras.values() {
                deps.extend(pep508_list(Some(group), manifest, true));
            }
        }
    }

    if let Some(poetry) = doc.get("tool").and_then(|tool| tool.get("poetry")) {
        deps.extend(toml_table_deps(
            poetry.get("dependencies"),
            manifest,
            false,
            &["python"]
        ));
        deps.extend(toml_table_deps(
            poetry.get("dev-dependencies"),
            manifest,
            true,
            &[]
        ));
        if let Some(groups) = poetry.get("group").and_then(TomlValue::as_table) {
            for group in groups.values() {
                deps.extend(toml_table_deps(group.get("dependencies"), manifest, true, &[]));
            }
        }
    }

    Ok(deps)
}

fn parse_pipfile(content: &str, manifest: &str) -> Result<Vec<Dependency>, ContextError> {
    let doc: toml::Table = toml::from_str(content).map_err(|e| parse_error(manifest, e))?;

    let mut deps = toml_table_deps(doc.get("packages"), manifest, false, &[]);
    deps.extend(toml_table_deps(doc.get("dev-packages"), manifest, true, &[]));
    Ok(deps)
}

// ============================================================================
// Cargo / Go
// ============================================================================

fn parse_cargo(content: &str, manifest: &str) -> Result<Vec<Dependency>, ContextError> {
    let doc: toml::Table = toml::from_str(content).map_err(|e| parse_error(manifest, e))?;

    let mut deps = toml_table_deps(doc.get("dependencies"), manifest, false, &[]);
    deps.extend(toml_table_deps(doc.get("build-dependencies"), manifest, false, &[]));
    deps.extend(toml_table_deps(doc.get("dev-dependencies"), manifest, true, &[]));
    deps.extend(toml_table_deps(
        doc.get("workspace").and_then(|ws| ws.get("dependencies")),
        manifest,
        false,
        &[]
    ));
    Ok(deps)
}

fn parse_go_mod(content: &str, manifest: &str) -> Vec<Dependency> {
    let mut deps = Vec::new();
    let mut in_block = false;

    for raw in content.lines() {
        let line = raw.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        let spec = if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            line
        } else if let Some(rest) = line.strip_prefix("require") {
            let rest = rest.trim();
            if rest == "(" {
                in_block = true;
                continue;
            }
            rest
        } else {
            continue;
        };

        let mut parts = spec.split_whitespace();
        if let Some(name) = parts.next() {
            deps.push(Dependency::new(
                name,
                parts.next().map(str::to_string),
                manifest
            ));
        }
    }

    deps
}

// ============================================================================
// JVM
// ============================================================================

static POM_DEPENDENCY: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<dependency>(.*?)</dependency>").ok());

static GRADLE_DEPENDENCY: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r#"(?m)^\s*(\w+)\s*\(?\s*['"]([^:'"\s]+):([^:'"\s]+)(?::([^'"\s]+))?['"]"#
    )
    .ok()
});

fn xml_tag<'a>(block: &'a str, tag: &str) -> Option<&'a str> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = block.find(&open)? + open.len();
    let end = block[start..].find(&close)? + start;
    Some(block[start..end].trim())
}

fn parse_pom(content: &str, manifest: &str) -> Vec<Dependency> {
    let Some(pattern) = POM_DEPENDENCY.as_ref() else {
        return Vec::new();
    };

    pattern
        .captures_iter(content)
        .filter_map(|caps| {
            let block = caps.get(1)?.as_str();
            let group = xml_tag(block, "groupId")?;
            let artifact = xml_tag(block, "artifactId")?;
            let version = xml_tag(block, "version").map(str::to_string);
            let dev = xml_tag(block, "scope") == Some("test");
            Some(Dependency::new(format!("{group}:{artifact}"), version, manifest).dev(dev))
        })
        .collect()
}

fn parse_gradle(content: &str, manifest: &str) -> Vec<Dependency> {
    let Some(pattern) = GRADLE_DEPENDENCY.as_ref() else {
        return Vec::new();
    };

    pattern
        .captures_iter(content)
        .filter_map(|caps| {
            let configuration = caps.get(1)?.as_str();
            if matches!(configuration, "id" | "classpath" | "maven" | "url") {
                return None;
            }
            let name = format!("{}:{}", caps.get(2)?.as_str(), caps.get(3)?.as_str());
            let version = caps.get(4).map(|m| m.as_str().to_string());
            let dev = configuration.starts_with("test");
            Some(Dependency::new(name, version, manifest).dev(dev))
        })
        .collect()
}

// ============================================================================
// Ruby
// ============================================================================

static GEM_LINE: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"^\s*gem\s+['"]([^'"]+)['"](?:\s*,\s*['"]([^'"]+)['"])?"#).ok()
});

fn parse_gemfile(content: &str, manifest: &str) -> Vec<Dependency> {
    let Some(pattern) = GEM_LINE.as_ref() else {
        return Vec::new();
    };

    let mut deps = Vec::new();
    let mut dev_group_depth = 0usize;
    let mut open_blocks = 0usize;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.ends_with(" do") {
            open_blocks += 1;
            let dev_group = trimmed.starts_with("group ")
                && (trimmed.contains(":test") || trimmed.contains(":development"));
            if dev_group && dev_group_depth == 0 {
                dev_group_depth = open_blocks;
            }
            continue;
        }
        if trimmed == "end" {
            if open_blocks == dev_group_depth {
                dev_group_depth = 0;
            }
            open_blocks = open_blocks.saturating_sub(1);
            continue;
        }

        if let Some(caps) = pattern.captures(line) {
            if let Some(name) = caps.get(1) {
                let version = caps.get(2).map(|m| m.as_str().to_string());
                deps.push(Dependency::new(name.as_str(), version, manifest).dev(dev_group_depth > 0));
            }
        }
    }

    deps
}
