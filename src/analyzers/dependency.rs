// src/analyzers/dependency.rs

//! Dependency and environment parsing for the manifest formats the scanner
//! commonly encounters: requirements.txt / pyproject.toml, package.json,
//! Cargo.toml, and .env.example.

use anyhow::Result;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info, warn};

/// Dependencies declared by one manifest file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ManifestDependencies {
    pub runtime: Vec<String>,
    pub dev: Vec<String>,
    pub source: String,
}

impl ManifestDependencies {
    fn is_empty(&self) -> bool {
        self.runtime.is_empty() && self.dev.is_empty()
    }
}

/// Aggregated dependency and environment facts for a project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyReport {
    pub python: Option<ManifestDependencies>,
    pub node: Option<ManifestDependencies>,
    pub rust: Option<ManifestDependencies>,
    /// Variable names found in .env.example (values are never recorded)
    pub environment_variables: Vec<String>,
}

impl DependencyReport {
    pub fn has_any(&self) -> bool {
        self.python.is_some()
            || self.node.is_some()
            || self.rust.is_some()
            || !self.environment_variables.is_empty()
    }
}

/// Parses project manifests into a `DependencyReport`.
pub struct DependencyParser;

impl DependencyParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, project_path: &Path) -> DependencyReport {
        let report = DependencyReport {
            python: self.parse_python(project_path),
            node: self.parse_node(project_path),
            rust: self.parse_rust(project_path),
            environment_variables: self.parse_env_file(project_path),
        };

        if report.has_any() {
            info!("Dependency analysis found manifests for {}", project_path.display());
        }
        report
    }

    fn parse_python(&self, project_path: &Path) -> Option<ManifestDependencies> {
        let mut deps = ManifestDependencies::default();

        let req_file = project_path.join("requirements.txt");
        if let Ok(content) = std::fs::read_to_string(&req_file) {
            for line in content.lines() {
                let line = line.trim();
                if !line.is_empty() && !line.starts_with('#') {
                    deps.runtime.push(line.to_string());
                }
            }
            deps.source = "requirements.txt".to_string();
        }

        let pyproject = project_path.join("pyproject.toml");
        if let Ok(content) = std::fs::read_to_string(&pyproject) {
            match self.parse_pyproject(&content) {
                Ok((runtime, dev)) => {
                    deps.runtime.extend(runtime);
                    deps.dev.extend(dev);
                    if deps.source.is_empty() {
                        deps.source = "pyproject.toml".to_string();
                    }
                }
                Err(e) => warn!("Failed to parse pyproject.toml: {}", e),
            }
        }

        (!deps.is_empty()).then_some(deps)
    }

    fn parse_pyproject(&self, content: &str) -> Result<(Vec<String>, Vec<String>)> {
        let parsed: toml::Value = content.parse()?;
        let project = parsed.get("project");

        let string_array = |value: Option<&toml::Value>| -> Vec<String> {
            value
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|d| d.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default()
        };

        let runtime = string_array(project.and_then(|p| p.get("dependencies")));
        let dev = string_array(
            project
                .and_then(|p| p.get("optional-dependencies"))
                .and_then(|o| o.get("dev")),
        );

        Ok((runtime, dev))
    }

    fn parse_node(&self, project_path: &Path) -> Option<ManifestDependencies> {
        let package_json = project_path.join("package.json");
        let content = std::fs::read_to_string(&package_json).ok()?;

        let parsed: serde_json::Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse package.json: {}", e);
                return None;
            }
        };

        let collect = |section: &str| -> Vec<String> {
            parsed[section]
                .as_object()
                .map(|deps| {
                    deps.iter()
                        .map(|(name, version)| {
                            format!("{}@{}", name, version.as_str().unwrap_or("*"))
                        })
                        .collect()
                })
                .unwrap_or_default()
        };

        let deps = ManifestDependencies {
            runtime: collect("dependencies"),
            dev: collect("devDependencies"),
            source: "package.json".to_string(),
        };
        (!deps.is_empty()).then_some(deps)
    }

    fn parse_rust(&self, project_path: &Path) -> Option<ManifestDependencies> {
        let cargo_toml = project_path.join("Cargo.toml");
        let content = std::fs::read_to_string(&cargo_toml).ok()?;

        let parsed: toml::Value = match content.parse() {
            Ok(v) => v,
            Err(e) => {
                warn!("Failed to parse Cargo.toml: {}", e);
                return None;
            }
        };

        let collect = |section: &str| -> Vec<String> {
            parsed
                .get(section)
                .and_then(|v| v.as_table())
                .map(|deps| deps.keys().cloned().collect())
                .unwrap_or_default()
        };

        let deps = ManifestDependencies {
            runtime: collect("dependencies"),
            dev: collect("dev-dependencies"),
            source: "Cargo.toml".to_string(),
        };
        (!deps.is_empty()).then_some(deps)
    }

    fn parse_env_file(&self, project_path: &Path) -> Vec<String> {
        let env_file = project_path.join(".env.example");
        let Ok(content) = std::fs::read_to_string(&env_file) else {
            return Vec::new();
        };

        // Names only; values in example files are placeholders anyway
        let var_pattern = Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*=").expect("valid regex");
        let mut vars = Vec::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(captures) = var_pattern.captures(line) {
                vars.push(captures[1].to_string());
            } else {
                debug!("Skipping unparseable .env.example line: {}", line);
            }
        }
        vars
    }

    /// Render the report as a Markdown section for README/DEPENDENCIES.md.
    pub fn format_for_documentation(&self, report: &DependencyReport) -> String {
        let mut lines = vec!["## Dependencies".to_string(), String::new()];

        let mut render = |title: &str, deps: &Option<ManifestDependencies>| {
            if let Some(deps) = deps {
                lines.push(format!("### {} (`{}`)", title, deps.source));
                lines.push(String::new());
                for dep in &deps.runtime {
                    lines.push(format!("- {dep}"));
                }
                if !deps.dev.is_empty() {
                    lines.push(String::new());
                    lines.push("Development:".to_string());
                    for dep in &deps.dev {
                        lines.push(format!("- {dep}"));
                    }
                }
                lines.push(String::new());
            }
        };

        render("Python", &report.python);
        render("Node.js", &report.node);
        render("Rust", &report.rust);

        if !report.environment_variables.is_empty() {
            lines.push("### Environment Variables".to_string());
            lines.push(String::new());
            lines.push("Configured via `.env` (see `.env.example`):".to_string());
            lines.push(String::new());
            for var in &report.environment_variables {
                lines.push(format!("- `{var}`"));
            }
            lines.push(String::new());
        }

        lines.join("\n")
    }
}

impl Default for DependencyParser {
    fn default() -> Self {
        Self::new()
    }
}
