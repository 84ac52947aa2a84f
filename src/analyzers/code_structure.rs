// src/analyzers/code_structure.rs

//! Lightweight code structure analysis: per-module classes, functions, and
//! imports, plus a text rendering of intra-project import relationships.
//!
//! Extraction is regex-based and deliberately shallow - enough for a
//! documentation cross-reference section, not a compiler front end.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

use crate::scanner::{FileRecord, ProjectAnalysis};

/// Files examined per run; structure sections do not need exhaustive cover.
const MAX_ANALYZED_FILES: usize = 50;

static PY_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^class\s+(\w+)").expect("valid regex"));
static PY_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^def\s+(\w+)").expect("valid regex"));
static PY_IMPORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:from\s+([\w.]+)\s+import|import\s+([\w.]+))").expect("valid regex")
});

static RS_STRUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:pub\s+)?(?:struct|enum|trait)\s+(\w+)").expect("valid regex"));
static RS_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:\s*pub\s+)?(?:async\s+)?fn\s+(\w+)").expect("valid regex"));
static RS_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^use\s+([\w:]+)").expect("valid regex"));

static JS_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:export\s+)?class\s+(\w+)").expect("valid regex"));
static JS_FUNCTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:export\s+)?(?:async\s+)?function\s+(\w+)").expect("valid regex")
});
static JS_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?m)^import\s+.*?from\s+['"]([^'"]+)['"]"#).expect("valid regex"));

/// Structure facts for one source file.
#[derive(Debug, Clone, Serialize)]
pub struct ModuleInfo {
    pub path: String,
    pub classes: Vec<String>,
    pub functions: Vec<String>,
    pub imports: Vec<String>,
}

/// Aggregated structure facts for a project.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CodeStructure {
    pub modules: Vec<ModuleInfo>,
    pub total_classes: usize,
    pub total_functions: usize,
    /// "a -> b" edges between modules of this project
    pub internal_imports: Vec<String>,
}

impl CodeStructure {
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

/// Extracts code structure from the scanned project.
pub struct CodeAnalyzer;

impl CodeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, project_path: &Path, analysis: &ProjectAnalysis) -> CodeStructure {
        let mut structure = CodeStructure::default();

        for file in analysis.code_files().into_iter().take(MAX_ANALYZED_FILES) {
            let Some(module) = self.analyze_file(project_path, file) else {
                continue;
            };
            structure.total_classes += module.classes.len();
            structure.total_functions += module.functions.len();
            structure.modules.push(module);
        }

        structure.internal_imports = internal_edges(&structure.modules);
        structure
    }

    fn analyze_file(&self, project_path: &Path, file: &FileRecord) -> Option<ModuleInfo> {
        let (class_re, fn_re, import_re): (&Regex, &Regex, &Regex) =
            match file.extension.as_str() {
                ".py" => (&PY_CLASS, &PY_FUNCTION, &PY_IMPORT),
                ".rs" => (&RS_STRUCT, &RS_FUNCTION, &RS_IMPORT),
                ".js" | ".ts" | ".jsx" | ".tsx" => (&JS_CLASS, &JS_FUNCTION, &JS_IMPORT),
                _ => return None,
            };

        let content = match std::fs::read_to_string(project_path.join(&file.path)) {
            Ok(c) => c,
            Err(e) => {
                debug!("Cannot read {} for structure analysis: {}", file.path, e);
                return None;
            }
        };

        let capture_names = |re: &Regex| -> Vec<String> {
            re.captures_iter(&content)
                .filter_map(|c| {
                    c.get(1)
                        .or_else(|| c.get(2))
                        .map(|m| m.as_str().to_string())
                })
                .collect()
        };

        Some(ModuleInfo {
            path: file.path.clone(),
            classes: capture_names(class_re),
            functions: capture_names(fn_re),
            imports: capture_names(import_re),
        })
    }

    /// Render the structure as a Markdown section appended to ARCHITECTURE.md.
    pub fn format_for_documentation(&self, structure: &CodeStructure) -> String {
        let mut lines = vec![
            "## Code Structure".to_string(),
            String::new(),
            format!(
                "{} modules analyzed, {} classes, {} functions.",
                structure.modules.len(),
                structure.total_classes,
                structure.total_functions
            ),
            String::new(),
        ];

        for module in &structure.modules {
            if module.classes.is_empty() && module.functions.is_empty() {
                continue;
            }
            lines.push(format!("### `{}`", module.path));
            if !module.classes.is_empty() {
                lines.push(format!("- Types: {}", module.classes.join(", ")));
            }
            if !module.functions.is_empty() {
                let shown: Vec<_> =
                    module.functions.iter().take(12).cloned().collect();
                lines.push(format!("- Functions: {}", shown.join(", ")));
            }
            lines.push(String::new());
        }

        if !structure.internal_imports.is_empty() {
            lines.push("### Internal Dependencies".to_string());
            lines.push(String::new());
            lines.push("```text".to_string());
            lines.extend(structure.internal_imports.iter().cloned());
            lines.push("```".to_string());
        }

        lines.join("\n")
    }
}

impl Default for CodeAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Match imports against the stems of other analyzed modules.
fn internal_edges(modules: &[ModuleInfo]) -> Vec<String> {
    let stems: Vec<(String, String)> = modules
        .iter()
        .map(|m| {
            let stem = Path::new(&m.path)
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            (m.path.clone(), stem)
        })
        .collect();

    let mut edges = Vec::new();
    for module in modules {
        for import in &module.imports {
            let tail = import
                .rsplit(['.', ':', '/'])
                .next()
                .unwrap_or(import.as_str());
            for (other_path, stem) in &stems {
                if *other_path != module.path && !stem.is_empty() && stem == tail {
                    edges.push(format!("{} -> {}", module.path, other_path));
                }
            }
        }
    }
    edges.sort();
    edges.dedup();
    edges
}
