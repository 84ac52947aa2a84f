// src/scanner/mod.rs

//! Project scanner - walks a project tree and extracts structural facts:
//! files, languages, frameworks, and line counts.

use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::DocsmithConfig;

/// Patterns ignored on every scan, independent of the project's .gitignore.
const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "*.log",
    "*.tmp",
    "*.cache",
    "node_modules/",
    "__pycache__/",
    "venv/",
    ".venv/",
    "dist/",
    "build/",
    "target/",
    "coverage/",
];

/// Extensions that count as code for line totals and language detection.
/// Must cover every arm of `detect_language`.
const CODE_EXTENSIONS: &[&str] = &[
    ".py", ".pyw", ".js", ".mjs", ".cjs", ".ts", ".jsx", ".tsx", ".java", ".cpp", ".cc",
    ".cxx", ".c", ".h", ".hpp", ".cs", ".go", ".rs", ".rb", ".php", ".swift", ".kt", ".kts",
    ".scala", ".sh", ".bash", ".zsh", ".sql",
];

/// Filesystem markers that indicate a framework is in use.
const FRAMEWORK_INDICATORS: &[(&str, &[&str])] = &[
    ("Django", &["manage.py", "settings.py"]),
    ("Flask", &["app.py", "wsgi.py"]),
    ("FastAPI", &["main.py"]),
    ("React", &["src/App.jsx", "src/App.tsx"]),
    ("Vue", &["vue.config.js", "nuxt.config.js"]),
    ("Angular", &["angular.json"]),
    ("Next.js", &["next.config.js"]),
    ("Express", &["server.js"]),
    ("Spring", &["pom.xml", "build.gradle"]),
    ("Rails", &["Gemfile", "config/application.rb"]),
];

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("project path does not exist: {0}")]
    PathNotFound(PathBuf),
    #[error("project path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("failed to build scan walker: {0}")]
    Walker(#[from] ignore::Error),
}

/// A single file observed during the scan.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Path relative to the project root
    pub path: String,
    pub name: String,
    pub extension: String,
    pub size: u64,
    pub is_code: bool,
    /// Line count, only populated for code files
    pub lines: Option<usize>,
}

/// Structured facts about a scanned project. Immutable once produced.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectAnalysis {
    pub name: String,
    pub path: PathBuf,
    pub files: Vec<FileRecord>,
    /// Language name -> code file count, ordered by descending count
    /// (ties broken by first-seen order)
    pub languages: Vec<(String, usize)>,
    pub frameworks: Vec<String>,
    pub total_files: usize,
    pub total_lines: usize,
}

impl ProjectAnalysis {
    /// Language names in detection order (most common first)
    pub fn language_names(&self) -> Vec<String> {
        self.languages.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Only the code files from the scan
    pub fn code_files(&self) -> Vec<&FileRecord> {
        self.files.iter().filter(|f| f.is_code).collect()
    }

    /// Top-level directories containing scanned files
    pub fn top_level_dirs(&self) -> Vec<String> {
        let mut dirs: Vec<String> = self
            .files
            .iter()
            .filter_map(|f| {
                let mut parts = f.path.split('/');
                let first = parts.next()?;
                // Only count it as a directory if the path has more segments
                parts.next().map(|_| first.to_string())
            })
            .collect();
        dirs.sort();
        dirs.dedup();
        dirs
    }
}

/// Scans and analyzes a project directory.
pub struct ProjectScanner {
    config: DocsmithConfig,
}

impl ProjectScanner {
    pub fn new(config: DocsmithConfig) -> Self {
        Self { config }
    }

    /// Scan a project directory and return its analysis.
    ///
    /// Fails only on environment problems at the root (missing path, not a
    /// directory). Unreadable individual files are skipped with a warning.
    pub fn scan(&self, project_path: &Path) -> Result<ProjectAnalysis, ScanError> {
        let root = project_path
            .canonicalize()
            .map_err(|_| ScanError::PathNotFound(project_path.to_path_buf()))?;

        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root));
        }

        info!("Scanning project at: {}", root.display());

        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "project".to_string());

        let mut files = Vec::new();
        let mut language_counts: Vec<(String, usize)> = Vec::new();
        let mut total_lines = 0usize;

        for entry in self.build_walker(&root)? {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }

            let Some(record) = self.analyze_file(entry.path(), &root) else {
                continue;
            };

            if record.is_code {
                total_lines += record.lines.unwrap_or(0);
                if let Some(language) = detect_language(&record.extension) {
                    bump_language(&mut language_counts, language);
                }
            }
            files.push(record);
        }

        // Descending by count; stable sort preserves first-seen order for ties
        language_counts.sort_by(|a, b| b.1.cmp(&a.1));

        let frameworks = detect_frameworks(&root);
        let total_files = files.len();

        info!(
            "Scan complete. Found {} files in {} languages",
            total_files,
            language_counts.len()
        );

        Ok(ProjectAnalysis {
            name,
            path: root,
            files,
            languages: language_counts,
            frameworks,
            total_files,
            total_lines,
        })
    }

    fn build_walker(&self, root: &Path) -> Result<ignore::Walk, ScanError> {
        let mut overrides = OverrideBuilder::new(root);
        for pattern in DEFAULT_IGNORE_PATTERNS {
            // A leading "!" makes the override an ignore rule
            overrides.add(&format!("!{pattern}"))?;
        }
        for pattern in self.config.ignore_patterns() {
            overrides.add(&format!("!{pattern}"))?;
        }

        let mut builder = WalkBuilder::new(root);
        builder
            .overrides(overrides.build()?)
            .max_depth(Some(self.config.max_scan_depth))
            .max_filesize(Some(self.config.max_file_size_mb * 1024 * 1024))
            .follow_links(false);

        Ok(builder.build())
    }

    fn analyze_file(&self, file_path: &Path, root: &Path) -> Option<FileRecord> {
        let rel_path = file_path.strip_prefix(root).ok()?;
        let metadata = match file_path.metadata() {
            Ok(m) => m,
            Err(e) => {
                debug!("Cannot stat {}: {}", file_path.display(), e);
                return None;
            }
        };

        let extension = file_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
            .unwrap_or_default();
        let is_code = CODE_EXTENSIONS.contains(&extension.as_str());

        let lines = if is_code {
            match std::fs::read_to_string(file_path) {
                Ok(content) => Some(content.lines().count()),
                Err(e) => {
                    debug!("Could not count lines in {}: {}", file_path.display(), e);
                    Some(0)
                }
            }
        } else {
            None
        };

        Some(FileRecord {
            path: rel_path.to_string_lossy().replace('\\', "/"),
            name: file_path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
            extension,
            size: metadata.len(),
            is_code,
            lines,
        })
    }
}

/// Map a file extension to a language name.
fn detect_language(extension: &str) -> Option<&'static str> {
    let language = match extension {
        ".py" | ".pyw" => "Python",
        ".js" | ".mjs" | ".cjs" => "JavaScript",
        ".ts" | ".tsx" => "TypeScript",
        ".jsx" => "JavaScript",
        ".java" => "Java",
        ".cpp" | ".cc" | ".cxx" | ".hpp" | ".h" => "C++",
        ".c" => "C",
        ".cs" => "C#",
        ".go" => "Go",
        ".rs" => "Rust",
        ".rb" => "Ruby",
        ".php" => "PHP",
        ".swift" => "Swift",
        ".kt" | ".kts" => "Kotlin",
        ".scala" => "Scala",
        ".sh" | ".bash" | ".zsh" => "Shell",
        ".sql" => "SQL",
        _ => return None,
    };
    Some(language)
}

fn bump_language(counts: &mut Vec<(String, usize)>, language: &str) {
    if let Some(entry) = counts.iter_mut().find(|(name, _)| name == language) {
        entry.1 += 1;
    } else {
        counts.push((language.to_string(), 1));
    }
}

fn detect_frameworks(root: &Path) -> Vec<String> {
    let mut frameworks = Vec::new();
    for (framework, indicators) in FRAMEWORK_INDICATORS {
        if indicators.iter().any(|marker| root.join(marker).exists()) {
            frameworks.push(framework.to_string());
        }
    }
    frameworks
}

/// Quick per-extension breakdown, used by the API docs generator.
pub fn extension_histogram(files: &[&FileRecord]) -> HashMap<String, usize> {
    let mut histogram = HashMap::new();
    for file in files {
        *histogram.entry(file.extension.clone()).or_insert(0) += 1;
    }
    histogram
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn test_config() -> DocsmithConfig {
        DocsmithConfig::from_env()
    }

    #[test]
    fn test_scan_counts_files_and_lines() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("main.py"),
            "import os\n\ndef main():\n    pass\n",
        )
        .unwrap();
        fs::write(dir.path().join("notes.txt"), "not code\n").unwrap();

        let analysis = ProjectScanner::new(test_config()).scan(dir.path()).unwrap();

        assert_eq!(analysis.total_files, 2);
        assert_eq!(analysis.total_files, analysis.files.len());
        assert_eq!(analysis.total_lines, 4);
        assert_eq!(analysis.languages, vec![("Python".to_string(), 1)]);
    }

    #[test]
    fn test_scan_missing_path_names_the_path() {
        let err = ProjectScanner::new(test_config())
            .scan(Path::new("/definitely/not/a/real/path"))
            .unwrap_err();
        assert!(err.to_string().contains("/definitely/not/a/real/path"));
    }

    #[test]
    fn test_scan_rejects_file_as_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("single.rs");
        fs::write(&file, "fn main() {}\n").unwrap();

        let err = ProjectScanner::new(test_config()).scan(&file).unwrap_err();
        assert!(matches!(err, ScanError::NotADirectory(_)));
    }

    #[test]
    fn test_default_ignores_skip_vendor_dirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("node_modules/lib")).unwrap();
        fs::write(dir.path().join("node_modules/lib/index.js"), "x\n").unwrap();
        fs::write(dir.path().join("index.js"), "console.log('hi');\n").unwrap();

        let analysis = ProjectScanner::new(test_config()).scan(dir.path()).unwrap();

        assert_eq!(analysis.total_files, 1);
        assert_eq!(analysis.files[0].path, "index.js");
    }

    #[test]
    fn test_language_ordering_by_count() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}\n").unwrap();
        fs::write(dir.path().join("c.py"), "pass\n").unwrap();

        let analysis = ProjectScanner::new(test_config()).scan(dir.path()).unwrap();

        assert_eq!(analysis.languages[0].0, "Rust");
        assert_eq!(analysis.languages[0].1, 2);
        assert_eq!(analysis.languages[1].0, "Python");
    }

    #[test]
    fn test_every_detectable_extension_counts_as_code() {
        // Any extension detect_language maps must also be in the code set,
        // or files of that language would never be counted
        for extension in [
            ".py", ".pyw", ".js", ".mjs", ".cjs", ".ts", ".tsx", ".jsx", ".java", ".cpp",
            ".cc", ".cxx", ".hpp", ".h", ".c", ".cs", ".go", ".rs", ".rb", ".php", ".swift",
            ".kt", ".kts", ".scala", ".sh", ".bash", ".zsh", ".sql",
        ] {
            assert!(detect_language(extension).is_some(), "{extension} has no language");
            assert!(
                CODE_EXTENSIONS.contains(&extension),
                "{extension} is detectable but not counted as code"
            );
        }
    }

    #[test]
    fn test_cc_files_are_counted_as_code() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("engine.cc"), "int main() {\n  return 0;\n}\n").unwrap();

        let analysis = ProjectScanner::new(test_config()).scan(dir.path()).unwrap();

        assert_eq!(analysis.total_lines, 3);
        assert_eq!(analysis.languages, vec![("C++".to_string(), 1)]);
    }

    #[test]
    fn test_framework_detection() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("manage.py"), "#!/usr/bin/env python\n").unwrap();

        let analysis = ProjectScanner::new(test_config()).scan(dir.path()).unwrap();
        assert!(analysis.frameworks.contains(&"Django".to_string()));
    }
}
