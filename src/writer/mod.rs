// src/writer/mod.rs

//! Documentation writer - persists the pipeline's accumulated state to disk.
//!
//! README.md and SUMMARY.md land at the project root; everything else goes
//! under the configured docs directory. Write failures are fatal to a run.

mod markdown;
mod seo;

pub use markdown::MarkdownEnhancer;
pub use seo::SeoOptimizer;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::analyzers::{CodeAnalyzer, DependencyParser};
use crate::config::DocsmithConfig;
use crate::llm::DocKind;
use crate::pipeline::PipelineState;

pub struct DocumentationWriter {
    config: DocsmithConfig,
    enhancer: MarkdownEnhancer,
    seo: SeoOptimizer,
    dependency_parser: DependencyParser,
    code_analyzer: CodeAnalyzer,
}

impl DocumentationWriter {
    pub fn new(config: DocsmithConfig) -> Self {
        let enhancer = MarkdownEnhancer::new(config.enable_markdown_enhancements);
        let seo = SeoOptimizer::new(config.enable_seo_optimization);
        Self {
            config,
            enhancer,
            seo,
            dependency_parser: DependencyParser::new(),
            code_analyzer: CodeAnalyzer::new(),
        }
    }

    /// Write every artifact present in the pipeline state.
    /// Returns artifact name -> location for the task result payload.
    pub fn write(
        &self,
        project_path: &Path,
        state: &PipelineState,
    ) -> Result<HashMap<String, String>> {
        let docs_dir = project_path.join(&self.config.docs_directory);
        std::fs::create_dir_all(&docs_dir)
            .with_context(|| format!("failed to create docs directory {}", docs_dir.display()))?;
        info!("Writing documentation to {}", docs_dir.display());

        let mut written = HashMap::new();

        if self.config.create_readme {
            if let Some(readme) = &state.readme {
                let path = project_path.join("README.md");
                if self.should_write(&path) {
                    let content =
                        self.finalize(self.enhance_readme(readme, state), state, DocKind::Readme);
                    self.write_file(&path, &content)?;
                    written.insert("README.md".to_string(), path_string(&path));
                }
            }
        }

        if self.config.generate_summary {
            if let Some(summary) = &state.summary {
                let path = project_path.join("SUMMARY.md");
                if self.should_write(&path) {
                    let content = self.summary_file(summary, state);
                    self.write_file(&path, &content)?;
                    written.insert("SUMMARY.md".to_string(), path_string(&path));
                }
            }
        }

        if self.config.create_architecture_docs {
            if let Some(architecture) = &state.architecture_doc {
                let path = docs_dir.join("ARCHITECTURE.md");
                if self.should_write(&path) {
                    let content = self.finalize(
                        self.enhance_architecture(architecture, state),
                        state,
                        DocKind::Architecture,
                    );
                    self.write_file(&path, &content)?;
                    written.insert("ARCHITECTURE.md".to_string(), path_string(&path));
                }
            }
        }

        if self.config.create_api_docs {
            if let Some(api_doc) = &state.api_doc {
                let path = docs_dir.join("API.md");
                if self.should_write(&path) {
                    let content =
                        self.finalize(self.enhancer.enhance(api_doc), state, DocKind::Api);
                    self.write_file(&path, &content)?;
                    written.insert("API.md".to_string(), path_string(&path));
                }
            }
        }

        if let Some(deps) = &state.dependencies_info {
            if deps.has_any() {
                let path = docs_dir.join("DEPENDENCIES.md");
                if self.should_write(&path) {
                    let content = format!(
                        "# Dependencies & Environment\n\n{}",
                        self.dependency_parser.format_for_documentation(deps)
                    );
                    self.write_file(&path, &content)?;
                    written.insert("DEPENDENCIES.md".to_string(), path_string(&path));
                }
            }
        }

        if self.config.create_contributing {
            let path = docs_dir.join("CONTRIBUTING.md");
            if self.should_write(&path) {
                self.write_file(&path, CONTRIBUTING_TEMPLATE)?;
                written.insert("CONTRIBUTING.md".to_string(), path_string(&path));
            }
        }

        let index_path = docs_dir.join("INDEX.md");
        if self.should_write(&index_path) {
            let content = self.index_file(&written, state);
            self.write_file(&index_path, &content)?;
            written.insert("INDEX.md".to_string(), path_string(&index_path));
        }

        info!("Successfully wrote {} documentation files", written.len());
        Ok(written)
    }

    /// Last enhancement pass: front matter goes on after everything else
    /// so it stays at the very top of the file.
    fn finalize(&self, content: String, state: &PipelineState, kind: DocKind) -> String {
        match &state.analysis {
            Some(analysis) => self.seo.optimize(&content, analysis, kind),
            None => content,
        }
    }

    fn should_write(&self, path: &Path) -> bool {
        if !path.exists() || self.config.overwrite_existing {
            return true;
        }
        warn!(
            "File exists: {}. Set overwrite_existing to replace.",
            path.display()
        );
        false
    }

    fn write_file(&self, path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        std::fs::write(path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
        Ok(())
    }

    fn enhance_readme(&self, readme: &str, state: &PipelineState) -> String {
        let mut content = readme.to_string();

        // Splice the dependency section in ahead of the boilerplate sections
        if let Some(deps) = state.dependencies_info.as_ref().filter(|d| d.has_any()) {
            let section = self.dependency_parser.format_for_documentation(deps);
            if let Some(pos) = content.find("## Contributing") {
                content.insert_str(pos, &format!("{section}\n"));
            } else if let Some(pos) = content.find("## License") {
                content.insert_str(pos, &format!("{section}\n"));
            } else {
                content.push_str("\n\n");
                content.push_str(&section);
            }
        }

        self.enhancer.enhance(&content)
    }

    fn enhance_architecture(&self, architecture: &str, state: &PipelineState) -> String {
        let mut content = architecture.to_string();

        if let Some(structure) = state.code_structure.as_ref().filter(|s| !s.is_empty()) {
            content.push_str("\n\n");
            content.push_str(&self.code_analyzer.format_for_documentation(structure));
        }

        self.enhancer.enhance(&content)
    }

    fn summary_file(&self, summary: &str, state: &PipelineState) -> String {
        let mut lines = Vec::new();

        if let Some(analysis) = &state.analysis {
            lines.push(format!("# {} - Summary\n", analysis.name));
            lines.push(summary.to_string());
            lines.push("\n## Quick Stats\n".to_string());
            lines.push(format!("- **Total Files**: {}", analysis.total_files));
            lines.push(format!("- **Lines of Code**: {}", analysis.total_lines));
            let primary: Vec<_> =
                analysis.language_names().into_iter().take(3).collect();
            lines.push(format!("- **Primary Languages**: {}", primary.join(", ")));
            if !analysis.frameworks.is_empty() {
                lines.push(format!("- **Frameworks**: {}", analysis.frameworks.join(", ")));
            }
        } else {
            lines.push("# Summary\n".to_string());
            lines.push(summary.to_string());
        }

        lines.push("\n---\n".to_string());
        lines.push("*This summary was automatically generated.*".to_string());
        lines.join("\n")
    }

    fn index_file(&self, written: &HashMap<String, String>, state: &PipelineState) -> String {
        let project_name = state
            .analysis
            .as_ref()
            .map(|a| a.name.as_str())
            .unwrap_or("Project");

        let mut lines = vec![
            format!("# {} Documentation Index\n", project_name),
            "This directory contains generated documentation for the project.\n".to_string(),
            "## Documentation Files\n".to_string(),
        ];

        let mut names: Vec<_> = written.keys().collect();
        names.sort();
        for name in names {
            lines.push(format!("- **[{}]({})** - {}", name, name, doc_description(name)));
        }

        if let Some(analysis) = &state.analysis {
            lines.push("\n## Project Statistics\n".to_string());
            lines.push(format!("- **Total Files**: {}", analysis.total_files));
            lines.push(format!("- **Total Lines of Code**: {}", analysis.total_lines));
            lines.push(format!(
                "- **Languages**: {}",
                analysis.language_names().join(", ")
            ));
            lines.push(format!(
                "- **Frameworks**: {}",
                if analysis.frameworks.is_empty() {
                    "None detected".to_string()
                } else {
                    analysis.frameworks.join(", ")
                }
            ));
        }

        lines.push("\n---\n*Documentation generated automatically*".to_string());
        lines.join("\n")
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn doc_description(name: &str) -> &'static str {
    match name {
        "README.md" => "Project overview and getting started guide",
        "SUMMARY.md" => "Concise project summary",
        "ARCHITECTURE.md" => "System architecture and design decisions",
        "API.md" => "API reference and usage documentation",
        "DEPENDENCIES.md" => "Project dependencies and environment setup",
        "CONTRIBUTING.md" => "Guidelines for contributing to the project",
        _ => "Documentation",
    }
}

const CONTRIBUTING_TEMPLATE: &str = "# Contributing Guidelines

Thank you for considering contributing to this project!

## How to Contribute

### Reporting Bugs
- Check if the bug has already been reported in Issues
- Include detailed steps to reproduce the issue
- Specify your environment (OS, version, etc.)

### Pull Requests
1. Fork the repository
2. Create a new branch for your feature
3. Make your changes and add tests
4. Ensure all tests pass
5. Open a Pull Request

### Code Style
- Follow the existing code style in the project
- Write clear, descriptive commit messages
- Update documentation as needed

## Questions?
Feel free to open an issue for any questions or clarifications.
";

pub fn artifact_root(project_path: &Path, docs_directory: &str) -> PathBuf {
    project_path.join(docs_directory)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineState;
    use crate::scanner::ProjectScanner;
    use std::fs;

    fn config() -> DocsmithConfig {
        DocsmithConfig::from_env()
    }

    fn state_for(dir: &Path) -> PipelineState {
        let analysis = ProjectScanner::new(config()).scan(dir).unwrap();
        PipelineState {
            analysis: Some(analysis),
            readme: Some("# Demo\n\nGenerated readme.\n\n## License\n\nMIT.\n".to_string()),
            summary: Some("A small demo project.".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_write_places_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();

        let state = state_for(dir.path());
        let written = DocumentationWriter::new(config()).write(dir.path(), &state).unwrap();

        assert!(written.contains_key("README.md"));
        assert!(written.contains_key("SUMMARY.md"));
        assert!(written.contains_key("INDEX.md"));
        assert!(dir.path().join("README.md").exists());
        assert!(dir.path().join("docs/INDEX.md").exists());
    }

    #[test]
    fn test_existing_files_not_overwritten_by_default() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("README.md"), "hand-written\n").unwrap();

        let state = state_for(dir.path());
        let written = DocumentationWriter::new(config()).write(dir.path(), &state).unwrap();

        assert!(!written.contains_key("README.md"));
        let content = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert_eq!(content, "hand-written\n");
    }

    #[test]
    fn test_overwrite_flag_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("README.md"), "hand-written\n").unwrap();

        let mut cfg = config();
        cfg.overwrite_existing = true;
        let state = state_for(dir.path());
        let written = DocumentationWriter::new(cfg).write(dir.path(), &state).unwrap();

        assert!(written.contains_key("README.md"));
        let content = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(content.contains("Generated readme"));
    }

    #[test]
    fn test_readme_carries_front_matter() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.py"), "print('hi')\n").unwrap();

        let state = state_for(dir.path());
        DocumentationWriter::new(config()).write(dir.path(), &state).unwrap();

        let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.starts_with("---\n"));
        assert!(readme.contains("title: \""));
        // The generated body follows the front matter
        assert!(readme.contains("Generated readme."));
    }

    #[test]
    fn test_summary_file_contains_stats() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("app.py"), "a = 1\nb = 2\n").unwrap();

        let state = state_for(dir.path());
        DocumentationWriter::new(config()).write(dir.path(), &state).unwrap();

        let summary = fs::read_to_string(dir.path().join("SUMMARY.md")).unwrap();
        assert!(summary.contains("A small demo project."));
        assert!(summary.contains("**Lines of Code**: 2"));
    }
}
