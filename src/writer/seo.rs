// src/writer/seo.rs

//! Discoverability front matter for generated documents: a YAML block
//! with title, description, keywords, and tags derived from the document
//! text and the project analysis.

use std::collections::BTreeSet;

use crate::llm::DocKind;
use crate::scanner::ProjectAnalysis;

/// Keywords worth surfacing when the document text mentions them.
const TECH_TERMS: &[&str] = &[
    "api", "rest", "graphql", "database", "authentication", "authorization", "docker",
    "kubernetes", "testing", "deployment", "frontend", "backend", "web", "cloud", "cli",
    "sdk", "library", "framework", "open source", "tool",
];

const MAX_KEYWORDS: usize = 20;
const MAX_TAGS: usize = 15;
const MAX_DESCRIPTION_CHARS: usize = 160;

pub struct SeoOptimizer {
    enabled: bool,
}

impl SeoOptimizer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Prepend a YAML front-matter block. Documents that already carry
    /// front matter are left alone, as is everything when disabled.
    pub fn optimize(&self, content: &str, analysis: &ProjectAnalysis, kind: DocKind) -> String {
        if !self.enabled || content.starts_with("---") {
            return content.to_string();
        }

        let title = title_for(&analysis.name, kind);
        let description = describe(content, analysis);
        let keywords = extract_keywords(content, analysis);
        let tags = derive_tags(analysis, &keywords);
        let languages = analysis.language_names();

        let mut block = vec![
            "---".to_string(),
            format!("title: \"{}\"", yaml_safe(&title)),
            format!("description: \"{}\"", yaml_safe(&description)),
        ];
        if !keywords.is_empty() {
            let shown: Vec<_> = keywords.iter().take(10).cloned().collect();
            block.push(format!("keywords: \"{}\"", shown.join(", ")));
        }
        if !tags.is_empty() {
            block.push(format!("tags: [{}]", tags.join(", ")));
        }
        if !languages.is_empty() {
            block.push(format!("languages: [{}]", languages.join(", ")));
        }
        block.push("---\n".to_string());

        format!("{}\n{}", block.join("\n"), content)
    }
}

fn title_for(project_name: &str, kind: DocKind) -> String {
    match kind {
        DocKind::Readme => format!("{project_name} - Documentation"),
        DocKind::Api => format!("{project_name} API Reference"),
        DocKind::Architecture => format!("{project_name} Architecture Guide"),
        _ => project_name.to_string(),
    }
}

/// First paragraph after the title, clipped for search-result snippets.
/// Falls back to a stats sentence when the document has no prose yet.
fn describe(content: &str, analysis: &ProjectAnalysis) -> String {
    let mut collected = String::new();
    let mut found_title = false;

    for line in content.lines() {
        if line.starts_with("# ") {
            found_title = true;
            continue;
        }
        if !found_title {
            continue;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            if !collected.is_empty() {
                break;
            }
            continue;
        }
        // Skip badges and images
        if line.starts_with("[!") || line.starts_with("![") {
            continue;
        }
        if !collected.is_empty() {
            collected.push(' ');
        }
        collected.push_str(line);
        if collected.len() > 150 {
            break;
        }
    }

    if collected.is_empty() {
        let languages: Vec<_> = analysis.language_names().into_iter().take(3).collect();
        collected = format!(
            "A {} project with {} files and {} lines of code.",
            languages.join(", "),
            analysis.total_files,
            analysis.total_lines
        );
    }

    if collected.chars().count() > MAX_DESCRIPTION_CHARS {
        let clipped: String = collected.chars().take(MAX_DESCRIPTION_CHARS - 3).collect();
        format!("{clipped}...")
    } else {
        collected
    }
}

fn extract_keywords(content: &str, analysis: &ProjectAnalysis) -> Vec<String> {
    let mut keywords = BTreeSet::new();

    for language in analysis.language_names() {
        keywords.insert(language.to_lowercase());
    }
    for framework in &analysis.frameworks {
        keywords.insert(framework.to_lowercase());
    }

    let content_lower = content.to_lowercase();
    for term in TECH_TERMS {
        if content_lower.contains(term) {
            keywords.insert(term.to_string());
        }
    }

    keywords.into_iter().take(MAX_KEYWORDS).collect()
}

fn derive_tags(analysis: &ProjectAnalysis, keywords: &[String]) -> Vec<String> {
    let mut tags = BTreeSet::new();

    for language in analysis.language_names() {
        tags.insert(language.to_lowercase());
    }
    for framework in &analysis.frameworks {
        tags.insert(framework.to_lowercase());
    }
    for priority in ["library", "framework", "cli", "api", "tool"] {
        if keywords.iter().any(|k| k == priority) {
            tags.insert(priority.to_string());
        }
    }

    tags.into_iter().take(MAX_TAGS).collect()
}

fn yaml_safe(text: &str) -> String {
    text.replace('"', "'")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn analysis() -> ProjectAnalysis {
        ProjectAnalysis {
            name: "widget".to_string(),
            path: PathBuf::from("/tmp/widget"),
            files: vec![],
            languages: vec![("Rust".to_string(), 3)],
            frameworks: vec!["Django".to_string()],
            total_files: 3,
            total_lines: 90,
        }
    }

    #[test]
    fn test_front_matter_prepended() {
        let doc = "# widget\n\nA toolkit for building widgets with a CLI.\n";
        let optimized = SeoOptimizer::new(true).optimize(doc, &analysis(), DocKind::Readme);

        assert!(optimized.starts_with("---\n"));
        assert!(optimized.contains("title: \"widget - Documentation\""));
        assert!(optimized.contains("A toolkit for building widgets"));
        assert!(optimized.contains("languages: [Rust]"));
        assert!(optimized.contains("django"));
        // Original document follows the block
        assert!(optimized.contains("---\n\n# widget"));
    }

    #[test]
    fn test_existing_front_matter_untouched() {
        let doc = "---\ntitle: custom\n---\n\n# widget\n";
        let optimized = SeoOptimizer::new(true).optimize(doc, &analysis(), DocKind::Readme);
        assert_eq!(optimized, doc);
    }

    #[test]
    fn test_disabled_is_identity() {
        let doc = "# widget\n\nText.\n";
        let optimized = SeoOptimizer::new(false).optimize(doc, &analysis(), DocKind::Readme);
        assert_eq!(optimized, doc);
    }

    #[test]
    fn test_description_falls_back_to_stats() {
        let doc = "# widget\n";
        let optimized = SeoOptimizer::new(true).optimize(doc, &analysis(), DocKind::Api);

        assert!(optimized.contains("title: \"widget API Reference\""));
        assert!(optimized.contains("A Rust project with 3 files and 90 lines of code."));
    }

    #[test]
    fn test_long_description_is_clipped() {
        let doc = format!("# widget\n\n{}\n", "words ".repeat(100));
        let optimized = SeoOptimizer::new(true).optimize(&doc, &analysis(), DocKind::Readme);

        let description_line = optimized
            .lines()
            .find(|l| l.starts_with("description:"))
            .unwrap();
        assert!(description_line.len() < 200);
        assert!(description_line.contains("..."));
    }
}
