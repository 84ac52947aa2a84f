// src/llm/prompts.rs

//! Prompt construction per document kind.
//!
//! Each builder returns a (system, user) pair assembled from the project
//! analysis. Later kinds fold in the overview generated earlier in the run.

use super::{DocKind, GenerationContext};
use crate::scanner::extension_histogram;

pub fn build(kind: DocKind, context: &GenerationContext<'_>) -> (String, String) {
    match kind {
        DocKind::Overview => overview(context),
        DocKind::Readme => readme(context),
        DocKind::Architecture => architecture(context),
        DocKind::Api => api(context),
        DocKind::Summary => summary(context),
    }
}

fn languages_line(context: &GenerationContext<'_>, limit: usize) -> String {
    let names = context.analysis.language_names();
    names.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
}

fn frameworks_line(context: &GenerationContext<'_>) -> String {
    if context.analysis.frameworks.is_empty() {
        "None detected".to_string()
    } else {
        context.analysis.frameworks.join(", ")
    }
}

fn overview(context: &GenerationContext<'_>) -> (String, String) {
    let system = "You are an expert technical writer creating project documentation.\n\
Based on the project analysis provided, write a clear and comprehensive project overview.\n\
Include:\n\
- Project purpose and main functionality\n\
- Key technologies and languages used\n\
- Project structure and organization\n\
- Notable features and capabilities\n\n\
Be concise but informative. Use professional technical writing style."
        .to_string();

    let user = format!(
        "Project Name: {}\n\
Total Files: {}\n\
Languages: {}\n\
Frameworks: {}\n\
Total Lines of Code: {}\n\n\
Generate a comprehensive project overview.",
        context.analysis.name,
        context.analysis.total_files,
        languages_line(context, usize::MAX),
        frameworks_line(context),
        context.analysis.total_lines,
    );

    (system, user)
}

fn readme(context: &GenerationContext<'_>) -> (String, String) {
    let system = "You are an expert at creating professional, compelling README.md files.\n\
Create a comprehensive README with the following sections:\n\
- Title and brief tagline\n\
- Overview/Description\n\
- Features (bullet points of key capabilities)\n\
- Installation instructions\n\
- Usage examples\n\
- Project structure\n\
- Technologies used\n\
- Contributing guidelines (brief)\n\
- License information\n\n\
Use proper Markdown formatting with headers, code blocks, lists, and tables where appropriate.\n\
Make it easy to navigate."
        .to_string();

    let user = format!(
        "Project Name: {}\n\
Languages: {}\n\
Frameworks: {}\n\
Total Files: {}\n\n\
Project Overview:\n{}\n\n\
Generate a professional README.md file.",
        context.analysis.name,
        languages_line(context, 5),
        frameworks_line(context),
        context.analysis.total_files,
        context.overview.unwrap_or("Not available."),
    );

    (system, user)
}

fn architecture(context: &GenerationContext<'_>) -> (String, String) {
    let system = "You are a software architect creating technical architecture documentation.\n\
Based on the project analysis, create a comprehensive architecture document including:\n\
- High-level system architecture overview\n\
- Key components and their responsibilities\n\
- Technology stack and rationale\n\
- Directory structure and organization\n\
- Data flow and interactions\n\n\
Use Markdown formatting with diagrams described in text."
        .to_string();

    let directories = context.analysis.top_level_dirs();
    let user = format!(
        "Project: {}\n\
Languages: {}\n\
Frameworks: {}\n\
Total Files: {}\n\
Main Directories: {}\n\n\
Generate architecture documentation.",
        context.analysis.name,
        languages_line(context, usize::MAX),
        frameworks_line(context),
        context.analysis.total_files,
        directories.iter().take(10).cloned().collect::<Vec<_>>().join(", "),
    );

    (system, user)
}

fn api(context: &GenerationContext<'_>) -> (String, String) {
    let system = "You are creating API documentation for a software project.\n\
Based on the provided code file information, create comprehensive API documentation including:\n\
- Available endpoints/functions/classes\n\
- Parameters and return types\n\
- Usage examples\n\
- Error handling\n\n\
Use clear Markdown formatting with code examples."
        .to_string();

    let code_files = context.analysis.code_files();
    let histogram = extension_histogram(&code_files);
    let mut extensions: Vec<String> = histogram.keys().cloned().collect();
    extensions.sort();

    let user = format!(
        "Project: {}\n\
Number of Code Files: {}\n\
File Types: {}\n\n\
Generate API documentation structure and overview.",
        context.analysis.name,
        code_files.len(),
        extensions.join(", "),
    );

    (system, user)
}

fn summary(context: &GenerationContext<'_>) -> (String, String) {
    let system = "You are an expert technical writer creating concise project summaries.\n\
Generate a natural-language summary of the project in 1-2 paragraphs (150-200 words).\n\
The summary should:\n\
- Be engaging and informative\n\
- Highlight the main purpose and value proposition\n\
- Mention key technologies used\n\n\
Write in clear, accessible language that both technical and non-technical readers can understand."
        .to_string();

    let overview_excerpt: String =
        context.overview.unwrap_or("").chars().take(500).collect();

    let user = format!(
        "Project Name: {}\n\
Total Files: {}\n\
Languages: {}\n\
Frameworks: {}\n\
Total Lines of Code: {}\n\n\
Project Overview:\n{}\n\n\
Generate a concise, compelling 1-2 paragraph summary.",
        context.analysis.name,
        context.analysis.total_files,
        languages_line(context, 5),
        frameworks_line(context),
        context.analysis.total_lines,
        overview_excerpt,
    );

    (system, user)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::ProjectAnalysis;
    use std::path::PathBuf;

    fn analysis() -> ProjectAnalysis {
        ProjectAnalysis {
            name: "widget".to_string(),
            path: PathBuf::from("/tmp/widget"),
            files: vec![],
            languages: vec![("Rust".to_string(), 3), ("Python".to_string(), 1)],
            frameworks: vec![],
            total_files: 4,
            total_lines: 120,
        }
    }

    #[test]
    fn test_overview_prompt_includes_stats() {
        let analysis = analysis();
        let context = GenerationContext { analysis: &analysis, overview: None };

        let (_, user) = build(DocKind::Overview, &context);
        assert!(user.contains("widget"));
        assert!(user.contains("Rust, Python"));
        assert!(user.contains("None detected"));
    }

    #[test]
    fn test_readme_prompt_folds_in_overview() {
        let analysis = analysis();
        let context =
            GenerationContext { analysis: &analysis, overview: Some("A widget toolkit.") };

        let (_, user) = build(DocKind::Readme, &context);
        assert!(user.contains("A widget toolkit."));
    }

    #[test]
    fn test_summary_prompt_truncates_long_overview() {
        let analysis = analysis();
        let long_overview = "x".repeat(2000);
        let context =
            GenerationContext { analysis: &analysis, overview: Some(&long_overview) };

        let (_, user) = build(DocKind::Summary, &context);
        assert!(user.len() < 1500);
    }
}
