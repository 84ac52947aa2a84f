// src/writer/markdown.rs

//! Markdown post-processing: table-of-contents injection, language tags
//! for bare code fences, and collapsible wrapping of long list sections.

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};

/// Minimum number of section headings before a TOC is worth injecting.
const TOC_HEADING_THRESHOLD: usize = 3;

/// Sections longer than this many lines get wrapped in `<details>`.
const COLLAPSE_LINE_THRESHOLD: usize = 15;

/// H3 headings whose sections are candidates for collapsing.
const COLLAPSIBLE_MARKERS: &[&str] = &["Dependencies", "Requirements", "Configuration"];

pub struct MarkdownEnhancer {
    enabled: bool,
}

impl MarkdownEnhancer {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Apply every enhancement pass. No-op when disabled.
    pub fn enhance(&self, content: &str) -> String {
        if !self.enabled {
            return content.to_string();
        }

        let content = self.inject_toc(content);
        let content = tag_bare_code_fences(&content);
        collapse_long_sections(&content)
    }

    /// Inject a table of contents after the first H1. No-op for short
    /// documents.
    fn inject_toc(&self, content: &str) -> String {
        let headings = collect_headings(content);
        if headings.len() < TOC_HEADING_THRESHOLD {
            return content.to_string();
        }

        let mut toc = vec!["## Table of Contents".to_string(), String::new()];
        for (level, text) in &headings {
            let indent = "  ".repeat(level.saturating_sub(2));
            toc.push(format!("{}- [{}](#{})", indent, text, slugify(text)));
        }
        let toc = toc.join("\n");

        // Place the TOC directly after the title line, else at the top
        if let Some(title_end) = content.find('\n').filter(|_| content.starts_with('#')) {
            let (title, rest) = content.split_at(title_end);
            format!("{title}\n\n{toc}\n{rest}")
        } else {
            format!("{toc}\n\n{content}")
        }
    }
}

/// Add a language tag to bare ``` fences, inferred from the preceding
/// lines. Fences that already carry a language are left alone.
fn tag_bare_code_fences(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut result = Vec::with_capacity(lines.len());
    let mut in_code_block = false;

    for (i, line) in lines.iter().enumerate() {
        if line.trim_start().starts_with("```") {
            if !in_code_block {
                in_code_block = true;
                if line.trim() == "```" {
                    let context = lines[i.saturating_sub(3)..i].join(" ").to_lowercase();
                    if let Some(language) = infer_fence_language(&context) {
                        result.push(format!("```{language}"));
                        continue;
                    }
                }
            } else {
                in_code_block = false;
            }
        }
        result.push(line.to_string());
    }

    join_preserving_trailing_newline(content, result)
}

fn infer_fence_language(context: &str) -> Option<&'static str> {
    if context.contains("python") || context.contains("pip install") {
        Some("python")
    } else if context.contains("javascript") || context.contains("npm") {
        Some("javascript")
    } else if context.contains("bash") || context.contains("shell") || context.contains('$') {
        Some("bash")
    } else {
        None
    }
}

/// Wrap long Dependencies/Requirements/Configuration sections in a
/// `<details>` block so they do not dominate the rendered page.
fn collapse_long_sections(content: &str) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let mut result = Vec::with_capacity(lines.len());
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let is_candidate = line.starts_with("###")
            && COLLAPSIBLE_MARKERS.iter().any(|marker| line.contains(marker));

        if !is_candidate {
            result.push(line.to_string());
            i += 1;
            continue;
        }

        result.push(line.to_string());
        i += 1;

        let mut section = Vec::new();
        while i < lines.len() && !lines[i].starts_with("##") {
            section.push(lines[i].to_string());
            i += 1;
        }

        if section.len() > COLLAPSE_LINE_THRESHOLD {
            result.push("<details>".to_string());
            result.push("<summary>Click to expand</summary>\n".to_string());
            result.extend(section);
            result.push("\n</details>\n".to_string());
        } else {
            result.extend(section);
        }
    }

    join_preserving_trailing_newline(content, result)
}

fn join_preserving_trailing_newline(original: &str, lines: Vec<String>) -> String {
    let mut joined = lines.join("\n");
    if original.ends_with('\n') {
        joined.push('\n');
    }
    joined
}

/// H2/H3 headings in document order, skipping any existing TOC heading.
fn collect_headings(content: &str) -> Vec<(usize, String)> {
    let mut headings = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for event in Parser::new(content) {
        match event {
            Event::Start(Tag::Heading { level, .. })
                if matches!(level, HeadingLevel::H2 | HeadingLevel::H3) =>
            {
                current = Some((level as usize, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, buffer)) = current.as_mut() {
                    buffer.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    if text != "Table of Contents" {
                        headings.push((level, text));
                    }
                }
            }
            _ => {}
        }
    }
    headings
}

/// GitHub-style anchor slug.
fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c)
            } else if c == ' ' || c == '-' {
                Some('-')
            } else {
                None
            }
        })
        .collect()
}
