// src/analyzers/mod.rs

//! Static analyzers that enrich generated documentation with facts the
//! LLM backend cannot know: declared dependencies and code structure.

mod code_structure;
mod dependency;

pub use code_structure::{CodeAnalyzer, CodeStructure, ModuleInfo};
pub use dependency::{DependencyParser, DependencyReport, ManifestDependencies};
