// src/pipeline/mod.rs

//! Pipeline orchestrator - runs one project's full documentation sequence
//! and reports progress through the task registry.
//!
//! Stage order is fixed: scan, backend connect, generation (overview,
//! readme, architecture, api, static analysis, summary), write. Scanning,
//! connecting, and writing are fatal on failure; individual generation
//! stages are tolerated so one backend hiccup does not discard the work
//! already done for earlier artifacts.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::analyzers::{CodeAnalyzer, CodeStructure, DependencyParser, DependencyReport};
use crate::config::DocsmithConfig;
use crate::llm::{DocKind, GenerationContext, LlmProvider};
use crate::scanner::{ProjectAnalysis, ProjectScanner};
use crate::tasks::{AnalysisSummary, TaskManager, TaskResult, TaskStatus, TaskUpdate};
use crate::writer::DocumentationWriter;

/// Accumulated outputs of one run. Populated stage by stage, handed whole
/// to the writer, then discarded. One run owns one state exclusively.
#[derive(Debug, Clone, Default)]
pub struct PipelineState {
    pub analysis: Option<ProjectAnalysis>,
    pub overview: Option<String>,
    pub readme: Option<String>,
    pub architecture_doc: Option<String>,
    pub api_doc: Option<String>,
    pub dependencies_info: Option<DependencyReport>,
    pub code_structure: Option<CodeStructure>,
    pub summary: Option<String>,
}

/// Identity of a pipeline stage, used to look up its failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Scan,
    ConnectBackend,
    Generate(DocKind),
    Analyze,
    WriteFiles,
}

/// What a stage failure does to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagePolicy {
    /// Abort the run immediately; the task fails.
    Fatal,
    /// Record a failure marker for the artifact and continue.
    Tolerated,
}

impl Stage {
    pub fn policy(&self) -> StagePolicy {
        match self {
            // Scanning and writing are mechanical; failure means an
            // environment problem the caller must fix. Backend connect is
            // a precondition for every generation stage.
            Stage::Scan | Stage::ConnectBackend | Stage::WriteFiles => StagePolicy::Fatal,
            Stage::Generate(_) | Stage::Analyze => StagePolicy::Tolerated,
        }
    }
}

/// Generation stages in dependency order. Readme and summary consume the
/// overview produced before them.
const GENERATION_ORDER: [DocKind; 5] = [
    DocKind::Overview,
    DocKind::Readme,
    DocKind::Architecture,
    DocKind::Api,
    DocKind::Summary,
];

fn failure_marker(kind: DocKind, reason: &str) -> String {
    format!(
        "# {}\n\nGeneration failed for this document: {}\n",
        kind.label(),
        reason
    )
}

/// Orchestrates documentation generation runs.
pub struct DocumentationPipeline {
    config: Arc<RwLock<DocsmithConfig>>,
    tasks: Arc<TaskManager>,
    provider: Arc<dyn LlmProvider>,
}

impl DocumentationPipeline {
    pub fn new(
        config: Arc<RwLock<DocsmithConfig>>,
        tasks: Arc<TaskManager>,
        provider: Arc<dyn LlmProvider>,
    ) -> Self {
        Self { config, tasks, provider }
    }

    /// Run the full sequence for one task. At most one run per task: the
    /// registry's claim is an atomic pending-to-running transition, so a
    /// duplicate invocation loses the claim and is rejected.
    pub async fn run(&self, task_id: Uuid) {
        let Some(task) = self.tasks.claim(task_id).await else {
            warn!("Task {} missing or already claimed, rejecting run", task_id);
            return;
        };

        // Snapshot the live config at claim time; runtime updates after
        // this point do not affect an in-flight run
        let base = self.config.read().await.clone();
        let effective = base.with_overrides(&task.config_overrides);

        match self.execute(task_id, &task.project_path, &effective).await {
            Ok(result) => {
                self.tasks
                    .update(
                        task_id,
                        TaskUpdate {
                            status: Some(TaskStatus::Completed),
                            progress: Some(100),
                            current_step: Some("Completed".to_string()),
                            message: Some("Documentation generated successfully".to_string()),
                            result: Some(result),
                            ..Default::default()
                        },
                    )
                    .await;
                info!("Task {} completed successfully", task_id);
            }
            Err(e) => {
                let error_msg = format!("{e:#}");
                error!("Task {} failed: {}", task_id, error_msg);
                self.tasks
                    .update(
                        task_id,
                        TaskUpdate {
                            status: Some(TaskStatus::Failed),
                            current_step: Some("Failed".to_string()),
                            message: Some("Documentation generation failed".to_string()),
                            error: Some(error_msg),
                            ..Default::default()
                        },
                    )
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        task_id: Uuid,
        project_path: &Path,
        config: &DocsmithConfig,
    ) -> Result<TaskResult> {
        self.report(task_id, 0, "Initializing", "Starting documentation generation")
            .await;

        // Scan (fatal): no partial documentation without a valid project
        self.report(task_id, 10, "Scanning project", "Analyzing project structure")
            .await;
        let analysis = self.scan_stage(project_path, config).await?;

        // Backend connect (fatal, not retried at this layer)
        self.report(task_id, 30, "Initializing AI", "Connecting to generation backend")
            .await;
        let generator = self.provider.connect(config).await?;

        self.report(task_id, 40, "Generating documentation", "Running generation stages")
            .await;
        let mut state = PipelineState { analysis: Some(analysis.clone()), ..Default::default() };
        self.generation_stages(task_id, project_path, config, generator.as_ref(), &analysis, &mut state)
            .await?;

        // Write (fatal): persistence failure surfaces even though
        // generation succeeded
        self.report(task_id, 80, "Writing files", "Saving documentation to disk")
            .await;
        let written = self.write_stage(project_path, config, &state).await?;

        Ok(TaskResult {
            project_path: analysis.path.clone(),
            analysis: AnalysisSummary {
                name: analysis.name.clone(),
                total_files: analysis.total_files,
                total_lines: analysis.total_lines,
                languages: analysis.language_names(),
                frameworks: analysis.frameworks.clone(),
            },
            written_files: written,
            summary: state.summary.clone(),
        })
    }

    async fn scan_stage(
        &self,
        project_path: &Path,
        config: &DocsmithConfig,
    ) -> Result<ProjectAnalysis> {
        let scanner = ProjectScanner::new(config.clone());
        let path = project_path.to_path_buf();
        let analysis = tokio::task::spawn_blocking(move || scanner.scan(&path))
            .await
            .context("scan worker panicked")??;
        Ok(analysis)
    }

    /// Run generators and static analyzers in order, advancing progress
    /// from 40 toward 80. Failures here are tolerated per the policy
    /// table: the artifact gets a failure marker and the run continues.
    async fn generation_stages(
        &self,
        task_id: Uuid,
        project_path: &Path,
        config: &DocsmithConfig,
        generator: &dyn crate::llm::TextGenerator,
        analysis: &ProjectAnalysis,
        state: &mut PipelineState,
    ) -> Result<()> {
        let total_stages = GENERATION_ORDER.len() + 1;
        let mut completed = 0usize;

        for kind in GENERATION_ORDER {
            // Static analysis runs between api and summary so both the
            // writer and the summary stage see its outputs
            if kind == DocKind::Summary {
                self.analyze_stage(project_path, config, analysis, state);
                completed += 1;
                self.progress(task_id, 40 + (completed * 40 / total_stages) as u8)
                    .await;
            }

            let context =
                GenerationContext { analysis, overview: state.overview.as_deref() };
            let output = match generator.generate(kind, &context).await {
                Ok(text) => text,
                Err(e) if Stage::Generate(kind).policy() == StagePolicy::Tolerated => {
                    warn!(
                        "Generation stage '{}' failed (continuing): {:#}",
                        kind.label(),
                        e
                    );
                    failure_marker(kind, &format!("{e:#}"))
                }
                Err(e) => return Err(e),
            };

            match kind {
                DocKind::Overview => state.overview = Some(output),
                DocKind::Readme => state.readme = Some(output),
                DocKind::Architecture => state.architecture_doc = Some(output),
                DocKind::Api => state.api_doc = Some(output),
                DocKind::Summary => state.summary = Some(output),
            }

            completed += 1;
            self.progress(task_id, 40 + (completed * 40 / total_stages) as u8)
                .await;
        }

        Ok(())
    }

    fn analyze_stage(
        &self,
        project_path: &Path,
        config: &DocsmithConfig,
        analysis: &ProjectAnalysis,
        state: &mut PipelineState,
    ) {
        if config.analyze_dependencies {
            state.dependencies_info = Some(DependencyParser::new().parse(project_path));
        }
        if config.analyze_code_structure {
            state.code_structure = Some(CodeAnalyzer::new().analyze(project_path, analysis));
        }
    }

    async fn write_stage(
        &self,
        project_path: &Path,
        config: &DocsmithConfig,
        state: &PipelineState,
    ) -> Result<std::collections::HashMap<String, String>> {
        let writer = DocumentationWriter::new(config.clone());
        let path = project_path.to_path_buf();
        let state = state.clone();
        tokio::task::spawn_blocking(move || writer.write(&path, &state))
            .await
            .context("write worker panicked")?
    }

    async fn report(&self, task_id: Uuid, progress: u8, step: &str, message: &str) {
        self.tasks
            .update(
                task_id,
                TaskUpdate {
                    status: Some(TaskStatus::Running),
                    progress: Some(progress),
                    current_step: Some(step.to_string()),
                    message: Some(message.to_string()),
                    ..Default::default()
                },
            )
            .await;
    }

    async fn progress(&self, task_id: Uuid, progress: u8) {
        self.tasks
            .update(task_id, TaskUpdate { progress: Some(progress), ..Default::default() })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table() {
        assert_eq!(Stage::Scan.policy(), StagePolicy::Fatal);
        assert_eq!(Stage::ConnectBackend.policy(), StagePolicy::Fatal);
        assert_eq!(Stage::WriteFiles.policy(), StagePolicy::Fatal);
        assert_eq!(Stage::Analyze.policy(), StagePolicy::Tolerated);
        for kind in GENERATION_ORDER {
            assert_eq!(Stage::Generate(kind).policy(), StagePolicy::Tolerated);
        }
    }

    #[test]
    fn test_generation_order_starts_with_overview() {
        // Readme and summary consume the overview; it must come first
        assert_eq!(GENERATION_ORDER[0], DocKind::Overview);
        assert_eq!(GENERATION_ORDER[GENERATION_ORDER.len() - 1], DocKind::Summary);
    }

    #[test]
    fn test_failure_marker_names_reason() {
        let marker = failure_marker(DocKind::Readme, "backend timeout");
        assert!(marker.contains("readme"));
        assert!(marker.contains("backend timeout"));
    }

    #[test]
    fn test_progress_checkpoints_are_monotonic() {
        let total = GENERATION_ORDER.len() + 1;
        let mut last = 40u8;
        for completed in 1..=total {
            let progress = 40 + (completed * 40 / total) as u8;
            assert!(progress >= last);
            assert!(progress <= 80);
            last = progress;
        }
    }
}
