// src/llm/mod.rs

//! Generation backend integration.
//!
//! The pipeline talks to the backend through the `TextGenerator` trait so
//! tests can substitute a stub. `OllamaClient` is the production
//! implementation, calling a local Ollama server over HTTP.

pub mod prompts;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::config::DocsmithConfig;
use crate::scanner::ProjectAnalysis;

/// The document kinds the backend can generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocKind {
    Overview,
    Readme,
    Architecture,
    Api,
    Summary,
}

impl DocKind {
    pub fn label(&self) -> &'static str {
        match self {
            DocKind::Overview => "overview",
            DocKind::Readme => "readme",
            DocKind::Architecture => "architecture",
            DocKind::Api => "api",
            DocKind::Summary => "summary",
        }
    }
}

/// Input handed to the generator for one artifact. Later kinds receive the
/// overview produced earlier in the same run.
pub struct GenerationContext<'a> {
    pub analysis: &'a ProjectAnalysis,
    pub overview: Option<&'a str>,
}

/// A text generation capability: possibly slow, possibly failing.
#[async_trait]
pub trait TextGenerator: Send + Sync + std::fmt::Debug {
    async fn generate(&self, kind: DocKind, context: &GenerationContext<'_>) -> Result<String>;
}

/// Constructs a connected generator for one run. The effective config is
/// passed per call so per-task overrides (model, for one) take effect.
/// Connection failure is fatal to a run; retry policy, if any, lives
/// behind this boundary.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn connect(&self, config: &DocsmithConfig) -> Result<Arc<dyn TextGenerator>>;
}

/// Client for a local Ollama server.
#[derive(Debug)]
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
}

impl OllamaClient {
    pub fn new(config: &DocsmithConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.ollama_timeout())
            .build()
            .context("failed to build HTTP client for Ollama")?;

        Ok(Self {
            client,
            base_url: config.ollama_base_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            temperature: config.ollama_temperature,
        })
    }

    /// Probe the backend. Used as the fatal "Initializing AI" check.
    pub async fn check_connection(&self) -> Result<()> {
        let url = format!("{}/api/tags", self.base_url);
        self.client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("generation backend unreachable at {}", self.base_url))?
            .error_for_status()
            .with_context(|| format!("generation backend rejected probe at {}", self.base_url))?;
        Ok(())
    }

    async fn call_ollama(&self, system: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let body = json!({
            "model": self.model,
            "system": system,
            "prompt": prompt,
            "stream": false,
            "options": {
                "temperature": self.temperature,
            }
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: serde_json::Value = response.json().await?;
        let text = parsed["response"]
            .as_str()
            .ok_or_else(|| anyhow!("no text in Ollama response"))?;

        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, kind: DocKind, context: &GenerationContext<'_>) -> Result<String> {
        let (system, prompt) = prompts::build(kind, context);
        self.call_ollama(&system, &prompt)
            .await
            .with_context(|| format!("failed to generate {}", kind.label()))
    }
}

/// Provider for `OllamaClient`.
pub struct OllamaProvider;

impl OllamaProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    async fn connect(&self, config: &DocsmithConfig) -> Result<Arc<dyn TextGenerator>> {
        let client = OllamaClient::new(config)?;
        client.check_connection().await?;
        info!("Connected to Ollama (model: {})", config.ollama_model);
        Ok(Arc::new(client))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_kind_labels_are_distinct() {
        let kinds = [
            DocKind::Overview,
            DocKind::Readme,
            DocKind::Architecture,
            DocKind::Api,
            DocKind::Summary,
        ];
        let labels: std::collections::HashSet<_> = kinds.iter().map(|k| k.label()).collect();
        assert_eq!(labels.len(), kinds.len());
    }

    #[tokio::test]
    async fn test_connect_fails_for_unreachable_backend() {
        let mut config = DocsmithConfig::from_env();
        config.ollama_base_url = "http://127.0.0.1:1".to_string();
        config.ollama_timeout_secs = 1;

        let provider = OllamaProvider::new();
        let err = provider.connect(&config).await.unwrap_err();
        assert!(format!("{err:#}").contains("unreachable"));
    }
}
