// src/config/mod.rs

//! Environment-driven configuration. All values come from the environment
//! (optionally via a .env file) with sensible defaults.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize)]
pub struct DocsmithConfig {
    // ── Ollama Configuration
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_temperature: f32,
    pub ollama_timeout_secs: u64,

    // ── Scanning Configuration
    pub max_file_size_mb: u64,
    pub max_scan_depth: usize,
    pub extra_ignore_patterns: String,

    // ── Output Configuration
    pub docs_directory: String,
    pub create_readme: bool,
    pub create_api_docs: bool,
    pub create_architecture_docs: bool,
    pub create_contributing: bool,
    pub overwrite_existing: bool,

    // ── Generation Features
    pub generate_summary: bool,
    pub analyze_dependencies: bool,
    pub analyze_code_structure: bool,
    pub enable_markdown_enhancements: bool,
    pub enable_seo_optimization: bool,

    // ── Task Lifecycle
    pub task_max_age_hours: u64,
    pub task_sweep_interval_secs: u64,

    // ── Server Configuration
    pub host: String,
    pub port: u16,

    // ── Logging
    pub log_level: String,
}

/// Parse an environment variable, falling back to a default.
/// Values may carry trailing comments or whitespace from .env files.
fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl DocsmithConfig {
    pub fn from_env() -> Self {
        // Load from .env file first if it exists
        let _ = dotenvy::dotenv();

        Self {
            ollama_base_url: env_var_or(
                "DOCSMITH_OLLAMA_URL",
                "http://localhost:11434".to_string(),
            ),
            ollama_model: env_var_or("DOCSMITH_MODEL", "llama3.2".to_string()),
            ollama_temperature: env_var_or("DOCSMITH_TEMPERATURE", 0.3),
            ollama_timeout_secs: env_var_or("DOCSMITH_OLLAMA_TIMEOUT", 120),
            max_file_size_mb: env_var_or("DOCSMITH_MAX_FILE_SIZE_MB", 5),
            max_scan_depth: env_var_or("DOCSMITH_MAX_SCAN_DEPTH", 10),
            extra_ignore_patterns: env_var_or("DOCSMITH_IGNORE_PATTERNS", String::new()),
            docs_directory: env_var_or("DOCSMITH_DOCS_DIR", "docs".to_string()),
            create_readme: env_var_or("DOCSMITH_CREATE_README", true),
            create_api_docs: env_var_or("DOCSMITH_CREATE_API_DOCS", true),
            create_architecture_docs: env_var_or("DOCSMITH_CREATE_ARCHITECTURE_DOCS", true),
            create_contributing: env_var_or("DOCSMITH_CREATE_CONTRIBUTING", true),
            overwrite_existing: env_var_or("DOCSMITH_OVERWRITE_EXISTING", false),
            generate_summary: env_var_or("DOCSMITH_GENERATE_SUMMARY", true),
            analyze_dependencies: env_var_or("DOCSMITH_ANALYZE_DEPENDENCIES", true),
            analyze_code_structure: env_var_or("DOCSMITH_ANALYZE_CODE_STRUCTURE", true),
            enable_markdown_enhancements: env_var_or("DOCSMITH_MARKDOWN_ENHANCEMENTS", true),
            enable_seo_optimization: env_var_or("DOCSMITH_SEO_OPTIMIZATION", true),
            task_max_age_hours: env_var_or("DOCSMITH_TASK_MAX_AGE_HOURS", 24),
            task_sweep_interval_secs: env_var_or("DOCSMITH_TASK_SWEEP_INTERVAL", 3600),
            host: env_var_or("DOCSMITH_HOST", "0.0.0.0".to_string()),
            port: env_var_or("DOCSMITH_PORT", 8000),
            log_level: env_var_or("DOCSMITH_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Per-call timeout for generation backend requests
    pub fn ollama_timeout(&self) -> Duration {
        Duration::from_secs(self.ollama_timeout_secs)
    }

    /// Maximum task age before the sweeper removes it
    pub fn task_max_age(&self) -> Duration {
        Duration::from_secs(self.task_max_age_hours * 3600)
    }

    /// Extra ignore patterns from the environment (comma-separated)
    pub fn ignore_patterns(&self) -> Vec<String> {
        self.extra_ignore_patterns
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect()
    }

    /// Apply a partial runtime update. Omitted fields keep their values.
    /// Bind address, sweep interval, and log level are fixed at startup
    /// and cannot be changed here.
    pub fn apply_update(&mut self, update: &ConfigUpdate) {
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = &update.$field {
                    self.$field = value.clone();
                })*
            };
        }
        apply!(
            ollama_base_url,
            ollama_model,
            ollama_temperature,
            ollama_timeout_secs,
            max_file_size_mb,
            max_scan_depth,
            extra_ignore_patterns,
            docs_directory,
            create_readme,
            create_api_docs,
            create_architecture_docs,
            create_contributing,
            overwrite_existing,
            generate_summary,
            analyze_dependencies,
            analyze_code_structure,
            enable_markdown_enhancements,
            enable_seo_optimization,
            task_max_age_hours,
        );
    }

    /// Produce the effective configuration for a single run.
    /// Overrides are recorded on the task and never mutate the base config.
    pub fn with_overrides(&self, overrides: &ConfigOverrides) -> Self {
        let mut effective = self.clone();
        if let Some(model) = &overrides.model {
            effective.ollama_model = model.clone();
        }
        if let Some(overwrite) = overrides.overwrite {
            effective.overwrite_existing = overwrite;
        }
        if let Some(dir) = &overrides.docs_directory {
            effective.docs_directory = dir.clone();
        }
        effective
    }
}

/// Partial configuration update accepted over the HTTP surface. Every
/// field is optional; `None` means keep the current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigUpdate {
    pub ollama_base_url: Option<String>,
    pub ollama_model: Option<String>,
    pub ollama_temperature: Option<f32>,
    pub ollama_timeout_secs: Option<u64>,
    pub max_file_size_mb: Option<u64>,
    pub max_scan_depth: Option<usize>,
    pub extra_ignore_patterns: Option<String>,
    pub docs_directory: Option<String>,
    pub create_readme: Option<bool>,
    pub create_api_docs: Option<bool>,
    pub create_architecture_docs: Option<bool>,
    pub create_contributing: Option<bool>,
    pub overwrite_existing: Option<bool>,
    pub generate_summary: Option<bool>,
    pub analyze_dependencies: Option<bool>,
    pub analyze_code_structure: Option<bool>,
    pub enable_markdown_enhancements: Option<bool>,
    pub enable_seo_optimization: Option<bool>,
    pub task_max_age_hours: Option<u64>,
}

/// Per-task configuration overrides, recorded at task creation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_directory: Option<String>,
}

impl ConfigOverrides {
    pub fn is_empty(&self) -> bool {
        self.model.is_none() && self.overwrite.is_none() && self.docs_directory.is_none()
    }
}

// Global config instance - loaded once at startup
pub static CONFIG: Lazy<DocsmithConfig> = Lazy::new(DocsmithConfig::from_env);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = DocsmithConfig::from_env();

        assert_eq!(config.docs_directory, "docs");
        assert_eq!(config.max_scan_depth, 10);
        assert!(!config.overwrite_existing);
    }

    #[test]
    fn test_bind_address() {
        let mut config = DocsmithConfig::from_env();
        config.host = "127.0.0.1".to_string();
        config.port = 9000;
        assert_eq!(config.bind_address(), "127.0.0.1:9000");
    }

    #[test]
    fn test_overrides_produce_new_config() {
        let base = DocsmithConfig::from_env();
        let overrides = ConfigOverrides {
            model: Some("codellama".to_string()),
            overwrite: Some(true),
            docs_directory: None,
        };

        let effective = base.with_overrides(&overrides);
        assert_eq!(effective.ollama_model, "codellama");
        assert!(effective.overwrite_existing);
        // Base config is untouched
        assert!(!base.overwrite_existing);
    }

    #[test]
    fn test_partial_update_touches_only_named_fields() {
        let mut config = DocsmithConfig::from_env();
        let before_model = config.ollama_model.clone();
        let before_port = config.port;

        config.apply_update(&ConfigUpdate {
            docs_directory: Some("generated".to_string()),
            overwrite_existing: Some(true),
            ..Default::default()
        });

        assert_eq!(config.docs_directory, "generated");
        assert!(config.overwrite_existing);
        assert_eq!(config.ollama_model, before_model);
        assert_eq!(config.port, before_port);
    }

    #[test]
    fn test_empty_update_is_identity() {
        let mut config = DocsmithConfig::from_env();
        let before = format!("{config:?}");
        config.apply_update(&ConfigUpdate::default());
        assert_eq!(format!("{config:?}"), before);
    }

    #[test]
    fn test_empty_overrides() {
        assert!(ConfigOverrides::default().is_empty());
        let overrides = ConfigOverrides { overwrite: Some(false), ..Default::default() };
        assert!(!overrides.is_empty());
    }
}
