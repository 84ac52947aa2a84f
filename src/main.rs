// src/main.rs

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use docsmith::config::{ConfigOverrides, DocsmithConfig, CONFIG};
use docsmith::llm::OllamaProvider;
use docsmith::scanner::ProjectScanner;
use docsmith::server;
use docsmith::state::create_app_state;
use docsmith::tasks::TaskStatus;

#[derive(Parser)]
#[command(name = "docsmith", version, about = "AI-powered documentation generator")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve {
        /// Bind host, overrides DOCSMITH_HOST
        #[arg(long)]
        host: Option<String>,
        /// Bind port, overrides DOCSMITH_PORT
        #[arg(long)]
        port: Option<u16>,
    },
    /// Generate documentation for one project and exit
    Generate {
        /// Project directory
        path: PathBuf,
        /// Model override for this run
        #[arg(long)]
        model: Option<String>,
        /// Replace documentation files that already exist
        #[arg(long)]
        overwrite: bool,
        /// Docs directory name override
        #[arg(long)]
        docs_dir: Option<String>,
    },
    /// Scan a project and print the analysis without generating anything
    Scan {
        /// Project directory
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CONFIG.clone();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();
    match cli.command.unwrap_or(Command::Serve { host: None, port: None }) {
        Command::Serve { host, port } => serve(config, host, port).await,
        Command::Generate { path, model, overwrite, docs_dir } => {
            generate(config, path, model, overwrite, docs_dir).await
        }
        Command::Scan { path } => scan(config, path),
    }
}

async fn serve(mut config: DocsmithConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }

    info!("Starting docsmith server");
    info!("Model: {} at {}", config.ollama_model, config.ollama_base_url);

    let app_state = create_app_state(config.clone(), Arc::new(OllamaProvider::new()));

    let sweeper = app_state.tasks.spawn_sweeper(
        std::time::Duration::from_secs(config.task_sweep_interval_secs),
        config.task_max_age(),
    );

    let app = server::router(app_state);
    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    info!("Listening on http://{}", bind_address);

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(e) = result {
                error!("Server error: {}", e);
            }
        }
        _ = sweeper => {
            error!("Task sweeper unexpectedly terminated");
        }
    }

    Ok(())
}

async fn generate(
    config: DocsmithConfig,
    path: PathBuf,
    model: Option<String>,
    overwrite: bool,
    docs_dir: Option<String>,
) -> Result<()> {
    let overrides = ConfigOverrides {
        model,
        overwrite: overwrite.then_some(true),
        docs_directory: docs_dir,
    };

    let app_state = create_app_state(config, Arc::new(OllamaProvider::new()));
    let task_id = app_state.tasks.create(path, overrides).await;
    app_state.pipeline.run(task_id).await;

    let Some(task) = app_state.tasks.get(task_id).await else {
        bail!("task disappeared before completion");
    };

    match task.status {
        TaskStatus::Completed => {
            if let Some(result) = &task.result {
                info!("Generated {} files:", result.written_files.len());
                let mut names: Vec<_> = result.written_files.iter().collect();
                names.sort();
                for (name, location) in names {
                    info!("  {} -> {}", name, location);
                }
            }
            Ok(())
        }
        _ => bail!(
            "documentation generation failed: {}",
            task.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn scan(config: DocsmithConfig, path: PathBuf) -> Result<()> {
    let analysis = ProjectScanner::new(config).scan(&path)?;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}
