// src/lib.rs

//! docsmith - AI-powered documentation generator with an async task API.
//!
//! A project is scanned, a local LLM produces the documentation set, and
//! the results are written back into the project tree. Long runs are
//! tracked as tasks that clients poll over HTTP.

pub mod analyzers;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod scanner;
pub mod server;
pub mod state;
pub mod tasks;
pub mod writer;
