//! Shopsift: natural-language shopping search over HTTP.
//!
//! This crate hosts the [`shopsift_search`] pipeline:
//! Query → Sanitize → Safety gate → Structure → Route → Search → Normalize
//!
//! # Architecture
//!
//! - **Config**: TOML file with server, model, agent, and search sections
//! - **LLM**: OpenAI-compatible safety classifier and query structurer
//! - **Sources**: browser-agent extraction service, one call per platform
//! - **Server**: axum endpoint exposing the pipeline as `POST /api/search`

pub mod config;
pub mod error;
pub mod llm;
pub mod server;
pub mod startup;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use server::SearchServer;
pub use startup::build_pipeline;
