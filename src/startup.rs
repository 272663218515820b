//! Startup wiring: turns an [`AppConfig`] into a ready [`SearchPipeline`].
//!
//! The OpenAI-compatible adapter serves as both the safety classifier and
//! the query structurer; the browser-agent service is the product source.

use std::sync::Arc;
use std::time::Duration;

use shopsift_search::{AgentProductSource, SearchPipeline};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::llm::{OpenAiCapabilities, OpenAiConfig};

/// Validate `config` and build the search pipeline it describes.
///
/// A missing API key is not an error here: requests then fail at the
/// provider, and the safety gate rejects every query.
///
/// # Errors
///
/// Returns [`AppError::Config`] if the configuration is invalid, or
/// [`AppError::Search`] if an HTTP client cannot be built.
pub fn build_pipeline(config: &AppConfig) -> Result<SearchPipeline> {
    config.validate()?;

    let api_key = config.llm.api_key();
    if api_key.is_none() {
        warn!(
            env = %config.llm.api_key_env,
            "LLM API key not set; every query will be rejected"
        );
    }

    let llm_timeout = Duration::from_secs(config.search.capability_timeout_seconds);
    let llm = Arc::new(
        OpenAiCapabilities::new(
            OpenAiConfig::new(api_key, config.llm.model.clone())
                .with_base_url(config.llm.base_url.clone())
                .with_timeout(llm_timeout),
        )
        .map_err(|e| AppError::Llm(e.to_string()))?,
    );

    let source = Arc::new(AgentProductSource::new(
        &config.agent.endpoint,
        config.agent.token(),
        Duration::from_secs(config.search.source_timeout_seconds),
    )?);

    info!(
        model = %config.llm.model,
        agent = %config.agent.endpoint,
        "search pipeline ready"
    );

    Ok(SearchPipeline::new(
        llm.clone(),
        llm,
        source,
        config.search.clone(),
    )?)
}
