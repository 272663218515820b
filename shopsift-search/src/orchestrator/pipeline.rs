//! End-to-end query pipeline: sanitize, gate, structure, route, dispatch,
//! normalize, assemble.

use std::sync::Arc;
use std::time::Duration;

use crate::capability::{ProductSource, QuerySafetyClassifier, QueryStructurer};
use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::router::route;
use crate::safety::{self, UNSPECIFIED_REJECTION_REASON};
use crate::sanitize::sanitize;
use crate::search_string::build_search_string;
use crate::structure;
use crate::types::{DispatchPlan, SearchOutcome, SearchResponse};

use super::dispatch::dispatch_all;
use super::normalize::normalize;

/// Answers natural-language shopping queries using injected capabilities.
///
/// One pipeline can serve many concurrent requests; it holds no
/// per-request state.
#[derive(Clone)]
pub struct SearchPipeline {
    classifier: Arc<dyn QuerySafetyClassifier>,
    structurer: Arc<dyn QueryStructurer>,
    source: Arc<dyn ProductSource>,
    config: SearchConfig,
}

impl std::fmt::Debug for SearchPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SearchPipeline {
    /// Build a pipeline from its capabilities and configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation.
    pub fn new(
        classifier: Arc<dyn QuerySafetyClassifier>,
        structurer: Arc<dyn QueryStructurer>,
        source: Arc<dyn ProductSource>,
        config: SearchConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            classifier,
            structurer,
            source,
            config,
        })
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Answer one raw shopping query.
    ///
    /// Safety rejections, structuring failures, unsupported platforms, and
    /// per-platform search failures are all recovered here and reported
    /// through the response's products and message.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidQuery`] if the query has no searchable
    /// text, and [`SearchError::Internal`] if dispatch outcomes do not line
    /// up with the planned platforms.
    pub async fn handle_search(&self, raw_query: &str) -> Result<SearchResponse, SearchError> {
        if raw_query.trim().is_empty() {
            return Err(SearchError::InvalidQuery("query must not be empty".into()));
        }

        let sanitized = sanitize(raw_query);
        tracing::trace!(raw = raw_query, sanitized = %sanitized, "sanitized query");
        if sanitized.as_str().trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "query has no searchable text".into(),
            ));
        }

        let capability_timeout = Duration::from_secs(self.config.capability_timeout_seconds);

        let verdict = safety::classify(self.classifier.as_ref(), &sanitized, capability_timeout).await;
        if !verdict.is_safe {
            let reason = verdict
                .reason
                .unwrap_or_else(|| UNSPECIFIED_REJECTION_REASON.to_owned());
            tracing::info!(reason = %reason, "query rejected by safety gate");
            return Ok(SearchResponse::empty_with_message(reason));
        }

        let structured =
            structure::structure(self.structurer.as_ref(), &sanitized, capability_timeout).await;

        let plan = route(&structured);
        if plan.platforms.is_empty() {
            tracing::info!(advisory = ?plan.advisory, "no platform to search");
            return Ok(SearchResponse::assemble(Vec::new(), plan.advisory));
        }

        let search_string = build_search_string(&structured);
        tracing::trace!(search_string = %search_string, "built search string");
        tracing::debug!(platforms = ?plan.platforms, "dispatching search");

        let outcomes = dispatch_all(
            &plan,
            &search_string,
            Arc::clone(&self.source),
            &self.config,
        )
        .await;
        check_outcomes(&plan, &outcomes)?;
        let products = normalize(outcomes, &structured);

        tracing::info!(count = products.len(), "search complete");
        Ok(SearchResponse::assemble(products, plan.advisory))
    }
}

/// Every planned platform must yield exactly one outcome, in dispatch order.
fn check_outcomes(plan: &DispatchPlan, outcomes: &[SearchOutcome]) -> Result<(), SearchError> {
    let aligned = outcomes
        .iter()
        .map(|o| o.platform)
        .eq(plan.platforms.iter().copied());
    if aligned {
        Ok(())
    } else {
        Err(SearchError::Internal(format!(
            "dispatch returned {} outcomes for {} planned platforms",
            outcomes.len(),
            plan.platforms.len()
        )))
    }
}
