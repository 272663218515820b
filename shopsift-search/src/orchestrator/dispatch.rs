//! Concurrent per-platform fan-out with failure isolation.
//!
//! One task is spawned per platform in the dispatch plan. Every task runs
//! to completion or to its own deadline; an error, timeout, or panic in one
//! task becomes an empty outcome for that platform and never touches its
//! siblings. Outcomes are collected in dispatch order regardless of which
//! task finishes first.

use std::sync::Arc;
use std::time::Duration;

use crate::capability::{product_result_schema, ProductSource, SourceRequest};
use crate::config::SearchConfig;
use crate::types::{DispatchPlan, Platform, Product, SearchOutcome};

/// Search every platform in `plan` concurrently and wait for all of them.
///
/// # Pipeline
///
/// 1. Return immediately with no outcomes if `plan.platforms` is empty
/// 2. Spawn one task per platform, each bounded by
///    `config.source_timeout_seconds`
/// 3. Map errors, timeouts, and panics to empty outcomes, logging at warn
/// 4. Join all tasks and return their outcomes in dispatch order
///
/// There is no early exit on first success or first failure.
pub async fn dispatch_all(
    plan: &DispatchPlan,
    search_string: &str,
    source: Arc<dyn ProductSource>,
    config: &SearchConfig,
) -> Vec<SearchOutcome> {
    if plan.platforms.is_empty() {
        return Vec::new();
    }

    let timeout = Duration::from_secs(config.source_timeout_seconds);

    // 1. Fan out: one task per platform.
    let tasks: Vec<_> = plan
        .platforms
        .iter()
        .map(|&platform| {
            let request = config.platform_url(platform).map(|url| SourceRequest {
                platform,
                platform_url: url.to_owned(),
                search_string: search_string.to_owned(),
                max_products: config.max_products_per_source,
                result_schema: product_result_schema(),
            });
            let source = Arc::clone(&source);
            let handle = tokio::spawn(async move {
                match request {
                    Some(request) => search_platform(source.as_ref(), request, timeout).await,
                    None => {
                        tracing::warn!(%platform, "no URL configured for platform; skipping");
                        Vec::new()
                    }
                }
            });
            (platform, handle)
        })
        .collect();

    // 2. Fan in: wait for every task, keeping dispatch order.
    let joined = futures::future::join_all(tasks.into_iter().map(|(platform, handle)| async move {
        match handle.await {
            Ok(products) => SearchOutcome { platform, products },
            Err(err) => {
                tracing::warn!(%platform, error = %err, "platform search task aborted");
                SearchOutcome::empty(platform)
            }
        }
    }))
    .await;

    let total: usize = joined.iter().map(|o| o.products.len()).sum();
    tracing::debug!(platforms = joined.len(), total, "dispatch complete");
    joined
}

/// Run one platform search, never failing.
async fn search_platform(
    source: &dyn ProductSource,
    request: SourceRequest,
    timeout: Duration,
) -> Vec<Product> {
    let platform = request.platform;
    match tokio::time::timeout(timeout, source.search(&request)).await {
        Ok(Ok(products)) => accept_products(platform, products, request.max_products),
        Ok(Err(err)) => {
            tracing::warn!(%platform, error = %err, "platform search failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(
                %platform,
                timeout_secs = timeout.as_secs(),
                "platform search timed out"
            );
            Vec::new()
        }
    }
}

/// Drop unusable listings, cap the count in source order, and stamp each
/// product with the platform it was dispatched to.
fn accept_products(platform: Platform, mut products: Vec<Product>, cap: usize) -> Vec<Product> {
    let before = products.len();
    products.retain(|p| p.selling_price.is_finite() && p.selling_price >= 0.0);
    if products.len() < before {
        tracing::debug!(
            %platform,
            dropped = before - products.len(),
            "dropped products with unusable selling price"
        );
    }
    products.truncate(cap);
    for product in &mut products {
        product.source = platform;
    }
    tracing::debug!(%platform, count = products.len(), "platform returned products");
    products
}
