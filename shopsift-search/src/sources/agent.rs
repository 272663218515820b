//! Browser-agent extraction service as a product source.
//!
//! The agent service drives a real browser: it opens the platform's home
//! page, types the search string into the search box, and extracts
//! listings matching the supplied JSON schema. This module only speaks its
//! HTTP contract:
//!
//! `POST {endpoint}/v1/extract` with
//! `{"platform", "url", "query", "max_products", "schema"}`, answered by
//! `{"products": [...]}`. An empty body or `null` means nothing matched.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::capability::{ProductSource, SourceRequest};
use crate::error::SearchError;
use crate::http;
use crate::types::Product;

/// Product source backed by a remote browser-agent extraction service.
pub struct AgentProductSource {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl std::fmt::Debug for AgentProductSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentProductSource")
            .field("endpoint", &self.endpoint)
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl AgentProductSource {
    /// Create a source talking to the agent service at `endpoint`.
    ///
    /// `timeout` bounds each HTTP call; the dispatcher applies its own
    /// per-platform deadline on top.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `endpoint` is not an absolute
    /// http(s) URL, or [`SearchError::Http`] if the client cannot be built.
    pub fn new(
        endpoint: &str,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SearchError> {
        let parsed = url::Url::parse(endpoint)
            .map_err(|e| SearchError::Config(format!("agent endpoint is not a valid URL: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SearchError::Config(
                "agent endpoint must use http or https".into(),
            ));
        }
        Ok(Self {
            client: http::build_client(timeout)?,
            endpoint: endpoint.trim_end_matches('/').to_owned(),
            token: token.filter(|t| !t.is_empty()),
        })
    }
}

#[async_trait]
impl ProductSource for AgentProductSource {
    async fn search(&self, request: &SourceRequest) -> Result<Vec<Product>, SearchError> {
        let platform = request.platform;
        tracing::trace!(%platform, query = %request.search_string, "agent search");

        let body = serde_json::json!({
            "platform": platform,
            "url": request.platform_url,
            "query": request.search_string,
            "max_products": request.max_products,
            "schema": request.result_schema,
        });

        let mut builder = self
            .client
            .post(format!("{}/v1/extract", self.endpoint))
            .json(&body);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                SearchError::Timeout(format!("{platform} agent request timed out"))
            } else {
                SearchError::Http(format!("{platform} agent request failed: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SearchError::Source(format!(
                "{platform} agent returned HTTP {}",
                status.as_u16()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| SearchError::Http(format!("{platform} agent response read failed: {e}")))?;

        tracing::trace!(%platform, bytes = text.len(), "agent response received");

        parse_products_payload(&text)
    }
}

#[derive(Debug, Deserialize)]
struct ProductsPayload {
    products: Vec<Product>,
}

/// Parse and validate an agent's `{"products": [...]}` reply.
///
/// An empty body or JSON `null` is an empty result.
///
/// # Errors
///
/// Returns [`SearchError::Adapter`] if the body does not match the product
/// schema, or if any product has a blank name, or a negative or non-finite
/// price.
pub fn parse_products_payload(body: &str) -> Result<Vec<Product>, SearchError> {
    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Ok(Vec::new());
    }

    let payload: ProductsPayload = serde_json::from_str(body)
        .map_err(|e| SearchError::Adapter(format!("malformed products payload: {e}")))?;

    for (index, product) in payload.products.iter().enumerate() {
        if product.name.trim().is_empty() {
            return Err(SearchError::Adapter(format!(
                "product {index} has an empty product_name"
            )));
        }
        if !valid_price(product.selling_price) {
            return Err(SearchError::Adapter(format!(
                "product {index} has an invalid selling_price"
            )));
        }
        if product.list_price.is_some_and(|p| !valid_price(p)) {
            return Err(SearchError::Adapter(format!(
                "product {index} has an invalid maximum_retail_price"
            )));
        }
    }

    Ok(payload.products)
}

fn valid_price(price: f64) -> bool {
    price.is_finite() && price >= 0.0
}
