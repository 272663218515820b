//! Trait definitions for the external capabilities the pipeline consumes.
//!
//! The safety classifier, the query structurer, and the per-platform
//! product source are all opaque to the pipeline. Each is injected as a
//! trait object so that hosts can plug in LLM-backed or in-memory
//! implementations.

use async_trait::async_trait;

use crate::error::SearchError;
use crate::types::{Platform, Product, SafetyVerdict, StructuredQuery};

/// Decides whether a query is safe to interpret.
///
/// The pipeline wraps every call in a fail-closed gate: an `Err` is
/// treated as a rejection, never as an acceptance.
#[async_trait]
pub trait QuerySafetyClassifier: Send + Sync {
    /// Classify `text`, which is already sanitized and wrapped in
    /// delimiter markers.
    async fn classify(&self, text: &str) -> Result<SafetyVerdict, SearchError>;
}

/// Extracts a [`StructuredQuery`] from sanitized query text.
///
/// The pipeline validates whatever comes back and falls back to an
/// item-only query on any error.
#[async_trait]
pub trait QueryStructurer: Send + Sync {
    /// Structure `text`, which is already sanitized.
    async fn structure(&self, text: &str) -> Result<StructuredQuery, SearchError>;
}

/// Everything a [`ProductSource`] needs to search one platform.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRequest {
    /// Platform being searched.
    pub platform: Platform,
    /// Home page the search starts from.
    pub platform_url: String,
    /// Literal text to type into the platform's search box.
    pub search_string: String,
    /// Upper bound on the number of products wanted.
    pub max_products: usize,
    /// Shape the returned products must follow; see [`product_result_schema`].
    pub result_schema: serde_json::Value,
}

/// Executes a literal search on one platform and returns candidate products.
///
/// Implementations must be `Send + Sync`; one task per platform runs
/// concurrently against the same instance.
#[async_trait]
pub trait ProductSource: Send + Sync {
    /// Search one platform.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] if the platform cannot be searched or the
    /// result does not match [`product_result_schema`]. The dispatcher
    /// turns any error into an empty result for this platform only.
    async fn search(&self, request: &SourceRequest) -> Result<Vec<Product>, SearchError>;
}

/// JSON schema describing the `{"products": [...]}` payload a source must
/// produce.
pub fn product_result_schema() -> serde_json::Value {
    let platforms: Vec<&str> = Platform::all().iter().map(Platform::name).collect();
    serde_json::json!({
        "type": "object",
        "properties": {
            "products": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "product_name": {
                            "type": "string",
                            "description": "Name of the product"
                        },
                        "product_url": {
                            "type": "string",
                            "description": "URL to the product page (complete https link)"
                        },
                        "product_image_url": {
                            "type": "string",
                            "description": "URL to the product image (complete https link)"
                        },
                        "maximum_retail_price": {
                            "type": ["number", "null"],
                            "description": "Maximum retail price of the product"
                        },
                        "discount_percentage": {
                            "type": ["number", "null"]
                        },
                        "selling_price": {
                            "type": "number",
                            "description": "Current selling price of the product"
                        },
                        "sourced_from": {
                            "type": "string",
                            "enum": platforms,
                            "description": "E-commerce platform source of the product"
                        }
                    },
                    "required": [
                        "product_name",
                        "product_url",
                        "product_image_url",
                        "maximum_retail_price",
                        "selling_price",
                        "sourced_from"
                    ]
                }
            }
        },
        "required": ["products"]
    })
}
