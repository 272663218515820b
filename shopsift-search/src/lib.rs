//! # shopsift-search
//!
//! Natural-language shopping search across Indian e-commerce platforms.
//!
//! A free-form query such as "black jeans for men under 2000 on flipkart"
//! goes through a fixed pipeline and comes back as a flat list of product
//! listings plus an optional advisory message.
//!
//! ## Design
//!
//! - Sanitizes the raw text before any model sees it
//! - Gates every query through a safety classifier that fails closed
//! - Extracts structured constraints with a structurer that fails soft
//! - Routes to the supported platforms the user named, or all of them
//! - Searches every routed platform concurrently; one platform failing
//!   never affects the others
//! - Normalizes prices and discounts, sorts, and applies the price ceiling
//!
//! The classifier, structurer, and product source are traits in
//! [`capability`]. This crate ships [`sources::AgentProductSource`]; the
//! model-backed classifier and structurer live with the server.
//!
//! ## Security
//!
//! - Raw and sanitized query text is logged only at trace level
//! - User content reaches models only inside explicit delimiter tags
//! - Capability errors are logged, never echoed back to the caller

pub mod capability;
pub mod config;
pub mod error;
pub mod http;
pub mod orchestrator;
pub mod router;
pub mod safety;
pub mod sanitize;
pub mod search_string;
pub mod sources;
pub mod structure;
pub mod types;

pub use capability::{ProductSource, QuerySafetyClassifier, QueryStructurer, SourceRequest};
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use orchestrator::pipeline::SearchPipeline;
pub use sources::AgentProductSource;
pub use types::{
    DispatchPlan, Gender, Platform, Product, SafetyVerdict, SearchOutcome, SearchResponse, Size,
    StructuredQuery,
};
