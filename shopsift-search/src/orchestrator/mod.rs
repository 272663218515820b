//! Search orchestrator: concurrent per-platform dispatch, normalization,
//! and the end-to-end query pipeline.
//!
//! This module fans a search string out to every platform in a dispatch
//! plan, isolates per-platform failures, imputes missing prices, orders
//! each platform's products by price, and assembles the final response.

pub mod dispatch;
pub mod normalize;
pub mod pipeline;
