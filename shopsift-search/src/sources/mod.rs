//! Product source implementations.
//!
//! Each module provides a struct implementing
//! [`crate::capability::ProductSource`].

pub mod agent;

pub use agent::AgentProductSource;
