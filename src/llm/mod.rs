//! Model-backed capabilities for the search pipeline.

pub mod openai;

pub use openai::{OpenAiCapabilities, OpenAiConfig};
