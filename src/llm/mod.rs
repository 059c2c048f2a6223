//! Language-model oracle: prompts, HTTP client and reply parsing

pub mod client;
pub mod context;
pub mod oracle;
pub mod parser;

pub use client::{ApiFormat, LlmClient};
pub use oracle::LlmOracle;
