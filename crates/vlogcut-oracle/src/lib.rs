//! LLM oracle used to rank candidate moments and caption intervals.
//!
//! This crate provides:
//! - The [`IntervalOracle`] seam consumed by interval selection
//! - A Gemini `generateContent` client
//! - A retry policy with pluggable sleeping
//! - Tolerant parsing of JSON arrays embedded in prose

pub mod client;
pub mod error;
pub mod oracle;
pub mod parse;
pub mod retry;

pub use client::{GeminiClient, OracleConfig};
pub use error::{OracleError, OracleResult};
pub use oracle::{
    truncate_chars, CompletionRequest, DescribeRequest, IntervalOracle, LlmOracle, RankRequest,
    TextModel,
};
pub use parse::{clean_caption, parse_candidate_array};
pub use retry::{retry_async, RecordingSleeper, RetryPolicy, Sleeper, TokioSleeper};
