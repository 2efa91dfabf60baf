//! Outbound HTTP client construction and retry timing.

mod client;
mod retry;

pub use client::{HttpClientBuilder, HttpClientConfig};
pub use retry::RetryPolicy;
