//! HTTP helpers shared by upstream clients.

mod retry;

pub use retry::BackoffPolicy;
pub use reqwest_retry::{RetryDecision, RetryPolicy};
