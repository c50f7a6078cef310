//! Article generation
//!
//! The [`ContentGenerator`] trait is the seam between the pipeline and the
//! text-generation service. [`WorkflowClient`] implements it against a
//! blocking LLM workflow endpoint; tests substitute in-memory fakes.

mod workflow;

pub use workflow::WorkflowClient;

use crate::types::Article;
use async_trait::async_trait;

/// Service name used in errors and logs
pub const SERVICE: &str = "content-api";

/// Trait for producing an [`Article`] from an optional topic seed
///
/// Implementations make a single attempt. They do not retry: a failed
/// content call ends the run.
///
/// # Errors
///
/// - [`Error::Upstream`](crate::Error::Upstream) if the service answers with a failure
/// - [`Error::Parse`](crate::Error::Parse) if the answer has no usable title and body
/// - [`Error::Timeout`](crate::Error::Timeout) if the deadline passes
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    /// Generate an article; `None` lets the service choose the topic
    async fn generate(&self, topic: Option<&str>) -> crate::Result<Article>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
