use tracing::error;

use crate::error::FetchError;
use crate::types::{ContentKind, ContentResult};

/// An upstream provider of one kind of content.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    fn kind(&self) -> ContentKind;

    /// Provider name used in logs
    fn provider(&self) -> &'static str;

    /// One outbound call, raced against the configured deadline.
    async fn fetch(&self) -> Result<ContentResult, FetchError>;

    /// Canned content substituted when `fetch` fails.
    fn fallback(&self, error: &FetchError) -> ContentResult;

    /// Fetches content, substituting the fallback on any failure.
    /// Never fails.
    async fn produce(&self) -> ContentResult {
        match self.fetch().await {
            Ok(content) => content,
            Err(err) => {
                error!("error fetching {} from {}: {}", self.kind(), self.provider(), err);
                self.fallback(&err)
            }
        }
    }
}
