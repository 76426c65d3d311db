use super::{GenerationClient, GenerationClientError, GenerationRequest};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Wraps a generation client so at most `limit` requests are in flight at once.
///
/// Shared across every document processed by the process; callers beyond the limit wait for a
/// permit before their request is sent.
pub struct ConcurrencyLimitedClient<C> {
    inner: C,
    permits: Arc<Semaphore>,
}

impl<C> ConcurrencyLimitedClient<C> {
    /// Wrap `inner`, allowing `limit` concurrent requests (at least one).
    pub fn new(inner: C, limit: usize) -> Self {
        Self {
            inner,
            permits: Arc::new(Semaphore::new(limit.max(1))),
        }
    }
}

#[async_trait]
impl<C> GenerationClient for ConcurrencyLimitedClient<C>
where
    C: GenerationClient,
{
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationClientError> {
        let _permit = self.permits.acquire().await.map_err(|_| {
            GenerationClientError::ProviderUnavailable("request limiter closed".into())
        })?;
        self.inner.generate(request).await
    }
}
