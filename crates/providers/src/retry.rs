//! Retry wrapper — re-sends a request when the failure is transient.
//!
//! Rate limits and network failures are retried with a linear backoff
//! (`backoff * attempt`); authentication, API and malformed-response errors
//! are returned immediately.

use agentloom_core::error::TransportError;
use agentloom_core::message::ToolCall;
use agentloom_core::transport::*;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub struct RetryTransport {
    inner: Arc<dyn ModelTransport>,
    max_attempts: u32,
    backoff: Duration,
}

impl RetryTransport {
    /// Wrap `inner`, trying each request at most `max_attempts` times.
    pub fn new(inner: Arc<dyn ModelTransport>, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            backoff: Duration::from_secs(1),
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    fn is_transient(err: &TransportError) -> bool {
        matches!(err, TransportError::RateLimited { .. } | TransportError::Network(_))
    }
}

#[async_trait]
impl ModelTransport for RetryTransport {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn kind(&self) -> ProviderKind {
        self.inner.kind()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn send_raw(&self, request: TransportRequest) -> std::result::Result<RawResponse, TransportError> {
        let mut attempt = 1;
        loop {
            match self.inner.send_raw(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.max_attempts && Self::is_transient(&e) => {
                    warn!(
                        provider = %self.inner.name(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Transient transport failure, retrying"
                    );
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn is_finished(&self, response: &RawResponse) -> bool {
        self.inner.is_finished(response)
    }

    fn extract_tool_calls(&self, response: &RawResponse) -> std::result::Result<Vec<ToolCall>, TransportError> {
        self.inner.extract_tool_calls(response)
    }

    fn extract_text(&self, response: &RawResponse) -> String {
        self.inner.extract_text(response)
    }

    fn usage(&self, response: &RawResponse) -> Option<Usage> {
        self.inner.usage(response)
    }
}
