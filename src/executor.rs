/// Resilient request execution.
///
/// `RequestExecutor` sends a built [`RequestSpec`] through an [`HttpTransport`],
/// bounds every attempt with a deadline, classifies failures into [`TagError`],
/// and retries server-side failures with exponential backoff.
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ENV_MAX_RETRIES, ENV_TIMEOUT_SECS, env_parse};
use crate::error::TagError;
use crate::provider::RequestSpec;

mod transport;

#[cfg(test)]
pub(crate) use transport::mock;
pub use transport::{HttpTransport, RawProviderResponse, ReqwestTransport};

/// Longest error body echoed back in a `RemoteError` message.
const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Deadline and retry settings for the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Hard deadline for a single attempt.
    pub timeout: Duration,
    /// Additional attempts after the first one, for transient failures only.
    pub max_retries: u32,
    /// Delay before the first retry; doubles for each following retry.
    pub base_delay: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl ExecutorConfig {
    /// Defaults overridden by `TAGSMITH_TIMEOUT_SECS` and `TAGSMITH_MAX_RETRIES`.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Configuration`] if either variable is not a number,
    /// or if the timeout is zero.
    pub fn from_env() -> Result<Self, TagError> {
        let mut config = Self::default();
        if let Some(secs) = env_parse::<u64>(ENV_TIMEOUT_SECS)? {
            if secs == 0 {
                return Err(TagError::config(format!(
                    "{ENV_TIMEOUT_SECS} must be at least 1 second"
                )));
            }
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = env_parse::<u32>(ENV_MAX_RETRIES)? {
            config.max_retries = retries;
        }
        Ok(config)
    }

    /// Delay slept before retry number `retry` (1-based): 1s, 2s, 4s, ... by default.
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let exponent = retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Executes provider requests with a deadline per attempt and bounded retries.
#[derive(Clone)]
pub struct RequestExecutor {
    transport: Arc<dyn HttpTransport>,
    config: ExecutorConfig,
}

impl RequestExecutor {
    pub fn new(transport: Arc<dyn HttpTransport>, config: ExecutorConfig) -> Self {
        Self { transport, config }
    }

    /// Executor over a fresh [`ReqwestTransport`] with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Network`] if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, TagError> {
        Ok(Self::new(
            Arc::new(ReqwestTransport::new()?),
            ExecutorConfig::default(),
        ))
    }

    /// Sends `spec` until it succeeds, fails permanently, or retries run out.
    ///
    /// Every attempt re-sends the identical request.
    ///
    /// # Errors
    ///
    /// - [`TagError::Timeout`] when an attempt exceeds the deadline (not retried)
    /// - [`TagError::RemoteError`] for non-2xx statuses (only 5xx are retried)
    /// - [`TagError::Network`] when no status was received (not retried)
    pub async fn execute(&self, spec: &RequestSpec) -> Result<RawProviderResponse, TagError> {
        retry_with_backoff(&self.config, || self.attempt(spec)).await
    }

    async fn attempt(&self, spec: &RequestSpec) -> Result<RawProviderResponse, TagError> {
        tracing::debug!(url = %spec.url, "sending provider request");

        let response = tokio::time::timeout(self.config.timeout, self.transport.send(spec))
            .await
            .map_err(|_| TagError::Timeout {
                after: self.config.timeout,
            })??;

        if !response.is_success() {
            return Err(TagError::RemoteError {
                status: response.status,
                message: error_message(&response),
            });
        }

        Ok(response)
    }
}

/// Retries an async operation with exponential backoff.
///
/// The operation runs once, then up to `config.max_retries` more times while
/// it keeps failing with a transient error. The delay before retry `n` is
/// `config.backoff_delay(n)`. Non-transient errors return immediately.
///
/// # Errors
///
/// Returns the first non-transient error, or the last error once retries are exhausted.
pub async fn retry_with_backoff<F, Fut, T>(config: &ExecutorConfig, mut f: F) -> Result<T, TagError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TagError>>,
{
    let mut retry = 0;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(e) if should_retry(&e) && retry < config.max_retries => {
                retry += 1;
                let delay = config.backoff_delay(retry);
                tracing::warn!(
                    error = %e,
                    retry,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "transient provider failure, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Only server-side failures (HTTP 5xx) are worth another attempt.
fn should_retry(error: &TagError) -> bool {
    error.is_transient()
}

/// Extracts a readable message from an error response.
///
/// Tries `error.message`, a string `error`, and `message`, then the raw body,
/// then the status's reason phrase.
fn error_message(response: &RawProviderResponse) -> String {
    if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&response.body) {
        let structured = json
            .pointer("/error/message")
            .or_else(|| json.get("error").filter(|e| e.is_string()))
            .or_else(|| json.get("message"))
            .and_then(|v| v.as_str());
        if let Some(message) = structured {
            return message.to_string();
        }
    }

    let text = response.body_text();
    let text = text.trim();
    if !text.is_empty() {
        return text.chars().take(MAX_ERROR_MESSAGE_CHARS).collect();
    }

    reqwest::StatusCode::from_u16(response.status)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown error")
        .to_string()
}
