use async_trait::async_trait;

use crate::error::TagError;
use crate::provider::RequestSpec;

/// Status and body of one provider response.
///
/// Lives only as long as the call that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProviderResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawProviderResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body decoded as UTF-8, replacing invalid sequences.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends a built request and returns whatever status the remote answered with.
///
/// Implementations must not interpret the status; classification and retries
/// belong to the executor. This seam exists so tests can script responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, spec: &RequestSpec) -> Result<RawProviderResponse, TagError>;
}

/// Transport backed by a pooled `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with no deadlines of its own.
    ///
    /// Connecting counts against the executor's per-attempt deadline, so a
    /// stalled connect surfaces as [`TagError::Timeout`].
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Network`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, TagError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TagError::Network(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, spec: &RequestSpec) -> Result<RawProviderResponse, TagError> {
        // Serialized by hand so the request's own Content-Type header is the only one sent.
        let body = serde_json::to_vec(&spec.body)
            .map_err(|e| TagError::Network(format!("Failed to encode request body: {e}")))?;
        let mut request = self
            .client
            .request(spec.method.clone(), &spec.url)
            .body(body);

        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| TagError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| TagError::Network(format!("Failed to read response body: {e}")))?;

        Ok(RawProviderResponse::new(status, body.to_vec()))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Transport that replays a fixed script of outcomes and records what it was sent.
    ///
    /// Once the script runs out, the last outcome repeats.
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Result<RawProviderResponse, TagError>>>,
        last: Mutex<Option<Result<RawProviderResponse, TagError>>>,
        sent: Mutex<Vec<RequestSpec>>,
        calls: AtomicUsize,
        delay: Option<Duration>,
    }

    impl ScriptedTransport {
        pub(crate) fn new(script: Vec<Result<RawProviderResponse, TagError>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                last: Mutex::new(None),
                sent: Mutex::new(Vec::new()),
                calls: AtomicUsize::new(0),
                delay: None,
            }
        }

        /// Always answers with the same successful body.
        pub(crate) fn ok(body: &str) -> Self {
            Self::new(vec![Ok(RawProviderResponse::new(200, body))])
        }

        /// Sleeps before answering, to exercise deadlines.
        pub(crate) fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub(crate) fn sent(&self) -> Vec<RequestSpec> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, spec: &RequestSpec) -> Result<RawProviderResponse, TagError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.sent.lock().unwrap().push(spec.clone());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(outcome) => {
                    *self.last.lock().unwrap() = Some(outcome.clone());
                    outcome
                }
                None => self
                    .last
                    .lock()
                    .unwrap()
                    .clone()
                    .unwrap_or_else(|| Err(TagError::Network("script is empty".to_string()))),
            }
        }
    }
}
