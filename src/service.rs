use crate::{
    ProviderConfig, TagError,
    executor::RequestExecutor,
    provider::{GenerationRequest, adapter_for},
    reconciler::reconcile,
};

/// Message sent by [`TagGenerationService::test_connectivity`].
pub const CONNECTIVITY_MESSAGE: &str = "Hello! This is a connectivity check.";

/// Orchestrates one tag generation round trip.
///
/// Validates the configuration, builds the provider request, executes it with
/// retries, parses the response and reconciles the result against the
/// caller's vocabulary. The service keeps no per-call state, so a single
/// instance can serve concurrent calls.
///
/// # Examples
///
/// ```no_run
/// use tagsmith::{ProviderConfig, ProviderKind, RequestExecutor, TagGenerationService};
///
/// # async fn example() -> Result<(), tagsmith::TagError> {
/// let service = TagGenerationService::new(RequestExecutor::with_defaults()?);
/// let config = ProviderConfig::builder()
///     .kind(ProviderKind::LocalOllama)
///     .model("llama3.2")
///     .build();
///
/// let existing = vec!["golang".to_string(), "storage".to_string()];
/// let tags = service
///     .generate("Notes on Go's database/sql package", &existing, &config)
///     .await?;
/// println!("{}", tags.join(", "));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TagGenerationService {
    executor: RequestExecutor,
}

impl TagGenerationService {
    pub fn new(executor: RequestExecutor) -> Self {
        Self { executor }
    }

    /// Generates tags for `content`, preferring tags from `existing_tags`.
    ///
    /// # Arguments
    ///
    /// * `content` - The full document text, un-truncated
    /// * `existing_tags` - The caller's tag vocabulary; may be empty
    /// * `config` - Provider settings for this call
    ///
    /// # Returns
    ///
    /// Tags in generation order, with close existing tags substituted.
    ///
    /// # Errors
    ///
    /// - [`TagError::Configuration`] before any request when the config is incomplete
    /// - [`TagError::Timeout`], [`TagError::RemoteError`], [`TagError::Network`] from execution
    /// - [`TagError::MalformedResponse`] when the reply has no text completion
    pub async fn generate(
        &self,
        content: &str,
        existing_tags: &[String],
        config: &ProviderConfig,
    ) -> Result<Vec<String>, TagError> {
        let candidates = self.candidates(content, existing_tags, config).await?;
        let tags = reconcile(&candidates, existing_tags);

        tracing::info!(
            provider = %config.resolved_kind(),
            model = config.model(),
            count = tags.len(),
            "generated tags"
        );

        Ok(tags)
    }

    /// Sends a short greeting through the same pipeline and discards the tags.
    ///
    /// # Errors
    ///
    /// Returns whatever [`TagGenerationService::generate`] would for this config.
    pub async fn test_connectivity(&self, config: &ProviderConfig) -> Result<(), TagError> {
        self.candidates(CONNECTIVITY_MESSAGE, &[], config).await?;
        tracing::info!(provider = %config.resolved_kind(), "connectivity check passed");
        Ok(())
    }

    async fn candidates(
        &self,
        content: &str,
        existing_tags: &[String],
        config: &ProviderConfig,
    ) -> Result<Vec<String>, TagError> {
        let kind = config.validate()?;
        if config.discards_api_key() {
            tracing::warn!(
                base_url = config.base_url(),
                "base URL looks local, so the configured API key will not be sent; set the provider kind explicitly to use it"
            );
        }
        let adapter = adapter_for(kind);

        let request = GenerationRequest::new(config, content, existing_tags);
        let spec = adapter.build_request(config, &request);
        let response = self.executor.execute(&spec).await?;

        adapter.parse_response(&response.body)
    }
}
