//! Provider configuration.
//!
//! A [`ProviderConfig`] is an immutable value supplied with every call. It is
//! built through [`ProviderConfigBuilder`], optionally seeded from `TAGSMITH_*`
//! environment variables. Values set on the builder take precedence over the
//! environment, and per-kind defaults fill in whatever is still missing when
//! the provider kind is named explicitly.

use std::str::FromStr;

use reqwest::header::HeaderValue;

use crate::error::TagError;
use crate::provider::ProviderKind;

pub const ENV_PROVIDER: &str = "TAGSMITH_PROVIDER";
pub const ENV_API_KEY: &str = "TAGSMITH_API_KEY";
pub const ENV_BASE_URL: &str = "TAGSMITH_BASE_URL";
pub const ENV_MODEL: &str = "TAGSMITH_MODEL";
pub const ENV_PROMPT: &str = "TAGSMITH_PROMPT";
pub const ENV_MAX_CONTENT_CHARS: &str = "TAGSMITH_MAX_CONTENT_CHARS";
pub const ENV_TIMEOUT_SECS: &str = "TAGSMITH_TIMEOUT_SECS";
pub const ENV_MAX_RETRIES: &str = "TAGSMITH_MAX_RETRIES";

/// Connection settings for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    kind: Option<ProviderKind>,
    api_key: Option<String>,
    base_url: String,
    model: String,
    prompt_override: Option<String>,
    max_content_chars: Option<usize>,
}

impl ProviderConfig {
    /// Starts a new builder with nothing set.
    pub fn builder() -> ProviderConfigBuilder {
        ProviderConfigBuilder::new()
    }

    /// The explicitly configured kind, if any.
    pub fn kind(&self) -> Option<ProviderKind> {
        self.kind
    }

    /// The explicit kind, or the one inferred from the base URL's host.
    pub fn resolved_kind(&self) -> ProviderKind {
        self.kind
            .unwrap_or_else(|| ProviderKind::infer_from_url(&self.base_url))
    }

    /// The API key, treating an empty string the same as no key.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|key| !key.trim().is_empty())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt_override(&self) -> Option<&str> {
        self.prompt_override.as_deref()
    }

    pub fn max_content_chars(&self) -> Option<usize> {
        self.max_content_chars
    }

    /// Returns `true` when a key is set but the kind was inferred as local,
    /// which never sends one.
    pub fn discards_api_key(&self) -> bool {
        self.kind.is_none()
            && self.resolved_kind() == ProviderKind::LocalOllama
            && self.api_key().is_some()
    }

    /// Checks the invariants a request needs before anything is sent.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Configuration`] when the base URL or model is empty,
    /// when the resolved kind needs an API key and none is set, or when the
    /// key cannot be carried in an HTTP header.
    pub fn validate(&self) -> Result<ProviderKind, TagError> {
        if self.base_url.trim().is_empty() {
            return Err(TagError::config("Base URL cannot be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(TagError::config("Model cannot be empty"));
        }

        let kind = self.resolved_kind();
        if kind.requires_api_key() && self.api_key().is_none() {
            return Err(TagError::config(format!(
                "API key is required for provider '{kind}'"
            )));
        }
        if let Some(key) = self.api_key().filter(|_| kind.requires_api_key()) {
            HeaderValue::from_str(key).map_err(|_| {
                TagError::config(format!(
                    "API key for provider '{kind}' contains characters not allowed in an HTTP header"
                ))
            })?;
        }

        Ok(kind)
    }
}

/// Builder for [`ProviderConfig`].
///
/// # Examples
///
/// ```
/// use tagsmith::{ProviderConfig, ProviderKind};
///
/// let config = ProviderConfig::builder()
///     .kind(ProviderKind::Claude)
///     .api_key("sk-ant-test")
///     .build();
///
/// assert_eq!(config.base_url(), "https://api.anthropic.com/v1/messages");
/// assert_eq!(config.model(), "claude-3-haiku-20240307");
/// ```
#[derive(Debug, Default, Clone)]
pub struct ProviderConfigBuilder {
    kind: Option<ProviderKind>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    prompt_override: Option<String>,
    max_content_chars: Option<usize>,
}

impl ProviderConfigBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded from `TAGSMITH_*` environment variables.
    ///
    /// Empty variables are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::Configuration`] if `TAGSMITH_PROVIDER` names an
    /// unknown provider or `TAGSMITH_MAX_CONTENT_CHARS` is not a number.
    pub fn from_env() -> Result<Self, TagError> {
        Ok(Self {
            kind: env_var(ENV_PROVIDER).map(|v| v.parse()).transpose()?,
            api_key: env_var(ENV_API_KEY),
            base_url: env_var(ENV_BASE_URL),
            model: env_var(ENV_MODEL),
            prompt_override: env_var(ENV_PROMPT),
            max_content_chars: env_parse(ENV_MAX_CONTENT_CHARS)?,
        })
    }

    pub fn kind(mut self, kind: ProviderKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replaces the default system prompt.
    pub fn prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.prompt_override = Some(prompt.into());
        self
    }

    /// Caps how many characters of the document are sent to the provider.
    pub fn max_content_chars(mut self, limit: usize) -> Self {
        self.max_content_chars = Some(limit);
        self
    }

    /// Builds the configuration.
    ///
    /// When the kind was named explicitly, a missing or empty base URL or
    /// model is replaced by that kind's default. Otherwise values are kept
    /// as given; [`ProviderConfig::validate`] reports what is missing.
    pub fn build(self) -> ProviderConfig {
        let base_url = non_empty(self.base_url);
        let model = non_empty(self.model);

        let (base_url, model) = match self.kind {
            Some(kind) => (
                base_url.unwrap_or_else(|| kind.default_base_url().to_string()),
                model.unwrap_or_else(|| kind.default_model().to_string()),
            ),
            None => (base_url.unwrap_or_default(), model.unwrap_or_default()),
        };

        ProviderConfig {
            kind: self.kind,
            api_key: self.api_key,
            base_url,
            model,
            prompt_override: non_empty(self.prompt_override),
            max_content_chars: self.max_content_chars,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Reads an environment variable, treating empty values as unset.
pub(crate) fn env_var(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

/// Reads and parses an environment variable.
///
/// # Errors
///
/// Returns [`TagError::Configuration`] naming the variable when parsing fails.
pub(crate) fn env_parse<T>(name: &str) -> Result<Option<T>, TagError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| TagError::config(format!("Invalid value for {name}: {e}")))
        })
        .transpose()
}
