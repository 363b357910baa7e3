use std::fmt;
use std::str::FromStr;

use crate::error::TagError;

/// The wire contract a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI chat completions and anything compatible with it (DeepSeek, LM Studio, ...).
    OpenAiCompatible,
    /// Google Gemini `generateContent`.
    Gemini,
    /// Anthropic Claude messages API.
    Claude,
    /// A local Ollama-style server exposing the OpenAI chat shape without auth.
    LocalOllama,
}

impl ProviderKind {
    /// Every known provider kind.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAiCompatible,
        ProviderKind::Gemini,
        ProviderKind::Claude,
        ProviderKind::LocalOllama,
    ];

    /// Stable lowercase name used in configuration and messages.
    pub fn name(self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Claude => "claude",
            ProviderKind::LocalOllama => "ollama",
        }
    }

    /// Endpoint used when the configuration names the kind but no base URL.
    pub fn default_base_url(self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "https://api.openai.com/v1/chat/completions",
            ProviderKind::Gemini => "https://generativelanguage.googleapis.com/v1beta/models",
            ProviderKind::Claude => "https://api.anthropic.com/v1/messages",
            ProviderKind::LocalOllama => "http://localhost:11434/v1/chat/completions",
        }
    }

    /// Model used when the configuration names the kind but no model.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAiCompatible => "gpt-4o-mini",
            ProviderKind::Gemini => "gemini-1.5-flash",
            ProviderKind::Claude => "claude-3-haiku-20240307",
            ProviderKind::LocalOllama => "llama3.2",
        }
    }

    /// Whether requests to this kind must carry an API key.
    pub fn requires_api_key(self) -> bool {
        !matches!(self, ProviderKind::LocalOllama)
    }

    /// Infers the provider kind from a base URL's host.
    ///
    /// Unknown hosts and unparseable URLs fall back to the OpenAI-compatible
    /// shape; this never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagsmith::ProviderKind;
    ///
    /// assert_eq!(
    ///     ProviderKind::infer_from_url("https://api.anthropic.com/v1/messages"),
    ///     ProviderKind::Claude
    /// );
    /// assert_eq!(
    ///     ProviderKind::infer_from_url("https://api.deepseek.com/chat/completions"),
    ///     ProviderKind::OpenAiCompatible
    /// );
    /// ```
    pub fn infer_from_url(base_url: &str) -> ProviderKind {
        let Ok(url) = reqwest::Url::parse(base_url) else {
            return ProviderKind::OpenAiCompatible;
        };
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();

        if host.contains("generativelanguage") || host.contains("googleapis.com") {
            ProviderKind::Gemini
        } else if host.contains("anthropic.com") {
            ProviderKind::Claude
        } else if matches!(
            host.as_str(),
            "localhost" | "127.0.0.1" | "0.0.0.0" | "[::1]"
        ) || url.port() == Some(11434)
        {
            ProviderKind::LocalOllama
        } else {
            ProviderKind::OpenAiCompatible
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = TagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" | "openai-compatible" | "deepseek" => Ok(ProviderKind::OpenAiCompatible),
            "gemini" | "google" => Ok(ProviderKind::Gemini),
            "claude" | "anthropic" => Ok(ProviderKind::Claude),
            "ollama" | "local" => Ok(ProviderKind::LocalOllama),
            other => Err(TagError::config(format!("Unknown provider '{other}'"))),
        }
    }
}
