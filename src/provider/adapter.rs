//! Per-provider wire translation.
//!
//! Each [`ProviderKind`] has exactly one [`ProviderAdapter`] in the table
//! returned by [`adapter_for`]. Adapters are stateless and pure: they turn a
//! [`GenerationRequest`] into a [`RequestSpec`] and a raw response body back
//! into candidate tags. Nothing here touches the network.

use reqwest::Method;
use serde_json::{Value, json};

use super::kind::ProviderKind;
use super::normalizer::TagNormalizer;
use crate::config::ProviderConfig;
use crate::error::TagError;

/// Default system prompt sent to every provider.
///
/// Provider-agnostic; adapters only decide which field it lands in.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a tagging assistant. Read the document provided by the user and reply with tags describing what the document is ABOUT.

INSTRUCTIONS:
1. Return between 3 and 7 tags depending on the document's length and scope
2. Reply with ONLY the tags as a single comma-separated line, e.g.: rust, async, networking
3. Do not number the tags, do not prefix them with '#', and do not add explanations
4. Prefer single words; join multi-word concepts without spaces
5. Reuse tags from the existing vocabulary whenever one fits";

/// Upper bound on generated tokens for providers that require one.
pub const MAX_OUTPUT_TOKENS: u32 = 256;

/// Version header the Claude messages API expects.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Maximum number of existing tags listed in the prompt.
const MAX_VOCABULARY_HINT: usize = 200;

/// Abstract input of one tag generation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// The literal, un-truncated document content.
    pub document_text: String,
    /// Tags already in use by the host, in the host's order.
    pub existing_tags: Vec<String>,
    /// The system prompt to deliver.
    pub system_prompt: String,
}

impl GenerationRequest {
    /// Creates a request using the configured prompt override, or the default prompt.
    pub fn new(
        config: &ProviderConfig,
        document_text: impl Into<String>,
        existing_tags: &[String],
    ) -> Self {
        Self {
            document_text: document_text.into(),
            existing_tags: existing_tags.to_vec(),
            system_prompt: config
                .prompt_override()
                .unwrap_or(DEFAULT_SYSTEM_PROMPT)
                .to_string(),
        }
    }

    /// The prompt followed by a listing of the existing vocabulary, if any.
    pub fn instructions(&self) -> String {
        if self.existing_tags.is_empty() {
            return self.system_prompt.clone();
        }

        let listed: Vec<&str> = self
            .existing_tags
            .iter()
            .take(MAX_VOCABULARY_HINT)
            .map(String::as_str)
            .collect();
        format!(
            "{}\n\nEXISTING TAGS:\n{}",
            self.system_prompt,
            listed.join(", ")
        )
    }
}

/// A fully built outbound call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RequestSpec {
    fn post(url: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::POST,
            url: url.into(),
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
        }
    }

    fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_string(), value.into()));
        self
    }

    /// Looks up a header value by case-insensitive name.
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Translation between the abstract request and one provider's wire format.
pub trait ProviderAdapter: Send + Sync {
    /// The provider kind this adapter speaks for.
    fn kind(&self) -> ProviderKind;

    /// Builds the outbound call.
    fn build_request(&self, config: &ProviderConfig, request: &GenerationRequest) -> RequestSpec;

    /// Returns the first text completion in a decoded response, if present.
    fn extract_text<'a>(&self, body: &'a Value) -> Option<&'a str>;

    /// Turns a raw response body into candidate tags.
    ///
    /// # Errors
    ///
    /// Returns [`TagError::MalformedResponse`] if the body is not JSON or
    /// the expected text field is missing.
    fn parse_response(&self, raw_body: &[u8]) -> Result<Vec<String>, TagError> {
        let body: Value = serde_json::from_slice(raw_body).map_err(|e| {
            TagError::MalformedResponse(format!("{} response is not valid JSON: {e}", self.kind()))
        })?;

        let text = self.extract_text(&body).ok_or_else(|| {
            TagError::MalformedResponse(format!(
                "{} response has no text completion",
                self.kind()
            ))
        })?;

        Ok(TagNormalizer::split_tags(text))
    }
}

/// OpenAI chat completions shape.
pub struct OpenAiCompatibleAdapter;

/// Google Gemini `generateContent` shape.
pub struct GeminiAdapter;

/// Anthropic messages shape.
pub struct ClaudeAdapter;

/// OpenAI shape against a local server, without credentials.
pub struct LocalOllamaAdapter;

static OPENAI_COMPATIBLE: OpenAiCompatibleAdapter = OpenAiCompatibleAdapter;
static GEMINI: GeminiAdapter = GeminiAdapter;
static CLAUDE: ClaudeAdapter = ClaudeAdapter;
static LOCAL_OLLAMA: LocalOllamaAdapter = LocalOllamaAdapter;

/// Returns the adapter registered for `kind`.
pub fn adapter_for(kind: ProviderKind) -> &'static dyn ProviderAdapter {
    match kind {
        ProviderKind::OpenAiCompatible => &OPENAI_COMPATIBLE,
        ProviderKind::Gemini => &GEMINI,
        ProviderKind::Claude => &CLAUDE,
        ProviderKind::LocalOllama => &LOCAL_OLLAMA,
    }
}

/// Builds the outbound call for the configuration's resolved kind.
pub fn build_request(config: &ProviderConfig, request: &GenerationRequest) -> RequestSpec {
    adapter_for(config.resolved_kind()).build_request(config, request)
}

/// Parses a raw response body according to `kind`'s response schema.
///
/// # Errors
///
/// Returns [`TagError::MalformedResponse`] when the expected field is absent.
pub fn parse_response(raw_body: &[u8], kind: ProviderKind) -> Result<Vec<String>, TagError> {
    adapter_for(kind).parse_response(raw_body)
}

/// The document text, cut to the configured character limit.
fn document_for(config: &ProviderConfig, request: &GenerationRequest) -> String {
    let text = request.document_text.as_str();
    match config.max_content_chars() {
        Some(limit) => match text.char_indices().nth(limit) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text.to_string(),
        },
        None => text.to_string(),
    }
}

fn chat_body(config: &ProviderConfig, request: &GenerationRequest) -> Value {
    json!({
        "model": config.model(),
        "messages": [
            { "role": "system", "content": request.instructions() },
            { "role": "user", "content": document_for(config, request) },
        ],
    })
}

fn chat_text(body: &Value) -> Option<&str> {
    body.pointer("/choices/0/message/content")?.as_str()
}

impl ProviderAdapter for OpenAiCompatibleAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAiCompatible
    }

    fn build_request(&self, config: &ProviderConfig, request: &GenerationRequest) -> RequestSpec {
        let spec = RequestSpec::post(config.base_url(), chat_body(config, request));
        match config.api_key() {
            Some(key) => spec.header("Authorization", format!("Bearer {key}")),
            None => spec,
        }
    }

    fn extract_text<'a>(&self, body: &'a Value) -> Option<&'a str> {
        chat_text(body)
    }
}

impl ProviderAdapter for LocalOllamaAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::LocalOllama
    }

    fn build_request(&self, config: &ProviderConfig, request: &GenerationRequest) -> RequestSpec {
        let mut body = chat_body(config, request);
        body["stream"] = json!(false);
        RequestSpec::post(config.base_url(), body)
    }

    fn extract_text<'a>(&self, body: &'a Value) -> Option<&'a str> {
        chat_text(body)
    }
}

impl ProviderAdapter for GeminiAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn build_request(&self, config: &ProviderConfig, request: &GenerationRequest) -> RequestSpec {
        let url = format!(
            "{}/{}:generateContent",
            config.base_url().trim_end_matches('/'),
            config.model()
        );
        let body = json!({
            "contents": [{
                "parts": [
                    { "text": request.instructions() },
                    { "text": document_for(config, request) },
                ],
            }],
        });

        let spec = RequestSpec::post(url, body);
        match config.api_key() {
            Some(key) => spec.header("x-goog-api-key", key),
            None => spec,
        }
    }

    fn extract_text<'a>(&self, body: &'a Value) -> Option<&'a str> {
        body.pointer("/candidates/0/content/parts/0/text")?.as_str()
    }
}

impl ProviderAdapter for ClaudeAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Claude
    }

    fn build_request(&self, config: &ProviderConfig, request: &GenerationRequest) -> RequestSpec {
        let body = json!({
            "model": config.model(),
            "max_tokens": MAX_OUTPUT_TOKENS,
            "system": request.instructions(),
            "messages": [
                { "role": "user", "content": document_for(config, request) },
            ],
        });

        let spec = RequestSpec::post(config.base_url(), body)
            .header("anthropic-version", ANTHROPIC_VERSION);
        match config.api_key() {
            Some(key) => spec.header("x-api-key", key),
            None => spec,
        }
    }

    fn extract_text<'a>(&self, body: &'a Value) -> Option<&'a str> {
        body.pointer("/content/0/text")
            .and_then(Value::as_str)
            .or_else(|| body.get("completion").and_then(Value::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(text: &str, existing: &[&str]) -> GenerationRequest {
        GenerationRequest {
            document_text: text.to_string(),
            existing_tags: existing.iter().map(|t| t.to_string()).collect(),
            system_prompt: "PROMPT".to_string(),
        }
    }

    fn config(kind: ProviderKind, key: Option<&str>) -> ProviderConfig {
        let builder = ProviderConfig::builder().kind(kind);
        match key {
            Some(key) => builder.api_key(key).build(),
            None => builder.build(),
        }
    }

    #[test]
    fn table_returns_matching_adapter_for_every_kind() {
        for kind in ProviderKind::ALL {
            assert_eq!(adapter_for(kind).kind(), kind);
        }
    }

    #[test]
    fn openai_request_shape() {
        let spec = build_request(
            &config(ProviderKind::OpenAiCompatible, Some("sk-test")),
            &request("Body text", &[]),
        );

        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.url, "https://api.openai.com/v1/chat/completions");
        assert_eq!(spec.header_value("authorization"), Some("Bearer sk-test"));
        assert_eq!(spec.body["model"], "gpt-4o-mini");
        assert_eq!(spec.body["messages"][0]["role"], "system");
        assert_eq!(spec.body["messages"][0]["content"], "PROMPT");
        assert_eq!(spec.body["messages"][1]["role"], "user");
        assert_eq!(spec.body["messages"][1]["content"], "Body text");
    }

    #[test]
    fn openai_request_omits_authorization_without_key() {
        let cfg = ProviderConfig::builder()
            .base_url("https://llm.example.com/v1/chat/completions")
            .model("m")
            .api_key("")
            .build();
        let spec = build_request(&cfg, &request("x", &[]));
        assert_eq!(spec.header_value("Authorization"), None);
    }

    #[test]
    fn local_request_never_sends_authorization() {
        let spec = build_request(
            &config(ProviderKind::LocalOllama, Some("ignored-key")),
            &request("Body text", &[]),
        );

        assert_eq!(spec.url, "http://localhost:11434/v1/chat/completions");
        assert_eq!(spec.header_value("Authorization"), None);
        assert_eq!(spec.body["stream"], false);
        assert_eq!(spec.body["messages"][1]["content"], "Body text");
    }

    #[test]
    fn gemini_request_shape() {
        let cfg = ProviderConfig::builder()
            .kind(ProviderKind::Gemini)
            .base_url("https://generativelanguage.googleapis.com/v1beta/models/")
            .api_key("g-key")
            .build();
        let spec = build_request(&cfg, &request("Body text", &[]));

        assert_eq!(
            spec.url,
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(spec.header_value("x-goog-api-key"), Some("g-key"));
        assert_eq!(spec.body["contents"][0]["parts"][0]["text"], "PROMPT");
        assert_eq!(spec.body["contents"][0]["parts"][1]["text"], "Body text");
    }

    #[test]
    fn claude_request_shape() {
        let spec = build_request(
            &config(ProviderKind::Claude, Some("sk-ant")),
            &request("Body text", &[]),
        );

        assert_eq!(spec.url, "https://api.anthropic.com/v1/messages");
        assert_eq!(spec.header_value("x-api-key"), Some("sk-ant"));
        assert_eq!(spec.header_value("anthropic-version"), Some(ANTHROPIC_VERSION));
        assert_eq!(spec.body["system"], "PROMPT");
        assert_eq!(spec.body["max_tokens"], 256);
        assert_eq!(spec.body["messages"].as_array().map(Vec::len), Some(1));
        assert_eq!(spec.body["messages"][0]["content"], "Body text");
    }

    #[test]
    fn unknown_host_uses_openai_shape() {
        let cfg = ProviderConfig::builder()
            .base_url("https://llm.internal.example/v1/chat/completions")
            .model("house-model")
            .api_key("k")
            .build();
        let spec = build_request(&cfg, &request("x", &[]));
        assert_eq!(spec.url, "https://llm.internal.example/v1/chat/completions");
        assert!(spec.body.get("messages").is_some());
        assert_eq!(spec.header_value("Authorization"), Some("Bearer k"));
    }

    #[test]
    fn existing_tags_are_listed_after_prompt() {
        let spec = build_request(
            &config(ProviderKind::OpenAiCompatible, Some("k")),
            &request("x", &["golang", "storage"]),
        );
        let system = spec.body["messages"][0]["content"].as_str().unwrap();
        assert!(system.starts_with("PROMPT"));
        assert!(system.ends_with("golang, storage"));
    }

    #[test]
    fn vocabulary_hint_lists_at_most_200_tags() {
        let tags: Vec<String> = (0..250).map(|i| format!("tag{i}")).collect();
        let req = GenerationRequest {
            document_text: "x".to_string(),
            existing_tags: tags,
            system_prompt: "PROMPT".to_string(),
        };

        let instructions = req.instructions();
        let (_, list) = instructions.split_once("EXISTING TAGS:\n").unwrap();
        let listed: Vec<&str> = list.split(", ").collect();

        assert_eq!(listed.len(), MAX_VOCABULARY_HINT);
        assert_eq!(listed.first(), Some(&"tag0"));
        assert_eq!(listed.last(), Some(&"tag199"));
        assert!(!listed.contains(&"tag200"));
    }

    #[test]
    fn document_is_truncated_on_char_boundary() {
        let cfg = ProviderConfig::builder()
            .kind(ProviderKind::LocalOllama)
            .max_content_chars(3)
            .build();
        let spec = build_request(&cfg, &request("héllo wörld", &[]));
        assert_eq!(spec.body["messages"][1]["content"], "hél");

        let spec = build_request(&cfg, &request("hi", &[]));
        assert_eq!(spec.body["messages"][1]["content"], "hi");
    }

    #[test]
    fn prompt_override_replaces_default() {
        let cfg = ProviderConfig::builder()
            .kind(ProviderKind::LocalOllama)
            .prompt_override("Only nouns please")
            .build();
        let req = GenerationRequest::new(&cfg, "doc", &[]);
        assert_eq!(req.system_prompt, "Only nouns please");

        let default_cfg = ProviderConfig::builder()
            .kind(ProviderKind::LocalOllama)
            .build();
        let req = GenerationRequest::new(&default_cfg, "doc", &[]);
        assert_eq!(req.system_prompt, DEFAULT_SYSTEM_PROMPT);
    }

    #[test]
    fn parses_openai_response() {
        let body = br#"{"choices":[{"message":{"content":"ai, tags, golang"}}]}"#;
        assert_eq!(
            parse_response(body, ProviderKind::OpenAiCompatible).unwrap(),
            vec!["ai", "tags", "golang"]
        );
        assert_eq!(
            parse_response(body, ProviderKind::LocalOllama).unwrap(),
            vec!["ai", "tags", "golang"]
        );
    }

    #[test]
    fn parses_gemini_response() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"machine learning, nlp"}]}}]}"#;
        assert_eq!(
            parse_response(body, ProviderKind::Gemini).unwrap(),
            vec!["machinelearning", "nlp"]
        );
    }

    #[test]
    fn parses_claude_response_and_completion_fallback() {
        let body = br#"{"content":[{"type":"text","text":"rust, async"}]}"#;
        assert_eq!(
            parse_response(body, ProviderKind::Claude).unwrap(),
            vec!["rust", "async"]
        );

        let legacy = br#"{"completion":" rust, tokio"}"#;
        assert_eq!(
            parse_response(legacy, ProviderKind::Claude).unwrap(),
            vec!["rust", "tokio"]
        );
    }

    #[test]
    fn missing_text_field_is_malformed() {
        let body = br#"{"choices":[]}"#;
        assert!(matches!(
            parse_response(body, ProviderKind::OpenAiCompatible),
            Err(TagError::MalformedResponse(_))
        ));

        let wrong_schema = br#"{"choices":[{"message":{"content":"a, b"}}]}"#;
        assert!(matches!(
            parse_response(wrong_schema, ProviderKind::Gemini),
            Err(TagError::MalformedResponse(_))
        ));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(
            parse_response(b"<html>oops</html>", ProviderKind::Claude),
            Err(TagError::MalformedResponse(_))
        ));
    }
}
