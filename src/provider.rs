/// Provider adapter layer.
///
/// Translates between the abstract tag generation request and each backend's
/// wire format, and turns raw responses back into candidate tags.
mod adapter;
mod kind;
mod normalizer;

pub use adapter::{
    ANTHROPIC_VERSION, ClaudeAdapter, DEFAULT_SYSTEM_PROMPT, GeminiAdapter, GenerationRequest,
    LocalOllamaAdapter, MAX_OUTPUT_TOKENS, OpenAiCompatibleAdapter, ProviderAdapter, RequestSpec,
    adapter_for, build_request, parse_response,
};
pub use kind::ProviderKind;
pub use normalizer::TagNormalizer;
