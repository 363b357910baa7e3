pub mod config;
pub mod error;
pub mod executor;
pub mod frontmatter;
pub mod provider;
pub mod reconciler;
pub mod service;

pub use config::{ProviderConfig, ProviderConfigBuilder};
pub use error::TagError;
pub use executor::{
    ExecutorConfig, HttpTransport, RawProviderResponse, ReqwestTransport, RequestExecutor,
};
pub use frontmatter::merge_tags;
pub use provider::{GenerationRequest, ProviderAdapter, ProviderKind, RequestSpec, TagNormalizer};
pub use reconciler::{SIMILARITY_THRESHOLD, reconcile, similarity};
pub use service::TagGenerationService;
