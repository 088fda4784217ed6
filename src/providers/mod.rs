//! API provider adapters
//!
//! Each provider module implements the [`ApiProvider`] trait, normalizing a
//! vendor's auth headers, payload shape, response parsing, and streaming
//! event detection so the runner stays vendor-agnostic.

pub mod azure;
pub mod claude;
pub mod openai;

pub use azure::AzureOpenAiProvider;
pub use claude::ClaudeProvider;
pub use openai::OpenAiProvider;

use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifying triple for one API under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API endpoint URL
    pub api_url: String,
    /// API credential
    pub api_key: String,
    /// Model name
    pub model: String,
}

impl ProviderConfig {
    /// Create a new provider config.
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }
}

/// Adapter over one vendor's chat-completion protocol.
pub trait ApiProvider: std::fmt::Debug + Send + Sync {
    /// HTTP headers for every request, including the vendor's auth scheme.
    fn headers(&self) -> Result<HeaderMap>;

    /// Vendor-shaped request body for the given prompt.
    fn build_payload(&self, prompt: &str, stream: bool) -> Value;

    /// The URL requests are sent to.
    ///
    /// All current vendors use the configured endpoint as-is; this is the
    /// extension point for vendors that construct URLs from parts.
    fn request_url(&self) -> &str;

    /// Count of generated tokens in a non-streaming response body.
    fn parse_token_count(&self, body: &Value) -> u64;

    /// Plain text content of a non-streaming response body.
    ///
    /// Returns an empty string when the expected shape is absent.
    fn parse_content(&self, body: &Value) -> String;

    /// Whether a single SSE line carries the first unit of generated content.
    fn is_first_content_event(&self, line: &str) -> bool;

    /// Provider name, for logging.
    fn name(&self) -> &'static str;
}

/// Enumeration of supported API kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApiKind {
    /// OpenAI-compatible API (also vLLM, SGLang, most gateways)
    #[serde(rename = "openai")]
    OpenAi,
    /// Anthropic Claude API
    #[serde(rename = "claude")]
    Claude,
    /// Azure OpenAI Service
    #[serde(rename = "azure")]
    Azure,
}

impl ApiKind {
    /// Returns the identifier string for this kind.
    pub fn id(&self) -> &'static str {
        match self {
            ApiKind::OpenAi => "openai",
            ApiKind::Claude => "claude",
            ApiKind::Azure => "azure",
        }
    }

    /// Returns all supported kinds.
    pub fn all() -> &'static [ApiKind] {
        &[ApiKind::OpenAi, ApiKind::Claude, ApiKind::Azure]
    }
}

impl std::fmt::Display for ApiKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl std::str::FromStr for ApiKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ApiKind::OpenAi),
            "claude" | "anthropic" => Ok(ApiKind::Claude),
            "azure" | "azure_openai" | "azure-openai" => Ok(ApiKind::Azure),
            _ => {
                let supported: Vec<&str> = ApiKind::all().iter().map(|k| k.id()).collect();
                Err(unsupported_kind(s, &supported))
            }
        }
    }
}

fn unsupported_kind(kind: &str, supported: &[&str]) -> Error {
    Error::Config(format!(
        "unsupported API type: {}. supported types: {}",
        kind,
        supported.join(", ")
    ))
}

type Constructor = fn(ProviderConfig) -> Box<dyn ApiProvider>;

/// Maps provider kinds to adapter constructors.
///
/// An explicit registry object rather than a process-global, so independent
/// callers (and tests) can carry independently configured registries.
/// Lookup goes through [`ApiKind`]'s `FromStr`, so kind tags are
/// case-insensitive and the enum's aliases resolve here too.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    entries: Vec<(ApiKind, Constructor)>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a constructor for a kind.
    ///
    /// Registering the same kind again replaces the earlier constructor.
    pub fn register(&mut self, kind: ApiKind, ctor: Constructor) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == kind) {
            entry.1 = ctor;
        } else {
            self.entries.push((kind, ctor));
        }
    }

    /// Kind tags this registry can construct.
    pub fn supported(&self) -> Vec<&'static str> {
        self.entries.iter().map(|(kind, _)| kind.id()).collect()
    }

    /// Construct the adapter for a kind tag (case-insensitive).
    pub fn create(&self, kind: &str, config: ProviderConfig) -> Result<Box<dyn ApiProvider>> {
        let Ok(parsed) = kind.parse::<ApiKind>() else {
            return Err(unsupported_kind(kind, &self.supported()));
        };
        match self.entries.iter().find(|(k, _)| *k == parsed) {
            Some((_, ctor)) => Ok(ctor(config)),
            None => Err(unsupported_kind(kind, &self.supported())),
        }
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ApiKind::OpenAi, |c| Box::new(OpenAiProvider::new(c)));
        registry.register(ApiKind::Claude, |c| Box::new(ClaudeProvider::new(c)));
        registry.register(ApiKind::Azure, |c| Box::new(AzureOpenAiProvider::new(c)));
        registry
    }
}

/// Construct an adapter from the default registry.
pub fn create_provider(kind: &str, config: ProviderConfig) -> Result<Box<dyn ApiProvider>> {
    ProviderRegistry::default().create(kind, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new("https://api.example.com/v1/chat", "test-key", "test-model")
    }

    #[test]
    fn test_create_known_kinds() {
        for kind in ["openai", "claude", "azure"] {
            let provider = create_provider(kind, config()).unwrap();
            assert_eq!(provider.name(), kind);
        }
    }

    #[test]
    fn test_create_is_case_insensitive() {
        let provider = create_provider("OpenAI", config()).unwrap();
        assert_eq!(provider.name(), "openai");
        let provider = create_provider("CLAUDE", config()).unwrap();
        assert_eq!(provider.name(), "claude");
    }

    #[test]
    fn test_create_unknown_kind_names_supported_set() {
        let err = create_provider("invalid_type", config()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("invalid_type"));
        assert!(msg.contains("openai"));
        assert!(msg.contains("claude"));
        assert!(msg.contains("azure"));
    }

    #[test]
    fn test_create_resolves_aliases() {
        let provider = create_provider("anthropic", config()).unwrap();
        assert_eq!(provider.name(), "claude");
        let provider = create_provider("azure_openai", config()).unwrap();
        assert_eq!(provider.name(), "azure");
        let provider = create_provider("azure-openai", config()).unwrap();
        assert_eq!(provider.name(), "azure");
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = ProviderRegistry::empty();
        registry.register(ApiKind::OpenAi, |c| Box::new(OpenAiProvider::new(c)));

        assert!(registry.create("openai", config()).is_ok());
        let err = registry.create("claude", config()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        // A narrowed registry reports its own supported set
        assert!(err.to_string().ends_with("supported types: openai"));
    }

    #[test]
    fn test_register_replaces_existing_kind() {
        let mut registry = ProviderRegistry::default();
        registry.register(ApiKind::OpenAi, |c| Box::new(ClaudeProvider::new(c)));

        let provider = registry.create("openai", config()).unwrap();
        assert_eq!(provider.name(), "claude");
        assert_eq!(registry.supported().len(), 3);
    }

    #[test]
    fn test_providers_are_debuggable() {
        let provider = create_provider("openai", config()).unwrap();
        assert!(format!("{:?}", provider).contains("OpenAiProvider"));
    }

    #[test]
    fn test_api_kind_from_str() {
        assert_eq!("openai".parse::<ApiKind>().unwrap(), ApiKind::OpenAi);
        assert_eq!("anthropic".parse::<ApiKind>().unwrap(), ApiKind::Claude);
        assert_eq!("azure-openai".parse::<ApiKind>().unwrap(), ApiKind::Azure);
        assert!("unknown".parse::<ApiKind>().is_err());
    }

    #[test]
    fn test_api_kind_display() {
        assert_eq!(ApiKind::OpenAi.to_string(), "openai");
        assert_eq!(ApiKind::Claude.to_string(), "claude");
        assert_eq!(ApiKind::Azure.to_string(), "azure");
    }

    #[test]
    fn test_api_kind_serialization() {
        assert_eq!(serde_json::to_string(&ApiKind::Azure).unwrap(), "\"azure\"");
        let kind: ApiKind = serde_json::from_str("\"claude\"").unwrap();
        assert_eq!(kind, ApiKind::Claude);
    }
}
