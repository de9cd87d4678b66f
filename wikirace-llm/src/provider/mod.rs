//! # LLM Provider Interface
//!
//! - `LlmProvider` trait defines the core interface
//! - Implementations for Gemini, OpenAI-compatible APIs and Anthropic
//! - Usage tracking across calls

pub mod anthropic;
pub mod gemini;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

// ============================================================================
// Core Types
// ============================================================================

/// A chat message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Request parameters for a completion
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<usize>,
    pub stop: Option<Vec<String>>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_max_tokens(mut self, max: usize) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Split off the system prompt; providers that take it out of band
    /// (Gemini, Anthropic) send it separately. Later system messages win.
    pub(crate) fn split_system(&self) -> (Option<String>, Vec<&ChatMessage>) {
        let mut system = None;
        let mut rest = Vec::new();
        for msg in &self.messages {
            if msg.role == Role::System {
                system = Some(msg.content.clone());
            } else {
                rest.push(msg);
            }
        }
        (system, rest)
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub id: String,
    pub model: String,
    pub content: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Unknown,
}

/// Token usage information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// The request exceeded the client timeout
    Timeout,
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    AuthenticationFailed,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl ProviderError {
    /// Classify a transport-level reqwest failure
    pub(crate) fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Map a non-success HTTP status to the matching variant
    pub(crate) fn from_status(status: u16, message: String, retry_after: Option<u64>) -> Self {
        match status {
            429 => Self::RateLimited { retry_after },
            401 | 403 => Self::AuthenticationFailed,
            _ => Self::Api { status, message },
        }
    }
}

/// The main LLM provider trait
#[allow(async_fn_in_trait)]
pub trait LlmProvider {
    /// Get the provider name (e.g., "gemini", "openai")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send a completion request and get a full response
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError>;
}

/// A provider picked at runtime from a [`ProviderConfig`]
pub enum AnyProvider {
    Gemini(GeminiProvider),
    OpenAI(OpenAIProvider),
    Anthropic(AnthropicProvider),
}

impl AnyProvider {
    pub fn from_config(config: ProviderConfig) -> Result<Self, ProviderError> {
        Ok(match config.provider_type {
            ProviderType::Gemini => Self::Gemini(GeminiProvider::new(config)?),
            ProviderType::OpenAI | ProviderType::Local => Self::OpenAI(OpenAIProvider::new(config)?),
            ProviderType::Anthropic => Self::Anthropic(AnthropicProvider::new(config)?),
        })
    }
}

impl LlmProvider for AnyProvider {
    fn name(&self) -> &str {
        match self {
            Self::Gemini(p) => p.name(),
            Self::OpenAI(p) => p.name(),
            Self::Anthropic(p) => p.name(),
        }
    }

    fn default_model(&self) -> &str {
        match self {
            Self::Gemini(p) => p.default_model(),
            Self::OpenAI(p) => p.default_model(),
            Self::Anthropic(p) => p.default_model(),
        }
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        match self {
            Self::Gemini(p) => p.complete(request).await,
            Self::OpenAI(p) => p.complete(request).await,
            Self::Anthropic(p) => p.complete(request).await,
        }
    }
}

/// Seconds from a `Retry-After` header, when present and numeric
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub provider_type: ProviderType,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub headers: HashMap<String, String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderType {
    Gemini,
    OpenAI,
    Anthropic,
    Local,
}

impl ProviderType {
    /// Environment variable holding the credential, if the provider needs one
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            ProviderType::Gemini => Some("GEMINI_API_KEY"),
            ProviderType::OpenAI => Some("OPENAI_API_KEY"),
            ProviderType::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderType::Local => None,
        }
    }
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Gemini,
            api_key: Some(api_key.into()),
            base_url: Some("https://generativelanguage.googleapis.com/v1beta".into()),
            default_model: Some("gemini-2.5-flash".into()),
            headers: HashMap::new(),
            timeout_secs: Some(60),
        }
    }

    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::OpenAI,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.openai.com/v1".into()),
            default_model: Some("gpt-4o-mini".into()),
            headers: HashMap::new(),
            timeout_secs: Some(60),
        }
    }

    pub fn anthropic(api_key: impl Into<String>) -> Self {
        let mut headers = HashMap::new();
        headers.insert("anthropic-version".into(), "2023-06-01".into());

        Self {
            provider_type: ProviderType::Anthropic,
            api_key: Some(api_key.into()),
            base_url: Some("https://api.anthropic.com/v1".into()),
            default_model: Some("claude-3-5-haiku-20241022".into()),
            headers,
            timeout_secs: Some(60),
        }
    }

    /// OpenAI-compatible server without authentication (Ollama, vLLM)
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider_type: ProviderType::Local,
            api_key: None,
            base_url: Some(base_url.into()),
            default_model: Some(model.into()),
            headers: HashMap::new(),
            timeout_secs: Some(300),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Build the HTTP client every provider shares the setup of
    pub(crate) fn http_client(&self, default_timeout: u64) -> Result<reqwest::Client, ProviderError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs.unwrap_or(default_timeout)))
            .build()
            .map_err(|e| ProviderError::Other(format!("failed to create HTTP client: {}", e)))
    }
}

// ============================================================================
// Usage Tracking
// ============================================================================

/// Tracks token usage across multiple calls
#[derive(Debug, Clone, Default, Serialize)]
pub struct UsageTracker {
    pub total_calls: usize,
    pub total_prompt_tokens: usize,
    pub total_completion_tokens: usize,
    pub by_model: HashMap<String, Usage>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, model: &str, usage: &Usage) {
        self.total_calls += 1;
        self.total_prompt_tokens += usage.prompt_tokens;
        self.total_completion_tokens += usage.completion_tokens;

        let entry = self.by_model.entry(model.to_string()).or_default();
        entry.prompt_tokens += usage.prompt_tokens;
        entry.completion_tokens += usage.completion_tokens;
        entry.total_tokens += usage.total_tokens;
    }

    pub fn total_tokens(&self) -> usize {
        self.total_prompt_tokens + self.total_completion_tokens
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_constructors() {
        let sys = ChatMessage::system("You are a Wikipedia Game player");
        assert_eq!(sys.role, Role::System);
        assert_eq!(sys.content, "You are a Wikipedia Game player");

        assert_eq!(ChatMessage::user("Hello").role, Role::User);
        assert_eq!(ChatMessage::assistant("7").role, Role::Assistant);
    }

    #[test]
    fn test_completion_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::user("Pick one")])
            .with_model("gemini-2.5-flash")
            .with_temperature(0.0)
            .with_max_tokens(16);

        assert_eq!(request.model, Some("gemini-2.5-flash".into()));
        assert_eq!(request.temperature, Some(0.0));
        assert_eq!(request.max_tokens, Some(16));
    }

    #[test]
    fn test_split_system() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("rules"),
            ChatMessage::user("question"),
        ]);
        let (system, rest) = request.split_system();
        assert_eq!(system.as_deref(), Some("rules"));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].role, Role::User);
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::gemini("key");
        assert_eq!(config.provider_type, ProviderType::Gemini);
        assert_eq!(config.default_model, Some("gemini-2.5-flash".into()));

        let config = ProviderConfig::anthropic("sk-ant-test").with_model("claude-sonnet-4-20250514");
        assert!(config.headers.contains_key("anthropic-version"));
        assert_eq!(config.default_model, Some("claude-sonnet-4-20250514".into()));

        assert_eq!(ProviderType::Gemini.api_key_env(), Some("GEMINI_API_KEY"));
        assert_eq!(ProviderType::Local.api_key_env(), None);
    }

    #[test]
    fn test_any_provider_dispatch() {
        let provider = AnyProvider::from_config(ProviderConfig::gemini("key")).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.default_model(), "gemini-2.5-flash");

        let provider = AnyProvider::from_config(ProviderConfig::local("http://localhost:11434/v1", "llama3.3")).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.default_model(), "llama3.3");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ProviderError::from_status(429, String::new(), Some(3)),
            ProviderError::RateLimited { retry_after: Some(3) }
        ));
        assert!(matches!(
            ProviderError::from_status(401, String::new(), None),
            ProviderError::AuthenticationFailed
        ));
        assert!(matches!(
            ProviderError::from_status(500, "boom".into(), None),
            ProviderError::Api { status: 500, .. }
        ));
    }

    #[test]
    fn test_usage_tracker() {
        let mut tracker = UsageTracker::new();

        tracker.track("gemini-2.5-flash", &Usage {
            prompt_tokens: 100,
            completion_tokens: 2,
            total_tokens: 102,
        });

        tracker.track("gemini-2.5-flash", &Usage {
            prompt_tokens: 200,
            completion_tokens: 3,
            total_tokens: 203,
        });

        assert_eq!(tracker.total_calls, 2);
        assert_eq!(tracker.total_prompt_tokens, 300);
        assert_eq!(tracker.total_completion_tokens, 5);
        assert_eq!(tracker.total_tokens(), 305);
        assert_eq!(tracker.by_model["gemini-2.5-flash"].total_tokens, 305);
    }
}
