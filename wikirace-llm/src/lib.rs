//! # wikirace-llm
//!
//! Trait-based access to chat-completion LLM backends. The game uses a
//! provider as its ranking oracle: one prompt in, free-form text out.
//!
//! Implementations: Google Gemini (default), OpenAI-compatible servers
//! (OpenAI, Ollama, vLLM) and Anthropic.

pub mod provider;

pub use provider::{
    AnyProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason, LlmProvider,
    ProviderConfig, ProviderError, ProviderType, Role, Usage, UsageTracker,
    AnthropicProvider, GeminiProvider, OpenAIProvider,
};
