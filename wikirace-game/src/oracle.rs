//! The ranking oracle: an LLM asked to pick the most promising link.
//!
//! Unlike fetch failures, oracle failures are fatal to the run. Nothing
//! here retries.

use crate::config::OracleConfig;
use tracing::debug;
use wikirace_error::{Error, ErrorKind, Result};
use wikirace_llm::{ChatMessage, CompletionRequest, LlmProvider, ProviderError, UsageTracker};

/// Free-form text ranking of a numbered candidate list
#[allow(async_fn_in_trait)]
pub trait RankingOracle {
    /// Answer `prompt`; the reply is expected to contain a number somewhere
    async fn rank(&mut self, prompt: &str) -> Result<String>;

    /// Token accounting, for oracles that have it
    fn usage(&self) -> Option<&UsageTracker> {
        None
    }
}

/// `RankingOracle` backed by an LLM provider
pub struct LlmOracle<P> {
    provider: P,
    config: OracleConfig,
    usage: UsageTracker,
}

impl<P: LlmProvider> LlmOracle<P> {
    pub fn new(provider: P, config: OracleConfig) -> Self {
        Self {
            provider,
            config,
            usage: UsageTracker::new(),
        }
    }
}

impl<P: LlmProvider> RankingOracle for LlmOracle<P> {
    async fn rank(&mut self, prompt: &str) -> Result<String> {
        let mut request = CompletionRequest::new(vec![ChatMessage::user(prompt)]);
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        debug!(provider = self.provider.name(), chars = prompt.len(), "asking oracle");
        let response = match tokio::time::timeout(self.config.timeout, self.provider.complete(request)).await {
            Err(_) => {
                return Err(Error::timeout("oracle::rank", self.config.timeout)
                    .with_context("provider", self.provider.name()));
            }
            Ok(result) => result.map_err(|e| {
                provider_error(e)
                    .with_operation("oracle::rank")
                    .with_context("provider", self.provider.name())
                    .with_context("model", self.provider.default_model())
            })?,
        };

        self.usage.track(&response.model, &response.usage);
        response.content.ok_or_else(|| {
            Error::inference_failed("oracle returned no text")
                .with_operation("oracle::rank")
                .with_context("model", response.model)
        })
    }

    fn usage(&self) -> Option<&UsageTracker> {
        Some(&self.usage)
    }
}

fn provider_error(err: ProviderError) -> Error {
    let kind = match &err {
        ProviderError::Timeout => ErrorKind::Timeout,
        ProviderError::RateLimited { .. } => ErrorKind::RateLimited,
        ProviderError::AuthenticationFailed => ErrorKind::PermissionDenied,
        ProviderError::Network(_) => ErrorKind::NetworkFailed,
        ProviderError::Parse(_) => ErrorKind::ParseFailed,
        ProviderError::Api { .. } | ProviderError::Other(_) => ErrorKind::InferenceFailed,
    };
    Error::new(kind, err.to_string()).set_source(err)
}
