//! Run configuration.
//!
//! Everything a run needs is collected here once at startup and handed to
//! the constructors; nothing reads the environment after that.

use std::time::Duration;
use wikirace_error::{Error, Result};
use wikirace_llm::{ProviderConfig, ProviderType};

/// Navigation limits and pacing
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Maximum number of pages fetched in one run
    pub max_steps: usize,
    /// How many candidates the oracle gets to see
    pub candidate_limit: usize,
    /// Delay before every fetch
    pub pace: Duration,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_steps: 30,
            candidate_limit: 50,
            pace: Duration::from_millis(500),
        }
    }
}

/// How pages are requested from the encyclopedia host
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Site root, e.g. `https://pl.wikipedia.org`
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FetchConfig {
    /// Wikipedia in the given language edition
    pub fn for_language(lang: &str) -> Self {
        Self {
            base_url: format!("https://{}.wikipedia.org", lang.trim()),
            ..Self::default()
        }
    }

    pub fn random_page_url(&self) -> String {
        format!("{}/wiki/Special:Random", self.base_url.trim_end_matches('/'))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pl.wikipedia.org".to_string(),
            timeout: Duration::from_secs(10),
            user_agent: concat!(
                "Mozilla/5.0 (compatible; wikirace/",
                env!("CARGO_PKG_VERSION"),
                ")"
            )
            .to_string(),
        }
    }
}

/// Ranking oracle call settings
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub timeout: Duration,
    pub temperature: Option<f32>,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            temperature: None,
        }
    }
}

/// Build the provider config for `provider`, pulling the credential through
/// `lookup` (normally `std::env::var`).
///
/// A missing or blank credential is a configuration error; the caller must
/// stop before any navigation starts.
pub fn provider_config<F>(
    provider: ProviderType,
    model: Option<&str>,
    lookup: F,
) -> Result<ProviderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = match provider.api_key_env() {
        Some(var) => {
            let key = lookup(var)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .ok_or_else(|| Error::missing_env(var).with_operation("config::provider"))?;
            Some(key)
        }
        None => None,
    };

    let mut config = match provider {
        ProviderType::Gemini => ProviderConfig::gemini(api_key.unwrap_or_default()),
        ProviderType::OpenAI => {
            let config = ProviderConfig::openai(api_key.unwrap_or_default());
            match lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
                Some(base) => config.with_base_url(base.trim()),
                None => config,
            }
        }
        ProviderType::Anthropic => ProviderConfig::anthropic(api_key.unwrap_or_default()),
        ProviderType::Local => {
            let base = lookup("OLLAMA_BASE_URL")
                .filter(|u| !u.trim().is_empty())
                .unwrap_or_else(|| "http://localhost:11434/v1".to_string());
            let model = model.ok_or_else(|| {
                Error::config_invalid("a local provider needs an explicit model")
                    .with_operation("config::provider")
            })?;
            ProviderConfig::local(base, model)
        }
    };

    if let Some(model) = model {
        config = config.with_model(model);
    }
    Ok(config)
}
