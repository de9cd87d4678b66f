//! Page and link types shared by the extractor, filter and policy.

use serde::Serialize;
use url::Url;

/// Title used when a page has no primary heading.
pub const UNKNOWN_TITLE: &str = "Unknown title";

/// A navigable link found in an article body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    /// Visible anchor text, trimmed
    pub text: String,
    /// Absolute article URL, fragment removed
    pub url: String,
}

impl Candidate {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}

/// What the extractor got out of one fetched page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub candidates: Vec<Candidate>,
}

/// Canonical form of a page URL: parsed, with the `#fragment` dropped.
///
/// Unparseable input is returned trimmed but otherwise untouched.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_drops_fragment() {
        assert_eq!(
            normalize_url("https://pl.wikipedia.org/wiki/Wis%C5%82a#Dorzecze"),
            "https://pl.wikipedia.org/wiki/Wis%C5%82a"
        );
    }

    #[test]
    fn test_normalize_keeps_garbage() {
        assert_eq!(normalize_url("  not a url "), "not a url");
    }
}
