//! Keyword and domain extraction.
//!
//! Pure functions with no I/O. The only input besides the text itself is the
//! immutable [`Vocabulary`] built once from configuration.

use std::collections::BTreeSet;
use url::Url;

/// Placeholder returned when a link is absent or does not parse.
///
/// Never persisted as a domain counter.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Keywords checked against item titles when `KEYWORDS` is not configured.
pub const DEFAULT_KEYWORDS: &[&str] = &[
    "ChatGPT",
    "Claude",
    "Gemini",
    "OpenAI",
    "Anthropic",
    "Google AI",
    "GPT-4",
    "GPT-3",
    "LLM",
    "Large Language Model",
    "AI",
    "Artificial Intelligence",
    "Machine Learning",
    "ML",
    "Deep Learning",
    "Neural Network",
    "Transformer",
    "Bard",
    "Copilot",
    "GitHub Copilot",
    "DALL-E",
    "Midjourney",
    "Stable Diffusion",
];

/// Fixed, lower-cased set of terms searched for in titles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    terms: BTreeSet<String>,
}

impl Vocabulary {
    /// Builds a vocabulary, lower-casing and trimming every entry.
    ///
    /// Blank entries are discarded.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        Self { terms }
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::new(DEFAULT_KEYWORDS)
    }
}

/// Returns every vocabulary entry that occurs in `title`.
///
/// Matching is a case-insensitive substring test with no word-boundary
/// check, so `"ai"` also matches inside `"maintain"`. That false-positive
/// source is accepted.
///
/// # Examples
///
/// ```
/// use news_analytics::domain::extraction::{Vocabulary, extract_keywords};
///
/// let vocabulary = Vocabulary::new(["AI", "ChatGPT", "Claude"]);
/// let found = extract_keywords(
///     "ChatGPT and Claude are revolutionizing AI development",
///     &vocabulary,
/// );
/// assert_eq!(found.len(), 3);
/// assert!(found.contains("claude"));
/// ```
pub fn extract_keywords(title: &str, vocabulary: &Vocabulary) -> BTreeSet<String> {
    let title = title.to_lowercase();

    vocabulary
        .iter()
        .filter(|term| title.contains(term))
        .map(str::to_string)
        .collect()
}

/// Returns the normalized host of `url`.
///
/// The host is lower-cased and a single leading `www.` is stripped; other
/// subdomains are kept. Absent, unparsable or host-less input yields
/// [`UNKNOWN_DOMAIN`]. Never fails.
pub fn extract_domain(url: Option<&str>) -> String {
    let Some(raw) = url.map(str::trim).filter(|u| !u.is_empty()) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let Ok(parsed) = Url::parse(raw) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let Some(host) = parsed.host_str().filter(|h| !h.is_empty()) else {
        return UNKNOWN_DOMAIN.to_string();
    };

    let host = host.to_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);

    if host.is_empty() {
        return UNKNOWN_DOMAIN.to_string();
    }

    host.to_string()
}

/// Returns true for a domain that may be counted.
pub fn is_known_domain(domain: &str) -> bool {
    !domain.is_empty() && domain != UNKNOWN_DOMAIN
}
