//! Simulated help search.
//!
//! The shipped [`KeywordHelpSearch`] answers with a fixed set of suggestions when the
//! query mentions a payment topic and with nothing otherwise. The delay that models
//! the asynchronous call is owned by the caller (see [`crate::timer`]) so a newer
//! search or a screen change can cancel it.

use async_trait::async_trait;
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::fixtures;
use crate::models::{CategoryBadge, QuestionStatus, StatusBadge, Suggestion};
use crate::timer::{Cancelled, ScopedDelay};
use crate::views::{faq_href, post_href};

pub const MIN_QUERY_CHARS: usize = 3;
pub const MATCH_TOKENS: [&str; 2] = ["mpesa", "payment"];
pub const LOW_CONFIDENCE_BELOW: u8 = 60;
pub const MAX_STARS: u8 = 5;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("query must be at least 3 characters")]
    QueryTooShort,
    #[error("superseded by a newer search")]
    Superseded,
}

impl From<Cancelled> for SearchError {
    fn from(_: Cancelled) -> Self {
        SearchError::Superseded
    }
}

/// A query that passed the length gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let trimmed = raw.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            return Err(SearchError::QueryTooShort);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Whether the "Get Help" action is enabled for the current input.
pub fn can_search(raw: &str) -> bool {
    SearchQuery::parse(raw).is_ok()
}

#[async_trait]
pub trait HelpSearch: Send + Sync {
    async fn suggest(&self, query: &SearchQuery) -> Vec<Suggestion>;
}

#[derive(Clone)]
pub struct KeywordHelpSearch {
    suggestions: Vec<Suggestion>,
}

impl KeywordHelpSearch {
    pub fn new() -> Self {
        Self { suggestions: fixtures::SUGGESTIONS.clone() }
    }

    pub fn matches(query: &SearchQuery) -> bool {
        let q = query.as_str().to_lowercase();
        MATCH_TOKENS.iter().any(|t| q.contains(t))
    }
}

impl Default for KeywordHelpSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HelpSearch for KeywordHelpSearch {
    async fn suggest(&self, query: &SearchQuery) -> Vec<Suggestion> {
        if Self::matches(query) {
            self.suggestions.clone()
        } else {
            Vec::new()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct StarRating {
    pub filled: u8,
    pub total: u8,
}

impl StarRating {
    /// `round(confidence / 100 * 5)`, half rounding up.
    pub fn from_confidence(confidence: u8) -> Self {
        let c = u32::from(confidence.min(100));
        let filled = (c * u32::from(MAX_STARS) + 50) / 100;
        Self { filled: filled as u8, total: MAX_STARS }
    }
}

pub fn is_low_confidence(confidence: u8) -> bool {
    confidence < LOW_CONFIDENCE_BELOW
}

/// Suggestion card as the AI-help screen renders it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SuggestionCard {
    #[serde(flatten)]
    pub suggestion: Suggestion,
    pub stars: StarRating,
    pub low_confidence: bool,
    pub source_badge: StatusBadge,
    pub category_badge: CategoryBadge,
    pub href: String,
}

impl From<Suggestion> for SuggestionCard {
    fn from(s: Suggestion) -> Self {
        Self {
            stars: StarRating::from_confidence(s.confidence),
            low_confidence: is_low_confidence(s.confidence),
            source_badge: QuestionStatus::from(s.source).badge(),
            category_badge: s.category.badge(),
            href: faq_href(&s.id),
            suggestion: s,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SearchOutcome {
    pub query: String,
    pub results: Vec<SuggestionCard>,
    /// Where "Post to Forum" leads: prefilled when nothing matched.
    pub post_href: String,
}

impl SearchOutcome {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Waits out the simulated latency, then asks the matcher.
pub async fn run_search(
    search: &dyn HelpSearch,
    query: SearchQuery,
    delay: ScopedDelay,
) -> Result<SearchOutcome, SearchError> {
    delay.wait().await?;
    let hits = search.suggest(&query).await;
    let fallback = if hits.is_empty() { post_href(Some(query.as_str())) } else { post_href(None) };
    Ok(SearchOutcome {
        query: query.0,
        results: hits.into_iter().map(SuggestionCard::from).collect(),
        post_href: fallback,
    })
}
