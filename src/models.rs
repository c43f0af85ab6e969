use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Mock records are addressed by their display ids ("1", "2", ...)
pub type Id = String;

/// Fixed set of help topics. Nothing creates or removes categories at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Payments,
    Listings,
    Safety,
    Disputes,
    Account,
    Delivery,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Payments,
        Category::Listings,
        Category::Safety,
        Category::Disputes,
        Category::Account,
        Category::Delivery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Payments => "Payments",
            Category::Listings => "Listings",
            Category::Safety => "Safety",
            Category::Disputes => "Disputes",
            Category::Account => "Account",
            Category::Delivery => "Delivery",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Category::Payments => "💳",
            Category::Listings => "📝",
            Category::Safety => "🛡️",
            Category::Disputes => "⚠️",
            Category::Account => "👤",
            Category::Delivery => "🚚",
        }
    }

    /// Badge colour family used by every screen that shows the category.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Payments => "blue",
            Category::Listings => "purple",
            Category::Safety => "green",
            Category::Disputes => "red",
            Category::Account => "yellow",
            Category::Delivery => "indigo",
        }
    }

    pub fn badge(&self) -> CategoryBadge {
        CategoryBadge { name: *self, emoji: self.emoji().into(), color: self.color().into() }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown category '{0}'")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    // exact, case-sensitive match on the display name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryBadge {
    pub name: Category,
    pub emoji: String,
    pub color: String,
}

/// Status shown on question cards and thread headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum QuestionStatus {
    Answered,
    Open,
    Closed,
    #[serde(rename = "FAQ")]
    Faq,
    #[serde(rename = "Forum Post")]
    ForumPost,
}

impl QuestionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionStatus::Answered => "Answered",
            QuestionStatus::Open => "Open",
            QuestionStatus::Closed => "Closed",
            QuestionStatus::Faq => "FAQ",
            QuestionStatus::ForumPost => "Forum Post",
        }
    }

    pub fn tone(&self) -> &'static str {
        match self {
            QuestionStatus::Answered | QuestionStatus::Faq => "green",
            QuestionStatus::Open => "yellow",
            QuestionStatus::Closed => "gray",
            QuestionStatus::ForumPost => "blue",
        }
    }

    pub fn badge(&self) -> StatusBadge {
        StatusBadge { label: self.label().into(), tone: self.tone().into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StatusBadge {
    pub label: String,
    pub tone: String,
}

/// Lifecycle status of a single thread in the agent view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum ThreadStatus {
    #[default]
    Open,
    Answered,
    Closed,
}

impl From<ThreadStatus> for QuestionStatus {
    fn from(s: ThreadStatus) -> Self {
        match s {
            ThreadStatus::Open => QuestionStatus::Open,
            ThreadStatus::Answered => QuestionStatus::Answered,
            ThreadStatus::Closed => QuestionStatus::Closed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SuggestionSource {
    #[serde(rename = "FAQ")]
    Faq,
    #[serde(rename = "Forum Post")]
    ForumPost,
}

impl From<SuggestionSource> for QuestionStatus {
    fn from(s: SuggestionSource) -> Self {
        match s {
            SuggestionSource::Faq => QuestionStatus::Faq,
            SuggestionSource::ForumPost => QuestionStatus::ForumPost,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Author {
    pub name: String,
    pub avatar: Option<String>,
}

/// Card on the public listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Question {
    pub id: Id,
    pub status: QuestionStatus,
    pub title: String,
    pub preview: String,
    pub category: Category,
    pub author: String,
    pub posted: String, // display string ("2 hours ago"), not a clock value
    pub views: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RelatedLink {
    pub id: Id,
    pub title: String,
    pub category: Category,
    pub views: u32,
    pub href: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OfficialAnswer {
    pub agent: Author,
    pub agent_title: String,
    pub content: String,
    pub posted: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ThreadDetail {
    pub id: Id,
    pub category: Category,
    pub status: ThreadStatus,
    pub title: String,
    pub author: Author,
    pub posted: String,
    pub views: u32,
    pub body: String,
    pub official_answer: OfficialAnswer,
    pub related: Vec<RelatedLink>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FaqStep {
    pub title: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FaqArticle {
    pub id: Id,
    pub category: Category,
    pub title: String,
    pub last_updated: String,
    pub views: u32,
    pub helpful_count: u32,
    pub quick_answer: String,
    pub steps: Vec<FaqStep>,
    pub troubleshooting: Vec<String>,
    pub related: Vec<RelatedLink>,
}

/// Help-search hit. `confidence` is 0..=100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Suggestion {
    pub id: Id,
    pub title: String,
    pub snippet: String,
    pub category: Category,
    pub source: SuggestionSource,
    pub confidence: u8,
}

/// Row of the agent's unanswered-threads table.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueueEntry {
    pub id: Id,
    pub title: String,
    pub category: Category,
    pub author: Author,
    pub posted: String,
    pub age_minutes: u32,
    pub views: u32,
    pub urgent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub open_threads: u32,
    pub avg_response_time: String,
    pub answered_today: u32,
    pub pending_faqs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Kpi {
    pub label: String,
    pub value: String,
    pub delta: String,
    pub trend: Trend,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PostsPoint {
    pub date: String,
    pub total: u32,
    pub answered: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryCount {
    pub category: Category,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FunnelStage {
    pub stage: String,
    pub count: u32,
    pub percentage: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopQuestion {
    pub question: String,
    pub category: Category,
    pub times_asked: u32,
    pub avg_similarity: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnalyticsReport {
    pub kpis: Vec<Kpi>,
    pub posts_over_time: Vec<PostsPoint>,
    pub category_distribution: Vec<CategoryCount>,
    pub deflection_funnel: Vec<FunnelStage>,
    pub top_questions: Vec<TopQuestion>,
}

/// Reporting window of the analytics dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AnalyticsRange {
    #[serde(rename = "Last 7 days")]
    Last7Days,
    #[default]
    #[serde(rename = "Last 30 days")]
    Last30Days,
    #[serde(rename = "Last 90 days")]
    Last90Days,
    #[serde(rename = "Custom range")]
    Custom,
}

impl AnalyticsRange {
    pub const ALL: [AnalyticsRange; 4] = [
        AnalyticsRange::Last7Days,
        AnalyticsRange::Last30Days,
        AnalyticsRange::Last90Days,
        AnalyticsRange::Custom,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AnalyticsRange::Last7Days => "Last 7 days",
            AnalyticsRange::Last30Days => "Last 30 days",
            AnalyticsRange::Last90Days => "Last 90 days",
            AnalyticsRange::Custom => "Custom range",
        }
    }
}

impl FromStr for AnalyticsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AnalyticsRange::ALL
            .into_iter()
            .find(|r| r.label() == s)
            .ok_or_else(|| format!("unknown range '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_parse_is_exact() {
        assert_eq!("Payments".parse::<Category>().unwrap(), Category::Payments);
        assert!("payments".parse::<Category>().is_err());
        assert!("Billing".parse::<Category>().is_err());
    }

    #[test]
    fn status_labels_serialize_like_display() {
        let v = serde_json::to_value(QuestionStatus::ForumPost).unwrap();
        assert_eq!(v, "Forum Post");
        assert_eq!(serde_json::to_value(SuggestionSource::Faq).unwrap(), "FAQ");
    }
}
