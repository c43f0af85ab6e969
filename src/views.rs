//! Screen view models.
//!
//! Each screen of the help centre is one serialisable struct assembled from catalog
//! records and the caller's session state. Builders here are pure; fetching and
//! session bookkeeping happen in [`crate::routes`].

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::catalog::fixtures;
use crate::models::*;
use crate::search::{can_search, SearchOutcome};
use crate::thread_state::ThreadLifecycle;
use crate::validation::{FieldErrors, PostForm};

pub fn thread_href(id: &str) -> String {
    format!("/thread/{id}")
}

pub fn faq_href(id: &str) -> String {
    format!("/faq/{id}")
}

/// "Post to Forum" target, carrying the unanswered query when there is one.
pub fn post_href(query: Option<&str>) -> String {
    match query {
        Some(q) => format!("/post?q={}", urlencoding::encode(q)),
        None => "/post".into(),
    }
}

pub fn ai_help_href(query: &str) -> String {
    format!("/ai-help?q={}", urlencoding::encode(query))
}

/// Header variant of a screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PageChrome {
    pub show_search: bool,
    pub minimal: bool,
    pub back_office: bool,
}

impl PageChrome {
    pub fn with_search() -> Self {
        Self { show_search: true, ..Default::default() }
    }

    pub fn minimal() -> Self {
        Self { minimal: true, ..Default::default() }
    }

    pub fn back_office() -> Self {
        Self { back_office: true, ..Default::default() }
    }
}

/// Parses an optional category filter. Empty and `All` mean no filter.
pub fn parse_category_filter(raw: Option<&str>) -> Result<Option<Category>, UnknownCategory> {
    match raw.map(str::trim) {
        None | Some("") | Some("All") => Ok(None),
        Some(name) => name.parse().map(Some),
    }
}

// ---------------- home ----------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CategoryPill {
    #[serde(flatten)]
    pub badge: CategoryBadge,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QuestionCard {
    #[serde(flatten)]
    pub question: Question,
    pub status_badge: StatusBadge,
    pub category_badge: CategoryBadge,
    pub href: String,
}

impl From<Question> for QuestionCard {
    fn from(q: Question) -> Self {
        let href = match q.status {
            QuestionStatus::Faq => faq_href(&q.id),
            _ => thread_href(&q.id),
        };
        Self { status_badge: q.status.badge(), category_badge: q.category.badge(), href, question: q }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct HomeView {
    pub chrome: PageChrome,
    pub heading: String,
    pub selected_category: Option<Category>,
    pub categories: Vec<CategoryPill>,
    pub questions: Vec<QuestionCard>,
    /// Set when the header search was used; the client continues on the AI-help screen.
    pub redirect: Option<String>,
}

pub fn home_view(selected: Option<Category>, questions: Vec<Question>, query: Option<&str>) -> HomeView {
    let heading = match selected {
        Some(c) => format!("{c} Questions"),
        None => "Recent Questions".into(),
    };
    HomeView {
        chrome: PageChrome::with_search(),
        heading,
        selected_category: selected,
        categories: Category::ALL
            .into_iter()
            .map(|c| CategoryPill { badge: c.badge(), selected: selected == Some(c) })
            .collect(),
        questions: questions.into_iter().map(QuestionCard::from).collect(),
        redirect: query.map(str::trim).filter(|q| !q.is_empty()).map(ai_help_href),
    }
}

// ---------------- thread --------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ThreadView {
    pub chrome: PageChrome,
    pub thread: ThreadDetail,
    pub status_badge: StatusBadge,
    pub category_badge: CategoryBadge,
    pub lifecycle: ThreadLifecycle,
    pub actions_available: bool,
}

/// `lifecycle` overrides the record's status when the session has acted on the thread.
pub fn thread_view(mut thread: ThreadDetail, lifecycle: Option<ThreadLifecycle>) -> ThreadView {
    let lifecycle = lifecycle.unwrap_or_else(|| ThreadLifecycle::new(thread.status));
    thread.status = lifecycle.status;
    ThreadView {
        chrome: PageChrome::default(),
        status_badge: QuestionStatus::from(lifecycle.status).badge(),
        category_badge: thread.category.badge(),
        actions_available: lifecycle.actions_available(),
        lifecycle,
        thread,
    }
}

// ---------------- post question -------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PostFormView {
    pub chrome: PageChrome,
    pub form: PostForm,
    pub can_submit: bool,
    pub categories: Vec<CategoryBadge>,
    pub languages: Vec<Language>,
    pub tips: Vec<String>,
}

pub fn post_form_view(form: PostForm) -> PostFormView {
    PostFormView {
        chrome: PageChrome::minimal(),
        can_submit: form.can_submit(),
        form,
        categories: Category::ALL.iter().map(Category::badge).collect(),
        languages: vec![Language::English, Language::French],
        tips: fixtures::POSTING_TIPS.iter().map(|t| t.to_string()).collect(),
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ValidationReport {
    pub can_submit: bool,
    pub errors: FieldErrors,
}

// ---------------- AI help -------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AiHelpView {
    pub chrome: PageChrome,
    pub query: String,
    pub can_search: bool,
    pub searching: bool,
    pub examples: Vec<String>,
    pub outcome: Option<SearchOutcome>,
}

pub fn ai_help_view(query: &str, searching: bool, outcome: Option<SearchOutcome>) -> AiHelpView {
    AiHelpView {
        chrome: PageChrome::minimal(),
        query: query.to_string(),
        can_search: can_search(query),
        searching,
        examples: fixtures::EXAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect(),
        outcome,
    }
}

// ---------------- FAQ -----------------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FaqView {
    pub chrome: PageChrome,
    pub article: FaqArticle,
    pub category_badge: CategoryBadge,
    pub helpful: Option<bool>,
}

pub fn faq_view(article: FaqArticle, helpful: Option<bool>) -> FaqView {
    FaqView { chrome: PageChrome::default(), category_badge: article.category.badge(), article, helpful }
}

// ---------------- agent dashboard -----------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum DateFilter {
    #[default]
    #[serde(rename = "Last 7 days")]
    Last7Days,
    #[serde(rename = "Last 30 days")]
    Last30Days,
    #[serde(rename = "All time")]
    AllTime,
}

impl DateFilter {
    pub const ALL: [DateFilter; 3] = [DateFilter::Last7Days, DateFilter::Last30Days, DateFilter::AllTime];

    pub fn label(&self) -> &'static str {
        match self {
            DateFilter::Last7Days => "Last 7 days",
            DateFilter::Last30Days => "Last 30 days",
            DateFilter::AllTime => "All time",
        }
    }

    fn max_age_minutes(&self) -> Option<u32> {
        match self {
            DateFilter::Last7Days => Some(7 * 24 * 60),
            DateFilter::Last30Days => Some(30 * 24 * 60),
            DateFilter::AllTime => None,
        }
    }
}

impl FromStr for DateFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DateFilter::ALL
            .into_iter()
            .find(|d| d.label() == s)
            .ok_or_else(|| format!("unknown date filter '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SortOrder {
    #[default]
    #[serde(rename = "Oldest first")]
    OldestFirst,
    #[serde(rename = "Newest first")]
    NewestFirst,
    #[serde(rename = "Most views")]
    MostViews,
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::OldestFirst, SortOrder::NewestFirst, SortOrder::MostViews];

    pub fn label(&self) -> &'static str {
        match self {
            SortOrder::OldestFirst => "Oldest first",
            SortOrder::NewestFirst => "Newest first",
            SortOrder::MostViews => "Most views",
        }
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|o| o.label() == s)
            .ok_or_else(|| format!("unknown sort order '{s}'"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct QueueFilters {
    pub category: Option<Category>,
    pub search: String,
    pub date: DateFilter,
    pub sort: SortOrder,
}

/// Applies the dashboard filters. Sorting is stable so ties keep catalog order.
pub fn filter_queue(entries: Vec<QueueEntry>, f: &QueueFilters) -> Vec<QueueEntry> {
    let needle = f.search.trim().to_lowercase();
    let mut rows: Vec<QueueEntry> = entries
        .into_iter()
        .filter(|e| f.category.map_or(true, |c| e.category == c))
        .filter(|e| needle.is_empty() || e.title.to_lowercase().contains(&needle))
        .filter(|e| f.date.max_age_minutes().map_or(true, |max| e.age_minutes <= max))
        .collect();
    match f.sort {
        SortOrder::OldestFirst => rows.sort_by(|a, b| b.age_minutes.cmp(&a.age_minutes)),
        SortOrder::NewestFirst => rows.sort_by_key(|e| e.age_minutes),
        SortOrder::MostViews => rows.sort_by(|a, b| b.views.cmp(&a.views)),
    }
    rows
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NavItem {
    pub label: String,
    pub href: String,
    pub badge: Option<u32>,
    pub active: bool,
}

fn back_office_nav(active: &str, stats: Option<&DashboardStats>) -> Vec<NavItem> {
    let item = |label: &str, href: &str, badge: Option<u32>| NavItem {
        label: label.into(),
        href: href.into(),
        badge,
        active: label == active,
    };
    vec![
        item("Dashboard", "/agent", None),
        item("Unanswered Threads", "/agent", stats.map(|s| s.open_threads)),
        item("FAQ Candidates", "/agent", stats.map(|s| s.pending_faqs)),
        item("Analytics", "/admin/analytics", None),
    ]
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct QueueRow {
    #[serde(flatten)]
    pub entry: QueueEntry,
    pub category_badge: CategoryBadge,
    pub href: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AgentView {
    pub chrome: PageChrome,
    pub nav: Vec<NavItem>,
    pub stats: DashboardStats,
    pub filters: QueueFilters,
    pub queue: Vec<QueueRow>,
    pub selected_count: usize,
}

pub fn agent_view(
    stats: DashboardStats,
    entries: Vec<QueueEntry>,
    filters: QueueFilters,
    is_selected: impl Fn(&str) -> bool,
) -> AgentView {
    let queue: Vec<QueueRow> = filter_queue(entries, &filters)
        .into_iter()
        .map(|entry| QueueRow {
            category_badge: entry.category.badge(),
            href: thread_href(&entry.id),
            selected: is_selected(&entry.id),
            entry,
        })
        .collect();
    AgentView {
        chrome: PageChrome::back_office(),
        nav: back_office_nav("Dashboard", Some(&stats)),
        selected_count: queue.iter().filter(|r| r.selected).count(),
        stats,
        filters,
        queue,
    }
}

// ---------------- analytics -----------------------------------------------

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnalyticsView {
    pub chrome: PageChrome,
    pub nav: Vec<NavItem>,
    pub range: AnalyticsRange,
    pub ranges: Vec<AnalyticsRange>,
    pub report: AnalyticsReport,
}

pub fn analytics_view(range: AnalyticsRange, report: AnalyticsReport) -> AnalyticsView {
    AnalyticsView {
        chrome: PageChrome::back_office(),
        nav: back_office_nav("Analytics", None),
        range,
        ranges: AnalyticsRange::ALL.to_vec(),
        report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrefs() {
        assert_eq!(thread_href("7"), "/thread/7");
        assert_eq!(faq_href("1"), "/faq/1");
        assert_eq!(post_href(None), "/post");
        assert_eq!(post_href(Some("a&b")), "/post?q=a%26b");
        assert_eq!(ai_help_href("mpesa fail"), "/ai-help?q=mpesa%20fail");
    }

    #[test]
    fn category_filter_parsing() {
        assert_eq!(parse_category_filter(None), Ok(None));
        assert_eq!(parse_category_filter(Some("All")), Ok(None));
        assert_eq!(parse_category_filter(Some("Safety")), Ok(Some(Category::Safety)));
        assert!(parse_category_filter(Some("safety")).is_err());
    }

    #[test]
    fn home_heading_and_redirect() {
        let v = home_view(None, fixtures::QUESTIONS.clone(), Some("  "));
        assert_eq!(v.heading, "Recent Questions");
        assert!(v.redirect.is_none());
        assert_eq!(v.questions.len(), 6);
        assert_eq!(v.questions[0].href, "/faq/1");
        assert_eq!(v.questions[1].href, "/thread/2");

        let v = home_view(Some(Category::Payments), vec![], Some("mpesa"));
        assert_eq!(v.heading, "Payments Questions");
        assert_eq!(v.redirect.as_deref(), Some("/ai-help?q=mpesa"));
        assert_eq!(v.categories.iter().filter(|p| p.selected).count(), 1);
    }

    #[test]
    fn queue_sorting() {
        let rows = |sort| {
            let f = QueueFilters { sort, ..Default::default() };
            filter_queue(fixtures::QUEUE.clone(), &f).into_iter().map(|e| e.id).collect::<Vec<_>>()
        };
        assert_eq!(rows(SortOrder::OldestFirst), ["3", "2", "1"]);
        assert_eq!(rows(SortOrder::NewestFirst), ["1", "2", "3"]);
        assert_eq!(rows(SortOrder::MostViews), ["2", "1", "3"]);
    }

    #[test]
    fn queue_filters_combine() {
        let f = QueueFilters { search: "MPESA".into(), ..Default::default() };
        let rows = filter_queue(fixtures::QUEUE.clone(), &f);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, "1");

        let f = QueueFilters { category: Some(Category::Disputes), search: "mpesa".into(), ..Default::default() };
        assert!(filter_queue(fixtures::QUEUE.clone(), &f).is_empty());

        let mut old = fixtures::QUEUE[0].clone();
        old.age_minutes = 8 * 24 * 60;
        let f = QueueFilters::default();
        assert!(filter_queue(vec![old.clone()], &f).is_empty());
        let f = QueueFilters { date: DateFilter::Last30Days, ..Default::default() };
        assert_eq!(filter_queue(vec![old], &f).len(), 1);
    }

    #[test]
    fn thread_view_prefers_session_status() {
        let mut lc = ThreadLifecycle::new(ThreadStatus::Answered);
        lc.close(true).unwrap();
        let v = thread_view(fixtures::THREAD.clone(), Some(lc));
        assert_eq!(v.thread.status, ThreadStatus::Closed);
        assert_eq!(v.status_badge.label, "Closed");
        assert!(!v.actions_available);
    }

    #[test]
    fn filter_labels_parse() {
        assert_eq!("All time".parse::<DateFilter>(), Ok(DateFilter::AllTime));
        assert_eq!("Most views".parse::<SortOrder>(), Ok(SortOrder::MostViews));
        assert!("newest".parse::<SortOrder>().is_err());
    }
}
