use async_trait::async_trait;

use crate::models::*;

#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("not found")]
    NotFound,
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

#[async_trait]
pub trait QuestionCatalog: Send + Sync {
    /// Listing cards, optionally restricted to one category (exact match).
    async fn list_questions(&self, category: Option<Category>) -> CatalogResult<Vec<Question>>;
    async fn get_thread(&self, id: &str) -> CatalogResult<ThreadDetail>;
}

#[async_trait]
pub trait FaqCatalog: Send + Sync {
    async fn get_faq(&self, id: &str) -> CatalogResult<FaqArticle>;
}

#[async_trait]
pub trait AgentQueue: Send + Sync {
    async fn unanswered(&self) -> CatalogResult<Vec<QueueEntry>>;
    async fn dashboard_stats(&self) -> CatalogResult<DashboardStats>;
}

#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn report(&self, range: AnalyticsRange) -> CatalogResult<AnalyticsReport>;
}

pub trait Catalog: QuestionCatalog + FaqCatalog + AgentQueue + AnalyticsSource {}

impl<T> Catalog for T where T: QuestionCatalog + FaqCatalog + AgentQueue + AnalyticsSource {}

/// Compiled-in records every screen renders from.
pub mod fixtures {
    use once_cell::sync::Lazy;

    use crate::models::*;
    use crate::views::{faq_href, thread_href};

    const AVATAR_JANE: &str = "https://images.unsplash.com/photo-1693035730007-fbc2c14c6814?w=100&h=100&fit=crop";
    const AVATAR_AGENT: &str = "https://images.unsplash.com/photo-1655249481446-25d575f1c054?w=100&h=100&fit=crop";

    pub const EXAMPLE_QUESTIONS: [&str; 4] = [
        "How do I pay with MPESA?",
        "Why is my listing not showing?",
        "How do I report a scam?",
        "How long does delivery take?",
    ];

    pub const POSTING_TIPS: [&str; 4] = [
        "Be specific and clear about your issue",
        "Include any error messages you received",
        "Mention what steps you've already tried",
        "Provide relevant IDs or reference numbers",
    ];

    fn question(
        id: &str,
        status: QuestionStatus,
        title: &str,
        preview: &str,
        category: Category,
        author: &str,
        posted: &str,
        views: u32,
    ) -> Question {
        Question {
            id: id.into(),
            status,
            title: title.into(),
            preview: preview.into(),
            category,
            author: author.into(),
            posted: posted.into(),
            views,
        }
    }

    fn thread_link(id: &str, title: &str, views: u32) -> RelatedLink {
        RelatedLink { id: id.into(), title: title.into(), category: Category::Payments, views, href: thread_href(id) }
    }

    fn faq_link(id: &str, title: &str, views: u32) -> RelatedLink {
        RelatedLink { id: id.into(), title: title.into(), category: Category::Payments, views, href: faq_href(id) }
    }

    pub static QUESTIONS: Lazy<Vec<Question>> = Lazy::new(|| {
        vec![
            question(
                "1",
                QuestionStatus::Faq,
                "How do I pay with MPESA?",
                "MPESA payments are quick and secure. Simply select MPESA at checkout, enter your phone number, and approve the payment on your phone.",
                Category::Payments,
                "Somba Support",
                "2 days ago",
                245,
            ),
            question(
                "2",
                QuestionStatus::ForumPost,
                "My MPESA payment is not showing up",
                "I made a payment via MPESA but it's not reflecting in my account. Transaction ID: MPX12345. Please help!",
                Category::Payments,
                "Jane Doe",
                "2 hours ago",
                42,
            ),
            question(
                "3",
                QuestionStatus::Faq,
                "How to report a suspicious listing?",
                "If you encounter a listing that seems fraudulent or violates our policies, you can report it by clicking the flag icon on the listing page.",
                Category::Safety,
                "Somba Support",
                "5 days ago",
                189,
            ),
            question(
                "4",
                QuestionStatus::ForumPost,
                "Why is my listing not appearing in search?",
                "I posted a new listing yesterday but it's not showing up when I search for it. Is there a review process?",
                Category::Listings,
                "John Smith",
                "1 day ago",
                67,
            ),
            question(
                "5",
                QuestionStatus::Faq,
                "How long does delivery usually take?",
                "Delivery times vary by location. Within the same city, expect 1-2 days. For inter-city deliveries, allow 3-5 business days.",
                Category::Delivery,
                "Somba Support",
                "1 week ago",
                312,
            ),
            question(
                "6",
                QuestionStatus::ForumPost,
                "Buyer is asking for refund after receiving item",
                "I sold an item and the buyer received it in perfect condition but now wants a refund. What should I do?",
                Category::Disputes,
                "Sarah Wilson",
                "3 hours ago",
                28,
            ),
        ]
    });

    const OFFICIAL_ANSWER: &str = "Thank you for reaching out! I understand how concerning this can be.

**Here's what's happening:**
MPESA payments typically reflect within 5-10 minutes. However, during peak hours, there may be delays of up to 30 minutes.

**What you can do:**
1. Check your MPESA message to confirm the transaction was successful
2. Verify you sent the payment to the correct till number
3. Wait 30 minutes from the time of payment
4. If after 30 minutes the payment still hasn't reflected, contact us with your transaction ID

I've checked your transaction ID (MPX12345) and can see it was received by our system. The payment should reflect in your account within the next 5 minutes. Please refresh your account balance.

If you don't see it after 5 minutes, please reply here and I'll escalate this to our payments team.";

    pub static THREAD: Lazy<ThreadDetail> = Lazy::new(|| ThreadDetail {
        id: "2".into(),
        category: Category::Payments,
        status: ThreadStatus::Answered,
        title: "My MPESA payment is not showing up".into(),
        author: Author { name: "Jane Doe".into(), avatar: Some(AVATAR_JANE.into()) },
        posted: "2 hours ago".into(),
        views: 42,
        body: "I made a payment via MPESA but it's not reflecting in my account. Transaction ID: MPX12345. Please help!".into(),
        official_answer: OfficialAnswer {
            agent: Author { name: "John Agent".into(), avatar: Some(AVATAR_AGENT.into()) },
            agent_title: "Somba Support Team".into(),
            content: OFFICIAL_ANSWER.into(),
            posted: "1 hour ago".into(),
        },
        related: vec![
            thread_link("1", "How do I pay with MPESA?", 245),
            thread_link("3", "MPESA payment failed but money was deducted", 89),
            thread_link("5", "Can I get a refund to my MPESA?", 156),
        ],
    });

    pub static FAQ: Lazy<FaqArticle> = Lazy::new(|| {
        let step = |title: &str, details: &str| FaqStep { title: title.into(), details: details.into() };
        FaqArticle {
            id: "1".into(),
            category: Category::Payments,
            title: "How do I pay with MPESA?".into(),
            last_updated: "2 days ago".into(),
            views: 245,
            helpful_count: 42,
            quick_answer: "MPESA payments are quick and secure. Simply select MPESA at checkout, enter your phone number, and approve the payment on your phone.".into(),
            steps: vec![
                step("Select MPESA at checkout", "When you're ready to pay, choose MPESA from the available payment methods."),
                step("Enter your phone number", "Provide your MPESA-registered phone number. Make sure it's the number linked to your MPESA account."),
                step("Check your phone", "You'll receive a payment request on your phone via SMS. The request will show the amount and merchant details."),
                step("Enter your PIN", "Open the MPESA message and enter your MPESA PIN to approve the payment."),
                step("Confirmation", "You'll receive a confirmation message from MPESA. Your payment should reflect in your Somba account within 5-10 minutes."),
            ],
            troubleshooting: vec![
                "Make sure your MPESA account has sufficient balance".into(),
                "Verify you're using the correct phone number".into(),
                "Check that you have network connectivity".into(),
                "If payment fails, wait 5 minutes before trying again".into(),
            ],
            related: vec![
                faq_link("2", "How long do MPESA payments take to reflect?", 189),
                faq_link("3", "What to do if MPESA payment fails", 156),
                faq_link("4", "Can I get a refund to my MPESA?", 134),
            ],
        }
    });

    pub static SUGGESTIONS: Lazy<Vec<Suggestion>> = Lazy::new(|| {
        let s = |id: &str, title: &str, snippet: &str, source, confidence| Suggestion {
            id: id.into(),
            title: title.into(),
            snippet: snippet.into(),
            category: Category::Payments,
            source,
            confidence,
        };
        vec![
            s(
                "1",
                "How long do MPESA payments take to reflect?",
                "MPESA payments typically reflect within 5-10 minutes. If your payment is delayed, wait up to 30 minutes during peak hours...",
                SuggestionSource::Faq,
                95,
            ),
            s(
                "2",
                "My MPESA payment is not showing up",
                "Check your MPESA confirmation message first. If the payment was successful but not reflecting, it may take up to 30 minutes...",
                SuggestionSource::ForumPost,
                88,
            ),
            s(
                "3",
                "What to do if MPESA payment fails",
                "If your MPESA payment fails, your money will be automatically refunded to your MPESA account within 24 hours...",
                SuggestionSource::Faq,
                72,
            ),
        ]
    });

    pub static QUEUE: Lazy<Vec<QueueEntry>> = Lazy::new(|| {
        let entry = |id: &str, title: &str, category, name: &str, avatar: &str, posted: &str, age_minutes, views, urgent| QueueEntry {
            id: id.into(),
            title: title.into(),
            category,
            author: Author { name: name.into(), avatar: Some(avatar.into()) },
            posted: posted.into(),
            age_minutes,
            views,
            urgent,
        };
        vec![
            entry("1", "My MPESA payment is not showing up", Category::Payments, "Jane Doe", AVATAR_JANE, "2 hours ago", 120, 42, true),
            entry("2", "Why is my listing not appearing in search?", Category::Listings, "John Smith", AVATAR_AGENT, "5 hours ago", 300, 67, false),
            entry("3", "Buyer is asking for refund after receiving item", Category::Disputes, "Sarah Wilson", AVATAR_JANE, "8 hours ago", 480, 28, true),
        ]
    });

    pub static STATS: Lazy<DashboardStats> = Lazy::new(|| DashboardStats {
        open_threads: 12,
        avg_response_time: "4.2 hours".into(),
        answered_today: 8,
        pending_faqs: 3,
    });

    pub static REPORT: Lazy<AnalyticsReport> = Lazy::new(|| {
        let kpi = |label: &str, value: &str, delta: &str, trend, note: Option<&str>| Kpi {
            label: label.into(),
            value: value.into(),
            delta: delta.into(),
            trend,
            note: note.map(Into::into),
        };
        let point = |date: &str, total, answered| PostsPoint { date: date.into(), total, answered };
        let stage = |name: &str, count, percentage| FunnelStage { stage: name.into(), count, percentage };
        let top = |q: &str, category, times_asked, avg_similarity| TopQuestion {
            question: q.into(),
            category,
            times_asked,
            avg_similarity,
        };
        AnalyticsReport {
            kpis: vec![
                kpi("Total Forum Posts", "342", "+12% from last period", Trend::Up, None),
                kpi("Deflection Rate", "72%", "+5% from last period", Trend::Up, Some("Queries resolved without new post")),
                kpi("Avg Response Time", "4.2 hours", "-1.2 hrs from last period", Trend::Down, None),
                kpi("FAQ Views", "8,945", "+24% from last period", Trend::Up, None),
            ],
            posts_over_time: vec![
                point("Nov 1", 28, 24),
                point("Nov 8", 35, 30),
                point("Nov 15", 42, 38),
                point("Nov 22", 38, 35),
                point("Nov 29", 45, 40),
            ],
            category_distribution: [89, 67, 54, 48, 45, 39]
                .into_iter()
                .zip(Category::ALL)
                .map(|(count, category)| CategoryCount { category, count })
                .collect(),
            deflection_funnel: vec![
                stage("AI Queries", 1523, 100),
                stage("Found Answer", 1102, 72),
                stage("Escalated to Forum", 421, 28),
            ],
            top_questions: vec![
                top("How do I pay with MPESA?", Category::Payments, 156, 94),
                top("Why is my listing not showing?", Category::Listings, 142, 88),
                top("How long does delivery take?", Category::Delivery, 128, 91),
                top("How to report a scam?", Category::Safety, 98, 85),
                top("Can I get a refund?", Category::Disputes, 87, 79),
            ],
        }
    });
}

/// Catalog backed by the compiled-in fixtures. Detail lookups ignore the id and
/// return the one fixed record with the requested id echoed back.
#[derive(Clone, Default)]
pub struct StaticCatalog;

impl StaticCatalog {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl QuestionCatalog for StaticCatalog {
    async fn list_questions(&self, category: Option<Category>) -> CatalogResult<Vec<Question>> {
        Ok(fixtures::QUESTIONS
            .iter()
            .filter(|q| category.map_or(true, |c| q.category == c))
            .cloned()
            .collect())
    }

    async fn get_thread(&self, id: &str) -> CatalogResult<ThreadDetail> {
        let mut thread = fixtures::THREAD.clone();
        thread.id = id.to_string();
        Ok(thread)
    }
}

#[async_trait]
impl FaqCatalog for StaticCatalog {
    async fn get_faq(&self, id: &str) -> CatalogResult<FaqArticle> {
        let mut faq = fixtures::FAQ.clone();
        faq.id = id.to_string();
        Ok(faq)
    }
}

#[async_trait]
impl AgentQueue for StaticCatalog {
    async fn unanswered(&self) -> CatalogResult<Vec<QueueEntry>> {
        Ok(fixtures::QUEUE.clone())
    }

    async fn dashboard_stats(&self) -> CatalogResult<DashboardStats> {
        Ok(fixtures::STATS.clone())
    }
}

#[async_trait]
impl AnalyticsSource for StaticCatalog {
    // every window shows the same compiled-in numbers
    async fn report(&self, _range: AnalyticsRange) -> CatalogResult<AnalyticsReport> {
        Ok(fixtures::REPORT.clone())
    }
}
