use crate::error::{ApiErrorBody, ErrorBanner};
use crate::models::*;
use crate::search::{SearchOutcome, StarRating, SuggestionCard};
use crate::session::SessionSnapshot;
use crate::thread_state::ThreadLifecycle;
use crate::validation::{DraftUpdate, Field, PostForm, QuestionDraft, ValidatedQuestion};
use crate::views::*;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::create_session,
        crate::routes::current_session,
        crate::routes::end_session,
        crate::routes::home_page,
        crate::routes::thread_page,
        crate::routes::post_page,
        crate::routes::ai_help_page,
        crate::routes::faq_page,
        crate::routes::agent_page,
        crate::routes::analytics_page,
        crate::routes::search,
        crate::routes::reset_search,
        crate::routes::edit_question_draft,
        crate::routes::validate_question,
        crate::routes::submit_question,
        crate::routes::set_reply_draft,
        crate::routes::hide_reply_box,
        crate::routes::post_reply,
        crate::routes::mark_answered,
        crate::routes::close_thread,
        crate::routes::lock_thread,
        crate::routes::save_as_faq,
        crate::routes::thread_feedback,
        crate::routes::set_thread_language,
        crate::routes::faq_feedback,
        crate::routes::toggle_selection,
    ),
    components(schemas(
        Category, CategoryBadge, QuestionStatus, StatusBadge, ThreadStatus, SuggestionSource, Language,
        Author, Question, RelatedLink, OfficialAnswer, ThreadDetail, FaqStep, FaqArticle, Suggestion,
        QueueEntry, DashboardStats, Trend, Kpi, PostsPoint, CategoryCount, FunnelStage, TopQuestion,
        AnalyticsReport, AnalyticsRange,
        PageChrome, CategoryPill, QuestionCard, HomeView, ThreadView, PostFormView, ValidationReport,
        AiHelpView, FaqView, DateFilter, SortOrder, QueueFilters, NavItem, QueueRow, AgentView, AnalyticsView,
        SearchOutcome, SuggestionCard, StarRating, SessionSnapshot, ThreadLifecycle,
        Field, PostForm, QuestionDraft, DraftUpdate, ValidatedQuestion, ApiErrorBody, ErrorBanner,
        crate::routes::SearchRequest, crate::routes::SubmitResponse, crate::routes::ReplyDraftRequest,
        crate::routes::ReplyRequest, crate::routes::ConfirmRequest, crate::routes::FeedbackRequest,
        crate::routes::LanguageRequest, crate::routes::SelectionResponse
    )),
    tags(
        (name = "sessions", description = "Visitor sessions"),
        (name = "pages", description = "Screen view models"),
        (name = "search", description = "Simulated help search"),
        (name = "questions", description = "Ask-a-question form"),
        (name = "threads", description = "Agent thread actions"),
        (name = "faqs", description = "FAQ feedback"),
        (name = "agent", description = "Agent dashboard"),
    )
)]
pub struct ApiDoc;
