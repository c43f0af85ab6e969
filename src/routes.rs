use std::sync::Arc;

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, info};
use utoipa::ToSchema;

use crate::catalog::{Catalog, StaticCatalog};
use crate::config::{Latency, SessionLimits};
use crate::error::ApiError;
use crate::models::*;
use crate::rate_limit::RateLimiterFacade;
use crate::search::{run_search, HelpSearch, KeywordHelpSearch, SearchError, SearchOutcome, SearchQuery};
use crate::session::{CurrentSession, Location, Session, SessionStore};
use crate::timer::ScopedDelay;
use crate::validation::{validate, DraftUpdate, QuestionDraft, ValidatedQuestion};
use crate::views::*;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(web::resource("/sessions").route(web::post().to(create_session)))
            .service(
                web::resource("/sessions/current")
                    .route(web::get().to(current_session))
                    .route(web::delete().to(end_session)),
            )
            // screens
            .service(web::resource("/pages/home").route(web::get().to(home_page)))
            .service(web::resource("/pages/thread/{id}").route(web::get().to(thread_page)))
            .service(web::resource("/pages/post").route(web::get().to(post_page)))
            .service(web::resource("/pages/ai-help").route(web::get().to(ai_help_page)))
            .service(web::resource("/pages/faq/{id}").route(web::get().to(faq_page)))
            .service(web::resource("/pages/agent").route(web::get().to(agent_page)))
            .service(web::resource("/pages/admin/analytics").route(web::get().to(analytics_page)))
            // help search
            .service(
                web::resource("/search")
                    .route(web::post().to(search))
                    .route(web::delete().to(reset_search)),
            )
            // question form
            .service(web::resource("/questions/draft").route(web::patch().to(edit_question_draft)))
            .service(web::resource("/questions/validate").route(web::post().to(validate_question)))
            .service(web::resource("/questions").route(web::post().to(submit_question)))
            // thread actions
            .service(
                web::resource("/threads/{id}/draft")
                    .route(web::put().to(set_reply_draft))
                    .route(web::delete().to(hide_reply_box)),
            )
            .service(web::resource("/threads/{id}/replies").route(web::post().to(post_reply)))
            .service(web::resource("/threads/{id}/answered").route(web::post().to(mark_answered)))
            .service(web::resource("/threads/{id}/close").route(web::post().to(close_thread)))
            .service(web::resource("/threads/{id}/lock").route(web::post().to(lock_thread)))
            .service(web::resource("/threads/{id}/save-as-faq").route(web::post().to(save_as_faq)))
            .service(web::resource("/threads/{id}/feedback").route(web::post().to(thread_feedback)))
            .service(web::resource("/threads/{id}/language").route(web::post().to(set_thread_language)))
            .service(web::resource("/faqs/{id}/feedback").route(web::post().to(faq_feedback)))
            .service(web::resource("/agent/selection/{id}").route(web::post().to(toggle_selection))),
    );
}

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn Catalog>,
    pub search: Arc<dyn HelpSearch>,
    pub sessions: SessionStore,
    pub latency: Latency,
    pub rate_limiter: Option<RateLimiterFacade>,
}

impl AppState {
    pub fn new(catalog: Arc<dyn Catalog>, search: Arc<dyn HelpSearch>) -> Self {
        Self { catalog, search, sessions: SessionStore::new(), latency: Latency::default(), rate_limiter: None }
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_session_limits(mut self, limits: SessionLimits) -> Self {
        self.sessions = SessionStore::with_limits(limits);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiterFacade) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Arc::new(StaticCatalog::new()), Arc::new(KeywordHelpSearch::new()))
    }
}

fn client_key(req: &HttpRequest) -> String {
    req.connection_info().realip_remote_addr().unwrap_or("unknown").to_string()
}

fn throttle(
    data: &AppState,
    req: &HttpRequest,
    allow: impl Fn(&RateLimiterFacade, &str) -> bool,
) -> Result<(), ApiError> {
    match &data.rate_limiter {
        Some(rl) if !allow(rl, &client_key(req)) => {
            metrics::counter!("rate_limited_total", 1, "path" => req.path().to_string());
            Err(ApiError::TooManyRequests)
        }
        _ => Ok(()),
    }
}

/// Parses an optional JSON body: an empty body is `None`, anything else must be valid JSON.
fn optional_json<T: DeserializeOwned>(body: &web::Bytes) -> Result<Option<T>, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(body)
        .map(Some)
        .map_err(|e| ApiError::BadRequest(format!("invalid JSON body: {e}")))
}

// ---------------- sessions ------------------------------------------------

#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    tag = "sessions",
    responses(
        (status = 201, description = "Session created", body = SessionSnapshot),
        (status = 429, description = "Rate limited"),
        (status = 503, description = "Too many live sessions", body = crate::error::ErrorBanner)
    )
)]
pub async fn create_session(req: HttpRequest, data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    throttle(&data, &req, RateLimiterFacade::allow_session)?;
    let session = data.sessions.create()?;
    info!(session = %session.id, live = data.sessions.len(), "session created");
    Ok(HttpResponse::Created().json(session.snapshot()))
}

#[utoipa::path(
    get,
    path = "/api/v1/sessions/current",
    tag = "sessions",
    params(("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Current location", body = SessionSnapshot),
        (status = 400, description = "Missing or malformed session id"),
        (status = 404, description = "Unknown session")
    )
)]
pub async fn current_session(session: CurrentSession) -> HttpResponse {
    HttpResponse::Ok().json(session.0.snapshot())
}

#[utoipa::path(
    delete,
    path = "/api/v1/sessions/current",
    tag = "sessions",
    params(("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 204, description = "Session ended; pending delays cancelled"))
)]
pub async fn end_session(session: CurrentSession, data: web::Data<AppState>) -> HttpResponse {
    data.sessions.end(&session.0.id);
    info!(session = %session.0.id, "session ended");
    HttpResponse::NoContent().finish()
}

// ---------------- screens -------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct HomeQuery {
    pub category: Option<String>,
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    pub q: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/home",
    tag = "pages",
    params(
        ("category" = Option<String>, Query, description = "Exact category name or All"),
        ("q" = Option<String>, Query, description = "Header search text; answered with a redirect to AI help")
    ),
    responses(
        (status = 200, description = "Listing", body = HomeView),
        (status = 400, description = "Unknown category"),
        (status = 503, description = "Retry banner", body = crate::error::ErrorBanner)
    )
)]
pub async fn home_page(
    session: Option<CurrentSession>,
    data: web::Data<AppState>,
    query: web::Query<HomeQuery>,
) -> Result<HttpResponse, ApiError> {
    let selected = parse_category_filter(query.category.as_deref()).map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if let Some(CurrentSession(s)) = &session {
        s.navigate(Location::Home);
    }
    let questions = data.catalog.list_questions(selected).await?;
    Ok(HttpResponse::Ok().json(home_view(selected, questions, query.q.as_deref())))
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/thread/{id}",
    tag = "pages",
    params(("id" = String, Path, description = "Thread id (echoed)")),
    responses((status = 200, description = "Thread detail", body = ThreadView))
)]
pub async fn thread_page(
    session: Option<CurrentSession>,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let thread = data.catalog.get_thread(&id).await?;
    let lifecycle = session.and_then(|CurrentSession(s)| {
        s.navigate(Location::Thread(id.clone()));
        s.thread_state(&id)
    });
    Ok(HttpResponse::Ok().json(thread_view(thread, lifecycle)))
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/post",
    tag = "pages",
    params(("q" = Option<String>, Query, description = "Accepted and ignored")),
    responses((status = 200, description = "Ask-a-question form", body = PostFormView))
)]
pub async fn post_page(session: Option<CurrentSession>, _query: web::Query<TextQuery>) -> HttpResponse {
    let form = session
        .map(|CurrentSession(s)| {
            s.navigate(Location::Post);
            s.with_state(|st| st.post_form.clone())
        })
        .unwrap_or_default();
    HttpResponse::Ok().json(post_form_view(form))
}

async fn search_for(
    session: Option<&Arc<Session>>,
    data: &AppState,
    query: SearchQuery,
) -> Result<SearchOutcome, ApiError> {
    let (delay, pending) = match session {
        Some(s) => {
            let (delay, pending) = s.begin_search(data.latency.search);
            (delay, Some(pending))
        }
        None => (ScopedDelay::detached(data.latency.search), None),
    };
    let result = run_search(data.search.as_ref(), query, delay).await;
    if let Some(pending) = pending {
        if !pending.finish(&result) && result.is_ok() {
            debug!("search result discarded; the session moved on");
        }
    }
    let outcome = match &result {
        Ok(o) if o.is_empty() => "empty",
        Ok(_) => "matched",
        Err(SearchError::Superseded) => "superseded",
        Err(SearchError::QueryTooShort) => "rejected",
    };
    metrics::counter!("help_search_total", 1, "outcome" => outcome);
    debug!(outcome, "help search finished");
    Ok(result?)
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/ai-help",
    tag = "pages",
    params(("q" = Option<String>, Query, description = "Initial query; runs the search when long enough")),
    responses(
        (status = 200, description = "AI help screen", body = AiHelpView),
        (status = 409, description = "Superseded by a newer search")
    )
)]
pub async fn ai_help_page(
    session: Option<CurrentSession>,
    data: web::Data<AppState>,
    query: web::Query<TextQuery>,
) -> Result<HttpResponse, ApiError> {
    let raw = query.into_inner().q.unwrap_or_default();
    let session = session.map(|CurrentSession(s)| s);
    if let Some(s) = &session {
        s.navigate(Location::AiHelp);
    }
    let outcome = match SearchQuery::parse(&raw) {
        Ok(q) => Some(search_for(session.as_ref(), &data, q).await?),
        Err(_) => session.as_ref().and_then(|s| s.with_state(|st| st.last_search.clone())),
    };
    let searching = session.as_ref().map_or(false, |s| s.with_state(|st| st.searching));
    Ok(HttpResponse::Ok().json(ai_help_view(&raw, searching, outcome)))
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/faq/{id}",
    tag = "pages",
    params(("id" = String, Path, description = "Article id (echoed)")),
    responses((status = 200, description = "FAQ article", body = FaqView))
)]
pub async fn faq_page(
    session: Option<CurrentSession>,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let article = data.catalog.get_faq(&id).await?;
    let helpful = session.and_then(|CurrentSession(s)| {
        s.navigate(Location::Faq(id.clone()));
        s.with_state(|st| st.faq_feedback.get(&id).copied())
    });
    Ok(HttpResponse::Ok().json(faq_view(article, helpful)))
}

#[derive(Debug, Deserialize)]
pub struct AgentQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub date: Option<String>,
    pub sort: Option<String>,
}

impl AgentQuery {
    fn filters(&self) -> Result<QueueFilters, ApiError> {
        let bad = |e: String| ApiError::BadRequest(e);
        Ok(QueueFilters {
            category: parse_category_filter(self.category.as_deref()).map_err(|e| bad(e.to_string()))?,
            search: self.search.clone().unwrap_or_default(),
            date: self.date.as_deref().map(str::parse).transpose().map_err(bad)?.unwrap_or_default(),
            sort: self.sort.as_deref().map(str::parse).transpose().map_err(bad)?.unwrap_or_default(),
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/agent",
    tag = "pages",
    params(
        ("category" = Option<String>, Query, description = "All or exact category"),
        ("search" = Option<String>, Query, description = "Case-insensitive title substring"),
        ("date" = Option<String>, Query, description = "Last 7 days | Last 30 days | All time"),
        ("sort" = Option<String>, Query, description = "Oldest first | Newest first | Most views")
    ),
    responses(
        (status = 200, description = "Agent dashboard", body = AgentView),
        (status = 400, description = "Unknown filter value")
    )
)]
pub async fn agent_page(
    session: Option<CurrentSession>,
    data: web::Data<AppState>,
    query: web::Query<AgentQuery>,
) -> Result<HttpResponse, ApiError> {
    let filters = query.filters()?;
    let stats = data.catalog.dashboard_stats().await?;
    let entries = data.catalog.unanswered().await?;
    let selected = session
        .map(|CurrentSession(s)| {
            s.navigate(Location::Agent);
            s.with_state(|st| st.selected_threads.clone())
        })
        .unwrap_or_default();
    Ok(HttpResponse::Ok().json(agent_view(stats, entries, filters, |id| selected.contains(id))))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub range: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/pages/admin/analytics",
    tag = "pages",
    params(("range" = Option<String>, Query, description = "Last 7 days | Last 30 days | Last 90 days | Custom range")),
    responses(
        (status = 200, description = "Analytics dashboard", body = AnalyticsView),
        (status = 400, description = "Unknown range")
    )
)]
pub async fn analytics_page(
    session: Option<CurrentSession>,
    data: web::Data<AppState>,
    query: web::Query<RangeQuery>,
) -> Result<HttpResponse, ApiError> {
    let range: AnalyticsRange = query
        .range
        .as_deref()
        .map(str::parse)
        .transpose()
        .map_err(ApiError::BadRequest)?
        .unwrap_or_default();
    if let Some(CurrentSession(s)) = &session {
        s.navigate(Location::Analytics);
    }
    let report = data.catalog.report(range).await?;
    Ok(HttpResponse::Ok().json(analytics_view(range, report)))
}

// ---------------- help search ---------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/search",
    tag = "search",
    request_body = SearchRequest,
    params(("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Suggestions after the simulated delay", body = SearchOutcome),
        (status = 400, description = "Query shorter than 3 characters"),
        (status = 409, description = "Superseded by a newer search"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn search(
    req: HttpRequest,
    session: CurrentSession,
    data: web::Data<AppState>,
    payload: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let query = SearchQuery::parse(&payload.query)?;
    throttle(&data, &req, RateLimiterFacade::allow_search)?;
    let outcome = search_for(Some(&session.0), &data, query).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

#[utoipa::path(
    delete,
    path = "/api/v1/search",
    tag = "search",
    params(("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 204, description = "Search cleared; a pending search is cancelled"))
)]
pub async fn reset_search(session: CurrentSession) -> HttpResponse {
    session.0.reset_search();
    HttpResponse::NoContent().finish()
}

// ---------------- question form -------------------------------------------

#[utoipa::path(
    patch,
    path = "/api/v1/questions/draft",
    tag = "questions",
    request_body = DraftUpdate,
    params(("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Updated form", body = PostFormView),
        (status = 409, description = "Already submitted")
    )
)]
pub async fn edit_question_draft(
    session: CurrentSession,
    payload: web::Json<DraftUpdate>,
) -> Result<HttpResponse, ApiError> {
    let form = session.0.edit_draft(payload.into_inner())?;
    Ok(HttpResponse::Ok().json(post_form_view(form)))
}

#[utoipa::path(
    post,
    path = "/api/v1/questions/validate",
    tag = "questions",
    request_body = QuestionDraft,
    responses((status = 200, description = "Per-field report", body = ValidationReport))
)]
pub async fn validate_question(payload: web::Json<QuestionDraft>) -> HttpResponse {
    let errors = validate(&payload).err().unwrap_or_default();
    HttpResponse::Ok().json(ValidationReport { can_submit: errors.is_empty(), errors })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResponse {
    pub question: ValidatedQuestion,
    pub redirect_to: String,
    pub redirect_after_ms: u64,
}

#[utoipa::path(
    post,
    path = "/api/v1/questions",
    tag = "questions",
    request_body(content = QuestionDraft, description = "Full draft; omitted to submit the session's draft"),
    params(("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 202, description = "Submitted; the session returns to the listing after the redirect delay", body = SubmitResponse),
        (status = 400, description = "Malformed JSON body"),
        (status = 409, description = "Already submitted"),
        (status = 422, description = "Per-field validation errors"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn submit_question(
    req: HttpRequest,
    session: CurrentSession,
    data: web::Data<AppState>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let draft: Option<QuestionDraft> = optional_json(&body)?;
    throttle(&data, &req, RateLimiterFacade::allow_question)?;
    let redirect_after = data.latency.redirect;
    let question = session
        .0
        .submit_question(draft, redirect_after)
        .map_err(|e| {
            metrics::counter!("question_submissions_total", 1, "result" => "rejected");
            e
        })?;
    metrics::counter!("question_submissions_total", 1, "result" => "accepted");
    info!(session = %session.0.id, category = %question.category, "question submitted");
    Ok(HttpResponse::Accepted().json(SubmitResponse {
        question,
        redirect_to: Location::Home.path(),
        redirect_after_ms: redirect_after.as_millis() as u64,
    }))
}

// ---------------- thread actions ------------------------------------------

#[derive(Debug, Deserialize, ToSchema)]
pub struct ReplyDraftRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReplyRequest {
    /// Replaces the composed text before posting.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ConfirmRequest {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FeedbackRequest {
    pub helpful: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LanguageRequest {
    pub language: Language,
}

/// Loads the thread, applies `f` to the session's lifecycle for it and renders the screen.
async fn act_on_thread<R>(
    session: &Session,
    data: &AppState,
    id: &str,
    f: impl FnOnce(&mut crate::thread_state::ThreadLifecycle) -> Result<R, crate::thread_state::ThreadActionError>,
) -> Result<ThreadView, ApiError> {
    let thread = data.catalog.get_thread(id).await?;
    session.with_thread(id, thread.status, f)?;
    Ok(thread_view(thread, session.thread_state(id)))
}

#[utoipa::path(
    put,
    path = "/api/v1/threads/{id}/draft",
    tag = "threads",
    request_body = ReplyDraftRequest,
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Reply box open with the text", body = ThreadView),
        (status = 409, description = "Closed or a reply is pending")
    )
)]
pub async fn set_reply_draft(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ReplyDraftRequest>,
) -> Result<HttpResponse, ApiError> {
    let text = payload.into_inner().text;
    let view = act_on_thread(&session.0, &data, &path, |t| t.set_compose(text)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    delete,
    path = "/api/v1/threads/{id}/draft",
    tag = "threads",
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Reply box hidden; text kept", body = ThreadView))
)]
pub async fn hide_reply_box(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let view = act_on_thread(&session.0, &data, &path, |t| {
        t.hide_reply_box();
        Ok(())
    })
    .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/replies",
    tag = "threads",
    request_body = ReplyRequest,
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Reply posted after the pending delay; thread answered", body = ThreadView),
        (status = 400, description = "Empty reply or malformed JSON body"),
        (status = 409, description = "Closed, already pending, or cancelled"),
        (status = 429, description = "Rate limited")
    )
)]
pub async fn post_reply(
    req: HttpRequest,
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Bytes,
) -> Result<HttpResponse, ApiError> {
    let text = optional_json::<ReplyRequest>(&body)?.and_then(|r| r.text);
    throttle(&data, &req, RateLimiterFacade::allow_reply)?;
    let id = path.into_inner();
    let thread = data.catalog.get_thread(&id).await?;
    let result = session.0.post_reply(&id, thread.status, text, data.latency.reply).await;
    let label = if result.is_ok() { "posted" } else { "rejected" };
    metrics::counter!("thread_replies_total", 1, "result" => label);
    let lifecycle = result?;
    info!(session = %session.0.id, thread = %id, "reply posted");
    Ok(HttpResponse::Ok().json(thread_view(thread, Some(lifecycle))))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/answered",
    tag = "threads",
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Marked answered", body = ThreadView), (status = 409, description = "Closed"))
)]
pub async fn mark_answered(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let view = act_on_thread(&session.0, &data, &path, |t| t.mark_answered()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/close",
    tag = "threads",
    request_body = ConfirmRequest,
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses(
        (status = 200, description = "Closed when confirmed, unchanged otherwise", body = ThreadView),
        (status = 409, description = "Already closed or a reply is pending")
    )
)]
pub async fn close_thread(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ConfirmRequest>,
) -> Result<HttpResponse, ApiError> {
    let confirm = payload.confirm;
    let view = act_on_thread(&session.0, &data, &path, |t| t.close(confirm)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/lock",
    tag = "threads",
    request_body = ConfirmRequest,
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Locked when confirmed", body = ThreadView), (status = 409, description = "Closed"))
)]
pub async fn lock_thread(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<ConfirmRequest>,
) -> Result<HttpResponse, ApiError> {
    let confirm = payload.confirm;
    let view = act_on_thread(&session.0, &data, &path, |t| t.lock(confirm)).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/save-as-faq",
    tag = "threads",
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Flagged as FAQ candidate", body = ThreadView), (status = 409, description = "Closed"))
)]
pub async fn save_as_faq(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let view = act_on_thread(&session.0, &data, &path, |t| t.save_as_faq()).await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/feedback",
    tag = "threads",
    request_body = FeedbackRequest,
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Feedback recorded", body = ThreadView))
)]
pub async fn thread_feedback(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<FeedbackRequest>,
) -> Result<HttpResponse, ApiError> {
    let helpful = payload.helpful;
    let view = act_on_thread(&session.0, &data, &path, |t| {
        t.helpful = Some(helpful);
        Ok(())
    })
    .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/threads/{id}/language",
    tag = "threads",
    request_body = LanguageRequest,
    params(("id" = String, Path, description = "Thread id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Display language switched", body = ThreadView))
)]
pub async fn set_thread_language(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<LanguageRequest>,
) -> Result<HttpResponse, ApiError> {
    let language = payload.language;
    let view = act_on_thread(&session.0, &data, &path, |t| {
        t.set_language(language);
        Ok(())
    })
    .await?;
    Ok(HttpResponse::Ok().json(view))
}

#[utoipa::path(
    post,
    path = "/api/v1/faqs/{id}/feedback",
    tag = "faqs",
    request_body = FeedbackRequest,
    params(("id" = String, Path, description = "Article id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Feedback recorded", body = FaqView))
)]
pub async fn faq_feedback(
    session: CurrentSession,
    data: web::Data<AppState>,
    path: web::Path<String>,
    payload: web::Json<FeedbackRequest>,
) -> Result<HttpResponse, ApiError> {
    let id = path.into_inner();
    let article = data.catalog.get_faq(&id).await?;
    let helpful = payload.helpful;
    session.0.navigate(Location::Faq(id.clone()));
    session.0.with_state(|st| st.faq_feedback.insert(id, helpful));
    metrics::counter!("faq_feedback_total", 1, "helpful" => if helpful { "yes" } else { "no" });
    Ok(HttpResponse::Ok().json(faq_view(article, Some(helpful))))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectionResponse {
    pub id: Id,
    pub selected: bool,
    pub selected_count: usize,
}

#[utoipa::path(
    post,
    path = "/api/v1/agent/selection/{id}",
    tag = "agent",
    params(("id" = String, Path, description = "Queue entry id"), ("X-Session-Id" = String, Header, description = "Session id")),
    responses((status = 200, description = "Selection toggled", body = SelectionResponse))
)]
pub async fn toggle_selection(session: CurrentSession, path: web::Path<String>) -> HttpResponse {
    let id = path.into_inner();
    session.0.navigate(Location::Agent);
    let (selected, selected_count) = session.0.with_state(|st| {
        let selected = if st.selected_threads.remove(&id) {
            false
        } else {
            st.selected_threads.insert(id.clone());
            true
        };
        (selected, st.selected_threads.len())
    });
    HttpResponse::Ok().json(SelectionResponse { id, selected, selected_count })
}
