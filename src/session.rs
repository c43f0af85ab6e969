//! Per-visitor view state.
//!
//! Each session owns the local state of the screen it is on plus one
//! [`DelaySlot`] per simulated asynchronous operation. Moving to another screen
//! discards the state of the screen being left and cancels its pending delays;
//! ending the session cancels everything.

use std::collections::{BTreeSet, HashMap};
use std::future::{ready, Ready};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::SessionLimits;
use crate::error::ApiError;
use crate::models::{Id, ThreadStatus};
use crate::routes::AppState;
use crate::search::{SearchError, SearchOutcome};
use crate::thread_state::{ThreadActionError, ThreadLifecycle};
use crate::timer::{Cancelled, DelaySlot, ScopedDelay};
use crate::validation::{DraftUpdate, FormError, PostForm, QuestionDraft, ValidatedQuestion};

pub const SESSION_HEADER: &str = "x-session-id";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Thread(#[from] ThreadActionError),
    #[error(transparent)]
    Form(#[from] FormError),
    #[error(transparent)]
    Search(#[from] SearchError),
    #[error("pending action cancelled")]
    Cancelled,
}

impl From<Cancelled> for SessionError {
    fn from(_: Cancelled) -> Self {
        SessionError::Cancelled
    }
}

/// Screen a session is currently on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Location {
    #[default]
    Home,
    Thread(Id),
    Post,
    AiHelp,
    Faq(Id),
    Agent,
    Analytics,
}

impl Location {
    pub fn path(&self) -> String {
        match self {
            Location::Home => "/".into(),
            Location::Thread(id) => format!("/thread/{id}"),
            Location::Post => "/post".into(),
            Location::AiHelp => "/ai-help".into(),
            Location::Faq(id) => format!("/faq/{id}"),
            Location::Agent => "/agent".into(),
            Location::Analytics => "/admin/analytics".into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SessionState {
    pub location: Location,
    pub post_form: PostForm,
    pub threads: HashMap<Id, ThreadLifecycle>,
    pub faq_feedback: HashMap<Id, bool>,
    pub selected_threads: BTreeSet<Id>,
    pub searching: bool,
    pub last_search: Option<SearchOutcome>,
    search_generation: u64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub location: String,
}

#[derive(Debug)]
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    state: Mutex<SessionState>,
    last_seen: Mutex<Instant>,
    search_slot: DelaySlot,
    redirect_slot: DelaySlot,
    reply_slots: Mutex<HashMap<Id, DelaySlot>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            state: Mutex::new(SessionState::default()),
            last_seen: Mutex::new(Instant::now()),
            search_slot: DelaySlot::new(),
            redirect_slot: DelaySlot::new(),
            reply_slots: Mutex::new(HashMap::new()),
        }
    }

    // Never held across an await point.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reply_slots(&self) -> MutexGuard<'_, HashMap<Id, DelaySlot>> {
        self.reply_slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn touch(&self) {
        *self.last_seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).elapsed()
    }

    pub fn with_state<R>(&self, f: impl FnOnce(&mut SessionState) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn location(&self) -> Location {
        self.lock().location.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { session_id: self.id, created_at: self.created_at, location: self.location().path() }
    }

    /// Moves to `to`. The screen being left loses its local state and pending delays.
    pub fn navigate(&self, to: Location) {
        let mut st = self.lock();
        if st.location == to {
            return;
        }
        let from = std::mem::replace(&mut st.location, to);
        debug!(session = %self.id, from = %from.path(), to = %st.location.path(), "navigate");
        match from {
            Location::Post => {
                self.redirect_slot.cancel();
                st.post_form.reset();
            }
            Location::AiHelp => {
                self.search_slot.cancel();
                st.search_generation += 1;
                st.searching = false;
                st.last_search = None;
            }
            Location::Thread(id) => {
                self.reply_slots().remove(&id);
                st.threads.remove(&id);
            }
            Location::Faq(id) => {
                st.faq_feedback.remove(&id);
            }
            Location::Agent => st.selected_threads.clear(),
            Location::Home | Location::Analytics => {}
        }
    }

    /// Cancels every pending delay. Called when the session ends.
    pub fn teardown(&self) {
        self.search_slot.cancel();
        self.redirect_slot.cancel();
        self.reply_slots().clear();
        let mut st = self.lock();
        st.search_generation += 1;
        st.searching = false;
        for t in st.threads.values_mut() {
            t.abort_reply();
        }
    }

    // ---------------- help search -----------------------------------------

    /// Arms the search delay; a search already in flight is superseded.
    /// The session reports `searching` until the returned [`PendingSearch`] is
    /// finished or dropped.
    pub fn begin_search(&self, after: Duration) -> (ScopedDelay, PendingSearch<'_>) {
        self.navigate(Location::AiHelp);
        let mut st = self.lock();
        st.search_generation += 1;
        st.searching = true;
        let pending = PendingSearch { session: self, generation: st.search_generation };
        (self.search_slot.arm(after), pending)
    }

    pub fn reset_search(&self) {
        self.search_slot.cancel();
        let mut st = self.lock();
        st.search_generation += 1;
        st.searching = false;
        st.last_search = None;
    }

    // ---------------- post question ---------------------------------------

    pub fn edit_draft(&self, update: DraftUpdate) -> Result<PostForm, SessionError> {
        self.navigate(Location::Post);
        let mut st = self.lock();
        st.post_form.edit(update)?;
        Ok(st.post_form.clone())
    }

    /// Validates and submits the form. On success the session is redirected
    /// home once `redirect_after` has elapsed, unless it leaves the screen first.
    pub fn submit_question(
        self: &Arc<Self>,
        draft: Option<QuestionDraft>,
        redirect_after: Duration,
    ) -> Result<ValidatedQuestion, SessionError> {
        self.navigate(Location::Post);
        let question = {
            let mut st = self.lock();
            if let Some(d) = draft {
                if st.post_form.submitted {
                    return Err(FormError::AlreadySubmitted.into());
                }
                st.post_form.draft = d;
            }
            st.post_form.submit()?
        };
        let delay = self.redirect_slot.arm(redirect_after);
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            if delay.wait().await.is_err() {
                return;
            }
            if let Some(session) = weak.upgrade() {
                info!(session = %session.id, "question submitted, returning to listing");
                session.navigate(Location::Home);
            }
        });
        Ok(question)
    }

    // ---------------- thread lifecycle ------------------------------------

    /// Runs `f` against the thread's lifecycle, creating it with `seed` on first use.
    pub fn with_thread<R>(
        &self,
        id: &str,
        seed: ThreadStatus,
        f: impl FnOnce(&mut ThreadLifecycle) -> R,
    ) -> R {
        self.navigate(Location::Thread(id.to_string()));
        let mut st = self.lock();
        let t = st.threads.entry(id.to_string()).or_insert_with(|| ThreadLifecycle::new(seed));
        f(t)
    }

    pub fn thread_state(&self, id: &str) -> Option<ThreadLifecycle> {
        self.lock().threads.get(id).cloned()
    }

    /// Posts the composed reply (or `text` when given) after the reply delay.
    pub async fn post_reply(
        &self,
        id: &str,
        seed: ThreadStatus,
        text: Option<String>,
        after: Duration,
    ) -> Result<ThreadLifecycle, SessionError> {
        let reply = self.with_thread(id, seed, |t| -> Result<u64, ThreadActionError> {
            if let Some(text) = text {
                t.set_compose(text)?;
            }
            t.begin_reply()?;
            t.pending_reply().ok_or(ThreadActionError::NoPendingReply)
        })?;
        let _pending = PendingReply { session: self, thread: id, reply };
        let delay = self.reply_slots().entry(id.to_string()).or_default().arm(after);

        match delay.wait().await {
            Ok(()) => {
                let mut st = self.lock();
                let t = st
                    .threads
                    .get_mut(id)
                    .filter(|t| t.pending_reply() == Some(reply))
                    .ok_or(SessionError::Cancelled)?;
                t.complete_reply()?;
                Ok(t.clone())
            }
            Err(Cancelled) => Err(SessionError::Cancelled),
        }
    }
}

/// Search in flight for one session.
///
/// The outcome is kept only while this is still the session's latest search
/// and the session is still on the AI help screen.
pub struct PendingSearch<'a> {
    session: &'a Session,
    generation: u64,
}

impl PendingSearch<'_> {
    /// Returns whether the outcome was stored.
    pub fn finish(self, outcome: &Result<SearchOutcome, SearchError>) -> bool {
        let mut st = self.session.lock();
        if st.search_generation != self.generation || st.location != Location::AiHelp {
            return false;
        }
        st.searching = false;
        match outcome {
            Ok(out) => {
                st.last_search = Some(out.clone());
                true
            }
            Err(_) => false,
        }
    }
}

impl Drop for PendingSearch<'_> {
    fn drop(&mut self) {
        let mut st = self.session.lock();
        if st.search_generation == self.generation {
            st.searching = false;
        }
    }
}

/// Clears the pending flag of a reply whose request never completed.
struct PendingReply<'a> {
    session: &'a Session,
    thread: &'a str,
    reply: u64,
}

impl Drop for PendingReply<'_> {
    fn drop(&mut self) {
        if let Some(t) = self.session.lock().threads.get_mut(self.thread) {
            t.abort_reply_if(self.reply);
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("too many live sessions")]
pub struct SessionLimitReached;

/// All live sessions of this process.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<DashMap<Uuid, Arc<Session>>>,
    limits: SessionLimits,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: SessionLimits) -> Self {
        Self { inner: Arc::default(), limits }
    }

    /// Starts a session. When the store is full, idle sessions are swept first.
    pub fn create(&self) -> Result<Arc<Session>, SessionLimitReached> {
        if self.inner.len() >= self.limits.max_live && self.sweep_idle() == 0 {
            return Err(SessionLimitReached);
        }
        let session = Arc::new(Session::new());
        self.inner.insert(session.id, session.clone());
        Ok(session)
    }

    /// Looks up a live session and marks it as seen.
    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.inner.get(id).map(|s| s.value().clone())?;
        session.touch();
        Some(session)
    }

    /// Ends every session idle for at least the configured time.
    pub fn sweep_idle(&self) -> usize {
        let ttl = self.limits.idle_ttl;
        let stale: Vec<Uuid> = self
            .inner
            .iter()
            .filter(|e| e.value().idle_for() >= ttl)
            .map(|e| *e.key())
            .collect();
        let swept = stale.iter().filter(|id| self.end(id)).count();
        if swept > 0 {
            debug!(swept, live = self.inner.len(), "idle sessions ended");
        }
        swept
    }

    /// Removes the session and cancels its pending delays.
    pub fn end(&self, id: &Uuid) -> bool {
        match self.inner.remove(id) {
            Some((_, session)) => {
                session.teardown();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Extractor resolving the `X-Session-Id` header to a live session.
pub struct CurrentSession(pub Arc<Session>);

fn resolve(req: &HttpRequest) -> Result<Arc<Session>, ApiError> {
    let raw = req
        .headers()
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::BadRequest("missing X-Session-Id header".into()))?;
    let id = Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest("malformed session id".into()))?;
    let state = req.app_data::<web::Data<AppState>>().ok_or(ApiError::Internal)?;
    state.sessions.get(&id).ok_or(ApiError::NotFound)
}

impl FromRequest for CurrentSession {
    type Error = Error;
    type Future = Ready<Result<Self, Error>>;

    fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
        ready(resolve(req).map(CurrentSession).map_err(Error::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;

    fn valid_draft() -> QuestionDraft {
        QuestionDraft {
            category: Some("Payments".into()),
            title: "MPESA payment missing".into(),
            body: "Paid yesterday evening, still not reflected.".into(),
            language: Language::English,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn submission_redirects_home_after_delay() {
        let session = Arc::new(Session::new());
        session.submit_question(Some(valid_draft()), Duration::from_millis(2000)).unwrap();
        assert_eq!(session.location(), Location::Post);
        assert!(session.with_state(|st| st.post_form.submitted));

        tokio::time::sleep(Duration::from_millis(1999)).await;
        assert_eq!(session.location(), Location::Post);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(session.location(), Location::Home);
        assert!(!session.with_state(|st| st.post_form.submitted));
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_the_form_cancels_the_redirect() {
        let session = Arc::new(Session::new());
        session.submit_question(Some(valid_draft()), Duration::from_millis(2000)).unwrap();
        session.navigate(Location::Agent);
        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(session.location(), Location::Agent);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_submission_stays_on_form() {
        let session = Arc::new(Session::new());
        let err = session.submit_question(Some(QuestionDraft::default()), Duration::from_millis(2000)).unwrap_err();
        assert!(matches!(err, SessionError::Form(FormError::Invalid(_))));
        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(session.location(), Location::Post);
        assert_eq!(session.with_state(|st| st.post_form.errors.len()), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn reply_answers_thread_after_pending_delay() {
        let session = Session::new();
        let t = session
            .post_reply("7", ThreadStatus::Open, Some("Try again in 5 minutes".into()), Duration::from_millis(1000))
            .await
            .unwrap();
        assert_eq!(t.status, ThreadStatus::Answered);
        assert!(t.compose.is_empty());
        assert!(!t.reply_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_reply_changes_nothing() {
        let session = Session::new();
        let err = session
            .post_reply("7", ThreadStatus::Open, Some("   ".into()), Duration::from_millis(1000))
            .await
            .unwrap_err();
        assert_eq!(err, SessionError::Thread(ThreadActionError::EmptyReply));
        let t = session.thread_state("7").unwrap();
        assert_eq!(t.status, ThreadStatus::Open);
        assert!(!t.reply_pending);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_cancels_pending_reply() {
        let session = Arc::new(Session::new());
        let s2 = session.clone();
        let task = tokio::spawn(async move {
            s2.post_reply("9", ThreadStatus::Open, Some("on it".into()), Duration::from_millis(1000)).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(session.thread_state("9").unwrap().reply_pending);
        session.teardown();
        let res = task.await.unwrap();
        assert_eq!(res.unwrap_err(), SessionError::Cancelled);
        let t = session.thread_state("9").unwrap();
        assert_eq!(t.status, ThreadStatus::Open);
        assert_eq!(t.compose, "on it");
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_reply_request_releases_the_thread() {
        let session = Arc::new(Session::new());
        let s2 = session.clone();
        let task = tokio::spawn(async move {
            s2.post_reply("5", ThreadStatus::Open, Some("hello".into()), Duration::from_millis(1000)).await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(session.thread_state("5").unwrap().reply_pending);

        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());
        tokio::time::sleep(Duration::from_secs(5)).await;

        let t = session.thread_state("5").unwrap();
        assert!(!t.reply_pending);
        assert_eq!(t.status, ThreadStatus::Open);
        assert_eq!(t.compose, "hello");

        let t = session.post_reply("5", ThreadStatus::Open, None, Duration::from_millis(1000)).await.unwrap();
        assert_eq!(t.status, ThreadStatus::Answered);
        assert_eq!(session.with_thread("5", ThreadStatus::Open, |t| t.close(true)), Ok(true));
    }

    #[tokio::test(start_paused = true)]
    async fn dropped_search_stops_searching() {
        let session = Session::new();
        let (delay, pending) = session.begin_search(Duration::from_millis(800));
        assert!(session.with_state(|st| st.searching));
        drop(delay);
        drop(pending);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(!session.with_state(|st| st.searching));
        assert!(session.with_state(|st| st.last_search.is_none()));
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_search_does_not_clear_the_newer_one() {
        let session = Session::new();
        let (_, first) = session.begin_search(Duration::from_millis(800));
        let (_, second) = session.begin_search(Duration::from_millis(800));
        drop(first);
        assert!(session.with_state(|st| st.searching));
        drop(second);
        assert!(!session.with_state(|st| st.searching));
    }

    #[tokio::test(start_paused = true)]
    async fn full_store_sweeps_idle_sessions() {
        let store = SessionStore::with_limits(SessionLimits { max_live: 2, idle_ttl: Duration::from_secs(60) });
        let a = store.create().unwrap();
        let b = store.create().unwrap();
        assert_eq!(store.create().unwrap_err(), SessionLimitReached);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert!(store.get(&b.id).is_some());
        tokio::time::advance(Duration::from_secs(31)).await;

        // only `a` has been idle for a full minute
        let c = store.create().unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.get(&a.id).is_none());
        assert!(store.get(&b.id).is_some());
        assert!(store.get(&c.id).is_some());
    }

    #[test]
    fn leaving_a_thread_discards_its_state() {
        let session = Session::new();
        session.with_thread("2", ThreadStatus::Answered, |t| t.lock(true)).unwrap();
        assert!(session.thread_state("2").unwrap().locked);
        session.navigate(Location::Home);
        assert!(session.thread_state("2").is_none());
    }

    #[test]
    fn store_end_removes_session() {
        let store = SessionStore::new();
        let s = store.create().unwrap();
        assert!(store.get(&s.id).is_some());
        assert!(store.end(&s.id));
        assert!(store.get(&s.id).is_none());
        assert!(!store.end(&s.id));
    }
}
