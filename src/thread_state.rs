use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{Language, ThreadStatus};

static NEXT_REPLY: AtomicU64 = AtomicU64::new(1);

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadActionError {
    #[error("reply text is empty")]
    EmptyReply,
    #[error("a reply is already being posted")]
    ReplyPending,
    #[error("no reply is being posted")]
    NoPendingReply,
    #[error("thread is closed")]
    Closed,
}

/// Agent-side view of one thread: `Open -> Answered -> Closed`, where `Closed`
/// is terminal. `locked` is an independent flag.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ThreadLifecycle {
    pub status: ThreadStatus,
    pub locked: bool,
    pub saved_as_faq: bool,
    pub reply_box_open: bool,
    pub compose: String,
    pub reply_pending: bool,
    pub helpful: Option<bool>,
    pub language: Language,
    #[serde(skip)]
    pending_reply: Option<u64>,
}

impl ThreadLifecycle {
    pub fn new(status: ThreadStatus) -> Self {
        Self { status, ..Default::default() }
    }

    pub fn actions_available(&self) -> bool {
        self.status != ThreadStatus::Closed
    }

    fn ensure_not_closed(&self) -> Result<(), ThreadActionError> {
        if self.status == ThreadStatus::Closed {
            return Err(ThreadActionError::Closed);
        }
        Ok(())
    }

    pub fn set_compose(&mut self, text: String) -> Result<(), ThreadActionError> {
        self.ensure_not_closed()?;
        if self.reply_pending {
            return Err(ThreadActionError::ReplyPending);
        }
        self.reply_box_open = true;
        self.compose = text;
        Ok(())
    }

    pub fn hide_reply_box(&mut self) {
        if !self.reply_pending {
            self.reply_box_open = false;
        }
    }

    /// Starts posting the composed reply. Blank text leaves everything untouched.
    pub fn begin_reply(&mut self) -> Result<String, ThreadActionError> {
        self.ensure_not_closed()?;
        if self.reply_pending {
            return Err(ThreadActionError::ReplyPending);
        }
        let text = self.compose.trim();
        if text.is_empty() {
            return Err(ThreadActionError::EmptyReply);
        }
        let text = text.to_string();
        self.reply_pending = true;
        self.pending_reply = Some(NEXT_REPLY.fetch_add(1, Ordering::Relaxed));
        Ok(text)
    }

    /// Identifies the reply started by the last successful [`Self::begin_reply`].
    pub fn pending_reply(&self) -> Option<u64> {
        self.pending_reply
    }

    pub fn complete_reply(&mut self) -> Result<(), ThreadActionError> {
        if !self.reply_pending {
            return Err(ThreadActionError::NoPendingReply);
        }
        self.reply_pending = false;
        self.pending_reply = None;
        self.ensure_not_closed()?;
        self.compose.clear();
        self.reply_box_open = false;
        self.status = ThreadStatus::Answered;
        Ok(())
    }

    /// The pending delay was cancelled; the composed text is kept.
    pub fn abort_reply(&mut self) {
        self.reply_pending = false;
        self.pending_reply = None;
    }

    /// Aborts only if `reply` is still the one pending.
    pub fn abort_reply_if(&mut self, reply: u64) {
        if self.pending_reply == Some(reply) {
            self.abort_reply();
        }
    }

    /// Display language of the thread. Allowed on closed threads.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
    }

    pub fn mark_answered(&mut self) -> Result<(), ThreadActionError> {
        self.ensure_not_closed()?;
        self.status = ThreadStatus::Answered;
        Ok(())
    }

    /// Returns whether anything changed; an unconfirmed close is a no-op.
    pub fn close(&mut self, confirmed: bool) -> Result<bool, ThreadActionError> {
        self.ensure_not_closed()?;
        if self.reply_pending {
            return Err(ThreadActionError::ReplyPending);
        }
        if !confirmed {
            return Ok(false);
        }
        self.status = ThreadStatus::Closed;
        self.reply_box_open = false;
        Ok(true)
    }

    pub fn lock(&mut self, confirmed: bool) -> Result<bool, ThreadActionError> {
        self.ensure_not_closed()?;
        if !confirmed || self.locked {
            return Ok(false);
        }
        self.locked = true;
        Ok(true)
    }

    pub fn save_as_faq(&mut self) -> Result<(), ThreadActionError> {
        self.ensure_not_closed()?;
        self.saved_as_faq = true;
        Ok(())
    }
}
