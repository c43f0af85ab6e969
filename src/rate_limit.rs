use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;

use crate::config::env_or;

/// Sliding window in-memory rate limiter (process local).
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    store: Arc<DashMap<String, VecDeque<Instant>>>,
    pub enabled: bool,
}

impl InMemoryRateLimiter {
    pub fn new(enabled: bool) -> Self {
        Self { store: Arc::new(DashMap::new()), enabled }
    }

    /// Returns true if allowed, false if limited.
    pub fn check(&self, key: &str, limit: usize, window: Duration) -> bool {
        if !self.enabled { return true; }
        let now = Instant::now();
        let mut entry = self.store.entry(key.to_string()).or_default();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= window { entry.pop_front(); } else { break; }
        }
        if entry.len() < limit {
            entry.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Per-action limits derived from env.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub search_limit: usize,
    pub search_window: Duration,
    pub question_limit: usize,
    pub question_window: Duration,
    pub reply_limit: usize,
    pub reply_window: Duration,
    pub session_limit: usize,
    pub session_window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            search_limit: 30,
            search_window: Duration::from_secs(60),
            question_limit: 3,
            question_window: Duration::from_secs(300),
            reply_limit: 10,
            reply_window: Duration::from_secs(60),
            session_limit: 20,
            session_window: Duration::from_secs(60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        let secs = |name: &str, default: Duration| env_or(name, default.as_secs()).map(Duration::from_secs);
        Ok(Self {
            search_limit: env_or("RL_SEARCH_LIMIT", d.search_limit)?,
            search_window: secs("RL_SEARCH_WINDOW", d.search_window)?,
            question_limit: env_or("RL_QUESTION_LIMIT", d.question_limit)?,
            question_window: secs("RL_QUESTION_WINDOW", d.question_window)?,
            reply_limit: env_or("RL_REPLY_LIMIT", d.reply_limit)?,
            reply_window: secs("RL_REPLY_WINDOW", d.reply_window)?,
            session_limit: env_or("RL_SESSION_LIMIT", d.session_limit)?,
            session_window: secs("RL_SESSION_WINDOW", d.session_window)?,
        })
    }
}

/// High level guard used by handlers, keyed by client address.
#[derive(Clone)]
pub struct RateLimiterFacade {
    pub limiter: InMemoryRateLimiter,
    pub cfg: RateLimitConfig,
}

impl RateLimiterFacade {
    pub fn new(limiter: InMemoryRateLimiter, cfg: RateLimitConfig) -> Self { Self { limiter, cfg } }
    pub fn allow_search(&self, client: &str) -> bool { self.limiter.check(&format!("search:{client}"), self.cfg.search_limit, self.cfg.search_window) }
    pub fn allow_question(&self, client: &str) -> bool { self.limiter.check(&format!("question:{client}"), self.cfg.question_limit, self.cfg.question_window) }
    pub fn allow_reply(&self, client: &str) -> bool { self.limiter.check(&format!("reply:{client}"), self.cfg.reply_limit, self.cfg.reply_window) }
    pub fn allow_session(&self, client: &str) -> bool { self.limiter.check(&format!("session:{client}"), self.cfg.session_limit, self.cfg.session_window) }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn sliding_window_basic() {
        let rl = InMemoryRateLimiter::new(true);
        let window = Duration::from_millis(50);
        for _ in 0..3 { assert!(rl.check("k", 3, window)); }
        assert!(!rl.check("k", 3, window));
    }

    #[test]
    fn disabled_limiter_allows_everything() {
        let rl = InMemoryRateLimiter::new(false);
        for _ in 0..10 { assert!(rl.check("k", 1, Duration::from_secs(60))); }
    }

    #[test]
    fn actions_are_counted_separately() {
        let cfg = RateLimitConfig { search_limit: 1, question_limit: 1, reply_limit: 1, session_limit: 1, ..Default::default() };
        let rl = RateLimiterFacade::new(InMemoryRateLimiter::new(true), cfg);
        assert!(rl.allow_search("1.2.3.4"));
        assert!(!rl.allow_search("1.2.3.4"));
        assert!(rl.allow_question("1.2.3.4"));
        assert!(rl.allow_reply("1.2.3.4"));
        assert!(rl.allow_session("1.2.3.4"));
        assert!(!rl.allow_session("1.2.3.4"));
        assert!(rl.allow_search("5.6.7.8"));
    }
}
