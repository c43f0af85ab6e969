use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use crate::rate_limit::RateLimitConfig;

/// Reads `name`, falling back to `default` when unset. A set but unparsable value is an error.
pub(crate) fn env_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("invalid value for {name}: '{raw}'")),
        Err(_) => Ok(default),
    }
}

pub(crate) fn flag_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub(crate) fn millis_env(name: &str, default_ms: u64) -> anyhow::Result<Duration> {
    env_or(name, default_ms).map(Duration::from_millis)
}

/// Simulated latencies of the three mock asynchronous operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Latency {
    pub search: Duration,
    pub reply: Duration,
    pub redirect: Duration,
}

impl Default for Latency {
    fn default() -> Self {
        Self {
            search: Duration::from_millis(800),
            reply: Duration::from_millis(1000),
            redirect: Duration::from_millis(2000),
        }
    }
}

impl Latency {
    pub fn none() -> Self {
        Self { search: Duration::ZERO, reply: Duration::ZERO, redirect: Duration::ZERO }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        Ok(Self {
            search: millis_env("SEARCH_DELAY_MS", d.search.as_millis() as u64)?,
            reply: millis_env("REPLY_DELAY_MS", d.reply.as_millis() as u64)?,
            redirect: millis_env("REDIRECT_DELAY_MS", d.redirect.as_millis() as u64)?,
        })
    }
}

/// Bounds on the in-memory session store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionLimits {
    pub max_live: usize,
    pub idle_ttl: Duration,
}

impl Default for SessionLimits {
    fn default() -> Self {
        Self { max_live: 10_000, idle_ttl: Duration::from_secs(30 * 60) }
    }
}

impl SessionLimits {
    pub fn from_env() -> anyhow::Result<Self> {
        let d = Self::default();
        let limits = Self {
            max_live: env_or("SESSION_MAX_LIVE", d.max_live)?,
            idle_ttl: env_or("SESSION_IDLE_SECS", d.idle_ttl.as_secs()).map(Duration::from_secs)?,
        };
        anyhow::ensure!(limits.max_live > 0, "SESSION_MAX_LIVE must be at least 1");
        Ok(limits)
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub frontend_url: Option<String>,
    pub enable_hsts: bool,
    pub latency: Latency,
    pub sessions: SessionLimits,
    pub rate_limit_enabled: bool,
    pub rate_limits: RateLimitConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080".to_string())?,
            frontend_url: std::env::var("FRONTEND_URL").ok().filter(|u| !u.is_empty()),
            enable_hsts: flag_env("ENABLE_HSTS"),
            latency: Latency::from_env()?,
            sessions: SessionLimits::from_env()?,
            rate_limit_enabled: flag_env("RATE_LIMIT_ENABLED"),
            rate_limits: RateLimitConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn latency_defaults_and_overrides() {
        std::env::remove_var("SEARCH_DELAY_MS");
        std::env::set_var("REPLY_DELAY_MS", "5");
        let l = Latency::from_env().unwrap();
        assert_eq!(l.search, Duration::from_millis(800));
        assert_eq!(l.reply, Duration::from_millis(5));
        assert_eq!(l.redirect, Duration::from_millis(2000));
        std::env::remove_var("REPLY_DELAY_MS");
    }

    #[test]
    #[serial]
    fn session_limits_from_env() {
        std::env::set_var("SESSION_MAX_LIVE", "50");
        std::env::remove_var("SESSION_IDLE_SECS");
        let l = SessionLimits::from_env().unwrap();
        assert_eq!(l.max_live, 50);
        assert_eq!(l.idle_ttl, Duration::from_secs(1800));

        std::env::set_var("SESSION_MAX_LIVE", "0");
        assert!(SessionLimits::from_env().is_err());
        std::env::remove_var("SESSION_MAX_LIVE");
    }

    #[test]
    #[serial]
    fn garbage_numbers_are_rejected() {
        std::env::set_var("REDIRECT_DELAY_MS", "soon");
        let err = Latency::from_env().unwrap_err();
        assert!(err.to_string().contains("REDIRECT_DELAY_MS"));
        std::env::remove_var("REDIRECT_DELAY_MS");
    }
}
