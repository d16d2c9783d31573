use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

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
        if !self.enabled {
            return true;
        }
        let now = Instant::now();
        let mut entry = self.store.entry(key.to_string()).or_default();
        while let Some(front) = entry.front() {
            if now.duration_since(*front) >= window {
                entry.pop_front();
            } else {
                break;
            }
        }
        if entry.len() < limit {
            entry.push_back(now);
            true
        } else {
            false
        }
    }
}

/// Per-action limits for the write-heavy endpoints, derived from env.
#[derive(Clone, Debug)]
pub struct RateLimitConfig {
    pub question_limit: usize,
    pub question_window: Duration,
    pub reply_limit: usize,
    pub reply_window: Duration,
    pub request_limit: usize,
    pub request_window: Duration,
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        fn usize_env(name: &str, default: usize) -> usize {
            std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
        }
        fn dur_env(name: &str, default: u64) -> Duration {
            Duration::from_secs(std::env::var(name).ok().and_then(|v| v.parse().ok()).unwrap_or(default))
        }
        Self {
            question_limit: usize_env("ASCEND_RL_QUESTION_LIMIT", 5),
            question_window: dur_env("ASCEND_RL_QUESTION_WINDOW", 300),
            reply_limit: usize_env("ASCEND_RL_REPLY_LIMIT", 10),
            reply_window: dur_env("ASCEND_RL_REPLY_WINDOW", 60),
            request_limit: usize_env("ASCEND_RL_REQUEST_LIMIT", 3),
            request_window: dur_env("ASCEND_RL_REQUEST_WINDOW", 3600),
        }
    }
}

/// High level guard used by handlers; keys are user ids.
#[derive(Clone)]
pub struct RateLimiterFacade {
    pub limiter: InMemoryRateLimiter,
    pub cfg: RateLimitConfig,
}

impl RateLimiterFacade {
    pub fn new(limiter: InMemoryRateLimiter, cfg: RateLimitConfig) -> Self {
        Self { limiter, cfg }
    }

    /// Pass-through facade for tests and setups without limiting.
    pub fn disabled() -> Self {
        Self::new(InMemoryRateLimiter::new(false), RateLimitConfig::from_env())
    }

    pub fn allow_question(&self, user: &str) -> bool {
        self.limiter.check(&format!("question:{user}"), self.cfg.question_limit, self.cfg.question_window)
    }

    pub fn allow_reply(&self, user: &str) -> bool {
        self.limiter.check(&format!("reply:{user}"), self.cfg.reply_limit, self.cfg.reply_window)
    }

    pub fn allow_request(&self, user: &str) -> bool {
        self.limiter.check(&format!("request:{user}"), self.cfg.request_limit, self.cfg.request_window)
    }
}
