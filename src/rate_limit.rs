use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use dashmap::DashMap;

/// Checks between sweeps of idle keys.
const SWEEP_EVERY: usize = 1024;

#[derive(Debug, Default)]
struct Hits {
    window: Duration,
    at: VecDeque<Instant>,
}

impl Hits {
    fn prune(&mut self, now: Instant) {
        while let Some(front) = self.at.front() {
            if now.duration_since(*front) >= self.window { self.at.pop_front(); } else { break; }
        }
    }
}

/// Sliding window in-memory rate limiter (process local).
#[derive(Clone)]
pub struct InMemoryRateLimiter {
    store: Arc<DashMap<String, Hits>>,
    checks: Arc<AtomicUsize>,
    pub enabled: bool,
}

impl InMemoryRateLimiter {
    pub fn new(enabled: bool) -> Self {
        Self { store: Arc::new(DashMap::new()), checks: Arc::new(AtomicUsize::new(0)), enabled }
    }

    /// Returns true if allowed, false if limited.
    pub fn check(&self, key: &str, limit: usize, window: Duration) -> bool {
        self.check_at(key, limit, window, Instant::now())
    }

    fn check_at(&self, key: &str, limit: usize, window: Duration, now: Instant) -> bool {
        if !self.enabled { return true; }
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            self.sweep_at(now);
        }
        let mut entry = self.store.entry(key.to_string()).or_default();
        entry.window = window;
        entry.prune(now);
        if entry.at.len() < limit {
            entry.at.push_back(now);
            true
        } else {
            false
        }
    }

    /// Drops keys with no hits left inside their window.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        self.store.retain(|_, hits| {
            hits.prune(now);
            !hits.at.is_empty()
        });
    }

    /// Number of tracked keys.
    pub fn tracked(&self) -> usize {
        self.store.len()
    }
}

/// Write actions a visitor can be throttled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limited {
    Story,
    Comment,
    Upload,
    Like,
}

impl Limited {
    fn key(&self) -> &'static str {
        match self {
            Limited::Story => "story",
            Limited::Comment => "comment",
            Limited::Upload => "upload",
            Limited::Like => "like",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Quota {
    pub limit: usize,
    pub window: Duration,
}

/// Per-action quotas derived from `RL_*` variables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub story: Quota,
    pub comment: Quota,
    pub upload: Quota,
    pub like: Quota,
    /// Key clients by `X-Forwarded-For` / `Forwarded` instead of the socket
    /// peer. Only safe behind a proxy that overwrites those headers.
    pub trust_proxy: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let quota = |name: &str, limit: usize, window_secs: u64| Quota {
            limit: get(&format!("RL_{name}_LIMIT")).and_then(|v| v.parse().ok()).unwrap_or(limit),
            window: Duration::from_secs(
                get(&format!("RL_{name}_WINDOW")).and_then(|v| v.parse().ok()).unwrap_or(window_secs),
            ),
        };
        Self {
            story: quota("STORY", 5, 600),
            comment: quota("COMMENT", 20, 60),
            upload: quota("UPLOAD", 10, 3600),
            like: quota("LIKE", 60, 60),
            trust_proxy: matches!(
                get("RL_TRUST_PROXY").as_deref().map(str::trim),
                Some("1") | Some("true") | Some("on") | Some("yes")
            ),
        }
    }

    pub fn quota(&self, action: Limited) -> Quota {
        match action {
            Limited::Story => self.story,
            Limited::Comment => self.comment,
            Limited::Upload => self.upload,
            Limited::Like => self.like,
        }
    }
}

/// High level guard used by handlers.
#[derive(Clone)]
pub struct RateLimiterFacade {
    pub limiter: InMemoryRateLimiter,
    pub cfg: RateLimitConfig,
}

impl RateLimiterFacade {
    pub fn new(limiter: InMemoryRateLimiter, cfg: RateLimitConfig) -> Self { Self { limiter, cfg } }

    pub fn allow(&self, action: Limited, ip: &str) -> bool {
        let q = self.cfg.quota(action);
        self.limiter.check(&format!("{}:{ip}", action.key()), q.limit, q.window)
    }
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
    fn window_slides_forward() {
        let rl = InMemoryRateLimiter::new(true);
        let t0 = Instant::now();
        let window = Duration::from_secs(10);
        assert!(rl.check_at("k", 1, window, t0));
        assert!(!rl.check_at("k", 1, window, t0 + Duration::from_secs(9)));
        assert!(rl.check_at("k", 1, window, t0 + Duration::from_secs(10)));
    }

    #[test]
    fn disabled_limiter_allows_everything() {
        let rl = InMemoryRateLimiter::new(false);
        for _ in 0..10 { assert!(rl.check("k", 1, Duration::from_secs(60))); }
    }

    #[test]
    fn actions_and_clients_are_counted_separately() {
        let cfg = RateLimitConfig::from_lookup(|name| (name == "RL_COMMENT_LIMIT").then(|| "1".to_string()));
        assert_eq!(cfg.comment.limit, 1);
        assert_eq!(cfg.story, RateLimitConfig::default().story);
        let facade = RateLimiterFacade::new(InMemoryRateLimiter::new(true), cfg);
        assert!(facade.allow(Limited::Comment, "1.1.1.1"));
        assert!(!facade.allow(Limited::Comment, "1.1.1.1"));
        assert!(facade.allow(Limited::Comment, "2.2.2.2"));
        assert!(facade.allow(Limited::Like, "1.1.1.1"));
        assert!(!facade.cfg.trust_proxy);
    }

    #[test]
    fn idle_keys_are_swept() {
        let rl = InMemoryRateLimiter::new(true);
        let t0 = Instant::now();
        assert!(rl.check_at("a", 5, Duration::from_secs(10), t0));
        assert!(rl.check_at("b", 5, Duration::from_secs(60), t0));
        assert_eq!(rl.tracked(), 2);
        rl.sweep_at(t0 + Duration::from_secs(30));
        assert_eq!(rl.tracked(), 1);
        rl.sweep_at(t0 + Duration::from_secs(60));
        assert_eq!(rl.tracked(), 0);
    }

    #[test]
    fn sweep_runs_as_clients_come_and_go() {
        let rl = InMemoryRateLimiter::new(true);
        let t0 = Instant::now();
        let window = Duration::from_secs(1);
        for i in 0..SWEEP_EVERY {
            rl.check_at(&format!("client-{i}"), 1, window, t0);
        }
        assert_eq!(rl.tracked(), SWEEP_EVERY);
        let later = t0 + Duration::from_secs(5);
        for i in 0..SWEEP_EVERY {
            rl.check_at(&format!("late-{i}"), 1, window, later);
        }
        // the last check swept every expired client-* key
        assert_eq!(rl.tracked(), SWEEP_EVERY);
    }

    #[test]
    fn trust_proxy_is_opt_in() {
        assert!(RateLimitConfig::from_lookup(|n| (n == "RL_TRUST_PROXY").then(|| "true".to_string())).trust_proxy);
        assert!(!RateLimitConfig::from_lookup(|n| (n == "RL_TRUST_PROXY").then(|| "0".to_string())).trust_proxy);
    }
}
