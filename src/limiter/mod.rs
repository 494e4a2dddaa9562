//! Request rate limiting with adaptive backoff.
//!
//! # States
//! - Normal: requests pass the gate immediately
//! - Limited: the window threshold was hit or the remote reported overload;
//!   the gate delays callers and the backoff multiplier grows
//!
//! # State Transitions
//! ```text
//! Normal → Limited: request count reaches the window threshold,
//!                   or report_overload() (explicit remote 429 signal)
//! Limited → Normal: a full counting window passes with no limiting event;
//!                   count and multiplier reset to 0 / 1
//! ```
//!
//! # Design Decisions
//! - One process-local instance, constructor-injected (no ambient global)
//! - acquire() never fails, it only delays; the delay is computed under the
//!   lock and slept outside it
//! - Multiplier doubling is capped so the per-call delay never exceeds
//!   max_backoff regardless of how long the overload episode lasts

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::schema::RateLimitConfig;
use crate::observability::metrics;

/// Mutable window state. Guarded by the limiter's mutex.
#[derive(Debug)]
struct WindowState {
    /// Requests admitted in the current window.
    count: u32,
    /// When the current window ends.
    window_reset_at: Instant,
    /// Backoff scaling factor, 1 when healthy. Monotonically non-decreasing
    /// within a limited episode.
    multiplier: u32,
    /// Whether a limiting event occurred in the current window.
    limited: bool,
}

/// Point-in-time limiter snapshot for observability.
#[derive(Debug, Clone, Copy)]
pub struct LimiterStats {
    pub requests_in_window: u32,
    pub backoff_multiplier: u32,
    pub limited: bool,
    pub window_resets_in: Duration,
}

/// Sliding-window rate limiter gating all outbound RPC calls.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    state: Mutex<WindowState>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let state = WindowState {
            count: 0,
            window_reset_at: Instant::now() + config.window(),
            multiplier: 1,
            limited: false,
        };
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Gate every outbound call must pass before hitting the network.
    ///
    /// If the window threshold has been reached the caller is suspended for
    /// `min(multiplier × base_backoff, max_backoff)` and the multiplier is
    /// doubled (capped). The request counter is always incremented on exit,
    /// including after waiting.
    pub async fn acquire(&self) {
        let delay = {
            let mut state = self.state.lock().expect("limiter mutex poisoned");
            let now = Instant::now();
            self.roll_window(&mut state, now);

            if state.count >= self.config.max_requests_per_window {
                state.limited = true;
                let delay = self.current_delay(state.multiplier);
                state.multiplier = self.bump_multiplier(state.multiplier);
                Some(delay)
            } else {
                None
            }
        };

        if let Some(delay) = delay {
            tracing::warn!(delay_ms = delay.as_millis() as u64, "Rate limit window full, delaying request");
            metrics::record_rate_limited("window_threshold", delay);
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().expect("limiter mutex poisoned");
        // The window may have rolled while we slept.
        self.roll_window(&mut state, Instant::now());
        state.count += 1;
    }

    /// React to an explicit "too many requests" signal from the remote.
    ///
    /// A sharper reaction than organic threshold crossing: the window reset
    /// is pushed a full window forward so the Limited episode cannot end on
    /// the next boundary.
    pub fn report_overload(&self) {
        let mut state = self.state.lock().expect("limiter mutex poisoned");
        let now = Instant::now();
        self.roll_window(&mut state, now);

        state.limited = true;
        state.multiplier = self.bump_multiplier(state.multiplier);
        state.window_reset_at = now + self.config.window();

        tracing::warn!(
            multiplier = state.multiplier,
            requests_in_window = state.count,
            "Remote reported overload, extending limited window"
        );
        metrics::record_overload_signal();
    }

    /// Snapshot of the current limiter state.
    pub fn stats(&self) -> LimiterStats {
        let mut state = self.state.lock().expect("limiter mutex poisoned");
        let now = Instant::now();
        self.roll_window(&mut state, now);
        LimiterStats {
            requests_in_window: state.count,
            backoff_multiplier: state.multiplier,
            limited: state.limited,
            window_resets_in: state.window_reset_at.saturating_duration_since(now),
        }
    }

    /// Roll the counting window if `now` has passed its boundary.
    ///
    /// The fresh boundary is one window ahead of `now`, so an idle limiter
    /// does not replay missed windows. The multiplier resets to 1 only when
    /// the episode ended cleanly: either the expiring window saw no limiting
    /// event, or at least one full untouched window has passed since.
    fn roll_window(&self, state: &mut WindowState, now: Instant) {
        if now < state.window_reset_at {
            return;
        }
        let clean_window_passed =
            !state.limited || now >= state.window_reset_at + self.config.window();
        state.count = 0;
        state.limited = false;
        if clean_window_passed {
            state.multiplier = 1;
        }
        state.window_reset_at = now + self.config.window();
    }

    fn current_delay(&self, multiplier: u32) -> Duration {
        let base = self.config.base_backoff();
        let scaled = base.saturating_mul(multiplier);
        scaled.min(self.config.max_backoff())
    }

    fn bump_multiplier(&self, multiplier: u32) -> u32 {
        multiplier
            .saturating_mul(2)
            .min(self.config.max_backoff_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RateLimitConfig {
        RateLimitConfig {
            max_requests_per_window: 5,
            window_secs: 60,
            base_backoff_ms: 2_000,
            max_backoff_ms: 30_000,
            max_backoff_multiplier: 16,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_under_threshold_no_delay() {
        let limiter = RateLimiter::new(test_config());
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        // With the paused clock, time only moves if something slept.
        assert_eq!(Instant::now(), start);
        let stats = limiter.stats();
        assert_eq!(stats.requests_in_window, 5);
        assert_eq!(stats.backoff_multiplier, 1);
        assert!(!stats.limited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_threshold_crossing_delays() {
        let limiter = RateLimiter::new(test_config());
        for _ in 0..5 {
            limiter.acquire().await;
        }
        let start = Instant::now();
        limiter.acquire().await;
        let waited = Instant::now() - start;
        assert!(waited >= Duration::from_millis(2_000));

        let stats = limiter.stats();
        assert!(stats.limited);
        assert_eq!(stats.backoff_multiplier, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_doubles_multiplier_capped() {
        let limiter = RateLimiter::new(test_config());
        limiter.report_overload();
        assert_eq!(limiter.stats().backoff_multiplier, 2);
        limiter.report_overload();
        assert_eq!(limiter.stats().backoff_multiplier, 4);

        for _ in 0..10 {
            limiter.report_overload();
        }
        let stats = limiter.stats();
        assert_eq!(stats.backoff_multiplier, 16);
        assert!(stats.limited);

        // Even at the cap the computed delay stays within max_backoff.
        let delay = limiter.current_delay(stats.backoff_multiplier);
        assert!(delay <= Duration::from_millis(30_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clean_window_resets() {
        let limiter = RateLimiter::new(test_config());
        for _ in 0..6 {
            limiter.acquire().await;
        }
        assert!(limiter.stats().limited);

        // Sit out the pushed-forward window plus one clean window.
        tokio::time::advance(Duration::from_secs(121)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(Instant::now(), start);

        let stats = limiter.stats();
        assert_eq!(stats.backoff_multiplier, 1);
        assert_eq!(stats.requests_in_window, 1);
        assert!(!stats.limited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overload_pushes_window_forward() {
        let limiter = RateLimiter::new(test_config());
        tokio::time::advance(Duration::from_secs(50)).await;
        limiter.report_overload();
        // Boundary moved a full window ahead of now, not 10s ahead.
        let stats = limiter.stats();
        assert!(stats.window_resets_in > Duration::from_secs(59));
    }

    #[tokio::test(start_paused = true)]
    async fn test_multiplier_survives_single_limited_rollover() {
        let limiter = RateLimiter::new(test_config());
        limiter.report_overload();
        limiter.report_overload();
        assert_eq!(limiter.stats().backoff_multiplier, 4);

        // Exactly one window passes; the window that just ended was limited,
        // so the multiplier holds until a clean window goes by.
        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.stats().backoff_multiplier, 4);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(limiter.stats().backoff_multiplier, 1);
    }
}
