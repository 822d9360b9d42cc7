use std::time::Duration;

use rand::Rng;

/// Pause between consecutive items: `delay` plus a uniform offset in
/// `[-jitter, +jitter]`, never below zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PacingConfig {
    pub delay: Duration,
    pub jitter: Duration,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(4),
            jitter: Duration::from_secs(2),
        }
    }
}

impl PacingConfig {
    pub fn none() -> Self {
        Self {
            delay: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Build from seconds as typed by a user; negative or non-finite values are rejected
    pub fn from_secs(delay: f64, jitter: f64) -> Option<Self> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if !valid(delay) || !valid(jitter) {
            return None;
        }
        Some(Self {
            delay: Duration::from_secs_f64(delay),
            jitter: Duration::from_secs_f64(jitter),
        })
    }

    pub fn next_pause(&self) -> Duration {
        let jitter = self.jitter.as_secs_f64();
        let offset = if jitter > 0.0 {
            rand::thread_rng().gen_range(-jitter..=jitter)
        } else {
            0.0
        };
        Duration::from_secs_f64((self.delay.as_secs_f64() + offset).max(0.0))
    }
}
