//! Timestamp-based replay protection.

use std::time::Duration;

use crate::error::{WebhookError, WebhookResult};

/// Default tolerance: five minutes either side of server time.
pub const DEFAULT_TOLERANCE: Duration = Duration::from_secs(300);

/// Accepts a timestamp iff `|now - timestamp| <= tolerance` (epoch seconds).
///
/// Both directions are bounded, so pre-computed future timestamps are
/// rejected as well as stale ones.
pub fn is_fresh(timestamp: i64, now: i64, tolerance: Duration) -> bool {
    let skew = (i128::from(now) - i128::from(timestamp)).abs();
    skew <= i128::from(tolerance.as_secs())
}

/// Parses a timestamp header value into epoch seconds.
///
/// Fractional seconds are accepted and truncated toward zero. Returns `None`
/// for empty, non-numeric or non-finite input.
pub fn parse_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(secs) = raw.parse::<i64>() {
        return Some(secs);
    }

    let secs = raw.parse::<f64>().ok().filter(|v| v.is_finite())?.trunc();
    if secs < i64::MIN as f64 || secs >= i64::MAX as f64 {
        return None;
    }
    Some(secs as i64)
}

/// Replay guard with a fixed tolerance window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplayGuard {
    tolerance: Duration,
}

impl ReplayGuard {
    /// Creates a guard; the tolerance must be at least one second.
    pub fn new(tolerance: Duration) -> WebhookResult<Self> {
        if tolerance.as_secs() == 0 {
            return Err(WebhookError::InvalidTolerance);
        }
        Ok(Self { tolerance })
    }

    /// Creates a guard from a tolerance in seconds.
    pub fn from_secs(secs: u64) -> WebhookResult<Self> {
        Self::new(Duration::from_secs(secs))
    }

    /// Returns the tolerance window.
    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    /// Checks a timestamp against an explicit server time.
    pub fn check(&self, timestamp: i64, now: i64) -> bool {
        is_fresh(timestamp, now, self.tolerance)
    }

    /// Checks a timestamp against the current server time.
    pub fn check_now(&self, timestamp: i64) -> bool {
        self.check(timestamp, chrono::Utc::now().timestamp())
    }
}

impl Default for ReplayGuard {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}
