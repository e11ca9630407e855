use crate::error::{OrglangError, Result};
use crate::signal::Interrupt;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Quota state reported in the `X-RateLimit-*` response headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub limit: Option<u64>,
    pub remaining: u64,
    /// Epoch seconds at which the quota refills.
    pub reset: i64,
}

impl RateLimitStatus {
    /// Build from raw header values. Both `remaining` and `reset` must be
    /// present and numeric.
    pub fn from_headers(
        limit: Option<&str>,
        remaining: Option<&str>,
        reset: Option<&str>,
    ) -> Option<Self> {
        let remaining = remaining?.trim().parse::<u64>().ok()?;
        let reset = reset?.trim().parse::<i64>().ok()?;
        let limit = limit.and_then(|v| v.trim().parse::<u64>().ok());
        Some(Self {
            limit,
            remaining,
            reset,
        })
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    pub fn reset_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.reset, 0)
    }

    /// Time left until the reset, or `None` when the reset is already past.
    pub fn wait_from(&self, now: DateTime<Utc>) -> Option<Duration> {
        let wait = self.reset_at()? - now;
        wait.to_std().ok().filter(|d| !d.is_zero())
    }

    pub fn describe_reset(&self) -> String {
        self.reset_at()
            .map(|dt| dt.format("%H:%M:%S UTC").to_string())
            .unwrap_or_else(|| self.reset.to_string())
    }
}

/// Sleep for `wait`, returning early with `Interrupted` if `interrupt`
/// resolves first.
pub async fn sleep_until_reset(wait: Duration, interrupt: Interrupt) -> Result<()> {
    tokio::select! {
        _ = tokio::time::sleep(wait) => Ok(()),
        _ = interrupt => Err(OrglangError::Interrupted),
    }
}
