//! Progressive-delay friction math for the delay list.
//!
//! The policy store only tracks the bookkeeping (`DelaySession`); the
//! actual friction page belongs to the interception proxy, a separate
//! component.

use jiff::civil::Date;
use jiff::Zoned;
use serde::{Deserialize, Serialize};

/// Idle-rolling free-passage window after a delay has been served.
pub const SESSION_WINDOW_SECS: i64 = 15 * 60;

/// Required wait, in seconds, for the `n`th access of a delayed domain
/// today (`n` is the prior access count, zero-based).
pub fn wait_seconds(prior_access_count: u32) -> u64 {
    let exp = prior_access_count.min(63);
    10u64.saturating_mul(1u64 << exp).min(160)
}

/// Per-domain bookkeeping for the friction path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelaySession {
    pub access_count_today: u32,
    pub last_reset_date: Date,
    pub last_access_at: i64,
}

impl DelaySession {
    pub fn new(now: &Zoned) -> Self {
        DelaySession {
            access_count_today: 0,
            last_reset_date: now.date(),
            last_access_at: now.timestamp().as_second(),
        }
    }

    /// Resets the counter if local midnight has passed since the last
    /// access, then returns the wait required for this access and bumps
    /// the counter.
    pub fn record_access(&mut self, now: &Zoned) -> u64 {
        if now.date() != self.last_reset_date {
            self.access_count_today = 0;
            self.last_reset_date = now.date();
        }
        let wait = wait_seconds(self.access_count_today);
        self.access_count_today += 1;
        self.last_access_at = now.timestamp().as_second();
        wait
    }

    /// True if this access falls within the idle-rolling free-passage
    /// window of the previous one.
    pub fn within_session(&self, now: &Zoned) -> bool {
        now.timestamp().as_second() - self.last_access_at <= SESSION_WINDOW_SECS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_doubles_and_caps() {
        assert_eq!(wait_seconds(0), 10);
        assert_eq!(wait_seconds(1), 20);
        assert_eq!(wait_seconds(2), 40);
        assert_eq!(wait_seconds(3), 80);
        assert_eq!(wait_seconds(4), 160);
        assert_eq!(wait_seconds(5), 160);
        assert_eq!(wait_seconds(20), 160);
    }
}
