//! In-memory representation of the policy document.

use foldhash::{HashMap, HashSet};
use jiff::civil::Date;

use crate::delay::DelaySession;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Allowance {
    pub domain: String,
    pub granted_at: i64,
    pub expires_at: i64,
    pub granted_minutes: u32,
    pub reason: Option<String>,
}

impl Allowance {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn remaining_minutes(&self, now: i64) -> u32 {
        if self.is_expired(now) {
            return 0;
        }
        let remaining_secs = self.expires_at - now;
        (remaining_secs + 59).div_euclid(60).max(0) as u32
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HardLock {
    pub domain: String,
    pub until: Date,
}

/// The full authoritative policy document: one field per entity in the
/// data model, plus the shield flag.
#[derive(Clone, Debug, Default)]
pub struct Document {
    pub shield: bool,
    pub blocklist: HashSet<String>,
    pub delay_list: HashSet<String>,
    pub allowances: HashMap<String, Allowance>,
    pub locks: HashMap<String, HardLock>,
    pub delay_sessions: HashMap<String, DelaySession>,
}
