//! Version 1 of the on-disk policy document format.

use foldhash::{HashMap, HashSet};
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::model::{Allowance, Document, HardLock};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct Spec {
    #[serde(default)]
    pub shield: bool,
    #[serde(default)]
    pub blocklist: Vec<String>,
    #[serde(default)]
    pub delay_list: Vec<String>,
    #[serde(default)]
    pub allowances: Vec<AllowanceSpec>,
    #[serde(default)]
    pub locks: Vec<LockSpec>,
    #[serde(default)]
    pub delay_sessions: Vec<DelaySessionSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct AllowanceSpec {
    pub domain: String,
    pub granted_at: i64,
    pub expires_at: i64,
    pub granted_minutes: u32,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LockSpec {
    pub domain: String,
    pub until: Date,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct DelaySessionSpec {
    pub domain: String,
    pub access_count_today: u32,
    pub last_reset_date: Date,
    pub last_access_at: i64,
}

impl Spec {
    pub fn parse(self) -> Document {
        let mut allowances = HashMap::default();
        for a in self.allowances {
            allowances.insert(
                a.domain.clone(),
                Allowance {
                    domain: a.domain,
                    granted_at: a.granted_at,
                    expires_at: a.expires_at,
                    granted_minutes: a.granted_minutes,
                    reason: a.reason,
                },
            );
        }

        let mut locks = HashMap::default();
        for l in self.locks {
            locks.insert(l.domain.clone(), HardLock { domain: l.domain, until: l.until });
        }

        let mut delay_sessions = HashMap::default();
        for s in self.delay_sessions {
            delay_sessions.insert(
                s.domain.clone(),
                crate::delay::DelaySession {
                    access_count_today: s.access_count_today,
                    last_reset_date: s.last_reset_date,
                    last_access_at: s.last_access_at,
                },
            );
        }

        let blocklist: HashSet<String> = self.blocklist.into_iter().collect();
        let delay_list: HashSet<String> = self.delay_list.into_iter().collect();

        Document { shield: self.shield, blocklist, delay_list, allowances, locks, delay_sessions }
    }

    pub fn build(doc: &Document) -> Self {
        let mut blocklist: Vec<String> = doc.blocklist.iter().cloned().collect();
        blocklist.sort();
        let mut delay_list: Vec<String> = doc.delay_list.iter().cloned().collect();
        delay_list.sort();

        let mut allowances: Vec<AllowanceSpec> = doc
            .allowances
            .values()
            .map(|a| AllowanceSpec {
                domain: a.domain.clone(),
                granted_at: a.granted_at,
                expires_at: a.expires_at,
                granted_minutes: a.granted_minutes,
                reason: a.reason.clone(),
            })
            .collect();
        allowances.sort_by(|a, b| a.domain.cmp(&b.domain));

        let mut locks: Vec<LockSpec> = doc
            .locks
            .values()
            .map(|l| LockSpec { domain: l.domain.clone(), until: l.until })
            .collect();
        locks.sort_by(|a, b| a.domain.cmp(&b.domain));

        let mut delay_sessions: Vec<DelaySessionSpec> = doc
            .delay_sessions
            .iter()
            .map(|(domain, s)| DelaySessionSpec {
                domain: domain.clone(),
                access_count_today: s.access_count_today,
                last_reset_date: s.last_reset_date,
                last_access_at: s.last_access_at,
            })
            .collect();
        delay_sessions.sort_by(|a, b| a.domain.cmp(&b.domain));

        Spec { shield: doc.shield, blocklist, delay_list, allowances, locks, delay_sessions }
    }
}
