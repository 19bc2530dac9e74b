//! The mutation and query surface over the authoritative policy document.
//!
//! Every mutating method here acquires the single document mutex, mutates
//! in memory, and synchronously writes the new document to disk (temp +
//! rename) before releasing the lock and returning — there is no
//! debounced save window a crash could land inside.

use camino::{Utf8Path, Utf8PathBuf};
use jiff::civil::Date;
use jiff::Timestamp;
use std::sync::Mutex;

use crate::categories::Category;
use crate::delay;
use crate::domain;
use crate::error::PolicyError;
use crate::file;
use crate::model::{Allowance, Document, HardLock};

pub struct Store {
    path: Utf8PathBuf,
    inner: Mutex<Document>,
}

impl Store {
    /// Load the document at `path`, or initialize it with the given
    /// default categories if no file exists yet, persisting it either way.
    pub fn load(path: Utf8PathBuf, default_categories: &[Category]) -> Result<Store, PolicyError> {
        let doc = if Utf8Path::new(&path).exists() {
            file::Spec::load(&path)?.parse()
        } else {
            let mut doc = Document { shield: true, ..Document::default() };
            doc.blocklist = crate::categories::seed_domains(default_categories).into_iter().collect();
            doc
        };

        let store = Store { path, inner: Mutex::new(doc) };
        store.persist(&store.inner.lock().unwrap())?;
        Ok(store)
    }

    fn persist(&self, doc: &Document) -> Result<(), PolicyError> {
        file::Spec::build(doc).save(&self.path)
    }

    fn now() -> i64 {
        Timestamp::now().as_second()
    }

    fn today() -> Date {
        jiff::Zoned::now().date()
    }

    // --- Queries ---------------------------------------------------------

    /// The hard lock covering `domain`, if one is currently active.
    pub fn hard_lock(&self, domain: &str) -> Option<HardLock> {
        let today = Self::today();
        let doc = self.inner.lock().unwrap();
        doc.locks
            .values()
            .find(|l| l.until >= today && domain::matches(domain, &l.domain))
            .cloned()
    }

    pub fn is_blocked(&self, query: &str) -> Result<bool, PolicyError> {
        let query = domain::normalize(query)?;
        let now = Self::now();
        let doc = self.inner.lock().unwrap();
        Ok(Self::is_blocked_locked(&doc, &query, now))
    }

    fn is_blocked_locked(doc: &Document, query: &str, now: i64) -> bool {
        if !doc.shield {
            return false;
        }
        let blocked_by_list = doc.blocklist.iter().any(|p| domain::matches(query, p));
        if !blocked_by_list {
            return false;
        }
        let allowed = doc
            .allowances
            .values()
            .any(|a| !a.is_expired(now) && domain::matches(query, &a.domain));
        !allowed
    }

    /// The blocklist with currently-allowed domains removed.
    pub fn effective_block_set(&self) -> Vec<String> {
        let now = Self::now();
        let doc = self.inner.lock().unwrap();
        if !doc.shield {
            return Vec::new();
        }
        doc.blocklist
            .iter()
            .filter(|p| !doc.allowances.values().any(|a| !a.is_expired(now) && domain::matches(p, &a.domain)))
            .cloned()
            .collect()
    }

    pub fn remaining_minutes(&self, query: &str) -> Result<u32, PolicyError> {
        let query = domain::normalize(query)?;
        let now = Self::now();
        let doc = self.inner.lock().unwrap();
        Ok(doc
            .allowances
            .values()
            .filter(|a| !a.is_expired(now) && domain::matches(&query, &a.domain))
            .map(|a| a.remaining_minutes(now))
            .max()
            .unwrap_or(0))
    }

    /// Non-expired allowances, pruning expired ones from storage as a
    /// side effect.
    pub fn active_allowances(&self) -> Result<Vec<Allowance>, PolicyError> {
        let now = Self::now();
        let mut doc = self.inner.lock().unwrap();
        let before = doc.allowances.len();
        doc.allowances.retain(|_, a| !a.is_expired(now));
        if doc.allowances.len() != before {
            self.persist(&doc)?;
        }
        Ok(doc.allowances.values().cloned().collect())
    }

    /// Non-expired hard lockouts, pruning expired ones from storage.
    pub fn active_locks(&self) -> Result<Vec<HardLock>, PolicyError> {
        let today = Self::today();
        let mut doc = self.inner.lock().unwrap();
        let before = doc.locks.len();
        doc.locks.retain(|_, l| l.until >= today);
        if doc.locks.len() != before {
            self.persist(&doc)?;
        }
        Ok(doc.locks.values().cloned().collect())
    }

    pub fn shield_enabled(&self) -> bool {
        self.inner.lock().unwrap().shield
    }

    pub fn blocked_count(&self) -> usize {
        self.inner.lock().unwrap().blocklist.len()
    }

    pub fn delay_list(&self) -> Vec<String> {
        self.inner.lock().unwrap().delay_list.iter().cloned().collect()
    }

    // --- Mutations ---------------------------------------------------------

    pub fn add_block(&self, raw_domain: &str) -> Result<String, PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        let mut doc = self.inner.lock().unwrap();
        doc.blocklist.insert(canonical.clone());
        self.persist(&doc)?;
        Ok(canonical)
    }

    /// Refuses if `domain` is covered by an active hard lockout.
    pub fn remove_block(&self, raw_domain: &str) -> Result<(), PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        self.refuse_if_locked(&canonical)?;
        let mut doc = self.inner.lock().unwrap();
        doc.blocklist.remove(&canonical);
        self.persist(&doc)
    }

    pub fn add_delay(&self, raw_domain: &str) -> Result<String, PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        let mut doc = self.inner.lock().unwrap();
        doc.delay_list.insert(canonical.clone());
        self.persist(&doc)?;
        Ok(canonical)
    }

    pub fn remove_delay(&self, raw_domain: &str) -> Result<(), PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        let mut doc = self.inner.lock().unwrap();
        doc.delay_list.remove(&canonical);
        doc.delay_sessions.remove(&canonical);
        self.persist(&doc)
    }

    /// Records an access to a delayed domain and returns the wait this
    /// access requires.
    pub fn record_delay_access(&self, raw_domain: &str) -> Result<u64, PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        let now = jiff::Zoned::now();
        let mut doc = self.inner.lock().unwrap();
        let session = doc
            .delay_sessions
            .entry(canonical)
            .or_insert_with(|| delay::DelaySession::new(&now));
        if session.within_session(&now) {
            return Ok(0);
        }
        let wait = session.record_access(&now);
        self.persist(&doc)?;
        Ok(wait)
    }

    /// Replaces any prior allowance for the domain. Refuses if hard-locked.
    /// `max_minutes` is the caller's cap (30 on the public surface, unbounded
    /// internally).
    pub fn grant(
        &self,
        raw_domain: &str,
        minutes: u32,
        reason: Option<String>,
        max_minutes: u32,
    ) -> Result<Allowance, PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        if minutes < 1 || minutes > max_minutes {
            return Err(PolicyError::Validation {
                message: format!("minutes must be between 1 and {max_minutes}, got {minutes}"),
            });
        }
        self.refuse_if_locked(&canonical)?;

        let now = Self::now();
        let allowance = Allowance {
            domain: canonical.clone(),
            granted_at: now,
            expires_at: now + i64::from(minutes) * 60,
            granted_minutes: minutes,
            reason,
        };

        let mut doc = self.inner.lock().unwrap();
        doc.allowances.insert(canonical, allowance.clone());
        self.persist(&doc)?;
        Ok(allowance)
    }

    /// Drops the allowance, if any. Returns whether one existed.
    pub fn revoke(&self, raw_domain: &str) -> Result<bool, PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        let mut doc = self.inner.lock().unwrap();
        let existed = doc.allowances.remove(&canonical).is_some();
        self.persist(&doc)?;
        Ok(existed)
    }

    pub fn set_shield(&self, enabled: bool) -> Result<(), PolicyError> {
        let mut doc = self.inner.lock().unwrap();
        doc.shield = enabled;
        self.persist(&doc)
    }

    /// Turns the shield off and drops all allowances.
    pub fn clear(&self) -> Result<(), PolicyError> {
        let mut doc = self.inner.lock().unwrap();
        doc.shield = false;
        doc.allowances.clear();
        self.persist(&doc)
    }

    /// Installs a hard lockout. Not reachable from the public API surface;
    /// only by direct document edit or a privileged caller, per design.
    pub fn add_lock(&self, raw_domain: &str, until: Date) -> Result<(), PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        let mut doc = self.inner.lock().unwrap();
        doc.locks.insert(canonical.clone(), HardLock { domain: canonical, until });
        self.persist(&doc)
    }

    /// Removes a lockout entry, but refuses while it is still active: a
    /// lockout cannot be lifted through the control API, only by direct
    /// edit of the persisted file. A no-op against an already-expired or
    /// absent lockout always succeeds.
    pub fn remove_lock(&self, raw_domain: &str) -> Result<(), PolicyError> {
        let canonical = domain::normalize(raw_domain)?;
        self.refuse_if_locked(&canonical)?;
        let mut doc = self.inner.lock().unwrap();
        doc.locks.remove(&canonical);
        self.persist(&doc)
    }

    fn refuse_if_locked(&self, canonical: &str) -> Result<(), PolicyError> {
        if let Some(lock) = self.hard_lock(canonical) {
            return Err(PolicyError::LockoutRefusal {
                domain: canonical.to_string(),
                locked_until: lock.until.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_store() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("policy.toml")).unwrap();
        let store = Store::load(path, &[]).unwrap();
        (dir, store)
    }

    #[test]
    fn fresh_store_with_no_categories_is_shielded_and_empty() {
        let (_dir, store) = tmp_store();
        assert!(store.shield_enabled());
        assert_eq!(store.blocked_count(), 0);
    }

    #[test]
    fn subdomains_are_blocked() {
        let (_dir, store) = tmp_store();
        store.add_block("youtube.com").unwrap();
        assert!(store.is_blocked("m.youtube.com").unwrap());
        assert!(store.is_blocked("youtube.com").unwrap());
        assert!(!store.is_blocked("notyoutube.com").unwrap());
    }

    #[test]
    fn grant_dominates_block_until_expiry() {
        let (_dir, store) = tmp_store();
        store.add_block("twitter.com").unwrap();
        assert!(store.is_blocked("twitter.com").unwrap());

        store.grant("twitter.com", 5, Some("test".to_string()), 30).unwrap();
        assert!(!store.is_blocked("twitter.com").unwrap());

        store.revoke("twitter.com").unwrap();
        assert!(store.is_blocked("twitter.com").unwrap());
    }

    #[test]
    fn grant_rejects_minutes_outside_cap() {
        let (_dir, store) = tmp_store();
        assert!(store.grant("twitter.com", 31, None, 30).is_err());
        assert!(store.grant("twitter.com", 0, None, 30).is_err());
    }

    #[test]
    fn hard_lock_vetoes_grant_and_unblock() {
        let (_dir, store) = tmp_store();
        store.add_block("twitter.com").unwrap();
        store.add_lock("twitter.com", Date::constant(2099, 1, 1)).unwrap();

        let err = store.grant("twitter.com", 5, None, 30).unwrap_err();
        assert!(matches!(err, PolicyError::LockoutRefusal { .. }));

        let err = store.remove_block("twitter.com").unwrap_err();
        assert!(matches!(err, PolicyError::LockoutRefusal { .. }));
    }

    #[test]
    fn add_block_is_idempotent() {
        let (_dir, store) = tmp_store();
        store.add_block("reddit.com").unwrap();
        store.add_block("reddit.com").unwrap();
        assert_eq!(store.blocked_count(), 1);
    }

    #[test]
    fn persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("policy.toml")).unwrap();
        {
            let store = Store::load(path.clone(), &[]).unwrap();
            store.add_block("reddit.com").unwrap();
        }
        let store = Store::load(path, &[]).unwrap();
        assert!(store.is_blocked("reddit.com").unwrap());
    }
}
