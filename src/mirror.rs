//! The agent's own persisted mirror of the policy it enforces.
//!
//! This is deliberately a much smaller document than the control server's
//! policy store: the agent only needs enough state to reapply surfaces 1
//! and 2 on restart and to run its own primary expiry ticker (§4.2). It
//! uses the same versioned-TOML convention as the policy store, written
//! independently since the agent is a separate process that only shares
//! the *format*, not the store's code.

use camino::Utf8Path;
use foldhash::HashMap;
use serde::{Deserialize, Serialize};

use crate::util::write_file;

/// The domains currently enforced, the shield flag, and any pending
/// allowance expiries the agent must sweep on its own.
#[derive(Clone, Debug, Default)]
pub struct Mirror {
    pub shield: bool,
    pub blocklist: foldhash::HashSet<String>,
    /// domain -> unix-seconds expiry, populated by `grant`, consumed by
    /// `revoke` or the expiry ticker.
    pub pending_expiries: HashMap<String, i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "version")]
enum Spec {
    V1(SpecV1),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct SpecV1 {
    #[serde(default)]
    shield: bool,
    #[serde(default)]
    blocklist: Vec<String>,
    #[serde(default)]
    pending_expiries: Vec<PendingExpirySpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
struct PendingExpirySpec {
    domain: String,
    expires_at: i64,
}

impl Mirror {
    /// Load the mirror from `path`, or an empty, unshielded mirror if no
    /// file exists yet (first boot).
    pub fn load(path: &Utf8Path) -> Result<Mirror, String> {
        if !path.exists() {
            return Ok(Mirror::default());
        }
        let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
        let spec: Spec = toml::from_str(&text).map_err(|err| err.to_string())?;
        Ok(spec.into())
    }

    /// Synchronously persist the mirror: write-temp-then-rename, on every
    /// mutation, per the crash-safety invariant.
    pub fn save(&self, path: &Utf8Path) -> Result<(), String> {
        let spec = Spec::from(self);
        let text = toml::to_string_pretty(&spec).map_err(|err| err.to_string())?;
        write_file(path, text.as_bytes()).map_err(|err| err.to_string())
    }
}

impl From<Spec> for Mirror {
    fn from(spec: Spec) -> Self {
        match spec {
            Spec::V1(v1) => Mirror {
                shield: v1.shield,
                blocklist: v1.blocklist.into_iter().collect(),
                pending_expiries: v1
                    .pending_expiries
                    .into_iter()
                    .map(|p| (p.domain, p.expires_at))
                    .collect(),
            },
        }
    }
}

impl From<&Mirror> for Spec {
    fn from(mirror: &Mirror) -> Self {
        let mut blocklist: Vec<String> = mirror.blocklist.iter().cloned().collect();
        blocklist.sort();
        let mut pending_expiries: Vec<PendingExpirySpec> = mirror
            .pending_expiries
            .iter()
            .map(|(domain, expires_at)| PendingExpirySpec { domain: domain.clone(), expires_at: *expires_at })
            .collect();
        pending_expiries.sort_by(|a, b| a.domain.cmp(&b.domain));

        Spec::V1(SpecV1 { shield: mirror.shield, blocklist, pending_expiries })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("mirror.toml")).unwrap();

        let mut mirror = Mirror::default();
        mirror.shield = true;
        mirror.blocklist.insert("twitter.com".to_string());
        mirror.pending_expiries.insert("reddit.com".to_string(), 123);
        mirror.save(&path).unwrap();

        let loaded = Mirror::load(&path).unwrap();
        assert!(loaded.shield);
        assert!(loaded.blocklist.contains("twitter.com"));
        assert_eq!(loaded.pending_expiries.get("reddit.com"), Some(&123));
    }

    #[test]
    fn missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("missing.toml")).unwrap();
        let mirror = Mirror::load(&path).unwrap();
        assert!(!mirror.shield);
        assert!(mirror.blocklist.is_empty());
    }
}
