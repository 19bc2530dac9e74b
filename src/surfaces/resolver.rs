//! Resolver-cache flush, and the bounded-timeout resolution used to turn
//! a domain into addresses for the dynamic anchor rules.

use std::net::IpAddr;
use std::time::Duration;

use tokio::net::lookup_host;

const RESOLVE_TIMEOUT: Duration = Duration::from_secs(2);

/// Resolve `domain` to its addresses, bounded by a short timeout. Failure
/// yields an empty list rather than an error: the caller just gets fewer
/// dynamic rules to add.
pub async fn resolve(domain: &str) -> Vec<IpAddr> {
    let lookup = format!("{domain}:0");
    match tokio::time::timeout(RESOLVE_TIMEOUT, lookup_host(lookup)).await {
        Ok(Ok(addrs)) => addrs.map(|a| a.ip()).collect(),
        Ok(Err(err)) => {
            tracing::warn!(%domain, %err, "domain resolution failed");
            Vec::new()
        }
        Err(_) => {
            tracing::warn!(%domain, "domain resolution timed out");
            Vec::new()
        }
    }
}

/// Invalidate the OS resolver cache so a freshly re-blocked domain can't
/// be served from a stale, still-resolvable entry. Best-effort.
pub async fn flush_cache() -> Result<(), String> {
    let mut command = tokio::process::Command::new("dscacheutil");
    command.arg("-flushcache");
    if let Err(err) = crate::util::run_best_effort(command).await {
        tracing::warn!(%err, "dscacheutil flush failed, falling back to mDNSResponder restart");
    }

    let mut command = tokio::process::Command::new("killall");
    command.args(["-HUP", "mDNSResponder"]);
    crate::util::run_best_effort(command).await.map_err(|err| err.to_string())
}
