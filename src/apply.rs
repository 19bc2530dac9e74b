//! Orchestration of the four enforcement surfaces into the cascades the
//! IPC operations need.

use crate::config::AgentConfig;
use crate::error::SurfaceError;
use crate::surfaces::packetfilter::{self, DynamicRule};
use crate::surfaces::{browser, hosts, resolver};

/// Reapply surfaces 1 and 2 (host table, packet filter) from the current
/// effective set and dynamic rule list. This is what a caller must wait
/// on before reporting success, per the ordering guarantee in §5.
pub async fn reapply_surfaces(
    config: &AgentConfig,
    shield: bool,
    domains: &[String],
    dynamic: &[DynamicRule],
) -> Result<(), SurfaceError> {
    // Surface 1 is fatal to the operation: the host file is the primary
    // enforcement lever.
    hosts::apply(&config.hosts_path, shield, domains).await?;

    // Surface 2 failures are logged and swallowed: the next reapply call
    // retries, and surface 1 already holds the line.
    if let Err(err) =
        packetfilter::ensure_reference_line(&config.pf_conf_path, &config.pf_anchor_path, &config.pf_anchor_name)
            .await
    {
        tracing::warn!(%err, "packet-filter reference line update failed");
    }
    if let Err(err) = packetfilter::apply(&config.pf_anchor_path, &config.pf_anchor_name, dynamic).await {
        tracing::warn!(%err, "packet-filter anchor reload failed");
    }

    Ok(())
}

/// The aggressive cascade used by both `revoke` and `enforce-block`:
/// resolve the domain, add a dynamic anchor rule, reapply, then kill live
/// connections, close browser tabs, and flush the resolver cache. Every
/// step past resolution is best-effort and never fails the caller.
pub async fn aggressive_cascade(
    config: &AgentConfig,
    domain: &str,
    shield: bool,
    domains: &[String],
    dynamic: &mut Vec<DynamicRule>,
) -> Result<(), SurfaceError> {
    let ips = resolver::resolve(domain).await;
    dynamic.retain(|rule| rule.domain != domain);
    for ip in &ips {
        dynamic.push(DynamicRule { domain: domain.to_string(), ip: *ip });
    }

    reapply_surfaces(config, shield, domains, dynamic).await?;

    packetfilter::flush_connections(&ips).await;

    if let Err(err) = browser::close_tabs(domain).await {
        tracing::warn!(domain, %err, "best-effort tab close failed");
    }
    if let Err(err) = resolver::flush_cache().await {
        tracing::warn!(%err, "best-effort resolver cache flush failed");
    }

    Ok(())
}

/// Drop any dynamic rules for a domain that has just been granted an
/// allowance, then reapply surfaces 1 and 2 without it.
pub async fn relax_cascade(
    config: &AgentConfig,
    domain: &str,
    shield: bool,
    domains: &[String],
    dynamic: &mut Vec<DynamicRule>,
) -> Result<(), SurfaceError> {
    dynamic.retain(|rule| rule.domain != domain);
    reapply_surfaces(config, shield, domains, dynamic).await
}
