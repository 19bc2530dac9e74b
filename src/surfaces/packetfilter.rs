//! Surface 2: the packet-filter anchor, plus surface 3, the connection
//! flush that rides on the same `pfctl` control path.

use camino::Utf8Path;

use crate::error::SurfaceError;
use crate::util::write_file;

/// A coarse, hard-coded add-on of known corporate IP ranges for the
/// largest offenders. The dynamic per-domain rules added on revoke /
/// enforce-block are the mechanism that must be correct; this table is
/// only a blunt supplement.
pub const STATIC_RANGES: &[(&str, &str)] = &[
    ("twitter.com", "104.244.42.0/24"),
    ("facebook.com", "157.240.0.0/16"),
    ("instagram.com", "157.240.0.0/16"),
    ("tiktok.com", "161.117.0.0/16"),
];

/// A dynamic, domain-tagged anchor rule, added on `revoke` /
/// `enforce-block` against a freshly resolved address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DynamicRule {
    pub domain: String,
    pub ip: std::net::IpAddr,
}

fn render_anchor(dynamic: &[DynamicRule]) -> String {
    let mut out = String::new();
    out.push_str("# static ranges\n");
    for (name, cidr) in STATIC_RANGES {
        out.push_str(&format!("block drop out quick proto {{ tcp udp }} to {cidr} # {name}\n"));
    }
    out.push_str("# dynamic rules\n");
    for rule in dynamic {
        out.push_str(&format!(
            "block drop out quick proto {{ tcp udp }} to {} # {}\n",
            rule.ip, rule.domain
        ));
    }
    out
}

/// Ensure the anchor's reference line appears in the main configuration
/// exactly once across the agent's lifetime.
pub async fn ensure_reference_line(
    conf_path: &Utf8Path,
    anchor_path: &Utf8Path,
    anchor_name: &str,
) -> Result<(), SurfaceError> {
    let conf_path = conf_path.to_owned();
    let anchor_path = anchor_path.to_owned();
    let anchor_name = anchor_name.to_owned();

    tokio::task::spawn_blocking(move || {
        let reference = format!(
            "anchor \"{anchor_name}\"\nload anchor \"{anchor_name}\" from \"{anchor_path}\"\n"
        );
        let current = std::fs::read_to_string(&conf_path).unwrap_or_default();
        if current.contains(&format!("anchor \"{anchor_name}\"")) {
            return Ok(());
        }
        let mut updated = current;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&reference);
        write_file(&conf_path, updated.as_bytes())
            .map_err(|err| SurfaceError::PacketFilter(format!("writing {conf_path}: {err}")))
    })
    .await
    .map_err(|err| SurfaceError::PacketFilter(format!("join error: {err}")))?
}

/// Write the anchor file and reload it via `pfctl`.
pub async fn apply(
    anchor_path: &Utf8Path,
    anchor_name: &str,
    dynamic: &[DynamicRule],
) -> Result<(), SurfaceError> {
    let anchor_path_owned = anchor_path.to_owned();
    let contents = render_anchor(dynamic);
    tokio::task::spawn_blocking(move || {
        write_file(&anchor_path_owned, contents.as_bytes())
            .map_err(|err| SurfaceError::PacketFilter(format!("writing {anchor_path_owned}: {err}")))
    })
    .await
    .map_err(|err| SurfaceError::PacketFilter(format!("join error: {err}")))??;

    reload(anchor_name, anchor_path).await
}

async fn reload(anchor_name: &str, anchor_path: &Utf8Path) -> Result<(), SurfaceError> {
    let mut command = tokio::process::Command::new("pfctl");
    command.args(["-a", anchor_name, "-f", anchor_path.as_str()]);
    crate::util::run_best_effort(command)
        .await
        .map_err(|err| SurfaceError::PacketFilter(format!("pfctl reload: {err}")))
}

/// Surface 3: tear down any live connection state matching the given
/// addresses, so held-open keep-alive connections observe the block
/// immediately. Best-effort.
pub async fn flush_connections(ips: &[std::net::IpAddr]) {
    for ip in ips {
        let mut command = tokio::process::Command::new("pfctl");
        command.args(["-k", &ip.to_string()]);
        if let Err(err) = crate::util::run_best_effort(command).await {
            tracing::warn!(%ip, %err, "connection flush failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reference_line_is_added_once() {
        let dir = tempfile::tempdir().unwrap();
        let conf = camino::Utf8PathBuf::from_path_buf(dir.path().join("pf.conf")).unwrap();
        let anchor = camino::Utf8PathBuf::from_path_buf(dir.path().join("pf.anchors/focus-shield")).unwrap();
        std::fs::write(&conf, "# existing rules\n").unwrap();

        ensure_reference_line(&conf, &anchor, "focus-shield").await.unwrap();
        let first = std::fs::read_to_string(&conf).unwrap();
        ensure_reference_line(&conf, &anchor, "focus-shield").await.unwrap();
        let second = std::fs::read_to_string(&conf).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.matches("anchor \"focus-shield\"\n").count(), 1);
    }

    #[test]
    fn anchor_tags_dynamic_rules_with_domain_comment() {
        let rendered = render_anchor(&[DynamicRule {
            domain: "reddit.com".to_string(),
            ip: "1.2.3.4".parse().unwrap(),
        }]);
        assert!(rendered.contains("1.2.3.4 # reddit.com"));
    }
}
