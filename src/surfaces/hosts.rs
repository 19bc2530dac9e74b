//! Surface 1: the host-name override table.
//!
//! The agent owns a sentinel-bracketed region of the OS host file
//! exclusively. Rewriting the region is always a pure function of the
//! current effective set: strip the region, then, if the shield is on
//! and the set is non-empty, re-emit it.

use camino::Utf8Path;

use crate::error::SurfaceError;
use crate::surfaces::expand_names;
use crate::util::write_file;

pub const BEGIN: &str = "# BEGIN FOCUS SHIELD BLOCK";
pub const END: &str = "# END FOCUS SHIELD BLOCK";

/// Strip any existing sentinel region from `contents` and return the
/// remainder plus the index it was removed from (so a fresh region, if
/// any, can be reinserted at the same place).
fn strip_region(contents: &str) -> String {
    let Some(begin) = contents.find(BEGIN) else {
        return contents.to_string();
    };
    let Some(end_rel) = contents[begin..].find(END) else {
        // Malformed (begin with no end): leave the file untouched rather
        // than guess.
        return contents.to_string();
    };
    let mut end = begin + end_rel + END.len();
    if contents[end..].starts_with('\n') {
        end += 1;
    }

    let mut out = String::with_capacity(contents.len());
    out.push_str(&contents[..begin]);
    out.push_str(&contents[end..]);
    out
}

fn render_region(domains: &[String]) -> String {
    let mut out = String::new();
    out.push_str(BEGIN);
    out.push('\n');
    for domain in domains {
        for name in expand_names(domain) {
            out.push_str(&format!("0.0.0.0 {name}\n"));
            out.push_str(&format!(":: {name}\n"));
        }
    }
    out.push_str(END);
    out.push('\n');
    out
}

/// Apply the effective set to the host file: no region at all when the
/// shield is off or the set is empty, otherwise a freshly rendered one.
pub async fn apply(path: &Utf8Path, shield: bool, domains: &[String]) -> Result<(), SurfaceError> {
    let path = path.to_owned();
    let mut domains = domains.to_vec();
    domains.sort();

    tokio::task::spawn_blocking(move || {
        let current = std::fs::read_to_string(&path)
            .map_err(|err| SurfaceError::HostTable(format!("reading {path}: {err}")))?;
        let mut stripped = strip_region(&current);

        if shield && !domains.is_empty() {
            if !stripped.is_empty() && !stripped.ends_with('\n') {
                stripped.push('\n');
            }
            stripped.push_str(&render_region(&domains));
        }

        write_file(&path, stripped.as_bytes())
            .map_err(|err| SurfaceError::HostTable(format!("writing {path}: {err}")))
    })
    .await
    .map_err(|err| SurfaceError::HostTable(format!("join error: {err}")))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn apply_then_clear_restores_surrounding_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("hosts")).unwrap();
        let original = "127.0.0.1 localhost\n::1 localhost\n";
        std::fs::write(&path, original).unwrap();

        apply(&path, true, &["twitter.com".to_string()]).await.unwrap();
        let with_region = std::fs::read_to_string(&path).unwrap();
        assert!(with_region.contains(BEGIN));
        assert!(with_region.contains("0.0.0.0 twitter.com"));
        assert!(with_region.contains("0.0.0.0 www.twitter.com"));
        assert!(with_region.starts_with(original));

        apply(&path, false, &[]).await.unwrap();
        let cleared = std::fs::read_to_string(&path).unwrap();
        assert_eq!(cleared, original);
    }

    #[tokio::test]
    async fn reapplying_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = camino::Utf8PathBuf::from_path_buf(dir.path().join("hosts")).unwrap();
        std::fs::write(&path, "").unwrap();

        apply(&path, true, &["reddit.com".to_string()]).await.unwrap();
        let first = std::fs::read_to_string(&path).unwrap();
        apply(&path, true, &["reddit.com".to_string()]).await.unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }
}
