//! The bearer token gating the remote tool surface (§4.3): generated once
//! on first run, stored with owner-only permissions, accepted as either
//! an `Authorization: Bearer` header or a `token` query parameter.

use camino::Utf8Path;
use rand::distributions::Alphanumeric;
use rand::Rng;

const TOKEN_LEN: usize = 32;

/// Load the token from `path`, generating and persisting a fresh one if
/// it doesn't exist yet.
pub fn load_or_create(path: &Utf8Path) -> std::io::Result<String> {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let token = existing.trim().to_string();
        if !token.is_empty() {
            return Ok(token);
        }
    }

    let token: String =
        rand::thread_rng().sample_iter(&Alphanumeric).take(TOKEN_LEN).map(char::from).collect();

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, &token)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(token)
}

pub fn extract_from_header(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ")
}
