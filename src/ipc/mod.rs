//! The agent's loopback IPC surface: a world-writable Unix-domain socket
//! carrying one JSON [`shield_api::AgentRequest`] per line, answered with
//! one JSON [`shield_api::AgentResponse`] per line.

use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;

use shield_api::{AgentError, AgentRequest};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use crate::state::AgentState;

/// Bind the socket at `state.config().socket_path`, removing any stale
/// socket file left behind by a prior crash, and set it world-writable
/// so the unprivileged control server can reach it.
pub async fn bind(state: &AgentState) -> std::io::Result<UnixListener> {
    let path = &state.config().socket_path;
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let listener = UnixListener::bind(path)?;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o666))?;
    Ok(listener)
}

/// The accept loop: hand each connection to its own task, so a slow or
/// stuck client can't block the others.
pub async fn serve(listener: UnixListener, state: Arc<AgentState>) {
    loop {
        let (stream, _addr) = match listener.accept().await {
            Ok(pair) => pair,
            Err(err) => {
                tracing::warn!(%err, "IPC accept failed");
                continue;
            }
        };

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &state).await {
                tracing::debug!(%err, "IPC connection ended");
            }
        });
    }
}

async fn handle_connection(stream: UnixStream, state: &AgentState) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match state.phase() {
            crate::state::Phase::Serving => match serde_json::from_str::<AgentRequest>(&line) {
                Ok(request) => state.handle(request).await,
                Err(err) => Err(AgentError::Protocol { message: err.to_string() }),
            },
            _ => Err(AgentError::Protocol { message: "agent is not yet serving".to_string() }),
        };

        let mut encoded = serde_json::to_string(&response).expect("response is always serializable");
        encoded.push('\n');
        write_half.write_all(encoded.as_bytes()).await?;
    }

    Ok(())
}
