//! A thin client for the agent's loopback IPC socket.

use camino::Utf8PathBuf;
use shield_api::{AgentOutcome, AgentRequest, AgentResponse};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;

#[derive(Clone)]
pub struct AgentClient {
    socket_path: Utf8PathBuf,
}

impl AgentClient {
    pub fn new(socket_path: Utf8PathBuf) -> Self {
        AgentClient { socket_path }
    }

    /// Send one request and wait for its response. Connection failures,
    /// timeouts, and protocol errors all surface as `AgentUnavailable` to
    /// the caller; a successful round-trip with an error body surfaces
    /// whatever error the agent reported.
    pub async fn call(&self, request: AgentRequest) -> Result<AgentOutcome, shield_api::ApiError> {
        let response = self
            .call_inner(request)
            .await
            .map_err(|message| shield_api::ApiError::AgentUnavailable { message })?;
        response.map_err(shield_api::ApiError::from)
    }

    async fn call_inner(&self, request: AgentRequest) -> Result<AgentResponse, String> {
        let stream = tokio::time::timeout(std::time::Duration::from_secs(5), UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| "connect timed out".to_string())?
            .map_err(|err| err.to_string())?;

        let (read_half, mut write_half) = stream.into_split();
        let mut line = serde_json::to_string(&request).map_err(|err| err.to_string())?;
        line.push('\n');
        write_half.write_all(line.as_bytes()).await.map_err(|err| err.to_string())?;

        let mut reader = BufReader::new(read_half);
        let mut response_line = String::new();
        tokio::time::timeout(std::time::Duration::from_secs(5), reader.read_line(&mut response_line))
            .await
            .map_err(|_| "response timed out".to_string())?
            .map_err(|err| err.to_string())?;

        serde_json::from_str(&response_line).map_err(|err| err.to_string())
    }
}
