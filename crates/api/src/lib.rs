//! Wire types shared by the agent IPC protocol and the control server's
//! HTTP API, and consumed directly by the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

// --- Agent IPC ---------------------------------------------------------

/// A request sent to the agent over its loopback socket, one JSON value
/// per line.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum AgentRequest {
    Blocklist { domains: Vec<String> },
    Grant { domain: String, minutes: u32, reason: Option<String> },
    Revoke { domain: String },
    EnforceBlock { domain: String },
    Enable,
    Disable,
    FlushDns,
    Clear,
    Status,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentStatus {
    pub running: bool,
    pub shield: bool,
    pub blocked_count: usize,
    pub active_allowances: usize,
}

/// The successful outcome of an [`AgentRequest`]. Most requests only ack;
/// `status` carries a payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "kebab-case")]
pub enum AgentOutcome {
    Ack,
    Status(AgentStatus),
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AgentError {
    /// Surface 1 (host table) failed; fatal to the request, prior state
    /// is retained on disk.
    SurfaceApply { message: String },
    /// The request itself was malformed (bad domain, minutes out of range).
    Validation { message: String },
    /// Something about the IPC framing was wrong.
    Protocol { message: String },
}

impl fmt::Display for AgentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentError::SurfaceApply { message } => {
                write!(f, "failed to apply enforcement surface: {message}")
            }
            AgentError::Validation { message } => write!(f, "invalid request: {message}"),
            AgentError::Protocol { message } => write!(f, "protocol error: {message}"),
        }
    }
}

impl std::error::Error for AgentError {}

/// The line written back over the socket: `Ok(outcome)` or `Err(error)`.
pub type AgentResponse = Result<AgentOutcome, AgentError>;

// --- Control server HTTP API -------------------------------------------

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResult {
    pub running: bool,
    pub shield: bool,
    pub daemon_running: bool,
    pub blocked_count: usize,
    pub active_allowances: usize,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainList {
    pub domains: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BlockAdd {
    pub domain: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CheckResult {
    pub domain: String,
    pub blocked: bool,
    pub allowance_minutes: u32,
    pub shield_active: bool,
    pub locked: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GrantRequest {
    pub domain: String,
    pub minutes: u32,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowanceInfo {
    pub domain: String,
    pub remaining_minutes: u32,
    pub granted_minutes: u32,
    pub reason: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AllowanceList {
    pub allowances: Vec<AllowanceInfo>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelayAdd {
    pub domain: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockAdd {
    pub domain: String,
    /// Wall-clock date, `YYYY-MM-DD`, the lockout holds until.
    pub until: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockInfo {
    pub domain: String,
    pub until: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LockList {
    pub locks: Vec<LockInfo>,
}

/// Body of `POST /api/tool`: a JSON-RPC-shaped call into the bearer-token
/// gated remote tool surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    pub call: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl From<&ApiError> for ErrorBody {
    fn from(err: &ApiError) -> Self {
        ErrorBody { error: err.to_string() }
    }
}

/// The error kinds a mutating control-server endpoint can return, per the
/// propagation rule: errors that would reduce enforcement are surfaced,
/// errors that increase it are logged and reported as success instead.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ApiError {
    Validation { message: String },
    LockoutRefusal { domain: String, locked_until: String },
    AgentUnavailable { message: String },
    SurfaceApply { message: String },
    NotFound { domain: String },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation { message } => write!(f, "invalid request: {message}"),
            ApiError::LockoutRefusal { domain, locked_until } => {
                write!(f, "{domain} is hard-locked until {locked_until}")
            }
            ApiError::AgentUnavailable { message } => {
                write!(f, "enforcement agent unavailable: {message}")
            }
            ApiError::SurfaceApply { message } => {
                write!(f, "failed to apply enforcement surface: {message}")
            }
            ApiError::NotFound { domain } => write!(f, "{domain} not found"),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AgentError> for ApiError {
    fn from(err: AgentError) -> Self {
        ApiError::SurfaceApply { message: err.to_string() }
    }
}

impl ApiError {
    /// The HTTP status this error kind is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::LockoutRefusal { .. } => 403,
            ApiError::AgentUnavailable { .. } => 502,
            ApiError::SurfaceApply { .. } => 500,
            ApiError::NotFound { .. } => 404,
        }
    }
}
