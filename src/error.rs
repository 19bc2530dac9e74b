//! Agent-internal error kinds.

use std::fmt;

/// An error fatal to agent startup.
#[derive(Debug)]
pub enum AgentFatalError {
    Config(String),
    Logger(String),
    Io(std::io::Error),
}

impl fmt::Display for AgentFatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AgentFatalError::Config(msg) => write!(f, "configuration error: {msg}"),
            AgentFatalError::Logger(msg) => write!(f, "logger error: {msg}"),
            AgentFatalError::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for AgentFatalError {}

impl From<std::io::Error> for AgentFatalError {
    fn from(err: std::io::Error) -> Self {
        AgentFatalError::Io(err)
    }
}

/// A failure applying one of the four enforcement surfaces.
#[derive(Debug)]
pub enum SurfaceError {
    /// Surface 1 (host table): fatal to the request.
    HostTable(String),
    /// Surface 2 (packet filter): the region may be left in whichever of
    /// the previous or attempted state the reload left it in; the next
    /// call retries.
    PacketFilter(String),
    /// Surfaces 3 and 4 (connection flush, tab close) and the resolver
    /// cache flush: logged and swallowed by the caller, never surfaced.
    BestEffort(String),
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SurfaceError::HostTable(msg) => write!(f, "host table: {msg}"),
            SurfaceError::PacketFilter(msg) => write!(f, "packet filter: {msg}"),
            SurfaceError::BestEffort(msg) => write!(f, "best-effort surface: {msg}"),
        }
    }
}

impl std::error::Error for SurfaceError {}

impl From<SurfaceError> for shield_api::AgentError {
    fn from(err: SurfaceError) -> Self {
        shield_api::AgentError::SurfaceApply { message: err.to_string() }
    }
}
