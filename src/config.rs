//! Agent configuration.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Where the agent listens for IPC, where it persists its mirror, and
/// where the enforcement surfaces live on disk.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AgentConfig {
    /// Path of the Unix-domain IPC socket, created world-writable.
    pub socket_path: Utf8PathBuf,
    /// Where the agent persists its own mirror of the applied policy.
    pub mirror_path: Utf8PathBuf,
    /// The OS host file the sentinel region is written into.
    pub hosts_path: Utf8PathBuf,
    /// The packet-filter anchor's own rule file.
    pub pf_anchor_path: Utf8PathBuf,
    /// The main packet-filter configuration the anchor reference line is
    /// appended to.
    pub pf_conf_path: Utf8PathBuf,
    /// The anchor's name, used in both the reference line and `pfctl`
    /// invocations.
    pub pf_anchor_name: String,
    /// Network interface name used for targeted cache-flush commands, if
    /// the platform default isn't right.
    pub interface: Option<String>,
    pub logging: LoggingConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            socket_path: Utf8PathBuf::from("/var/run/focus-shield/agent.sock"),
            mirror_path: Utf8PathBuf::from("/var/lib/focus-shield/agent-mirror.toml"),
            hosts_path: Utf8PathBuf::from("/etc/hosts"),
            pf_anchor_path: Utf8PathBuf::from("/etc/pf.anchors/focus-shield"),
            pf_conf_path: Utf8PathBuf::from("/etc/pf.conf"),
            pf_anchor_name: "focus-shield".to_string(),
            interface: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl AgentConfig {
    /// Load from `path`, falling back to compiled-in defaults if the file
    /// doesn't exist.
    pub fn load(path: &camino::Utf8Path) -> Result<AgentConfig, String> {
        if !path.exists() {
            return Ok(AgentConfig::default());
        }
        let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
        toml::from_str(&text).map_err(|err| err.to_string())
    }
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogTarget {
    #[default]
    Stdout,
    Stderr,
    File(Utf8PathBuf),
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub target: LogTarget,
    pub trace_targets: Vec<String>,
}
