//! Control server configuration.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use shield_policy::Category;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ServerConfig {
    /// Loopback address the REST API is bound to.
    pub listen_addr: String,
    /// Where the canonical policy document is persisted.
    pub policy_path: Utf8PathBuf,
    /// Where the bearer token used by the remote tool surface is stored,
    /// owner-only permissions.
    pub token_path: Utf8PathBuf,
    /// Path of the agent's IPC socket.
    pub agent_socket_path: Utf8PathBuf,
    /// Category bundles seeded into a fresh policy document.
    pub default_categories: Vec<String>,
    pub logging: LoggingConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: "127.0.0.1:4780".to_string(),
            policy_path: Utf8PathBuf::from("/var/lib/focus-shield/policy.toml"),
            token_path: Utf8PathBuf::from("/var/lib/focus-shield/token"),
            agent_socket_path: Utf8PathBuf::from("/var/run/focus-shield/agent.sock"),
            default_categories: shield_policy::Category::DEFAULT
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn load(path: &camino::Utf8Path) -> Result<ServerConfig, String> {
        if !path.exists() {
            return Ok(ServerConfig::default());
        }
        let text = std::fs::read_to_string(path).map_err(|err| err.to_string())?;
        toml::from_str(&text).map_err(|err| err.to_string())
    }

    pub fn categories(&self) -> Vec<Category> {
        self.default_categories.iter().filter_map(|name| Category::from_name(name)).collect()
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
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    pub level: LogLevel,
}
