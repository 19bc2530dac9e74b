use shield_api::{CheckResult, StatusResult};

use crate::ansi;
use crate::client::{format_http_error, ShieldApiClient};

#[derive(Clone, Debug, clap::Args)]
pub struct Status;

impl Status {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        let response: StatusResult =
            client.get("/status").send().await.map_err(format_http_error)?.json().await.map_err(format_http_error)?;

        let shield_label = if response.shield { ansi::paint(ansi::GREEN, "on") } else { ansi::paint(ansi::GRAY, "off") };
        let daemon_label = if response.daemon_running {
            ansi::paint(ansi::GREEN, "reachable")
        } else {
            ansi::paint(ansi::RED, "unreachable")
        };

        println!("shield:     {shield_label}");
        println!("agent:      {daemon_label}");
        println!("blocked:    {} domains", response.blocked_count);
        println!("allowances: {} active", response.active_allowances);
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct Check {
    /// Domain to check, e.g. "youtube.com".
    pub domain: String,
}

impl Check {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        let path = format!("/api/check/{}", self.domain);
        let response: CheckResult =
            client.get(&path).send().await.map_err(format_http_error)?.json().await.map_err(format_http_error)?;

        if response.locked {
            println!("{}: {}", response.domain, ansi::paint(ansi::RED, "hard-locked"));
        } else if response.blocked {
            println!("{}: {}", response.domain, ansi::paint(ansi::RED, "blocked"));
        } else if response.allowance_minutes > 0 {
            println!(
                "{}: {} ({} minutes remaining)",
                response.domain,
                ansi::paint(ansi::YELLOW, "allowed"),
                response.allowance_minutes
            );
        } else {
            println!("{}: {}", response.domain, ansi::paint(ansi::GREEN, "allowed"));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct FlushDns;

impl FlushDns {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        client.post("/api/flush-dns").send().await.map_err(format_http_error)?.error_for_status().map_err(format_http_error)?;
        println!("flushed the system's name-resolution cache");
        Ok(())
    }
}
