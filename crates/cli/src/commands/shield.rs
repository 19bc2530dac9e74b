use crate::client::{format_http_error, ShieldApiClient};

#[derive(Clone, Debug, clap::Args)]
pub struct Shield {
    #[command(subcommand)]
    command: ShieldCommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum ShieldCommand {
    /// Turn blocking on
    Enable,
    /// Turn blocking off
    Disable,
}

impl Shield {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        let (path, label) = match self.command {
            ShieldCommand::Enable => ("/api/shield/enable", "enabled"),
            ShieldCommand::Disable => ("/api/shield/disable", "disabled"),
        };
        client.post(path).send().await.map_err(format_http_error)?.error_for_status().map_err(format_http_error)?;
        println!("shield {label}");
        Ok(())
    }
}
