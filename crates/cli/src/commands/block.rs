use shield_api::{BlockAdd, DomainList};

use crate::client::{format_http_error, ShieldApiClient};

#[derive(Clone, Debug, clap::Args)]
pub struct Block {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum BlockCommand {
    /// Add a domain to the blocklist
    Add { domain: String },
    /// Remove a domain from the blocklist
    Remove { domain: String },
    /// List every domain on the blocklist
    List,
}

impl Block {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        match self.command {
            BlockCommand::Add { domain } => {
                let body = BlockAdd { domain };
                let added: BlockAdd = client
                    .post("/api/block")
                    .json(&body)
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .json()
                    .await
                    .map_err(format_http_error)?;
                println!("blocked {}", added.domain);
                Ok(())
            }
            BlockCommand::Remove { domain } => {
                let path = format!("/api/block/{domain}");
                client
                    .delete(&path)
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .error_for_status()
                    .map_err(format_http_error)?;
                println!("unblocked {domain}");
                Ok(())
            }
            BlockCommand::List => {
                let response: DomainList = client
                    .get("/api/blocked")
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .json()
                    .await
                    .map_err(format_http_error)?;
                for domain in response.domains {
                    println!("{domain}");
                }
                Ok(())
            }
        }
    }
}
