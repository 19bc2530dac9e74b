use shield_api::{DelayAdd, DomainList};

use crate::client::{format_http_error, ShieldApiClient};

#[derive(Clone, Debug, clap::Args)]
pub struct Delay {
    #[command(subcommand)]
    command: DelayCommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum DelayCommand {
    /// Add a domain to the delay list (shown with a friction timer instead of an outright block)
    Add { domain: String },
    /// Remove a domain from the delay list
    Remove { domain: String },
    /// List every domain on the delay list
    List,
}

impl Delay {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        match self.command {
            DelayCommand::Add { domain } => {
                let body = DelayAdd { domain };
                let added: DelayAdd = client
                    .post("/api/delay")
                    .json(&body)
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .json()
                    .await
                    .map_err(format_http_error)?;
                println!("added {} to the delay list", added.domain);
                Ok(())
            }
            DelayCommand::Remove { domain } => {
                let path = format!("/api/delay/{domain}");
                client
                    .delete(&path)
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .error_for_status()
                    .map_err(format_http_error)?;
                println!("removed {domain} from the delay list");
                Ok(())
            }
            DelayCommand::List => {
                let response: DomainList = client
                    .get("/api/delayed")
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
