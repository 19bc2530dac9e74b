use shield_api::{LockAdd, LockList};

use crate::client::{format_http_error, ShieldApiClient};

#[derive(Clone, Debug, clap::Args)]
pub struct Lock {
    #[command(subcommand)]
    command: LockCommand,
}

#[derive(Clone, Debug, clap::Subcommand)]
pub enum LockCommand {
    /// Install a hard lockout until a given date (YYYY-MM-DD). This is
    /// irreversible through the API once installed: lifting it early
    /// requires editing the persisted policy file directly.
    Add { domain: String, until: String },
    /// Attempt to remove a lockout. Refused while it's still active.
    Remove { domain: String },
    /// List every active lockout
    List,
}

impl Lock {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        match self.command {
            LockCommand::Add { domain, until } => {
                let body = LockAdd { domain: domain.clone(), until: until.clone() };
                client
                    .post("/api/lock")
                    .json(&body)
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .error_for_status()
                    .map_err(format_http_error)?;
                println!("locked {domain} until {until}");
                Ok(())
            }
            LockCommand::Remove { domain } => {
                let path = format!("/api/lock/{domain}");
                client
                    .delete(&path)
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .error_for_status()
                    .map_err(format_http_error)?;
                println!("removed lockout entry for {domain}");
                Ok(())
            }
            LockCommand::List => {
                let response: LockList = client
                    .get("/api/locks")
                    .send()
                    .await
                    .map_err(format_http_error)?
                    .json()
                    .await
                    .map_err(format_http_error)?;
                for lock in response.locks {
                    println!("{:<30} until {}", lock.domain, lock.until);
                }
                Ok(())
            }
        }
    }
}
