use shield_api::{AllowanceList, GrantRequest};

use crate::client::{format_http_error, ShieldApiClient};

#[derive(Clone, Debug, clap::Args)]
pub struct Grant {
    /// Domain to grant temporary access to.
    pub domain: String,
    /// Minutes to grant, 1 to 30.
    pub minutes: u32,
    /// Optional free-text reason, recorded alongside the allowance.
    #[arg(long)]
    pub reason: Option<String>,
}

impl Grant {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        let body = GrantRequest { domain: self.domain.clone(), minutes: self.minutes, reason: self.reason };
        client
            .post("/api/grant")
            .json(&body)
            .send()
            .await
            .map_err(format_http_error)?
            .error_for_status()
            .map_err(format_http_error)?;
        println!("granted {} minutes for {}", self.minutes, self.domain);
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct Revoke {
    pub domain: String,
}

impl Revoke {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        let path = format!("/api/grant/{}", self.domain);
        client.delete(&path).send().await.map_err(format_http_error)?.error_for_status().map_err(format_http_error)?;
        println!("revoked allowance for {}", self.domain);
        Ok(())
    }
}

#[derive(Clone, Debug, clap::Args)]
pub struct Allowances;

impl Allowances {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        let response: AllowanceList = client
            .get("/api/allowances")
            .send()
            .await
            .map_err(format_http_error)?
            .json()
            .await
            .map_err(format_http_error)?;

        if response.allowances.is_empty() {
            println!("no active allowances");
            return Ok(());
        }

        for allowance in response.allowances {
            let reason = allowance.reason.as_deref().unwrap_or("-");
            println!(
                "{:<30} {:>3}/{:<3} min remaining   {reason}",
                allowance.domain, allowance.remaining_minutes, allowance.granted_minutes
            );
        }
        Ok(())
    }
}
