//! The subcommands of `shieldctl`.

pub mod block;
pub mod delay;
pub mod grant;
pub mod lock;
pub mod shield;
pub mod status;

use super::client::ShieldApiClient;

#[derive(Clone, Debug, clap::Subcommand)]
pub enum Command {
    /// Show overall shield and agent status
    Status(self::status::Status),

    /// Manage the blocklist
    Block(self::block::Block),

    /// Grant temporary access to a blocked domain
    Grant(self::grant::Grant),

    /// Revoke an active allowance early
    Revoke(self::grant::Revoke),

    /// List active allowances
    Allowances(self::grant::Allowances),

    /// Check whether a domain is currently blocked
    Check(self::status::Check),

    /// Turn the shield on or off
    Shield(self::shield::Shield),

    /// Manage the friction-delay list
    Delay(self::delay::Delay),

    /// Manage hard lockouts
    Lock(self::lock::Lock),

    /// Flush the system's name-resolution cache
    FlushDns(self::status::FlushDns),
}

impl Command {
    pub async fn execute(self, client: ShieldApiClient) -> Result<(), String> {
        match self {
            Self::Status(cmd) => cmd.execute(client).await,
            Self::Block(cmd) => cmd.execute(client).await,
            Self::Grant(cmd) => cmd.execute(client).await,
            Self::Revoke(cmd) => cmd.execute(client).await,
            Self::Allowances(cmd) => cmd.execute(client).await,
            Self::Check(cmd) => cmd.execute(client).await,
            Self::Shield(cmd) => cmd.execute(client).await,
            Self::Delay(cmd) => cmd.execute(client).await,
            Self::Lock(cmd) => cmd.execute(client).await,
            Self::FlushDns(cmd) => cmd.execute(client).await,
        }
    }
}
