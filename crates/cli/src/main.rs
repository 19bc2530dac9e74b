use std::process::ExitCode;

use clap::Parser;
use tracing::error;

mod ansi;
mod args;
mod client;
mod commands;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = args::Args::parse();

    tracing_subscriber::FmtSubscriber::builder().with_max_level(args.log_level).init();

    match args.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
