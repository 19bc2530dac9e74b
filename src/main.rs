use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use shieldd::config::AgentConfig;
use shieldd::log::Logger;
use shieldd::mirror::Mirror;
use shieldd::state::{AgentState, Phase};
use shieldd::{ipc, ticker};
use tracing::{error, info};

/// The privileged Focus Shield enforcement agent.
#[derive(Debug, Parser)]
#[command(name = "shieldd", version)]
struct Args {
    /// Path to the agent's TOML configuration file.
    #[arg(short, long, default_value = "/etc/focus-shield/agent.toml")]
    config: Utf8PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match AgentConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    let logger = match Logger::launch(&config.logging) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("failed to start logger: {err}");
            return ExitCode::FAILURE;
        }
    };
    let _ = logger;

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: AgentConfig) -> Result<(), shieldd::error::AgentFatalError> {
    let mirror = Mirror::load(&config.mirror_path).map_err(shieldd::error::AgentFatalError::Config)?;
    let socket_path = config.socket_path.clone();
    let state = Arc::new(AgentState::new(config, mirror));

    // Recovery (Invariant 5): if the shield was on, reapply surfaces 1
    // and 2 before accepting any IPC.
    state.set_phase(Phase::Restoring);
    info!("restoring enforcement state before accepting requests");
    if let Err(err) = state.reapply().await {
        error!(%err, "failed to restore enforcement state");
        return Err(shieldd::error::AgentFatalError::Config(err.to_string()));
    }

    let listener = ipc::bind(&state).await?;
    state.set_phase(Phase::Serving);
    info!(path = %socket_path, "accepting IPC requests");

    let ipc_task = tokio::spawn(ipc::serve(listener, Arc::clone(&state)));
    let ticker_task = tokio::spawn(ticker::run(Arc::clone(&state)));

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("draining");
    state.set_phase(Phase::Draining);
    ipc_task.abort();
    ticker_task.abort();
    let _ = std::fs::remove_file(&socket_path);

    Ok(())
}
