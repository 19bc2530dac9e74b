use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;
use shield_api::AgentRequest;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

mod agent_client;
mod config;
mod error;
mod log;
mod routes;
mod token;

use agent_client::AgentClient;
use config::ServerConfig;
use routes::AppState;

/// The Focus Shield control server: owns the canonical policy document and
/// drives the enforcement agent over its loopback socket.
#[derive(Debug, Parser)]
#[command(name = "shield-controld", version)]
struct Args {
    /// Path to the control server's TOML configuration file.
    #[arg(short, long, default_value = "/etc/focus-shield/controld.toml")]
    config: Utf8PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match ServerConfig::load(&args.config) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load configuration: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = log::launch(&config.logging) {
        eprintln!("failed to start logger: {err}");
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("fatal error: {err}");
            ExitCode::FAILURE
        }
    }
}

const DEFENSIVE_SWEEP_PERIOD: Duration = Duration::from_secs(30);

async fn run(config: ServerConfig) -> Result<(), String> {
    let token = token::load_or_create(&config.token_path).map_err(|err| err.to_string())?;
    let store = shield_policy::Store::load(config.policy_path.clone(), &config.categories())
        .map_err(|err| err.to_string())?;
    let agent = AgentClient::new(config.agent_socket_path.clone());

    // Startup sequence: confirm the agent is reachable, then push the
    // effective set and shield flag so the agent's enforcement state
    // matches the persisted document even if it restarted independently.
    match agent.call(AgentRequest::Status).await {
        Ok(_) => info!("enforcement agent is reachable"),
        Err(err) => warn!(%err, "enforcement agent not reachable at startup, will retry on next request"),
    }

    let effective = store.effective_block_set();
    if let Err(err) = agent.call(AgentRequest::Blocklist { domains: effective }).await {
        warn!(%err, "failed to push effective block set to agent at startup");
    }
    if store.shield_enabled() {
        if let Err(err) = agent.call(AgentRequest::Enable).await {
            warn!(%err, "failed to enable shield on agent at startup");
        }
    }

    let state = Arc::new(AppState { store, agent, bearer_token: token });

    let ticker_state = Arc::clone(&state);
    let ticker_task = tokio::spawn(async move { run_defensive_ticker(ticker_state).await });

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|err| format!("failed to bind {}: {err}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "control server listening");

    let router = routes::router(state);
    let shutdown = shutdown_signal();
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|err| err.to_string())?;

    ticker_task.abort();
    Ok(())
}

/// Defensive expiry sweep (§4.3): the agent's own ticker is primary, this
/// one exists only to catch drift if the agent missed an expiry, e.g. after
/// a restart race. Watches the active-allowance count and, when it drops,
/// recomputes and re-pushes the effective set.
async fn run_defensive_ticker(state: Arc<AppState>) {
    let mut prev_count = state.store.active_allowances().map(|a| a.len()).unwrap_or(0);
    loop {
        tokio::time::sleep(DEFENSIVE_SWEEP_PERIOD).await;

        let now_count = match state.store.active_allowances() {
            Ok(active) => active.len(),
            Err(err) => {
                warn!(%err, "defensive ticker failed to read allowances");
                continue;
            }
        };

        if now_count < prev_count {
            let domains = state.store.effective_block_set();
            if let Err(err) = state.agent.call(AgentRequest::Blocklist { domains }).await {
                warn!(%err, "defensive ticker failed to re-drive agent");
            } else {
                info!(from = prev_count, to = now_count, "defensive ticker re-drove agent after allowance expiry");
            }
        }

        prev_count = now_count;
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
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
}
