//! Logging for the control server. Simpler than the agent's reload-capable
//! logger: the control server has no signal-driven reconfiguration, so a
//! filter fixed at startup is enough.

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

use crate::config::{LogLevel, LoggingConfig};

pub fn launch(config: &LoggingConfig) -> Result<(), String> {
    let filter = EnvFilter::default().add_directive(LevelFilter::from(config.level).into());
    let layer = FmtLayer::new().with_ansi(supports_color::on(supports_color::Stream::Stdout).is_some());
    Registry::default()
        .with(filter)
        .with(layer)
        .try_init()
        .map_err(|err| err.to_string())
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}
