//! Logging for the enforcement agent.

use std::fmt;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::Layer as FmtLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::reload::Handle;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{reload, EnvFilter, Registry};

use crate::config::{LogLevel, LogTarget, LoggingConfig};

/// The state of the agent's logger, reload-capable so the filter can be
/// adjusted without restarting the process.
pub struct Logger {
    filter: Handle<EnvFilter, Registry>,
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger").field("filter", &self.filter).finish()
    }
}

impl Logger {
    /// Launch the agent's logger.
    ///
    /// # Panics
    ///
    /// Panics if a global [`tracing`] subscriber has already been set.
    pub fn launch(config: &LoggingConfig) -> Result<&'static Logger, String> {
        let filter = make_env_filter(config)?;
        let (filter, filter_handle) = reload::Layer::new(filter);

        let target = PrimaryLogger::new(&config.target).map_err(|e| e.to_string())?;

        match target {
            PrimaryLogger::File { file } => {
                let layer = FmtLayer::new().with_ansi(false).with_writer(file);
                tracing_subscriber::registry().with(filter).with(layer).init()
            }
            PrimaryLogger::Stdout => {
                let layer = FmtLayer::new()
                    .with_ansi(supports_color::on(supports_color::Stream::Stdout).is_some())
                    .with_writer(std::io::stdout);
                tracing_subscriber::registry().with(filter).with(layer).init()
            }
            PrimaryLogger::Stderr => {
                let layer = FmtLayer::new()
                    .with_ansi(supports_color::on(supports_color::Stream::Stderr).is_some())
                    .with_writer(std::io::stderr);
                tracing_subscriber::registry().with(filter).with(layer).init()
            }
        };

        Ok(Box::leak(Box::new(Self { filter: filter_handle })))
    }

    pub fn apply(&self, config: &LoggingConfig) -> Result<(), String> {
        self.filter
            .reload(make_env_filter(config)?)
            .map_err(|_| "could not reload filter".into())
    }
}

fn make_env_filter(config: &LoggingConfig) -> Result<EnvFilter, String> {
    let mut filter = EnvFilter::default();
    filter = filter.add_directive(LevelFilter::from(config.level).into());

    for target in &config.trace_targets {
        filter = filter
            .add_directive(target.parse().map_err(|_| format!("invalid trace target: '{target}'"))?);
    }

    Ok(filter)
}

enum PrimaryLogger {
    File { file: std::fs::File },
    Stdout,
    Stderr,
}

impl PrimaryLogger {
    fn new(config: &LogTarget) -> Result<Self, std::io::Error> {
        match config {
            LogTarget::File(path) => {
                let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
                Ok(Self::File { file })
            }
            LogTarget::Stdout => Ok(Self::Stdout),
            LogTarget::Stderr => Ok(Self::Stderr),
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}
