//! Logging initialization.
//!
//! Installs the process-global `tracing` subscriber. Production defaults to
//! JSON output, development to human-readable output; `STAGEHAND_LOG_FORMAT`
//! overrides the choice and `RUST_LOG` controls filtering.

use crate::env::RuntimeMode;
use tracing_subscriber::EnvFilter;

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }

    fn default_for(mode: RuntimeMode) -> Self {
        if mode.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Install the global subscriber. Safe to call once per process; a second
/// call fails because a subscriber is already set.
pub fn init(mode: RuntimeMode) -> anyhow::Result<()> {
    let format = std::env::var("STAGEHAND_LOG_FORMAT")
        .map(|v| LogFormat::parse(&v))
        .unwrap_or_else(|_| LogFormat::default_for(mode));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("installing json subscriber: {e}")),
        LogFormat::Pretty => builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("installing subscriber: {e}")),
    }
}
