//! File-backed tracing setup. The terminal belongs to the TUI, so log lines go
//! to a file in the data directory instead of stderr.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Environment variable holding a tracing filter directive.
pub const LOG_ENV_VAR: &str = "CHANT_CATALOG_LOG";

/// Install the global subscriber. `configured_level` comes from the config
/// file and is only used when the environment variable is unset.
pub fn init_logging(log_path: &Path, configured_level: Option<&str>) -> Result<()> {
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent).context("failed to create log directory")?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .with(build_filter(configured_level))
        .try_init()
        .context("failed to install tracing subscriber")
}

fn build_filter(configured_level: Option<&str>) -> EnvFilter {
    if std::env::var_os(LOG_ENV_VAR).is_some() {
        return EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .with_env_var(LOG_ENV_VAR)
            .from_env_lossy();
    }
    match configured_level {
        Some(level) => EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .parse_lossy(level),
        None => EnvFilter::new("info"),
    }
}
