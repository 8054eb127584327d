//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout carries only JSON output.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

/// Variable consulted when `--log-level` is not given.
pub const LOG_ENV: &str = "RULEWRIGHT_LOG";

const DEFAULT_LEVEL: &str = "info";

/// Install the global subscriber.
///
/// `RUST_LOG` wins when set. Otherwise the filter is `level`, then
/// `RULEWRIGHT_LOG`, then `info`.
pub fn init(level: Option<&str>) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => {
            let directive = level
                .map(str::to_string)
                .or_else(|| std::env::var(LOG_ENV).ok())
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string());
            EnvFilter::try_new(&directive)
                .with_context(|| format!("invalid log level/filter '{directive}'"))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
