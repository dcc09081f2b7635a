//! Tracing setup
//!
//! Level comes from `STOREKEEP_LOG`, then the config `log_level`, then `warn`.

use storekeep_core::Config;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "STOREKEEP_LOG";
const DEFAULT_LEVEL: &str = "warn";

/// Initialize stderr logging (ignored if a subscriber is already set)
pub fn init(config: &Config) {
    let level = resolve_level(std::env::var(LOG_ENV).ok(), config.log_level.as_deref());
    let env_filter = EnvFilter::new(filter_directive(&level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .with_writer(std::io::stderr)
        .try_init();
}

fn resolve_level(env_level: Option<String>, config_level: Option<&str>) -> String {
    env_level
        .filter(|level| !level.is_empty())
        .or_else(|| config_level.map(str::to_string))
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

fn filter_directive(level: &str) -> String {
    format!("storekeep_core={},storekeep_cli={}", level, level)
}
