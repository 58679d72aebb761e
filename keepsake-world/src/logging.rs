//! Tracing setup for hosts.

use keepsake_core::config::GeneralConfig;
use tracing_subscriber::EnvFilter;

/// Install a fmt subscriber filtered at `config.log_level`. `RUST_LOG`
/// overrides the configured level when set.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init_tracing(config: &GeneralConfig) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.log_level;
        EnvFilter::new(format!("keepsake_core={level},keepsake_world={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}
