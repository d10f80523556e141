use std::str::FromStr;
use tracing::Level;

use crate::config::LoggingSettings;

/// Installs the global fmt subscriber. Safe to call more than once; only the
/// first call takes effect.
pub fn init_logging(settings: &LoggingSettings) {
    let level = parse_level(&settings.level);
    if tracing_subscriber::fmt()
        .with_max_level(level)
        .try_init()
        .is_err()
    {
        tracing::debug!("Logging already initialised, keeping existing subscriber");
    }
}

fn parse_level(level: &str) -> Level {
    Level::from_str(level.trim()).unwrap_or(Level::INFO)
}
