use anyhow::{anyhow, Result};
use plumbline_core::config::{AppConfig, LoadOptions, LogFormat};
use tracing::Level;

/// Installs the global subscriber on stderr so stdout stays reserved for
/// command output. Falls back to defaults when the config does not load; the
/// command itself reports the config error.
pub fn init_from_env() {
    let config = AppConfig::load(LoadOptions::default()).unwrap_or_default();
    if let Err(error) = init(&config) {
        eprintln!("{error}");
    }
}

pub fn init(config: &AppConfig) -> Result<()> {
    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(log_level);

    let installed = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    installed.map_err(|error| anyhow!("failed to initialize logging: {error}"))
}
