mod app;
mod config;
mod report;

use std::path::PathBuf;

use log::LevelFilter;
use taskdeck_logging::{ts_info, ts_warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(config::DEFAULT_CONFIG_FILE));
    let loaded = config::load(&path)?;
    let found = loaded.is_some();
    let config = loaded.unwrap_or_default();

    taskdeck_logging::initialize(config.log_destination(), LevelFilter::Info);
    if found {
        ts_info!("loaded config from {:?}", path);
    } else {
        ts_warn!("config {:?} not found, using defaults", path);
    }

    app::run(config).await
}
