//! Farm scene viewer
//!
//! Usage: `farm-viewer [config.toml]`. Without an argument the viewer reads
//! `farm-viewer.toml` from the working directory if present, otherwise the
//! built-in defaults.

use farm_viewer::{Viewer, ViewerConfig};
use std::path::PathBuf;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match ViewerConfig::resolve(std::env::args().nth(1).map(PathBuf::from)) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let result = Viewer::new(config).map_err(anyhow::Error::from).and_then(Viewer::run);
    if let Err(e) = result {
        log::error!("Viewer error: {:#}", e);
        std::process::exit(1);
    }
}
