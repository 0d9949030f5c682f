mod cli;
mod config;
mod geo;
mod model;
mod tui;

use std::fs;
use std::path::Path;
use std::process;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use geo::{CachedGeocoder, GeoCache, Geocoder, IpLocator, Locator, NominatimClient};
use tui::Launch;

fn main() {
    let cli = Cli::parse();
    if cli.to.len() > 2 {
        eprintln!("At most two --to stops are supported.");
        process::exit(2);
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };

    let app_dir = config::app_dir();
    if let Some(dir) = &app_dir {
        // Cache and log live here. Losing them degrades, not fails.
        if let Err(e) = fs::create_dir_all(dir) {
            eprintln!("Could not create {}: {e}", dir.display());
        }
    }
    init_tracing(&config, app_dir.as_deref());

    let geocoder: Arc<dyn Geocoder> = {
        let client = NominatimClient::new(&config.geocoder.base_url, config.geocoder.limit);
        match open_cache(&config, app_dir.as_deref()) {
            Some(cache) => Arc::new(CachedGeocoder::new(client, cache)),
            None => Arc::new(client),
        }
    };
    let locator: Arc<dyn Locator> = Arc::new(IpLocator::new(&config.locate.url));

    let launch = Launch {
        geocoder,
        locator,
        locate_on_start: cli.locate_override().unwrap_or(config.locate.enabled),
        start_text: cli.start,
        stop_texts: cli.to,
    };

    if let Err(e) = tui::run(launch) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Logs go to `~/.wayfarer/wayfarer.log`; the terminal belongs to the UI.
/// `RUST_LOG` overrides the configured level.
fn init_tracing(config: &Config, app_dir: Option<&Path>) {
    let Some(dir) = app_dir else {
        return;
    };
    let file = match fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("wayfarer.log"))
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Could not open log file: {e}");
            return;
        }
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

fn open_cache(config: &Config, app_dir: Option<&Path>) -> Option<GeoCache> {
    if !config.cache.enabled {
        return None;
    }
    let dir = app_dir?;
    match GeoCache::open(&dir.join("geocache.sqlite"), config.cache.max_age_days) {
        Ok(cache) => Some(cache),
        Err(e) => {
            tracing::warn!(error = %e, "geocode cache unavailable, going live only");
            None
        }
    }
}
