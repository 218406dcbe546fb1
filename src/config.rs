//! Command line and runtime settings

use std::path::PathBuf;

use clap::Parser;
use tui_dispatch_debug::DebugCliArgs;

/// Weather lookup with city autocomplete and landmark backdrops
#[derive(Parser, Debug)]
#[command(name = "skylook")]
#[command(about = "Look up current weather by city or by your own location")]
pub struct Args {
    /// City to show at start-up instead of locating you
    #[arg(long, short)]
    pub city: Option<String>,

    /// Use this latitude as your position instead of IP geolocation
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Use this longitude as your position instead of IP geolocation
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Refresh interval in seconds (minimum 1)
    #[arg(long, short, default_value = "600", value_parser = clap::value_parser!(u64).range(1..))]
    pub refresh_interval: u64,

    /// Unsplash access key; backdrops are skipped without one
    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true)]
    pub unsplash_key: Option<String>,

    /// Write logs to this file (filter with RUST_LOG)
    #[arg(long, env = "SKYLOOK_LOG")]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub debug: DebugCliArgs,
}

/// Settings the effect handler needs while the app runs
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// Fixed position that replaces IP geolocation
    pub position: Option<(f64, f64)>,
    pub unsplash_key: Option<String>,
    pub refresh_interval: u64,
}

impl Settings {
    pub fn from_args(args: &Args) -> Self {
        Self {
            position: args.lat.zip(args.lon),
            unsplash_key: args
                .unsplash_key
                .clone()
                .filter(|key| !key.trim().is_empty()),
            refresh_interval: args.refresh_interval,
        }
    }
}
