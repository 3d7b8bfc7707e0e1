//! Isobar CLI
//!
//! Usage:
//!   isobar serve [-c config] [-p port]          # Run the REST API
//!   isobar gradients [--compare a,b] [-f json]  # Print current gradients
//!   isobar locations [-f table|json]            # List configured locations
//!   isobar history <id> <start> <end>           # Archived pressure as JSON

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use argh::FromArgs;
use isobar::api::{self, ApiState};
use isobar::config::ServiceConfig;
use isobar::gradient::{format_gradient, format_pressure};
use isobar::store::JsonFilePersistence;
use isobar::{ConfigurationApi, Dashboard, LocationStore, OpenMeteoClient, PressureSource};

/// Isobar - coastal pressure gradient tracker
#[derive(FromArgs)]
struct Args {
    /// show version information
    #[argh(switch, short = 'V')]
    version: bool,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Serve(ServeArgs),
    Gradients(GradientsArgs),
    Locations(LocationsArgs),
    History(HistoryArgs),
}

/// Run the REST API server
#[derive(FromArgs)]
#[argh(subcommand, name = "serve")]
struct ServeArgs {
    /// path to a YAML config file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// port to listen on (overrides config and ISOBAR_PORT)
    #[argh(option, short = 'p')]
    port: Option<u16>,
}

/// Fetch and print current gradients from the home location
#[derive(FromArgs)]
#[argh(subcommand, name = "gradients")]
struct GradientsArgs {
    /// path to a YAML config file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// comma-separated location ids to compare instead of the dashboard list
    #[argh(option)]
    compare: Option<String>,

    /// output format: table, json (default: table)
    #[argh(option, short = 'f', default = "String::from(\"table\")")]
    format: String,
}

/// List configured locations and settings
#[derive(FromArgs)]
#[argh(subcommand, name = "locations")]
struct LocationsArgs {
    /// path to a YAML config file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// output format: table, json (default: table)
    #[argh(option, short = 'f', default = "String::from(\"table\")")]
    format: String,
}

/// Print archived hourly pressure for one location
#[derive(FromArgs)]
#[argh(subcommand, name = "history")]
struct HistoryArgs {
    /// path to a YAML config file
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// location id
    #[argh(positional)]
    id: String,

    /// start date (YYYY-MM-DD)
    #[argh(positional)]
    start: String,

    /// end date (YYYY-MM-DD)
    #[argh(positional)]
    end: String,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ServiceConfig> {
    ServiceConfig::load(path.map(PathBuf::as_path)).context("loading configuration")
}

fn open_services(config: &ServiceConfig) -> anyhow::Result<ApiState> {
    let data_path = config.data_path();
    let store = LocationStore::open(Arc::new(JsonFilePersistence::new(&data_path)))
        .with_context(|| format!("opening {}", data_path.display()))?;
    let store = Arc::new(store);

    let client = OpenMeteoClient::new(&config.upstream).context("creating HTTP client")?;
    let source = PressureSource::new(Arc::new(client)).with_series(config.upstream.include_series);

    Ok(ApiState {
        configuration: ConfigurationApi::new(store.clone()),
        dashboard: Dashboard::new(store, source),
    })
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_ref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    let state = open_services(&config)?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, shutting down gracefully...");
        shutdown_tx.send(()).ok();
    })?;

    api::serve(state, config.socket_addr(), shutdown_rx).await?;
    Ok(())
}

async fn gradients(args: GradientsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let state = open_services(&config)?;
    let compare = args.compare.as_deref().map(api::split_ids);
    let snapshot = state.dashboard.current_gradients(compare).await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    let home = &snapshot.home_location;
    println!(
        "Home: {} ({})  {}  at {}",
        home.name,
        home.code,
        format_pressure(snapshot.home_reading.pressure),
        snapshot.home_reading.timestamp
    );
    if snapshot.gradients.is_empty() {
        println!("No comparison locations configured.");
    }
    for g in &snapshot.gradients {
        let compare = &g.gradient.compare_location;
        println!(
            "  {:<24} {:>12}  {:>12}  {}",
            format!("{} ({})", compare.name, compare.code),
            format_pressure(g.gradient.compare_pressure),
            format_gradient(g.gradient.difference),
            g.label
        );
    }
    Ok(())
}

async fn locations(args: LocationsArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let state = open_services(&config)?;
    let doc = state.configuration.list_locations().await?;

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!(
        "{:<6} {:<24} {:<5} {:>10} {:>11} {:<9} {:>8}",
        "ID", "NAME", "CODE", "LAT", "LON", "TYPE", "ELEV"
    );
    for l in &doc.locations {
        let mut marker = String::new();
        if l.id == doc.settings.home_location_id {
            marker.push_str(" [home]");
        }
        if doc.settings.dashboard_location_ids.contains(&l.id) {
            marker.push_str(" [dashboard]");
        }
        println!(
            "{:<6} {:<24} {:<5} {:>10.4} {:>11.4} {:<9} {:>8}{}",
            l.id,
            l.name,
            l.code,
            l.latitude,
            l.longitude,
            l.location_type,
            l.elevation.map(|e| format!("{} m", e)).unwrap_or_default(),
            marker
        );
    }
    println!("Refresh interval: {}s", doc.settings.api_refresh_interval);
    Ok(())
}

async fn history(args: HistoryArgs) -> anyhow::Result<()> {
    let config = load_config(args.config.as_ref())?;
    let state = open_services(&config)?;
    let series = state
        .dashboard
        .history(&args.id, &args.start, &args.end)
        .await?;
    println!("{}", serde_json::to_string_pretty(&series)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Args = argh::from_env();

    if args.version {
        println!("isobar {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let default_level = match args.command {
        Some(Command::Serve(_)) => "info",
        _ => "warn",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();

    match args.command {
        Some(Command::Serve(a)) => serve(a).await,
        Some(Command::Gradients(a)) => gradients(a).await,
        Some(Command::Locations(a)) => locations(a).await,
        Some(Command::History(a)) => history(a).await,
        None => {
            println!("isobar {}", env!("CARGO_PKG_VERSION"));
            println!("Run 'isobar --help' for usage.");
            Ok(())
        }
    }
}
