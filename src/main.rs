mod config;
mod consumers;
mod dop;
mod fetch;
mod geodesy;
mod logging;
mod scheduler;
mod store;
mod telemetry;

#[cfg(test)]
mod testing;

use clap::{Args, Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;

use crate::config::{Config, ConfigError};
use crate::consumers::{ArchiveWriter, Dashboard};
use crate::fetch::N2yoClient;
use crate::scheduler::{PacingPolicy, Scheduler};
use crate::store::TelemetryStore;
use crate::telemetry::{MetricEngine, MetricField};

#[derive(Parser)]
#[command(name = "sat-o-meter")]
#[command(about = "Live satellite telemetry from a position API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a config file
    Validate { config: String },
    /// Poll the configured satellites and show live telemetry
    Run(RunArgs),
}

#[derive(Args)]
struct RunArgs {
    /// YAML config file; built-in defaults are used without one
    #[arg(long)]
    config: Option<String>,
    #[arg(long, env = "N2YO_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    /// Observer latitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lat: Option<f64>,
    /// Observer longitude in degrees
    #[arg(long, allow_negative_numbers = true)]
    lon: Option<f64>,
    /// Observer altitude in meters
    #[arg(long, allow_negative_numbers = true)]
    alt: Option<f64>,
    /// Seconds of positions per fetch
    #[arg(long)]
    seconds: Option<u32>,
    /// NORAD catalog ids to poll
    #[arg(long = "sat-ids", num_args = 1..)]
    sat_ids: Option<Vec<u32>>,
    /// Dashboard columns
    #[arg(long, value_enum, num_args = 1..)]
    show: Option<Vec<MetricField>>,
    /// Archive snapshots as JSON once per window
    #[arg(long)]
    store: bool,
    /// No dashboard; log to stderr instead of a file
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { config } => validate(&config),
        Commands::Run(args) => run(args).await,
    }
}

fn validate(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Config error: {}", e);
        return ExitCode::FAILURE;
    }

    println!("Config is valid");
    println!("  observer: {} @ {} m", config.observer.coordinates, config.observer.altitude_m);
    println!("  window: {} s", config.window_seconds);
    println!("  carrier: {} Hz", config.carrier_frequency_hz);
    println!("  satellites ({}): {:?}", config.satellites.len(), config.satellites);
    let columns: Vec<String> = config.show.iter().map(|f| f.to_string()).collect();
    println!("  show: {}", columns.join(", "));
    println!(
        "  api key: {}",
        if config.api_key().is_ok() { "set" } else { "missing" }
    );
    if config.archive.enabled {
        println!("  archive: {}", config.archive.folder.display());
    }
    ExitCode::SUCCESS
}

fn load_config(args: &RunArgs) -> Result<Config, ConfigError> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if args.lat.is_some() || args.lon.is_some() || args.alt.is_some() {
        let mut position = config.observer_position()?;
        position.latitude_deg = args.lat.unwrap_or(position.latitude_deg);
        position.longitude_deg = args.lon.unwrap_or(position.longitude_deg);
        position.altitude_m = args.alt.unwrap_or(position.altitude_m);
        config.set_observer_position(position);
    }
    if let Some(key) = &args.api_key {
        config.api.key = Some(key.clone());
    }
    if let Some(seconds) = args.seconds {
        config.window_seconds = seconds;
    }
    if let Some(ids) = &args.sat_ids {
        config.satellites = ids.clone();
    }
    if let Some(show) = &args.show {
        config.show = show.clone();
    }
    if args.store {
        config.archive.enabled = true;
    }

    config.validate()?;
    config.api_key()?;
    Ok(config)
}

async fn run(args: RunArgs) -> ExitCode {
    let config = match load_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let logging = if args.headless {
        logging::init_stderr().map(|_| None)
    } else {
        logging::init_file(&config.logging.folder).map(Some)
    };
    match logging {
        Ok(Some(path)) => println!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Failed to initialize logging: {}", e);
            return ExitCode::FAILURE;
        }
    }

    let observer = match config.observer_position() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let client = match config
        .api_key()
        .map_err(|e| e.to_string())
        .and_then(|key| {
            N2yoClient::new(&config.api.base_url, key, config.api.timeout).map_err(|e| e.to_string())
        }) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to create API client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    log::info!(
        "Observer at {:.4}, {:.4} ({} m), {} satellites, {} s window",
        observer.latitude_deg,
        observer.longitude_deg,
        observer.altitude_m,
        config.satellites.len(),
        config.window_seconds
    );

    let store = TelemetryStore::new();
    let engine = MetricEngine::new(observer)
        .with_carrier(config.carrier_frequency_hz)
        .with_link_budget(config.link_budget);
    let scheduler = Scheduler::new(
        client,
        store.clone(),
        engine,
        config.satellites.clone(),
        config.window_seconds,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut tasks = vec![tokio::spawn(scheduler.run(shutdown_rx.clone()))];

    if config.archive.enabled {
        match ArchiveWriter::new(config.archive.folder.clone()) {
            Ok(writer) => {
                let period = PacingPolicy::new(Duration::from_secs(config.window_seconds.into()))
                    .sleep_after(Duration::ZERO);
                tasks.push(tokio::spawn(writer.run(store.clone(), period, shutdown_rx.clone())));
            }
            Err(e) => log::error!(
                "Archive disabled, cannot create {}: {}",
                config.archive.folder.display(),
                e
            ),
        }
    }

    if !args.headless {
        let dashboard = Dashboard::new(
            store.clone(),
            config.show.clone(),
            observer.to_ecef(),
            config.dashboard.refresh,
        );
        let rx = shutdown_rx.clone();
        tasks.push(tokio::spawn(async move {
            if let Err(e) = dashboard.run(rx).await {
                log::error!("Dashboard failed: {}", e);
            }
        }));
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Interrupted, shutting down"),
        Err(e) => log::error!("Failed to listen for Ctrl-C: {}", e),
    }
    let _ = shutdown_tx.send(true);

    for task in tasks {
        if let Err(e) = task.await {
            log::error!("Task failed: {}", e);
        }
    }

    println!("Stopped");
    ExitCode::SUCCESS
}
