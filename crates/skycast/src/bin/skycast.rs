//! Skycast CLI
//!
//! Usage:
//!   skycast run                          # Fetch + forecast every interval until Ctrl+C
//!   skycast fetch                        # Fetch one reading and append it to history
//!   skycast forecast [--hours 6] [-f fmt]  # Forecast from stored history
//!   skycast classify -H 85 -p 999 -d -4  # Classify a single snapshot

use argh::FromArgs;
use std::path::PathBuf;
use tokio::sync::watch;

use skycast::report::{self, OutputFormat};
use skycast::scheduler::{run_loop, Station};
use skycast::{classify, Config};

/// Skycast - weather station poller and short-horizon forecaster
#[derive(FromArgs)]
struct Args {
    /// path to the configuration file (default: ./skycast.yaml if present)
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    #[argh(subcommand)]
    command: Option<Command>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Run(RunArgs),
    Fetch(FetchArgs),
    Forecast(ForecastArgs),
    Classify(ClassifyArgs),
}

/// Poll the sensor and forecast on a fixed interval (default)
#[derive(FromArgs)]
#[argh(subcommand, name = "run")]
struct RunArgs {}

/// Fetch a single reading and append it to the history file
#[derive(FromArgs)]
#[argh(subcommand, name = "fetch")]
struct FetchArgs {}

/// Forecast from the stored history without fetching
#[derive(FromArgs)]
#[argh(subcommand, name = "forecast")]
struct ForecastArgs {
    /// hours to project ahead (default: from config)
    #[argh(option)]
    hours: Option<u32>,

    /// output format: table, json, yaml (default: table)
    #[argh(option, short = 'f', default = "OutputFormat::Table")]
    format: OutputFormat,
}

/// Classify a single snapshot with the condition rules
#[derive(FromArgs)]
#[argh(subcommand, name = "classify")]
struct ClassifyArgs {
    /// temperature in °C
    #[argh(option, short = 't', default = "20.0")]
    temp: f64,

    /// relative humidity in %
    #[argh(option, short = 'H')]
    humidity: f64,

    /// pressure in hPa
    #[argh(option, short = 'p')]
    pressure: f64,

    /// pressure change over the last hour in hPa
    #[argh(option, short = 'd', default = "0.0")]
    change: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();

    let config = match Config::resolve(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Command::Run(RunArgs {})) {
        Command::Run(_) => run(config).await,
        Command::Fetch(_) => {
            let station = Station::from_config(&config)?;
            if station.fetch().await.is_none() {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Forecast(cmd) => {
            let mut station = Station::from_config(&config)?;
            if let Some(hours) = cmd.hours {
                station.horizon_hours = hours;
            }
            if let Some(forecast) = station.forecast()? {
                println!("{}", report::render(&forecast, cmd.format)?);
            }
            Ok(())
        }
        Command::Classify(cmd) => {
            let a = classify(cmd.temp, cmd.humidity, cmd.pressure, cmd.change);
            println!(
                "{} {} ({}% confidence, pressure {})",
                a.condition.icon(),
                a.condition,
                a.confidence,
                a.pressure_trend
            );
            Ok(())
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    println!("{}\n", report::banner(&config));

    let station = Station::from_config(&config)?;
    log::info!(
        "History at {} (keeping {} readings)",
        station.store.path().display(),
        station.store.retention()
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(());
    ctrlc::set_handler(move || {
        log::info!("Received Ctrl+C, shutting down gracefully...");
        let _ = shutdown_tx.send(());
    })?;

    run_loop(&station, config.fetch_interval(), shutdown_rx).await;
    Ok(())
}
