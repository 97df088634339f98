//! Fire-to-smoke pipeline.
//!
//! Ingests the day's incident feed, simulates smoke plumes at three horizons
//! per incident, and fuses incidents, plumes and meta into one GeoJSON map.

mod pipeline;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use firesmoke_common::{DaySelector, DataLayout, FireSmokeConfig};
use fusion::FusionOutput;
use pipeline::Pipeline;

#[derive(Parser, Debug)]
#[command(name = "firesmoke-pipeline")]
#[command(about = "Fire incident to smoke plume pipeline")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml", env = "FIRESMOKE_CONFIG")]
    config: String,

    /// Log level (overrides logging.level; RUST_LOG wins over both)
    #[arg(long, env = "FIRESMOKE_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch or reuse the incident snapshot
    Ingest {
        /// Day to ingest, YYYY-MM-DD (default: today)
        #[arg(long)]
        day: Option<DaySelector>,
    },
    /// Simulate all horizons for every incident of the day
    Simulate {
        #[arg(long)]
        day: Option<DaySelector>,
    },
    /// Fuse incidents, plumes and meta into one collection
    Fuse {
        /// Day to fuse, YYYY-MM-DD or "latest"
        #[arg(long, default_value = "latest")]
        day: DaySelector,

        /// Persist the collection (default: geojson.save_to_disk)
        #[arg(long)]
        save: Option<bool>,
    },
    /// Ingest, simulate and fuse, then list the produced artifacts
    Run {
        #[arg(long)]
        day: Option<DaySelector>,
    },
}

/// `latest` means today for stages that may fetch.
fn fetch_day(day: Option<DaySelector>) -> Option<NaiveDate> {
    match day {
        Some(DaySelector::Date(day)) => Some(day),
        Some(DaySelector::Latest) | None => None,
    }
}

fn init_tracing(config: &FireSmokeConfig, override_level: Option<&str>) {
    let level = override_level.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if config.logging.format.eq_ignore_ascii_case("pretty") {
        builder.pretty().init();
    } else {
        builder.json().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = FireSmokeConfig::load(&args.config)?;
    init_tracing(&config, args.log_level.as_deref());

    info!(config = %args.config, data_root = %config.data.root.display(), "Starting firesmoke pipeline");

    match args.command {
        Command::Ingest { day } => {
            let resolution = Pipeline::from_config(&config)?.ingest(fetch_day(day)).await?;
            println!("{}", resolution.path.display());
        }
        Command::Simulate { day } => {
            let (_, report) = Pipeline::from_config(&config)?.simulate(fetch_day(day)).await?;
            for path in report.bundle_paths() {
                println!("{}", path.display());
            }
            anyhow::ensure!(
                report.failed() == 0,
                "{} of {} incidents failed",
                report.failed(),
                report.incidents.len()
            );
        }
        Command::Fuse { day, save } => {
            let layout = DataLayout::new(&config.data);
            let save = save.unwrap_or(config.geojson.save_to_disk);
            match pipeline::fuse(&layout, day, save)? {
                FusionOutput::Persisted(path) => println!("{}", path.display()),
                FusionOutput::Collection(collection) => {
                    println!("{}", serde_json::to_string_pretty(&collection)?)
                }
            }
        }
        Command::Run { day } => {
            let summary = Pipeline::from_config(&config)?
                .run(fetch_day(day), config.geojson.save_to_disk)
                .await?;
            for path in summary.artifacts() {
                println!("{}", path.display());
            }
            info!(
                day = %summary.snapshot.day,
                completed = summary.report.completed(),
                failed = summary.report.failed(),
                "Pipeline run finished"
            );
            anyhow::ensure!(
                summary.report.failed() == 0,
                "{} of {} incidents failed",
                summary.report.failed(),
                summary.report.incidents.len()
            );
        }
    }

    Ok(())
}
