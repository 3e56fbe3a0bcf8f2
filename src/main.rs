use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use pdptw_planner::dimension::TimeSettings;
use pdptw_planner::error::RoutingError;
use pdptw_planner::extract::Extraction;
use pdptw_planner::haversine::HaversineMatrix;
use pdptw_planner::ingest::{CityTable, FleetConfig, build_problem, read_shipments};
use pdptw_planner::report::Report;
use pdptw_planner::solver::{SolveOptions, solve};
use pdptw_planner::travel::TravelMatrix;

/// Routes pickup/delivery shipments with capacity and time windows.
#[derive(Debug, Parser)]
#[command(name = "pdptw-planner", version)]
struct Args {
    /// Shipment CSV file.
    input: PathBuf,
    /// Number of complete rows to route.
    #[arg(long, default_value_t = 10)]
    limit: usize,
    #[arg(long, default_value_t = 2)]
    vehicles: usize,
    #[arg(long, default_value_t = 15000)]
    capacity: i64,
    /// Planning horizon in minutes.
    #[arg(long, default_value_t = 480)]
    horizon: i64,
    /// Maximum waiting at a node in minutes; negative means unlimited.
    #[arg(long, default_value_t = 30, allow_negative_numbers = true)]
    max_wait: i64,
    #[arg(long, default_value_t = 1000)]
    max_moves: usize,
    /// Local search wall-clock limit in seconds.
    #[arg(long, default_value_t = 10)]
    time_limit: u64,
    /// Print the result as JSON instead of a text report.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn time_settings(&self) -> TimeSettings {
        TimeSettings {
            horizon: self.horizon,
            max_wait: (self.max_wait >= 0).then_some(self.max_wait),
            ..TimeSettings::default()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(%err, "planner failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), RoutingError> {
    let records = read_shipments(File::open(&args.input)?)?;
    let fleet = FleetConfig {
        vehicles: args.vehicles,
        capacity: args.capacity,
        max_orders: args.limit,
        ..FleetConfig::default()
    };
    let (problem, _) = build_problem(records, &CityTable::default(), &fleet)?;

    let travel = TravelMatrix::from_problem(&problem, &HaversineMatrix);
    let settings = args.time_settings();
    let options = SolveOptions {
        max_moves: args.max_moves,
        time_limit: Some(Duration::from_secs(args.time_limit)),
        cancel: None,
    };

    let outcome = match solve(&problem, &travel, settings, options) {
        Err(err) if !matches!(err, RoutingError::Infeasible { .. } | RoutingError::Cancelled) => {
            return Err(err);
        }
        other => other,
    };

    let extraction = Extraction::from_outcome(&problem, &outcome);
    if args.json {
        let json = serde_json::to_string_pretty(&extraction)
            .map_err(|err| RoutingError::Io(err.into()))?;
        println!("{}", json);
    } else {
        print!("{}", Report(&extraction));
    }
    Ok(())
}
