use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use smart_park::{logging, AllocationManager, Command, Engine, LotConfig, OccupancyView};

/// Check vehicles in and out of a parking lot backed by a ledger file.
///
/// Each invocation reloads the ledger, restores vehicles that are still
/// parked, applies one operation and rewrites the ledger.
#[derive(Parser, Debug)]
#[command(name = "parkctl", version, about)]
struct Cli {
    /// JSON lot configuration; missing fields take their defaults
    #[arg(long, env = "PARK_CONFIG")]
    config: Option<PathBuf>,

    /// Total number of slots [default: 1000]
    #[arg(long, env = "PARK_TOTAL_SLOTS")]
    total: Option<u32>,

    /// How many of the slots are VIP [default: 100]
    #[arg(long, env = "PARK_VIP_SLOTS")]
    vip_slots: Option<u32>,

    /// Ledger file [default: parking_logs.txt]
    #[arg(long, env = "PARK_LEDGER")]
    ledger: Option<PathBuf>,

    /// Print status and analytics as JSON
    #[arg(long)]
    json: bool,

    /// Log debug events
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Park a vehicle
    CheckIn {
        plate: String,
        #[arg(long)]
        vip: bool,
    },
    /// Release a parked vehicle
    CheckOut { plate: String },
    /// List parked vehicles by slot
    Status,
    /// Average stay and peak arrival hour
    Analytics,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    config: &'a LotConfig,
    occupied: usize,
    free_regular: usize,
    free_vip: usize,
    vehicles: &'a [OccupancyView],
}

fn load_config(path: &Path) -> anyhow::Result<LotConfig> {
    let file = File::open(path).with_context(|| format!("opening config {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing config {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    });

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LotConfig::default(),
    };
    if let Some(total) = cli.total {
        config.total_slots = total;
    }
    if let Some(vip) = cli.vip_slots {
        config.vip_slots = vip;
    }
    if let Some(ledger) = cli.ledger {
        config.ledger_path = ledger;
    }
    let lot = AllocationManager::open(config)?;
    let mut engine = Engine::new(lot);

    match cli.command {
        Action::CheckIn { plate, vip } => {
            let event = engine.process_command(Command::check_in(plate, vip));
            println!("{event}");
            if event.is_rejected() {
                std::process::exit(1);
            }
        }
        Action::CheckOut { plate } => {
            let event = engine.process_command(Command::check_out(plate));
            println!("{event}");
            if event.is_rejected() {
                std::process::exit(1);
            }
        }
        Action::Status if cli.json => {
            let rows = engine.lot.occupancy_snapshot();
            let report = StatusReport {
                config: engine.lot.config(),
                occupied: rows.len(),
                free_regular: engine.lot.free_regular(),
                free_vip: engine.lot.free_vip(),
                vehicles: &rows,
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Action::Status => {
            let rows = engine.lot.occupancy_snapshot();
            println!(
                "{} occupied, {} regular free, {} VIP free",
                rows.len(),
                engine.lot.free_regular(),
                engine.lot.free_vip()
            );
            for row in rows {
                println!("Slot {}: {} ({})", row.slot_id, row.plate, row.tier);
            }
        }
        Action::Analytics if cli.json => {
            println!("{}", serde_json::to_string_pretty(&engine.analytics())?);
        }
        Action::Analytics => {
            println!("{}", engine.analytics());
        }
    }

    if !engine.lot.ledger().is_durable() {
        eprintln!("warning: ledger could not be written, changes were not saved");
    }
    Ok(())
}
