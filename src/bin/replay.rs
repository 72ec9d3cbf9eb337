use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use smart_park::script::read_script;
use smart_park::{logging, AllocationManager, Engine, FileStore, Ledger, LotConfig, ManualClock};
use tracing::info;

/// Replay a timestamped check-in/check-out script through a fresh lot.
///
/// The lot clock follows the script timestamps, so stays and peak hours
/// come out exactly as recorded. The ledger is kept in memory unless
/// `--ledger` is given.
#[derive(Parser, Debug)]
#[command(name = "replay", version, about)]
struct Args {
    /// CSV script with columns timestamp,action,plate,vip
    script: PathBuf,

    #[arg(long, default_value_t = 1000)]
    total: u32,

    #[arg(long, default_value_t = 100)]
    vip_slots: u32,

    /// Write the resulting ledger here
    #[arg(long)]
    ledger: Option<PathBuf>,

    /// Print every event
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init(tracing::Level::INFO);

    let file = File::open(&args.script)
        .with_context(|| format!("opening script {}", args.script.display()))?;
    let commands = read_script(file);
    info!(commands = commands.len(), "script loaded");

    let start = commands.first().map(|c| c.at).unwrap_or_default();
    let clock = Arc::new(ManualClock::new(start));
    let config = LotConfig::new(args.total, args.vip_slots);
    let ledger = match &args.ledger {
        Some(path) => {
            // Start from an empty file rather than appending to an old history
            std::fs::write(path, "")
                .with_context(|| format!("truncating ledger {}", path.display()))?;
            Ledger::open(FileStore::new(path))
        }
        None => Ledger::in_memory(),
    };
    let mut engine = Engine::new(AllocationManager::with_clock(config, ledger, clock.clone())?);

    for timed in commands {
        clock.set(timed.at);
        let event = engine.process_command(timed.command);
        if args.verbose {
            println!("{}  {}", timed.at, event);
        }
    }

    let stats = engine.stats();
    println!("=== Replay Summary ===");
    println!("Commands:   {}", stats.processed());
    println!("Parked:     {}", stats.parked);
    println!("Released:   {}", stats.released);
    println!("Rejected:   {}", stats.rejected);
    println!("Still in:   {}", engine.occupied());
    println!("{}", engine.analytics());
    println!("State hash: {:016x}", engine.state_hash());
    Ok(())
}
