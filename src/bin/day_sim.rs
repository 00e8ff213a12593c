use clap::Parser;
use ccsim_rs::chain::RunModel;
use ccsim_rs::engine::{CallCenterEngine, SimulationEngine};
use ccsim_rs::store::{ChainStore, FsStore};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "day-sim",
    about = "Simulate one call-center model without carryover"
)]
struct Args {
    /// Path to the model JSON
    #[arg(long)]
    model: PathBuf,

    /// Where to write the statistics JSON
    #[arg(long)]
    out: Option<PathBuf>,

    /// Override the model's sub-day count
    #[arg(long)]
    sub_days: Option<u32>,

    /// Disable tracing output
    #[arg(long)]
    quiet: bool,
}

fn run(args: &Args) -> Result<(), String> {
    let store = FsStore::new();
    let mut model = store.load_model(&args.model).map_err(|e| e.to_string())?;
    if let Some(n) = args.sub_days {
        model.sub_days = n;
    }

    let mut engine = CallCenterEngine::new();
    let handle = engine.submit(RunModel::plain(model))?;
    let stats = handle.finalize().map_err(|e| e.to_string())?;

    for c in &stats.customer_types {
        println!(
            "{}: arrivals={} served={} abandoned={}",
            c.name,
            c.total_arrivals(),
            c.total_served(),
            c.total_abandoned()
        );
    }
    if let Some(out) = &args.out {
        store.save_statistics(out, &stats).map_err(|e| e.to_string())?;
        println!("statistics written to {}", out.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let filter = if args.quiet {
        tracing_subscriber::EnvFilter::new("off")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
