use clap::Parser;
use ccsim_rs::chain::{
    CancelToken, CarryoverRule, CarryoverShape, ChainError, ChainOptions, ChainOrchestrator,
    ChainSpec, ChainState, DaySpec, ModelRef,
};
use ccsim_rs::engine::CallCenterEngine;
use ccsim_rs::store::FsStore;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(
    name = "chain-sim",
    about = "Run a chain of call-center days, carrying unresolved customers from day to day"
)]
struct Args {
    /// Path to chain.json
    #[arg(long, conflicts_with_all = ["model", "day0_stats"])]
    chain: Option<PathBuf>,

    /// Model of a single-day chain (instead of --chain)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Statistics that seed the single-day chain
    #[arg(long, requires = "model")]
    day0_stats: Option<PathBuf>,

    /// Where the single-day chain saves its statistics
    #[arg(long, requires = "model")]
    out: Option<PathBuf>,

    /// Retry probability per customer type, NAME=P; `*=P` applies to every type
    #[arg(long, value_name = "NAME=P", requires = "model")]
    carryover: Vec<String>,

    /// Append one line per day transition to this file
    #[arg(long)]
    log: Option<PathBuf>,

    /// With --log, simulate each day with a single sub-day
    #[arg(long, requires = "log")]
    single_sub_day_when_logging: bool,

    /// Cancel the chain after this much wall-clock time (seconds)
    #[arg(long)]
    time_limit_secs: Option<f64>,

    /// Poll interval while a day is running (ms)
    #[arg(long, default_value_t = 50)]
    poll_ms: u64,

    /// Disable tracing output
    #[arg(long)]
    quiet: bool,
}

fn parse_carryover(items: &[String]) -> Result<CarryoverShape, String> {
    let mut rules = BTreeMap::new();
    let mut global = None;
    for item in items {
        let Some((name, p)) = item.split_once('=') else {
            return Err(format!("--carryover {item:?}: expected NAME=P"));
        };
        let p: f64 = p
            .trim()
            .parse()
            .map_err(|_| format!("--carryover {item:?}: {p:?} is not a number"))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(format!("--carryover {item:?}: probability must be in [0, 1]"));
        }
        match name.trim() {
            "" => return Err(format!("--carryover {item:?}: missing customer type")),
            "*" => global = Some(p),
            name => {
                if rules.insert(name.to_string(), CarryoverRule::new(p)).is_some() {
                    return Err(format!("--carryover: {name:?} given twice"));
                }
            }
        }
    }
    match global {
        Some(_) if !rules.is_empty() => {
            Err("--carryover: `*` cannot be combined with per-type rules".to_string())
        }
        Some(p) => Ok(CarryoverShape::Global(CarryoverRule::new(p))),
        None => Ok(CarryoverShape::PerType(rules)),
    }
}

fn build_spec(args: &Args) -> Result<ChainSpec, String> {
    if let Some(path) = &args.chain {
        return ChainSpec::load_from_file(path).map_err(|e| e.to_string());
    }
    let Some(model) = &args.model else {
        return Err("either --chain or --model is required".to_string());
    };
    let mut spec = ChainSpec::new(".");
    spec.day0_statistics = args
        .day0_stats
        .as_ref()
        .map(|p| p.to_string_lossy().into_owned());
    let mut day = DaySpec::new(ModelRef::Explicit(model.to_string_lossy().into_owned()));
    day.statistics_output = args.out.as_ref().map(|p| p.to_string_lossy().into_owned());
    day.carryover = parse_carryover(&args.carryover)?;
    spec.days.push(day);
    spec.validate().map_err(|e| e.to_string())?;
    Ok(spec)
}

/// Ctrl-C and `--time-limit-secs` both end the chain through its cancel
/// token. A second Ctrl-C exits right away.
fn install_cancel_triggers(args: &Args, token: &CancelToken) -> Result<(), String> {
    let on_interrupt = token.clone();
    let installed = ctrlc::set_handler(move || {
        if on_interrupt.is_canceled() {
            std::process::exit(130);
        }
        eprintln!("interrupted, stopping the chain");
        on_interrupt.cancel();
    });
    if let Err(e) = installed {
        warn!(error = %e, "Ctrl-C will not cancel the chain");
    }

    if let Some(secs) = args.time_limit_secs {
        let limit = Duration::try_from_secs_f64(secs)
            .map_err(|_| format!("--time-limit-secs {secs}: expected a non-negative number"))?;
        let on_timeout = token.clone();
        thread::Builder::new()
            .name("chain-time-limit".to_string())
            .spawn(move || {
                thread::sleep(limit);
                if !on_timeout.is_canceled() {
                    info!(secs = limit.as_secs_f64(), "time limit reached, canceling the chain");
                    on_timeout.cancel();
                }
            })
            .map_err(|e| format!("cannot start the time limit thread: {e}"))?;
    }
    Ok(())
}

fn run(args: &Args) -> Result<(), String> {
    let spec = build_spec(args)?;
    let options = ChainOptions {
        poll_interval: Duration::from_millis(args.poll_ms),
        log_file: args.log.clone(),
        single_sub_day_when_logging: args.single_sub_day_when_logging,
    };
    let mut chain = ChainOrchestrator::new(CallCenterEngine::new(), FsStore::new(), options);
    chain.start(&spec).map_err(|e| e.to_string())?;
    install_cancel_triggers(args, &chain.cancel_token())?;

    let total = spec.day_count();
    let outcome = chain.run_blocking(|state| {
        if let ChainState::Loading { day } = state {
            println!("day {day}/{total}");
        }
    });
    for w in chain.warnings() {
        eprintln!("warning: {w}");
    }
    match outcome {
        Ok(()) => {}
        Err(e @ ChainError::Canceled { .. }) => return Err(format!("{e} (chain stopped)")),
        Err(e) => return Err(e.to_string()),
    }

    for (idx, stats) in chain.results().iter().enumerate() {
        let totals = stats.totals();
        println!(
            "day {}: arrivals={} served={} abandoned={}",
            idx + 1,
            totals.total_arrivals(),
            totals.total_served(),
            totals.total_abandoned()
        );
    }
    println!("chain simulation done");
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
