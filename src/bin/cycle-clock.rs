//! Demo CLI: times the bundled payloads with the adaptive clock.
//!
//! Usage:
//!   cycle-clock                        # Time every payload
//!   cycle-clock --list                 # List available payloads
//!   cycle-clock dot_product --threads 8
//!   RUST_LOG=debug cycle-clock         # Include per-cycle statistics

use clap::Parser;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use cycle_clock::prelude::*;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Payload to time (default: all)
    payload: Option<String>,

    /// List available payloads and exit
    #[clap(long, short = 'l')]
    list: bool,

    /// Worker threads per cycle
    #[clap(long, default_value_t = 1)]
    threads: usize,

    /// Task replicas per cycle
    #[clap(long, default_value_t = 10_000)]
    iterations: usize,

    #[clap(long, default_value_t = 25)]
    min_cycles: usize,

    #[clap(long, default_value_t = 100)]
    max_cycles: usize,

    #[clap(long, default_value_t = 20)]
    stat_cycles: usize,

    #[clap(long, default_value_t = 5)]
    stat_verify_cycles: usize,

    /// Per-cycle timeout magnitude
    #[clap(long, default_value_t = 1)]
    timeout: u64,

    /// Per-cycle timeout unit (ns, us, ms, s, minutes, hours, days)
    #[clap(long, default_value = "minutes")]
    timeout_unit: TimeUnit,

    /// Log the results once per payload instead of after every cycle
    #[clap(long)]
    quiet: bool,

    /// Pin workers to cores
    #[clap(long)]
    pin: bool,

    /// Input size handed to each payload
    #[clap(long, default_value_t = 1024)]
    size: usize,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .init();
}

fn run(args: Args) -> Result<(), ClockError> {
    let registry = build_registry();

    if args.list {
        for payload in registry.all() {
            println!(
                "{:<16} {:<8} {}",
                payload.name(),
                payload.category(),
                payload.description()
            );
        }
        return Ok(());
    }

    let clock = ClockBuilder::new()
        .print_intermediate(!args.quiet)
        .thread_pool_size(args.threads)
        .timeout(args.timeout, args.timeout_unit)
        .iterations_per_cycle(args.iterations)
        .min_cycles(args.min_cycles)
        .max_cycles(args.max_cycles)
        .stat_cycles(args.stat_cycles)
        .stat_verify_cycles(args.stat_verify_cycles)
        .pin_workers(args.pin)
        .build()?;

    let selected: Vec<&dyn Payload> = match args.payload.as_deref() {
        Some(name) => vec![registry
            .find(name)
            .ok_or_else(|| ClockError::UnknownPayload(name.to_string()))?],
        None => registry.all().iter().map(|p| p.as_ref()).collect(),
    };

    for payload in selected {
        if let Err(e) = payload.verify() {
            tracing::warn!("skipping '{}': {}", payload.name(), e);
            continue;
        }
        let results = payload.time(&clock, args.size)?;
        tracing::debug!(payload = payload.name(), cycles = results.len(), "run finished");
    }

    Ok(())
}

fn main() {
    init_tracing();

    if let Err(e) = run(Args::parse()) {
        tracing::error!("{}", e);
        if let ClockError::UnknownPayload(_) = e {
            tracing::error!("Available: {:?}", build_registry().list_names());
        }
        std::process::exit(1);
    }
}
