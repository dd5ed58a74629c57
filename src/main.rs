use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::Parser;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

mod config;
mod control;
mod sampler;
mod shutdown;
mod state;
mod usage;
mod workers;

use config::{Config, SampleSource};
use state::SharedState;
use workers::LogSink;

#[derive(Parser)]
#[command(name = "coremon")]
#[command(about = "Per-core CPU usage monitor with fan-out consumers and a watchdog liveness guard", long_about = None)]
struct Cli {
    /// Sampling interval in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    interval_ms: u64,

    /// Watchdog interval in milliseconds (default: twice the sampling
    /// interval; must be strictly greater than it)
    #[arg(long)]
    watchdog_ms: Option<u64>,

    /// Heartbeat log interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    log_interval_ms: u64,

    /// Heartbeat log file
    #[arg(short, long, default_value = "cpu_usage.log")]
    log_file: PathBuf,

    /// Counter source
    #[arg(short, long, value_enum, default_value = "proc-stat")]
    source: SampleSource,

    /// Accept control commands on stdin (n = continue, q = quit)
    #[arg(long)]
    interactive: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::new(
        cli.interval_ms,
        cli.watchdog_ms,
        cli.log_interval_ms,
        cli.log_file,
        cli.source,
        cli.interactive,
    )?;

    let num_cpus = config::discover_num_cpus();
    let sink = Arc::new(
        LogSink::open(&config.log_path)
            .with_context(|| format!("cannot open log file {:?}", config.log_path))?,
    );
    let state = Arc::new(SharedState::new(num_cpus));
    shutdown::install_signal_handler(Arc::clone(&state))?;

    let control_rx = config.interactive.then(control::spawn_stdin_listener);
    let cpu_sampler = sampler::for_source(config.source, num_cpus);

    let reader = {
        let state = Arc::clone(&state);
        let interval = config.sample_interval;
        thread::spawn(move || workers::reader::run(cpu_sampler, &state, control_rx, interval))
    };
    let printer = {
        let state = Arc::clone(&state);
        thread::spawn(move || workers::printer::run(&state, &mut io::stdout()))
    };
    let analyzer = {
        let state = Arc::clone(&state);
        thread::spawn(move || workers::analyzer::run(&state))
    };
    let watchdog = {
        let state = Arc::clone(&state);
        let interval = config.watchdog_interval;
        thread::spawn(move || workers::watchdog::run(&state, interval))
    };
    let logger = {
        let state = Arc::clone(&state);
        let sink = Arc::clone(&sink);
        let interval = config.log_interval;
        thread::spawn(move || workers::logger::run(&state, &sink, interval))
    };

    // Every loop must have terminated before the sink is released.
    let reader_result = reader
        .join()
        .map_err(|_| anyhow!("reader thread panicked"))?;
    let printer_result = printer
        .join()
        .map_err(|_| anyhow!("printer thread panicked"))?;
    let stats = analyzer
        .join()
        .map_err(|_| anyhow!("analyzer thread panicked"))?;
    watchdog
        .join()
        .map_err(|_| anyhow!("watchdog thread panicked"))?;
    logger
        .join()
        .map_err(|_| anyhow!("logger thread panicked"))?;

    if let Err(err) = printer_result {
        eprintln!("coremon: console output failed: {}", err);
    }
    let summary = format!(
        "[{}] shutdown after {} cycles, peak usage {:.2}%",
        Utc::now(),
        stats.cycles,
        stats.peak_overall()
    );
    if let Err(err) = sink.append(&summary) {
        eprintln!("coremon: final log write failed: {}", err);
    }

    reader_result.context("cpu sampling failed")?;
    Ok(())
}
