use clap::Parser;
use fire_watch_core::{
    FileEventLog, SchedulingModel, ShutdownSignal, Simulation, SimulationConfig, TextRenderer,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Wildfire sensor grid simulation
///
/// With no flags, runs the reference setup (30x30 grid, 1 s sensor polls,
/// an ignition every 3 s, a render every 5 s) until Ctrl-C or SIGTERM, then
/// stops every unit and prints a summary.
#[derive(Parser, Debug)]
#[command(name = "fire-watch")]
#[command(about = "Concurrent wildfire sensor grid simulation", long_about = None)]
struct Args {
    /// Grid edge length
    #[arg(short, long, default_value_t = 30)]
    grid_size: usize,

    /// Interval between two polls of the same sensor (ms)
    #[arg(long, default_value_t = 1000)]
    watch_interval_ms: u64,

    /// Interval between random ignition attempts (ms)
    #[arg(long, default_value_t = 3000)]
    ignition_interval_ms: u64,

    /// Interval between periodic grid renders (ms)
    #[arg(long, default_value_t = 5000)]
    render_interval_ms: u64,

    /// Event log file (appended)
    #[arg(short, long, default_value = "fire_events.log")]
    log_file: String,

    /// Fixed seed for the ignition generator
    #[arg(short, long)]
    seed: Option<u64>,

    /// Sweep sensors with a pool of this many workers instead of one thread per cell
    #[arg(short, long)]
    pool_workers: Option<usize>,

    /// Stop gracefully after this many seconds and print a summary
    #[arg(short, long)]
    duration: Option<f32>,
}

impl Args {
    fn to_config(&self) -> SimulationConfig {
        let mut config = SimulationConfig::default()
            .with_grid_size(self.grid_size)
            .with_watch_interval(Duration::from_millis(self.watch_interval_ms))
            .with_ignition_interval(Duration::from_millis(self.ignition_interval_ms))
            .with_render_interval(Duration::from_millis(self.render_interval_ms))
            .with_log_file(&self.log_file);
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(workers) = self.pool_workers {
            config = config.with_scheduling(SchedulingModel::PooledSweep { workers });
        }
        config
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where the platform has it
async fn termination() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal as unix_signal, SignalKind};
        match unix_signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = signal::ctrl_c() => {}
                    _ = terminate.recv() => {}
                }
                return;
            }
            Err(e) => warn!("Could not listen for SIGTERM: {e}"),
        }
    }
    signal::ctrl_c().await.ok();
}

/// Trigger `shutdown` from a background thread once the process is asked to stop
fn install_signal_handler(shutdown: ShutdownSignal) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            runtime.block_on(async {
                termination().await;
                info!("Shutting down...");
                shutdown.trigger();
            });
        })?;
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = args.to_config();

    let duration = match args.duration.map(Duration::try_from_secs_f32).transpose() {
        Ok(duration) => duration,
        Err(e) => {
            eprintln!("Invalid --duration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let event_log = Arc::new(FileEventLog::open(&config.log_file));
    let renderer = Arc::new(TextRenderer::stdout());

    let sim = match Simulation::start(config, event_log, renderer) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Could not start simulation: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = install_signal_handler(sim.shutdown_signal()) {
        warn!("Could not install signal handler: {e}; stop with --duration or kill");
    }

    match duration {
        Some(duration) => sim.run_for(duration),
        None => sim.wait(),
    }

    match sim.shutdown() {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Simulation ended abnormally: {e}");
            ExitCode::FAILURE
        }
    }
}
