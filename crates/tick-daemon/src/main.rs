//! Timer daemon entry point.
//!
//! Hosts a timer service on a desktop or server target: a software tick
//! source plays the role of the 1 ms timer interrupt, and the main thread
//! runs the cooperative poll loop.

mod signals;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tick_common::config::{TimerConfig, TimerSpec};
use tick_common::time::{duration_from_ticks, has_elapsed, Ticks};
use tick_timers::{
    ExpiryAction, ExpiryHandler, SharedTimers, SoftwareTickSource, TimerId, TimerStatus,
    DEFAULT_CAPACITY,
};
use tracing::{info, warn};

use crate::signals::SignalHandler;

type Timers = SharedTimers<DEFAULT_CAPACITY, ExpiryLogger>;

/// Timer daemon command-line arguments.
#[derive(Parser, Debug)]
#[command(
    name = "tick-daemon",
    about = "Soft timer host - software tick source with a cooperative poll loop",
    version,
    long_about = None
)]
struct Args {
    /// Path to a timer configuration file (TOML).
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,

    /// Stop after this long, e.g. "5s" (overrides config file).
    #[arg(long, value_parser = humantime::parse_duration)]
    run_for: Option<Duration>,

    /// Print slot status as JSON on exit.
    #[arg(long)]
    dump_status: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, short = 'l', default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting timer daemon");

    let mut config = load_config(&args)?;
    if let Some(run_for) = args.run_for {
        config.run_for = Some(run_for);
    }
    config
        .validate(DEFAULT_CAPACITY)
        .context("Invalid timer configuration")?;

    info!(
        ?config.tick_period,
        ?config.poll_interval,
        timers = config.timers.len(),
        "Configuration loaded"
    );

    let signal_handler = SignalHandler::new().context("Failed to set up signal handlers")?;

    run_daemon(&config, &signal_handler, args.dump_status)
}

/// Initialize logging with the specified log level.
fn init_logging(level: &str) {
    let filter = format!("tick_daemon={level},tick_timers={level},tick_common={level}");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&filter)),
        )
        .with_target(true)
        .with_thread_names(true)
        .init();
}

/// Load configuration from file or use defaults.
///
/// Resolution priority (first match wins):
/// 1. Command-line `--config` argument
/// 2. `TIMER_CONFIG_PATH` environment variable
/// 3. Built-in defaults
fn load_config(args: &Args) -> Result<TimerConfig> {
    if let Some(config_path) = &args.config {
        info!(?config_path, "Loading config from command-line argument");
        return TimerConfig::from_file(config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    if let Ok(env_path) = std::env::var("TIMER_CONFIG_PATH") {
        let config_path = PathBuf::from(&env_path);
        info!(?config_path, "Loading config from TIMER_CONFIG_PATH");
        return TimerConfig::from_file(&config_path)
            .with_context(|| format!("Failed to load config from {config_path:?}"));
    }

    info!("No config file found, using built-in defaults");
    Ok(TimerConfig::default())
}

/// Register every configured timer; each gets a handler that logs its expiry.
fn register_timers(timers: &Timers, config: &TimerConfig) -> Result<Vec<(TimerId, String)>> {
    config
        .timers
        .iter()
        .map(|spec| -> Result<(TimerId, String)> {
            let id = timers
                .critical_section(|svc| {
                    svc.register_with_callback(
                        spec.period_ticks(config.tick_period),
                        spec.mode,
                        ExpiryLogger::new(spec),
                    )
                })
                .with_context(|| format!("Failed to register timer '{}'", spec.name))?;
            info!(%id, name = %spec.name, period = ?spec.period, mode = %spec.mode, "Timer registered");
            Ok((id, spec.name.clone()))
        })
        .collect()
}

/// Expiry handler for configured timers: logs each expiry by name.
#[derive(Debug)]
struct ExpiryLogger {
    name: String,
    action: ExpiryAction,
    fired: u64,
}

impl ExpiryLogger {
    fn new(spec: &TimerSpec) -> Self {
        Self {
            name: spec.name.clone(),
            action: if spec.restart {
                ExpiryAction::Restart
            } else {
                ExpiryAction::Continue
            },
            fired: 0,
        }
    }
}

impl ExpiryHandler for ExpiryLogger {
    fn on_expiry(&mut self, id: TimerId) -> ExpiryAction {
        self.fired += 1;
        info!(%id, name = %self.name, fired = self.fired, "Timer expired");
        self.action
    }
}

fn run_daemon(config: &TimerConfig, signal_handler: &SignalHandler, dump_status: bool) -> Result<()> {
    let timers = Timers::default();
    let registered = register_timers(&timers, config)?;
    if registered.is_empty() {
        warn!("No timers configured; the daemon will only count ticks");
    }

    let mut tick_source = SoftwareTickSource::new(config.tick_period);
    tick_source
        .start(timers.clone())
        .context("Failed to start tick source")?;

    let started = Instant::now();
    let mut last_status: Ticks = 0;

    info!("Entering main poll loop");
    while !signal_handler.shutdown_requested() {
        timers.poll();

        if let Some(run_for) = config.run_for {
            if started.elapsed() >= run_for {
                info!(elapsed = ?started.elapsed(), "Run duration reached");
                signal_handler.request_shutdown();
                break;
            }
        }

        let tick = timers.current_tick();
        if status_due(tick, last_status, config.status_interval_ticks) {
            log_status(&timers, &registered, config.tick_period);
            last_status = tick;
        }

        thread::sleep(config.poll_interval);
    }

    info!("Shutting down...");
    tick_source.stop();

    let metrics = timers.metrics();
    info!(
        ticks = tick_source.ticks_delivered(),
        ticks_dropped = tick_source.ticks_dropped(),
        expirations = metrics.expirations,
        restarts = metrics.restarts,
        poll_hit_ratio = metrics.poll_hit_ratio().unwrap_or(0.0),
        signals = signal_handler.signal_count(),
        uptime_ms = started.elapsed().as_millis(),
        "Daemon shutdown complete"
    );

    if dump_status {
        let snapshots: Vec<_> = timers.critical_section(|svc| svc.snapshots().collect());
        println!(
            "{}",
            serde_json::to_string_pretty(&snapshots).context("Failed to serialize status")?
        );
    }

    Ok(())
}

/// Whether a periodic status line is due; wraparound-safe. Zero disables.
fn status_due(tick: Ticks, last_status: Ticks, interval: Ticks) -> bool {
    interval > 0 && has_elapsed(tick, last_status, interval)
}

fn log_status(timers: &Timers, registered: &[(TimerId, String)], tick_period: Duration) {
    timers.critical_section(|svc| {
        for (id, name) in registered {
            let (Ok(status), Ok(remaining)) = (svc.status(*id), svc.time_remaining(*id)) else {
                continue;
            };
            // Remaining ticks are only meaningful while counting down
            if status == TimerStatus::Running {
                info!(
                    %id,
                    name = %name,
                    %status,
                    remaining,
                    remaining_time = ?duration_from_ticks(remaining, tick_period),
                    tick = svc.current_tick(),
                    "Periodic status"
                );
            } else {
                info!(%id, name = %name, %status, tick = svc.current_tick(), "Periodic status");
            }
        }
    });
}
