//! `turret` – entry point for the balloon-targeting robot.
//!
//! 1. Initialises tracing (see `turret_runtime::telemetry`).
//! 2. Loads `~/.turret/config.toml`, writing a default file on first run.
//! 3. Opens the frame source and the serial link.
//! 4. Runs the targeting loop with the operator console attached.  Ctrl-C
//!    is treated like `q`: the robot is stopped before exit.

mod config;
mod console;

use std::process::ExitCode;
use std::sync::atomic::Ordering;

use colored::Colorize;
use tracing::{info, warn};
use turret_hal::{FrameDirCamera, SerialLink};
use turret_runtime::{
    ChannelOperator, LogSink, OperatorInput, RunSummary, SnapshotSink, TurretLoop, init_tracing,
};
use turret_types::TurretError;

fn main() -> ExitCode {
    let tracing_guard = init_tracing("turret");
    if tracing_guard.is_exporting() {
        info!("exporting run and tick spans over OTLP");
    }

    print_banner();

    let cfg = load_config();

    let (mut operator, keys, shutdown) = ChannelOperator::pair();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping the robot …".yellow().bold());
        shutdown.store(true, Ordering::SeqCst);
    }) {
        warn!(error = %e, "failed to install Ctrl-C handler; use 'q' to stop");
    }
    if let Err(e) = console::spawn(keys) {
        warn!(error = %e, "operator console unavailable; use Ctrl-C to stop");
    }
    console::print_help();

    match run(&cfg, &mut operator) {
        Ok(summary) => {
            print_summary(&summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Run aborted".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(cfg: &config::Config, operator: &mut dyn OperatorInput) -> Result<RunSummary, TurretError> {
    let Some(frame_dir) = &cfg.source.frame_dir else {
        return Err(TurretError::Acquisition {
            camera: "none".to_string(),
            details: "no frame source configured; set source.frame_dir or TURRET_FRAME_DIR"
                .to_string(),
        });
    };
    let camera = FrameDirCamera::open(frame_dir)?.looping(cfg.source.looping);

    println!(
        "  Opening link {} (allow {} ms for controller reset) …",
        cfg.link.port.bold(),
        cfg.link.open_settle_ms
    );
    let link = SerialLink::from_config(&cfg.link)?;

    let mut turret = TurretLoop::new(camera, link, cfg.loop_config()).with_sink(LogSink);
    if let Some(dir) = &cfg.telemetry.snapshot_dir {
        turret = turret.with_sink(SnapshotSink::new(dir, cfg.telemetry.snapshot_every)?);
        info!(dir = %dir.display(), every = cfg.telemetry.snapshot_every, "snapshots enabled");
    }
    println!("  Run id {}\n", turret.run_id().to_string().dimmed());

    turret.run(operator)
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

fn load_config() -> config::Config {
    let path = config::config_path();
    match config::load() {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", path.display().to_string().bold());
            cfg
        }
        Ok(None) => {
            let mut cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  {} Default config written to {}",
                    "✓".green().bold(),
                    path.display().to_string().bold()
                ),
                Err(e) => println!("{}: {}", "Error saving config".red(), e),
            }
            config::apply_env_overrides(&mut cfg);
            cfg
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using default configuration.");
            let mut cfg = config::Config::default();
            config::apply_env_overrides(&mut cfg);
            cfg
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Output
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"  ______                     __ "#.bold().red());
    println!("{}", r#" /_  __/_ _________ ___ ____/ /_"#.bold().red());
    println!("{}", r#"  / / / // / __/ __/ -_) __/ __/"#.bold().red());
    println!("{}", r#" /_/  \_,_/_/ /_/  \__/\__/\__/ "#.bold().red());
    println!();
    println!(
        "  {} {}",
        "turret".bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Autonomous balloon-targeting loop");
    println!();
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{}", "Run finished".bold().underline());
    println!("  exit          : {:?}", summary.exit);
    println!("  ticks         : {}", summary.ticks);
    println!("  shots fired   : {}", summary.shots_fired.to_string().yellow());
    println!("  commands sent : {}", summary.commands_sent);
    println!("  link failures : {}", summary.link_failures);
    println!("  final state   : {}", summary.final_state);
    println!();
}
