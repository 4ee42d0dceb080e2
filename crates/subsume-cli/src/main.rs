//! `subsume` – behavior-based control loop runner.
//!
//! The composition root for the whole stack.  It:
//!
//! 1. Initialises structured logging (`RUST_LOG`, `SUBSUME_LOG_FORMAT=json`).
//! 2. Loads `~/.subsume/config.toml` (writing defaults on first run) and
//!    applies `SUBSUME_*` environment overrides.
//! 3. Wires the simulated rig: sensors → hub → behaviors → arbitrator →
//!    controller → drive.  Real device drivers plug in behind the same
//!    `SensorSource`/`ActuatorSink` ports.
//! 4. Intercepts **Ctrl-C** to request a cooperative stop; the controller
//!    finishes its cycle and issues one final `Stop`.
//! 5. Waits for Enter as a start gate, then runs cycles until stopped.

mod config;

use std::time::Duration;

use tracing::warn;

use subsume_behavior::{
    Arbitrator, Behavior, DefaultWander, LineGuard, ObstacleAvoidance, TargetSeek,
};
use subsume_hal::{CameraFrame, SimRig};
use subsume_runtime::{Controller, ControllerConfig, MonotonicClock, SensorHub, init_tracing};
use subsume_types::Action;

use crate::config::PolicyChoice;

fn main() {
    init_tracing();
    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!("  Config loaded from {}", config::config_path().display());
            cfg
        }
        Ok(None) => {
            let cfg = config::Config::default();
            match config::save(&cfg) {
                Ok(()) => println!(
                    "  No config found; defaults written to {}",
                    config::config_path().display()
                ),
                Err(e) => println!("  Could not write default config: {}", e),
            }
            cfg
        }
        Err(e) => {
            println!("  Config error: {}", e);
            println!("  Using default configuration.");
            config::Config::default()
        }
    };

    // ── Simulated rig ─────────────────────────────────────────────────────
    // Open floor ahead, dark floor under every IR element, nothing red in
    // view: the wander baseline carries the run until Ctrl-C.
    let (sensors, drive, log) = SimRig::new()
        .with_proximity_cm(120.0)
        .with_reflectance_counts(vec![1800, 1850, 1800, 1900])
        .with_camera_frame(CameraFrame {
            width: 4,
            height: 4,
            data: vec![40; 48],
        })
        .build();

    let hub = SensorHub::new(sensors)
        .with_poll_timeout(Duration::from_millis(cfg.sensor_timeout_ms))
        .with_reflectance_full_scale(cfg.reflectance_full_scale);

    // Registration order is the tie-break order: safety first.
    let wander_seed = cfg
        .wander_seed
        .unwrap_or_else(|| chrono::Utc::now().timestamp_millis() as u64);
    let behaviors: Vec<Box<dyn Behavior>> = vec![
        Box::new(
            LineGuard::new()
                .with_line_threshold(cfg.line_threshold)
                .with_priority(cfg.priorities.line_guard),
        ),
        Box::new(
            ObstacleAvoidance::new()
                .with_threshold_cm(cfg.obstacle_threshold_cm)
                .with_priority(cfg.priorities.obstacle_avoidance),
        ),
        Box::new(
            TargetSeek::new()
                .with_red_threshold(cfg.red_ratio_threshold)
                .with_priority(cfg.priorities.target_seek),
        ),
        Box::new(
            DefaultWander::new(wander_seed)
                .with_baseline(cfg.wander_baseline)
                .with_priority(cfg.priorities.default_wander),
        ),
    ];

    let arbitrator = match cfg.policy {
        PolicyChoice::MaxWeight => Arbitrator::max_weight(),
        PolicyChoice::WeightedRandom => Arbitrator::weighted_random(cfg.arbitration_seed),
    };

    let mut controller = Controller::new(
        hub,
        behaviors,
        arbitrator,
        Box::new(drive),
        Box::new(MonotonicClock::new()),
        ControllerConfig {
            cycle_period: Duration::from_millis(cfg.cycle_period_ms),
        },
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let cancel = controller.cancel_flag();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("  Ctrl-C received – stopping after the current cycle …");
        cancel.request_stop();
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful stop on Ctrl-C will not be available");
    }

    // ── Start gate ────────────────────────────────────────────────────────
    wait_for_enter("  Press Enter to start (Ctrl-C stops): ");

    println!(
        "  Running – policy {}, cycle period {} ms.\n",
        cfg.policy, cfg.cycle_period_ms
    );

    match controller.run() {
        Ok(cycles) => {
            println!();
            println!("  Clean shutdown after {} cycle(s).", cycles);
            println!("  {}", describe_final_action(log.last()));
        }
        Err(e) => {
            println!();
            println!("  Fatal control fault: {}", e);
            println!("  {}", describe_final_action(log.last()));
            std::process::exit(1);
        }
    }
}

/// One-line drive-state summary for the shutdown report.
fn describe_final_action(last: Option<Action>) -> String {
    match last {
        None => "No action was ever applied.".to_string(),
        Some(Action::Stop) => "Motors confirmed stopped.".to_string(),
        Some(other) => format!("Motors left on '{}' (no final stop reached the drive).", other),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("{}", r#"              __                         "#);
    println!("{}", r#"   _______  _/ /_  ___ __  ______ _  ___ "#);
    println!("{}", r#"  / ___/ / / / __ \/ ___/ / / / __` |/ _ \"#);
    println!("{}", r#" (__  ) /_/ / /_/ (__  ) /_/ / / / / /  __/"#);
    println!("{}", r#"/____/\__,_/_.___/____/\__,_/_/ /_/\___/ "#);
    println!();
    println!("  subsume v{}", env!("CARGO_PKG_VERSION"));
    println!("  Behavior-based robot control loop");
    println!();
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn wait_for_enter(msg: &str) {
    use std::io::{BufRead, Write};
    print!("{}", msg);
    std::io::stdout().flush().ok();
    let mut line = String::new();
    let _ = std::io::stdin().lock().read_line(&mut line);
}
