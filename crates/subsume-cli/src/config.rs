//! Configuration Vault – reads/writes `~/.subsume/config.toml`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Arbitration policy choice as persisted in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PolicyChoice {
    #[default]
    MaxWeight,
    WeightedRandom,
}

impl std::fmt::Display for PolicyChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyChoice::MaxWeight => write!(f, "max_weight"),
            PolicyChoice::WeightedRandom => write!(f, "weighted_random"),
        }
    }
}

/// Per-behavior priorities.  Higher wins at equal match degree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Priorities {
    #[serde(default = "default_line_priority")]
    pub line_guard: u32,
    #[serde(default = "default_obstacle_priority")]
    pub obstacle_avoidance: u32,
    #[serde(default = "default_seek_priority")]
    pub target_seek: u32,
    #[serde(default = "default_wander_priority")]
    pub default_wander: u32,
}

impl Default for Priorities {
    fn default() -> Self {
        Self {
            line_guard: default_line_priority(),
            obstacle_avoidance: default_obstacle_priority(),
            target_seek: default_seek_priority(),
            default_wander: default_wander_priority(),
        }
    }
}

/// Persisted user configuration stored in `~/.subsume/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Minimum duration of one control cycle, in milliseconds.
    #[serde(default = "default_cycle_period_ms")]
    pub cycle_period_ms: u64,

    /// Per-sensor poll budget, in milliseconds.
    #[serde(default = "default_sensor_timeout_ms")]
    pub sensor_timeout_ms: u64,

    /// Obstacle avoidance triggers strictly below this distance.
    #[serde(default = "default_obstacle_threshold_cm")]
    pub obstacle_threshold_cm: f32,

    /// Line guard triggers when any reflectance ratio falls below this.
    #[serde(default = "default_line_threshold")]
    pub line_threshold: f32,

    /// Target seek triggers strictly above this red-pixel ratio.
    #[serde(default = "default_red_ratio_threshold")]
    pub red_ratio_threshold: f32,

    /// DefaultWander's constant match degree.
    #[serde(default = "default_wander_baseline")]
    pub wander_baseline: f32,

    /// Raw count the IR array reads over fully dark floor.
    #[serde(default = "default_reflectance_full_scale")]
    pub reflectance_full_scale: u16,

    /// How the arbitrator picks the winning behavior.
    #[serde(default)]
    pub policy: PolicyChoice,

    /// RNG seed for weighted-random arbitration.
    #[serde(default)]
    pub arbitration_seed: u64,

    /// RNG seed for the wander action sequence.  Absent means seed from the
    /// wall clock at startup, so each run wanders differently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wander_seed: Option<u64>,

    #[serde(default)]
    pub priorities: Priorities,
}

fn default_cycle_period_ms() -> u64 {
    500
}
fn default_sensor_timeout_ms() -> u64 {
    50
}
fn default_obstacle_threshold_cm() -> f32 {
    15.0
}
fn default_line_threshold() -> f32 {
    0.2
}
fn default_red_ratio_threshold() -> f32 {
    0.05
}
fn default_wander_baseline() -> f32 {
    0.1
}
fn default_reflectance_full_scale() -> u16 {
    2000
}
fn default_line_priority() -> u32 {
    3
}
fn default_obstacle_priority() -> u32 {
    2
}
fn default_seek_priority() -> u32 {
    2
}
fn default_wander_priority() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cycle_period_ms: default_cycle_period_ms(),
            sensor_timeout_ms: default_sensor_timeout_ms(),
            obstacle_threshold_cm: default_obstacle_threshold_cm(),
            line_threshold: default_line_threshold(),
            red_ratio_threshold: default_red_ratio_threshold(),
            wander_baseline: default_wander_baseline(),
            reflectance_full_scale: default_reflectance_full_scale(),
            policy: PolicyChoice::default(),
            arbitration_seed: 0,
            wander_seed: None,
            priorities: Priorities::default(),
        }
    }
}

/// Return the path to `~/.subsume/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
/// Extracted for testability without mutating environment variables.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".subsume").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

/// Load the config from a specific path.
pub(crate) fn load_from(path: &PathBuf) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `SUBSUME_*` environment variable overrides to `cfg`.
///
/// Supported variables:
///
/// | Variable | Config field |
/// |---|---|
/// | `SUBSUME_CYCLE_PERIOD_MS` | `cycle_period_ms` |
/// | `SUBSUME_POLICY` | `policy` (`max_weight` / `weighted_random`) |
/// | `SUBSUME_ARBITRATION_SEED` | `arbitration_seed` |
/// | `SUBSUME_WANDER_SEED` | `wander_seed` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("SUBSUME_CYCLE_PERIOD_MS")
        && let Ok(ms) = v.parse::<u64>() {
            cfg.cycle_period_ms = ms;
        }
    if let Ok(v) = std::env::var("SUBSUME_POLICY") {
        match v.as_str() {
            "max_weight" => cfg.policy = PolicyChoice::MaxWeight,
            "weighted_random" => cfg.policy = PolicyChoice::WeightedRandom,
            _ => {}
        }
    }
    if let Ok(v) = std::env::var("SUBSUME_ARBITRATION_SEED")
        && let Ok(seed) = v.parse::<u64>() {
            cfg.arbitration_seed = seed;
        }
    if let Ok(v) = std::env::var("SUBSUME_WANDER_SEED")
        && let Ok(seed) = v.parse::<u64>() {
            cfg.wander_seed = Some(seed);
        }
}

/// Save the config to disk, creating `~/.subsume/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

/// Save the config to a specific path.
pub(crate) fn save_to(cfg: &Config, path: &PathBuf) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
