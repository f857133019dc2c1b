//! Runtime configuration – reads/writes `~/.kinos/config.toml`.
//!
//! ```toml
//! tick_hz = 100.0
//!
//! [robot.joints.J1]
//! offset = [0.0, 0.0, 100.0]
//! axis = "z"
//!
//! [robot.joints.J2Pitch]
//! offset = [50.0, 0.0, 0.0]   # axis derived from the name: y
//!
//! [robot.chains]
//! Arm = ["J1", "J2Pitch"]
//! ```
//!
//! When `[robot]` is absent the built-in NAO model is used.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use kinos_kinematics::{ChainRegistry, ForwardKinematics, GeometryTable};
use kinos_types::{Axis, KinematicsError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error type
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can arise while loading, saving or applying configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("Invalid robot model: {0}")]
    Kinematics(#[from] KinematicsError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Config
// ─────────────────────────────────────────────────────────────────────────────

/// One joint of a configured robot model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointConfig {
    /// Offset from the parent joint, millimetres.
    pub offset: [f64; 3],
    /// Rotation axis; derived from the joint name when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub axis: Option<Axis>,
}

/// A robot model given in configuration instead of the built-in NAO.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotModelConfig {
    #[serde(default)]
    pub joints: BTreeMap<String, JointConfig>,
    /// Chain name → joint names, root to tip.
    #[serde(default)]
    pub chains: BTreeMap<String, Vec<String>>,
}

/// Persisted runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Control-loop rate in Hz.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robot: Option<RobotModelConfig>,
}

fn default_tick_hz() -> f64 {
    100.0
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            robot: None,
        }
    }
}

impl Config {
    /// Interval between control ticks.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] when `tick_hz` is not a positive number or is
    /// so large that the period rounds down to zero.
    pub fn tick_period(&self) -> Result<Duration, ConfigError> {
        let invalid = || {
            ConfigError::Invalid(format!(
                "tick_hz must give a positive tick period, got {}",
                self.tick_hz
            ))
        };
        if !self.tick_hz.is_finite() || self.tick_hz <= 0.0 {
            return Err(invalid());
        }
        match Duration::try_from_secs_f64(1.0 / self.tick_hz) {
            Ok(period) if !period.is_zero() => Ok(period),
            _ => Err(invalid()),
        }
    }

    /// Reject values the runtime cannot use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.tick_period().map(|_| ())
    }

    /// Build the forward-kinematics engine for the configured robot.
    ///
    /// # Errors
    ///
    /// Propagates [`KinematicsError::UnknownJointAxis`] for joints whose axis
    /// is neither given nor derivable, and chain validation failures.
    pub fn build_engine(&self) -> Result<ForwardKinematics, KinematicsError> {
        let Some(robot) = &self.robot else {
            return Ok(ForwardKinematics::nao());
        };
        let geometry = GeometryTable::new(
            robot
                .joints
                .iter()
                .map(|(name, joint)| (name.clone(), joint.offset, joint.axis)),
        )?;
        let chains = ChainRegistry::new(robot.chains.clone());
        ForwardKinematics::new(geometry, chains)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Load / save
// ─────────────────────────────────────────────────────────────────────────────

/// Return the path to `~/.kinos/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".kinos").join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, ConfigError> {
    load_from(&config_path())
}

/// Load the config from a specific path, applying `KINOS_*` overrides.
pub fn load_from(path: &Path) -> Result<Option<Config>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut cfg: Config = toml::from_str(&raw)?;
    apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(Some(cfg))
}

/// Apply `KINOS_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `KINOS_TICK_HZ` | `tick_hz` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides_from(cfg, |key| std::env::var(key).ok());
}

fn apply_overrides_from(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("KINOS_TICK_HZ")
        && let Ok(hz) = v.parse::<f64>()
    {
        cfg.tick_hz = hz;
    }
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let raw = toml::to_string_pretty(cfg)?;
    fs::write(path, raw).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}
