//! `kinos-runtime` – control-loop integration of the kinematics engine.
//!
//! # Modules
//!
//! - [`kinematics_loop`] – [`KinematicsLoop`][kinematics_loop::KinematicsLoop]:
//!   the refresh hook the control loop calls once per tick with the latest
//!   sensed joint angles.  Recomputes every chain and publishes a new
//!   transform snapshot, or publishes nothing if any chain fails.
//!   [`AngleSource`][kinematics_loop::AngleSource] abstracts the sensor side.
//! - [`config`] – [`Config`][config::Config]: tick rate and optional custom
//!   robot model, loaded from `~/.kinos/config.toml` with `KINOS_*`
//!   environment overrides.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter, and
//!   reports a second install as an error.

pub mod config;
pub mod kinematics_loop;
pub mod telemetry;

pub use config::{Config, ConfigError, JointConfig, RobotModelConfig};
pub use kinematics_loop::{AngleSource, KinematicsLoop};
pub use telemetry::{
    LogFormat, TelemetryError, TelemetrySettings, TracerProviderGuard, init_tracing,
    try_init_tracing,
};
