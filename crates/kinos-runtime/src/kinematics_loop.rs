//! [`KinematicsLoop`] – the per-tick refresh hook.
//!
//! The control loop owns a [`KinematicsLoop`] and calls
//! [`refresh`](KinematicsLoop::refresh) exactly once per tick with the latest
//! sensed joint angles, before any other tick-local work that needs joint
//! poses.  Each refresh:
//!
//! 1. **Accumulate** – runs [`ForwardKinematics::accumulate`] over every
//!    registered chain using the supplied angles.
//! 2. **Publish** – if every chain succeeded, swaps the union of the results
//!    into the [`TransformStore`] as one new snapshot.
//!
//! A failed refresh publishes nothing: readers keep seeing the last good
//! snapshot and the error is returned to the caller.
//!
//! # Example
//!
//! ```rust
//! use kinos_kinematics::ForwardKinematics;
//! use kinos_runtime::KinematicsLoop;
//! use kinos_types::JointAngles;
//!
//! let mut kl = KinematicsLoop::new(ForwardKinematics::nao());
//! let angles: JointAngles = kl
//!     .engine()
//!     .chains()
//!     .all_joints()
//!     .map(|j| (j.to_string(), 0.0))
//!     .collect();
//!
//! assert_eq!(kl.refresh(&angles).unwrap(), 1);
//! assert!((kl.get("HeadYaw").unwrap().translation().z - 126.5).abs() < 1e-9);
//! ```

use std::time::Duration;

use kinos_kinematics::{ForwardKinematics, StoreReader, Transform, TransformStore};
use kinos_types::{JointAngles, KinematicsError};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

use crate::config::{Config, ConfigError};

// ─────────────────────────────────────────────────────────────────────────────
// AngleSource
// ─────────────────────────────────────────────────────────────────────────────

/// Supplier of sensed joint angles, i.e. the perception side of the robot.
pub trait AngleSource: Send {
    /// Latest angle of every joint, in radians.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::SensorUnavailable`] when no reading can be
    /// produced this tick.
    fn read_angles(&mut self) -> Result<JointAngles, KinematicsError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// KinematicsLoop
// ─────────────────────────────────────────────────────────────────────────────

/// Owner of the forward-kinematics engine and the transform store it feeds.
pub struct KinematicsLoop {
    engine: ForwardKinematics,
    store: TransformStore,
}

impl KinematicsLoop {
    /// Wrap `engine`.  The store starts with every chain joint at identity.
    pub fn new(engine: ForwardKinematics) -> Self {
        let store = TransformStore::new(engine.chains().all_joints());
        Self { engine, store }
    }

    /// Build the engine described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Kinematics`] when the configured robot model
    /// is inconsistent.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.build_engine()?))
    }

    pub fn engine(&self) -> &ForwardKinematics {
        &self.engine
    }

    /// A read handle for other threads (e.g. a remote query server).
    pub fn reader(&self) -> StoreReader {
        self.store.reader()
    }

    /// Most recent root-relative transform of `joint`.
    ///
    /// # Errors
    ///
    /// - [`KinematicsError::UnknownJoint`] – `joint` is not in the robot model.
    /// - [`KinematicsError::NotYetComputed`] – `joint` is in the model but in
    ///   no chain (e.g. the NAO wrist-yaw joints).
    pub fn get(&self, joint: &str) -> Result<Transform, KinematicsError> {
        if !self.engine.geometry().contains(joint) {
            return Err(KinematicsError::UnknownJoint(joint.to_string()));
        }
        self.store.get(joint)
    }

    /// Recompute every chain from `angles` and publish the result.
    ///
    /// Returns the tick number of the published snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::MissingJointAngle`] naming the first chain
    /// joint absent from `angles`.  The store is left untouched.
    #[instrument(skip_all, fields(joints = angles.len()))]
    pub fn refresh(&mut self, angles: &JointAngles) -> Result<u64, KinematicsError> {
        let transforms = match self.engine.compute_all(angles) {
            Ok(transforms) => transforms,
            Err(e) => {
                warn!(error = %e, "refresh aborted; keeping previous snapshot");
                return Err(e);
            }
        };
        let published = transforms.len();
        let tick = self.store.publish(transforms, angles.clone());
        debug!(tick, published, "joint transforms refreshed");
        Ok(tick)
    }

    /// Read the latest angles from `source` and refresh.
    pub fn tick(&mut self, source: &mut dyn AngleSource) -> Result<u64, KinematicsError> {
        let angles = source.read_angles()?;
        self.refresh(&angles)
    }

    /// Tick every `period` until `shutdown` becomes `true` or its sender is
    /// dropped.
    ///
    /// Failed ticks are logged and skipped; the store keeps its last good
    /// snapshot.  Returns the number of successful refreshes.
    pub async fn run<S: AngleSource>(
        &mut self,
        mut source: S,
        period: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> u64 {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut refreshed = 0u64;

        info!(period_ms = period.as_millis() as u64, "kinematics loop started");
        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = interval.tick() => {
                    match self.tick(&mut source) {
                        Ok(_) => refreshed += 1,
                        Err(e) => warn!(error = %e, "kinematics tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(refreshed, "kinematics loop stopped");
        refreshed
    }
}
