//! [`TransformStore`] – the published root-relative pose of every joint.
//!
//! The store is owned by the control loop, which is its only writer.  Each
//! [`publish`](TransformStore::publish) swaps in a complete, immutable
//! [`TransformSnapshot`]; nothing is ever updated in place.  Other threads
//! (e.g. a remote query server) hold a [`StoreReader`], which takes the read
//! lock only long enough to clone an `Arc` to the current snapshot.  A reader
//! therefore never sees transforms from two different refreshes mixed
//! together.
//!
//! # Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use kinos_kinematics::store::TransformStore;
//! use kinos_kinematics::transform::Transform;
//!
//! let mut store = TransformStore::new(["HeadYaw", "HeadPitch"]);
//! let reader = store.reader();
//! assert_eq!(reader.get("HeadYaw").unwrap(), Transform::identity());
//!
//! let transforms: HashMap<String, Transform> = HashMap::new();
//! store.publish(transforms, HashMap::new());
//! assert_eq!(reader.tick(), 1);
//! ```

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use kinos_types::{JointAngles, KinematicsError};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::transform::Transform;

// ────────────────────────────────────────────────────────────────────────────
// Snapshot
// ────────────────────────────────────────────────────────────────────────────

/// One published generation of the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformSnapshot {
    /// Refresh counter; 0 for the initial identity snapshot.
    pub tick: u64,
    pub published_at: DateTime<Utc>,
    /// Joint angles the transforms were computed from.
    pub angles: JointAngles,
    /// Root-relative transform per joint.
    pub transforms: HashMap<String, Transform>,
}

impl TransformSnapshot {
    /// # Errors
    ///
    /// Returns [`KinematicsError::NotYetComputed`] when `joint` is not covered
    /// by this snapshot.
    pub fn get(&self, joint: &str) -> Result<Transform, KinematicsError> {
        self.transforms
            .get(joint)
            .copied()
            .ok_or_else(|| KinematicsError::NotYetComputed(joint.to_string()))
    }
}

type Shared = Arc<RwLock<Arc<TransformSnapshot>>>;

// Poisoning cannot leave a half-written snapshot behind: writers only ever
// swap one `Arc` for another.
fn load(shared: &Shared) -> Arc<TransformSnapshot> {
    Arc::clone(&shared.read().unwrap_or_else(PoisonError::into_inner))
}

// ────────────────────────────────────────────────────────────────────────────
// TransformStore
// ────────────────────────────────────────────────────────────────────────────

/// Single-writer store of joint transforms.
///
/// Not `Clone`: there is exactly one owner that may publish.  Hand out
/// [`StoreReader`]s for concurrent read access.
#[derive(Debug)]
pub struct TransformStore {
    current: Shared,
}

impl TransformStore {
    /// Create a store in which every joint in `joints` maps to the identity
    /// transform.
    pub fn new<I, S>(joints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transforms = joints
            .into_iter()
            .map(|j| (j.into(), Transform::identity()))
            .collect();
        let initial = TransformSnapshot {
            tick: 0,
            published_at: Utc::now(),
            angles: JointAngles::new(),
            transforms,
        };
        Self {
            current: Arc::new(RwLock::new(Arc::new(initial))),
        }
    }

    /// Replace the whole store with `transforms`, computed from `angles`.
    ///
    /// Returns the tick number of the new snapshot.
    pub fn publish(&mut self, transforms: HashMap<String, Transform>, angles: JointAngles) -> u64 {
        let tick = load(&self.current).tick + 1;
        let snapshot = Arc::new(TransformSnapshot {
            tick,
            published_at: Utc::now(),
            angles,
            transforms,
        });
        *self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot;
        trace!(tick, "transform snapshot published");
        tick
    }

    /// Most recent transform of `joint`.
    pub fn get(&self, joint: &str) -> Result<Transform, KinematicsError> {
        load(&self.current).get(joint)
    }

    /// The current snapshot.
    pub fn snapshot(&self) -> Arc<TransformSnapshot> {
        load(&self.current)
    }

    /// A cheap, cloneable read handle that can be sent to other threads.
    pub fn reader(&self) -> StoreReader {
        StoreReader {
            current: Arc::clone(&self.current),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// StoreReader
// ────────────────────────────────────────────────────────────────────────────

/// Read-only view of a [`TransformStore`].
#[derive(Debug, Clone)]
pub struct StoreReader {
    current: Shared,
}

impl StoreReader {
    pub fn snapshot(&self) -> Arc<TransformSnapshot> {
        load(&self.current)
    }

    pub fn tick(&self) -> u64 {
        self.snapshot().tick
    }

    /// Most recent transform of `joint`.
    pub fn get(&self, joint: &str) -> Result<Transform, KinematicsError> {
        self.snapshot().get(joint)
    }

    /// Transforms of several joints, all taken from the same snapshot.
    pub fn get_many(&self, joints: &[&str]) -> Result<Vec<Transform>, KinematicsError> {
        let snapshot = self.snapshot();
        joints.iter().map(|j| snapshot.get(j)).collect()
    }

    /// Angle of `joint` in the most recently published refresh.
    pub fn angle(&self, joint: &str) -> Result<f64, KinematicsError> {
        self.snapshot()
            .angles
            .get(joint)
            .copied()
            .ok_or_else(|| KinematicsError::NotYetComputed(joint.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    fn shifted(z: f64) -> Transform {
        Transform::from_translation(Vector3::new(0.0, 0.0, z))
    }

    #[test]
    fn initial_state_is_identity_for_every_joint() {
        let store = TransformStore::new(["HeadYaw", "HeadPitch"]);
        assert_eq!(store.get("HeadYaw").unwrap(), Transform::identity());
        assert_eq!(store.get("HeadPitch").unwrap(), Transform::identity());
        assert_eq!(store.snapshot().tick, 0);
    }

    #[test]
    fn unknown_joint_is_not_yet_computed() {
        let store = TransformStore::new(["HeadYaw"]);
        assert_eq!(
            store.get("LWristYaw").unwrap_err(),
            KinematicsError::NotYetComputed("LWristYaw".to_string())
        );
    }

    #[test]
    fn publish_replaces_entire_map() {
        let mut store = TransformStore::new(["A", "B"]);
        let tick = store.publish(HashMap::from([("A".to_string(), shifted(1.0))]), JointAngles::new());
        assert_eq!(tick, 1);
        assert_eq!(store.get("A").unwrap(), shifted(1.0));
        // B was not in the published map, so it is gone.
        assert!(store.get("B").is_err());
    }

    #[test]
    fn reader_observes_publishes() {
        let mut store = TransformStore::new(["A"]);
        let reader = store.reader();
        store.publish(
            HashMap::from([("A".to_string(), shifted(5.0))]),
            HashMap::from([("A".to_string(), 0.25)]),
        );
        assert_eq!(reader.tick(), 1);
        assert_eq!(reader.get("A").unwrap(), shifted(5.0));
        assert!((reader.angle("A").unwrap() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn held_snapshot_is_not_affected_by_later_publish() {
        let mut store = TransformStore::new(["A", "B"]);
        let reader = store.reader();
        let before = reader.snapshot();

        store.publish(
            HashMap::from([
                ("A".to_string(), shifted(1.0)),
                ("B".to_string(), shifted(2.0)),
            ]),
            JointAngles::new(),
        );

        assert_eq!(before.tick, 0);
        assert_eq!(before.get("A").unwrap(), Transform::identity());
        assert_eq!(before.get("B").unwrap(), Transform::identity());
        let both = reader.get_many(&["A", "B"]).unwrap();
        assert_eq!(both, vec![shifted(1.0), shifted(2.0)]);
    }

    #[test]
    fn reader_is_usable_from_another_thread() {
        let mut store = TransformStore::new(["A"]);
        let reader = store.reader();
        store.publish(HashMap::from([("A".to_string(), shifted(3.0))]), JointAngles::new());

        let handle = std::thread::spawn(move || reader.get("A"));
        assert_eq!(handle.join().unwrap().unwrap(), shifted(3.0));
    }
}
