//! [`GeometryTable`] – static per-joint offsets and rotation axes.
//!
//! Every joint of the robot model has a fixed offset from its parent joint
//! (millimetres, in the parent's body frame) and a single rotation axis.
//! Both are resolved once when the table is built and never change for the
//! lifetime of the process.
//!
//! # Axis resolution
//!
//! A joint's axis is either given explicitly or derived from its name with
//! the Aldebaran naming convention: `…Roll` → X, `…Pitch` → Y, `…Yaw` → Z,
//! checked in that order.  `HipYawPitch` therefore resolves to Y.  Names that
//! match none of the three are rejected with
//! [`KinematicsError::UnknownJointAxis`] at construction time.

use std::collections::HashMap;

use kinos_types::{Axis, KinematicsError};
use nalgebra::Vector3;

/// Fixed geometry of one joint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointGeometry {
    /// Translation from the parent joint, in millimetres.
    pub offset: Vector3<f64>,
    /// Axis the joint rotates about.
    pub axis: Axis,
}

/// Derive a joint's rotation axis from its Aldebaran-style name.
///
/// A keyword counts only when its first occurrence is not at the start of
/// the name, so a bare `"Roll"` is not a joint name.  Used when building a
/// table, never at lookup time.
pub fn axis_from_name(joint: &str) -> Option<Axis> {
    let names = |keyword: &str| joint.find(keyword).is_some_and(|at| at > 0);
    if names("Roll") {
        Some(Axis::X)
    } else if names("Pitch") {
        Some(Axis::Y)
    } else if names("Yaw") {
        Some(Axis::Z)
    } else {
        None
    }
}

/// Read-only lookup from joint name to [`JointGeometry`].
#[derive(Debug, Clone, Default)]
pub struct GeometryTable {
    joints: HashMap<String, JointGeometry>,
}

impl GeometryTable {
    /// Build a table from `(name, offset, explicit axis)` entries.
    ///
    /// Entries without an explicit axis have it derived with
    /// [`axis_from_name`].  A later entry with the same name replaces an
    /// earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::UnknownJointAxis`] for the first joint whose
    /// axis is neither given nor derivable from its name.
    pub fn new<I, S>(entries: I) -> Result<Self, KinematicsError>
    where
        I: IntoIterator<Item = (S, [f64; 3], Option<Axis>)>,
        S: Into<String>,
    {
        let mut joints = HashMap::new();
        for (name, offset, axis) in entries {
            let name = name.into();
            let axis = match axis.or_else(|| axis_from_name(&name)) {
                Some(axis) => axis,
                None => return Err(KinematicsError::UnknownJointAxis(name)),
            };
            joints.insert(
                name,
                JointGeometry {
                    offset: Vector3::from(offset),
                    axis,
                },
            );
        }
        Ok(Self { joints })
    }

    /// The NAO H21 body geometry.
    pub fn nao() -> Self {
        let mut joints = HashMap::new();
        for (name, offset, axis) in NAO_JOINTS {
            joints.insert(
                name.to_string(),
                JointGeometry {
                    offset: Vector3::from(*offset),
                    axis: *axis,
                },
            );
        }
        Self { joints }
    }

    /// Return the offset and axis of `joint`.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::UnknownJoint`] when `joint` is not part of
    /// the robot model.
    pub fn offset_and_axis(&self, joint: &str) -> Result<(Vector3<f64>, Axis), KinematicsError> {
        self.joints
            .get(joint)
            .map(|g| (g.offset, g.axis))
            .ok_or_else(|| KinematicsError::UnknownJoint(joint.to_string()))
    }

    /// `true` when `joint` is part of the robot model.
    pub fn contains(&self, joint: &str) -> bool {
        self.joints.contains_key(joint)
    }

    /// Number of joints in the model.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }
}

// The axis column repeats what `axis_from_name` would derive; keeping it
// literal means the built-in model cannot fail to build.
#[rustfmt::skip]
const NAO_JOINTS: &[(&str, [f64; 3], Axis)] = &[
    ("HeadYaw",        [0.0, 0.0, 126.5],   Axis::Z),
    ("HeadPitch",      [0.0, 0.0, 0.0],     Axis::Y),

    ("LShoulderPitch", [0.0, 98.0, 100.0],  Axis::Y),
    ("LShoulderRoll",  [0.0, 0.0, 0.0],     Axis::X),
    ("LElbowYaw",      [105.0, 15.0, 0.0],  Axis::Z),
    ("LElbowRoll",     [0.0, 0.0, 0.0],     Axis::X),
    ("LWristYaw",      [55.95, 0.0, 0.0],   Axis::Z),

    ("RShoulderPitch", [0.0, -98.0, 100.0], Axis::Y),
    ("RShoulderRoll",  [0.0, 0.0, 0.0],     Axis::X),
    ("RElbowYaw",      [105.0, -15.0, 0.0], Axis::Z),
    ("RElbowRoll",     [0.0, 0.0, 0.0],     Axis::X),
    ("RWristYaw",      [55.95, 0.0, 0.0],   Axis::Z),

    ("LHipYawPitch",   [0.0, 50.0, -85.0],  Axis::Y),
    ("LHipRoll",       [0.0, 0.0, 0.0],     Axis::X),
    ("LHipPitch",      [0.0, 0.0, 0.0],     Axis::Y),
    ("LKneePitch",     [0.0, 0.0, -100.0],  Axis::Y),
    ("LAnklePitch",    [0.0, 0.0, -102.9],  Axis::Y),
    ("LAnkleRoll",     [0.0, 0.0, 0.0],     Axis::X),

    ("RHipYawPitch",   [0.0, -50.0, -85.0], Axis::Y),
    ("RHipRoll",       [0.0, 0.0, 0.0],     Axis::X),
    ("RHipPitch",      [0.0, 0.0, 0.0],     Axis::Y),
    ("RKneePitch",     [0.0, 0.0, -100.0],  Axis::Y),
    ("RAnklePitch",    [0.0, 0.0, -102.9],  Axis::Y),
    ("RAnkleRoll",     [0.0, 0.0, 0.0],     Axis::X),
];
