use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Joint angles for one control tick, in radians, keyed by joint name
/// (e.g. `"HeadYaw"`, `"LKneePitch"`).
pub type JointAngles = HashMap<String, f64>;

/// Body-frame axis a revolute joint rotates about.
///
/// On the NAO the body frame has +X forward, +Y left and +Z up, so `X` is
/// roll, `Y` is pitch and `Z` is yaw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    Z,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

/// A keyframe animation as handed to the robot over the remote boundary.
///
/// `names[i]` is animated through `keys[i]` (target angles in radians) at the
/// matching `times[i]` (seconds from the start of the animation).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Keyframes {
    pub names: Vec<String>,
    pub times: Vec<Vec<f64>>,
    pub keys: Vec<Vec<f64>>,
}

/// Configuration and contract violations raised by the kinematics engine.
///
/// None of these are transient: a caller that receives one has a defect in
/// its robot model or in the data it supplied, and retrying the same call
/// will fail the same way.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KinematicsError {
    #[error("Unknown joint: {0}")]
    UnknownJoint(String),

    #[error("Unknown chain: {0}")]
    UnknownChain(String),

    #[error("Cannot determine rotation axis for joint {0}")]
    UnknownJointAxis(String),

    #[error("No angle supplied for joint {0}")]
    MissingJointAngle(String),

    #[error("Transform for {0} has not been computed")]
    NotYetComputed(String),

    #[error("Invalid chain {chain}: {details}")]
    InvalidChain { chain: String, details: String },

    #[error("Joint angle source unavailable: {0}")]
    SensorUnavailable(String),
}
