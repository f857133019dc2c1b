//! The remote-procedure boundary.
//!
//! KinOS never speaks a wire protocol itself.  A transport (XML-RPC, JSON
//! over WebSocket, an in-process call, …) implements [`RemoteRobot`] and
//! the rest of the system only ever talks to the trait.
//!
//! Every method is **blocking**: it returns once the robot has carried out
//! the request.  Non-blocking use goes through
//! [`PostHandler`][crate::client::PostHandler].

use kinos_kinematics::Transform;
use kinos_types::{Keyframes, KinematicsError};
use thiserror::Error;

/// Failures crossing the remote boundary.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error(transparent)]
    Kinematics(#[from] KinematicsError),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid keyframes: {0}")]
    InvalidKeyframes(String),

    #[error("Background worker panicked")]
    WorkerPanicked,

    #[error("Failed to spawn background worker: {0}")]
    WorkerSpawn(String),
}

/// Blocking operations a robot exposes to remote callers.
pub trait RemoteRobot: Send + Sync {
    /// Sensed angle of `joint`, radians.
    fn get_angle(&self, joint: &str) -> Result<f64, RpcError>;

    /// Set the target angle of `joint` for the joint controller.
    fn set_angle(&self, joint: &str, angle: f64) -> Result<(), RpcError>;

    /// Latest torso-relative transform of the joint `name`.
    fn get_transform(&self, name: &str) -> Result<Transform, RpcError>;

    /// Play `keyframes`, returning only once playback has finished.
    fn execute_keyframes(&self, keyframes: &Keyframes) -> Result<(), RpcError>;
}

/// Check that `keyframes` is structurally playable.
///
/// # Errors
///
/// Returns [`RpcError::InvalidKeyframes`] when the `names`, `times` and
/// `keys` lists disagree in length, when a joint's times and keys disagree,
/// or when a joint's times are not finite and strictly increasing.
pub fn validate_keyframes(keyframes: &Keyframes) -> Result<(), RpcError> {
    let Keyframes { names, times, keys } = keyframes;
    if names.len() != times.len() || names.len() != keys.len() {
        return Err(RpcError::InvalidKeyframes(format!(
            "{} names, {} time tracks, {} key tracks",
            names.len(),
            times.len(),
            keys.len()
        )));
    }
    for ((name, t), k) in names.iter().zip(times).zip(keys) {
        if t.len() != k.len() {
            return Err(RpcError::InvalidKeyframes(format!(
                "{name}: {} times but {} keys",
                t.len(),
                k.len()
            )));
        }
        if t.iter().any(|time| !time.is_finite()) || t.windows(2).any(|w| w[1] <= w[0]) {
            return Err(RpcError::InvalidKeyframes(format!(
                "{name}: times must be finite and strictly increasing"
            )));
        }
    }
    Ok(())
}
