//! [`LocalRobot`] – in-process [`RemoteRobot`] backed by the transform store.
//!
//! The server side of the boundary.  It answers queries from a
//! [`StoreReader`], so every reply comes from one complete, published
//! snapshot and no query ever waits for a refresh.  Joint targets from
//! `set_angle` are buffered for the control loop to drain with
//! [`LocalRobot::take_targets`], and keyframe playback is delegated to a
//! [`KeyframePlayer`].

use std::sync::{Mutex, PoisonError};

use kinos_kinematics::{StoreReader, Transform};
use kinos_types::{JointAngles, Keyframes, KinematicsError};
use tracing::{debug, info};

use crate::remote::{RemoteRobot, RpcError, validate_keyframes};

/// Plays keyframe animations on the robot.
pub trait KeyframePlayer: Send + Sync {
    /// Play `keyframes` to completion.
    fn play(&self, keyframes: &Keyframes) -> Result<(), RpcError>;
}

/// Serves [`RemoteRobot`] requests from inside the robot process.
pub struct LocalRobot {
    reader: StoreReader,
    targets: Mutex<JointAngles>,
    player: Box<dyn KeyframePlayer>,
}

impl LocalRobot {
    pub fn new(reader: StoreReader, player: Box<dyn KeyframePlayer>) -> Self {
        Self {
            reader,
            targets: Mutex::new(JointAngles::new()),
            player,
        }
    }

    /// Drain the joint targets received since the last call.
    pub fn take_targets(&self) -> JointAngles {
        std::mem::take(&mut *self.targets.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl RemoteRobot for LocalRobot {
    fn get_angle(&self, joint: &str) -> Result<f64, RpcError> {
        Ok(self.reader.angle(joint)?)
    }

    fn set_angle(&self, joint: &str, angle: f64) -> Result<(), RpcError> {
        let snapshot = self.reader.snapshot();
        if !snapshot.transforms.contains_key(joint) {
            return Err(KinematicsError::UnknownJoint(joint.to_string()).into());
        }
        debug!(joint, angle, "joint target set");
        self.targets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(joint.to_string(), angle);
        Ok(())
    }

    fn get_transform(&self, name: &str) -> Result<Transform, RpcError> {
        Ok(self.reader.get(name)?)
    }

    fn execute_keyframes(&self, keyframes: &Keyframes) -> Result<(), RpcError> {
        validate_keyframes(keyframes)?;
        info!(joints = keyframes.names.len(), "executing keyframes");
        self.player.play(keyframes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use kinos_kinematics::{ForwardKinematics, TransformStore};

    #[derive(Default)]
    struct CountingPlayer(Arc<AtomicUsize>);

    impl KeyframePlayer for CountingPlayer {
        fn play(&self, _keyframes: &Keyframes) -> Result<(), RpcError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn refreshed_store() -> TransformStore {
        let fk = ForwardKinematics::nao();
        let mut store = TransformStore::new(fk.chains().all_joints());
        let mut angles: JointAngles = fk
            .chains()
            .all_joints()
            .map(|j| (j.to_string(), 0.0))
            .collect();
        angles.insert("HeadYaw".to_string(), 0.7);
        let transforms = fk.compute_all(&angles).unwrap();
        store.publish(transforms, angles);
        store
    }

    #[test]
    fn queries_are_answered_from_the_store() {
        let store = refreshed_store();
        let robot = LocalRobot::new(store.reader(), Box::new(CountingPlayer::default()));

        assert!((robot.get_angle("HeadYaw").unwrap() - 0.7).abs() < f64::EPSILON);
        assert_eq!(
            robot.get_transform("LKneePitch").unwrap(),
            store.get("LKneePitch").unwrap()
        );
    }

    #[test]
    fn unknown_names_surface_kinematics_errors() {
        let store = refreshed_store();
        let robot = LocalRobot::new(store.reader(), Box::new(CountingPlayer::default()));

        assert!(matches!(
            robot.get_transform("LWristYaw"),
            Err(RpcError::Kinematics(KinematicsError::NotYetComputed(_)))
        ));
        assert!(matches!(
            robot.set_angle("Tail", 0.1),
            Err(RpcError::Kinematics(KinematicsError::UnknownJoint(_)))
        ));
    }

    #[test]
    fn set_angle_buffers_targets_until_taken() {
        let store = refreshed_store();
        let robot = LocalRobot::new(store.reader(), Box::new(CountingPlayer::default()));

        robot.set_angle("HeadYaw", 1.5).unwrap();
        robot.set_angle("HeadYaw", 1.2).unwrap();
        robot.set_angle("LElbowRoll", -0.4).unwrap();

        let targets = robot.take_targets();
        assert_eq!(targets.len(), 2);
        assert!((targets["HeadYaw"] - 1.2).abs() < f64::EPSILON);
        assert!(robot.take_targets().is_empty());
    }

    #[test]
    fn execute_keyframes_validates_then_plays() {
        let store = refreshed_store();
        let plays = Arc::new(AtomicUsize::new(0));
        let robot = LocalRobot::new(store.reader(), Box::new(CountingPlayer(plays.clone())));

        let good = Keyframes {
            names: vec!["HeadYaw".to_string()],
            times: vec![vec![1.0]],
            keys: vec![vec![0.3]],
        };
        robot.execute_keyframes(&good).unwrap();

        let bad = Keyframes {
            names: vec!["HeadYaw".to_string()],
            times: vec![vec![1.0]],
            keys: vec![],
        };
        assert!(matches!(
            robot.execute_keyframes(&bad),
            Err(RpcError::InvalidKeyframes(_))
        ));
        assert_eq!(plays.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn client_over_local_robot_sees_published_snapshot() {
        let mut store = TransformStore::new(["HeadYaw"]);
        let robot: Arc<dyn RemoteRobot> =
            Arc::new(LocalRobot::new(store.reader(), Box::new(CountingPlayer::default())));
        let agent = crate::ClientAgent::new(robot);

        let fk = ForwardKinematics::nao();
        let angles = JointAngles::from([("HeadYaw".to_string(), 0.0), ("HeadPitch".to_string(), 0.0)]);
        let head = fk.accumulate("Head", &angles).unwrap();
        store.publish(head.into_iter().collect(), angles);

        let handle = agent.post().get_transform("HeadPitch").unwrap();
        let t = handle.join().unwrap();
        assert!((t.translation().z - 126.5).abs() < 1e-9);
    }
}
