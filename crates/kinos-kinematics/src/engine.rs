//! [`ForwardKinematics`] – local transforms and chain accumulation.
//!
//! Given the current angle of every chain joint, the engine walks each chain
//! from the torso outward and post-multiplies local joint transforms:
//!
//! ```text
//! T_0 = I
//! T_i = T_{i-1} · local(joint_i, angle_i)
//! ```
//!
//! `T_i` is the pose of joint *i* in the torso frame, not relative to its
//! parent.  Matrix products do not commute, so the chain order recorded in
//! the [`ChainRegistry`] must match the robot's parent → child order.
//!
//! # Example
//!
//! ```rust
//! use kinos_kinematics::engine::ForwardKinematics;
//! use kinos_types::JointAngles;
//!
//! let fk = ForwardKinematics::nao();
//! let angles: JointAngles = [("HeadYaw", 0.0), ("HeadPitch", 0.0)]
//!     .into_iter()
//!     .map(|(j, a)| (j.to_string(), a))
//!     .collect();
//!
//! let head = fk.accumulate("Head", &angles).unwrap();
//! assert!((head[0].1.translation().z - 126.5).abs() < 1e-9);
//! ```

use std::collections::HashMap;

use kinos_types::{JointAngles, KinematicsError};

use crate::chain::ChainRegistry;
use crate::geometry::GeometryTable;
use crate::transform::Transform;

/// Root-relative transforms of one chain, in root-to-tip order.
pub type ChainTransforms = Vec<(String, Transform)>;

/// The robot model plus the forward-kinematics algorithms over it.
#[derive(Debug, Clone)]
pub struct ForwardKinematics {
    geometry: GeometryTable,
    chains: ChainRegistry,
}

impl ForwardKinematics {
    /// Combine a geometry table and chain registry into an engine.
    ///
    /// # Errors
    ///
    /// Propagates [`ChainRegistry::validate`] failures: every chain joint
    /// must exist in `geometry` and belong to exactly one chain.
    pub fn new(geometry: GeometryTable, chains: ChainRegistry) -> Result<Self, KinematicsError> {
        chains.validate(&geometry)?;
        Ok(Self { geometry, chains })
    }

    /// The built-in NAO model.
    pub fn nao() -> Self {
        Self {
            geometry: GeometryTable::nao(),
            chains: ChainRegistry::nao(),
        }
    }

    pub fn geometry(&self) -> &GeometryTable {
        &self.geometry
    }

    pub fn chains(&self) -> &ChainRegistry {
        &self.chains
    }

    /// Transform of `joint` relative to its parent when rotated by `angle`
    /// radians about its axis.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::UnknownJoint`] when `joint` is not in the
    /// geometry table.
    pub fn local_transform(&self, joint: &str, angle: f64) -> Result<Transform, KinematicsError> {
        let (offset, axis) = self.geometry.offset_and_axis(joint)?;
        Ok(Transform::from_axis_rotation(axis, angle, offset))
    }

    /// Root-relative transform of every joint in `chain`.
    ///
    /// # Errors
    ///
    /// - [`KinematicsError::UnknownChain`] – `chain` is not registered.
    /// - [`KinematicsError::MissingJointAngle`] – `angles` has no entry for
    ///   one of the chain's joints.
    pub fn accumulate(
        &self,
        chain: &str,
        angles: &JointAngles,
    ) -> Result<ChainTransforms, KinematicsError> {
        let joints = self.chains.joints_of(chain)?;
        let mut accumulated = Transform::identity();
        let mut out = Vec::with_capacity(joints.len());
        for joint in joints {
            let angle = angles
                .get(joint)
                .copied()
                .ok_or_else(|| KinematicsError::MissingJointAngle(joint.clone()))?;
            accumulated = accumulated * self.local_transform(joint, angle)?;
            out.push((joint.clone(), accumulated));
        }
        Ok(out)
    }

    /// Run [`accumulate`](Self::accumulate) over every chain and merge the
    /// results.  Nothing is returned unless every chain succeeds.
    pub fn compute_all(
        &self,
        angles: &JointAngles,
    ) -> Result<HashMap<String, Transform>, KinematicsError> {
        let mut transforms = HashMap::new();
        for chain in self.chains.all_chains() {
            transforms.extend(self.accumulate(chain, angles)?);
        }
        Ok(transforms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kinos_types::Axis;
    use nalgebra::{Matrix3, Vector3};
    use std::f64::consts::{FRAC_PI_2, PI};

    const EPS: f64 = 1e-9;

    fn angles(pairs: &[(&str, f64)]) -> JointAngles {
        pairs.iter().map(|(j, a)| (j.to_string(), *a)).collect()
    }

    /// One chain `[J1, J2]`: J1 100 mm up about Z, J2 50 mm forward about Z.
    fn two_joint_engine() -> ForwardKinematics {
        let geometry = GeometryTable::new([
            ("J1", [0.0, 0.0, 100.0], Some(Axis::Z)),
            ("J2", [50.0, 0.0, 0.0], Some(Axis::Z)),
        ])
        .unwrap();
        let chains = ChainRegistry::new([("Arm", vec!["J1", "J2"])]);
        ForwardKinematics::new(geometry, chains).unwrap()
    }

    /// Same joints as the two-joint engine but on three axes with zero offset.
    fn axis_engine() -> ForwardKinematics {
        let geometry = GeometryTable::new([
            ("RX", [0.0, 0.0, 0.0], Some(Axis::X)),
            ("RY", [0.0, 0.0, 0.0], Some(Axis::Y)),
            ("RZ", [0.0, 0.0, 0.0], Some(Axis::Z)),
        ])
        .unwrap();
        let chains = ChainRegistry::new([
            ("CX", vec!["RX"]),
            ("CY", vec!["RY"]),
            ("CZ", vec!["RZ"]),
        ]);
        ForwardKinematics::new(geometry, chains).unwrap()
    }

    fn assert_rotation(actual: Matrix3<f64>, expected: Matrix3<f64>) {
        for (a, e) in actual.iter().zip(expected.iter()) {
            assert!((a - e).abs() < EPS, "expected {expected}, got {actual}");
        }
    }

    // ── Local transforms ────────────────────────────────────────────────────

    #[test]
    fn zero_angle_local_transform_is_pure_translation() {
        let geometry = GeometryTable::new([
            ("AX", [1.0, 2.0, 3.0], Some(Axis::X)),
            ("AY", [4.0, 5.0, 6.0], Some(Axis::Y)),
            ("AZ", [7.0, 8.0, 9.0], Some(Axis::Z)),
        ])
        .unwrap();
        let fk = ForwardKinematics::new(geometry, ChainRegistry::default()).unwrap();
        for (joint, offset) in [
            ("AX", Vector3::new(1.0, 2.0, 3.0)),
            ("AY", Vector3::new(4.0, 5.0, 6.0)),
            ("AZ", Vector3::new(7.0, 8.0, 9.0)),
        ] {
            let t = fk.local_transform(joint, 0.0).unwrap();
            assert!(t.approx_eq(&Transform::from_translation(offset), EPS), "{joint}");
        }
    }

    #[test]
    fn local_rotation_block_matches_elementary_matrices() {
        let fk = axis_engine();
        for theta in [0.0, FRAC_PI_2, PI, -FRAC_PI_2] {
            let (s, c) = theta.sin_cos();
            #[rustfmt::skip]
            let rx = Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c);
            #[rustfmt::skip]
            let ry = Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c);
            #[rustfmt::skip]
            let rz = Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0);

            let tx = fk.local_transform("RX", theta).unwrap();
            let ty = fk.local_transform("RY", theta).unwrap();
            let tz = fk.local_transform("RZ", theta).unwrap();
            assert_rotation(tx.rotation(), rx);
            assert_rotation(ty.rotation(), ry);
            assert_rotation(tz.rotation(), rz);
            assert_eq!(tz.translation(), Vector3::zeros());
        }
    }

    #[test]
    fn local_transform_of_unknown_joint_fails() {
        let fk = ForwardKinematics::nao();
        assert_eq!(
            fk.local_transform("Tail", 0.0).unwrap_err(),
            KinematicsError::UnknownJoint("Tail".to_string())
        );
    }

    // ── Accumulation ────────────────────────────────────────────────────────

    #[test]
    fn two_joint_chain_end_to_end() {
        let fk = two_joint_engine();
        let out = fk
            .accumulate("Arm", &angles(&[("J1", 0.0), ("J2", FRAC_PI_2)]))
            .unwrap();

        assert_eq!(out[0].0, "J1");
        let j1 = out[0].1;
        assert!(j1.approx_eq(&Transform::from_translation(Vector3::new(0.0, 0.0, 100.0)), EPS));

        assert_eq!(out[1].0, "J2");
        let j2 = out[1].1;
        let t = j2.translation();
        // J2's rotation does not move its own origin: the 50 mm offset is
        // applied in J1's (unrotated) frame.
        assert!((t.x - 50.0).abs() < EPS, "x={}", t.x);
        assert!(t.y.abs() < EPS, "y={}", t.y);
        assert!((t.z - 100.0).abs() < EPS, "z={}", t.z);
        #[rustfmt::skip]
        let rz90 = Matrix3::new(0.0, -1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        assert_rotation(j2.rotation(), rz90);
    }

    #[test]
    fn parent_rotation_carries_child_offset() {
        // J1 yawed 90°: J2's 50 mm forward offset lands on +Y in the root frame.
        let fk = two_joint_engine();
        let out = fk
            .accumulate("Arm", &angles(&[("J1", FRAC_PI_2), ("J2", FRAC_PI_2)]))
            .unwrap();
        let t = out[1].1.translation();
        assert!(t.x.abs() < EPS, "x={}", t.x);
        assert!((t.y - 50.0).abs() < EPS, "y={}", t.y);
        assert!((t.z - 100.0).abs() < EPS, "z={}", t.z);
    }

    #[test]
    fn composition_order_matters() {
        let geometry = GeometryTable::new([
            ("A", [0.0, 0.0, 100.0], Some(Axis::Y)),
            ("B", [50.0, 0.0, 0.0], Some(Axis::Z)),
        ])
        .unwrap();
        let forward = ForwardKinematics::new(
            geometry.clone(),
            ChainRegistry::new([("C", vec!["A", "B"])]),
        )
        .unwrap();
        let reversed =
            ForwardKinematics::new(geometry, ChainRegistry::new([("C", vec!["B", "A"])])).unwrap();

        let a = angles(&[("A", 0.4), ("B", 0.7)]);
        let tip_forward = forward.accumulate("C", &a).unwrap()[1].1;
        let tip_reversed = reversed.accumulate("C", &a).unwrap()[1].1;
        assert!(!tip_forward.approx_eq(&tip_reversed, 1e-6));
    }

    #[test]
    fn each_joint_is_root_relative() {
        let fk = ForwardKinematics::nao();
        let a = angles(&[
            ("LShoulderPitch", 0.3),
            ("LShoulderRoll", 0.2),
            ("LElbowYaw", -0.5),
            ("LElbowRoll", -0.4),
        ]);
        let out = fk.accumulate("LArm", &a).unwrap();
        let mut expected = Transform::identity();
        for (joint, transform) in &out {
            expected = expected * fk.local_transform(joint, a[joint]).unwrap();
            assert!(transform.approx_eq(&expected, EPS), "{joint}");
        }
    }

    #[test]
    fn accumulate_reports_missing_angle() {
        let fk = two_joint_engine();
        assert_eq!(
            fk.accumulate("Arm", &angles(&[("J1", 0.0)])).unwrap_err(),
            KinematicsError::MissingJointAngle("J2".to_string())
        );
    }

    #[test]
    fn accumulate_unknown_chain_fails() {
        let fk = two_joint_engine();
        assert_eq!(
            fk.accumulate("Leg", &JointAngles::new()).unwrap_err(),
            KinematicsError::UnknownChain("Leg".to_string())
        );
    }

    #[test]
    fn nao_zero_pose_knee_height() {
        let fk = ForwardKinematics::nao();
        let zero: JointAngles = fk.chains().all_joints().map(|j| (j.to_string(), 0.0)).collect();
        let all = fk.compute_all(&zero).unwrap();
        assert_eq!(all.len(), 22);
        let knee = all["LKneePitch"].translation();
        assert!((knee.y - 50.0).abs() < EPS);
        assert!((knee.z - (-185.0)).abs() < EPS);
        let ankle = all["RAnklePitch"].translation();
        assert!((ankle.z - (-287.9)).abs() < 1e-6);
    }

    #[test]
    fn new_rejects_inconsistent_model() {
        let chains = ChainRegistry::new([("Head", vec!["HeadYaw", "Neck"])]);
        assert_eq!(
            ForwardKinematics::new(GeometryTable::nao(), chains).unwrap_err(),
            KinematicsError::UnknownJoint("Neck".to_string())
        );
    }
}
