//! [`ChainRegistry`] – named kinematic chains, root to tip.
//!
//! Each chain is an ordered list of joint names starting at the joint
//! attached to the torso and ending at the effector.  The order is
//! anatomical (parent before child) and is the order in which local
//! transforms are composed.

use std::collections::{BTreeMap, HashMap};

use kinos_types::KinematicsError;

use crate::geometry::GeometryTable;

/// Read-only mapping from chain name to its ordered joints.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    chains: BTreeMap<String, Vec<String>>,
}

impl ChainRegistry {
    /// Build a registry from `(chain, joints)` pairs.  A later pair with the
    /// same chain name replaces an earlier one.
    pub fn new<I, C, J>(chains: I) -> Self
    where
        I: IntoIterator<Item = (C, Vec<J>)>,
        C: Into<String>,
        J: Into<String>,
    {
        let chains = chains
            .into_iter()
            .map(|(name, joints)| (name.into(), joints.into_iter().map(Into::into).collect()))
            .collect();
        Self { chains }
    }

    /// The NAO effector chains (head, both arms, both legs).
    pub fn nao() -> Self {
        Self::new([
            ("Head", vec!["HeadYaw", "HeadPitch"]),
            (
                "LArm",
                vec!["LShoulderPitch", "LShoulderRoll", "LElbowYaw", "LElbowRoll"],
            ),
            (
                "RArm",
                vec!["RShoulderPitch", "RShoulderRoll", "RElbowYaw", "RElbowRoll"],
            ),
            (
                "LLeg",
                vec![
                    "LHipYawPitch",
                    "LHipRoll",
                    "LHipPitch",
                    "LKneePitch",
                    "LAnklePitch",
                    "LAnkleRoll",
                ],
            ),
            (
                "RLeg",
                vec![
                    "RHipYawPitch",
                    "RHipRoll",
                    "RHipPitch",
                    "RKneePitch",
                    "RAnklePitch",
                    "RAnkleRoll",
                ],
            ),
        ])
    }

    /// Joints of `chain` in root-to-tip order.
    ///
    /// # Errors
    ///
    /// Returns [`KinematicsError::UnknownChain`] for an unregistered name.
    pub fn joints_of(&self, chain: &str) -> Result<&[String], KinematicsError> {
        self.chains
            .get(chain)
            .map(Vec::as_slice)
            .ok_or_else(|| KinematicsError::UnknownChain(chain.to_string()))
    }

    /// All chain names, sorted.
    pub fn all_chains(&self) -> impl Iterator<Item = &str> {
        self.chains.keys().map(String::as_str)
    }

    /// Every joint that belongs to some chain.
    pub fn all_joints(&self) -> impl Iterator<Item = &str> {
        self.chains.values().flatten().map(String::as_str)
    }

    /// Check the registry against `geometry`.
    ///
    /// # Errors
    ///
    /// - [`KinematicsError::UnknownJoint`] – a chain names a joint missing from
    ///   the geometry table.
    /// - [`KinematicsError::InvalidChain`] – a chain is empty, or a joint
    ///   appears more than once across all chains.
    pub fn validate(&self, geometry: &GeometryTable) -> Result<(), KinematicsError> {
        let mut owner: HashMap<&str, &str> = HashMap::new();
        for (chain, joints) in &self.chains {
            if joints.is_empty() {
                return Err(KinematicsError::InvalidChain {
                    chain: chain.clone(),
                    details: "chain has no joints".to_string(),
                });
            }
            for joint in joints {
                if !geometry.contains(joint) {
                    return Err(KinematicsError::UnknownJoint(joint.clone()));
                }
                if let Some(previous) = owner.insert(joint.as_str(), chain.as_str()) {
                    return Err(KinematicsError::InvalidChain {
                        chain: chain.clone(),
                        details: format!("joint {joint} already belongs to chain {previous}"),
                    });
                }
            }
        }
        Ok(())
    }
}
