//! `kinos-kinematics` – forward kinematics for an articulated robot body.
//!
//! Turns per-joint angles into the pose of every joint in the torso frame.
//!
//! # Modules
//!
//! - [`transform`] – [`Transform`][transform::Transform]: 4×4 homogeneous
//!   rigid-body transforms and the elementary rotations about X, Y and Z.
//! - [`geometry`] – [`GeometryTable`][geometry::GeometryTable]: fixed offset
//!   and rotation axis of every joint, resolved once at construction.
//! - [`chain`] – [`ChainRegistry`][chain::ChainRegistry]: named joint chains
//!   (head, arms, legs) in root-to-tip order.
//! - [`engine`] – [`ForwardKinematics`][engine::ForwardKinematics]: local
//!   joint transforms and their accumulation along each chain.
//! - [`store`] – [`TransformStore`][store::TransformStore]: single-writer,
//!   snapshot-published store of the latest root-relative transforms, with
//!   [`StoreReader`][store::StoreReader] handles for concurrent readers.

pub mod chain;
pub mod engine;
pub mod geometry;
pub mod store;
pub mod transform;

pub use chain::ChainRegistry;
pub use engine::{ChainTransforms, ForwardKinematics};
pub use geometry::{GeometryTable, JointGeometry};
pub use store::{StoreReader, TransformSnapshot, TransformStore};
pub use transform::Transform;
