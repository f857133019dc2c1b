//! `kinos-rpc` – the remote boundary of the kinematics engine.
//!
//! The wire transport itself lives outside this workspace.  This crate
//! defines what crosses the boundary and how callers use it.
//!
//! # Modules
//!
//! - [`remote`] – [`RemoteRobot`][remote::RemoteRobot]: the blocking
//!   operations a robot exposes (`get_angle`, `set_angle`, `get_transform`,
//!   `execute_keyframes`) and [`RpcError`][remote::RpcError].
//! - [`client`] – [`ClientAgent`][client::ClientAgent]: caller-side wrapper
//!   with a [`PostHandler`][client::PostHandler] that runs long calls on a
//!   background worker without blocking the caller.
//! - [`server`] – [`LocalRobot`][server::LocalRobot]: an in-process
//!   implementation answering from a transform-store snapshot.

pub mod client;
pub mod remote;
pub mod server;

pub use client::{ClientAgent, PostHandle, PostHandler};
pub use remote::{RemoteRobot, RpcError, validate_keyframes};
pub use server::{KeyframePlayer, LocalRobot};
