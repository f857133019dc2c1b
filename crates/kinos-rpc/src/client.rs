//! [`ClientAgent`] – caller-side wrapper around a [`RemoteRobot`].
//!
//! Blocking calls are forwarded as-is.  [`ClientAgent::post`] returns a
//! [`PostHandler`] whose methods run the same blocking call on a dedicated
//! worker thread and hand back a [`PostHandle`] immediately.
//!
//! # Ordering guarantee
//!
//! A posted call is *deferred*, not evaluated and then wrapped: the closure
//! that performs the remote call is moved into the worker and invoked there.
//! The posting thread waits on a rendezvous channel until the worker is
//! running and about to make the call, and no longer.  So when `post`
//! returns the call has been started, and the caller is never blocked for
//! the duration of the call itself.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use kinos_rpc::{ClientAgent, RemoteRobot};
//! use kinos_types::Keyframes;
//!
//! fn wave(remote: Arc<dyn RemoteRobot>, hello: Keyframes) {
//!     let agent = ClientAgent::new(remote);
//!     let handle = agent.post().execute_keyframes(hello).expect("worker started");
//!     // … do other work while the robot waves …
//!     handle.join().expect("keyframes played");
//! }
//! ```

use std::sync::Arc;
use std::sync::mpsc;
use std::thread::{self, JoinHandle};

use kinos_kinematics::Transform;
use kinos_types::Keyframes;
use tracing::{debug, info_span, warn};
use uuid::Uuid;

use crate::remote::{RemoteRobot, RpcError, validate_keyframes};

// ─────────────────────────────────────────────────────────────────────────────
// ClientAgent
// ─────────────────────────────────────────────────────────────────────────────

/// Requests robot services from a [`RemoteRobot`].
#[derive(Clone)]
pub struct ClientAgent {
    remote: Arc<dyn RemoteRobot>,
}

impl ClientAgent {
    pub fn new(remote: Arc<dyn RemoteRobot>) -> Self {
        Self { remote }
    }

    /// Sensed angle of `joint`.
    pub fn get_angle(&self, joint: &str) -> Result<f64, RpcError> {
        self.remote.get_angle(joint)
    }

    /// Set the controller target of `joint`.
    pub fn set_angle(&self, joint: &str, angle: f64) -> Result<(), RpcError> {
        self.remote.set_angle(joint, angle)
    }

    /// Torso-relative transform of joint `name`.
    pub fn get_transform(&self, name: &str) -> Result<Transform, RpcError> {
        self.remote.get_transform(name)
    }

    /// Play `keyframes`; blocks until playback has finished.
    ///
    /// # Errors
    ///
    /// Malformed keyframes are rejected with [`RpcError::InvalidKeyframes`]
    /// before anything is sent.
    pub fn execute_keyframes(&self, keyframes: &Keyframes) -> Result<(), RpcError> {
        validate_keyframes(keyframes)?;
        self.remote.execute_keyframes(keyframes)
    }

    /// Non-blocking variants of the long-running calls.
    pub fn post(&self) -> PostHandler {
        PostHandler {
            remote: Arc::clone(&self.remote),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostHandler
// ─────────────────────────────────────────────────────────────────────────────

/// Runs blocking [`RemoteRobot`] calls on background workers.
pub struct PostHandler {
    remote: Arc<dyn RemoteRobot>,
}

impl PostHandler {
    /// Non-blocking [`ClientAgent::execute_keyframes`].
    ///
    /// Validation happens on the calling thread so a malformed request fails
    /// without spawning anything.
    pub fn execute_keyframes(&self, keyframes: Keyframes) -> Result<PostHandle<()>, RpcError> {
        validate_keyframes(&keyframes)?;
        self.spawn("execute_keyframes", move |remote| {
            remote.execute_keyframes(&keyframes)
        })
    }

    /// Non-blocking [`ClientAgent::get_transform`].
    pub fn get_transform(&self, name: impl Into<String>) -> Result<PostHandle<Transform>, RpcError> {
        let name = name.into();
        self.spawn("get_transform", move |remote| remote.get_transform(&name))
    }

    fn spawn<T, F>(&self, op: &'static str, call: F) -> Result<PostHandle<T>, RpcError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn RemoteRobot) -> Result<T, RpcError> + Send + 'static,
    {
        let id = Uuid::new_v4();
        let remote = Arc::clone(&self.remote);
        // Zero capacity: `send` blocks until the poster has received.
        let (started_tx, started_rx) = mpsc::sync_channel::<()>(0);

        let handle = thread::Builder::new()
            .name(format!("kinos-post-{op}"))
            .spawn(move || {
                let span = info_span!("post", %id, op);
                let _enter = span.enter();
                // The poster is gone only if it panicked; run the call anyway.
                let _ = started_tx.send(());
                debug!("remote call started");
                let result = call(remote.as_ref());
                match &result {
                    Ok(_) => debug!("remote call finished"),
                    Err(e) => warn!(error = %e, "remote call failed"),
                }
                result
            })
            .map_err(|e| RpcError::WorkerSpawn(e.to_string()))?;

        started_rx.recv().map_err(|_| RpcError::WorkerPanicked)?;
        Ok(PostHandle { id, handle })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// PostHandle
// ─────────────────────────────────────────────────────────────────────────────

/// The pending result of a posted call.
pub struct PostHandle<T> {
    id: Uuid,
    handle: JoinHandle<Result<T, RpcError>>,
}

impl<T> PostHandle<T> {
    /// Identifier attached to the worker's tracing span.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// `true` once the remote call has returned.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Block until the remote call returns and yield its result.
    pub fn join(self) -> Result<T, RpcError> {
        self.handle.join().map_err(|_| RpcError::WorkerPanicked)?
    }
}
