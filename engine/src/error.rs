use rapier2d::prelude::RigidBodyHandle;

use crate::scene::ObjectId;

/// Errors raised while updating or rendering a scene.
///
/// Inside a [`Scene`](crate::Scene) these are contained per child: the failing child is logged and skipped and its siblings still run. Anything a stage returns on its own is fatal to the engine session.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Removing or looking up an object that isn't in the scene.
    #[error("{0} is not in this scene")]
    NotFound(ObjectId),

    /// Switching to a scene that was never registered with the manager.
    #[error("no scene registered as {0:?}")]
    UnknownScene(String),

    /// A rigid body handle no longer points at a body in the world.
    #[error("rigid body {0:?} is not in the physics world")]
    MissingBody(RigidBodyHandle),

    /// A collider shape couldn't be built from the given points.
    #[error("couldn't build collider shape: {0}")]
    Shape(String),
}

/// Errors from starting, running or stopping an [`Engine`](crate::Engine).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the engine is already running")]
    AlreadyRunning,

    #[error("the engine is not running")]
    NotRunning,

    #[error("the engine has no simulation to run")]
    NoSimulation,

    #[error("couldn't spawn the update thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("the update thread panicked")]
    UpdateThreadPanicked,

    /// A stage returned an error from update or render. The session ended.
    #[error("scene failed: {0}")]
    Scene(#[from] SceneError),
}
