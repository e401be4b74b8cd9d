//! # Crane engine
//!
//! The pieces a small physics arcade machine is glued together from: an ordered [scene] graph whose children opt in to updating and rendering, a [physics] scene that steps a rapier world before its children run, a [scene::SceneManager] that switches between whole stages, and an [engine] that drives any [engine::Simulation] with an update loop on its own thread and a render loop on the calling one.
//!
//! Nothing here knows about claws or prizes. The game lives in `prototypes/`.

#![allow(clippy::new_without_default)]

/// generates identifier structs. example: `id_impl_new!([derive(PartialOrd, Ord)] ScoreID)` expands out to
///
/// ```
/// #[derive(PartialOrd, Ord)]
/// #[derive(Clone, Copy, PartialEq, Eq)]
/// pub struct ScoreID(usize);
/// impl ScoreID {
///     pub fn new(idx: usize) -> Self {
///         Self(idx)
///     }
///     pub fn idx(&self) -> usize {
///         self.0
///     }
/// }
/// ```
#[macro_export]
macro_rules! id_impl_new {
    ($([$($derive:meta)*] $id_type:ident),*) => {
        $(
            $(#[$derive])*
            #[derive(Clone, Copy, PartialEq, Eq)]
            pub struct $id_type(usize);

            impl $id_type {
                pub fn new(idx: usize) -> Self {
                    Self(idx)
                }

                pub fn idx(&self) -> usize {
                    self.0
                }
            }

            impl std::fmt::Display for $id_type {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}#{}", stringify!($id_type), self.0)
                }
            }
        )*
    };
}

pub mod display;
pub mod engine;
pub mod error;
pub mod graphics;
pub mod input;
pub mod physics;
pub mod scene;
pub mod time;

// reexports
pub use engine::{Display, DisplayEvent, Engine, Simulation};
pub use error::{EngineError, SceneError};
pub use graphics::{draw::DisplayList, ImageId, Surface};
pub use input::{Debounce, InputState, Key};
pub use physics::{PhysicsScene, PhysicsWorld, StepMode};
pub use scene::{
    ObjectId, Renderable, Scene, SceneManager, SceneObject, Stage, Tick, Updatable, UpdateCtx,
};

/// how many pixels one meter of physics world takes up on screen
pub const PIXELS_PER_METER: f32 = 20.0;
