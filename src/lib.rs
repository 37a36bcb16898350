//! stage-engine — an interactive real-time 2D simulation core.
//!
//! Actors bind to an optional rigid-body simulation (rapier2d) through a
//! two-state physics handler: a detached proxy that does pure numeric
//! bookkeeping and queues simulation-only commands, and an attached body
//! that mirrors every operation onto a live solver body. A fixed-cadence
//! game loop paces the simulation, fans per-layer world steps out to an
//! owned worker pool, invokes frame listeners, drains deferred work, and
//! hands the finished frame to a render target.
//!
//! Rendering primitives, asset loading, and input handling live outside
//! this crate; the loop only talks to them through the narrow traits in
//! [`render`].

pub mod actor;
pub mod camera;
pub mod config;
pub mod error;
pub mod event;
pub mod game_loop;
pub mod physics;
pub mod render;
pub mod scene;

pub use actor::Actor;
pub use camera::{Camera, FocusProvider};
pub use config::EngineConfig;
pub use error::{EngineError, EngineResult};
pub use event::{
    delay, repeat, EventListeners, FrameListeners, FrameUpdateListener, ListenerId, PeriodicTask,
    PeriodicTaskHandle,
};
pub use game_loop::{DispatchHandle, GameLoop, LoopState, StopHandle, WorkerPool, WorkerPoolConfig};
pub use physics::{
    fixed_shapes, no_shapes, AttachedBody, BodyType, DeferredCommand, DetachedProxy, PhysicsData,
    PhysicsHandler, PhysicsWorld, ShapeDesc, ShapeSupplier,
};
pub use render::{HeadlessTarget, RenderTarget, Surface};
pub use scene::{ActorRef, Scene};

/// Initializes env_logger once for binaries and tests that want engine logs.
/// Safe to call repeatedly.
pub fn init_logger() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
