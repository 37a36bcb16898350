//! Physics subsystem: attachment state machine plus the solver adapter.

pub mod data;
pub mod handler;
pub mod shapes;
pub mod world;

pub use data::{BodyType, PhysicsData, DEFAULT_DENSITY, DEFAULT_FRICTION, DEFAULT_RESTITUTION};
pub use handler::{AttachError, AttachedBody, DeferredCommand, DetachedProxy, PhysicsHandler, ReleaseError};
pub use shapes::{fixed_shapes, no_shapes, Aabb, ShapeDesc, ShapeSupplier};
pub use world::{BodySnapshot, PhysicsWorld};
