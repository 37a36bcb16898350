//! Actors
//!
//! An actor is the user-facing owner of exactly one `PhysicsHandler`. The
//! visual half of an actor (sprites, shapes on screen) lives outside this
//! crate; what lives here is the lifecycle: detached at construction,
//! attached when mounted into a scene, detached again when unmounted.

use std::sync::Arc;

use glam::Vec2;

use crate::error::{EngineError, EngineResult};
use crate::physics::data::PhysicsData;
use crate::physics::handler::{AttachError, PhysicsHandler, ReleaseError};
use crate::physics::shapes::ShapeSupplier;
use crate::physics::world::PhysicsWorld;

pub struct Actor {
    handler: PhysicsHandler,
}

impl Actor {
    pub fn new(shapes: ShapeSupplier) -> Self {
        Self::with_data(PhysicsData::new(shapes))
    }

    pub fn with_data(data: PhysicsData) -> Self {
        Self {
            handler: PhysicsHandler::detached(data),
        }
    }

    /// Full physics capability surface.
    pub fn handler(&self) -> &PhysicsHandler {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut PhysicsHandler {
        &mut self.handler
    }

    pub fn is_attached(&self) -> bool {
        self.handler.is_attached()
    }

    /// Mounts the actor into a simulation world. Exactly one transition:
    /// attaching an already-attached actor is an error, and on any failure
    /// the existing handler state is kept untouched.
    pub fn attach(&mut self, world: &Arc<PhysicsWorld>) -> EngineResult<()> {
        match std::mem::take(&mut self.handler) {
            PhysicsHandler::Attached(body) => {
                self.handler = PhysicsHandler::Attached(body);
                Err(EngineError::AlreadyAttached)
            }
            PhysicsHandler::Detached(proxy) => match proxy.attach(world) {
                Ok(body) => {
                    self.handler = PhysicsHandler::Attached(body);
                    Ok(())
                }
                Err(AttachError { proxy, source }) => {
                    self.handler = PhysicsHandler::Detached(proxy);
                    Err(source)
                }
            },
        }
    }

    /// Unmounts the actor, destroying its solver body and seeding a fresh
    /// detached handler from the body's final state. Releasing a detached
    /// actor is a no-op.
    pub fn release(&mut self) -> EngineResult<()> {
        match std::mem::take(&mut self.handler) {
            PhysicsHandler::Detached(proxy) => {
                self.handler = PhysicsHandler::Detached(proxy);
                Ok(())
            }
            PhysicsHandler::Attached(body) => match body.release() {
                Ok(proxy) => {
                    self.handler = PhysicsHandler::Detached(proxy);
                    Ok(())
                }
                Err(ReleaseError { body, source }) => {
                    self.handler = PhysicsHandler::Attached(body);
                    Err(source)
                }
            },
        }
    }

    // Short-hand passthroughs for the operations nearly every call site
    // uses; everything else goes through `handler_mut()`.

    pub fn position(&self) -> Vec2 {
        self.handler.position()
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.handler.move_by(delta);
    }

    pub fn center(&self) -> Vec2 {
        self.handler.center()
    }

    pub fn velocity(&self) -> Vec2 {
        self.handler.velocity()
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.handler.apply_impulse(impulse);
    }
}
