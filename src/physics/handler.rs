//! Physics attachment state machine
//!
//! Every actor owns exactly one `PhysicsHandler`. It starts as a
//! `DetachedProxy` — pure numeric bookkeeping over `PhysicsData`, no solver
//! involved — and becomes an `AttachedBody` when the actor is mounted into a
//! scene with a live `PhysicsWorld`. The transitions consume the old variant
//! and produce the new one, so a stale handler cannot be used after its
//! body is gone.
//!
//! Simulation-only operations issued while detached (forces, impulses,
//! velocity) are recorded as `DeferredCommand`s and replayed in order, once,
//! at the moment of attachment. Property mutations apply to `PhysicsData`
//! immediately and seed the body at creation instead.

use std::sync::Arc;

use glam::Vec2;
use rapier2d::prelude::RigidBodyHandle;

use crate::error::{EngineError, EngineResult};
use crate::physics::data::{BodyType, PhysicsData};
use crate::physics::shapes::{shapes_aabb, ShapeSupplier};
use crate::physics::world::PhysicsWorld;

/// An operation that needs a live solver body, recorded while none exists.
/// Kept as plain data so queues stay inspectable in tests and tooling.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredCommand {
    ApplyForce { force: Vec2 },
    ApplyForceAt { force: Vec2, point: Vec2 },
    ApplyImpulse { impulse: Vec2 },
    ApplyImpulseAt { impulse: Vec2, point: Vec2 },
    ApplyTorque { torque: f32 },
    ApplyAngularImpulse { impulse: f32 },
    SetVelocity { velocity: Vec2 },
}

impl DeferredCommand {
    fn apply(self, body: &mut AttachedBody) {
        match self {
            DeferredCommand::ApplyForce { force } => body.apply_force(force),
            DeferredCommand::ApplyForceAt { force, point } => body.apply_force_at(force, point),
            DeferredCommand::ApplyImpulse { impulse } => body.apply_impulse(impulse),
            DeferredCommand::ApplyImpulseAt { impulse, point } => {
                body.apply_impulse_at(impulse, point)
            }
            DeferredCommand::ApplyTorque { torque } => body.apply_torque(torque),
            DeferredCommand::ApplyAngularImpulse { impulse } => body.apply_angular_impulse(impulse),
            DeferredCommand::SetVelocity { velocity } => body.set_velocity(velocity),
        }
    }
}

/// Attachment failed; the proxy is handed back untouched.
#[derive(Debug)]
pub struct AttachError {
    pub proxy: DetachedProxy,
    pub source: EngineError,
}

/// Release was refused (world step in flight); the body is handed back.
#[derive(Debug)]
pub struct ReleaseError {
    pub body: AttachedBody,
    pub source: EngineError,
}

/// Handler for an actor that is not part of any simulation world.
///
/// All property operations work purely on the owned `PhysicsData`;
/// simulation-dependent queries return defined defaults instead of failing,
/// since they are routine during scene setup.
#[derive(Debug)]
pub struct DetachedProxy {
    data: PhysicsData,
    queued: Vec<DeferredCommand>,
}

impl DetachedProxy {
    pub fn new(data: PhysicsData) -> Self {
        Self {
            data,
            queued: Vec::new(),
        }
    }

    pub fn data(&self) -> &PhysicsData {
        &self.data
    }

    pub fn queued_commands(&self) -> &[DeferredCommand] {
        &self.queued
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.data.position += delta;
    }

    pub fn position(&self) -> Vec2 {
        self.data.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.data.position = position;
    }

    pub fn rotation(&self) -> f32 {
        self.data.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.data.rotation = rotation;
    }

    pub fn rotate_by(&mut self, angle: f32) {
        self.data.rotation += angle;
    }

    /// Bounds center of the supplied shapes under the current transform.
    /// Falls back to the position when the supplier yields no shapes.
    pub fn center(&self) -> Vec2 {
        let shapes = self.data.shapes.as_ref()();
        match shapes_aabb(&shapes, self.data.position, self.data.rotation) {
            Some(bounds) => bounds.center(),
            None => self.data.position,
        }
    }

    /// A detached actor has no collidable footprint.
    pub fn contains(&self, _point: Vec2) -> bool {
        false
    }

    /// A detached body is not moving under simulation. The intended velocity
    /// stored for attachment is deliberately not exposed here.
    pub fn velocity(&self) -> Vec2 {
        Vec2::ZERO
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.queued.push(DeferredCommand::SetVelocity { velocity });
    }

    pub fn angular_velocity(&self) -> f32 {
        self.data.angular_velocity
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.data.angular_velocity = velocity;
    }

    pub fn density(&self) -> f32 {
        self.data.density
    }

    pub fn set_density(&mut self, density: f32) -> EngineResult<()> {
        if density <= 0.0 {
            return Err(EngineError::InvalidDensity(density));
        }
        self.data.density = density;
        Ok(())
    }

    pub fn friction(&self) -> f32 {
        self.data.friction
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.data.friction = friction;
    }

    pub fn restitution(&self) -> f32 {
        self.data.restitution
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.data.restitution = restitution;
    }

    pub fn mass(&self) -> f32 {
        self.data.mass.unwrap_or(0.0)
    }

    pub fn set_mass(&mut self, mass: Option<f32>) {
        self.data.mass = mass;
    }

    pub fn gravity_scale(&self) -> f32 {
        self.data.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.data.gravity_scale = scale;
    }

    pub fn linear_damping(&self) -> f32 {
        self.data.linear_damping
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.data.linear_damping = damping;
    }

    pub fn angular_damping(&self) -> f32 {
        self.data.angular_damping
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        self.data.angular_damping = damping;
    }

    pub fn torque(&self) -> f32 {
        self.data.torque
    }

    pub fn set_torque(&mut self, torque: f32) {
        self.data.torque = torque;
    }

    pub fn body_type(&self) -> BodyType {
        self.data.body_type
    }

    pub fn set_body_type(&mut self, body_type: BodyType) {
        self.data.body_type = body_type;
    }

    pub fn is_rotation_locked(&self) -> bool {
        self.data.rotation_locked
    }

    pub fn set_rotation_locked(&mut self, locked: bool) {
        self.data.rotation_locked = locked;
    }

    pub fn is_grounded(&self) -> bool {
        false
    }

    pub fn set_shapes(&mut self, shapes: ShapeSupplier) {
        self.data.shapes = shapes;
    }

    /// Clears the intended movement that would seed the next attachment.
    pub fn reset_movement(&mut self) {
        self.data.velocity = Vec2::ZERO;
        self.data.angular_velocity = 0.0;
        self.queued
            .retain(|c| !matches!(c, DeferredCommand::SetVelocity { .. }));
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.queued.push(DeferredCommand::ApplyForce { force });
    }

    pub fn apply_force_at(&mut self, force: Vec2, point: Vec2) {
        self.queued
            .push(DeferredCommand::ApplyForceAt { force, point });
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.queued.push(DeferredCommand::ApplyImpulse { impulse });
    }

    pub fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        self.queued
            .push(DeferredCommand::ApplyImpulseAt { impulse, point });
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.queued.push(DeferredCommand::ApplyTorque { torque });
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        self.queued
            .push(DeferredCommand::ApplyAngularImpulse { impulse });
    }

    /// The single transition out of the detached state: builds a solver body
    /// from the owned data and the evaluated shape supplier, replays every
    /// queued command against it in FIFO order, and returns the live handler.
    pub fn attach(self, world: &Arc<PhysicsWorld>) -> Result<AttachedBody, AttachError> {
        let shapes = self.data.shapes.as_ref()();
        let handle = match world.attach(&self.data, &shapes) {
            Ok(handle) => handle,
            Err(source) => return Err(AttachError { proxy: self, source }),
        };
        let mut body = AttachedBody {
            world: Arc::clone(world),
            handle,
            shapes: self.data.shapes,
            body_type: self.data.body_type,
            rotation_locked: self.data.rotation_locked,
            density: self.data.density,
            gravity_scale: self.data.gravity_scale,
            torque: self.data.torque,
            mass_override: self.data.mass,
        };
        for command in self.queued {
            command.apply(&mut body);
        }
        Ok(body)
    }
}

impl Default for DetachedProxy {
    fn default() -> Self {
        Self::new(PhysicsData::default())
    }
}

/// Handler for an actor with a live solver body. Every operation mirrors
/// straight onto the body; nothing is queued.
pub struct AttachedBody {
    world: Arc<PhysicsWorld>,
    handle: RigidBodyHandle,
    shapes: ShapeSupplier,
    // Mirrors for values the solver either does not store or stores in a
    // transformed form (e.g. the configured gravity scale before body-type
    // suppression).
    body_type: BodyType,
    rotation_locked: bool,
    density: f32,
    gravity_scale: f32,
    torque: f32,
    mass_override: Option<f32>,
}

impl std::fmt::Debug for AttachedBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttachedBody")
            .field("handle", &self.handle)
            .field("body_type", &self.body_type)
            .field("density", &self.density)
            .field("mass_override", &self.mass_override)
            .finish_non_exhaustive()
    }
}

impl AttachedBody {
    /// Solver-side handle, exposed for collaborators like debug overlays.
    /// Going around the handler with it voids the lifecycle guarantees.
    pub fn body_handle(&self) -> RigidBodyHandle {
        self.handle
    }

    pub fn world(&self) -> &Arc<PhysicsWorld> {
        &self.world
    }

    pub fn move_by(&mut self, delta: Vec2) {
        self.world.move_by(self.handle, delta);
    }

    pub fn position(&self) -> Vec2 {
        self.world.position(self.handle)
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.world.set_position(self.handle, position);
    }

    pub fn rotation(&self) -> f32 {
        self.world.rotation(self.handle)
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.world.set_rotation(self.handle, rotation);
    }

    pub fn rotate_by(&mut self, angle: f32) {
        self.world.rotate_by(self.handle, angle);
    }

    pub fn center(&self) -> Vec2 {
        match self.body_type {
            BodyType::Dynamic => self.world.center_of_mass(self.handle),
            _ => self.world.aabb_center(self.handle),
        }
    }

    pub fn contains(&self, point: Vec2) -> bool {
        self.world.contains_point(self.handle, point)
    }

    pub fn velocity(&self) -> Vec2 {
        self.world.velocity(self.handle)
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.world.set_velocity(self.handle, velocity);
    }

    pub fn angular_velocity(&self) -> f32 {
        self.world.angular_velocity(self.handle)
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        self.world.set_angular_velocity(self.handle, velocity);
    }

    pub fn density(&self) -> f32 {
        self.density
    }

    /// Rewrites every collider's density. Cancels a mass override, since the
    /// caller is asking for density-derived mass again.
    pub fn set_density(&mut self, density: f32) -> EngineResult<()> {
        if density <= 0.0 {
            return Err(EngineError::InvalidDensity(density));
        }
        self.density = density;
        self.mass_override = None;
        self.world.set_mass_override(self.handle, None, density);
        Ok(())
    }

    pub fn friction(&self) -> f32 {
        self.world.friction(self.handle)
    }

    pub fn set_friction(&mut self, friction: f32) {
        self.world.set_friction(self.handle, friction);
    }

    pub fn restitution(&self) -> f32 {
        self.world.restitution(self.handle)
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        self.world.set_restitution(self.handle, restitution);
    }

    pub fn mass(&self) -> f32 {
        self.world.mass(self.handle)
    }

    pub fn set_mass(&mut self, mass: Option<f32>) {
        self.mass_override = mass;
        self.world.set_mass_override(self.handle, mass, self.density);
    }

    pub fn gravity_scale(&self) -> f32 {
        self.gravity_scale
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        self.gravity_scale = scale;
        self.world.set_gravity_scale(
            self.handle,
            self.body_type.effective_gravity_scale(scale),
        );
    }

    pub fn linear_damping(&self) -> f32 {
        self.world.linear_damping(self.handle)
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        self.world.set_linear_damping(self.handle, damping);
    }

    pub fn angular_damping(&self) -> f32 {
        self.world.angular_damping(self.handle)
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        self.world.set_angular_damping(self.handle, damping);
    }

    pub fn torque(&self) -> f32 {
        self.torque
    }

    pub fn set_torque(&mut self, torque: f32) {
        self.torque = torque;
        self.world.set_torque(self.handle, torque);
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn set_body_type(&mut self, body_type: BodyType) -> EngineResult<()> {
        if body_type == self.body_type {
            return Ok(());
        }
        self.world
            .set_body_type(self.handle, body_type, self.gravity_scale)?;
        self.body_type = body_type;
        Ok(())
    }

    pub fn is_rotation_locked(&self) -> bool {
        self.rotation_locked
    }

    pub fn set_rotation_locked(&mut self, locked: bool) {
        self.rotation_locked = locked;
        self.world.set_rotation_locked(self.handle, locked);
    }

    pub fn is_grounded(&self) -> bool {
        self.world.is_grounded(self.handle)
    }

    pub fn reset_movement(&mut self) {
        self.world.set_velocity(self.handle, Vec2::ZERO);
        self.world.set_angular_velocity(self.handle, 0.0);
    }

    pub fn apply_force(&mut self, force: Vec2) {
        self.world.apply_force(self.handle, force);
    }

    pub fn apply_force_at(&mut self, force: Vec2, point: Vec2) {
        self.world.apply_force_at(self.handle, force, point);
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.world.apply_impulse(self.handle, impulse);
    }

    pub fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        self.world.apply_impulse_at(self.handle, impulse, point);
    }

    pub fn apply_torque(&mut self, torque: f32) {
        self.world.apply_torque(self.handle, torque);
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        self.world.apply_angular_impulse(self.handle, impulse);
    }

    /// Replaces the body's colliders from a fresh evaluation of the new
    /// supplier.
    pub fn set_shapes(&mut self, shapes: ShapeSupplier) -> EngineResult<()> {
        let evaluated = shapes.as_ref()();
        let mut rebuild_data = PhysicsData::new(Arc::clone(&shapes));
        rebuild_data.density = self.density;
        rebuild_data.friction = self.friction();
        rebuild_data.restitution = self.restitution();
        rebuild_data.body_type = self.body_type;
        rebuild_data.mass = self.mass_override;
        self.world
            .rebuild_colliders(self.handle, &evaluated, &rebuild_data)?;
        self.shapes = shapes;
        Ok(())
    }

    /// The single transition out of the attached state: reads the body's
    /// final state into a fresh `PhysicsData`, destroys the solver body, and
    /// returns a new proxy seeded from the snapshot.
    pub fn release(self) -> Result<DetachedProxy, ReleaseError> {
        let snapshot = match self.world.detach(self.handle) {
            Ok(snapshot) => Some(snapshot),
            Err(EngineError::WorldStepInProgress) => {
                return Err(ReleaseError {
                    body: self,
                    source: EngineError::WorldStepInProgress,
                });
            }
            Err(err) => {
                log::warn!("releasing handler without a live body: {err}");
                None
            }
        };
        let mut data = PhysicsData::new(self.shapes);
        data.body_type = self.body_type;
        data.rotation_locked = self.rotation_locked;
        data.density = self.density;
        data.gravity_scale = self.gravity_scale;
        data.torque = self.torque;
        data.mass = self.mass_override;
        if let Some(snapshot) = snapshot {
            data.position = snapshot.position;
            data.rotation = snapshot.rotation;
            data.velocity = snapshot.velocity;
            data.angular_velocity = snapshot.angular_velocity;
            data.friction = snapshot.friction;
            data.restitution = snapshot.restitution;
            data.linear_damping = snapshot.linear_damping;
            data.angular_damping = snapshot.angular_damping;
        }
        Ok(DetachedProxy::new(data))
    }
}

/// The two lifecycle states of an actor's physics handler, behind one
/// capability surface.
#[derive(Debug)]
pub enum PhysicsHandler {
    Detached(DetachedProxy),
    Attached(AttachedBody),
}

macro_rules! dispatch {
    ($self:ident, $h:ident => $body:expr) => {
        match $self {
            PhysicsHandler::Detached($h) => $body,
            PhysicsHandler::Attached($h) => $body,
        }
    };
}

impl PhysicsHandler {
    pub fn detached(data: PhysicsData) -> Self {
        PhysicsHandler::Detached(DetachedProxy::new(data))
    }

    pub fn is_attached(&self) -> bool {
        matches!(self, PhysicsHandler::Attached(_))
    }

    pub fn move_by(&mut self, delta: Vec2) {
        dispatch!(self, h => h.move_by(delta))
    }

    pub fn position(&self) -> Vec2 {
        dispatch!(self, h => h.position())
    }

    pub fn set_position(&mut self, position: Vec2) {
        dispatch!(self, h => h.set_position(position))
    }

    pub fn rotation(&self) -> f32 {
        dispatch!(self, h => h.rotation())
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        dispatch!(self, h => h.set_rotation(rotation))
    }

    pub fn rotate_by(&mut self, angle: f32) {
        dispatch!(self, h => h.rotate_by(angle))
    }

    pub fn center(&self) -> Vec2 {
        dispatch!(self, h => h.center())
    }

    pub fn contains(&self, point: Vec2) -> bool {
        dispatch!(self, h => h.contains(point))
    }

    pub fn velocity(&self) -> Vec2 {
        dispatch!(self, h => h.velocity())
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        dispatch!(self, h => h.set_velocity(velocity))
    }

    pub fn angular_velocity(&self) -> f32 {
        dispatch!(self, h => h.angular_velocity())
    }

    pub fn set_angular_velocity(&mut self, velocity: f32) {
        dispatch!(self, h => h.set_angular_velocity(velocity))
    }

    pub fn density(&self) -> f32 {
        dispatch!(self, h => h.density())
    }

    pub fn set_density(&mut self, density: f32) -> EngineResult<()> {
        dispatch!(self, h => h.set_density(density))
    }

    pub fn friction(&self) -> f32 {
        dispatch!(self, h => h.friction())
    }

    pub fn set_friction(&mut self, friction: f32) {
        dispatch!(self, h => h.set_friction(friction))
    }

    pub fn restitution(&self) -> f32 {
        dispatch!(self, h => h.restitution())
    }

    pub fn set_restitution(&mut self, restitution: f32) {
        dispatch!(self, h => h.set_restitution(restitution))
    }

    pub fn mass(&self) -> f32 {
        dispatch!(self, h => h.mass())
    }

    pub fn set_mass(&mut self, mass: Option<f32>) {
        dispatch!(self, h => h.set_mass(mass))
    }

    pub fn gravity_scale(&self) -> f32 {
        dispatch!(self, h => h.gravity_scale())
    }

    pub fn set_gravity_scale(&mut self, scale: f32) {
        dispatch!(self, h => h.set_gravity_scale(scale))
    }

    pub fn linear_damping(&self) -> f32 {
        dispatch!(self, h => h.linear_damping())
    }

    pub fn set_linear_damping(&mut self, damping: f32) {
        dispatch!(self, h => h.set_linear_damping(damping))
    }

    pub fn angular_damping(&self) -> f32 {
        dispatch!(self, h => h.angular_damping())
    }

    pub fn set_angular_damping(&mut self, damping: f32) {
        dispatch!(self, h => h.set_angular_damping(damping))
    }

    pub fn torque(&self) -> f32 {
        dispatch!(self, h => h.torque())
    }

    pub fn set_torque(&mut self, torque: f32) {
        dispatch!(self, h => h.set_torque(torque))
    }

    pub fn body_type(&self) -> BodyType {
        dispatch!(self, h => h.body_type())
    }

    pub fn set_body_type(&mut self, body_type: BodyType) -> EngineResult<()> {
        match self {
            PhysicsHandler::Detached(h) => {
                h.set_body_type(body_type);
                Ok(())
            }
            PhysicsHandler::Attached(h) => h.set_body_type(body_type),
        }
    }

    pub fn is_rotation_locked(&self) -> bool {
        dispatch!(self, h => h.is_rotation_locked())
    }

    pub fn set_rotation_locked(&mut self, locked: bool) {
        dispatch!(self, h => h.set_rotation_locked(locked))
    }

    pub fn is_grounded(&self) -> bool {
        dispatch!(self, h => h.is_grounded())
    }

    pub fn reset_movement(&mut self) {
        dispatch!(self, h => h.reset_movement())
    }

    pub fn apply_force(&mut self, force: Vec2) {
        dispatch!(self, h => h.apply_force(force))
    }

    pub fn apply_force_at(&mut self, force: Vec2, point: Vec2) {
        dispatch!(self, h => h.apply_force_at(force, point))
    }

    pub fn apply_impulse(&mut self, impulse: Vec2) {
        dispatch!(self, h => h.apply_impulse(impulse))
    }

    pub fn apply_impulse_at(&mut self, impulse: Vec2, point: Vec2) {
        dispatch!(self, h => h.apply_impulse_at(impulse, point))
    }

    pub fn apply_torque(&mut self, torque: f32) {
        dispatch!(self, h => h.apply_torque(torque))
    }

    pub fn apply_angular_impulse(&mut self, impulse: f32) {
        dispatch!(self, h => h.apply_angular_impulse(impulse))
    }

    pub fn set_shapes(&mut self, shapes: ShapeSupplier) -> EngineResult<()> {
        match self {
            PhysicsHandler::Detached(h) => {
                h.set_shapes(shapes);
                Ok(())
            }
            PhysicsHandler::Attached(h) => h.set_shapes(shapes),
        }
    }

    /// Queued commands awaiting replay; always empty for a live handler.
    pub fn queued_commands(&self) -> &[DeferredCommand] {
        match self {
            PhysicsHandler::Detached(h) => h.queued_commands(),
            PhysicsHandler::Attached(_) => &[],
        }
    }

    pub fn body_handle(&self) -> Option<RigidBodyHandle> {
        match self {
            PhysicsHandler::Detached(_) => None,
            PhysicsHandler::Attached(h) => Some(h.body_handle()),
        }
    }

    pub fn world(&self) -> Option<&Arc<PhysicsWorld>> {
        match self {
            PhysicsHandler::Detached(_) => None,
            PhysicsHandler::Attached(h) => Some(h.world()),
        }
    }
}

impl Default for PhysicsHandler {
    fn default() -> Self {
        PhysicsHandler::Detached(DetachedProxy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shapes::{fixed_shapes, ShapeDesc};

    fn ball_proxy() -> DetachedProxy {
        let mut data = PhysicsData::new(fixed_shapes(vec![ShapeDesc::Circle {
            radius: 0.5,
            offset: Vec2::ZERO,
        }]));
        data.body_type = BodyType::Dynamic;
        DetachedProxy::new(data)
    }

    #[test]
    fn deferred_commands_queue_in_order() {
        let mut proxy = ball_proxy();
        proxy.apply_impulse(Vec2::new(10.0, 0.0));
        proxy.apply_torque(2.0);
        proxy.set_velocity(Vec2::new(0.0, 5.0));

        let queued = proxy.queued_commands();
        assert_eq!(queued.len(), 3);
        assert_eq!(
            queued[0],
            DeferredCommand::ApplyImpulse {
                impulse: Vec2::new(10.0, 0.0)
            }
        );
        assert_eq!(queued[1], DeferredCommand::ApplyTorque { torque: 2.0 });
        assert_eq!(
            queued[2],
            DeferredCommand::SetVelocity {
                velocity: Vec2::new(0.0, 5.0)
            }
        );
    }

    #[test]
    fn replay_preserves_order() {
        // Impulse first, then an absolute velocity write: the final velocity
        // must be exactly the written one, proving the impulse ran earlier.
        let world = Arc::new(PhysicsWorld::new(Vec2::ZERO));
        let mut proxy = ball_proxy();
        proxy.apply_impulse(Vec2::new(10.0, 0.0));
        proxy.set_velocity(Vec2::new(0.0, 5.0));

        let body = proxy.attach(&world).expect("attach should succeed");
        let velocity = body.velocity();
        assert!(velocity.x.abs() < 1e-4, "impulse must be overwritten: {velocity:?}");
        assert!((velocity.y - 5.0).abs() < 1e-4);
    }

    #[test]
    fn detached_defaults_for_simulation_queries() {
        let proxy = ball_proxy();
        assert!(!proxy.contains(Vec2::ZERO));
        assert!(!proxy.is_grounded());
        assert_eq!(proxy.velocity(), Vec2::ZERO);
    }

    #[test]
    fn detached_center_falls_back_to_position() {
        let mut data = PhysicsData::default();
        data.position = Vec2::new(3.0, -1.0);
        let proxy = DetachedProxy::new(data);
        assert_eq!(proxy.center(), Vec2::new(3.0, -1.0));
    }

    #[test]
    fn detached_center_uses_shape_bounds() {
        let mut data = PhysicsData::new(fixed_shapes(vec![ShapeDesc::Circle {
            radius: 1.0,
            offset: Vec2::new(2.0, 0.0),
        }]));
        data.position = Vec2::new(10.0, 0.0);
        let proxy = DetachedProxy::new(data);
        assert!((proxy.center() - Vec2::new(12.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn density_validation_leaves_data_unchanged() {
        let mut proxy = ball_proxy();
        let before = proxy.density();
        for bad in [0.0, -1.0, -0.0001] {
            assert!(matches!(
                proxy.set_density(bad),
                Err(EngineError::InvalidDensity(_))
            ));
            assert!((proxy.density() - before).abs() < 1e-6);
        }
        proxy.set_density(4.0).expect("positive density is valid");
        assert!((proxy.density() - 4.0).abs() < 1e-6);
    }

    #[test]
    fn attached_density_validation() {
        let world = Arc::new(PhysicsWorld::new(Vec2::ZERO));
        let mut body = ball_proxy().attach(&world).expect("attach should succeed");
        let before = body.density();
        assert!(matches!(
            body.set_density(-2.0),
            Err(EngineError::InvalidDensity(_))
        ));
        assert!((body.density() - before).abs() < 1e-6);
    }

    #[test]
    fn round_trip_continuity() {
        let world = Arc::new(PhysicsWorld::new(Vec2::ZERO));
        let mut body = ball_proxy().attach(&world).expect("attach should succeed");
        body.set_position(Vec2::new(4.0, 2.0));
        body.set_rotation(1.25);
        body.set_velocity(Vec2::new(-3.0, 0.5));

        let proxy = body.release().expect("release outside step");
        assert!((proxy.data().position - Vec2::new(4.0, 2.0)).length() < 1e-4);
        assert!((proxy.data().rotation - 1.25).abs() < 1e-4);
        assert!((proxy.data().velocity - Vec2::new(-3.0, 0.5)).length() < 1e-4);
        assert_eq!(world.body_count(), 0);

        // Reattach: the new body starts from the snapshot, velocity included.
        let body = proxy.attach(&world).expect("reattach should succeed");
        assert!((body.position() - Vec2::new(4.0, 2.0)).length() < 1e-4);
        assert!((body.rotation() - 1.25).abs() < 1e-4);
        assert!((body.velocity() - Vec2::new(-3.0, 0.5)).length() < 1e-4);
    }

    #[test]
    fn queue_empty_after_attach() {
        let world = Arc::new(PhysicsWorld::new(Vec2::ZERO));
        let mut proxy = ball_proxy();
        proxy.apply_force(Vec2::new(1.0, 0.0));
        let body = proxy.attach(&world).expect("attach should succeed");
        let handler = PhysicsHandler::Attached(body);
        assert!(handler.queued_commands().is_empty());
    }

    #[test]
    fn reset_movement_clears_queued_velocity() {
        let mut proxy = ball_proxy();
        proxy.set_velocity(Vec2::new(5.0, 0.0));
        proxy.apply_impulse(Vec2::new(1.0, 0.0));
        proxy.reset_movement();
        assert_eq!(proxy.queued_commands().len(), 1);
        assert!(matches!(
            proxy.queued_commands()[0],
            DeferredCommand::ApplyImpulse { .. }
        ));
    }
}
