//! Simulation world — the rapier2d adapter
//!
//! One `PhysicsWorld` owns the solver structures for one scene layer and the
//! lifetime of every body inside it. Handlers never touch rapier types
//! directly; everything goes through this adapter so the single-writer
//! discipline around `step` stays enforceable in one place.
//!
//! Locking: all solver state sits behind one mutex. `step` additionally
//! raises the `in_step` flag for its whole duration; attach/detach and
//! body-type changes refuse to run while the flag is up instead of silently
//! blocking into the middle of an integration step.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec2;
use parking_lot::Mutex;
use rapier2d::na;
use rapier2d::parry::bounding_volume::{Aabb as SolverAabb, BoundingVolume};
use rapier2d::parry::query::PointQuery;
use rapier2d::prelude::{
    CCDSolver, Collider, ColliderBuilder, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, LockedAxes, MultibodyJointSet, NarrowPhase,
    PhysicsPipeline, QueryPipeline, RigidBody, RigidBodyBuilder, RigidBodyHandle, RigidBodySet,
    RigidBodyType,
};

use crate::error::{EngineError, EngineResult};
use crate::physics::data::{BodyType, PhysicsData};
use crate::physics::shapes::ShapeDesc;

fn to_na(v: Vec2) -> na::Vector2<f32> {
    na::Vector2::new(v.x, v.y)
}

fn from_na(v: &na::Vector2<f32>) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// State read back from a live body when it leaves the world.
#[derive(Debug, Clone)]
pub struct BodySnapshot {
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub friction: f32,
    pub restitution: f32,
    pub gravity_scale: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

struct WorldCore {
    gravity: na::Vector2<f32>,
    integration: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    query: QueryPipeline,
}

impl WorldCore {
    fn new(gravity: Vec2) -> Self {
        Self {
            gravity: to_na(gravity),
            integration: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            query: QueryPipeline::new(),
        }
    }
}

/// Owner of the solver instance for one scene layer.
pub struct PhysicsWorld {
    core: Mutex<WorldCore>,
    in_step: AtomicBool,
    destroyed: AtomicBool,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec2) -> Self {
        Self {
            core: Mutex::new(WorldCore::new(gravity)),
            in_step: AtomicBool::new(false),
            destroyed: AtomicBool::new(false),
        }
    }

    pub fn gravity(&self) -> Vec2 {
        from_na(&self.core.lock().gravity)
    }

    pub fn set_gravity(&self, gravity: Vec2) {
        self.core.lock().gravity = to_na(gravity);
    }

    pub fn body_count(&self) -> usize {
        self.core.lock().bodies.len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    fn guard_transition(&self) -> EngineResult<()> {
        if self.destroyed.load(Ordering::SeqCst) {
            return Err(EngineError::WorldDestroyed);
        }
        if self.in_step.load(Ordering::SeqCst) {
            return Err(EngineError::WorldStepInProgress);
        }
        Ok(())
    }

    /// Creates a solver body plus one collider per supplied shape. When a
    /// mass override is present the colliders carry zero density and the
    /// override becomes the body's additional mass, so the final mass equals
    /// the override exactly.
    pub fn attach(&self, data: &PhysicsData, shapes: &[ShapeDesc]) -> EngineResult<RigidBodyHandle> {
        self.guard_transition()?;
        // Validate every shape before touching the solver so a bad shape
        // cannot leave a half-built body behind.
        let collider_density = if data.mass.is_some() { 0.0 } else { data.density };
        let mut built: Vec<Collider> = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let builder = collider_builder(shape)?;
            built.push(
                builder
                    .density(collider_density)
                    .friction(data.friction)
                    .restitution(data.restitution)
                    .sensor(data.body_type.is_sensor())
                    .build(),
            );
        }

        let mut builder = RigidBodyBuilder::new(data.body_type.to_solver())
            .translation(to_na(data.position))
            .rotation(data.rotation)
            .linvel(to_na(data.velocity))
            .angvel(data.angular_velocity)
            .gravity_scale(data.body_type.effective_gravity_scale(data.gravity_scale))
            .linear_damping(data.linear_damping)
            .angular_damping(data.angular_damping);
        if data.rotation_locked {
            builder = builder.locked_axes(LockedAxes::ROTATION_LOCKED);
        }
        if let Some(mass) = data.mass {
            builder = builder.additional_mass(mass);
        }

        let mut core = self.core.lock();
        let core = &mut *core;
        let handle = core.bodies.insert(builder.build());
        for collider in built {
            core.colliders
                .insert_with_parent(collider, handle, &mut core.bodies);
        }
        if data.torque != 0.0 {
            if let Some(rb) = core.bodies.get_mut(handle) {
                rb.add_torque(data.torque, true);
            }
        }
        log::debug!(
            "attached {:?} body at {:?} with {} shape(s)",
            data.body_type,
            data.position,
            shapes.len()
        );
        Ok(handle)
    }

    /// Reads the body's current state back out and removes it from the
    /// solver.
    pub fn detach(&self, handle: RigidBodyHandle) -> EngineResult<BodySnapshot> {
        self.guard_transition()?;
        let mut core = self.core.lock();
        let core = &mut *core;
        let snapshot = read_snapshot(core, handle).ok_or(EngineError::WorldDestroyed)?;
        core.bodies.remove(
            handle,
            &mut core.islands,
            &mut core.colliders,
            &mut core.impulse_joints,
            &mut core.multibody_joints,
            true,
        );
        Ok(snapshot)
    }

    /// Advances the simulation by exactly `delta_seconds`. Attach/detach on
    /// this world are rejected for the duration.
    pub fn step(&self, delta_seconds: f32) {
        if self.destroyed.load(Ordering::SeqCst) || delta_seconds <= 0.0 {
            return;
        }
        self.in_step.store(true, Ordering::SeqCst);
        {
            let mut core = self.core.lock();
            let core = &mut *core;
            core.integration.dt = delta_seconds;
            core.pipeline.step(
                &core.gravity,
                &core.integration,
                &mut core.islands,
                &mut core.broad_phase,
                &mut core.narrow_phase,
                &mut core.bodies,
                &mut core.colliders,
                &mut core.impulse_joints,
                &mut core.multibody_joints,
                &mut core.ccd,
                Some(&mut core.query),
                &(),
                &(),
            );
        }
        self.in_step.store(false, Ordering::SeqCst);
    }

    /// Drops every remaining body and marks the world dead. The owning scene
    /// force-releases its actors first, so live bodies here mean an actor
    /// leaked out of the scene's bookkeeping.
    pub fn destroy(&self) {
        if self.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut core = self.core.lock();
        let remaining = core.bodies.len();
        if remaining > 0 {
            log::warn!("destroying world with {remaining} live bodies still attached");
        }
        let gravity = from_na(&core.gravity);
        *core = WorldCore::new(gravity);
    }

    // --- per-body operations used by the attached handler ---

    fn with_body<T>(&self, handle: RigidBodyHandle, f: impl FnOnce(&mut RigidBody) -> T) -> Option<T> {
        self.core.lock().bodies.get_mut(handle).map(f)
    }

    fn read_body<T>(&self, handle: RigidBodyHandle, f: impl FnOnce(&RigidBody) -> T) -> Option<T> {
        self.core.lock().bodies.get(handle).map(f)
    }

    pub fn position(&self, handle: RigidBodyHandle) -> Vec2 {
        self.read_body(handle, |rb| from_na(rb.translation()))
            .unwrap_or(Vec2::ZERO)
    }

    pub fn rotation(&self, handle: RigidBodyHandle) -> f32 {
        self.read_body(handle, |rb| rb.rotation().angle()).unwrap_or(0.0)
    }

    pub fn move_by(&self, handle: RigidBodyHandle, delta: Vec2) {
        self.with_body(handle, |rb| {
            let target = rb.translation() + to_na(delta);
            rb.set_translation(target, true);
        });
    }

    pub fn set_position(&self, handle: RigidBodyHandle, position: Vec2) {
        self.with_body(handle, |rb| rb.set_translation(to_na(position), true));
    }

    pub fn rotate_by(&self, handle: RigidBodyHandle, angle: f32) {
        self.with_body(handle, |rb| {
            let target = rb.rotation().angle() + angle;
            rb.set_rotation(na::UnitComplex::new(target), true);
        });
    }

    pub fn set_rotation(&self, handle: RigidBodyHandle, angle: f32) {
        self.with_body(handle, |rb| rb.set_rotation(na::UnitComplex::new(angle), true));
    }

    pub fn velocity(&self, handle: RigidBodyHandle) -> Vec2 {
        self.read_body(handle, |rb| from_na(rb.linvel())).unwrap_or(Vec2::ZERO)
    }

    pub fn set_velocity(&self, handle: RigidBodyHandle, velocity: Vec2) {
        self.with_body(handle, |rb| rb.set_linvel(to_na(velocity), true));
    }

    pub fn angular_velocity(&self, handle: RigidBodyHandle) -> f32 {
        self.read_body(handle, |rb| rb.angvel()).unwrap_or(0.0)
    }

    pub fn set_angular_velocity(&self, handle: RigidBodyHandle, velocity: f32) {
        self.with_body(handle, |rb| rb.set_angvel(velocity, true));
    }

    pub fn apply_force(&self, handle: RigidBodyHandle, force: Vec2) {
        self.with_body(handle, |rb| rb.add_force(to_na(force), true));
    }

    pub fn apply_force_at(&self, handle: RigidBodyHandle, force: Vec2, point: Vec2) {
        self.with_body(handle, |rb| {
            rb.add_force_at_point(to_na(force), na::Point2::new(point.x, point.y), true)
        });
    }

    pub fn apply_impulse(&self, handle: RigidBodyHandle, impulse: Vec2) {
        self.with_body(handle, |rb| rb.apply_impulse(to_na(impulse), true));
    }

    pub fn apply_impulse_at(&self, handle: RigidBodyHandle, impulse: Vec2, point: Vec2) {
        self.with_body(handle, |rb| {
            rb.apply_impulse_at_point(to_na(impulse), na::Point2::new(point.x, point.y), true)
        });
    }

    pub fn apply_torque(&self, handle: RigidBodyHandle, torque: f32) {
        self.with_body(handle, |rb| rb.add_torque(torque, true));
    }

    /// Replaces the continuously applied torque.
    pub fn set_torque(&self, handle: RigidBodyHandle, torque: f32) {
        self.with_body(handle, |rb| {
            rb.reset_torques(true);
            if torque != 0.0 {
                rb.add_torque(torque, true);
            }
        });
    }

    pub fn apply_angular_impulse(&self, handle: RigidBodyHandle, impulse: f32) {
        self.with_body(handle, |rb| rb.apply_torque_impulse(impulse, true));
    }

    pub fn mass(&self, handle: RigidBodyHandle) -> f32 {
        self.read_body(handle, |rb| rb.mass()).unwrap_or(0.0)
    }

    pub fn gravity_scale(&self, handle: RigidBodyHandle) -> f32 {
        self.read_body(handle, |rb| rb.gravity_scale()).unwrap_or(0.0)
    }

    pub fn set_gravity_scale(&self, handle: RigidBodyHandle, scale: f32) {
        self.with_body(handle, |rb| rb.set_gravity_scale(scale, true));
    }

    pub fn linear_damping(&self, handle: RigidBodyHandle) -> f32 {
        self.read_body(handle, |rb| rb.linear_damping()).unwrap_or(0.0)
    }

    pub fn set_linear_damping(&self, handle: RigidBodyHandle, damping: f32) {
        self.with_body(handle, |rb| rb.set_linear_damping(damping));
    }

    pub fn angular_damping(&self, handle: RigidBodyHandle) -> f32 {
        self.read_body(handle, |rb| rb.angular_damping()).unwrap_or(0.0)
    }

    pub fn set_angular_damping(&self, handle: RigidBodyHandle, damping: f32) {
        self.with_body(handle, |rb| rb.set_angular_damping(damping));
    }

    pub fn set_rotation_locked(&self, handle: RigidBodyHandle, locked: bool) {
        self.with_body(handle, |rb| rb.lock_rotations(locked, true));
    }

    /// Writes the density onto every collider of the body; the solver
    /// recomputes mass from the new value.
    pub fn set_density(&self, handle: RigidBodyHandle, density: f32) {
        self.for_each_collider(handle, |c| c.set_density(density));
    }

    pub fn set_friction(&self, handle: RigidBodyHandle, friction: f32) {
        self.for_each_collider(handle, |c| c.set_friction(friction));
    }

    pub fn friction(&self, handle: RigidBodyHandle) -> f32 {
        self.first_collider(handle, |c| c.friction()).unwrap_or(0.0)
    }

    pub fn set_restitution(&self, handle: RigidBodyHandle, restitution: f32) {
        self.for_each_collider(handle, |c| c.set_restitution(restitution));
    }

    pub fn restitution(&self, handle: RigidBodyHandle) -> f32 {
        self.first_collider(handle, |c| c.restitution()).unwrap_or(0.0)
    }

    /// Replaces the mass override. `None` restores density-derived mass.
    pub fn set_mass_override(&self, handle: RigidBodyHandle, mass: Option<f32>, density: f32) {
        let mut core = self.core.lock();
        let core = &mut *core;
        let Some(rb) = core.bodies.get_mut(handle) else {
            return;
        };
        let collider_handles: Vec<_> = rb.colliders().to_vec();
        match mass {
            Some(mass) => {
                rb.set_additional_mass(mass, true);
                for ch in collider_handles {
                    if let Some(c) = core.colliders.get_mut(ch) {
                        c.set_density(0.0);
                    }
                }
            }
            None => {
                rb.set_additional_mass(0.0, true);
                for ch in collider_handles {
                    if let Some(c) = core.colliders.get_mut(ch) {
                        c.set_density(density);
                    }
                }
            }
        }
    }

    /// Changes simulation behavior in place without recreating the body.
    pub fn set_body_type(
        &self,
        handle: RigidBodyHandle,
        body_type: BodyType,
        configured_gravity_scale: f32,
    ) -> EngineResult<()> {
        self.guard_transition()?;
        let mut core = self.core.lock();
        let core = &mut *core;
        let Some(rb) = core.bodies.get_mut(handle) else {
            return Err(EngineError::WorldDestroyed);
        };
        rb.set_body_type(body_type.to_solver(), true);
        rb.set_gravity_scale(body_type.effective_gravity_scale(configured_gravity_scale), true);
        rb.wake_up(true);
        let collider_handles: Vec<_> = rb.colliders().to_vec();
        for ch in collider_handles {
            if let Some(c) = core.colliders.get_mut(ch) {
                c.set_sensor(body_type.is_sensor());
            }
        }
        Ok(())
    }

    /// Tears down the body's colliders and rebuilds them from a fresh shape
    /// evaluation.
    pub fn rebuild_colliders(
        &self,
        handle: RigidBodyHandle,
        shapes: &[ShapeDesc],
        data_like: &PhysicsData,
    ) -> EngineResult<()> {
        let collider_density = if data_like.mass.is_some() { 0.0 } else { data_like.density };
        let mut built: Vec<Collider> = Vec::with_capacity(shapes.len());
        for shape in shapes {
            let builder = collider_builder(shape)?;
            built.push(
                builder
                    .density(collider_density)
                    .friction(data_like.friction)
                    .restitution(data_like.restitution)
                    .sensor(data_like.body_type.is_sensor())
                    .build(),
            );
        }
        let mut core = self.core.lock();
        let core = &mut *core;
        let Some(rb) = core.bodies.get(handle) else {
            return Err(EngineError::WorldDestroyed);
        };
        let old: Vec<_> = rb.colliders().to_vec();
        for ch in old {
            core.colliders
                .remove(ch, &mut core.islands, &mut core.bodies, true);
        }
        for collider in built {
            core.colliders
                .insert_with_parent(collider, handle, &mut core.bodies);
        }
        Ok(())
    }

    pub fn center_of_mass(&self, handle: RigidBodyHandle) -> Vec2 {
        self.read_body(handle, |rb| {
            let com = rb.center_of_mass();
            Vec2::new(com.x, com.y)
        })
        .unwrap_or(Vec2::ZERO)
    }

    /// Center of the combined collider bounds; falls back to the body
    /// position for shapeless bodies.
    pub fn aabb_center(&self, handle: RigidBodyHandle) -> Vec2 {
        let core = self.core.lock();
        let Some(rb) = core.bodies.get(handle) else {
            return Vec2::ZERO;
        };
        let mut bounds: Option<SolverAabb> = None;
        for ch in rb.colliders() {
            if let Some(c) = core.colliders.get(*ch) {
                let aabb = c.compute_aabb();
                bounds = Some(match bounds {
                    Some(mut acc) => {
                        acc.merge(&aabb);
                        acc
                    }
                    None => aabb,
                });
            }
        }
        match bounds {
            Some(aabb) => {
                let center = aabb.center();
                Vec2::new(center.x, center.y)
            }
            None => from_na(rb.translation()),
        }
    }

    pub fn contains_point(&self, handle: RigidBodyHandle, point: Vec2) -> bool {
        let core = self.core.lock();
        let Some(rb) = core.bodies.get(handle) else {
            return false;
        };
        let pt = na::Point2::new(point.x, point.y);
        rb.colliders().iter().any(|ch| {
            core.colliders
                .get(*ch)
                .map_or(false, |c| c.shape().contains_point(c.position(), &pt))
        })
    }

    /// A dynamic body counts as grounded when a static collider touches a
    /// thin probe region directly below its bounds.
    pub fn is_grounded(&self, handle: RigidBodyHandle) -> bool {
        const PROBE_HEIGHT: f32 = 0.01;
        let core = self.core.lock();
        let Some(rb) = core.bodies.get(handle) else {
            return false;
        };
        if rb.body_type() != RigidBodyType::Dynamic {
            return false;
        }
        let mut bounds: Option<SolverAabb> = None;
        for ch in rb.colliders() {
            if let Some(c) = core.colliders.get(*ch) {
                let aabb = c.compute_aabb();
                bounds = Some(match bounds {
                    Some(mut acc) => {
                        acc.merge(&aabb);
                        acc
                    }
                    None => aabb,
                });
            }
        }
        let Some(bounds) = bounds else {
            return false;
        };
        let probe = SolverAabb::new(
            na::Point2::new(bounds.mins.x, bounds.mins.y - PROBE_HEIGHT),
            na::Point2::new(bounds.maxs.x, bounds.mins.y + PROBE_HEIGHT),
        );
        let grounded = core.colliders.iter().any(|(_, c)| {
            let Some(parent) = c.parent() else {
                return false;
            };
            if parent == handle {
                return false;
            }
            let parent_is_static = core
                .bodies
                .get(parent)
                .map_or(false, |b| b.body_type() == RigidBodyType::Fixed);
            parent_is_static && c.compute_aabb().intersects(&probe)
        });
        grounded
    }

    pub(crate) fn snapshot(&self, handle: RigidBodyHandle) -> Option<BodySnapshot> {
        let core = self.core.lock();
        read_snapshot(&core, handle)
    }

    fn for_each_collider(&self, handle: RigidBodyHandle, f: impl Fn(&mut Collider)) {
        let mut core = self.core.lock();
        let core = &mut *core;
        let Some(rb) = core.bodies.get(handle) else {
            return;
        };
        let collider_handles: Vec<_> = rb.colliders().to_vec();
        for ch in collider_handles {
            if let Some(c) = core.colliders.get_mut(ch) {
                f(c);
            }
        }
    }

    fn first_collider<T>(&self, handle: RigidBodyHandle, f: impl Fn(&Collider) -> T) -> Option<T> {
        let core = self.core.lock();
        let rb = core.bodies.get(handle)?;
        let ch = rb.colliders().first()?;
        core.colliders.get(*ch).map(f)
    }
}

fn read_snapshot(core: &WorldCore, handle: RigidBodyHandle) -> Option<BodySnapshot> {
    let rb = core.bodies.get(handle)?;
    // Material values are read from the first collider, the same way they
    // were written across all of them.
    let first = rb
        .colliders()
        .first()
        .and_then(|ch| core.colliders.get(*ch));
    Some(BodySnapshot {
        position: from_na(rb.translation()),
        rotation: rb.rotation().angle(),
        velocity: from_na(rb.linvel()),
        angular_velocity: rb.angvel(),
        friction: first.map_or(0.0, |c| c.friction()),
        restitution: first.map_or(0.0, |c| c.restitution()),
        gravity_scale: rb.gravity_scale(),
        linear_damping: rb.linear_damping(),
        angular_damping: rb.angular_damping(),
    })
}

fn collider_builder(shape: &ShapeDesc) -> EngineResult<ColliderBuilder> {
    match shape {
        ShapeDesc::Circle { radius, offset } => {
            Ok(ColliderBuilder::ball(*radius).translation(to_na(*offset)))
        }
        ShapeDesc::Rectangle {
            half_extents,
            offset,
        } => Ok(ColliderBuilder::cuboid(half_extents.x, half_extents.y).translation(to_na(*offset))),
        ShapeDesc::Polygon { points } => {
            let vertices: Vec<na::Point2<f32>> =
                points.iter().map(|p| na::Point2::new(p.x, p.y)).collect();
            ColliderBuilder::convex_hull(&vertices).ok_or_else(|| {
                EngineError::InvalidShape(format!(
                    "polygon with {} points has no convex hull",
                    points.len()
                ))
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::shapes::ShapeDesc;

    fn ball_data(body_type: BodyType) -> (PhysicsData, Vec<ShapeDesc>) {
        let shapes = vec![ShapeDesc::Circle {
            radius: 0.5,
            offset: Vec2::ZERO,
        }];
        let mut data = PhysicsData::default();
        data.body_type = body_type;
        (data, shapes)
    }

    #[test]
    fn attach_and_detach_roundtrip() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let (mut data, shapes) = ball_data(BodyType::Dynamic);
        data.position = Vec2::new(3.0, 4.0);
        data.rotation = 0.5;
        let handle = world.attach(&data, &shapes).expect("attach should succeed");
        assert_eq!(world.body_count(), 1);

        let snapshot = world.detach(handle).expect("detach should succeed");
        assert_eq!(world.body_count(), 0);
        assert!((snapshot.position - Vec2::new(3.0, 4.0)).length() < 1e-5);
        assert!((snapshot.rotation - 0.5).abs() < 1e-5);
    }

    #[test]
    fn impulse_produces_velocity_under_zero_gravity() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let (data, shapes) = ball_data(BodyType::Dynamic);
        let handle = world.attach(&data, &shapes).expect("attach should succeed");

        let mass = world.mass(handle);
        assert!(mass > 0.0);
        world.apply_impulse(handle, Vec2::new(0.0, 100.0));
        world.step(1.0 / 60.0);

        let velocity = world.velocity(handle);
        assert!((velocity.y - 100.0 / mass).abs() < 1e-3);
    }

    #[test]
    fn static_body_ignores_gravity() {
        let world = PhysicsWorld::new(Vec2::new(0.0, -9.81));
        let (mut data, shapes) = ball_data(BodyType::Static);
        data.position = Vec2::new(0.0, 5.0);
        let handle = world.attach(&data, &shapes).expect("attach should succeed");
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert!((world.position(handle).y - 5.0).abs() < 1e-5);
    }

    #[test]
    fn sensor_has_no_gravity_influence() {
        let world = PhysicsWorld::new(Vec2::new(0.0, -9.81));
        let (data, shapes) = ball_data(BodyType::Sensor);
        let handle = world.attach(&data, &shapes).expect("attach should succeed");
        for _ in 0..30 {
            world.step(1.0 / 60.0);
        }
        assert!(world.velocity(handle).length() < 1e-5);
    }

    #[test]
    fn mass_override_is_exact() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let (mut data, shapes) = ball_data(BodyType::Dynamic);
        data.mass = Some(7.5);
        let handle = world.attach(&data, &shapes).expect("attach should succeed");
        assert!((world.mass(handle) - 7.5).abs() < 1e-4);
    }

    #[test]
    fn shapeless_attach_succeeds() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let (data, _) = ball_data(BodyType::Static);
        let handle = world.attach(&data, &[]).expect("shapeless attach is valid");
        assert_eq!(world.body_count(), 1);
        assert!(!world.contains_point(handle, Vec2::ZERO));
    }

    #[test]
    fn destroyed_world_rejects_attach() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        world.destroy();
        let (data, shapes) = ball_data(BodyType::Dynamic);
        let result = world.attach(&data, &shapes);
        assert!(matches!(result, Err(EngineError::WorldDestroyed)));
    }

    #[test]
    fn grounded_on_static_floor() {
        let world = PhysicsWorld::new(Vec2::new(0.0, -9.81));
        let floor_shapes = vec![ShapeDesc::Rectangle {
            half_extents: Vec2::new(10.0, 0.5),
            offset: Vec2::ZERO,
        }];
        let mut floor = PhysicsData::default();
        floor.body_type = BodyType::Static;
        world.attach(&floor, &floor_shapes).expect("floor attach");

        let box_shapes = vec![ShapeDesc::Rectangle {
            half_extents: Vec2::new(0.5, 0.5),
            offset: Vec2::ZERO,
        }];
        let mut falling = PhysicsData::default();
        falling.body_type = BodyType::Dynamic;
        falling.position = Vec2::new(0.0, 1.0);
        falling.restitution = 0.0;
        let handle = world.attach(&falling, &box_shapes).expect("box attach");

        assert!(world.is_grounded(handle));
        for _ in 0..60 {
            world.step(1.0 / 60.0);
        }
        assert!(world.is_grounded(handle));
    }

    #[test]
    fn contains_point_inside_circle() {
        let world = PhysicsWorld::new(Vec2::ZERO);
        let (mut data, shapes) = ball_data(BodyType::Dynamic);
        data.position = Vec2::new(2.0, 2.0);
        let handle = world.attach(&data, &shapes).expect("attach should succeed");
        assert!(world.contains_point(handle, Vec2::new(2.1, 2.1)));
        assert!(!world.contains_point(handle, Vec2::new(4.0, 4.0)));
    }
}
