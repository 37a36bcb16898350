//! Per-actor physical attributes
//!
//! `PhysicsData` is the value record an actor's handler owns exclusively.
//! While detached it is the single source of truth; at attachment it seeds
//! the solver body; at detachment a fresh snapshot is read back out of the
//! solver. Ownership transfers exactly once per transition — no two handlers
//! ever alias the same record.

use glam::Vec2;
use rapier2d::prelude::RigidBodyType;

use crate::physics::shapes::{no_shapes, ShapeSupplier};

pub const DEFAULT_DENSITY: f32 = 10.0;
pub const DEFAULT_FRICTION: f32 = 0.0;
pub const DEFAULT_RESTITUTION: f32 = 0.5;

/// How a body participates in the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyType {
    /// Immovable. Gravity has no influence and the solver never updates its
    /// position.
    Static,
    /// Fully simulated rigid body.
    Dynamic,
    /// Moved by velocity only; unaffected by forces and collisions.
    Kinematic,
    /// Detects overlaps but produces no collision response and ignores
    /// gravity. The default for freshly created actors.
    Sensor,
}

impl BodyType {
    pub(crate) fn to_solver(self) -> RigidBodyType {
        match self {
            BodyType::Static => RigidBodyType::Fixed,
            BodyType::Dynamic => RigidBodyType::Dynamic,
            BodyType::Kinematic => RigidBodyType::KinematicVelocityBased,
            // Sensors stay dynamic so queued impulses and velocities behave
            // consistently; the sensor flag lives on the colliders.
            BodyType::Sensor => RigidBodyType::Dynamic,
        }
    }

    pub fn is_sensor(self) -> bool {
        matches!(self, BodyType::Sensor)
    }

    /// Gravity influence for this body type. Sensors and static bodies are
    /// not pulled by gravity regardless of the configured gravity scale.
    pub(crate) fn effective_gravity_scale(self, configured: f32) -> f32 {
        match self {
            BodyType::Sensor | BodyType::Static => 0.0,
            BodyType::Dynamic | BodyType::Kinematic => configured,
        }
    }
}

/// An actor's physical attributes. Plain data; positions in meters, angles in
/// radians, velocities in meters (radians) per second.
#[derive(Clone)]
pub struct PhysicsData {
    pub position: Vec2,
    pub rotation: f32,
    pub velocity: Vec2,
    pub angular_velocity: f32,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub gravity_scale: f32,
    pub torque: f32,
    /// Overrides the mass computed from density × shape area when set.
    pub mass: Option<f32>,
    pub body_type: BodyType,
    pub rotation_locked: bool,
    pub shapes: ShapeSupplier,
}

impl PhysicsData {
    pub fn new(shapes: ShapeSupplier) -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            velocity: Vec2::ZERO,
            angular_velocity: 0.0,
            density: DEFAULT_DENSITY,
            friction: DEFAULT_FRICTION,
            restitution: DEFAULT_RESTITUTION,
            linear_damping: 0.0,
            angular_damping: 0.0,
            gravity_scale: 1.0,
            torque: 0.0,
            mass: None,
            body_type: BodyType::Sensor,
            rotation_locked: false,
            shapes,
        }
    }
}

impl Default for PhysicsData {
    fn default() -> Self {
        Self::new(no_shapes())
    }
}

impl std::fmt::Debug for PhysicsData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicsData")
            .field("position", &self.position)
            .field("rotation", &self.rotation)
            .field("velocity", &self.velocity)
            .field("angular_velocity", &self.angular_velocity)
            .field("density", &self.density)
            .field("friction", &self.friction)
            .field("restitution", &self.restitution)
            .field("body_type", &self.body_type)
            .field("mass", &self.mass)
            .field("rotation_locked", &self.rotation_locked)
            .finish_non_exhaustive()
    }
}
