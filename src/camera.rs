//! Scene camera
//!
//! The camera is pure presentation state: a position, an optional focus it
//! tracks, and an optional clamp region. Its per-frame update runs on the
//! coordinating thread after the physics barrier, so a focus provider that
//! reads an actor's center always sees the freshly stepped position. It
//! never mutates physics.

use std::sync::Arc;

use glam::Vec2;

use crate::physics::shapes::Aabb;

/// Supplies the world-space point the camera should track, typically an
/// actor's center.
pub type FocusProvider = Arc<dyn Fn() -> Vec2 + Send + Sync>;

pub struct Camera {
    position: Vec2,
    /// Applied on top of the focus point, e.g. to look ahead of a player.
    offset: Vec2,
    zoom: f32,
    focus: Option<FocusProvider>,
    bounds: Option<Aabb>,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            offset: Vec2::ZERO,
            zoom: 1.0,
            focus: None,
            bounds: None,
        }
    }
}

impl Camera {
    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec2) {
        self.offset = offset;
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Zoom factors at or below zero would flip or collapse the view; they
    /// are clamped away.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.max(f32::MIN_POSITIVE);
    }

    pub fn has_focus(&self) -> bool {
        self.focus.is_some()
    }

    pub fn set_focus(&mut self, focus: FocusProvider) {
        self.focus = Some(focus);
    }

    pub fn clear_focus(&mut self) {
        self.focus = None;
    }

    pub fn bounds(&self) -> Option<Aabb> {
        self.bounds
    }

    /// Restricts the camera position to a region of the world.
    pub fn set_bounds(&mut self, bounds: Option<Aabb>) {
        self.bounds = bounds;
        self.position = clamp_to(self.position, self.bounds);
    }

    /// Per-frame update: snap to the focus (plus offset), then clamp.
    pub fn on_frame_update(&mut self) {
        if let Some(focus) = &self.focus {
            self.position = focus.as_ref()() + self.offset;
        }
        self.position = clamp_to(self.position, self.bounds);
    }
}

fn clamp_to(position: Vec2, bounds: Option<Aabb>) -> Vec2 {
    match bounds {
        Some(bounds) => position.clamp(bounds.min, bounds.max),
        None => position,
    }
}
