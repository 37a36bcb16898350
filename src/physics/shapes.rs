//! Collider shape descriptions
//!
//! Shapes are described as plain data and only turned into solver colliders
//! at attachment time. Actors carry a `ShapeSupplier` instead of finished
//! shapes because some inputs (window size, loaded image dimensions) are not
//! known at construction time.

use std::sync::Arc;

use glam::Vec2;

/// Deferred producer of an actor's collider shapes. Evaluated no earlier than
/// attachment; may be evaluated again when shapes are replaced on a live
/// body.
pub type ShapeSupplier = Arc<dyn Fn() -> Vec<ShapeDesc> + Send + Sync>;

/// Supplier that yields no shapes. A shapeless body is valid (a pure
/// reference point); collision-dependent queries on it stay meaningless.
pub fn no_shapes() -> ShapeSupplier {
    Arc::new(Vec::new)
}

/// Supplier that always yields the given fixed shapes.
pub fn fixed_shapes(shapes: Vec<ShapeDesc>) -> ShapeSupplier {
    Arc::new(move || shapes.clone())
}

/// A single collider shape, positioned relative to the body origin.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeDesc {
    Circle { radius: f32, offset: Vec2 },
    Rectangle { half_extents: Vec2, offset: Vec2 },
    /// Convex polygon given in counter-clockwise local coordinates.
    Polygon { points: Vec<Vec2> },
}

impl ShapeDesc {
    /// Axis-aligned bounds of this shape under the given body transform.
    /// Used for numeric center queries while no solver body exists.
    pub fn aabb(&self, position: Vec2, rotation: f32) -> Aabb {
        let rotate = |p: Vec2| Vec2::from_angle(rotation).rotate(p) + position;
        match self {
            ShapeDesc::Circle { radius, offset } => {
                let center = rotate(*offset);
                Aabb {
                    min: center - Vec2::splat(*radius),
                    max: center + Vec2::splat(*radius),
                }
            }
            ShapeDesc::Rectangle {
                half_extents,
                offset,
            } => {
                let corners = [
                    Vec2::new(-half_extents.x, -half_extents.y),
                    Vec2::new(half_extents.x, -half_extents.y),
                    Vec2::new(half_extents.x, half_extents.y),
                    Vec2::new(-half_extents.x, half_extents.y),
                ];
                Aabb::from_points(corners.iter().map(|c| rotate(*offset + *c)))
            }
            ShapeDesc::Polygon { points } => Aabb::from_points(points.iter().map(|p| rotate(*p))),
        }
    }
}

/// 2D axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut min = Vec2::splat(f32::MAX);
        let mut max = Vec2::splat(f32::MIN);
        for p in points {
            min = min.min(p);
            max = max.max(p);
        }
        Self { min, max }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }
}

/// Combined bounds of all shapes under a body transform, or `None` when the
/// supplier yields no shapes.
pub fn shapes_aabb(shapes: &[ShapeDesc], position: Vec2, rotation: f32) -> Option<Aabb> {
    shapes
        .iter()
        .map(|s| s.aabb(position, rotation))
        .reduce(|acc, b| acc.union(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_aabb_follows_translation() {
        let shape = ShapeDesc::Circle {
            radius: 2.0,
            offset: Vec2::ZERO,
        };
        let aabb = shape.aabb(Vec2::new(10.0, -3.0), 0.0);
        assert!((aabb.center() - Vec2::new(10.0, -3.0)).length() < 1e-5);
        assert!((aabb.max.x - 12.0).abs() < 1e-5);
    }

    #[test]
    fn rectangle_aabb_respects_rotation() {
        let shape = ShapeDesc::Rectangle {
            half_extents: Vec2::new(2.0, 1.0),
            offset: Vec2::ZERO,
        };
        let axis_aligned = shape.aabb(Vec2::ZERO, 0.0);
        assert!((axis_aligned.max - Vec2::new(2.0, 1.0)).length() < 1e-5);

        // A quarter turn swaps the extents.
        let quarter = shape.aabb(Vec2::ZERO, std::f32::consts::FRAC_PI_2);
        assert!((quarter.max.x - 1.0).abs() < 1e-4);
        assert!((quarter.max.y - 2.0).abs() < 1e-4);
    }

    #[test]
    fn union_of_shape_bounds() {
        let shapes = vec![
            ShapeDesc::Circle {
                radius: 1.0,
                offset: Vec2::new(-5.0, 0.0),
            },
            ShapeDesc::Circle {
                radius: 1.0,
                offset: Vec2::new(5.0, 0.0),
            },
        ];
        let bounds = shapes_aabb(&shapes, Vec2::ZERO, 0.0).expect("two shapes give bounds");
        assert!((bounds.center() - Vec2::ZERO).length() < 1e-5);
        assert!((bounds.min.x + 6.0).abs() < 1e-5);
        assert!((bounds.max.x - 6.0).abs() < 1e-5);
    }

    #[test]
    fn empty_supplier_gives_no_bounds() {
        assert!(shapes_aabb(&[], Vec2::ZERO, 0.0).is_none());
    }
}
