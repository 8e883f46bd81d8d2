//! Bounding boxes for overlap tests
//!
//! Everything collides as an axis-aligned box except beams, which are
//! oriented boxes tested against axis-aligned ones with separating axes.

use glam::Vec2;
use serde::Serialize;

/// An axis-aligned bounding box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    /// Square box of edge length `size`
    pub fn square(center: Vec2, size: f32) -> Self {
        Self::new(center, Vec2::splat(size))
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    pub fn size(&self) -> Vec2 {
        self.half * 2.0
    }

    /// Strict overlap; boxes that merely touch along an edge do not overlap
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        let reach = self.half + other.half;
        d.x < reach.x && d.y < reach.y
    }

    /// Grow the box by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        Self {
            center: self.center,
            half: self.half + Vec2::splat(margin),
        }
    }

    /// Clamp a box of half extents `half` at `center` so it stays inside `self`
    pub fn clamp_inside(&self, center: Vec2, half: Vec2) -> Vec2 {
        let lo = self.min() + half;
        let hi = self.max() - half;
        Vec2::new(
            center.x.clamp(lo.x, hi.x.max(lo.x)),
            center.y.clamp(lo.y, hi.y.max(lo.y)),
        )
    }
}

/// A box rotated so its local x axis points along `axis`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OrientedBox {
    pub center: Vec2,
    pub half: Vec2,
    /// Unit vector of the local x axis
    pub axis: Vec2,
}

impl OrientedBox {
    /// Box of `length` x `width` starting at `origin` and extending along `direction`
    pub fn from_origin(origin: Vec2, direction: Vec2, length: f32, width: f32) -> Self {
        let axis = direction.try_normalize().unwrap_or(crate::DEFAULT_DIRECTION);
        Self {
            center: origin + axis * (length * 0.5),
            half: Vec2::new(length * 0.5, width * 0.5),
            axis,
        }
    }

    /// Rotation of the local x axis, in radians
    pub fn rotation(&self) -> f32 {
        self.axis.to_angle()
    }

    /// Separating-axis test against an axis-aligned box
    pub fn overlaps_aabb(&self, other: &Aabb) -> bool {
        let perp = self.axis.perp();
        let d = other.center - self.center;

        // The box's own axes
        for (axis, own_half) in [(self.axis, self.half.x), (perp, self.half.y)] {
            let other_reach = other.half.x * axis.x.abs() + other.half.y * axis.y.abs();
            if d.dot(axis).abs() >= own_half + other_reach {
                return false;
            }
        }

        // World axes
        let reach = Vec2::new(
            self.half.x * self.axis.x.abs() + self.half.y * perp.x.abs(),
            self.half.x * self.axis.y.abs() + self.half.y * perp.y.abs(),
        );
        let d = d.abs();
        d.x < reach.x + other.half.x && d.y < reach.y + other.half.y
    }

    /// Smallest axis-aligned box containing this one
    pub fn bounds(&self) -> Aabb {
        let perp = self.axis.perp();
        let half = Vec2::new(
            self.half.x * self.axis.x.abs() + self.half.y * perp.x.abs(),
            self.half.x * self.axis.y.abs() + self.half.y * perp.y.abs(),
        );
        Aabb {
            center: self.center,
            half,
        }
    }
}
