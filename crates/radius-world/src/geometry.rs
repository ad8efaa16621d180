//! Minimal geometry for placement and radius tests.
//!
//! The world is Y-up. Radius queries are planar: they measure distance on the
//! XZ ground plane and use Y only for elevation checks.

use std::fmt;

/// A point in world space.
#[derive(Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Squared distance on the XZ plane.
    #[must_use]
    pub fn distance_sq_xz(self, other: Self) -> f32 {
        let dx = self.x - other.x;
        let dz = self.z - other.z;
        dx * dx + dz * dz
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1}, {:.1})", self.x, self.y, self.z)
    }
}

/// Axis-aligned bounding volume.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Bounds spanning two corners given in any order.
    #[must_use]
    pub fn from_corners(a: Vec3, b: Vec3) -> Self {
        Self {
            min: Vec3::new(a.x.min(b.x), a.y.min(b.y), a.z.min(b.z)),
            max: Vec3::new(a.x.max(b.x), a.y.max(b.y), a.z.max(b.z)),
        }
    }

    /// Degenerate bounds around a single point.
    #[must_use]
    pub const fn from_point(point: Vec3) -> Self {
        Self {
            min: point,
            max: point,
        }
    }

    /// Finite and not inverted on any axis.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
            && self.min.z <= self.max.z
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min.x + self.max.x) * 0.5,
            (self.min.y + self.max.y) * 0.5,
            (self.min.z + self.max.z) * 0.5,
        )
    }

    /// Squared XZ distance from `point` to the closest point of these bounds.
    ///
    /// Zero when the point lies inside the footprint. Infinite for bounds
    /// that are not [valid](Self::is_valid).
    #[must_use]
    pub fn closest_distance_sq_xz(&self, point: Vec3) -> f32 {
        if !self.is_valid() {
            return f32::INFINITY;
        }
        let cx = point.x.max(self.min.x).min(self.max.x);
        let cz = point.z.max(self.min.z).min(self.max.z);
        point.distance_sq_xz(Vec3::new(cx, point.y, cz))
    }

    /// Projection onto the ground plane.
    #[must_use]
    pub const fn footprint(&self) -> Rect {
        Rect {
            min_x: self.min.x,
            min_z: self.min.z,
            max_x: self.max.x,
            max_z: self.max.z,
        }
    }
}

/// Axis-aligned rectangle on the XZ plane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min_x: f32,
    pub min_z: f32,
    pub max_x: f32,
    pub max_z: f32,
}

impl Rect {
    /// Square circumscribing the circle of `radius` around `center`.
    #[must_use]
    pub fn around(center: Vec3, radius: f32) -> Self {
        Self {
            min_x: center.x - radius,
            min_z: center.z - radius,
            max_x: center.x + radius,
            max_z: center.z + radius,
        }
    }

    /// Closed-interval overlap test.
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.max_x >= other.min_x
            && self.min_x <= other.max_x
            && self.max_z >= other.min_z
            && self.min_z <= other.max_z
    }
}
