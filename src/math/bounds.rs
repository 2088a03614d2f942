use glam::{Mat4, Vec3};

use super::matrix::perspective_divide;

/// Axis-aligned box. `EMPTY` has inverted extents so that growing it by a
/// point yields that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub const UNBOUNDED: Self = Self {
        min: Vec3::splat(f32::NEG_INFINITY),
        max: Vec3::splat(f32::INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut aabb, p| {
            aabb.grow(p);
            aabb
        })
    }

    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// Box around the eight corners carried through `m`.
    pub fn transformed(&self, m: &Mat4) -> Aabb {
        if self.is_empty() {
            return Aabb::EMPTY;
        }
        Aabb::from_points(self.corners().iter().map(|c| m.transform_point3(*c)))
    }

    /// Overlap test against the canonical `[-1, 1]^3` view volume.
    pub fn intersects_ndc(&self) -> bool {
        !self.is_empty()
            && self.min.x <= 1.0
            && self.max.x >= -1.0
            && self.min.y <= 1.0
            && self.max.y >= -1.0
            && self.min.z <= 1.0
            && self.max.z >= -1.0
    }
}

/// Projects `aabb` through `m` and returns its NDC bounds.
///
/// A corner on or behind the eye plane (`w <= 0`) makes the projected box
/// meaningless, so the result is `Aabb::UNBOUNDED` and the caller treats the
/// box as visible.
pub fn aabb_to_clipbox(aabb: &Aabb, m: &Mat4) -> Aabb {
    if aabb.is_empty() {
        return Aabb::EMPTY;
    }
    mesh_to_clipbox(&aabb.corners(), m)
}

/// NDC bounds of a point set through `m`, with the same `w <= 0` rule as
/// [`aabb_to_clipbox`].
pub fn mesh_to_clipbox(points: &[Vec3], m: &Mat4) -> Aabb {
    let mut out = Aabb::EMPTY;
    for p in points {
        let clip = *m * p.extend(1.0);
        if clip.w <= 0.0 {
            return Aabb::UNBOUNDED;
        }
        out.grow(perspective_divide(clip));
    }
    out
}
