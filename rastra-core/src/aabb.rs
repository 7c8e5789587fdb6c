//! Axis-aligned bounding box

use serde::{Deserialize, Serialize};

use crate::point::{Matrix4f, Point3f, Vector3f};

/// An axis-aligned box described by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Point3f,
    pub max: Point3f,
}

impl Aabb {
    pub fn new(min: Point3f, max: Point3f) -> Self {
        Self { min, max }
    }

    /// The empty box: min at +inf, max at -inf, identity for [`Aabb::union`]
    pub fn empty() -> Self {
        Self {
            min: Point3f::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
            max: Point3f::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
        }
    }

    /// A cube of half-extent `r` centered on the origin
    pub fn cube(r: f32) -> Self {
        Self::new(Point3f::new(-r, -r, -r), Point3f::new(r, r, r))
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn from_points<I: IntoIterator<Item = Point3f>>(points: I) -> Self {
        let mut aabb = Self::empty();
        for p in points {
            aabb = aabb.extended(p);
        }
        aabb
    }

    pub fn for_boxes<I: IntoIterator<Item = Aabb>>(boxes: I) -> Self {
        boxes.into_iter().fold(Self::empty(), Aabb::union)
    }

    /// The smallest box containing `self` and `p`
    pub fn extended(self, p: Point3f) -> Self {
        Self {
            min: Point3f::new(self.min.x.min(p.x), self.min.y.min(p.y), self.min.z.min(p.z)),
            max: Point3f::new(self.max.x.max(p.x), self.max.y.max(p.y), self.max.z.max(p.z)),
        }
    }

    /// The smallest box containing both boxes
    pub fn union(self, o: Aabb) -> Self {
        self.extended(o.min).extended(o.max)
    }

    pub fn size(&self) -> Vector3f {
        self.max - self.min
    }

    pub fn center(&self) -> Point3f {
        self.anchor(Vector3f::new(0.5, 0.5, 0.5))
    }

    /// A point interpolated between min (t=0) and max (t=1), per component
    pub fn anchor(&self, t: Vector3f) -> Point3f {
        self.min + self.size().component_mul(&t)
    }

    pub fn contains(&self, p: Point3f) -> bool {
        self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
            && self.min.z <= p.z
            && p.z <= self.max.z
    }

    /// The axis-aligned box of this box's eight transformed corners
    pub fn transformed(&self, m: &Matrix4f) -> Self {
        let mut out = Self::empty();
        for &x in &[self.min.x, self.max.x] {
            for &y in &[self.min.y, self.max.y] {
                for &z in &[self.min.z, self.max.z] {
                    out = out.extended(m.transform_point(&Point3f::new(x, y, z)));
                }
            }
        }
        out
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}
