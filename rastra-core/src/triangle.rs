//! Triangle primitive

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::color::Color;
use crate::point::{Matrix4f, Point3f, Vector3f};
use crate::vertex::Vertex;

/// A triangle with full per-vertex attributes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub v0: Vertex,
    pub v1: Vertex,
    pub v2: Vertex,
}

impl Triangle {
    /// Build a triangle and fill any zero vertex normals from the face normal.
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        let mut t = Self { v0, v1, v2 };
        t.fix_normals();
        t
    }

    pub fn from_points(p0: Point3f, p1: Point3f, p2: Point3f) -> Self {
        Self::new(
            Vertex::from_position(p0),
            Vertex::from_position(p1),
            Vertex::from_position(p2),
        )
    }

    /// Face normal from the cross product of the first two edges.
    pub fn normal(&self) -> Vector3f {
        let e1 = self.v1.position - self.v0.position;
        let e2 = self.v2.position - self.v0.position;
        e1.cross(&e2).normalize()
    }

    pub fn area(&self) -> f32 {
        let e1 = self.v1.position - self.v0.position;
        let e2 = self.v2.position - self.v0.position;
        e1.cross(&e2).norm() / 2.0
    }

    /// True when two positions coincide or any position component is not finite.
    pub fn is_degenerate(&self) -> bool {
        let (p0, p1, p2) = (self.v0.position, self.v1.position, self.v2.position);
        if p0 == p1 || p0 == p2 || p1 == p2 {
            return true;
        }
        ![p0, p1, p2]
            .iter()
            .all(|p| p.x.is_finite() && p.y.is_finite() && p.z.is_finite())
    }

    /// Any vertex with a zero normal inherits the face normal.
    pub fn fix_normals(&mut self) {
        let n = self.normal();
        if !(n.x.is_finite() && n.y.is_finite() && n.z.is_finite()) {
            return;
        }
        for v in [&mut self.v0, &mut self.v1, &mut self.v2] {
            if v.normal == Vector3f::zeros() {
                v.normal = n;
            }
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points([self.v0.position, self.v1.position, self.v2.position])
    }

    pub fn transform(&mut self, m: &Matrix4f) {
        for v in [&mut self.v0, &mut self.v1, &mut self.v2] {
            v.position = m.transform_point(&v.position);
            v.normal = m.transform_vector(&v.normal);
        }
    }

    /// Swap the winding order and flip the normals.
    pub fn reverse_winding(&mut self) {
        std::mem::swap(&mut self.v0, &mut self.v2);
        for v in [&mut self.v0, &mut self.v1, &mut self.v2] {
            v.normal = -v.normal;
        }
    }

    pub fn set_color(&mut self, c: Color) {
        self.v0.color = c;
        self.v1.color = c;
        self.v2.color = c;
    }
}
