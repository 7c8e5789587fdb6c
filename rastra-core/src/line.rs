//! Line primitive

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::color::Color;
use crate::point::{Matrix4f, Point3f};
use crate::vertex::Vertex;

/// A line segment with per-vertex attributes, rasterized as a thickened quad.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub v0: Vertex,
    pub v1: Vertex,
}

impl Line {
    pub fn new(v0: Vertex, v1: Vertex) -> Self {
        Self { v0, v1 }
    }

    pub fn from_points(p0: Point3f, p1: Point3f) -> Self {
        Self::new(Vertex::from_position(p0), Vertex::from_position(p1))
    }

    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points([self.v0.position, self.v1.position])
    }

    pub fn transform(&mut self, m: &Matrix4f) {
        for v in [&mut self.v0, &mut self.v1] {
            v.position = m.transform_point(&v.position);
            v.normal = m.transform_vector(&v.normal);
        }
    }

    pub fn set_color(&mut self, c: Color) {
        self.v0.color = c;
        self.v1.color = c;
    }
}
