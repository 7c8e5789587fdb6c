//! Core traits for geometry

use crate::aabb::Aabb;
use crate::line::Line;
use crate::mesh::Mesh;
use crate::object::Object;
use crate::point::{Matrix4f, Point3f};
use crate::triangle::Triangle;

/// Anything with a spatial extent.
pub trait Bounded {
    fn bounding_box(&self) -> Aabb;

    fn center(&self) -> Point3f {
        self.bounding_box().center()
    }
}

/// Anything that can be transformed in place by a 4x4 matrix.
pub trait Transformable {
    fn transform(&mut self, m: &Matrix4f);
}

impl Bounded for Triangle {
    fn bounding_box(&self) -> Aabb {
        Triangle::bounding_box(self)
    }
}

impl Bounded for Line {
    fn bounding_box(&self) -> Aabb {
        Line::bounding_box(self)
    }
}

impl Bounded for Mesh {
    fn bounding_box(&self) -> Aabb {
        Mesh::bounding_box(self)
    }
}

impl Bounded for Object {
    /// The mesh bounding box carried through the object's model matrix.
    fn bounding_box(&self) -> Aabb {
        self.mesh.bounding_box().transformed(&self.matrix)
    }
}

impl Transformable for Triangle {
    fn transform(&mut self, m: &Matrix4f) {
        Triangle::transform(self, m)
    }
}

impl Transformable for Line {
    fn transform(&mut self, m: &Matrix4f) {
        Line::transform(self, m)
    }
}

impl Transformable for Mesh {
    fn transform(&mut self, m: &Matrix4f) {
        Mesh::transform(self, m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Vector3f;
    use crate::transform::translate;
    use std::sync::Arc;

    #[test]
    fn test_object_bounding_box_uses_matrix() {
        let mesh = Mesh::from_triangles(vec![Triangle::from_points(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        )]);
        let o = Object::new(Arc::new(mesh)).with_matrix(translate(Vector3f::new(10.0, 0.0, 0.0)));
        let bb = o.bounding_box();
        assert_eq!(bb.min.x, 10.0);
        assert_eq!(bb.max.x, 11.0);
    }
}
