//! A renderable object: mesh, model matrix and material

use std::sync::Arc;

use crate::color::Color;
use crate::mesh::Mesh;
use crate::point::Matrix4f;
use crate::texture::Texture;

/// A mesh instance with its model matrix and material.
///
/// The mesh is shared immutably: several objects may reference the same
/// `Arc<Mesh>` with different transforms and materials.
#[derive(Debug, Clone)]
pub struct Object {
    pub mesh: Arc<Mesh>,
    pub matrix: Matrix4f,
    pub color: Color,
    pub texture: Option<Arc<Texture>>,
    /// When set, the fragment stage returns the interpolated vertex color
    /// verbatim, skipping lighting and texturing.
    pub use_vertex_color: bool,
}

impl Object {
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh,
            matrix: Matrix4f::identity(),
            color: Color::WHITE,
            texture: None,
            use_vertex_color: false,
        }
    }

    pub fn from_mesh(mesh: Mesh) -> Self {
        Self::new(Arc::new(mesh))
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_matrix(mut self, matrix: Matrix4f) -> Self {
        self.matrix = matrix;
        self
    }

    pub fn with_vertex_colors(mut self) -> Self {
        self.use_vertex_color = true;
        self
    }

    /// Post-compose an additional transform onto the model matrix.
    pub fn transform(&mut self, m: &Matrix4f) {
        self.matrix = m * self.matrix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::{Point3f, Vector3f};
    use crate::transform::translate;
    use crate::triangle::Triangle;

    #[test]
    fn test_shared_mesh() {
        let mesh = Arc::new(Mesh::from_triangles(vec![Triangle::from_points(
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(1.0, 0.0, 0.0),
            Point3f::new(0.0, 1.0, 0.0),
        )]));
        let a = Object::new(mesh.clone());
        let b = Object::new(mesh.clone()).with_matrix(translate(Vector3f::x()));
        assert!(Arc::ptr_eq(&a.mesh, &b.mesh));
        assert_ne!(a.matrix, b.matrix);
    }

    #[test]
    fn test_transform_composes() {
        let mesh = Arc::new(Mesh::new());
        let mut o = Object::new(mesh);
        o.transform(&translate(Vector3f::x()));
        o.transform(&translate(Vector3f::x()));
        let p = o.matrix.transform_point(&Point3f::origin());
        assert_eq!(p, Point3f::new(2.0, 0.0, 0.0));
    }
}
