//! Mesh container and whole-mesh operations

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::aabb::Aabb;
use crate::line::Line;
use crate::point::{Matrix4f, Point3f, Vector3f};
use crate::transform::{scale, translate};
use crate::triangle::Triangle;

/// A collection of triangles and lines.
///
/// The bounding box is computed lazily and memoized; every structural
/// mutation resets the cache. Concurrent readers are safe while no writer
/// mutates the mesh.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub lines: Vec<Line>,
    #[serde(skip)]
    bbox: OnceLock<Aabb>,
}

fn position_key(p: &Point3f) -> [u32; 3] {
    [p.x.to_bits(), p.y.to_bits(), p.z.to_bits()]
}

fn normalize_or_zero(v: Vector3f) -> Vector3f {
    v.try_normalize(1e-12).unwrap_or_else(Vector3f::zeros)
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self {
            triangles,
            ..Self::default()
        }
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self {
            lines,
            ..Self::default()
        }
    }

    fn dirty(&mut self) {
        self.bbox = OnceLock::new();
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.lines.is_empty()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn push_triangle(&mut self, t: Triangle) {
        self.triangles.push(t);
        self.dirty();
    }

    pub fn push_line(&mut self, l: Line) {
        self.lines.push(l);
        self.dirty();
    }

    /// Append all primitives of another mesh.
    pub fn add(&mut self, other: &Mesh) {
        self.triangles.extend_from_slice(&other.triangles);
        self.lines.extend_from_slice(&other.lines);
        self.dirty();
    }

    pub fn bounding_box(&self) -> Aabb {
        *self.bbox.get_or_init(|| {
            let triangle_boxes = self.triangles.iter().map(Triangle::bounding_box);
            let line_boxes = self.lines.iter().map(Line::bounding_box);
            Aabb::for_boxes(triangle_boxes.chain(line_boxes))
        })
    }

    pub fn transform(&mut self, m: &Matrix4f) {
        for t in &mut self.triangles {
            t.transform(m);
        }
        for l in &mut self.lines {
            l.transform(m);
        }
        self.dirty();
    }

    pub fn reverse_winding(&mut self) {
        for t in &mut self.triangles {
            t.reverse_winding();
        }
    }

    pub fn set_color(&mut self, c: crate::color::Color) {
        for t in &mut self.triangles {
            t.set_color(c);
        }
        for l in &mut self.lines {
            l.set_color(c);
        }
    }

    /// Signed-tetrahedron volume of a closed triangle mesh.
    pub fn volume(&self) -> f32 {
        let mut v = 0.0;
        for t in &self.triangles {
            let (p1, p2, p3) = (t.v0.position, t.v1.position, t.v2.position);
            v += p1.x * (p2.y * p3.z - p3.y * p2.z) - p2.x * (p1.y * p3.z - p3.y * p1.z)
                + p3.x * (p1.y * p2.z - p2.y * p1.z);
        }
        (v / 6.0).abs()
    }

    pub fn surface_area(&self) -> f32 {
        self.triangles.iter().map(Triangle::area).sum()
    }

    /// Average the normals of all vertices sharing a position.
    pub fn smooth_normals(&mut self) {
        let mut lookup: HashMap<[u32; 3], Vector3f> = HashMap::new();
        for t in &self.triangles {
            for v in [&t.v0, &t.v1, &t.v2] {
                *lookup.entry(position_key(&v.position)).or_insert_with(Vector3f::zeros) +=
                    v.normal;
            }
        }
        for n in lookup.values_mut() {
            *n = normalize_or_zero(*n);
        }
        for t in &mut self.triangles {
            for v in [&mut t.v0, &mut t.v1, &mut t.v2] {
                v.normal = lookup[&position_key(&v.position)];
            }
        }
    }

    /// Like [`Mesh::smooth_normals`], but only averages across normals within
    /// `radians` of each other, preserving hard edges.
    pub fn smooth_normals_threshold(&mut self, radians: f32) {
        let threshold = radians.cos();
        let mut lookup: HashMap<[u32; 3], Vec<Vector3f>> = HashMap::new();
        for t in &self.triangles {
            for v in [&t.v0, &t.v1, &t.v2] {
                lookup.entry(position_key(&v.position)).or_default().push(v.normal);
            }
        }
        for t in &mut self.triangles {
            for v in [&mut t.v0, &mut t.v1, &mut t.v2] {
                let mut sum = Vector3f::zeros();
                for n in &lookup[&position_key(&v.position)] {
                    if n.dot(&v.normal) >= threshold {
                        sum += *n;
                    }
                }
                v.normal = normalize_or_zero(sum);
            }
        }
    }

    /// Translate so that the given anchor of the bounding box lands on `position`.
    /// Returns the matrix that was applied.
    pub fn move_to(&mut self, position: Point3f, anchor: Vector3f) -> Matrix4f {
        let m = translate(position - self.bounding_box().anchor(anchor));
        self.transform(&m);
        m
    }

    /// Center the mesh on the origin.
    pub fn center(&mut self) -> Matrix4f {
        self.move_to(Point3f::origin(), Vector3f::new(0.5, 0.5, 0.5))
    }

    /// Uniformly scale and translate the mesh into `bounds`, placing slack
    /// according to `anchor`. Returns the matrix that was applied.
    pub fn fit_inside(&mut self, bounds: Aabb, anchor: Vector3f) -> Matrix4f {
        let bb = self.bounding_box();
        let s = bounds.size().component_div(&bb.size()).min();
        let extra = bounds.size() - bb.size() * s;
        let m = translate(bounds.min.coords + extra.component_mul(&anchor))
            * scale(Vector3f::new(s, s, s))
            * translate(-bb.min.coords);
        self.transform(&m);
        m
    }

    /// Fit into the origin-centered cube with half-extent 0.5.
    pub fn unit_cube(&mut self) -> Matrix4f {
        self.fit_inside(Aabb::cube(0.5), Vector3f::new(0.5, 0.5, 0.5))
    }

    /// Fit into the origin-centered cube with half-extent 1.
    pub fn bi_unit_cube(&mut self) -> Matrix4f {
        self.fit_inside(Aabb::cube(1.0), Vector3f::new(0.5, 0.5, 0.5))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vertex::Vertex;

    fn quad_mesh() -> Mesh {
        // Two triangles covering the unit square in the XY plane.
        let a = Point3f::new(0.0, 0.0, 0.0);
        let b = Point3f::new(1.0, 0.0, 0.0);
        let c = Point3f::new(1.0, 1.0, 0.0);
        let d = Point3f::new(0.0, 1.0, 0.0);
        Mesh::from_triangles(vec![
            Triangle::from_points(a, b, c),
            Triangle::from_points(a, c, d),
        ])
    }

    #[test]
    fn test_bounding_box_cache_invalidation() {
        let mut m = quad_mesh();
        assert_eq!(m.bounding_box().max, Point3f::new(1.0, 1.0, 0.0));
        m.push_triangle(Triangle::from_points(
            Point3f::new(0.0, 0.0, 2.0),
            Point3f::new(1.0, 0.0, 2.0),
            Point3f::new(0.0, 1.0, 2.0),
        ));
        assert_eq!(m.bounding_box().max, Point3f::new(1.0, 1.0, 2.0));
        m.transform(&translate(Vector3f::new(1.0, 0.0, 0.0)));
        assert_eq!(m.bounding_box().max, Point3f::new(2.0, 1.0, 2.0));
    }

    #[test]
    fn test_empty_mesh() {
        let m = Mesh::new();
        assert!(m.is_empty());
        assert!(m.bounding_box().is_empty());
    }

    #[test]
    fn test_surface_area() {
        assert!((quad_mesh().surface_area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_fit_inside_unit_cube() {
        let mut m = quad_mesh();
        m.transform(&scale(Vector3f::new(4.0, 4.0, 1.0)));
        m.unit_cube();
        let bb = m.bounding_box();
        assert!(bb.size().x <= 1.0 + 1e-5);
        assert!(bb.size().y <= 1.0 + 1e-5);
        assert!(bb.min.x >= -0.5 - 1e-5 && bb.max.x <= 0.5 + 1e-5);
    }

    #[test]
    fn test_center() {
        let mut m = quad_mesh();
        m.center();
        let c = m.bounding_box().center();
        assert!(c.coords.norm() < 1e-6);
    }

    #[test]
    fn test_smooth_normals_merges_shared_positions() {
        // Two faces meeting at a right angle along the edge x=1.
        let mut m = Mesh::from_triangles(vec![
            Triangle::from_points(
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ),
            Triangle::from_points(
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, -1.0),
                Point3f::new(1.0, 1.0, 0.0),
            ),
        ]);
        m.smooth_normals();
        // The shared vertex normal is the average of +z and +x, renormalized.
        let shared = m.triangles[0].v1;
        assert_eq!(shared.position, Point3f::new(1.0, 0.0, 0.0));
        let expected = Vector3f::new(1.0, 0.0, 1.0).normalize();
        assert!((shared.normal - expected).norm() < 1e-5);
    }

    #[test]
    fn test_smooth_normals_threshold_preserves_hard_edges() {
        let mut m = Mesh::from_triangles(vec![
            Triangle::from_points(
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ),
            Triangle::from_points(
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, -1.0),
                Point3f::new(1.0, 1.0, 0.0),
            ),
        ]);
        // 90 degree crease, 30 degree threshold: normals stay per-face.
        m.smooth_normals_threshold(radians_for_test(30.0));
        assert_eq!(m.triangles[0].v1.normal, Vector3f::z());
        assert_eq!(m.triangles[1].v0.normal, Vector3f::x());
    }

    fn radians_for_test(deg: f32) -> f32 {
        deg.to_radians()
    }

    #[test]
    fn test_add_resets_cache() {
        let mut m = quad_mesh();
        let _ = m.bounding_box();
        let mut far = Mesh::new();
        far.push_triangle(Triangle::new(
            Vertex::from_position(Point3f::new(9.0, 9.0, 9.0)),
            Vertex::from_position(Point3f::new(10.0, 9.0, 9.0)),
            Vertex::from_position(Point3f::new(9.0, 10.0, 9.0)),
        ));
        m.add(&far);
        assert_eq!(m.bounding_box().max, Point3f::new(10.0, 10.0, 9.0));
    }
}
