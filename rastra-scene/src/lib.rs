//! Scene glue: camera parameters, object lists and render-to-PNG
//!
//! A [`Scene`] owns a camera description and a list of objects. It builds
//! the view-projection matrix (optionally refitted so every object is in
//! frame), hands it to the context's shader and drives the render pass.

use std::io::Write;
use std::path::Path;

use rastra_core::{transform, Aabb, Bounded, Color, Matrix4f, Object, Point3f, Result, Vector3f};
use rastra_io::write_png;
use rastra_render::{Context, PhongShader};

/// A camera description plus the objects to render.
#[derive(Debug, Clone)]
pub struct Scene {
    pub eye: Point3f,
    pub center: Point3f,
    pub up: Vector3f,
    pub fovy_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub objects: Vec<Object>,
}

impl Scene {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        eye: Point3f,
        center: Point3f,
        up: Vector3f,
        fovy_deg: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        Self {
            eye,
            center,
            up,
            fovy_deg,
            aspect,
            near,
            far,
            objects: Vec::new(),
        }
    }

    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// The combined bounding box of all objects, in world space.
    pub fn bounding_box(&self) -> Aabb {
        Aabb::for_boxes(self.objects.iter().map(Bounded::bounding_box))
    }

    /// The view-projection matrix for the configured camera.
    pub fn view_projection(&self) -> Matrix4f {
        transform::perspective(self.fovy_deg, self.aspect, self.near, self.far)
            * transform::look_at(self.eye, self.center, self.up)
    }

    /// A view-projection matrix with the eye pulled back along its current
    /// direction until the whole scene fits in the field of view.
    ///
    /// The eye lands at distance `radius / sin(fovy / 2) * 1.1` from the
    /// scene center, where radius is half the diagonal of the scene box.
    pub fn fit_view_projection(&self) -> Matrix4f {
        let bounds = self.bounding_box();
        if bounds.is_empty() {
            return self.view_projection();
        }
        let center = bounds.center();
        let radius = bounds.size().norm() / 2.0;
        let direction = (self.eye - self.center)
            .try_normalize(1e-9)
            .unwrap_or_else(Vector3f::z);
        let distance = radius / (self.fovy_deg.to_radians() / 2.0).sin() * 1.1;
        let eye = center + direction * distance;
        transform::perspective(self.fovy_deg, self.aspect, self.near, self.far)
            * transform::look_at(eye, center, self.up)
    }

    /// Draw every object into the context. Objects with empty meshes are
    /// skipped. Blocks until the pass completes.
    pub fn render(&self, ctx: &Context) {
        for object in &self.objects {
            if object.mesh.is_empty() {
                log::warn!("skipping object with an empty mesh");
                continue;
            }
            ctx.draw_object(object);
        }
    }
}

/// Output settings for the one-call render helpers.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    pub eye: Point3f,
    pub center: Point3f,
    pub up: Vector3f,
    pub fovy_deg: f32,
    /// Output image is size*scale pixels square.
    pub size: usize,
    pub scale: usize,
    pub near: f32,
    pub far: f32,
    pub light_direction: Vector3f,
    pub ambient: Color,
    pub diffuse: Color,
    /// Refit the camera so all objects are in frame.
    pub fit: bool,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            eye: Point3f::new(2.0, 2.0, 2.0),
            center: Point3f::origin(),
            up: Vector3f::y(),
            fovy_deg: 40.0,
            size: 512,
            scale: 1,
            near: 1.0,
            far: 999.0,
            light_direction: Vector3f::new(0.5, 1.0, 0.75).normalize(),
            ambient: Color::hex("#404040"),
            diffuse: Color::hex("#a0a0a0"),
            fit: false,
        }
    }
}

/// Render objects with a Phong shader and write the result as PNG.
pub fn generate_scene<P: AsRef<Path>>(
    path: P,
    objects: Vec<Object>,
    options: &SceneOptions,
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    generate_scene_to_writer(file, objects, options)
}

/// Like [`generate_scene`], but encoding to any writer.
pub fn generate_scene_to_writer<W: Write>(
    writer: W,
    objects: Vec<Object>,
    options: &SceneOptions,
) -> Result<()> {
    let mut scene = Scene::new(
        options.eye,
        options.center,
        options.up,
        options.fovy_deg,
        1.0,
        options.near,
        options.far,
    );
    for object in objects {
        scene.add_object(object);
    }

    let matrix = if options.fit {
        scene.fit_view_projection()
    } else {
        scene.view_projection()
    };
    let shader = PhongShader::new(
        matrix,
        options.light_direction,
        options.eye,
        options.ambient,
        options.diffuse,
    );

    let pixels = options.size * options.scale;
    let ctx = Context::new(pixels, pixels, Box::new(shader));
    scene.render(&ctx);
    write_png(writer, ctx.width, ctx.height, &ctx.color_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rastra_core::{Mesh, Triangle};

    fn quad_object(z: f32) -> Object {
        let a = Point3f::new(-1.0, -1.0, z);
        let b = Point3f::new(1.0, -1.0, z);
        let c = Point3f::new(1.0, 1.0, z);
        let d = Point3f::new(-1.0, 1.0, z);
        Object::from_mesh(Mesh::from_triangles(vec![
            Triangle::from_points(a, b, c),
            Triangle::from_points(a, c, d),
        ]))
        .with_color(Color::RED)
    }

    #[test]
    fn test_scene_bounding_box_spans_objects() {
        let mut scene = Scene::new(
            Point3f::new(0.0, 0.0, 5.0),
            Point3f::origin(),
            Vector3f::y(),
            40.0,
            1.0,
            0.1,
            100.0,
        );
        scene.add_object(quad_object(0.0));
        scene.add_object(quad_object(3.0));
        let bb = scene.bounding_box();
        assert_eq!(bb.min.z, 0.0);
        assert_eq!(bb.max.z, 3.0);
    }

    #[test]
    fn test_fit_view_projection_contains_scene() {
        let mut scene = Scene::new(
            Point3f::new(0.0, 0.0, 5.0),
            Point3f::origin(),
            Vector3f::y(),
            40.0,
            1.0,
            0.1,
            1000.0,
        );
        // An object far too large for the unfitted camera.
        let mut big = quad_object(0.0);
        big.transform(&transform::scale(Vector3f::new(50.0, 50.0, 1.0)));
        scene.add_object(big);

        let vp = scene.fit_view_projection();
        // All corners of the scene box project inside the clip volume.
        let bb = scene.bounding_box();
        for &x in &[bb.min.x, bb.max.x] {
            for &y in &[bb.min.y, bb.max.y] {
                for &z in &[bb.min.z, bb.max.z] {
                    let clip = vp * Point3f::new(x, y, z).to_homogeneous();
                    assert!(clip.x.abs() <= clip.w * 1.001, "x {} outside w {}", clip.x, clip.w);
                    assert!(clip.y.abs() <= clip.w * 1.001);
                }
            }
        }
    }

    #[test]
    fn test_render_skips_empty_meshes() {
        let scene = {
            let mut s = Scene::new(
                Point3f::new(0.0, 0.0, 5.0),
                Point3f::origin(),
                Vector3f::y(),
                40.0,
                1.0,
                0.1,
                100.0,
            );
            s.add_object(Object::from_mesh(Mesh::new()));
            s
        };
        let shader = PhongShader::new(
            scene.view_projection(),
            Vector3f::z(),
            scene.eye,
            Color::WHITE,
            Color::BLACK,
        );
        let ctx = Context::new(16, 16, Box::new(shader));
        scene.render(&ctx);
        assert!(ctx.color_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_generate_scene_produces_decodable_png() {
        let mut encoded = Vec::new();
        let options = SceneOptions {
            eye: Point3f::new(0.0, 0.0, 5.0),
            size: 64,
            fit: true,
            ..SceneOptions::default()
        };
        generate_scene_to_writer(&mut encoded, vec![quad_object(0.0)], &options).unwrap();

        let img = image::load_from_memory(&encoded).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (64, 64));
        // The fitted quad fills the middle of the frame with opaque pixels.
        assert_eq!(img.get_pixel(32, 32).0[3], 255);
    }
}
