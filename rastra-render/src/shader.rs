//! The shader contract and built-in lighting models

use rastra_core::{Color, Matrix4f, Object, Point3f, Vector3f, Vertex};

/// A programmable vertex and fragment stage.
///
/// The vertex stage receives the per-draw model matrix as an argument and
/// composes it with whatever view-projection the shader carries; shader
/// state is never mutated during a draw. `set_view_projection` is the
/// optional "matrix slot": shaders that keep the no-op default ignore the
/// camera and render in world space.
pub trait Shader: Send + Sync {
    /// Populate `output` with the clip-space position (and optionally
    /// transform the normal). Must not retain per-vertex state.
    fn vertex(&self, v: Vertex, model: &Matrix4f) -> Vertex;

    /// Shade one interpolated fragment. Returning alpha <= 0 skips the
    /// pixel write.
    fn fragment(&self, v: &Vertex, object: &Object) -> Color;

    /// Replace the view-projection matrix, when the shader carries one.
    fn set_view_projection(&mut self, _vp: Matrix4f) {}
}

fn reflect(i: Vector3f, n: Vector3f) -> Vector3f {
    i - n * (2.0 * i.dot(&n))
}

/// Clip-space output and inverse-transpose normal transform shared by the
/// built-in shaders.
fn transform_vertex(mut v: Vertex, vp: &Matrix4f, model: &Matrix4f) -> Vertex {
    let mvp = vp * model;
    v.output = mvp * v.position.to_homogeneous();
    if let Some(inverse) = mvp.try_inverse() {
        v.normal = inverse.transpose().transform_vector(&v.normal).normalize();
    }
    v
}

/// Renders every fragment in one flat color.
#[derive(Debug, Clone)]
pub struct SolidColorShader {
    pub view_projection: Matrix4f,
    pub color: Color,
}

impl SolidColorShader {
    pub fn new(view_projection: Matrix4f, color: Color) -> Self {
        Self {
            view_projection,
            color,
        }
    }
}

impl Shader for SolidColorShader {
    fn vertex(&self, mut v: Vertex, model: &Matrix4f) -> Vertex {
        let mvp = self.view_projection * model;
        v.output = mvp * v.position.to_homogeneous();
        v
    }

    fn fragment(&self, _v: &Vertex, _object: &Object) -> Color {
        self.color
    }

    fn set_view_projection(&mut self, vp: Matrix4f) {
        self.view_projection = vp;
    }
}

/// Silhouette outline parameters for [`PhongShader`].
#[derive(Debug, Clone, Copy)]
pub struct Outline {
    pub color: Color,
    /// Surfaces whose normal is within this of perpendicular to the view
    /// direction are drawn in the outline color. Lower is thinner.
    pub factor: f32,
}

/// Ambient + diffuse + specular lighting with optional texture and outline.
#[derive(Debug, Clone)]
pub struct PhongShader {
    pub view_projection: Matrix4f,
    pub light_direction: Vector3f,
    pub camera_position: Point3f,
    pub ambient: Color,
    pub diffuse: Color,
    pub specular: Color,
    pub specular_power: f32,
    pub outline: Option<Outline>,
}

impl PhongShader {
    pub fn new(
        view_projection: Matrix4f,
        light_direction: Vector3f,
        camera_position: Point3f,
        ambient: Color,
        diffuse: Color,
    ) -> Self {
        Self {
            view_projection,
            light_direction,
            camera_position,
            ambient,
            diffuse,
            specular: Color::WHITE,
            specular_power: 0.0,
            outline: None,
        }
    }

    pub fn with_specular(mut self, specular: Color, power: f32) -> Self {
        self.specular = specular;
        self.specular_power = power;
        self
    }

    pub fn with_outline(mut self, color: Color, factor: f32) -> Self {
        self.outline = Some(Outline { color, factor });
        self
    }
}

impl Shader for PhongShader {
    fn vertex(&self, v: Vertex, model: &Matrix4f) -> Vertex {
        transform_vertex(v, &self.view_projection, model)
    }

    fn fragment(&self, v: &Vertex, object: &Object) -> Color {
        if let Some(outline) = self.outline {
            let view_direction = (self.camera_position - v.position).normalize();
            if view_direction.dot(&v.normal).abs() < outline.factor {
                return outline.color;
            }
        }
        if object.use_vertex_color {
            return v.color;
        }

        let mut color = object.color;
        if let Some(texture) = &object.texture {
            let sample = texture.sample(v.texcoord.x, v.texcoord.y);
            if sample.a > 0.0 {
                color = color.lerp(sample.div_scalar(sample.a), sample.a);
            }
        }

        let mut light = self.ambient;
        let diffuse = v.normal.dot(&self.light_direction).max(0.0);
        light = light.add(self.diffuse.mul_scalar(diffuse));
        if diffuse > 0.0 && self.specular_power > 0.0 {
            let camera = (self.camera_position - v.position).normalize();
            let reflected = reflect(-self.light_direction, v.normal);
            let specular = camera.dot(&reflected).max(0.0);
            if specular > 0.0 {
                let specular = specular.powf(self.specular_power);
                light = light.add(self.specular.mul_scalar(specular));
            }
        }
        let lit = color.mul(light).min(Color::WHITE);
        if color.a < 1.0 {
            lit.div_scalar(color.a).with_alpha(color.a)
        } else {
            lit.with_alpha(color.a)
        }
    }

    fn set_view_projection(&mut self, vp: Matrix4f) {
        self.view_projection = vp;
    }
}

/// Cel shading: N.L quantized into shadow bands, with a hard specular gate
/// and an optional rim term.
#[derive(Debug, Clone)]
pub struct ToonShader {
    pub view_projection: Matrix4f,
    pub light_direction: Vector3f,
    pub camera_position: Point3f,
    /// Where the light transitions to full shadow, in (0, 1].
    pub light_cutoff: f32,
    /// Number of distinct shadow bands.
    pub shadow_bands: f32,
    pub specular_color: Color,
    /// Smoothness of the specular highlight, in [0, 1].
    pub glossiness: f32,
    pub rim_color: Color,
    /// How much of the edge the rim light covers, in [0, 1]. 0 disables it.
    pub rim_size: f32,
}

impl ToonShader {
    pub fn new(
        view_projection: Matrix4f,
        light_direction: Vector3f,
        camera_position: Point3f,
    ) -> Self {
        Self {
            view_projection,
            light_direction: light_direction.normalize(),
            camera_position,
            light_cutoff: 0.5,
            shadow_bands: 2.0,
            specular_color: Color::WHITE,
            glossiness: 0.8,
            rim_color: Color::WHITE,
            rim_size: 0.0,
        }
    }
}

impl Shader for ToonShader {
    fn vertex(&self, v: Vertex, model: &Matrix4f) -> Vertex {
        transform_vertex(v, &self.view_projection, model)
    }

    fn fragment(&self, v: &Vertex, object: &Object) -> Color {
        let mut albedo = object.color;
        if let Some(texture) = &object.texture {
            let sample = texture.sample(v.texcoord.x, v.texcoord.y);
            if sample.a > 0.0 {
                albedo = albedo.lerp(sample.div_scalar(sample.a), sample.a);
            }
        }

        let n_dot_l = v.normal.dot(&self.light_direction).max(0.0);
        let shadow =
            (n_dot_l / self.light_cutoff * self.shadow_bands).round() / self.shadow_bands;

        let view_direction = (self.camera_position - v.position).normalize();

        let reflected = reflect(-self.light_direction, v.normal);
        let v_dot_reflected = view_direction.dot(&reflected).max(0.0);
        let specular = if v_dot_reflected > 1.0 - self.glossiness {
            self.specular_color
        } else {
            Color::TRANSPARENT
        };

        let rim_factor = 1.0 - view_direction.dot(&v.normal).max(0.0);
        let rim = if self.rim_size > 0.0 && rim_factor > 1.0 - self.rim_size {
            self.rim_color
        } else {
            Color::TRANSPARENT
        };

        albedo.add(specular).mul_scalar(shadow).add(rim).with_alpha(albedo.a)
    }

    fn set_view_projection(&mut self, vp: Matrix4f) {
        self.view_projection = vp;
    }
}
