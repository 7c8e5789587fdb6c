//! The rastra render pipeline
//!
//! Everything between a mesh and a pixel: the homogeneous-space clipper,
//! the shader contract with its built-in lighting models, and the device
//! context that owns the framebuffer, runs the triangle and line
//! rasterizer and fans primitives out across worker threads.

pub mod clip;
pub mod context;
pub mod shader;

pub use clip::{clip_line, clip_triangle};
pub use context::{Context, CullMode, Winding};
pub use shader::{Outline, PhongShader, Shader, SolidColorShader, ToonShader};
