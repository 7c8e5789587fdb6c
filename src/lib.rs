//! # rastra
//!
//! A multithreaded software 3D rasterizer. Textured, shaded triangle meshes
//! and a virtual camera go in; a pixel image in main memory comes out. The
//! whole pipeline — vertex transform, homogeneous clipping, perspective
//! divide, edge-function rasterization, depth test, fragment shading and
//! alpha compositing — runs on the host CPU.
//!
//! This is the umbrella crate. Use it for everything in one place, or pull
//! in the member crates individually:
//!
//! - **rastra-core**: math, colors, meshes, objects, textures
//! - **rastra-render**: the clipper, shaders and the rasterizing context
//! - **rastra-io**: OBJ and glTF loading, texture decode, PNG output
//! - **rastra-scene**: camera setup, fit-view and render-to-PNG glue
//!
//! ## Quick start
//!
//! ```no_run
//! use rastra::prelude::*;
//!
//! let mesh = rastra::io::load_mesh("bunny.obj")?;
//! let object = Object::from_mesh(mesh).with_color(Color::hex("#2a9d8f"));
//!
//! let options = SceneOptions {
//!     eye: Point3f::new(2.0, 2.0, 2.0),
//!     fit: true,
//!     ..SceneOptions::default()
//! };
//! rastra::scene::generate_scene("bunny.png", vec![object], &options)?;
//! # Ok::<(), rastra::Error>(())
//! ```
//!
//! ## Feature flags
//!
//! - `default`: `render`, `io` and `scene`
//! - `render`: the rasterization pipeline
//! - `io`: mesh and image file formats
//! - `scene`: scene-level conveniences
//! - `all`: everything

// Re-export core functionality
pub use rastra_core::*;

// Re-export sub-crates
#[cfg(feature = "render")]
pub use rastra_render as render;

#[cfg(feature = "io")]
pub use rastra_io as io;

#[cfg(feature = "scene")]
pub use rastra_scene as scene;

/// Convenient imports for common use cases
pub mod prelude {
    pub use rastra_core::*;

    #[cfg(feature = "render")]
    pub use rastra_render::*;

    #[cfg(feature = "io")]
    pub use rastra_io::*;

    #[cfg(feature = "scene")]
    pub use rastra_scene::*;
}
