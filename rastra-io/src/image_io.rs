//! Image decode into textures and PNG framebuffer output

use std::io::Write;
use std::path::Path;

use image::codecs::png::PngEncoder;
use image::ImageEncoder;

use rastra_core::{Error, Result, Texture};

fn image_error(e: image::ImageError) -> Error {
    Error::InvalidData(format!("image: {}", e))
}

/// Decode any image the host can read (PNG, JPEG, ...) into a texture.
pub fn load_texture<P: AsRef<Path>>(path: P) -> Result<Texture> {
    let img = image::open(path).map_err(image_error)?;
    texture_from_image(img)
}

/// Decode a texture from an in-memory encoded image.
pub fn texture_from_bytes(data: &[u8]) -> Result<Texture> {
    let img = image::load_from_memory(data).map_err(image_error)?;
    texture_from_image(img)
}

fn texture_from_image(img: image::DynamicImage) -> Result<Texture> {
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    let texels = rgba.pixels().map(|p| p.0).collect();
    Texture::from_texels(width as usize, height as usize, texels)
}

/// Write a row-major non-premultiplied RGBA8 buffer as a PNG file.
pub fn save_png<P: AsRef<Path>>(path: P, width: usize, height: usize, rgba: &[u8]) -> Result<()> {
    check_buffer(width, height, rgba)?;
    let file = std::fs::File::create(path)?;
    write_png(file, width, height, rgba)
}

/// Encode a row-major non-premultiplied RGBA8 buffer as PNG to a writer.
pub fn write_png<W: Write>(writer: W, width: usize, height: usize, rgba: &[u8]) -> Result<()> {
    check_buffer(width, height, rgba)?;
    PngEncoder::new(writer)
        .write_image(
            rgba,
            width as u32,
            height as u32,
            image::ExtendedColorType::Rgba8,
        )
        .map_err(image_error)
}

fn check_buffer(width: usize, height: usize, rgba: &[u8]) -> Result<()> {
    if rgba.len() != width * height * 4 {
        return Err(Error::InvalidData(format!(
            "framebuffer is {} bytes, expected {} for {}x{}",
            rgba.len(),
            width * height * 4,
            width,
            height
        )));
    }
    Ok(())
}
