use anyhow::{bail, Context, Result};
use image::{ImageFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Decodes an uploaded image. Empty rasters are refused because they cannot
/// be laid out on the surface.
pub fn decode(bytes: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory(bytes)
        .context("Failed to decode image")?
        .to_rgba8();
    ensure_not_empty(image)
}

pub fn open(path: &Path) -> Result<RgbaImage> {
    let image = image::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?
        .to_rgba8();
    ensure_not_empty(image)
}

fn ensure_not_empty(image: RgbaImage) -> Result<RgbaImage> {
    if image.width() == 0 || image.height() == 0 {
        bail!("Image has no pixels ({}x{})", image.width(), image.height());
    }
    Ok(image)
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .context("Failed to encode PNG")?;
    Ok(buffer.into_inner())
}

pub fn save_png(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("Failed to save image to {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{decode, encode_png};
    use image::{Rgba, RgbaImage};

    #[test]
    fn png_bytes_decode_to_same_pixels() {
        let image = RgbaImage::from_fn(6, 4, |x, y| Rgba([x as u8 * 40, y as u8 * 60, 9, 255]));
        let bytes = encode_png(&image).expect("encode should succeed");
        assert_eq!(&bytes[1..4], b"PNG");
        assert_eq!(decode(&bytes).expect("decode should succeed"), image);
    }

    #[test]
    fn garbage_bytes_are_an_error() {
        assert!(decode(b"definitely not an image").is_err());
    }
}
