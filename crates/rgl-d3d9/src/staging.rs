//! Draw-pixels staging: RGBA8 images are written into a system-memory `A8R8G8B8` surface,
//! which the device then draws as a screen-aligned quad.

use crate::error::BlitError;
use crate::format::D3DFormat;
use crate::image::{SourceFormat, SourceImage};
use crate::kernels::{rgba8_to_a8r8g8b8, Rgba8Texel};
use crate::surface::{MemorySurface, SurfaceLock};

/// Stages `image` (top row first) into a new `A8R8G8B8` surface of the same size.
///
/// Staged pixels are opaque. With `blended` set (blending or alpha test enabled), source
/// pixels whose alpha is zero are skipped and stay transparent black.
pub fn stage_draw_pixels(
    image: &SourceImage<'_>,
    blended: bool,
) -> Result<MemorySurface, BlitError> {
    if image.format() != SourceFormat::Rgba8 {
        return Err(BlitError::StagingNeedsRgba8);
    }

    let mut surface = MemorySurface::new(D3DFormat::A8R8G8B8, image.width(), image.height())?;
    if image.is_empty() {
        return Ok(surface);
    }
    {
        let mut lock = SurfaceLock::acquire(&mut surface)?;
        let mut buffer = lock.buffer()?;
        for (y, src_row) in image.data().chunks_exact(image.row_bytes()).enumerate() {
            let texels: &[Rgba8Texel] = bytemuck::cast_slice(src_row);
            let dst_row = buffer.row_mut(y as u32);
            for (t, d) in texels.iter().zip(dst_row.chunks_exact_mut(4)) {
                if blended && t.a == 0 {
                    continue;
                }
                d.copy_from_slice(&rgba8_to_a8r8g8b8(t.r, t.g, t.b, 0xFF).to_le_bytes());
            }
        }
    }
    Ok(surface)
}

/// Converts a bottom-left raster position into the top-left corner of the staged quad.
///
/// Negative raster positions draw nothing and yield `None`.
pub fn draw_pixels_origin(x: i32, y: i32, height: u32, fb_height: u32) -> Option<(i32, i32)> {
    if x < 0 || y < 0 {
        return None;
    }
    let top = i64::from(fb_height) - 1 - i64::from(y) - i64::from(height);
    i32::try_from(top).ok().map(|top| (x, top))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PIXELS: [u8; 8] = [0x10, 0x20, 0x30, 0x00, 0x40, 0x50, 0x60, 0x80];

    #[test]
    fn staging_forces_opaque_alpha() {
        let image = SourceImage::new(&PIXELS, 1, 2, SourceFormat::Rgba8).unwrap();
        let surface = stage_draw_pixels(&image, false).unwrap();
        assert_eq!(surface.read_u32(0, 0), 0xFF10_2030);
        assert_eq!(surface.read_u32(0, 1), 0xFF40_5060);
        assert!(!surface.is_locked());
        assert_eq!(surface.unlock_count(), 1);
    }

    #[test]
    fn blended_staging_skips_transparent_pixels() {
        let image = SourceImage::new(&PIXELS, 2, 1, SourceFormat::Rgba8).unwrap();
        let surface = stage_draw_pixels(&image, true).unwrap();
        assert_eq!(surface.read_u32(0, 0), 0);
        assert_eq!(surface.read_u32(1, 0), 0xFF40_5060);
    }

    #[test]
    fn staging_needs_rgba8() {
        let image = SourceImage::new(&PIXELS, 2, 2, SourceFormat::Rgba16).unwrap();
        assert_eq!(
            stage_draw_pixels(&image, false).err(),
            Some(BlitError::StagingNeedsRgba8)
        );
    }

    #[test]
    fn raster_origin_flips_to_top_left() {
        assert_eq!(draw_pixels_origin(10, 0, 20, 480), Some((10, 459)));
        assert_eq!(draw_pixels_origin(0, 100, 50, 480), Some((0, 329)));
        assert_eq!(draw_pixels_origin(-1, 0, 20, 480), None);
        assert_eq!(draw_pixels_origin(0, -3, 20, 480), None);
        // Images taller than the remaining framebuffer start above it.
        assert_eq!(draw_pixels_origin(0, 470, 20, 480), Some((0, -11)));
    }
}
