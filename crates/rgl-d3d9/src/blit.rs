//! Row/region copy driver.
//!
//! Clipping and pitch walking live here; the per-pixel work is delegated to a [`Kernel`]
//! chosen once per call. Two source conventions are supported:
//!
//! - [`blit_image`] copies a top-down image (texture uploads) row for row.
//! - [`blit_region`] and [`draw_pitched_pixels`] read a bottom-up source (GL framebuffer
//!   layout): destination row `y` samples source row `(src_height - 1) - y`.

use tracing::trace;

use crate::config::BlitConfig;
use crate::error::BlitError;
use crate::image::{PitchedImage, SourceImage};
use crate::kernels::Kernel;
use crate::surface::{PixelBuffer, Surface, SurfaceLock};

/// Half-open rectangle `[x0, x1) x [y0, y1)` in destination coordinates.
///
/// May extend past any edge of the destination; it is clipped before use.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

/// A [`Rect`] after clipping, with the distance its left/top edges moved inward.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ClippedRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub skip_x: u32,
    pub skip_y: u32,
}

impl Rect {
    pub const fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    /// Clips against `[0, width) x [0, height)`. `None` when nothing is left.
    pub fn clip(&self, width: u32, height: u32) -> Option<ClippedRect> {
        if self.is_empty() {
            return None;
        }
        let (x0, y0) = (i64::from(self.x0), i64::from(self.y0));
        let cx0 = x0.max(0);
        let cy0 = y0.max(0);
        let cx1 = i64::from(self.x1).min(i64::from(width));
        let cy1 = i64::from(self.y1).min(i64::from(height));
        if cx0 >= cx1 || cy0 >= cy1 {
            return None;
        }
        Some(ClippedRect {
            x: cx0 as u32,
            y: cy0 as u32,
            width: (cx1 - cx0) as u32,
            height: (cy1 - cy0) as u32,
            skip_x: (cx0 - x0) as u32,
            skip_y: (cy0 - y0) as u32,
        })
    }
}

#[derive(Copy, Clone, Debug)]
struct CopyRegion {
    dst_x: u32,
    dst_y: u32,
    src_x: u32,
    src_y: u32,
    width: u32,
    height: u32,
}

impl CopyRegion {
    /// Shrinks the region to what `src` can supply from `(src_x, src_y)`.
    fn fit_source(mut self, src: &PitchedImage<'_>) -> Option<Self> {
        self.width = self.width.min(src.width().saturating_sub(self.src_x));
        self.height = self.height.min(src.height().saturating_sub(self.src_y));
        (self.width > 0 && self.height > 0).then_some(self)
    }

    fn pixels(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

fn copy_flipped(
    dst: &mut PixelBuffer<'_>,
    src: &PitchedImage<'_>,
    region: CopyRegion,
    kernel: &Kernel,
) -> usize {
    let sbpp = kernel.src_bytes_per_pixel();
    let dbpp = kernel.dst_bytes_per_pixel();
    assert_eq!(sbpp, src.format().bytes_per_pixel(), "kernel/source pixel size mismatch");
    assert_eq!(dbpp, dst.bytes_per_pixel(), "kernel/destination pixel size mismatch");

    let width = region.width as usize;
    let src_pitch = src.pitch();
    let dst_pitch = dst.pitch();
    let src_bits = src.data();
    let dst_bits = dst.bits_mut();

    for y in 0..region.height {
        let src_row = (src.height() - 1 - (region.src_y + y)) as usize;
        let src_off = src_row * src_pitch + region.src_x as usize * sbpp;
        let dst_off = (region.dst_y + y) as usize * dst_pitch + region.dst_x as usize * dbpp;
        kernel.convert_row(&src_bits[src_off..], &mut dst_bits[dst_off..], width);
    }
    region.pixels()
}

/// Copies the bottom-up `src` into `rect` of `dst` and returns the number of pixels written.
///
/// The source's top-left pixel is placed at the rectangle's origin; when the left or top edge
/// is clipped, sampling starts that many pixels into the source. Regions that clip to nothing
/// write nothing.
///
/// # Panics
///
/// Panics if `kernel` does not convert between the pixel sizes of `src` and `dst`.
pub fn blit_region(
    dst: &mut PixelBuffer<'_>,
    src: &PitchedImage<'_>,
    rect: Rect,
    kernel: &Kernel,
) -> usize {
    let Some(clip) = rect.clip(dst.width(), dst.height()) else {
        return 0;
    };
    let region = CopyRegion {
        dst_x: clip.x,
        dst_y: clip.y,
        src_x: clip.skip_x,
        src_y: clip.skip_y,
        width: clip.width,
        height: clip.height,
    };
    match region.fit_source(src) {
        Some(region) => copy_flipped(dst, src, region, kernel),
        None => 0,
    }
}

/// Copies a top-down image into the top-left corner of `dst`.
///
/// Verbatim kernels collapse into one bulk copy when neither side has row padding.
///
/// # Panics
///
/// Panics if `kernel` does not convert between the pixel sizes of `src` and `dst`.
pub fn blit_image(
    dst: &mut PixelBuffer<'_>,
    src: &SourceImage<'_>,
    kernel: &Kernel,
) -> Result<(), BlitError> {
    if src.width() > dst.width() || src.height() > dst.height() {
        return Err(BlitError::DimensionsMismatch {
            src_width: src.width(),
            src_height: src.height(),
            dst_width: dst.width(),
            dst_height: dst.height(),
        });
    }
    if src.is_empty() {
        return Ok(());
    }
    assert_eq!(
        kernel.src_bytes_per_pixel(),
        src.format().bytes_per_pixel(),
        "kernel/source pixel size mismatch"
    );
    assert_eq!(
        kernel.dst_bytes_per_pixel(),
        dst.bytes_per_pixel(),
        "kernel/destination pixel size mismatch"
    );

    let width = src.width() as usize;
    let src_row_bytes = src.row_bytes();
    let dst_pitch = dst.pitch();
    let dst_row_bytes = width * kernel.dst_bytes_per_pixel();
    let bulk = kernel.is_verbatim() && src.width() == dst.width() && dst_pitch == dst_row_bytes;

    let data = src.data();
    let bits = dst.bits_mut();
    if bulk {
        bits[..data.len()].copy_from_slice(data);
        return Ok(());
    }
    for (y, src_row) in data.chunks_exact(src_row_bytes).enumerate() {
        let dst_off = y * dst_pitch;
        kernel.convert_row(src_row, &mut bits[dst_off..dst_off + dst_row_bytes], width);
    }
    Ok(())
}

/// Draws the bottom-up framebuffer `src` into `rect` of `surface`.
///
/// Source and destination share a coordinate space: destination pixel `(x, y)` comes from
/// source column `x`, source row `(src_height - 1) - y`. Regions that clip to nothing return
/// `Ok(0)` without touching the surface.
pub fn draw_pitched_pixels<S: Surface + ?Sized>(
    surface: &mut S,
    rect: Rect,
    src: &PitchedImage<'_>,
    config: &BlitConfig,
) -> Result<usize, BlitError> {
    let (width, height) = surface.size();
    let region = rect.clip(width, height).and_then(|clip| {
        CopyRegion {
            dst_x: clip.x,
            dst_y: clip.y,
            src_x: clip.x,
            src_y: clip.y,
            width: clip.width,
            height: clip.height,
        }
        .fit_source(src)
    });
    let Some(region) = region else {
        trace!(?rect, width, height, "draw region clipped away");
        return Ok(0);
    };

    let mut lock = SurfaceLock::acquire(surface)?;
    let kernel = Kernel::select(src.format(), lock.format(), config)?;
    let mut buffer = lock.buffer()?;
    Ok(copy_flipped(&mut buffer, src, region, &kernel))
}

/// Locks `surface` and uploads the top-down `src` into it.
pub fn upload_image<S: Surface + ?Sized>(
    surface: &mut S,
    src: &SourceImage<'_>,
    config: &BlitConfig,
) -> Result<(), BlitError> {
    let mut lock = SurfaceLock::acquire(surface)?;
    let kernel = Kernel::select(src.format(), lock.format(), config)?;
    let mut buffer = lock.buffer()?;
    blit_image(&mut buffer, src, &kernel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SurfaceError;
    use crate::format::D3DFormat;
    use crate::image::SourceFormat;
    use crate::surface::MemorySurface;
    use pretty_assertions::assert_eq;

    /// Colour-index image whose byte at `(x, y)` is `y * 16 + x`, stored bottom-up when used as
    /// a pitched source.
    fn index_image(width: u32, height: u32) -> Vec<u8> {
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (y * 16 + x) as u8))
            .collect()
    }

    fn p8_buffer(bits: &mut [u8], width: u32, height: u32, pitch: usize) -> PixelBuffer<'_> {
        PixelBuffer::new(bits, width, height, pitch, D3DFormat::P8).unwrap()
    }

    #[test]
    fn clip_moves_edges_inward() {
        assert_eq!(
            Rect::new(-10, 0, 50, 20).clip(100, 100),
            Some(ClippedRect {
                x: 0,
                y: 0,
                width: 50,
                height: 20,
                skip_x: 10,
                skip_y: 0,
            })
        );
        assert_eq!(
            Rect::new(90, -5, 120, 3).clip(100, 10),
            Some(ClippedRect {
                x: 90,
                y: 0,
                width: 10,
                height: 3,
                skip_x: 0,
                skip_y: 5,
            })
        );
        let everything = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(
            everything.clip(4, 4).map(|c| (c.width, c.height)),
            Some((4, 4))
        );
    }

    #[test]
    fn degenerate_and_outside_rects_are_noops() {
        let outside = [
            Rect::new(-20, 0, -10, 4), // left
            Rect::new(8, 0, 12, 4),    // right
            Rect::new(0, -9, 8, 0),    // above
            Rect::new(0, 4, 8, 9),     // below
            Rect::new(3, 1, 3, 2),     // zero width
            Rect::new(5, 3, 2, 1),     // inverted
        ];
        let src_data = index_image(8, 4);
        let src = PitchedImage::new(&src_data, 8, 4, 8, SourceFormat::ColorIndex).unwrap();
        for rect in outside {
            assert_eq!(rect.clip(8, 4), None, "{rect:?}");
            let mut bits = [0xEEu8; 32];
            let mut dst = p8_buffer(&mut bits, 8, 4, 8);
            assert_eq!(blit_region(&mut dst, &src, rect, &Kernel::ColorIndex), 0);
            assert_eq!(bits, [0xEEu8; 32]);
        }
    }

    #[test]
    fn region_flips_rows_and_honours_left_clip() {
        // 6x2 source; stored rows are bottom-up.
        let src_data = index_image(6, 2);
        let src = PitchedImage::new(&src_data, 6, 2, 6, SourceFormat::ColorIndex).unwrap();
        let mut bits = [0u8; 8];
        let mut dst = p8_buffer(&mut bits, 4, 2, 4);

        let written = blit_region(&mut dst, &src, Rect::new(-2, 0, 2, 2), &Kernel::ColorIndex);
        assert_eq!(written, 4);
        // Destination row 0 is the last stored source row, starting two pixels in.
        assert_eq!(bits, [0x12, 0x13, 0, 0, 0x02, 0x03, 0, 0]);
    }

    #[test]
    fn region_is_limited_by_source_extent() {
        let src_data = index_image(3, 1);
        let src = PitchedImage::new(&src_data, 3, 1, 3, SourceFormat::ColorIndex).unwrap();
        let mut bits = [0u8; 8];
        let mut dst = p8_buffer(&mut bits, 4, 2, 4);
        let written = blit_region(&mut dst, &src, Rect::new(0, 0, 4, 2), &Kernel::ColorIndex);
        assert_eq!(written, 3);
        assert_eq!(bits, [0x00, 0x01, 0x02, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn bulk_copy_matches_row_copy() {
        let src_data = index_image(5, 3);
        let src = SourceImage::new(&src_data, 5, 3, SourceFormat::ColorIndex).unwrap();

        let mut tight = vec![0u8; 15];
        blit_image(&mut p8_buffer(&mut tight, 5, 3, 5), &src, &Kernel::ColorIndex).unwrap();

        let mut padded = vec![0u8; 24];
        blit_image(&mut p8_buffer(&mut padded, 5, 3, 8), &src, &Kernel::ColorIndex).unwrap();

        assert_eq!(tight, src_data);
        let unpadded: Vec<u8> = padded.chunks(8).flat_map(|row| row[..5].to_vec()).collect();
        assert_eq!(unpadded, tight);
    }

    #[test]
    fn blit_image_rejects_oversized_sources() {
        let src_data = index_image(5, 3);
        let src = SourceImage::new(&src_data, 5, 3, SourceFormat::ColorIndex).unwrap();
        let mut bits = vec![0u8; 12];
        assert_eq!(
            blit_image(&mut p8_buffer(&mut bits, 4, 3, 4), &src, &Kernel::ColorIndex),
            Err(BlitError::DimensionsMismatch {
                src_width: 5,
                src_height: 3,
                dst_width: 4,
                dst_height: 3
            })
        );
    }

    #[test]
    fn draw_pixels_is_framebuffer_aligned() {
        let mut surface = MemorySurface::new(D3DFormat::P8, 4, 2).unwrap();
        let src_data = index_image(4, 2);
        let src = PitchedImage::new(&src_data, 4, 2, 4, SourceFormat::ColorIndex).unwrap();

        let written =
            draw_pitched_pixels(&mut surface, Rect::new(1, 0, 3, 1), &src, &BlitConfig::default())
                .unwrap();
        assert_eq!(written, 2);
        assert_eq!(surface.row(0), &[0, 0x11, 0x12, 0]);
        assert_eq!(surface.row(1), &[0, 0, 0, 0]);
        assert_eq!((surface.lock_count(), surface.unlock_count()), (1, 1));
    }

    #[test]
    fn clipped_away_draw_never_locks() {
        let mut surface = MemorySurface::new(D3DFormat::R5G6B5, 4, 4).unwrap();
        let src_data = vec![0u8; 64];
        let src = PitchedImage::new(&src_data, 4, 4, 16, SourceFormat::Rgba8).unwrap();
        let written =
            draw_pitched_pixels(&mut surface, Rect::new(4, 0, 9, 4), &src, &BlitConfig::default())
                .unwrap();
        assert_eq!(written, 0);
        assert_eq!(surface.lock_count(), 0);
    }

    #[test]
    fn lock_failure_abandons_only_that_call() {
        let mut surface = MemorySurface::new(D3DFormat::R5G6B5, 2, 1).unwrap();
        let src_data = [0xFFu8; 8];
        let src = PitchedImage::new(&src_data, 2, 1, 8, SourceFormat::Rgba8).unwrap();
        let rect = Rect::new(0, 0, 2, 1);

        surface.fail_next_lock(SurfaceError::WasStillDrawing);
        assert_eq!(
            draw_pitched_pixels(&mut surface, rect, &src, &BlitConfig::default()),
            Err(BlitError::Lock(SurfaceError::WasStillDrawing))
        );
        assert_eq!(surface.read_u16(0, 0), 0);

        assert_eq!(draw_pitched_pixels(&mut surface, rect, &src, &BlitConfig::default()), Ok(2));
        assert_eq!(surface.read_u16(1, 0), 0xFFFF);
        assert!(!surface.is_locked());
    }

    #[test]
    fn upload_unlocks_after_packer_errors() {
        let mut surface = MemorySurface::new(D3DFormat::R8G8B8, 1, 1).unwrap();
        let src_data = [1u8, 2, 3, 4];
        let src = SourceImage::new(&src_data, 1, 1, SourceFormat::Rgba8).unwrap();
        assert_eq!(
            upload_image(&mut surface, &src, &BlitConfig::default()),
            Err(BlitError::UnsupportedPixelSize {
                format: D3DFormat::R8G8B8,
                bytes_per_pixel: 3
            })
        );
        assert_eq!((surface.lock_count(), surface.unlock_count()), (1, 1));
    }

    #[test]
    fn colour_index_upload_into_argb_surface_is_refused() {
        let mut surface = MemorySurface::new(D3DFormat::A8R8G8B8, 2, 1).unwrap();
        let src_data = [0x11u8, 0x22];
        let src = SourceImage::new(&src_data, 2, 1, SourceFormat::ColorIndex).unwrap();
        assert_eq!(
            upload_image(&mut surface, &src, &BlitConfig::default()),
            Err(BlitError::IndexedSourceNeedsPalette {
                format: D3DFormat::A8R8G8B8
            })
        );
        assert!(surface.bits().iter().all(|&b| b == 0));
        assert!(!surface.is_locked());

        let pitched = PitchedImage::new(&src_data, 2, 1, 2, SourceFormat::ColorIndex).unwrap();
        let rect = Rect::new(0, 0, 2, 1);
        assert_eq!(
            draw_pitched_pixels(&mut surface, rect, &pitched, &BlitConfig::default()),
            Err(BlitError::IndexedSourceNeedsPalette {
                format: D3DFormat::A8R8G8B8
            })
        );
        assert!(surface.bits().iter().all(|&b| b == 0));
    }

    #[test]
    #[should_panic(expected = "kernel/destination pixel size mismatch")]
    fn mismatched_kernel_panics_instead_of_writing() {
        let src_data = index_image(2, 1);
        let src = PitchedImage::new(&src_data, 2, 1, 2, SourceFormat::ColorIndex).unwrap();
        let mut bits = vec![0u8; 8];
        let mut dst = PixelBuffer::new(&mut bits, 2, 1, 8, D3DFormat::A8R8G8B8).unwrap();
        blit_region(&mut dst, &src, Rect::new(0, 0, 2, 1), &Kernel::ColorIndex);
    }
}
