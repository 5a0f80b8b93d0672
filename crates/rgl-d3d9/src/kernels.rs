//! Fixed-format fast kernels and per-call kernel selection.
//!
//! Each fast kernel hard-codes the shift/mask arithmetic of one destination format instead of
//! consulting a [`PixelFormatDescriptor`]. Their output is bit-identical to the generic packer
//! for the same destination (except for the undefined `X` bits of `X8R8G8B8`, which the 8888
//! kernel fills with source alpha), so the generic path stays a drop-in fallback.
//!
//! The copy drivers assert that a kernel's pixel sizes match the buffers it is handed, so a
//! mismatched kernel panics instead of writing partial pixels.

use bytemuck::{Pod, Zeroable};
use tracing::debug;

use crate::config::BlitConfig;
use crate::error::BlitError;
use crate::format::{D3DFormat, PixelFormatDescriptor};
use crate::image::SourceFormat;
use crate::pack::GenericPacker;

#[derive(Copy, Clone, Debug, Pod, Zeroable)]
#[repr(C)]
pub(crate) struct Rgba8Texel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

#[inline]
pub const fn rgba8_to_r5g6b5(r: u8, g: u8, b: u8) -> u16 {
    (((r >> 3) as u16) << 11) | (((g >> 2) as u16) << 5) | ((b >> 3) as u16)
}

#[inline]
pub const fn rgba8_to_x1r5g5b5(r: u8, g: u8, b: u8) -> u16 {
    (((r >> 3) as u16) << 10) | (((g >> 3) as u16) << 5) | ((b >> 3) as u16)
}

#[inline]
pub const fn rgba8_to_a4r4g4b4(r: u8, g: u8, b: u8, a: u8) -> u16 {
    (((a & 0xF0) as u16) << 8)
        | (((r & 0xF0) as u16) << 4)
        | ((g & 0xF0) as u16)
        | (((b & 0xF0) as u16) >> 4)
}

#[inline]
pub const fn rgba8_to_a8r8g8b8(r: u8, g: u8, b: u8, a: u8) -> u32 {
    ((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

#[inline]
pub const fn rgba16_to_a8r8g8b8(texel: u16) -> u32 {
    let a = ((texel >> 12) & 0xF) as u32;
    let r = ((texel >> 8) & 0xF) as u32;
    let g = ((texel >> 4) & 0xF) as u32;
    let b = (texel & 0xF) as u32;
    (a << 28) | (r << 20) | (g << 12) | (b << 4)
}

/// Per-pixel conversion chosen once per blit.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Kernel {
    /// Colour-indexed source into a palette surface: bytes are copied verbatim.
    ColorIndex,
    Rgba8ToR5G6B5,
    Rgba8ToX1R5G5B5,
    Rgba8ToA4R4G4B4,
    Rgba8ToA8R8G8B8,
    /// The RGBA16 texel layout already is `A4R4G4B4`; rows are copied verbatim.
    Rgba16ToA4R4G4B4,
    Rgba16ToA8R8G8B8,
    Generic(GenericPacker),
}

impl Kernel {
    /// Picks the kernel converting `source` texels into `dest` pixels.
    ///
    /// Fast kernels are preferred unless `config.only_generic_blitters` is set. RGBA formats
    /// without a fast kernel fall back to the generic packer. Colour-index sources are only
    /// accepted by 8-bit palette destinations.
    ///
    /// # Panics
    ///
    /// Panics if the generic path is needed and `dest` is outside the format table (see
    /// [`PixelFormatDescriptor::resolve`]).
    pub fn select(
        source: SourceFormat,
        dest: D3DFormat,
        config: &BlitConfig,
    ) -> Result<Self, BlitError> {
        let depth = match source.depth() {
            Some(depth) => depth,
            None if dest.is_paletted() && dest.storage_bytes() == Some(1) => {
                return Ok(Self::ColorIndex)
            }
            None => return Err(BlitError::IndexedSourceNeedsPalette { format: dest }),
        };

        let generic = || GenericPacker::new(PixelFormatDescriptor::resolve(dest), depth);
        if config.only_generic_blitters {
            return generic().map(Self::Generic);
        }

        let fast = match (source, dest) {
            (SourceFormat::Rgba8, D3DFormat::R5G6B5) => Some(Self::Rgba8ToR5G6B5),
            (SourceFormat::Rgba8, D3DFormat::X1R5G5B5) => Some(Self::Rgba8ToX1R5G5B5),
            (SourceFormat::Rgba8, D3DFormat::A4R4G4B4) => Some(Self::Rgba8ToA4R4G4B4),
            (SourceFormat::Rgba8, D3DFormat::A8R8G8B8 | D3DFormat::X8R8G8B8) => {
                Some(Self::Rgba8ToA8R8G8B8)
            }
            (SourceFormat::Rgba16, D3DFormat::A4R4G4B4) => Some(Self::Rgba16ToA4R4G4B4),
            (SourceFormat::Rgba16, D3DFormat::A8R8G8B8) => Some(Self::Rgba16ToA8R8G8B8),
            _ => None,
        };

        match fast {
            Some(kernel) => {
                debug!(?source, ?dest, ?kernel, "selected fast blit kernel");
                Ok(kernel)
            }
            None => {
                debug!(?source, ?dest, "no fast blit kernel; using the generic packer");
                generic().map(Self::Generic)
            }
        }
    }

    pub fn src_bytes_per_pixel(&self) -> usize {
        match self {
            Self::ColorIndex => 1,
            Self::Rgba8ToR5G6B5
            | Self::Rgba8ToX1R5G5B5
            | Self::Rgba8ToA4R4G4B4
            | Self::Rgba8ToA8R8G8B8 => 4,
            Self::Rgba16ToA4R4G4B4 | Self::Rgba16ToA8R8G8B8 => 2,
            Self::Generic(packer) => packer.src_bytes_per_pixel(),
        }
    }

    pub fn dst_bytes_per_pixel(&self) -> usize {
        match self {
            Self::ColorIndex => 1,
            Self::Rgba8ToR5G6B5
            | Self::Rgba8ToX1R5G5B5
            | Self::Rgba8ToA4R4G4B4
            | Self::Rgba16ToA4R4G4B4 => 2,
            Self::Rgba8ToA8R8G8B8 | Self::Rgba16ToA8R8G8B8 => 4,
            Self::Generic(packer) => packer.dst_bytes_per_pixel(),
        }
    }

    /// Kernels whose rows are plain byte copies; the copy driver may merge their rows into a
    /// single bulk copy.
    pub fn is_verbatim(&self) -> bool {
        matches!(self, Self::ColorIndex | Self::Rgba16ToA4R4G4B4)
    }

    /// Converts `width` pixels of one row.
    ///
    /// `src` and `dst` must hold at least `width` pixels in the kernel's source and
    /// destination sizes.
    pub fn convert_row(&self, src: &[u8], dst: &mut [u8], width: usize) {
        let src = &src[..width * self.src_bytes_per_pixel()];
        let dst = &mut dst[..width * self.dst_bytes_per_pixel()];

        match self {
            Self::ColorIndex | Self::Rgba16ToA4R4G4B4 => dst.copy_from_slice(src),
            Self::Rgba8ToR5G6B5 => {
                let texels: &[Rgba8Texel] = bytemuck::cast_slice(src);
                for (t, d) in texels.iter().zip(dst.chunks_exact_mut(2)) {
                    d.copy_from_slice(&rgba8_to_r5g6b5(t.r, t.g, t.b).to_le_bytes());
                }
            }
            Self::Rgba8ToX1R5G5B5 => {
                let texels: &[Rgba8Texel] = bytemuck::cast_slice(src);
                for (t, d) in texels.iter().zip(dst.chunks_exact_mut(2)) {
                    d.copy_from_slice(&rgba8_to_x1r5g5b5(t.r, t.g, t.b).to_le_bytes());
                }
            }
            Self::Rgba8ToA4R4G4B4 => {
                let texels: &[Rgba8Texel] = bytemuck::cast_slice(src);
                for (t, d) in texels.iter().zip(dst.chunks_exact_mut(2)) {
                    d.copy_from_slice(&rgba8_to_a4r4g4b4(t.r, t.g, t.b, t.a).to_le_bytes());
                }
            }
            Self::Rgba8ToA8R8G8B8 => {
                let texels: &[Rgba8Texel] = bytemuck::cast_slice(src);
                for (t, d) in texels.iter().zip(dst.chunks_exact_mut(4)) {
                    d.copy_from_slice(&rgba8_to_a8r8g8b8(t.r, t.g, t.b, t.a).to_le_bytes());
                }
            }
            Self::Rgba16ToA8R8G8B8 => {
                for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(4)) {
                    let texel = u16::from_le_bytes([s[0], s[1]]);
                    d.copy_from_slice(&rgba16_to_a8r8g8b8(texel).to_le_bytes());
                }
            }
            Self::Generic(packer) => packer.convert_row(src, dst, width),
        }
    }
}
