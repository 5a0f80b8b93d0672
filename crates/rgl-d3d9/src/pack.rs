//! Generic channel packer.
//!
//! Works for any destination described by a [`PixelFormatDescriptor`]: each source sample is
//! brought to the destination channel width by truncating low bits (narrower destination) or
//! zero-filling them (wider destination), then shifted into place and OR-ed into the pixel
//! word. No rounding and no high-bit replication; the legacy renderer's
//! output is bit-exact with this policy.

use crate::error::BlitError;
use crate::format::PixelFormatDescriptor;

/// Channel width of the source samples fed to the packer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceDepth {
    /// RGBA8 sources.
    Bits8,
    /// Packed RGBA16 sources (4 bits per channel).
    Bits4,
}

impl SourceDepth {
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits4 => 4,
        }
    }
}

/// Brings `sample` from `src_bits` to `dst_bits` wide.
///
/// A zero-width destination yields zero for any in-range sample.
#[inline]
pub const fn scale_channel(sample: u32, src_bits: u32, dst_bits: u32) -> u32 {
    if dst_bits == src_bits {
        sample
    } else if dst_bits < src_bits {
        sample >> (src_bits - dst_bits)
    } else {
        sample << (dst_bits - src_bits)
    }
}

/// Splits a packed RGBA16 texel into `[R, G, B, A]` 4-bit samples.
#[inline]
pub const fn rgba16_channels(texel: u16) -> [u32; 4] {
    let texel = texel as u32;
    [
        (texel >> 8) & 0xF,
        (texel >> 4) & 0xF,
        texel & 0xF,
        (texel >> 12) & 0xF,
    ]
}

/// Packs one pixel for `desc`.
///
/// Fails with [`BlitError::UnsupportedPixelSize`] for destinations that are neither 16 nor
/// 32 bits wide.
pub fn pack_pixel(
    channels: [u32; 4],
    depth: SourceDepth,
    desc: &PixelFormatDescriptor,
) -> Result<u32, BlitError> {
    GenericPacker::new(*desc, depth).map(|packer| packer.pack(channels))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum WordSize {
    U16,
    U32,
}

/// Generic packer bound to one destination descriptor and source depth.
///
/// Construct it once per blit; the pixel size is validated up front so the per-pixel path
/// has no failure case.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct GenericPacker {
    desc: PixelFormatDescriptor,
    depth: SourceDepth,
    word: WordSize,
}

impl GenericPacker {
    pub fn new(desc: PixelFormatDescriptor, depth: SourceDepth) -> Result<Self, BlitError> {
        let word = match desc.bytes_per_pixel {
            2 => WordSize::U16,
            4 => WordSize::U32,
            bytes_per_pixel => {
                return Err(BlitError::UnsupportedPixelSize {
                    format: desc.format,
                    bytes_per_pixel,
                })
            }
        };
        Ok(Self { desc, depth, word })
    }

    pub fn src_bytes_per_pixel(&self) -> usize {
        match self.depth {
            SourceDepth::Bits8 => 4,
            SourceDepth::Bits4 => 2,
        }
    }

    pub fn dst_bytes_per_pixel(&self) -> usize {
        self.desc.bytes_per_pixel
    }

    #[inline]
    pub fn pack(&self, channels: [u32; 4]) -> u32 {
        let src_bits = self.depth.bits();
        let mut word = 0u32;
        for i in 0..4 {
            let value = scale_channel(channels[i], src_bits, self.desc.channel_bits[i]);
            word |= value << self.desc.channel_shift[i];
        }
        word
    }

    #[inline]
    fn store(&self, word: u32, dst: &mut [u8]) {
        match self.word {
            WordSize::U16 => dst[..2].copy_from_slice(&(word as u16).to_le_bytes()),
            WordSize::U32 => dst[..4].copy_from_slice(&word.to_le_bytes()),
        }
    }

    /// Converts `width` source pixels from `src` into `dst`.
    pub fn convert_row(&self, src: &[u8], dst: &mut [u8], width: usize) {
        let sbpp = self.src_bytes_per_pixel();
        let dbpp = self.dst_bytes_per_pixel();
        let src = &src[..width * sbpp];
        let dst = &mut dst[..width * dbpp];

        match self.depth {
            SourceDepth::Bits8 => {
                for (s, d) in src.chunks_exact(4).zip(dst.chunks_exact_mut(dbpp)) {
                    let channels = [s[0] as u32, s[1] as u32, s[2] as u32, s[3] as u32];
                    self.store(self.pack(channels), d);
                }
            }
            SourceDepth::Bits4 => {
                for (s, d) in src.chunks_exact(2).zip(dst.chunks_exact_mut(dbpp)) {
                    let texel = u16::from_le_bytes([s[0], s[1]]);
                    self.store(self.pack(rgba16_channels(texel)), d);
                }
            }
        }
    }
}
