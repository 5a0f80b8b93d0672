//! GL-side source images.

use crate::error::BlitError;
use crate::pack::SourceDepth;

/// Texel layout of a source image handed over by the legacy renderer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    /// One palette index per texel.
    ColorIndex,
    /// `[R, G, B, A]` bytes per texel.
    Rgba8,
    /// One little-endian `u16` per texel laid out as `A<<12 | R<<8 | G<<4 | B`.
    Rgba16,
}

impl SourceFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::ColorIndex => 1,
            Self::Rgba16 => 2,
            Self::Rgba8 => 4,
        }
    }

    /// Channel depth seen by the packers, `None` for colour-indexed data.
    pub const fn depth(self) -> Option<SourceDepth> {
        match self {
            Self::ColorIndex => None,
            Self::Rgba8 => Some(SourceDepth::Bits8),
            Self::Rgba16 => Some(SourceDepth::Bits4),
        }
    }
}

/// Tightly packed (unpadded) source image.
#[derive(Copy, Clone, Debug)]
pub struct SourceImage<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    format: SourceFormat,
}

impl<'a> SourceImage<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        format: SourceFormat,
    ) -> Result<Self, BlitError> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() < expected {
            return Err(BlitError::SourceTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data: &data[..expected],
            width,
            height,
            format,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Source image whose rows may be padded (e.g. a software framebuffer).
#[derive(Copy, Clone, Debug)]
pub struct PitchedImage<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    pitch: usize,
    format: SourceFormat,
}

impl<'a> PitchedImage<'a> {
    pub fn new(
        data: &'a [u8],
        width: u32,
        height: u32,
        pitch: usize,
        format: SourceFormat,
    ) -> Result<Self, BlitError> {
        let row_bytes = width as usize * format.bytes_per_pixel();
        if pitch < row_bytes {
            return Err(BlitError::SourcePitchTooSmall { pitch, row_bytes });
        }
        let expected = required_len(pitch, row_bytes, height);
        if data.len() < expected {
            return Err(BlitError::SourceTooSmall {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            pitch,
            format,
        })
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }
}

/// Bytes needed for `height` rows of `row_bytes` spaced `pitch` apart. The last row carries no
/// trailing padding.
pub(crate) fn required_len(pitch: usize, row_bytes: usize, height: u32) -> usize {
    match height {
        0 => 0,
        h => pitch * (h as usize - 1) + row_bytes,
    }
}
