//! Native surface format tags and their per-channel layout.
//!
//! Every packed format is described as four `(width, shift)` pairs in R, G, B, A order, where
//! the shift is the bit offset of the channel inside the little-endian pixel word. A width of
//! zero means the channel is absent (its shift is then irrelevant and kept at zero).

use crate::error::FormatError;

/// Direct3D 9 surface format tags (`D3DFORMAT`). Discriminants match the native API.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum D3DFormat {
    Unknown = 0,

    R8G8B8 = 20,
    A8R8G8B8 = 21,
    X8R8G8B8 = 22,
    R5G6B5 = 23,
    X1R5G5B5 = 24,
    A1R5G5B5 = 25,
    A4R4G4B4 = 26,
    R3G3B2 = 27,
    A8 = 28,
    A8R3G3B2 = 29,
    X4R4G4B4 = 30,
    A2B10G10R10 = 31,
    A8B8G8R8 = 32,
    X8B8G8R8 = 33,
    G16R16 = 34,
    A2R10G10B10 = 35,
    A16B16G16R16 = 36,

    A8P8 = 40,
    P8 = 41,

    L8 = 50,
    A8L8 = 51,
    A4L4 = 52,
}

impl D3DFormat {
    pub fn from_u32(value: u32) -> Self {
        match value {
            20 => Self::R8G8B8,
            21 => Self::A8R8G8B8,
            22 => Self::X8R8G8B8,
            23 => Self::R5G6B5,
            24 => Self::X1R5G5B5,
            25 => Self::A1R5G5B5,
            26 => Self::A4R4G4B4,
            27 => Self::R3G3B2,
            28 => Self::A8,
            29 => Self::A8R3G3B2,
            30 => Self::X4R4G4B4,
            31 => Self::A2B10G10R10,
            32 => Self::A8B8G8R8,
            33 => Self::X8B8G8R8,
            34 => Self::G16R16,
            35 => Self::A2R10G10B10,
            36 => Self::A16B16G16R16,
            40 => Self::A8P8,
            41 => Self::P8,
            50 => Self::L8,
            51 => Self::A8L8,
            52 => Self::A4L4,
            _ => Self::Unknown,
        }
    }

    /// Bytes occupied by one pixel in a locked surface of this format.
    ///
    /// Unlike [`bits_per_pixel`], this covers every tag a surface can be created with (including
    /// palette and luminance formats), not just the ones the packers can target.
    pub fn storage_bytes(self) -> Option<usize> {
        match self {
            Self::R3G3B2 | Self::A8 | Self::P8 | Self::L8 | Self::A4L4 => Some(1),
            Self::R5G6B5
            | Self::X1R5G5B5
            | Self::A1R5G5B5
            | Self::A4R4G4B4
            | Self::A8R3G3B2
            | Self::X4R4G4B4
            | Self::A8P8
            | Self::A8L8 => Some(2),
            Self::R8G8B8 => Some(3),
            Self::A8R8G8B8
            | Self::X8R8G8B8
            | Self::A2B10G10R10
            | Self::A8B8G8R8
            | Self::X8B8G8R8
            | Self::G16R16
            | Self::A2R10G10B10 => Some(4),
            Self::A16B16G16R16 => Some(8),
            Self::Unknown => None,
        }
    }

    pub fn is_paletted(self) -> bool {
        matches!(self, Self::P8 | Self::A8P8)
    }
}

/// One colour channel. The discriminant is the channel's index in `[R, G, B, A]` arrays.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
    Alpha = 3,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];
}

/// Every format the resolver has a channel layout for.
pub const CONVERTIBLE_FORMATS: [D3DFormat; 13] = [
    D3DFormat::R8G8B8,
    D3DFormat::A8R8G8B8,
    D3DFormat::X8R8G8B8,
    D3DFormat::A8B8G8R8,
    D3DFormat::X8B8G8R8,
    D3DFormat::R5G6B5,
    D3DFormat::X1R5G5B5,
    D3DFormat::A1R5G5B5,
    D3DFormat::A4R4G4B4,
    D3DFormat::X4R4G4B4,
    D3DFormat::A8R3G3B2,
    D3DFormat::A2B10G10R10,
    D3DFormat::A2R10G10B10,
];

type ChannelLayout = ([u32; 4], [u32; 4]);

fn channel_layout(format: D3DFormat) -> Option<ChannelLayout> {
    // ([R, G, B, A] widths, [R, G, B, A] shifts)
    let layout = match format {
        D3DFormat::R8G8B8 => ([8, 8, 8, 0], [16, 8, 0, 0]),
        D3DFormat::A8R8G8B8 => ([8, 8, 8, 8], [16, 8, 0, 24]),
        D3DFormat::X8R8G8B8 => ([8, 8, 8, 0], [16, 8, 0, 0]),
        D3DFormat::A8B8G8R8 => ([8, 8, 8, 8], [0, 8, 16, 24]),
        D3DFormat::X8B8G8R8 => ([8, 8, 8, 0], [0, 8, 16, 0]),
        D3DFormat::R5G6B5 => ([5, 6, 5, 0], [11, 5, 0, 0]),
        D3DFormat::X1R5G5B5 => ([5, 5, 5, 0], [10, 5, 0, 0]),
        D3DFormat::A1R5G5B5 => ([5, 5, 5, 1], [10, 5, 0, 15]),
        D3DFormat::A4R4G4B4 => ([4, 4, 4, 4], [8, 4, 0, 12]),
        D3DFormat::X4R4G4B4 => ([4, 4, 4, 0], [8, 4, 0, 0]),
        D3DFormat::A8R3G3B2 => ([3, 3, 2, 8], [5, 2, 0, 8]),
        D3DFormat::A2B10G10R10 => ([10, 10, 10, 2], [0, 10, 20, 30]),
        D3DFormat::A2R10G10B10 => ([10, 10, 10, 2], [20, 10, 0, 30]),
        _ => return None,
    };
    Some(layout)
}

/// Bits per pixel of a packer-addressable format, or `None` for tags outside the table.
pub fn try_bits_per_pixel(format: D3DFormat) -> Option<u32> {
    match format {
        D3DFormat::R8G8B8 => Some(24),
        D3DFormat::A8R8G8B8
        | D3DFormat::X8R8G8B8
        | D3DFormat::A8B8G8R8
        | D3DFormat::X8B8G8R8
        | D3DFormat::A2B10G10R10
        | D3DFormat::A2R10G10B10 => Some(32),
        D3DFormat::R5G6B5
        | D3DFormat::X1R5G5B5
        | D3DFormat::A1R5G5B5
        | D3DFormat::A4R4G4B4
        | D3DFormat::X4R4G4B4
        | D3DFormat::A8R3G3B2 => Some(16),
        _ => None,
    }
}

/// Bits per pixel (16, 24 or 32) of a packer-addressable format.
///
/// # Panics
///
/// Panics if `format` is not in the conversion table. Asking for an unmapped tag means the
/// caller is targeting a surface this layer was never built for.
pub fn bits_per_pixel(format: D3DFormat) -> u32 {
    match try_bits_per_pixel(format) {
        Some(bits) => bits,
        None => panic!("bits_per_pixel: {format:?} is not a packer-addressable format"),
    }
}

/// Destination pixel encoding: storage size plus width and bit offset of each channel.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PixelFormatDescriptor {
    pub format: D3DFormat,
    pub bytes_per_pixel: usize,
    /// `[R, G, B, A]` widths in bits; zero means the channel is absent.
    pub channel_bits: [u32; 4],
    /// `[R, G, B, A]` bit offsets inside the little-endian pixel word.
    pub channel_shift: [u32; 4],
}

impl PixelFormatDescriptor {
    pub fn try_resolve(format: D3DFormat) -> Option<Self> {
        let (channel_bits, channel_shift) = channel_layout(format)?;
        let bits = try_bits_per_pixel(format)?;
        Some(Self {
            format,
            bytes_per_pixel: (bits / 8) as usize,
            channel_bits,
            channel_shift,
        })
    }

    /// Resolves the channel layout of `format`.
    ///
    /// # Panics
    ///
    /// Panics if `format` is not in the conversion table. A best-effort guess would silently
    /// corrupt the rendered output, so there is no fallback layout.
    pub fn resolve(format: D3DFormat) -> Self {
        match Self::try_resolve(format) {
            Some(desc) => desc,
            None => panic!("resolve: {format:?} is not supported by the conversion layer"),
        }
    }

    /// Derives a descriptor from per-channel bit masks (`[R, G, B, A]`, zero for absent).
    ///
    /// Widths are the mask population counts and shifts the position of the lowest set bit.
    pub fn from_masks(
        format: D3DFormat,
        bits_per_pixel: u32,
        masks: [u32; 4],
    ) -> Result<Self, FormatError> {
        if !matches!(bits_per_pixel, 16 | 24 | 32) {
            return Err(FormatError::BadPixelSize {
                bits: bits_per_pixel,
            });
        }

        let mut channel_bits = [0u32; 4];
        let mut channel_shift = [0u32; 4];
        let mut seen = 0u32;
        for channel in Channel::ALL {
            let mask = masks[channel as usize];
            if mask == 0 {
                continue;
            }
            let shift = mask.trailing_zeros();
            let width = mask.count_ones();
            if (mask >> shift).trailing_ones() != width {
                return Err(FormatError::NonContiguousMask { channel, mask });
            }
            if shift + width > bits_per_pixel {
                return Err(FormatError::MaskOverflow {
                    channel,
                    mask,
                    bits: bits_per_pixel,
                });
            }
            if seen & mask != 0 {
                return Err(FormatError::OverlappingMask { channel, mask });
            }
            seen |= mask;
            channel_bits[channel as usize] = width;
            channel_shift[channel as usize] = shift;
        }

        Ok(Self {
            format,
            bytes_per_pixel: (bits_per_pixel / 8) as usize,
            channel_bits,
            channel_shift,
        })
    }

    pub fn has_alpha(&self) -> bool {
        self.channel_bits[Channel::Alpha as usize] != 0
    }

    /// Mask selecting `channel` inside the pixel word (zero for an absent channel).
    pub fn channel_mask(&self, channel: Channel) -> u32 {
        let bits = self.channel_bits[channel as usize];
        if bits == 0 {
            return 0;
        }
        let ones = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
        ones << self.channel_shift[channel as usize]
    }

    /// Splits a packed pixel word back into `[R, G, B, A]` samples at this format's precision.
    pub fn unpack(&self, word: u32) -> [u32; 4] {
        Channel::ALL.map(|channel| {
            (word & self.channel_mask(channel)) >> self.channel_shift[channel as usize]
        })
    }
}
