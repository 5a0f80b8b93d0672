use thiserror::Error;

use crate::format::{Channel, D3DFormat};

/// Failure reported by the graphics backend for a surface operation.
///
/// The variants mirror the `D3DERR_*` families the legacy driver used to log; any other
/// `HRESULT` is carried verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("surface is still being drawn (D3DERR_WASSTILLDRAWING)")]
    WasStillDrawing,
    #[error("invalid call (D3DERR_INVALIDCALL)")]
    InvalidCall,
    #[error("device lost (D3DERR_DEVICELOST)")]
    DeviceLost,
    #[error("not available (D3DERR_NOTAVAILABLE)")]
    NotAvailable,
    #[error("out of video memory (D3DERR_OUTOFVIDEOMEMORY)")]
    OutOfVideoMemory,
    #[error("backend failure (HRESULT {0:#010x})")]
    Other(u32),
}

impl SurfaceError {
    pub const D3DERR_WASSTILLDRAWING: u32 = 0x8876_021C;
    pub const D3DERR_INVALIDCALL: u32 = 0x8876_086C;
    pub const D3DERR_DEVICELOST: u32 = 0x8876_0868;
    pub const D3DERR_NOTAVAILABLE: u32 = 0x8876_086A;
    pub const D3DERR_OUTOFVIDEOMEMORY: u32 = 0x8876_017C;

    pub fn from_hresult(hr: u32) -> Self {
        match hr {
            Self::D3DERR_WASSTILLDRAWING => Self::WasStillDrawing,
            Self::D3DERR_INVALIDCALL => Self::InvalidCall,
            Self::D3DERR_DEVICELOST => Self::DeviceLost,
            Self::D3DERR_NOTAVAILABLE => Self::NotAvailable,
            Self::D3DERR_OUTOFVIDEOMEMORY => Self::OutOfVideoMemory,
            other => Self::Other(other),
        }
    }
}

/// Errors produced by the conversion layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlitError {
    #[error("surface lock failed: {0}")]
    Lock(#[source] SurfaceError),
    #[error("surface description query failed: {0}")]
    Describe(#[source] SurfaceError),
    #[error("texture creation failed for {width}x{height} {format:?}: {source}")]
    CreateTexture {
        width: u32,
        height: u32,
        format: D3DFormat,
        #[source]
        source: SurfaceError,
    },
    #[error("generic packer cannot store {bytes_per_pixel}-byte pixels of {format:?}")]
    UnsupportedPixelSize {
        format: D3DFormat,
        bytes_per_pixel: usize,
    },
    #[error("{format:?} has no storage size and cannot back a pixel buffer")]
    UnsizedFormat { format: D3DFormat },
    #[error("source holds {actual} bytes but {expected} are required")]
    SourceTooSmall { expected: usize, actual: usize },
    #[error("source pitch {pitch} is smaller than its {row_bytes}-byte rows")]
    SourcePitchTooSmall { pitch: usize, row_bytes: usize },
    #[error("destination holds {actual} bytes but {expected} are required")]
    DestinationTooSmall { expected: usize, actual: usize },
    #[error("destination pitch {pitch} is smaller than its {row_bytes}-byte rows")]
    DestinationPitchTooSmall { pitch: usize, row_bytes: usize },
    #[error("{src_width}x{src_height} source does not fit the {dst_width}x{dst_height} destination")]
    DimensionsMismatch {
        src_width: u32,
        src_height: u32,
        dst_width: u32,
        dst_height: u32,
    },
    #[error("colour-index source cannot be stored in {format:?}; an 8-bit palette surface is required")]
    IndexedSourceNeedsPalette { format: D3DFormat },
    #[error("draw-pixels staging needs an RGBA8 source")]
    StagingNeedsRgba8,
    #[error("device only supports power-of-two textures")]
    PowerOfTwoRequired,
}

/// Errors from deriving a pixel format descriptor out of channel bit masks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("{bits} bits per pixel cannot be packed by the conversion layer")]
    BadPixelSize { bits: u32 },
    #[error("{channel:?} mask {mask:#010x} is not a contiguous run of bits")]
    NonContiguousMask { channel: Channel, mask: u32 },
    #[error("{channel:?} mask {mask:#010x} does not fit a {bits}-bit pixel")]
    MaskOverflow {
        channel: Channel,
        mask: u32,
        bits: u32,
    },
    #[error("{channel:?} mask {mask:#010x} overlaps another channel")]
    OverlappingMask { channel: Channel, mask: u32 },
}
