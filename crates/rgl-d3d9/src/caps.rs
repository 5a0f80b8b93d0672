//! Device texture capabilities and the constraints derived from them.

use bitflags::bitflags;
use tracing::info;

use crate::error::BlitError;

bitflags! {
    /// The `D3DPTEXTURECAPS_*` bits the conversion layer looks at.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct TextureCaps: u32 {
        const PERSPECTIVE = 0x0000_0001;
        const POW2 = 0x0000_0002;
        const ALPHA = 0x0000_0004;
        const SQUAREONLY = 0x0000_0020;
        const TEXREPEATNOTSCALEDBYSIZE = 0x0000_0040;
        const ALPHAPALETTE = 0x0000_0080;
        const NONPOW2CONDITIONAL = 0x0000_0100;
    }
}

/// Raw texture capabilities reported by the backend.
///
/// Zero in a size field means the device states no limit.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct DeviceCaps {
    pub texture_caps: TextureCaps,
    pub max_texture_aspect_ratio: u32,
    pub min_texture_width: u32,
    pub min_texture_height: u32,
    pub max_texture_width: u32,
    pub max_texture_height: u32,
}

/// Texture size limits, derived once per device and read-only afterwards.
///
/// Zero bounds are ignored by the dimension normalizer; a zero aspect ratio means unlimited.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TextureConstraints {
    pub max_aspect_ratio: u32,
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
    pub square_only: bool,
}

/// Rounds down to a power of two, never below 2; `0` stays `0`.
pub const fn floor_pow2(n: u32) -> u32 {
    match n {
        0 => 0,
        1..=3 => 2,
        n => 1 << (31 - n.leading_zeros()),
    }
}

/// Smallest power of two not below `n`; `0` stays `0`.
pub const fn ceil_pow2(n: u32) -> u32 {
    match n {
        0 => 0,
        n => match n.checked_next_power_of_two() {
            Some(p) => p,
            None => 1 << 31,
        },
    }
}

impl TextureConstraints {
    /// No limits at all.
    pub const UNCONSTRAINED: Self = Self {
        max_aspect_ratio: 0,
        min_width: 0,
        min_height: 0,
        max_width: 0,
        max_height: 0,
        square_only: false,
    };

    /// Derives the constraints from the device capabilities.
    ///
    /// Devices that only accept power-of-two textures are rejected: uploads keep the source
    /// dimensions whenever the other limits allow it. Conditional non-power-of-two support
    /// (`POW2` together with `NONPOW2CONDITIONAL`) is accepted.
    pub fn from_caps(caps: &DeviceCaps) -> Result<Self, BlitError> {
        let conditional = caps.texture_caps.contains(TextureCaps::NONPOW2CONDITIONAL);
        if caps.texture_caps.contains(TextureCaps::POW2) && !conditional {
            return Err(BlitError::PowerOfTwoRequired);
        }

        let constraints = Self {
            max_aspect_ratio: floor_pow2(caps.max_texture_aspect_ratio),
            min_width: ceil_pow2(caps.min_texture_width),
            min_height: ceil_pow2(caps.min_texture_height),
            max_width: floor_pow2(caps.max_texture_width),
            max_height: floor_pow2(caps.max_texture_height),
            square_only: caps.texture_caps.contains(TextureCaps::SQUAREONLY),
        };

        info!(
            texture_caps = ?caps.texture_caps,
            max_aspect_ratio = constraints.max_aspect_ratio,
            min_width = constraints.min_width,
            min_height = constraints.min_height,
            max_width = constraints.max_width,
            max_height = constraints.max_height,
            square_only = constraints.square_only,
            "derived texture constraints"
        );
        Ok(constraints)
    }

    /// True when the normalizer has to make every texture square.
    ///
    /// An aspect limit of exactly 1 is treated like the square-only bit.
    pub fn forces_square(&self) -> bool {
        self.square_only || self.max_aspect_ratio == 1
    }
}
