//! `rgl-d3d9` is the pixel conversion layer of the rgl Direct3D 9 driver.
//!
//! The legacy renderer hands the driver GL-side texel data (RGBA8, packed 4-bit-per-channel
//! RGBA16 and colour-indexed) and expects it to land in whatever native surface format the
//! device negotiated. This crate provides:
//! - Native format tags and per-channel width/shift descriptors (see [`format`]).
//! - The generic bit-shifting packer that works for any descriptor (see [`pack`]).
//! - Fixed-format fast kernels and per-call kernel selection (see [`kernels`]).
//! - The pitch-aware row/region copy driver with clipping (see [`blit`]).
//! - Texture dimension normalization, nearest-neighbour rescaling and texture upload
//!   (see [`texture`]).
//!
//! The native API itself stays behind the [`GraphicsBackend`] and [`Surface`] traits.

mod config;
mod error;

pub mod backend;
pub mod blit;
pub mod caps;
pub mod format;
pub mod image;
pub mod kernels;
pub mod pack;
pub mod staging;
pub mod surface;
pub mod texture;

pub use backend::{GraphicsBackend, MemoryBackend};
pub use blit::{blit_image, blit_region, draw_pitched_pixels, upload_image, ClippedRect, Rect};
pub use caps::{DeviceCaps, TextureCaps, TextureConstraints};
pub use config::BlitConfig;
pub use error::{BlitError, FormatError, SurfaceError};
pub use format::{
    bits_per_pixel, Channel, D3DFormat, PixelFormatDescriptor, CONVERTIBLE_FORMATS,
};
pub use image::{PitchedImage, SourceFormat, SourceImage};
pub use kernels::Kernel;
pub use pack::{pack_pixel, GenericPacker, SourceDepth};
pub use staging::{draw_pixels_origin, stage_draw_pixels};
pub use surface::{MemorySurface, PixelBuffer, Surface, SurfaceLock};
pub use texture::{
    normalize_dimensions, rescale_nearest, GlTextureFormat, Texture, TextureUploader,
};
