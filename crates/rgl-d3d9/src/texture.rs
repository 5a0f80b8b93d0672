//! Texture dimension normalization, nearest-neighbour rescaling and texture upload.

use tracing::{debug, error};

use crate::backend::GraphicsBackend;
use crate::blit::upload_image;
use crate::caps::TextureConstraints;
use crate::config::BlitConfig;
use crate::error::BlitError;
use crate::format::D3DFormat;
use crate::image::{SourceFormat, SourceImage};
use crate::surface::Surface;

/// Halves the larger side until `larger / smaller <= max_ratio` (integer ratio).
fn squeeze_aspect(mut width: u32, mut height: u32, max_ratio: u32) -> (u32, u32) {
    let max_ratio = max_ratio.max(1);
    while width / height > max_ratio {
        width /= 2;
    }
    while height / width > max_ratio {
        height /= 2;
    }
    (width, height)
}

/// Clamps into `[min, max]`, ignoring zero bounds.
fn clamp_nonzero(value: u32, min: u32, max: u32) -> u32 {
    let value = if min != 0 { value.max(min) } else { value };
    if max != 0 {
        value.min(max)
    } else {
        value
    }
}

/// Adjusts a texture's dimensions to what the device accepts.
///
/// Square-only devices (or an aspect limit of 1) get a square texture sized by the larger
/// side, optionally squeezed to `config.square_aspect_cap` first and clamped by the width
/// bounds. Otherwise the larger side is halved until the aspect limit holds, then each side is
/// clamped into its own bounds. Zero-sized inputs are returned unchanged.
pub fn normalize_dimensions(
    width: u32,
    height: u32,
    constraints: &TextureConstraints,
    config: &BlitConfig,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    if constraints.forces_square() {
        let (w, h) = match config.square_aspect_cap {
            Some(cap) => squeeze_aspect(width, height, cap),
            None => (width, height),
        };
        let side = clamp_nonzero(w.max(h), constraints.min_width, constraints.max_width);
        return (side, side);
    }

    let (w, h) = if constraints.max_aspect_ratio > 1 {
        squeeze_aspect(width, height, constraints.max_aspect_ratio)
    } else {
        (width, height)
    };
    (
        clamp_nonzero(w, constraints.min_width, constraints.max_width),
        clamp_nonzero(h, constraints.min_height, constraints.max_height),
    )
}

/// Maps destination index `dst` to a source index along one axis.
///
/// Enlarging repeats each source sample `dst_len / src_len` times, shrinking keeps every
/// `src_len / dst_len`-th sample. The result is clamped to the last source sample.
fn nearest_index(dst: u32, src_len: u32, dst_len: u32) -> usize {
    let src = if dst_len >= src_len {
        dst / (dst_len / src_len)
    } else {
        dst.saturating_mul(src_len / dst_len)
    };
    src.min(src_len - 1) as usize
}

/// Nearest-neighbour rescale of a tightly packed image into `scratch`.
///
/// `scratch` is resized to exactly `dst_width * dst_height * bytes_per_pixel` bytes; its
/// previous contents are discarded.
pub fn rescale_nearest(
    src: &[u8],
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
    bytes_per_pixel: usize,
    scratch: &mut Vec<u8>,
) {
    let dst_row_bytes = dst_width as usize * bytes_per_pixel;
    scratch.clear();
    scratch.resize(dst_row_bytes * dst_height as usize, 0);
    if src_width == 0 || src_height == 0 || dst_row_bytes == 0 {
        return;
    }

    let src_row_bytes = src_width as usize * bytes_per_pixel;
    for (dy, dst_row) in scratch.chunks_exact_mut(dst_row_bytes).enumerate() {
        let sy = nearest_index(dy as u32, src_height, dst_height);
        let src_row = &src[sy * src_row_bytes..(sy + 1) * src_row_bytes];
        if src_width == dst_width {
            dst_row.copy_from_slice(src_row);
            continue;
        }
        for (dx, texel) in dst_row.chunks_exact_mut(bytes_per_pixel).enumerate() {
            let sx = nearest_index(dx as u32, src_width, dst_width) * bytes_per_pixel;
            texel.copy_from_slice(&src_row[sx..sx + bytes_per_pixel]);
        }
    }
}

/// Texel formats the legacy renderer creates textures from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum GlTextureFormat {
    ColorIndex,
    Rgba16,
    Rgba,
    /// RGB texture supplied as RGBA8 texels whose alpha is ignored.
    Rgb,
}

impl GlTextureFormat {
    pub fn native_format(self) -> D3DFormat {
        match self {
            Self::ColorIndex => D3DFormat::P8,
            Self::Rgba16 => D3DFormat::A4R4G4B4,
            Self::Rgba => D3DFormat::A8R8G8B8,
            Self::Rgb => D3DFormat::X8R8G8B8,
        }
    }

    pub fn source_format(self) -> SourceFormat {
        match self {
            Self::ColorIndex => SourceFormat::ColorIndex,
            Self::Rgba16 => SourceFormat::Rgba16,
            Self::Rgba | Self::Rgb => SourceFormat::Rgba8,
        }
    }
}

/// Driver-side state of one uploaded texture.
#[derive(Debug)]
pub struct Texture<S> {
    surface: S,
    format: D3DFormat,
    gl_format: GlTextureFormat,
    source_size: (u32, u32),
    adjusted: Option<(u32, u32)>,
}

impl<S> Texture<S> {
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    pub fn format(&self) -> D3DFormat {
        self.format
    }

    pub fn gl_format(&self) -> GlTextureFormat {
        self.gl_format
    }

    pub fn is_paletted(&self) -> bool {
        self.format.is_paletted()
    }

    pub fn source_size(&self) -> (u32, u32) {
        self.source_size
    }

    /// Size the device forced on the texture, if it differs from the source size.
    pub fn adjusted_size(&self) -> Option<(u32, u32)> {
        self.adjusted
    }

    /// Size of the backing surface.
    pub fn size(&self) -> (u32, u32) {
        self.adjusted.unwrap_or(self.source_size)
    }
}

/// Creates and fills textures under the device's dimension constraints.
///
/// Holds the scratch buffer used for rescaling so repeated uploads reuse one allocation.
#[derive(Debug, Clone)]
pub struct TextureUploader {
    constraints: TextureConstraints,
    config: BlitConfig,
    scratch: Vec<u8>,
}

impl TextureUploader {
    pub fn new(constraints: TextureConstraints, config: BlitConfig) -> Self {
        Self {
            constraints,
            config,
            scratch: Vec::new(),
        }
    }

    /// Derives the constraints from `backend`'s capabilities.
    pub fn from_backend<B: GraphicsBackend + ?Sized>(
        backend: &B,
        config: BlitConfig,
    ) -> Result<Self, BlitError> {
        let constraints = TextureConstraints::from_caps(&backend.device_caps())?;
        Ok(Self::new(constraints, config))
    }

    pub fn constraints(&self) -> &TextureConstraints {
        &self.constraints
    }

    pub fn config(&self) -> &BlitConfig {
        &self.config
    }

    /// Creates a texture for `pixels` and uploads them, rescaling when the device forces a
    /// different size.
    pub fn create_texture<B: GraphicsBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        gl_format: GlTextureFormat,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Texture<B::Surface>, BlitError> {
        let source = SourceImage::new(pixels, width, height, gl_format.source_format())?;
        let size = normalize_dimensions(width, height, &self.constraints, &self.config);
        let adjusted = (size != (width, height)).then_some(size);
        if adjusted.is_some() {
            debug!(
                width,
                height,
                new_width = size.0,
                new_height = size.1,
                "renormalized texture dimensions"
            );
        }

        let format = gl_format.native_format();
        let surface = backend
            .create_texture(size.0, size.1, format)
            .map_err(|source| {
                error!(
                    %source,
                    width = size.0,
                    height = size.1,
                    ?format,
                    "texture creation failed"
                );
                BlitError::CreateTexture {
                    width: size.0,
                    height: size.1,
                    format,
                    source,
                }
            })?;

        let mut texture = Texture {
            surface,
            format,
            gl_format,
            source_size: (width, height),
            adjusted,
        };
        self.upload(&mut texture, &source)?;
        Ok(texture)
    }

    /// Re-uploads new contents at the texture's source size.
    pub fn reload<S: Surface>(
        &mut self,
        texture: &mut Texture<S>,
        pixels: &[u8],
    ) -> Result<(), BlitError> {
        let (width, height) = texture.source_size;
        let source = SourceImage::new(pixels, width, height, texture.gl_format.source_format())?;
        self.upload(texture, &source)
    }

    fn upload<S: Surface>(
        &mut self,
        texture: &mut Texture<S>,
        source: &SourceImage<'_>,
    ) -> Result<(), BlitError> {
        let (width, height) = texture.size();
        if (width, height) == (source.width(), source.height()) {
            return upload_image(&mut texture.surface, source, &self.config);
        }

        rescale_nearest(
            source.data(),
            source.width(),
            source.height(),
            width,
            height,
            source.format().bytes_per_pixel(),
            &mut self.scratch,
        );
        let scaled = SourceImage::new(&self.scratch, width, height, source.format())?;
        upload_image(&mut texture.surface, &scaled, &self.config)
    }
}
