//! Graphics backend capability interface.

use crate::caps::DeviceCaps;
use crate::error::SurfaceError;
use crate::format::D3DFormat;
use crate::surface::{MemorySurface, Surface};

/// Operations the conversion layer needs from the native device.
pub trait GraphicsBackend {
    type Surface: Surface;

    fn device_caps(&self) -> DeviceCaps;

    /// Creates a lockable texture surface of the given native format.
    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: D3DFormat,
    ) -> Result<Self::Surface, SurfaceError>;
}

/// Software backend whose textures live in system memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    caps: DeviceCaps,
    textures_created: usize,
    fail_next_create: Option<SurfaceError>,
}

impl MemoryBackend {
    pub fn new(caps: DeviceCaps) -> Self {
        Self {
            caps,
            ..Self::default()
        }
    }

    pub fn textures_created(&self) -> usize {
        self.textures_created
    }

    /// Makes the next `create_texture` call fail with `err`.
    pub fn fail_next_create(&mut self, err: SurfaceError) {
        self.fail_next_create = Some(err);
    }
}

impl GraphicsBackend for MemoryBackend {
    type Surface = MemorySurface;

    fn device_caps(&self) -> DeviceCaps {
        self.caps
    }

    fn create_texture(
        &mut self,
        width: u32,
        height: u32,
        format: D3DFormat,
    ) -> Result<MemorySurface, SurfaceError> {
        if let Some(err) = self.fail_next_create.take() {
            return Err(err);
        }
        let surface =
            MemorySurface::new(format, width, height).map_err(|_| SurfaceError::InvalidCall)?;
        self.textures_created += 1;
        Ok(surface)
    }
}
