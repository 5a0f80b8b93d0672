//! Lockable destination surfaces.

use tracing::error;

use crate::error::{BlitError, SurfaceError};
use crate::format::D3DFormat;
use crate::image::required_len;

/// A native surface the conversion layer can write into.
///
/// Access follows the native lock protocol: `lock` maps the pixels and reports the row pitch,
/// `locked_bits` exposes them until `unlock`. Callers go through [`SurfaceLock`], which pairs
/// every successful `lock` with exactly one `unlock`.
pub trait Surface {
    /// Native format of the surface (the `GetDesc` query).
    fn format(&self) -> Result<D3DFormat, SurfaceError>;

    /// Width and height in pixels.
    fn size(&self) -> (u32, u32);

    /// Maps the surface for CPU writes and returns the row pitch in bytes.
    fn lock(&mut self) -> Result<usize, SurfaceError>;

    /// The mapped pixels. Only meaningful between `lock` and `unlock`.
    fn locked_bits(&mut self) -> &mut [u8];

    fn unlock(&mut self);
}

/// Scoped surface lock; unlocks on drop, including on early return and unwinding.
pub struct SurfaceLock<'a, S: Surface + ?Sized> {
    surface: &'a mut S,
    format: D3DFormat,
    pitch: usize,
}

impl<'a, S: Surface + ?Sized> SurfaceLock<'a, S> {
    /// Queries the surface format, then locks it.
    ///
    /// The format is read before locking so a failed query never leaves the surface locked.
    pub fn acquire(surface: &'a mut S) -> Result<Self, BlitError> {
        let format = surface.format().map_err(|err| {
            error!(%err, "surface format query failed");
            BlitError::Describe(err)
        })?;
        let pitch = surface.lock().map_err(|err| {
            error!(%err, ?format, "surface lock failed");
            BlitError::Lock(err)
        })?;
        Ok(Self {
            surface,
            format,
            pitch,
        })
    }

    pub fn format(&self) -> D3DFormat {
        self.format
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn size(&self) -> (u32, u32) {
        self.surface.size()
    }

    /// Borrows the locked pixels as a validated [`PixelBuffer`].
    pub fn buffer(&mut self) -> Result<PixelBuffer<'_>, BlitError> {
        let (width, height) = self.surface.size();
        PixelBuffer::new(
            self.surface.locked_bits(),
            width,
            height,
            self.pitch,
            self.format,
        )
    }
}

impl<S: Surface + ?Sized> Drop for SurfaceLock<'_, S> {
    fn drop(&mut self) {
        self.surface.unlock();
    }
}

/// Writable pixel rows of a destination.
#[derive(Debug)]
pub struct PixelBuffer<'a> {
    bits: &'a mut [u8],
    pitch: usize,
    width: u32,
    height: u32,
    format: D3DFormat,
    bytes_per_pixel: usize,
}

impl<'a> PixelBuffer<'a> {
    pub fn new(
        bits: &'a mut [u8],
        width: u32,
        height: u32,
        pitch: usize,
        format: D3DFormat,
    ) -> Result<Self, BlitError> {
        let bytes_per_pixel = format
            .storage_bytes()
            .ok_or(BlitError::UnsizedFormat { format })?;
        let row_bytes = width as usize * bytes_per_pixel;
        if pitch < row_bytes {
            return Err(BlitError::DestinationPitchTooSmall { pitch, row_bytes });
        }
        let expected = required_len(pitch, row_bytes, height);
        if bits.len() < expected {
            return Err(BlitError::DestinationTooSmall {
                expected,
                actual: bits.len(),
            });
        }
        Ok(Self {
            bits,
            pitch,
            width,
            height,
            format,
            bytes_per_pixel,
        })
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

    pub fn format(&self) -> D3DFormat {
        self.format
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel
    }

    pub fn row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel
    }

    pub fn bits_mut(&mut self) -> &mut [u8] {
        self.bits
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.pitch;
        let len = self.row_bytes();
        &mut self.bits[start..start + len]
    }
}

/// Surface backed by system memory.
///
/// Used for draw-pixels staging and as the backing store of software backends. It can also
/// be told to fail its next lock or its format query, which exercises the error paths of
/// the blit driver.
#[derive(Debug, Clone)]
pub struct MemorySurface {
    format: D3DFormat,
    width: u32,
    height: u32,
    pitch: usize,
    bits: Vec<u8>,
    locked: bool,
    lock_count: usize,
    unlock_count: usize,
    fail_next_lock: Option<SurfaceError>,
    fail_format_query: Option<SurfaceError>,
}

impl MemorySurface {
    /// Zero-filled surface with unpadded rows.
    pub fn new(format: D3DFormat, width: u32, height: u32) -> Result<Self, BlitError> {
        let bytes_per_pixel = format
            .storage_bytes()
            .ok_or(BlitError::UnsizedFormat { format })?;
        Self::with_pitch(format, width, height, width as usize * bytes_per_pixel)
    }

    /// Zero-filled surface whose rows are `pitch` bytes apart.
    pub fn with_pitch(
        format: D3DFormat,
        width: u32,
        height: u32,
        pitch: usize,
    ) -> Result<Self, BlitError> {
        let bytes_per_pixel = format
            .storage_bytes()
            .ok_or(BlitError::UnsizedFormat { format })?;
        let row_bytes = width as usize * bytes_per_pixel;
        if pitch < row_bytes {
            return Err(BlitError::DestinationPitchTooSmall { pitch, row_bytes });
        }
        Ok(Self {
            format,
            width,
            height,
            pitch,
            bits: vec![0; pitch * height as usize],
            locked: false,
            lock_count: 0,
            unlock_count: 0,
            fail_next_lock: None,
            fail_format_query: None,
        })
    }

    pub fn pitch(&self) -> usize {
        self.pitch
    }

    pub fn bits(&self) -> &[u8] {
        &self.bits
    }

    /// Pixel bytes of row `y`, without padding.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.pitch;
        let len = self.width as usize * self.bytes_per_pixel();
        &self.bits[start..start + len]
    }

    pub fn read_u16(&self, x: u32, y: u32) -> u16 {
        let offset = y as usize * self.pitch + x as usize * 2;
        u16::from_le_bytes([self.bits[offset], self.bits[offset + 1]])
    }

    pub fn read_u32(&self, x: u32, y: u32) -> u32 {
        let offset = y as usize * self.pitch + x as usize * 4;
        let mut word = [0u8; 4];
        word.copy_from_slice(&self.bits[offset..offset + 4]);
        u32::from_le_bytes(word)
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn lock_count(&self) -> usize {
        self.lock_count
    }

    pub fn unlock_count(&self) -> usize {
        self.unlock_count
    }

    /// Makes the next `lock` call fail with `err`.
    pub fn fail_next_lock(&mut self, err: SurfaceError) {
        self.fail_next_lock = Some(err);
    }

    /// Makes every `format` query fail with `err` until cleared with `None`.
    pub fn fail_format_query(&mut self, err: Option<SurfaceError>) {
        self.fail_format_query = err;
    }

    fn bytes_per_pixel(&self) -> usize {
        self.format.storage_bytes().unwrap_or(1)
    }
}

impl Surface for MemorySurface {
    fn format(&self) -> Result<D3DFormat, SurfaceError> {
        match self.fail_format_query {
            Some(err) => Err(err),
            None => Ok(self.format),
        }
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn lock(&mut self) -> Result<usize, SurfaceError> {
        if let Some(err) = self.fail_next_lock.take() {
            return Err(err);
        }
        if self.locked {
            return Err(SurfaceError::WasStillDrawing);
        }
        self.locked = true;
        self.lock_count += 1;
        Ok(self.pitch)
    }

    fn locked_bits(&mut self) -> &mut [u8] {
        &mut self.bits
    }

    fn unlock(&mut self) {
        if self.locked {
            self.locked = false;
            self.unlock_count += 1;
        }
    }
}
