/// Runtime switches for the conversion layer.
///
/// These used to be compile-time options of the legacy driver; keeping them as plain values lets
/// tests and benches exercise both settings from the same build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlitConfig {
    /// Route every RGBA blit through the generic packer instead of the fixed-format kernels.
    ///
    /// Colour-indexed sources are unaffected; they are always copied verbatim.
    pub only_generic_blitters: bool,
    /// When set, square-only devices first halve the larger texture dimension until
    /// `larger / smaller <= cap` before the texture is made square. `None` squares the texture
    /// up to its larger dimension directly.
    pub square_aspect_cap: Option<u32>,
}

impl BlitConfig {
    /// Cap applied by [`BlitConfig::with_square_aspect_cap`] when no explicit value is wanted.
    pub const DEFAULT_SQUARE_ASPECT_CAP: u32 = 4;

    pub fn generic_only() -> Self {
        Self {
            only_generic_blitters: true,
            ..Self::default()
        }
    }

    pub fn with_square_aspect_cap(mut self, cap: u32) -> Self {
        self.square_aspect_cap = Some(cap.max(1));
        self
    }
}
