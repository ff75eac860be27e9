use alloc::string::String;

/// Red in RGB565, used until a colour has been saved.
pub const DEFAULT_MONO_COLOR: u16 = 0xF800;

/// Volume layout and I/O tuning for a [`crate::Storage`].
///
/// ```
/// use zenfloor::StoreConfig;
///
/// let config = StoreConfig::default()
///     .with_companion_dir("cache")
///     .with_copy_chunk_size(512);
/// assert_eq!(config.companion_dir, "cache");
/// ```
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Directory (relative to the volume root) holding companion files.
    pub companion_dir: String,
    /// Extension given to companion files, without the dot.
    pub companion_extension: String,
    /// File holding the 2-byte little-endian display colour.
    pub mono_color_file: String,
    pub default_mono_color: u16,
    /// Buffer size used by [`crate::Session::copy`].
    pub copy_chunk_size: usize,
    /// How many times an open is attempted when the volume reports a transient error.
    /// Values below 1 are treated as 1.
    pub open_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            companion_dir: "enc".into(),
            companion_extension: "cbm".into(),
            mono_color_file: "monocolor".into(),
            default_mono_color: DEFAULT_MONO_COLOR,
            copy_chunk_size: 64,
            open_attempts: 3,
        }
    }
}

impl StoreConfig {
    pub fn with_companion_dir(mut self, dir: impl Into<String>) -> Self {
        self.companion_dir = dir.into();
        self
    }

    pub fn with_companion_extension(mut self, ext: impl Into<String>) -> Self {
        self.companion_extension = ext.into();
        self
    }

    pub fn with_mono_color_file(mut self, name: impl Into<String>) -> Self {
        self.mono_color_file = name.into();
        self
    }

    pub fn with_default_mono_color(mut self, color: u16) -> Self {
        self.default_mono_color = color;
        self
    }

    pub fn with_copy_chunk_size(mut self, size: usize) -> Self {
        self.copy_chunk_size = size.max(1);
        self
    }

    pub fn with_open_attempts(mut self, attempts: u32) -> Self {
        self.open_attempts = attempts.max(1);
        self
    }
}
