use alloc::string::String;
use enough::StopReason;

use crate::volume::VolumeError;

/// Errors from bitmap lookup, companion encoding, session I/O and the mapping store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to open {path}")]
    OpenFailed { path: String },

    #[error("no file is open")]
    NoOpenHandle,

    #[error("missing BM magic bytes")]
    UnrecognizedFormat,

    #[error("unknown DIB header size: {dib_size}")]
    UnknownHeader { dib_size: u16 },

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("unsupported bitmap: {bits_per_pixel} bits per pixel, compression {compression}")]
    UnsupportedFormat { bits_per_pixel: u16, compression: u32 },

    #[error("invalid pixel data: {0}")]
    InvalidData(String),

    #[error("dimensions too large: {width}x{height}")]
    DimensionsTooLarge { width: u32, height: u32 },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("unexpected end of input")]
    UnexpectedEof,

    #[error("buffer too small: need {needed} bytes, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    #[error("no matching pixel in [{from}, {width})")]
    RunNotFound { from: u32, width: u32 },

    #[error("destination already exists: {0}")]
    DestinationExists(String),

    #[error("directory entry not found: {0}")]
    EntryNotFound(String),

    #[error("floor not found: {0}")]
    FloorNotFound(String),

    #[error("invalid {field}: {value:?}")]
    InvalidName { field: &'static str, value: String },

    #[error("invalid mapping record on line {line}: {reason}")]
    InvalidRecord { line: usize, reason: &'static str },

    #[error("storage error: {0}")]
    Volume(#[from] VolumeError),

    #[error("operation cancelled")]
    Cancelled(StopReason),
}

impl From<StopReason> for StoreError {
    fn from(r: StopReason) -> Self {
        StoreError::Cancelled(r)
    }
}
