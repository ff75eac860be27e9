use alloc::format;

use crate::bmp::BmpHeader;
use crate::error::StoreError;

/// Caps on source bitmaps a [`crate::Storage`] will encode.
///
/// Every field defaults to `None`, meaning unlimited. Limits are checked
/// after the header is parsed and before any companion byte is written.
#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub max_width: Option<u32>,
    pub max_height: Option<u32>,
    /// Width times height.
    pub max_pixels: Option<u64>,
    /// Size of the row buffer held while encoding.
    pub max_memory_bytes: Option<u64>,
}

fn over(what: &str, value: u64, limit: Option<u64>) -> Result<(), StoreError> {
    match limit {
        Some(max) if value > max => Err(StoreError::LimitExceeded(format!(
            "{what} {value} exceeds limit {max}"
        ))),
        _ => Ok(()),
    }
}

impl Limits {
    pub(crate) fn check(&self, width: u32, height: u32) -> Result<(), StoreError> {
        over("width", width.into(), self.max_width.map(u64::from))?;
        over("height", height.into(), self.max_height.map(u64::from))?;
        over(
            "pixel count",
            u64::from(width) * u64::from(height),
            self.max_pixels,
        )
    }

    pub(crate) fn check_memory(&self, bytes: usize) -> Result<(), StoreError> {
        over("row buffer of", bytes as u64, self.max_memory_bytes)
    }

    /// Both checks for a parsed header.
    pub(crate) fn check_header(&self, header: &BmpHeader) -> Result<(), StoreError> {
        self.check(header.width, header.height)?;
        self.check_memory(header.width as usize / 8 + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_unlimited() {
        let limits = Limits::default();
        assert!(limits.check(u32::MAX, u32::MAX).is_ok());
        assert!(limits.check_memory(usize::MAX).is_ok());
    }

    #[test]
    fn pixel_limit_rejects() {
        let limits = Limits {
            max_pixels: Some(100),
            ..Default::default()
        };
        assert!(limits.check(10, 10).is_ok());
        match limits.check(11, 10) {
            Err(StoreError::LimitExceeded(msg)) => assert!(msg.contains("110")),
            other => panic!("expected LimitExceeded, got {other:?}"),
        }
    }

    #[test]
    fn width_limit_applies_to_row_buffer_too() {
        let limits = Limits {
            max_width: Some(64),
            max_memory_bytes: Some(4),
            ..Default::default()
        };
        assert!(limits.check(64, 1000).is_ok());
        assert!(limits.check(65, 1).is_err());
        assert!(limits.check_memory(4).is_ok());
        assert!(limits.check_memory(9).is_err());
    }
}
