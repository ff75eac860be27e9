//! Companion file format.
//!
//! A companion is a flat sequence of 8-byte records, one per run of set
//! pixels: `row_lo, row_hi, start_lo, start_hi, end_lo, end_hi, 0xFF, 0xFF`.
//! A run covers pixels `start..end` of stored row `row`. The trailing pad
//! keeps records 32-bit aligned for the display's DMA.

use alloc::vec;
use alloc::vec::Vec;

use crate::error::StoreError;

/// Size of one encoded record.
pub const RECORD_LEN: usize = 8;

/// One run of set pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RunRecord {
    pub row: u16,
    pub start: u16,
    pub end: u16,
}

impl RunRecord {
    pub fn to_bytes(self) -> [u8; RECORD_LEN] {
        let [r0, r1] = self.row.to_le_bytes();
        let [s0, s1] = self.start.to_le_bytes();
        let [e0, e1] = self.end.to_le_bytes();
        [r0, r1, s0, s1, e0, e1, 0xFF, 0xFF]
    }

    pub fn from_bytes(b: [u8; RECORD_LEN]) -> Self {
        Self {
            row: u16::from_le_bytes([b[0], b[1]]),
            start: u16::from_le_bytes([b[2], b[3]]),
            end: u16::from_le_bytes([b[4], b[5]]),
        }
    }

    /// Decode a whole companion file.
    pub fn parse_all(data: &[u8]) -> Result<Vec<RunRecord>, StoreError> {
        let chunks = data.chunks_exact(RECORD_LEN);
        if !chunks.remainder().is_empty() {
            return Err(StoreError::UnexpectedEof);
        }
        Ok(chunks
            .map(|c| {
                let mut b = [0u8; RECORD_LEN];
                b.copy_from_slice(c);
                Self::from_bytes(b)
            })
            .collect())
    }

    /// Number of pixels covered.
    pub fn len(&self) -> u16 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rebuild a one-byte-per-pixel mask (1 = set) in stored row order.
pub fn expand_runs(records: &[RunRecord], width: u32, height: u32) -> Result<Vec<u8>, StoreError> {
    let w = width as usize;
    let size = w
        .checked_mul(height as usize)
        .ok_or(StoreError::DimensionsTooLarge { width, height })?;
    let mut mask = vec![0u8; size];
    for rec in records {
        if u32::from(rec.row) >= height || rec.start > rec.end || u32::from(rec.end) > width {
            return Err(StoreError::InvalidData(alloc::format!(
                "run {}..{} on row {} outside {width}x{height}",
                rec.start,
                rec.end,
                rec.row
            )));
        }
        let base = usize::from(rec.row) * w;
        mask[base + usize::from(rec.start)..base + usize::from(rec.end)].fill(1);
    }
    Ok(mask)
}

/// [`expand_runs`] as an [`imgref::ImgVec`].
#[cfg(feature = "imgref")]
pub fn expand_runs_imgvec(
    records: &[RunRecord],
    width: u32,
    height: u32,
) -> Result<imgref::ImgVec<u8>, StoreError> {
    let mask = expand_runs(records, width, height)?;
    Ok(imgref::ImgVec::new(mask, width as usize, height as usize))
}
