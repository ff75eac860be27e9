//! Scanline run engine.
//!
//! Rows of a 1-bit BMP are read straight from the session handle, split into
//! runs of set pixels and written out as [`RunRecord`]s. Every search is
//! bounded by the row width: a row with no further set pixel reports
//! [`StoreError::RunNotFound`] instead of reading past the row.

use alloc::vec::Vec;

use enough::Stop;

use crate::bits::pixel_at;
use crate::bmp::BmpHeader;
use crate::compressed::{RECORD_LEN, RunRecord};
use crate::error::StoreError;
use crate::session::Session;
use crate::volume::{self, Volume, VolumeFile};

/// Pixels `start..end` of a row are set; `end` is clear or the row width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    pub start: u32,
    pub end: u32,
}

/// Totals of one companion encode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeStats {
    pub rows: u32,
    pub runs: u64,
    pub bytes: u64,
}

/// Smallest index in `from..width` whose pixel equals `state`.
pub fn find_pixel(row: &[u8], state: bool, from: u32, width: u32) -> Result<u32, StoreError> {
    (from..width)
        .find(|&i| pixel_at(row, i) == state)
        .ok_or(StoreError::RunNotFound { from, width })
}

/// Next run of set pixels starting at or after `from`.
pub fn find_run(row: &[u8], from: u32, width: u32) -> Result<Run, StoreError> {
    let start = find_pixel(row, true, from, width)?;
    let end = find_pixel(row, false, start + 1, width).unwrap_or(width);
    Ok(Run { start, end })
}

/// Load stored row `row` of the open bitmap into `buf`.
///
/// `buf` is replaced by a `width / 8 + 1` byte buffer whose leading
/// `ceil(width / 8)` bytes hold the row.
pub fn read_mono_row<V: Volume>(
    session: &mut Session<V>,
    header: &BmpHeader,
    row: u32,
    buf: &mut Vec<u8>,
) -> Result<(), StoreError> {
    if row >= header.height {
        return Err(StoreError::InvalidData(alloc::format!(
            "row {row} outside height {}",
            header.height
        )));
    }
    buf.clear();
    buf.resize(header.width as usize / 8 + 1, 0);
    let n = header.mono_row_bytes();
    session.seek(header.row_offset(row))?;
    if session.read_into(&mut buf[..n])? < n {
        return Err(StoreError::UnexpectedEof);
    }
    Ok(())
}

/// Load `row` and find the next run at or after `from`.
pub fn find_scanline<V: Volume>(
    session: &mut Session<V>,
    header: &BmpHeader,
    row: u32,
    from: u32,
    buf: &mut Vec<u8>,
) -> Result<Run, StoreError> {
    read_mono_row(session, header, row, buf)?;
    find_run(buf, from, header.width)
}

/// Encode every row of the bitmap open in `session` into `out`.
pub(crate) fn encode_bitmap<V: Volume>(
    session: &mut Session<V>,
    header: &BmpHeader,
    out: &mut V::File,
    buf: &mut Vec<u8>,
    stop: &dyn Stop,
) -> Result<EncodeStats, StoreError> {
    let (width, height) = (header.width, header.height);
    if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) + 1 {
        return Err(StoreError::DimensionsTooLarge { width, height });
    }
    header.ensure_mono()?;

    let mut stats = EncodeStats::default();
    let mut records = Vec::new();
    for row in 0..height {
        if row % 16 == 0 {
            stop.check()?;
        }
        read_mono_row(session, header, row, buf)?;

        records.clear();
        let mut cursor = 0;
        while cursor < width {
            let run = match find_run(buf, cursor, width) {
                Ok(run) => run,
                Err(StoreError::RunNotFound { .. }) => break,
                Err(e) => return Err(e),
            };
            if run.start < run.end && run.end <= width {
                let rec = RunRecord {
                    row: row as u16,
                    start: run.start as u16,
                    end: run.end as u16,
                };
                records.extend_from_slice(&rec.to_bytes());
            }
            cursor = run.end + 1;
        }

        if !records.is_empty() {
            volume::write_all(out, &records)?;
            stats.runs += (records.len() / RECORD_LEN) as u64;
            stats.bytes += records.len() as u64;
        }
        stats.rows += 1;
    }
    out.flush()?;
    Ok(stats)
}
