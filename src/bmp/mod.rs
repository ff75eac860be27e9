//! Monochrome BMP header reading and writing.
//!
//! Decoding stops at the header: pixel rows are consumed by the scanline
//! run engine ([`crate::scan`]) straight from the open file.

mod encode;
mod header;

pub use header::{BmpHeader, HEADER_LEN, INFO_HEADER_SIZE, is_bitmap};
pub(crate) use header::read_header;

use crate::error::StoreError;
use alloc::vec::Vec;
use enough::Stop;

/// Encode a one-byte-per-pixel mask (non-zero = set) as an uncompressed 1-bit BMP.
///
/// ```
/// use enough::Unstoppable;
/// use zenfloor::bmp::{self, BmpHeader};
///
/// let mask = [0u8, 1, 1, 0];
/// let data = bmp::encode_mono(&mask, 2, 2, false, &Unstoppable)?;
/// let header = BmpHeader::parse(&data)?;
/// assert!(header.is_mono());
/// # Ok::<(), zenfloor::StoreError>(())
/// ```
pub fn encode_mono(
    mask: &[u8],
    width: u32,
    height: u32,
    top_down: bool,
    stop: &dyn Stop,
) -> Result<Vec<u8>, StoreError> {
    encode::encode_mono(mask, width, height, top_down, stop)
}
