//! BMP file header + BITMAPINFOHEADER fields.
//!
//! Only the 40-byte BITMAPINFOHEADER is understood. All multi-byte fields are
//! little-endian.

use crate::cache::BitmapType;
use crate::error::StoreError;
use crate::session::Session;
use crate::volume::Volume;

/// Bytes covering the file header and a BITMAPINFOHEADER.
pub const HEADER_LEN: usize = 0x36;
/// The only DIB header size this crate parses.
pub const INFO_HEADER_SIZE: u16 = 40;

pub(super) const FILE_SIZE_OFFSET: usize = 0x02;
pub(super) const DATA_OFFSET_OFFSET: usize = 0x0A;
pub(super) const DIB_SIZE_OFFSET: usize = 0x0E;
pub(super) const WIDTH_OFFSET: usize = 0x12;
pub(super) const HEIGHT_OFFSET: usize = 0x16;
pub(super) const PLANES_OFFSET: usize = 0x1A;
pub(super) const BPP_OFFSET: usize = 0x1C;
pub(super) const COMPRESSION_OFFSET: usize = 0x1E;
pub(super) const IMAGE_SIZE_OFFSET: usize = 0x22;
pub(super) const COLORS_USED_OFFSET: usize = 0x2E;
// Last byte read is the top of the compression field.
const MIN_HEADER_LEN: usize = COMPRESSION_OFFSET + 4;

/// Parsed header fields needed by the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BmpHeader {
    /// Offset of the first pixel row from the start of the file.
    pub data_offset: u32,
    pub width: u32,
    /// Number of scanlines (absolute value of the stored height).
    pub height: u32,
    /// Stored height was negative: the first row in the file is the top row.
    pub top_down: bool,
    pub bits_per_pixel: u16,
    pub compression: u32,
}

/// Whether `data` starts with the `BM` magic.
pub fn is_bitmap(data: &[u8]) -> bool {
    data.starts_with(b"BM")
}

fn u16_at(data: &[u8], off: usize) -> u16 {
    u16::from_le_bytes([data[off], data[off + 1]])
}

fn u32_at(data: &[u8], off: usize) -> u32 {
    u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]])
}

impl BmpHeader {
    /// Parse the leading bytes of a BMP file.
    pub fn parse(data: &[u8]) -> Result<Self, StoreError> {
        if data.len() < 2 {
            return Err(StoreError::UnexpectedEof);
        }
        if !is_bitmap(data) {
            return Err(StoreError::UnrecognizedFormat);
        }
        if data.len() < DIB_SIZE_OFFSET + 2 {
            return Err(StoreError::UnexpectedEof);
        }
        let dib_size = u16_at(data, DIB_SIZE_OFFSET);
        if dib_size != INFO_HEADER_SIZE {
            return Err(StoreError::UnknownHeader { dib_size });
        }
        if data.len() < MIN_HEADER_LEN {
            return Err(StoreError::UnexpectedEof);
        }

        let width = u32_at(data, WIDTH_OFFSET) as i32;
        let height = u32_at(data, HEIGHT_OFFSET) as i32;
        if width <= 0 {
            return Err(StoreError::InvalidHeader(alloc::format!(
                "BMP width is {width}"
            )));
        }
        if height == 0 {
            return Err(StoreError::InvalidHeader("BMP height is zero".into()));
        }

        Ok(Self {
            data_offset: u32_at(data, DATA_OFFSET_OFFSET),
            width: width as u32,
            height: height.unsigned_abs(),
            top_down: height < 0,
            bits_per_pixel: u16_at(data, BPP_OFFSET),
            compression: u32_at(data, COMPRESSION_OFFSET),
        })
    }

    /// Uncompressed 1 bit per pixel: the only layout the run encoder handles.
    pub fn is_mono(&self) -> bool {
        self.bits_per_pixel == 1 && self.compression == 0
    }

    pub fn ensure_mono(&self) -> Result<(), StoreError> {
        if self.is_mono() {
            Ok(())
        } else {
            Err(StoreError::UnsupportedFormat {
                bits_per_pixel: self.bits_per_pixel,
                compression: self.compression,
            })
        }
    }

    /// Source classification reported in a [`crate::BitmapDescriptor`].
    pub fn kind(&self) -> BitmapType {
        match (self.bits_per_pixel, self.compression) {
            (1, 0) => BitmapType::Monochrome,
            (24, 0) => BitmapType::Rgb888,
            _ => BitmapType::Error,
        }
    }

    /// Stored row length: pixel bits padded to a 4-byte boundary.
    pub fn row_stride(&self) -> u64 {
        (u64::from(self.width) * u64::from(self.bits_per_pixel)).div_ceil(32) * 4
    }

    /// Bytes of a 1-bit row that carry pixels.
    pub fn mono_row_bytes(&self) -> usize {
        (self.width as usize).div_ceil(8)
    }

    /// File offset of stored row `row`.
    pub fn row_offset(&self, row: u32) -> u64 {
        self.row_stride()
            .saturating_mul(u64::from(row))
            .saturating_add(u64::from(self.data_offset))
    }
}

/// Rewind the open file and parse its header.
pub(crate) fn read_header<V: Volume>(session: &mut Session<V>) -> Result<BmpHeader, StoreError> {
    session.seek(0)?;
    let bytes = session.read_bytes(HEADER_LEN)?;
    BmpHeader::parse(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    fn header(width: i32, height: i32, bpp: u16, compression: u32) -> Vec<u8> {
        let mut out = alloc::vec![0u8; HEADER_LEN];
        out[0..2].copy_from_slice(b"BM");
        out[0x0A..0x0E].copy_from_slice(&62u32.to_le_bytes());
        out[0x0E..0x12].copy_from_slice(&40u32.to_le_bytes());
        out[0x12..0x16].copy_from_slice(&width.to_le_bytes());
        out[0x16..0x1A].copy_from_slice(&height.to_le_bytes());
        out[0x1A..0x1C].copy_from_slice(&1u16.to_le_bytes());
        out[0x1C..0x1E].copy_from_slice(&bpp.to_le_bytes());
        out[0x1E..0x22].copy_from_slice(&compression.to_le_bytes());
        out
    }

    #[test]
    fn parses_info_header() {
        let h = BmpHeader::parse(&header(40, 12, 1, 0)).unwrap();
        assert_eq!(h.data_offset, 62);
        assert_eq!((h.width, h.height), (40, 12));
        assert!(!h.top_down);
        assert!(h.is_mono());
        assert_eq!(h.kind(), BitmapType::Monochrome);
        assert_eq!(h.row_stride(), 8);
        assert_eq!(h.mono_row_bytes(), 5);
        assert_eq!(h.row_offset(2), 62 + 16);
    }

    #[test]
    fn negative_height_keeps_orientation() {
        let h = BmpHeader::parse(&header(8, -5, 1, 0)).unwrap();
        assert_eq!(h.height, 5);
        assert!(h.top_down);
    }

    #[test]
    fn stride_is_padded_to_four_bytes() {
        for (width, stride) in [(1, 4), (31, 4), (32, 4), (33, 8), (64, 8), (65, 12)] {
            let h = BmpHeader::parse(&header(width, 1, 1, 0)).unwrap();
            assert_eq!(h.row_stride(), stride, "width {width}");
        }
        let h = BmpHeader::parse(&header(3, 1, 24, 0)).unwrap();
        assert_eq!(h.row_stride(), 12);
        // Widest legal header with the largest bit depth still has a finite stride.
        let h = BmpHeader::parse(&header(i32::MAX, 2, u16::MAX, 0)).unwrap();
        assert_eq!(h.row_stride(), (u64::from(i32::MAX as u32) * 65535).div_ceil(32) * 4);
        assert_eq!(h.row_offset(1), 62 + h.row_stride());
    }

    #[test]
    fn unknown_dib_size() {
        let mut data = header(8, 8, 1, 0);
        data[0x0E] = 108;
        match BmpHeader::parse(&data) {
            Err(StoreError::UnknownHeader { dib_size }) => assert_eq!(dib_size, 108),
            other => panic!("expected UnknownHeader, got {other:?}"),
        }
    }

    #[test]
    fn unsupported_layouts() {
        let rgb = BmpHeader::parse(&header(8, 8, 24, 0)).unwrap();
        assert_eq!(rgb.kind(), BitmapType::Rgb888);
        assert!(matches!(
            rgb.ensure_mono(),
            Err(StoreError::UnsupportedFormat { bits_per_pixel: 24, compression: 0 })
        ));
        let rle = BmpHeader::parse(&header(8, 8, 1, 1)).unwrap();
        assert_eq!(rle.kind(), BitmapType::Error);
        assert!(rle.ensure_mono().is_err());
    }

    #[test]
    fn truncated_and_foreign_input() {
        assert!(matches!(BmpHeader::parse(b"B"), Err(StoreError::UnexpectedEof)));
        assert!(matches!(
            BmpHeader::parse(b"P6\n1 1\n255\n"),
            Err(StoreError::UnrecognizedFormat)
        ));
        let data = header(8, 8, 1, 0);
        assert!(matches!(
            BmpHeader::parse(&data[..0x20]),
            Err(StoreError::UnexpectedEof)
        ));
        assert!(matches!(
            BmpHeader::parse(&header(0, 8, 1, 0)),
            Err(StoreError::InvalidHeader(_))
        ));
    }
}
