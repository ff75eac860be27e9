//! Uncompressed 1-bit BMP writer.

use alloc::vec::Vec;
use enough::Stop;

use super::header::{
    BPP_OFFSET, COLORS_USED_OFFSET, DATA_OFFSET_OFFSET, DIB_SIZE_OFFSET, FILE_SIZE_OFFSET,
    HEADER_LEN, HEIGHT_OFFSET, IMAGE_SIZE_OFFSET, INFO_HEADER_SIZE, PLANES_OFFSET, WIDTH_OFFSET,
};
use crate::error::StoreError;

/// Headers plus a two-entry palette.
const MONO_DATA_OFFSET: usize = HEADER_LEN + 8;

/// Encode a one-byte-per-pixel mask (non-zero = set) as a 1-bit BMP.
///
/// Mask rows run top to bottom. The file stores them bottom-up unless
/// `top_down` is set, in which case the height field is written negative.
pub(crate) fn encode_mono(
    mask: &[u8],
    width: u32,
    height: u32,
    top_down: bool,
    stop: &dyn Stop,
) -> Result<Vec<u8>, StoreError> {
    let w = width as usize;
    let h = height as usize;
    if width == 0 || height == 0 {
        return Err(StoreError::InvalidData(alloc::format!(
            "empty {width}x{height} bitmap"
        )));
    }
    if width > i32::MAX as u32 || height > i32::MAX as u32 {
        return Err(StoreError::DimensionsTooLarge { width, height });
    }
    let expected = w
        .checked_mul(h)
        .ok_or(StoreError::DimensionsTooLarge { width, height })?;
    if mask.len() < expected {
        return Err(StoreError::BufferTooSmall {
            needed: expected,
            actual: mask.len(),
        });
    }

    let row_stride = w.div_ceil(32) * 4;
    let image_size = row_stride
        .checked_mul(h)
        .and_then(|n| u32::try_from(n).ok())
        .ok_or(StoreError::DimensionsTooLarge { width, height })?;
    let file_size = image_size
        .checked_add(MONO_DATA_OFFSET as u32)
        .ok_or(StoreError::DimensionsTooLarge { width, height })?;

    stop.check()?;

    let mut out = Vec::with_capacity(file_size as usize);
    out.extend_from_slice(&mono_header(width, height, top_down, image_size, file_size));

    let mut packed = alloc::vec![0u8; row_stride];
    for i in 0..h {
        if i % 16 == 0 {
            stop.check()?;
        }
        let row = if top_down { i } else { h - 1 - i };
        packed.fill(0);
        for (x, _) in mask[row * w..(row + 1) * w]
            .iter()
            .enumerate()
            .filter(|(_, px)| **px != 0)
        {
            packed[x / 8] |= 0x80 >> (x % 8);
        }
        out.extend_from_slice(&packed);
    }

    Ok(out)
}

/// File header, BITMAPINFOHEADER and a black/white palette.
fn mono_header(
    width: u32,
    height: u32,
    top_down: bool,
    image_size: u32,
    file_size: u32,
) -> [u8; MONO_DATA_OFFSET] {
    let mut hdr = [0u8; MONO_DATA_OFFSET];
    let mut put = |off: usize, bytes: &[u8]| hdr[off..off + bytes.len()].copy_from_slice(bytes);

    // Dimensions were checked against i32::MAX by the caller.
    let stored_height = if top_down {
        -(height as i32)
    } else {
        height as i32
    };
    put(0, b"BM");
    put(FILE_SIZE_OFFSET, &file_size.to_le_bytes());
    put(DATA_OFFSET_OFFSET, &(MONO_DATA_OFFSET as u32).to_le_bytes());
    put(DIB_SIZE_OFFSET, &u32::from(INFO_HEADER_SIZE).to_le_bytes());
    put(WIDTH_OFFSET, &(width as i32).to_le_bytes());
    put(HEIGHT_OFFSET, &stored_height.to_le_bytes());
    put(PLANES_OFFSET, &1u16.to_le_bytes());
    put(BPP_OFFSET, &1u16.to_le_bytes());
    put(IMAGE_SIZE_OFFSET, &image_size.to_le_bytes());
    put(COLORS_USED_OFFSET, &2u32.to_le_bytes());
    // Palette entry 1 is white; entry 0 stays black.
    put(HEADER_LEN + 4, &[0xFF, 0xFF, 0xFF, 0]);
    hdr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bmp::BmpHeader;
    use enough::Unstoppable;

    #[test]
    fn header_fields() {
        let mask = [1u8, 0, 0, 1, 0, 1];
        let bmp = encode_mono(&mask, 3, 2, false, &Unstoppable).unwrap();
        assert_eq!(bmp.len(), 62 + 8);
        let header = BmpHeader::parse(&bmp).unwrap();
        assert_eq!((header.width, header.height), (3, 2));
        assert!(header.is_mono());
        assert!(!header.top_down);
        assert_eq!(header.data_offset, 62);
        // bottom-up: file row 0 is mask row 1 = 1,0,1
        assert_eq!(bmp[62], 0b1010_0000);
        assert_eq!(bmp[66], 0b1000_0000);
    }

    #[test]
    fn top_down_keeps_row_order() {
        let mask = [1u8, 1, 0, 0];
        let bmp = encode_mono(&mask, 2, 2, true, &Unstoppable).unwrap();
        let header = BmpHeader::parse(&bmp).unwrap();
        assert!(header.top_down);
        assert_eq!(header.height, 2);
        assert_eq!(bmp[62], 0b1100_0000);
        assert_eq!(bmp[66], 0);
    }

    #[test]
    fn short_mask_is_rejected() {
        assert!(matches!(
            encode_mono(&[0u8; 3], 2, 2, false, &Unstoppable),
            Err(StoreError::BufferTooSmall { needed: 4, actual: 3 })
        ));
        assert!(matches!(
            encode_mono(&[], 0, 2, false, &Unstoppable),
            Err(StoreError::InvalidData(_))
        ));
        assert!(matches!(
            encode_mono(&[], 2, 0, false, &Unstoppable),
            Err(StoreError::InvalidData(_))
        ));
    }
}
