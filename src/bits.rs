//! Pixel index to bit position mapping.
//!
//! Logical pixel `x` of a 1-bit row lives in byte `x / 8`. The display
//! controller numbers bits from the least significant end while BMP packs the
//! leftmost pixel into the most significant bit, so within each byte the
//! order is reversed.

/// Physical bit index of logical pixel `index`.
///
/// ```
/// use zenfloor::bits::translate;
///
/// assert_eq!(translate(0), 7);
/// assert_eq!(translate(7), 0);
/// assert_eq!(translate(9), 14);
/// ```
#[inline]
pub const fn translate(index: u32) -> u32 {
    ((index / 8) * 2 + 1) * 8 - 1 - index
}

/// State of bit `physical % 8` of byte `physical / 8`.
///
/// Bits past the end of `data` read as clear; callers bound the index to the
/// row width themselves.
#[inline]
pub fn bit_at(data: &[u8], physical: u32) -> bool {
    data.get((physical / 8) as usize)
        .is_some_and(|&byte| (byte >> (physical % 8)) & 1 != 0)
}

/// State of logical pixel `index`.
#[inline]
pub fn pixel_at(data: &[u8], index: u32) -> bool {
    bit_at(data, translate(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn translate_is_a_bijection_over_padded_width() {
        for padded in [8u32, 16, 32, 96] {
            let mut seen = vec![false; padded as usize];
            for x in 0..padded {
                let p = translate(x);
                assert!(p < padded, "{x} -> {p} escapes {padded}");
                assert!(!seen[p as usize], "{p} hit twice");
                seen[p as usize] = true;
                assert_eq!(translate(p), x);
            }
        }
    }

    #[test]
    fn msb_is_first_pixel() {
        let row = [0b1000_0001u8, 0b0100_0000];
        assert!(pixel_at(&row, 0));
        assert!(!pixel_at(&row, 1));
        assert!(pixel_at(&row, 7));
        assert!(pixel_at(&row, 9));
        assert!(!pixel_at(&row, 8));
    }

    #[test]
    fn out_of_range_reads_clear() {
        assert!(!bit_at(&[0xFF], 8));
        assert!(!pixel_at(&[], 0));
    }
}
