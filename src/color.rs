/// Display colour of monochrome bitmaps, RGB565.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MonoColor(pub u16);

impl MonoColor {
    /// Convert RGB888 by dropping the low bits of each channel.
    ///
    /// ```
    /// use zenfloor::MonoColor;
    ///
    /// assert_eq!(MonoColor::from_rgb888(255, 0, 0).0, 0xF800);
    /// assert_eq!(MonoColor::from_rgb888(0, 255, 0).0, 0x07E0);
    /// assert_eq!(MonoColor::from_rgb888(0, 0, 255).0, 0x001F);
    /// ```
    pub const fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        let r = (r as u16 & 0xF8) << 8;
        let g = (g as u16 & 0xFC) << 3;
        let b = b as u16 >> 3;
        Self(r | g | b)
    }

    /// Expand back to RGB888, replicating the high bits into the low ones.
    pub const fn to_rgb888(self) -> (u8, u8, u8) {
        let r = ((self.0 >> 11) & 0x1F) as u8;
        let g = ((self.0 >> 5) & 0x3F) as u8;
        let b = (self.0 & 0x1F) as u8;
        ((r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2))
    }
}

impl From<u16> for MonoColor {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

impl From<MonoColor> for u16 {
    fn from(c: MonoColor) -> Self {
        c.0
    }
}

#[cfg(feature = "rgb")]
impl From<rgb::RGB8> for MonoColor {
    fn from(px: rgb::RGB8) -> Self {
        Self::from_rgb888(px.r, px.g, px.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_round_trip() {
        for (r, g, b) in [(255, 0, 0), (0, 255, 0), (0, 0, 255), (0, 0, 0), (255, 255, 255)] {
            assert_eq!(MonoColor::from_rgb888(r, g, b).to_rgb888(), (r, g, b));
        }
    }

    #[test]
    fn low_bits_are_dropped() {
        assert_eq!(MonoColor::from_rgb888(0x07, 0x03, 0x07).0, 0);
        assert_eq!(MonoColor::from_rgb888(0x08, 0x04, 0x08).0, 0x0821);
    }

    #[cfg(feature = "rgb")]
    #[test]
    fn from_rgb8() {
        let c: MonoColor = rgb::RGB8::new(255, 0, 0).into();
        assert_eq!(u16::from(c), 0xF800);
    }
}
