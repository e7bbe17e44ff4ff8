/// A 32-bit BGRX pixel, layout-compatible with the GOP BLT pixel format.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pixel {
    pub blue: u8,
    pub green: u8,
    pub red: u8,
    pub reserved: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);
    pub const WHITE: Pixel = Pixel::new(255, 255, 255);

    pub const fn new(red: u8, green: u8, blue: u8) -> Pixel {
        Pixel {
            blue,
            green,
            red,
            reserved: 0,
        }
    }

    /// Grayscale pixel with all three channels set to `value`.
    pub const fn gray(value: u8) -> Pixel {
        Pixel::new(value, value, value)
    }
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_matches_blt_layout() {
        assert_eq!(core::mem::size_of::<Pixel>(), 4);
        let px = Pixel::new(1, 2, 3);
        let bytes: [u8; 4] = unsafe { core::mem::transmute(px) };
        assert_eq!(bytes, [3, 2, 1, 0]);
    }

    #[test]
    fn gray_sets_all_channels() {
        let px = Pixel::gray(77);
        assert_eq!((px.red, px.green, px.blue), (77, 77, 77));
    }
}
