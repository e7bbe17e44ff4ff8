//! Bilinear interpolation and image rotation.

use libm::{cosf, sinf};

use crate::pixel::Pixel;

/// Bilinear interpolation within a square of 4 surrounding pixels.
///
/// `corners` points at the top-left pixel; the other three corners are read
/// at offsets 1, `row_width` and `row_width + 1`. `x` and `y` select the
/// position inside the square, both within [0..1] (0 being left/top).
/// Out-of-range positions yield black.
pub fn interpolate_4px(corners: &[Pixel], row_width: usize, x: f32, y: f32) -> Pixel {
    if !(0.0..=1.0).contains(&x) || !(0.0..=1.0).contains(&y) {
        return Pixel::BLACK;
    }

    let ix = 1.0 - x;
    let iy = 1.0 - y;

    let sa = ix * iy;
    let sb = x * iy;
    let sc = ix * y;
    let sd = x * y;

    let mix = |ch: fn(&Pixel) -> u8| {
        (ch(&corners[0]) as f32 * sa
            + ch(&corners[1]) as f32 * sb
            + ch(&corners[row_width]) as f32 * sc
            + ch(&corners[row_width + 1]) as f32 * sd) as u8
    };

    Pixel {
        red: mix(|p| p.red),
        green: mix(|p| p.green),
        blue: mix(|p| p.blue),
        reserved: 0,
    }
}

/// Linear interpolation between 2 pixels, the one-dimensional case of
/// [`interpolate_4px`]: with a row width of 0 both rows alias the same
/// two pixels and the vertical weights cancel out.
pub fn interpolate_2px(colors: &[Pixel], ratio: f32) -> Pixel {
    interpolate_4px(colors, 0, ratio, 0.0)
}

/// Rotates a square image clockwise by `theta` radians.
///
/// Both images must be `2 * radius + 1` pixels wide and tall. Each output
/// pixel is mapped through the inverse rotation into the source, the integer
/// part floored towards negative infinity, and the color bilinearly
/// interpolated between the four surrounding source pixels. Samples outside
/// the source are black.
pub fn rotate_image(source: &[Pixel], target: &mut [Pixel], radius: i64, theta: f32) {
    let cost = cosf(theta);
    let sint = sinf(theta);
    let diameter = 2 * radius + 1;

    let fetch = |x: i64, y: i64| -> Pixel {
        if x >= 0 && x < diameter && y >= 0 && y < diameter {
            source[(y * diameter + x) as usize]
        } else {
            Pixel::BLACK
        }
    };

    for y in -radius..radius {
        for x in -radius..radius {
            let xrot = cost * x as f32 + sint * y as f32;
            let yrot = -sint * x as f32 + cost * y as f32;
            let mut xrot_int = xrot as i64;
            if xrot < 0.0 {
                xrot_int -= 1;
            }
            let mut yrot_int = yrot as i64;
            if yrot < 0.0 {
                yrot_int -= 1;
            }
            let eff_x = xrot_int + radius;
            let eff_y = yrot_int + radius;

            let corners = [
                fetch(eff_x, eff_y),
                fetch(eff_x + 1, eff_y),
                fetch(eff_x, eff_y + 1),
                fetch(eff_x + 1, eff_y + 1),
            ];
            let col = interpolate_4px(&corners, 2, xrot - xrot_int as f32, yrot - yrot_int as f32);
            target[((y + radius) * diameter + radius + x) as usize] = col;
        }
    }
}

/// Largest radius whose disc image (side `2 * radius + 1`) still fits a
/// frame of the given dimensions.
pub fn max_disc_radius(width: usize, height: usize) -> i64 {
    (width.min(height).saturating_sub(1) / 2) as i64
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn interpolate_4px_returns_corners_at_extremes() {
        let corners = [
            Pixel::new(255, 0, 0),
            Pixel::new(0, 255, 0),
            Pixel::new(0, 0, 255),
            Pixel::new(255, 255, 255),
        ];
        assert_eq!(interpolate_4px(&corners, 2, 0.0, 0.0), corners[0]);
        assert_eq!(interpolate_4px(&corners, 2, 1.0, 0.0), corners[1]);
        assert_eq!(interpolate_4px(&corners, 2, 0.0, 1.0), corners[2]);
        assert_eq!(interpolate_4px(&corners, 2, 1.0, 1.0), corners[3]);
    }

    #[test]
    fn interpolate_4px_blends_center() {
        let corners = [
            Pixel::gray(0),
            Pixel::gray(100),
            Pixel::gray(200),
            Pixel::gray(100),
        ];
        let mid = interpolate_4px(&corners, 2, 0.5, 0.5);
        assert_eq!(mid, Pixel::gray(100));
    }

    #[test]
    fn interpolate_4px_rejects_out_of_range() {
        let corners = [Pixel::WHITE; 4];
        assert_eq!(interpolate_4px(&corners, 2, -0.1, 0.0), Pixel::BLACK);
        assert_eq!(interpolate_4px(&corners, 2, 0.0, 1.1), Pixel::BLACK);
    }

    #[test]
    fn interpolate_2px_is_horizontal_blend() {
        let colors = [Pixel::gray(0), Pixel::gray(200)];
        assert_eq!(interpolate_2px(&colors, 0.0), colors[0]);
        assert_eq!(interpolate_2px(&colors, 1.0), colors[1]);
        assert_eq!(interpolate_2px(&colors, 0.25), Pixel::gray(50));
    }

    #[test]
    fn rotate_identity_preserves_interior() {
        let radius = 2i64;
        let side = (2 * radius + 1) as usize;
        let mut source = vec![Pixel::BLACK; side * side];
        source[side * 2 + 1] = Pixel::WHITE;
        let mut target = vec![Pixel::BLACK; side * side];

        rotate_image(&source, &mut target, radius, 0.0);
        assert_eq!(target[side * 2 + 1], Pixel::WHITE);
    }

    #[test]
    fn rotate_half_turn_mirrors_pixel() {
        let radius = 2i64;
        let side = (2 * radius + 1) as usize;
        let mut source = vec![Pixel::BLACK; side * side];
        // one pixel right of center
        source[side * 2 + 3] = Pixel::gray(200);
        let mut target = vec![Pixel::BLACK; side * side];

        rotate_image(&source, &mut target, radius, core::f32::consts::PI);
        // after 180 degrees it lands one pixel left of center
        assert!(target[side * 2 + 1].red > 150);
    }

    #[test]
    fn max_disc_radius_keeps_disc_inside_frame() {
        assert_eq!(max_disc_radius(640, 480), 239);
        let side = 2 * max_disc_radius(640, 480) + 1;
        assert!(side <= 480);
        // an oversized request clamps instead of outgrowing the frame
        assert!(2 * max_disc_radius(640, 480).min(600) + 1 <= 480);
        assert_eq!(max_disc_radius(1, 1), 0);
        assert_eq!(max_disc_radius(0, 10), 0);
    }

    #[test]
    fn rotate_zero_radius_is_noop() {
        let source = [Pixel::WHITE];
        let mut target = [Pixel::BLACK];
        rotate_image(&source, &mut target, 0, 1.0);
        assert_eq!(target[0], Pixel::BLACK);
    }
}
