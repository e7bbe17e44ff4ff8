//! Glyph-sheet font handling.
//!
//! The font is a grayscale sprite sheet with a known text printed in it,
//! 8x15 pixels per glyph. The red channel of each sheet pixel is the glyph
//! coverage used for alpha blending.

use alloc::vec::Vec;

use crate::pixel::Pixel;
use crate::pnm::Image;

pub const GLYPH_WIDTH: usize = 8;
pub const GLYPH_HEIGHT: usize = 15;

/// The text printed in the bundled font sheet, `\n` separating sheet rows.
pub const SHEET_TEXT: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ(){}$&\nabcdefghijklmnopqrstuvwxyz[]%#^@\n0123456789.:,;+-*/_'\"\\!?=<>~| ";

/// A single glyph's coverage data, row-major.
pub struct Glyph {
    pub chr: char,
    pub coverage: [u8; GLYPH_WIDTH * GLYPH_HEIGHT],
}

/// Errors that can occur while parsing a font sheet.
#[derive(Debug, PartialEq, Eq)]
pub enum FontError {
    SheetTooSmall { width: usize, height: usize },
}

/// A parsed font: the list of glyphs cut out of a sprite sheet.
pub struct Font {
    glyphs: Vec<Glyph>,
}

impl Font {
    /// Cuts glyphs out of `sheet` as described by `text`: each character
    /// maps to the next 8x15 cell, `\n` advances to the next sheet row.
    pub fn parse(sheet: &Image, text: &str) -> Result<Font, FontError> {
        let rows = text.split('\n').count();
        let cols = text.split('\n').map(|row| row.chars().count()).max().unwrap_or(0);
        if sheet.width < cols * GLYPH_WIDTH || sheet.height < rows * GLYPH_HEIGHT {
            return Err(FontError::SheetTooSmall {
                width: sheet.width,
                height: sheet.height,
            });
        }

        let mut glyphs = Vec::new();
        for (row, line) in text.split('\n').enumerate() {
            for (col, chr) in line.chars().enumerate() {
                let mut coverage = [0u8; GLYPH_WIDTH * GLYPH_HEIGHT];
                for y in 0..GLYPH_HEIGHT {
                    let sheet_row = row * GLYPH_HEIGHT + y;
                    for x in 0..GLYPH_WIDTH {
                        let px = &sheet.pixels[sheet_row * sheet.width + col * GLYPH_WIDTH + x];
                        coverage[y * GLYPH_WIDTH + x] = px.red;
                    }
                }
                glyphs.push(Glyph { chr, coverage });
            }
        }
        Ok(Font { glyphs })
    }

    /// Looks a glyph up by character; unknown characters fall back to the
    /// last glyph in the sheet.
    pub fn glyph(&self, chr: char) -> &Glyph {
        self.glyphs
            .iter()
            .find(|g| g.chr == chr)
            .unwrap_or_else(|| self.glyphs.last().expect("font has no glyphs"))
    }

    /// Alpha-blends a glyph over `buffer` at pixel position (`x`, `y`).
    /// `stride` is the buffer's row width in pixels.
    pub fn draw_glyph(&self, buffer: &mut [Pixel], stride: usize, x: usize, y: usize, glyph: &Glyph, color: Pixel) {
        for row in 0..GLYPH_HEIGHT {
            let base = (y + row) * stride + x;
            for col in 0..GLYPH_WIDTH {
                let alpha = glyph.coverage[row * GLYPH_WIDTH + col] as u16;
                let px = &mut buffer[base + col];
                px.red = blend(px.red, color.red, alpha);
                px.green = blend(px.green, color.green, alpha);
                px.blue = blend(px.blue, color.blue, alpha);
            }
        }
    }

    /// Draws `text` into `buffer` starting at (`x`, `y`), advancing 15
    /// pixels per `\n` line break. Carriage returns are skipped.
    pub fn draw_text(&self, buffer: &mut [Pixel], stride: usize, x: usize, y: usize, color: Pixel, text: &str) {
        let mut col = 0;
        let mut row = 0;
        for chr in text.chars() {
            match chr {
                '\r' => {}
                '\n' => {
                    col = 0;
                    row += 1;
                }
                _ => {
                    self.draw_glyph(
                        buffer,
                        stride,
                        x + col * GLYPH_WIDTH,
                        y + row * GLYPH_HEIGHT,
                        self.glyph(chr),
                        color,
                    );
                    col += 1;
                }
            }
        }
    }

    pub fn glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    pub fn glyphs(&self) -> &[Glyph] {
        &self.glyphs
    }
}

fn blend(under: u8, over: u8, alpha: u16) -> u8 {
    ((over as u16 * alpha + under as u16 * (255 - alpha)) / 255) as u8
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    /// 2-glyph sheet: "A" fully lit, "B" dark.
    fn tiny_font() -> Font {
        let width = 2 * GLYPH_WIDTH;
        let height = GLYPH_HEIGHT;
        let mut pixels = vec![Pixel::BLACK; width * height];
        for y in 0..GLYPH_HEIGHT {
            for x in 0..GLYPH_WIDTH {
                pixels[y * width + x] = Pixel::gray(255);
            }
        }
        let sheet = Image {
            width,
            height,
            pixels,
        };
        Font::parse(&sheet, "AB").unwrap()
    }

    #[test]
    fn parse_cuts_glyphs_from_sheet() {
        let font = tiny_font();
        assert_eq!(font.glyph_count(), 2);
        assert_eq!(font.glyph('A').coverage[0], 255);
        assert_eq!(font.glyph('B').coverage[0], 0);
    }

    #[test]
    fn unknown_character_falls_back_to_last_glyph() {
        let font = tiny_font();
        assert_eq!(font.glyph('z').chr, 'B');
    }

    #[test]
    fn parse_rejects_short_sheet() {
        let sheet = Image {
            width: 4,
            height: 4,
            pixels: vec![Pixel::BLACK; 16],
        };
        assert!(matches!(
            Font::parse(&sheet, "AB"),
            Err(FontError::SheetTooSmall { .. })
        ));
    }

    #[test]
    fn draw_glyph_blends_over_background() {
        let font = tiny_font();
        let mut buffer = vec![Pixel::gray(100); GLYPH_WIDTH * GLYPH_HEIGHT];
        let glyph = font.glyph('A');
        font.draw_glyph(&mut buffer, GLYPH_WIDTH, 0, 0, glyph, Pixel::WHITE);
        // full coverage replaces the background
        assert_eq!(buffer[0], Pixel::WHITE);

        let mut buffer = vec![Pixel::gray(100); GLYPH_WIDTH * GLYPH_HEIGHT];
        let dark = font.glyph('B');
        font.draw_glyph(&mut buffer, GLYPH_WIDTH, 0, 0, dark, Pixel::WHITE);
        // zero coverage leaves the background alone
        assert_eq!(buffer[0], Pixel::gray(100));
    }

    #[test]
    fn draw_text_advances_lines() {
        let font = tiny_font();
        let stride = 2 * GLYPH_WIDTH;
        let mut buffer = vec![Pixel::BLACK; stride * 2 * GLYPH_HEIGHT];
        font.draw_text(&mut buffer, stride, 0, 0, Pixel::WHITE, "A\r\nA");
        assert_eq!(buffer[0], Pixel::WHITE);
        assert_eq!(buffer[GLYPH_HEIGHT * stride], Pixel::WHITE);
    }

    #[test]
    fn sheet_text_shape_matches_bundled_font() {
        let rows: Vec<&str> = SHEET_TEXT.split('\n').collect();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.chars().count() <= 33));
        // fallback glyph for unknown characters is the trailing space
        assert_eq!(SHEET_TEXT.chars().last(), Some(' '));
    }
}
