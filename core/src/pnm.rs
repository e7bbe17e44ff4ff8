//! Parsers for the binary netpbm image formats (PPM, PGM, PBM).

use alloc::vec::Vec;

use crate::pixel::Pixel;

/// A decoded raster image.
#[derive(Debug)]
pub struct Image {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<Pixel>,
}

/// Errors that can occur while decoding netpbm data.
#[derive(Debug, PartialEq, Eq)]
pub enum PnmError {
    BadMagic,
    TruncatedHeader,
    TruncatedData,
    ZeroDimension,
}

/// Decodes a binary netpbm image, picking the format from the magic number:
/// `P6` (color), `P5` (grayscale) or `P4` (bitmap).
pub fn decode(data: &[u8]) -> Result<Image, PnmError> {
    if data.len() < 3 || data[0] != b'P' {
        return Err(PnmError::BadMagic);
    }
    match data[1] {
        b'6' => decode_ppm(data),
        b'5' => decode_pgm(data),
        b'4' => decode_pbm(data),
        _ => Err(PnmError::BadMagic),
    }
}

/// Decodes a binary PPM (`P6`) image: 3 bytes RGB per pixel.
pub fn decode_ppm(data: &[u8]) -> Result<Image, PnmError> {
    let (width, height, body) = parse_header(data, b'6', true)?;
    if body.len() < width * height * 3 {
        return Err(PnmError::TruncatedData);
    }
    let pixels = body
        .chunks_exact(3)
        .take(width * height)
        .map(|rgb| Pixel::new(rgb[0], rgb[1], rgb[2]))
        .collect();
    Ok(Image {
        width,
        height,
        pixels,
    })
}

/// Decodes a binary PGM (`P5`) image: 1 gray byte per pixel.
pub fn decode_pgm(data: &[u8]) -> Result<Image, PnmError> {
    let (width, height, body) = parse_header(data, b'5', true)?;
    if body.len() < width * height {
        return Err(PnmError::TruncatedData);
    }
    let pixels = body
        .iter()
        .take(width * height)
        .map(|&v| Pixel::gray(v))
        .collect();
    Ok(Image {
        width,
        height,
        pixels,
    })
}

/// Decodes a binary PBM (`P4`) image: one bit per pixel, MSB first, rows
/// padded to whole bytes. A set bit is black, a clear bit white.
pub fn decode_pbm(data: &[u8]) -> Result<Image, PnmError> {
    let (width, height, body) = parse_header(data, b'4', false)?;
    let bytes_per_row = (width - 1) / 8 + 1;
    if body.len() < bytes_per_row * height {
        return Err(PnmError::TruncatedData);
    }
    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let byte = body[row * bytes_per_row + col / 8];
            let mask = 0x80u8 >> (col % 8);
            let value = if byte & mask == 0 { 255 } else { 0 };
            pixels.push(Pixel::gray(value));
        }
    }
    Ok(Image {
        width,
        height,
        pixels,
    })
}

fn is_whitespace(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n')
}

/// Parses the netpbm header and returns `(width, height, pixel data)`.
///
/// After the magic there may be a single `#` comment line; width and height
/// follow as whitespace-separated decimal numbers, then (for PPM/PGM) the
/// maxval, which is read but ignored. Exactly one whitespace byte separates
/// the header from the pixel data.
fn parse_header(data: &[u8], magic_digit: u8, has_maxval: bool) -> Result<(usize, usize, &[u8]), PnmError> {
    if data.len() < 3 || data[0] != b'P' || data[1] != magic_digit || !is_whitespace(data[2]) {
        return Err(PnmError::BadMagic);
    }

    let mut pos = 3;
    while pos < data.len() && is_whitespace(data[pos]) {
        pos += 1;
    }
    if pos < data.len() && data[pos] == b'#' {
        while pos < data.len() && data[pos] != b'\n' {
            pos += 1;
        }
        pos += 1;
    }

    let width = read_number(data, &mut pos)?;
    let height = read_number(data, &mut pos)?;
    if has_maxval {
        read_number(data, &mut pos)?;
    }
    if width == 0 || height == 0 {
        return Err(PnmError::ZeroDimension);
    }
    if pos > data.len() {
        return Err(PnmError::TruncatedHeader);
    }
    Ok((width, height, &data[pos..]))
}

/// Reads a decimal number at `*pos` and consumes the single trailing
/// whitespace byte.
fn read_number(data: &[u8], pos: &mut usize) -> Result<usize, PnmError> {
    while *pos < data.len() && is_whitespace(data[*pos]) {
        *pos += 1;
    }
    let start = *pos;
    while *pos < data.len() && data[*pos].is_ascii_digit() {
        *pos += 1;
    }
    if *pos == start || *pos >= data.len() || !is_whitespace(data[*pos]) {
        return Err(PnmError::TruncatedHeader);
    }
    let mut value: usize = 0;
    for &digit in &data[start..*pos] {
        value = value * 10 + (digit - b'0') as usize;
    }
    *pos += 1;
    Ok(value)
}

#[cfg(test)]
extern crate std;

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn decodes_ppm() {
        let data = b"P6\n2 1\n255\n\x01\x02\x03\x0a\x0b\x0c";
        let image = decode(data).unwrap();
        assert_eq!((image.width, image.height), (2, 1));
        assert_eq!(image.pixels[0], Pixel::new(1, 2, 3));
        assert_eq!(image.pixels[1], Pixel::new(10, 11, 12));
    }

    #[test]
    fn decodes_pgm_with_comment() {
        let data = b"P5\n# test image\n2 2\n255\n\x00\x40\x80\xff";
        let image = decode(data).unwrap();
        assert_eq!((image.width, image.height), (2, 2));
        assert_eq!(image.pixels[1], Pixel::gray(0x40));
        assert_eq!(image.pixels[3], Pixel::gray(0xff));
    }

    #[test]
    fn decodes_pbm_with_row_padding() {
        // 9 pixels wide: each row takes 2 bytes
        let data = b"P4\n9 2\n\x80\x80\x01\x00";
        let image = decode(data).unwrap();
        assert_eq!((image.width, image.height), (9, 2));
        assert_eq!(image.pixels[0], Pixel::gray(0)); // set bit is black
        assert_eq!(image.pixels[1], Pixel::gray(255));
        assert_eq!(image.pixels[8], Pixel::gray(0)); // second byte, MSB
        assert_eq!(image.pixels[9 + 7], Pixel::gray(0));
        assert_eq!(image.pixels[9 + 8], Pixel::gray(255));
    }

    #[test]
    fn rejects_bad_magic() {
        assert_eq!(decode(b"P7\n1 1\n255\nxxx").unwrap_err(), PnmError::BadMagic);
        assert_eq!(decode(b"GIF89a").unwrap_err(), PnmError::BadMagic);
    }

    #[test]
    fn rejects_zero_dimensions() {
        assert_eq!(
            decode(b"P5\n0 4\n255\n").unwrap_err(),
            PnmError::ZeroDimension
        );
    }

    #[test]
    fn rejects_truncated_data() {
        assert_eq!(
            decode(b"P6\n2 2\n255\n\x01\x02\x03").unwrap_err(),
            PnmError::TruncatedData
        );
    }

    #[test]
    fn rejects_truncated_header() {
        assert_eq!(decode(b"P6\n2 ").unwrap_err(), PnmError::TruncatedHeader);
    }

    #[test]
    fn maxval_is_ignored() {
        let bright: Vec<u8> = b"P5\n1 1\n15\n\x0f".to_vec();
        let image = decode(&bright).unwrap();
        assert_eq!(image.pixels[0], Pixel::gray(15));
    }
}
