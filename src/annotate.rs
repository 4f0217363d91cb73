//! Failure screenshot banner.
//!
//! Prepends a strip with the check label drawn in font8x8 glyphs so a
//! screenshot still says which check it belongs to once it is copied out of
//! the run directory.

use font8x8::{BASIC_FONTS, UnicodeFonts};
use image::{GenericImage, ImageBuffer, Rgb, RgbImage};
use std::io::Cursor;

/// Glyph edge in pixels
const GLYPH: u32 = 8;
const PADDING: u32 = 6;
const BANNER_HEIGHT: u32 = GLYPH + 2 * PADDING;

const FAIL_BG: [u8; 3] = [153, 27, 27];
const TEXT_FG: [u8; 3] = [255, 255, 255];

/// Draw a banner above the screenshot; undecodable input is returned as is
pub fn annotate_png(png: &[u8], label: &str) -> Vec<u8> {
    match try_annotate(png, label) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "could not annotate screenshot, keeping original");
            png.to_vec()
        }
    }
}

fn try_annotate(png: &[u8], label: &str) -> image::ImageResult<Vec<u8>> {
    let shot = image::load_from_memory(png)?.to_rgb8();
    let width = shot.width();
    let mut canvas: RgbImage =
        ImageBuffer::from_pixel(width, shot.height() + BANNER_HEIGHT, Rgb(FAIL_BG));
    canvas.copy_from(&shot, 0, BANNER_HEIGHT)?;
    draw_text(&mut canvas, PADDING, PADDING, label, TEXT_FG, FAIL_BG);

    let mut bytes = Vec::new();
    canvas.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
    Ok(bytes)
}

/// Draw text using font8x8 glyphs; text does not wrap
fn draw_text(img: &mut RgbImage, x: u32, y: u32, text: &str, fg: [u8; 3], bg: [u8; 3]) {
    let mut cursor_x = x;
    for ch in text.chars() {
        if cursor_x + GLYPH > img.width() {
            break;
        }
        draw_char(img, cursor_x, y, ch, fg, bg);
        cursor_x += GLYPH;
    }
}

fn draw_char(img: &mut RgbImage, x: u32, y: u32, ch: char, fg: [u8; 3], bg: [u8; 3]) {
    // Non-ASCII characters render as '?'
    let glyph = BASIC_FONTS
        .get(ch)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0u8; 8]);
    for (row_idx, row) in glyph.iter().enumerate() {
        let py = y + row_idx as u32;
        if py >= img.height() {
            break;
        }
        for bit in 0..GLYPH {
            let px = x + bit;
            if px >= img.width() {
                break;
            }
            // font8x8 stores LSB as leftmost pixel
            let color = if (row >> bit) & 1 == 1 { fg } else { bg };
            img.put_pixel(px, py, Rgb(color));
        }
    }
}
