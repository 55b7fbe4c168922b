//! Numeric labels drawn over leveled tiles.
//!
//! `format` squeezes a value into a handful of characters using the
//! w / e / z / j / g (1e4 … 1e20) unit suffixes; `draw_label` paints it
//! with a tiny built-in 5×7 bitmap font.

use image::{Rgba, RgbaImage};

const UNITS: [(f64, &str); 5] = [
    (1e4, "w"),
    (1e8, "e"),
    (1e12, "z"),
    (1e16, "j"),
    (1e20, "g"),
];

/// Short human readable form of `x`, at most 5 significant characters
/// plus sign and unit where that is possible.
pub fn format(x: f64) -> String {
    let mut digits: i32 = 5;
    let x = x.trunc();
    if !x.is_finite() {
        return "???".to_string();
    }
    // beyond this even the largest unit loses precision
    if x.abs() > 1e20 * 10f64.powi(digits - 2) {
        return exponential(x);
    }

    let sign = if x < 0.0 { "-" } else { "" };
    if x < 0.0 {
        digits -= 1;
    }
    let x = x.abs();
    if x < 10f64.powi(digits) {
        return format!("{sign}{}", x as u64);
    }

    let width = digits as usize;
    for (val, suffix) in UNITS {
        let scaled = format!("{:.*}", width, x / val);
        let head = &scaled[..width.min(scaled.len())];
        if !head.contains('.') {
            continue;
        }
        let bytes = head.as_bytes();
        let n = head.len();
        let cut = if n >= 2 && bytes[n - 2] == b'.' { n - 2 } else { n - 1 };
        return format!("{sign}{}{suffix}", &head[..cut]);
    }
    format!("{sign}{}", exponential(x))
}

/// Exponential notation with an integer mantissa, `1e+25` style.
fn exponential(x: f64) -> String {
    let s = format!("{x:.0e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

// ─────────────────────────────────────────────────────
// Bitmap text
// ─────────────────────────────────────────────────────

pub const GLYPH_WIDTH: i32 = 5;
pub const GLYPH_HEIGHT: i32 = 7;
const ADVANCE: i32 = GLYPH_WIDTH + 1;

const FILL: Rgba<u8> = Rgba([255, 255, 255, 255]);
const OUTLINE: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Draw `text` left-aligned with its bottom edge (outline included) on
/// `bottom`, never touching pixels outside `left .. left + max_width`.
pub fn draw_label(image: &mut RgbaImage, left: i32, bottom: i32, text: &str, max_width: i32) {
    let clip = (left, left + max_width);
    let x = left + 1;
    let top = bottom - GLYPH_HEIGHT - 1;

    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx != 0 || dy != 0 {
                draw_text(image, x + dx, top + dy, text, OUTLINE, clip);
            }
        }
    }
    draw_text(image, x, top, text, FILL, clip);
}

fn draw_text(
    image: &mut RgbaImage,
    mut x: i32,
    top: i32,
    text: &str,
    color: Rgba<u8>,
    clip: (i32, i32),
) {
    let (width, height) = (image.width() as i32, image.height() as i32);
    for ch in text.chars() {
        if let Some(glyph) = glyph_bits(ch) {
            for (row, pattern) in glyph.iter().enumerate() {
                let py = top + row as i32;
                if py < 0 || py >= height {
                    continue;
                }
                for col in 0..GLYPH_WIDTH {
                    if (pattern >> (GLYPH_WIDTH - 1 - col)) & 1 == 0 {
                        continue;
                    }
                    let px = x + col;
                    if px >= clip.0 && px < clip.1 && px >= 0 && px < width {
                        image.put_pixel(px as u32, py as u32, color);
                    }
                }
            }
        }
        x += ADVANCE;
    }
}

fn glyph_bits(ch: char) -> Option<[u8; 7]> {
    match ch {
        '0' => Some([
            0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110,
        ]),
        '1' => Some([
            0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110,
        ]),
        '2' => Some([
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111,
        ]),
        '3' => Some([
            0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110,
        ]),
        '4' => Some([
            0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010,
        ]),
        '5' => Some([
            0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110,
        ]),
        '6' => Some([
            0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110,
        ]),
        '7' => Some([
            0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000,
        ]),
        '8' => Some([
            0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110,
        ]),
        '9' => Some([
            0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100,
        ]),
        'w' => Some([
            0b00000, 0b00000, 0b10001, 0b10001, 0b10101, 0b10101, 0b01010,
        ]),
        'e' => Some([
            0b00000, 0b00000, 0b01110, 0b10001, 0b11111, 0b10000, 0b01110,
        ]),
        'z' => Some([
            0b00000, 0b00000, 0b11111, 0b00010, 0b00100, 0b01000, 0b11111,
        ]),
        'j' => Some([
            0b00010, 0b00000, 0b00110, 0b00010, 0b00010, 0b10010, 0b01100,
        ]),
        'g' => Some([
            0b00000, 0b01111, 0b10001, 0b10001, 0b01111, 0b00001, 0b01110,
        ]),
        '?' => Some([
            0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b00000, 0b00100,
        ]),
        '+' => Some([0, 0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0]),
        '-' => Some([0, 0, 0, 0b11111, 0, 0, 0]),
        '.' => Some([0, 0, 0, 0, 0, 0b00110, 0b00110]),
        ' ' => Some([0, 0, 0, 0, 0, 0, 0]),
        _ => None,
    }
}
