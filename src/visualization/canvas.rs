//! Raster canvas with rectangles, lines and a 5x7 bitmap font

use crate::error::Result;
use image::{Rgb, RgbImage};
use std::path::Path;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([20, 20, 20]);
pub const GRID: Rgb<u8> = Rgb([200, 200, 200]);

const GLYPH_W: u32 = 5;
const GLYPH_H: u32 = 7;

/// Rows of a 5x7 glyph, bit 4 is the leftmost column. Text is drawn in
/// upper case; unknown characters render blank.
fn glyph(c: char) -> [u8; 7] {
    match c.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0F],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x11, 0x19, 0x15, 0x13, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x11, 0x0A, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '-' => [0x00, 0x00, 0x00, 0x1F, 0x00, 0x00, 0x00],
        ':' => [0x00, 0x0C, 0x0C, 0x00, 0x0C, 0x0C, 0x00],
        '/' => [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10],
        '(' => [0x02, 0x04, 0x08, 0x08, 0x08, 0x04, 0x02],
        ')' => [0x08, 0x04, 0x02, 0x02, 0x02, 0x04, 0x08],
        _ => [0; 7],
    }
}

/// Width in pixels of `text` at the given scale
pub fn text_width(text: &str, scale: u32) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        0
    } else {
        (n * (GLYPH_W + 1) - 1) * scale
    }
}

/// Height in pixels of one text line at the given scale
pub fn text_height(scale: u32) -> u32 {
    GLYPH_H * scale
}

/// RGB drawing surface; coordinates outside the image are clipped
pub struct Canvas {
    img: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            img: RgbImage::from_pixel(width, height, WHITE),
        }
    }

    pub fn width(&self) -> u32 {
        self.img.width()
    }

    pub fn height(&self) -> u32 {
        self.img.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgb<u8> {
        *self.img.get_pixel(x, y)
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb<u8>) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            self.img.put_pixel(x as u32, y as u32, color);
        }
    }

    fn blend(&mut self, x: i64, y: i64, color: Rgb<u8>, alpha: f64) {
        if x >= 0 && y >= 0 && (x as u32) < self.img.width() && (y as u32) < self.img.height() {
            let base = *self.img.get_pixel(x as u32, y as u32);
            let mix = |b: u8, c: u8| (b as f64 * (1.0 - alpha) + c as f64 * alpha).round() as u8;
            self.img.put_pixel(
                x as u32,
                y as u32,
                Rgb([mix(base[0], color[0]), mix(base[1], color[1]), mix(base[2], color[2])]),
            );
        }
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                self.put(x + dx, y + dy, color);
            }
        }
    }

    /// Fill with `color` at the given opacity over what is already drawn
    pub fn blend_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>, alpha: f64) {
        let alpha = alpha.clamp(0.0, 1.0);
        for dy in 0..h as i64 {
            for dx in 0..w as i64 {
                self.blend(x + dx, y + dy, color, alpha);
            }
        }
    }

    pub fn stroke_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb<u8>) {
        let (w, h) = (w as i64, h as i64);
        self.line(x, y, x + w - 1, y, color, 1);
        self.line(x, y + h - 1, x + w - 1, y + h - 1, color, 1);
        self.line(x, y, x, y + h - 1, color, 1);
        self.line(x + w - 1, y, x + w - 1, y + h - 1, color, 1);
    }

    /// Bresenham line, `thickness` pixels wide
    pub fn line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, color: Rgb<u8>, thickness: u32) {
        let (mut x, mut y) = (x0, y0);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let half = thickness as i64 / 2;

        loop {
            for ox in -half..=half {
                for oy in -half..=half {
                    self.put(x + ox, y + oy, color);
                }
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Connect consecutive points
    pub fn polyline(&mut self, points: &[(i64, i64)], color: Rgb<u8>, thickness: u32) {
        for pair in points.windows(2) {
            self.line(pair[0].0, pair[0].1, pair[1].0, pair[1].1, color, thickness);
        }
    }

    /// Draw text with its top-left corner at (x, y)
    pub fn text(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let s = scale as i64;
        for (i, c) in text.chars().enumerate() {
            let origin = x + i as i64 * (GLYPH_W as i64 + 1) * s;
            for (row, bits) in glyph(c).iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                        self.fill_rect(
                            origin + col as i64 * s,
                            y + row as i64 * s,
                            scale,
                            scale,
                            color,
                        );
                    }
                }
            }
        }
    }

    /// Draw text horizontally centered on `cx`
    pub fn text_centered(&mut self, cx: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let x = cx - text_width(text, scale) as i64 / 2;
        self.text(x, y, text, scale, color);
    }

    /// Draw text right-aligned so it ends at `right`
    pub fn text_right(&mut self, right: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let x = right - text_width(text, scale) as i64;
        self.text(x, y, text, scale, color);
    }

    /// Draw text with one character per line, top to bottom
    pub fn text_vertical(&mut self, x: i64, y: i64, text: &str, scale: u32, color: Rgb<u8>) {
        let step = (GLYPH_H as i64 + 1) * scale as i64;
        for (i, c) in text.chars().enumerate() {
            self.text(x, y + i as i64 * step, &c.to_string(), scale, color);
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        self.img.save(path.as_ref())?;
        Ok(())
    }
}

/// Linear interpolation between colormap anchors, `t` clamped to [0, 1]
fn interpolate(anchors: &[(f64, [u8; 3])], t: f64) -> Rgb<u8> {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    for pair in anchors.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = if t1 > t0 { (t - t0) / (t1 - t0) } else { 0.0 };
            let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * f).round() as u8;
            return Rgb([lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])]);
        }
    }
    let last = anchors[anchors.len() - 1].1;
    Rgb(last)
}

/// Sequential white-to-blue map
pub fn blues(t: f64) -> Rgb<u8> {
    interpolate(
        &[
            (0.0, [247, 251, 255]),
            (0.25, [198, 219, 239]),
            (0.5, [107, 174, 214]),
            (0.75, [33, 113, 181]),
            (1.0, [8, 48, 107]),
        ],
        t,
    )
}

/// Diverging blue-white-red map
pub fn coolwarm(t: f64) -> Rgb<u8> {
    interpolate(
        &[
            (0.0, [59, 76, 192]),
            (0.25, [141, 176, 254]),
            (0.5, [221, 221, 221]),
            (0.75, [244, 154, 123]),
            (1.0, [180, 4, 38]),
        ],
        t,
    )
}

/// Perceived brightness, used to pick readable annotation colors
pub fn is_dark(color: Rgb<u8>) -> bool {
    let l = 0.299 * color[0] as f64 + 0.587 * color[1] as f64 + 0.114 * color[2] as f64;
    l < 128.0
}
