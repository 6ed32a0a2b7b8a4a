use log::warn;

use crate::capture::PixelFrame;

use super::font;

/// Paintable RGBA surface the overlay is drawn into. All primitives are
/// bounds-checked; drawing off the edge is silently clipped.
#[derive(Debug, Clone)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; (width as usize) * (height as usize) * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Resizes to the given dimensions, clearing the contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width != width || self.height != height {
            *self = Self::new(width, height);
        }
    }

    /// Copies a video frame over the whole canvas, resizing to match it.
    pub fn paint_frame(&mut self, frame: &PixelFrame) {
        let expected = (frame.width as usize) * (frame.height as usize) * 4;
        if frame.rgba.len() != expected {
            warn!(
                "frame buffer size {} does not match {}x{}, skipping paint",
                frame.rgba.len(),
                frame.width,
                frame.height
            );
            return;
        }
        self.resize(frame.width, frame.height);
        self.pixels.copy_from_slice(&frame.rgba);
    }

    pub fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if x < 0 || y < 0 {
            return;
        }
        let (ux, uy) = (x as u32, y as u32);
        if ux >= self.width || uy >= self.height {
            return;
        }
        let idx = ((uy * self.width + ux) as usize) * 4;
        self.pixels[idx..idx + 4].copy_from_slice(&color);
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) as usize) * 4;
        let mut out = [0u8; 4];
        out.copy_from_slice(&self.pixels[idx..idx + 4]);
        Some(out)
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: [u8; 4]) {
        for dy in 0..h {
            for dx in 0..w {
                self.put_pixel(x + dx, y + dy, color);
            }
        }
    }

    /// Bresenham segment with a diamond brush for thickness.
    pub fn draw_line(&mut self, p0: (i32, i32), p1: (i32, i32), color: [u8; 4], thickness: i32) {
        let (mut x0, mut y0) = p0;
        let (x1, y1) = p1;
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        let radius = (thickness.max(1) - 1) / 2;

        loop {
            self.put_pixel(x0, y0, color);
            for ox in -radius..=radius {
                for oy in -radius..=radius {
                    if (ox != 0 || oy != 0) && ox.abs() + oy.abs() <= radius {
                        self.put_pixel(x0 + ox, y0 + oy, color);
                    }
                }
            }
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    pub fn fill_circle(&mut self, center: (i32, i32), radius: i32, color: [u8; 4]) {
        let (cx, cy) = center;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy <= radius * radius {
                    self.put_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// One-pixel ring at the given radius.
    pub fn stroke_circle(&mut self, center: (i32, i32), radius: i32, color: [u8; 4]) {
        let (cx, cy) = center;
        let outer = radius * radius;
        let inner = (radius - 1) * (radius - 1);
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let d2 = dx * dx + dy * dy;
                if d2 <= outer && d2 > inner {
                    self.put_pixel(cx + dx, cy + dy, color);
                }
            }
        }
    }

    /// Draws uppercase bitmap text; characters without a glyph render as
    /// blanks. `scale` multiplies the 5x7 glyph cell.
    pub fn draw_text(&mut self, x: i32, y: i32, text: &str, color: [u8; 4], scale: i32) {
        let scale = scale.max(1);
        let mut pen_x = x;
        for ch in text.chars() {
            if let Some(rows) = font::glyph(ch.to_ascii_uppercase()) {
                for (row, bits) in rows.iter().enumerate() {
                    for col in 0..font::GLYPH_WIDTH {
                        if bits & (1 << (font::GLYPH_WIDTH - 1 - col)) != 0 {
                            for sy in 0..scale {
                                for sx in 0..scale {
                                    self.put_pixel(
                                        pen_x + (col as i32) * scale + sx,
                                        y + (row as i32) * scale + sy,
                                        color,
                                    );
                                }
                            }
                        }
                    }
                }
            }
            pen_x += ((font::GLYPH_WIDTH as i32) + 1) * scale;
        }
    }
}
