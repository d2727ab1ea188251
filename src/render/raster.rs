//! Rasterizer for draw commands.
//!
//! Each terminal cell holds two square-ish pixels stacked vertically (drawn
//! with an upper half block), so a `cols x rows` area gives a
//! `cols x rows*2` pixel grid. The field is scaled uniformly to fit.

use super::{Align, DrawCommand};
use crate::constants::{FIELD_HEIGHT, FIELD_WIDTH};
use crate::themes::{Rgb, BLACK};

/// Text placed on a terminal cell grid after the pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub col: u16,
    pub row: u16,
    pub text: String,
    pub color: Rgb,
    pub bold: bool,
}

#[derive(Debug, Clone)]
pub struct PixelCanvas {
    pub width: usize,
    pub height: usize,
    /// Pixels per field unit.
    pub scale: f64,
    pixels: Vec<Rgb>,
    pub labels: Vec<Label>,
}

impl PixelCanvas {
    fn new(width: usize, height: usize, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
            pixels: vec![BLACK; width * height],
            labels: Vec::new(),
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Rgb {
        self.pixels[y * self.width + x]
    }

    fn set(&mut self, x: usize, y: usize, color: Rgb) {
        self.pixels[y * self.width + x] = color;
    }

    pub fn cols(&self) -> u16 {
        self.width as u16
    }

    pub fn rows(&self) -> u16 {
        (self.height / 2) as u16
    }

    /// Top and bottom pixel of a cell.
    pub fn cell(&self, col: u16, row: u16) -> (Rgb, Rgb) {
        let x = col as usize;
        let y = row as usize * 2;
        (self.pixel(x, y), self.pixel(x, y + 1))
    }

    /// Field coordinate sampled by a pixel (its center).
    fn sample(&self, px: usize, py: usize) -> (f64, f64) {
        ((px as f64 + 0.5) / self.scale, (py as f64 + 0.5) / self.scale)
    }

    /// Pixel index range covering `[start, end)` in field units.
    fn span(&self, start: f64, end: f64, limit: usize) -> std::ops::Range<usize> {
        let lo = (start * self.scale).floor().max(0.0) as usize;
        let hi = ((end * self.scale).ceil().max(0.0) as usize).min(limit);
        lo.min(hi)..hi
    }

    /// Paint the pixel under a field point, if it is on the canvas.
    fn plot(&mut self, x: f64, y: f64, color: Rgb) {
        if x < 0.0 || y < 0.0 {
            return;
        }
        let px = (x * self.scale) as usize;
        let py = (y * self.scale) as usize;
        if px < self.width && py < self.height {
            self.set(px, py, color);
        }
    }

    fn fill_rect(&mut self, rect: &crate::game::Rect, color: Rgb) {
        let mut hit = false;
        for py in self.span(rect.y, rect.y + rect.height, self.height) {
            for px in self.span(rect.x, rect.x + rect.width, self.width) {
                let (sx, sy) = self.sample(px, py);
                if rect.contains(sx, sy) {
                    self.set(px, py, color);
                    hit = true;
                }
            }
        }
        // Shapes smaller than a pixel still show up.
        if !hit {
            let (cx, cy) = rect.center();
            self.plot(cx, cy, color);
        }
    }

    fn fill_circle(&mut self, cx: f64, cy: f64, radius: f64, color: Rgb) {
        let mut hit = false;
        for py in self.span(cy - radius, cy + radius, self.height) {
            for px in self.span(cx - radius, cx + radius, self.width) {
                let (sx, sy) = self.sample(px, py);
                if (sx - cx).powi(2) + (sy - cy).powi(2) <= radius * radius {
                    self.set(px, py, color);
                    hit = true;
                }
            }
        }
        if !hit {
            self.plot(cx, cy, color);
        }
    }

    fn shade(&mut self, color: Rgb, alpha: f64) {
        for pixel in &mut self.pixels {
            *pixel = pixel.blend(color, alpha);
        }
    }

    fn place_text(&mut self, x: f64, y: f64, text: &str, color: Rgb, align: Align, bold: bool) {
        let rows = self.rows();
        let cols = self.cols();
        if rows == 0 || cols == 0 {
            return;
        }
        let row = ((y * self.scale) / 2.0).floor().max(0.0) as u16;
        if row >= rows {
            return;
        }
        let anchor = (x * self.scale).round().max(0.0) as i64;
        let len = text.chars().count() as i64;
        let start = match align {
            Align::Left => anchor,
            Align::Center => anchor - len / 2,
        };
        let col = start.clamp(0, cols.saturating_sub(1) as i64) as u16;
        self.labels.push(Label {
            col,
            row,
            text: text.to_string(),
            color,
            bold,
        });
    }
}

/// Scale factor that fits the field into `cols x rows` cells.
pub fn fit_scale(cols: u16, rows: u16) -> f64 {
    let sx = cols as f64 / FIELD_WIDTH;
    let sy = rows as f64 * 2.0 / FIELD_HEIGHT;
    sx.min(sy)
}

pub fn rasterize(commands: &[DrawCommand], cols: u16, rows: u16) -> PixelCanvas {
    let scale = fit_scale(cols, rows);
    let width = ((FIELD_WIDTH * scale).floor() as usize).min(cols as usize);
    let mut height = (FIELD_HEIGHT * scale).floor() as usize;
    height += height % 2;
    let height = height.min(rows as usize * 2);

    let mut canvas = PixelCanvas::new(width, height, scale);
    if width == 0 || height == 0 {
        return canvas;
    }

    for command in commands {
        match command {
            DrawCommand::FillRect { rect, color } => canvas.fill_rect(rect, *color),
            DrawCommand::FillCircle {
                cx,
                cy,
                radius,
                color,
            } => canvas.fill_circle(*cx, *cy, *radius, *color),
            DrawCommand::Shade { color, alpha } => canvas.shade(*color, *alpha),
            DrawCommand::Text {
                x,
                y,
                text,
                color,
                align,
                bold,
            } => canvas.place_text(*x, *y, text, *color, *align, *bold),
        }
    }

    canvas
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::themes::WHITE;

    const RED: Rgb = Rgb::new(255, 0, 0);

    #[test]
    fn test_fit_scale_uses_tighter_axis() {
        // 40 cols -> 0.1 per unit horizontally; 60 rows -> 0.2 vertically.
        assert_eq!(fit_scale(40, 60), 0.1);
        // 200 cols -> 0.5; 30 rows -> 0.1.
        assert_eq!(fit_scale(200, 30), 0.1);
    }

    #[test]
    fn test_canvas_dimensions() {
        let canvas = rasterize(&[], 40, 30);
        assert_eq!(canvas.width, 40);
        assert_eq!(canvas.height, 60);
        assert_eq!(canvas.rows(), 30);
    }

    #[test]
    fn test_full_rect_fills_everything() {
        let commands = [DrawCommand::rect(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT, RED)];
        let canvas = rasterize(&commands, 40, 30);
        assert_eq!(canvas.cell(0, 0), (RED, RED));
        assert_eq!(canvas.cell(39, 29), (RED, RED));
    }

    #[test]
    fn test_later_commands_paint_over() {
        let commands = [
            DrawCommand::rect(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT, RED),
            DrawCommand::rect(0.0, 0.0, 200.0, 600.0, WHITE),
        ];
        let canvas = rasterize(&commands, 40, 30);
        assert_eq!(canvas.pixel(0, 0), WHITE);
        assert_eq!(canvas.pixel(39, 0), RED);
    }

    #[test]
    fn test_tiny_rect_still_visible() {
        let commands = [DrawCommand::rect(105.0, 105.0, 1.0, 1.0, RED)];
        let canvas = rasterize(&commands, 40, 30);
        assert_eq!(canvas.pixel(10, 10), RED);
    }

    #[test]
    fn test_shade_blends_existing_pixels() {
        let commands = [
            DrawCommand::rect(0.0, 0.0, FIELD_WIDTH, FIELD_HEIGHT, WHITE),
            DrawCommand::Shade {
                color: BLACK,
                alpha: 0.5,
            },
        ];
        let canvas = rasterize(&commands, 40, 30);
        assert_eq!(canvas.pixel(5, 5), Rgb::new(128, 128, 128));
    }

    #[test]
    fn test_centered_label_position() {
        let commands = [DrawCommand::text(200.0, 300.0, "abcd", WHITE, Align::Center)];
        let canvas = rasterize(&commands, 40, 30);
        assert_eq!(canvas.labels.len(), 1);
        let label = &canvas.labels[0];
        assert_eq!(label.col, 18);
        assert_eq!(label.row, 15);
    }

    #[test]
    fn test_zero_area_is_empty() {
        let commands = [DrawCommand::rect(0.0, 0.0, 10.0, 10.0, RED)];
        let canvas = rasterize(&commands, 0, 0);
        assert_eq!(canvas.width, 0);
        assert!(canvas.labels.is_empty());
    }
}
