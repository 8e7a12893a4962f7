//! Minimal 2D drawing into RGBA buffers: blended fills, strokes and text

use std::sync::OnceLock;

use glam::Vec2;
use image::{Rgba, RgbaImage};

use super::MirrorError;

/// Opaque colour from 0xRRGGBB
pub fn rgb(hex: u32) -> Rgba<u8> {
    rgba(hex, 255)
}

/// Colour from 0xRRGGBB plus alpha
pub fn rgba(hex: u32, alpha: u8) -> Rgba<u8> {
    Rgba([(hex >> 16) as u8, (hex >> 8) as u8, hex as u8, alpha])
}

/// Glyph rasterizer over the proportional font bundled with egui
pub struct TextRasterizer {
    font: fontdue::Font,
}

impl std::fmt::Debug for TextRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRasterizer").finish_non_exhaustive()
    }
}

impl TextRasterizer {
    /// Load egui's default proportional font
    pub fn bundled() -> Result<Self, MirrorError> {
        let definitions = egui::FontDefinitions::default();
        let name = definitions
            .families
            .get(&egui::FontFamily::Proportional)
            .and_then(|names| names.first())
            .ok_or_else(|| MirrorError::FontUnavailable("no proportional family".into()))?;
        let data = definitions
            .font_data
            .get(name)
            .ok_or_else(|| MirrorError::FontUnavailable(format!("missing font data {name}")))?;
        let font = fontdue::Font::from_bytes(data.font.as_ref(), fontdue::FontSettings::default())
            .map_err(|e| MirrorError::FontUnavailable(e.to_string()))?;
        Ok(Self { font })
    }

    /// Process-wide instance, loaded on first use; `None` if loading failed
    pub fn shared() -> Option<&'static TextRasterizer> {
        static SHARED: OnceLock<Option<TextRasterizer>> = OnceLock::new();
        SHARED
            .get_or_init(|| match Self::bundled() {
                Ok(text) => Some(text),
                Err(e) => {
                    log::warn!("Text rendering disabled: {e}");
                    None
                }
            })
            .as_ref()
    }

    /// Horizontal advance of `text` at `px` pixels
    pub fn measure(&self, text: &str, px: f32) -> f32 {
        text.chars()
            .map(|c| self.font.metrics(c, px).advance_width)
            .sum()
    }
}

/// Drawing surface over a borrowed image buffer
pub struct Canvas<'a> {
    image: &'a mut RgbaImage,
}

impl<'a> Canvas<'a> {
    pub fn new(image: &'a mut RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Replace every pixel
    pub fn clear(&mut self, color: Rgba<u8>) {
        for pixel in self.image.pixels_mut() {
            *pixel = color;
        }
    }

    /// Source-over blend `color` at `coverage` into one pixel; out-of-bounds writes are dropped
    fn blend(&mut self, x: i64, y: i64, color: Rgba<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.image.width() as i64 || y >= self.image.height() as i64 {
            return;
        }
        let alpha = color[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let dst = self.image.get_pixel_mut(x as u32, y as u32);
        for c in 0..3 {
            dst[c] = (color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha)).round() as u8;
        }
        dst[3] = ((alpha + dst[3] as f32 / 255.0 * (1.0 - alpha)) * 255.0).round() as u8;
    }

    pub fn fill_rect(&mut self, x: i64, y: i64, width: i64, height: i64, color: Rgba<u8>) {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.image.width() as i64);
        let y1 = (y + height).min(self.image.height() as i64);
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend(px, py, color, 1.0);
            }
        }
    }

    /// Anti-aliased disc
    pub fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba<u8>) {
        let (x0, x1) = ((center.x - radius).floor() as i64, (center.x + radius).ceil() as i64);
        let (y0, y1) = ((center.y - radius).floor() as i64, (center.y + radius).ceil() as i64);
        for py in y0..=y1 {
            for px in x0..=x1 {
                let d = (Vec2::new(px as f32 + 0.5, py as f32 + 0.5) - center).length();
                self.blend(px, py, color, radius + 0.5 - d);
            }
        }
    }

    /// Filled triangle, sampled at pixel centres
    pub fn fill_triangle(&mut self, points: [Vec2; 3], color: Rgba<u8>) {
        let [a, b, c] = points;
        let edge = |p: Vec2, q: Vec2, r: Vec2| (q - p).perp_dot(r - p);
        let area = edge(a, b, c);
        if area.abs() < f32::EPSILON {
            return;
        }
        let min = a.min(b).min(c).floor();
        let max = a.max(b).max(c).ceil();
        for py in min.y as i64..max.y as i64 {
            for px in min.x as i64..max.x as i64 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let w = [edge(b, c, p), edge(c, a, p), edge(a, b, p)];
                if w.iter().all(|w| w * area.signum() >= 0.0) {
                    self.blend(px, py, color, 1.0);
                }
            }
        }
    }

    /// Rectangle with circular corners of `radius`
    pub fn fill_rounded_rect(&mut self, min: Vec2, size: Vec2, radius: f32, color: Rgba<u8>) {
        let radius = radius.min(size.x / 2.0).min(size.y / 2.0);
        let inner_min = min + Vec2::splat(radius);
        let inner_max = min + size - Vec2::splat(radius);
        for py in min.y.floor() as i64..(min.y + size.y).ceil() as i64 {
            for px in min.x.floor() as i64..(min.x + size.x).ceil() as i64 {
                let p = Vec2::new(px as f32 + 0.5, py as f32 + 0.5);
                let nearest = p.clamp(inner_min, inner_max);
                self.blend(px, py, color, radius + 0.5 - (p - nearest).length());
            }
        }
    }

    /// Cubic Bézier stroke of the given width
    pub fn stroke_bezier(&mut self, control: [Vec2; 4], width: f32, color: Rgba<u8>) {
        const STEPS: usize = 96;
        let [p0, p1, p2, p3] = control;
        let point = |t: f32| {
            let u = 1.0 - t;
            p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
        };
        let radius = width / 2.0;
        let mut previous = point(0.0);
        for step in 1..=STEPS {
            let next = point(step as f32 / STEPS as f32);
            let samples = ((next - previous).length() / radius.max(0.5)).ceil().max(1.0) as usize;
            for s in 0..samples {
                let p = previous.lerp(next, s as f32 / samples as f32);
                self.fill_circle(p, radius, color);
            }
            previous = next;
        }
    }

    /// Draw a line of text centred on `center_x` with its baseline at `baseline`
    ///
    /// `bold` fakes a heavier weight by drawing the glyphs twice with a one pixel offset.
    pub fn draw_text_centered(
        &mut self,
        text: &TextRasterizer,
        line: &str,
        px: f32,
        center_x: f32,
        baseline: f32,
        color: Rgba<u8>,
        bold: bool,
    ) {
        let start = center_x - text.measure(line, px) / 2.0;
        let passes: &[f32] = if bold { &[0.0, 1.0] } else { &[0.0] };
        for &offset in passes {
            let mut pen = start + offset;
            for ch in line.chars() {
                let (metrics, coverage) = text.font.rasterize(ch, px);
                let left = (pen + metrics.xmin as f32).round() as i64;
                let top = (baseline - (metrics.height as i32 + metrics.ymin) as f32).round() as i64;
                for row in 0..metrics.height {
                    for col in 0..metrics.width {
                        let value = coverage[row * metrics.width + col];
                        if value > 0 {
                            self.blend(
                                left + col as i64,
                                top + row as i64,
                                color,
                                value as f32 / 255.0,
                            );
                        }
                    }
                }
                pen += metrics.advance_width;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_are_clipped_to_the_buffer() {
        let mut image = RgbaImage::new(8, 8);
        let mut canvas = Canvas::new(&mut image);
        canvas.fill_rect(-4, -4, 6, 6, rgb(0xff0000));
        assert_eq!(image.get_pixel(1, 1).0, [255, 0, 0, 255]);
        assert_eq!(image.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn translucent_circle_blends_over_black() {
        let mut image = RgbaImage::from_pixel(16, 16, rgb(0x000000));
        Canvas::new(&mut image).fill_circle(Vec2::splat(8.0), 4.0, rgba(0xffffff, 204));
        let centre = image.get_pixel(8, 8);
        assert_eq!(centre[0], 204);
        assert_eq!(centre[3], 255);
        assert_eq!(image.get_pixel(0, 0).0, [0, 0, 0, 255]);
    }

    #[test]
    fn triangle_winding_does_not_matter() {
        let mut image = RgbaImage::new(10, 10);
        let points = [Vec2::new(1.0, 1.0), Vec2::new(1.0, 9.0), Vec2::new(9.0, 5.0)];
        Canvas::new(&mut image).fill_triangle(points, rgb(0xff0000));
        let mut reversed = RgbaImage::new(10, 10);
        Canvas::new(&mut reversed).fill_triangle([points[2], points[1], points[0]], rgb(0xff0000));
        assert_eq!(image, reversed);
        assert_eq!(image.get_pixel(3, 5)[0], 255);
    }

    #[test]
    fn bundled_font_draws_text() {
        let text = TextRasterizer::shared().expect("egui ships a proportional font");
        assert!(text.measure("Voice Assistant", 28.0) > 100.0);

        let mut image = RgbaImage::from_pixel(200, 40, rgb(0x000000));
        Canvas::new(&mut image).draw_text_centered(
            text,
            "Hi",
            24.0,
            100.0,
            30.0,
            rgb(0xffffff),
            true,
        );
        assert!(image.pixels().any(|p| p[0] > 128));
    }
}
