// Drawing primitives shared by every card.
//
// imageproc's draw_* functions overwrite pixels; anything translucent goes
// through `blend_*` instead, which composites with `Pixel::blend`.

use ab_glyph::{FontVec, PxScale};
use image::imageops::{self, FilterType};
use image::{ImageFormat, Pixel, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use std::io::Cursor;

use super::VisualError;

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    #[cfg(test)]
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.image.get_pixel(x, y)
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
        if width == 0 || height == 0 {
            return;
        }
        draw_filled_rect_mut(&mut self.image, Rect::at(x, y).of_size(width, height), color);
    }

    /// Composite `color` over every pixel of the rectangle, clipped to the canvas.
    pub fn blend_rect(&mut self, x: i32, y: i32, width: u32, height: u32, color: Rgba<u8>) {
        let x0 = x.max(0) as u32;
        let y0 = y.max(0) as u32;
        let x1 = (x + width as i32).clamp(0, self.width() as i32) as u32;
        let y1 = (y + height as i32).clamp(0, self.height() as i32) as u32;

        for py in y0..y1 {
            for px in x0..x1 {
                self.image.get_pixel_mut(px, py).blend(&color);
            }
        }
    }

    /// Translucent rectangle outline `thickness` pixels wide, drawn inward.
    pub fn blend_outline(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        thickness: u32,
        color: Rgba<u8>,
    ) {
        let t = thickness.min(width / 2).min(height / 2).max(1);
        let inner_h = height.saturating_sub(2 * t);
        self.blend_rect(x, y, width, t, color);
        self.blend_rect(x, y + (height - t) as i32, width, t, color);
        self.blend_rect(x, y + t as i32, t, inner_h, color);
        self.blend_rect(x + (width - t) as i32, y + t as i32, t, inner_h, color);
    }

    /// Darken (or tint) the whole canvas.
    pub fn veil(&mut self, color: Rgba<u8>) {
        let (w, h) = (self.width(), self.height());
        self.blend_rect(0, 0, w, h, color);
    }

    pub fn fill_rounded_rect(
        &mut self,
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        radius: u32,
        color: Rgba<u8>,
    ) {
        let r = radius.min(width / 2).min(height / 2);
        if r == 0 {
            self.fill_rect(x, y, width, height, color);
            return;
        }

        let ri = r as i32;
        self.fill_rect(x + ri, y, width - 2 * r, height, color);
        self.fill_rect(x, y + ri, width, height - 2 * r, color);

        let right = x + width as i32 - ri - 1;
        let bottom = y + height as i32 - ri - 1;
        for (cx, cy) in [(x + ri, y + ri), (right, y + ri), (x + ri, bottom), (right, bottom)] {
            draw_filled_circle_mut(&mut self.image, (cx, cy), ri, color);
        }
    }

    /// A circle outline whose stroke grows inward from `radius`.
    pub fn ring(&mut self, center: (i32, i32), radius: u32, thickness: u32, color: Rgba<u8>) {
        let outer = radius as f32;
        let inner = radius.saturating_sub(thickness) as f32;
        let (cx, cy) = center;
        let r = radius as i32;

        for py in (cy - r).max(0)..(cy + r + 1).min(self.height() as i32) {
            for px in (cx - r).max(0)..(cx + r + 1).min(self.width() as i32) {
                let dx = (px - cx) as f32;
                let dy = (py - cy) as f32;
                let d = (dx * dx + dy * dy).sqrt();
                if d <= outer && d >= inner {
                    self.image.put_pixel(px as u32, py as u32, color);
                }
            }
        }
    }

    /// A line `width` pixels thick with round caps.
    pub fn thick_line(&mut self, from: (f32, f32), to: (f32, f32), width: u32, color: Rgba<u8>) {
        let (dx, dy) = (to.0 - from.0, to.1 - from.1);
        let steps = dx.abs().max(dy.abs()).ceil().max(1.0) as u32;
        let radius = (width / 2).max(1) as i32;

        for step in 0..=steps {
            let t = step as f32 / steps as f32;
            let x = (from.0 + dx * t).round() as i32;
            let y = (from.1 + dy * t).round() as i32;
            draw_filled_circle_mut(&mut self.image, (x, y), radius, color);
        }
    }

    /// Paste an image with alpha compositing.
    pub fn overlay(&mut self, top: &RgbaImage, x: i64, y: i64) {
        imageops::overlay(&mut self.image, top, x, y);
    }

    pub fn text(&mut self, font: &FontVec, size: f32, x: i32, y: i32, color: Rgba<u8>, text: &str) {
        draw_text_mut(&mut self.image, color, x, y, PxScale::from(size), font, text);
    }

    /// Text centred on `center`, with a crude outline for legibility.
    pub fn text_centered(
        &mut self,
        font: &FontVec,
        size: f32,
        center: (i32, i32),
        color: Rgba<u8>,
        outline: Option<Rgba<u8>>,
        text: &str,
    ) {
        let scale = PxScale::from(size);
        let (w, h) = text_size(scale, font, text);
        let x = center.0 - w as i32 / 2;
        let y = center.1 - h as i32 / 2;

        if let Some(outline) = outline {
            for (ox, oy) in [(-4, 0), (4, 0), (0, -4), (0, 4), (-3, -3), (3, 3), (-3, 3), (3, -3)] {
                draw_text_mut(&mut self.image, outline, x + ox, y + oy, scale, font, text);
            }
        }
        draw_text_mut(&mut self.image, color, x, y, scale, font, text);
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, VisualError> {
        let mut buffer = Cursor::new(Vec::new());
        self.image
            .write_to(&mut buffer, ImageFormat::Png)
            .map_err(VisualError::Encode)?;
        Ok(buffer.into_inner())
    }
}

pub fn decode(bytes: &[u8]) -> Result<RgbaImage, VisualError> {
    Ok(image::load_from_memory(bytes)
        .map_err(VisualError::Decode)?
        .to_rgba8())
}

pub fn square(image: &RgbaImage, size: u32) -> RgbaImage {
    imageops::resize(image, size, size, FilterType::Triangle)
}

pub fn stretch(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    imageops::resize(image, width, height, FilterType::Triangle)
}

/// Square-resized copy with everything outside the inscribed circle made transparent.
pub fn circular(image: &RgbaImage, size: u32) -> RgbaImage {
    let mut out = square(image, size);
    let r = size as f32 / 2.0;

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f32 + 0.5 - r;
        let dy = y as f32 + 0.5 - r;
        if dx * dx + dy * dy > r * r {
            pixel.0[3] = 0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

    #[test]
    fn circular_mask_clears_corners_only() {
        let source = RgbaImage::from_pixel(10, 10, RED);
        let round = circular(&source, 100);

        assert_eq!(round.get_pixel(0, 0).0[3], 0);
        assert_eq!(round.get_pixel(99, 99).0[3], 0);
        assert_eq!(round.get_pixel(50, 50).0[3], 255);
    }

    #[test]
    fn blend_rect_clips_and_mixes() {
        let mut canvas = Canvas::new(20, 20, BLACK);
        canvas.blend_rect(-5, -5, 10, 10, Rgba([255, 255, 255, 128]));

        let mixed = canvas.pixel(0, 0);
        assert!(mixed.0[0] > 100 && mixed.0[0] < 160, "got {:?}", mixed);
        assert_eq!(canvas.pixel(10, 10), BLACK);
    }

    #[test]
    fn ring_leaves_the_middle_untouched() {
        let mut canvas = Canvas::new(100, 100, BLACK);
        canvas.ring((50, 50), 40, 5, RED);

        assert_eq!(canvas.pixel(50, 50), BLACK);
        assert_eq!(canvas.pixel(50, 12), RED);
        assert_eq!(canvas.pixel(0, 0), BLACK);
    }

    #[test]
    fn rounded_rect_skips_the_very_corner() {
        let mut canvas = Canvas::new(100, 40, BLACK);
        canvas.fill_rounded_rect(0, 0, 100, 20, 10, RED);

        assert_eq!(canvas.pixel(0, 0), BLACK);
        assert_eq!(canvas.pixel(50, 10), RED);
        assert_eq!(canvas.pixel(50, 30), BLACK);
    }

    #[test]
    fn thick_line_covers_its_path() {
        let mut canvas = Canvas::new(50, 50, BLACK);
        canvas.thick_line((5.0, 5.0), (45.0, 45.0), 6, RED);

        assert_eq!(canvas.pixel(25, 25), RED);
        assert_eq!(canvas.pixel(45, 5), BLACK);
    }

    #[test]
    fn encodes_a_png() {
        let canvas = Canvas::new(4, 4, RED);
        let png = canvas.encode_png().unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let back = decode(&png).unwrap();
        assert_eq!(back.dimensions(), (4, 4));
    }
}
