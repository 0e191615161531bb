//! An RGBA drawing surface.
//!
//! Views render into plain CPU pixel buffers; the host presents them
//! however it likes. All operations clip to the surface bounds and are
//! no-ops on a zero-sized surface, so redrawing with partially-initialized
//! state produces an empty result instead of failing.

use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::model::Rect;

/// A resizable RGBA pixel buffer with canvas-style drawing operations.
#[derive(Debug, Clone, Default)]
pub struct Surface {
    buffer: RgbaImage,
}

impl Surface {
    /// Create an empty zero-sized surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Surface width in pixels.
    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    /// Surface height in pixels.
    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    /// Resize the surface, destroying its contents.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.buffer = RgbaImage::new(width, height);
    }

    /// Clear all pixels to transparent.
    pub fn clear(&mut self) {
        for px in self.buffer.pixels_mut() {
            *px = Rgba([0, 0, 0, 0]);
        }
    }

    /// Borrow the pixel buffer.
    pub fn image(&self) -> &RgbaImage {
        &self.buffer
    }

    /// Read one pixel; out-of-bounds reads as transparent.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if x < self.width() && y < self.height() {
            *self.buffer.get_pixel(x, y)
        } else {
            Rgba([0, 0, 0, 0])
        }
    }

    /// Scale a source image to the surface size and copy it in, replacing
    /// existing content.
    pub fn blit_scaled(&mut self, src: &RgbaImage) {
        let (w, h) = (self.width(), self.height());
        if w == 0 || h == 0 || src.width() == 0 || src.height() == 0 {
            return;
        }
        self.buffer = if src.dimensions() == (w, h) {
            src.clone()
        } else {
            imageops::resize(src, w, h, FilterType::Triangle)
        };
    }

    /// Fill a rectangle with src-over alpha blending.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba<u8>) {
        if color.0[3] == 0 {
            return;
        }
        let x0 = rect.x.round().max(0.0) as u32;
        let y0 = rect.y.round().max(0.0) as u32;
        let x1 = ((rect.x + rect.width).round().max(0.0) as u32).min(self.width());
        let y1 = ((rect.y + rect.height).round().max(0.0) as u32).min(self.height());
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend_pixel(x as i32, y as i32, color, 1.0);
            }
        }
    }

    /// Stroke a rectangle outline with the given nominal line width.
    ///
    /// The stroke is centered on the rectangle edges. The four edge bands
    /// do not overlap, so translucent strokes blend each corner once.
    pub fn stroke_rect(&mut self, rect: Rect, color: Rgba<u8>, line_width: f32) {
        if line_width <= 0.0 {
            return;
        }
        let hw = line_width / 2.0;
        let (x, y, w, h) = (rect.x, rect.y, rect.width, rect.height);
        // Top and bottom bands span the full outline width.
        self.fill_rect(
            Rect::new(x - hw, y - hw, w + line_width, line_width),
            color,
        );
        self.fill_rect(
            Rect::new(x - hw, y + h - hw, w + line_width, line_width),
            color,
        );
        // Left and right bands fill the remaining vertical extent.
        let band_h = (h - line_width).max(0.0);
        self.fill_rect(Rect::new(x - hw, y + hw, line_width, band_h), color);
        self.fill_rect(Rect::new(x + w - hw, y + hw, line_width, band_h), color);
    }

    /// Blend a single pixel with src-over compositing at the given
    /// coverage; out-of-bounds writes are dropped.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba<u8>, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        let src_a = color.0[3] as f32 / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }
        let dst = self.buffer.get_pixel(x, y).0;
        let dst_a = dst[3] as f32 / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        if out_a <= 0.0 {
            return;
        }
        let blend = |src: u8, dst: u8| {
            let src_f = src as f32 / 255.0;
            let dst_f = dst as f32 / 255.0;
            ((src_f * src_a + dst_f * dst_a * (1.0 - src_a)) / out_a * 255.0)
                .round()
                .clamp(0.0, 255.0) as u8
        };
        self.buffer.put_pixel(
            x,
            y,
            Rgba([
                blend(color.0[0], dst[0]),
                blend(color.0[1], dst[1]),
                blend(color.0[2], dst[2]),
                (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
            ]),
        );
    }
}
