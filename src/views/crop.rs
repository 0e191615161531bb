//! The crop view: a zoomed rendering of one region of the source image.
//!
//! Unlike the box overlay this view is allowed to upscale: the scale
//! factor fits the crop region to the viewport with no 1x cap.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use image::imageops;
use image::RgbaImage;

use crate::constants::{DEFAULT_VIEW_HEIGHT, DEFAULT_VIEW_WIDTH};
use crate::host::Model;
use crate::loader::{ImageLoader, LoadResult};
use crate::model::Rect;
use crate::render::Surface;

/// Image source attribute.
pub const ATTR_IMG: &str = "img";
/// Crop region attribute (a rectangle, or null for nothing).
pub const ATTR_BOX: &str = "box";
/// Target viewport width attribute.
pub const ATTR_WIDTH: &str = "width";
/// Target viewport height attribute.
pub const ATTR_HEIGHT: &str = "height";

struct CropInner {
    canvas: Surface,
    box_scale: f32,
    loader: Option<ImageLoader>,
    latest_seq: u64,
    /// Crop region captured when the load was issued
    pending_region: Option<Rect>,
}

impl CropInner {
    fn new() -> Self {
        let loader = match ImageLoader::spawn() {
            Ok(loader) => Some(loader),
            Err(e) => {
                log::error!("failed to spawn image loader: {}", e);
                None
            }
        };
        Self {
            canvas: Surface::new(),
            box_scale: 1.0,
            loader,
            latest_seq: 0,
            pending_region: None,
        }
    }
}

/// View over a host model with `img`, `box`, `width` and `height`
/// attributes.
pub struct CropView {
    model: Rc<Model>,
    inner: Rc<RefCell<CropInner>>,
}

impl CropView {
    /// Create the view over a model. Call [`render`](Self::render) to
    /// subscribe and draw.
    pub fn new(model: Rc<Model>) -> Self {
        Self {
            model,
            inner: Rc::new(RefCell::new(CropInner::new())),
        }
    }

    /// Subscribe to the model and draw the initial state.
    pub fn render(&self) {
        for attr in [ATTR_IMG, ATTR_BOX, ATTR_WIDTH, ATTR_HEIGHT] {
            let inner = Rc::clone(&self.inner);
            self.model
                .on(attr, move |model| Self::redraw(&inner, model));
        }
        Self::redraw(&self.inner, &self.model);
    }

    /// Current region-to-canvas scale factor.
    pub fn box_scale(&self) -> f32 {
        self.inner.borrow().box_scale
    }

    /// Canvas size in pixels.
    pub fn canvas_size(&self) -> (u32, u32) {
        let inner = self.inner.borrow();
        (inner.canvas.width(), inner.canvas.height())
    }

    /// Borrow the canvas surface.
    pub fn canvas(&self) -> Ref<'_, Surface> {
        Ref::map(self.inner.borrow(), |i| &i.canvas)
    }

    /// Apply any completed image loads, without blocking.
    pub fn poll(&self) {
        let results = match self.inner.borrow_mut().loader.as_mut() {
            Some(loader) => loader.poll(),
            None => Vec::new(),
        };
        self.process_results(results);
    }

    /// Block up to `timeout` for an image load, then apply it.
    pub fn pump(&self, timeout: Duration) {
        let results = match self.inner.borrow_mut().loader.as_mut() {
            Some(loader) => loader.wait(timeout),
            None => Vec::new(),
        };
        self.process_results(results);
    }

    fn process_results(&self, results: Vec<LoadResult>) {
        for completed in results {
            let (latest, region) = {
                let inner = self.inner.borrow();
                (inner.latest_seq, inner.pending_region)
            };
            if completed.seq != latest {
                log::debug!(
                    "discarding stale crop load {} (latest is {})",
                    completed.seq,
                    latest
                );
                continue;
            }
            if let (Ok(image), Some(region)) = (completed.result, region) {
                self.apply_crop(&image, region);
            }
        }
    }

    /// Draw the sub-rectangle of the source image into the canvas.
    fn apply_crop(&self, image: &RgbaImage, region: Rect) {
        let Some((x, y, w, h)) = clamp_region(region, image.width(), image.height()) else {
            log::debug!("crop region lies outside the image; nothing to draw");
            return;
        };
        let cropped = imageops::crop_imm(image, x, y, w, h).to_image();
        let mut inner = self.inner.borrow_mut();
        inner.canvas.blit_scaled(&cropped);
    }

    /// Recompute the canvas from the current model state and kick off the
    /// image load.
    fn redraw(inner: &Rc<RefCell<CropInner>>, model: &Model) {
        let region: Option<Rect> = model.get_as(ATTR_BOX);
        let Some(region) = region.filter(|r| r.width > 0.0 && r.height > 0.0) else {
            let mut inner = inner.borrow_mut();
            inner.canvas.clear();
            inner.pending_region = None;
            inner.latest_seq = 0;
            return;
        };

        let width = model.get_f32(ATTR_WIDTH).unwrap_or(DEFAULT_VIEW_WIDTH);
        let height = model.get_f32(ATTR_HEIGHT).unwrap_or(DEFAULT_VIEW_HEIGHT);
        // Fit the region to the viewport; upscaling past 1x is fine here.
        let box_scale = (width / region.width).min(height / region.height);
        let canvas_w = (region.width * box_scale).round() as u32;
        let canvas_h = (region.height * box_scale).round() as u32;

        let mut inner = inner.borrow_mut();
        inner.box_scale = box_scale;
        inner.canvas.resize(canvas_w, canvas_h);

        let Some(source) = model.get_str(ATTR_IMG).filter(|s| !s.is_empty()) else {
            inner.pending_region = None;
            inner.latest_seq = 0;
            return;
        };
        if let Some(loader) = inner.loader.as_mut() {
            let seq = loader.request(&source);
            inner.latest_seq = seq;
            inner.pending_region = Some(region);
        }
    }
}

/// Clamp a crop region to the image bounds, in integer pixels.
///
/// Returns `None` when nothing of the region overlaps the image.
fn clamp_region(region: Rect, image_w: u32, image_h: u32) -> Option<(u32, u32, u32, u32)> {
    let x0 = region.x.max(0.0);
    let y0 = region.y.max(0.0);
    let x1 = (region.x + region.width).min(image_w as f32);
    let y1 = (region.y + region.height).min(image_h as f32);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    let x = x0.floor() as u32;
    let y = y0.floor() as u32;
    let w = ((x1 - x0).round() as u32).max(1);
    let h = ((y1 - y0).round() as u32).max(1);
    Some((x, y, w.min(image_w - x), h.min(image_h - y)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use image::{ImageFormat, Rgba};
    use std::io::Cursor;

    /// A 4x4 image with a distinct color per quadrant (2x2 blocks).
    fn quadrant_data_url() -> String {
        let mut img = RgbaImage::new(4, 4);
        for y in 0..4 {
            for x in 0..4 {
                let color = match (x < 2, y < 2) {
                    (true, true) => Rgba([255, 0, 0, 255]),
                    (false, true) => Rgba([0, 255, 0, 255]),
                    (true, false) => Rgba([0, 0, 255, 255]),
                    (false, false) => Rgba([255, 255, 0, 255]),
                };
                img.put_pixel(x, y, color);
            }
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encode");
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    fn crop_view() -> (Rc<Model>, CropView) {
        let model = Model::new();
        let view = CropView::new(Rc::clone(&model));
        view.render();
        (model, view)
    }

    #[test]
    fn test_null_box_draws_nothing() {
        let (model, view) = crop_view();
        model.set(ATTR_IMG, quadrant_data_url());
        assert_eq!(view.canvas_size(), (0, 0));
    }

    #[test]
    fn test_scale_may_exceed_one() {
        let (model, view) = crop_view();
        model.set(ATTR_WIDTH, 100.0);
        model.set(ATTR_HEIGHT, 100.0);
        model.set(ATTR_IMG, quadrant_data_url());
        model.set_as(ATTR_BOX, &Rect::new(0.0, 0.0, 2.0, 2.0));
        // 2x2 region fitted into 100x100: scale 50, canvas 100x100
        assert_eq!(view.box_scale(), 50.0);
        assert_eq!(view.canvas_size(), (100, 100));
    }

    #[test]
    fn test_crop_draws_only_the_region() {
        let (model, view) = crop_view();
        model.set(ATTR_WIDTH, 8.0);
        model.set(ATTR_HEIGHT, 8.0);
        model.set(ATTR_IMG, quadrant_data_url());
        // Top-right quadrant (green)
        model.set_as(ATTR_BOX, &Rect::new(2.0, 0.0, 2.0, 2.0));
        view.pump(Duration::from_secs(5));
        assert_eq!(view.canvas_size(), (8, 8));
        assert_eq!(view.canvas().pixel(4, 4), Rgba([0, 255, 0, 255]));
        assert_eq!(view.canvas().pixel(0, 7), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_region_clamped_to_image() {
        let (model, view) = crop_view();
        model.set(ATTR_WIDTH, 4.0);
        model.set(ATTR_HEIGHT, 4.0);
        model.set(ATTR_IMG, quadrant_data_url());
        // Region extends past the right edge; the overlap still draws.
        model.set_as(ATTR_BOX, &Rect::new(2.0, 2.0, 4.0, 2.0));
        view.pump(Duration::from_secs(5));
        let px = view.canvas().pixel(0, 0);
        assert_eq!(px, Rgba([255, 255, 0, 255]));
    }

    #[test]
    fn test_region_fully_outside_image() {
        let (model, view) = crop_view();
        model.set(ATTR_WIDTH, 4.0);
        model.set(ATTR_HEIGHT, 4.0);
        model.set(ATTR_IMG, quadrant_data_url());
        model.set_as(ATTR_BOX, &Rect::new(100.0, 100.0, 10.0, 10.0));
        view.pump(Duration::from_secs(5));
        // Canvas resized but stays empty
        assert_eq!(view.canvas().pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_clamp_region_math() {
        assert_eq!(
            clamp_region(Rect::new(-1.0, -1.0, 3.0, 3.0), 4, 4),
            Some((0, 0, 2, 2))
        );
        assert_eq!(clamp_region(Rect::new(5.0, 0.0, 2.0, 2.0), 4, 4), None);
        assert_eq!(
            clamp_region(Rect::new(1.0, 1.0, 10.0, 10.0), 4, 4),
            Some((1, 1, 3, 3))
        );
    }

    #[test]
    fn test_clearing_box_clears_canvas() {
        let (model, view) = crop_view();
        model.set(ATTR_WIDTH, 4.0);
        model.set(ATTR_HEIGHT, 4.0);
        model.set(ATTR_IMG, quadrant_data_url());
        model.set_as(ATTR_BOX, &Rect::new(0.0, 0.0, 2.0, 2.0));
        view.pump(Duration::from_secs(5));
        model.set(ATTR_BOX, serde_json::Value::Null);
        assert_eq!(view.canvas().pixel(0, 0), Rgba([0, 0, 0, 0]));
    }
}
