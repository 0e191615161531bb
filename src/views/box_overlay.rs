//! The box overlay view: an image with styled, selectable boxes on top.
//!
//! Two stacked surfaces: the background holds the scaled image, the
//! foreground holds the box overlay. The view owns only derived state
//! (`im_scale` and the pixel buffers); boxes, selection and style live in
//! the host model, and every redraw recomputes the surfaces from scratch.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::time::Duration;

use ab_glyph::FontArc;
use image::RgbaImage;

use crate::host::Model;
use crate::loader::{ImageLoader, LoadResult};
use crate::model::{BoxAnnotation, BoxCollection, BoxStyle, Highlight};
use crate::render::{draw_text, FontSpec, FontStore, Surface};
use crate::selection::{active_after_click, hover_after_move, ClickOutcome};

/// Image source attribute (URI or data URL).
pub const ATTR_IMG: &str = "img";
/// Target viewport width attribute.
pub const ATTR_WIDTH: &str = "width";
/// Target viewport height attribute.
pub const ATTR_HEIGHT: &str = "height";
/// Box collection attribute.
pub const ATTR_BOXES: &str = "boxes";
/// Active (clicked) selection attribute.
pub const ATTR_ACTIVE_BOX: &str = "active_box";
/// Hover selection attribute.
pub const ATTR_HOVER_BOX: &str = "hover_box";
/// Default style attribute.
pub const ATTR_DEFAULT_STYLE: &str = "default_style";

struct OverlayInner {
    background: Surface,
    foreground: Surface,
    im_scale: f32,
    loader: Option<ImageLoader>,
    latest_seq: u64,
    fonts: FontStore,
}

impl OverlayInner {
    fn new() -> Self {
        let loader = match ImageLoader::spawn() {
            Ok(loader) => Some(loader),
            Err(e) => {
                log::error!("failed to spawn image loader: {}", e);
                None
            }
        };
        Self {
            background: Surface::new(),
            foreground: Surface::new(),
            im_scale: 1.0,
            loader,
            latest_seq: 0,
            fonts: FontStore::new(),
        }
    }
}

/// View over a host model with `img`, `width`, `height`, `boxes`,
/// `active_box`, `hover_box` and `default_style` attributes.
pub struct BoxOverlayView {
    model: Rc<Model>,
    inner: Rc<RefCell<OverlayInner>>,
}

impl BoxOverlayView {
    /// Create the view over a model. Call [`render`](Self::render) to
    /// subscribe and draw.
    pub fn new(model: Rc<Model>) -> Self {
        Self {
            model,
            inner: Rc::new(RefCell::new(OverlayInner::new())),
        }
    }

    /// Subscribe to the model and kick off the initial image load.
    pub fn render(&self) {
        for attr in [ATTR_IMG, ATTR_WIDTH, ATTR_HEIGHT] {
            let inner = Rc::clone(&self.inner);
            self.model
                .on(attr, move |model| Self::request_image(&inner, model));
        }
        for attr in [ATTR_BOXES, ATTR_ACTIVE_BOX, ATTR_HOVER_BOX, ATTR_DEFAULT_STYLE] {
            let inner = Rc::clone(&self.inner);
            self.model
                .on(attr, move |model| Self::redraw_overlay(&inner, model));
        }
        Self::request_image(&self.inner, &self.model);
    }

    /// Register a font for label rendering.
    pub fn register_font(&self, family: impl Into<String>, font: FontArc) {
        self.inner.borrow_mut().fonts.register(family, font);
    }

    /// Current image-to-canvas scale factor.
    pub fn im_scale(&self) -> f32 {
        self.inner.borrow().im_scale
    }

    /// Canvas size in pixels (both surfaces share it).
    pub fn canvas_size(&self) -> (u32, u32) {
        let inner = self.inner.borrow();
        (inner.background.width(), inner.background.height())
    }

    /// Borrow the background (image) surface.
    pub fn background(&self) -> Ref<'_, Surface> {
        Ref::map(self.inner.borrow(), |i| &i.background)
    }

    /// Borrow the foreground (overlay) surface.
    pub fn foreground(&self) -> Ref<'_, Surface> {
        Ref::map(self.inner.borrow(), |i| &i.foreground)
    }

    /// Handle a pointer move at canvas coordinates.
    ///
    /// Runs the hit-test and writes the hover selection back to the model
    /// unconditionally; the model suppresses no-change notifications.
    pub fn pointer_moved(&self, x: f32, y: f32) {
        let (boxes, im_scale) = {
            let inner = self.inner.borrow();
            let boxes: BoxCollection = self.model.get_as(ATTR_BOXES).unwrap_or_default();
            (boxes, inner.im_scale)
        };
        let hover = hover_after_move(&boxes, (x, y), im_scale);
        self.model.set_as(ATTR_HOVER_BOX, &hover);
    }

    /// Handle a pointer click at canvas coordinates.
    ///
    /// Commits through the hover gate and syncs the committed mutation
    /// with `touch()`.
    pub fn pointer_clicked(&self, x: f32, y: f32) {
        let im_scale = self.inner.borrow().im_scale;
        let boxes: BoxCollection = self.model.get_as(ATTR_BOXES).unwrap_or_default();
        let hover: Option<BoxAnnotation> = self.model.get_as(ATTR_HOVER_BOX);
        let active: Option<BoxAnnotation> = self.model.get_as(ATTR_ACTIVE_BOX);

        match active_after_click(&boxes, hover.as_ref(), active.as_ref(), (x, y), im_scale) {
            ClickOutcome::SetActive(value) => {
                self.model.set_as(ATTR_ACTIVE_BOX, &value);
                self.model.touch();
            }
            ClickOutcome::Unchanged => {}
        }
    }

    /// Apply any completed image loads, without blocking.
    ///
    /// Hosts call this from their event loop tick.
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
            let latest = self.inner.borrow().latest_seq;
            if completed.seq != latest {
                log::debug!(
                    "discarding stale load {} (latest is {})",
                    completed.seq,
                    latest
                );
                continue;
            }
            // Decode failures were logged by the loader; the background
            // simply stays empty.
            if let Ok(image) = completed.result {
                self.apply_image(&image);
            }
        }
    }

    /// Resize both surfaces to the fitted image and draw it.
    fn apply_image(&self, image: &RgbaImage) {
        let width = self.model.get_f32(ATTR_WIDTH).unwrap_or(image.width() as f32);
        let height = self
            .model
            .get_f32(ATTR_HEIGHT)
            .unwrap_or(image.height() as f32);
        let im_scale = fit_scale(image.width(), image.height(), width, height);

        let canvas_w = (image.width() as f32 * im_scale).round() as u32;
        let canvas_h = (image.height() as f32 * im_scale).round() as u32;
        log::debug!(
            "image {}x{} fitted to {}x{} (scale {:.3})",
            image.width(),
            image.height(),
            canvas_w,
            canvas_h,
            im_scale
        );

        {
            let mut inner = self.inner.borrow_mut();
            inner.im_scale = im_scale;
            inner.background.resize(canvas_w, canvas_h);
            inner.foreground.resize(canvas_w, canvas_h);
            inner.background.blit_scaled(image);
        }
        Self::redraw_overlay(&self.inner, &self.model);
    }

    /// Issue an async load for the current image source.
    fn request_image(inner: &Rc<RefCell<OverlayInner>>, model: &Model) {
        let Some(source) = model.get_str(ATTR_IMG).filter(|s| !s.is_empty()) else {
            let mut inner = inner.borrow_mut();
            inner.background.clear();
            inner.foreground.clear();
            // Anything still in flight is now unwanted.
            inner.latest_seq = 0;
            return;
        };
        let mut inner = inner.borrow_mut();
        // The old image is gone as soon as a new load is issued; a failed
        // load therefore leaves the background empty, not stale.
        inner.background.clear();
        if let Some(loader) = inner.loader.as_mut() {
            let seq = loader.request(&source);
            inner.latest_seq = seq;
        }
    }

    /// Redraw the foreground overlay from the current model state.
    fn redraw_overlay(inner: &Rc<RefCell<OverlayInner>>, model: &Model) {
        let boxes: BoxCollection = model.get_as(ATTR_BOXES).unwrap_or_default();
        let defaults: BoxStyle = model.get_as(ATTR_DEFAULT_STYLE).unwrap_or_default();
        let active: Option<BoxAnnotation> = model.get_as(ATTR_ACTIVE_BOX);
        let hover: Option<BoxAnnotation> = model.get_as(ATTR_HOVER_BOX);

        let mut inner = inner.borrow_mut();
        let inner = &mut *inner;
        inner.foreground.clear();

        for b in boxes.iter().flatten() {
            let highlight = if active.as_ref() == Some(b) {
                Highlight::Active
            } else if hover.as_ref() == Some(b) {
                Highlight::Hover
            } else {
                Highlight::None
            };
            let style = b.style.resolve(&defaults).for_state(highlight);
            draw_box(
                &mut inner.foreground,
                &inner.fonts,
                b,
                &style,
                inner.im_scale,
            );
        }
    }
}

/// Compute the viewport fit scale, never upscaling past 1.
pub fn fit_scale(image_w: u32, image_h: u32, view_w: f32, view_h: f32) -> f32 {
    if image_w == 0 || image_h == 0 {
        return 1.0;
    }
    (view_w / image_w as f32)
        .min(view_h / image_h as f32)
        .min(1.0)
}

/// Draw one box: stroke outline, optional label, then fill.
///
/// The rectangle scales with the image; the stroke width stays nominal.
fn draw_box(
    surface: &mut Surface,
    fonts: &FontStore,
    annotation: &BoxAnnotation,
    style: &BoxStyle,
    im_scale: f32,
) {
    let rect = annotation.rect.scaled(im_scale);

    if let Some(stroke) = style.stroke_color() {
        surface.stroke_rect(rect, stroke, style.stroke_width());
    }

    if let Some(text) = annotation.text.as_deref().filter(|t| !t.is_empty()) {
        let spec = FontSpec::parse(style.font());
        if let (Some(font), Some(color)) = (fonts.lookup(&spec.family), style.stroke_color()) {
            // Labels may run past the box, but no further than twice its width.
            draw_text(
                surface,
                font,
                text,
                rect.x,
                rect.y,
                spec.size,
                color,
                rect.width * 2.0,
            );
        }
    }

    if let Some(fill) = style.fill_color() {
        surface.fill_rect(rect, fill);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Rect;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine as _;
    use image::{ImageFormat, Rgba};
    use serde_json::json;
    use std::io::Cursor;

    fn data_url_png(w: u32, h: u32, color: Rgba<u8>) -> String {
        let mut img = RgbaImage::new(w, h);
        for px in img.pixels_mut() {
            *px = color;
        }
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("png encode");
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    fn view_with_image(w: u32, h: u32, view_w: f32, view_h: f32) -> (Rc<Model>, BoxOverlayView) {
        let model = Model::new();
        model.set(ATTR_WIDTH, view_w as f64);
        model.set(ATTR_HEIGHT, view_h as f64);
        let view = BoxOverlayView::new(Rc::clone(&model));
        view.render();
        model.set(ATTR_IMG, data_url_png(w, h, Rgba([50, 50, 50, 255])));
        view.pump(Duration::from_secs(5));
        (model, view)
    }

    #[test]
    fn test_fit_scale_downscales() {
        assert_eq!(fit_scale(800, 600, 400.0, 300.0), 0.5);
    }

    #[test]
    fn test_fit_scale_never_upscales() {
        assert_eq!(fit_scale(800, 600, 2000.0, 2000.0), 1.0);
    }

    #[test]
    fn test_fit_scale_limited_by_tighter_axis() {
        assert_eq!(fit_scale(800, 600, 400.0, 600.0), 0.5);
        assert_eq!(fit_scale(800, 600, 800.0, 150.0), 0.25);
    }

    #[test]
    fn test_image_load_sets_scale_and_canvas() {
        let (_model, view) = view_with_image(800, 600, 400.0, 300.0);
        assert_eq!(view.im_scale(), 0.5);
        assert_eq!(view.canvas_size(), (400, 300));
        // Background got the image
        assert_eq!(view.background().pixel(10, 10), Rgba([50, 50, 50, 255]));
    }

    #[test]
    fn test_oversized_viewport_keeps_native_size() {
        let (_model, view) = view_with_image(80, 60, 2000.0, 2000.0);
        assert_eq!(view.im_scale(), 1.0);
        assert_eq!(view.canvas_size(), (80, 60));
    }

    #[test]
    fn test_box_renders_scaled_with_nominal_stroke() {
        let (model, view) = view_with_image(800, 600, 400.0, 300.0);
        model.set_as(
            ATTR_BOXES,
            &vec![Some(
                BoxAnnotation::new(Rect::new(100.0, 100.0, 50.0, 50.0)).with_style(
                    crate::model::BoxStyle {
                        stroke_style: Some("#ff0000".into()),
                        stroke_width: Some(2.0),
                        ..Default::default()
                    },
                ),
            )],
        );
        let fg = view.foreground();
        // Box {100,100,50,50} at scale 0.5 -> canvas {50,50,25,25};
        // stroke band straddles the edge at 50.
        assert_eq!(fg.pixel(60, 50), Rgba([255, 0, 0, 255]));
        assert_eq!(fg.pixel(60, 49), Rgba([255, 0, 0, 255]));
        // Interior untouched (default fill is transparent)
        assert_eq!(fg.pixel(60, 60), Rgba([0, 0, 0, 0]));
        // Well outside the box
        assert_eq!(fg.pixel(10, 10), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_default_style_fills_missing_properties() {
        let (model, view) = view_with_image(100, 100, 100.0, 100.0);
        model.set(ATTR_DEFAULT_STYLE, json!({"fill_style": "#00ff00ff"}));
        model.set_as(
            ATTR_BOXES,
            &vec![Some(BoxAnnotation::new(Rect::new(10.0, 10.0, 20.0, 20.0)))],
        );
        let fg = view.foreground();
        assert_eq!(fg.pixel(20, 20), Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_hover_highlight_uses_hover_colors() {
        let (model, view) = view_with_image(100, 100, 100.0, 100.0);
        let b = BoxAnnotation::new(Rect::new(10.0, 10.0, 20.0, 20.0)).with_style(
            crate::model::BoxStyle {
                hover_fill: Some("#0000ffff".into()),
                ..Default::default()
            },
        );
        model.set_as(ATTR_BOXES, &vec![Some(b.clone())]);
        view.pointer_moved(20.0, 20.0);
        // The hover write triggered an overlay redraw with hover colors
        assert_eq!(
            model.get_as::<Option<BoxAnnotation>>(ATTR_HOVER_BOX).flatten(),
            Some(b)
        );
        let fg = view.foreground();
        assert_eq!(fg.pixel(20, 20), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_click_sets_active_and_commits() {
        let (model, view) = view_with_image(100, 100, 100.0, 100.0);
        let committed = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&committed);
        model.set_sync_sink(move |attr, _| sink.borrow_mut().push(attr.to_string()));

        let b = BoxAnnotation::new(Rect::new(10.0, 10.0, 20.0, 20.0));
        model.set_as(ATTR_BOXES, &vec![Some(b.clone())]);

        view.pointer_moved(20.0, 20.0);
        view.pointer_clicked(20.0, 20.0);
        assert_eq!(
            model
                .get_as::<Option<BoxAnnotation>>(ATTR_ACTIVE_BOX)
                .flatten(),
            Some(b)
        );
        assert!(committed.borrow().contains(&ATTR_ACTIVE_BOX.to_string()));

        // Second click on the same (still hovered) box toggles off
        view.pointer_clicked(20.0, 20.0);
        assert_eq!(
            model
                .get_as::<Option<BoxAnnotation>>(ATTR_ACTIVE_BOX)
                .flatten(),
            None
        );
    }

    #[test]
    fn test_click_through_hover_gate_only() {
        let (model, view) = view_with_image(100, 100, 100.0, 100.0);
        let a = BoxAnnotation::new(Rect::new(0.0, 0.0, 20.0, 20.0));
        let b = BoxAnnotation::new(Rect::new(50.0, 50.0, 20.0, 20.0));
        model.set_as(ATTR_BOXES, &vec![Some(a.clone()), Some(b.clone())]);

        // Hover over b, then click inside a: the click is swallowed.
        view.pointer_moved(60.0, 60.0);
        view.pointer_clicked(10.0, 10.0);
        assert_eq!(
            model
                .get_as::<Option<BoxAnnotation>>(ATTR_ACTIVE_BOX)
                .flatten(),
            None
        );

        // Click empty canvas clears active.
        view.pointer_moved(60.0, 60.0);
        view.pointer_clicked(60.0, 60.0);
        assert_eq!(
            model
                .get_as::<Option<BoxAnnotation>>(ATTR_ACTIVE_BOX)
                .flatten(),
            Some(b)
        );
        view.pointer_moved(90.0, 90.0);
        view.pointer_clicked(90.0, 90.0);
        assert_eq!(
            model
                .get_as::<Option<BoxAnnotation>>(ATTR_ACTIVE_BOX)
                .flatten(),
            None
        );
    }

    #[test]
    fn test_stale_load_discarded() {
        let model = Model::new();
        model.set(ATTR_WIDTH, 100.0);
        model.set(ATTR_HEIGHT, 100.0);
        let view = BoxOverlayView::new(Rc::clone(&model));
        view.render();

        // Two loads in quick succession: only the newer may apply.
        model.set(ATTR_IMG, data_url_png(10, 10, Rgba([1, 1, 1, 255])));
        model.set(ATTR_IMG, data_url_png(20, 20, Rgba([2, 2, 2, 255])));

        // Wait until both results are in, then apply.
        view.pump(Duration::from_secs(5));
        view.pump(Duration::from_secs(1));
        assert_eq!(view.canvas_size(), (20, 20));
        assert_eq!(view.background().pixel(5, 5), Rgba([2, 2, 2, 255]));
    }

    #[test]
    fn test_redraw_before_load_is_empty() {
        let model = Model::new();
        let view = BoxOverlayView::new(Rc::clone(&model));
        view.render();
        // Boxes arrive before any image: zero-sized canvas, no panic.
        model.set_as(
            ATTR_BOXES,
            &vec![Some(BoxAnnotation::new(Rect::new(0.0, 0.0, 10.0, 10.0)))],
        );
        assert_eq!(view.canvas_size(), (0, 0));
    }

    #[test]
    fn test_bad_image_source_degrades_silently() {
        let model = Model::new();
        model.set(ATTR_WIDTH, 100.0);
        model.set(ATTR_HEIGHT, 100.0);
        let view = BoxOverlayView::new(Rc::clone(&model));
        view.render();
        model.set(ATTR_IMG, "/no/such/image.png");
        view.pump(Duration::from_secs(5));
        // No resize, no panic: background stays empty.
        assert_eq!(view.canvas_size(), (0, 0));
    }
}
