//! Composite inspector: a box overlay wired to a crop view and a detail
//! table over a table of records.
//!
//! Records are JSON objects sharing an image column and a box column.
//! Rows group by image; selecting a group loads its image and boxes into
//! the overlay. Clicking a box feeds the full source row into the detail
//! table and the box's rectangle into the crop view.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::host::Model;
use crate::model::{BoxAnnotation, BoxCollection, BoxStyle, Rect};
use crate::views::{BoxOverlayView, CropView, DetailTableView};
use crate::views::{box_overlay, crop, details};

/// Formats one text-column value into label text.
pub type TextFormatter = Box<dyn Fn(&Value) -> String>;

/// Column wiring for an [`Inspector`].
pub struct InspectorConfig {
    /// Column holding the image source for each row
    pub img_col: String,
    /// Column holding the row's box rectangle (may be null)
    pub box_col: String,
    /// Columns joined into the box label text
    pub text_cols: Vec<String>,
    /// Optional per-column formatters, parallel to `text_cols`
    pub text_fmts: Vec<Option<TextFormatter>>,
    /// Column holding per-row style properties
    pub style_col: Option<String>,
}

impl Default for InspectorConfig {
    fn default() -> Self {
        Self {
            img_col: "image".to_string(),
            box_col: "box".to_string(),
            text_cols: Vec::new(),
            text_fmts: Vec::new(),
            style_col: None,
        }
    }
}

/// Rows sharing one image.
struct ImageGroup {
    image: String,
    rows: Vec<usize>,
}

/// Three widgets over one record table.
pub struct Inspector {
    records: Rc<Vec<Map<String, Value>>>,
    config: InspectorConfig,
    groups: Vec<ImageGroup>,
    overlay_model: Rc<Model>,
    crop_model: Rc<Model>,
    details_model: Rc<Model>,
    overlay: BoxOverlayView,
    crop: CropView,
    details: DetailTableView,
    current: Cell<Option<usize>>,
}

impl Inspector {
    /// Build the inspector over a record table.
    ///
    /// Rows without a string image column are skipped. Group order is the
    /// first appearance of each image in the table.
    pub fn new(records: Vec<Map<String, Value>>, config: InspectorConfig) -> Self {
        let records = Rc::new(records);
        let groups = group_by_image(&records, &config.img_col);

        let overlay_model = Model::new();
        let crop_model = Model::new();
        let details_model = Model::new();

        let overlay = BoxOverlayView::new(Rc::clone(&overlay_model));
        let crop = CropView::new(Rc::clone(&crop_model));
        let details = DetailTableView::new(Rc::clone(&details_model));
        overlay.render();
        crop.render();
        details.render();

        // Active box drives the crop region and the detail table.
        {
            let records = Rc::clone(&records);
            let crop_model = Rc::clone(&crop_model);
            let details_model = Rc::clone(&details_model);
            overlay_model.on(box_overlay::ATTR_ACTIVE_BOX, move |model| {
                let active: Option<BoxAnnotation> = model.get_as(box_overlay::ATTR_ACTIVE_BOX);
                match active {
                    Some(b) => {
                        let row = b
                            .index
                            .and_then(|i| records.get(i as usize))
                            .cloned()
                            .unwrap_or_default();
                        details_model.set(details::ATTR_DATA, Value::Object(row));
                        crop_model.set_as(crop::ATTR_BOX, &Some(b.rect));
                    }
                    None => {
                        details_model.set(details::ATTR_DATA, Value::Object(Map::new()));
                        crop_model.set(crop::ATTR_BOX, Value::Null);
                    }
                }
            });
        }

        // A new image resets the details and retargets the crop view.
        {
            let crop_model = Rc::clone(&crop_model);
            let details_model = Rc::clone(&details_model);
            overlay_model.on(box_overlay::ATTR_IMG, move |model| {
                details_model.set(details::ATTR_DATA, Value::Object(Map::new()));
                crop_model.set(crop::ATTR_IMG, model.get(box_overlay::ATTR_IMG));
            });
        }

        Self {
            records,
            config,
            groups,
            overlay_model,
            crop_model,
            details_model,
            overlay,
            crop,
            details,
            current: Cell::new(None),
        }
    }

    /// Number of image groups.
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Image source of each group, in group order.
    pub fn images(&self) -> Vec<&str> {
        self.groups.iter().map(|g| g.image.as_str()).collect()
    }

    /// Index of the currently selected group.
    pub fn current_index(&self) -> Option<usize> {
        self.current.get()
    }

    /// Select a group by index, loading its image and boxes.
    pub fn select_index(&self, index: usize) {
        let Some(group) = self.groups.get(index) else {
            log::warn!("group index {} out of range", index);
            return;
        };
        let boxes: BoxCollection = group
            .rows
            .iter()
            .map(|&row| self.build_box(row))
            .collect();
        self.overlay_model
            .set(box_overlay::ATTR_IMG, group.image.clone());
        self.overlay_model.set_as(box_overlay::ATTR_BOXES, &boxes);
        self.current.set(Some(index));
    }

    /// Select a group by its image source.
    pub fn select_image(&self, image: &str) {
        match self.groups.iter().position(|g| g.image == image) {
            Some(index) => self.select_index(index),
            None => log::warn!("no group for image {}", image),
        }
    }

    /// The box overlay view.
    pub fn overlay(&self) -> &BoxOverlayView {
        &self.overlay
    }

    /// The crop view.
    pub fn crop(&self) -> &CropView {
        &self.crop
    }

    /// The detail table view.
    pub fn details(&self) -> &DetailTableView {
        &self.details
    }

    /// The box overlay's host model.
    pub fn overlay_model(&self) -> &Rc<Model> {
        &self.overlay_model
    }

    /// The crop view's host model.
    pub fn crop_model(&self) -> &Rc<Model> {
        &self.crop_model
    }

    /// The detail table's host model.
    pub fn details_model(&self) -> &Rc<Model> {
        &self.details_model
    }

    /// Apply pending image loads on both image-backed views.
    pub fn poll(&self) {
        self.overlay.poll();
        self.crop.poll();
    }

    /// Block up to `timeout` per view for pending image loads.
    pub fn pump(&self, timeout: Duration) {
        self.overlay.pump(timeout);
        self.crop.pump(timeout);
    }

    /// Build the overlay box for one record, or an empty slot if the row
    /// has no box.
    fn build_box(&self, row: usize) -> Option<BoxAnnotation> {
        let record = self.records.get(row)?;
        let rect: Rect =
            serde_json::from_value(record.get(&self.config.box_col)?.clone()).ok()?;

        let text = self.build_text(record);
        let style: BoxStyle = self
            .config
            .style_col
            .as_ref()
            .and_then(|col| record.get(col))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default();

        let mut b = BoxAnnotation::new(rect)
            .with_index(row as u64)
            .with_style(style);
        if let Some(text) = text {
            b = b.with_text(text);
        }
        Some(b)
    }

    /// Join the text columns' formatted values with ", ".
    fn build_text(&self, record: &Map<String, Value>) -> Option<String> {
        if self.config.text_cols.is_empty() {
            return None;
        }
        let parts: Vec<String> = self
            .config
            .text_cols
            .iter()
            .enumerate()
            .map(|(i, col)| {
                let value = record.get(col).unwrap_or(&Value::Null);
                match self.config.text_fmts.get(i).and_then(|f| f.as_ref()) {
                    Some(fmt) => fmt(value),
                    None => default_text(value),
                }
            })
            .collect();
        Some(parts.join(", "))
    }
}

/// Group record indices by their image column, in first-appearance order.
fn group_by_image(records: &[Map<String, Value>], img_col: &str) -> Vec<ImageGroup> {
    let mut groups: Vec<ImageGroup> = Vec::new();
    for (row, record) in records.iter().enumerate() {
        let Some(image) = record.get(img_col).and_then(|v| v.as_str()) else {
            log::warn!("row {} has no usable image column; skipped", row);
            continue;
        };
        match groups.iter_mut().find(|g| g.image == image) {
            Some(group) => group.rows.push(row),
            None => groups.push(ImageGroup {
                image: image.to_string(),
                rows: vec![row],
            }),
        }
    }
    groups
}

/// Plain display form of a text-column value.
fn default_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
