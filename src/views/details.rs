//! The detail table view: label/value rows for a record.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::host::Model;

/// Record data attribute (a JSON object).
pub const ATTR_DATA: &str = "data";
/// Ordered key list attribute; empty means "all keys of data".
pub const ATTR_ATTRS: &str = "attrs";

/// View over a host model with `data` and `attrs` attributes.
///
/// Output is a list of label/value rows, rebuilt from scratch on every
/// redraw; nothing of the previous output survives.
pub struct DetailTableView {
    model: Rc<Model>,
    rows: Rc<RefCell<Vec<(String, String)>>>,
}

impl DetailTableView {
    /// Create the view over a model. Call [`render`](Self::render) to
    /// subscribe and draw.
    pub fn new(model: Rc<Model>) -> Self {
        Self {
            model,
            rows: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Subscribe to the model and build the initial rows.
    pub fn render(&self) {
        for attr in [ATTR_DATA, ATTR_ATTRS] {
            let rows = Rc::clone(&self.rows);
            self.model
                .on(attr, move |model| Self::redraw(&rows, model));
        }
        Self::redraw(&self.rows, &self.model);
    }

    /// The current label/value rows.
    pub fn rows(&self) -> Vec<(String, String)> {
        self.rows.borrow().clone()
    }

    fn redraw(rows: &Rc<RefCell<Vec<(String, String)>>>, model: &Model) {
        let data: Map<String, Value> = match model.get(ATTR_DATA) {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let attrs: Vec<String> = model.get_as(ATTR_ATTRS).unwrap_or_default();

        // Empty key list means every key of the data mapping, in the
        // mapping's own order.
        let keys: Vec<String> = if attrs.is_empty() {
            data.keys().cloned().collect()
        } else {
            attrs
                .into_iter()
                .filter(|k| data.contains_key(k))
                .collect()
        };

        let built: Vec<(String, String)> = keys
            .into_iter()
            .map(|k| {
                let value = format_value(&data[&k]);
                (k, value)
            })
            .collect();
        *rows.borrow_mut() = built;
    }
}

/// Display form of a JSON value: strings unquoted, everything else in its
/// compact JSON form.
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
