//! Host model seam.
//!
//! The widgets in this crate do not own their state: a host framework keeps
//! the authoritative attribute values and synchronizes them out of process.
//! [`Model`] is the narrow surface the widgets consume — an attribute store
//! with a publish/subscribe channel per named attribute, plus `touch()` to
//! commit pending local mutations back to the authoritative store.
//!
//! Everything is single-threaded: observers run synchronously inside
//! `set()`, on the caller's thread. Observers may read the model and write
//! other attributes reentrantly; no borrow is held across handler calls.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

mod registry;

pub use registry::{WidgetMeta, BOX_OVERLAY_META, CROP_VIEW_META, DETAIL_TABLE_META, MODULE_NAME, MODULE_VERSION};

/// Observer invoked when a subscribed attribute actually changes value.
pub type Observer = Rc<dyn Fn(&Model)>;

/// Sink receiving committed attribute mutations on `touch()`.
pub type SyncSink = Box<dyn Fn(&str, &Value)>;

/// Observable attribute store standing in for the host framework's model.
///
/// `set` stores the value and notifies that attribute's observers, but only
/// when the value actually changed; redundant writes are absorbed here so
/// callers can write unconditionally. Local mutations accumulate until
/// `touch()` commits them to the registered sync sink in write order.
#[derive(Default)]
pub struct Model {
    attrs: RefCell<HashMap<String, Value>>,
    observers: RefCell<HashMap<String, Vec<Observer>>>,
    pending: RefCell<Vec<(String, Value)>>,
    sync_sink: RefCell<Option<SyncSink>>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Get an attribute value, `Null` if it was never set.
    pub fn get(&self, attr: &str) -> Value {
        self.attrs.borrow().get(attr).cloned().unwrap_or(Value::Null)
    }

    /// Set an attribute value and notify its observers on actual change.
    pub fn set(&self, attr: &str, value: impl Into<Value>) {
        let value = value.into();
        {
            let mut attrs = self.attrs.borrow_mut();
            if attrs.get(attr) == Some(&value) {
                return;
            }
            attrs.insert(attr.to_string(), value.clone());
        }
        self.pending
            .borrow_mut()
            .push((attr.to_string(), value));
        self.notify(attr);
    }

    /// Subscribe to changes of a named attribute.
    pub fn on(&self, attr: &str, observer: impl Fn(&Model) + 'static) {
        self.observers
            .borrow_mut()
            .entry(attr.to_string())
            .or_default()
            .push(Rc::new(observer));
    }

    /// Commit pending local mutations to the authoritative store.
    ///
    /// Mutations are delivered to the sync sink in write order; with no
    /// sink registered they are simply dropped (the host is not listening).
    pub fn touch(&self) {
        let pending = std::mem::take(&mut *self.pending.borrow_mut());
        let sink = self.sync_sink.borrow();
        if let Some(sink) = sink.as_ref() {
            for (attr, value) in &pending {
                sink(attr, value);
            }
        }
    }

    /// Register the sink that receives committed mutations.
    pub fn set_sync_sink(&self, sink: impl Fn(&str, &Value) + 'static) {
        *self.sync_sink.borrow_mut() = Some(Box::new(sink));
    }

    /// Serialize a value into an attribute.
    pub fn set_as<T: Serialize>(&self, attr: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.set(attr, v),
            Err(e) => log::warn!("failed to serialize attribute '{}': {}", attr, e),
        }
    }

    /// Deserialize an attribute value.
    ///
    /// A missing or malformed value yields `None` (with a warning for
    /// malformed payloads); callers fall back to the type's empty form
    /// rather than failing the redraw.
    pub fn get_as<T: DeserializeOwned>(&self, attr: &str) -> Option<T> {
        let value = self.get(attr);
        if value.is_null() {
            return None;
        }
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                log::warn!("malformed attribute '{}': {}", attr, e);
                None
            }
        }
    }

    /// Read a numeric attribute as f32, `None` if missing or not a number.
    pub fn get_f32(&self, attr: &str) -> Option<f32> {
        self.get(attr).as_f64().map(|v| v as f32)
    }

    /// Read a string attribute, `None` if missing or not a string.
    pub fn get_str(&self, attr: &str) -> Option<String> {
        self.get(attr).as_str().map(|s| s.to_string())
    }

    fn notify(&self, attr: &str) {
        // Clone the observer list so no borrow is held while handlers run;
        // handlers may call back into the model.
        let observers: Vec<Observer> = self
            .observers
            .borrow()
            .get(attr)
            .map(|v| v.clone())
            .unwrap_or_default();
        for observer in observers {
            observer(self);
        }
    }
}
