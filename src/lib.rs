//! imspect - interactive image inspection widgets
//!
//! Widgets for inspecting images that carry bounding boxes: a box overlay
//! with pointer-driven hover/active selection, a crop view that zooms into
//! a selected region, and a detail table for record metadata. State lives
//! in a host-framework model consumed through the seam in [`host`]; the
//! views render into CPU pixel surfaces the host presents.

pub mod color_utils;
pub mod constants;
pub mod error;
pub mod hit;
pub mod host;
pub mod inspector;
pub mod loader;
pub mod model;
pub mod render;
pub mod selection;
pub mod views;

pub use error::InspectError;
pub use host::Model;
pub use inspector::{Inspector, InspectorConfig};
pub use model::{BoxAnnotation, BoxCollection, BoxStyle, Highlight, Rect};
pub use views::{BoxOverlayView, CropView, DetailTableView};
