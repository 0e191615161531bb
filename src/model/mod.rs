//! Core data model: rectangles, styles, and annotated boxes.

mod annotation;
mod rect;
mod style;

pub use annotation::{BoxAnnotation, BoxCollection};
pub use rect::Rect;
pub use style::{BoxStyle, Highlight};
