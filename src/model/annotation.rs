//! Annotated boxes as exchanged with the host model.

use serde::{Deserialize, Serialize};

use super::rect::Rect;
use super::style::BoxStyle;

/// A rectangular annotation with optional label text and styling.
///
/// Boxes are immutable value objects from the renderer's point of view.
/// Equality is structural, which is also how selection comparisons work:
/// two boxes with the same fields are the same box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxAnnotation {
    /// Index of the source record this box came from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u64>,
    /// Rectangle in original-image pixel coordinates
    #[serde(rename = "box")]
    pub rect: Rect,
    /// Optional label drawn at the box's top-left corner
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Style properties; missing ones resolve against the default style
    #[serde(default)]
    pub style: BoxStyle,
}

impl BoxAnnotation {
    /// Create a plain box with no label, style or source index.
    pub fn new(rect: Rect) -> Self {
        Self {
            index: None,
            rect,
            text: None,
            style: BoxStyle::default(),
        }
    }

    /// Attach label text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Attach style properties.
    pub fn with_style(mut self, style: BoxStyle) -> Self {
        self.style = style;
        self
    }

    /// Attach the source record index.
    pub fn with_index(mut self, index: u64) -> Self {
        self.index = Some(index);
        self
    }
}

/// An ordered collection of boxes; a slot may be empty.
///
/// Order is render order: later boxes draw on top of earlier ones. Empty
/// slots mean "nothing to draw" and are skipped everywhere.
pub type BoxCollection = Vec<Option<BoxAnnotation>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_equality() {
        let a = BoxAnnotation::new(Rect::new(1.0, 2.0, 3.0, 4.0)).with_text("cat");
        let b = BoxAnnotation::new(Rect::new(1.0, 2.0, 3.0, 4.0)).with_text("cat");
        let c = BoxAnnotation::new(Rect::new(1.0, 2.0, 3.0, 5.0)).with_text("cat");

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_wire_format() {
        let ann = BoxAnnotation::new(Rect::new(10.0, 20.0, 30.0, 40.0))
            .with_index(7)
            .with_text("dog");
        let json = serde_json::to_value(&ann).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "index": 7,
                "box": {"x": 10.0, "y": 20.0, "width": 30.0, "height": 40.0},
                "text": "dog",
                "style": {},
            })
        );
    }

    #[test]
    fn test_deserialize_minimal() {
        let json = serde_json::json!({
            "box": {"x": 0.0, "y": 0.0, "width": 5.0, "height": 5.0}
        });
        let ann: BoxAnnotation = serde_json::from_value(json).unwrap();
        assert_eq!(ann.index, None);
        assert_eq!(ann.text, None);
        assert_eq!(ann.style, BoxStyle::default());
    }

    #[test]
    fn test_collection_with_empty_slots() {
        let boxes: BoxCollection = vec![
            Some(BoxAnnotation::new(Rect::new(0.0, 0.0, 1.0, 1.0))),
            None,
            Some(BoxAnnotation::new(Rect::new(2.0, 2.0, 1.0, 1.0))),
        ];
        let json = serde_json::to_value(&boxes).unwrap();
        let back: BoxCollection = serde_json::from_value(json).unwrap();
        assert_eq!(back, boxes);
        assert!(back[1].is_none());
    }
}
