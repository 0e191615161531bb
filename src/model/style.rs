//! Box style properties and the style resolver.
//!
//! A box carries a partial set of style properties; missing properties are
//! filled from a shared default style, and anything absent from both falls
//! back to the built-in defaults below. Resolution always produces a fresh
//! value: the box's own style and the shared defaults are never written
//! through, so they stay valid for later equality comparisons.

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::color_utils::parse_color;

/// Built-in fallback stroke width.
pub const DEFAULT_STROKE_WIDTH: f32 = 2.0;
/// Built-in fallback stroke color.
pub const DEFAULT_STROKE: &str = "red";
/// Built-in fallback fill color (fully transparent).
pub const DEFAULT_FILL: &str = "#00000000";
/// Built-in fallback fill color while hovered.
pub const DEFAULT_HOVER_FILL: &str = "#00000088";
/// Built-in fallback stroke color while hovered.
pub const DEFAULT_HOVER_STROKE: &str = "blue";
/// Built-in fallback fill color while active.
pub const DEFAULT_ACTIVE_FILL: &str = "#ffffff22";
/// Built-in fallback stroke color while active.
pub const DEFAULT_ACTIVE_STROKE: &str = "green";
/// Built-in fallback label font.
pub const DEFAULT_FONT: &str = "10px sans-serif";

/// Pointer-driven highlight state of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    /// Not hovered, not active
    #[default]
    None,
    /// Under the pointer
    Hover,
    /// Confirmed by click
    Active,
}

/// Style properties for drawing a box.
///
/// Every property is optional; a box usually carries only a few and the
/// rest come from the widget's default style at draw time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxStyle {
    /// Outline width in canvas pixels (not scaled with the image)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<f32>,
    /// Outline color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stroke_style: Option<String>,
    /// Interior fill color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    /// Fill color substituted while the box is hovered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_fill: Option<String>,
    /// Stroke color substituted while the box is hovered
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hover_stroke: Option<String>,
    /// Fill color substituted while the box is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_fill: Option<String>,
    /// Stroke color substituted while the box is active
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_stroke: Option<String>,
    /// Label font, e.g. "10px sans-serif"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
}

impl BoxStyle {
    /// Merge this style with a default style, producing a new value.
    ///
    /// Shallow per-property merge: properties present here win, properties
    /// absent here are copied from `defaults`. Neither input is mutated.
    pub fn resolve(&self, defaults: &BoxStyle) -> BoxStyle {
        BoxStyle {
            stroke_width: self.stroke_width.or(defaults.stroke_width),
            stroke_style: self.stroke_style.clone().or_else(|| defaults.stroke_style.clone()),
            fill_style: self.fill_style.clone().or_else(|| defaults.fill_style.clone()),
            hover_fill: self.hover_fill.clone().or_else(|| defaults.hover_fill.clone()),
            hover_stroke: self.hover_stroke.clone().or_else(|| defaults.hover_stroke.clone()),
            active_fill: self.active_fill.clone().or_else(|| defaults.active_fill.clone()),
            active_stroke: self.active_stroke.clone().or_else(|| defaults.active_stroke.clone()),
            font: self.font.clone().or_else(|| defaults.font.clone()),
        }
    }

    /// Return a copy with fill/stroke substituted for the highlight state.
    ///
    /// The hover and active variants draw from a fresh copy; the original
    /// style is left untouched.
    pub fn for_state(&self, state: Highlight) -> BoxStyle {
        let mut style = self.clone();
        match state {
            Highlight::None => {}
            Highlight::Hover => {
                style.fill_style = Some(
                    self.hover_fill
                        .clone()
                        .unwrap_or_else(|| DEFAULT_HOVER_FILL.to_string()),
                );
                style.stroke_style = Some(
                    self.hover_stroke
                        .clone()
                        .unwrap_or_else(|| DEFAULT_HOVER_STROKE.to_string()),
                );
            }
            Highlight::Active => {
                style.fill_style = Some(
                    self.active_fill
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ACTIVE_FILL.to_string()),
                );
                style.stroke_style = Some(
                    self.active_stroke
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ACTIVE_STROKE.to_string()),
                );
            }
        }
        style
    }

    /// Effective stroke width, falling back to the built-in default.
    pub fn stroke_width(&self) -> f32 {
        self.stroke_width.unwrap_or(DEFAULT_STROKE_WIDTH)
    }

    /// Effective stroke color, or `None` if the color string is invalid.
    pub fn stroke_color(&self) -> Option<Rgba<u8>> {
        parse_color(self.stroke_style.as_deref().unwrap_or(DEFAULT_STROKE))
    }

    /// Effective fill color, or `None` if the color string is invalid.
    pub fn fill_color(&self) -> Option<Rgba<u8>> {
        parse_color(self.fill_style.as_deref().unwrap_or(DEFAULT_FILL))
    }

    /// Effective label font string.
    pub fn font(&self) -> &str {
        self.font.as_deref().unwrap_or(DEFAULT_FONT)
    }
}
