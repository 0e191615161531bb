//! Label text rasterization.
//!
//! Fonts come from the embedding application through a [`FontStore`]; the
//! crate ships none of its own. With no matching font registered, label
//! drawing silently does nothing, the same way an unparseable color draws
//! nothing.

use std::collections::HashMap;

use ab_glyph::{point, Font, FontArc, ScaleFont};
use image::Rgba;

use super::surface::Surface;

/// Fallback font pixel size when the font string is unparseable.
const FALLBACK_SIZE: f32 = 10.0;

/// A parsed font specification: pixel size plus family name.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    /// Glyph size in pixels
    pub size: f32,
    /// Font family name, e.g. "sans-serif"
    pub family: String,
}

impl FontSpec {
    /// Parse a `"10px sans-serif"` style font string.
    ///
    /// The first token must be a `<number>px` size; the remainder is the
    /// family name. Anything unparseable falls back to 10px sans-serif,
    /// matching the built-in default font.
    pub fn parse(s: &str) -> FontSpec {
        let mut tokens = s.split_whitespace();
        let size = tokens
            .next()
            .and_then(|t| t.strip_suffix("px"))
            .and_then(|t| t.parse::<f32>().ok())
            .filter(|v| *v > 0.0);
        let family = tokens.collect::<Vec<_>>().join(" ");

        match size {
            Some(size) if !family.is_empty() => FontSpec { size, family },
            _ => FontSpec {
                size: FALLBACK_SIZE,
                family: "sans-serif".to_string(),
            },
        }
    }
}

/// Registry of fonts available for label rendering, keyed by family name.
#[derive(Default)]
pub struct FontStore {
    fonts: HashMap<String, FontArc>,
    fallback: Option<FontArc>,
}

impl FontStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a font under a family name.
    pub fn register(&mut self, family: impl Into<String>, font: FontArc) {
        let family = family.into();
        if self.fallback.is_none() {
            self.fallback = Some(font.clone());
        }
        self.fonts.insert(family, font);
    }

    /// Look up a family, falling back to the first registered font.
    pub fn lookup(&self, family: &str) -> Option<&FontArc> {
        self.fonts.get(family).or(self.fallback.as_ref())
    }

    /// Whether any font has been registered.
    pub fn is_empty(&self) -> bool {
        self.fallback.is_none()
    }
}

/// Draw a single line of text onto a surface.
///
/// `(x, y)` is the top-left corner of the text box. Glyphs advance until
/// the next one would cross `x + max_width`; whole glyphs past the limit
/// are dropped rather than condensed.
pub fn draw_text(
    surface: &mut Surface,
    font: &FontArc,
    text: &str,
    x: f32,
    y: f32,
    size: f32,
    color: Rgba<u8>,
    max_width: f32,
) {
    if text.is_empty() || size <= 0.0 || max_width <= 0.0 {
        return;
    }
    let scaled = font.as_scaled(size);
    let mut caret = point(x, y + scaled.ascent());
    for ch in text.chars() {
        let mut glyph = scaled.scaled_glyph(ch);
        let advance = scaled.h_advance(glyph.id);
        if caret.x + advance > x + max_width {
            break;
        }
        glyph.position = caret;
        caret.x += advance;
        if let Some(outlined) = scaled.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = gx as i32 + bounds.min.x as i32;
                let py = gy as i32 + bounds.min.y as i32;
                surface.blend_pixel(px, py, color, coverage);
            });
        }
    }
}
