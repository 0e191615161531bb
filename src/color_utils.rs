//! Color string parsing shared across the rendering code.
//!
//! Style attributes carry colors as strings (`"#ff000080"`, `"red"`). An
//! unparseable color yields `None` and the renderer simply draws nothing
//! with it, so bad values degrade silently instead of erroring.

use image::Rgba;

/// CSS basic named colors plus a few common extras.
const NAMED_COLORS: &[(&str, [u8; 4])] = &[
    ("black", [0x00, 0x00, 0x00, 0xff]),
    ("silver", [0xc0, 0xc0, 0xc0, 0xff]),
    ("gray", [0x80, 0x80, 0x80, 0xff]),
    ("grey", [0x80, 0x80, 0x80, 0xff]),
    ("white", [0xff, 0xff, 0xff, 0xff]),
    ("maroon", [0x80, 0x00, 0x00, 0xff]),
    ("red", [0xff, 0x00, 0x00, 0xff]),
    ("purple", [0x80, 0x00, 0x80, 0xff]),
    ("fuchsia", [0xff, 0x00, 0xff, 0xff]),
    ("magenta", [0xff, 0x00, 0xff, 0xff]),
    ("green", [0x00, 0x80, 0x00, 0xff]),
    ("lime", [0x00, 0xff, 0x00, 0xff]),
    ("olive", [0x80, 0x80, 0x00, 0xff]),
    ("yellow", [0xff, 0xff, 0x00, 0xff]),
    ("navy", [0x00, 0x00, 0x80, 0xff]),
    ("blue", [0x00, 0x00, 0xff, 0xff]),
    ("teal", [0x00, 0x80, 0x80, 0xff]),
    ("aqua", [0x00, 0xff, 0xff, 0xff]),
    ("cyan", [0x00, 0xff, 0xff, 0xff]),
    ("orange", [0xff, 0xa5, 0x00, 0xff]),
    ("transparent", [0x00, 0x00, 0x00, 0x00]),
];

/// Parse a color string into an RGBA pixel.
///
/// Accepts `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa` and the CSS basic named
/// colors (case-insensitive). Returns `None` for anything else.
pub fn parse_color(s: &str) -> Option<Rgba<u8>> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }

    let lower = s.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, rgba)| Rgba(*rgba))
}

fn parse_hex(hex: &str) -> Option<Rgba<u8>> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }

    let component = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
    // Single-digit forms duplicate the nibble: "f" -> 0xff.
    let nibble = |i: usize| {
        u8::from_str_radix(&hex[i..i + 1], 16)
            .ok()
            .map(|v| v << 4 | v)
    };

    match hex.len() {
        3 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, 0xff])),
        4 => Some(Rgba([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
        6 => Some(Rgba([
            component(0..2)?,
            component(2..4)?,
            component(4..6)?,
            0xff,
        ])),
        8 => Some(Rgba([
            component(0..2)?,
            component(2..4)?,
            component(4..6)?,
            component(6..8)?,
        ])),
        _ => None,
    }
}
