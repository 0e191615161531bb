//! Software rendering: pixel surfaces and label text.

mod surface;
mod text;

pub use surface::Surface;
pub use text::{draw_text, FontSpec, FontStore};
