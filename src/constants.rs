//! Global constants for the imspect widgets

/// Default target viewport width for image-backed views
pub const DEFAULT_VIEW_WIDTH: f32 = 600.0;

/// Default target viewport height for image-backed views
pub const DEFAULT_VIEW_HEIGHT: f32 = 400.0;

/// Name given to the background image decode thread
pub const DECODER_THREAD_NAME: &str = "image-decoder";
