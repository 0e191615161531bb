//! Error types for image loading and attribute plumbing.

use thiserror::Error;

/// Errors that can occur while loading images or decoding attribute data.
///
/// Rendering itself never fails: drawing against missing images, null boxes
/// or unparseable colors produces an empty visual result instead of an error.
#[derive(Error, Debug)]
pub enum InspectError {
    /// I/O error while reading an image source
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode error
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON decode error for an attribute payload
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image source string that no decoder understands
    #[error("unsupported image source: {src}")]
    UnsupportedSource {
        /// The offending source string (truncated for data URLs)
        src: String,
    },

    /// Malformed data URL payload
    #[error("invalid data URL: {message}")]
    InvalidDataUrl {
        /// Description of what was wrong with the payload
        message: String,
    },
}

impl InspectError {
    /// Create an unsupported-source error, truncating long sources.
    pub fn unsupported_source(source: &str) -> Self {
        let mut truncated: String = source.chars().take(64).collect();
        if truncated.len() < source.len() {
            truncated.push('…');
        }
        Self::UnsupportedSource { src: truncated }
    }

    /// Create an invalid data URL error with a message.
    pub fn invalid_data_url(message: impl Into<String>) -> Self {
        Self::InvalidDataUrl {
            message: message.into(),
        }
    }
}
