//! Error kinds raised by the layout engine and its collaborators.

use thiserror::Error;

/// Invalid geometry detected at startup. Fatal: nothing has been written yet.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("columns must be at least 1")]
    NoColumns,

    #[error("rows must be at least 1")]
    NoRows,

    #[error("{field} must be a finite, non-negative number (got {value})")]
    InvalidDimension { field: &'static str, value: f64 },

    #[error(
        "margins of {margin} pt leave no printable area on a {page_width} x {page_height} pt page"
    )]
    NoPrintableArea {
        margin: f64,
        page_width: f64,
        page_height: f64,
    },

    #[error("qr_pixels_per_point must be a finite number above zero (got {0})")]
    InvalidPixelDensity(f64),

    #[error("QR rasters would be {side} px wide, above the {max} px limit")]
    RasterTooLarge { side: u64, max: u32 },
}

/// A single label could not be turned into a code image. Not fatal.
#[derive(Debug, Error)]
#[error("failed to encode {label:?}: {reason}")]
pub struct EncodingError {
    pub label: String,
    pub reason: String,
}

impl EncodingError {
    pub fn new(label: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            label: label.into(),
            reason: reason.to_string(),
        }
    }
}
