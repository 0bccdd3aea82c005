//! Label text for a numeric id.

use crate::config::LayoutConfig;

/// Formats ids as `prefix + zero-padded id`.
#[derive(Debug, Clone)]
pub struct LabelFormatter {
    prefix: String,
    pad_length: usize,
}

impl LabelFormatter {
    pub fn new(prefix: impl Into<String>, pad_length: usize) -> Self {
        Self {
            prefix: prefix.into(),
            pad_length,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.prefix.clone(), config.pad_length)
    }

    /// Ids wider than the pad length are kept whole; the field just grows.
    pub fn format(&self, id: u64) -> String {
        format!("{}{:0>width$}", self.prefix, id, width = self.pad_length)
    }

    /// True when `id` has more digits than the nominal field.
    pub fn overflows(&self, id: u64) -> bool {
        digit_count(id) > self.pad_length
    }
}

fn digit_count(mut id: u64) -> usize {
    let mut digits = 1;
    while id >= 10 {
        id /= 10;
        digits += 1;
    }
    digits
}
