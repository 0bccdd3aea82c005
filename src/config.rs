//! Configuration for a label sheet.
//!
//! This module handles:
//! - The compiled-in default layout (`LayoutConfig::default`)
//! - Loading an optional settings.json over those defaults
//! - Unit conversion for dimensions (mm, cm, in, pt)
//! - Hex colour parsing for grid lines

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Dimension value that can be specified as:
/// - A number (interpreted as points)
/// - A string with unit: e.g., "20 mm", "2cm", "1 in" (inches)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension(pub f64);

impl Dimension {
    /// Convert to points (internal PDF unit)
    pub fn as_points(&self) -> f64 {
        self.0
    }
}

impl FromStr for Dimension {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        let split = value
            .find(|c: char| c.is_whitespace() || c.is_ascii_alphabetic())
            .unwrap_or(value.len());
        let (num_str, unit) = value.split_at(split);
        let num_str = num_str.trim();
        let unit = unit.trim().to_lowercase();

        let num: f64 = num_str
            .parse()
            .map_err(|_| format!("invalid number in dimension: {}", num_str))?;

        // 1 inch = 72 points (PDF default unit)
        let points = match unit.as_str() {
            "" | "pt" | "point" | "points" => num,
            "mm" => num * 72.0 / 25.4,
            "cm" => num * 72.0 / 2.54,
            "in" | "inch" | "inches" => num * 72.0,
            _ => {
                return Err(format!(
                    "unknown unit '{}'. Supported: mm, cm, in, pt",
                    unit
                ));
            }
        };

        Ok(Dimension(points))
    }
}

impl<'de> Deserialize<'de> for Dimension {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DimensionVisitor;

        impl serde::de::Visitor<'_> for DimensionVisitor {
            type Value = Dimension;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str(
                    "a number or a string with unit (e.g., \"20 mm\", \"2 cm\", \"1 in\")",
                )
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value as f64))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value as f64))
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Dimension(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                value.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(DimensionVisitor)
    }
}

/// RGB stroke colour, each channel in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub fn gray(level: f64) -> Self {
        Self {
            r: level,
            g: level,
            b: level,
        }
    }
}

impl FromStr for Color {
    type Err = String;

    /// Accepts `#rgb` and `#rrggbb`.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let hex = value
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| format!("colour must start with '#': {}", value))?;
        if !hex.is_ascii() {
            return Err(format!("invalid hex colour: {}", value));
        }

        let channel = |digits: &str| -> Result<f64, String> {
            u8::from_str_radix(digits, 16)
                .map(|v| v as f64 / 255.0)
                .map_err(|_| format!("invalid hex colour: {}", value))
        };

        match hex.len() {
            3 => {
                let expand = |i: usize| hex[i..i + 1].repeat(2);
                Ok(Color {
                    r: channel(&expand(0))?,
                    g: channel(&expand(1))?,
                    b: channel(&expand(2))?,
                })
            }
            6 => Ok(Color {
                r: channel(&hex[0..2])?,
                g: channel(&hex[2..4])?,
                b: channel(&hex[4..6])?,
            }),
            _ => Err(format!("colour must be #rgb or #rrggbb: {}", value)),
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// On/off lengths of a dashed stroke.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DashPattern {
    pub on: Dimension,
    pub off: Dimension,
}

/// QR error-correction level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum ErrorCorrection {
    L,
    #[default]
    M,
    Q,
    H,
}

/// Immutable description of one label sheet run.
///
/// Every field has a compiled-in default; a settings file only needs the
/// fields it changes.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub start_id: u64,
    pub end_id: u64,
    pub prefix: String,
    pub pad_length: usize,
    pub columns: u32,
    pub rows: u32,
    pub page_width: Dimension,
    pub page_height: Dimension,
    pub margin: Dimension,
    pub text_margin: Dimension,
    pub font_size: Dimension,
    /// Standard PDF font used for captions.
    pub font: String,
    pub show_grid_lines: bool,
    pub grid_line_width: Dimension,
    pub grid_line_color: Color,
    /// `None` draws solid grid lines.
    pub grid_line_dash: Option<DashPattern>,
    pub qr_error_correction: ErrorCorrection,
    /// Light border around each symbol, in modules.
    pub qr_quiet_zone: u32,
    /// Raster pixels per point of printed code size.
    pub qr_pixels_per_point: f64,
    pub output_file: PathBuf,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_id: 1,
            end_id: 1000,
            prefix: "Bookie-MU25-".to_string(),
            pad_length: 6,
            columns: 8,
            rows: 10,
            // US Letter
            page_width: Dimension(612.0),
            page_height: Dimension(792.0),
            margin: Dimension(20.0),
            text_margin: Dimension(3.0),
            font_size: Dimension(6.0),
            font: "Helvetica".to_string(),
            show_grid_lines: true,
            grid_line_width: Dimension(0.5),
            grid_line_color: Color::gray(0xcc as f64 / 255.0),
            grid_line_dash: Some(DashPattern {
                on: Dimension(3.0),
                off: Dimension(2.0),
            }),
            qr_error_correction: ErrorCorrection::M,
            qr_quiet_zone: 1,
            qr_pixels_per_point: 4.0,
            output_file: PathBuf::from("qr-codes.pdf"),
        }
    }
}

impl LayoutConfig {
    /// Page size in points as `(width, height)`.
    pub fn page_size(&self) -> (f64, f64) {
        (self.page_width.as_points(), self.page_height.as_points())
    }

    pub fn codes_per_page(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}

/// Helper function to open a file with consistent error context
fn open_file_with_context(path: &Path, description: &str) -> Result<File> {
    File::open(path)
        .with_context(|| format!("Failed to open {} at {:?}", description, path))
}

/// Load a settings file over the compiled-in defaults.
pub fn load_settings_config(path: &Path) -> Result<LayoutConfig> {
    let file = open_file_with_context(path, "settings file")?;
    let reader = BufReader::new(file);
    let config: LayoutConfig = serde_json::from_reader(reader)
        .with_context(|| format!("Failed to parse settings file {:?}", path))?;
    Ok(config)
}
