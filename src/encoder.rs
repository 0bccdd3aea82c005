//! QR code rasterisation.

use crate::config::{ErrorCorrection, LayoutConfig};
use crate::error::EncodingError;
use image::{GrayImage, Luma};
use qrcode::{EcLevel, QrCode};

/// 8-bit grayscale raster, white background.
pub type RasterImage = GrayImage;

/// Largest raster side, in pixels, an encoder will produce.
pub const MAX_RASTER_PX: u32 = 8192;

/// Side of a version 40 symbol, the largest QR code.
pub const MAX_SYMBOL_MODULES: u32 = 177;

/// Turns label text into a scannable raster image.
pub trait CodeEncoder {
    /// `target_px` is the preferred side length; the result is square.
    fn encode(&self, text: &str, target_px: u32) -> Result<RasterImage, EncodingError>;
}

impl From<ErrorCorrection> for EcLevel {
    fn from(level: ErrorCorrection) -> Self {
        match level {
            ErrorCorrection::L => EcLevel::L,
            ErrorCorrection::M => EcLevel::M,
            ErrorCorrection::Q => EcLevel::Q,
            ErrorCorrection::H => EcLevel::H,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QrEncoder {
    ec_level: EcLevel,
    quiet_zone: u32,
}

impl QrEncoder {
    pub fn new(ec_level: ErrorCorrection, quiet_zone: u32) -> Self {
        Self {
            ec_level: ec_level.into(),
            quiet_zone,
        }
    }

    pub fn from_config(config: &LayoutConfig) -> Self {
        Self::new(config.qr_error_correction, config.qr_quiet_zone)
    }
}

impl CodeEncoder for QrEncoder {
    /// Modules are scaled by a whole number of pixels so the symbol stays
    /// crisp; the side is the largest such size not above `target_px`, with at
    /// least one pixel per module.
    fn encode(&self, text: &str, target_px: u32) -> Result<RasterImage, EncodingError> {
        let qr_code = QrCode::with_error_correction_level(text.as_bytes(), self.ec_level)
            .map_err(|e| EncodingError::new(text, e))?;

        let modules = qr_code.width() as u32;
        let side_modules = self
            .quiet_zone
            .checked_mul(2)
            .and_then(|border| border.checked_add(modules))
            .ok_or_else(|| EncodingError::new(text, "quiet zone is too wide"))?;
        let scale = (target_px / side_modules).max(1);
        let side = side_modules
            .checked_mul(scale)
            .filter(|side| *side <= MAX_RASTER_PX)
            .ok_or_else(|| {
                EncodingError::new(text, format!("raster exceeds {} px", MAX_RASTER_PX))
            })?;

        let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));
        for (i, color) in qr_code.to_colors().iter().enumerate() {
            if *color != qrcode::Color::Dark {
                continue;
            }
            let mx = i as u32 % modules + self.quiet_zone;
            let my = i as u32 / modules + self.quiet_zone;
            for dy in 0..scale {
                for dx in 0..scale {
                    img.put_pixel(mx * scale + dx, my * scale + dy, Luma([0u8]));
                }
            }
        }

        Ok(img)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn produces_square_image_within_target() {
        let encoder = QrEncoder::new(ErrorCorrection::M, 1);
        let img = encoder.encode("Bookie-MU25-000005", 240).unwrap();
        assert_eq!(img.width(), img.height());
        assert!(img.width() <= 240);
        assert!(img.width() > 120);
    }

    #[test]
    fn quiet_zone_is_light_and_finder_is_dark() {
        let encoder = QrEncoder::new(ErrorCorrection::M, 1);
        let img = encoder.encode("Bookie-MU25-000005", 270).unwrap();
        let modules = QrCode::with_error_correction_level(b"Bookie-MU25-000005", EcLevel::M)
            .unwrap()
            .width() as u32;
        let scale = img.width() / (modules + 2);

        assert_eq!(img.width() % (modules + 2), 0);
        assert_eq!(img.get_pixel(0, 0)[0], 255);
        assert_eq!(img.get_pixel(scale, scale)[0], 0);
    }

    #[test]
    fn no_quiet_zone_starts_with_finder() {
        let encoder = QrEncoder::new(ErrorCorrection::L, 0);
        let img = encoder.encode("ABC", 100).unwrap();
        assert_eq!(img.get_pixel(0, 0)[0], 0);
    }

    #[test]
    fn tiny_target_still_gives_one_pixel_per_module() {
        let encoder = QrEncoder::new(ErrorCorrection::M, 1);
        let img = encoder.encode("A", 5).unwrap();
        // version 1: 21 modules + 2 quiet modules
        assert_eq!(img.width(), 23);
    }

    #[test]
    fn oversized_data_is_an_encoding_error() {
        let encoder = QrEncoder::new(ErrorCorrection::H, 1);
        let text = "x".repeat(8000);
        let err = encoder.encode(&text, 200).unwrap_err();
        assert_eq!(err.label, text);
    }

    #[test]
    fn huge_quiet_zone_is_an_encoding_error() {
        let encoder = QrEncoder::new(ErrorCorrection::M, 3_000_000_000);
        let err = encoder.encode("Bookie-MU25-000001", 200).unwrap_err();
        assert_eq!(err.reason, "quiet zone is too wide");
    }

    #[test]
    fn huge_target_is_an_encoding_error() {
        let encoder = QrEncoder::new(ErrorCorrection::M, 1);
        let err = encoder.encode("Bookie-MU25-000001", u32::MAX).unwrap_err();
        assert!(err.reason.contains("8192"));
    }

    #[test]
    fn quiet_zone_wider_than_limit_is_an_encoding_error() {
        let encoder = QrEncoder::new(ErrorCorrection::M, MAX_RASTER_PX);
        assert!(encoder.encode("A", 1).is_err());
    }
}
