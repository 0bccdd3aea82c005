//! PDF content stream generation for one page.
//!
//! This module provides:
//! - Image XObject embedding for code rasters
//! - Caption text placement
//! - Stroked (optionally dashed) lines
//!
//! Callers work in top-left coordinates; the builder flips the Y axis.

use anyhow::Result;
use lopdf::{Dictionary, Document, Object, Stream};
use std::io::Write;

use super::fonts::CaptionFont;
use super::resources::CAPTION_FONT;
use super::{LineStyle, TextAlign};
use crate::encoder::RasterImage;
use crate::layout::Segment;

/// Builder for one page's content stream and the XObjects it paints
pub struct ContentBuilder {
    pub content_parts: Vec<String>,
    pub xobjects: Dictionary,
    page_height: f64,
}

impl ContentBuilder {
    pub fn new(page_height: f64) -> Self {
        Self {
            content_parts: Vec::new(),
            xobjects: Dictionary::new(),
            page_height,
        }
    }

    /// Embed `image` and paint it as a `size`-point square at `(x, y)`.
    pub fn add_image(
        &mut self,
        doc: &mut Document,
        image: &RasterImage,
        x: f64,
        y: f64,
        size: f64,
    ) -> Result<()> {
        let compressed_bytes = compress_data(image.as_raw())?;

        let mut img_dict = Dictionary::new();
        img_dict.set("Type", "XObject");
        img_dict.set("Subtype", "Image");
        img_dict.set("Width", image.width() as i64);
        img_dict.set("Height", image.height() as i64);
        img_dict.set("ColorSpace", "DeviceGray");
        img_dict.set("BitsPerComponent", 8_i64);
        img_dict.set("Interpolate", false);
        img_dict.set("Filter", "FlateDecode");

        let img_id = doc.add_object(Stream::new(img_dict, compressed_bytes));
        let img_name = format!("Im{}", img_id.0);
        self.xobjects.set(img_name.clone(), Object::Reference(img_id));

        let bottom = self.page_height - y - size;
        self.content_parts.push(format!(
            "q {:.3} 0 0 {:.3} {:.3} {:.3} cm /{} Do Q\n",
            size, size, x, bottom, img_name
        ));
        Ok(())
    }

    /// Add one line of caption text whose top edge sits at `y`.
    #[allow(clippy::too_many_arguments)]
    pub fn add_text(
        &mut self,
        font: &CaptionFont,
        font_size: f64,
        text: &str,
        x: f64,
        y: f64,
        width: f64,
        align: TextAlign,
    ) {
        let text_width = font.text_width(text, font_size);
        let x = match align {
            TextAlign::Left => x,
            TextAlign::Center => x + (width - text_width) / 2.0,
            TextAlign::Right => x + width - text_width,
        };
        let baseline = self.page_height - y - font.ascent(font_size);

        self.content_parts.push(format!(
            "BT 0 g /{} {:.3} Tf {:.3} {:.3} Td {} Tj ET\n",
            CAPTION_FONT,
            font_size,
            x,
            baseline,
            font.encode(text)
        ));
    }

    pub fn add_line(&mut self, segment: Segment, style: &LineStyle) {
        let dash = match style.dash {
            Some((on, off)) => format!("[{:.3} {:.3}] 0 d", on, off),
            None => "[] 0 d".to_string(),
        };
        self.content_parts.push(format!(
            "q {:.3} {:.3} {:.3} RG {:.3} w {} {:.3} {:.3} m {:.3} {:.3} l S Q\n",
            style.color.r,
            style.color.g,
            style.color.b,
            style.width,
            dash,
            segment.x1,
            self.page_height - segment.y1,
            segment.x2,
            self.page_height - segment.y2,
        ));
    }

    /// Build the final content bytes
    pub fn build_content_bytes(&self) -> Vec<u8> {
        self.content_parts.concat().into_bytes()
    }
}

/// Compress data using zlib/flate2
pub fn compress_data(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
