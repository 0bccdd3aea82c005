//! PDF output for label sheets.
//!
//! The layout engine talks to a [`PageRenderer`]; [`PdfSheetRenderer`] is the
//! lopdf-backed implementation that writes the final document.

mod content;
mod document;
mod fonts;
mod resources;

use anyhow::Result;

use crate::config::{Color, LayoutConfig};
use crate::encoder::RasterImage;
use crate::layout::Segment;

pub use document::PdfSheetRenderer;

/// Horizontal alignment of text inside its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// Stroke settings for a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub width: f64,
    pub color: Color,
    /// `(on, off)` dash lengths; `None` strokes a solid line.
    pub dash: Option<(f64, f64)>,
}

impl LineStyle {
    pub fn grid(config: &LayoutConfig) -> Self {
        Self {
            width: config.grid_line_width.as_points(),
            color: config.grid_line_color,
            dash: config
                .grid_line_dash
                .map(|d| (d.on.as_points(), d.off.as_points())),
        }
    }
}

/// Paged drawing surface. Coordinates are points from the top-left corner of
/// the current page.
pub trait PageRenderer {
    /// Start a new page; every drawing call targets the latest page.
    fn new_page(&mut self) -> Result<()>;

    /// Paint a square image with its top-left corner at `(x, y)`.
    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64, size: f64) -> Result<()>;

    /// Draw one caption line whose top edge is at `y`, aligned inside a box
    /// `width` points wide starting at `x`.
    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        width: f64,
        align: TextAlign,
    ) -> Result<()>;

    fn draw_line(&mut self, segment: Segment, style: &LineStyle) -> Result<()>;

    /// Rendered width of `text` in the caption font.
    fn text_width(&self, text: &str) -> f64;

    /// Write the finished document out.
    fn finalize(&mut self) -> Result<()>;
}
