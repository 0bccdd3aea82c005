//! Sheet generation: walks the id range page by page and drives the encoder
//! and renderer.

use anyhow::Result;
use log::{debug, error, info, warn};

use crate::config::LayoutConfig;
use crate::encoder::CodeEncoder;
use crate::label::LabelFormatter;
use crate::layout::{LabelItem, PageGeometry, Paginator};
use crate::pdf::{LineStyle, PageRenderer, TextAlign};

/// Outcome of a run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SheetSummary {
    pub pages: u64,
    /// Codes successfully drawn.
    pub placed: u64,
    /// Labels whose code could not be encoded, in id order.
    pub failed: Vec<String>,
}

/// Generate the whole sheet and finalize the document.
///
/// Encoding failures are logged and skipped; the failing item's cell stays
/// empty and later items keep their positions. Renderer failures abort.
pub fn generate_sheet<E, R>(
    config: &LayoutConfig,
    geometry: &PageGeometry,
    encoder: &E,
    renderer: &mut R,
) -> Result<SheetSummary>
where
    E: CodeEncoder,
    R: PageRenderer,
{
    let formatter = LabelFormatter::from_config(config);
    let paginator = Paginator::from_config(config);
    if paginator.total_items() > 0 && formatter.overflows(config.end_id) {
        warn!(
            "Ids up to {} are wider than pad_length {}; labels will grow past the field",
            config.end_id, config.pad_length
        );
    }

    let grid_style = config.show_grid_lines.then(|| LineStyle::grid(config));

    info!(
        "Laying out {} codes on {} pages",
        paginator.total_items(),
        paginator.page_count()
    );

    let mut summary = SheetSummary::default();
    for page in paginator {
        info!("Generating page {} with {} QR codes...", page.number, page.len);
        debug!("Page {} covers ids {}..={}", page.number, page.first_id, page.last_id());
        renderer.new_page()?;

        // Lines first so codes and captions sit on top
        if let Some(style) = &grid_style {
            for segment in geometry.grid_lines() {
                renderer.draw_line(segment, style)?;
            }
        }

        for item in page.items(&formatter) {
            if place_label(&item, geometry, encoder, renderer)? {
                summary.placed += 1;
            } else {
                summary.failed.push(item.text);
            }
        }
        summary.pages += 1;
    }

    renderer.finalize()?;
    info!(
        "Finished {} pages: {} codes placed, {} failed",
        summary.pages,
        summary.placed,
        summary.failed.len()
    );
    Ok(summary)
}

/// Draw one code and its caption. Returns `false` when encoding failed.
fn place_label<E, R>(
    item: &LabelItem,
    geometry: &PageGeometry,
    encoder: &E,
    renderer: &mut R,
) -> Result<bool>
where
    E: CodeEncoder,
    R: PageRenderer,
{
    let image = match encoder.encode(&item.text, geometry.raster_px) {
        Ok(image) => image,
        Err(err) => {
            error!("Error generating QR code for {}: {}", item.text, err.reason);
            return Ok(false);
        }
    };

    let (code_x, code_y) = geometry.code_origin(item.cell);
    renderer.draw_image(&image, code_x, code_y, geometry.code_size)?;

    let text_width = renderer.text_width(&item.text);
    let (text_x, text_y) = geometry.caption_origin(item.cell, text_width);
    renderer.draw_text(&item.text, text_x, text_y, text_width, TextAlign::Center)?;
    Ok(true)
}
