use crate::config::LayoutConfig;
use crate::encoder::{MAX_RASTER_PX, MAX_SYMBOL_MODULES};
use crate::error::ConfigError;

/// Grid slot on a page, row-major from the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    /// Cell holding the `index`-th item of a page.
    pub fn at(index: u64, columns: u32) -> Self {
        let columns = columns as u64;
        Self {
            row: (index / columns) as u32,
            col: (index % columns) as u32,
        }
    }
}

/// Straight segment in top-left page coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

/// Grid measurements shared by every page of a run.
///
/// All values are points, measured from the top-left corner of the page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub margin: f64,
    /// Printable width (page width minus both margins).
    pub page_width: f64,
    /// Printable height (page height minus both margins).
    pub page_height: f64,
    pub columns: u32,
    pub rows: u32,
    pub col_width: f64,
    pub row_height: f64,
    pub code_size: f64,
    pub font_size: f64,
    pub text_margin: f64,
    /// Raster side requested from the encoder for each code, in pixels.
    pub raster_px: u32,
}

fn check_dimension(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidDimension { field, value })
    }
}

/// Pixel side for a code `code_size` points wide.
///
/// Both the requested side and the largest symbol with its quiet zone at one
/// pixel per module must stay within `MAX_RASTER_PX`.
fn raster_size(config: &LayoutConfig, code_size: f64) -> Result<u32, ConfigError> {
    let density = config.qr_pixels_per_point;
    if !density.is_finite() || density <= 0.0 {
        return Err(ConfigError::InvalidPixelDensity(density));
    }

    let target = (code_size * density).round().max(1.0) as u64;
    let smallest = MAX_SYMBOL_MODULES as u64 + 2 * config.qr_quiet_zone as u64;
    let side = target.max(smallest);
    if side > MAX_RASTER_PX as u64 {
        return Err(ConfigError::RasterTooLarge {
            side,
            max: MAX_RASTER_PX,
        });
    }
    Ok(target as u32)
}

impl PageGeometry {
    pub fn compute(config: &LayoutConfig, page_size: (f64, f64)) -> Result<Self, ConfigError> {
        if config.columns == 0 {
            return Err(ConfigError::NoColumns);
        }
        if config.rows == 0 {
            return Err(ConfigError::NoRows);
        }

        let (full_width, full_height) = page_size;
        let full_width = check_dimension("page_width", full_width)?;
        let full_height = check_dimension("page_height", full_height)?;
        let margin = check_dimension("margin", config.margin.as_points())?;
        let text_margin = check_dimension("text_margin", config.text_margin.as_points())?;
        let font_size = check_dimension("font_size", config.font_size.as_points())?;

        let page_width = full_width - margin * 2.0;
        let page_height = full_height - margin * 2.0;
        if page_width <= 0.0 || page_height <= 0.0 {
            return Err(ConfigError::NoPrintableArea {
                margin,
                page_width: full_width,
                page_height: full_height,
            });
        }

        let col_width = page_width / config.columns as f64;
        let row_height = page_height / config.rows as f64;
        let code_size = (col_width * 0.9).min(row_height * 0.8);

        check_dimension("grid_line_width", config.grid_line_width.as_points())?;
        if let Some(dash) = &config.grid_line_dash {
            check_dimension("grid_line_dash.on", dash.on.as_points())?;
            check_dimension("grid_line_dash.off", dash.off.as_points())?;
        }
        let raster_px = raster_size(config, code_size)?;

        Ok(Self {
            margin,
            page_width,
            page_height,
            columns: config.columns,
            rows: config.rows,
            col_width,
            row_height,
            code_size,
            font_size,
            text_margin,
            raster_px,
        })
    }

    /// Top-left corner of a cell.
    pub fn cell_origin(&self, cell: Cell) -> (f64, f64) {
        (
            self.margin + cell.col as f64 * self.col_width,
            self.margin + cell.row as f64 * self.row_height,
        )
    }

    /// Top-left corner of the code image, centred horizontally and lifted to
    /// leave room for the caption below it.
    pub fn code_origin(&self, cell: Cell) -> (f64, f64) {
        let (cell_x, cell_y) = self.cell_origin(cell);
        (
            cell_x + (self.col_width - self.code_size) / 2.0,
            cell_y + (self.row_height - self.code_size - self.font_size - self.text_margin) / 2.0,
        )
    }

    /// Top-left corner of a caption `text_width` points wide.
    pub fn caption_origin(&self, cell: Cell, text_width: f64) -> (f64, f64) {
        let (cell_x, _) = self.cell_origin(cell);
        let (_, code_y) = self.code_origin(cell);
        (
            cell_x + (self.col_width - text_width) / 2.0,
            code_y + self.code_size + self.text_margin,
        )
    }

    /// Cell boundaries: `columns + 1` verticals followed by `rows + 1`
    /// horizontals, each spanning the whole grid.
    pub fn grid_lines(&self) -> impl Iterator<Item = Segment> + '_ {
        let left = self.margin;
        let top = self.margin;
        let right = self.margin + self.columns as f64 * self.col_width;
        let bottom = self.margin + self.rows as f64 * self.row_height;

        let verticals = (0..=self.columns).map(move |i| {
            let x = left + i as f64 * self.col_width;
            Segment {
                x1: x,
                y1: top,
                x2: x,
                y2: bottom,
            }
        });
        let horizontals = (0..=self.rows).map(move |i| {
            let y = top + i as f64 * self.row_height;
            Segment {
                x1: left,
                y1: y,
                x2: right,
                y2: y,
            }
        });
        verticals.chain(horizontals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DashPattern, Dimension};

    const LETTER: (f64, f64) = (612.0, 792.0);

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn stock_sheet_geometry() {
        let geometry = PageGeometry::compute(&LayoutConfig::default(), LETTER).unwrap();
        assert!(approx(geometry.page_width, 572.0));
        assert!(approx(geometry.page_height, 752.0));
        assert!(approx(geometry.col_width, 71.5));
        assert!(approx(geometry.row_height, 75.2));
        // min(71.5 * 0.9, 75.2 * 0.8) = min(64.35, 60.16)
        assert!(approx(geometry.code_size, 60.16));
    }

    #[test]
    fn code_size_limited_by_width() {
        let config = LayoutConfig {
            columns: 20,
            rows: 2,
            ..LayoutConfig::default()
        };
        let geometry = PageGeometry::compute(&config, LETTER).unwrap();
        assert!(approx(geometry.code_size, geometry.col_width * 0.9));
    }

    #[test]
    fn rejects_empty_grid() {
        let config = LayoutConfig {
            columns: 0,
            ..LayoutConfig::default()
        };
        assert_eq!(PageGeometry::compute(&config, LETTER), Err(ConfigError::NoColumns));

        let config = LayoutConfig {
            rows: 0,
            ..LayoutConfig::default()
        };
        assert_eq!(PageGeometry::compute(&config, LETTER), Err(ConfigError::NoRows));
    }

    #[test]
    fn rejects_margins_that_eat_the_page() {
        let config = LayoutConfig {
            margin: Dimension(306.0),
            ..LayoutConfig::default()
        };
        assert!(matches!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::NoPrintableArea { .. })
        ));
    }

    #[test]
    fn rejects_negative_and_nan_dimensions() {
        let config = LayoutConfig {
            font_size: Dimension(-1.0),
            ..LayoutConfig::default()
        };
        assert!(matches!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::InvalidDimension { field: "font_size", .. })
        ));

        let config = LayoutConfig {
            margin: Dimension(f64::NAN),
            ..LayoutConfig::default()
        };
        assert!(matches!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::InvalidDimension { field: "margin", .. })
        ));
    }

    #[test]
    fn rejects_negative_stroke_settings() {
        let config = LayoutConfig {
            grid_line_width: Dimension(-0.5),
            ..LayoutConfig::default()
        };
        assert!(matches!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::InvalidDimension { field: "grid_line_width", .. })
        ));

        let config = LayoutConfig {
            grid_line_dash: Some(DashPattern {
                on: Dimension(3.0),
                off: Dimension(f64::INFINITY),
            }),
            ..LayoutConfig::default()
        };
        assert!(matches!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::InvalidDimension { field: "grid_line_dash.off", .. })
        ));
    }

    #[test]
    fn raster_size_follows_pixel_density() {
        let geometry = PageGeometry::compute(&LayoutConfig::default(), LETTER).unwrap();
        // 60.16 pt * 4 px/pt
        assert_eq!(geometry.raster_px, 241);
    }

    #[test]
    fn rejects_unusable_pixel_density() {
        for density in [0.0, -4.0, f64::NAN, f64::INFINITY] {
            let config = LayoutConfig {
                qr_pixels_per_point: density,
                ..LayoutConfig::default()
            };
            assert!(matches!(
                PageGeometry::compute(&config, LETTER),
                Err(ConfigError::InvalidPixelDensity(_))
            ));
        }
    }

    #[test]
    fn rejects_oversized_rasters() {
        let config = LayoutConfig {
            qr_pixels_per_point: 1e12,
            ..LayoutConfig::default()
        };
        assert!(matches!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::RasterTooLarge { max: 8192, .. })
        ));

        let config = LayoutConfig {
            qr_quiet_zone: 3_000_000_000,
            ..LayoutConfig::default()
        };
        assert_eq!(
            PageGeometry::compute(&config, LETTER),
            Err(ConfigError::RasterTooLarge {
                side: 6_000_000_177,
                max: 8192,
            })
        );
    }

    #[test]
    fn first_cell_sits_at_the_margin() {
        let geometry = PageGeometry::compute(&LayoutConfig::default(), LETTER).unwrap();
        let first = Cell::at(0, geometry.columns);
        assert_eq!(geometry.cell_origin(first), (20.0, 20.0));

        let (x, y) = geometry.code_origin(first);
        assert!(approx(x, 20.0 + (71.5 - 60.16) / 2.0));
        assert!(approx(y, 20.0 + (75.2 - 60.16 - 6.0 - 3.0) / 2.0));
    }

    #[test]
    fn next_row_shares_x_and_moves_one_row_down() {
        let geometry = PageGeometry::compute(&LayoutConfig::default(), LETTER).unwrap();
        let first = geometry.code_origin(Cell::at(0, geometry.columns));
        let below = geometry.code_origin(Cell::at(geometry.columns as u64, geometry.columns));
        assert_eq!(
            Cell::at(geometry.columns as u64, geometry.columns),
            Cell { row: 1, col: 0 }
        );
        assert!(approx(below.0, first.0));
        assert!(approx(below.1 - first.1, geometry.row_height));
    }

    #[test]
    fn caption_is_centred_below_the_code() {
        let geometry = PageGeometry::compute(&LayoutConfig::default(), LETTER).unwrap();
        let cell = Cell { row: 2, col: 3 };
        let (code_x, code_y) = geometry.code_origin(cell);
        let (text_x, text_y) = geometry.caption_origin(cell, 40.0);

        let cell_centre = geometry.cell_origin(cell).0 + geometry.col_width / 2.0;
        assert!(approx(text_x + 20.0, cell_centre));
        assert!(approx(code_x + geometry.code_size / 2.0, cell_centre));
        assert!(approx(text_y, code_y + geometry.code_size + 3.0));
    }

    #[test]
    fn grid_lines_cover_the_grid() {
        let config = LayoutConfig {
            columns: 3,
            rows: 2,
            ..LayoutConfig::default()
        };
        let geometry = PageGeometry::compute(&config, LETTER).unwrap();
        let lines: Vec<Segment> = geometry.grid_lines().collect();
        assert_eq!(lines.len(), 4 + 3);

        let verticals = &lines[..4];
        assert!(verticals.iter().all(|s| s.x1 == s.x2 && s.y1 == 20.0));
        assert!(approx(verticals[3].x1, 592.0));
        assert!(approx(verticals[0].y2, 772.0));

        let horizontals = &lines[4..];
        assert!(horizontals.iter().all(|s| s.y1 == s.y2 && s.x1 == 20.0));
        assert!(approx(horizontals[2].y1, 772.0));
        assert!(approx(horizontals[0].x2, 592.0));
    }
}
