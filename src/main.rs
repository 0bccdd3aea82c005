mod config;
mod encoder;
mod error;
mod label;
mod layout;
mod pdf;
mod sheet;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;

use config::{load_settings_config, LayoutConfig};
use encoder::QrEncoder;
use layout::PageGeometry;
use pdf::PdfSheetRenderer;
use sheet::generate_sheet;

/// Generate a PDF sheet of sequentially numbered QR code labels.
#[derive(Parser, Debug)]
#[command(name = "qr_label_sheet")]
#[command(
    about = "Generate a PDF sheet of sequentially numbered QR code labels.",
    long_about = None
)]
struct Args {
    /// JSON settings file; fields it omits keep their built-in defaults
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Output PDF path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// First id on the sheet
    #[arg(long)]
    start: Option<u64>,

    /// Last id on the sheet (inclusive)
    #[arg(long)]
    end: Option<u64>,

    /// Text placed before every zero-padded id
    #[arg(long)]
    prefix: Option<String>,
}

impl Args {
    fn apply_overrides(&self, config: &mut LayoutConfig) {
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(start) = self.start {
            config.start_id = start;
        }
        if let Some(end) = self.end {
            config.end_id = end;
        }
        if let Some(prefix) = &self.prefix {
            config.prefix = prefix.clone();
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.settings {
        Some(path) => {
            info!("Loading configuration from {:?}...", path);
            load_settings_config(path)?
        }
        None => LayoutConfig::default(),
    };
    args.apply_overrides(&mut config);

    let geometry = PageGeometry::compute(&config, config.page_size())
        .with_context(|| "Invalid layout configuration")?;
    debug!(
        "Grid {}x{} over {:.2} x {:.2} pt: cell {:.2} x {:.2} pt, code {:.2} pt",
        geometry.columns,
        geometry.rows,
        geometry.page_width,
        geometry.page_height,
        geometry.col_width,
        geometry.row_height,
        geometry.code_size
    );

    let encoder = QrEncoder::from_config(&config);
    let mut renderer = PdfSheetRenderer::create(&config.output_file, &config)?;
    let summary = generate_sheet(&config, &geometry, &encoder, &mut renderer)?;

    info!(
        "PDF generated successfully: {:?} ({} pages)",
        config.output_file, summary.pages
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Err(e) = run(args) {
        error!("Error: {}", e);
        for cause in e.chain().skip(1) {
            error!("Caused by: {}", cause);
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "qr_label_sheet",
            "--start",
            "10",
            "--end",
            "20",
            "--prefix",
            "BIN-",
            "-o",
            "bins.pdf",
        ]);
        let mut config = LayoutConfig::default();
        args.apply_overrides(&mut config);

        assert_eq!(config.start_id, 10);
        assert_eq!(config.end_id, 20);
        assert_eq!(config.prefix, "BIN-");
        assert_eq!(config.output_file, PathBuf::from("bins.pdf"));
        assert_eq!(config.pad_length, 6);
    }

    #[test]
    fn invalid_geometry_fails_before_output_is_created() {
        let dir = std::env::temp_dir().join(format!("qr_label_sheet_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let settings = dir.join("settings.json");
        let output = dir.join("never.pdf");
        std::fs::write(&settings, r#"{ "columns": 0 }"#).unwrap();

        let args = Args {
            settings: Some(settings),
            output: Some(output.clone()),
            start: None,
            end: None,
            prefix: None,
        };
        let err = run(args).unwrap_err();
        assert!(err.chain().any(|cause| cause.to_string().contains("columns")));
        assert!(!output.exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn oversized_raster_settings_fail_before_output_is_created() {
        let dir_name = format!("qr_label_sheet_raster_{}", std::process::id());
        let dir = std::env::temp_dir().join(dir_name);
        std::fs::create_dir_all(&dir).unwrap();
        let output = dir.join("never.pdf");

        for (name, settings) in [
            ("quiet_zone", r#"{ "start_id": 1, "end_id": 1, "qr_quiet_zone": 3000000000 }"#),
            ("density", r#"{ "start_id": 1, "end_id": 1, "qr_pixels_per_point": 1e12 }"#),
            ("stroke", r#"{ "grid_line_width": -1 }"#),
        ] {
            let path = dir.join(format!("{}.json", name));
            std::fs::write(&path, settings).unwrap();
            let args = Args {
                settings: Some(path),
                output: Some(output.clone()),
                start: None,
                end: None,
                prefix: None,
            };
            let err = run(args).unwrap_err();
            assert!(err.to_string().contains("Invalid layout configuration"));
            assert!(!output.exists());
        }

        std::fs::remove_dir_all(&dir).ok();
    }
}
