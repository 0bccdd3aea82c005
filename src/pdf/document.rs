use anyhow::{anyhow, Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::content::ContentBuilder;
use super::fonts::{load_caption_font, CaptionFont};
use super::resources::page_resources;
use super::{LineStyle, PageRenderer, TextAlign};
use crate::config::LayoutConfig;
use crate::encoder::RasterImage;
use crate::layout::Segment;

fn no_page() -> anyhow::Error {
    anyhow!("Drawing requested before the first page was started")
}

/// lopdf-backed renderer writing a whole sheet to `W`.
///
/// The writer is owned from construction until the renderer is dropped;
/// nothing reaches it before `finalize`.
pub struct PdfSheetRenderer<W: Write> {
    doc: Document,
    writer: W,
    finished: bool,
    pages_id: ObjectId,
    font_id: ObjectId,
    font: CaptionFont,
    font_size: f64,
    page_size: (f64, f64),
    current: Option<ContentBuilder>,
    page_ids: Vec<ObjectId>,
}

impl PdfSheetRenderer<BufWriter<File>> {
    /// Create the output file up front so an unwritable path fails before
    /// any page is laid out.
    pub fn create(path: &Path, config: &LayoutConfig) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file at {:?}", path))?;
        Self::new(BufWriter::new(file), config)
    }
}

impl<W: Write> PdfSheetRenderer<W> {
    pub fn new(writer: W, config: &LayoutConfig) -> Result<Self> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        // Every caption is the prefix followed by digits
        let charset = format!("{}0123456789", config.prefix);
        let (font_id, font) = load_caption_font(&mut doc, &config.font, &charset)?;

        Ok(Self {
            doc,
            writer,
            finished: false,
            pages_id,
            font_id,
            font,
            font_size: config.font_size.as_points(),
            page_size: config.page_size(),
            current: None,
            page_ids: Vec::new(),
        })
    }

    /// Recover the writer, e.g. an in-memory buffer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Turn the page under construction into a page object.
    fn flush_page(&mut self) {
        let Some(builder) = self.current.take() else {
            return;
        };

        let content_id = self
            .doc
            .add_object(Stream::new(Dictionary::new(), builder.build_content_bytes()));

        let mut page = Dictionary::new();
        page.set("Type", "Page");
        page.set("Parent", Object::Reference(self.pages_id));
        page.set("Contents", Object::Reference(content_id));
        page.set(
            "Resources",
            Object::Dictionary(page_resources(self.font_id, &builder.xobjects)),
        );

        let page_id = self.doc.add_object(Object::Dictionary(page));
        self.page_ids.push(page_id);
    }

    fn media_box(&self) -> Vec<Object> {
        let (width, height) = self.page_size;
        vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(width as f32),
            Object::Real(height as f32),
        ]
    }
}

impl<W: Write> PageRenderer for PdfSheetRenderer<W> {
    fn new_page(&mut self) -> Result<()> {
        if self.finished {
            return Err(anyhow!("Document already finalized"));
        }
        self.flush_page();
        self.current = Some(ContentBuilder::new(self.page_size.1));
        Ok(())
    }

    fn draw_image(&mut self, image: &RasterImage, x: f64, y: f64, size: f64) -> Result<()> {
        let builder = self.current.as_mut().ok_or_else(no_page)?;
        builder.add_image(&mut self.doc, image, x, y, size)
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f64,
        y: f64,
        width: f64,
        align: TextAlign,
    ) -> Result<()> {
        let builder = self.current.as_mut().ok_or_else(no_page)?;
        builder.add_text(&self.font, self.font_size, text, x, y, width, align);
        Ok(())
    }

    fn draw_line(&mut self, segment: Segment, style: &LineStyle) -> Result<()> {
        let builder = self.current.as_mut().ok_or_else(no_page)?;
        builder.add_line(segment, style);
        Ok(())
    }

    fn text_width(&self, text: &str) -> f64 {
        self.font.text_width(text, self.font_size)
    }

    fn finalize(&mut self) -> Result<()> {
        if self.finished {
            return Err(anyhow!("Document already finalized"));
        }
        self.flush_page();

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let mut pages = Dictionary::new();
        pages.set("Type", "Pages");
        pages.set("Kids", kids);
        pages.set("Count", self.page_ids.len() as i64);
        pages.set("MediaBox", self.media_box());
        self.doc.objects.insert(self.pages_id, Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", "Catalog");
        catalog.set("Pages", Object::Reference(self.pages_id));
        let catalog_id = self.doc.add_object(Object::Dictionary(catalog));

        let mut info = Dictionary::new();
        info.set("Title", Object::String(b"QR code labels".to_vec(), StringFormat::Literal));
        info.set(
            "Producer",
            Object::String(
                concat!("qr_label_sheet ", env!("CARGO_PKG_VERSION")).as_bytes().to_vec(),
                StringFormat::Literal,
            ),
        );
        let info_id = self.doc.add_object(Object::Dictionary(info));

        self.doc.trailer.set("Root", Object::Reference(catalog_id));
        self.doc.trailer.set("Info", Object::Reference(info_id));
        self.doc.compress();

        self.doc
            .save_to(&mut self.writer)
            .with_context(|| "Failed to write PDF")?;
        self.writer.flush().with_context(|| "Failed to flush PDF output")?;
        self.finished = true;
        Ok(())
    }
}
