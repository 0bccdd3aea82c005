use anyhow::Result;
use fontdb::{Database, FaceInfo, Source};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::collections::BTreeMap;
use std::path::Path;
use ttf_parser::Face;

/// Standard PDF Type1 fonts with built-in metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    Courier,
    CourierBold,
}

/// Helvetica advance widths for ASCII 0x20..=0x7E, 1000 units/em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

impl StandardFont {
    /// Get the PDF BaseFont name for this font
    pub fn base_font_name(&self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::Courier => "Courier",
            StandardFont::CourierBold => "Courier-Bold",
        }
    }

    /// Parse a font name into a StandardFont
    pub fn from_name(name: &str) -> Option<StandardFont> {
        match name.to_lowercase().as_str() {
            "helvetica" => Some(StandardFont::Helvetica),
            "helvetica-bold" => Some(StandardFont::HelveticaBold),
            "courier" => Some(StandardFont::Courier),
            "courier-bold" => Some(StandardFont::CourierBold),
            _ => None,
        }
    }

    /// Advance width of one WinAnsi byte in 1000 units/em.
    fn width_1000(&self, byte: u8) -> f64 {
        let table = match self {
            StandardFont::Courier | StandardFont::CourierBold => return 600.0,
            StandardFont::Helvetica => &HELVETICA_WIDTHS,
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
        };
        match byte {
            0x20..=0x7E => table[(byte - 0x20) as usize] as f64,
            // Latin-1 letters average out close to lowercase width
            _ => 556.0,
        }
    }

    fn ascent_1000(&self) -> f64 {
        match self {
            StandardFont::Helvetica | StandardFont::HelveticaBold => 718.0,
            StandardFont::Courier | StandardFont::CourierBold => 629.0,
        }
    }
}

/// Map a char to WinAnsi, covering ASCII and Latin-1.
fn to_winansi(c: char) -> Option<u8> {
    match c as u32 {
        0x20..=0x7E | 0xA0..=0xFF => Some(c as u8),
        _ => None,
    }
}

/// Embedded TrueType font addressed by Unicode code point (Identity-H).
#[derive(Debug, Clone)]
pub struct CidFont {
    widths_1000: BTreeMap<char, f64>,
    ascent_1000: f64,
}

/// Font used for captions, plus everything needed to measure and encode text.
#[derive(Debug, Clone)]
pub enum CaptionFont {
    Standard(StandardFont),
    Cid(CidFont),
}

impl CaptionFont {
    pub fn text_width(&self, text: &str, font_size: f64) -> f64 {
        let units: f64 = match self {
            CaptionFont::Standard(font) => text
                .chars()
                .map(|c| font.width_1000(to_winansi(c).unwrap_or(b'?')))
                .sum(),
            CaptionFont::Cid(font) => text
                .chars()
                .map(|c| font.widths_1000.get(&c).copied().unwrap_or(1000.0))
                .sum(),
        };
        units * font_size / 1000.0
    }

    pub fn ascent(&self, font_size: f64) -> f64 {
        let units = match self {
            CaptionFont::Standard(font) => font.ascent_1000(),
            CaptionFont::Cid(font) => font.ascent_1000,
        };
        units * font_size / 1000.0
    }

    /// PDF string operand for `Tj`, delimiters included.
    pub fn encode(&self, text: &str) -> String {
        match self {
            CaptionFont::Standard(_) => {
                let bytes: Vec<u8> = text.chars().map(|c| to_winansi(c).unwrap_or(b'?')).collect();
                format!("({})", escape_pdf_bytes(&bytes))
            }
            CaptionFont::Cid(_) => format!("<{}>", encode_cid_text(text)),
        }
    }
}

/// Escape a literal string body; bytes outside printable ASCII become octal.
pub fn escape_pdf_bytes(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'(' => result.push_str(r"\("),
            b')' => result.push_str(r"\)"),
            b'\\' => result.push_str(r"\\"),
            0x20..=0x7E => result.push(b as char),
            _ => result.push_str(&format!("\\{:03o}", b)),
        }
    }
    result
}

/// Encode text for CID font (Identity-H encoding)
///
/// Converts text to UTF-16BE and returns hex representation
pub fn encode_cid_text(s: &str) -> String {
    s.encode_utf16()
        .map(|unit| format!("{:04X}", unit))
        .collect()
}

/// Create a standard Type1 font object with WinAnsi encoding.
pub fn create_standard_font(doc: &mut Document, font: StandardFont) -> ObjectId {
    let mut font_dict = Dictionary::new();
    font_dict.set("Type", "Font");
    font_dict.set("Subtype", "Type1");
    font_dict.set("BaseFont", font.base_font_name());
    font_dict.set("Encoding", "WinAnsiEncoding");
    doc.add_object(Object::Dictionary(font_dict))
}

/// Build a CIDToGIDMap stream from font's cmap table
///
/// In Identity-H the CID is the UTF-16 code unit, so every BMP code point
/// needs a slot holding its glyph ID as a big-endian u16.
fn build_cidtogid_map(face: &Face) -> Vec<u8> {
    let mut gid_map = Vec::with_capacity(0x10000 * 2);
    for cid in 0..=0xFFFFu32 {
        let gid = char::from_u32(cid)
            .and_then(|ch| face.glyph_index(ch))
            .map(|g| g.0)
            .unwrap_or(0);
        gid_map.extend_from_slice(&gid.to_be_bytes());
    }
    gid_map
}

/// Embed a CID-keyed font covering `charset`.
///
/// This creates a Type0 font with a CIDFontType2 descendant, a `/W` array
/// for every BMP char in `charset`, and real descriptor metrics.
pub fn embed_cid_font(
    doc: &mut Document,
    font_data: &[u8],
    font_name: &str,
    charset: &str,
) -> Result<(ObjectId, CidFont)> {
    let face = Face::parse(font_data, 0)?;
    let units = face.units_per_em() as f64;
    let scale = |v: f64| v * 1000.0 / units;

    let mut widths_1000 = BTreeMap::new();
    for ch in charset.chars() {
        if let Some(gid) = face.glyph_index(ch) {
            let advance = face.glyph_hor_advance(gid).unwrap_or(0) as f64;
            widths_1000.insert(ch, scale(advance));
        }
    }

    let base_font = font_name.replace(' ', "-");
    let ascent = scale(face.ascender() as f64);
    let descent = scale(face.descender() as f64);
    let cap_height = face.capital_height().map(|h| scale(h as f64)).unwrap_or(700.0);
    let bbox = face.global_bounding_box();

    let mut font_descriptor = Dictionary::new();
    font_descriptor.set("Type", "FontDescriptor");
    font_descriptor.set("FontName", base_font.clone());
    font_descriptor.set("Flags", 4i64); // Symbolic
    font_descriptor.set(
        "FontBBox",
        [bbox.x_min, bbox.y_min, bbox.x_max, bbox.y_max]
            .into_iter()
            .map(|v| Object::Real(scale(v as f64) as f32))
            .collect::<Vec<_>>(),
    );
    font_descriptor.set("ItalicAngle", 0i64);
    font_descriptor.set("Ascent", Object::Real(ascent as f32));
    font_descriptor.set("Descent", Object::Real(descent as f32));
    font_descriptor.set("CapHeight", Object::Real(cap_height as f32));
    font_descriptor.set("StemV", 80i64);

    let mut font_stream_dict = Dictionary::new();
    font_stream_dict.set("Length1", font_data.len() as i64);
    let font_stream_id = doc.add_object(Stream::new(font_stream_dict, font_data.to_vec()));
    font_descriptor.set("FontFile2", Object::Reference(font_stream_id));
    let descriptor_id = doc.add_object(Object::Dictionary(font_descriptor));

    let cidtogid_id = doc.add_object(Stream::new(Dictionary::new(), build_cidtogid_map(&face)));

    // W entries: cid [width]
    let mut w_array = Vec::new();
    for (ch, width) in &widths_1000 {
        let mut units16 = [0u16; 2];
        if ch.encode_utf16(&mut units16).len() == 1 {
            w_array.push(Object::Integer(units16[0] as i64));
            w_array.push(Object::Array(vec![Object::Real(*width as f32)]));
        }
    }

    let mut cid_system = Dictionary::new();
    cid_system.set("Registry", Object::String("Adobe".into(), StringFormat::Literal));
    cid_system.set("Ordering", Object::String("Identity".into(), StringFormat::Literal));
    cid_system.set("Supplement", 0i64);

    let mut cid_font = Dictionary::new();
    cid_font.set("Type", "Font");
    cid_font.set("Subtype", "CIDFontType2");
    cid_font.set("BaseFont", base_font.clone());
    cid_font.set("CIDSystemInfo", Object::Dictionary(cid_system));
    cid_font.set("FontDescriptor", Object::Reference(descriptor_id));
    cid_font.set("CIDToGIDMap", Object::Reference(cidtogid_id));
    cid_font.set("DW", 1000i64);
    cid_font.set("W", w_array);
    let cid_font_id = doc.add_object(Object::Dictionary(cid_font));

    let mut type0_font = Dictionary::new();
    type0_font.set("Type", "Font");
    type0_font.set("Subtype", "Type0");
    type0_font.set("BaseFont", base_font);
    type0_font.set("Encoding", "Identity-H");
    type0_font.set("DescendantFonts", vec![Object::Reference(cid_font_id)]);
    let type0_font_id = doc.add_object(Object::Dictionary(type0_font));

    Ok((
        type0_font_id,
        CidFont {
            widths_1000,
            ascent_1000: ascent,
        },
    ))
}

/// Font families tried first when looking for non-Latin coverage.
const PREFERRED_FAMILIES: [&str; 10] = [
    "Noto Sans",
    "Noto Sans CJK JP",
    "Noto Sans JP",
    "DejaVu Sans",
    "Liberation Sans",
    "Arial Unicode MS",
    "Arial",
    "Yu Gothic",
    "Meiryo",
    "IPAGothic",
];

fn is_ttf_file(face: &FaceInfo) -> bool {
    let path: &Path = match &face.source {
        Source::File(path) => path,
        _ => return false,
    };
    face.index == 0
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("ttf"))
}

/// Find a system TrueType font that has a glyph for every char in `charset`.
///
/// Only plain .ttf files with `glyf` outlines qualify, since those can be
/// embedded as FontFile2 as-is.
pub fn find_cid_font(charset: &str) -> Option<(Vec<u8>, String)> {
    let mut db = Database::new();
    db.load_system_fonts();

    let rank = |face: &FaceInfo| {
        PREFERRED_FAMILIES
            .iter()
            .position(|family| face.families.iter().any(|(name, _)| name == family))
            .unwrap_or(PREFERRED_FAMILIES.len())
    };
    let mut candidates: Vec<&FaceInfo> = db.faces().filter(|face| is_ttf_file(*face)).collect();
    candidates.sort_by_key(|face| rank(*face));

    for face in candidates {
        let data = db
            .with_face_data(face.id, |data, index| {
                let parsed = Face::parse(data, index).ok()?;
                let covers = parsed.tables().glyf.is_some()
                    && charset.chars().all(|c| parsed.glyph_index(c).is_some());
                covers.then(|| data.to_vec())
            })
            .flatten();
        if let Some(data) = data {
            return Some((data, face.post_script_name.clone()));
        }
    }

    None
}

/// Pick the caption font for labels drawn from `charset`.
///
/// Falls back to Helvetica for unknown names, and to `?` substitution when
/// the charset needs glyphs no installed font provides.
pub fn load_caption_font(
    doc: &mut Document,
    font_name: &str,
    charset: &str,
) -> Result<(ObjectId, CaptionFont)> {
    let standard = StandardFont::from_name(font_name).unwrap_or_else(|| {
        log::warn!("Unknown standard font {:?}, using Helvetica", font_name);
        StandardFont::Helvetica
    });

    if charset.chars().all(|c| to_winansi(c).is_some()) {
        let font_id = create_standard_font(doc, standard);
        return Ok((font_id, CaptionFont::Standard(standard)));
    }

    match find_cid_font(charset) {
        Some((data, name)) => {
            log::info!("Embedding {} for non-Latin label text", name);
            let (font_id, font) = embed_cid_font(doc, &data, &name, charset)?;
            Ok((font_id, CaptionFont::Cid(font)))
        }
        None => {
            log::warn!(
                "No installed font covers {:?}; unsupported characters will print as '?'",
                charset
            );
            let font_id = create_standard_font(doc, standard);
            Ok((font_id, CaptionFont::Standard(standard)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_font_names() {
        assert_eq!(StandardFont::from_name("HELVETICA"), Some(StandardFont::Helvetica));
        assert_eq!(StandardFont::from_name("courier-bold"), Some(StandardFont::CourierBold));
        assert_eq!(StandardFont::from_name("Comic Sans"), None);
        assert_eq!(StandardFont::HelveticaBold.base_font_name(), "Helvetica-Bold");
    }

    #[test]
    fn test_helvetica_label_width() {
        let font = CaptionFont::Standard(StandardFont::Helvetica);
        // "B" 667 + "-" 333 + "0" 556
        assert!((font.text_width("B-0", 10.0) - 15.56).abs() < 1e-9);
        assert!((font.text_width("000000", 6.0) - 6.0 * 556.0 * 6.0 / 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_courier_is_monospaced() {
        let font = CaptionFont::Standard(StandardFont::Courier);
        assert_eq!(font.text_width("iiii", 10.0), font.text_width("WWWW", 10.0));
    }

    #[test]
    fn test_standard_encoding_escapes() {
        let font = CaptionFont::Standard(StandardFont::Helvetica);
        assert_eq!(font.encode("Bookie-MU25-000005"), "(Bookie-MU25-000005)");
        assert_eq!(font.encode("a(b)\\"), r"(a\(b\)\\)");
        assert_eq!(font.encode("é"), r"(\351)");
        assert_eq!(font.encode("箱"), "(?)");
    }

    #[test]
    fn test_encode_cid_text() {
        assert_eq!(encode_cid_text("A"), "0041");
        assert_eq!(encode_cid_text("箱1"), "7BB10031");
        assert_eq!(encode_cid_text("😀"), "D83DDE00");
    }

    #[test]
    fn test_latin1_prefix_stays_standard() {
        let mut doc = Document::with_version("1.5");
        let (_, font) = load_caption_font(&mut doc, "Helvetica", "Caf\u{e9}-0123456789").unwrap();
        assert!(matches!(font, CaptionFont::Standard(StandardFont::Helvetica)));
    }

    #[test]
    fn test_unknown_font_name_falls_back() {
        let mut doc = Document::with_version("1.5");
        let (font_id, font) = load_caption_font(&mut doc, "Wingdings", "ABC").unwrap();
        assert!(matches!(font, CaptionFont::Standard(StandardFont::Helvetica)));
        let dict = doc.get_dictionary(font_id).unwrap();
        assert_eq!(dict.get(b"BaseFont").unwrap().as_name().unwrap(), b"Helvetica");
    }
}
