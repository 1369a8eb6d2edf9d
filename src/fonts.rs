use std::collections::{HashMap, HashSet};
use std::path::Path;

use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::Face;

use crate::error::Error;
use crate::model::{FontHandle, Fonts};

pub(crate) enum FontSource {
    /// One of the PDF base-14 fonts, referenced by name and never embedded.
    Standard(&'static str),
    TrueType { data: Vec<u8>, face_index: u32 },
}

pub struct FontEntry {
    pub(crate) name: String,
    pub(crate) source: FontSource,
    /// WinAnsi widths at 1000 units/em for bytes 32..=255.
    widths_1000: Vec<f32>,
    char_widths_1000: Option<HashMap<char, f32>>,
}

impl FontEntry {
    /// Width of a single character in 1000-units. Uses the per-char cache
    /// when the font was parsed from TrueType data, falls back to the WinAnsi table.
    pub(crate) fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000
            && let Some(&w) = map.get(&ch)
        {
            return w;
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub(crate) fn word_width(&self, word: &str, font_size: f32) -> f32 {
        word.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.source, FontSource::TrueType { .. })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Font metric provider shared by the page recorder and the PDF writer.
pub struct FontBook {
    entries: Vec<FontEntry>,
}

impl FontBook {
    /// Helvetica, Helvetica-Bold and Helvetica-Oblique with built-in metrics.
    pub fn helvetica() -> (FontBook, Fonts) {
        let entries = vec![
            standard_entry("Helvetica", helvetica_widths()),
            standard_entry("Helvetica-Bold", helvetica_bold_widths()),
            // Oblique shares the upright metrics
            standard_entry("Helvetica-Oblique", helvetica_widths()),
        ];
        (FontBook { entries }, handles())
    }

    /// Regular, bold and italic TrueType/OpenType faces supplied by the host.
    pub fn truetype(regular: Vec<u8>, bold: Vec<u8>, italic: Vec<u8>) -> Result<(FontBook, Fonts), Error> {
        let entries = vec![
            truetype_entry(regular, "regular")?,
            truetype_entry(bold, "bold")?,
            truetype_entry(italic, "italic")?,
        ];
        Ok((FontBook { entries }, handles()))
    }

    /// Loads `regular.ttf`, `bold.ttf` and `italic.ttf` from a directory.
    pub fn from_dir(dir: &Path) -> Result<(FontBook, Fonts), Error> {
        let read = |file: &str| {
            let path = dir.join(file);
            std::fs::read(&path).map_err(|e| Error::Font(format!("{}: {e}", path.display())))
        };
        Self::truetype(read("regular.ttf")?, read("bold.ttf")?, read("italic.ttf")?)
    }

    pub fn entry(&self, font: FontHandle) -> Option<&FontEntry> {
        self.entries.get(font.0)
    }

    pub(crate) fn entries(&self) -> &[FontEntry] {
        &self.entries
    }

    pub fn measure(&self, text: &str, font: FontHandle, size: f32) -> Result<f32, Error> {
        let entry = self.entry(font).ok_or(Error::InvalidFont(font))?;
        Ok(entry.word_width(text, size))
    }
}

fn handles() -> Fonts {
    Fonts {
        regular: FontHandle(0),
        bold: FontHandle(1),
        italic: FontHandle(2),
    }
}

fn standard_entry(name: &'static str, widths_1000: Vec<f32>) -> FontEntry {
    FontEntry {
        name: name.to_string(),
        source: FontSource::Standard(name),
        widths_1000,
        char_widths_1000: None,
    }
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn truetype_entry(data: Vec<u8>, style: &str) -> Result<FontEntry, Error> {
    let face = Face::parse(&data, 0).map_err(|e| Error::Font(format!("{style} face: {e}")))?;
    let units = face.units_per_em() as f32;
    let advance = |ch: char| {
        face.glyph_index(ch)
            .and_then(|gid| face.glyph_hor_advance(gid))
            .map(|adv| adv as f32 / units * 1000.0)
    };

    let widths_1000: Vec<f32> = (32u8..=255u8)
        .map(|byte| advance(winansi_to_char(byte)).unwrap_or(0.0))
        .collect();

    // Latin, Latin-1, Latin Extended and general punctuation cover the
    // minutes we render; anything else falls back to the WinAnsi table.
    let mut char_widths_1000 = HashMap::new();
    for cp in (0x20u32..=0x24F).chain(0x2000..=0x206F) {
        if let Some(ch) = char::from_u32(cp)
            && let Some(w) = advance(ch)
        {
            char_widths_1000.insert(ch, w);
        }
    }

    let family = font_family_name(&face).unwrap_or_else(|| format!("Embedded-{style}"));
    let name = if style == "regular" {
        family
    } else {
        format!("{family}-{style}")
    };

    log::debug!("Loaded TrueType font {name} ({} bytes)", data.len());

    Ok(FontEntry {
        name,
        source: FontSource::TrueType { data, face_index: 0 },
        widths_1000,
        char_widths_1000: Some(char_widths_1000),
    })
}

/// Windows-1252 (WinAnsi) byte to Unicode char mapping.
/// Bytes 0x80-0x9F are remapped; all others map directly to their Unicode codepoint.
fn winansi_to_char(byte: u8) -> char {
    match byte {
        0x80 => '\u{20AC}',
        0x82 => '\u{201A}',
        0x83 => '\u{0192}',
        0x84 => '\u{201E}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02C6}',
        0x89 => '\u{2030}',
        0x8A => '\u{0160}',
        0x8B => '\u{2039}',
        0x8C => '\u{0152}',
        0x8E => '\u{017D}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201C}',
        0x94 => '\u{201D}',
        0x95 => '\u{2022}', // bullet
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02DC}',
        0x99 => '\u{2122}',
        0x9A => '\u{0161}',
        0x9B => '\u{203A}',
        0x9C => '\u{0153}',
        0x9E => '\u{017E}',
        0x9F => '\u{0178}',
        _ => byte as char,
    }
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007F => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95,
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes for PDF Str encoding.
/// Unmappable characters are dropped.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .filter_map(|c| match char_to_winansi(c) {
            0 => None,
            b => Some(b),
        })
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
pub(crate) fn encode_as_gids(text: &str, char_to_gid: &HashMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.push((gid >> 8) as u8);
        out.push((gid & 0xFF) as u8);
    }
    out
}

/// Approximate Helvetica widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,                          // space
            33..=47 => 333.0,                     // punctuation
            48..=57 => 556.0,                     // digits
            58..=64 => 333.0,                     // more punctuation
            73 | 74 => 278.0,                     // I J (narrow uppercase)
            77 => 833.0,                          // M (wide)
            65..=90 => 667.0,                     // uppercase A-Z (average)
            91..=96 => 333.0,                     // brackets etc.
            102 | 105 | 106 | 108 | 116 => 278.0, // narrow lowercase: f i j l t
            109 | 119 => 833.0,                   // m w (wide)
            97..=122 => 556.0,                    // lowercase a-z (average)
            _ => 556.0,
        })
        .collect()
}

/// Approximate Helvetica-Bold widths at 1000 units/em for WinAnsi chars 32..=255.
fn helvetica_bold_widths() -> Vec<f32> {
    (32u8..=255u8)
        .map(|b| match b {
            32 => 278.0,
            33..=47 => 333.0,
            48..=57 => 556.0,
            58..=64 => 333.0,
            73 => 278.0,
            74 => 556.0,
            77 => 833.0,
            87 => 944.0,          // W
            65..=90 => 722.0,
            91..=96 => 333.0,
            105 | 106 | 108 => 278.0,
            102 | 116 => 333.0,
            109 => 889.0,
            119 => 778.0,
            97..=122 => 611.0,
            _ => 611.0,
        })
        .collect()
}

/// Glyph mapping of an embedded TrueType font, used to encode content-stream text.
pub(crate) struct EmbeddedFont {
    pub(crate) char_to_gid: HashMap<char, u16>,
}

/// Write the font objects for `entry` and return the glyph map when the
/// font is a composite (CID) font.
pub(crate) fn register_font(
    pdf: &mut Pdf,
    entry: &FontEntry,
    font_ref: Ref,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &HashSet<char>,
) -> Result<Option<EmbeddedFont>, Error> {
    let t0 = std::time::Instant::now();
    let result = match &entry.source {
        FontSource::Standard(base) => {
            pdf.type1_font(font_ref)
                .base_font(Name(base.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
        FontSource::TrueType { data, face_index } => Some(embed_truetype(
            pdf,
            font_ref,
            &entry.name,
            data,
            *face_index,
            used_chars,
            alloc,
        )?),
    };

    log::debug!(
        "register_font: {} → {:.1}ms",
        entry.name,
        t0.elapsed().as_secs_f64() * 1000.0,
    );
    Ok(result)
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding.
/// The font data is subsetted to only include glyphs used in the document.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    font_name: &str,
    font_data: &[u8],
    face_index: u32,
    used_chars: &HashSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<EmbeddedFont, Error> {
    let face = Face::parse(font_data, face_index).map_err(|e| Error::Font(format!("{font_name}: {e}")))?;
    let descriptor_ref = alloc();
    let data_ref = alloc();

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);

    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    let mut remapper = subsetter::GlyphRemapper::new();
    let mut char_to_gid = HashMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            char_to_gid.insert(ch, remapper.remap(gid.0));
        }
    }

    let subset_data = subsetter::subset(font_data, face_index, &remapper).unwrap_or_else(|e| {
        log::warn!("Font subsetting failed for {font_name}: {e}; embedding full font");
        font_data.to_vec()
    });

    let data_len = i32::try_from(subset_data.len())
        .map_err(|_| Error::Pdf(format!("font {font_name} is too large to embed")))?;
    pdf.stream(data_ref, &subset_data)
        .pair(Name(b"Length1"), data_len);

    let ps_name = font_name.replace(' ', "");

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .filter_map(|(&ch, &new_gid)| {
                face.glyph_index(ch)
                    .and_then(|gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, adv as f32 / units * 1000.0))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{}-UTF16", ps_name);
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(EmbeddedFont { char_to_gid })
}
