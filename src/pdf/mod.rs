use std::collections::{HashMap, HashSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str};

use crate::error::Error;
use crate::fonts::{EmbeddedFont, encode_as_gids, register_font, to_winansi_bytes};
use crate::model::{Bitmap, Color, Document, DrawCommand};

struct PdfFont {
    pdf_name: String,
    font_ref: Ref,
    embedded: Option<EmbeddedFont>,
}

impl PdfFont {
    fn encode(&self, text: &str) -> Vec<u8> {
        match &self.embedded {
            Some(font) => encode_as_gids(text, &font.char_to_gid),
            None => to_winansi_bytes(text),
        }
    }
}

fn embed_bitmap(pdf: &mut Pdf, alloc: &mut impl FnMut() -> Ref, img: &Bitmap) -> Ref {
    let xobj_ref = alloc();
    let (w, h) = (img.width as i32, img.height as i32);

    let rgb_data: Vec<u8> = img
        .rgba
        .chunks_exact(4)
        .flat_map(|p| [p[0], p[1], p[2]])
        .collect();
    let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(&rgb_data, 6);

    let smask_ref = if img.has_alpha() {
        let alpha_data: Vec<u8> = img.rgba.chunks_exact(4).map(|p| p[3]).collect();
        let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(&alpha_data, 6);
        let mask_ref = alloc();
        let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
        mask.filter(Filter::FlateDecode);
        mask.width(w);
        mask.height(h);
        mask.color_space().device_gray();
        mask.bits_per_component(8);
        Some(mask_ref)
    } else {
        None
    };

    let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
    xobj.filter(Filter::FlateDecode);
    xobj.width(w);
    xobj.height(h);
    xobj.color_space().device_rgb();
    xobj.bits_per_component(8);
    if let Some(mask_ref) = smask_ref {
        xobj.s_mask(mask_ref);
    }
    xobj_ref
}

fn set_fill(content: &mut Content, color: Color) {
    if color == [0, 0, 0] {
        content.set_fill_gray(0.0);
    } else {
        content.set_fill_rgb(
            color[0] as f32 / 255.0,
            color[1] as f32 / 255.0,
            color[2] as f32 / 255.0,
        );
    }
}

/// Serialize the recorded pages into a PDF file.
pub fn render(doc: &Document) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();

    // Phase 1: register the fonts that are actually drawn with
    let mut used_chars: HashMap<usize, HashSet<char>> = HashMap::new();
    for page in &doc.pages {
        for cmd in &page.commands {
            if let DrawCommand::Text { text, font, .. } = cmd {
                let chars = used_chars.entry(font.0).or_default();
                chars.extend(text.chars());
                chars.insert(' ');
            }
        }
    }

    let mut fonts: HashMap<usize, PdfFont> = HashMap::new();
    for (idx, entry) in doc.fonts.entries().iter().enumerate() {
        let Some(used) = used_chars.get(&idx) else {
            continue;
        };
        let font_ref = alloc();
        let embedded = register_font(&mut pdf, entry, font_ref, &mut alloc, used)?;
        fonts.insert(
            idx,
            PdfFont {
                pdf_name: format!("F{}", idx + 1),
                font_ref,
                embedded,
            },
        );
    }

    let t_fonts = t0.elapsed();

    // Phase 2: each distinct bitmap becomes one image XObject
    let image_xobjects: Vec<(String, Ref)> = doc
        .images
        .iter()
        .enumerate()
        .map(|(i, img)| (format!("Im{}", i + 1), embed_bitmap(&mut pdf, &mut alloc, img)))
        .collect();

    let t_images = t0.elapsed();

    // Phase 3: content streams
    let mut all_contents: Vec<Content> = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let mut content = Content::new();
        let mut current_color: Option<Color> = None;
        for cmd in &page.commands {
            match cmd {
                DrawCommand::Text {
                    text,
                    x,
                    y,
                    font,
                    size,
                    color,
                } => {
                    let pdf_font = fonts
                        .get(&font.0)
                        .ok_or_else(|| Error::Pdf(format!("font {font:?} was never registered")))?;
                    if current_color != Some(*color) {
                        set_fill(&mut content, *color);
                        current_color = Some(*color);
                    }
                    content.begin_text();
                    content.set_font(Name(pdf_font.pdf_name.as_bytes()), *size);
                    content.next_line(*x, *y);
                    content.show(Str(&pdf_font.encode(text)));
                    content.end_text();
                }
                DrawCommand::Image {
                    image,
                    x,
                    y,
                    width,
                    height,
                } => {
                    let (name, _) = image_xobjects
                        .get(image.0)
                        .ok_or_else(|| Error::Pdf(format!("image {image:?} was never registered")))?;
                    content.save_state();
                    content.transform([*width, 0.0, 0.0, *height, *x, *y]);
                    content.x_object(Name(name.as_bytes()));
                    content.restore_state();
                }
                DrawCommand::Line { x1, y1, x2, y2 } => {
                    content.set_line_width(0.75);
                    content.set_stroke_gray(0.0);
                    content.move_to(*x1, *y1);
                    content.line_to(*x2, *y2);
                    content.stroke();
                }
            }
        }
        all_contents.push(content);
    }

    let t_layout = t0.elapsed();

    // Phase 4: page tree
    let n = all_contents.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();

    for (i, c) in all_contents.into_iter().enumerate() {
        let raw = c.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);

    let mut font_pairs: Vec<(&str, Ref)> = fonts
        .values()
        .map(|f| (f.pdf_name.as_str(), f.font_ref))
        .collect();
    font_pairs.sort_by_key(|&(name, _)| name);

    for (i, src) in doc.pages.iter().enumerate() {
        let mut page = pdf.page(page_ids[i]);
        page.media_box(Rect::new(0.0, 0.0, src.width, src.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for (name, font_ref) in &font_pairs {
                font_dict.pair(Name(name.as_bytes()), *font_ref);
            }
        }
        if !image_xobjects.is_empty() {
            let mut xobjects = resources.x_objects();
            for (name, xobj_ref) in &image_xobjects {
                xobjects.pair(Name(name.as_bytes()), *xobj_ref);
            }
        }
    }

    let t_assembly = t0.elapsed();

    log::info!(
        "Render phases: font_embed={:.1}ms, images={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_layout - t_images).as_secs_f64() * 1000.0,
        (t_assembly - t_layout).as_secs_f64() * 1000.0,
        n,
    );

    Ok(pdf.finish())
}
