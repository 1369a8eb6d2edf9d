mod common;

use std::path::PathBuf;

use acta_pdf::model::FontHandle;
use acta_pdf::{Acta, Encabezado, FontBook, FontFiles, LayoutOptions, compose_acta, render_document};

use common::{FailingFetch, approx};

fn fixture_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/fonts")
}

fn font_files() -> FontFiles {
    let read = |name: &str| std::fs::read(fixture_dir().join(name)).expect("font fixture");
    FontFiles {
        regular: read("regular.ttf"),
        bold: read("bold.ttf"),
        italic: read("italic.ttf"),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// Advance width of `text` straight from the font tables.
fn face_width(data: &[u8], text: &str, size: f32) -> f32 {
    let face = ttf_parser::Face::parse(data, 0).unwrap();
    let units = face.units_per_em() as f32;
    text.chars()
        .map(|ch| {
            let gid = face.glyph_index(ch).unwrap();
            face.glyph_hor_advance(gid).unwrap() as f32 / units * size
        })
        .sum()
}

#[test]
fn truetype_metrics_come_from_glyph_advances() {
    let files = font_files();
    let (book, fonts) =
        FontBook::truetype(files.regular.clone(), files.bold.clone(), files.italic.clone()).unwrap();

    for text in ["Acta de la sesión", "Página 1 de 3", "WWW iii"] {
        let regular = book.measure(text, fonts.regular, 11.0).unwrap();
        assert!(approx(regular, face_width(&files.regular, text, 11.0)), "{text}");
        let bold = book.measure(text, fonts.bold, 11.0).unwrap();
        assert!(approx(bold, face_width(&files.bold, text, 11.0)), "{text}");
    }
    // bold DejaVu is wider than regular
    assert!(book.measure("Presidente", fonts.bold, 11.0).unwrap() > book.measure("Presidente", fonts.regular, 11.0).unwrap());
    assert!(book.entry(fonts.italic).unwrap().is_embedded());
    assert!(book.measure("x", FontHandle(3), 11.0).is_err());
}

#[test]
fn font_directory_is_loaded_by_file_name() {
    let (book, fonts) = FontBook::from_dir(&fixture_dir()).unwrap();
    let names: Vec<&str> = [fonts.regular, fonts.bold, fonts.italic]
        .iter()
        .map(|f| book.entry(*f).unwrap().name())
        .collect();
    assert_eq!(names, vec!["DejaVu Sans", "DejaVu Sans-bold", "DejaVu Sans-italic"]);
}

#[test]
fn missing_font_directory_is_a_font_error() {
    let missing = fixture_dir().join("does-not-exist");
    assert!(matches!(FontBook::from_dir(&missing), Err(acta_pdf::Error::Font(_))));
}

#[test]
fn embedded_fonts_are_subset_cid_fonts() {
    let _ = env_logger::try_init();
    let acta = Acta {
        encabezado: Encabezado {
            nombre_organizacion: "Asociación de Vecinos".to_string(),
            logo_url: None,
        },
        pagina_inicial: "ORDINARIA\nLugar: Sala A".to_string(),
        cuerpo: "Se abrió la sesión a las 10:30.".to_string(),
        pagina_firmas: "Presidente - Ana Gómez\n2024-01-01".to_string(),
        pie_pagina: "Calle Mayor 1".to_string(),
        ..Acta::default()
    };
    let options = LayoutOptions {
        fonts: Some(font_files()),
        ..LayoutOptions::default()
    };
    let doc = compose_acta(&acta, &options, &mut FailingFetch::default()).unwrap();
    let bytes = render_document(&doc).unwrap();

    assert!(bytes.starts_with(b"%PDF-"));
    for needle in [&b"/Type0"[..], b"/Identity-H", b"/FontFile2", b"/ToUnicode", b"/CIDFontType2"] {
        assert!(contains(&bytes, needle), "missing {}", String::from_utf8_lossy(needle));
    }
    assert!(!contains(&bytes, b"/Helvetica"));

    // regular, bold and italic are three separate resources
    for resource in [&b"/F1 "[..], b"/F2 ", b"/F3 "] {
        assert!(contains(&bytes, resource), "missing {}", String::from_utf8_lossy(resource));
    }
    assert!(contains(&bytes, b"/DejaVuSans-bold"));
    assert!(contains(&bytes, b"/DejaVuSans-italic"));

    // subsetting keeps the file well under the size of the three faces
    let full: usize = [font_files().regular, font_files().bold, font_files().italic]
        .iter()
        .map(Vec::len)
        .sum();
    assert!(bytes.len() < full / 4, "{} bytes", bytes.len());
}
