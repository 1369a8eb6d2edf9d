mod error;
mod fonts;
mod pdf;

pub mod compose;
pub mod layout;
pub mod logo;
pub mod model;
pub mod surface;

pub use compose::{DocumentComposer, FontFiles, HeaderFooterTemplate, HeaderPolicy, LayoutOptions, PageTotal};
pub use error::Error;
pub use fonts::{FontBook, FontEntry};
pub use logo::{Fetch, HttpFetcher, LogoResolver};
pub use model::{Acta, Document, Encabezado, Section, SignatureLine};
pub use surface::{GraphicsSurface, PageRecorder};

use std::path::Path;
use std::time::Instant;

pub fn parse_acta(json: &str) -> Result<Acta, Error> {
    Ok(serde_json::from_str(json)?)
}

/// Lay out an Acta into recorded pages, fetching its logo through `fetcher`.
///
/// With [`PageTotal::Computed`] the document is laid out twice: once to count
/// pages and once to render footers with the real total. The logo is resolved
/// before either pass.
pub fn compose_acta(acta: &Acta, options: &LayoutOptions, fetcher: &mut dyn Fetch) -> Result<Document, Error> {
    let (book, fonts) = options.font_book()?;
    let mut resolver = LogoResolver::new(fetcher, options.logo_retries);
    let template = HeaderFooterTemplate::load(acta, options, &mut resolver)?;
    let composer = DocumentComposer::new(acta, options, &template, fonts);

    let (book, total) = match options.page_total {
        PageTotal::Computed => {
            let mut counter = PageRecorder::new(book);
            composer.compose(&mut counter, 0)?;
            let total = counter.page_count();
            (counter.into_fonts(), total)
        }
        PageTotal::Fixed(total) => (book, total),
    };

    let mut recorder = PageRecorder::new(book);
    composer.compose(&mut recorder, total)?;
    if recorder.page_count() != total {
        log::warn!(
            "Footer total says {total} pages but the document has {}",
            recorder.page_count()
        );
    }
    Ok(recorder.finish())
}

/// Lay out and serialize an Acta to PDF bytes, fetching the logo over HTTP.
pub fn render_acta(acta: &Acta, options: &LayoutOptions) -> Result<Vec<u8>, Error> {
    let mut fetcher = HttpFetcher::new(options.logo_timeout);
    let doc = compose_acta(acta, options, &mut fetcher)?;
    pdf::render(&doc)
}

/// Serialize an already composed document.
pub fn render_document(doc: &Document) -> Result<Vec<u8>, Error> {
    pdf::render(doc)
}

pub fn convert_acta_file(input: &Path, output: &Path, options: &LayoutOptions) -> Result<(), Error> {
    let t0 = Instant::now();

    let json = std::fs::read_to_string(input).map_err(|e| {
        Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, input.display())))
    })?;
    let acta = parse_acta(&json)?;
    let t_parse = t0.elapsed();

    let mut fetcher = HttpFetcher::new(options.logo_timeout);
    let doc = compose_acta(&acta, options, &mut fetcher)?;
    let t_layout = t0.elapsed();

    let bytes = pdf::render(&doc)?;
    let t_render = t0.elapsed();

    std::fs::write(output, &bytes)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, layout={:.1}ms, render={:.1}ms, write={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_layout - t_parse).as_secs_f64() * 1000.0,
        (t_render - t_layout).as_secs_f64() * 1000.0,
        (t_total - t_render).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.pages.len(),
        bytes.len(),
    );

    Ok(())
}
