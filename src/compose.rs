use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Error;
use crate::fonts::FontBook;
use crate::layout::{PageFlowController, PageGeometry, SectionLayout, SignatureLayout};
use crate::logo::{LogoResolver, decode_bitmap};
use crate::model::{Acta, BLACK, Bitmap, Fonts, GRAY, PageHandle, Section, SignatureLine};
use crate::surface::GraphicsSurface;

/// Which pages receive the header band.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Only the page each section starts on.
    FirstPageOfSection,
    EveryPage,
}

/// Source of the "Y" in the footer's "page X of Y".
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PageTotal {
    /// Lay the document out once to count pages, then render with the real total.
    Computed,
    /// Stamp a fixed total regardless of the real page count.
    Fixed(usize),
}

pub struct FontFiles {
    pub regular: Vec<u8>,
    pub bold: Vec<u8>,
    pub italic: Vec<u8>,
}

pub struct LayoutOptions {
    pub geometry: PageGeometry,
    pub header_policy: HeaderPolicy,
    pub page_total: PageTotal,
    /// `{page}` and `{total}` are substituted.
    pub page_label: String,
    pub logo_timeout: Duration,
    pub logo_retries: u32,
    pub header_background: Option<Vec<u8>>,
    pub footer_background: Option<Vec<u8>>,
    pub fonts: Option<FontFiles>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::default(),
            header_policy: HeaderPolicy::FirstPageOfSection,
            page_total: PageTotal::Computed,
            page_label: "Página {page} de {total}".to_string(),
            logo_timeout: Duration::from_secs(5),
            logo_retries: 1,
            header_background: None,
            footer_background: None,
            fonts: None,
        }
    }
}

impl LayoutOptions {
    /// Fonts from the options, else from the directory in `ACTA_PDF_FONTS`,
    /// else the built-in Helvetica family.
    pub fn font_book(&self) -> Result<(FontBook, Fonts), Error> {
        if let Some(files) = &self.fonts {
            return FontBook::truetype(files.regular.clone(), files.bold.clone(), files.italic.clone());
        }
        if let Ok(dir) = std::env::var("ACTA_PDF_FONTS") {
            return FontBook::from_dir(&PathBuf::from(dir));
        }
        Ok(FontBook::helvetica())
    }

    pub fn page_label(&self, page: usize, total: usize) -> String {
        self.page_label
            .replace("{page}", &page.to_string())
            .replace("{total}", &total.to_string())
    }
}

/// Decoration bitmaps, decoded once per document and shared by every page.
#[derive(Default)]
pub struct HeaderFooterTemplate {
    pub header_background: Option<Arc<Bitmap>>,
    pub footer_background: Option<Arc<Bitmap>>,
    pub logo: Option<Arc<Bitmap>>,
}

impl HeaderFooterTemplate {
    pub fn load(acta: &Acta, options: &LayoutOptions, resolver: &mut LogoResolver<'_>) -> Result<Self, Error> {
        let decode = |bytes: &Option<Vec<u8>>| -> Result<Option<Arc<Bitmap>>, Error> {
            bytes
                .as_deref()
                .map(|b| decode_bitmap(b).map(Arc::new))
                .transpose()
        };
        let logo = acta
            .encabezado
            .logo_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .and_then(|url| resolver.resolve_logo(url));

        Ok(Self {
            header_background: decode(&options.header_background)?,
            footer_background: decode(&options.footer_background)?,
            logo,
        })
    }
}

/// Lays out the four Acta sections, in order, each starting on a new page.
pub struct DocumentComposer<'a> {
    acta: &'a Acta,
    options: &'a LayoutOptions,
    template: &'a HeaderFooterTemplate,
    fonts: Fonts,
    signature_lines: Option<&'a [SignatureLine]>,
}

impl<'a> DocumentComposer<'a> {
    pub fn new(acta: &'a Acta, options: &'a LayoutOptions, template: &'a HeaderFooterTemplate, fonts: Fonts) -> Self {
        Self {
            acta,
            options,
            template,
            fonts,
            signature_lines: None,
        }
    }

    /// Use pre-tagged signature lines instead of parsing `paginaFirmas`.
    pub fn with_signature_lines(mut self, lines: &'a [SignatureLine]) -> Self {
        self.signature_lines = Some(lines);
        self
    }

    /// Single layout pass; footers are stamped with `total_pages`.
    /// Returns the layout of every section that produced pages.
    pub fn compose<S: GraphicsSurface>(
        &self,
        surface: &mut S,
        total_pages: usize,
    ) -> Result<Vec<(Section, SectionLayout)>, Error> {
        let on_overflow = |surface: &mut S, page: PageHandle| -> Result<(), Error> {
            if self.options.header_policy == HeaderPolicy::EveryPage {
                self.draw_header(surface)?;
            }
            self.draw_footer(surface, page, total_pages)
        };

        let parsed_signatures;
        let signature_lines = match self.signature_lines {
            Some(lines) => lines,
            None => {
                parsed_signatures = SignatureLine::parse_all(&self.acta.pagina_firmas);
                &parsed_signatures[..]
            }
        };

        let mut sections = Vec::new();
        for section in Section::ALL {
            let empty = match section {
                Section::Signatures => signature_lines
                    .iter()
                    .all(|l| matches!(l, SignatureLine::Plain(t) if t.trim().is_empty())),
                _ => self.acta.section_text(section).trim().is_empty(),
            };
            if empty {
                log::debug!("Skipping empty {section} section");
                continue;
            }

            let layout = self
                .layout_section(surface, section, signature_lines, total_pages, &on_overflow)
                .map_err(|e| e.in_section(section))?;
            log::debug!("{section} section laid out on {} page(s)", layout.pages.len());
            sections.push((section, layout));
        }
        Ok(sections)
    }

    fn layout_section<S: GraphicsSurface>(
        &self,
        surface: &mut S,
        section: Section,
        signature_lines: &[SignatureLine],
        total_pages: usize,
        on_overflow: &dyn Fn(&mut S, PageHandle) -> Result<(), Error>,
    ) -> Result<SectionLayout, Error> {
        let g = &self.options.geometry;
        let first_page = surface.new_page(g.page_width, g.page_height);
        self.draw_header(surface)?;
        self.draw_footer(surface, first_page, total_pages)?;

        let mut flow = PageFlowController::new(surface, g, self.fonts, first_page).with_page_hook(on_overflow);
        match section {
            Section::Signatures => SignatureLayout::new(g).layout(&mut flow, signature_lines)?,
            _ => flow.layout(self.acta.section_text(section))?,
        }
        Ok(flow.finish())
    }

    /// Background band, circular logo at the left margin and the organization name centered.
    pub fn draw_header<S: GraphicsSurface>(&self, surface: &mut S) -> Result<(), Error> {
        let g = &self.options.geometry;
        let band_bottom = g.page_height - g.header_height;

        if let Some(bg) = &self.template.header_background {
            surface.draw_image(bg, 0.0, band_bottom, g.page_width, g.header_height);
        }
        if let Some(logo) = &self.template.logo {
            let y = band_bottom + (g.header_height - g.logo_size) / 2.0;
            surface.draw_image(logo, g.margin, y, g.logo_size, g.logo_size);
        }

        let name = self.acta.encabezado.nombre_organizacion.trim();
        if !name.is_empty() {
            let size = g.title_font_size;
            let width = surface.measure_text(name, self.fonts.bold, size)?;
            let x = (g.page_width - width) / 2.0;
            let y = band_bottom + g.header_height / 2.0 - size * 0.35;
            surface.draw_text(name, x, y, self.fonts.bold, size, BLACK)?;
        }
        Ok(())
    }

    /// Background band, centered footer lines and the right-aligned page label.
    pub fn draw_footer<S: GraphicsSurface>(&self, surface: &mut S, page: PageHandle, total_pages: usize) -> Result<(), Error> {
        let g = &self.options.geometry;
        let size = g.footer_font_size;

        if let Some(bg) = &self.template.footer_background {
            surface.draw_image(bg, 0.0, 0.0, g.page_width, g.footer_height);
        }

        let step = size * 1.25;
        let mut y = g.footer_height - 2.0 * size;
        for line in self.acta.footer_lines() {
            if y < size * 0.5 {
                log::debug!("Footer text truncated at {line:?}");
                break;
            }
            let width = surface.measure_text(line, self.fonts.regular, size)?;
            surface.draw_text(line, (g.page_width - width) / 2.0, y, self.fonts.regular, size, GRAY)?;
            y -= step;
        }

        let label = self.options.page_label(page.0 + 1, total_pages);
        let width = surface.measure_text(&label, self.fonts.regular, size)?;
        let x = g.page_width - g.margin - width;
        surface.draw_text(&label, x, g.margin / 2.0, self.fonts.regular, size, GRAY)?;
        Ok(())
    }
}
