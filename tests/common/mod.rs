#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use acta_pdf::layout::PageGeometry;
use acta_pdf::model::{Bitmap, Color, DrawCommand, FontHandle, Fonts, ImageHandle, Page, PageHandle};
use acta_pdf::{Error, Fetch, GraphicsSurface};

pub const FONTS: Fonts = Fonts {
    regular: FontHandle(0),
    bold: FontHandle(1),
    italic: FontHandle(2),
};

/// Every character is half an em wide, in every font.
pub fn grid_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

/// Deterministic surface for layout tests: fixed-advance metrics, commands
/// recorded per page.
#[derive(Default)]
pub struct GridSurface {
    pub pages: Vec<Page>,
    /// Measuring any text containing this marker fails.
    pub fail_on: Option<String>,
    /// Width of a space set in the bold font, when it differs from the grid.
    pub bold_space: Option<f32>,
    images: Vec<Arc<Bitmap>>,
}

impl GridSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Self::default()
        }
    }

    pub fn with_bold_space(width: f32) -> Self {
        Self {
            bold_space: Some(width),
            ..Self::default()
        }
    }

    /// Text runs of one page, in drawing order.
    pub fn texts(&self, page: usize) -> Vec<(String, f32, f32, FontHandle)> {
        self.pages[page]
            .texts()
            .map(|(t, x, y, f)| (t.to_string(), x, y, f))
            .collect()
    }

    pub fn lines(&self, page: usize) -> Vec<(f32, f32, f32, f32)> {
        self.pages[page]
            .commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Line { x1, y1, x2, y2 } => Some((*x1, *y1, *x2, *y2)),
                _ => None,
            })
            .collect()
    }

    fn check_font(font: FontHandle) -> Result<(), Error> {
        if font.0 > 2 {
            return Err(Error::InvalidFont(font));
        }
        Ok(())
    }
}

impl GraphicsSurface for GridSurface {
    fn measure_text(&self, text: &str, font: FontHandle, size: f32) -> Result<f32, Error> {
        Self::check_font(font)?;
        if let Some(marker) = &self.fail_on
            && text.contains(marker.as_str())
        {
            return Err(Error::Measurement {
                text: text.to_string(),
                reason: "metrics unavailable".to_string(),
            });
        }
        match self.bold_space {
            Some(space) if font == FONTS.bold => {
                let spaces = text.chars().filter(|c| *c == ' ').count();
                let glyphs = text.chars().count() - spaces;
                Ok(glyphs as f32 * size * 0.5 + spaces as f32 * space)
            }
            _ => Ok(grid_width(text, size)),
        }
    }

    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font: FontHandle,
        size: f32,
        color: Color,
    ) -> Result<(), Error> {
        Self::check_font(font)?;
        let page = self.pages.last_mut().expect("page created before drawing");
        page.commands.push(DrawCommand::Text {
            text: text.to_string(),
            x,
            y,
            font,
            size,
            color,
        });
        Ok(())
    }

    fn draw_image(&mut self, image: &Arc<Bitmap>, x: f32, y: f32, width: f32, height: f32) {
        self.images.push(Arc::clone(image));
        let handle = ImageHandle(self.images.len() - 1);
        let page = self.pages.last_mut().expect("page created before drawing");
        page.commands.push(DrawCommand::Image {
            image: handle,
            x,
            y,
            width,
            height,
        });
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        let page = self.pages.last_mut().expect("page created before drawing");
        page.commands.push(DrawCommand::Line { x1, y1, x2, y2 });
    }

    fn new_page(&mut self, width: f32, height: f32) -> PageHandle {
        self.pages.push(Page {
            width,
            height,
            commands: Vec::new(),
        });
        PageHandle(self.pages.len() - 1)
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Start a surface with one open page, as the composer does for each section.
pub fn surface_with_page(geometry: &PageGeometry) -> (GridSurface, PageHandle) {
    let mut surface = GridSurface::new();
    let page = surface.new_page(geometry.page_width, geometry.page_height);
    (surface, page)
}

/// Network double that always fails.
#[derive(Default)]
pub struct FailingFetch {
    pub calls: usize,
}

impl Fetch for FailingFetch {
    fn fetch(&mut self, url: &str) -> Result<Vec<u8>, Error> {
        self.calls += 1;
        Err(Error::Fetch {
            url: url.to_string(),
            reason: "connection refused".to_string(),
        })
    }
}

/// Network double that serves the same bytes for every URL.
pub struct StaticFetch {
    pub bytes: Vec<u8>,
    pub calls: usize,
}

impl StaticFetch {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes, calls: 0 }
    }
}

impl Fetch for StaticFetch {
    fn fetch(&mut self, _url: &str) -> Result<Vec<u8>, Error> {
        self.calls += 1;
        Ok(self.bytes.clone())
    }
}

/// Solid opaque PNG.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// `n` distinct five-character words: w0000, w0001, ...
pub fn numbered_words(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("w{i:04}")).collect()
}
