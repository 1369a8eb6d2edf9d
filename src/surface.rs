use std::sync::Arc;

use crate::error::Error;
use crate::fonts::FontBook;
use crate::model::{Bitmap, Color, Document, DrawCommand, FontHandle, ImageHandle, Page, PageHandle};

/// Drawing capability the layout engine renders through.
///
/// All coordinates are in page units with the origin at the bottom-left
/// corner; `y` of a text run is its baseline. Drawing always targets the
/// page returned by the most recent `new_page` call.
pub trait GraphicsSurface {
    fn measure_text(&self, text: &str, font: FontHandle, size: f32) -> Result<f32, Error>;

    fn draw_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        font: FontHandle,
        size: f32,
        color: Color,
    ) -> Result<(), Error>;

    fn draw_image(&mut self, image: &Arc<Bitmap>, x: f32, y: f32, width: f32, height: f32);

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32);

    fn new_page(&mut self, width: f32, height: f32) -> PageHandle;

    fn page_count(&self) -> usize;
}

/// Surface that records draw commands per page, measuring with a [`FontBook`].
pub struct PageRecorder {
    fonts: FontBook,
    pages: Vec<Page>,
    images: Vec<Arc<Bitmap>>,
}

impl PageRecorder {
    pub fn new(fonts: FontBook) -> Self {
        PageRecorder {
            fonts,
            pages: Vec::new(),
            images: Vec::new(),
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Discard the recorded pages and hand back the font book.
    pub fn into_fonts(self) -> FontBook {
        self.fonts
    }

    pub fn finish(self) -> Document {
        Document {
            pages: self.pages,
            images: self.images,
            fonts: self.fonts,
        }
    }

    fn push(&mut self, command: DrawCommand) {
        match self.pages.last_mut() {
            Some(page) => page.commands.push(command),
            None => log::warn!("Draw command issued before any page was created; dropped"),
        }
    }

    fn image_handle(&mut self, image: &Arc<Bitmap>) -> ImageHandle {
        let idx = match self.images.iter().position(|i| Arc::ptr_eq(i, image)) {
            Some(idx) => idx,
            None => {
                self.images.push(Arc::clone(image));
                self.images.len() - 1
            }
        };
        ImageHandle(idx)
    }
}

impl GraphicsSurface for PageRecorder {
    fn measure_text(&self, text: &str, font: FontHandle, size: f32) -> Result<f32, Error> {
        let width = self.fonts.measure(text, font, size)?;
        if !width.is_finite() {
            return Err(Error::Measurement {
                text: text.to_string(),
                reason: format!("non-finite width {width}"),
            });
        }
        Ok(width)
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
        if self.fonts.entry(font).is_none() {
            return Err(Error::InvalidFont(font));
        }
        self.push(DrawCommand::Text {
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
        let image = self.image_handle(image);
        self.push(DrawCommand::Image {
            image,
            x,
            y,
            width,
            height,
        });
    }

    fn draw_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32) {
        self.push(DrawCommand::Line { x1, y1, x2, y2 });
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
