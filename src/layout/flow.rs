use crate::error::Error;
use crate::model::{BLACK, FontHandle, Fonts, FormattingDecision, Line, PageHandle};
use crate::surface::GraphicsSurface;

use super::PageGeometry;
use super::breaker::{MeasuredWord, break_paragraph, pack_words};
use super::classify::classify;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowState {
    Flowing,
    PageFull,
}

/// Record of one overflow: the cursor that triggered it and where the new page starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageBreak {
    pub page: PageHandle,
    pub cursor_before: f32,
    pub cursor_after: f32,
}

/// Pages touched while laying out one section.
#[derive(Clone, Debug)]
pub struct SectionLayout {
    pub pages: Vec<PageHandle>,
    pub breaks: Vec<PageBreak>,
    pub final_cursor: f32,
}

/// Called for every page the controller allocates on overflow.
pub type PageHook<'a, S> = &'a dyn Fn(&mut S, PageHandle) -> Result<(), Error>;

/// Pagination state machine for one section.
///
/// The cursor is the baseline of the next line. Before any line is drawn the
/// controller checks `cursor < bottom_margin + needed`; when that holds the
/// current page is sealed, a new one is allocated and the cursor returns to
/// the top of content.
pub struct PageFlowController<'a, S: GraphicsSurface> {
    surface: &'a mut S,
    geometry: &'a PageGeometry,
    fonts: Fonts,
    on_new_page: Option<PageHook<'a, S>>,
    state: FlowState,
    cursor: f32,
    /// Separation owed to the next paragraph, applied when it starts.
    pending_gap: f32,
    pages: Vec<PageHandle>,
    breaks: Vec<PageBreak>,
}

impl<'a, S: GraphicsSurface> PageFlowController<'a, S> {
    /// Start flowing at the top of `first_page`, which the caller already created.
    pub fn new(surface: &'a mut S, geometry: &'a PageGeometry, fonts: Fonts, first_page: PageHandle) -> Self {
        Self {
            surface,
            geometry,
            fonts,
            on_new_page: None,
            state: FlowState::Flowing,
            cursor: geometry.top_of_content(),
            pending_gap: 0.0,
            pages: vec![first_page],
            breaks: Vec::new(),
        }
    }

    pub fn with_page_hook(mut self, hook: PageHook<'a, S>) -> Self {
        self.on_new_page = Some(hook);
        self
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn geometry(&self) -> &PageGeometry {
        self.geometry
    }

    pub fn fonts(&self) -> Fonts {
        self.fonts
    }

    pub(crate) fn surface(&mut self) -> &mut S {
        self.surface
    }

    /// Lay out every `\n`-separated paragraph of `text`.
    pub fn layout(&mut self, text: &str) -> Result<(), Error> {
        for paragraph in text.split('\n') {
            self.layout_paragraph(paragraph)?;
        }
        Ok(())
    }

    pub fn layout_paragraph(&mut self, paragraph: &str) -> Result<(), Error> {
        let line_h = self.geometry.line_height;
        let gap = std::mem::take(&mut self.pending_gap);
        self.advance(gap);
        if paragraph.trim().is_empty() {
            self.ensure_room(line_h)?;
            self.advance(line_h);
            return Ok(());
        }

        match classify(paragraph) {
            FormattingDecision::CenteredBold => self.layout_heading(paragraph),
            FormattingDecision::LabelValue { label, value } => {
                self.layout_label_value(&label, &value)?;
                self.pending_gap = line_h * 0.5;
                Ok(())
            }
            FormattingDecision::Plain => {
                self.layout_plain(paragraph)?;
                self.pending_gap = line_h * 0.5;
                Ok(())
            }
        }
    }

    /// Allocate a new page when fewer than `needed` units remain above the bottom margin.
    pub fn ensure_room(&mut self, needed: f32) -> Result<(), Error> {
        if self.cursor >= self.geometry.bottom_margin() + needed {
            return Ok(());
        }
        self.state = FlowState::PageFull;
        let cursor_before = self.cursor;
        let page = self
            .surface
            .new_page(self.geometry.page_width, self.geometry.page_height);
        if let Some(hook) = self.on_new_page {
            hook(self.surface, page)?;
        }
        self.cursor = self.geometry.top_of_content();
        self.pages.push(page);
        self.breaks.push(PageBreak {
            page,
            cursor_before,
            cursor_after: self.cursor,
        });
        log::debug!("Page break at cursor {cursor_before:.1} → page {}", page.0 + 1);
        self.state = FlowState::Flowing;
        Ok(())
    }

    pub(crate) fn advance(&mut self, dy: f32) {
        self.cursor -= dy;
    }

    pub fn finish(self) -> SectionLayout {
        SectionLayout {
            pages: self.pages,
            breaks: self.breaks,
            final_cursor: self.cursor,
        }
    }

    fn measure(&self, text: &str, font: FontHandle, size: f32) -> Result<f32, Error> {
        self.surface.measure_text(text, font, size)
    }

    fn wrap(&self, text: &str, font: FontHandle, size: f32) -> Result<Vec<Line>, Error> {
        let words: Vec<&str> = text.split_whitespace().collect();
        break_paragraph(&words, self.geometry.max_line_width(), |w| {
            self.measure(w, font, size)
        })
    }

    fn layout_heading(&mut self, paragraph: &str) -> Result<(), Error> {
        let size = self.geometry.heading_font_size();
        let bold = self.fonts.bold;
        let lines = self.wrap(paragraph, bold, size)?;
        for line in &lines {
            self.ensure_room(self.geometry.line_height)?;
            let x = (self.geometry.page_width - line.width) / 2.0;
            let y = self.cursor;
            self.surface.draw_text(&line.text(), x, y, bold, size, BLACK)?;
            self.advance(self.geometry.line_height * 1.5);
        }
        Ok(())
    }

    fn layout_plain(&mut self, paragraph: &str) -> Result<(), Error> {
        let size = self.geometry.font_size;
        let regular = self.fonts.regular;
        let lines = self.wrap(paragraph, regular, size)?;
        for line in &lines {
            self.ensure_room(self.geometry.line_height)?;
            let y = self.cursor;
            self.surface
                .draw_text(&line.text(), self.geometry.margin, y, regular, size, BLACK)?;
            self.advance(self.geometry.line_height);
        }
        Ok(())
    }

    /// Bold label through the first colon, regular value after a one-space gap.
    /// Every gap on the line is the regular font's space.
    fn layout_label_value(&mut self, label: &str, value: &str) -> Result<(), Error> {
        let size = self.geometry.font_size;
        let Fonts { regular, bold, .. } = self.fonts;

        let label_words: Vec<&str> = label.split_whitespace().collect();
        let mut words = Vec::new();
        for &text in &label_words {
            words.push(MeasuredWord { text, width: self.measure(text, bold, size)? });
        }
        for text in value.split_whitespace() {
            words.push(MeasuredWord { text, width: self.measure(text, regular, size)? });
        }
        let space_w = self.measure(" ", regular, size)?;
        let lines = pack_words(&words, self.geometry.max_line_width(), space_w);

        let mut bold_left = label_words.len();
        for line in &lines {
            self.ensure_room(self.geometry.line_height)?;
            let y = self.cursor;
            let split = bold_left.min(line.words.len());
            bold_left -= split;
            let (bold_part, regular_part) = line.words.split_at(split);

            // One run per bold word, at its packed offset
            let mut x = self.geometry.margin;
            for word in bold_part {
                self.surface.draw_text(word, x, y, bold, size, BLACK)?;
                x += self.measure(word, bold, size)? + space_w;
            }
            if !regular_part.is_empty() {
                let text = regular_part.join(" ");
                self.surface.draw_text(&text, x, y, regular, size, BLACK)?;
            }
            self.advance(self.geometry.line_height);
        }
        Ok(())
    }
}
