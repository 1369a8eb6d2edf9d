mod breaker;
mod classify;
mod flow;
mod signatures;

pub use breaker::{MeasuredWord, break_paragraph, pack_words};
pub use classify::{HEADING_PHRASES, classify};
pub use flow::{FlowState, PageBreak, PageFlowController, PageHook, SectionLayout};
pub use signatures::SignatureLayout;

/// Fixed page geometry and type sizes, in page units (PDF points).
#[derive(Clone, Debug)]
pub struct PageGeometry {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub header_height: f32,
    pub footer_height: f32,
    pub font_size: f32,
    pub line_height: f32,
    pub title_font_size: f32,
    pub footer_font_size: f32,
    pub logo_size: f32,
    pub signature_rule_width: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            page_width: 520.0,
            page_height: 650.0,
            margin: 30.0,
            header_height: 70.0,
            footer_height: 50.0,
            font_size: 11.0,
            line_height: 16.0,
            title_font_size: 14.0,
            footer_font_size: 8.0,
            logo_size: 50.0,
            signature_rule_width: 200.0,
        }
    }
}

impl PageGeometry {
    pub fn max_line_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    /// Baseline of the first line on a fresh page.
    pub fn top_of_content(&self) -> f32 {
        self.page_height - self.header_height - self.margin
    }

    pub fn bottom_margin(&self) -> f32 {
        self.footer_height + self.margin
    }

    pub fn heading_font_size(&self) -> f32 {
        self.font_size + 1.0
    }

    /// Blank space reserved above a signature rule.
    pub fn signature_step(&self) -> f32 {
        2.0 * self.line_height
    }
}
