use crate::error::Error;
use crate::model::{BLACK, SignatureLine};
use crate::surface::GraphicsSurface;

use super::PageGeometry;
use super::flow::PageFlowController;

/// Role and name baselines below the rule, in line heights.
const ROLE_OFFSET: f32 = 0.75;
const NAME_OFFSET: f32 = 1.5;

/// Fixed-step layout for the signature page. Does not word-wrap.
pub struct SignatureLayout<'g> {
    geometry: &'g PageGeometry,
}

impl<'g> SignatureLayout<'g> {
    pub fn new(geometry: &'g PageGeometry) -> Self {
        Self { geometry }
    }

    /// Vertical space one "Role - Name" block consumes. The role and name
    /// rows sit inside the step, below the rule.
    pub fn entry_advance(&self) -> f32 {
        self.geometry.signature_step()
    }

    pub fn layout<S: GraphicsSurface>(
        &self,
        flow: &mut PageFlowController<'_, S>,
        lines: &[SignatureLine],
    ) -> Result<(), Error> {
        for line in lines {
            match line {
                SignatureLine::Entry { role, name } => self.draw_entry(flow, role, name)?,
                SignatureLine::Plain(text) => self.draw_plain(flow, text)?,
            }
        }
        Ok(())
    }

    fn draw_entry<S: GraphicsSurface>(
        &self,
        flow: &mut PageFlowController<'_, S>,
        role: &str,
        name: &str,
    ) -> Result<(), Error> {
        let g = self.geometry;
        let fonts = flow.fonts();
        flow.ensure_room(g.line_height)?;

        let rule_y = flow.cursor();
        flow.surface()
            .draw_line(g.margin, rule_y, g.margin + g.signature_rule_width, rule_y);
        flow.surface().draw_text(
            role,
            g.margin,
            rule_y - ROLE_OFFSET * g.line_height,
            fonts.bold,
            g.font_size,
            BLACK,
        )?;
        flow.surface().draw_text(
            name,
            g.margin,
            rule_y - NAME_OFFSET * g.line_height,
            fonts.regular,
            g.font_size,
            BLACK,
        )?;
        flow.advance(self.entry_advance());
        Ok(())
    }

    fn draw_plain<S: GraphicsSurface>(&self, flow: &mut PageFlowController<'_, S>, text: &str) -> Result<(), Error> {
        let g = self.geometry;
        flow.ensure_room(g.line_height)?;
        if !text.trim().is_empty() {
            let y = flow.cursor();
            let italic = flow.fonts().italic;
            flow.surface()
                .draw_text(text, g.margin, y, italic, g.font_size, BLACK)?;
        }
        flow.advance(g.line_height);
        Ok(())
    }
}
