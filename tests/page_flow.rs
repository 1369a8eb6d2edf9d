mod common;

use std::cell::Cell;

use acta_pdf::{Error, GraphicsSurface};
use acta_pdf::layout::{FlowState, PageFlowController, PageGeometry};
use acta_pdf::model::{DrawCommand, PageHandle};

use common::{FONTS, GridSurface, approx, numbered_words, surface_with_page};

#[test]
fn single_line_paragraph_advances_one_line() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout_paragraph("Hola mundo").unwrap();
    let cursor = flow.cursor();
    let layout = flow.finish();

    assert_eq!(layout.pages, vec![first]);
    assert!(approx(cursor, g.top_of_content() - g.line_height));

    let texts = surface.texts(0);
    assert_eq!(texts.len(), 1);
    let (text, x, y, font) = &texts[0];
    assert_eq!(text, "Hola mundo");
    assert!(approx(*x, g.margin));
    assert!(approx(*y, g.top_of_content()));
    assert_eq!(*font, FONTS.regular);
}

#[test]
fn heading_is_centered_at_heading_size() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout_paragraph("ORDINARIA sesión de junta").unwrap();
    let cursor = flow.cursor();
    drop(flow);

    match &surface.pages[0].commands[..] {
        [DrawCommand::Text { text, x, y, font, size, .. }] => {
            assert_eq!(text, "ORDINARIA sesión de junta");
            assert_eq!(*font, FONTS.bold);
            assert!(approx(*size, 12.0));
            // 25 chars at 6 units each
            assert!(approx(*x, (g.page_width - 150.0) / 2.0));
            assert!(approx(*y, g.top_of_content()));
        }
        other => panic!("unexpected commands: {other:?}"),
    }
    // one and a half lines, no extra paragraph gap
    assert!(approx(cursor, g.top_of_content() - 1.5 * g.line_height));
}

#[test]
fn label_value_draws_bold_label_then_regular_value() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout_paragraph("Lugar: Sala A").unwrap();
    drop(flow);

    let texts = surface.texts(0);
    assert_eq!(texts.len(), 2);
    assert_eq!(texts[0].0, "Lugar:");
    assert_eq!(texts[0].3, FONTS.bold);
    assert!(approx(texts[0].1, g.margin));
    assert_eq!(texts[1].0, "Sala A");
    assert_eq!(texts[1].3, FONTS.regular);
    // label width (6 × 5.5) plus one space
    assert!(approx(texts[1].1, g.margin + 33.0 + 5.5));
    assert!(approx(texts[0].2, texts[1].2));
}

#[test]
fn wrapped_label_value_keeps_value_regular_on_later_lines() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let value = numbered_words(30).join(" ");
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout_paragraph(&format!("Asistentes: {value}")).unwrap();
    drop(flow);

    let texts = surface.texts(0);
    assert_eq!(texts[0].0, "Asistentes:");
    assert_eq!(texts[0].3, FONTS.bold);
    assert!(texts.len() > 2);
    assert!(texts[1..].iter().all(|t| t.3 == FONTS.regular));
    assert!(texts.last().unwrap().0.ends_with("w0029"));
}

#[test]
fn blank_paragraph_advances_one_line_without_drawing() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout("Uno\n   \nDos").unwrap();
    drop(flow);

    let texts = surface.texts(0);
    assert_eq!(texts.len(), 2);
    let gap = texts[0].2 - texts[1].2;
    // line + half-line paragraph gap + blank line
    assert!(approx(gap, g.line_height * 2.5));
}

#[test]
fn overflow_allocates_exactly_one_page_and_keeps_order() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let words = numbered_words(500);
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout(&words.join(" ")).unwrap();
    assert_eq!(flow.state(), FlowState::Flowing);
    let layout = flow.finish();

    assert_eq!(surface.pages.len(), 2);
    assert_eq!(layout.pages, vec![PageHandle(0), PageHandle(1)]);
    assert_eq!(layout.breaks.len(), 1);

    // 29 lines of 14 words fit on the first page
    assert_eq!(surface.texts(0).len(), 29);
    assert_eq!(surface.texts(1).len(), 7);

    let drawn: Vec<String> = (0..2)
        .flat_map(|p| surface.texts(p))
        .flat_map(|(t, ..)| t.split(' ').map(str::to_string).collect::<Vec<_>>())
        .collect();
    assert_eq!(drawn, words);
}

#[test]
fn page_breaks_happen_below_threshold_and_reset_to_top() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let mut text = String::new();
    for i in 0..12 {
        if i % 3 == 0 {
            text.push_str("ORDINARIA sesión\n");
        }
        text.push_str(&format!("Punto {i}: {}\n", numbered_words(60).join(" ")));
    }
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout(&text).unwrap();
    let layout = flow.finish();

    assert!(layout.breaks.len() >= 2);
    for b in &layout.breaks {
        assert!(b.cursor_before < g.bottom_margin() + g.line_height);
        assert!(approx(b.cursor_after, g.top_of_content()));
    }
    for page in 0..surface.pages.len() {
        for (_, _, y, _) in surface.texts(page) {
            assert!(y >= g.bottom_margin() + g.line_height - 1e-3, "text below margin at {y}");
        }
    }
}

#[test]
fn page_hook_runs_for_each_overflow_page() {
    let g = PageGeometry::default();
    let (mut surface, first) = surface_with_page(&g);
    let seen = Cell::new(0);
    let hook = |s: &mut GridSurface, page: PageHandle| -> Result<(), Error> {
        seen.set(seen.get() + 1);
        s.draw_line(0.0, 0.0, 10.0, 0.0);
        assert_eq!(page.0 + 1, s.pages.len());
        Ok(())
    };
    let words = numbered_words(1000);
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first).with_page_hook(&hook);
    flow.layout(&words.join(" ")).unwrap();
    let layout = flow.finish();

    assert_eq!(seen.get(), layout.breaks.len());
    assert_eq!(surface.pages.len(), layout.breaks.len() + 1);
    assert!(surface.lines(0).is_empty());
    for page in 1..surface.pages.len() {
        assert_eq!(surface.lines(page).len(), 1);
    }
}

#[test]
fn wide_bold_spaces_do_not_push_label_past_the_margin() {
    let g = PageGeometry::default();
    let mut surface = GridSurface::with_bold_space(20.0);
    let first = surface.new_page(g.page_width, g.page_height);
    let label = numbered_words(20).join(" ");
    let mut flow = PageFlowController::new(&mut surface, &g, FONTS, first);
    flow.layout_paragraph(&format!("{label}: valor")).unwrap();
    drop(flow);

    let texts = surface.texts(0);
    let bold: Vec<_> = texts.iter().filter(|t| t.3 == FONTS.bold).collect();
    // each label word is its own run
    assert_eq!(bold.len(), 20);
    assert!(bold.iter().all(|t| !t.0.contains(' ')));
    for (text, x, _, font) in &texts {
        let width = surface.measure_text(text, *font, g.font_size).unwrap();
        assert!(x + width <= g.margin + g.max_line_width() + 1e-3, "{text:?} ends at {}", x + width);
    }
    // packed with regular 5.5 spaces: 14 words on the first line
    let first_line_y = texts[0].2;
    assert_eq!(bold.iter().filter(|t| approx(t.2, first_line_y)).count(), 14);
    assert!(approx(bold[1].1, g.margin + 27.5 + 5.5));
}
