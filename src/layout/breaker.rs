use crate::error::Error;
use crate::model::Line;

/// A word whose width was measured up front, possibly in a font other than
/// the paragraph's regular face.
#[derive(Clone, Debug)]
pub struct MeasuredWord<'a> {
    pub text: &'a str,
    pub width: f32,
}

/// Greedy first-fit line breaking.
///
/// A word goes on the current line unless the line's word widths, plus the
/// word, plus one space per word already on the line would exceed
/// `max_width`. A word wider than `max_width` is placed alone on its own line.
pub fn break_paragraph<F>(words: &[&str], max_width: f32, mut measure: F) -> Result<Vec<Line>, Error>
where
    F: FnMut(&str) -> Result<f32, Error>,
{
    let space_width = measure(" ")?;
    let measured = words
        .iter()
        .map(|&text| Ok(MeasuredWord { text, width: measure(text)? }))
        .collect::<Result<Vec<_>, Error>>()?;
    Ok(pack_words(&measured, max_width, space_width))
}

/// Packs pre-measured words into lines; see [`break_paragraph`].
pub fn pack_words(words: &[MeasuredWord<'_>], max_width: f32, space_width: f32) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut line_words: Vec<String> = Vec::new();
    let mut line_width = 0.0f32;

    let finish = |words: &mut Vec<String>, width: f32| {
        let gaps = words.len().saturating_sub(1) as f32;
        Line {
            words: std::mem::take(words),
            width: width + gaps * space_width,
        }
    };

    for word in words {
        let estimated = line_width + word.width + space_width * line_words.len() as f32;
        if estimated > max_width && !line_words.is_empty() {
            lines.push(finish(&mut line_words, line_width));
            line_width = 0.0;
        }
        line_words.push(word.text.to_string());
        line_width += word.width;
    }

    if !line_words.is_empty() {
        lines.push(finish(&mut line_words, line_width));
    }
    lines
}
