use crate::model::FormattingDecision;

/// Lines starting with one of these are set as centered bold headings.
pub const HEADING_PHRASES: &[&str] = &[
    "ORDINARIA",
    "AGENDA:",
    "PARTICIPANTES",
    "ARTÍCULOS DE LA SESIÓN:",
    "AGENDA DE PUNTOS CONSULTADOS",
];

/// Decide how a paragraph line is styled. First match wins: heading
/// phrase, then the first colon, then plain prose.
pub fn classify(line: &str) -> FormattingDecision {
    let trimmed = line.trim();

    if HEADING_PHRASES.iter().any(|p| trimmed.starts_with(p)) {
        return FormattingDecision::CenteredBold;
    }

    match trimmed.find(':') {
        Some(idx) => FormattingDecision::LabelValue {
            label: trimmed[..=idx].to_string(),
            value: trimmed[idx + 1..].trim().to_string(),
        },
        None => FormattingDecision::Plain,
    }
}
