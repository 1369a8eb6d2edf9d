use thiserror::Error;

use crate::model::{FontHandle, Section};

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid acta record: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to load font: {0}")]
    Font(String),
    #[error("font handle {0:?} is not registered with the surface")]
    InvalidFont(FontHandle),
    #[error("could not measure {text:?}: {reason}")]
    Measurement { text: String, reason: String },
    #[error("failed to decode image: {0}")]
    Image(String),
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("layout of the {section} section failed: {source}")]
    Section {
        section: Section,
        #[source]
        source: Box<Error>,
    },
    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

impl Error {
    pub(crate) fn in_section(self, section: Section) -> Self {
        match self {
            already @ Error::Section { .. } => already,
            other => Error::Section {
                section,
                source: Box::new(other),
            },
        }
    }
}
