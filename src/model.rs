use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::fonts::FontBook;

/// Organization block shown in every page header.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encabezado {
    pub nombre_organizacion: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// Meeting-minutes record. Every text field holds `\n`-delimited paragraphs.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Acta {
    pub encabezado: Encabezado,
    #[serde(default)]
    pub pagina_inicial: String,
    #[serde(default)]
    pub indice_puntos: String,
    #[serde(default)]
    pub cuerpo: String,
    #[serde(default)]
    pub pagina_firmas: String,
    #[serde(default)]
    pub pie_pagina: String,
}

impl Acta {
    pub fn section_text(&self, section: Section) -> &str {
        match section {
            Section::Cover => &self.pagina_inicial,
            Section::Index => &self.indice_puntos,
            Section::Body => &self.cuerpo,
            Section::Signatures => &self.pagina_firmas,
        }
    }

    pub fn footer_lines(&self) -> impl Iterator<Item = &str> {
        self.pie_pagina
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    Cover,
    Index,
    Body,
    Signatures,
}

impl Section {
    /// Fixed composition order.
    pub const ALL: [Section; 4] = [
        Section::Cover,
        Section::Index,
        Section::Body,
        Section::Signatures,
    ];
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Section::Cover => "cover",
            Section::Index => "index",
            Section::Body => "body",
            Section::Signatures => "signatures",
        };
        f.write_str(name)
    }
}

/// One line of the signature page.
#[derive(Clone, Debug, PartialEq)]
pub enum SignatureLine {
    Entry { role: String, name: String },
    /// Dates, notes and blank lines, kept as written: drawn in italic
    /// without a rule.
    Plain(String),
}

impl SignatureLine {
    const SEPARATOR: &'static str = " - ";

    /// "Role - Name" becomes an entry with trimmed parts; anything with
    /// fewer than two non-empty dash-separated parts stays the raw line.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let mut parts = trimmed.splitn(2, Self::SEPARATOR).map(str::trim);
        match (parts.next(), parts.next()) {
            (Some(role), Some(name)) if !role.is_empty() && !name.is_empty() => {
                SignatureLine::Entry {
                    role: role.to_string(),
                    name: name.to_string(),
                }
            }
            _ => SignatureLine::Plain(line.to_string()),
        }
    }

    pub fn parse_all(text: &str) -> Vec<Self> {
        text.split('\n').map(Self::parse).collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FormattingDecision {
    CenteredBold,
    /// `label` keeps its trailing colon.
    LabelValue { label: String, value: String },
    Plain,
}

/// A laid-out row of words. `width` includes the inter-word spaces.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    pub words: Vec<String>,
    pub width: f32,
}

impl Line {
    pub fn text(&self) -> String {
        self.words.join(" ")
    }
}

pub type Color = [u8; 3];

pub const BLACK: Color = [0, 0, 0];
pub const GRAY: Color = [90, 90, 90];

/// Opaque font token handed to the graphics surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FontHandle(pub usize);

#[derive(Clone, Copy, Debug)]
pub struct Fonts {
    pub regular: FontHandle,
    pub bold: FontHandle,
    pub italic: FontHandle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageHandle(pub usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub usize);

/// Straight (non-premultiplied) RGBA pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl Bitmap {
    pub fn has_alpha(&self) -> bool {
        self.rgba.chunks_exact(4).any(|p| p[3] < 255)
    }

    pub fn alpha_at(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y * self.width + x) * 4 + 3) as usize;
        self.rgba.get(idx).copied()
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Text {
        text: String,
        x: f32,
        y: f32,
        font: FontHandle,
        size: f32,
        color: Color,
    },
    Image {
        image: ImageHandle,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

pub struct Page {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<DrawCommand>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = (&str, f32, f32, FontHandle)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, x, y, font, .. } => Some((text.as_str(), *x, *y, *font)),
            _ => None,
        })
    }

    pub fn image_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Image { .. }))
            .count()
    }
}

/// Assembled page set, ready to be serialized by the host.
pub struct Document {
    pub pages: Vec<Page>,
    pub images: Vec<Arc<Bitmap>>,
    pub fonts: FontBook,
}
