use crate::color::Color;
use kurbo::{Affine, BezPath, Point};
use lottie_data::model;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Justification {
    #[default]
    Left,
    Right,
    Center,
}

/// Text content of a text layer at one keyframe.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextDocument {
    pub text: String,
    pub font_name: String,
    pub size: f32,
    pub justification: Justification,
    /// Extra spacing between characters, in thousandths of an em.
    pub tracking: f32,
    pub line_height: f32,
    pub fill: Color,
    pub stroke: Option<Color>,
    pub stroke_width: f32,
}

impl TextDocument {
    pub fn from_model(doc: &model::TextDocument) -> Self {
        Self {
            text: doc.t.clone(),
            font_name: doc.f.clone(),
            size: doc.s,
            justification: match doc.j {
                1 => Justification::Right,
                2 => Justification::Center,
                _ => Justification::Left,
            },
            tracking: doc.tr,
            line_height: doc.lh.unwrap_or(doc.s * 1.2),
            fill: doc.fc.as_deref().map(Color::from_components).unwrap_or(Color::BLACK),
            stroke: doc.sc.as_deref().map(Color::from_components),
            stroke_width: doc.sw.unwrap_or(0.0),
        }
    }

    /// Lines split on the exporter's carriage returns as well as newlines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split(['\r', '\n', '\u{3}'])
    }
}

/// Font face as declared in the document's font table.
#[derive(Debug, Clone, PartialEq)]
pub struct FontFace {
    pub name: String,
    pub family: String,
    pub style: String,
    pub ascent: f32,
}

/// Outline of one character at unit scale (1 em = 1.0), baseline at y = 0.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub outline: BezPath,
    pub advance: f64,
}

/// Host-supplied glyph outlines, keyed by font family and style.
pub trait GlyphProvider: Send + Sync {
    fn glyph(&self, family: &str, style: &str, ch: char) -> Option<Glyph>;
}

/// A line of text handed to the surface when no glyph outlines are
/// available. `origin` is the left end of the baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub family: String,
    pub style: String,
    pub size: f32,
    pub tracking: f32,
    pub color: Color,
    pub origin: Point,
    pub justification: Justification,
}

/// Positions every glyph of `doc` and returns outlines in layer space, or
/// `None` when the provider lacks a glyph.
pub(crate) fn layout_glyphs(
    doc: &TextDocument,
    face: &FontFace,
    provider: &dyn GlyphProvider,
) -> Option<BezPath> {
    let size = doc.size as f64;
    let tracking = doc.tracking as f64 / 1000.0 * size;
    let mut out = BezPath::new();

    for (line_no, line) in doc.lines().enumerate() {
        let mut glyphs = Vec::new();
        let mut width = 0.0;
        for ch in line.chars() {
            let glyph = provider.glyph(&face.family, &face.style, ch)?;
            width += glyph.advance * size + tracking;
            glyphs.push(glyph);
        }
        let mut x = match doc.justification {
            Justification::Left => 0.0,
            Justification::Right => -width,
            Justification::Center => -width / 2.0,
        };
        let y = line_no as f64 * doc.line_height as f64;
        for glyph in glyphs {
            let placement = Affine::translate((x, y)) * Affine::scale(size);
            let placed = placement * glyph.outline;
            out.extend(placed.elements().iter().copied());
            x += glyph.advance * size + tracking;
        }
    }
    Some(out)
}
