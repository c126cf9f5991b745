//! Shape items of a shape layer, after parsing.
//!
//! Items keep the document's sibling order. Pairing between geometry and the
//! paints or modifiers that follow it is resolved when content is built.

use crate::animatable::AnimatableValue;
use crate::color::Color;
use crate::gradient::GradientColor;
use crate::layer::Transform;
use crate::path::ShapeData;
use crate::surface::{FillRule, LineCap, LineJoin};
use glam::Vec2;

#[derive(Debug, Clone)]
pub enum ShapeItem {
    Group(Group),
    Path(PathItem),
    Rect(RectItem),
    Ellipse(EllipseItem),
    Polystar(PolystarItem),
    Fill(Fill),
    Stroke(Stroke),
    GradientFill(GradientFill),
    GradientStroke(GradientStroke),
    Trim(Trim),
    MergePaths(MergeMode),
    Repeater(Repeater),
    RoundedCorners(AnimatableValue<f32>),
    /// Recognised modifier that is not rendered. Kept so sibling indices
    /// match the document.
    Unsupported { ty: String },
}

#[derive(Debug, Clone, Default)]
pub struct Group {
    pub name: Option<String>,
    pub items: Vec<ShapeItem>,
    pub transform: Transform,
}

#[derive(Debug, Clone)]
pub struct PathItem {
    pub shape: AnimatableValue<ShapeData>,
    pub reversed: bool,
}

#[derive(Debug, Clone)]
pub struct RectItem {
    pub position: AnimatableValue<Vec2>,
    pub size: AnimatableValue<Vec2>,
    pub roundness: AnimatableValue<f32>,
    pub reversed: bool,
}

#[derive(Debug, Clone)]
pub struct EllipseItem {
    pub position: AnimatableValue<Vec2>,
    pub size: AnimatableValue<Vec2>,
    pub reversed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarKind {
    Star,
    Polygon,
}

#[derive(Debug, Clone)]
pub struct PolystarItem {
    pub kind: StarKind,
    pub position: AnimatableValue<Vec2>,
    pub points: AnimatableValue<f32>,
    /// Degrees.
    pub rotation: AnimatableValue<f32>,
    pub outer_radius: AnimatableValue<f32>,
    /// Percent.
    pub outer_roundness: AnimatableValue<f32>,
    /// Only read for stars.
    pub inner_radius: AnimatableValue<f32>,
    pub inner_roundness: AnimatableValue<f32>,
    pub reversed: bool,
}

#[derive(Debug, Clone)]
pub struct Fill {
    pub color: AnimatableValue<Color>,
    pub opacity: AnimatableValue<f32>,
    pub rule: FillRule,
}

#[derive(Debug, Clone)]
pub struct DashPattern {
    /// Alternating dash and gap lengths.
    pub lengths: Vec<AnimatableValue<f32>>,
    pub offset: AnimatableValue<f32>,
}

impl DashPattern {
    /// Evaluated lengths, doubled when odd so dashes and gaps alternate.
    /// `None` when the pattern would draw nothing useful.
    pub fn evaluate(&self, progress: f32) -> Option<(Vec<f32>, f32)> {
        let mut lengths: Vec<f32> = self
            .lengths
            .iter()
            .map(|l| l.evaluate(progress).max(0.0))
            .collect();
        if lengths.is_empty() || lengths.iter().all(|l| *l <= 0.0) {
            return None;
        }
        if lengths.len() % 2 == 1 {
            lengths.extend_from_within(..);
        }
        Some((lengths, self.offset.evaluate(progress)))
    }
}

#[derive(Debug, Clone)]
pub struct StrokeParams {
    pub width: AnimatableValue<f32>,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub dashes: Option<DashPattern>,
}

#[derive(Debug, Clone)]
pub struct Stroke {
    pub color: AnimatableValue<Color>,
    pub opacity: AnimatableValue<f32>,
    pub params: StrokeParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientKind {
    Linear,
    Radial,
}

#[derive(Debug, Clone)]
pub struct Gradient {
    pub kind: GradientKind,
    pub start: AnimatableValue<Vec2>,
    pub end: AnimatableValue<Vec2>,
    /// Radial focal offset along the start-end axis, percent of the radius.
    pub highlight_length: AnimatableValue<f32>,
    /// Degrees, relative to the start-end axis.
    pub highlight_angle: AnimatableValue<f32>,
    pub colors: AnimatableValue<GradientColor>,
}

#[derive(Debug, Clone)]
pub struct GradientFill {
    pub gradient: Gradient,
    pub opacity: AnimatableValue<f32>,
    pub rule: FillRule,
}

#[derive(Debug, Clone)]
pub struct GradientStroke {
    pub gradient: Gradient,
    pub opacity: AnimatableValue<f32>,
    pub params: StrokeParams,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrimMode {
    /// All covered paths are trimmed as one concatenated path.
    #[default]
    Simultaneous,
    /// Every path is trimmed on its own.
    Individual,
}

#[derive(Debug, Clone)]
pub struct Trim {
    /// Percent.
    pub start: AnimatableValue<f32>,
    pub end: AnimatableValue<f32>,
    /// Degrees, 360 is one full length.
    pub offset: AnimatableValue<f32>,
    pub mode: TrimMode,
}

impl Trim {
    /// Start and end as fractions with the offset applied, start <= end.
    pub fn fractions(&self, progress: f32) -> (f32, f32) {
        let mut s = self.start.evaluate(progress).clamp(0.0, 100.0) / 100.0;
        let mut e = self.end.evaluate(progress).clamp(0.0, 100.0) / 100.0;
        if s > e {
            std::mem::swap(&mut s, &mut e);
        }
        let offset = self.offset.evaluate(progress) / 360.0;
        (s + offset, e + offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeMode {
    #[default]
    Merge,
    Add,
    Subtract,
    Intersect,
    ExcludeIntersections,
}

impl MergeMode {
    pub fn from_code(code: Option<u8>) -> Self {
        match code {
            Some(2) => MergeMode::Add,
            Some(3) => MergeMode::Subtract,
            Some(4) => MergeMode::Intersect,
            Some(5) => MergeMode::ExcludeIntersections,
            _ => MergeMode::Merge,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RepeaterOrder {
    /// Later copies draw on top.
    #[default]
    Above,
    Below,
}

#[derive(Debug, Clone)]
pub struct Repeater {
    pub copies: AnimatableValue<f32>,
    pub offset: AnimatableValue<f32>,
    pub transform: Transform,
    /// Percent, applied to the first copy.
    pub start_opacity: AnimatableValue<f32>,
    /// Percent, approached by the last copy.
    pub end_opacity: AnimatableValue<f32>,
    pub order: RepeaterOrder,
}
