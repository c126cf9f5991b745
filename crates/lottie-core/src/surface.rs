//! Drawing capability consumed by the compositor.
//!
//! The core never touches pixels. A host supplies a [`Surface`] with
//! stack-disciplined state: [`Surface::save`] and [`Surface::save_layer`]
//! both push, [`Surface::restore`] pops whichever was pushed last. Popping an
//! offscreen layer composites it onto the layer below using its
//! [`LayerParams`].

use crate::asset::Bitmap;
use crate::color::Color;
use crate::gradient::GradientColor;
use crate::layer::BlendMode;
use crate::shape::MergeMode;
use crate::text::TextRun;
use kurbo::{Affine, BezPath, Point, Rect, Shape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOp {
    Intersect,
    Difference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Paint source. Gradient geometry is in the same space as the path.
#[derive(Debug, Clone, PartialEq)]
pub enum Brush {
    Solid(Color),
    Linear {
        start: Point,
        end: Point,
        stops: GradientColor,
    },
    Radial {
        center: Point,
        focal: Point,
        radius: f64,
        stops: GradientColor,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct FillStyle {
    pub brush: Brush,
    /// `0..=1`, multiplied into the brush alpha.
    pub opacity: f32,
    pub rule: FillRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrokeStyle {
    pub brush: Brush,
    pub opacity: f32,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    /// Alternating dash and gap lengths (even count) and the dash offset.
    pub dashes: Option<(Vec<f32>, f32)>,
}

/// How a finished offscreen layer combines with what is below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskComposite {
    /// Keep the destination where this layer has alpha.
    DestinationIn,
    /// Keep the destination where this layer is transparent.
    DestinationOut,
    /// Keep the destination in proportion to this layer's luminance.
    LumaIn,
    LumaOut,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerParams {
    pub opacity: f32,
    pub blend: BlendMode,
    /// When set, the layer masks the destination instead of drawing over it
    /// and `blend` is ignored.
    pub composite: Option<MaskComposite>,
}

impl Default for LayerParams {
    fn default() -> Self {
        Self {
            opacity: 1.0,
            blend: BlendMode::Normal,
            composite: None,
        }
    }
}

impl LayerParams {
    pub fn with_opacity(opacity: f32) -> Self {
        Self {
            opacity,
            ..Self::default()
        }
    }

    pub fn mask(composite: MaskComposite) -> Self {
        Self {
            composite: Some(composite),
            ..Self::default()
        }
    }
}

pub trait Surface {
    fn save(&mut self);
    fn restore(&mut self);
    fn save_layer(&mut self, params: &LayerParams);

    fn concat(&mut self, transform: Affine);
    fn set_transform(&mut self, transform: Affine);
    fn transform(&self) -> Affine;

    fn clip_path(&mut self, path: &BezPath, rule: FillRule, op: ClipOp);
    fn clip_rect(&mut self, rect: Rect) {
        self.clip_path(&rect.to_path(0.1), FillRule::NonZero, ClipOp::Intersect);
    }

    fn fill_path(&mut self, path: &BezPath, style: &FillStyle);
    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle);

    /// Draws the `src` region of `bitmap` into `dst` (current space).
    fn draw_bitmap(&mut self, bitmap: &Bitmap, src: Rect, dst: Rect, alpha: f32);

    /// Text without host glyph outlines. Surfaces that cannot shape text
    /// ignore it.
    fn draw_text_run(&mut self, _run: &TextRun) {}

    fn supports_blend_mode(&self, mode: BlendMode) -> bool {
        mode == BlendMode::Normal
    }

    /// Boolean combination of `operands` in order. `None` makes the caller
    /// fall back to fill-rule emulation.
    fn path_op(&mut self, _mode: MergeMode, _operands: &[BezPath]) -> Option<BezPath> {
        None
    }
}

/// One call made on a [`RecordingSurface`]. Draw commands carry the
/// transform that was current when they were issued.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Save,
    Restore,
    SaveLayer(LayerParams),
    Clip {
        path: BezPath,
        rule: FillRule,
        op: ClipOp,
        transform: Affine,
    },
    Fill {
        path: BezPath,
        style: FillStyle,
        transform: Affine,
    },
    Stroke {
        path: BezPath,
        style: StrokeStyle,
        transform: Affine,
    },
    Bitmap {
        src: Rect,
        dst: Rect,
        alpha: f32,
        transform: Affine,
    },
    Text(TextRun),
}

/// Surface that records calls instead of drawing. Used by tests and for
/// inspecting what a frame would draw.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
    stack: Vec<Affine>,
    current: Affine,
    all_blend_modes: bool,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            stack: Vec::new(),
            current: Affine::IDENTITY,
            all_blend_modes: false,
        }
    }

    /// Claims support for every blend mode.
    pub fn with_blend_modes(mut self) -> Self {
        self.all_blend_modes = true;
        self
    }

    pub fn fills(&self) -> impl Iterator<Item = (&BezPath, &FillStyle, Affine)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Fill {
                path,
                style,
                transform,
            } => Some((path, style, *transform)),
            _ => None,
        })
    }

    pub fn strokes(&self) -> impl Iterator<Item = (&BezPath, &StrokeStyle, Affine)> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Stroke {
                path,
                style,
                transform,
            } => Some((path, style, *transform)),
            _ => None,
        })
    }

    pub fn layers(&self) -> impl Iterator<Item = &LayerParams> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::SaveLayer(params) => Some(params),
            _ => None,
        })
    }

    /// Depth of pushed state; zero after a balanced frame.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

impl Surface for RecordingSurface {
    fn save(&mut self) {
        self.stack.push(self.current);
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.current = t;
        }
        self.commands.push(DrawCommand::Restore);
    }

    fn save_layer(&mut self, params: &LayerParams) {
        self.stack.push(self.current);
        self.commands.push(DrawCommand::SaveLayer(*params));
    }

    fn concat(&mut self, transform: Affine) {
        self.current *= transform;
    }

    fn set_transform(&mut self, transform: Affine) {
        self.current = transform;
    }

    fn transform(&self) -> Affine {
        self.current
    }

    fn clip_path(&mut self, path: &BezPath, rule: FillRule, op: ClipOp) {
        self.commands.push(DrawCommand::Clip {
            path: path.clone(),
            rule,
            op,
            transform: self.current,
        });
    }

    fn fill_path(&mut self, path: &BezPath, style: &FillStyle) {
        self.commands.push(DrawCommand::Fill {
            path: path.clone(),
            style: style.clone(),
            transform: self.current,
        });
    }

    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle) {
        self.commands.push(DrawCommand::Stroke {
            path: path.clone(),
            style: style.clone(),
            transform: self.current,
        });
    }

    fn draw_bitmap(&mut self, _bitmap: &Bitmap, src: Rect, dst: Rect, alpha: f32) {
        self.commands.push(DrawCommand::Bitmap {
            src,
            dst,
            alpha,
            transform: self.current,
        });
    }

    fn draw_text_run(&mut self, run: &TextRun) {
        self.commands.push(DrawCommand::Text(run.clone()));
    }

    fn supports_blend_mode(&self, mode: BlendMode) -> bool {
        self.all_blend_modes || mode == BlendMode::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_tracks_transform_stack() {
        let mut s = RecordingSurface::new();
        s.concat(Affine::translate((5.0, 0.0)));
        s.save();
        s.concat(Affine::scale(2.0));
        assert_eq!(s.transform(), Affine::translate((5.0, 0.0)) * Affine::scale(2.0));
        s.restore();
        assert_eq!(s.transform(), Affine::translate((5.0, 0.0)));
        assert_eq!(s.depth(), 0);
    }

    #[test]
    fn only_normal_blending_by_default() {
        let s = RecordingSurface::new();
        assert!(s.supports_blend_mode(BlendMode::Normal));
        assert!(!s.supports_blend_mode(BlendMode::Multiply));
        assert!(RecordingSurface::new()
            .with_blend_modes()
            .supports_blend_mode(BlendMode::Multiply));
    }
}
