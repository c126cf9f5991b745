//! kurbo / lottie-core values to their tiny-skia counterparts.

use kurbo::{Affine, BezPath, PathEl, Rect};
use lottie_core::layer::BlendMode;
use lottie_core::surface::{LineCap, LineJoin, StrokeStyle};
use lottie_core::{Brush, Color, FillRule, GradientColor};
use tiny_skia as sk;

pub(crate) fn transform(a: Affine) -> sk::Transform {
    let [sx, ky, kx, sy, tx, ty] = a.as_coeffs();
    sk::Transform::from_row(
        sx as f32, ky as f32, kx as f32, sy as f32, tx as f32, ty as f32,
    )
}

/// `None` for paths with no drawable segments.
pub(crate) fn path(path: &BezPath) -> Option<sk::Path> {
    let mut pb = sk::PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => pb.move_to(p.x as f32, p.y as f32),
            PathEl::LineTo(p) => pb.line_to(p.x as f32, p.y as f32),
            PathEl::QuadTo(c, p) => pb.quad_to(c.x as f32, c.y as f32, p.x as f32, p.y as f32),
            PathEl::CurveTo(c1, c2, p) => pb.cubic_to(
                c1.x as f32,
                c1.y as f32,
                c2.x as f32,
                c2.y as f32,
                p.x as f32,
                p.y as f32,
            ),
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

pub(crate) fn rect(r: Rect) -> Option<sk::Rect> {
    sk::Rect::from_ltrb(r.x0 as f32, r.y0 as f32, r.x1 as f32, r.y1 as f32)
}

pub(crate) fn fill_rule(rule: FillRule) -> sk::FillRule {
    match rule {
        FillRule::NonZero => sk::FillRule::Winding,
        FillRule::EvenOdd => sk::FillRule::EvenOdd,
    }
}

pub(crate) fn color(c: Color, opacity: f32) -> sk::Color {
    sk::Color::from_rgba(
        c.r.clamp(0.0, 1.0),
        c.g.clamp(0.0, 1.0),
        c.b.clamp(0.0, 1.0),
        (c.a * opacity).clamp(0.0, 1.0),
    )
    .unwrap_or(sk::Color::TRANSPARENT)
}

fn stops(gradient: &GradientColor, opacity: f32) -> Vec<sk::GradientStop> {
    gradient
        .positions
        .iter()
        .zip(&gradient.colors)
        .map(|(&pos, &c)| sk::GradientStop::new(pos.clamp(0.0, 1.0), color(c, opacity)))
        .collect()
}

/// Shader for `brush`. Degenerate gradients fall back to their first stop,
/// which is what tiny-skia draws for a zero-length axis anyway.
pub(crate) fn shader(brush: &Brush, opacity: f32) -> sk::Shader<'static> {
    let fallback = |g: &GradientColor| {
        let first = g.colors.first().copied().unwrap_or(Color::TRANSPARENT);
        sk::Shader::SolidColor(color(first, opacity))
    };
    match brush {
        Brush::Solid(c) => sk::Shader::SolidColor(color(*c, opacity)),
        Brush::Linear { start, end, stops: g } => sk::LinearGradient::new(
            sk::Point::from_xy(start.x as f32, start.y as f32),
            sk::Point::from_xy(end.x as f32, end.y as f32),
            stops(g, opacity),
            sk::SpreadMode::Pad,
            sk::Transform::identity(),
        )
        .unwrap_or_else(|| fallback(g)),
        Brush::Radial {
            center,
            focal,
            radius,
            stops: g,
        } => sk::RadialGradient::new(
            sk::Point::from_xy(focal.x as f32, focal.y as f32),
            sk::Point::from_xy(center.x as f32, center.y as f32),
            *radius as f32,
            stops(g, opacity),
            sk::SpreadMode::Pad,
            sk::Transform::identity(),
        )
        .unwrap_or_else(|| fallback(g)),
    }
}

pub(crate) fn stroke(style: &StrokeStyle) -> sk::Stroke {
    let dash = style.dashes.as_ref().and_then(|(intervals, offset)| {
        let s = sk::StrokeDash::new(intervals.clone(), *offset);
        if s.is_none() {
            tracing::trace!(?intervals, "dash pattern rejected, drawing solid");
        }
        s
    });
    sk::Stroke {
        width: style.width,
        miter_limit: style.miter_limit.max(1.0),
        line_cap: match style.cap {
            LineCap::Butt => sk::LineCap::Butt,
            LineCap::Round => sk::LineCap::Round,
            LineCap::Square => sk::LineCap::Square,
        },
        line_join: match style.join {
            LineJoin::Miter => sk::LineJoin::Miter,
            LineJoin::Round => sk::LineJoin::Round,
            LineJoin::Bevel => sk::LineJoin::Bevel,
        },
        dash,
    }
}

/// `None` for modes the pipeline has no stage for.
pub(crate) fn blend_mode(mode: BlendMode) -> Option<sk::BlendMode> {
    Some(match mode {
        BlendMode::Normal => sk::BlendMode::SourceOver,
        BlendMode::Multiply => sk::BlendMode::Multiply,
        BlendMode::Screen => sk::BlendMode::Screen,
        BlendMode::Overlay => sk::BlendMode::Overlay,
        BlendMode::Darken => sk::BlendMode::Darken,
        BlendMode::Lighten => sk::BlendMode::Lighten,
        BlendMode::ColorDodge => sk::BlendMode::ColorDodge,
        BlendMode::ColorBurn => sk::BlendMode::ColorBurn,
        BlendMode::HardLight => sk::BlendMode::HardLight,
        BlendMode::SoftLight => sk::BlendMode::SoftLight,
        BlendMode::Difference => sk::BlendMode::Difference,
        BlendMode::Exclusion => sk::BlendMode::Exclusion,
        BlendMode::Hue => sk::BlendMode::Hue,
        BlendMode::Saturation => sk::BlendMode::Saturation,
        BlendMode::Color => sk::BlendMode::Color,
        BlendMode::Luminosity => sk::BlendMode::Luminosity,
        BlendMode::Add => sk::BlendMode::Plus,
        BlendMode::HardMix => return None,
    })
}
