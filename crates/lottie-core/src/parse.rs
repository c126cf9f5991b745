//! Conversion from the serde document model into evaluable layers.
//!
//! Every keyframe time is converted from frames to composition progress
//! here, so evaluation never needs the frame rate or frame range.

use crate::animatable::{AnimatableValue, Easing, Interpolatable, Keyframe, SpatialSegment};
use crate::color::Color;
use crate::composition::Timeline;
use crate::config::{ParseConfig, PathMismatchPolicy};
use crate::error::{ParseError, ParseWarning};
use crate::gradient::GradientColor;
use crate::layer::{
    BlendMode, ImageLayer, Layer, LayerKind, Mask, MaskMode, MatteType, Position, PrecompLayer,
    ShapeLayer, SolidLayer, TextLayer, Transform,
};
use crate::path::ShapeData;
use crate::path_morph;
use crate::shape::{
    DashPattern, EllipseItem, Fill, Gradient, GradientFill, GradientKind, GradientStroke, Group,
    MergeMode, PathItem, PolystarItem, RectItem, Repeater, RepeaterOrder, ShapeItem, StarKind,
    Stroke, StrokeParams, Trim, TrimMode,
};
use crate::surface::{FillRule, LineCap, LineJoin};
use crate::text::TextDocument;
use glam::Vec2;
use lottie_data::model::{self as data, Property, Value, Vector};

pub(crate) struct ParseContext<'a> {
    timeline: Timeline,
    config: &'a ParseConfig,
    warnings: Vec<ParseWarning>,
    layer_name: Option<String>,
}

impl<'a> ParseContext<'a> {
    pub(crate) fn new(timeline: Timeline, config: &'a ParseConfig) -> Self {
        Self {
            timeline,
            config,
            warnings: Vec::new(),
            layer_name: None,
        }
    }

    pub(crate) fn into_warnings(self) -> Vec<ParseWarning> {
        self.warnings
    }

    fn warn(&mut self, warning: ParseWarning) {
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    /// Converts a layer list, skipping layer types that cannot be drawn.
    pub(crate) fn layers(&mut self, raw: &[data::Layer]) -> Result<Vec<Layer>, ParseError> {
        let mut layers = Vec::with_capacity(raw.len());
        for (index, layer) in raw.iter().enumerate() {
            if let Some(layer) = self.layer(layer).map_err(|e| e.in_layer(index))? {
                layers.push(layer);
            }
        }
        Ok(layers)
    }

    fn layer(&mut self, raw: &data::Layer) -> Result<Option<Layer>, ParseError> {
        self.layer_name = raw.nm.clone();
        if !raw.ip.is_finite() || !raw.op.is_finite() || !raw.st.is_finite() {
            return Err(ParseError::invalid("ip", "layer time range must be finite"));
        }
        if !raw.sr.is_finite() || raw.sr == 0.0 {
            return Err(ParseError::invalid("sr", format!("time stretch {} is unusable", raw.sr)));
        }

        let kind = match raw.ty {
            0 => LayerKind::Precomp(PrecompLayer {
                ref_id: required_ref(raw)?,
                width: raw.w.unwrap_or(0.0),
                height: raw.h.unwrap_or(0.0),
                time_remap: raw.tm.as_ref().map(|tm| self.scalar(tm, 0.0)).transpose()?,
            }),
            1 => LayerKind::Solid(SolidLayer {
                color: raw
                    .sc
                    .as_deref()
                    .and_then(Color::from_hex)
                    .unwrap_or(Color::BLACK),
                width: raw.sw.unwrap_or(0.0),
                height: raw.sh.unwrap_or(0.0),
            }),
            2 => LayerKind::Image(ImageLayer {
                ref_id: required_ref(raw)?,
            }),
            3 => LayerKind::Null,
            4 => LayerKind::Shape(ShapeLayer {
                items: self.items(&raw.shapes)?.0,
            }),
            5 => LayerKind::Text(TextLayer {
                document: match &raw.t {
                    Some(text) => {
                        self.animated(&text.d, TextDocument::default(), |d| {
                            Some(TextDocument::from_model(d))
                        })?
                    }
                    None => AnimatableValue::fixed(TextDocument::default()),
                },
            }),
            ty => {
                tracing::debug!(ty, name = ?raw.nm, "skipping layer type");
                self.warn(ParseWarning::UnsupportedLayer { ty });
                return Ok(None);
            }
        };

        let has_effects = raw.ef.as_ref().is_some_and(|e| !e.is_empty())
            || raw.sy.as_ref().is_some_and(|s| !s.is_empty());
        if has_effects {
            self.warn(ParseWarning::UnsupportedEffect {
                layer: raw.nm.clone(),
            });
        }

        let masks = raw
            .masks_properties
            .iter()
            .map(|m| self.mask(m))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Layer {
            index: raw.ind,
            name: raw.nm.clone(),
            parent: raw.parent,
            kind,
            in_frame: raw.ip,
            out_frame: raw.op,
            start_time: raw.st,
            time_stretch: raw.sr,
            transform: self.transform(&raw.ks)?,
            masks,
            matte: MatteType::from_code(raw.tt),
            blend_mode: BlendMode::from_code(raw.bm.unwrap_or(0)),
            hidden: raw.hd,
        }))
    }

    fn mask(&mut self, raw: &data::MaskProperties) -> Result<Mask, ParseError> {
        let mode = MaskMode::from_code(raw.mode.as_deref());
        if !mode.is_supported() {
            self.warn(ParseWarning::UnsupportedMaskMode { mode });
        }
        Ok(Mask {
            mode,
            inverted: raw.inv,
            path: self.shape(&raw.pt)?,
            opacity: self.scalar(&raw.o, 100.0)?,
        })
    }

    pub(crate) fn transform(&mut self, raw: &data::Transform) -> Result<Transform, ParseError> {
        let position = match &raw.p {
            data::PositionProperty::Split { x, y, .. } => Position::Split {
                x: self.scalar(x, 0.0)?,
                y: self.scalar(y, 0.0)?,
            },
            data::PositionProperty::Unified(p) => Position::Combined(self.point(p, Vec2::ZERO)?),
        };
        Ok(Transform {
            anchor: self.point(&raw.a, Vec2::ZERO)?,
            position,
            scale: self.animated(&raw.s, Vec2::splat(100.0), to_vec2)?,
            rotation: self.scalar(&raw.r, 0.0)?,
            opacity: self.scalar(&raw.o, 100.0)?,
            skew: self.scalar(&raw.sk, 0.0)?,
            skew_axis: self.scalar(&raw.sa, 0.0)?,
        })
    }

    /// Items of one group plus the group's own transform (its `tr` item).
    fn items(
        &mut self,
        shapes: &[data::Shape],
    ) -> Result<(Vec<ShapeItem>, Option<Transform>), ParseError> {
        let mut items = Vec::with_capacity(shapes.len());
        let mut transform = None;
        for shape in shapes {
            if is_hidden(shape) {
                continue;
            }
            let item = match shape {
                data::Shape::Group(g) => {
                    let (children, tr) = self.items(&g.it)?;
                    ShapeItem::Group(Group {
                        name: g.nm.clone(),
                        items: children,
                        transform: tr.unwrap_or_default(),
                    })
                }
                data::Shape::Transform(t) => {
                    transform = Some(self.transform(&t.t)?);
                    continue;
                }
                data::Shape::Rect(r) => ShapeItem::Rect(RectItem {
                    position: self.point(&r.p, Vec2::ZERO)?,
                    size: self.animated(&r.s, Vec2::ZERO, to_vec2)?,
                    roundness: self.scalar(&r.r, 0.0)?,
                    reversed: r.d == Some(3),
                }),
                data::Shape::Ellipse(e) => ShapeItem::Ellipse(EllipseItem {
                    position: self.point(&e.p, Vec2::ZERO)?,
                    size: self.animated(&e.s, Vec2::ZERO, to_vec2)?,
                    reversed: e.d == Some(3),
                }),
                data::Shape::Polystar(s) => ShapeItem::Polystar(PolystarItem {
                    kind: if s.sy == 2 {
                        StarKind::Polygon
                    } else {
                        StarKind::Star
                    },
                    position: self.point(&s.p, Vec2::ZERO)?,
                    points: self.scalar(&s.pt, 5.0)?,
                    rotation: self.scalar(&s.r, 0.0)?,
                    outer_radius: self.scalar(&s.or, 0.0)?,
                    outer_roundness: self.scalar(&s.os, 0.0)?,
                    inner_radius: self.optional_scalar(s.ir.as_ref(), 0.0)?,
                    inner_roundness: self.optional_scalar(s.is.as_ref(), 0.0)?,
                    reversed: s.d == Some(3),
                }),
                data::Shape::Path(p) => ShapeItem::Path(PathItem {
                    shape: self.shape(&p.ks)?,
                    reversed: p.d == Some(3),
                }),
                data::Shape::Fill(f) => ShapeItem::Fill(Fill {
                    color: self.color(&f.c)?,
                    opacity: self.scalar(&f.o, 100.0)?,
                    rule: fill_rule(f.r),
                }),
                data::Shape::Stroke(s) => ShapeItem::Stroke(Stroke {
                    color: self.color(&s.c)?,
                    opacity: self.scalar(&s.o, 100.0)?,
                    params: self.stroke_params(&s.w, s.lc, s.lj, s.ml, &s.d)?,
                }),
                data::Shape::GradientFill(g) => ShapeItem::GradientFill(GradientFill {
                    gradient: self.gradient(g.t, &g.s, &g.e, g.h.as_ref(), g.a.as_ref(), &g.g)?,
                    opacity: self.scalar(&g.o, 100.0)?,
                    rule: fill_rule(g.r),
                }),
                data::Shape::GradientStroke(g) => ShapeItem::GradientStroke(GradientStroke {
                    gradient: self.gradient(g.t, &g.s, &g.e, g.h.as_ref(), g.a.as_ref(), &g.g)?,
                    opacity: self.scalar(&g.o, 100.0)?,
                    params: self.stroke_params(&g.w, g.lc, g.lj, g.ml, &g.d)?,
                }),
                data::Shape::Trim(t) => ShapeItem::Trim(Trim {
                    start: self.scalar(&t.s, 0.0)?,
                    end: self.scalar(&t.e, 100.0)?,
                    offset: self.scalar(&t.o, 0.0)?,
                    mode: if t.m == Some(2) {
                        TrimMode::Individual
                    } else {
                        TrimMode::Simultaneous
                    },
                }),
                data::Shape::MergePaths(m) => ShapeItem::MergePaths(MergeMode::from_code(m.mm)),
                data::Shape::Repeater(r) => ShapeItem::Repeater(Repeater {
                    copies: self.scalar(&r.c, 1.0)?,
                    offset: self.scalar(&r.o, 0.0)?,
                    transform: self.transform(&r.tr.t)?,
                    start_opacity: self.scalar(&r.tr.so, 100.0)?,
                    end_opacity: self.scalar(&r.tr.eo, 100.0)?,
                    order: if r.m == Some(2) {
                        RepeaterOrder::Below
                    } else {
                        RepeaterOrder::Above
                    },
                }),
                data::Shape::RoundCorners(rd) => {
                    ShapeItem::RoundedCorners(self.scalar(&rd.r, 0.0)?)
                }
                data::Shape::ZigZag(_)
                | data::Shape::PuckerBloat(_)
                | data::Shape::Twist(_)
                | data::Shape::OffsetPath(_)
                | data::Shape::WigglePath(_)
                | data::Shape::Unknown => {
                    let ty = shape.type_code().to_owned();
                    self.warn(ParseWarning::UnsupportedShape { ty: ty.clone() });
                    ShapeItem::Unsupported { ty }
                }
            };
            items.push(item);
        }
        Ok((items, transform))
    }

    fn stroke_params(
        &mut self,
        width: &Property<f32>,
        cap: Option<u8>,
        join: Option<u8>,
        miter_limit: Option<f32>,
        dashes: &[data::DashProperty],
    ) -> Result<StrokeParams, ParseError> {
        let dashes = if dashes.is_empty() {
            None
        } else {
            let mut lengths = Vec::new();
            let mut offset = AnimatableValue::fixed(0.0);
            for dash in dashes {
                match dash.n.as_deref() {
                    Some("o") => offset = self.scalar(&dash.v, 0.0)?,
                    _ => lengths.push(self.scalar(&dash.v, 0.0)?),
                }
            }
            Some(DashPattern { lengths, offset })
        };
        Ok(StrokeParams {
            width: self.scalar(width, 0.0)?,
            cap: match cap {
                Some(2) => LineCap::Round,
                Some(3) => LineCap::Square,
                _ => LineCap::Butt,
            },
            join: match join {
                Some(2) => LineJoin::Round,
                Some(3) => LineJoin::Bevel,
                _ => LineJoin::Miter,
            },
            miter_limit: miter_limit.unwrap_or(4.0),
            dashes,
        })
    }

    fn gradient(
        &mut self,
        kind: u8,
        start: &Property<Vector>,
        end: &Property<Vector>,
        highlight_length: Option<&Property<f32>>,
        highlight_angle: Option<&Property<f32>>,
        colors: &data::GradientColors,
    ) -> Result<Gradient, ParseError> {
        let stops = colors.p as usize;
        Ok(Gradient {
            kind: if kind == 2 {
                GradientKind::Radial
            } else {
                GradientKind::Linear
            },
            start: self.point(start, Vec2::ZERO)?,
            end: self.point(end, Vec2::ZERO)?,
            highlight_length: self.optional_scalar(highlight_length, 0.0)?,
            highlight_angle: self.optional_scalar(highlight_angle, 0.0)?,
            colors: self.animated(&colors.k, GradientColor::default(), |raw| {
                Some(GradientColor::from_flat(raw, stops))
            })?,
        })
    }

    fn scalar(&mut self, prop: &Property<f32>, default: f32) -> Result<AnimatableValue<f32>, ParseError> {
        self.animated(prop, default, |v| Some(*v))
    }

    fn optional_scalar(
        &mut self,
        prop: Option<&Property<f32>>,
        default: f32,
    ) -> Result<AnimatableValue<f32>, ParseError> {
        match prop {
            Some(prop) => self.scalar(prop, default),
            None => Ok(AnimatableValue::fixed(default)),
        }
    }

    fn color(&mut self, prop: &Property<Vector>) -> Result<AnimatableValue<Color>, ParseError> {
        self.animated(prop, Color::BLACK, |v| {
            (!v.is_empty()).then(|| Color::from_components(v))
        })
    }

    /// Point-valued property. Keyframes carrying `to`/`ti` move along a
    /// curved path instead of the straight line.
    fn point(&mut self, prop: &Property<Vector>, default: Vec2) -> Result<AnimatableValue<Vec2>, ParseError> {
        let mut keyframes = self.keyframe_list(prop, default, to_vec2)?;
        if let Value::Animated(raw) = &prop.k {
            let raw = collapse(raw)?;
            for (kf, source) in keyframes.iter_mut().zip(raw) {
                let (Some(to), Some(ti)) = (&source.to, &source.ti) else {
                    continue;
                };
                let (Some(out_tangent), Some(in_tangent)) = (to_vec2(to), to_vec2(ti)) else {
                    continue;
                };
                if let Some(end) = kf.end_value {
                    kf.spatial = SpatialSegment::new(kf.start_value, end, out_tangent, in_tangent);
                }
            }
        }
        AnimatableValue::new(keyframes)
    }

    fn shape(&mut self, prop: &Property<data::BezierPath>) -> Result<AnimatableValue<ShapeData>, ParseError> {
        let mut keyframes = self.keyframe_list(prop, ShapeData::default(), |p| {
            Some(ShapeData::from_model(p))
        })?;
        for kf in &mut keyframes {
            let Some(end) = &mut kf.end_value else {
                continue;
            };
            let (start_count, end_count) = (kf.start_value.vertex_count(), end.vertex_count());
            // Jumps never blend, so their counts may differ freely.
            if start_count == end_count || kf.end <= kf.start {
                continue;
            }
            self.warn(ParseWarning::PathVertexMismatch {
                start: start_count,
                end: end_count,
            });
            if self.config.path_mismatch == PathMismatchPolicy::Resample {
                if let Some((a, b)) = path_morph::equalize(&kf.start_value, end) {
                    kf.start_value = a;
                    *end = b;
                }
            }
        }
        AnimatableValue::new(keyframes)
    }

    fn animated<M, T: Interpolatable>(
        &mut self,
        prop: &Property<M>,
        default: T,
        convert: impl Fn(&M) -> Option<T>,
    ) -> Result<AnimatableValue<T>, ParseError> {
        AnimatableValue::new(self.keyframe_list(prop, default, convert)?)
    }

    fn keyframe_list<M, T: Clone>(
        &mut self,
        prop: &Property<M>,
        default: T,
        convert: impl Fn(&M) -> Option<T>,
    ) -> Result<Vec<Keyframe<T>>, ParseError> {
        if prop.has_expression() {
            self.warn(ParseWarning::Expression {
                layer: self.layer_name.clone(),
            });
        }
        let raw = match &prop.k {
            Value::Default => return Ok(vec![Keyframe::last(0.0, default)]),
            Value::Static(v) => return Ok(vec![Keyframe::last(0.0, convert(v).unwrap_or(default))]),
            Value::Animated(raw) => collapse(raw)?,
        };
        if raw.is_empty() {
            return Ok(vec![Keyframe::last(0.0, default)]);
        }

        let mut out = Vec::with_capacity(raw.len());
        let mut previous_end: Option<T> = None;
        for (i, kf) in raw.iter().enumerate() {
            let start_value = kf
                .s
                .as_ref()
                .and_then(&convert)
                .or_else(|| previous_end.take())
                .unwrap_or_else(|| default.clone());
            let start = self.timeline.progress(kf.t);
            match raw.get(i + 1) {
                Some(next) => {
                    // Older exports carry the end value on the segment itself.
                    let end_value = next
                        .s
                        .as_ref()
                        .and_then(&convert)
                        .or_else(|| kf.e.as_ref().and_then(&convert))
                        .unwrap_or_else(|| start_value.clone());
                    previous_end = Some(end_value.clone());
                    out.push(Keyframe {
                        start,
                        end: self.timeline.progress(next.t),
                        start_value,
                        end_value: Some(end_value),
                        easing: easing(kf),
                        hold: kf.h == Some(1),
                        spatial: None,
                    });
                }
                None => out.push(Keyframe::last(start, start_value)),
            }
        }
        Ok(out)
    }
}

/// Keyframes in time order. A pair sharing a time is an instant jump and
/// both are kept; further keyframes at that time replace the second one.
/// Going backwards in time is malformed.
fn collapse<M>(raw: &[data::Keyframe<M>]) -> Result<Vec<&data::Keyframe<M>>, ParseError> {
    let mut out: Vec<&data::Keyframe<M>> = Vec::with_capacity(raw.len());
    for kf in raw {
        if !kf.t.is_finite() {
            return Err(ParseError::invalid("t", "keyframe time is not finite"));
        }
        if let Some(last) = out.last() {
            if kf.t < last.t {
                return Err(ParseError::invalid(
                    "t",
                    format!("keyframe at {} follows keyframe at {}", kf.t, last.t),
                ));
            }
            let run = out.len() >= 2 && out[out.len() - 2].t == kf.t;
            if kf.t == last.t && run {
                out.pop();
            }
        }
        out.push(kf);
    }
    Ok(out)
}

/// Timing curve of the segment leaving `kf`: `o` is the first handle, `i`
/// the second.
fn easing<M>(kf: &data::Keyframe<M>) -> Easing {
    match (&kf.o, &kf.i) {
        (Some(o), Some(i)) => {
            let first = |v: &[f32], default: f32| v.first().copied().unwrap_or(default);
            Easing::new(
                Vec2::new(first(&o.x, 0.0), first(&o.y, 0.0)),
                Vec2::new(first(&i.x, 1.0), first(&i.y, 1.0)),
            )
        }
        _ => Easing::LINEAR,
    }
}

fn to_vec2(v: &Vector) -> Option<Vec2> {
    match v.as_slice() {
        [] => None,
        [x] => Some(Vec2::splat(*x)),
        [x, y, ..] => Some(Vec2::new(*x, *y)),
    }
}

fn fill_rule(code: Option<u8>) -> FillRule {
    if code == Some(2) {
        FillRule::EvenOdd
    } else {
        FillRule::NonZero
    }
}

fn required_ref(raw: &data::Layer) -> Result<String, ParseError> {
    raw.ref_id
        .clone()
        .ok_or_else(|| ParseError::invalid("refId", format!("layer type {} needs an asset", raw.ty)))
}

fn is_hidden(shape: &data::Shape) -> bool {
    match shape {
        data::Shape::Group(s) => s.hd,
        data::Shape::Rect(s) => s.hd,
        data::Shape::Ellipse(s) => s.hd,
        data::Shape::Polystar(s) => s.hd,
        data::Shape::Path(s) => s.hd,
        data::Shape::Fill(s) => s.hd,
        data::Shape::Stroke(s) => s.hd,
        data::Shape::GradientFill(s) => s.hd,
        data::Shape::GradientStroke(s) => s.hd,
        data::Shape::Trim(s) => s.hd,
        data::Shape::MergePaths(s) => s.hd,
        data::Shape::Repeater(s) => s.hd,
        data::Shape::RoundCorners(s) => s.hd,
        data::Shape::Transform(_)
        | data::Shape::ZigZag(_)
        | data::Shape::PuckerBloat(_)
        | data::Shape::Twist(_)
        | data::Shape::OffsetPath(_)
        | data::Shape::WigglePath(_)
        | data::Shape::Unknown => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn timeline() -> Timeline {
        Timeline::new(0.0, 100.0, 25.0)
    }

    fn prop<T: serde::de::DeserializeOwned + Default>(value: serde_json::Value) -> Property<T> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn keyframe_times_become_progress() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        let p: Property<f32> = prop(json!({"a": 1, "k": [
            {"t": 0, "s": [0]},
            {"t": 50, "s": [10]},
            {"t": 100, "s": [20]}
        ]}));
        let value = cx.scalar(&p, 0.0).unwrap();
        assert_eq!(value.keyframes()[1].start, 0.5);
        assert_eq!(value.evaluate(0.25), 5.0);
        assert_eq!(value.evaluate(1.0), 20.0);
    }

    #[test]
    fn legacy_end_values_are_used() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        let p: Property<f32> = prop(json!({"a": 1, "k": [
            {"t": 0, "s": [0], "e": [8]},
            {"t": 100}
        ]}));
        let value = cx.scalar(&p, 0.0).unwrap();
        assert_eq!(value.evaluate(0.5), 4.0);
        assert_eq!(value.evaluate(1.0), 8.0);
    }

    #[test]
    fn equal_times_jump_at_that_time() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        let p: Property<f32> = prop(json!({"a": 1, "k": [
            {"t": 0, "s": [0]},
            {"t": 0, "s": [2]},
            {"t": 0, "s": [5]},
            {"t": 100, "s": [5]}
        ]}));
        let value = cx.scalar(&p, 0.0).unwrap();
        assert_eq!(value.keyframes().len(), 3);
        assert_eq!(value.keyframes()[0].end_value, Some(5.0));
        assert_eq!(value.evaluate(0.0), 5.0);
        assert_eq!(value.evaluate(0.5), 5.0);
    }

    #[test]
    fn decreasing_times_are_fatal() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        let p: Property<f32> = prop(json!({"a": 1, "k": [
            {"t": 50, "s": [0]},
            {"t": 10, "s": [5]}
        ]}));
        assert!(matches!(cx.scalar(&p, 0.0), Err(ParseError::InvalidField { field: "t", .. })));
    }

    #[test]
    fn expressions_are_warned_and_ignored() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        cx.layer_name = Some("wiggly".into());
        let p: Property<f32> = prop(json!({"a": 0, "k": 3, "x": "wiggle(2, 5)"}));
        assert_eq!(cx.scalar(&p, 0.0).unwrap().evaluate(0.5), 3.0);
        assert_eq!(
            cx.into_warnings(),
            vec![ParseWarning::Expression {
                layer: Some("wiggly".into())
            }]
        );
    }

    #[test]
    fn spatial_tangents_build_curved_segments() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        let p: Property<Vector> = prop(json!({"a": 1, "k": [
            {"t": 0, "s": [0, 0], "to": [0, 40], "ti": [0, 40]},
            {"t": 100, "s": [100, 0]}
        ]}));
        let value = cx.point(&p, Vec2::ZERO).unwrap();
        assert!(value.keyframes()[0].spatial.is_some());
        assert!(value.evaluate(0.5).y > 20.0);
    }

    #[test]
    fn mismatched_paths_warn_and_resample_on_request() {
        let tri = json!({"c": true, "v": [[0, 0], [10, 0], [0, 10]], "i": [], "o": []});
        let quad = json!({"c": true, "v": [[0, 0], [10, 0], [10, 10], [0, 10]], "i": [], "o": []});
        let p: Property<data::BezierPath> = prop(json!({"a": 1, "k": [
            {"t": 0, "s": [tri]},
            {"t": 100, "s": [quad]}
        ]}));

        let hold = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &hold);
        let held = cx.shape(&p).unwrap();
        assert!(held.try_evaluate(0.5).is_err());
        assert_eq!(
            cx.into_warnings(),
            vec![ParseWarning::PathVertexMismatch { start: 3, end: 4 }]
        );

        let resample = ParseConfig {
            path_mismatch: PathMismatchPolicy::Resample,
            ..ParseConfig::default()
        };
        let mut cx = ParseContext::new(timeline(), &resample);
        let morphed = cx.shape(&p).unwrap();
        assert_eq!(morphed.try_evaluate(0.5).unwrap().vertex_count(), 4);
    }

    #[test]
    fn group_transform_is_extracted() {
        let config = ParseConfig::default();
        let mut cx = ParseContext::new(timeline(), &config);
        let shapes: Vec<data::Shape> = serde_json::from_value(json!([
            {"ty": "gr", "it": [
                {"ty": "rc", "s": {"k": [10, 10]}, "p": {"k": [0, 0]}, "r": {"k": 0}},
                {"ty": "fl", "c": {"k": [1, 0, 0, 1]}, "o": {"k": 100}},
                {"ty": "tr", "p": {"k": [5, 5]}, "o": {"k": 50}}
            ]},
            {"ty": "zz", "nm": "zig"},
            {"ty": "el", "hd": true, "s": {"k": [1, 1]}, "p": {"k": [0, 0]}}
        ]))
        .unwrap();
        let (items, transform) = cx.items(&shapes).unwrap();
        assert!(transform.is_none());
        assert_eq!(items.len(), 2);
        let ShapeItem::Group(group) = &items[0] else {
            panic!("expected a group");
        };
        assert_eq!(group.items.len(), 2);
        assert_eq!(group.transform.opacity(0.0), 0.5);
        assert!(matches!(&items[1], ShapeItem::Unsupported { ty } if ty == "zz"));
    }
}
