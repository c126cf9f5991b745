//! Builds the per-frame content tree of a shape layer and draws it.
//!
//! Geometry lives in an arena for the duration of one draw. Paints record
//! which arena paths they cover (with the transform from the path's group to
//! the paint's group); modifiers rewrite arena paths in place, so a paint
//! sees every modifier applied to its paths regardless of list position.

use crate::composition::Composition;
use crate::config::RenderConfig;
use crate::error::ParseWarning;
use crate::geometry::{self, StarParams};
use crate::path::point;
use crate::shape::{
    Fill, Gradient, GradientKind, MergeMode, Repeater, RepeaterOrder, ShapeItem, StarKind,
    StrokeParams, Trim, TrimMode,
};
use crate::surface::{Brush, FillRule, FillStyle, StrokeStyle, Surface};
use glam::Vec2;
use kurbo::{Affine, BezPath};

type PathId = usize;

#[derive(Debug, Clone, Copy)]
struct Part {
    transform: Affine,
    id: PathId,
}

#[derive(Debug, Default)]
struct PathEntry {
    path: BezPath,
    /// Forced fill rule of an emulated merge result.
    rule: Option<FillRule>,
    /// Merged into another path; modifiers skip it.
    consumed: bool,
}

#[derive(Debug)]
enum ContentNode {
    Fill {
        parts: Vec<Part>,
        style: FillStyle,
    },
    Stroke {
        parts: Vec<Part>,
        style: StrokeStyle,
    },
    Group {
        transform: Affine,
        opacity: f32,
        children: Vec<ContentNode>,
    },
    Repeat {
        copies: Vec<(Affine, f32)>,
        order: RepeaterOrder,
        children: Vec<ContentNode>,
    },
}

/// Content of one shape layer at one progress value.
#[derive(Debug)]
pub struct ContentTree {
    paths: Vec<PathEntry>,
    nodes: Vec<ContentNode>,
}

pub(crate) struct ContentBuilder<'a, S: Surface + ?Sized> {
    progress: f32,
    composition: &'a Composition,
    config: &'a RenderConfig,
    surface: &'a mut S,
    paths: Vec<PathEntry>,
}

impl<'a, S: Surface + ?Sized> ContentBuilder<'a, S> {
    pub(crate) fn new(
        progress: f32,
        composition: &'a Composition,
        config: &'a RenderConfig,
        surface: &'a mut S,
    ) -> Self {
        Self {
            progress,
            composition,
            config,
            surface,
            paths: Vec::new(),
        }
    }

    pub(crate) fn build(mut self, items: &[ShapeItem]) -> ContentTree {
        let (nodes, _) = self.group(items);
        ContentTree {
            paths: self.paths,
            nodes,
        }
    }

    fn group(&mut self, items: &[ShapeItem]) -> (Vec<ContentNode>, Vec<Part>) {
        let p = self.progress;
        let first_path = self.paths.len();
        let mut nodes = Vec::new();
        let mut available: Vec<Part> = Vec::new();

        for item in items {
            match item {
                ShapeItem::Group(group) => {
                    let transform = group.transform.matrix(p);
                    let opacity = group.transform.opacity(p);
                    let (children, parts) = self.group(&group.items);
                    available.extend(parts.into_iter().map(|part| Part {
                        transform: transform * part.transform,
                        id: part.id,
                    }));
                    nodes.push(ContentNode::Group {
                        transform,
                        opacity,
                        children,
                    });
                }
                ShapeItem::Path(path) => {
                    let shape = path.shape.evaluate(p);
                    let shape = if path.reversed { shape.reversed() } else { shape };
                    available.push(self.add(shape.to_bez_path(), None));
                }
                ShapeItem::Rect(rect) => {
                    let shape = geometry::rect(
                        rect.position.evaluate(p),
                        rect.size.evaluate(p),
                        rect.roundness.evaluate(p),
                    );
                    let shape = if rect.reversed { shape.reversed() } else { shape };
                    available.push(self.add(shape.to_bez_path(), None));
                }
                ShapeItem::Ellipse(ellipse) => {
                    let shape = geometry::ellipse(ellipse.position.evaluate(p), ellipse.size.evaluate(p));
                    let shape = if ellipse.reversed { shape.reversed() } else { shape };
                    available.push(self.add(shape.to_bez_path(), None));
                }
                ShapeItem::Polystar(star) => {
                    let params = StarParams {
                        center: star.position.evaluate(p),
                        points: star.points.evaluate(p),
                        rotation: star.rotation.evaluate(p),
                        outer_radius: star.outer_radius.evaluate(p),
                        outer_roundness: star.outer_roundness.evaluate(p),
                        inner: (star.kind == StarKind::Star)
                            .then(|| (star.inner_radius.evaluate(p), star.inner_roundness.evaluate(p))),
                    };
                    let shape = geometry::polystar(&params);
                    let shape = if star.reversed { shape.reversed() } else { shape };
                    available.push(self.add(shape.to_bez_path(), None));
                }
                ShapeItem::Fill(fill) => nodes.push(ContentNode::Fill {
                    parts: available.clone(),
                    style: self.fill_style(fill),
                }),
                ShapeItem::Stroke(stroke) => {
                    let brush = Brush::Solid(stroke.color.evaluate(p));
                    if let Some(style) = self.stroke_style(&stroke.params, brush, stroke.opacity.evaluate(p)) {
                        nodes.push(ContentNode::Stroke {
                            parts: available.clone(),
                            style,
                        });
                    }
                }
                ShapeItem::GradientFill(fill) => nodes.push(ContentNode::Fill {
                    parts: available.clone(),
                    style: FillStyle {
                        brush: self.gradient_brush(&fill.gradient),
                        opacity: percent(fill.opacity.evaluate(p)),
                        rule: fill.rule,
                    },
                }),
                ShapeItem::GradientStroke(stroke) => {
                    let brush = self.gradient_brush(&stroke.gradient);
                    if let Some(style) = self.stroke_style(&stroke.params, brush, stroke.opacity.evaluate(p)) {
                        nodes.push(ContentNode::Stroke {
                            parts: available.clone(),
                            style,
                        });
                    }
                }
                ShapeItem::Trim(trim) => self.trim(trim, first_path),
                ShapeItem::MergePaths(mode) => self.merge(*mode, &mut available),
                ShapeItem::Repeater(repeater) => self.repeat(repeater, &mut nodes, &mut available),
                ShapeItem::RoundedCorners(radius) => {
                    let radius = radius.evaluate(p);
                    for entry in self.paths[first_path..].iter_mut().filter(|e| !e.consumed) {
                        entry.path = geometry::round_corners(&entry.path, radius);
                    }
                }
                ShapeItem::Unsupported { .. } => {}
            }
        }
        (nodes, available)
    }

    fn add(&mut self, path: BezPath, rule: Option<FillRule>) -> Part {
        self.paths.push(PathEntry {
            path,
            rule,
            consumed: false,
        });
        Part {
            transform: Affine::IDENTITY,
            id: self.paths.len() - 1,
        }
    }

    /// Trims every path created since the enclosing group started,
    /// including paths of nested groups.
    fn trim(&mut self, trim: &Trim, first_path: usize) {
        let (start, end) = trim.fractions(self.progress);
        let targets: Vec<usize> = (first_path..self.paths.len())
            .filter(|&i| !self.paths[i].consumed)
            .collect();
        let mut paths: Vec<BezPath> = targets
            .iter()
            .map(|&i| std::mem::take(&mut self.paths[i].path))
            .collect();
        geometry::trim(&mut paths, start, end, trim.mode == TrimMode::Simultaneous);
        for (i, path) in targets.into_iter().zip(paths) {
            self.paths[i].path = path;
        }
    }

    fn merge(&mut self, mode: MergeMode, available: &mut Vec<Part>) {
        if available.is_empty() || !self.config.enable_merge_paths {
            return;
        }
        let operands: Vec<BezPath> = available
            .iter()
            .map(|part| part.transform * self.paths[part.id].path.clone())
            .collect();
        let (path, rule) = match self.surface.path_op(mode, &operands) {
            Some(path) => (path, None),
            None => {
                self.composition
                    .report(ParseWarning::MergePathsEmulated { mode });
                emulate_merge(mode, operands)
            }
        };
        for part in available.iter() {
            self.paths[part.id].consumed = true;
        }
        *available = vec![self.add(path, rule)];
    }

    /// Wraps everything before the repeater in its group and replicates it.
    fn repeat(&mut self, repeater: &Repeater, nodes: &mut Vec<ContentNode>, available: &mut Vec<Part>) {
        let p = self.progress;
        let count = repeater.copies.evaluate(p).round().max(0.0) as usize;
        let offset = repeater.offset.evaluate(p);
        let anchor = repeater.transform.anchor.evaluate(p);
        let position = repeater.transform.position.evaluate(p);
        let scale = repeater.transform.scale.evaluate(p) / 100.0;
        let rotation = repeater.transform.rotation.evaluate(p);
        let start_opacity = percent(repeater.start_opacity.evaluate(p));
        let end_opacity = percent(repeater.end_opacity.evaluate(p));

        let copies: Vec<(Affine, f32)> = (0..count)
            .map(|i| {
                let k = i as f32 + offset;
                let transform = translate(position * k)
                    * translate(anchor)
                    * Affine::rotate(((rotation * k) as f64).to_radians())
                    * Affine::scale_non_uniform(scale.x.powf(k) as f64, scale.y.powf(k) as f64)
                    * translate(-anchor);
                let opacity = start_opacity + (end_opacity - start_opacity) * (i as f32 / count as f32);
                (transform, opacity)
            })
            .collect();

        let repeated: Vec<Part> = copies
            .iter()
            .flat_map(|(m, _)| {
                available.iter().map(move |part| Part {
                    transform: *m * part.transform,
                    id: part.id,
                })
            })
            .collect();
        *available = repeated;
        let children = std::mem::take(nodes);
        nodes.push(ContentNode::Repeat {
            copies,
            order: repeater.order,
            children,
        });
    }

    fn fill_style(&self, fill: &Fill) -> FillStyle {
        FillStyle {
            brush: Brush::Solid(fill.color.evaluate(self.progress)),
            opacity: percent(fill.opacity.evaluate(self.progress)),
            rule: fill.rule,
        }
    }

    fn stroke_style(&self, params: &StrokeParams, brush: Brush, opacity: f32) -> Option<StrokeStyle> {
        let width = params.width.evaluate(self.progress);
        if width <= 0.0 {
            return None;
        }
        Some(StrokeStyle {
            brush,
            opacity: percent(opacity),
            width,
            cap: params.cap,
            join: params.join,
            miter_limit: params.miter_limit,
            dashes: params.dashes.as_ref().and_then(|d| d.evaluate(self.progress)),
        })
    }

    fn gradient_brush(&self, gradient: &Gradient) -> Brush {
        let p = self.progress;
        let start = gradient.start.evaluate(p);
        let end = gradient.end.evaluate(p);
        let stops = gradient.colors.evaluate(p);
        match gradient.kind {
            GradientKind::Linear => Brush::Linear {
                start: point(start),
                end: point(end),
                stops,
            },
            GradientKind::Radial => {
                let axis = end - start;
                let radius = axis.length();
                let highlight = gradient.highlight_length.evaluate(p).clamp(-99.0, 99.0) / 100.0;
                let angle = gradient.highlight_angle.evaluate(p).to_radians() + axis.y.atan2(axis.x);
                let focal = start + Vec2::from_angle(angle) * radius * highlight;
                Brush::Radial {
                    center: point(start),
                    focal: point(focal),
                    radius: radius as f64,
                    stops,
                }
            }
        }
    }
}

fn percent(v: f32) -> f32 {
    (v / 100.0).clamp(0.0, 1.0)
}

fn translate(v: Vec2) -> Affine {
    Affine::translate((v.x as f64, v.y as f64))
}

/// Fill-rule approximation of a boolean path operation.
fn emulate_merge(mode: MergeMode, operands: Vec<BezPath>) -> (BezPath, Option<FillRule>) {
    let concat = |paths: &[BezPath]| {
        let mut out = BezPath::new();
        for path in paths {
            out.extend(path.elements().iter().copied());
        }
        out
    };
    match mode {
        MergeMode::Merge | MergeMode::Add => (concat(&operands), Some(FillRule::NonZero)),
        MergeMode::ExcludeIntersections => (concat(&operands), Some(FillRule::EvenOdd)),
        MergeMode::Subtract => {
            let mut out = operands.first().cloned().unwrap_or_default();
            for path in operands.iter().skip(1) {
                out.extend(geometry::reverse(path).elements().iter().copied());
            }
            (out, Some(FillRule::NonZero))
        }
        MergeMode::Intersect => (operands.last().cloned().unwrap_or_default(), None),
    }
}

impl ContentTree {
    /// Draws back to front: items listed later in a group go underneath.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, opacity: f32) {
        self.draw_nodes(&self.nodes, surface, opacity);
    }

    fn draw_nodes<S: Surface + ?Sized>(&self, nodes: &[ContentNode], surface: &mut S, opacity: f32) {
        for node in nodes.iter().rev() {
            match node {
                ContentNode::Fill { parts, style } => self.fill(parts, style, opacity, surface),
                ContentNode::Stroke { parts, style } => self.stroke(parts, style, opacity, surface),
                ContentNode::Group {
                    transform,
                    opacity: group_opacity,
                    children,
                } => {
                    if *group_opacity <= 0.0 {
                        continue;
                    }
                    surface.save();
                    surface.concat(*transform);
                    self.draw_nodes(children, surface, opacity * group_opacity);
                    surface.restore();
                }
                ContentNode::Repeat {
                    copies,
                    order,
                    children,
                } => {
                    let mut draw_copy = |(transform, copy_opacity): &(Affine, f32)| {
                        surface.save();
                        surface.concat(*transform);
                        self.draw_nodes(children, surface, opacity * copy_opacity);
                        surface.restore();
                    };
                    match order {
                        RepeaterOrder::Above => copies.iter().for_each(&mut draw_copy),
                        RepeaterOrder::Below => copies.iter().rev().for_each(&mut draw_copy),
                    }
                }
            }
        }
    }

    fn fill<S: Surface + ?Sized>(&self, parts: &[Part], style: &FillStyle, opacity: f32, surface: &mut S) {
        let opacity = style.opacity * opacity;
        if opacity <= 0.0 {
            return;
        }
        let mut combined = BezPath::new();
        for part in parts {
            let entry = &self.paths[part.id];
            if entry.path.elements().is_empty() {
                continue;
            }
            let path = part.transform * entry.path.clone();
            match entry.rule {
                Some(rule) => surface.fill_path(
                    &path,
                    &FillStyle {
                        rule,
                        opacity,
                        ..style.clone()
                    },
                ),
                None => combined.extend(path.elements().iter().copied()),
            }
        }
        if !combined.elements().is_empty() {
            surface.fill_path(
                &combined,
                &FillStyle {
                    opacity,
                    ..style.clone()
                },
            );
        }
    }

    fn stroke<S: Surface + ?Sized>(&self, parts: &[Part], style: &StrokeStyle, opacity: f32, surface: &mut S) {
        let opacity = style.opacity * opacity;
        if opacity <= 0.0 {
            return;
        }
        let mut combined = BezPath::new();
        for part in parts {
            let path = part.transform * self.paths[part.id].path.clone();
            combined.extend(path.elements().iter().copied());
        }
        if !combined.elements().is_empty() {
            surface.stroke_path(
                &combined,
                &StrokeStyle {
                    opacity,
                    ..style.clone()
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::layer::LayerKind;
    use crate::surface::RecordingSurface;
    use kurbo::Shape;
    use serde_json::{json, Value};

    fn rect(x: f32, size: f32) -> Value {
        json!({"ty": "rc", "p": {"k": [x, 0]}, "s": {"k": [size, size]}, "r": {"k": 0}})
    }

    fn fill(r: f32, g: f32, b: f32) -> Value {
        json!({"ty": "fl", "c": {"k": [r, g, b, 1]}, "o": {"k": 100}})
    }

    fn composition(shapes: Value) -> Composition {
        Composition::from_value(json!({
            "fr": 30, "ip": 0, "op": 30, "w": 100, "h": 100,
            "layers": [{"ty": 4, "ind": 1, "ip": 0, "op": 30, "ks": {}, "shapes": shapes}]
        }))
        .unwrap()
    }

    fn draw_at(comp: &Composition, progress: f32, surface: &mut RecordingSurface) {
        let LayerKind::Shape(layer) = &comp.root.layers[0].kind else {
            panic!("expected a shape layer");
        };
        let config = RenderConfig::default();
        let tree = ContentBuilder::new(progress, comp, &config, surface).build(&layer.items);
        tree.draw(surface, 1.0);
    }

    fn record(shapes: Value) -> RecordingSurface {
        let comp = composition(shapes);
        let mut surface = RecordingSurface::new();
        draw_at(&comp, 0.0, &mut surface);
        surface
    }

    fn solid(style: &FillStyle) -> Color {
        match &style.brush {
            Brush::Solid(c) => *c,
            other => panic!("expected a solid brush, got {other:?}"),
        }
    }

    #[test]
    fn paints_cover_only_preceding_paths() {
        let surface = record(json!([rect(0.0, 10.0), fill(1.0, 0.0, 0.0), rect(50.0, 10.0), fill(0.0, 0.0, 1.0)]));
        let fills: Vec<_> = surface.fills().collect();
        assert_eq!(fills.len(), 2);
        // Later items draw first, underneath.
        assert_eq!(solid(fills[0].1), Color::rgba(0.0, 0.0, 1.0, 1.0));
        assert_eq!(fills[0].0.bounding_box().width(), 60.0);
        assert_eq!(solid(fills[1].1), Color::rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(fills[1].0.bounding_box().width(), 10.0);
    }

    #[test]
    fn paint_before_any_path_draws_nothing() {
        let surface = record(json!([fill(1.0, 0.0, 0.0), rect(0.0, 10.0)]));
        assert_eq!(surface.fills().count(), 0);
    }

    #[test]
    fn outer_paint_covers_nested_group_paths_with_group_transform() {
        let surface = record(json!([
            {"ty": "gr", "it": [rect(0.0, 10.0), {"ty": "tr", "p": {"k": [100, 0]}}]},
            fill(0.0, 1.0, 0.0)
        ]));
        let (path, _, _) = surface.fills().next().unwrap();
        let bounds = path.bounding_box();
        assert_eq!((bounds.x0, bounds.x1), (95.0, 105.0));
    }

    #[test]
    fn group_opacity_multiplies_into_paints() {
        let surface = record(json!([
            {"ty": "gr", "it": [rect(0.0, 10.0), fill(1.0, 0.0, 0.0), {"ty": "tr", "o": {"k": 50}}]}
        ]));
        let (_, style, _) = surface.fills().next().unwrap();
        assert!((style.opacity - 0.5).abs() < 1e-6);
    }

    #[test]
    fn outer_trim_reaches_into_earlier_groups() {
        let surface = record(json!([
            {"ty": "gr", "it": [
                {"ty": "sh", "ks": {"k": {"c": false, "v": [[0, 0], [100, 0]], "i": [], "o": []}}},
                {"ty": "st", "c": {"k": [0, 0, 0, 1]}, "o": {"k": 100}, "w": {"k": 2}},
                {"ty": "tr"}
            ]},
            {"ty": "tm", "s": {"k": 0}, "e": {"k": 50}, "o": {"k": 0}}
        ]));
        let (path, _, _) = surface.strokes().next().unwrap();
        assert!((path.bounding_box().x1 - 50.0).abs() < 1e-3);
    }

    #[test]
    fn trim_does_not_touch_later_paths() {
        let surface = record(json!([
            {"ty": "sh", "ks": {"k": {"c": false, "v": [[0, 0], [100, 0]]}}},
            {"ty": "tm", "s": {"k": 0}, "e": {"k": 50}},
            {"ty": "sh", "ks": {"k": {"c": false, "v": [[0, 10], [100, 10]]}}},
            {"ty": "st", "c": {"k": [0, 0, 0, 1]}, "w": {"k": 1}}
        ]));
        let (path, _, _) = surface.strokes().next().unwrap();
        let bounds = path.bounding_box();
        assert_eq!((bounds.x0, bounds.x1), (0.0, 100.0));
        assert_eq!((bounds.y0, bounds.y1), (0.0, 10.0));
    }

    #[test]
    fn repeater_makes_three_copies() {
        let surface = record(json!([
            rect(0.0, 10.0),
            fill(1.0, 0.0, 0.0),
            {"ty": "rp", "c": {"k": 3}, "o": {"k": 0}, "m": 1,
             "tr": {"p": {"k": [20, 0]}, "so": {"k": 100}, "eo": {"k": 40}}}
        ]));
        let fills: Vec<_> = surface.fills().collect();
        assert_eq!(fills.len(), 3);
        let offsets: Vec<f64> = fills.iter().map(|(_, _, t)| t.translation().x).collect();
        assert_eq!(offsets, vec![0.0, 20.0, 40.0]);
        let opacities: Vec<f32> = fills.iter().map(|(_, s, _)| s.opacity).collect();
        assert!((opacities[0] - 1.0).abs() < 1e-6);
        assert!((opacities[1] - 0.8).abs() < 1e-6);
        assert!((opacities[2] - 0.6).abs() < 1e-6);
    }

    #[test]
    fn animated_copy_count_is_evaluated_per_frame() {
        let comp = composition(json!([
            rect(0.0, 10.0),
            fill(1.0, 0.0, 0.0),
            {"ty": "rp", "c": {"a": 1, "k": [
                {"t": 0, "s": [1], "h": 1},
                {"t": 15, "s": [4]}
            ]}, "tr": {"p": {"k": [20, 0]}}}
        ]));
        let mut early = RecordingSurface::new();
        draw_at(&comp, 0.0, &mut early);
        let mut late = RecordingSurface::new();
        draw_at(&comp, 0.9, &mut late);
        assert_eq!(early.fills().count(), 1);
        assert_eq!(late.fills().count(), 4);
    }

    #[test]
    fn merge_falls_back_to_fill_rules() {
        let comp = composition(json!([
            rect(0.0, 10.0),
            rect(0.0, 4.0),
            {"ty": "mm", "mm": 5},
            fill(1.0, 0.0, 0.0)
        ]));
        let mut surface = RecordingSurface::new();
        draw_at(&comp, 0.0, &mut surface);
        let (path, style, _) = surface.fills().next().unwrap();
        assert_eq!(style.rule, FillRule::EvenOdd);
        assert_eq!(geometry::subpaths(path).len(), 2);
        assert!(comp.warnings().contains(&ParseWarning::MergePathsEmulated {
            mode: MergeMode::ExcludeIntersections
        }));
    }

    #[test]
    fn subtract_reverses_later_operands() {
        let (path, rule) = emulate_merge(
            MergeMode::Subtract,
            vec![
                kurbo::Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1),
                kurbo::Rect::new(2.0, 2.0, 8.0, 8.0).to_path(0.1),
            ],
        );
        assert_eq!(rule, Some(FillRule::NonZero));
        // Opposite windings cancel, leaving the ring.
        assert!((path.area().abs() - 64.0).abs() < 1e-6);
    }

    #[test]
    fn zero_width_strokes_are_skipped() {
        let surface = record(json!([
            rect(0.0, 10.0),
            {"ty": "st", "c": {"k": [0, 0, 0, 1]}, "w": {"k": 0}}
        ]));
        assert_eq!(surface.strokes().count(), 0);
    }

    #[test]
    fn radial_gradient_focal_follows_highlight() {
        let surface = record(json!([
            rect(0.0, 10.0),
            {"ty": "gf", "t": 2, "s": {"k": [0, 0]}, "e": {"k": [10, 0]},
             "h": {"k": 50}, "a": {"k": 90}, "o": {"k": 100},
             "g": {"p": 2, "k": {"k": [0, 1, 0, 0, 1, 0, 0, 1]}}}
        ]));
        let (_, style, _) = surface.fills().next().unwrap();
        let Brush::Radial { focal, radius, stops, .. } = &style.brush else {
            panic!("expected a radial brush");
        };
        assert_eq!(*radius, 10.0);
        assert!(focal.x.abs() < 1e-4 && (focal.y - 5.0).abs() < 1e-4);
        assert_eq!(stops.len(), 2);
    }
}
