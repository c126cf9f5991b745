//! Draws a composition's layer tree onto a [`Surface`].
//!
//! Every property is evaluated while drawing; nothing about a frame is kept
//! between calls.

use crate::asset::ImageProvider;
use crate::color::Color;
use crate::composition::{Composition, LayerStack};
use crate::config::RenderConfig;
use crate::content::ContentBuilder;
use crate::error::ParseWarning;
use crate::layer::{
    BlendMode, ImageLayer, Layer, LayerKind, MaskMode, MatteType, PrecompLayer, TextLayer,
};
use crate::surface::{
    Brush, FillRule, FillStyle, LayerParams, LineCap, LineJoin, MaskComposite, StrokeStyle,
    Surface,
};
use crate::text::{self, FontFace, GlyphProvider, TextRun};
use kurbo::{Affine, Point, Rect, Shape};
use std::sync::Arc;

/// Draws frames of one shared composition. Cheap to create; holds no
/// per-frame state, so one renderer can serve any number of progress values.
#[derive(Clone)]
pub struct CompositionRenderer {
    composition: Arc<Composition>,
    config: RenderConfig,
    glyphs: Option<Arc<dyn GlyphProvider>>,
    images: Option<Arc<dyn ImageProvider>>,
}

impl std::fmt::Debug for CompositionRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositionRenderer")
            .field("composition", &self.composition.name)
            .field("config", &self.config)
            .field("glyphs", &self.glyphs.is_some())
            .field("images", &self.images.is_some())
            .finish()
    }
}

/// Where a layer list is being drawn: the comp frame its layers see and the
/// bounds inverted masks complement against.
#[derive(Debug, Clone, Copy)]
struct StackScope {
    frame: f32,
    bounds: Rect,
    depth: usize,
}

impl CompositionRenderer {
    pub fn new(composition: Arc<Composition>) -> Self {
        Self {
            composition,
            config: RenderConfig::default(),
            glyphs: None,
            images: None,
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_glyph_provider(mut self, provider: Arc<dyn GlyphProvider>) -> Self {
        self.glyphs = Some(provider);
        self
    }

    pub fn with_image_provider(mut self, provider: Arc<dyn ImageProvider>) -> Self {
        self.images = Some(provider);
        self
    }

    pub fn composition(&self) -> &Arc<Composition> {
        &self.composition
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Draws the frame at `progress` (`0..=1` through the root timeline) in
    /// the surface's current space, composition origin at the origin.
    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S, progress: f32) {
        let comp = &*self.composition;
        let frame = comp.timeline.frame(progress.clamp(0.0, 1.0));
        let bounds = Rect::new(0.0, 0.0, comp.width as f64, comp.height as f64);

        surface.save();
        if self.config.clip_to_composition_bounds {
            surface.clip_rect(bounds);
        }
        let scope = StackScope {
            frame,
            bounds,
            depth: 0,
        };
        self.draw_stack(surface, &comp.root, scope);
        surface.restore();
    }

    /// Draws the root composition at an absolute frame.
    pub fn draw_frame<S: Surface + ?Sized>(&self, surface: &mut S, frame: f32) {
        self.draw(surface, self.composition.timeline.progress(frame));
    }

    /// Bottom of the list first. Matte sources are drawn only through the
    /// layer they mask.
    fn draw_stack<S: Surface + ?Sized>(&self, surface: &mut S, stack: &LayerStack, scope: StackScope) {
        for i in (0..stack.layers.len()).rev() {
            let layer = &stack.layers[i];
            if stack.is_consumed(i) || layer.hidden || !layer.is_active(scope.frame) {
                continue;
            }
            match stack.matte_source(i) {
                Some(source) => self.draw_matted(surface, stack, i, source, scope),
                None => self.draw_layer(surface, stack, i, scope),
            }
        }
    }

    fn layer_progress(&self, layer: &Layer, frame: f32) -> f32 {
        self.composition.timeline.progress(layer.local_frame(frame))
    }

    /// Own transform composed with every ancestor's.
    fn world_matrix(&self, stack: &LayerStack, i: usize, frame: f32) -> Affine {
        let layer = &stack.layers[i];
        let mut matrix = layer.transform.matrix(self.layer_progress(layer, frame));
        let mut next = layer.parent;
        let mut steps = 0;
        while let Some(id) = next {
            if steps >= self.config.max_parent_depth {
                tracing::debug!(layer = ?layer.name, "parent chain too deep, truncated");
                break;
            }
            let Some(parent) = stack.index_of(id).map(|p| &stack.layers[p]) else {
                break;
            };
            matrix = parent.transform.matrix(self.layer_progress(parent, frame)) * matrix;
            next = parent.parent;
            steps += 1;
        }
        matrix
    }

    fn blend_mode<S: Surface + ?Sized>(&self, surface: &S, mode: BlendMode) -> BlendMode {
        if mode == BlendMode::Normal || surface.supports_blend_mode(mode) {
            return mode;
        }
        self.composition
            .report(ParseWarning::UnsupportedBlendMode { mode });
        BlendMode::Normal
    }

    fn draw_layer<S: Surface + ?Sized>(&self, surface: &mut S, stack: &LayerStack, i: usize, scope: StackScope) {
        let layer = &stack.layers[i];
        let progress = self.layer_progress(layer, scope.frame);
        let opacity = layer.transform.opacity(progress);
        if opacity <= 0.0 {
            return;
        }
        let blend = self.blend_mode(surface, layer.blend_mode);
        let isolated = opacity < 1.0 || blend != BlendMode::Normal || has_masks(layer);
        if isolated {
            surface.save_layer(&LayerParams {
                opacity,
                blend,
                composite: None,
            });
        } else {
            surface.save();
        }
        self.draw_body(surface, stack, i, scope);
        surface.restore();
    }

    /// Draws layer `i` into an offscreen layer, then masks it with `source`
    /// drawn under its own transform.
    fn draw_matted<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        stack: &LayerStack,
        i: usize,
        source: usize,
        scope: StackScope,
    ) {
        let layer = &stack.layers[i];
        let opacity = layer.transform.opacity(self.layer_progress(layer, scope.frame));
        if opacity <= 0.0 {
            return;
        }
        let composite = match layer.matte {
            MatteType::Invert => MaskComposite::DestinationOut,
            MatteType::Luma => MaskComposite::LumaIn,
            MatteType::LumaInvert => MaskComposite::LumaOut,
            MatteType::Add | MatteType::None => MaskComposite::DestinationIn,
        };
        let blend = self.blend_mode(surface, layer.blend_mode);

        surface.save_layer(&LayerParams {
            opacity,
            blend,
            composite: None,
        });
        self.draw_body(surface, stack, i, scope);
        surface.save_layer(&LayerParams::mask(composite));
        // Hidden matte sources still mask.
        if stack.layers[source].is_active(scope.frame) {
            self.draw_layer(surface, stack, source, scope);
        }
        surface.restore();
        surface.restore();
    }

    /// Content and masks of one layer in its own space.
    fn draw_body<S: Surface + ?Sized>(&self, surface: &mut S, stack: &LayerStack, i: usize, scope: StackScope) {
        let layer = &stack.layers[i];
        let progress = self.layer_progress(layer, scope.frame);
        let world = self.world_matrix(stack, i, scope.frame);

        surface.save();
        surface.concat(world);
        match &layer.kind {
            LayerKind::Shape(shape) => {
                let tree = ContentBuilder::new(progress, &self.composition, &self.config, surface)
                    .build(&shape.items);
                tree.draw(surface, 1.0);
            }
            LayerKind::Solid(solid) => {
                let rect = Rect::new(0.0, 0.0, solid.width as f64, solid.height as f64);
                surface.fill_path(&rect.to_path(0.1), &solid_fill(solid.color, FillRule::NonZero));
            }
            LayerKind::Image(image) => self.draw_image(surface, image),
            LayerKind::Text(text) => self.draw_text(surface, text, progress),
            LayerKind::Precomp(precomp) => self.draw_precomp(surface, layer, precomp, progress, scope),
            LayerKind::Null => {}
        }
        if has_masks(layer) {
            let canvas = (world.determinant().abs() > f64::EPSILON)
                .then(|| world.inverse().transform_rect_bbox(scope.bounds));
            self.apply_masks(surface, layer, progress, canvas);
        }
        surface.restore();
    }

    /// Cuts the already drawn content down to the layer's masks, combined in
    /// list order.
    fn apply_masks<S: Surface + ?Sized>(&self, surface: &mut S, layer: &Layer, progress: f32, canvas: Option<Rect>) {
        let Some(canvas) = canvas else {
            return;
        };
        let canvas_path = canvas.to_path(0.1);
        surface.save_layer(&LayerParams::mask(MaskComposite::DestinationIn));
        let masks = layer.masks.iter().filter(|m| m.mode != MaskMode::None);
        for (n, mask) in masks.enumerate() {
            let opacity = (mask.opacity.evaluate(progress) / 100.0).clamp(0.0, 1.0);
            let mut path = mask.path.evaluate(progress).to_bez_path();
            let rule = if mask.inverted {
                let mut complement = canvas_path.clone();
                complement.extend(path.elements().iter().copied());
                path = complement;
                FillRule::EvenOdd
            } else {
                FillRule::NonZero
            };
            let style = solid_fill(Color::WHITE.with_alpha(opacity), rule);
            match mask.mode {
                MaskMode::Subtract => {
                    if n == 0 {
                        surface.fill_path(&canvas_path, &solid_fill(Color::WHITE, FillRule::NonZero));
                    }
                    surface.save_layer(&LayerParams::mask(MaskComposite::DestinationOut));
                    surface.fill_path(&path, &style);
                    surface.restore();
                }
                MaskMode::Intersect if n > 0 => {
                    surface.save_layer(&LayerParams::mask(MaskComposite::DestinationIn));
                    surface.fill_path(&path, &style);
                    surface.restore();
                }
                _ => surface.fill_path(&path, &style),
            }
        }
        surface.restore();
    }

    fn draw_precomp<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        layer: &Layer,
        precomp: &PrecompLayer,
        progress: f32,
        scope: StackScope,
    ) {
        if scope.depth >= self.config.max_precomp_depth {
            tracing::debug!(asset = %precomp.ref_id, "precomp nesting too deep, skipped");
            return;
        }
        let Some(stack) = self.composition.precomp(&precomp.ref_id) else {
            self.composition.report(ParseWarning::MissingAsset {
                id: precomp.ref_id.clone(),
            });
            return;
        };
        let frame = match &precomp.time_remap {
            Some(remap) => remap.evaluate(progress) * self.composition.frame_rate(),
            None => layer.local_frame(scope.frame),
        };
        let bounds = Rect::new(0.0, 0.0, precomp.width as f64, precomp.height as f64);

        surface.save();
        if self.config.clip_precomps {
            surface.clip_rect(bounds);
        }
        let child = StackScope {
            frame,
            bounds,
            depth: scope.depth + 1,
        };
        self.draw_stack(surface, stack, child);
        surface.restore();
    }

    fn draw_image<S: Surface + ?Sized>(&self, surface: &mut S, image: &ImageLayer) {
        let Some(asset) = self.composition.image(&image.ref_id) else {
            self.composition.report(ParseWarning::MissingAsset {
                id: image.ref_id.clone(),
            });
            return;
        };
        let bitmap = asset.bitmap().or_else(|| {
            let loaded = self.images.as_ref()?.load(asset)?;
            asset.attach_bitmap(loaded.clone());
            Some(loaded)
        });
        let Some(bitmap) = bitmap else {
            self.composition.report(ParseWarning::MissingAsset {
                id: asset.id.clone(),
            });
            return;
        };
        let src = Rect::new(0.0, 0.0, bitmap.width() as f64, bitmap.height() as f64);
        let dst = if asset.width > 0.0 && asset.height > 0.0 {
            Rect::new(0.0, 0.0, asset.width as f64, asset.height as f64)
        } else {
            src
        };
        surface.draw_bitmap(&bitmap, src, dst, 1.0);
    }

    fn draw_text<S: Surface + ?Sized>(&self, surface: &mut S, layer: &TextLayer, progress: f32) {
        let doc = layer.document.evaluate(progress);
        let face = match self.composition.fonts.get(&doc.font_name) {
            Some(face) => face.clone(),
            None => {
                self.composition.report(ParseWarning::MissingFont {
                    name: doc.font_name.clone(),
                });
                FontFace {
                    name: doc.font_name.clone(),
                    family: doc.font_name.clone(),
                    style: String::new(),
                    ascent: 0.0,
                }
            }
        };

        let outlines = self
            .glyphs
            .as_deref()
            .and_then(|glyphs| text::layout_glyphs(&doc, &face, glyphs));
        if let Some(outlines) = outlines {
            surface.fill_path(&outlines, &solid_fill(doc.fill, FillRule::NonZero));
            if let Some(color) = doc.stroke.filter(|_| doc.stroke_width > 0.0) {
                surface.stroke_path(
                    &outlines,
                    &StrokeStyle {
                        brush: Brush::Solid(color),
                        opacity: 1.0,
                        width: doc.stroke_width,
                        cap: LineCap::Butt,
                        join: LineJoin::Miter,
                        miter_limit: 4.0,
                        dashes: None,
                    },
                );
            }
            return;
        }

        for (n, line) in doc.lines().enumerate() {
            surface.draw_text_run(&TextRun {
                text: line.to_owned(),
                family: face.family.clone(),
                style: face.style.clone(),
                size: doc.size,
                tracking: doc.tracking,
                color: doc.fill,
                origin: Point::new(0.0, n as f64 * doc.line_height as f64),
                justification: doc.justification,
            });
        }
    }
}

/// Masks with mode `n` do not count.
fn has_masks(layer: &Layer) -> bool {
    layer.masks.iter().any(|m| m.mode != MaskMode::None)
}

fn solid_fill(color: Color, rule: FillRule) -> FillStyle {
    FillStyle {
        brush: Brush::Solid(color),
        opacity: 1.0,
        rule,
    }
}
