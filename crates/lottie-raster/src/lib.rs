//! CPU [`Surface`] for lottie-core on top of tiny-skia.
//!
//! Every `save_layer` allocates a transparent pixmap the size of the target;
//! `restore` composites it back with the layer's opacity and blend mode, or
//! uses it to mask what is below when the layer carries a mask composite.

mod convert;

use kurbo::{Affine, BezPath, Rect};
use lottie_core::layer::BlendMode;
use lottie_core::{
    Bitmap, ClipOp, Color, FillRule, FillStyle, LayerParams, MaskComposite, StrokeStyle, Surface,
};
use tiny_skia as sk;

struct Saved {
    transform: Affine,
    clip: Option<sk::Mask>,
    /// Set when the entry opened an offscreen layer.
    layer: Option<LayerParams>,
}

pub struct RasterSurface {
    width: u32,
    height: u32,
    /// Base canvas first, open offscreen layers after it.
    targets: Vec<sk::Pixmap>,
    stack: Vec<Saved>,
    transform: Affine,
    clip: Option<sk::Mask>,
}

impl std::fmt::Debug for RasterSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RasterSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("layers", &(self.targets.len() - 1))
            .field("depth", &self.stack.len())
            .finish()
    }
}

impl RasterSurface {
    /// Transparent canvas. `None` when a dimension is zero or too large.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        let base = sk::Pixmap::new(width, height)?;
        Some(Self {
            width,
            height,
            targets: vec![base],
            stack: Vec::new(),
            transform: Affine::IDENTITY,
            clip: None,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fills the whole current target, ignoring transform and clip.
    pub fn clear(&mut self, color: Color) {
        self.target().0.fill(convert::color(color, 1.0));
    }

    /// The base canvas. Offscreen layers still open are not included.
    pub fn pixmap(&self) -> &sk::Pixmap {
        &self.targets[0]
    }

    pub fn into_pixmap(mut self) -> sk::Pixmap {
        self.targets.swap_remove(0)
    }

    /// Straight-alpha RGBA8 of the base canvas, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for px in self.pixmap().pixels() {
            let c = px.demultiply();
            out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        out
    }

    /// Straight-alpha RGBA8 at one pixel of the base canvas.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let c = self.pixmap().pixel(x, y)?.demultiply();
        Some([c.red(), c.green(), c.blue(), c.alpha()])
    }

    /// Depth of pushed state; zero after a balanced frame.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    fn target(&mut self) -> (&mut sk::Pixmap, Option<&sk::Mask>) {
        let last = self.targets.len() - 1;
        (&mut self.targets[last], self.clip.as_ref())
    }

    fn paint(brush: &lottie_core::Brush, opacity: f32) -> sk::Paint<'static> {
        sk::Paint {
            shader: convert::shader(brush, opacity.clamp(0.0, 1.0)),
            anti_alias: true,
            ..sk::Paint::default()
        }
    }

    fn coverage(&self, path: &BezPath, rule: FillRule) -> Option<sk::Mask> {
        let mut mask = sk::Mask::new(self.width, self.height)?;
        if let Some(p) = convert::path(path) {
            mask.fill_path(&p, convert::fill_rule(rule), true, convert::transform(self.transform));
        }
        Some(mask)
    }

    /// Pops the top offscreen layer and merges it into the one below.
    fn composite(&mut self, params: &LayerParams) {
        let Some(src) = self.targets.pop() else {
            return;
        };
        let (dst, clip) = self.target();
        let opacity = params.opacity.clamp(0.0, 1.0);
        let blend = match params.composite {
            Some(MaskComposite::DestinationIn) => sk::BlendMode::DestinationIn,
            Some(MaskComposite::DestinationOut) => sk::BlendMode::DestinationOut,
            Some(MaskComposite::LumaIn) => {
                apply_luma(dst, &src, opacity, false, clip);
                return;
            }
            Some(MaskComposite::LumaOut) => {
                apply_luma(dst, &src, opacity, true, clip);
                return;
            }
            None => convert::blend_mode(params.blend).unwrap_or(sk::BlendMode::SourceOver),
        };
        let paint = sk::PixmapPaint {
            opacity,
            blend_mode: blend,
            quality: sk::FilterQuality::Nearest,
        };
        dst.draw_pixmap(0, 0, src.as_ref(), &paint, sk::Transform::identity(), clip);
    }
}

/// Scales every destination pixel by the luminance of `src` (or its
/// complement). Pixels outside `clip` keep their value.
fn apply_luma(dst: &mut sk::Pixmap, src: &sk::Pixmap, opacity: f32, invert: bool, clip: Option<&sk::Mask>) {
    let clip = clip.map(sk::Mask::data);
    for (i, (out, m)) in dst
        .data_mut()
        .chunks_exact_mut(4)
        .zip(src.pixels())
        .enumerate()
    {
        // Premultiplied channels already carry alpha, so this is luma * alpha.
        let luma = Color::rgba(
            m.red() as f32 / 255.0,
            m.green() as f32 / 255.0,
            m.blue() as f32 / 255.0,
            1.0,
        )
        .luma()
        .clamp(0.0, 1.0)
            * opacity;
        let mut keep = if invert { 1.0 - luma } else { luma };
        if let Some(c) = clip {
            let c = c[i] as f32 / 255.0;
            keep = 1.0 + (keep - 1.0) * c;
        }
        for v in out.iter_mut() {
            *v = (*v as f32 * keep).round() as u8;
        }
    }
}

fn intersect(into: &mut sk::Mask, other: &sk::Mask) {
    for (a, b) in into.data_mut().iter_mut().zip(other.data()) {
        *a = ((*a as u16 * *b as u16 + 127) / 255) as u8;
    }
}

impl Surface for RasterSurface {
    fn save(&mut self) {
        self.stack.push(Saved {
            transform: self.transform,
            clip: self.clip.clone(),
            layer: None,
        });
    }

    fn restore(&mut self) {
        let Some(saved) = self.stack.pop() else {
            tracing::warn!("restore without matching save");
            return;
        };
        self.transform = saved.transform;
        self.clip = saved.clip;
        if let Some(params) = saved.layer {
            self.composite(&params);
        }
    }

    fn save_layer(&mut self, params: &LayerParams) {
        let layer = sk::Pixmap::new(self.width, self.height);
        self.stack.push(Saved {
            transform: self.transform,
            clip: self.clip.clone(),
            layer: layer.is_some().then_some(*params),
        });
        self.targets.extend(layer);
    }

    fn concat(&mut self, transform: Affine) {
        self.transform *= transform;
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn transform(&self) -> Affine {
        self.transform
    }

    fn clip_path(&mut self, path: &BezPath, rule: FillRule, op: ClipOp) {
        let Some(mut mask) = self.coverage(path, rule) else {
            return;
        };
        if op == ClipOp::Difference {
            mask.invert();
        }
        match &mut self.clip {
            Some(clip) => intersect(clip, &mask),
            None => self.clip = Some(mask),
        }
    }

    fn fill_path(&mut self, path: &BezPath, style: &FillStyle) {
        let Some(p) = convert::path(path) else {
            return;
        };
        let paint = Self::paint(&style.brush, style.opacity);
        let ts = convert::transform(self.transform);
        let (target, clip) = self.target();
        target.fill_path(&p, &paint, convert::fill_rule(style.rule), ts, clip);
    }

    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle) {
        if style.width <= 0.0 {
            return;
        }
        let Some(p) = convert::path(path) else {
            return;
        };
        let paint = Self::paint(&style.brush, style.opacity);
        let stroke = convert::stroke(style);
        let ts = convert::transform(self.transform);
        let (target, clip) = self.target();
        target.stroke_path(&p, &paint, &stroke, ts, clip);
    }

    fn draw_bitmap(&mut self, bitmap: &Bitmap, src: Rect, dst: Rect, alpha: f32) {
        if src.width() <= 0.0 || src.height() <= 0.0 {
            return;
        }
        let Some(size) = sk::IntSize::from_wh(bitmap.width(), bitmap.height()) else {
            return;
        };
        let Some(image) = sk::Pixmap::from_vec(bitmap.data().to_vec(), size) else {
            tracing::debug!(
                width = bitmap.width(),
                height = bitmap.height(),
                "bitmap buffer rejected"
            );
            return;
        };
        let Some(rect) = convert::rect(dst) else {
            return;
        };
        let src_to_dst = Affine::translate((dst.x0, dst.y0))
            * Affine::scale_non_uniform(dst.width() / src.width(), dst.height() / src.height())
            * Affine::translate((-src.x0, -src.y0));
        let paint = sk::Paint {
            shader: sk::Pattern::new(
                image.as_ref(),
                sk::SpreadMode::Pad,
                sk::FilterQuality::Bilinear,
                alpha.clamp(0.0, 1.0),
                convert::transform(src_to_dst),
            ),
            anti_alias: true,
            ..sk::Paint::default()
        };
        let ts = convert::transform(self.transform);
        let (target, clip) = self.target();
        target.fill_rect(rect, &paint, ts, clip);
    }

    fn supports_blend_mode(&self, mode: BlendMode) -> bool {
        convert::blend_mode(mode).is_some()
    }
}
