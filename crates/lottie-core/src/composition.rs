use crate::asset::ImageAsset;
use crate::config::ParseConfig;
use crate::error::{ParseError, ParseWarning};
use crate::layer::Layer;
use crate::parse::ParseContext;
use crate::text::FontFace;
use lottie_data::model::{self as data, LottieJson};
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

/// Frame range and rate of the root composition. Keyframe times are stored
/// as progress through this range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timeline {
    pub start: f32,
    pub end: f32,
    pub frame_rate: f32,
}

impl Timeline {
    pub fn new(start: f32, end: f32, frame_rate: f32) -> Self {
        Self {
            start,
            end,
            frame_rate,
        }
    }

    pub fn span(&self) -> f32 {
        self.end - self.start
    }

    pub fn progress(&self, frame: f32) -> f32 {
        (frame - self.start) / self.span()
    }

    pub fn frame(&self, progress: f32) -> f32 {
        self.start + progress * self.span()
    }
}

/// Layers drawn together, either the root list or a precomp's, with track
/// matte pairing resolved.
#[derive(Debug, Default)]
pub struct LayerStack {
    pub layers: Vec<Layer>,
    by_id: HashMap<u32, usize>,
    matte_source: Vec<Option<usize>>,
    consumed: Vec<bool>,
}

impl LayerStack {
    pub(crate) fn new(layers: Vec<Layer>) -> Self {
        let by_id = layers
            .iter()
            .enumerate()
            .filter_map(|(i, l)| l.index.map(|id| (id, i)))
            .collect();

        // A matted layer consumes the layer listed right before it.
        let mut matte_source = vec![None; layers.len()];
        let mut consumed = vec![false; layers.len()];
        for i in 1..layers.len() {
            if layers[i].matte.is_some() {
                matte_source[i] = Some(i - 1);
                consumed[i - 1] = true;
            }
        }

        Self {
            layers,
            by_id,
            matte_source,
            consumed,
        }
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Layer masking layer `i`, if `i` is matted and has a predecessor.
    pub fn matte_source(&self, i: usize) -> Option<usize> {
        self.matte_source.get(i).copied().flatten()
    }

    /// Whether layer `i` is only drawn as another layer's matte.
    pub fn is_consumed(&self, i: usize) -> bool {
        self.consumed.get(i).copied().unwrap_or(false)
    }

    fn has_masks(&self) -> bool {
        self.layers.iter().any(|l| !l.masks.is_empty())
    }

    fn has_mattes(&self) -> bool {
        self.matte_source.iter().any(Option::is_some)
    }
}

/// Precomposition asset. Its layers are converted the first time a layer
/// draws it.
#[derive(Debug)]
pub struct PrecompAsset {
    pub id: String,
    raw: Vec<data::Layer>,
    stack: OnceLock<LayerStack>,
}

#[derive(Debug)]
pub enum Asset {
    Precomp(PrecompAsset),
    Image(ImageAsset),
}

/// A parsed animation. Immutable once built apart from published bitmaps,
/// lazily converted precomps and the warning list, so one instance can be
/// shared through an `Arc` by any number of renderers.
#[derive(Debug)]
pub struct Composition {
    pub name: Option<String>,
    pub width: f32,
    pub height: f32,
    pub timeline: Timeline,
    pub root: LayerStack,
    pub assets: HashMap<String, Asset>,
    pub fonts: HashMap<String, FontFace>,
    pub markers: Vec<data::Marker>,
    pub has_masks: bool,
    pub has_mattes: bool,
    config: ParseConfig,
    warnings: Mutex<Vec<ParseWarning>>,
}

impl Composition {
    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        Self::from_model(serde_json::from_str(json)?, &ParseConfig::default())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ParseError> {
        Self::from_model(serde_json::from_slice(bytes)?, &ParseConfig::default())
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        Self::from_model(serde_json::from_value(value)?, &ParseConfig::default())
    }

    pub fn from_model(model: LottieJson, config: &ParseConfig) -> Result<Self, ParseError> {
        let finite = [model.ip, model.op, model.fr, model.w, model.h]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(ParseError::invalid("ip", "frame range, rate and size must be finite"));
        }
        if model.fr <= 0.0 {
            return Err(ParseError::invalid("fr", format!("frame rate {} is not positive", model.fr)));
        }
        if model.op <= model.ip {
            return Err(ParseError::invalid(
                "op",
                format!("out point {} is not after in point {}", model.op, model.ip),
            ));
        }
        if model.w < 0.0 || model.h < 0.0 {
            return Err(ParseError::invalid("w", "negative composition size"));
        }

        let timeline = Timeline::new(model.ip, model.op, model.fr);
        let mut cx = ParseContext::new(timeline, config);
        let layers = cx.layers(&model.layers)?;
        let mut warnings = cx.into_warnings();

        let root = LayerStack::new(layers);
        check_parents(&root, config, &mut warnings)?;

        let assets = model
            .assets
            .into_iter()
            .map(|asset| {
                let id = asset.id.clone();
                let parsed = match asset.layers {
                    Some(raw) => Asset::Precomp(PrecompAsset {
                        id: asset.id,
                        raw,
                        stack: OnceLock::new(),
                    }),
                    None => Asset::Image(ImageAsset::from_model(&asset)),
                };
                (id, parsed)
            })
            .collect();

        let fonts = model
            .fonts
            .map(|f| f.list)
            .unwrap_or_default()
            .into_iter()
            .map(|font| {
                let face = FontFace {
                    family: font.family.unwrap_or_else(|| font.name.clone()),
                    style: font.style.unwrap_or_default(),
                    ascent: font.ascent.unwrap_or(0.0),
                    name: font.name.clone(),
                };
                (font.name, face)
            })
            .collect();

        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        tracing::debug!(
            layers = root.layers.len(),
            frames = model.op - model.ip,
            "parsed composition"
        );

        Ok(Self {
            name: model.nm,
            width: model.w,
            height: model.h,
            timeline,
            has_masks: root.has_masks(),
            has_mattes: root.has_mattes(),
            root,
            assets,
            fonts,
            markers: model.markers,
            config: config.clone(),
            warnings: Mutex::new(warnings),
        })
    }

    pub fn frame_rate(&self) -> f32 {
        self.timeline.frame_rate
    }

    pub fn start_frame(&self) -> f32 {
        self.timeline.start
    }

    pub fn end_frame(&self) -> f32 {
        self.timeline.end
    }

    pub fn duration_frames(&self) -> f32 {
        self.timeline.span()
    }

    pub fn duration_seconds(&self) -> f32 {
        self.timeline.span() / self.timeline.frame_rate
    }

    pub fn image(&self, id: &str) -> Option<&ImageAsset> {
        match self.assets.get(id)? {
            Asset::Image(image) => Some(image),
            Asset::Precomp(_) => None,
        }
    }

    pub fn images(&self) -> impl Iterator<Item = &ImageAsset> {
        self.assets.values().filter_map(|a| match a {
            Asset::Image(image) => Some(image),
            Asset::Precomp(_) => None,
        })
    }

    /// Layers of a precomp asset, converted on first use. A precomp that
    /// fails to convert is reported and draws nothing.
    pub fn precomp(&self, id: &str) -> Option<&LayerStack> {
        let Asset::Precomp(precomp) = self.assets.get(id)? else {
            return None;
        };
        Some(precomp.stack.get_or_init(|| {
            let mut cx = ParseContext::new(self.timeline, &self.config);
            let stack = match cx.layers(&precomp.raw) {
                Ok(layers) => LayerStack::new(layers),
                Err(err) => {
                    tracing::warn!(asset = %precomp.id, "precomp skipped: {err}");
                    self.report(ParseWarning::MissingAsset {
                        id: precomp.id.clone(),
                    });
                    LayerStack::default()
                }
            };
            for warning in cx.into_warnings() {
                self.report(warning);
            }
            stack
        }))
    }

    /// Records a warning once. The first report is also logged.
    pub fn report(&self, warning: ParseWarning) {
        let Ok(mut warnings) = self.warnings.lock() else {
            return;
        };
        if !warnings.contains(&warning) {
            tracing::warn!("{warning}");
            warnings.push(warning);
        }
    }

    pub fn warnings(&self) -> Vec<ParseWarning> {
        self.warnings
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

fn check_parents(
    stack: &LayerStack,
    config: &ParseConfig,
    warnings: &mut Vec<ParseWarning>,
) -> Result<(), ParseError> {
    for (i, layer) in stack.layers.iter().enumerate() {
        let Some(parent) = layer.parent else {
            continue;
        };
        if stack.index_of(parent).is_some() {
            continue;
        }
        if config.strict_parents {
            return Err(ParseError::invalid(
                "parent",
                format!("layer references missing parent {parent}"),
            )
            .in_layer(i));
        }
        let warning = ParseWarning::MissingParent {
            layer: layer.index.unwrap_or(i as u32),
            parent,
        };
        if !warnings.contains(&warning) {
            warnings.push(warning);
        }
    }
    Ok(())
}
