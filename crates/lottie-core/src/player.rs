use crate::asset::ImageProvider;
use crate::composition::Composition;
use crate::compositor::CompositionRenderer;
use crate::config::PlayerConfig;
use crate::error::ParseError;
use crate::progress::{Advance, ProgressController};
use crate::surface::Surface;
use crate::text::GlyphProvider;
use std::sync::Arc;

/// One on-screen animation: a shared composition, its own playback state
/// and a renderer.
#[derive(Debug, Clone)]
pub struct LottiePlayer {
    renderer: CompositionRenderer,
    controller: ProgressController,
}

impl LottiePlayer {
    pub fn new(composition: Arc<Composition>) -> Self {
        Self::with_config(composition, &PlayerConfig::default())
    }

    pub fn with_config(composition: Arc<Composition>, config: &PlayerConfig) -> Self {
        let controller = ProgressController::with_config(composition.timeline, &config.playback);
        let renderer = CompositionRenderer::new(composition).with_config(config.render.clone());
        Self {
            renderer,
            controller,
        }
    }

    /// Parses `json` with `config.parse` and wraps the result.
    pub fn from_json(json: &str, config: &PlayerConfig) -> Result<Self, ParseError> {
        let model = serde_json::from_str(json)?;
        let composition = Composition::from_model(model, &config.parse)?;
        Ok(Self::with_config(Arc::new(composition), config))
    }

    pub fn set_glyph_provider(&mut self, provider: Arc<dyn GlyphProvider>) {
        self.renderer = self.renderer.clone().with_glyph_provider(provider);
    }

    pub fn set_image_provider(&mut self, provider: Arc<dyn ImageProvider>) {
        self.renderer = self.renderer.clone().with_image_provider(provider);
    }

    pub fn composition(&self) -> &Arc<Composition> {
        self.renderer.composition()
    }

    pub fn controller(&self) -> &ProgressController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ProgressController {
        &mut self.controller
    }

    /// `dt` in seconds.
    pub fn advance(&mut self, dt: f32) -> Advance {
        self.controller.advance(dt)
    }

    pub fn draw<S: Surface + ?Sized>(&self, surface: &mut S) {
        self.renderer.draw(surface, self.controller.progress());
    }
}
