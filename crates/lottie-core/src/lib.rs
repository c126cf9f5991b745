//! Interpreter for Lottie (Bodymovin) vector animations.
//!
//! A [`Composition`] is parsed once and shared; a [`CompositionRenderer`]
//! draws any progress value of it onto a host [`Surface`], and a
//! [`ProgressController`] turns wall time into that progress.

pub mod animatable;
pub mod asset;
pub mod cache;
pub mod color;
pub mod composition;
pub mod compositor;
pub mod config;
pub mod content;
pub mod error;
pub mod geometry;
pub mod gradient;
pub mod layer;
mod parse;
pub mod path;
pub mod path_morph;
pub mod player;
pub mod progress;
pub mod shape;
pub mod surface;
pub mod text;

pub use animatable::{AnimatableValue, Easing, Interpolatable, Keyframe};
pub use asset::{Bitmap, ImageAsset, ImageProvider};
pub use cache::CompositionCache;
pub use color::Color;
pub use composition::{Composition, LayerStack, Timeline};
pub use compositor::CompositionRenderer;
pub use config::{PathMismatchPolicy, ParseConfig, PlaybackConfig, PlayerConfig, RenderConfig};
pub use error::{InterpolationMismatchError, ParseError, ParseWarning};
pub use gradient::GradientColor;
pub use path::ShapeData;
pub use player::LottiePlayer;
pub use progress::{Advance, PlaybackEvent, ProgressController, RepeatCount, RepeatMode};
pub use surface::{
    Brush, ClipOp, DrawCommand, FillRule, FillStyle, LayerParams, MaskComposite, RecordingSurface,
    StrokeStyle, Surface,
};
pub use text::{FontFace, Glyph, GlyphProvider, TextDocument, TextRun};
