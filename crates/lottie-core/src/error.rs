use thiserror::Error;

/// Structural failure while reading a document. Parsing never yields a
/// partial composition.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("layer {index}: {source}")]
    Layer {
        index: usize,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ParseError::InvalidField {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn in_layer(self, index: usize) -> Self {
        ParseError::Layer {
            index,
            source: Box::new(self),
        }
    }
}

/// Non-fatal anomaly recorded on a composition. The animation keeps playing
/// with the affected feature degraded or skipped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Error)]
pub enum ParseWarning {
    #[error("expressions are not evaluated (layer {layer:?})")]
    Expression { layer: Option<String> },
    #[error("shape item `{ty}` is not supported")]
    UnsupportedShape { ty: String },
    #[error("layer type {ty} is not supported")]
    UnsupportedLayer { ty: u8 },
    #[error("layer effects and styles are ignored (layer {layer:?})")]
    UnsupportedEffect { layer: Option<String> },
    #[error("layer {layer} references missing parent {parent}")]
    MissingParent { layer: u32, parent: u32 },
    #[error("path keyframes differ in vertex count ({start} vs {end})")]
    PathVertexMismatch { start: usize, end: usize },
    #[error("blend mode {mode:?} is not supported by the surface, drawing normally")]
    UnsupportedBlendMode { mode: crate::layer::BlendMode },
    #[error("mask mode {mode:?} is not supported, drawing as add")]
    UnsupportedMaskMode { mode: crate::layer::MaskMode },
    #[error("asset `{id}` is not available")]
    MissingAsset { id: String },
    #[error("font `{name}` is not declared")]
    MissingFont { name: String },
    #[error("merge paths mode {mode:?} emulated with fill rules")]
    MergePathsEmulated { mode: crate::shape::MergeMode },
}

/// Two path keyframes cannot be blended vertex by vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot interpolate a {start_vertices}-vertex path into a {end_vertices}-vertex path")]
pub struct InterpolationMismatchError {
    pub start_vertices: usize,
    pub end_vertices: usize,
}
