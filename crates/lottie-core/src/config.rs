//! Tunables for parsing, drawing and playback.
//!
//! Every struct deserializes from JSON with all fields optional, so hosts can
//! ship a partial config file and rely on the defaults for the rest.

use crate::error::ParseError;
use crate::progress::{RepeatCount, RepeatMode};
use serde::{Deserialize, Serialize};

/// What to do with path keyframes whose endpoints differ in vertex count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMismatchPolicy {
    /// Keep the start shape for the whole segment.
    #[default]
    Hold,
    /// Resample both endpoints to a common vertex count when parsing.
    Resample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub path_mismatch: PathMismatchPolicy,
    /// Reject layers whose `parent` names a layer that does not exist.
    pub strict_parents: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            path_mismatch: PathMismatchPolicy::Hold,
            strict_parents: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Clip precomp layers to their declared width and height.
    pub clip_precomps: bool,
    /// Clip the whole frame to the composition bounds.
    pub clip_to_composition_bounds: bool,
    pub enable_merge_paths: bool,
    /// Longest parent chain followed before giving up (guards against cycles).
    pub max_parent_depth: usize,
    /// Deepest precomp nesting drawn.
    pub max_precomp_depth: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clip_precomps: true,
            clip_to_composition_bounds: true,
            enable_merge_paths: true,
            max_parent_depth: 64,
            max_precomp_depth: 16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    pub speed: f32,
    pub repeat_mode: RepeatMode,
    pub repeat_count: RepeatCount,
    pub autoplay: bool,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            speed: 1.0,
            repeat_mode: RepeatMode::Restart,
            repeat_count: RepeatCount::Infinite,
            autoplay: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub parse: ParseConfig,
    pub render: RenderConfig,
    pub playback: PlaybackConfig,
}

impl PlayerConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ParseError> {
        Ok(serde_json::from_str(json)?)
    }
}
