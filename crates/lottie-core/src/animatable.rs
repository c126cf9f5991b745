use crate::color::Color;
use crate::error::{InterpolationMismatchError, ParseError};
use crate::gradient::GradientColor;
use crate::path::{point, vec2, ShapeData};
use crate::text::TextDocument;
use glam::Vec2;
use kurbo::{CubicBez, ParamCurve, ParamCurveArclen};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

const ARCLEN_ACCURACY: f64 = 1e-3;

pub trait Interpolatable: Sized + Clone {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError>;

    /// Builds a value from a point on a spatial motion path. Only point-like
    /// values travel along such paths.
    fn from_spatial(_p: Vec2) -> Option<Self> {
        None
    }
}

impl Interpolatable for f32 {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError> {
        Ok(self + (other - self) * t)
    }
}

impl Interpolatable for Vec2 {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError> {
        Ok(Vec2::lerp(*self, *other, t))
    }

    fn from_spatial(p: Vec2) -> Option<Self> {
        Some(p)
    }
}

impl Interpolatable for Color {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError> {
        Ok(self.lerp_hsv(*other, t))
    }
}

impl Interpolatable for ShapeData {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError> {
        if self.vertex_count() != other.vertex_count() {
            return Err(InterpolationMismatchError {
                start_vertices: self.vertex_count(),
                end_vertices: other.vertex_count(),
            });
        }
        Ok(self.lerp_unchecked(other, t))
    }
}

impl Interpolatable for GradientColor {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError> {
        Ok(self.blend(other, t))
    }
}

impl Interpolatable for TextDocument {
    fn try_lerp(&self, other: &Self, t: f32) -> Result<Self, InterpolationMismatchError> {
        Ok(if t < 1.0 { self.clone() } else { other.clone() })
    }
}

/// Cubic-bezier timing curve from `(0,0)` through two handles to `(1,1)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Easing {
    pub p1: Vec2,
    pub p2: Vec2,
}

impl Default for Easing {
    fn default() -> Self {
        Self::LINEAR
    }
}

impl Easing {
    pub const LINEAR: Easing = Easing {
        p1: Vec2::ZERO,
        p2: Vec2::ONE,
    };

    pub fn new(p1: Vec2, p2: Vec2) -> Self {
        // Handles outside [0, 1] in x would make the curve non-monotonic in time.
        Self {
            p1: Vec2::new(p1.x.clamp(0.0, 1.0), p1.y),
            p2: Vec2::new(p2.x.clamp(0.0, 1.0), p2.y),
        }
    }

    pub fn is_linear(&self) -> bool {
        self.p1.x == self.p1.y && self.p2.x == self.p2.y
    }

    /// Eased progress for linear time `x` in `[0, 1]`.
    pub fn solve(&self, x: f32) -> f32 {
        if x <= 0.0 {
            return 0.0;
        }
        if x >= 1.0 {
            return 1.0;
        }
        if self.is_linear() {
            return x;
        }
        let t = self.parameter_for(x);
        bezier_component(self.p1.y, self.p2.y, t)
    }

    fn parameter_for(&self, x: f32) -> f32 {
        let (x1, x2) = (self.p1.x, self.p2.x);

        // Newton-Raphson converges in a few steps for typical handles.
        let mut t = x;
        for _ in 0..8 {
            let err = bezier_component(x1, x2, t) - x;
            if err.abs() < 1e-6 {
                return t;
            }
            let slope = bezier_slope(x1, x2, t);
            if slope.abs() < 1e-6 {
                break;
            }
            t -= err / slope;
        }

        // Flat regions defeat Newton; bisection always terminates.
        let (mut lo, mut hi) = (0.0f32, 1.0f32);
        t = x;
        for _ in 0..40 {
            let value = bezier_component(x1, x2, t);
            if (value - x).abs() < 1e-6 {
                break;
            }
            if value < x {
                lo = t;
            } else {
                hi = t;
            }
            t = (lo + hi) * 0.5;
        }
        t
    }
}

fn bezier_component(c1: f32, c2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * c1 + 3.0 * mt * t * t * c2 + t * t * t
}

fn bezier_slope(c1: f32, c2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * c1 + 6.0 * mt * t * (c2 - c1) + 3.0 * t * t * (1.0 - c2)
}

/// Curved motion path between two point keyframes, measured by arc length
/// so eased progress maps to distance travelled.
#[derive(Debug, Clone)]
pub struct SpatialSegment {
    curve: CubicBez,
    length: f64,
}

impl SpatialSegment {
    /// `out_tangent` leaves `from`, `in_tangent` arrives at `to`; both are
    /// relative. Returns `None` for a straight segment.
    pub fn new(from: Vec2, to: Vec2, out_tangent: Vec2, in_tangent: Vec2) -> Option<Self> {
        if out_tangent == Vec2::ZERO && in_tangent == Vec2::ZERO {
            return None;
        }
        let curve = CubicBez::new(
            point(from),
            point(from + out_tangent),
            point(to + in_tangent),
            point(to),
        );
        let length = curve.arclen(ARCLEN_ACCURACY);
        Some(Self { curve, length })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn point_at(&self, fraction: f32) -> Vec2 {
        let fraction = fraction.clamp(0.0, 1.0) as f64;
        if self.length <= f64::EPSILON {
            return vec2(self.curve.eval(fraction));
        }
        let t = self.curve.inv_arclen(fraction * self.length, ARCLEN_ACCURACY);
        vec2(self.curve.eval(t))
    }
}

/// One segment of an animated value. Times are composition progress.
#[derive(Debug, Clone)]
pub struct Keyframe<T> {
    pub start: f32,
    pub end: f32,
    pub start_value: T,
    /// `None` on the final keyframe.
    pub end_value: Option<T>,
    pub easing: Easing,
    pub hold: bool,
    pub spatial: Option<SpatialSegment>,
}

impl<T> Keyframe<T> {
    pub fn segment(start: f32, end: f32, from: T, to: T) -> Self {
        Self {
            start,
            end,
            start_value: from,
            end_value: Some(to),
            easing: Easing::LINEAR,
            hold: false,
            spatial: None,
        }
    }

    pub fn last(at: f32, value: T) -> Self {
        Self {
            start: at,
            end: at,
            start_value: value,
            end_value: None,
            easing: Easing::LINEAR,
            hold: false,
            spatial: None,
        }
    }
}

/// A value that varies over the composition's progress.
pub struct AnimatableValue<T> {
    keyframes: Vec<Keyframe<T>>,
    cursor: AtomicUsize,
    mismatch_reported: AtomicBool,
}

impl<T: Clone> Clone for AnimatableValue<T> {
    fn clone(&self) -> Self {
        Self {
            keyframes: self.keyframes.clone(),
            cursor: AtomicUsize::new(self.cursor.load(Ordering::Relaxed)),
            mismatch_reported: AtomicBool::new(false),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AnimatableValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatableValue")
            .field("keyframes", &self.keyframes)
            .finish()
    }
}

impl<T: Interpolatable> AnimatableValue<T> {
    pub fn fixed(value: T) -> Self {
        Self::from_sorted(vec![Keyframe::last(0.0, value)])
    }

    /// Validates ordering: keyframes must be non-empty and non-decreasing,
    /// with only the final one lacking an end value. Two keyframes at the
    /// same time form an instant jump.
    pub fn new(keyframes: Vec<Keyframe<T>>) -> Result<Self, ParseError> {
        if keyframes.is_empty() {
            return Err(ParseError::invalid("k", "animated property has no keyframes"));
        }
        for pair in keyframes.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if !(a.start <= b.start) || !a.start.is_finite() || !b.start.is_finite() {
                return Err(ParseError::invalid(
                    "t",
                    format!("keyframe times must not decrease ({} then {})", a.start, b.start),
                ));
            }
            if a.end_value.is_none() {
                return Err(ParseError::invalid("k", "only the last keyframe may omit its end value"));
            }
        }
        Ok(Self::from_sorted(keyframes))
    }

    /// Linear keyframes through `(progress, value)` pairs.
    pub fn linear(points: impl IntoIterator<Item = (f32, T)>) -> Result<Self, ParseError> {
        let points: Vec<(f32, T)> = points.into_iter().collect();
        let mut keyframes = Vec::with_capacity(points.len());
        for (i, (at, value)) in points.iter().enumerate() {
            match points.get(i + 1) {
                Some((next_at, next)) => {
                    keyframes.push(Keyframe::segment(*at, *next_at, value.clone(), next.clone()))
                }
                None => keyframes.push(Keyframe::last(*at, value.clone())),
            }
        }
        Self::new(keyframes)
    }

    fn from_sorted(keyframes: Vec<Keyframe<T>>) -> Self {
        Self {
            keyframes,
            cursor: AtomicUsize::new(0),
            mismatch_reported: AtomicBool::new(false),
        }
    }

    pub fn keyframes(&self) -> &[Keyframe<T>] {
        &self.keyframes
    }

    pub fn is_static(&self) -> bool {
        self.keyframes.len() == 1
    }

    /// Value at `progress`. Segments whose endpoints cannot be blended keep
    /// their start value.
    pub fn evaluate(&self, progress: f32) -> T {
        match self.try_evaluate(progress) {
            Ok(value) => value,
            Err(err) => {
                if !self.mismatch_reported.swap(true, Ordering::Relaxed) {
                    tracing::warn!("{err}; holding the start shape");
                }
                self.keyframes[self.locate(progress)].start_value.clone()
            }
        }
    }

    pub fn try_evaluate(&self, progress: f32) -> Result<T, InterpolationMismatchError> {
        let kfs = &self.keyframes;
        let first = &kfs[0];
        if kfs.len() == 1 || progress < first.start || progress.is_nan() {
            return Ok(first.start_value.clone());
        }
        let last = &kfs[kfs.len() - 1];
        if progress >= last.start {
            return Ok(last.start_value.clone());
        }

        let kf = &kfs[self.locate(progress)];
        let Some(end_value) = &kf.end_value else {
            return Ok(kf.start_value.clone());
        };
        let span = kf.end - kf.start;
        if kf.hold || span <= 0.0 {
            return Ok(kf.start_value.clone());
        }

        let local = ((progress - kf.start) / span).clamp(0.0, 1.0);
        let eased = kf.easing.solve(local);

        if let Some(segment) = &kf.spatial {
            if let Some(value) = T::from_spatial(segment.point_at(eased)) {
                return Ok(value);
            }
        }
        kf.start_value.try_lerp(end_value, eased)
    }

    /// Index of the segment containing `progress`, starting from the last
    /// hit so forward playback is amortized O(1).
    fn locate(&self, progress: f32) -> usize {
        let kfs = &self.keyframes;
        let segments = kfs.len().saturating_sub(1);
        if segments == 0 {
            return 0;
        }
        let contains = |i: usize| kfs[i].start <= progress && progress < kfs[i + 1].start;

        let hint = self.cursor.load(Ordering::Relaxed).min(segments - 1);
        let idx = if contains(hint) {
            hint
        } else if hint + 1 < segments && contains(hint + 1) {
            hint + 1
        } else {
            kfs.partition_point(|kf| kf.start <= progress)
                .saturating_sub(1)
                .min(segments - 1)
        };
        self.cursor.store(idx, Ordering::Relaxed);
        idx
    }
}

impl<T: Interpolatable + Default> Default for AnimatableValue<T> {
    fn default() -> Self {
        Self::fixed(T::default())
    }
}
