use crate::color::Color;

const STOP_EPSILON: f32 = 1e-4;

/// Evaluated gradient ramp. `positions` and `colors` always have the same
/// length and positions are sorted ascending.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GradientColor {
    pub positions: Vec<f32>,
    pub colors: Vec<Color>,
}

impl GradientColor {
    pub fn new(stops: impl IntoIterator<Item = (f32, Color)>) -> Self {
        let mut stops: Vec<(f32, Color)> = stops.into_iter().collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        let (positions, colors) = stops.into_iter().unzip();
        Self { positions, colors }
    }

    /// Decodes the exported flat layout: `color_stops` entries of
    /// `[pos, r, g, b]`, optionally followed by `[pos, alpha]` pairs. Alpha
    /// stops are merged onto the color stop positions.
    pub fn from_flat(raw: &[f32], color_stops: usize) -> Self {
        let color_len = (color_stops * 4).min(raw.len() / 4 * 4);
        let colors: Vec<(f32, Color)> = raw[..color_len]
            .chunks_exact(4)
            .map(|c| (c[0], Color::from_components(&c[1..4])))
            .collect();
        let alphas: Vec<(f32, f32)> = raw[color_len..]
            .chunks_exact(2)
            .map(|c| (c[0], c[1]))
            .collect();

        if alphas.is_empty() {
            return Self::new(colors);
        }

        let color_ramp = Self::new(colors);
        let positions = merge_stop_positions(
            &color_ramp.positions,
            &alphas.iter().map(|(p, _)| *p).collect::<Vec<_>>(),
        );
        let stops = positions.into_iter().map(|p| {
            let color = color_ramp.sample(p);
            (p, color.with_alpha(sample_scalar(&alphas, p)))
        });
        Self::new(stops)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Color of the ramp at `position`, clamped at both ends.
    pub fn sample(&self, position: f32) -> Color {
        let Some(first) = self.colors.first() else {
            return Color::TRANSPARENT;
        };
        let idx = self.positions.partition_point(|p| *p <= position);
        if idx == 0 {
            return *first;
        }
        if idx >= self.positions.len() {
            return self.colors[self.colors.len() - 1];
        }
        let (p0, p1) = (self.positions[idx - 1], self.positions[idx]);
        let span = p1 - p0;
        if span <= STOP_EPSILON {
            return self.colors[idx];
        }
        self.colors[idx - 1].lerp_rgb(self.colors[idx], (position - p0) / span)
    }

    /// Resamples the ramp at the given stop positions.
    pub fn resample(&self, positions: &[f32]) -> Self {
        Self {
            positions: positions.to_vec(),
            colors: positions.iter().map(|p| self.sample(*p)).collect(),
        }
    }

    /// Blends two ramps stop by stop. Ramps with different stop positions
    /// are first brought onto the union of both position sets.
    pub fn blend(&self, other: &Self, t: f32) -> Self {
        let (a, b) = if self.positions.len() == other.positions.len() {
            (self.clone(), other.clone())
        } else {
            let merged = merge_stop_positions(&self.positions, &other.positions);
            (self.resample(&merged), other.resample(&merged))
        };
        let positions = a
            .positions
            .iter()
            .zip(&b.positions)
            .map(|(p0, p1)| p0 + (p1 - p0) * t)
            .collect();
        let colors = a
            .colors
            .iter()
            .zip(&b.colors)
            .map(|(c0, c1)| c0.lerp_hsv(*c1, t))
            .collect();
        Self { positions, colors }
    }
}

/// Sorted union of two stop position lists with near-equal entries collapsed.
pub fn merge_stop_positions(a: &[f32], b: &[f32]) -> Vec<f32> {
    let mut merged: Vec<f32> = a.iter().chain(b).copied().filter(|p| p.is_finite()).collect();
    merged.sort_by(f32::total_cmp);
    merged.dedup_by(|next, kept| (*next - *kept).abs() <= STOP_EPSILON);
    merged
}

fn sample_scalar(stops: &[(f32, f32)], position: f32) -> f32 {
    let idx = stops.partition_point(|(p, _)| *p <= position);
    match idx {
        0 => stops.first().map_or(1.0, |s| s.1),
        i if i >= stops.len() => stops.last().map_or(1.0, |s| s.1),
        i => {
            let (p0, v0) = stops[i - 1];
            let (p1, v1) = stops[i];
            if p1 - p0 <= STOP_EPSILON {
                v1
            } else {
                v0 + (v1 - v0) * (position - p0) / (p1 - p0)
            }
        }
    }
}
