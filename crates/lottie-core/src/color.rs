use glam::{Vec3, Vec4};

/// Straight (non-premultiplied) RGBA color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Reads an exported color array. Missing alpha means opaque; values
    /// above 1 are taken as 0-255 channels.
    pub fn from_components(c: &[f32]) -> Self {
        let get = |i: usize, default: f32| c.get(i).copied().unwrap_or(default);
        let scale = if c.iter().take(3).any(|v| *v > 1.0) {
            255.0
        } else {
            1.0
        };
        Self {
            r: (get(0, 0.0) / scale).clamp(0.0, 1.0),
            g: (get(1, 0.0) / scale).clamp(0.0, 1.0),
            b: (get(2, 0.0) / scale).clamp(0.0, 1.0),
            a: get(3, 1.0).clamp(0.0, 1.0),
        }
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim().trim_start_matches('#');
        let channel = |i: usize| {
            hex.get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .map(|v| v as f32 / 255.0)
        };
        match hex.len() {
            6 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 1.0)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(self.r, self.g, self.b, self.a)
    }

    /// Rec. 709 luma of the gamma-encoded channels.
    pub fn luma(self) -> f32 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// Hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
    pub fn to_hsv(self) -> Vec3 {
        let max = self.r.max(self.g).max(self.b);
        let min = self.r.min(self.g).min(self.b);
        let delta = max - min;

        let hue = if delta <= f32::EPSILON {
            0.0
        } else if max == self.r {
            60.0 * ((self.g - self.b) / delta).rem_euclid(6.0)
        } else if max == self.g {
            60.0 * ((self.b - self.r) / delta + 2.0)
        } else {
            60.0 * ((self.r - self.g) / delta + 4.0)
        };
        let saturation = if max <= f32::EPSILON { 0.0 } else { delta / max };
        Vec3::new(hue, saturation, max)
    }

    pub fn from_hsv(hsv: Vec3, a: f32) -> Self {
        let h = hsv.x.rem_euclid(360.0) / 60.0;
        let s = hsv.y.clamp(0.0, 1.0);
        let v = hsv.z.clamp(0.0, 1.0);

        let c = v * s;
        let x = c * (1.0 - (h.rem_euclid(2.0) - 1.0).abs());
        let m = v - c;
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        Self::rgba(r + m, g + m, b + m, a)
    }

    /// Blends toward `other` along the HSV cylinder.
    ///
    /// Hue takes the shorter arc; an achromatic endpoint has no meaningful
    /// hue and adopts the other one. Value is blended in linear light so
    /// midtones keep their brightness.
    pub fn lerp_hsv(self, other: Color, t: f32) -> Color {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        let a = self.to_hsv();
        let b = other.to_hsv();

        let achromatic = |hsv: Vec3| hsv.y <= 1e-4 || hsv.z <= 1e-4;
        let (h0, h1) = match (achromatic(a), achromatic(b)) {
            (true, false) => (b.x, b.x),
            (false, true) => (a.x, a.x),
            _ => (a.x, b.x),
        };
        let mut dh = h1 - h0;
        if dh > 180.0 {
            dh -= 360.0;
        } else if dh < -180.0 {
            dh += 360.0;
        }
        let hue = (h0 + dh * t).rem_euclid(360.0);
        let saturation = a.y + (b.y - a.y) * t;
        let value = linear_to_srgb(srgb_to_linear(a.z) + (srgb_to_linear(b.z) - srgb_to_linear(a.z)) * t);
        let alpha = self.a + (other.a - self.a) * t;

        Color::from_hsv(Vec3::new(hue, saturation, value), alpha)
    }

    /// Plain per-channel blend, used when resampling between adjacent
    /// gradient stops (matching how the rasterizer fills between stops).
    pub fn lerp_rgb(self, other: Color, t: f32) -> Color {
        Color::rgba(
            self.r + (other.r - self.r) * t,
            self.g + (other.g - self.g) * t,
            self.b + (other.b - self.b) * t,
            self.a + (other.a - self.a) * t,
        )
    }
}

pub fn srgb_to_linear(v: f32) -> f32 {
    if v <= 0.04045 {
        v / 12.92
    } else {
        ((v + 0.055) / 1.055).powf(2.4)
    }
}

pub fn linear_to_srgb(v: f32) -> f32 {
    let v = v.clamp(0.0, 1.0);
    if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}
