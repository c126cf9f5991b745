use crate::animatable::AnimatableValue;
use crate::color::Color;
use crate::path::ShapeData;
use crate::shape::ShapeItem;
use crate::text::TextDocument;
use glam::Vec2;
use kurbo::Affine;

#[derive(Debug, Clone)]
pub enum Position {
    Combined(AnimatableValue<Vec2>),
    Split {
        x: AnimatableValue<f32>,
        y: AnimatableValue<f32>,
    },
}

impl Position {
    pub fn evaluate(&self, progress: f32) -> Vec2 {
        match self {
            Position::Combined(p) => p.evaluate(progress),
            Position::Split { x, y } => Vec2::new(x.evaluate(progress), y.evaluate(progress)),
        }
    }
}

/// Animated 2D transform shared by layers, shape groups and repeaters.
/// Scale and opacity are stored in percent, rotation and skew in degrees.
#[derive(Debug, Clone)]
pub struct Transform {
    pub anchor: AnimatableValue<Vec2>,
    pub position: Position,
    pub scale: AnimatableValue<Vec2>,
    pub rotation: AnimatableValue<f32>,
    pub opacity: AnimatableValue<f32>,
    pub skew: AnimatableValue<f32>,
    pub skew_axis: AnimatableValue<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            anchor: AnimatableValue::fixed(Vec2::ZERO),
            position: Position::Combined(AnimatableValue::fixed(Vec2::ZERO)),
            scale: AnimatableValue::fixed(Vec2::splat(100.0)),
            rotation: AnimatableValue::fixed(0.0),
            opacity: AnimatableValue::fixed(100.0),
            skew: AnimatableValue::fixed(0.0),
            skew_axis: AnimatableValue::fixed(0.0),
        }
    }
}

impl Transform {
    /// `translate(position) * rotate * skew * scale * translate(-anchor)`.
    pub fn matrix(&self, progress: f32) -> Affine {
        let anchor = self.anchor.evaluate(progress);
        let position = self.position.evaluate(progress);
        let scale = self.scale.evaluate(progress) / 100.0;
        let rotation = self.rotation.evaluate(progress);
        let skew = self.skew.evaluate(progress);

        let mut m = Affine::translate((position.x as f64, position.y as f64))
            * Affine::rotate((rotation as f64).to_radians());
        if skew != 0.0 {
            let axis = (self.skew_axis.evaluate(progress) as f64).to_radians();
            let shear = (-(skew as f64).clamp(-85.0, 85.0)).to_radians().tan();
            m = m * Affine::rotate(axis) * Affine::skew(shear, 0.0) * Affine::rotate(-axis);
        }
        m * Affine::scale_non_uniform(scale.x as f64, scale.y as f64)
            * Affine::translate((-anchor.x as f64, -anchor.y as f64))
    }

    /// Opacity as a `0..=1` factor.
    pub fn opacity(&self, progress: f32) -> f32 {
        (self.opacity.evaluate(progress) / 100.0).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    #[default]
    Normal,
    Multiply,
    Screen,
    Overlay,
    Darken,
    Lighten,
    ColorDodge,
    ColorBurn,
    HardLight,
    SoftLight,
    Difference,
    Exclusion,
    Hue,
    Saturation,
    Color,
    Luminosity,
    Add,
    HardMix,
}

impl BlendMode {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => BlendMode::Multiply,
            2 => BlendMode::Screen,
            3 => BlendMode::Overlay,
            4 => BlendMode::Darken,
            5 => BlendMode::Lighten,
            6 => BlendMode::ColorDodge,
            7 => BlendMode::ColorBurn,
            8 => BlendMode::HardLight,
            9 => BlendMode::SoftLight,
            10 => BlendMode::Difference,
            11 => BlendMode::Exclusion,
            12 => BlendMode::Hue,
            13 => BlendMode::Saturation,
            14 => BlendMode::Color,
            15 => BlendMode::Luminosity,
            16 => BlendMode::Add,
            17 => BlendMode::HardMix,
            _ => BlendMode::Normal,
        }
    }
}

/// How a track matte source masks the layer that consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatteType {
    #[default]
    None,
    /// Keep content where the matte is opaque.
    Add,
    /// Keep content where the matte is transparent.
    Invert,
    Luma,
    LumaInvert,
}

impl MatteType {
    pub fn from_code(code: Option<u8>) -> Self {
        match code {
            Some(1) => MatteType::Add,
            Some(2) => MatteType::Invert,
            Some(3) => MatteType::Luma,
            Some(4) => MatteType::LumaInvert,
            _ => MatteType::None,
        }
    }

    pub fn is_some(self) -> bool {
        self != MatteType::None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaskMode {
    None,
    Add,
    Subtract,
    Intersect,
    Lighten,
    Darken,
    Difference,
}

impl MaskMode {
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("n") => MaskMode::None,
            Some("s") => MaskMode::Subtract,
            Some("i") => MaskMode::Intersect,
            Some("l") => MaskMode::Lighten,
            Some("d") => MaskMode::Darken,
            Some("f") => MaskMode::Difference,
            _ => MaskMode::Add,
        }
    }

    /// Lighten, darken and difference masks are drawn as add.
    pub fn is_supported(self) -> bool {
        !matches!(self, MaskMode::Lighten | MaskMode::Darken | MaskMode::Difference)
    }
}

#[derive(Debug, Clone)]
pub struct Mask {
    pub mode: MaskMode,
    pub inverted: bool,
    pub path: AnimatableValue<ShapeData>,
    pub opacity: AnimatableValue<f32>,
}

#[derive(Debug, Clone)]
pub struct PrecompLayer {
    pub ref_id: String,
    pub width: f32,
    pub height: f32,
    /// Local time in seconds, replacing the stretched layer clock.
    pub time_remap: Option<AnimatableValue<f32>>,
}

#[derive(Debug, Clone)]
pub struct SolidLayer {
    pub color: Color,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
pub struct ImageLayer {
    pub ref_id: String,
}

#[derive(Debug, Clone)]
pub struct ShapeLayer {
    pub items: Vec<ShapeItem>,
}

#[derive(Debug, Clone)]
pub struct TextLayer {
    pub document: AnimatableValue<TextDocument>,
}

#[derive(Debug, Clone)]
pub enum LayerKind {
    Precomp(PrecompLayer),
    Solid(SolidLayer),
    Image(ImageLayer),
    Null,
    Shape(ShapeLayer),
    Text(TextLayer),
}

#[derive(Debug, Clone)]
pub struct Layer {
    pub index: Option<u32>,
    pub name: Option<String>,
    pub parent: Option<u32>,
    pub kind: LayerKind,
    /// Visible for frames in `[in_frame, out_frame)` of the containing composition.
    pub in_frame: f32,
    pub out_frame: f32,
    pub start_time: f32,
    pub time_stretch: f32,
    pub transform: Transform,
    pub masks: Vec<Mask>,
    pub matte: MatteType,
    pub blend_mode: BlendMode,
    pub hidden: bool,
}

impl Layer {
    pub fn is_active(&self, frame: f32) -> bool {
        frame >= self.in_frame && frame < self.out_frame
    }

    /// Frame on this layer's own clock, after start offset and stretch.
    pub fn local_frame(&self, frame: f32) -> f32 {
        (frame - self.start_time) / self.time_stretch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn transform_applies_anchor_scale_rotation_position() {
        let t = Transform {
            anchor: AnimatableValue::fixed(Vec2::new(10.0, 0.0)),
            position: Position::Combined(AnimatableValue::fixed(Vec2::new(100.0, 100.0))),
            scale: AnimatableValue::fixed(Vec2::new(200.0, 200.0)),
            rotation: AnimatableValue::fixed(90.0),
            ..Transform::default()
        };
        // The anchor lands on the position.
        let p = t.matrix(0.0) * Point::new(10.0, 0.0);
        assert!((p.x - 100.0).abs() < 1e-9 && (p.y - 100.0).abs() < 1e-9);
        // One unit right of the anchor: doubled, then turned clockwise (down on screen).
        let q = t.matrix(0.0) * Point::new(11.0, 0.0);
        assert!((q.x - 100.0).abs() < 1e-9 && (q.y - 102.0).abs() < 1e-9);
    }

    #[test]
    fn split_position_evaluates_each_axis() {
        let pos = Position::Split {
            x: AnimatableValue::linear([(0.0, 0.0), (1.0, 10.0)]).unwrap(),
            y: AnimatableValue::fixed(5.0),
        };
        assert_eq!(pos.evaluate(0.5), Vec2::new(5.0, 5.0));
    }

    #[test]
    fn codes_map_to_modes() {
        assert_eq!(BlendMode::from_code(1), BlendMode::Multiply);
        assert_eq!(BlendMode::from_code(99), BlendMode::Normal);
        assert_eq!(MatteType::from_code(Some(2)), MatteType::Invert);
        assert_eq!(MaskMode::from_code(Some("s")), MaskMode::Subtract);
        assert_eq!(MaskMode::from_code(None), MaskMode::Add);
    }
}
