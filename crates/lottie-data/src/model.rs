use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

/// Multi-component value as exported: points, sizes, scales and colors.
/// Lengths vary (2D points carry an optional z, colors may omit alpha), so
/// the core pads or truncates when converting.
pub type Vector = Vec<f32>;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    #[serde(default)]
    pub v: Option<String>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    pub fr: f32,
    pub w: f32,
    pub h: f32,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub assets: Vec<Asset>,
    #[serde(default)]
    pub fonts: Option<FontList>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    pub ty: u8, // 0 precomp, 1 solid, 2 image, 3 null, 4 shape, 5 text
    #[serde(default)]
    pub ind: Option<u32>,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    #[serde(default)]
    pub st: f32,
    #[serde(default = "default_stretch")]
    pub sr: f32,
    #[serde(default)]
    pub ks: Transform,
    #[serde(default)]
    pub tm: Option<Property<f32>>, // Time remap, seconds
    #[serde(default)]
    pub hd: bool,
    #[serde(default, rename = "masksProperties")]
    pub masks_properties: Vec<MaskProperties>,
    #[serde(default)]
    pub tt: Option<u8>, // 1 alpha, 2 inverted alpha, 3 luma, 4 inverted luma
    #[serde(default)]
    pub td: Option<u8>,
    #[serde(default)]
    pub bm: Option<u8>,
    #[serde(default)]
    pub ef: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub sy: Option<Vec<serde_json::Value>>,

    #[serde(default, rename = "refId")]
    pub ref_id: Option<String>,
    #[serde(default)]
    pub w: Option<f32>,
    #[serde(default)]
    pub h: Option<f32>,
    #[serde(default)]
    pub sc: Option<String>, // Solid color, "#rrggbb"
    #[serde(default)]
    pub sw: Option<f32>,
    #[serde(default)]
    pub sh: Option<f32>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
    #[serde(default)]
    pub t: Option<TextData>,
}

fn default_stretch() -> f32 {
    1.0
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MaskProperties {
    #[serde(default)]
    pub inv: bool,
    #[serde(default)]
    pub mode: Option<String>,
    pub pt: Property<BezierPath>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub nm: Option<String>,
}

// Shapes

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "ty")]
pub enum Shape {
    #[serde(rename = "gr")]
    Group(GroupShape),
    #[serde(rename = "rc")]
    Rect(RectShape),
    #[serde(rename = "el")]
    Ellipse(EllipseShape),
    #[serde(rename = "sr")]
    Polystar(PolystarShape),
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "fl")]
    Fill(FillShape),
    #[serde(rename = "st")]
    Stroke(StrokeShape),
    #[serde(rename = "gf")]
    GradientFill(GradientFillShape),
    #[serde(rename = "gs")]
    GradientStroke(GradientStrokeShape),
    #[serde(rename = "tr")]
    Transform(TransformShape),
    #[serde(rename = "tm")]
    Trim(TrimShape),
    #[serde(rename = "mm")]
    MergePaths(MergePathsShape),
    #[serde(rename = "rp")]
    Repeater(RepeaterShape),
    #[serde(rename = "rd")]
    RoundCorners(RoundCornersShape),
    #[serde(rename = "zz")]
    ZigZag(ModifierShape),
    #[serde(rename = "pb")]
    PuckerBloat(ModifierShape),
    #[serde(rename = "tw")]
    Twist(ModifierShape),
    #[serde(rename = "op")]
    OffsetPath(ModifierShape),
    #[serde(rename = "wgl")]
    WigglePath(ModifierShape),
    #[serde(other)]
    Unknown,
}

impl Shape {
    /// The `ty` code this variant was read from.
    pub fn type_code(&self) -> &'static str {
        match self {
            Shape::Group(_) => "gr",
            Shape::Rect(_) => "rc",
            Shape::Ellipse(_) => "el",
            Shape::Polystar(_) => "sr",
            Shape::Path(_) => "sh",
            Shape::Fill(_) => "fl",
            Shape::Stroke(_) => "st",
            Shape::GradientFill(_) => "gf",
            Shape::GradientStroke(_) => "gs",
            Shape::Transform(_) => "tr",
            Shape::Trim(_) => "tm",
            Shape::MergePaths(_) => "mm",
            Shape::Repeater(_) => "rp",
            Shape::RoundCorners(_) => "rd",
            Shape::ZigZag(_) => "zz",
            Shape::PuckerBloat(_) => "pb",
            Shape::Twist(_) => "tw",
            Shape::OffsetPath(_) => "op",
            Shape::WigglePath(_) => "wgl",
            Shape::Unknown => "unknown",
        }
    }
}

/// Path modifiers that are recognised but not rendered.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ModifierShape {
    #[serde(default)]
    pub nm: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GroupShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub it: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    pub s: Property<Vector>,
    pub p: Property<Vector>,
    #[serde(default)]
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    pub s: Property<Vector>,
    pub p: Property<Vector>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolystarShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    #[serde(default)]
    pub p: Property<Vector>,
    pub or: Property<f32>,
    #[serde(default)]
    pub os: Property<f32>,
    #[serde(default)]
    pub r: Property<f32>,
    pub pt: Property<f32>,
    #[serde(default = "default_star")]
    pub sy: u8, // 1 star, 2 polygon
    #[serde(default)]
    pub ir: Option<Property<f32>>,
    #[serde(default)]
    pub is: Option<Property<f32>>,
}

fn default_star() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub d: Option<u8>,
    pub ks: Property<BezierPath>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub c: Property<Vector>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub r: Option<u8>, // 1 non-zero, 2 even-odd
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub c: Property<Vector>,
    pub w: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub lc: Option<u8>,
    #[serde(default)]
    pub lj: Option<u8>,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashProperty {
    #[serde(default)]
    pub n: Option<String>, // "d" dash, "g" gap, "o" offset
    pub v: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientFillShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub o: Property<f32>,
    pub s: Property<Vector>,
    pub e: Property<Vector>,
    #[serde(default = "default_linear")]
    pub t: u8, // 1 linear, 2 radial
    #[serde(default)]
    pub h: Option<Property<f32>>,
    #[serde(default)]
    pub a: Option<Property<f32>>,
    pub g: GradientColors,
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientStrokeShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub o: Property<f32>,
    pub w: Property<f32>,
    pub s: Property<Vector>,
    pub e: Property<Vector>,
    #[serde(default = "default_linear")]
    pub t: u8,
    #[serde(default)]
    pub h: Option<Property<f32>>,
    #[serde(default)]
    pub a: Option<Property<f32>>,
    pub g: GradientColors,
    #[serde(default)]
    pub lc: Option<u8>,
    #[serde(default)]
    pub lj: Option<u8>,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

fn default_linear() -> u8 {
    1
}

/// `p` color stops followed by optional alpha stops, flattened into `k`.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GradientColors {
    pub p: u32,
    pub k: Property<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub s: Property<f32>,
    pub e: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: Option<u8>, // 1 simultaneous, 2 individual
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergePathsShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    #[serde(default)]
    pub mm: Option<u8>, // 1 merge, 2 add, 3 subtract, 4 intersect, 5 exclude
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepeaterShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub c: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: Option<u8>, // 1 above, 2 below
    #[serde(default)]
    pub tr: RepeaterTransform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct RepeaterTransform {
    #[serde(flatten)]
    pub t: Transform,
    #[serde(default)]
    pub so: Property<f32>,
    #[serde(default)]
    pub eo: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RoundCornersShape {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: bool,
    pub r: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransformShape {
    #[serde(flatten)]
    pub t: Transform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Transform {
    #[serde(default)]
    pub a: Property<Vector>,
    #[serde(default)]
    pub p: PositionProperty,
    #[serde(default)]
    pub s: Property<Vector>,
    #[serde(default, alias = "rz")]
    pub r: Property<f32>,
    #[serde(default)]
    pub sk: Property<f32>,
    #[serde(default)]
    pub sa: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Split {
        s: bool,
        x: Property<f32>,
        y: Property<f32>,
    },
    Unified(Property<Vector>),
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

// Animated properties

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
    #[serde(default)]
    pub x: Option<String>, // Expression source
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
            x: None,
        }
    }
}

impl<T> Property<T> {
    pub fn fixed(value: T) -> Self {
        Property {
            k: Value::Static(value),
            ..Property::default()
        }
    }

    pub fn has_expression(&self) -> bool {
        self.x.as_deref().is_some_and(|x| !x.trim().is_empty())
    }
}

#[derive(Debug, Serialize, Clone)]
pub enum Value<T> {
    Default,
    Static(T),
    Animated(Vec<Keyframe<T>>),
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Value<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let v = serde_json::Value::deserialize(deserializer)?;

        if v.is_null() {
            return Ok(Value::Default);
        }

        // Keyframe lists are arrays of objects carrying `t`.
        let looks_animated = v
            .as_array()
            .and_then(|arr| arr.first())
            .is_some_and(|first| first.get("t").is_some());
        if looks_animated {
            return serde_json::from_value::<Vec<Keyframe<T>>>(v)
                .map(Value::Animated)
                .map_err(serde::de::Error::custom);
        }

        if let Ok(val) = serde_json::from_value::<T>(v.clone()) {
            return Ok(Value::Static(val));
        }

        if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
            if let Some(first) = vec.into_iter().next() {
                return Ok(Value::Static(first));
            }
        }

        Ok(Value::Default)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Value::Default
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(bound(deserialize = "T: DeserializeOwned"))]
pub struct Keyframe<T> {
    pub t: f32,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub s: Option<T>,
    #[serde(default, deserialize_with = "deserialize_keyframe_value")]
    pub e: Option<T>,
    #[serde(default)]
    pub i: Option<BezierTangent>,
    #[serde(default)]
    pub o: Option<BezierTangent>,
    #[serde(default)]
    pub to: Option<Vec<f32>>,
    #[serde(default)]
    pub ti: Option<Vec<f32>>,
    #[serde(default)]
    pub h: Option<u8>,
}

impl<T> Keyframe<T> {
    pub fn at(t: f32, s: T) -> Self {
        Keyframe {
            t,
            s: Some(s),
            e: None,
            i: None,
            o: None,
            to: None,
            ti: None,
            h: None,
        }
    }
}

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    if v.is_null() {
        return Ok(None);
    }

    if let Ok(val) = serde_json::from_value(v.clone()) {
        return Ok(Some(val));
    }

    // Scalars and shapes are exported wrapped in a one-element array.
    if let Ok(vec) = serde_json::from_value::<Vec<T>>(v) {
        if let Some(first) = vec.into_iter().next() {
            return Ok(Some(first));
        }
    }

    Ok(None)
}

/// Easing handle of a keyframe, `{"x": [0.48], "y": [1]}` or `{"x": 0.48, "y": 1}`.
/// Multi-dimensional properties may carry one handle per component; only the
/// first is used.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BezierTangent {
    #[serde(deserialize_with = "one_or_many")]
    pub x: Vec<f32>,
    #[serde(deserialize_with = "one_or_many")]
    pub y: Vec<f32>,
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(f32),
        Many(Vec<f32>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(v) => vec![v],
        OneOrMany::Many(v) => v,
    })
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<[f32; 2]>,
    #[serde(default)]
    pub o: Vec<[f32; 2]>,
    #[serde(default)]
    pub v: Vec<[f32; 2]>,
}

// Assets

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Asset {
    pub id: String,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub layers: Option<Vec<Layer>>,
    #[serde(default)]
    pub w: Option<f32>,
    #[serde(default)]
    pub h: Option<f32>,
    #[serde(default)]
    pub u: Option<String>, // Directory
    #[serde(default)]
    pub p: Option<String>, // File name or data URI
    #[serde(default)]
    pub e: Option<u8>, // 1 when `p` is embedded
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct FontList {
    #[serde(default)]
    pub list: Vec<Font>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Font {
    #[serde(rename = "fName")]
    pub name: String,
    #[serde(default, rename = "fFamily")]
    pub family: Option<String>,
    #[serde(default, rename = "fStyle")]
    pub style: Option<String>,
    #[serde(default)]
    pub ascent: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Marker {
    #[serde(default)]
    pub cm: Option<String>,
    #[serde(default)]
    pub tm: f32,
    #[serde(default)]
    pub dr: f32,
}

// Text

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TextData {
    pub d: Property<TextDocument>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct TextDocument {
    #[serde(default)]
    pub t: String,
    #[serde(default)]
    pub f: String,
    #[serde(default)]
    pub s: f32,
    #[serde(default)]
    pub j: u8, // 0 left, 1 right, 2 center
    #[serde(default)]
    pub tr: f32,
    #[serde(default)]
    pub lh: Option<f32>,
    #[serde(default)]
    pub fc: Option<Vector>,
    #[serde(default)]
    pub sc: Option<Vector>,
    #[serde(default)]
    pub sw: Option<f32>,
}
