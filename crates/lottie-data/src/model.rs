use serde::de::{DeserializeOwned, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LottieJson {
    pub v: Option<String>,
    #[serde(default)]
    pub nm: Option<String>,
    pub ip: f32,
    pub op: f32,
    pub fr: f32,
    pub w: u32,
    pub h: u32,
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub markers: Vec<Marker>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Layer {
    #[serde(default)]
    pub ty: u8, // 3 = null, 4 = shape
    #[serde(default)]
    pub ind: Option<u32>,
    #[serde(default)]
    pub parent: Option<u32>,
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub ip: f32,
    #[serde(default)]
    pub op: f32,
    #[serde(default)]
    pub st: f32,
    #[serde(default = "default_one")]
    pub sr: f32, // Time stretch (1.0 = normal, >1 = slower)
    #[serde(default)]
    pub ks: Transform,
    #[serde(default)]
    pub hd: Option<bool>,
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

fn default_one() -> f32 {
    1.0
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
    #[serde(rename = "sh")]
    Path(PathShape),
    #[serde(rename = "tm")]
    Trim(TrimShape),
    #[serde(rename = "sr")]
    Polystar(PolystarShape),
    #[serde(rename = "rp")]
    Repeater(RepeaterShape),
    #[serde(rename = "mm")]
    MergePaths(MergePathsShape),
    #[serde(other)]
    Unknown,
}

/// Name and visibility carried by every content item except transforms.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ItemHeader {
    #[serde(default)]
    pub nm: Option<String>,
    #[serde(default)]
    pub hd: Option<bool>,
}

impl Shape {
    pub fn header(&self) -> Option<&ItemHeader> {
        Some(match self {
            Shape::Group(s) => &s.item,
            Shape::Rect(s) => &s.item,
            Shape::Ellipse(s) => &s.item,
            Shape::Fill(s) => &s.item,
            Shape::Stroke(s) => &s.item,
            Shape::GradientFill(s) => &s.item,
            Shape::GradientStroke(s) => &s.item,
            Shape::Path(s) => &s.item,
            Shape::Trim(s) => &s.item,
            Shape::Polystar(s) => &s.item,
            Shape::Repeater(s) => &s.item,
            Shape::MergePaths(s) => &s.item,
            Shape::Transform(_) | Shape::Unknown => return None,
        })
    }

    /// The `nm` of the item, if it carries one.
    pub fn name(&self) -> Option<&str> {
        self.header().and_then(|h| h.nm.as_deref())
    }

    pub fn is_hidden(&self) -> bool {
        self.header().and_then(|h| h.hd).unwrap_or(false)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MergePathsShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    #[serde(default = "default_merge_mode")]
    pub mm: u8, // 1 merge, 2 add, 3 subtract, 4 intersect, 5 exclude intersections
}

fn default_merge_mode() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PolystarShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    #[serde(default)]
    pub p: PositionProperty,
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
    #[serde(default)]
    pub d: Option<u8>,
}

fn default_star() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RepeaterShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    pub c: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub m: u8,
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
pub struct GroupShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    #[serde(default)]
    pub it: Vec<Shape>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RectShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    pub s: Property<Vec2>,
    #[serde(default)]
    pub p: Property<Vec2>,
    #[serde(default)]
    pub r: Property<f32>,
    #[serde(default)]
    pub d: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EllipseShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    pub s: Property<Vec2>,
    #[serde(default)]
    pub p: Property<Vec2>,
    #[serde(default)]
    pub d: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FillShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    /// RGB or RGBA, components in 0..1
    pub c: Property<Vec<f32>>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StrokeShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    pub c: Property<Vec<f32>>,
    pub w: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DashProperty {
    pub n: Option<String>,
    pub v: Property<f32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientFillShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    #[serde(default)]
    pub o: Property<f32>,
    pub s: Property<Vec2>,
    pub e: Property<Vec2>,
    #[serde(default = "default_linear")]
    pub t: u8, // 1 linear, 2 radial
    pub g: GradientColors,
    #[serde(default)]
    pub r: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GradientStrokeShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    #[serde(default)]
    pub o: Property<f32>,
    pub w: Property<f32>,
    pub s: Property<Vec2>,
    pub e: Property<Vec2>,
    #[serde(default = "default_linear")]
    pub t: u8,
    pub g: GradientColors,
    #[serde(default)]
    pub lc: u8,
    #[serde(default)]
    pub lj: u8,
    #[serde(default)]
    pub ml: Option<f32>,
    #[serde(default)]
    pub d: Vec<DashProperty>,
}

fn default_linear() -> u8 {
    1
}

/// `p` colour stops of `[t, r, g, b]` followed by optional `[t, a]` alpha stops.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GradientColors {
    pub p: u32,
    pub k: Property<Vec<f32>>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PathShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    pub ks: Property<BezierPath>,
    #[serde(default)]
    pub d: Option<u8>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrimShape {
    #[serde(flatten)]
    pub item: ItemHeader,
    #[serde(default)]
    pub s: Property<f32>,
    #[serde(default)]
    pub e: Property<f32>,
    #[serde(default)]
    pub o: Property<f32>,
    #[serde(default = "default_simultaneous")]
    pub m: u8, // 1 simultaneously, 2 individually
}

fn default_simultaneous() -> u8 {
    1
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TransformShape {
    #[serde(flatten)]
    pub t: Transform,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Transform {
    #[serde(default)]
    pub a: Property<Vec3DefaultZero>, // Anchor
    #[serde(default)]
    pub p: PositionProperty,
    #[serde(default)]
    pub s: Property<Vec3Scale>, // Scale in percent
    #[serde(default, alias = "r")]
    pub rz: Property<f32>, // Rotation in degrees
    #[serde(default)]
    pub sk: Property<f32>, // Skew amount in degrees
    #[serde(default)]
    pub sa: Property<f32>, // Skew axis in degrees (0 = X axis, 90 = Y axis)
    #[serde(default)]
    pub o: Property<f32>, // Opacity 0..100
}

#[derive(Debug, Serialize, Clone)]
#[serde(untagged)]
pub enum PositionProperty {
    Unified(Property<Vec3DefaultZero>),
    Split {
        x: Property<f32>,
        y: Property<f32>,
        z: Option<Property<f32>>,
    },
}

impl<'de> Deserialize<'de> for PositionProperty {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct SplitFields {
            #[serde(default)]
            x: Property<f32>,
            #[serde(default)]
            y: Property<f32>,
            #[serde(default)]
            z: Option<Property<f32>>,
        }

        let v = serde_json::Value::deserialize(deserializer)?;
        // Split positions are flagged with `"s": true` and carry no `k`.
        let is_split = v.get("s").and_then(|s| s.as_bool()).unwrap_or(false)
            || (v.get("k").is_none() && v.get("x").is_some());
        if is_split {
            let f: SplitFields = serde_json::from_value(v).map_err(serde::de::Error::custom)?;
            return Ok(PositionProperty::Split {
                x: f.x,
                y: f.y,
                z: f.z,
            });
        }
        serde_json::from_value(v)
            .map(PositionProperty::Unified)
            .map_err(serde::de::Error::custom)
    }
}

impl Default for PositionProperty {
    fn default() -> Self {
        PositionProperty::Unified(Property::default())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Property<T> {
    #[serde(default)]
    pub a: u8,
    #[serde(default)]
    #[serde(bound(deserialize = "T: DeserializeOwned"))]
    pub k: Value<T>,
    #[serde(default)]
    pub ix: Option<u32>,
}

impl<T> Default for Property<T> {
    fn default() -> Self {
        Property {
            a: 0,
            k: Value::Default,
            ix: None,
        }
    }
}

impl<T> Property<T> {
    pub fn fixed(value: T) -> Self {
        Property {
            a: 0,
            k: Value::Static(value),
            ix: None,
        }
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

        // Keyframe lists are arrays of objects; a static vector is an array of numbers.
        let looks_keyframed = v
            .as_array()
            .and_then(|items| items.first())
            .is_some_and(|first| first.is_object());
        if looks_keyframed {
            let keyframes =
                serde_json::from_value::<Vec<Keyframe<T>>>(v).map_err(serde::de::Error::custom)?;
            return Ok(Value::Animated(keyframes));
        }

        Ok(scalar_or_first(v).map_or(Value::Default, Value::Static))
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

fn deserialize_keyframe_value<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(scalar_or_first(serde_json::Value::deserialize(deserializer)?))
}

/// Exporters wrap scalars in one-element arrays (`[42]`); accept both forms.
fn scalar_or_first<T: DeserializeOwned>(v: serde_json::Value) -> Option<T> {
    if v.is_null() {
        return None;
    }
    match serde_json::from_value(v.clone()) {
        Ok(value) => Some(value),
        Err(_) => serde_json::from_value::<Vec<T>>(v)
            .ok()
            .and_then(|items| items.into_iter().next()),
    }
}

pub type Vec2 = [f32; 2];
pub type Vec3 = [f32; 3];

/// Bezier tangent control points for keyframe easing.
/// Matches `{"x": [0.48], "y": [1]}` as well as the scalar form `{"x": 0.48, "y": 1}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
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

/// A 2D or 3D vector whose missing components read as `FILL`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PaddedVec3<const FILL: i16>(pub Vec3);

/// Anchor and position vectors: missing components are 0.
pub type Vec3DefaultZero = PaddedVec3<0>;
/// Scale vectors in percent: missing components are 100.
pub type Vec3Scale = PaddedVec3<100>;

impl<const FILL: i16> Default for PaddedVec3<FILL> {
    fn default() -> Self {
        PaddedVec3([FILL as f32; 3])
    }
}

impl<'de, const FILL: i16> Deserialize<'de> for PaddedVec3<FILL> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PaddedVisitor<const FILL: i16>;
        impl<'de, const FILL: i16> Visitor<'de> for PaddedVisitor<FILL> {
            type Value = PaddedVec3<FILL>;
            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a sequence of 2 or 3 floats")
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut out = [FILL as f32; 3];
                for slot in &mut out {
                    match seq.next_element()? {
                        Some(v) => *slot = v,
                        None => break,
                    }
                }
                // Trailing components beyond z are ignored.
                while seq.next_element::<f32>()?.is_some() {}
                Ok(PaddedVec3(out))
            }
        }
        deserializer.deserialize_seq(PaddedVisitor::<FILL>)
    }
}

/// Vertex, in-tangent and out-tangent lists. Tangents are relative to their vertex.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct BezierPath {
    #[serde(default)]
    pub c: bool,
    #[serde(default)]
    pub i: Vec<Vec2>,
    #[serde(default)]
    pub o: Vec<Vec2>,
    #[serde(default)]
    pub v: Vec<Vec2>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Marker {
    #[serde(default)]
    pub cm: Option<String>,
    #[serde(default)]
    pub tm: f32,
    #[serde(default)]
    pub dr: f32,
}
