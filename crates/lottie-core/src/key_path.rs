//! Addressing animated properties by name.
//!
//! A key path is a list of names, one per nesting level: layer, then groups,
//! then a content item. `*` matches exactly one level and `**` matches any
//! number of levels, including none.

use crate::animatable::{FrameInfo, ValueFn};
use crate::content::ContentId;
use crate::error::{LottieError, Result};
use crate::surface::ColorFilter;
use glam::{Vec2, Vec4};
use std::fmt;
use std::rc::Rc;

const WILDCARD: &str = "*";
const GLOBSTAR: &str = "**";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    keys: Vec<String>,
}

impl KeyPath {
    pub fn new<I, S>(keys: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        if keys.is_empty() {
            return Err(LottieError::InvalidKeyPath("empty key path".into()));
        }
        if let Some(empty) = keys.iter().position(|k| k.is_empty()) {
            return Err(LottieError::InvalidKeyPath(format!(
                "key {} is empty",
                empty
            )));
        }
        Ok(Self { keys })
    }

    /// Parses a dotted path such as `"Layer.**.Fill 1"`.
    pub fn parse(path: &str) -> Result<Self> {
        Self::new(path.split('.'))
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    fn ends_with_globstar(&self) -> bool {
        self.keys.last().is_some_and(|k| k == GLOBSTAR)
    }

    /// Whether an element named `key` at `depth` is on a matching route.
    pub(crate) fn matches(&self, key: &str, depth: usize) -> bool {
        match self.keys.get(depth) {
            Some(k) => k == key || k == WILDCARD || k == GLOBSTAR,
            None => false,
        }
    }

    /// How far the match advances after consuming `key` at `depth`.
    pub(crate) fn increment_depth_by(&self, key: &str, depth: usize) -> usize {
        if self.keys[depth] != GLOBSTAR {
            return 1;
        }
        if depth == self.keys.len() - 1 {
            return 0;
        }
        if self.keys[depth + 1] == key {
            return 2;
        }
        0
    }

    /// Whether an element named `key` at `depth` is a final target.
    pub(crate) fn fully_resolves_to(&self, key: &str, depth: usize) -> bool {
        let len = self.keys.len();
        if depth >= len {
            return false;
        }
        let is_last = depth == len - 1;
        let at_depth = &self.keys[depth];
        if at_depth != GLOBSTAR {
            let matches = at_depth == key || at_depth == WILDCARD;
            return (is_last || (depth == len - 2 && self.ends_with_globstar())) && matches;
        }

        let next_matches = !is_last && self.keys[depth + 1] == key;
        if next_matches {
            return depth == len - 2 || (depth == len - 3 && self.ends_with_globstar());
        }
        if is_last {
            return true;
        }
        if depth + 1 < len - 1 {
            return false;
        }
        self.keys[depth + 1] == key
    }

    /// Whether the walk should descend into the children of `key` at `depth`.
    pub(crate) fn propagate_to_children(&self, _key: &str, depth: usize) -> bool {
        depth < self.keys.len() - 1 || self.keys[depth] == GLOBSTAR
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys.join("."))
    }
}

/// The element a resolved key path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPathTarget {
    Layer(usize),
    Content(ContentId),
}

/// A concrete key path (no wildcards) together with its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKeyPath {
    pub path: KeyPath,
    pub target: KeyPathTarget,
}

/// Properties that can be overridden with a [`ValueCallback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LottieProperty {
    /// Fill or stroke opacity, 0..100.
    Opacity,
    /// Fill color.
    Color,
    StrokeColor,
    StrokeWidth,
    ColorFilter,
    EllipseSize,
    RectangleSize,
    CornerRadius,
    /// Position of an ellipse, rectangle or polystar.
    Position,
    PolystarPoints,
    PolystarRotation,
    PolystarInnerRadius,
    PolystarOuterRadius,
    PolystarInnerRoundedness,
    PolystarOuterRoundedness,
    RepeaterCopies,
    RepeaterOffset,
    TrimStart,
    TrimEnd,
    TrimOffset,
    TransformAnchorPoint,
    TransformPosition,
    /// 1.0 = 100%
    TransformScale,
    TransformRotation,
    TransformSkew,
    TransformSkewAngle,
    TransformOpacity,
    TransformStartOpacity,
    TransformEndOpacity,
}

impl LottieProperty {
    fn expected(self) -> &'static str {
        match self {
            LottieProperty::Color | LottieProperty::StrokeColor => "color",
            LottieProperty::ColorFilter => "color filter",
            LottieProperty::EllipseSize
            | LottieProperty::RectangleSize
            | LottieProperty::Position
            | LottieProperty::TransformAnchorPoint
            | LottieProperty::TransformPosition
            | LottieProperty::TransformScale => "point",
            _ => "float",
        }
    }
}

/// An override for one property. Float, point and color callbacks receive the
/// keyframe context and return the value to use; a color filter is a constant.
#[derive(Clone)]
pub enum ValueCallback {
    Float(ValueFn<f32>),
    Point(ValueFn<Vec2>),
    Color(ValueFn<Vec4>),
    ColorFilter(Option<ColorFilter>),
}

impl fmt::Debug for ValueCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCallback::Float(_) => f.write_str("ValueCallback::Float(..)"),
            ValueCallback::Point(_) => f.write_str("ValueCallback::Point(..)"),
            ValueCallback::Color(_) => f.write_str("ValueCallback::Color(..)"),
            ValueCallback::ColorFilter(c) => write!(f, "ValueCallback::ColorFilter({:?})", c),
        }
    }
}

impl ValueCallback {
    pub fn float(f: impl Fn(&FrameInfo<f32>) -> f32 + 'static) -> Self {
        ValueCallback::Float(Rc::new(f))
    }

    pub fn point(f: impl Fn(&FrameInfo<Vec2>) -> Vec2 + 'static) -> Self {
        ValueCallback::Point(Rc::new(f))
    }

    pub fn color(f: impl Fn(&FrameInfo<Vec4>) -> Vec4 + 'static) -> Self {
        ValueCallback::Color(Rc::new(f))
    }

    pub fn constant_float(value: f32) -> Self {
        Self::float(move |_| value)
    }

    pub fn constant_point(value: Vec2) -> Self {
        Self::point(move |_| value)
    }

    pub fn constant_color(value: Vec4) -> Self {
        Self::color(move |_| value)
    }

    /// Validates `callback` against `property`, before any target is touched.
    pub(crate) fn check(property: LottieProperty, callback: Option<&ValueCallback>) -> Result<()> {
        let ok = match callback {
            None => true,
            Some(ValueCallback::Float(_)) => property.expected() == "float",
            Some(ValueCallback::Point(_)) => property.expected() == "point",
            Some(ValueCallback::Color(_)) => property.expected() == "color",
            Some(ValueCallback::ColorFilter(_)) => property == LottieProperty::ColorFilter,
        };
        if ok {
            Ok(())
        } else {
            Err(LottieError::PropertyTypeMismatch {
                property,
                expected: property.expected(),
            })
        }
    }

    pub(crate) fn float_fn(
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<Option<ValueFn<f32>>> {
        match callback {
            None => Ok(None),
            Some(ValueCallback::Float(f)) => Ok(Some(Rc::clone(f))),
            Some(_) => Err(LottieError::PropertyTypeMismatch {
                property,
                expected: "float",
            }),
        }
    }

    pub(crate) fn point_fn(
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<Option<ValueFn<Vec2>>> {
        match callback {
            None => Ok(None),
            Some(ValueCallback::Point(f)) => Ok(Some(Rc::clone(f))),
            Some(_) => Err(LottieError::PropertyTypeMismatch {
                property,
                expected: "point",
            }),
        }
    }

    pub(crate) fn color_fn(
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<Option<ValueFn<Vec4>>> {
        match callback {
            None => Ok(None),
            Some(ValueCallback::Color(f)) => Ok(Some(Rc::clone(f))),
            Some(_) => Err(LottieError::PropertyTypeMismatch {
                property,
                expected: "color",
            }),
        }
    }

    /// The filter to install; `None` both for a cleared callback and for
    /// `ColorFilter(None)`.
    pub(crate) fn color_filter(
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<Option<ColorFilter>> {
        match callback {
            None => Ok(None),
            Some(ValueCallback::ColorFilter(filter)) => Ok(*filter),
            Some(_) => Err(LottieError::PropertyTypeMismatch {
                property,
                expected: "color filter",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kp(s: &str) -> KeyPath {
        KeyPath::parse(s).unwrap()
    }

    #[test]
    fn test_exact_path() {
        let p = kp("Layer.Group.Fill");
        assert!(p.matches("Layer", 0));
        assert!(!p.fully_resolves_to("Layer", 0));
        assert!(p.propagate_to_children("Layer", 0));
        assert_eq!(p.increment_depth_by("Layer", 0), 1);
        assert!(p.fully_resolves_to("Fill", 2));
        assert!(!p.fully_resolves_to("Stroke", 2));
    }

    #[test]
    fn test_single_wildcard() {
        let p = kp("*.Fill");
        assert!(p.matches("Anything", 0));
        assert!(p.fully_resolves_to("Fill", 1));
        assert!(!p.fully_resolves_to("Fill", 2));
    }

    #[test]
    fn test_globstar() {
        let p = kp("**.Fill");
        assert!(p.matches("Layer", 0));
        assert!(p.propagate_to_children("Group", 0));
        assert_eq!(p.increment_depth_by("Group", 0), 0);
        assert_eq!(p.increment_depth_by("Fill", 0), 2);
        assert!(p.fully_resolves_to("Fill", 0));
        assert!(!p.fully_resolves_to("Stroke", 0));

        let all = kp("Layer.**");
        assert!(all.fully_resolves_to("Layer", 0));
        assert!(all.fully_resolves_to("Deep", 1));
    }

    #[test]
    fn test_invalid_paths() {
        assert!(matches!(KeyPath::parse(""), Err(LottieError::InvalidKeyPath(_))));
        assert!(matches!(KeyPath::parse("a..b"), Err(LottieError::InvalidKeyPath(_))));
    }

    #[test]
    fn test_callback_type_checks() {
        let cb = ValueCallback::constant_float(1.0);
        assert!(ValueCallback::check(LottieProperty::Opacity, Some(&cb)).is_ok());
        assert!(matches!(
            ValueCallback::check(LottieProperty::Color, Some(&cb)),
            Err(LottieError::PropertyTypeMismatch { .. })
        ));
        assert!(ValueCallback::check(LottieProperty::Color, None).is_ok());
    }
}
