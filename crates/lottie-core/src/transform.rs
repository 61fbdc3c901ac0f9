use crate::animatable::{AnimatedValue, FrameContext};
use crate::key_path::{LottieProperty, ValueCallback};
use crate::Result;
use glam::{Mat3, Vec2, Vec3};
use lottie_data::model as data;

#[derive(Debug)]
pub(crate) enum Position {
    Unified(AnimatedValue<Vec2>),
    Split {
        x: AnimatedValue<f32>,
        y: AnimatedValue<f32>,
    },
}

impl Position {
    pub(crate) fn from_data(p: &data::PositionProperty, samples: usize) -> Result<Self> {
        let xy = |v: &data::Vec3DefaultZero| Vec2::new(v.0[0], v.0[1]);
        Ok(match p {
            data::PositionProperty::Unified(p) => {
                Position::Unified(AnimatedValue::from_property("p", p, xy, Vec2::ZERO, samples)?)
            }
            data::PositionProperty::Split { x, y, .. } => Position::Split {
                x: AnimatedValue::from_property("p.x", x, |v| *v, 0.0, samples)?,
                y: AnimatedValue::from_property("p.y", y, |v| *v, 0.0, samples)?,
            },
        })
    }

    /// Overrides a unified position. Split positions have no single point
    /// value and report false.
    pub(crate) fn set_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match self {
            Position::Unified(p) => {
                p.set_callback(ValueCallback::point_fn(property, callback)?);
                Ok(true)
            }
            Position::Split { .. } => {
                tracing::warn!(?property, "point callbacks are not supported on split positions");
                Ok(false)
            }
        }
    }

    pub(crate) fn get(&self) -> Vec2 {
        match self {
            Position::Unified(p) => p.get(),
            Position::Split { x, y } => Vec2::new(x.get(), y.get()),
        }
    }

    pub(crate) fn set_frame(&mut self, ctx: FrameContext) -> bool {
        match self {
            Position::Unified(p) => p.set_frame(ctx),
            Position::Split { x, y } => x.set_frame(ctx) | y.set_frame(ctx),
        }
    }

    pub(crate) fn version(&self) -> u64 {
        match self {
            Position::Unified(p) => p.version(),
            Position::Split { x, y } => x.version() + y.version(),
        }
    }
}

/// Animated 2D affine transform of a layer, group or repeater.
///
/// The composed matrix is `T(position) · T(-anchor) · R(rotation) · Skew · S(scale)`:
/// scale, skew and rotation happen about the origin, then the result is offset
/// by position minus anchor.
#[derive(Debug)]
pub struct TransformAnimation {
    anchor: AnimatedValue<Vec2>,
    position: Position,
    /// 1.0 = 100%
    scale: AnimatedValue<Vec2>,
    /// Degrees, clockwise on screen.
    rotation: AnimatedValue<f32>,
    skew: AnimatedValue<f32>,
    skew_axis: AnimatedValue<f32>,
    /// 0..100
    opacity: AnimatedValue<f32>,
    start_opacity: Option<AnimatedValue<f32>>,
    end_opacity: Option<AnimatedValue<f32>>,
    matrix: Mat3,
}

impl TransformAnimation {
    pub fn from_data(ks: &data::Transform, samples: usize) -> Result<Self> {
        let xy = |v: &data::Vec3DefaultZero| Vec2::new(v.0[0], v.0[1]);
        let position = Position::from_data(&ks.p, samples)?;
        let mut transform = Self {
            anchor: AnimatedValue::from_property("a", &ks.a, xy, Vec2::ZERO, samples)?,
            position,
            scale: AnimatedValue::from_property(
                "s",
                &ks.s,
                |v| Vec2::new(v.0[0], v.0[1]) / 100.0,
                Vec2::ONE,
                samples,
            )?,
            rotation: AnimatedValue::from_property("r", &ks.rz, |v| *v, 0.0, samples)?,
            skew: AnimatedValue::from_property("sk", &ks.sk, |v| *v, 0.0, samples)?,
            skew_axis: AnimatedValue::from_property("sa", &ks.sa, |v| *v, 0.0, samples)?,
            opacity: AnimatedValue::from_property("o", &ks.o, |v| *v, 100.0, samples)?,
            start_opacity: None,
            end_opacity: None,
            matrix: Mat3::IDENTITY,
        };
        transform.matrix = transform.compose();
        Ok(transform)
    }

    pub fn from_repeater(tr: &data::RepeaterTransform, samples: usize) -> Result<Self> {
        let mut transform = Self::from_data(&tr.t, samples)?;
        transform.start_opacity =
            Some(AnimatedValue::from_property("so", &tr.so, |v| *v, 100.0, samples)?);
        transform.end_opacity =
            Some(AnimatedValue::from_property("eo", &tr.eo, |v| *v, 100.0, samples)?);
        Ok(transform)
    }

    /// Advances every component. Returns true when anything changed.
    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        let mut changed = self.anchor.set_frame(ctx);
        changed |= self.position.set_frame(ctx);
        changed |= self.scale.set_frame(ctx);
        changed |= self.rotation.set_frame(ctx);
        changed |= self.skew.set_frame(ctx);
        changed |= self.skew_axis.set_frame(ctx);
        changed |= self.opacity.set_frame(ctx);
        if let Some(so) = &mut self.start_opacity {
            changed |= so.set_frame(ctx);
        }
        if let Some(eo) = &mut self.end_opacity {
            changed |= eo.set_frame(ctx);
        }
        if changed {
            self.matrix = self.compose();
        }
        changed
    }

    pub fn version(&self) -> u64 {
        let mut v = self.anchor.version()
            + self.position.version()
            + self.scale.version()
            + self.rotation.version()
            + self.skew.version()
            + self.skew_axis.version()
            + self.opacity.version();
        if let Some(so) = &self.start_opacity {
            v += so.version();
        }
        if let Some(eo) = &self.end_opacity {
            v += eo.version();
        }
        v
    }

    pub fn matrix(&self) -> Mat3 {
        self.matrix
    }

    /// 0..100
    pub fn opacity(&self) -> f32 {
        self.opacity.get()
    }

    pub fn start_opacity(&self) -> f32 {
        self.start_opacity.as_ref().map_or(100.0, |v| v.get())
    }

    pub fn end_opacity(&self) -> f32 {
        self.end_opacity.as_ref().map_or(100.0, |v| v.get())
    }

    fn compose(&self) -> Mat3 {
        let anchor = self.anchor.get();
        let mat_t = Mat3::from_translation(self.position.get());
        let mat_r = Mat3::from_angle(self.rotation.get().to_radians());
        let mat_skew = skew_matrix(self.skew.get(), self.skew_axis.get());
        let mat_s = Mat3::from_scale(self.scale.get());
        let mat_a = Mat3::from_translation(-anchor);
        mat_t * mat_a * mat_r * mat_skew * mat_s
    }

    /// Matrix of one repeater step: translate by position, then rotate and
    /// scale about the anchor.
    fn repeater_step(&self) -> Mat3 {
        let anchor = self.anchor.get();
        Mat3::from_translation(self.position.get())
            * Mat3::from_translation(anchor)
            * Mat3::from_angle(self.rotation.get().to_radians())
            * Mat3::from_scale(self.scale.get())
            * Mat3::from_translation(-anchor)
    }

    /// The step matrix raised to `trunc(amount)`. Negative amounts use the inverse.
    pub fn matrix_for_repeater(&self, amount: f32) -> Mat3 {
        let steps = amount.trunc() as i32;
        let step = if steps < 0 {
            self.repeater_step().inverse()
        } else {
            self.repeater_step()
        };
        let mut m = Mat3::IDENTITY;
        for _ in 0..steps.unsigned_abs() {
            m *= step;
        }
        m
    }

    /// Routes a transform property override. Returns false when `property` is
    /// not a transform property.
    pub fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match property {
            LottieProperty::TransformAnchorPoint => {
                self.anchor.set_callback(ValueCallback::point_fn(property, callback)?)
            }
            LottieProperty::TransformPosition => return self.position.set_callback(property, callback),
            LottieProperty::TransformScale => {
                self.scale.set_callback(ValueCallback::point_fn(property, callback)?)
            }
            LottieProperty::TransformRotation => {
                self.rotation.set_callback(ValueCallback::float_fn(property, callback)?)
            }
            LottieProperty::TransformSkew => {
                self.skew.set_callback(ValueCallback::float_fn(property, callback)?)
            }
            LottieProperty::TransformSkewAngle => {
                self.skew_axis.set_callback(ValueCallback::float_fn(property, callback)?)
            }
            LottieProperty::TransformOpacity => {
                self.opacity.set_callback(ValueCallback::float_fn(property, callback)?)
            }
            LottieProperty::TransformStartOpacity => match &mut self.start_opacity {
                Some(v) => v.set_callback(ValueCallback::float_fn(property, callback)?),
                None => return Ok(false),
            },
            LottieProperty::TransformEndOpacity => match &mut self.end_opacity {
                Some(v) => v.set_callback(ValueCallback::float_fn(property, callback)?),
                None => return Ok(false),
            },
            _ => return Ok(false),
        }
        Ok(true)
    }
}

fn skew_matrix(skew_deg: f32, axis_deg: f32) -> Mat3 {
    if skew_deg == 0.0 {
        return Mat3::IDENTITY;
    }
    let axis = axis_deg.to_radians();
    let shear = Mat3::from_cols(
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new((-skew_deg.to_radians()).tan(), 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    );
    Mat3::from_angle(axis) * shear * Mat3::from_angle(-axis)
}

/// Uniform scale factor of a matrix: the mapped length of a unit diagonal.
pub fn matrix_scale(m: Mat3) -> f32 {
    let p0 = m.transform_point2(Vec2::ZERO);
    let p1 = m.transform_point2(Vec2::splat(std::f32::consts::FRAC_1_SQRT_2));
    (p1 - p0).length()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transform(value: serde_json::Value) -> TransformAnimation {
        let ks: data::Transform = serde_json::from_value(value).unwrap();
        let mut t = TransformAnimation::from_data(&ks, 64).unwrap();
        t.set_frame(FrameContext {
            frame: 0.0,
            progress: 0.0,
        });
        t
    }

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_translate_scale_anchor() {
        let t = transform(json!({
            "a": {"k": [10, 10, 0]},
            "p": {"k": [100, 50, 0]},
            "s": {"k": [200, 200, 100]}
        }));
        // Scale about the origin, then offset by position - anchor.
        assert!(close(t.matrix().transform_point2(Vec2::new(10.0, 10.0)), Vec2::new(110.0, 60.0)));
        assert!(close(t.matrix().transform_point2(Vec2::new(11.0, 10.0)), Vec2::new(112.0, 60.0)));
        assert!(close(t.matrix().transform_point2(Vec2::ZERO), Vec2::new(90.0, 40.0)));
    }

    #[test]
    fn test_anchor_offset_applies_after_rotation() {
        let t = transform(json!({
            "a": {"k": [5, 0, 0]},
            "p": {"k": [20, 0, 0]},
            "r": {"k": 90}
        }));
        // (1, 0) rotates onto (0, 1), then shifts by (20 - 5, 0).
        assert!(close(t.matrix().transform_point2(Vec2::X), Vec2::new(15.0, 1.0)));
    }

    #[test]
    fn test_rotation_is_clockwise_on_screen() {
        let t = transform(json!({"r": {"k": 90}}));
        // +x rotates onto +y (down) in a y-down coordinate system.
        assert!(close(t.matrix().transform_point2(Vec2::X), Vec2::Y));
    }

    #[test]
    fn test_split_position() {
        let t = transform(json!({"p": {"s": true, "x": {"k": 5}, "y": {"k": 7}}}));
        assert!(close(t.matrix().transform_point2(Vec2::ZERO), Vec2::new(5.0, 7.0)));
    }

    #[test]
    fn test_repeater_powers() {
        let tr: data::RepeaterTransform = serde_json::from_value(json!({
            "p": {"k": [10, 0]},
            "so": {"k": 100},
            "eo": {"k": 0}
        }))
        .unwrap();
        let t = TransformAnimation::from_repeater(&tr, 64).unwrap();
        assert!(close(t.matrix_for_repeater(0.0).transform_point2(Vec2::ZERO), Vec2::ZERO));
        assert!(close(t.matrix_for_repeater(2.0).transform_point2(Vec2::ZERO), Vec2::new(20.0, 0.0)));
        assert!(close(t.matrix_for_repeater(2.7).transform_point2(Vec2::ZERO), Vec2::new(20.0, 0.0)));
        assert!(close(t.matrix_for_repeater(-1.0).transform_point2(Vec2::ZERO), Vec2::new(-10.0, 0.0)));
        assert_eq!(t.end_opacity(), 0.0);
    }

    #[test]
    fn test_repeater_step_pivots_on_anchor() {
        let tr: data::RepeaterTransform = serde_json::from_value(json!({
            "a": {"k": [10, 0]},
            "r": {"k": 90},
            "s": {"k": [200, 200]}
        }))
        .unwrap();
        let t = TransformAnimation::from_repeater(&tr, 64).unwrap();
        let one = t.matrix_for_repeater(1.0);
        let two = t.matrix_for_repeater(2.0);
        // The anchor is the fixed point of every step.
        assert!(close(one.transform_point2(Vec2::new(10.0, 0.0)), Vec2::new(10.0, 0.0)));
        assert!(close(two.transform_point2(Vec2::new(10.0, 0.0)), Vec2::new(10.0, 0.0)));
        // Each step doubles the distance to the anchor and turns it a quarter.
        assert!(close(one.transform_point2(Vec2::new(20.0, 0.0)), Vec2::new(10.0, 20.0)));
        assert!(close(two.transform_point2(Vec2::new(20.0, 0.0)), Vec2::new(-30.0, 0.0)));
        assert!(close(
            t.matrix_for_repeater(-1.0).transform_point2(Vec2::new(10.0, 20.0)),
            Vec2::new(20.0, 0.0)
        ));
    }

    #[test]
    fn test_matrix_scale() {
        assert!((matrix_scale(Mat3::from_scale(Vec2::splat(3.0))) - 3.0).abs() < 1e-5);
        assert!((matrix_scale(Mat3::from_translation(Vec2::new(5.0, 5.0))) - 1.0).abs() < 1e-5);
    }
}
