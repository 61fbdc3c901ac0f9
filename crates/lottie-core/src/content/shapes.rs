use super::ContentId;
use crate::animatable::{vec2, AnimatedValue, FrameContext};
use crate::key_path::{LottieProperty, ValueCallback};
use crate::transform::Position;
use crate::Result;
use glam::Vec2;
use kurbo::{Arc, BezPath, Point};
use lottie_data::model::{self as data, BezierPath};
use std::f64::consts::{FRAC_PI_2, PI};

const ELLIPSE_CONTROL_POINT_PERCENTAGE: f32 = 0.55228;
const POLYSTAR_MAGIC_NUMBER: f32 = 0.47829;
const POLYGON_MAGIC_NUMBER: f32 = 0.25;

/// Something that can write its outline into a path buffer.
pub trait PathGenerator {
    fn set_frame(&mut self, ctx: FrameContext) -> bool;
    fn version(&self) -> u64;
    fn build_path(&self, out: &mut BezPath);
    fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool>;
}

/// A path-producing leaf together with the simultaneous trims that apply to it.
#[derive(Debug)]
pub struct ShapeContent {
    pub geometry: Geometry,
    pub(crate) trims: Vec<ContentId>,
}

impl ShapeContent {
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            trims: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub enum Geometry {
    Ellipse(EllipseGeometry),
    Rect(RectGeometry),
    Polystar(PolystarGeometry),
    Bezier(BezierGeometry),
}

impl Geometry {
    fn inner(&self) -> &dyn PathGenerator {
        match self {
            Geometry::Ellipse(g) => g,
            Geometry::Rect(g) => g,
            Geometry::Polystar(g) => g,
            Geometry::Bezier(g) => g,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn PathGenerator {
        match self {
            Geometry::Ellipse(g) => g,
            Geometry::Rect(g) => g,
            Geometry::Polystar(g) => g,
            Geometry::Bezier(g) => g,
        }
    }
}

impl PathGenerator for Geometry {
    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.inner_mut().set_frame(ctx)
    }

    fn version(&self) -> u64 {
        self.inner().version()
    }

    fn build_path(&self, out: &mut BezPath) {
        self.inner().build_path(out)
    }

    fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        self.inner_mut().apply_value_callback(property, callback)
    }
}

fn pt(x: f32, y: f32) -> Point {
    Point::new(x as f64, y as f64)
}

#[derive(Debug)]
pub struct EllipseGeometry {
    size: AnimatedValue<Vec2>,
    position: AnimatedValue<Vec2>,
    reversed: bool,
}

impl EllipseGeometry {
    pub fn from_data(el: &data::EllipseShape, samples: usize) -> Result<Self> {
        Ok(Self {
            size: AnimatedValue::from_property("s", &el.s, vec2, Vec2::ZERO, samples)?,
            position: AnimatedValue::from_property("p", &el.p, vec2, Vec2::ZERO, samples)?,
            reversed: el.d == Some(3),
        })
    }
}

impl PathGenerator for EllipseGeometry {
    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.size.set_frame(ctx) | self.position.set_frame(ctx)
    }

    fn version(&self) -> u64 {
        self.size.version() + self.position.version()
    }

    fn build_path(&self, out: &mut BezPath) {
        let size = self.size.get();
        let p = self.position.get();
        let hw = size.x / 2.0;
        let hh = size.y / 2.0;
        let cpw = hw * ELLIPSE_CONTROL_POINT_PERCENTAGE;
        let cph = hh * ELLIPSE_CONTROL_POINT_PERCENTAGE;
        let at = |x: f32, y: f32| pt(p.x + x, p.y + y);

        // Starts at the top; clockwise unless reversed.
        out.move_to(at(0.0, -hh));
        if self.reversed {
            out.curve_to(at(-cpw, -hh), at(-hw, -cph), at(-hw, 0.0));
            out.curve_to(at(-hw, cph), at(-cpw, hh), at(0.0, hh));
            out.curve_to(at(cpw, hh), at(hw, cph), at(hw, 0.0));
            out.curve_to(at(hw, -cph), at(cpw, -hh), at(0.0, -hh));
        } else {
            out.curve_to(at(cpw, -hh), at(hw, -cph), at(hw, 0.0));
            out.curve_to(at(hw, cph), at(cpw, hh), at(0.0, hh));
            out.curve_to(at(-cpw, hh), at(-hw, cph), at(-hw, 0.0));
            out.curve_to(at(-hw, -cph), at(-cpw, -hh), at(0.0, -hh));
        }
        out.close_path();
    }

    fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        let target = match property {
            LottieProperty::EllipseSize => &mut self.size,
            LottieProperty::Position => &mut self.position,
            _ => return Ok(false),
        };
        target.set_callback(ValueCallback::point_fn(property, callback)?);
        Ok(true)
    }
}

#[derive(Debug)]
pub struct RectGeometry {
    size: AnimatedValue<Vec2>,
    position: AnimatedValue<Vec2>,
    roundness: AnimatedValue<f32>,
    reversed: bool,
}

impl RectGeometry {
    pub fn from_data(rc: &data::RectShape, samples: usize) -> Result<Self> {
        Ok(Self {
            size: AnimatedValue::from_property("s", &rc.s, vec2, Vec2::ZERO, samples)?,
            position: AnimatedValue::from_property("p", &rc.p, vec2, Vec2::ZERO, samples)?,
            roundness: AnimatedValue::from_property("r", &rc.r, |v| *v, 0.0, samples)?,
            reversed: rc.d == Some(3),
        })
    }
}

fn corner(out: &mut BezPath, center: Point, radius: f64, start_deg: f64, sweep_deg: f64) {
    let arc = Arc {
        center,
        radii: kurbo::Vec2::new(radius, radius),
        start_angle: start_deg.to_radians(),
        sweep_angle: sweep_deg.to_radians(),
        x_rotation: 0.0,
    };
    for el in arc.append_iter(0.1) {
        out.push(el);
    }
}

impl PathGenerator for RectGeometry {
    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.size.set_frame(ctx) | self.position.set_frame(ctx) | self.roundness.set_frame(ctx)
    }

    fn version(&self) -> u64 {
        self.size.version() + self.position.version() + self.roundness.version()
    }

    fn build_path(&self, out: &mut BezPath) {
        let size = self.size.get();
        let p = self.position.get();
        let hw = (size.x / 2.0) as f64;
        let hh = (size.y / 2.0) as f64;
        let (x, y) = (p.x as f64, p.y as f64);
        let r = (self.roundness.get().max(0.0) as f64).min(hw).min(hh);
        let (left, right, top, bottom) = (x - hw, x + hw, y - hh, y + hh);

        // Starts on the right edge just below the top-right corner.
        out.move_to((right, top + r));
        if !self.reversed {
            out.line_to((right, bottom - r));
            if r > 0.0 {
                corner(out, Point::new(right - r, bottom - r), r, 0.0, 90.0);
            }
            out.line_to((left + r, bottom));
            if r > 0.0 {
                corner(out, Point::new(left + r, bottom - r), r, 90.0, 90.0);
            }
            out.line_to((left, top + r));
            if r > 0.0 {
                corner(out, Point::new(left + r, top + r), r, 180.0, 90.0);
            }
            out.line_to((right - r, top));
            if r > 0.0 {
                corner(out, Point::new(right - r, top + r), r, 270.0, 90.0);
            }
        } else {
            if r > 0.0 {
                corner(out, Point::new(right - r, top + r), r, 0.0, -90.0);
            }
            out.line_to((left + r, top));
            if r > 0.0 {
                corner(out, Point::new(left + r, top + r), r, 270.0, -90.0);
            }
            out.line_to((left, bottom - r));
            if r > 0.0 {
                corner(out, Point::new(left + r, bottom - r), r, 180.0, -90.0);
            }
            out.line_to((right - r, bottom));
            if r > 0.0 {
                corner(out, Point::new(right - r, bottom - r), r, 90.0, -90.0);
            }
            out.line_to((right, top + r));
        }
        out.close_path();
    }

    fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match property {
            LottieProperty::RectangleSize => {
                self.size.set_callback(ValueCallback::point_fn(property, callback)?)
            }
            LottieProperty::Position => {
                self.position.set_callback(ValueCallback::point_fn(property, callback)?)
            }
            LottieProperty::CornerRadius => {
                self.roundness.set_callback(ValueCallback::float_fn(property, callback)?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolystarKind {
    Star,
    Polygon,
}

#[derive(Debug)]
pub struct PolystarGeometry {
    kind: PolystarKind,
    points: AnimatedValue<f32>,
    position: Position,
    rotation: AnimatedValue<f32>,
    outer_radius: AnimatedValue<f32>,
    outer_roundness: AnimatedValue<f32>,
    inner_radius: AnimatedValue<f32>,
    inner_roundness: AnimatedValue<f32>,
    reversed: bool,
}

impl PolystarGeometry {
    pub fn from_data(sr: &data::PolystarShape, samples: usize) -> Result<Self> {
        let optional = |name, prop: &Option<data::Property<f32>>| match prop {
            Some(p) => AnimatedValue::from_property(name, p, |v| *v, 0.0, samples),
            None => Ok(AnimatedValue::fixed(0.0)),
        };
        Ok(Self {
            kind: if sr.sy == 2 {
                PolystarKind::Polygon
            } else {
                PolystarKind::Star
            },
            points: AnimatedValue::from_property("pt", &sr.pt, |v| *v, 5.0, samples)?,
            position: Position::from_data(&sr.p, samples)?,
            rotation: AnimatedValue::from_property("r", &sr.r, |v| *v, 0.0, samples)?,
            outer_radius: AnimatedValue::from_property("or", &sr.or, |v| *v, 0.0, samples)?,
            outer_roundness: AnimatedValue::from_property("os", &sr.os, |v| *v, 0.0, samples)?,
            inner_radius: optional("ir", &sr.ir)?,
            inner_roundness: optional("is", &sr.is)?,
            reversed: sr.d == Some(3),
        })
    }

    fn build_star(&self, out: &mut BezPath) {
        let points = self.points.get();
        if points <= 0.0 {
            return;
        }
        let mut current_angle = ((self.rotation.get() - 90.0) as f64).to_radians();
        let mut angle_per_point = 2.0 * PI / points as f64;
        if self.reversed {
            angle_per_point = -angle_per_point;
        }
        let half_angle = angle_per_point / 2.0;
        let partial = (points - points.trunc()) as f64;
        if partial != 0.0 {
            current_angle += half_angle * (1.0 - partial);
        }

        let outer = self.outer_radius.get() as f64;
        let inner = self.inner_radius.get() as f64;
        let inner_round = (self.inner_roundness.get() / 100.0) as f64;
        let outer_round = (self.outer_roundness.get() / 100.0) as f64;
        let magic = POLYSTAR_MAGIC_NUMBER as f64;

        let mut partial_radius = 0.0;
        let (mut x, mut y);
        if partial != 0.0 {
            partial_radius = inner + partial * (outer - inner);
            x = partial_radius * current_angle.cos();
            y = partial_radius * current_angle.sin();
            out.move_to((x, y));
            current_angle += angle_per_point * partial / 2.0;
        } else {
            x = outer * current_angle.cos();
            y = outer * current_angle.sin();
            out.move_to((x, y));
            current_angle += half_angle;
        }

        // Alternates inner and outer vertices, starting with an inner one.
        let mut long_segment = false;
        let num_points = (points.ceil() as usize) * 2;
        for i in 0..num_points {
            let mut radius = if long_segment { outer } else { inner };
            let mut d_theta = half_angle;
            if partial_radius != 0.0 && i == num_points - 2 {
                d_theta = angle_per_point * partial / 2.0;
            }
            if partial_radius != 0.0 && i == num_points - 1 {
                radius = partial_radius;
            }
            let (prev_x, prev_y) = (x, y);
            x = radius * current_angle.cos();
            y = radius * current_angle.sin();

            if inner_round == 0.0 && outer_round == 0.0 {
                out.line_to((x, y));
            } else {
                let cp1_theta = prev_y.atan2(prev_x) - FRAC_PI_2;
                let cp2_theta = y.atan2(x) - FRAC_PI_2;
                let (cp1_round, cp2_round) = if long_segment {
                    (inner_round, outer_round)
                } else {
                    (outer_round, inner_round)
                };
                let (cp1_radius, cp2_radius) = if long_segment {
                    (inner, outer)
                } else {
                    (outer, inner)
                };
                let mut cp1 = kurbo::Vec2::new(cp1_theta.cos(), cp1_theta.sin())
                    * (cp1_radius * cp1_round * magic);
                let mut cp2 = kurbo::Vec2::new(cp2_theta.cos(), cp2_theta.sin())
                    * (cp2_radius * cp2_round * magic);
                if partial != 0.0 {
                    if i == 0 {
                        cp1 *= partial;
                    } else if i == num_points - 1 {
                        cp2 *= partial;
                    }
                }
                out.curve_to(
                    (prev_x - cp1.x, prev_y - cp1.y),
                    (x + cp2.x, y + cp2.y),
                    (x, y),
                );
            }
            current_angle += d_theta;
            long_segment = !long_segment;
        }
    }

    fn build_polygon(&self, out: &mut BezPath) {
        let num_points = self.points.get().floor();
        if num_points < 1.0 {
            return;
        }
        let mut current_angle = ((self.rotation.get() - 90.0) as f64).to_radians();
        let mut angle_per_point = 2.0 * PI / num_points as f64;
        if self.reversed {
            angle_per_point = -angle_per_point;
        }
        let roundness = (self.outer_roundness.get() / 100.0) as f64;
        let radius = self.outer_radius.get() as f64;
        let magic = POLYGON_MAGIC_NUMBER as f64;

        let mut x = radius * current_angle.cos();
        let mut y = radius * current_angle.sin();
        out.move_to((x, y));
        current_angle += angle_per_point;

        for _ in 0..num_points as usize {
            let (prev_x, prev_y) = (x, y);
            x = radius * current_angle.cos();
            y = radius * current_angle.sin();
            if roundness != 0.0 {
                let cp1_theta = prev_y.atan2(prev_x) - FRAC_PI_2;
                let cp2_theta = y.atan2(x) - FRAC_PI_2;
                let scale = radius * roundness * magic;
                let cp1 = kurbo::Vec2::new(cp1_theta.cos(), cp1_theta.sin()) * scale;
                let cp2 = kurbo::Vec2::new(cp2_theta.cos(), cp2_theta.sin()) * scale;
                out.curve_to(
                    (prev_x - cp1.x, prev_y - cp1.y),
                    (x + cp2.x, y + cp2.y),
                    (x, y),
                );
            } else {
                out.line_to((x, y));
            }
            current_angle += angle_per_point;
        }
    }
}

impl PathGenerator for PolystarGeometry {
    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        let mut changed = self.points.set_frame(ctx);
        changed |= self.position.set_frame(ctx);
        changed |= self.rotation.set_frame(ctx);
        changed |= self.outer_radius.set_frame(ctx);
        changed |= self.outer_roundness.set_frame(ctx);
        changed |= self.inner_radius.set_frame(ctx);
        changed |= self.inner_roundness.set_frame(ctx);
        changed
    }

    fn version(&self) -> u64 {
        self.points.version()
            + self.position.version()
            + self.rotation.version()
            + self.outer_radius.version()
            + self.outer_roundness.version()
            + self.inner_radius.version()
            + self.inner_roundness.version()
    }

    fn build_path(&self, out: &mut BezPath) {
        let start = out.elements().len();
        match self.kind {
            PolystarKind::Star => self.build_star(out),
            PolystarKind::Polygon => self.build_polygon(out),
        }
        if out.elements().len() == start {
            return;
        }
        // Vertices are generated around the origin, then moved into place.
        let p = self.position.get();
        let offset = kurbo::Affine::translate((p.x as f64, p.y as f64));
        let mut placed = BezPath::new();
        for el in &out.elements()[start..] {
            placed.push(offset * *el);
        }
        out.truncate(start);
        for el in placed.elements() {
            out.push(*el);
        }
        out.close_path();
    }

    fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        let target = match property {
            LottieProperty::Position => return self.position.set_callback(property, callback),
            LottieProperty::PolystarPoints => &mut self.points,
            LottieProperty::PolystarRotation => &mut self.rotation,
            LottieProperty::PolystarOuterRadius => &mut self.outer_radius,
            LottieProperty::PolystarOuterRoundedness => &mut self.outer_roundness,
            LottieProperty::PolystarInnerRadius if self.kind == PolystarKind::Star => {
                &mut self.inner_radius
            }
            LottieProperty::PolystarInnerRoundedness if self.kind == PolystarKind::Star => {
                &mut self.inner_roundness
            }
            _ => return Ok(false),
        };
        target.set_callback(ValueCallback::float_fn(property, callback)?);
        Ok(true)
    }
}

/// Free-form path: vertices with tangents relative to each vertex.
#[derive(Debug)]
pub struct BezierGeometry {
    shape: AnimatedValue<BezierPath>,
}

impl BezierGeometry {
    pub fn from_data(sh: &data::PathShape, samples: usize) -> Result<Self> {
        Ok(Self {
            shape: AnimatedValue::from_property(
                "ks",
                &sh.ks,
                |v| v.clone(),
                BezierPath::default(),
                samples,
            )?,
        })
    }
}

impl PathGenerator for BezierGeometry {
    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.shape.set_frame(ctx)
    }

    fn version(&self) -> u64 {
        self.shape.version()
    }

    fn build_path(&self, out: &mut BezPath) {
        append_bezier(out, self.shape.value());
    }

    fn apply_value_callback(
        &mut self,
        _property: LottieProperty,
        _callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        Ok(false)
    }
}

pub(crate) fn append_bezier(out: &mut BezPath, shape: &BezierPath) {
    let Some(first) = shape.v.first() else {
        return;
    };
    let to_pt = |v: [f32; 2]| pt(v[0], v[1]);
    out.move_to(to_pt(*first));
    let count = shape.v.len();
    for i in 0..count {
        let next = (i + 1) % count;
        if next == 0 && !shape.c {
            break;
        }
        let p0 = shape.v[i];
        let p1 = shape.v[next];
        let o = shape.o.get(i).copied().unwrap_or([0.0, 0.0]);
        let inn = shape.i.get(next).copied().unwrap_or([0.0, 0.0]);
        out.curve_to(
            to_pt([p0[0] + o[0], p0[1] + o[1]]),
            to_pt([p1[0] + inn[0], p1[1] + inn[1]]),
            to_pt(p1),
        );
    }
    if shape.c {
        out.close_path();
    }
}
