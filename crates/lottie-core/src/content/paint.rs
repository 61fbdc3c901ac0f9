use super::ContentId;
use crate::animatable::{color, AnimatedValue, FrameContext};
use crate::gradient::GradientAnimation;
use crate::key_path::{LottieProperty, ValueCallback};
use crate::surface::{
    ColorFilter, DashPattern, FillRule, LineCap, LineJoin, Paint, PaintSource, PaintStyle,
    StrokeStyle,
};
use crate::transform::matrix_scale;
use crate::Result;
use glam::{Mat3, Vec4};
use lottie_data::model as data;

/// Where the color of a fill or stroke comes from.
#[derive(Debug)]
pub enum PaintAnimation {
    Solid(AnimatedValue<Vec4>),
    Gradient(GradientAnimation),
}

impl PaintAnimation {
    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        match self {
            PaintAnimation::Solid(c) => c.set_frame(ctx),
            PaintAnimation::Gradient(g) => g.set_frame(ctx),
        }
    }

    fn version(&self) -> u64 {
        match self {
            PaintAnimation::Solid(c) => c.version(),
            PaintAnimation::Gradient(g) => g.version(),
        }
    }

    fn source(&mut self, parent: Mat3, progress: f32, cache_steps: f32) -> PaintSource {
        match self {
            PaintAnimation::Solid(c) => PaintSource::Solid(c.get()),
            PaintAnimation::Gradient(g) => PaintSource::Gradient {
                brush: g.brush(progress, cache_steps),
                transform: parent,
            },
        }
    }

    fn set_color_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match self {
            PaintAnimation::Solid(c) => {
                c.set_callback(ValueCallback::color_fn(property, callback)?);
                Ok(true)
            }
            PaintAnimation::Gradient(_) => Ok(false),
        }
    }
}

fn paint_alpha(parent_alpha: u8, opacity: f32) -> f32 {
    (parent_alpha as f32 / 255.0 * opacity / 100.0).clamp(0.0, 1.0)
}

fn solid(c: &data::Property<Vec<f32>>, samples: usize) -> Result<PaintAnimation> {
    Ok(PaintAnimation::Solid(AnimatedValue::from_property(
        "c",
        c,
        color,
        Vec4::ONE,
        samples,
    )?))
}

fn opacity(o: &data::Property<f32>, samples: usize) -> Result<AnimatedValue<f32>> {
    AnimatedValue::from_property("o", o, |v| *v, 100.0, samples)
}

#[derive(Debug)]
pub struct FillContent {
    paint: PaintAnimation,
    opacity: AnimatedValue<f32>,
    fill_rule: FillRule,
    color_filter: Option<ColorFilter>,
    /// Path contents painted by this fill, in list order.
    pub(crate) paths: Vec<ContentId>,
}

impl FillContent {
    pub fn from_data(fl: &data::FillShape, samples: usize) -> Result<Self> {
        Ok(Self::new(solid(&fl.c, samples)?, opacity(&fl.o, samples)?, fl.r))
    }

    pub fn from_gradient(gf: &data::GradientFillShape, samples: usize) -> Result<Self> {
        let gradient = GradientAnimation::from_data(gf.t, &gf.s, &gf.e, &gf.g, samples)?;
        Ok(Self::new(
            PaintAnimation::Gradient(gradient),
            opacity(&gf.o, samples)?,
            gf.r,
        ))
    }

    fn new(paint: PaintAnimation, opacity: AnimatedValue<f32>, rule: Option<u8>) -> Self {
        Self {
            paint,
            opacity,
            fill_rule: if rule == Some(2) {
                FillRule::EvenOdd
            } else {
                FillRule::NonZero
            },
            color_filter: None,
            paths: Vec::new(),
        }
    }

    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        self.paint.set_frame(ctx) | self.opacity.set_frame(ctx)
    }

    pub fn version(&self) -> u64 {
        self.paint.version() + self.opacity.version()
    }

    pub(crate) fn paint(
        &mut self,
        parent: Mat3,
        parent_alpha: u8,
        progress: f32,
        cache_steps: f32,
    ) -> Paint {
        Paint {
            source: self.paint.source(parent, progress, cache_steps),
            alpha: paint_alpha(parent_alpha, self.opacity.get()),
            style: PaintStyle::Fill(self.fill_rule),
            color_filter: self.color_filter,
        }
    }

    pub fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match property {
            LottieProperty::Opacity => self
                .opacity
                .set_callback(ValueCallback::float_fn(property, callback)?),
            LottieProperty::Color => return self.paint.set_color_callback(property, callback),
            LottieProperty::ColorFilter => {
                self.color_filter = ValueCallback::color_filter(property, callback)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// The paths one stroke draws together, sharing an optional individual trim.
#[derive(Debug, Default)]
pub(crate) struct PathGroup {
    pub(crate) trim: Option<ContentId>,
    /// In the order they were collected (last list entry first).
    pub(crate) paths: Vec<ContentId>,
}

#[derive(Debug)]
pub struct StrokeContent {
    paint: PaintAnimation,
    opacity: AnimatedValue<f32>,
    width: AnimatedValue<f32>,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f32,
    /// Alternating dash and gap lengths.
    dashes: Vec<AnimatedValue<f32>>,
    dash_offset: Option<AnimatedValue<f32>>,
    color_filter: Option<ColorFilter>,
    pub(crate) groups: Vec<PathGroup>,
}

struct StrokeParts<'a> {
    width: &'a data::Property<f32>,
    lc: u8,
    lj: u8,
    ml: Option<f32>,
    dashes: &'a [data::DashProperty],
}

impl StrokeContent {
    pub fn from_data(st: &data::StrokeShape, samples: usize) -> Result<Self> {
        Self::new(
            solid(&st.c, samples)?,
            opacity(&st.o, samples)?,
            StrokeParts {
                width: &st.w,
                lc: st.lc,
                lj: st.lj,
                ml: st.ml,
                dashes: &st.d,
            },
            samples,
        )
    }

    pub fn from_gradient(gs: &data::GradientStrokeShape, samples: usize) -> Result<Self> {
        let gradient = GradientAnimation::from_data(gs.t, &gs.s, &gs.e, &gs.g, samples)?;
        Self::new(
            PaintAnimation::Gradient(gradient),
            opacity(&gs.o, samples)?,
            StrokeParts {
                width: &gs.w,
                lc: gs.lc,
                lj: gs.lj,
                ml: gs.ml,
                dashes: &gs.d,
            },
            samples,
        )
    }

    fn new(
        paint: PaintAnimation,
        opacity: AnimatedValue<f32>,
        parts: StrokeParts<'_>,
        samples: usize,
    ) -> Result<Self> {
        let mut dashes = Vec::new();
        let mut dash_offset = None;
        for d in parts.dashes {
            let value = AnimatedValue::from_property("d.v", &d.v, |v| *v, 0.0, samples)?;
            if d.n.as_deref() == Some("o") {
                dash_offset = Some(value);
            } else {
                dashes.push(value);
            }
        }
        Ok(Self {
            paint,
            opacity,
            width: AnimatedValue::from_property("w", parts.width, |v| *v, 0.0, samples)?,
            cap: match parts.lc {
                2 => LineCap::Round,
                3 => LineCap::Square,
                _ => LineCap::Butt,
            },
            join: match parts.lj {
                2 => LineJoin::Round,
                3 => LineJoin::Bevel,
                _ => LineJoin::Miter,
            },
            miter_limit: parts.ml.unwrap_or(4.0),
            dashes,
            dash_offset,
            color_filter: None,
            groups: Vec::new(),
        })
    }

    pub fn set_frame(&mut self, ctx: FrameContext) -> bool {
        let mut changed = self.paint.set_frame(ctx);
        changed |= self.opacity.set_frame(ctx);
        changed |= self.width.set_frame(ctx);
        for d in &mut self.dashes {
            changed |= d.set_frame(ctx);
        }
        if let Some(o) = &mut self.dash_offset {
            changed |= o.set_frame(ctx);
        }
        changed
    }

    pub fn version(&self) -> u64 {
        self.paint.version()
            + self.opacity.version()
            + self.width.version()
            + self.dashes.iter().map(|d| d.version()).sum::<u64>()
            + self.dash_offset.as_ref().map_or(0, |o| o.version())
    }

    /// Stroke width in surface units under `parent`.
    pub fn scaled_width(&self, parent: Mat3) -> f32 {
        self.width.get() * matrix_scale(parent)
    }

    fn dash(&self, scale: f32) -> Option<DashPattern> {
        if self.dashes.is_empty() {
            return None;
        }
        let mut array: Vec<f32> = self
            .dashes
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let min = if i % 2 == 0 { 1.0 } else { 0.1 };
                d.get().max(min) * scale
            })
            .collect();
        if array.len() % 2 == 1 {
            array.extend_from_within(..);
        }
        let offset = self.dash_offset.as_ref().map_or(0.0, |o| o.get() * scale);
        Some(DashPattern { array, offset })
    }

    /// The paint for drawing under `parent`, or `None` when the resolved width
    /// leaves nothing to draw.
    pub(crate) fn paint(
        &mut self,
        parent: Mat3,
        parent_alpha: u8,
        progress: f32,
        cache_steps: f32,
    ) -> Option<Paint> {
        let scale = matrix_scale(parent);
        let width = self.width.get() * scale;
        if width <= 0.0 {
            return None;
        }
        Some(Paint {
            source: self.paint.source(parent, progress, cache_steps),
            alpha: paint_alpha(parent_alpha, self.opacity.get()),
            style: PaintStyle::Stroke(StrokeStyle {
                width,
                cap: self.cap,
                join: self.join,
                miter_limit: self.miter_limit,
                dash: self.dash(scale),
            }),
            color_filter: self.color_filter,
        })
    }

    pub fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match property {
            LottieProperty::Opacity => self
                .opacity
                .set_callback(ValueCallback::float_fn(property, callback)?),
            LottieProperty::StrokeWidth => self
                .width
                .set_callback(ValueCallback::float_fn(property, callback)?),
            LottieProperty::StrokeColor => {
                return self.paint.set_color_callback(property, callback)
            }
            LottieProperty::ColorFilter => {
                self.color_filter = ValueCallback::color_filter(property, callback)?
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}
