use super::greedy;
use super::group::{GroupContent, MergePathsContent, RepeaterContent};
use super::paint::{FillContent, StrokeContent};
use super::shapes::{
    BezierGeometry, EllipseGeometry, Geometry, PolystarGeometry, RectGeometry, ShapeContent,
};
use super::{Content, ContentGraph, ContentId};
use crate::error::LottieError;
use crate::transform::TransformAnimation;
use crate::trim::TrimPathContent;
use crate::Result;
use lottie_data::model::{self as data, Shape};

/// Turns shape item lists into content nodes.
pub(crate) struct GraphBuilder<'a> {
    graph: &'a mut ContentGraph,
    samples: usize,
    strict: bool,
    pub(crate) absorptions: usize,
    pub(crate) skipped: usize,
}

impl<'a> GraphBuilder<'a> {
    pub(crate) fn new(graph: &'a mut ContentGraph, samples: usize, strict: bool) -> Self {
        Self {
            graph,
            samples,
            strict,
            absorptions: 0,
            skipped: 0,
        }
    }

    /// Builds and wires the root group of a layer.
    pub(crate) fn build_root(&mut self, name: &str, items: &[Shape]) -> Result<ContentId> {
        let root = self.build_group(name, items, true)?;
        self.graph.wire(root, &[]);
        Ok(root)
    }

    fn build_group(&mut self, name: &str, items: &[Shape], container: bool) -> Result<ContentId> {
        let mut transform = None;
        let mut children = Vec::with_capacity(items.len());
        for item in items {
            if item.is_hidden() {
                continue;
            }
            match item {
                // The last transform item wins.
                Shape::Transform(tr) => {
                    transform = Some(TransformAnimation::from_data(&tr.t, self.samples)?)
                }
                Shape::Unknown if self.strict => {
                    return Err(LottieError::UnknownShape { group: name.into() })
                }
                Shape::Unknown => {
                    tracing::warn!(group = name, "skipping unsupported shape item");
                    self.skipped += 1;
                }
                _ => children.push(self.build_item(item)?),
            }
        }

        let (children, absorbed) = greedy::resolve(self.graph, children);
        self.absorptions += absorbed;
        let mut group = GroupContent::new(transform, container);
        group.path_children = greedy::path_subset(self.graph, &children);
        group.children = children;
        Ok(self.graph.push(name.into(), Content::Group(group)))
    }

    fn build_item(&mut self, item: &Shape) -> Result<ContentId> {
        let name = item.name().unwrap_or_default().to_string();
        let samples = self.samples;
        let shape = |geometry| Content::Shape(ShapeContent::new(geometry));
        let kind = match item {
            Shape::Group(gr) => return self.build_group(&name, &gr.it, false),
            Shape::Rect(rc) => shape(Geometry::Rect(RectGeometry::from_data(rc, samples)?)),
            Shape::Ellipse(el) => {
                shape(Geometry::Ellipse(EllipseGeometry::from_data(el, samples)?))
            }
            Shape::Polystar(sr) => {
                shape(Geometry::Polystar(PolystarGeometry::from_data(sr, samples)?))
            }
            Shape::Path(sh) => {
                if matches!(sh.ks.k, data::Value::Default) {
                    return Err(LottieError::MissingProperty {
                        shape: name,
                        property: "ks",
                    });
                }
                shape(Geometry::Bezier(BezierGeometry::from_data(sh, samples)?))
            }
            Shape::Fill(fl) => Content::Fill(FillContent::from_data(fl, samples)?),
            Shape::GradientFill(gf) => Content::Fill(FillContent::from_gradient(gf, samples)?),
            Shape::Stroke(st) => Content::Stroke(StrokeContent::from_data(st, samples)?),
            Shape::GradientStroke(gs) => {
                Content::Stroke(StrokeContent::from_gradient(gs, samples)?)
            }
            Shape::Trim(tm) => Content::TrimPath(TrimPathContent::from_data(tm, samples)?),
            Shape::Repeater(rp) => Content::Repeater(RepeaterContent::from_data(rp, samples)?),
            Shape::MergePaths(mm) => Content::MergePaths(MergePathsContent::from_data(mm)),
            Shape::Transform(_) | Shape::Unknown => {
                return Err(LottieError::UnknownShape { group: name })
            }
        };
        Ok(self.graph.push(name, kind))
    }
}
