//! The shape content graph.
//!
//! Nodes live in one arena per composition and refer to each other by
//! [`ContentId`]. Every node that produces a path owns a reusable path buffer
//! stamped with the sum of the versions it was built from; a path is rebuilt
//! only when that sum moves.

mod builder;
mod greedy;
pub mod group;
pub mod paint;
pub mod shapes;

pub(crate) use builder::GraphBuilder;

use crate::animatable::FrameContext;
use crate::key_path::{KeyPath, KeyPathTarget, LottieProperty, ResolvedKeyPath, ValueCallback};
use crate::path::{append_transformed, path_bounds, union_bounds, PathMeasure};
use crate::path_ops::PathOps;
use crate::surface::Surface;
use crate::trim::{apply_trim, individual_trim_plan, TrimMode, TrimPathContent, TrimSegment};
use crate::Result;
use glam::Mat3;
use group::{GroupContent, MergeMode, MergePathsContent, RepeaterContent};
use kurbo::{BezPath, Rect};
use paint::{FillContent, StrokeContent};
use shapes::{PathGenerator, ShapeContent};
use std::mem;
use std::ops::Range;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentId(pub(crate) usize);

#[derive(Debug)]
pub enum Content {
    Shape(ShapeContent),
    Fill(FillContent),
    Stroke(StrokeContent),
    Group(GroupContent),
    Repeater(RepeaterContent),
    MergePaths(MergePathsContent),
    TrimPath(TrimPathContent),
}

impl Content {
    /// Produces a path that paints and merges can consume.
    pub fn is_path(&self) -> bool {
        matches!(
            self,
            Content::Shape(_) | Content::Group(_) | Content::Repeater(_) | Content::MergePaths(_)
        )
    }

    /// Emits paint commands when drawn.
    pub fn is_drawing(&self) -> bool {
        matches!(
            self,
            Content::Fill(_) | Content::Stroke(_) | Content::Group(_) | Content::Repeater(_)
        )
    }

    /// Absorbs preceding siblings when its group is built.
    pub fn is_greedy(&self) -> bool {
        matches!(self, Content::Repeater(_) | Content::MergePaths(_))
    }

    fn set_frame(&mut self, ctx: FrameContext) -> bool {
        match self {
            Content::Shape(s) => s.geometry.set_frame(ctx),
            Content::Fill(f) => f.set_frame(ctx),
            Content::Stroke(s) => s.set_frame(ctx),
            Content::Group(g) => g.set_frame(ctx),
            Content::Repeater(r) => r.set_frame(ctx),
            Content::MergePaths(_) => false,
            Content::TrimPath(t) => t.set_frame(ctx),
        }
    }

    fn apply_value_callback(
        &mut self,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        match self {
            Content::Shape(s) => s.geometry.apply_value_callback(property, callback),
            Content::Fill(f) => f.apply_value_callback(property, callback),
            Content::Stroke(s) => s.apply_value_callback(property, callback),
            Content::Group(g) => g.apply_value_callback(property, callback),
            Content::Repeater(r) => r.apply_value_callback(property, callback),
            Content::MergePaths(_) => Ok(false),
            Content::TrimPath(t) => t.apply_value_callback(property, callback),
        }
    }
}

#[derive(Debug, Default)]
struct PathCache {
    path: BezPath,
    stamp: Option<u64>,
    pass: u64,
}

#[derive(Debug)]
pub struct ContentNode {
    pub name: String,
    pub kind: Content,
    cache: PathCache,
}

impl ContentNode {
    /// The last built path, in the node's parent space.
    pub fn path(&self) -> &BezPath {
        &self.cache.path
    }
}

/// Everything the content graph needs from the player configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct GraphSettings {
    pub accuracy: f64,
    pub apply_opacity_to_layers: bool,
    pub cache_steps: f32,
}

pub struct ContentGraph {
    nodes: Vec<ContentNode>,
    settings: GraphSettings,
    path_ops: Rc<dyn PathOps>,
    progress: f32,
    pass: u64,
    scratch: BezPath,
    /// Per-path buffers of individually trimmed strokes, reused across frames.
    trim_paths: Vec<BezPath>,
    trim_lengths: Vec<f64>,
}

impl std::fmt::Debug for ContentGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentGraph")
            .field("nodes", &self.nodes.len())
            .field("settings", &self.settings)
            .field("pass", &self.pass)
            .finish()
    }
}

impl ContentGraph {
    pub(crate) fn new(settings: GraphSettings, path_ops: Rc<dyn PathOps>) -> Self {
        Self {
            nodes: Vec::new(),
            settings,
            path_ops,
            progress: 0.0,
            pass: 0,
            scratch: BezPath::new(),
            trim_paths: Vec::new(),
            trim_lengths: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, name: String, kind: Content) -> ContentId {
        self.nodes.push(ContentNode {
            name,
            kind,
            cache: PathCache::default(),
        });
        ContentId(self.nodes.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: ContentId) -> &ContentNode {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: ContentId) -> &mut ContentNode {
        &mut self.nodes[id.0]
    }

    pub(crate) fn path_ops(&self) -> &dyn PathOps {
        self.path_ops.as_ref()
    }

    /// Advances the nodes in `range`. Returns true when any value changed.
    pub(crate) fn set_frame(&mut self, range: Range<usize>, ctx: FrameContext) -> bool {
        self.progress = ctx.progress;
        let mut changed = false;
        for node in &mut self.nodes[range] {
            changed |= node.kind.set_frame(ctx);
        }
        changed
    }

    /// Brings every path cache up to date with the current values.
    pub(crate) fn update_paths(&mut self) {
        self.pass += 1;
        for i in 0..self.nodes.len() {
            if self.nodes[i].kind.is_path() {
                self.ensure_path(ContentId(i));
            }
        }
    }

    // Dependencies of a path node, by index. Shapes read their trims directly.
    fn path_dependency(&self, id: ContentId, index: usize) -> Option<ContentId> {
        match &self.nodes[id.0].kind {
            Content::Group(g) => g.path_children.get(index).copied(),
            Content::Repeater(r) if index == 0 => r.group,
            Content::MergePaths(m) => m.absorbed.get(index).copied(),
            _ => None,
        }
    }

    fn own_version(&self, id: ContentId) -> u64 {
        match &self.nodes[id.0].kind {
            Content::Shape(s) => {
                s.geometry.version()
                    + s.trims
                        .iter()
                        .map(|t| match &self.nodes[t.0].kind {
                            Content::TrimPath(trim) => trim.version(),
                            _ => 0,
                        })
                        .sum::<u64>()
            }
            Content::Group(g) => g.version(),
            Content::Repeater(r) => r.version(),
            _ => 0,
        }
    }

    /// Rebuilds the path of `id` if an input moved since the last build and
    /// returns its stamp.
    fn ensure_path(&mut self, id: ContentId) -> u64 {
        if self.nodes[id.0].cache.pass == self.pass {
            if let Some(stamp) = self.nodes[id.0].cache.stamp {
                return stamp;
            }
        }
        let mut stamp = self.own_version(id);
        let mut index = 0;
        while let Some(dep) = self.path_dependency(id, index) {
            stamp = stamp.wrapping_add(self.ensure_path(dep));
            index += 1;
        }

        let cache = &mut self.nodes[id.0].cache;
        cache.pass = self.pass;
        if cache.stamp == Some(stamp) {
            return stamp;
        }
        cache.stamp = Some(stamp);
        let mut out = mem::take(&mut cache.path);
        out.truncate(0);
        self.build_path(id, &mut out);
        tracing::trace!(node = %self.nodes[id.0].name, elements = out.elements().len(), "path rebuilt");
        self.nodes[id.0].cache.path = out;
        stamp
    }

    fn build_path(&self, id: ContentId, out: &mut BezPath) {
        match &self.nodes[id.0].kind {
            Content::Shape(s) => {
                s.geometry.build_path(out);
                for trim in &s.trims {
                    if let Content::TrimPath(t) = &self.nodes[trim.0].kind {
                        t.apply(out, self.settings.accuracy);
                    }
                }
            }
            Content::Group(g) => {
                let matrix = g.matrix();
                for child in g.path_children.iter().rev() {
                    append_transformed(out, &self.nodes[child.0].cache.path, matrix);
                }
            }
            Content::Repeater(r) => {
                let Some(group) = r.group else {
                    return;
                };
                let body = &self.nodes[group.0].cache.path;
                for i in (0..r.copies()).rev() {
                    append_transformed(out, body, r.copy_matrix(i));
                }
            }
            Content::MergePaths(m) => *out = self.merge_paths(m),
            _ => {}
        }
    }

    fn merge_paths(&self, merge: &MergePathsContent) -> BezPath {
        let path_of = |id: &ContentId| &self.nodes[id.0].cache.path;
        let Some(op) = merge.mode.path_op() else {
            let mut out = BezPath::new();
            for id in merge.absorbed.iter().rev() {
                append_transformed(&mut out, path_of(id), Mat3::IDENTITY);
            }
            return out;
        };
        let Some((first, rest)) = merge.absorbed.split_last() else {
            return BezPath::new();
        };
        let mut remainder: Option<BezPath> = None;
        for id in rest {
            remainder = Some(match remainder {
                None => path_of(id).clone(),
                Some(acc) => self
                    .path_ops
                    .combine(crate::path_ops::PathOp::Union, &acc, path_of(id)),
            });
        }
        self.path_ops
            .combine(op, path_of(first), &remainder.unwrap_or_default())
    }

    /// Draws the node `id` under `parent` with `alpha` in 0..=255.
    pub(crate) fn draw(&mut self, id: ContentId, surface: &mut dyn Surface, parent: Mat3, alpha: u8) {
        match &self.nodes[id.0].kind {
            Content::Group(_) => self.draw_group(id, surface, parent, alpha),
            Content::Repeater(_) => self.draw_repeater(id, surface, parent, alpha),
            Content::Fill(_) => self.draw_fill(id, surface, parent, alpha),
            Content::Stroke(_) => self.draw_stroke(id, surface, parent, alpha),
            _ => {}
        }
    }

    fn draw_group(&mut self, id: ContentId, surface: &mut dyn Surface, parent: Mat3, alpha: u8) {
        let Content::Group(group) = &self.nodes[id.0].kind else {
            return;
        };
        let matrix = parent * group.matrix();
        let layer_alpha = (group.opacity() / 100.0 * alpha as f32 / 255.0 * 255.0) as u8;
        let drawable = group
            .children
            .iter()
            .filter(|c| self.nodes[c.0].kind.is_drawing())
            .count();
        let children = group.children.clone();

        let offscreen = self.settings.apply_opacity_to_layers && drawable >= 2 && layer_alpha != 255;
        let bounds = if offscreen { self.bounds(id, parent) } else { None };
        let child_alpha = match bounds {
            Some(bounds) => {
                surface.begin_layer(bounds, layer_alpha as f32 / 255.0);
                255
            }
            None => layer_alpha,
        };
        for child in children.iter().rev() {
            if self.nodes[child.0].kind.is_drawing() {
                self.draw(*child, surface, matrix, child_alpha);
            }
        }
        if bounds.is_some() {
            surface.end_layer();
        }
    }

    fn draw_repeater(&mut self, id: ContentId, surface: &mut dyn Surface, parent: Mat3, alpha: u8) {
        let Content::Repeater(repeater) = &self.nodes[id.0].kind else {
            return;
        };
        let Some(group) = repeater.group else {
            return;
        };
        let copies: Vec<(Mat3, u8)> = (0..repeater.copies())
            .rev()
            .map(|i| {
                (
                    parent * repeater.copy_matrix(i),
                    (alpha as f32 * repeater.copy_alpha(i)) as u8,
                )
            })
            .collect();
        for (matrix, copy_alpha) in copies {
            self.draw(group, surface, matrix, copy_alpha);
        }
    }

    fn draw_fill(&mut self, id: ContentId, surface: &mut dyn Surface, parent: Mat3, alpha: u8) {
        let mut combined = mem::take(&mut self.scratch);
        combined.truncate(0);
        if let Content::Fill(fill) = &self.nodes[id.0].kind {
            for p in &fill.paths {
                append_transformed(&mut combined, &self.nodes[p.0].cache.path, parent);
            }
        }
        if path_bounds(&combined).is_some() {
            let (progress, steps) = (self.progress, self.settings.cache_steps);
            if let Content::Fill(fill) = &mut self.nodes[id.0].kind {
                let paint = fill.paint(parent, alpha, progress, steps);
                surface.draw_path(&combined, &paint);
            }
        }
        self.scratch = combined;
    }

    fn draw_stroke(&mut self, id: ContentId, surface: &mut dyn Surface, parent: Mat3, alpha: u8) {
        let (progress, steps) = (self.progress, self.settings.cache_steps);
        let paint = match &mut self.nodes[id.0].kind {
            Content::Stroke(stroke) => stroke.paint(parent, alpha, progress, steps),
            _ => None,
        };
        let Some(paint) = paint else {
            return;
        };
        let Content::Stroke(stroke) = &self.nodes[id.0].kind else {
            return;
        };
        let accuracy = self.settings.accuracy;
        let mut combined = mem::take(&mut self.scratch);
        let mut transformed = mem::take(&mut self.trim_paths);
        let mut lengths = mem::take(&mut self.trim_lengths);

        for group in &stroke.groups {
            combined.truncate(0);
            for p in group.paths.iter().rev() {
                append_transformed(&mut combined, &self.nodes[p.0].cache.path, parent);
            }
            let trim = group.trim.and_then(|t| match &self.nodes[t.0].kind {
                Content::TrimPath(trim) => Some(trim),
                _ => None,
            });
            let Some(trim) = trim else {
                if path_bounds(&combined).is_some() {
                    surface.draw_path(&combined, &paint);
                }
                continue;
            };

            transformed.resize_with(group.paths.len(), BezPath::new);
            lengths.clear();
            for (slot, p) in transformed.iter_mut().zip(group.paths.iter().rev()) {
                slot.truncate(0);
                append_transformed(slot, &self.nodes[p.0].cache.path, parent);
                lengths.push(PathMeasure::new(slot, accuracy).length());
            }
            match individual_trim_plan(&lengths, trim.start(), trim.end(), trim.offset()) {
                None => {
                    if path_bounds(&combined).is_some() {
                        surface.draw_path(&combined, &paint);
                    }
                }
                Some(plan) => {
                    for (path, segment) in transformed.iter_mut().zip(plan) {
                        match segment {
                            TrimSegment::Skip => continue,
                            TrimSegment::Whole => {}
                            TrimSegment::Partial { start, end } => {
                                apply_trim(path, start, end, 0.0, accuracy)
                            }
                        }
                        if path_bounds(path).is_some() {
                            surface.draw_path(path, &paint);
                        }
                    }
                }
            }
        }
        self.scratch = combined;
        self.trim_paths = transformed;
        self.trim_lengths = lengths;
    }

    /// Bounds of what `id` draws under `parent`, in the surface space.
    pub fn bounds(&self, id: ContentId, parent: Mat3) -> Option<Rect> {
        match &self.nodes[id.0].kind {
            Content::Group(group) => {
                let matrix = parent * group.matrix();
                group
                    .children
                    .iter()
                    .filter(|c| self.nodes[c.0].kind.is_drawing())
                    .fold(None, |acc, c| union_bounds(acc, self.bounds(*c, matrix)))
            }
            Content::Repeater(repeater) => {
                let group = repeater.group?;
                (0..repeater.copies()).fold(None, |acc, i| {
                    union_bounds(acc, self.bounds(group, parent * repeater.copy_matrix(i)))
                })
            }
            Content::Fill(fill) => self
                .paths_bounds(fill.paths.iter(), parent)
                .map(|r| r.inflate(1.0, 1.0)),
            Content::Stroke(stroke) => {
                let paths = stroke.groups.iter().flat_map(|g| g.paths.iter());
                let half = (stroke.scaled_width(parent) / 2.0) as f64;
                self.paths_bounds(paths, parent)
                    .map(|r| r.inflate(half + 1.0, half + 1.0))
            }
            _ => None,
        }
    }

    fn paths_bounds<'a>(
        &self,
        paths: impl Iterator<Item = &'a ContentId>,
        parent: Mat3,
    ) -> Option<Rect> {
        let mut combined = BezPath::new();
        for p in paths {
            append_transformed(&mut combined, &self.nodes[p.0].cache.path, parent);
        }
        path_bounds(&combined)
    }

    /// Connects paints to the paths they draw and shapes to the trims that
    /// apply to them. `before` holds the items wired ahead of this group.
    pub(crate) fn wire(&mut self, group: ContentId, parent_before: &[ContentId]) {
        let Content::Group(g) = &self.nodes[group.0].kind else {
            return;
        };
        let children = g.children.clone();
        let mut before = parent_before.to_vec();
        for i in (0..children.len()).rev() {
            self.wire_node(children[i], &before, &children[..i]);
            before.push(children[i]);
        }
    }

    fn is_trim(&self, id: ContentId, mode: TrimMode) -> bool {
        matches!(&self.nodes[id.0].kind, Content::TrimPath(t) if t.mode == mode)
    }

    fn wire_node(&mut self, id: ContentId, before: &[ContentId], after: &[ContentId]) {
        match &self.nodes[id.0].kind {
            Content::Shape(_) => {
                let trims: Vec<ContentId> = before
                    .iter()
                    .copied()
                    .filter(|t| self.is_trim(*t, TrimMode::Simultaneously))
                    .collect();
                if let Content::Shape(s) = &mut self.nodes[id.0].kind {
                    s.trims = trims;
                }
            }
            Content::Fill(_) => {
                let paths: Vec<ContentId> = after
                    .iter()
                    .copied()
                    .filter(|p| self.nodes[p.0].kind.is_path())
                    .collect();
                if let Content::Fill(f) = &mut self.nodes[id.0].kind {
                    f.paths = paths;
                }
            }
            Content::Stroke(_) => {
                let groups = self.stroke_groups(before, after);
                if let Content::Stroke(s) = &mut self.nodes[id.0].kind {
                    s.groups = groups;
                }
            }
            Content::Group(_) => self.wire(id, before),
            Content::Repeater(r) => {
                if let Some(inner) = r.group {
                    self.wire(inner, before);
                }
            }
            Content::MergePaths(m) => {
                for absorbed in m.absorbed.clone() {
                    self.wire_node(absorbed, before, after);
                }
            }
            Content::TrimPath(_) => {}
        }
    }

    fn stroke_groups(&self, before: &[ContentId], after: &[ContentId]) -> Vec<paint::PathGroup> {
        let trim_before = before
            .iter()
            .rev()
            .copied()
            .filter(|t| self.is_trim(*t, TrimMode::Individually))
            .last();
        let mut groups = Vec::new();
        let mut current: Option<paint::PathGroup> = None;
        for &item in after.iter().rev() {
            if self.is_trim(item, TrimMode::Individually) {
                if let Some(group) = current.take() {
                    groups.push(group);
                }
                current = Some(paint::PathGroup {
                    trim: Some(item),
                    paths: Vec::new(),
                });
            } else if self.nodes[item.0].kind.is_path() {
                current
                    .get_or_insert_with(|| paint::PathGroup {
                        trim: trim_before,
                        paths: Vec::new(),
                    })
                    .paths
                    .push(item);
            }
        }
        groups.extend(current);
        groups
    }

    /// Collects the content below `group` matching `key_path` at `depth`.
    /// `current` holds the names of the levels above.
    pub(crate) fn resolve_key_path(
        &self,
        group: ContentId,
        key_path: &KeyPath,
        depth: usize,
        current: &mut Vec<String>,
        out: &mut Vec<ResolvedKeyPath>,
    ) {
        let Content::Group(g) = &self.nodes[group.0].kind else {
            return;
        };
        for &child in &g.children {
            self.resolve_node(child, key_path, depth, current, out);
        }
    }

    fn resolve_node(
        &self,
        id: ContentId,
        key_path: &KeyPath,
        depth: usize,
        current: &mut Vec<String>,
        out: &mut Vec<ResolvedKeyPath>,
    ) {
        let node = &self.nodes[id.0];
        match &node.kind {
            Content::Group(g) if g.container => {
                self.resolve_key_path(id, key_path, depth, current, out)
            }
            Content::Group(_) => {
                if !key_path.matches(&node.name, depth) {
                    return;
                }
                current.push(node.name.clone());
                if key_path.fully_resolves_to(&node.name, depth) {
                    push_resolved(current, KeyPathTarget::Content(id), out);
                }
                if key_path.propagate_to_children(&node.name, depth) {
                    let next = depth + key_path.increment_depth_by(&node.name, depth);
                    self.resolve_key_path(id, key_path, next, current, out);
                }
                current.pop();
            }
            Content::Repeater(r) => {
                self.resolve_leaf(id, key_path, depth, current, out);
                if let Some(inner) = r.group {
                    self.resolve_key_path(inner, key_path, depth, current, out);
                }
            }
            Content::MergePaths(m) => {
                for &absorbed in &m.absorbed {
                    self.resolve_node(absorbed, key_path, depth, current, out);
                }
            }
            _ => self.resolve_leaf(id, key_path, depth, current, out),
        }
    }

    fn resolve_leaf(
        &self,
        id: ContentId,
        key_path: &KeyPath,
        depth: usize,
        current: &mut Vec<String>,
        out: &mut Vec<ResolvedKeyPath>,
    ) {
        let name = &self.nodes[id.0].name;
        if key_path.fully_resolves_to(name, depth) {
            current.push(name.clone());
            push_resolved(current, KeyPathTarget::Content(id), out);
            current.pop();
        }
    }

    /// Installs `callback` on `property` of node `id`. Returns false when
    /// the node has no such property.
    pub(crate) fn apply_value_callback(
        &mut self,
        id: ContentId,
        property: LottieProperty,
        callback: Option<&ValueCallback>,
    ) -> Result<bool> {
        self.nodes[id.0].kind.apply_value_callback(property, callback)
    }

    /// Number of merge nodes that need a real boolean operation.
    pub(crate) fn boolean_merges(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(&n.kind, Content::MergePaths(m) if m.mode != MergeMode::Merge))
            .count()
    }
}

fn push_resolved(current: &[String], target: KeyPathTarget, out: &mut Vec<ResolvedKeyPath>) {
    if let Ok(path) = KeyPath::new(current.iter().cloned()) {
        out.push(ResolvedKeyPath { path, target });
    }
}
