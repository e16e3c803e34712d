// vexel/renderer/src/scene.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The retained-mode scene: a recorder owning layer, clip, and transform
//! stacks over the command encoding.

use crate::encoding::Encoding;
use crate::paint::Brush;
use fxhash::FxHashMap;
use log::debug;
use smallvec::SmallVec;
use vexel_content::effects::BlendMode;
use vexel_content::fill::FillRule;
use vexel_content::shape::Shape;
use vexel_content::stroke::StrokeStyle;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::{vec2f, Vector2F};
use vexel_raster::Image;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayerKind {
    Regular,
    Filtered,
    Clip,
}

/// One open layer. The root layer is implicit and can never be popped.
#[derive(Debug)]
pub struct LayerState {
    pub kind: LayerKind,
    pub blend_mode: BlendMode,
    pub alpha: f32,
    pub clip: Option<Shape>,
    pub encoding: Encoding,
    pub bounds: RectF,
    pub transform: Transform2F,
    pub clip_depth: usize,
}

impl Default for LayerState {
    fn default() -> LayerState {
        LayerState::root()
    }
}

impl LayerState {
    fn root() -> LayerState {
        LayerState {
            kind: LayerKind::Regular,
            blend_mode: BlendMode::SrcOver,
            alpha: 1.0,
            clip: None,
            encoding: Encoding::new(),
            bounds: RectF::EMPTY,
            transform: Transform2F::default(),
            clip_depth: 0,
        }
    }
}

/// One active clip region.
#[derive(Clone, Debug)]
pub struct ClipState {
    pub shape: Shape,
    /// The clip shape's bounds after its recording transform.
    pub bounds: RectF,
    pub transform: Transform2F,
}

/// A retained scene. Drawing operations record into the current layer's
/// encoding; `encoding()` flattens everything into a single root encoding.
///
/// `version` increments on every state-mutating call, including a
/// `set_transform` that stores an unchanged value, and serves as a cheap
/// cache-invalidation key.
pub struct Scene {
    root: Encoding,
    layers: Vec<LayerState>,
    transform_stack: SmallVec<[Transform2F; 8]>,
    clip_stack: SmallVec<[ClipState; 4]>,
    transform: Transform2F,
    images: Vec<Image>,
    image_indices: FxHashMap<u64, u32>,
    version: u64,
    bounds: RectF,
}

impl Default for Scene {
    fn default() -> Scene {
        Scene::new()
    }
}

impl Scene {
    pub fn new() -> Scene {
        Scene {
            root: Encoding::new(),
            layers: vec![LayerState::root()],
            transform_stack: SmallVec::new(),
            clip_stack: SmallVec::new(),
            transform: Transform2F::default(),
            images: vec![],
            image_indices: FxHashMap::default(),
            version: 0,
            bounds: RectF::EMPTY,
        }
    }

    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn bounds(&self) -> RectF {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.layers.iter().all(|layer| layer.encoding.is_empty())
    }

    /// Pushed layers above the implicit root.
    #[inline]
    pub fn layer_depth(&self) -> usize {
        self.layers.len() - 1
    }

    #[inline]
    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }

    #[inline]
    pub fn transform_depth(&self) -> usize {
        self.transform_stack.len()
    }

    #[inline]
    pub fn images(&self) -> &[Image] {
        &self.images
    }

    /// Bounds contribution of a drawn shape: transformed, and clipped to the
    /// active clip region so clips never enlarge what is recorded as drawn.
    fn drawn_bounds(&self, shape_bounds: RectF, transform: Transform2F) -> RectF {
        let mut bounds = transform * shape_bounds;
        if let Some(clip) = self.clip_stack.last() {
            bounds = bounds.intersect(clip.bounds);
        }
        bounds
    }

    fn record_bounds(&mut self, bounds: RectF) {
        self.bounds = self.bounds.union(bounds);
        let layer = self.layers.last_mut().unwrap();
        layer.bounds = layer.bounds.union(bounds);
        layer.encoding.add_bounds(bounds);
    }

    /// Fills `shape` with `brush`. The effective transform is the current
    /// transform composed with `transform` (the argument applies first).
    pub fn fill(&mut self, rule: FillRule, transform: Transform2F, brush: Brush, shape: &Shape) {
        let path = shape.to_path();
        if path.is_empty() {
            return;
        }
        let combined = self.transform * transform;
        let bounds = self.drawn_bounds(shape.bounds(), combined);

        let layer = self.layers.last_mut().unwrap();
        layer.encoding.encode_transform(combined);
        layer.encoding.encode_path(&path);
        layer.encoding.encode_fill(brush, rule);

        self.record_bounds(bounds);
        self.version += 1;
    }

    /// Strokes `shape`. Bounds are expanded by half the line width before
    /// the transform is applied.
    pub fn stroke(
        &mut self,
        style: &StrokeStyle,
        transform: Transform2F,
        brush: Brush,
        shape: &Shape,
    ) {
        let path = shape.to_path();
        if path.is_empty() {
            return;
        }
        let combined = self.transform * transform;
        let dilated = shape.bounds().dilate(style.line_width * 0.5);
        let bounds = self.drawn_bounds(dilated, combined);

        let layer = self.layers.last_mut().unwrap();
        layer.encoding.encode_transform(combined);
        layer.encoding.encode_path(&path);
        layer.encoding.encode_stroke(brush, style);

        self.record_bounds(bounds);
        self.version += 1;
    }

    /// Draws `image` under the current transform composed with `transform`.
    /// Repeated draws of the same image share one registry slot.
    pub fn draw_image(&mut self, image: &Image, transform: Transform2F) {
        let combined = self.transform * transform;
        let index = match self.image_indices.get(&image.id()) {
            Some(&index) => index,
            None => {
                let index = self.images.len() as u32;
                self.images.push(image.clone());
                self.image_indices.insert(image.id(), index);
                index
            }
        };
        let image_rect =
            RectF::from_origin_size(Vector2F::zero(),
                                    vec2f(image.width() as f32, image.height() as f32));
        let bounds = self.drawn_bounds(image_rect, combined);

        let layer = self.layers.last_mut().unwrap();
        layer.encoding.encode_image(index, combined);

        self.record_bounds(bounds);
        self.version += 1;
    }

    /// Opens a layer. The `PushLayer` marker (and the clip prologue, when a
    /// clip shape is supplied) is recorded in the parent so the markers nest
    /// around the layer body after flattening.
    pub fn push_layer(&mut self, blend_mode: BlendMode, alpha: f32, clip: Option<&Shape>) {
        let alpha = alpha.max(0.0).min(1.0);
        let transform = self.transform;
        let clip_depth = self.clip_stack.len();

        let parent = self.layers.last_mut().unwrap();
        parent.encoding.encode_push_layer(blend_mode, alpha);
        if let Some(shape) = clip {
            parent.encoding.encode_transform(transform);
            parent.encoding.encode_clip_path(&shape.to_path());
            parent.encoding.encode_begin_clip();
        }

        self.layers.push(LayerState {
            kind: if clip.is_some() { LayerKind::Clip } else { LayerKind::Regular },
            blend_mode,
            alpha,
            clip: clip.cloned(),
            encoding: Encoding::new(),
            bounds: RectF::EMPTY,
            transform,
            clip_depth,
        });
        self.version += 1;
    }

    /// Closes the top layer, folding its encoding into the parent. Returns
    /// `false` (and records nothing) at the root.
    pub fn pop_layer(&mut self) -> bool {
        if self.layers.len() <= 1 {
            return false;
        }

        // Close any clips opened inside the layer body so nesting stays
        // balanced after the append.
        let open_clips = self.clip_stack.len();
        let inner_clips = open_clips - self.layers.last().unwrap().clip_depth.min(open_clips);
        for _ in 0..inner_clips {
            self.pop_clip();
        }

        let layer = self.layers.pop().unwrap();
        let parent = self.layers.last_mut().unwrap();
        parent.encoding.append(&layer.encoding);
        if layer.clip.is_some() {
            parent.encoding.encode_end_clip();
        }
        parent.encoding.encode_pop_layer();
        parent.bounds = parent.bounds.union(layer.bounds);
        self.version += 1;
        true
    }

    /// Restricts subsequent drawing to `shape`. `None` is a no-op and does
    /// not bump the version.
    pub fn push_clip(&mut self, shape: Option<&Shape>) {
        let shape = match shape {
            Some(shape) => shape,
            None => return,
        };
        let transform = self.transform;
        let layer = self.layers.last_mut().unwrap();
        layer.encoding.encode_transform(transform);
        layer.encoding.encode_clip_path(&shape.to_path());
        layer.encoding.encode_begin_clip();

        self.clip_stack.push(ClipState {
            shape: shape.clone(),
            bounds: transform * shape.bounds(),
            transform,
        });
        self.version += 1;
    }

    /// Ends the innermost clip. Returns `false` when no clip is open.
    pub fn pop_clip(&mut self) -> bool {
        if self.clip_stack.pop().is_none() {
            return false;
        }
        let layer = self.layers.last_mut().unwrap();
        layer.encoding.encode_end_clip();
        self.version += 1;
        true
    }

    pub fn push_transform(&mut self) {
        self.transform_stack.push(self.transform);
        self.version += 1;
    }

    pub fn pop_transform(&mut self) -> bool {
        match self.transform_stack.pop() {
            Some(transform) => {
                self.transform = transform;
                self.version += 1;
                true
            }
            None => false,
        }
    }

    /// Replaces the current transform. Bumps the version even when the new
    /// value equals the old, matching the original engine's behavior.
    pub fn set_transform(&mut self, transform: Transform2F) {
        self.transform = transform;
        self.version += 1;
    }

    #[inline]
    pub fn current_transform(&self) -> Transform2F {
        self.transform
    }

    pub fn translate(&mut self, offset: Vector2F) {
        self.transform = self.transform * Transform2F::from_translation(offset);
        self.version += 1;
    }

    pub fn scale(&mut self, factors: Vector2F) {
        self.transform = self.transform * Transform2F::from_scale(factors);
        self.version += 1;
    }

    pub fn rotate(&mut self, theta: f32) {
        self.transform = self.transform * Transform2F::from_rotation(theta);
        self.version += 1;
    }

    /// Flattens all open layers down to the root and returns the root
    /// encoding. Idempotent: with no interleaved mutation, a second call
    /// returns identical content.
    pub fn encoding(&mut self) -> &Encoding {
        while self.layers.len() > 1 {
            debug!("flattening unbalanced layer at depth {}", self.layers.len() - 1);
            self.pop_layer();
        }
        let root_layer = &mut self.layers[0];
        if !root_layer.encoding.is_empty() {
            self.root.append(&root_layer.encoding);
            root_layer.encoding.reset();
        }
        &self.root
    }

    /// Clears all recorded state, preserving storage. Bumps the version.
    pub fn reset(&mut self) {
        self.root.reset();
        self.layers.truncate(1);
        let root_layer = &mut self.layers[0];
        root_layer.encoding.reset();
        root_layer.bounds = RectF::EMPTY;
        root_layer.transform = Transform2F::default();
        self.transform_stack.clear();
        self.clip_stack.clear();
        self.transform = Transform2F::default();
        self.images.clear();
        self.image_indices.clear();
        self.bounds = RectF::EMPTY;
        self.version += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::Decoder;
    use crate::encoding::Tag;
    use vexel_content::color::ColorU;

    fn red() -> Brush {
        Brush::solid(ColorU::new(255, 0, 0, 255))
    }

    fn unit_rect() -> Shape {
        Shape::Rect(RectF::new(0.0, 0.0, 100.0, 100.0))
    }

    #[test]
    fn bounds_include_transformed_coordinates() {
        let mut scene = Scene::new();
        scene.fill(
            FillRule::Winding,
            Transform2F::from_translation(vec2f(200.0, 300.0)),
            red(),
            &unit_rect(),
        );
        let bounds = scene.encoding().bounds();
        assert!(bounds.max_x >= 300.0);
        assert!(bounds.max_y >= 400.0);
    }

    #[test]
    fn stroke_bounds_expand_by_half_width() {
        let mut scene = Scene::new();
        let style = StrokeStyle { line_width: 10.0, ..StrokeStyle::default() };
        scene.stroke(&style, Transform2F::default(), red(), &unit_rect());
        let bounds = scene.bounds();
        assert!(bounds.min_x <= -5.0 + 1e-4);
        assert!(bounds.max_x >= 105.0 - 1e-4);
    }

    #[test]
    fn clip_does_not_enlarge_bounds() {
        let mut scene = Scene::new();
        scene.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        let drawn = scene.bounds();
        scene.push_clip(Some(&Shape::Rect(RectF::new(-1000.0, -1000.0, 1000.0, 1000.0))));
        scene.pop_clip();
        assert_eq!(scene.bounds(), drawn);
        let enc_bounds = scene.encoding().bounds();
        assert!(enc_bounds.max_x <= 100.0 + 1e-4);
    }

    #[test]
    fn clip_constrains_drawn_bounds() {
        let mut scene = Scene::new();
        scene.push_clip(Some(&Shape::Rect(RectF::new(0.0, 0.0, 10.0, 10.0))));
        scene.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        scene.pop_clip();
        assert!(scene.bounds().max_x <= 10.0 + 1e-4);
    }

    #[test]
    fn push_pop_restores_depths() {
        let mut scene = Scene::new();
        assert_eq!(scene.layer_depth(), 0);
        scene.push_layer(BlendMode::Multiply, 0.5, None);
        scene.push_transform();
        scene.push_clip(Some(&unit_rect()));
        assert_eq!(scene.layer_depth(), 1);
        assert_eq!(scene.transform_depth(), 1);
        assert_eq!(scene.clip_depth(), 1);
        scene.pop_clip();
        scene.pop_transform();
        scene.pop_layer();
        assert_eq!(scene.layer_depth(), 0);
        assert_eq!(scene.transform_depth(), 0);
        assert_eq!(scene.clip_depth(), 0);
    }

    #[test]
    fn pop_layer_at_root_is_a_no_op() {
        let mut scene = Scene::new();
        let version = scene.version();
        assert!(!scene.pop_layer());
        assert_eq!(scene.version(), version);
    }

    #[test]
    fn version_bumps_on_identical_set_transform() {
        let mut scene = Scene::new();
        let v0 = scene.version();
        scene.set_transform(Transform2F::default());
        assert_eq!(scene.version(), v0 + 1);
        scene.set_transform(Transform2F::default());
        assert_eq!(scene.version(), v0 + 2);
    }

    #[test]
    fn push_clip_none_is_silent() {
        let mut scene = Scene::new();
        let v0 = scene.version();
        scene.push_clip(None);
        assert_eq!(scene.version(), v0);
        assert_eq!(scene.clip_depth(), 0);
    }

    #[test]
    fn encoding_is_idempotent() {
        let mut scene = Scene::new();
        scene.push_layer(BlendMode::SrcOver, 1.0, None);
        scene.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        let first = scene.encoding().clone();
        let second = scene.encoding().clone();
        assert_eq!(first.tags(), second.tags());
        assert_eq!(first.hash(), second.hash());
    }

    #[test]
    fn layer_markers_nest_around_body() {
        let mut scene = Scene::new();
        scene.push_layer(BlendMode::Multiply, 0.5, Some(&unit_rect()));
        scene.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        scene.pop_layer();

        let encoding = scene.encoding();
        let mut decoder = Decoder::new(encoding);
        let mut tags = vec![];
        while let Some(tag) = decoder.next() {
            tags.push(tag);
        }
        let push_at = tags.iter().position(|&t| t == Tag::PushLayer).unwrap();
        let begin_clip_at = tags.iter().position(|&t| t == Tag::BeginClip).unwrap();
        let end_clip_at = tags.iter().position(|&t| t == Tag::EndClip).unwrap();
        let pop_at = tags.iter().position(|&t| t == Tag::PopLayer).unwrap();
        assert!(push_at < begin_clip_at);
        assert!(begin_clip_at < end_clip_at);
        assert!(end_clip_at < pop_at);
    }

    #[test]
    fn reset_behaves_like_fresh_scene() {
        let mut scene = Scene::new();
        scene.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        scene.push_layer(BlendMode::Screen, 0.3, None);
        scene.reset();
        assert!(scene.is_empty());
        assert_eq!(scene.layer_depth(), 0);
        assert!(scene.bounds().is_empty());

        scene.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        let mut fresh = Scene::new();
        fresh.fill(FillRule::Winding, Transform2F::default(), red(), &unit_rect());
        assert_eq!(scene.encoding().hash(), fresh.encoding().hash());
    }

    #[test]
    fn image_registry_dedups_by_identity() {
        use vexel_raster::Pixmap;
        let mut scene = Scene::new();
        let image = Image::from_pixmap(Pixmap::new(8, 8));
        scene.draw_image(&image, Transform2F::default());
        scene.draw_image(&image.clone(), Transform2F::from_translation(vec2f(20.0, 0.0)));
        let other = Image::from_pixmap(Pixmap::new(8, 8));
        scene.draw_image(&other, Transform2F::default());
        assert_eq!(scene.images().len(), 2);
        assert!(scene.bounds().max_x >= 28.0);
    }
}
