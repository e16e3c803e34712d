// vexel/canvas/src/lib.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A fluent wrapper over `Scene` for building retained scenes with
//! method chaining and scoped layer/clip/transform blocks.

use vexel_content::effects::BlendMode;
use vexel_content::fill::FillRule;
use vexel_content::shape::Shape;
use vexel_content::stroke::StrokeStyle;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::{vec2f, Vector2F};
use vexel_raster::Image;
use vexel_renderer::paint::Brush;
use vexel_renderer::scene::Scene;

/// Chainable scene construction. Every drawing method returns `&mut Self`;
/// `build` hands the finished scene over and leaves the builder fresh.
#[derive(Default)]
pub struct SceneBuilder {
    scene: Scene,
}

impl SceneBuilder {
    #[inline]
    pub fn new() -> SceneBuilder {
        SceneBuilder { scene: Scene::new() }
    }

    #[inline]
    pub fn from_scene(scene: Scene) -> SceneBuilder {
        SceneBuilder { scene }
    }

    #[inline]
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn fill(
        &mut self,
        rule: FillRule,
        transform: Transform2F,
        brush: Brush,
        shape: &Shape,
    ) -> &mut Self {
        self.scene.fill(rule, transform, brush, shape);
        self
    }

    pub fn stroke(
        &mut self,
        style: &StrokeStyle,
        transform: Transform2F,
        brush: Brush,
        shape: &Shape,
    ) -> &mut Self {
        self.scene.stroke(style, transform, brush, shape);
        self
    }

    pub fn draw_image(&mut self, image: &Image, transform: Transform2F) -> &mut Self {
        self.scene.draw_image(image, transform);
        self
    }

    /// Scales `image` into `rect`. The placement transform is
    /// `parent ∘ translate(rect.min) ∘ scale(rect.w / img.w, rect.h / img.h)`,
    /// so the image's unit box lands exactly on `rect` under the current
    /// transform.
    pub fn image_in_rect(&mut self, image: &Image, rect: RectF) -> &mut Self {
        if image.width() == 0 || image.height() == 0 || rect.is_empty() {
            return self;
        }
        let scale = vec2f(
            rect.width() / image.width() as f32,
            rect.height() / image.height() as f32,
        );
        let transform = Transform2F::from_translation(rect.min()) * Transform2F::from_scale(scale);
        self.scene.draw_image(image, transform);
        self
    }

    pub fn push_layer(
        &mut self,
        blend_mode: BlendMode,
        alpha: f32,
        clip: Option<&Shape>,
    ) -> &mut Self {
        self.scene.push_layer(blend_mode, alpha, clip);
        self
    }

    pub fn pop_layer(&mut self) -> &mut Self {
        self.scene.pop_layer();
        self
    }

    pub fn push_clip(&mut self, shape: Option<&Shape>) -> &mut Self {
        self.scene.push_clip(shape);
        self
    }

    pub fn pop_clip(&mut self) -> &mut Self {
        self.scene.pop_clip();
        self
    }

    pub fn set_transform(&mut self, transform: Transform2F) -> &mut Self {
        self.scene.set_transform(transform);
        self
    }

    pub fn translate(&mut self, offset: Vector2F) -> &mut Self {
        self.scene.translate(offset);
        self
    }

    pub fn scale(&mut self, factors: Vector2F) -> &mut Self {
        self.scene.scale(factors);
        self
    }

    pub fn rotate(&mut self, theta: f32) -> &mut Self {
        self.scene.rotate(theta);
        self
    }

    /// Runs `body` inside a layer, popping it afterwards even if the body
    /// pushed unbalanced clips (the scene closes those on pop).
    pub fn layer<F>(
        &mut self,
        blend_mode: BlendMode,
        alpha: f32,
        clip: Option<&Shape>,
        body: F,
    ) -> &mut Self
    where
        F: FnOnce(&mut SceneBuilder),
    {
        self.scene.push_layer(blend_mode, alpha, clip);
        body(self);
        self.scene.pop_layer();
        self
    }

    /// Runs `body` with drawing restricted to `shape`.
    pub fn clip<F>(&mut self, shape: &Shape, body: F) -> &mut Self
    where
        F: FnOnce(&mut SceneBuilder),
    {
        self.scene.push_clip(Some(shape));
        body(self);
        self.scene.pop_clip();
        self
    }

    /// A plain source-over, full-alpha layer scope.
    pub fn group<F>(&mut self, body: F) -> &mut Self
    where
        F: FnOnce(&mut SceneBuilder),
    {
        self.layer(BlendMode::SrcOver, 1.0, None, body)
    }

    /// Runs `body` with `transform` composed onto the current transform,
    /// restoring the previous transform afterwards.
    pub fn with_transform<F>(&mut self, transform: Transform2F, body: F) -> &mut Self
    where
        F: FnOnce(&mut SceneBuilder),
    {
        self.scene.push_transform();
        let combined = self.scene.current_transform() * transform;
        self.scene.set_transform(combined);
        body(self);
        self.scene.pop_transform();
        self
    }

    /// Returns the built scene and resets the builder.
    pub fn build(&mut self) -> Scene {
        std::mem::take(&mut self.scene)
    }

    pub fn reset(&mut self) -> &mut Self {
        self.scene.reset();
        self
    }
}
