// vexel/renderer/src/tests.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! End-to-end renderer scenarios.

use crate::concurrent::CancellationToken;
use crate::error::RenderError;
use crate::paint::Brush;
use crate::renderer::{Renderer, RendererOptions};
use crate::scene::Scene;
use vexel_content::color::ColorU;
use vexel_content::effects::BlendMode;
use vexel_content::fill::FillRule;
use vexel_content::shape::Shape;
use vexel_content::stroke::StrokeStyle;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::vec2f;
use vexel_raster::Pixmap;

fn renderer(width: u32, height: u32) -> Renderer {
    let mut options = RendererOptions::new(width, height);
    options.worker_count = 2;
    Renderer::new(options).unwrap()
}

fn solid(r: u8, g: u8, b: u8, a: u8) -> Brush {
    Brush::solid(ColorU::new(r, g, b, a))
}

fn rect(min_x: f32, min_y: f32, w: f32, h: f32) -> Shape {
    Shape::Rect(RectF::new(min_x, min_y, min_x + w, min_y + h))
}

fn channel(pixmap: &Pixmap, x: u32, y: u32, index: usize) -> f32 {
    pixmap.get_pixel(x, y)[index] as f32 / 255.0
}

fn alpha(pixmap: &Pixmap, x: u32, y: u32) -> f32 {
    channel(pixmap, x, y, 3)
}

#[test]
fn background_is_preserved() {
    let mut target = Pixmap::new(200, 200);
    target.clear(ColorU::white());
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(255, 0, 0, 255),
        &rect(80.0, 80.0, 40.0, 40.0),
    );
    renderer(200, 200).render(&mut target, &mut scene).unwrap();

    assert_eq!(target.get_pixel(100, 100), [255, 0, 0, 255]);
    assert_eq!(target.get_pixel(10, 10), [255, 255, 255, 255]);
}

#[test]
fn circle_fill_is_antialiased() {
    let mut target = Pixmap::new(200, 200);
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 255, 0, 255),
        &Shape::Circle { center: vec2f(100.0, 100.0), radius: 40.0 },
    );
    renderer(200, 200).render(&mut target, &mut scene).unwrap();

    assert!(alpha(&target, 100, 100) >= 0.9);
    assert!(channel(&target, 100, 100, 1) >= 0.9);
    assert!(alpha(&target, 10, 10) <= 0.1);
    let partially_covered = (138..=142)
        .map(|x| alpha(&target, x, 100))
        .any(|a| a > 0.05 && a < 0.95);
    assert!(partially_covered, "rim should carry partial coverage");
}

#[test]
fn stroked_circle_is_visible() {
    let mut target = Pixmap::new(200, 200);
    let mut scene = Scene::new();
    let style = StrokeStyle { line_width: 3.0, ..StrokeStyle::default() };
    scene.stroke(
        &style,
        Transform2F::default(),
        solid(0, 0, 255, 255),
        &Shape::Circle { center: vec2f(100.0, 100.0), radius: 40.0 },
    );
    renderer(200, 200).render(&mut target, &mut scene).unwrap();

    let rim_blue = (137..=143).any(|x| {
        alpha(&target, x, 100) >= 0.5 && channel(&target, x, 100, 2) >= 0.4
    });
    assert!(rim_blue, "stroke rim must be blue and visible");
    assert!(alpha(&target, 100, 100) <= 0.1);
}

#[test]
fn alpha_compositing_blends_overlap() {
    let mut target = Pixmap::new(256, 256);
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(255, 0, 0, 255),
        &rect(50.0, 50.0, 100.0, 100.0),
    );
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 0, 255, 128),
        &rect(80.0, 80.0, 100.0, 100.0),
    );
    renderer(256, 256).render(&mut target, &mut scene).unwrap();

    // Pure red region.
    assert!(channel(&target, 60, 60, 0) > 0.9);
    assert!(alpha(&target, 60, 60) > 0.9);
    // Pure half-blue region.
    let blue_only = target.get_pixel(170, 170);
    assert!((blue_only[3] as i32 - 128).abs() <= 2);
    assert!(blue_only[2] > 100);
    // Overlap blends both.
    let overlap = target.get_pixel(100, 100);
    assert!(overlap[3] >= 230);
    let r = overlap[0] as f32 / 255.0;
    let b = overlap[2] as f32 / 255.0;
    assert!(r > 0.35 && r < 0.65, "red ≈ 0.5 after 50% blue over it, got {}", r);
    assert!(b > 0.1);
}

#[test]
fn encoding_bounds_include_transform() {
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::from_translation(vec2f(200.0, 300.0)),
        solid(1, 2, 3, 255),
        &rect(0.0, 0.0, 100.0, 100.0),
    );
    let bounds = scene.encoding().bounds();
    assert!(bounds.max_x >= 300.0);
    assert!(bounds.max_y >= 400.0);
}

#[test]
fn translated_content_actually_renders() {
    // The companion regression to the bounds test: content drawn entirely
    // through a transform must survive tile early-rejection.
    let mut target = Pixmap::new(512, 512);
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::from_translation(vec2f(300.0, 300.0)),
        solid(255, 0, 0, 255),
        &rect(0.0, 0.0, 50.0, 50.0),
    );
    renderer(512, 512).render(&mut target, &mut scene).unwrap();
    assert_eq!(target.get_pixel(320, 320), [255, 0, 0, 255]);
    assert_eq!(target.get_pixel(20, 20), [0, 0, 0, 0]);
}

#[test]
fn dirty_region_rendering_is_incremental() {
    let mut target = Pixmap::new(200, 200);
    target.clear(ColorU::white());
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 128, 255, 255),
        &rect(0.0, 0.0, 200.0, 200.0),
    );
    let mut renderer = renderer(200, 200);
    renderer.render(&mut target, &mut scene).unwrap();
    let before = target.get_pixel(150, 150);

    renderer.mark_dirty(RectF::new(10.0, 10.0, 60.0, 60.0));
    assert!(renderer.dirty_tile_count() <= 2);
    renderer.render_dirty(&mut target, &mut scene).unwrap();
    let stats = renderer.stats();
    assert!(stats.tiles_dirty <= 2);
    assert_eq!(target.get_pixel(150, 150), before);

    // With nothing dirty, render_dirty returns without touching stats.
    renderer.render_dirty(&mut target, &mut scene).unwrap();
}

#[test]
fn shape_outside_viewport_changes_nothing() {
    let mut target = Pixmap::new(128, 128);
    target.clear(ColorU::white());
    let reference = target.data().to_vec();

    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(255, 0, 0, 255),
        &rect(500.0, 500.0, 50.0, 50.0),
    );
    renderer(128, 128).render(&mut target, &mut scene).unwrap();
    assert_eq!(target.data(), &reference[..]);
}

#[test]
fn empty_scene_leaves_target_untouched() {
    let mut target = Pixmap::new(100, 100);
    target.clear(ColorU::new(7, 8, 9, 255));
    let reference = target.data().to_vec();
    let mut scene = Scene::new();
    renderer(100, 100).render(&mut target, &mut scene).unwrap();
    assert_eq!(target.data(), &reference[..]);
}

#[test]
fn layer_alpha_applies_on_pop() {
    let mut target = Pixmap::new(128, 128);
    target.clear(ColorU::white());
    let mut scene = Scene::new();
    scene.push_layer(BlendMode::SrcOver, 0.5, None);
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 0, 0, 255),
        &rect(0.0, 0.0, 128.0, 128.0),
    );
    scene.pop_layer();
    renderer(128, 128).render(&mut target, &mut scene).unwrap();

    // 50% black over white is mid gray.
    let pixel = target.get_pixel(64, 64);
    assert!((pixel[0] as i32 - 127).abs() <= 3, "got {:?}", pixel);
    assert_eq!(pixel[3], 255);
}

#[test]
fn clip_limits_painted_region() {
    let mut target = Pixmap::new(128, 128);
    let mut scene = Scene::new();
    scene.push_clip(Some(&rect(0.0, 0.0, 40.0, 128.0)));
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(255, 0, 0, 255),
        &rect(0.0, 0.0, 128.0, 128.0),
    );
    scene.pop_clip();
    renderer(128, 128).render(&mut target, &mut scene).unwrap();

    assert!(alpha(&target, 20, 64) > 0.9);
    assert!(alpha(&target, 80, 64) < 0.05);
}

#[test]
fn clipped_layer_composites_inside_clip_only() {
    let mut target = Pixmap::new(128, 128);
    let mut scene = Scene::new();
    scene.push_layer(BlendMode::SrcOver, 1.0, Some(&rect(0.0, 0.0, 64.0, 128.0)));
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 255, 0, 255),
        &rect(0.0, 0.0, 128.0, 128.0),
    );
    scene.pop_layer();
    renderer(128, 128).render(&mut target, &mut scene).unwrap();

    assert!(alpha(&target, 32, 64) > 0.9);
    assert!(alpha(&target, 100, 64) < 0.05);
}

#[test]
fn pre_cancelled_render_reports_cancelled() {
    let mut target = Pixmap::new(64, 64);
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(1, 1, 1, 255),
        &rect(0.0, 0.0, 64.0, 64.0),
    );
    let token = CancellationToken::new();
    token.cancel();
    let result = renderer(64, 64).render_with_context(&token, &mut target, &mut scene);
    assert_eq!(result, Err(RenderError::Cancelled));
}

#[test]
fn invalid_dimensions_are_rejected() {
    assert!(matches!(
        Renderer::new(RendererOptions::new(0, 100)),
        Err(RenderError::InvalidConfiguration(_))
    ));
    assert!(matches!(
        Renderer::new(RendererOptions::new(100, 0)),
        Err(RenderError::InvalidConfiguration(_))
    ));
}

#[test]
fn repeat_render_hits_tile_cache() {
    let mut target = Pixmap::new(128, 128);
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(10, 20, 30, 255),
        &rect(0.0, 0.0, 128.0, 128.0),
    );
    let mut renderer = renderer(128, 128);
    renderer.render(&mut target, &mut scene).unwrap();
    let first = renderer.stats();
    assert!(first.layers_rendered > 0);

    renderer.render(&mut target, &mut scene).unwrap();
    let second = renderer.stats();
    assert!(second.layers_cached > 0, "second frame should reuse cached tiles");
    assert!(renderer.cache_stats().hits > 0);
}

#[test]
fn resize_keeps_rendering_correct() {
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(255, 0, 0, 255),
        &rect(0.0, 0.0, 300.0, 300.0),
    );
    let mut renderer = renderer(128, 128);
    let mut small = Pixmap::new(128, 128);
    renderer.render(&mut small, &mut scene).unwrap();

    renderer.resize(256, 256);
    assert_eq!(renderer.dirty_tile_count(), 16);
    let mut large = Pixmap::new(256, 256);
    renderer.render(&mut large, &mut scene).unwrap();
    assert!(alpha(&large, 250, 250) > 0.9);
}

#[test]
fn rounded_rect_with_huge_radius_matches_circle() {
    let mut round_target = Pixmap::new(128, 128);
    let mut circle_target = Pixmap::new(128, 128);

    let mut round_scene = Scene::new();
    round_scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 0, 0, 255),
        &Shape::RoundedRect(RectF::new(20.0, 20.0, 100.0, 100.0), 200.0),
    );
    let mut circle_scene = Scene::new();
    circle_scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(0, 0, 0, 255),
        &Shape::Circle { center: vec2f(60.0, 60.0), radius: 40.0 },
    );

    renderer(128, 128).render(&mut round_target, &mut round_scene).unwrap();
    renderer(128, 128).render(&mut circle_target, &mut circle_scene).unwrap();

    // Corner coverage must agree closely; both are the same clamped arc.
    for &(x, y) in &[(32u32, 32u32), (88, 32), (60, 21), (21, 60), (88, 88)] {
        let a = alpha(&round_target, x, y);
        let b = alpha(&circle_target, x, y);
        assert!((a - b).abs() < 0.08, "at ({}, {}): {} vs {}", x, y, a, b);
    }
}

#[test]
fn image_draw_blits_pixels() {
    use vexel_raster::Image;
    let mut source = Pixmap::new(16, 16);
    source.clear(ColorU::new(200, 100, 50, 255));
    let image = Image::from_pixmap(source);

    let mut target = Pixmap::new(128, 128);
    let mut scene = Scene::new();
    scene.draw_image(&image, Transform2F::from_translation(vec2f(30.0, 30.0)));
    renderer(128, 128).render(&mut target, &mut scene).unwrap();

    assert_eq!(target.get_pixel(38, 38), [200, 100, 50, 255]);
    assert_eq!(target.get_pixel(10, 10), [0, 0, 0, 0]);
}

mod properties {
    use super::*;
    use crate::cache::LayerCache;
    use crate::decoder::Decoder;
    use quickcheck::quickcheck;
    use std::sync::Arc;

    fn scene_from(rects: &[(i8, i8, u8, u8)]) -> Scene {
        let mut scene = Scene::new();
        for &(x, y, w, h) in rects {
            let shape = rect(x as f32, y as f32, w as f32 + 1.0, h as f32 + 1.0);
            scene.fill(
                FillRule::Winding,
                Transform2F::default(),
                solid(w, h, x as u8, 255),
                &shape,
            );
        }
        scene
    }

    quickcheck! {
        fn prop_cursors_drain_streams_exactly(rects: Vec<(i8, i8, u8, u8)>) -> bool {
            let mut scene = scene_from(&rects);
            let encoding = scene.encoding();
            let mut decoder = Decoder::new(encoding);
            while let Some(tag) = decoder.next() {
                match tag {
                    crate::encoding::Tag::Transform => {
                        decoder.read_transform();
                    }
                    crate::encoding::Tag::MoveTo | crate::encoding::Tag::LineTo => {
                        decoder.read_line();
                    }
                    crate::encoding::Tag::QuadTo => {
                        decoder.read_quad();
                    }
                    crate::encoding::Tag::CubicTo => {
                        decoder.read_cubic();
                    }
                    crate::encoding::Tag::Fill => {
                        decoder.read_fill();
                    }
                    crate::encoding::Tag::Stroke => {
                        decoder.read_stroke();
                    }
                    crate::encoding::Tag::PushLayer => {
                        decoder.read_push_layer();
                    }
                    crate::encoding::Tag::Brush => {
                        decoder.read_brush();
                    }
                    crate::encoding::Tag::Image => {
                        decoder.read_image();
                    }
                    _ => {}
                }
            }
            let (_, path, draw, transform) = decoder.position();
            path == encoding.path_data().len()
                && draw == encoding.draw_data().len()
                && transform == encoding.transforms().len()
        }

        fn prop_hash_stable_under_clone(rects: Vec<(i8, i8, u8, u8)>) -> bool {
            let mut scene = scene_from(&rects);
            let encoding = scene.encoding().clone();
            encoding.hash() == encoding.clone().hash()
        }

        fn prop_cache_size_bounded(sides: Vec<u8>) -> bool {
            let cache = LayerCache::new(32 * 1024);
            for (key, &side) in sides.iter().enumerate() {
                let side = (side as u32 % 64) + 1;
                cache.put(key as u64, Arc::new(Pixmap::new(side, side)), 0);
                if cache.size() > cache.max_size() {
                    return false;
                }
            }
            true
        }

        fn prop_scene_bounds_cover_every_fill(rects: Vec<(i8, i8, u8, u8)>) -> bool {
            let mut scene = scene_from(&rects);
            let scene_bounds = scene.bounds();
            let enc_bounds = scene.encoding().bounds();
            rects.iter().all(|&(x, y, w, h)| {
                let shape_bounds = RectF::new(
                    x as f32,
                    y as f32,
                    x as f32 + w as f32 + 1.0,
                    y as f32 + h as f32 + 1.0,
                );
                contains_rect(scene_bounds, shape_bounds)
                    && contains_rect(enc_bounds, shape_bounds)
            })
        }
    }

    fn contains_rect(outer: RectF, inner: RectF) -> bool {
        outer.min_x <= inner.min_x + 1e-4
            && outer.min_y <= inner.min_y + 1e-4
            && outer.max_x >= inner.max_x - 1e-4
            && outer.max_y >= inner.max_y - 1e-4
    }
}

#[test]
fn close_keeps_renderer_usable() {
    let mut target = Pixmap::new(100, 100);
    let mut scene = Scene::new();
    scene.fill(
        FillRule::Winding,
        Transform2F::default(),
        solid(9, 9, 9, 255),
        &rect(0.0, 0.0, 100.0, 100.0),
    );
    let mut renderer = renderer(100, 100);
    renderer.close();
    // Inline fallback still renders correctly.
    renderer.render(&mut target, &mut scene).unwrap();
    assert!(alpha(&target, 50, 50) > 0.9);
}
