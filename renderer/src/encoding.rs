// vexel/renderer/src/encoding.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The dual-stream command encoding.
//!
//! Drawing commands are serialized as a byte-tag stream plus typed data
//! streams (f32 coordinates, u32 draw parameters, transforms, brushes).
//! Every tag has a fixed footprint in each stream, so four independent
//! cursors walking the tag stream consume the data streams exactly.

use crate::paint::Brush;
use vexel_content::fill::FillRule;
use vexel_content::path::{Path, PathEvent};
use vexel_content::stroke::StrokeStyle;
use vexel_content::effects::BlendMode;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::Vector2F;

/// Command opcodes. Each tag's footprint in the typed streams is fixed:
///
/// | tag        | path f32 | draw u32 | transforms | brushes |
/// |------------|----------|----------|------------|---------|
/// | Transform  | 0        | 0        | 1          | 0       |
/// | BeginPath  | 0        | 0        | 0          | 0       |
/// | MoveTo     | 2        | 0        | 0          | 0       |
/// | LineTo     | 2        | 0        | 0          | 0       |
/// | QuadTo     | 4        | 0        | 0          | 0       |
/// | CubicTo    | 6        | 0        | 0          | 0       |
/// | ClosePath  | 0        | 0        | 0          | 0       |
/// | EndPath    | 0        | 0        | 0          | 0       |
/// | Fill       | 0        | 2        | 0          | 1       |
/// | Stroke     | 0        | 5        | 0          | 1       |
/// | PushLayer  | 0        | 2        | 0          | 0       |
/// | PopLayer   | 0        | 0        | 0          | 0       |
/// | BeginClip  | 0        | 0        | 0          | 0       |
/// | EndClip    | 0        | 0        | 0          | 0       |
/// | Brush      | 4        | 0        | 0          | 1       |
/// | Image      | 0        | 1        | 1          | 0       |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Tag {
    Transform = 0,
    BeginPath = 1,
    MoveTo = 2,
    LineTo = 3,
    QuadTo = 4,
    CubicTo = 5,
    ClosePath = 6,
    EndPath = 7,
    Fill = 8,
    Stroke = 9,
    PushLayer = 10,
    PopLayer = 11,
    BeginClip = 12,
    EndClip = 13,
    Brush = 14,
    Image = 15,
}

impl Tag {
    pub fn from_u8(value: u8) -> Option<Tag> {
        Some(match value {
            0 => Tag::Transform,
            1 => Tag::BeginPath,
            2 => Tag::MoveTo,
            3 => Tag::LineTo,
            4 => Tag::QuadTo,
            5 => Tag::CubicTo,
            6 => Tag::ClosePath,
            7 => Tag::EndPath,
            8 => Tag::Fill,
            9 => Tag::Stroke,
            10 => Tag::PushLayer,
            11 => Tag::PopLayer,
            12 => Tag::BeginClip,
            13 => Tag::EndClip,
            14 => Tag::Brush,
            15 => Tag::Image,
            _ => return None,
        })
    }

    /// Footprints as `(path_data, draw_data, transforms, brushes)`.
    pub fn footprint(self) -> (usize, usize, usize, usize) {
        match self {
            Tag::Transform => (0, 0, 1, 0),
            Tag::BeginPath | Tag::ClosePath | Tag::EndPath => (0, 0, 0, 0),
            Tag::MoveTo | Tag::LineTo => (2, 0, 0, 0),
            Tag::QuadTo => (4, 0, 0, 0),
            Tag::CubicTo => (6, 0, 0, 0),
            Tag::Fill => (0, 2, 0, 1),
            Tag::Stroke => (0, 5, 0, 1),
            Tag::PushLayer => (0, 2, 0, 0),
            Tag::PopLayer | Tag::BeginClip | Tag::EndClip => (0, 0, 0, 0),
            Tag::Brush => (4, 0, 0, 1),
            Tag::Image => (0, 1, 1, 0),
        }
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

#[inline]
pub(crate) fn fnv1a(mut hash: u64, bytes: &[u8]) -> u64 {
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// A finalized sequence of drawing commands, immutable once handed to the
/// renderer.
#[derive(Clone, Debug, Default)]
pub struct Encoding {
    tags: Vec<u8>,
    path_data: Vec<f32>,
    draw_data: Vec<u32>,
    transforms: Vec<Transform2F>,
    brushes: Vec<Brush>,
    bounds: RectF,
    path_bounds: RectF,
    path_count: u32,
    shape_count: u32,
}

impl Encoding {
    #[inline]
    pub fn new() -> Encoding {
        Encoding {
            bounds: RectF::EMPTY,
            path_bounds: RectF::EMPTY,
            ..Encoding::default()
        }
    }

    #[inline]
    pub fn tags(&self) -> &[u8] {
        &self.tags
    }

    #[inline]
    pub fn path_data(&self) -> &[f32] {
        &self.path_data
    }

    #[inline]
    pub fn draw_data(&self) -> &[u32] {
        &self.draw_data
    }

    #[inline]
    pub fn transforms(&self) -> &[Transform2F] {
        &self.transforms
    }

    #[inline]
    pub fn brushes(&self) -> &[Brush] {
        &self.brushes
    }

    #[inline]
    pub fn bounds(&self) -> RectF {
        self.bounds
    }

    #[inline]
    pub fn path_count(&self) -> u32 {
        self.path_count
    }

    #[inline]
    pub fn shape_count(&self) -> u32 {
        self.shape_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Unions an externally computed rectangle (e.g. transformed shape
    /// bounds) into the cumulative bounds. Raw path coordinates alone miss
    /// content drawn under a non-identity transform, which would defeat
    /// tile early-rejection.
    #[inline]
    pub fn add_bounds(&mut self, rect: RectF) {
        self.bounds = self.bounds.union(rect);
    }

    pub fn encode_transform(&mut self, transform: Transform2F) {
        self.tags.push(Tag::Transform as u8);
        self.transforms.push(transform);
    }

    /// Serializes a path. Empty paths are no-ops. The path's raw bounds are
    /// unioned into the cumulative bounds at `EndPath`.
    pub fn encode_path(&mut self, path: &Path) {
        self.encode_path_inner(path, true);
    }

    /// Serializes a clip path. Identical to `encode_path` except the
    /// cumulative bounds are left untouched: a clip constrains rendering
    /// and must never enlarge the rendered region.
    pub fn encode_clip_path(&mut self, path: &Path) {
        self.encode_path_inner(path, false);
    }

    fn encode_path_inner(&mut self, path: &Path, update_bounds: bool) {
        if path.is_empty() {
            return;
        }
        self.tags.push(Tag::BeginPath as u8);
        self.path_bounds = RectF::EMPTY;
        for event in path.events() {
            match event {
                PathEvent::MoveTo(p) => {
                    self.tags.push(Tag::MoveTo as u8);
                    self.push_point(p);
                }
                PathEvent::LineTo(p) => {
                    self.tags.push(Tag::LineTo as u8);
                    self.push_point(p);
                }
                PathEvent::QuadTo(c, p) => {
                    self.tags.push(Tag::QuadTo as u8);
                    self.push_point(c);
                    self.push_point(p);
                }
                PathEvent::CubicTo(c0, c1, p) => {
                    self.tags.push(Tag::CubicTo as u8);
                    self.push_point(c0);
                    self.push_point(c1);
                    self.push_point(p);
                }
                PathEvent::Close => self.tags.push(Tag::ClosePath as u8),
            }
        }
        self.tags.push(Tag::EndPath as u8);
        if update_bounds {
            self.bounds = self.bounds.union(self.path_bounds);
        }
        self.path_count += 1;
    }

    #[inline]
    fn push_point(&mut self, point: Vector2F) {
        self.path_bounds = self.path_bounds.union_point(point);
        self.path_data.push(point.x);
        self.path_data.push(point.y);
    }

    pub fn encode_fill(&mut self, brush: Brush, rule: FillRule) {
        let brush_index = self.brushes.len() as u32;
        self.brushes.push(brush);
        self.draw_data.push(brush_index);
        self.draw_data.push(rule.to_u32());
        self.tags.push(Tag::Fill as u8);
        self.shape_count += 1;
    }

    pub fn encode_stroke(&mut self, brush: Brush, style: &StrokeStyle) {
        let brush_index = self.brushes.len() as u32;
        self.brushes.push(brush);
        self.draw_data.push(brush_index);
        self.draw_data.push(style.line_width.to_bits());
        self.draw_data.push(style.miter_limit.to_bits());
        self.draw_data.push(style.cap.to_u32());
        self.draw_data.push(style.join.to_u32());
        self.tags.push(Tag::Stroke as u8);
        self.shape_count += 1;
    }

    pub fn encode_push_layer(&mut self, mode: BlendMode, alpha: f32) {
        self.draw_data.push(mode.to_u32());
        self.draw_data.push(alpha.to_bits());
        self.tags.push(Tag::PushLayer as u8);
    }

    pub fn encode_pop_layer(&mut self) {
        self.tags.push(Tag::PopLayer as u8);
    }

    pub fn encode_begin_clip(&mut self) {
        self.tags.push(Tag::BeginClip as u8);
    }

    pub fn encode_end_clip(&mut self) {
        self.tags.push(Tag::EndClip as u8);
    }

    /// Defines a standalone brush. Its color travels in the f32 stream.
    pub fn encode_brush(&mut self, brush: Brush) {
        let color = brush.color().to_f32();
        self.path_data.push(color.r);
        self.path_data.push(color.g);
        self.path_data.push(color.b);
        self.path_data.push(color.a);
        self.brushes.push(brush);
        self.tags.push(Tag::Brush as u8);
    }

    pub fn encode_image(&mut self, image_index: u32, transform: Transform2F) {
        self.draw_data.push(image_index);
        self.transforms.push(transform);
        self.tags.push(Tag::Image as u8);
    }

    /// Concatenates `other` onto this encoding. Brush indices inside the
    /// appended draw data are offset by the current brush-table length,
    /// located by walking the appended tags. Bounds union; counters sum.
    pub fn append(&mut self, other: &Encoding) {
        if other.is_empty() {
            return;
        }
        let brush_offset = self.brushes.len() as u32;

        self.tags.extend_from_slice(&other.tags);
        self.path_data.extend_from_slice(&other.path_data);
        self.transforms.extend_from_slice(&other.transforms);
        self.brushes.extend_from_slice(&other.brushes);

        let draw_start = self.draw_data.len();
        self.draw_data.extend_from_slice(&other.draw_data);

        let mut draw_index = draw_start;
        for &tag_byte in &other.tags {
            let tag = match Tag::from_u8(tag_byte) {
                Some(tag) => tag,
                None => continue,
            };
            if let Tag::Fill | Tag::Stroke = tag {
                self.draw_data[draw_index] += brush_offset;
            }
            draw_index += tag.footprint().1;
        }

        self.bounds = self.bounds.union(other.bounds);
        self.path_count += other.path_count;
        self.shape_count += other.shape_count;
    }

    /// Truncates every stream without releasing capacity.
    pub fn reset(&mut self) {
        self.tags.clear();
        self.path_data.clear();
        self.draw_data.clear();
        self.transforms.clear();
        self.brushes.clear();
        self.bounds = RectF::EMPTY;
        self.path_bounds = RectF::EMPTY;
        self.path_count = 0;
        self.shape_count = 0;
    }

    /// FNV-1a fingerprint over the tag, coordinate, and draw streams plus
    /// each transform's six components and each brush's color. Deterministic
    /// across runs; used as the layer-cache key.
    pub fn hash(&self) -> u64 {
        let mut hash = fnv1a(FNV_OFFSET, &self.tags);
        for &value in &self.path_data {
            hash = fnv1a(hash, &value.to_bits().to_le_bytes());
        }
        for &value in &self.draw_data {
            hash = fnv1a(hash, &value.to_le_bytes());
        }
        for transform in &self.transforms {
            for component in &[
                transform.m11(),
                transform.m12(),
                transform.m13(),
                transform.m21(),
                transform.m22(),
                transform.m23(),
            ] {
                hash = fnv1a(hash, &component.to_bits().to_le_bytes());
            }
        }
        for brush in &self.brushes {
            let color = brush.color();
            hash = fnv1a(hash, &[color.r, color.g, color.b, color.a]);
        }
        hash
    }
}
