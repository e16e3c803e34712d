// vexel/renderer/src/decoder.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A four-cursor reader over an `Encoding`.
//!
//! Each tag reader consumes exactly its tag's declared footprint and
//! advances the matching cursor. Reads past the end of a stream yield
//! zero-valued defaults; the decoder never panics on truncated input.

use crate::encoding::{Encoding, Tag};
use vexel_content::effects::BlendMode;
use vexel_content::fill::FillRule;
use vexel_content::path::Path;
use vexel_content::stroke::{LineCap, LineJoin, StrokeStyle};
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::{vec2f, Vector2F};

pub struct Decoder<'a> {
    encoding: &'a Encoding,
    tag_index: usize,
    path_index: usize,
    draw_index: usize,
    transform_index: usize,
    brush_index: usize,
}

impl<'a> Decoder<'a> {
    #[inline]
    pub fn new(encoding: &'a Encoding) -> Decoder<'a> {
        Decoder {
            encoding,
            tag_index: 0,
            path_index: 0,
            draw_index: 0,
            transform_index: 0,
            brush_index: 0,
        }
    }

    /// Rewinds all cursors to the start of the encoding.
    pub fn reset(&mut self) {
        self.tag_index = 0;
        self.path_index = 0;
        self.draw_index = 0;
        self.transform_index = 0;
        self.brush_index = 0;
    }

    /// Consumes and returns the next tag, or `None` at the end. Unknown tag
    /// bytes are skipped.
    pub fn next(&mut self) -> Option<Tag> {
        while let Some(&byte) = self.encoding.tags().get(self.tag_index) {
            self.tag_index += 1;
            if let Some(tag) = Tag::from_u8(byte) {
                return Some(tag);
            }
        }
        None
    }

    /// The next tag without consuming it.
    pub fn peek(&self) -> Option<Tag> {
        self.encoding
            .tags()
            .get(self.tag_index..)?
            .iter()
            .find_map(|&byte| Tag::from_u8(byte))
    }

    /// Cursor positions as `(tag, path, draw, transform)`.
    #[inline]
    pub fn position(&self) -> (usize, usize, usize, usize) {
        (self.tag_index, self.path_index, self.draw_index, self.transform_index)
    }

    #[inline]
    fn read_f32(&mut self) -> f32 {
        let value = self
            .encoding
            .path_data()
            .get(self.path_index)
            .copied()
            .unwrap_or(0.0);
        self.path_index += 1;
        value
    }

    #[inline]
    fn read_u32(&mut self) -> u32 {
        let value = self
            .encoding
            .draw_data()
            .get(self.draw_index)
            .copied()
            .unwrap_or(0);
        self.draw_index += 1;
        value
    }

    #[inline]
    pub fn read_point(&mut self) -> Vector2F {
        let x = self.read_f32();
        let y = self.read_f32();
        vec2f(x, y)
    }

    /// Reader for `MoveTo` and `LineTo`.
    #[inline]
    pub fn read_line(&mut self) -> Vector2F {
        self.read_point()
    }

    #[inline]
    pub fn read_quad(&mut self) -> (Vector2F, Vector2F) {
        (self.read_point(), self.read_point())
    }

    #[inline]
    pub fn read_cubic(&mut self) -> (Vector2F, Vector2F, Vector2F) {
        (self.read_point(), self.read_point(), self.read_point())
    }

    pub fn read_transform(&mut self) -> Transform2F {
        let transform = self
            .encoding
            .transforms()
            .get(self.transform_index)
            .copied()
            .unwrap_or_default();
        self.transform_index += 1;
        transform
    }

    /// Reader for `Fill`: the brush index and fill rule.
    pub fn read_fill(&mut self) -> (u32, FillRule) {
        let brush = self.read_u32();
        let rule = FillRule::from_u32(self.read_u32());
        self.brush_index += 1;
        (brush, rule)
    }

    /// Reader for `Stroke`: the brush index and stroke parameters. Float
    /// components travel as raw IEEE-754 bit patterns.
    pub fn read_stroke(&mut self) -> (u32, StrokeStyle) {
        let brush = self.read_u32();
        let line_width = f32::from_bits(self.read_u32());
        let miter_limit = f32::from_bits(self.read_u32());
        let cap = LineCap::from_u32(self.read_u32());
        let join = LineJoin::from_u32(self.read_u32());
        self.brush_index += 1;
        (brush, StrokeStyle { line_width, miter_limit, cap, join })
    }

    pub fn read_push_layer(&mut self) -> (BlendMode, f32) {
        let mode = BlendMode::from_u32(self.read_u32());
        let alpha = f32::from_bits(self.read_u32());
        (mode, alpha)
    }

    /// Reader for `Brush`: the inline RGBA components.
    pub fn read_brush(&mut self) -> [f32; 4] {
        let rgba = [
            self.read_f32(),
            self.read_f32(),
            self.read_f32(),
            self.read_f32(),
        ];
        self.brush_index += 1;
        rgba
    }

    /// Reader for `Image`: the image index and placement transform.
    pub fn read_image(&mut self) -> (u32, Transform2F) {
        let index = self.read_u32();
        let transform = self.read_transform();
        (index, transform)
    }

    /// Fast-forwards past the body of a path without materializing
    /// coordinates. Call after consuming `BeginPath`; stops after the
    /// matching `EndPath` (or the end of the stream).
    pub fn skip_path(&mut self) {
        while let Some(tag) = self.next() {
            match tag {
                Tag::EndPath => return,
                other => {
                    let (path_slots, draw_slots, transform_slots, _) = other.footprint();
                    self.path_index += path_slots;
                    self.draw_index += draw_slots;
                    self.transform_index += transform_slots;
                }
            }
        }
    }

    /// Reconstructs a `Path` from the encoded body. Call after consuming
    /// `BeginPath`; consumes through the matching `EndPath`.
    pub fn collect_path(&mut self) -> Path {
        let mut path = Path::new();
        while let Some(tag) = self.next() {
            match tag {
                Tag::MoveTo => {
                    let p = self.read_line();
                    path.move_to(p);
                }
                Tag::LineTo => {
                    let p = self.read_line();
                    path.line_to(p);
                }
                Tag::QuadTo => {
                    let (c, p) = self.read_quad();
                    path.quad_to(c, p);
                }
                Tag::CubicTo => {
                    let (c0, c1, p) = self.read_cubic();
                    path.cubic_to(c0, c1, p);
                }
                Tag::ClosePath => path.close(),
                Tag::EndPath => break,
                other => {
                    // Malformed nesting; skip the stray tag's data.
                    let (path_slots, draw_slots, transform_slots, _) = other.footprint();
                    self.path_index += path_slots;
                    self.draw_index += draw_slots;
                    self.transform_index += transform_slots;
                }
            }
        }
        path
    }
}
