// vexel/raster/src/paint.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The resolved paint handed to the rasterizer.

use vexel_content::color::ColorU;
use vexel_content::fill::FillRule;
use vexel_content::stroke::StrokeStyle;

/// A solid color plus either a fill rule or stroke parameters. Brushes are
/// resolved to concrete colors before reaching the rasterizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Paint {
    pub color: ColorU,
    pub style: PaintStyle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PaintStyle {
    Fill(FillRule),
    Stroke(StrokeStyle),
}

impl Paint {
    #[inline]
    pub fn fill(color: ColorU, rule: FillRule) -> Paint {
        Paint { color, style: PaintStyle::Fill(rule) }
    }

    #[inline]
    pub fn stroke(color: ColorU, style: StrokeStyle) -> Paint {
        Paint { color, style: PaintStyle::Stroke(style) }
    }

    #[inline]
    pub fn fill_rule(&self) -> FillRule {
        match self.style {
            PaintStyle::Fill(rule) => rule,
            PaintStyle::Stroke(_) => FillRule::Winding,
        }
    }
}
