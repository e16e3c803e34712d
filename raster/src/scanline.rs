// vexel/raster/src/scanline.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Analytic-AA scanline filling via signed-area accumulation.
//!
//! Each edge deposits fractional winding deltas into a per-pixel grid; a
//! per-row prefix sum then recovers the exact winding number at every pixel,
//! which maps to coverage under either fill rule. Coverage is analytic in x
//! and one-sample-exact in y, which in practice is indistinguishable from
//! fully analytic AA at the tile sizes involved.

use crate::blend::composite_src_over;
use crate::paint::{Paint, PaintStyle};
use crate::pixmap::Pixmap;
use crate::Rasterizer;
use log::debug;
use vexel_content::fill::FillRule;
use vexel_content::path::{FlattenSink, Path};
use vexel_content::stroke::StrokeToFill;
use vexel_geometry::vector::Vector2F;

const FLATTEN_TOLERANCE: f32 = 0.1;

/// A reusable scanline filler. Scratch buffers persist across calls so a
/// pooled instance allocates only on growth.
#[derive(Default)]
pub struct ScanlineRasterizer {
    coverage: Vec<f32>,
    width: usize,
    height: usize,
    edges: Vec<(Vector2F, Vector2F)>,
}

struct EdgeSink<'a> {
    edges: &'a mut Vec<(Vector2F, Vector2F)>,
    start: Vector2F,
    cursor: Vector2F,
}

impl<'a> FlattenSink for EdgeSink<'a> {
    fn begin_subpath(&mut self, at: Vector2F) {
        self.start = at;
        self.cursor = at;
    }

    fn line_to(&mut self, to: Vector2F) {
        self.edges.push((self.cursor, to));
        self.cursor = to;
    }

    fn end_subpath(&mut self, _closed: bool) {
        // Filling treats every subpath as closed.
        if (self.cursor - self.start).square_length() > 0.0 {
            self.edges.push((self.cursor, self.start));
            self.cursor = self.start;
        }
    }
}

impl ScanlineRasterizer {
    pub fn new() -> ScanlineRasterizer {
        ScanlineRasterizer::default()
    }

    /// Resizes scratch state for a target. Called implicitly by the fill
    /// entry points; callers pooling instances need not invoke it.
    fn prepare(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.coverage.clear();
        self.coverage.resize(width * height, 0.0);
        self.edges.clear();
    }

    fn fill_edges(&mut self, pixmap: &mut Pixmap, paint: &Paint, rule: FillRule) {
        if self.edges.is_empty() {
            return;
        }
        let edges = std::mem::replace(&mut self.edges, vec![]);
        for &(from, to) in &edges {
            self.accumulate_edge(from, to);
        }
        self.edges = edges;

        let premul = paint.color.premultiply();
        let width = self.width;
        let data = pixmap.data_mut();
        for y in 0..self.height {
            let row = y * width;
            let mut winding = 0.0f32;
            for x in 0..width {
                winding += self.coverage[row + x];
                let coverage = match rule {
                    FillRule::Winding => winding.abs().min(1.0),
                    FillRule::EvenOdd => {
                        let folded = winding.abs() % 2.0;
                        if folded > 1.0 {
                            2.0 - folded
                        } else {
                            folded
                        }
                    }
                };
                if coverage <= 0.0 {
                    continue;
                }
                let alpha = (coverage * 255.0 + 0.5) as u32;
                let src = [
                    ((premul[0] as u32 * alpha + 127) / 255) as u8,
                    ((premul[1] as u32 * alpha + 127) / 255) as u8,
                    ((premul[2] as u32 * alpha + 127) / 255) as u8,
                    ((premul[3] as u32 * alpha + 127) / 255) as u8,
                ];
                let offset = (row + x) * 4;
                let dst = [
                    data[offset],
                    data[offset + 1],
                    data[offset + 2],
                    data[offset + 3],
                ];
                let out = composite_src_over(src, dst);
                data[offset..offset + 4].copy_from_slice(&out);
            }
        }
    }

    /// Deposits the signed fractional winding contribution of one edge.
    ///
    /// Deposits left of the grid clamp to column zero so geometry beyond the
    /// left boundary still winds the whole row; deposits right of the grid
    /// are dropped, which is sound because winding accumulates from the
    /// left. Each row's prefix sum is independent.
    fn accumulate_edge(&mut self, p0: Vector2F, p1: Vector2F) {
        if p0.y == p1.y {
            return;
        }
        let (dir, top, bottom) = if p0.y < p1.y {
            (1.0, p0, p1)
        } else {
            (-1.0, p1, p0)
        };
        let dxdy = (bottom.x - top.x) / (bottom.y - top.y);
        let y_end = bottom.y.min(self.height as f32);
        if y_end <= 0.0 || top.y >= self.height as f32 {
            return;
        }
        let mut x = top.x;
        if top.y < 0.0 {
            x -= top.y * dxdy;
        }
        let y_start = top.y.max(0.0);
        let row_first = y_start as usize;
        let row_last = (y_end.ceil() as usize).min(self.height);

        for row in row_first..row_last {
            let row_start = row * self.width;
            let dy = ((row + 1) as f32).min(y_end) - (row as f32).max(y_start);
            if dy <= 0.0 {
                continue;
            }
            let x_next = x + dxdy * dy;
            let d = dy * dir;
            let (x0, x1) = if x < x_next { (x, x_next) } else { (x_next, x) };
            let x0_floor = x0.floor();
            let x0i = x0_floor as i32;
            let x1_ceil = x1.ceil();
            let x1i = x1_ceil as i32;
            if x1i <= x0i + 1 {
                // The crossing stays within one pixel column.
                let mid = 0.5 * (x + x_next) - x0_floor;
                self.deposit(row_start, x0i, d * (1.0 - mid));
                self.deposit(row_start, x0i + 1, d * mid);
            } else {
                let inv_span = (x1 - x0).recip();
                let x0_frac = x0 - x0_floor;
                let area_first = 0.5 * inv_span * (1.0 - x0_frac) * (1.0 - x0_frac);
                let x1_frac = x1 - x1_ceil + 1.0;
                let area_last = 0.5 * inv_span * x1_frac * x1_frac;
                self.deposit(row_start, x0i, d * area_first);
                if x1i == x0i + 2 {
                    self.deposit(row_start, x0i + 1, d * (1.0 - area_first - area_last));
                } else {
                    let a1 = inv_span * (1.5 - x0_frac);
                    self.deposit(row_start, x0i + 1, d * (a1 - area_first));
                    for xi in x0i + 2..x1i - 1 {
                        self.deposit(row_start, xi, d * inv_span);
                    }
                    let a2 = a1 + (x1i - x0i - 3) as f32 * inv_span;
                    self.deposit(row_start, x1i - 1, d * (1.0 - a2 - area_last));
                }
                self.deposit(row_start, x1i, d * area_last);
            }
            x = x_next;
        }
    }

    #[inline]
    fn deposit(&mut self, row_start: usize, column: i32, value: f32) {
        let column = if column < 0 {
            0
        } else if column as usize >= self.width {
            return;
        } else {
            column as usize
        };
        self.coverage[row_start + column] += value;
    }
}

impl Rasterizer for ScanlineRasterizer {
    fn fill_path(&mut self, pixmap: &mut Pixmap, path: &Path, paint: &Paint) {
        if path.is_empty() || pixmap.width() == 0 || pixmap.height() == 0 {
            return;
        }
        self.prepare(pixmap.width() as usize, pixmap.height() as usize);
        let mut edges = std::mem::replace(&mut self.edges, vec![]);
        {
            let mut sink = EdgeSink {
                edges: &mut edges,
                start: Vector2F::zero(),
                cursor: Vector2F::zero(),
            };
            path.flatten_with(FLATTEN_TOLERANCE, &mut sink);
        }
        self.edges = edges;
        debug!("fill_path: {} edges", self.edges.len());
        self.fill_edges(pixmap, paint, paint.fill_rule());
    }

    fn stroke_path(&mut self, pixmap: &mut Pixmap, path: &Path, paint: &Paint) {
        let style = match paint.style {
            PaintStyle::Stroke(style) => style,
            PaintStyle::Fill(_) => return,
        };
        if path.is_empty() {
            return;
        }
        let outline = StrokeToFill::new(style, FLATTEN_TOLERANCE * 0.5).apply(path);
        let fill_paint = Paint::fill(paint.color, FillRule::Winding);
        self.fill_path(pixmap, &outline, &fill_paint);
    }
}
