// vexel/content/src/stroke.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Stroking: converts a stroked path into a fillable outline.

use crate::path::{FlattenSink, Path};
use vexel_geometry::vector::{vec2f, Vector2F};
use std::f32::consts::PI;

/// How the ends of open subpaths are finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineCap {
    Butt,
    Round,
    Square,
}

impl LineCap {
    #[inline]
    pub fn from_u32(value: u32) -> LineCap {
        match value {
            1 => LineCap::Round,
            2 => LineCap::Square,
            _ => LineCap::Butt,
        }
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        match self {
            LineCap::Butt => 0,
            LineCap::Round => 1,
            LineCap::Square => 2,
        }
    }
}

/// How segments are connected at interior vertices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineJoin {
    Miter,
    Round,
    Bevel,
}

impl LineJoin {
    #[inline]
    pub fn from_u32(value: u32) -> LineJoin {
        match value {
            1 => LineJoin::Round,
            2 => LineJoin::Bevel,
            _ => LineJoin::Miter,
        }
    }

    #[inline]
    pub fn to_u32(self) -> u32 {
        match self {
            LineJoin::Miter => 0,
            LineJoin::Round => 1,
            LineJoin::Bevel => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StrokeStyle {
    pub line_width: f32,
    pub miter_limit: f32,
    pub cap: LineCap,
    pub join: LineJoin,
}

impl Default for StrokeStyle {
    #[inline]
    fn default() -> StrokeStyle {
        StrokeStyle {
            line_width: 1.0,
            miter_limit: 10.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
        }
    }
}

/// Converts a stroked path into an outline that covers the stroked region
/// when filled with the nonzero winding rule.
///
/// Curves are flattened first; offsets, joins, and caps are generated per
/// polyline. Closed subpaths become two rings of opposite orientation.
pub struct StrokeToFill {
    style: StrokeStyle,
    tolerance: f32,
}

struct Polyline {
    points: Vec<Vector2F>,
    closed: bool,
}

struct PolylineSink {
    polylines: Vec<Polyline>,
    current: Vec<Vector2F>,
}

impl FlattenSink for PolylineSink {
    fn begin_subpath(&mut self, at: Vector2F) {
        self.current.clear();
        self.current.push(at);
    }

    fn line_to(&mut self, to: Vector2F) {
        // Collapse degenerate segments so normals stay well-defined.
        if let Some(&last) = self.current.last() {
            if (to - last).square_length() < 1e-12 {
                return;
            }
        }
        self.current.push(to);
    }

    fn end_subpath(&mut self, mut closed: bool) {
        if self.current.len() >= 2 {
            if closed {
                let first = self.current[0];
                let last = *self.current.last().unwrap();
                if (first - last).square_length() < 1e-12 {
                    self.current.pop();
                }
                if self.current.len() < 3 {
                    closed = false;
                }
            }
            self.polylines.push(Polyline {
                points: std::mem::replace(&mut self.current, vec![]),
                closed,
            });
        } else if self.current.len() == 1 {
            self.polylines.push(Polyline {
                points: std::mem::replace(&mut self.current, vec![]),
                closed: false,
            });
        }
    }
}

impl StrokeToFill {
    #[inline]
    pub fn new(style: StrokeStyle, tolerance: f32) -> StrokeToFill {
        StrokeToFill { style, tolerance }
    }

    pub fn apply(&self, path: &Path) -> Path {
        let mut sink = PolylineSink { polylines: vec![], current: vec![] };
        path.flatten_with(self.tolerance, &mut sink);
        log::debug!("stroking {} subpaths", sink.polylines.len());

        let mut output = Path::new();
        let half_width = (self.style.line_width * 0.5).max(1e-4);
        for polyline in &sink.polylines {
            self.stroke_polyline(polyline, half_width, &mut output);
        }
        output
    }

    fn stroke_polyline(&self, polyline: &Polyline, h: f32, output: &mut Path) {
        let points = &polyline.points;
        if points.len() < 2 {
            // A degenerate subpath draws a dot under round caps and nothing
            // otherwise.
            if self.style.cap == LineCap::Round && points.len() == 1 {
                emit_circle(points[0], h, self.tolerance, output);
            }
            return;
        }

        if polyline.closed {
            let outer = self.offset_side(points, true, h);
            emit_polygon(&outer, output);
            let reversed: Vec<Vector2F> = points.iter().rev().cloned().collect();
            let inner = self.offset_side(&reversed, true, h);
            emit_polygon(&inner, output);
        } else {
            let mut outline = self.offset_side(points, false, h);

            let last = points[points.len() - 1];
            let d_end = (last - points[points.len() - 2]).normalize();
            self.emit_cap(last, d_end, h, &mut outline);

            let reversed: Vec<Vector2F> = points.iter().rev().cloned().collect();
            outline.extend(self.offset_side(&reversed, false, h));

            let first = points[0];
            let d_start = (first - points[1]).normalize();
            self.emit_cap(first, d_start, h, &mut outline);

            emit_polygon(&outline, output);
        }
    }

    /// Offsets one side of a polyline by `h`, inserting join geometry at
    /// interior vertices. For a closed polyline the wrap-around join is
    /// appended at the end of the loop.
    fn offset_side(&self, points: &[Vector2F], closed: bool, h: f32) -> Vec<Vector2F> {
        let mut segments = Vec::with_capacity(points.len());
        for window in points.windows(2) {
            let d = (window[1] - window[0]).normalize();
            segments.push((window[0], window[1], d.perpendicular()));
        }
        if closed {
            let d = (points[0] - points[points.len() - 1]).normalize();
            segments.push((points[points.len() - 1], points[0], d.perpendicular()));
        }

        let mut out = Vec::with_capacity(segments.len() * 2 + 4);
        let mut prev_normal = None;
        for &(from, to, normal) in &segments {
            if let Some(prev) = prev_normal {
                self.emit_join(from, prev, normal, h, &mut out);
            }
            out.push(from + normal * h);
            out.push(to + normal * h);
            prev_normal = Some(normal);
        }
        if closed {
            if let (Some(prev), Some(&(_, _, first_normal))) = (prev_normal, segments.first()) {
                self.emit_join(segments[0].0, prev, first_normal, h, &mut out);
            }
        }
        out
    }

    fn emit_join(
        &self,
        vertex: Vector2F,
        from_normal: Vector2F,
        to_normal: Vector2F,
        h: f32,
        out: &mut Vec<Vector2F>,
    ) {
        match self.style.join {
            LineJoin::Bevel => {}
            LineJoin::Miter => {
                let cos_half = ((1.0 + from_normal.dot(to_normal)) * 0.5).max(0.0).sqrt();
                if cos_half > 1e-4 && 1.0 / cos_half <= self.style.miter_limit {
                    let bisector = (from_normal + to_normal).normalize();
                    out.push(vertex + bisector * (h / cos_half));
                }
            }
            LineJoin::Round => {
                let sweep = signed_angle(from_normal, to_normal);
                for theta in arc_steps(sweep, h, self.tolerance) {
                    out.push(vertex + rotate(from_normal, theta) * h);
                }
            }
        }
    }

    fn emit_cap(&self, endpoint: Vector2F, direction: Vector2F, h: f32, out: &mut Vec<Vector2F>) {
        let normal = direction.perpendicular();
        match self.style.cap {
            LineCap::Butt => {}
            LineCap::Square => {
                out.push(endpoint + (normal + direction) * h);
                out.push(endpoint + (direction - normal) * h);
            }
            LineCap::Round => {
                // Half circle from `normal` through `direction` to `-normal`.
                for theta in arc_steps(-PI, h, self.tolerance) {
                    out.push(endpoint + rotate(normal, theta) * h);
                }
            }
        }
    }
}

#[inline]
fn rotate(v: Vector2F, theta: f32) -> Vector2F {
    let (sin, cos) = theta.sin_cos();
    vec2f(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

#[inline]
fn signed_angle(from: Vector2F, to: Vector2F) -> f32 {
    from.cross(to).atan2(from.dot(to))
}

/// Interior sample angles for an arc of `sweep` radians at radius `h`,
/// spaced so chord deviation stays within `tolerance`.
fn arc_steps(sweep: f32, h: f32, tolerance: f32) -> impl Iterator<Item = f32> {
    let max_step = 2.0 * (2.0 * (tolerance / h.max(1e-4)).min(1.0)).sqrt();
    let count = ((sweep.abs() / max_step).ceil() as usize).max(1).min(64);
    (1..count).map(move |i| sweep * i as f32 / count as f32)
}

fn emit_polygon(points: &[Vector2F], output: &mut Path) {
    let mut iter = points.iter();
    let first = match iter.next() {
        Some(&first) => first,
        None => return,
    };
    output.move_to(first);
    for &point in iter {
        output.line_to(point);
    }
    output.close();
}

fn emit_circle(center: Vector2F, radius: f32, tolerance: f32, output: &mut Path) {
    let start = center + vec2f(radius, 0.0);
    output.move_to(start);
    for theta in arc_steps(2.0 * PI, radius, tolerance) {
        output.line_to(center + rotate(vec2f(1.0, 0.0), theta) * radius);
    }
    output.close();
}
