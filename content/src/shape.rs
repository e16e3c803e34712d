// vexel/content/src/shape.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Shapes convertible to paths.

use crate::fill::FillRule;
use crate::path::Path;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::{vec2f, Vector2F};
use std::f32::consts::{PI, TAU};

/// Control-point distance for approximating a quarter circle with one
/// cubic Bézier: `4(√2 − 1)/3`.
pub const ARC_CONTROL: f32 = 0.5522848;

/// Geometry that can be converted to a `Path` and queried for bounds.
#[derive(Clone, Debug)]
pub enum Shape {
    Rect(RectF),
    RoundedRect(RectF, f32),
    Circle { center: Vector2F, radius: f32 },
    Ellipse { center: Vector2F, radii: Vector2F },
    Line(Vector2F, Vector2F),
    Path(Path),
    Polygon(Vec<Vector2F>),
    RegularPolygon { center: Vector2F, radius: f32, sides: u32 },
    Star { center: Vector2F, outer_radius: f32, inner_radius: f32, points: u32 },
    Arc { center: Vector2F, radius: f32, start_angle: f32, end_angle: f32 },
    Pie { center: Vector2F, radius: f32, start_angle: f32, end_angle: f32 },
    Transformed(Box<Shape>, Transform2F),
    Composite(Vec<Shape>),
}

impl Shape {
    pub fn to_path(&self) -> Path {
        let mut path = Path::new();
        self.write_path(&mut path);
        path
    }

    fn write_path(&self, path: &mut Path) {
        match *self {
            Shape::Rect(rect) => write_rect(path, rect),
            Shape::RoundedRect(rect, radius) => {
                let radius = radius.min(rect.width().min(rect.height()) * 0.5);
                if radius <= 0.0 {
                    write_rect(path, rect);
                } else {
                    write_rounded_rect(path, rect, radius);
                }
            }
            Shape::Circle { center, radius } => {
                write_ellipse(path, center, Vector2F::splat(radius))
            }
            Shape::Ellipse { center, radii } => write_ellipse(path, center, radii),
            Shape::Line(from, to) => {
                path.move_to(from);
                path.line_to(to);
            }
            Shape::Path(ref inner) => {
                for event in inner.events() {
                    use crate::path::PathEvent::*;
                    match event {
                        MoveTo(p) => path.move_to(p),
                        LineTo(p) => path.line_to(p),
                        QuadTo(c, p) => path.quad_to(c, p),
                        CubicTo(c0, c1, p) => path.cubic_to(c0, c1, p),
                        Close => path.close(),
                    }
                }
            }
            Shape::Polygon(ref vertices) => write_polygon(path, vertices),
            Shape::RegularPolygon { center, radius, sides } => {
                let sides = sides.max(3);
                let mut vertices = Vec::with_capacity(sides as usize);
                for i in 0..sides {
                    let theta = i as f32 / sides as f32 * TAU - PI * 0.5;
                    vertices.push(center + vec2f(theta.cos(), theta.sin()) * radius);
                }
                write_polygon(path, &vertices);
            }
            Shape::Star { center, outer_radius, inner_radius, points } => {
                let points = points.max(3);
                let mut vertices = Vec::with_capacity(points as usize * 2);
                for i in 0..points * 2 {
                    let radius = if i % 2 == 0 { outer_radius } else { inner_radius };
                    let theta = i as f32 / (points * 2) as f32 * TAU - PI * 0.5;
                    vertices.push(center + vec2f(theta.cos(), theta.sin()) * radius);
                }
                write_polygon(path, &vertices);
            }
            Shape::Arc { center, radius, start_angle, end_angle } => {
                write_arc(path, center, radius, start_angle, end_angle, false);
            }
            Shape::Pie { center, radius, start_angle, end_angle } => {
                write_arc(path, center, radius, start_angle, end_angle, true);
            }
            Shape::Transformed(ref shape, transform) => {
                let transformed = shape.to_path().transform(&transform);
                Shape::Path(transformed).write_path(path);
            }
            Shape::Composite(ref shapes) => {
                for shape in shapes {
                    shape.write_path(path);
                }
            }
        }
    }

    pub fn bounds(&self) -> RectF {
        match *self {
            Shape::Rect(rect) | Shape::RoundedRect(rect, _) => rect,
            Shape::Circle { center, radius } => {
                RectF::from_points(center - Vector2F::splat(radius),
                                   center + Vector2F::splat(radius))
            }
            Shape::Ellipse { center, radii } => {
                RectF::from_points(center - radii, center + radii)
            }
            Shape::Line(from, to) => {
                RectF::EMPTY.union_point(from).union_point(to)
            }
            Shape::Path(ref path) => path.bounds(),
            Shape::Polygon(ref vertices) => {
                vertices.iter().fold(RectF::EMPTY, |rect, &v| rect.union_point(v))
            }
            Shape::RegularPolygon { center, radius, .. } |
            Shape::Arc { center, radius, .. } |
            Shape::Pie { center, radius, .. } => {
                RectF::from_points(center - Vector2F::splat(radius),
                                   center + Vector2F::splat(radius))
            }
            Shape::Star { center, outer_radius, .. } => {
                RectF::from_points(center - Vector2F::splat(outer_radius),
                                   center + Vector2F::splat(outer_radius))
            }
            Shape::Transformed(ref shape, transform) => transform * shape.bounds(),
            Shape::Composite(ref shapes) => {
                shapes.iter().fold(RectF::EMPTY, |rect, shape| rect.union(shape.bounds()))
            }
        }
    }

    /// Point query. Exact for `Rect`, `Circle`, and `Ellipse`; other shapes
    /// fall back to a ray test against the generated path.
    pub fn contains(&self, point: Vector2F) -> bool {
        match *self {
            Shape::Rect(rect) => rect.contains_point(point),
            Shape::Circle { center, radius } => {
                (point - center).square_length() <= radius * radius
            }
            Shape::Ellipse { center, radii } => {
                if radii.x <= 0.0 || radii.y <= 0.0 {
                    return false;
                }
                let d = point - center;
                let nx = d.x / radii.x;
                let ny = d.y / radii.y;
                nx * nx + ny * ny <= 1.0
            }
            _ => self.to_path().contains(point, FillRule::EvenOdd),
        }
    }
}

fn write_rect(path: &mut Path, rect: RectF) {
    path.move_to(rect.origin());
    path.line_to(rect.upper_right());
    path.line_to(rect.lower_right());
    path.line_to(rect.lower_left());
    path.close();
}

fn write_rounded_rect(path: &mut Path, rect: RectF, radius: f32) {
    let k = radius * ARC_CONTROL;
    let (l, t, r, b) = (rect.min_x, rect.min_y, rect.max_x, rect.max_y);
    path.move_to(vec2f(l + radius, t));
    path.line_to(vec2f(r - radius, t));
    path.cubic_to(vec2f(r - radius + k, t), vec2f(r, t + radius - k), vec2f(r, t + radius));
    path.line_to(vec2f(r, b - radius));
    path.cubic_to(vec2f(r, b - radius + k), vec2f(r - radius + k, b), vec2f(r - radius, b));
    path.line_to(vec2f(l + radius, b));
    path.cubic_to(vec2f(l + radius - k, b), vec2f(l, b - radius + k), vec2f(l, b - radius));
    path.line_to(vec2f(l, t + radius));
    path.cubic_to(vec2f(l, t + radius - k), vec2f(l + radius - k, t), vec2f(l + radius, t));
    path.close();
}

fn write_ellipse(path: &mut Path, center: Vector2F, radii: Vector2F) {
    let k = radii * ARC_CONTROL;
    let (cx, cy) = (center.x, center.y);
    let (rx, ry) = (radii.x, radii.y);
    path.move_to(vec2f(cx + rx, cy));
    path.cubic_to(vec2f(cx + rx, cy + k.y), vec2f(cx + k.x, cy + ry), vec2f(cx, cy + ry));
    path.cubic_to(vec2f(cx - k.x, cy + ry), vec2f(cx - rx, cy + k.y), vec2f(cx - rx, cy));
    path.cubic_to(vec2f(cx - rx, cy - k.y), vec2f(cx - k.x, cy - ry), vec2f(cx, cy - ry));
    path.cubic_to(vec2f(cx + k.x, cy - ry), vec2f(cx + rx, cy - k.y), vec2f(cx + rx, cy));
    path.close();
}

fn write_polygon(path: &mut Path, vertices: &[Vector2F]) {
    let mut iter = vertices.iter();
    let first = match iter.next() {
        Some(&first) => first,
        None => return,
    };
    path.move_to(first);
    for &vertex in iter {
        path.line_to(vertex);
    }
    path.close();
}

fn write_arc(
    path: &mut Path,
    center: Vector2F,
    radius: f32,
    start_angle: f32,
    end_angle: f32,
    pie: bool,
) {
    let sweep = (end_angle - start_angle).max(-TAU).min(TAU);
    let segments = (sweep.abs() / (PI * 0.5)).ceil().max(1.0) as u32;
    let step = sweep / segments as f32;
    // Control distance for a cubic spanning `step` radians.
    let k = 4.0 / 3.0 * (step * 0.25).tan() * radius;

    let point_at = |theta: f32| center + vec2f(theta.cos(), theta.sin()) * radius;
    let tangent_at = |theta: f32| vec2f(-theta.sin(), theta.cos());

    let mut theta = start_angle;
    path.move_to(point_at(theta));
    for _ in 0..segments {
        let next = theta + step;
        let p0 = point_at(theta);
        let p1 = point_at(next);
        path.cubic_to(p0 + tangent_at(theta) * k, p1 - tangent_at(next) * k, p1);
        theta = next;
    }
    if pie {
        path.line_to(center);
        path.close();
    }
}
