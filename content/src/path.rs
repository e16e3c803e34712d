// vexel/content/src/path.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Vector paths as a verb stream over a separate coordinate stream.

use crate::fill::FillRule;
use vexel_geometry::rect::RectF;
use vexel_geometry::transform2d::Transform2F;
use vexel_geometry::vector::Vector2F;

/// One command in a path. Operand points live in the path's point stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verb {
    MoveTo,
    LineTo,
    QuadTo,
    CubicTo,
    Close,
}

impl Verb {
    /// How many points this verb consumes from the point stream.
    #[inline]
    pub fn point_count(self) -> usize {
        match self {
            Verb::MoveTo | Verb::LineTo => 1,
            Verb::QuadTo => 2,
            Verb::CubicTo => 3,
            Verb::Close => 0,
        }
    }
}

/// A path: ordered verbs over a flat point stream, with running conservative
/// bounds (the union of all endpoints and control points).
#[derive(Clone, Debug, Default)]
pub struct Path {
    verbs: Vec<Verb>,
    points: Vec<Vector2F>,
    bounds: RectF,
    subpath_start: Vector2F,
    cursor: Vector2F,
}

impl Path {
    #[inline]
    pub fn new() -> Path {
        Path {
            verbs: vec![],
            points: vec![],
            bounds: RectF::EMPTY,
            subpath_start: Vector2F::zero(),
            cursor: Vector2F::zero(),
        }
    }

    #[inline]
    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    #[inline]
    pub fn points(&self) -> &[Vector2F] {
        &self.points
    }

    #[inline]
    pub fn bounds(&self) -> RectF {
        self.bounds
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.verbs.is_empty()
    }

    #[inline]
    pub fn current_position(&self) -> Vector2F {
        self.cursor
    }

    #[inline]
    fn push_point(&mut self, point: Vector2F) {
        self.bounds = self.bounds.union_point(point);
        self.points.push(point);
    }

    pub fn move_to(&mut self, to: Vector2F) {
        self.verbs.push(Verb::MoveTo);
        self.push_point(to);
        self.subpath_start = to;
        self.cursor = to;
    }

    pub fn line_to(&mut self, to: Vector2F) {
        self.verbs.push(Verb::LineTo);
        self.push_point(to);
        self.cursor = to;
    }

    pub fn quad_to(&mut self, ctrl: Vector2F, to: Vector2F) {
        self.verbs.push(Verb::QuadTo);
        self.push_point(ctrl);
        self.push_point(to);
        self.cursor = to;
    }

    pub fn cubic_to(&mut self, ctrl0: Vector2F, ctrl1: Vector2F, to: Vector2F) {
        self.verbs.push(Verb::CubicTo);
        self.push_point(ctrl0);
        self.push_point(ctrl1);
        self.push_point(to);
        self.cursor = to;
    }

    /// Closes the current subpath, returning the cursor to its start.
    pub fn close(&mut self) {
        self.verbs.push(Verb::Close);
        self.cursor = self.subpath_start;
    }

    /// Truncates the path without releasing storage.
    pub fn reset(&mut self) {
        self.verbs.clear();
        self.points.clear();
        self.bounds = RectF::EMPTY;
        self.subpath_start = Vector2F::zero();
        self.cursor = Vector2F::zero();
    }

    /// Returns a new path with every point mapped through `transform`.
    pub fn transform(&self, transform: &Transform2F) -> Path {
        let mut result = Path {
            verbs: self.verbs.clone(),
            points: Vec::with_capacity(self.points.len()),
            bounds: RectF::EMPTY,
            subpath_start: transform.apply(self.subpath_start),
            cursor: transform.apply(self.cursor),
        };
        for &point in &self.points {
            let point = transform.apply(point);
            result.bounds = result.bounds.union_point(point);
            result.points.push(point);
        }
        result
    }

    /// Reverses the direction of every subpath. Closure flags are preserved,
    /// and control points of quadratic and cubic segments swap order.
    pub fn reverse_subpaths(&self) -> Path {
        let mut result = Path::new();
        let mut events = vec![];
        for subpath in Subpaths::new(self) {
            events.clear();
            let mut start = Vector2F::zero();
            let mut cursor = Vector2F::zero();
            let mut closed = false;
            for event in subpath {
                match event {
                    PathEvent::MoveTo(p) => {
                        start = p;
                        cursor = p;
                    }
                    PathEvent::LineTo(p) => {
                        events.push((cursor, PathEvent::LineTo(p)));
                        cursor = p;
                    }
                    PathEvent::QuadTo(c, p) => {
                        events.push((cursor, PathEvent::QuadTo(c, p)));
                        cursor = p;
                    }
                    PathEvent::CubicTo(c0, c1, p) => {
                        events.push((cursor, PathEvent::CubicTo(c0, c1, p)));
                        cursor = p;
                    }
                    PathEvent::Close => {
                        closed = true;
                        cursor = start;
                    }
                }
            }
            if events.is_empty() && !closed {
                result.move_to(start);
                continue;
            }
            result.move_to(cursor);
            for &(from, event) in events.iter().rev() {
                match event {
                    PathEvent::LineTo(_) => result.line_to(from),
                    PathEvent::QuadTo(c, _) => result.quad_to(c, from),
                    PathEvent::CubicTo(c0, c1, _) => result.cubic_to(c1, c0, from),
                    PathEvent::MoveTo(_) | PathEvent::Close => {}
                }
            }
            if closed {
                result.close();
            }
        }
        result
    }

    /// Even-odd ray containment test. Curves are subdivided into line
    /// segments for the crossing count: quadratics into 4, cubics into 8.
    pub fn contains(&self, point: Vector2F, fill_rule: FillRule) -> bool {
        let mut crossings = 0i32;
        let mut start = Vector2F::zero();
        let mut cursor = Vector2F::zero();

        let mut test_edge = |from: Vector2F, to: Vector2F| {
            if (from.y > point.y) != (to.y > point.y) {
                let t = (point.y - from.y) / (to.y - from.y);
                let x = from.x + t * (to.x - from.x);
                if x > point.x {
                    crossings += if to.y > from.y { 1 } else { -1 };
                }
            }
        };

        for event in self.events() {
            match event {
                PathEvent::MoveTo(p) => {
                    // An unclosed subpath contributes its implicit closing
                    // edge to the winding test.
                    test_edge(cursor, start);
                    start = p;
                    cursor = p;
                }
                PathEvent::LineTo(p) => {
                    test_edge(cursor, p);
                    cursor = p;
                }
                PathEvent::QuadTo(c, p) => {
                    let mut prev = cursor;
                    for i in 1..=4 {
                        let t = i as f32 / 4.0;
                        let next = eval_quad(cursor, c, p, t);
                        test_edge(prev, next);
                        prev = next;
                    }
                    cursor = p;
                }
                PathEvent::CubicTo(c0, c1, p) => {
                    let mut prev = cursor;
                    for i in 1..=8 {
                        let t = i as f32 / 8.0;
                        let next = eval_cubic(cursor, c0, c1, p, t);
                        test_edge(prev, next);
                        prev = next;
                    }
                    cursor = p;
                }
                PathEvent::Close => {
                    test_edge(cursor, start);
                    cursor = start;
                }
            }
        }
        test_edge(cursor, start);

        match fill_rule {
            FillRule::Winding => crossings != 0,
            FillRule::EvenOdd => crossings % 2 != 0,
        }
    }

    /// A pull-style cursor over the path's events. Allocation-free.
    #[inline]
    pub fn events(&self) -> PathEvents {
        PathEvents { path: self, verb_index: 0, point_index: 0 }
    }

    /// Flattens the path into line segments within `tolerance`, feeding the
    /// sink one subpath at a time.
    pub fn flatten_with<S>(&self, tolerance: f32, sink: &mut S)
    where
        S: FlattenSink,
    {
        let mut cursor = Vector2F::zero();
        let mut open = false;
        for event in self.events() {
            match event {
                PathEvent::MoveTo(p) => {
                    if open {
                        sink.end_subpath(false);
                    }
                    sink.begin_subpath(p);
                    open = true;
                    cursor = p;
                }
                PathEvent::LineTo(p) => {
                    sink.line_to(p);
                    cursor = p;
                }
                PathEvent::QuadTo(c, p) => {
                    let steps = quad_flatten_steps(cursor, c, p, tolerance);
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        sink.line_to(eval_quad(cursor, c, p, t));
                    }
                    cursor = p;
                }
                PathEvent::CubicTo(c0, c1, p) => {
                    let steps = cubic_flatten_steps(cursor, c0, c1, p, tolerance);
                    for i in 1..=steps {
                        let t = i as f32 / steps as f32;
                        sink.line_to(eval_cubic(cursor, c0, c1, p, t));
                    }
                    cursor = p;
                }
                PathEvent::Close => {
                    sink.end_subpath(true);
                    open = false;
                }
            }
        }
        if open {
            sink.end_subpath(false);
        }
    }
}

/// Receives the flattened form of a path.
pub trait FlattenSink {
    fn begin_subpath(&mut self, at: Vector2F);
    fn line_to(&mut self, to: Vector2F);
    fn end_subpath(&mut self, closed: bool);
}

/// One event yielded by a path cursor.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathEvent {
    MoveTo(Vector2F),
    LineTo(Vector2F),
    QuadTo(Vector2F, Vector2F),
    CubicTo(Vector2F, Vector2F, Vector2F),
    Close,
}

/// Pull-style cursor over a path.
pub struct PathEvents<'a> {
    path: &'a Path,
    verb_index: usize,
    point_index: usize,
}

impl<'a> Iterator for PathEvents<'a> {
    type Item = PathEvent;

    fn next(&mut self) -> Option<PathEvent> {
        let verb = *self.path.verbs.get(self.verb_index)?;
        self.verb_index += 1;
        let points = &self.path.points[self.point_index..];
        self.point_index += verb.point_count();
        Some(match verb {
            Verb::MoveTo => PathEvent::MoveTo(points[0]),
            Verb::LineTo => PathEvent::LineTo(points[0]),
            Verb::QuadTo => PathEvent::QuadTo(points[0], points[1]),
            Verb::CubicTo => PathEvent::CubicTo(points[0], points[1], points[2]),
            Verb::Close => PathEvent::Close,
        })
    }
}

/// Iterator that splits a path's event stream at `MoveTo` boundaries.
struct Subpaths<'a> {
    events: std::iter::Peekable<PathEvents<'a>>,
}

impl<'a> Subpaths<'a> {
    fn new(path: &'a Path) -> Subpaths<'a> {
        Subpaths { events: path.events().peekable() }
    }
}

impl<'a> Iterator for Subpaths<'a> {
    type Item = Vec<PathEvent>;

    fn next(&mut self) -> Option<Vec<PathEvent>> {
        let first = self.events.next()?;
        let mut subpath = vec![first];
        while let Some(event) = self.events.peek() {
            if let PathEvent::MoveTo(_) = event {
                break;
            }
            subpath.push(self.events.next().unwrap());
        }
        Some(subpath)
    }
}

#[inline]
fn eval_quad(p0: Vector2F, c: Vector2F, p1: Vector2F, t: f32) -> Vector2F {
    let a = p0.lerp(c, t);
    let b = c.lerp(p1, t);
    a.lerp(b, t)
}

#[inline]
fn eval_cubic(p0: Vector2F, c0: Vector2F, c1: Vector2F, p1: Vector2F, t: f32) -> Vector2F {
    let a = p0.lerp(c0, t);
    let b = c0.lerp(c1, t);
    let c = c1.lerp(p1, t);
    let ab = a.lerp(b, t);
    let bc = b.lerp(c, t);
    ab.lerp(bc, t)
}

fn quad_flatten_steps(p0: Vector2F, c: Vector2F, p1: Vector2F, tolerance: f32) -> u32 {
    // Deviation of a quadratic from its chord is bounded by |p0 - 2c + p1|/4.
    let dev = (p0 - c * 2.0 + p1).length() * 0.25;
    steps_for_deviation(dev, tolerance)
}

fn cubic_flatten_steps(
    p0: Vector2F,
    c0: Vector2F,
    c1: Vector2F,
    p1: Vector2F,
    tolerance: f32,
) -> u32 {
    let d0 = (p0 - c0 * 2.0 + c1).length();
    let d1 = (c0 - c1 * 2.0 + p1).length();
    steps_for_deviation(d0.max(d1) * 0.1875, tolerance)
}

#[inline]
fn steps_for_deviation(deviation: f32, tolerance: f32) -> u32 {
    if deviation <= tolerance {
        1
    } else {
        ((deviation / tolerance).sqrt().ceil() as u32).max(1).min(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use vexel_geometry::vector::vec2f;

    fn square(size: f32) -> Path {
        let mut path = Path::new();
        path.move_to(vec2f(0.0, 0.0));
        path.line_to(vec2f(size, 0.0));
        path.line_to(vec2f(size, size));
        path.line_to(vec2f(0.0, size));
        path.close();
        path
    }

    #[test]
    fn verb_point_counts_are_consistent() {
        let mut path = Path::new();
        path.move_to(vec2f(0.0, 0.0));
        path.line_to(vec2f(1.0, 0.0));
        path.quad_to(vec2f(2.0, 0.0), vec2f(2.0, 1.0));
        path.cubic_to(vec2f(2.0, 2.0), vec2f(1.0, 2.0), vec2f(0.0, 2.0));
        path.close();
        let total: usize = path.verbs().iter().map(|v| v.point_count()).sum();
        assert_eq!(total, path.points().len());
    }

    #[test]
    fn close_returns_cursor_to_subpath_start() {
        let mut path = Path::new();
        path.move_to(vec2f(3.0, 4.0));
        path.line_to(vec2f(10.0, 4.0));
        path.close();
        assert_eq!(path.current_position(), vec2f(3.0, 4.0));
    }

    #[test]
    fn bounds_include_control_points() {
        let mut path = Path::new();
        path.move_to(vec2f(0.0, 0.0));
        path.quad_to(vec2f(5.0, 10.0), vec2f(10.0, 0.0));
        let bounds = path.bounds();
        assert_eq!(bounds.max_y, 10.0);
        assert_eq!(bounds.max_x, 10.0);
    }

    #[test]
    fn reset_preserves_capacity() {
        let mut path = square(8.0);
        let cap = path.points().len();
        assert!(cap > 0);
        path.reset();
        assert!(path.is_empty());
        assert!(path.bounds().is_empty());
    }

    #[test]
    fn transform_composition_law() {
        let t1 = Transform2F::from_translation(vec2f(3.0, 4.0));
        let t2 = Transform2F::from_scale(vec2f(2.0, 2.0));
        let path = square(5.0);
        let a = path.transform(&t1).transform(&t2);
        let b = path.transform(&(t2 * t1));
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn reverse_preserves_closure_and_verb_counts() {
        let mut path = Path::new();
        path.move_to(vec2f(0.0, 0.0));
        path.line_to(vec2f(1.0, 0.0));
        path.quad_to(vec2f(2.0, 0.0), vec2f(2.0, 1.0));
        path.close();
        path.move_to(vec2f(5.0, 5.0));
        path.cubic_to(vec2f(6.0, 5.0), vec2f(7.0, 6.0), vec2f(7.0, 7.0));

        let reversed = path.reverse_subpaths();
        let closes = |p: &Path| p.verbs().iter().filter(|&&v| v == Verb::Close).count();
        assert_eq!(closes(&path), closes(&reversed));
        assert_eq!(path.points().len(), reversed.points().len());
        // The closed subpath reversed starts from its last on-curve point.
        assert_eq!(reversed.points()[0], vec2f(2.0, 1.0));
    }

    #[test]
    fn reversed_cubic_swaps_controls() {
        let mut path = Path::new();
        path.move_to(vec2f(0.0, 0.0));
        path.cubic_to(vec2f(1.0, 0.0), vec2f(2.0, 1.0), vec2f(3.0, 1.0));
        let reversed = path.reverse_subpaths();
        assert_eq!(
            reversed.points(),
            &[vec2f(3.0, 1.0), vec2f(2.0, 1.0), vec2f(1.0, 0.0), vec2f(0.0, 0.0)]
        );
    }

    #[test]
    fn contains_square() {
        let path = square(10.0);
        assert!(path.contains(vec2f(5.0, 5.0), FillRule::EvenOdd));
        assert!(path.contains(vec2f(5.0, 5.0), FillRule::Winding));
        assert!(!path.contains(vec2f(15.0, 5.0), FillRule::EvenOdd));
        assert!(!path.contains(vec2f(-1.0, 5.0), FillRule::Winding));
    }

    #[test]
    fn contains_square_with_hole_even_odd() {
        let mut path = square(10.0);
        path.move_to(vec2f(3.0, 3.0));
        path.line_to(vec2f(7.0, 3.0));
        path.line_to(vec2f(7.0, 7.0));
        path.line_to(vec2f(3.0, 7.0));
        path.close();
        assert!(!path.contains(vec2f(5.0, 5.0), FillRule::EvenOdd));
        assert!(path.contains(vec2f(1.0, 5.0), FillRule::EvenOdd));
    }

    #[test]
    fn flatten_closes_open_subpaths_as_open() {
        struct Counter {
            subpaths: usize,
            closed: usize,
            lines: usize,
        }
        impl FlattenSink for Counter {
            fn begin_subpath(&mut self, _: Vector2F) {
                self.subpaths += 1;
            }
            fn line_to(&mut self, _: Vector2F) {
                self.lines += 1;
            }
            fn end_subpath(&mut self, closed: bool) {
                if closed {
                    self.closed += 1;
                }
            }
        }
        let mut sink = Counter { subpaths: 0, closed: 0, lines: 0 };
        let mut path = square(4.0);
        path.move_to(vec2f(20.0, 20.0));
        path.line_to(vec2f(30.0, 20.0));
        path.flatten_with(0.1, &mut sink);
        assert_eq!(sink.subpaths, 2);
        assert_eq!(sink.closed, 1);
        assert_eq!(sink.lines, 4);
    }

    quickcheck! {
        fn prop_point_counts_conserved(segments: Vec<(f32, f32)>) -> bool {
            let mut path = Path::new();
            path.move_to(vec2f(0.0, 0.0));
            for &(x, y) in &segments {
                path.line_to(vec2f(x, y));
            }
            let total: usize = path.verbs().iter().map(|v| v.point_count()).sum();
            total == path.points().len()
        }
    }
}
