// vexel/geometry/src/transform2d.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! 2D affine transforms.

use crate::rect::RectF;
use crate::vector::{vec2f, Vector2F};
use std::ops::Mul;

/// A 2×3 affine transform:
///
/// ```text
/// | m11 m12 m13 |
/// | m21 m22 m23 |
/// ```
///
/// mapping `(x, y)` to `(m11·x + m12·y + m13, m21·x + m22·y + m23)`.
///
/// Composition follows the column-vector convention: `a * b` applies `b`
/// first, then `a`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2F {
    m11: f32,
    m12: f32,
    m13: f32,
    m21: f32,
    m22: f32,
    m23: f32,
}

impl Default for Transform2F {
    #[inline]
    fn default() -> Transform2F {
        Transform2F::row_major(1.0, 0.0, 0.0, 0.0, 1.0, 0.0)
    }
}

impl Transform2F {
    #[inline]
    pub fn row_major(m11: f32, m12: f32, m13: f32, m21: f32, m22: f32, m23: f32) -> Transform2F {
        Transform2F { m11, m12, m13, m21, m22, m23 }
    }

    #[inline]
    pub fn from_translation(offset: Vector2F) -> Transform2F {
        Transform2F::row_major(1.0, 0.0, offset.x, 0.0, 1.0, offset.y)
    }

    #[inline]
    pub fn from_scale(factors: Vector2F) -> Transform2F {
        Transform2F::row_major(factors.x, 0.0, 0.0, 0.0, factors.y, 0.0)
    }

    #[inline]
    pub fn from_uniform_scale(factor: f32) -> Transform2F {
        Transform2F::from_scale(Vector2F::splat(factor))
    }

    #[inline]
    pub fn from_rotation(theta: f32) -> Transform2F {
        let (sin, cos) = theta.sin_cos();
        Transform2F::row_major(cos, -sin, 0.0, sin, cos, 0.0)
    }

    #[inline]
    pub fn m11(self) -> f32 { self.m11 }
    #[inline]
    pub fn m12(self) -> f32 { self.m12 }
    #[inline]
    pub fn m13(self) -> f32 { self.m13 }
    #[inline]
    pub fn m21(self) -> f32 { self.m21 }
    #[inline]
    pub fn m22(self) -> f32 { self.m22 }
    #[inline]
    pub fn m23(self) -> f32 { self.m23 }

    #[inline]
    pub fn is_identity(self) -> bool {
        self == Transform2F::default()
    }

    #[inline]
    pub fn apply(self, point: Vector2F) -> Vector2F {
        vec2f(
            self.m11 * point.x + self.m12 * point.y + self.m13,
            self.m21 * point.x + self.m22 * point.y + self.m23,
        )
    }

    /// Applies only the linear part, ignoring translation. Useful for
    /// transforming direction vectors.
    #[inline]
    pub fn apply_vector(self, vector: Vector2F) -> Vector2F {
        vec2f(
            self.m11 * vector.x + self.m12 * vector.y,
            self.m21 * vector.x + self.m22 * vector.y,
        )
    }

    /// Returns the transform that applies `self` first and then translates
    /// by `offset`.
    #[inline]
    pub fn translate(self, offset: Vector2F) -> Transform2F {
        Transform2F::from_translation(offset) * self
    }

    /// Returns the transform that applies `self` first and then rotates by
    /// `theta`.
    #[inline]
    pub fn rotate(self, theta: f32) -> Transform2F {
        Transform2F::from_rotation(theta) * self
    }

    /// Returns the transform that applies `self` first and then scales by
    /// `factors`.
    #[inline]
    pub fn scale(self, factors: Vector2F) -> Transform2F {
        Transform2F::from_scale(factors) * self
    }

    pub fn inverse(self) -> Transform2F {
        let det = self.m11 * self.m22 - self.m12 * self.m21;
        if det == 0.0 {
            log::debug!("inverting a singular transform; returning identity");
            return Transform2F::default();
        }
        let inv_det = 1.0 / det;
        let (m11, m12) = (self.m22 * inv_det, -self.m12 * inv_det);
        let (m21, m22) = (-self.m21 * inv_det, self.m11 * inv_det);
        Transform2F::row_major(
            m11,
            m12,
            -(m11 * self.m13 + m12 * self.m23),
            m21,
            m22,
            -(m21 * self.m13 + m22 * self.m23),
        )
    }
}

impl Mul<Transform2F> for Transform2F {
    type Output = Transform2F;
    fn mul(self, other: Transform2F) -> Transform2F {
        Transform2F::row_major(
            self.m11 * other.m11 + self.m12 * other.m21,
            self.m11 * other.m12 + self.m12 * other.m22,
            self.m11 * other.m13 + self.m12 * other.m23 + self.m13,
            self.m21 * other.m11 + self.m22 * other.m21,
            self.m21 * other.m12 + self.m22 * other.m22,
            self.m21 * other.m13 + self.m22 * other.m23 + self.m23,
        )
    }
}

impl Mul<Vector2F> for Transform2F {
    type Output = Vector2F;
    #[inline]
    fn mul(self, point: Vector2F) -> Vector2F {
        self.apply(point)
    }
}

impl Mul<RectF> for Transform2F {
    type Output = RectF;
    /// The axis-aligned bounding box of the four transformed corners.
    fn mul(self, rect: RectF) -> RectF {
        if rect.is_empty() {
            return RectF::EMPTY;
        }
        RectF::EMPTY
            .union_point(self.apply(rect.origin()))
            .union_point(self.apply(rect.upper_right()))
            .union_point(self.apply(rect.lower_left()))
            .union_point(self.apply(rect.lower_right()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn approx_eq(a: Vector2F, b: Vector2F) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn identity_is_composition_identity() {
        let m = Transform2F::from_rotation(0.7).translate(vec2f(3.0, -2.0));
        assert_eq!(Transform2F::default() * m, m);
        assert_eq!(m * Transform2F::default(), m);
    }

    #[test]
    fn composition_applies_rhs_first() {
        let translate = Transform2F::from_translation(vec2f(10.0, 0.0));
        let scale = Transform2F::from_scale(vec2f(2.0, 2.0));
        // scale ∘ translate: translate first, then scale.
        let m = scale * translate;
        assert!(approx_eq(m.apply(vec2f(1.0, 1.0)), vec2f(22.0, 2.0)));
    }

    #[test]
    fn rotation_convention() {
        let m = Transform2F::from_rotation(FRAC_PI_2);
        assert!(approx_eq(m.apply(vec2f(1.0, 0.0)), vec2f(0.0, 1.0)));
    }

    #[test]
    fn inverse_round_trips() {
        let m = Transform2F::from_scale(vec2f(2.0, 3.0))
            .rotate(0.4)
            .translate(vec2f(5.0, -7.0));
        let p = vec2f(1.5, 2.5);
        assert!(approx_eq(m.inverse().apply(m.apply(p)), p));
    }

    #[test]
    fn rect_transform_is_corner_bbox() {
        let m = Transform2F::from_rotation(FRAC_PI_2);
        let r = m * RectF::new(0.0, 0.0, 2.0, 1.0);
        assert!((r.min_x - -1.0).abs() < 1e-4);
        assert!((r.max_y - 2.0).abs() < 1e-4);
    }
}
