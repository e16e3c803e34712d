// vexel/geometry/src/vector.rs
//
// Copyright © 2026 The Vexel Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Two-dimensional points and vectors.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A 2D point or vector with 32-bit float components.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vector2F {
    pub x: f32,
    pub y: f32,
}

/// A convenience alias for `Vector2F::new`.
#[inline]
pub fn vec2f(x: f32, y: f32) -> Vector2F {
    Vector2F::new(x, y)
}

/// A convenience alias for `Vector2I::new`.
#[inline]
pub fn vec2i(x: i32, y: i32) -> Vector2I {
    Vector2I::new(x, y)
}

impl Vector2F {
    #[inline]
    pub fn new(x: f32, y: f32) -> Vector2F {
        Vector2F { x, y }
    }

    #[inline]
    pub fn splat(value: f32) -> Vector2F {
        Vector2F { x: value, y: value }
    }

    #[inline]
    pub fn zero() -> Vector2F {
        Vector2F::default()
    }

    #[inline]
    pub fn min(self, other: Vector2F) -> Vector2F {
        Vector2F::new(self.x.min(other.x), self.y.min(other.y))
    }

    #[inline]
    pub fn max(self, other: Vector2F) -> Vector2F {
        Vector2F::new(self.x.max(other.x), self.y.max(other.y))
    }

    #[inline]
    pub fn dot(self, other: Vector2F) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// The z component of the cross product, treating both vectors as lying
    /// in the z = 0 plane.
    #[inline]
    pub fn cross(self, other: Vector2F) -> f32 {
        self.x * other.y - self.y * other.x
    }

    #[inline]
    pub fn square_length(self) -> f32 {
        self.dot(self)
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.square_length().sqrt()
    }

    #[inline]
    pub fn normalize(self) -> Vector2F {
        let length = self.length();
        if length == 0.0 {
            return self;
        }
        self * (1.0 / length)
    }

    /// Rotates this vector by 90° counterclockwise in a y-down coordinate
    /// system.
    #[inline]
    pub fn perpendicular(self) -> Vector2F {
        Vector2F::new(-self.y, self.x)
    }

    #[inline]
    pub fn lerp(self, other: Vector2F, t: f32) -> Vector2F {
        self + (other - self) * t
    }

    #[inline]
    pub fn scale_xy(self, factors: Vector2F) -> Vector2F {
        Vector2F::new(self.x * factors.x, self.y * factors.y)
    }

    #[inline]
    pub fn floor(self) -> Vector2F {
        Vector2F::new(self.x.floor(), self.y.floor())
    }

    #[inline]
    pub fn ceil(self) -> Vector2F {
        Vector2F::new(self.x.ceil(), self.y.ceil())
    }

    #[inline]
    pub fn to_i32(self) -> Vector2I {
        Vector2I::new(self.x as i32, self.y as i32)
    }
}

impl Add for Vector2F {
    type Output = Vector2F;
    #[inline]
    fn add(self, other: Vector2F) -> Vector2F {
        Vector2F::new(self.x + other.x, self.y + other.y)
    }
}

impl AddAssign for Vector2F {
    #[inline]
    fn add_assign(&mut self, other: Vector2F) {
        *self = *self + other;
    }
}

impl Sub for Vector2F {
    type Output = Vector2F;
    #[inline]
    fn sub(self, other: Vector2F) -> Vector2F {
        Vector2F::new(self.x - other.x, self.y - other.y)
    }
}

impl SubAssign for Vector2F {
    #[inline]
    fn sub_assign(&mut self, other: Vector2F) {
        *self = *self - other;
    }
}

impl Mul<f32> for Vector2F {
    type Output = Vector2F;
    #[inline]
    fn mul(self, factor: f32) -> Vector2F {
        Vector2F::new(self.x * factor, self.y * factor)
    }
}

impl Neg for Vector2F {
    type Output = Vector2F;
    #[inline]
    fn neg(self) -> Vector2F {
        Vector2F::new(-self.x, -self.y)
    }
}

/// A 2D point or vector with 32-bit integer components, used for tile
/// coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Vector2I {
    pub x: i32,
    pub y: i32,
}

impl Vector2I {
    #[inline]
    pub fn new(x: i32, y: i32) -> Vector2I {
        Vector2I { x, y }
    }

    #[inline]
    pub fn to_f32(self) -> Vector2F {
        Vector2F::new(self.x as f32, self.y as f32)
    }
}

impl Add for Vector2I {
    type Output = Vector2I;
    #[inline]
    fn add(self, other: Vector2I) -> Vector2I {
        Vector2I::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Vector2I {
    type Output = Vector2I;
    #[inline]
    fn sub(self, other: Vector2I) -> Vector2I {
        Vector2I::new(self.x - other.x, self.y - other.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_preserves_direction() {
        let v = vec2f(3.0, 4.0).normalize();
        assert!((v.length() - 1.0).abs() < 1e-6);
        assert!((v.x - 0.6).abs() < 1e-6);
        assert!((v.y - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_of_zero_is_zero() {
        assert_eq!(Vector2F::zero().normalize(), Vector2F::zero());
    }

    #[test]
    fn lerp_endpoints() {
        let (a, b) = (vec2f(1.0, 2.0), vec2f(5.0, -2.0));
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(a.lerp(b, 0.5), vec2f(3.0, 0.0));
    }
}
