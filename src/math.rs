//! Lightweight math types used across lumen2d.

use core::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Sub, SubAssign};

/// Sentinel magnitude returned by [`safe_divide`] for non-finite quotients.
pub(crate) const DIVIDE_SENTINEL: f32 = 1.0e9;

/// 2D float vector used for both points and directions.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    /// Construct a new 2D vector.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `radians` (counter-clockwise from +x).
    pub fn from_angle(radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(cos, sin)
    }

    /// Dot product.
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// 2D cross product (scalar).
    pub fn cross(self, other: Self) -> f32 {
        self.x * other.y - self.y * other.x
    }

    /// Vector magnitude.
    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Squared vector magnitude.
    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    /// Squared distance to another point.
    pub fn distance_squared(self, other: Self) -> f32 {
        (other - self).length_squared()
    }

    /// Heading of the vector in radians, in (-pi, pi].
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }

    /// Signed angle from `self` to `other`, in (-pi, pi].
    ///
    /// Positive when `other` is counter-clockwise of `self`.
    pub fn signed_angle_to(self, other: Self) -> f32 {
        self.cross(other).atan2(self.dot(other))
    }

    /// The vector rotated counter-clockwise by `radians`.
    pub fn rotated(self, radians: f32) -> Self {
        let (sin, cos) = radians.sin_cos();
        Self::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// The opposite direction. `v.reversed().reversed() == v`.
    pub fn reversed(self) -> Self {
        -self
    }

    /// The vector scaled to unit length. Zero vectors are returned unchanged.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len > 0.0 {
            self / len
        } else {
            self
        }
    }

    /// The point advanced `distance` along `direction`.
    ///
    /// `direction` need not be unit length; only its heading is used.
    pub fn advanced(self, direction: Vec2, distance: f32) -> Self {
        self + direction.normalized() * distance
    }
}

impl Add for Vec2 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl SubAssign for Vec2 {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl MulAssign<f32> for Vec2 {
    fn mul_assign(&mut self, rhs: f32) {
        self.x *= rhs;
        self.y *= rhs;
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs)
    }
}

impl DivAssign<f32> for Vec2 {
    fn div_assign(&mut self, rhs: f32) {
        self.x /= rhs;
        self.y /= rhs;
    }
}

impl Neg for Vec2 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

/// Division that never returns a non-finite quotient.
///
/// Degenerate quotients (zero denominators, overflow) collapse to a large
/// signed sentinel so slope arithmetic stays total.
pub(crate) fn safe_divide(numerator: f32, denominator: f32) -> f32 {
    let quotient = numerator / denominator;
    if quotient.is_finite() {
        quotient
    } else {
        DIVIDE_SENTINEL.copysign(if numerator == 0.0 { 1.0 } else { numerator })
    }
}
