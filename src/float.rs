//! Scalar type used by every simulation type.

use core::fmt::Debug;
use core::ops::{Add, Div, Mul, Neg, Sub};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Floating-point scalar, implemented for `f32` and `f64`.
///
/// Math goes through `libm` so results do not depend on platform intrinsics.
/// `min`/`max` are plain comparisons, so a NaN receiver yields the argument.
/// The serde supertraits cover every generic derive; those derives carry
/// `#[serde(bound = "")]` so no second, conflicting bound is generated.
pub trait Float:
    Copy
    + PartialOrd
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Default
    + Debug
    + Serialize
    + DeserializeOwned
    + 'static
{
    fn zero() -> Self;
    fn one() -> Self;
    fn half() -> Self;
    fn two() -> Self;
    fn pi() -> Self;

    fn sqrt(self) -> Self;
    fn sin(self) -> Self;
    fn cos(self) -> Self;
    fn abs(self) -> Self;
    fn floor(self) -> Self;
    fn powf(self, exp: Self) -> Self;
    /// Four-quadrant arctangent of `y / x`.
    fn atan2(y: Self, x: Self) -> Self;
    fn min(self, other: Self) -> Self;
    fn max(self, other: Self) -> Self;
    fn is_finite(self) -> bool;

    /// Literal constants and configuration values.
    fn from_f32(v: f32) -> Self;
    fn from_f64(v: f64) -> Self;
    fn to_f64(self) -> f64;

    fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// `|self| < epsilon`
    fn is_near_zero(self, epsilon: Self) -> bool {
        self.abs() < epsilon
    }

    fn to_radians(self) -> Self {
        self * Self::pi() / Self::from_f32(180.0)
    }
}

macro_rules! impl_float {
    ($t:ident, $pi:expr, $sqrt:path, $sin:path, $cos:path, $abs:path, $floor:path, $pow:path, $atan2:path) => {
        impl Float for $t {
            #[inline]
            fn zero() -> Self { 0.0 }
            #[inline]
            fn one() -> Self { 1.0 }
            #[inline]
            fn half() -> Self { 0.5 }
            #[inline]
            fn two() -> Self { 2.0 }
            #[inline]
            fn pi() -> Self { $pi }
            #[inline]
            fn sqrt(self) -> Self { $sqrt(self) }
            #[inline]
            fn sin(self) -> Self { $sin(self) }
            #[inline]
            fn cos(self) -> Self { $cos(self) }
            #[inline]
            fn abs(self) -> Self { $abs(self) }
            #[inline]
            fn floor(self) -> Self { $floor(self) }
            #[inline]
            fn powf(self, exp: Self) -> Self { $pow(self, exp) }
            #[inline]
            fn atan2(y: Self, x: Self) -> Self { $atan2(y, x) }
            #[inline]
            fn min(self, other: Self) -> Self { if self < other { self } else { other } }
            #[inline]
            fn max(self, other: Self) -> Self { if self > other { self } else { other } }
            #[inline]
            fn is_finite(self) -> bool { $t::is_finite(self) }
            #[inline]
            fn from_f32(v: f32) -> Self { v as $t }
            #[inline]
            fn from_f64(v: f64) -> Self { v as $t }
            #[inline]
            fn to_f64(self) -> f64 { self as f64 }
        }
    };
}

impl_float!(f32, core::f32::consts::PI, libm::sqrtf, libm::sinf, libm::cosf, libm::fabsf, libm::floorf, libm::powf, libm::atan2f);
impl_float!(f64, core::f64::consts::PI, libm::sqrt, libm::sin, libm::cos, libm::fabs, libm::floor, libm::pow, libm::atan2);
