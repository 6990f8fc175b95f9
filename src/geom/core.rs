use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub};
use std::str::FromStr;

// ─────────────────────────────────────────────────────────────────────────────
// Vec3
// ─────────────────────────────────────────────────────────────────────────────

/// Three-component vector used for positions, offsets and scale factors.
///
/// Parts carry no rotation, so every vector is expressed in the shared
/// assembly frame and the local frame of a part only differs by origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Zero vector.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// Identity scale.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    /// Unit vector along the Y axis, the long axis of every resizable part.
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);

    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a Vec3 from an array.
    #[must_use]
    pub const fn from_array(arr: [f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }

    /// Convert to an array.
    #[must_use]
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    #[must_use]
    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    #[must_use]
    pub const fn dot(self, rhs: Self) -> f64 {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    /// Component-wise product.
    #[must_use]
    pub const fn scale(self, rhs: Self) -> Self {
        Self::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z)
    }

    /// Component-wise quotient `self / rhs`. A zero divisor component yields 1,
    /// which means "no change" when the result is used as a scale ratio.
    #[must_use]
    pub fn ratio(self, rhs: Self) -> Self {
        fn component(num: f64, den: f64) -> f64 {
            if den == 0.0 || !den.is_finite() {
                1.0
            } else {
                num / den
            }
        }

        Self::new(
            component(self.x, rhs.x),
            component(self.y, rhs.y),
            component(self.z, rhs.z),
        )
    }

    /// Component-wise absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self::new(self.x.abs(), self.y.abs(), self.z.abs())
    }

    /// Largest component.
    #[must_use]
    pub fn max_component(self) -> f64 {
        self.x.max(self.y).max(self.z)
    }

    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    #[must_use]
    pub fn approx_eq(self, rhs: Self, tol: Tolerance) -> bool {
        (self - rhs).abs().max_component() <= tol.eps
    }
}

impl Default for Vec3 {
    fn default() -> Self {
        Self::ZERO
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(arr: [f64; 3]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(v: Vec3) -> Self {
        v.to_array()
    }
}

impl Add for Vec3 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// Formats as `x, y, z`, the notation used in configuration files.
impl fmt::Display for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.x, self.y, self.z)
    }
}

/// Error returned when a `x, y, z` triple cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid vector `{0}`: expected three comma-separated numbers")]
pub struct ParseVec3Error(pub String);

impl FromStr for Vec3 {
    type Err = ParseVec3Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 3 {
            return Err(ParseVec3Error(s.to_owned()));
        }

        let mut values = [0.0; 3];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse::<f64>()
                .map_err(|_| ParseVec3Error(s.to_owned()))?;
        }

        let vector = Self::from_array(values);
        if vector.is_finite() {
            Ok(vector)
        } else {
            Err(ParseVec3Error(s.to_owned()))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tolerance
// ─────────────────────────────────────────────────────────────────────────────

/// Absolute per-component tolerance for vector comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub eps: f64,
}

impl Tolerance {
    /// Default geometric tolerance (1e-9).
    pub const DEFAULT: Self = Self { eps: 1e-9 };

    #[must_use]
    pub const fn new(eps: f64) -> Self {
        Self { eps }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::{Tolerance, Vec3};

    #[test]
    fn scale_is_component_wise() {
        let base = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(base.scale(Vec3::new(2.0, 1.0, 0.5)), Vec3::new(2.0, 2.0, 1.5));
    }

    #[test]
    fn ratio_treats_zero_divisor_as_identity() {
        let ratio = Vec3::new(4.0, 3.0, 1.0).ratio(Vec3::new(2.0, 0.0, 1.0));
        assert_eq!(ratio, Vec3::new(2.0, 1.0, 1.0));
    }

    #[test]
    fn parses_comma_separated_triples() {
        let v: Vec3 = " 0, -1.5 ,2".parse().expect("vector");
        assert!(v.approx_eq(Vec3::new(0.0, -1.5, 2.0), Tolerance::DEFAULT));
        assert!("1, 2".parse::<Vec3>().is_err());
        assert!("a, b, c".parse::<Vec3>().is_err());
        assert!("1, NaN, 2".parse::<Vec3>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        let v = Vec3::new(0.1, -0.2875, 1.0 / 3.0);
        let parsed: Vec3 = v.to_string().parse().expect("vector");
        assert_eq!(parsed, v);
    }
}
