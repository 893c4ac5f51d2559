//! Three-component vectors in simulation space.
//!
//! Simulation coordinates are right-handed with z up, exactly as written
//! by the scenario recorder. Converting to any renderer's axis convention
//! is the renderer's business.

use std::ops::{Add, Neg, Sub};

/// A position, orientation (degrees about x, y, z) or scale in simulation space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    /// X component
    pub x: f64,
    /// Y component
    pub y: f64,
    /// Z component (up)
    pub z: f64,
}

impl Vec3 {
    /// All components zero.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0, z: 0.0 };

    /// All components one (identity scale).
    pub const ONE: Self = Self { x: 1.0, y: 1.0, z: 1.0 };

    /// Create a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Same value on every axis.
    pub const fn splat(v: f64) -> Self {
        Self { x: v, y: v, z: v }
    }

    /// Component-wise minimum.
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
            z: self.z.min(other.z),
        }
    }

    /// Component-wise maximum.
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
            z: self.z.max(other.z),
        }
    }

    /// True if every component is finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Components as an array.
    pub const fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from([x, y, z]: [f64; 3]) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Axis-aligned bounds of everything placed in a scenario.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Bounds {
    /// Smallest coordinate seen on each axis
    pub min: Vec3,
    /// Largest coordinate seen on each axis
    pub max: Vec3,
}

impl Bounds {
    /// Degenerate bounds containing a single point.
    pub const fn point(p: Vec3) -> Self {
        Self { min: p, max: p }
    }

    /// Grow to include `p`.
    pub fn include(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// True if `p` lies inside (inclusive).
    pub fn contains(&self, p: Vec3) -> bool {
        self.min.x <= p.x
            && p.x <= self.max.x
            && self.min.y <= p.y
            && p.y <= self.max.y
            && self.min.z <= p.z
            && p.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addition_subtraction() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, -1.0, 0.5);

        assert_eq!(a + b, Vec3::new(5.0, 1.0, 3.5));
        assert_eq!(a - b, Vec3::new(-3.0, 3.0, 2.5));
        assert_eq!(a + (-b), a - b);
    }

    #[test]
    fn bounds_grow() {
        let mut bounds = Bounds::point(Vec3::ZERO);
        bounds.include(Vec3::new(5.0, -2.0, 1.0));
        bounds.include(Vec3::new(-1.0, 3.0, 0.0));

        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(5.0, 3.0, 1.0));
        assert!(bounds.contains(Vec3::new(0.0, 0.0, 0.5)));
        assert!(!bounds.contains(Vec3::new(6.0, 0.0, 0.0)));
    }

    proptest::proptest! {
        #[test]
        fn bounds_contain_every_included_point(
            points in proptest::collection::vec((-1e6f64..1e6, -1e6f64..1e6, -1e6f64..1e6), 1..32)
        ) {
            let points: Vec<Vec3> = points.into_iter().map(|(x, y, z)| Vec3::new(x, y, z)).collect();
            let mut bounds = Bounds::point(points[0]);
            for p in &points {
                bounds.include(*p);
            }
            for p in &points {
                proptest::prop_assert!(bounds.contains(*p));
            }
        }
    }

    #[test]
    fn splat_and_array() {
        assert_eq!(Vec3::splat(2.0).to_array(), [2.0, 2.0, 2.0]);
        assert_eq!(Vec3::from([1.0, 0.0, 0.0]), Vec3::new(1.0, 0.0, 0.0));
    }
}
