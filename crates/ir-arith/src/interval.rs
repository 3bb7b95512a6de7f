// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

/// Inclusive integer bounds of a value. The `i64` extremes stand for an
/// unbounded side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Interval {
    pub min: i64,
    pub max: i64,
}

impl Interval {
    pub fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    pub fn single_point(value: i64) -> Self {
        Self::new(value, value)
    }

    /// The interval carrying no information.
    pub fn everything() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }

    pub fn has_lower_bound(&self) -> bool {
        self.min != i64::MIN
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max != i64::MAX
    }

    /// Both ends finite.
    pub fn is_bounded(&self) -> bool {
        self.has_lower_bound() && self.has_upper_bound()
    }

    pub fn is_single_point(&self) -> bool {
        self.min == self.max
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    pub fn contains(&self, value: i64) -> bool {
        self.min <= value && value <= self.max
    }

    pub fn union(&self, other: &Interval) -> Interval {
        Interval::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn intersect(&self, other: &Interval) -> Interval {
        Interval::new(self.min.max(other.min), self.max.min(other.max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_ops() {
        let a = Interval::new(0, 4);
        let b = Interval::new(3, 10);
        assert_eq!(a.union(&b), Interval::new(0, 10));
        assert_eq!(a.intersect(&b), Interval::new(3, 4));
        assert!(Interval::new(5, 4).is_empty());
        assert!(a.is_bounded());
        assert!(!Interval::everything().is_bounded());
        assert!(Interval::single_point(3).contains(3));
    }
}
