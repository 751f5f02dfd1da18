//! Length bounds: an inclusive-lower, exclusive-upper integer interval with
//! a uniform sampling operation.

use rand::{distributions::Uniform, Rng};

/// Default lower bound used when a `length` directive is entirely absent.
pub const DEFAULT_MIN: u64 = 8;
/// Default upper bound (exclusive) used when a `length` directive is entirely absent.
pub const DEFAULT_MAX: u64 = 16;

/// An inclusive-lower, exclusive-upper length interval `[min, max)`.
///
/// A single-integer `length: L` directive is represented as `Length::exact(L)`,
/// which samples identically to the literal value `L` every time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Length {
    /// Inclusive lower bound.
    pub min: u64,
    /// Exclusive upper bound. Always strictly greater than `min`.
    pub max: u64,
}

impl Default for Length {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl Length {
    /// Builds bounds `[min, max)`. Panics if `max <= min`; callers coming from
    /// directive parsing should validate this ahead of time via
    /// `crate::directive` and surface `Error::InvalidRange` instead.
    pub fn new(min: u64, max: u64) -> Self {
        assert!(max > min, "length bounds must satisfy max > min");
        Self { min, max }
    }

    /// Bounds `[l, l + 1)`, sampling identically to the exact value `l`.
    pub fn exact(l: u64) -> Self {
        Self { min: l, max: l + 1 }
    }

    /// Draws a length uniformly from `[min, max)`.
    pub fn sample(&self, rng: &mut impl Rng) -> u64 {
        if self.max - self.min == 1 {
            self.min
        } else {
            rng.sample(Uniform::new(self.min, self.max))
        }
    }

    /// The largest value this interval can ever produce, inclusive.
    pub fn max_inclusive(&self) -> u64 {
        self.max - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_default() {
        let l = Length::default();
        assert_eq!(l.min, 8);
        assert_eq!(l.max, 16);
    }

    #[test]
    fn test_exact_always_samples_the_same_value() {
        let l = Length::exact(5);
        let mut rng = SmallRng::seed_from_u64(1);
        for _ in 0..100 {
            assert_eq!(l.sample(&mut rng), 5);
        }
    }

    #[test]
    fn test_sample_is_contained_in_bounds() {
        let l = Length::new(3, 9);
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..1000 {
            let v = l.sample(&mut rng);
            assert!((3..9).contains(&v), "{v} out of bounds");
        }
    }

    #[test]
    #[should_panic(expected = "max > min")]
    fn test_new_rejects_empty_interval() {
        Length::new(5, 5);
    }
}
