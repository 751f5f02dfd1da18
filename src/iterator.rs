//! The three iterator kinds backing the `iteration` directive: boolean,
//! integral, and decimal. Each holds a `(start, restart, step, current)`
//! tuple and supports only `next()` (the streams are infinite) plus
//! fast-forwarding by a non-negative offset at construction time.

use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::Zero;

use crate::{
    directive::IterationDirective,
    error::{Error, Result},
    schema::NodeId,
};

/// A boolean iteration state.
///
/// `next()` returns the current value, then flips it. Construction XORs the
/// starting value with whether the generation offset is odd, which is
/// equivalent to replaying `generation_offset` flips in constant time.
#[derive(Copy, Clone, Debug)]
pub struct BoolIterator {
    current: bool,
}

impl BoolIterator {
    /// Builds a boolean iterator fast-forwarded by `generation_offset` steps.
    pub fn new(start: bool, generation_offset: u64) -> Self {
        Self {
            current: start ^ (generation_offset % 2 == 1),
        }
    }

    /// Returns the current value and advances the state.
    pub fn next_value(&mut self) -> bool {
        let v = self.current;
        self.current = !self.current;
        v
    }
}

/// Resolves the `(start, restart, step, initial)` quadruple out of an
/// [`IterationDirective`] for an integral type, applying its defaulting
/// rules and validating the resulting invariants.
fn resolve_integral(node: NodeId, d: &IterationDirective, type_min: i128, type_max: i128) -> Result<(BigInt, BigInt, BigInt, BigInt)> {
    let start = json_to_bigint(node, &d.start, "iteration.start")?;
    let restart = match &d.restart {
        Some(r) => json_to_bigint(node, r, "iteration.restart")?,
        None => match &d.step {
            // restart absent, step present: derived below once we know its sign.
            Some(s) => {
                let step = json_to_bigint(node, s, "iteration.step")?;
                if step.sign() == num_bigint::Sign::Plus {
                    BigInt::from(type_max)
                } else {
                    BigInt::from(type_min)
                }
            }
            // both absent: defaults to step=1, restart=type_max.
            None => BigInt::from(type_max),
        },
    };
    let step = match &d.step {
        Some(s) => json_to_bigint(node, s, "iteration.step")?,
        None => {
            if d.restart.is_none() {
                BigInt::from(1)
            } else if restart > start {
                BigInt::from(1)
            } else {
                BigInt::from(-1)
            }
        }
    };
    let initial = match &d.initial {
        Some(i) => json_to_bigint(node, i, "iteration.initial")?,
        None => start.clone(),
    };

    if start == restart {
        return Err(Error::InvalidIteration {
            node,
            cause: "start must not equal restart".to_owned(),
        });
    }
    if step.is_zero() {
        return Err(Error::InvalidIteration {
            node,
            cause: "step must not be zero".to_owned(),
        });
    }
    if restart > start && step.sign() != num_bigint::Sign::Plus {
        return Err(Error::InvalidIteration {
            node,
            cause: "step must be positive when restart > start".to_owned(),
        });
    }
    if restart < start && step.sign() != num_bigint::Sign::Minus {
        return Err(Error::InvalidIteration {
            node,
            cause: "step must be negative when restart < start".to_owned(),
        });
    }

    Ok((start, restart, step, initial))
}

fn json_to_bigint(node: NodeId, v: &serde_json::Value, field: &'static str) -> Result<BigInt> {
    if let Some(i) = v.as_i64() {
        return Ok(BigInt::from(i));
    }
    if let Some(u) = v.as_u64() {
        return Ok(BigInt::from(u));
    }
    Err(Error::InvalidDirectiveShape {
        directive: field,
        node,
        cause: format!("expected an integer, got {v}"),
    })
}

/// An integral iteration state, used for `int`, `long`, and (internally) the
/// string-iteration strategy.
#[derive(Clone, Debug)]
pub struct IntIterator {
    start: BigInt,
    step: BigInt,
    modulus: BigInt, // restart - start; its sign matches step's sign.
    current: BigInt,
}

impl IntIterator {
    /// Builds an integral iterator for the given directive, type bounds, and
    /// generation offset, fast-forwarding via `current = k*step + (initial - start) mod modulus`.
    pub fn new(node: NodeId, d: &IterationDirective, type_min: i128, type_max: i128, generation_offset: u64) -> Result<Self> {
        let (start, restart, step, initial) = resolve_integral(node, d, type_min, type_max)?;
        let modulus = &restart - &start;
        let k = BigInt::from(generation_offset);
        let current = (&k * &step + (&initial - &start)).mod_floor(&modulus);
        Ok(Self {
            start,
            step,
            modulus,
            current,
        })
    }

    /// Returns the current value (as `start + current`) and advances the state.
    pub fn next_value(&mut self) -> BigInt {
        let v = &self.start + &self.current;
        self.current = (&self.current + &self.step).mod_floor(&self.modulus);
        v
    }
}

/// A decimal iteration state, used for `float`/`double` iteration.
///
/// Fast-forward arithmetic is performed on a fixed-point representation
/// scaled by `10^DECIMAL_SCALE_DIGITS` (matching `crate::decimal`'s
/// precision-mode block size), which comfortably exceeds the ~15-17
/// significant decimal digits an `f64` can represent, then narrowed back to
/// `f64` for output.
const DECIMAL_SCALE_DIGITS: u32 = 15;

#[derive(Clone, Debug)]
pub struct DecimalIterator {
    start: BigInt,
    step: BigInt,
    modulus: BigInt,
    current: BigInt,
    scale: BigInt,
}

impl DecimalIterator {
    /// Builds a decimal iterator. `type_max_finite` bounds the default
    /// `restart` when absent (the largest finite positive representable value).
    pub fn new(node: NodeId, d: &IterationDirective, type_max_finite: f64, generation_offset: u64) -> Result<Self> {
        let scale = pow10(DECIMAL_SCALE_DIGITS);
        let to_fixed = |v: &serde_json::Value, field: &'static str| -> Result<BigInt> {
            let f = v.as_f64().ok_or_else(|| Error::InvalidDirectiveShape {
                directive: field,
                node,
                cause: format!("expected a number, got {v}"),
            })?;
            Ok(BigInt::from((f * 10f64.powi(DECIMAL_SCALE_DIGITS as i32)).round() as i128))
        };

        // Clamped so that `bound * 10^DECIMAL_SCALE_DIGITS` fits comfortably in
        // the `i128` used by `to_fixed`; the exact magnitude of the sentinel
        // doesn't matter, only that wrap-around never happens in practice.
        let bound = type_max_finite.min(1e18);

        let start = to_fixed(&d.start, "iteration.start")?;
        let restart = match &d.restart {
            Some(r) => to_fixed(r, "iteration.restart")?,
            None => match &d.step {
                Some(s) => {
                    let step = to_fixed(s, "iteration.step")?;
                    if step.sign() == num_bigint::Sign::Plus {
                        to_fixed(&serde_json::json!(bound), "iteration.restart")?
                    } else {
                        to_fixed(&serde_json::json!(-bound), "iteration.restart")?
                    }
                }
                None => to_fixed(&serde_json::json!(bound), "iteration.restart")?,
            },
        };
        let step = match &d.step {
            Some(s) => to_fixed(s, "iteration.step")?,
            None => {
                if d.restart.is_none() || restart > start {
                    BigInt::from(1)
                } else {
                    BigInt::from(-1)
                }
            }
        };
        let initial = match &d.initial {
            Some(i) => to_fixed(i, "iteration.initial")?,
            None => start.clone(),
        };

        if start == restart {
            return Err(Error::InvalidIteration {
                node,
                cause: "start must not equal restart".to_owned(),
            });
        }
        if step.is_zero() {
            return Err(Error::InvalidIteration {
                node,
                cause: "step must not be zero".to_owned(),
            });
        }

        let modulus = &restart - &start;
        let k = BigInt::from(generation_offset);
        let current = (&k * &step + (&initial - &start)).mod_floor(&modulus);
        Ok(Self {
            start,
            step,
            modulus,
            current,
            scale,
        })
    }

    /// Returns the current value as `f64` and advances the state.
    pub fn next_value(&mut self) -> f64 {
        let fixed = &self.start + &self.current;
        self.current = (&self.current + &self.step).mod_floor(&self.modulus);
        bigint_to_f64(&fixed) / bigint_to_f64(&self.scale)
    }
}

fn pow10(n: u32) -> BigInt {
    let mut r = BigInt::from(1);
    for _ in 0..n {
        r *= 10;
    }
    r
}

fn bigint_to_f64(v: &BigInt) -> f64 {
    // `BigInt` values produced here always originate from an `f64 * 10^15`,
    // so they comfortably round-trip through `f64` without overflow.
    let (sign, digits) = v.to_u64_digits();
    let mut acc = 0f64;
    for &d in digits.iter().rev() {
        acc = acc * 2f64.powi(64) + d as f64;
    }
    if sign == num_bigint::Sign::Minus {
        -acc
    } else {
        acc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn directive(start: i64, restart: Option<i64>, step: Option<i64>, initial: Option<i64>) -> IterationDirective {
        IterationDirective {
            start: json!(start),
            restart: restart.map(|r| json!(r)),
            step: step.map(|s| json!(s)),
            initial: initial.map(|i| json!(i)),
        }
    }

    #[test]
    fn test_long_iteration_wraps_around_the_restart_boundary() {
        // start=-50, restart=0, step=47, initial=-50, offset=0.
        let d = directive(-50, Some(0), Some(47), Some(-50));
        let mut it = IntIterator::new(NodeId(0), &d, i64::MIN as i128, i64::MAX as i128, 0).unwrap();
        assert_eq!(it.next_value(), BigInt::from(-50));
        assert_eq!(it.next_value(), BigInt::from(-3));
    }

    #[test]
    fn test_boolean_fast_forward_matches_parity_of_the_offset() {
        for k in 0..6u64 {
            let mut it = BoolIterator::new(true, k);
            assert_eq!(it.next_value(), k % 2 == 0);
        }
    }

    #[test]
    fn test_fast_forward_matches_stepwise_replay() {
        let d = directive(-50, Some(0), Some(47), None);
        let mut stepwise = IntIterator::new(NodeId(0), &d, i64::MIN as i128, i64::MAX as i128, 0).unwrap();
        let mut ff = IntIterator::new(NodeId(0), &d, i64::MIN as i128, i64::MAX as i128, 5).unwrap();
        for _ in 0..5 {
            stepwise.next_value();
        }
        assert_eq!(stepwise.next_value(), ff.next_value());
    }

    #[test]
    fn test_start_equal_restart_is_invalid() {
        let d = directive(0, Some(0), Some(1), None);
        let err = IntIterator::new(NodeId(0), &d, i64::MIN as i128, i64::MAX as i128, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidIteration { .. }));
    }

    #[test]
    fn test_step_sign_must_agree_with_restart_direction() {
        let d = directive(0, Some(10), Some(-1), None);
        let err = IntIterator::new(NodeId(0), &d, i64::MIN as i128, i64::MAX as i128, 0).unwrap_err();
        assert!(matches!(err, Error::InvalidIteration { .. }));
    }

    #[test]
    fn test_wraps_around_at_restart() {
        // start=1, restart=3, step=1 => 1, 2, 1, 2, ...
        let d = directive(1, Some(3), Some(1), None);
        let mut it = IntIterator::new(NodeId(0), &d, i64::MIN as i128, i64::MAX as i128, 0).unwrap();
        let seq: Vec<_> = (0..5).map(|_| it.next_value()).collect();
        assert_eq!(
            seq,
            vec![
                BigInt::from(1),
                BigInt::from(2),
                BigInt::from(1),
                BigInt::from(2),
                BigInt::from(1)
            ]
        );
    }
}
