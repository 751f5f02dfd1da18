//! The decimal engine: generates the two's-complement big-endian byte
//! encoding of `value * 10^scale` as a signed arbitrary-precision integer,
//! for `bytes`/`fixed` nodes carrying a `decimal` logical type.

use num_bigint::BigInt;
use rand::Rng;

use crate::schema::DecimalMeta;

/// Generates the unscaled value for a decimal node whose directive supplied
/// an explicit `range` (range mode).
///
/// Draws a `f64` uniformly in `[min, max)`, then rounds `value * 10^scale`
/// into a `BigInt`.
pub fn generate_range(rng: &mut impl Rng, min: f64, max: f64, scale: u32) -> BigInt {
    let d: f64 = rng.gen_range(min..max);
    f64_to_scaled_bigint(d, scale)
}

/// Generates the unscaled value for a decimal node with no `range` directive
/// (precision mode).
///
/// Repeatedly accumulates 15-digit random blocks (`acc = acc * 10^15 +
/// fresh_block`) until the accumulated precision reaches `meta.precision`,
/// then trims the excess digits by integer division, and negates with
/// probability 1/2.
pub fn generate_precision(rng: &mut impl Rng, meta: DecimalMeta) -> BigInt {
    const BLOCK_DIGITS: u32 = 15;
    let block_modulus = pow10(BLOCK_DIGITS);

    let mut acc = BigInt::from(0);
    let mut digits = 0u32;
    while digits < meta.precision {
        let block: u64 = rng.gen_range(0..10u64.pow(BLOCK_DIGITS));
        acc = acc * &block_modulus + BigInt::from(block);
        digits += BLOCK_DIGITS;
    }

    if digits > meta.precision {
        acc /= pow10(digits - meta.precision);
    }

    if rng.gen_bool(0.5) {
        -acc
    } else {
        acc
    }
}

/// Encodes a signed arbitrary-precision integer as two's-complement
/// big-endian bytes.
///
/// `num-bigint`'s own `to_signed_bytes_be` already produces exactly this
/// representation (its "signed bytes" *are* two's complement, minimal-length,
/// sign-extended), so this is a thin, documented pass-through.
pub fn encode_twos_complement(value: &BigInt) -> Vec<u8> {
    value.to_signed_bytes_be()
}

/// Encodes a signed arbitrary-precision integer into exactly `size` bytes,
/// as required for a `fixed` schema carrying a `decimal` logical type:
/// left-pads with `0x00` (positive) or `0xFF` (negative) to reach
/// `size`, and rejects values whose minimal encoding is already longer than
/// `size` as ill-specified.
pub fn encode_twos_complement_fixed(value: &BigInt, size: usize) -> Result<Vec<u8>, String> {
    let minimal = value.to_signed_bytes_be();
    if minimal.len() > size {
        return Err(format!(
            "decimal value requires {} bytes, which does not fit in the declared fixed size {}",
            minimal.len(),
            size
        ));
    }
    let pad_byte = if value.sign() == num_bigint::Sign::Minus { 0xFF } else { 0x00 };
    let mut out = vec![pad_byte; size - minimal.len()];
    out.extend_from_slice(&minimal);
    Ok(out)
}

fn f64_to_scaled_bigint(d: f64, scale: u32) -> BigInt {
    let scaled = d * 10f64.powi(scale as i32);
    // `round()` then convert through a string to preserve precision beyond
    // what casting straight to i128 would allow for very large scales.
    let rounded = scaled.round();
    if rounded.abs() < 1e18 {
        BigInt::from(rounded as i128)
    } else {
        // Fall back to a decimal-string parse for magnitudes where casting to
        // i128 could lose precision or saturate.
        let s = format!("{rounded:.0}");
        s.parse().unwrap_or_else(|_| BigInt::from(rounded as i128))
    }
}

fn pow10(n: u32) -> BigInt {
    let mut r = BigInt::from(1);
    for _ in 0..n {
        r *= 10;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_encode_twos_complement_matches_known_values() {
        assert_eq!(encode_twos_complement(&BigInt::from(0)), Vec::<u8>::new());
        assert_eq!(encode_twos_complement(&BigInt::from(1)), vec![1]);
        assert_eq!(encode_twos_complement(&BigInt::from(-1)), vec![0xFF]);
        assert_eq!(encode_twos_complement(&BigInt::from(127)), vec![0x7F]);
        assert_eq!(encode_twos_complement(&BigInt::from(128)), vec![0x00, 0x80]);
        assert_eq!(encode_twos_complement(&BigInt::from(-128)), vec![0x80]);
    }

    #[test]
    fn test_encode_fixed_pads_with_sign_extension() {
        let positive = encode_twos_complement_fixed(&BigInt::from(1), 4).unwrap();
        assert_eq!(positive, vec![0x00, 0x00, 0x00, 0x01]);
        let negative = encode_twos_complement_fixed(&BigInt::from(-1), 4).unwrap();
        assert_eq!(negative, vec![0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_encode_fixed_rejects_oversized_value() {
        let err = encode_twos_complement_fixed(&BigInt::from(i64::MAX), 1);
        assert!(err.is_err());
    }

    #[test]
    fn test_generate_range_is_contained_and_scaled() {
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = generate_range(&mut rng, 0.0, 10.0, 2);
            let f: f64 = v.to_string().parse().unwrap();
            assert!((0.0..1000.0).contains(&f));
        }
    }

    #[test]
    fn test_generate_precision_reaches_target_digit_count() {
        let mut rng = SmallRng::seed_from_u64(3);
        let meta = DecimalMeta { precision: 20, scale: 0 };
        for _ in 0..50 {
            let v = generate_precision(&mut rng, meta);
            let digits = v.to_string().trim_start_matches('-').len() as u32;
            assert!(digits <= meta.precision);
        }
    }
}
