//! Compiles a `regex` directive into a [`rand_regex::Regex`] sampler, and
//! bounds its output length when a `length` directive is also in play.

use rand::Rng;

use crate::{
    error::{Error, Result},
    length::Length,
    schema::NodeId,
};

/// Default cap on repetition counts for unbounded regex quantifiers (`*`,
/// `+`, `{n,}`), matching the ambient stack's own default.
const DEFAULT_MAX_REPEAT: u32 = 100;

/// How many rejection-sampling attempts to make before giving up on
/// satisfying a `length` directive's window and returning the last draw
/// anyway: best-effort bounded retry, not a hard guarantee that the window
/// is satisfiable for every regex.
const MAX_LENGTH_ATTEMPTS: u32 = 64;

/// Compiles a regex pattern into a sampler, mirroring the ambient stack's own
/// `regex_syntax::ParserBuilder` + `rand_regex::Regex::with_hir` pipeline.
/// No flags are supported; patterns are always parsed as Unicode.
pub fn compile(node: NodeId, pattern: &str) -> Result<rand_regex::Regex> {
    let mut parser = regex_syntax::ParserBuilder::new();
    let hir = parser
        .build()
        .parse(pattern)
        .map_err(|e| Error::InvalidRegex { node, source: e.into() })?;
    rand_regex::Regex::with_hir(hir, DEFAULT_MAX_REPEAT).map_err(|source| Error::InvalidRegex { node, source })
}

/// Draws a single string from `generator`, unconstrained by length.
pub fn sample(rng: &mut impl Rng, generator: &rand_regex::Regex) -> String {
    rng.sample(generator)
}

/// Draws a string from `generator`, rejection-sampling up to
/// [`MAX_LENGTH_ATTEMPTS`] times for one whose length (in Unicode scalar
/// values) falls within `length`'s window. If no attempt succeeds, returns
/// the last draw regardless of length: a regex's language may not contain
/// any string in the requested window, so there is no correct value to fall
/// back to.
pub fn sample_bounded(rng: &mut impl Rng, generator: &rand_regex::Regex, length: &Length) -> String {
    let mut last = String::new();
    for _ in 0..MAX_LENGTH_ATTEMPTS {
        last = rng.sample(generator);
        let len = last.chars().count() as u64;
        if len >= length.min && len <= length.max_inclusive() {
            return last;
        }
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn test_compiled_regex_samples_match_the_pattern() {
        let pattern = "[a-z]{3,6}";
        let generator = compile(NodeId(0), pattern).unwrap();
        let checker = regex::Regex::new(&format!("^(?:{pattern})$")).unwrap();
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..10_000 {
            let s = sample(&mut rng, &generator);
            assert!(checker.is_match(&s), "{s:?} did not match {pattern}");
        }
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let err = compile(NodeId(0), "[unterminated");
        assert!(err.is_err());
    }

    #[test]
    fn test_sample_bounded_respects_window_when_satisfiable() {
        let generator = compile(NodeId(0), "a{1,20}").unwrap();
        let length = Length::new(5, 10);
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..200 {
            let s = sample_bounded(&mut rng, &generator, &length);
            let len = s.chars().count() as u64;
            assert!((5..10).contains(&len), "{len} out of bounds");
        }
    }
}
