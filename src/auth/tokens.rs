//! Index token generation
//!
//! Indexes are short random strings over the 62-character alphabet
//! `[A-Za-z0-9]`. The generator only guarantees absence at the instant of the
//! check; callers that insert afterwards must hold the registry's writer gate
//! across both steps.

use rand::distr::Alphanumeric;
use rand::Rng;
use thiserror::Error;

/// Default index length
pub const DEFAULT_TOKEN_LENGTH: usize = 10;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token length must be positive")]
    InvalidLength,
}

/// Produces indexes that do not collide with the ones already issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenGenerator {
    length: usize,
}

impl TokenGenerator {
    pub fn new(length: usize) -> Result<Self, TokenError> {
        if length == 0 {
            return Err(TokenError::InvalidLength);
        }
        Ok(Self { length })
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate an index for which `exists` returns false
    ///
    /// Loops until a free value is drawn. With 62^length candidates this
    /// terminates quickly unless the space is nearly exhausted.
    pub fn generate(&self, exists: impl Fn(&str) -> bool) -> String {
        self.generate_with(&mut rand::rng(), exists)
    }

    /// Same as [`generate`](Self::generate) with a caller-supplied RNG
    pub fn generate_with<R: Rng>(&self, rng: &mut R, exists: impl Fn(&str) -> bool) -> String {
        loop {
            let candidate: String = (0..self.length)
                .map(|_| char::from(rng.sample(Alphanumeric)))
                .collect();

            if !exists(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for TokenGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_TOKEN_LENGTH,
        }
    }
}

/// Check that a token has the given length and only uses `[A-Za-z0-9]`
pub fn is_well_formed(token: &str, length: usize) -> bool {
    token.len() == length && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_default_length() {
        let gen = TokenGenerator::default();
        assert_eq!(gen.length(), 10);

        let token = gen.generate(|_| false);
        assert!(is_well_formed(&token, 10), "bad token: {}", token);
    }

    #[test]
    fn test_custom_length() {
        let gen = TokenGenerator::new(24).unwrap();
        let token = gen.generate(|_| false);
        assert!(is_well_formed(&token, 24));
    }

    #[test]
    fn test_zero_length_rejected() {
        assert!(matches!(TokenGenerator::new(0), Err(TokenError::InvalidLength)));
    }

    #[test]
    fn test_redraws_on_collision() {
        let gen = TokenGenerator::default();
        let mut rng = StdRng::seed_from_u64(42);

        // Reject the first three candidates
        let calls = Cell::new(0);
        let token = gen.generate_with(&mut rng, |_| {
            calls.set(calls.get() + 1);
            calls.get() <= 3
        });

        assert_eq!(calls.get(), 4);
        assert!(is_well_formed(&token, 10));
    }

    #[test]
    fn test_avoids_existing_tokens() {
        // Length 1 leaves 62 candidates; block all but one
        let gen = TokenGenerator::new(1).unwrap();
        let token = gen.generate(|t| t != "Q");
        assert_eq!(token, "Q");
    }

    #[test]
    fn test_alphabet_coverage() {
        let gen = TokenGenerator::new(1).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let seen: HashSet<String> = (0..5_000)
            .map(|_| gen.generate_with(&mut rng, |_| false))
            .collect();

        assert_eq!(seen.len(), 62);
        assert!(seen.iter().all(|t| is_well_formed(t, 1)));
    }

    #[test]
    fn test_is_well_formed() {
        assert!(is_well_formed("aZ3kT9qLmP", 10));
        assert!(!is_well_formed("aZ3kT9qLm", 10));
        assert!(!is_well_formed("aZ3kT9qLm-", 10));
        assert!(!is_well_formed("bogus", 10));
    }
}
