use crate::error::{AppError, AppResult};
use crate::services::validation::validate_short_code;

/// Character set for generating short codes.
const ALPHABET_CHARS: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9',
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm',
    'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Hands out short codes that are not yet taken.
#[derive(Debug, Clone)]
pub struct ShortCodeAllocator {
    length: usize,
    max_attempts: u32,
}

impl ShortCodeAllocator {
    pub fn new(length: usize, max_attempts: u32) -> Self {
        Self {
            length,
            max_attempts,
        }
    }

    /// Produce one random candidate without checking for collisions.
    pub fn candidate(&self) -> String {
        let length = self.length;
        nanoid::nanoid!(length, ALPHABET_CHARS)
    }

    /// Pick a short code for a new link and claim it.
    ///
    /// `claim` tries to take a code and reports whether it succeeded; an error from it
    /// aborts allocation. A non-empty `preferred` code is validated and claimed once.
    /// Otherwise random candidates are drawn, and every draw counts toward
    /// `max_attempts` whether the code was already known or lost a race.
    ///
    /// # Errors
    ///
    /// * `AppError::InvalidShortCode` if `preferred` is malformed
    /// * `AppError::DuplicateCode` if `preferred` is already in use
    /// * `AppError::AllocationExhausted` if `max_attempts` candidates all collided
    pub fn allocate<F>(&self, preferred: Option<&str>, mut claim: F) -> AppResult<String>
    where
        F: FnMut(&str) -> AppResult<bool>,
    {
        if let Some(code) = preferred.map(str::trim).filter(|c| !c.is_empty()) {
            validate_short_code(code)?;
            if !claim(code)? {
                return Err(AppError::DuplicateCode(code.to_string()));
            }
            return Ok(code.to_string());
        }

        for _ in 0..self.max_attempts {
            let code = self.candidate();

            if claim(&code)? {
                return Ok(code);
            }
        }

        Err(AppError::AllocationExhausted(self.max_attempts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::collections::HashSet;

    #[test]
    fn test_alphabet_chars_const() {
        // 0-9 and a-z
        assert_eq!(ALPHABET_CHARS.len(), 36);
    }

    #[test]
    fn test_alphabet_chars_unique() {
        let unique: HashSet<_> = ALPHABET_CHARS.iter().collect();
        assert_eq!(unique.len(), ALPHABET_CHARS.len());
    }

    #[test]
    fn test_generated_code_shape() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let code = allocator.allocate(None, |_| Ok(true)).unwrap();
        assert_eq!(code.len(), 5);
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn test_empty_preferred_generates() {
        let allocator = ShortCodeAllocator::new(6, 10);
        let code = allocator.allocate(Some("   "), |_| Ok(true)).unwrap();
        assert_eq!(code.len(), 6);
    }

    #[test]
    fn test_preferred_code_is_used() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let code = allocator.allocate(Some("abc12"), |_| Ok(true)).unwrap();
        assert_eq!(code, "abc12");
    }

    #[test]
    fn test_preferred_code_conflict() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let existing: HashSet<String> = ["abc12".to_string()].into();
        let err = allocator
            .allocate(Some("abc12"), |c| Ok(!existing.contains(c)))
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateCode(code) if code == "abc12"));
    }

    #[test]
    fn test_preferred_code_must_be_well_formed() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let err = allocator.allocate(Some("a/b"), |_| Ok(true)).unwrap_err();
        assert!(matches!(err, AppError::InvalidShortCode(_)));
    }

    #[test]
    fn test_generation_retries_then_exhausts() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let calls = Cell::new(0);
        let err = allocator
            .allocate(None, |_| {
                calls.set(calls.get() + 1);
                Ok(false)
            })
            .unwrap_err();
        assert!(matches!(err, AppError::AllocationExhausted(10)));
        assert_eq!(calls.get(), 10);
    }

    #[test]
    fn test_generation_recovers_after_collision() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let calls = Cell::new(0);
        let code = allocator
            .allocate(None, |_| {
                calls.set(calls.get() + 1);
                Ok(calls.get() >= 3)
            })
            .unwrap();
        assert_eq!(code.len(), 5);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_claim_error_stops_allocation() {
        let allocator = ShortCodeAllocator::new(5, 10);
        let calls = Cell::new(0);
        let err = allocator
            .allocate(None, |_| {
                calls.set(calls.get() + 1);
                Err(AppError::Internal("store unavailable".into()))
            })
            .unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(calls.get(), 1);
    }
}
