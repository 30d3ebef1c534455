//! Short addressing code allocation for milou.

use rand::Rng;

use super::types::{CODE_ALPHABET, CODE_LENGTH};

/// Bound on allocation retries.
///
/// The store's UNIQUE constraint on `messages.code` is the authoritative
/// uniqueness check; a draw that loses at insert time is simply redrawn.
/// Exceeding the bound is a fatal allocation error, not expected in
/// practice given the codespace size for small deployments.
pub const MAX_CODE_ATTEMPTS: u32 = 10;

/// Generates candidate addressing codes.
pub struct CodeAllocator;

impl CodeAllocator {
    /// Draw a candidate code uniformly from the alphabet.
    pub fn draw() -> String {
        let mut rng = rand::rng();
        (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
            .collect()
    }

    /// Check whether a string has the shape of an addressing code.
    pub fn is_valid(code: &str) -> bool {
        code.len() == CODE_LENGTH
            && code
                .bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_shape() {
        for _ in 0..100 {
            let code = CodeAllocator::draw();
            assert!(CodeAllocator::is_valid(&code), "bad code: {code}");
        }
    }

    #[test]
    fn test_draws_vary() {
        // 100 draws from a ~3.1e9 space colliding entirely would mean a
        // broken generator
        let codes: std::collections::HashSet<String> =
            (0..100).map(|_| CodeAllocator::draw()).collect();
        assert!(codes.len() > 1);
    }

    #[test]
    fn test_is_valid() {
        assert!(CodeAllocator::is_valid("abc123"));
        assert!(CodeAllocator::is_valid("000000"));
        assert!(!CodeAllocator::is_valid("abc12"));
        assert!(!CodeAllocator::is_valid("abc1234"));
        assert!(!CodeAllocator::is_valid("ABC123"));
        assert!(!CodeAllocator::is_valid("abc12!"));
    }
}
