//! Paste identifiers: random 63-bit integers shown to users in base 62.

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PasteError;

const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RADIX: i64 = 62;

/// Source of candidate paste ids. Uniqueness is not required here; the store
/// rejects collisions and the caller draws again.
pub trait IdSource: Send + Sync {
    fn next_id(&self) -> i64;
}

/// Draws ids from one CSPRNG owned for the lifetime of the allocator.
pub struct IdAllocator {
    rng: Mutex<StdRng>,
}

impl IdAllocator {
    pub fn from_os_rng() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    pub fn with_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::from_os_rng()
    }
}

impl IdSource for IdAllocator {
    fn next_id(&self) -> i64 {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        (rng.random::<u64>() >> 1) as i64
    }
}

/// Base-62 form of a paste id. Ids are never negative.
pub fn encode(id: i64) -> String {
    let mut n = id.max(0);
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % RADIX) as usize]);
        n /= RADIX;
    }
    digits.reverse();
    digits.into_iter().map(char::from).collect()
}

/// Inverse of [`encode`]. Rejects empty input, characters outside the
/// alphabet, values above `i64::MAX` and non-canonical leading zeros.
pub fn decode(s: &str) -> Result<i64, PasteError> {
    if s.is_empty() || (s.len() > 1 && s.starts_with('0')) {
        return Err(PasteError::InvalidIdentifier);
    }

    s.bytes().try_fold(0i64, |acc, b| {
        let digit = digit_value(b).ok_or(PasteError::InvalidIdentifier)?;
        acc.checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or(PasteError::InvalidIdentifier)
    })
}

fn digit_value(b: u8) -> Option<i64> {
    let v = match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'z' => b - b'a' + 10,
        b'A'..=b'Z' => b - b'A' + 36,
        _ => return None,
    };
    Some(i64::from(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_values() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "a");
        assert_eq!(encode(61), "Z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(i64::MAX), "aZl8N0y58M7");
    }

    #[test]
    fn decode_inverts_encode() {
        let mut samples = vec![0, 1, 61, 62, 3843, 3844, i64::MAX - 1, i64::MAX];
        let alloc = IdAllocator::seeded(7);
        samples.extend((0..1000).map(|_| alloc.next_id()));

        for n in samples {
            assert_eq!(decode(&encode(n)).unwrap(), n, "round trip of {}", n);
        }
    }

    #[test]
    fn decode_rejects_foreign_characters() {
        for s in ["", "abc-def", "a b", "ab_", "é", "12!", "+1"] {
            assert!(
                matches!(decode(s), Err(PasteError::InvalidIdentifier)),
                "{:?} should be rejected",
                s
            );
        }
    }

    #[test]
    fn decode_rejects_overflow() {
        // One past i64::MAX
        assert!(decode("aZl8N0y58M8").is_err());
        assert!(decode("ZZZZZZZZZZZZ").is_err());
    }

    #[test]
    fn decode_rejects_leading_zeros() {
        assert_eq!(decode("0").unwrap(), 0);
        assert!(decode("00").is_err());
        assert!(decode("0a").is_err());
    }

    #[test]
    fn allocated_ids_are_non_negative() {
        let alloc = IdAllocator::from_os_rng();
        for _ in 0..10_000 {
            assert!(alloc.next_id() >= 0);
        }
    }

    #[test]
    fn seeded_allocators_are_reproducible() {
        let a = IdAllocator::seeded(42);
        let b = IdAllocator::seeded(42);
        let xs: Vec<i64> = (0..5).map(|_| a.next_id()).collect();
        let ys: Vec<i64> = (0..5).map(|_| b.next_id()).collect();
        assert_eq!(xs, ys);
    }
}
