//! Collation: the injected hash + equality collaborator over key bytes.
//!
//! The index treats keys as opaque byte strings and defers every hash and
//! every equality test to a `Collation`. Two keys that compare equal must
//! hash equal; nothing else is assumed. In particular, equality is not
//! assumed to be a plain byte comparison.

use core::hash::{BuildHasher, Hasher};
use std::collections::hash_map::RandomState;

/// Hash and equality over key bytes under one collation.
///
/// Contract: `eq(a, b)` implies `hash(a) == hash(b)`.
pub trait Collation {
    fn hash(&self, key: &[u8]) -> u64;
    fn eq(&self, a: &[u8], b: &[u8]) -> bool;
}

/// Bytewise collation: keys are equal iff their bytes are.
#[derive(Clone, Default)]
pub struct Binary(RandomState);

impl Collation for Binary {
    fn hash(&self, key: &[u8]) -> u64 {
        self.0.hash_one(key)
    }

    fn eq(&self, a: &[u8], b: &[u8]) -> bool {
        a == b
    }
}

/// ASCII case-insensitive collation: `b"Key"` and `b"kEY"` are the same key.
///
/// Hashing folds each byte to lowercase so equal-under-collation keys hash
/// identically. Non-ASCII bytes pass through unchanged.
#[derive(Clone, Default)]
pub struct AsciiCaseInsensitive(RandomState);

impl Collation for AsciiCaseInsensitive {
    fn hash(&self, key: &[u8]) -> u64 {
        let mut h = self.0.build_hasher();
        for &b in key {
            h.write_u8(b.to_ascii_lowercase());
        }
        h.write_usize(key.len());
        h.finish()
    }

    fn eq(&self, a: &[u8], b: &[u8]) -> bool {
        a.eq_ignore_ascii_case(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_discriminates_case() {
        let c = Binary::default();
        assert!(c.eq(b"key", b"key"));
        assert!(!c.eq(b"key", b"KEY"));
    }

    #[test]
    fn case_insensitive_eq_implies_hash_eq() {
        let c = AsciiCaseInsensitive::default();
        let pairs: &[(&[u8], &[u8])] = &[
            (b"key", b"KEY"),
            (b"MiXeD", b"mIxEd"),
            (b"", b""),
            (b"a\xffZ", b"A\xffz"),
        ];
        for (a, b) in pairs {
            assert!(c.eq(a, b));
            assert_eq!(c.hash(a), c.hash(b));
        }
    }

    #[test]
    fn case_insensitive_still_discriminates_content() {
        let c = AsciiCaseInsensitive::default();
        assert!(!c.eq(b"key", b"keys"));
        assert!(!c.eq(b"key", b"kex"));
    }
}
