//! Linear-hashing address computation.
//!
//! The bucket count is not kept at a power of two. Instead the directory
//! tracks a power-of-two base implicitly: `base` is the largest power of two
//! not above the count, and buckets `0..count - base` have already been split
//! across the doubled modulus. Insert, split and merge all address through
//! [`bucket_of`] so a relocated link always lands where a fresh computation
//! would also place it.

/// Largest power of two less than or equal to `n`. `n` must be nonzero.
#[inline]
fn base_of(n: usize) -> usize {
    debug_assert!(n > 0);
    1usize << (usize::BITS - 1 - n.leading_zeros())
}

/// Bucket housing `hash` in a directory of `bucket_count` buckets.
#[inline]
pub(crate) fn bucket_of(hash: u64, bucket_count: usize) -> usize {
    let base = base_of(bucket_count);
    let b = (hash as usize) & (base - 1);
    if b < bucket_count - base {
        // Already split: address with the doubled modulus.
        (hash as usize) & (2 * base - 1)
    } else {
        b
    }
}

/// Bucket whose chain is partitioned when the count grows from
/// `bucket_count` to `bucket_count + 1`. Its links end up either staying or
/// moving to the new bucket at index `bucket_count`.
#[inline]
pub(crate) fn split_source(bucket_count: usize) -> usize {
    bucket_count - base_of(bucket_count)
}

/// Bucket that reabsorbs the highest bucket when the count shrinks from
/// `bucket_count` to `bucket_count - 1`. Exact inverse of [`split_source`]:
/// `merge_target(n + 1) == split_source(n)`.
#[inline]
pub(crate) fn merge_target(bucket_count: usize) -> usize {
    let top = bucket_count - 1;
    top - base_of(top)
}
