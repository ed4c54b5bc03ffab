//! linhash: a single-threaded, in-memory dynamic hash index that grows and
//! shrinks one bucket at a time (linear hashing) and compares keys through a
//! pluggable, collation-aware hasher.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: map variable-length byte keys to caller-defined records with O(1)
//!   amortized insert/remove and no full-table rehash, correct under
//!   non-trivial collations (e.g. case-insensitive text keys).
//! - Layers:
//!   - addressing: the pure linear-hashing address computation (bucket of a
//!     hash, which bucket splits next, which bucket reabsorbs the last one).
//!   - collation: the injected hash + equality collaborator over key bytes;
//!     the index never interprets encodings itself.
//!   - record: the key-extraction capability a stored record type provides.
//!   - index: `HashIndex`, owning a slot arena of chain links plus the bucket
//!     directory, with insert/remove/update/replace/search/iterate and
//!     optional uniqueness enforcement.
//!
//! Constraints
//! - Single-writer or externally serialized: no internal synchronization.
//! - Chains are index-linked through slot keys; links never own other links,
//!   so there are no ownership cycles and slots are reused generationally.
//! - Each link caches its key's hash; the collation is consulted for equality
//!   but a key is hashed once per operation, never per probe step.
//! - Every bucket-count change is exactly ±1 (one split or one merge), so no
//!   single call pays more than one bucket's worth of relocation.
//! - A failed mutating call leaves the index exactly as it was.
//!
//! Reentrancy policy
//! - The index calls user code while probing (`Collation::hash`/`eq`,
//!   `RecordKey::key`). A debug-only guard at each public entry point panics
//!   on nested entry while internals may be transiently inconsistent; release
//!   builds compile it out.
//!
//! Notes and non-goals
//! - Iteration order is unspecified beyond "each live entry exactly once".
//! - A key cursor (`Matches`) borrows the index immutably, so mutating while
//!   a cursor is live is a compile error rather than a runtime hazard.
//! - No persistence, no locking, no charset engine: collations are injected.

mod addressing;
pub mod collation;
mod index;
mod index_proptest;
pub mod record;
mod reentrancy;

// Public surface
pub use collation::{AsciiCaseInsensitive, Binary, Collation};
pub use index::{Handle, HashIndex, InsertError, Matches, Options, UpdateError};
pub use record::{FixedKeyed, RecordKey};
