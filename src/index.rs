//! HashIndex: dynamic hash index core over a slot arena of chain links.

use crate::addressing::{bucket_of, merge_target, split_source};
use crate::collation::{Binary, Collation};
use crate::record::RecordKey;
use crate::reentrancy::Guard;
use core::ops::ControlFlow;
use slotmap::{DefaultKey, SlotMap};

/// Stable identity of one stored record.
///
/// Generational: a handle to a removed record never resolves again, even if
/// the physical slot is reused by a later insert.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Handle(DefaultKey);

impl Handle {
    pub fn record<'a, R, C>(&self, index: &'a HashIndex<R, C>) -> Option<&'a R>
    where
        R: RecordKey,
        C: Collation,
    {
        index.record(*self)
    }

    pub fn record_mut<'a, R, C>(&self, index: &'a mut HashIndex<R, C>) -> Option<&'a mut R>
    where
        R: RecordKey,
        C: Collation,
    {
        index.record_mut(*self)
    }
}

/// One slot in the backing store: the record, its cached key hash, and the
/// next link in the same bucket's chain. Chains are index-linked; links are
/// never physically contiguous per bucket.
#[derive(Debug)]
struct Link<R> {
    record: R,
    hash: u64,
    chain_next: Option<DefaultKey>,
}

/// Construction-time tuning for [`HashIndex`].
#[derive(Clone, Debug)]
pub struct Options {
    /// Initial and minimum bucket count. Clamped to at least 1.
    pub initial_buckets: usize,
    /// Link slots reserved up front; the arena doubles on its own past this.
    pub capacity: usize,
    /// Reject inserts whose key compares equal to a live entry.
    pub unique: bool,
    /// Records per bucket tolerated before a split (and required before a
    /// merge). Clamped to at least 1. The default of 1 keeps one bucket per
    /// record.
    pub split_load: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            initial_buckets: 1,
            capacity: 0,
            unique: false,
            split_load: 1,
        }
    }
}

#[derive(Debug)]
pub enum InsertError<R> {
    /// `unique` is set and a live entry's key compares equal. The rejected
    /// record is handed back; the index is unchanged.
    DuplicateKey(R),
    /// The bucket directory could not grow. Nothing was inserted.
    AllocationFailure(R),
}

#[derive(Debug)]
pub enum UpdateError<R> {
    /// The handle is stale or `old_key` does not reach the link. The index
    /// is unchanged.
    NotFound,
    /// `unique` is set and the record's new key collides with a live entry.
    /// The record has been removed from the index and is handed back; the
    /// caller must re-insert (under a different key) or roll back.
    DuplicateKey(R),
}

/// In-memory dynamic hash index from byte keys to records of type `R`.
///
/// Keys are extracted from records through [`RecordKey`] and hashed/compared
/// through the injected [`Collation`]. The bucket directory grows and shrinks
/// by exactly one bucket per mutating call (linear hashing), so insert and
/// remove are O(1) amortized with no full-table rehash ever.
///
/// Not internally synchronized: single writer or external serialization.
pub struct HashIndex<R, C = Binary> {
    collation: C,
    links: SlotMap<DefaultKey, Link<R>>,
    buckets: Vec<Option<DefaultKey>>, // chain heads, one per virtual bucket
    initial_buckets: usize,
    unique: bool,
    split_load: usize,
    guard: Guard,
    /// Links touched by the most recent split or merge.
    #[cfg(test)]
    pub(crate) relocated_last: usize,
}

impl<R: RecordKey> HashIndex<R> {
    pub fn new() -> Self {
        Self::with_options(Binary::default(), Options::default())
    }
}

impl<R: RecordKey> Default for HashIndex<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, C> HashIndex<R, C>
where
    R: RecordKey,
    C: Collation,
{
    pub fn with_collation(collation: C) -> Self {
        Self::with_options(collation, Options::default())
    }

    pub fn with_options(collation: C, options: Options) -> Self {
        let initial_buckets = options.initial_buckets.max(1);
        Self {
            collation,
            links: SlotMap::with_capacity_and_key(options.capacity),
            buckets: vec![None; initial_buckets],
            initial_buckets,
            unique: options.unique,
            split_load: options.split_load.max(1),
            guard: Guard::new(),
            #[cfg(test)]
            relocated_last: 0,
        }
    }

    /// Number of live records.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Current number of virtual buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// First live entry whose key compares equal under the collation, or
    /// `None`. Probes compare the cached hash first, the key bytes only on a
    /// hash match.
    pub fn search(&self, key: &[u8]) -> Option<Handle> {
        let _g = self.guard.enter();
        let hash = self.collation.hash(key);
        self.chain_find(hash, key, self.buckets[bucket_of(hash, self.buckets.len())])
    }

    /// Restartable cursor over every live entry whose key compares equal.
    ///
    /// Only meaningful for enumerating duplicates when the index is not
    /// unique. The cursor borrows the index, so mutating while one is live
    /// does not compile.
    pub fn find_first<'a>(&'a self, key: &'a [u8]) -> Matches<'a, R, C> {
        let hash = {
            let _g = self.guard.enter();
            self.collation.hash(key)
        };
        Matches {
            index: self,
            key,
            hash,
            next: self.buckets[bucket_of(hash, self.buckets.len())],
        }
    }

    /// Insert a record, keyed by its current [`RecordKey::key`].
    ///
    /// The new link goes to the head of its bucket's chain. At most one
    /// bucket is split afterwards. On error the record is handed back and
    /// the index is unchanged.
    pub fn insert(&mut self, record: R) -> Result<Handle, InsertError<R>> {
        let _g = self.guard.enter();
        let hash = self.collation.hash(record.key());
        let bucket = bucket_of(hash, self.buckets.len());
        if self.unique
            && self
                .chain_find(hash, record.key(), self.buckets[bucket])
                .is_some()
        {
            return Err(InsertError::DuplicateKey(record));
        }
        // Reserve the directory slot a post-insert split would need before
        // mutating anything, so failure here surfaces with no partial state.
        if self.buckets.try_reserve(1).is_err() {
            return Err(InsertError::AllocationFailure(record));
        }
        let head = self.buckets[bucket];
        let k = self.links.insert(Link {
            record,
            hash,
            chain_next: head,
        });
        self.buckets[bucket] = Some(k);
        if self.links.len() > self.split_load * self.buckets.len() {
            self.split_one();
        }
        Ok(Handle(k))
    }

    /// Remove the record identified by `handle` and return it.
    ///
    /// Identity-precise: with duplicate keys, exactly this entry goes, never
    /// an arbitrary same-key sibling. At most one bucket merge follows.
    /// `None` if the handle is stale.
    pub fn remove(&mut self, handle: Handle) -> Option<R> {
        let _g = self.guard.enter();
        let hash = self.links.get(handle.0)?.hash;
        // The removal-path key must still agree with the hash cached at
        // insert; records in a transitional state serve a cached copy.
        debug_assert_eq!(
            self.collation
                .hash(self.links[handle.0].record.removal_key()),
            hash
        );
        let unlinked = self.unlink(bucket_of(hash, self.buckets.len()), handle.0);
        debug_assert!(unlinked, "live link must be chained from its bucket");
        let link = self.links.remove(handle.0)?;
        if self.buckets.len() > self.initial_buckets
            && self.links.len() <= self.split_load * (self.buckets.len() - 1)
        {
            self.merge_one();
        }
        Some(link.record)
    }

    /// Re-file a record whose key bytes the caller has already rewritten in
    /// place.
    ///
    /// The index still has the link chained under `old_key`; this unlinks it
    /// there and re-chains it under the record's current key. Record count
    /// and bucket count are unchanged. See [`UpdateError`] for the partial
    /// failure on a unique-key collision.
    pub fn update(&mut self, handle: Handle, old_key: &[u8]) -> Result<Handle, UpdateError<R>> {
        let _g = self.guard.enter();
        if !self.links.contains_key(handle.0) {
            return Err(UpdateError::NotFound);
        }
        let old_hash = self.collation.hash(old_key);
        let old_bucket = bucket_of(old_hash, self.buckets.len());
        if !self.unlink(old_bucket, handle.0) {
            return Err(UpdateError::NotFound);
        }
        let new_hash = self.collation.hash(self.links[handle.0].record.key());
        let new_bucket = bucket_of(new_hash, self.buckets.len());
        if self.unique {
            let key = self.links[handle.0].record.key();
            if self
                .chain_find(new_hash, key, self.buckets[new_bucket])
                .is_some()
            {
                // Already unlinked; complete the removal and hand it back.
                let link = self.links.remove(handle.0).ok_or(UpdateError::NotFound)?;
                return Err(UpdateError::DuplicateKey(link.record));
            }
        }
        let head = self.buckets[new_bucket];
        let link = &mut self.links[handle.0];
        link.hash = new_hash;
        link.chain_next = head;
        self.buckets[new_bucket] = Some(handle.0);
        Ok(handle)
    }

    /// Swap the stored record without touching chain structure or the cached
    /// hash. The caller guarantees `new_record` carries an identical key.
    /// Returns the displaced record, or `None` for a stale handle.
    pub fn replace(&mut self, handle: Handle, new_record: R) -> Option<R> {
        let _g = self.guard.enter();
        let hash = self.links.get(handle.0)?.hash;
        debug_assert_eq!(
            self.collation.hash(new_record.key()),
            hash,
            "replace requires an identical key"
        );
        let link = self.links.get_mut(handle.0)?;
        Some(core::mem::replace(&mut link.record, new_record))
    }

    pub fn record(&self, handle: Handle) -> Option<&R> {
        self.links.get(handle.0).map(|l| &l.record)
    }

    /// Mutable access to a stored record. Rewriting the key bytes through
    /// this leaves the link filed under the old key; call [`update`] with
    /// that old key before the next lookup.
    ///
    /// [`update`]: Self::update
    pub fn record_mut(&mut self, handle: Handle) -> Option<&mut R> {
        self.links.get_mut(handle.0).map(|l| &mut l.record)
    }

    /// Every live entry exactly once, in backing-store order (unspecified,
    /// not insertion order).
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &R)> {
        self.links.iter().map(|(k, l)| (Handle(k), &l.record))
    }

    /// Full walk with early stop: the first `ControlFlow::Break` value is
    /// returned, `None` if the walk visited every entry.
    pub fn for_each_until<B, F>(&self, mut action: F) -> Option<B>
    where
        F: FnMut(Handle, &R) -> ControlFlow<B>,
    {
        for (k, l) in self.links.iter() {
            if let ControlFlow::Break(b) = action(Handle(k), &l.record) {
                return Some(b);
            }
        }
        None
    }

    /// `ordinal`-th record in backing-store physical order. Linear scan;
    /// diagnostics and debugging only, not an indexed lookup.
    pub fn element(&self, ordinal: usize) -> Option<(Handle, &R)> {
        self.links.iter().nth(ordinal).map(|(k, l)| (Handle(k), &l.record))
    }

    /// Drop every record and return to the initial bucket count, keeping the
    /// allocated storage for reuse.
    pub fn clear(&mut self) {
        {
            let _g = self.guard.enter();
            self.buckets.clear();
            self.buckets.resize(self.initial_buckets, None);
        }
        // Structure is consistent again; record drops run unguarded.
        self.links.clear();
    }

    /// Walk `head`'s chain for the first link matching `key`.
    fn chain_find(&self, hash: u64, key: &[u8], head: Option<DefaultKey>) -> Option<Handle> {
        let mut cur = head;
        while let Some(k) = cur {
            let link = &self.links[k];
            if link.hash == hash && self.collation.eq(link.record.key(), key) {
                return Some(Handle(k));
            }
            cur = link.chain_next;
        }
        None
    }

    /// Splice `target` out of `bucket`'s chain. False if it is not chained
    /// there; the chain is untouched in that case.
    fn unlink(&mut self, bucket: usize, target: DefaultKey) -> bool {
        let mut prev: Option<DefaultKey> = None;
        let mut cur = self.buckets[bucket];
        while let Some(k) = cur {
            let next = self.links[k].chain_next;
            if k == target {
                match prev {
                    None => self.buckets[bucket] = next,
                    Some(p) => self.links[p].chain_next = next,
                }
                return true;
            }
            prev = Some(k);
            cur = next;
        }
        false
    }

    /// Grow by one bucket: repartition the split-source chain under the new
    /// count. Each link stays or moves to the bucket just created; nothing
    /// else in the index is touched.
    fn split_one(&mut self) {
        let old_count = self.buckets.len();
        let src = split_source(old_count);
        let new_count = old_count + 1;
        self.buckets.push(None); // capacity reserved by insert
        let mut cur = self.buckets[src].take();
        let mut moved = 0usize;
        while let Some(k) = cur {
            let (hash, next) = {
                let l = &self.links[k];
                (l.hash, l.chain_next)
            };
            let dest = bucket_of(hash, new_count);
            debug_assert!(dest == src || dest == old_count);
            let head = self.buckets[dest];
            self.links[k].chain_next = head;
            self.buckets[dest] = Some(k);
            cur = next;
            moved += 1;
        }
        #[cfg(test)]
        {
            self.relocated_last = moved;
        }
        let _ = moved;
    }

    /// Shrink by one bucket: rehouse the top bucket's chain into the bucket
    /// it was split from. Exact inverse of [`split_one`](Self::split_one).
    fn merge_one(&mut self) {
        let old_count = self.buckets.len();
        let tgt = merge_target(old_count);
        let mut cur = self.buckets.pop().unwrap_or(None);
        let mut moved = 0usize;
        while let Some(k) = cur {
            let (hash, next) = {
                let l = &self.links[k];
                (l.hash, l.chain_next)
            };
            debug_assert_eq!(bucket_of(hash, old_count - 1), tgt);
            let head = self.buckets[tgt];
            self.links[k].chain_next = head;
            self.buckets[tgt] = Some(k);
            cur = next;
            moved += 1;
        }
        #[cfg(test)]
        {
            self.relocated_last = moved;
        }
        let _ = moved;
    }

    /// Full structural audit: every chained slot is live, cached hashes match
    /// a fresh computation, every link sits in the bucket the current count
    /// assigns it, chains cover the arena exactly, and uniqueness holds when
    /// configured.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        use std::collections::HashSet;

        assert!(self.buckets.len() >= self.initial_buckets);
        let mut chained: HashSet<DefaultKey> = HashSet::new();
        for (b, &head) in self.buckets.iter().enumerate() {
            let mut cur = head;
            while let Some(k) = cur {
                let link = self.links.get(k).expect("chain references a live slot");
                assert_eq!(self.collation.hash(link.record.key()), link.hash);
                assert_eq!(bucket_of(link.hash, self.buckets.len()), b);
                assert!(chained.insert(k), "slot chained twice");
                cur = link.chain_next;
            }
        }
        assert_eq!(chained.len(), self.links.len());
        if self.unique {
            for (ka, la) in self.links.iter() {
                for (kb, lb) in self.links.iter() {
                    if ka != kb {
                        assert!(
                            !(la.hash == lb.hash
                                && self.collation.eq(la.record.key(), lb.record.key())),
                            "two live entries compare equal in a unique index"
                        );
                    }
                }
            }
        }
    }
}

/// Cursor over all entries sharing one key; see
/// [`HashIndex::find_first`]. Yields each matching entry exactly once.
pub struct Matches<'a, R, C> {
    index: &'a HashIndex<R, C>,
    key: &'a [u8],
    hash: u64,
    next: Option<DefaultKey>,
}

impl<'a, R, C> Iterator for Matches<'a, R, C>
where
    R: RecordKey,
    C: Collation,
{
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let _g = self.index.guard.enter();
        while let Some(k) = self.next {
            let link = &self.index.links[k];
            self.next = link.chain_next;
            if link.hash == self.hash && self.index.collation.eq(link.record.key(), self.key) {
                return Some(Handle(k));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collation::AsciiCaseInsensitive;
    use std::collections::BTreeSet;

    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Rec {
        key: Vec<u8>,
        val: i32,
    }

    impl Rec {
        fn new(key: &[u8], val: i32) -> Self {
            Self {
                key: key.to_vec(),
                val,
            }
        }
    }

    impl RecordKey for Rec {
        fn key(&self) -> &[u8] {
            &self.key
        }
    }

    /// Identity collation: the key's leading bytes, little-endian, are the
    /// hash. Makes bucket placement fully deterministic in tests.
    #[derive(Clone, Default)]
    struct Identity;

    impl Collation for Identity {
        fn hash(&self, key: &[u8]) -> u64 {
            let mut buf = [0u8; 8];
            let n = key.len().min(8);
            buf[..n].copy_from_slice(&key[..n]);
            u64::from_le_bytes(buf)
        }

        fn eq(&self, a: &[u8], b: &[u8]) -> bool {
            a == b
        }
    }

    fn unique_index() -> HashIndex<Rec> {
        HashIndex::with_options(
            Binary::default(),
            Options {
                unique: true,
                ..Options::default()
            },
        )
    }

    #[test]
    fn duplicate_insert_rejected_and_record_returned() {
        let mut idx = unique_index();
        idx.insert(Rec::new(b"dup", 1)).unwrap();
        match idx.insert(Rec::new(b"dup", 2)) {
            Err(InsertError::DuplicateKey(r)) => assert_eq!(r.val, 2),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(idx.len(), 1);
        idx.check_invariants();
    }

    #[test]
    fn non_unique_index_chains_duplicates() {
        let mut idx: HashIndex<Rec> = HashIndex::new();
        for v in 0..3 {
            idx.insert(Rec::new(b"same", v)).unwrap();
        }
        idx.insert(Rec::new(b"other", 9)).unwrap();
        assert_eq!(idx.len(), 4);

        let vals: BTreeSet<i32> = idx
            .find_first(b"same")
            .map(|h| h.record(&idx).unwrap().val)
            .collect();
        assert_eq!(vals, BTreeSet::from([0, 1, 2]));
        idx.check_invariants();
    }

    #[test]
    fn remove_is_identity_precise_among_duplicates() {
        let mut idx: HashIndex<Rec> = HashIndex::new();
        let h0 = idx.insert(Rec::new(b"k", 0)).unwrap();
        let h1 = idx.insert(Rec::new(b"k", 1)).unwrap();
        let h2 = idx.insert(Rec::new(b"k", 2)).unwrap();

        assert_eq!(idx.remove(h1).unwrap().val, 1);
        let left: BTreeSet<i32> = idx
            .find_first(b"k")
            .map(|h| h.record(&idx).unwrap().val)
            .collect();
        assert_eq!(left, BTreeSet::from([0, 2]));
        assert!(idx.remove(h1).is_none(), "stale handle must not resolve");
        assert!(h0.record(&idx).is_some());
        assert!(h2.record(&idx).is_some());
        idx.check_invariants();
    }

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut idx = unique_index();
        let h1 = idx.insert(Rec::new(b"old", 1)).unwrap();
        idx.remove(h1).unwrap();
        let h2 = idx.insert(Rec::new(b"new", 2)).unwrap();
        assert_ne!(h1, h2);
        assert!(h1.record(&idx).is_none());
        assert_eq!(h2.record(&idx).unwrap().val, 2);
    }

    #[test]
    fn update_refiles_under_new_key() {
        let mut idx = unique_index();
        let h = idx.insert(Rec::new(b"before", 7)).unwrap();
        for filler in [b"x1", b"x2", b"x3"] {
            idx.insert(Rec::new(filler, 0)).unwrap();
        }

        h.record_mut(&mut idx).unwrap().key = b"after".to_vec();
        let h2 = idx.update(h, b"before").unwrap();
        assert_eq!(h2, h);
        assert!(idx.search(b"before").is_none());
        assert_eq!(idx.search(b"after"), Some(h));
        assert_eq!(idx.len(), 4);
        idx.check_invariants();
    }

    #[test]
    fn update_duplicate_removes_and_returns_record() {
        let mut idx = unique_index();
        idx.insert(Rec::new(b"taken", 1)).unwrap();
        let h = idx.insert(Rec::new(b"mine", 2)).unwrap();

        h.record_mut(&mut idx).unwrap().key = b"taken".to_vec();
        match idx.update(h, b"mine") {
            Err(UpdateError::DuplicateKey(r)) => assert_eq!(r.val, 2),
            other => panic!("unexpected result: {:?}", other),
        }
        // Partial-failure state: the record is out of the index.
        assert_eq!(idx.len(), 1);
        assert!(h.record(&idx).is_none());
        idx.check_invariants();
    }

    #[test]
    fn update_with_wrong_old_key_is_not_found() {
        // Identity collation: with 8 sequential keys the directory has 8
        // buckets and key 5's chain provably does not hold key 3's link.
        let mut idx: HashIndex<Vec<u8>, Identity> = HashIndex::with_collation(Identity);
        let mut h = None;
        for i in 0..8u64 {
            let hh = idx.insert(i.to_le_bytes().to_vec()).unwrap();
            if i == 3 {
                h = Some(hh);
            }
        }
        let h = h.unwrap();
        match idx.update(h, &5u64.to_le_bytes()) {
            Err(UpdateError::NotFound) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        // Unchanged on failure.
        assert_eq!(idx.search(&3u64.to_le_bytes()), Some(h));
        idx.check_invariants();
    }

    #[test]
    fn replace_swaps_record_in_place() {
        let mut idx = unique_index();
        let h = idx.insert(Rec::new(b"k", 1)).unwrap();
        let old = idx.replace(h, Rec::new(b"k", 2)).unwrap();
        assert_eq!(old.val, 1);
        assert_eq!(idx.search(b"k"), Some(h));
        assert_eq!(h.record(&idx).unwrap().val, 2);
        idx.check_invariants();
    }

    #[test]
    fn collation_governs_equality_not_bytes() {
        let mut idx: HashIndex<Rec, AsciiCaseInsensitive> = HashIndex::with_options(
            AsciiCaseInsensitive::default(),
            Options {
                unique: true,
                ..Options::default()
            },
        );
        idx.insert(Rec::new(b"Key", 1)).unwrap();
        assert!(idx.search(b"kEY").is_some());
        match idx.insert(Rec::new(b"KEY", 2)) {
            Err(InsertError::DuplicateKey(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        idx.check_invariants();
    }

    /// With a deterministic hash and sequential keys, no split or merge ever
    /// touches more than a few links, independent of index size.
    #[test]
    fn split_and_merge_touch_one_bucket_worth_of_links() {
        let mut idx: HashIndex<Vec<u8>, Identity> = HashIndex::with_collation(Identity);
        let mut handles = Vec::new();
        for i in 0..512u64 {
            let before = idx.bucket_count();
            handles.push(idx.insert(i.to_le_bytes().to_vec()).unwrap());
            assert!(idx.bucket_count() - before <= 1);
            if idx.bucket_count() != before {
                assert!(idx.relocated_last <= 4, "split moved {}", idx.relocated_last);
            }
        }
        for h in handles {
            let before = idx.bucket_count();
            idx.remove(h).unwrap();
            assert!(before - idx.bucket_count() <= 1);
            if idx.bucket_count() != before {
                assert!(idx.relocated_last <= 4, "merge moved {}", idx.relocated_last);
            }
        }
        assert_eq!(idx.bucket_count(), 1);
        idx.check_invariants();
    }

    #[test]
    fn clear_resets_but_stays_usable() {
        let mut idx = unique_index();
        for i in 0..50u32 {
            idx.insert(Rec::new(format!("k{i}").as_bytes(), i as i32))
                .unwrap();
        }
        assert!(idx.bucket_count() > 1);
        idx.clear();
        assert_eq!(idx.len(), 0);
        assert_eq!(idx.bucket_count(), 1);
        let h = idx.insert(Rec::new(b"again", 1)).unwrap();
        assert_eq!(idx.search(b"again"), Some(h));
        idx.check_invariants();
    }

    #[test]
    fn removal_key_path_is_honored_for_transitional_records() {
        /// Record whose live key becomes unreadable once torn down; removal
        /// falls back to the cached copy.
        #[derive(Debug)]
        struct Torn {
            cached: Vec<u8>,
            live: bool,
        }

        impl RecordKey for Torn {
            fn key(&self) -> &[u8] {
                assert!(self.live, "live key read from torn-down record");
                &self.cached
            }
            fn removal_key(&self) -> &[u8] {
                &self.cached
            }
        }

        let mut idx: HashIndex<Torn> = HashIndex::new();
        let h = idx
            .insert(Torn {
                cached: b"k".to_vec(),
                live: true,
            })
            .unwrap();
        h.record_mut(&mut idx).unwrap().live = false;
        let torn = idx.remove(h).unwrap();
        assert_eq!(torn.cached, b"k");
        assert!(idx.is_empty());
    }

    #[test]
    fn for_each_until_stops_early() {
        let mut idx: HashIndex<Rec> = HashIndex::new();
        for i in 0..10 {
            idx.insert(Rec::new(format!("k{i}").as_bytes(), i)).unwrap();
        }
        let mut seen = 0;
        let found = idx.for_each_until(|_h, r| {
            seen += 1;
            if r.val == 4 {
                ControlFlow::Break(r.val)
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(found, Some(4));
        assert!(seen <= 10);
        assert_eq!(idx.for_each_until::<(), _>(|_, _| ControlFlow::Continue(())), None);
    }

    #[test]
    fn element_walks_physical_order() {
        let mut idx: HashIndex<Rec> = HashIndex::new();
        for i in 0..5 {
            idx.insert(Rec::new(format!("k{i}").as_bytes(), i)).unwrap();
        }
        let by_ordinal: BTreeSet<i32> = (0..5)
            .map(|i| idx.element(i).unwrap().1.val)
            .collect();
        assert_eq!(by_ordinal, BTreeSet::from_iter(0..5));
        assert!(idx.element(5).is_none());
    }
}
