#![cfg(test)]

// Property tests for HashIndex kept inside the crate so they can call the
// structural audit (`check_invariants`) after every operation.

use crate::collation::{Binary, Collation};
use crate::index::{Handle, HashIndex, InsertError, Options, UpdateError};
use crate::record::RecordKey;
use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Rec {
    key: Vec<u8>,
    val: u32,
}

impl RecordKey for Rec {
    fn key(&self) -> &[u8] {
        &self.key
    }
}

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// keys, the pool shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, u32),
    RemoveOneOf(usize),
    Search(usize),
    FindAll(usize),
    Update(usize, usize), // re-key a live record from pool[i] to pool[j]
    Replace(usize, u32),
    Iterate,
    Clear,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<Vec<u8>>, Vec<Op>)> {
    proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..6), 1..=8).prop_flat_map(
        |pool| {
            let idxs: Vec<usize> = (0..pool.len()).collect();
            let idx = proptest::sample::select(idxs);
            let op = prop_oneof![
                8 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| Op::Insert(i, v)),
                6 => idx.clone().prop_map(Op::RemoveOneOf),
                4 => idx.clone().prop_map(Op::Search),
                3 => idx.clone().prop_map(Op::FindAll),
                3 => (idx.clone(), idx.clone()).prop_map(|(i, j)| Op::Update(i, j)),
                2 => (idx.clone(), any::<u32>()).prop_map(|(i, v)| Op::Replace(i, v)),
                2 => Just(Op::Iterate),
                1 => Just(Op::Clear),
            ];
            proptest::collection::vec(op, 1..80).prop_map(move |ops| (pool.clone(), ops))
        },
    )
}

// Model: per key, the multiset of live (handle, value) pairs.
type Model = BTreeMap<Vec<u8>, Vec<(Handle, u32)>>;

fn model_len(model: &Model) -> usize {
    model.values().map(Vec::len).sum()
}

fn run_scenario<C: Collation + Clone>(
    collation: C,
    unique: bool,
    pool: Vec<Vec<u8>>,
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut sut: HashIndex<Rec, C> = HashIndex::with_options(
        collation.clone(),
        Options {
            unique,
            ..Options::default()
        },
    );
    let mut model: Model = BTreeMap::new();
    let mut stale: Vec<Handle> = Vec::new();

    // Canonical model key: the first pool key equal under the collation, so
    // collation-equal spellings share a model bucket.
    let canon = |k: &[u8]| -> Vec<u8> {
        pool.iter()
            .find(|p| collation.eq(p, k))
            .cloned()
            .unwrap_or_else(|| k.to_vec())
    };

    for op in ops {
        match op {
            Op::Insert(i, v) => {
                let key = pool[i].clone();
                let ck = canon(&key);
                let dup = unique && model.get(&ck).is_some_and(|e| !e.is_empty());
                match sut.insert(Rec { key, val: v }) {
                    Ok(h) => {
                        prop_assert!(!dup, "insert must fail on duplicate");
                        model.entry(ck).or_default().push((h, v));
                    }
                    Err(InsertError::DuplicateKey(r)) => {
                        prop_assert!(dup, "duplicate error only when key is live");
                        prop_assert_eq!(r.val, v, "rejected record handed back");
                    }
                    Err(InsertError::AllocationFailure(_)) => {
                        prop_assert!(false, "no allocation pressure in tests");
                    }
                }
            }
            Op::RemoveOneOf(i) => {
                let ck = canon(&pool[i]);
                let entry = model.get_mut(&ck).and_then(|e| e.pop());
                match entry {
                    Some((h, v)) => {
                        let r = sut.remove(h).expect("live handle must remove");
                        prop_assert_eq!(r.val, v);
                        stale.push(h);
                    }
                    None => {
                        prop_assert!(sut.search(&pool[i]).is_none());
                    }
                }
            }
            Op::Search(i) => {
                let ck = canon(&pool[i]);
                let present = model.get(&ck).is_some_and(|e| !e.is_empty());
                prop_assert_eq!(sut.search(&pool[i]).is_some(), present);
            }
            Op::FindAll(i) => {
                let ck = canon(&pool[i]);
                let mut got: Vec<u32> = sut
                    .find_first(&pool[i])
                    .map(|h| h.record(&sut).unwrap().val)
                    .collect();
                let mut want: Vec<u32> = model
                    .get(&ck)
                    .map(|e| e.iter().map(|&(_, v)| v).collect())
                    .unwrap_or_default();
                got.sort_unstable();
                want.sort_unstable();
                prop_assert_eq!(got, want, "cursor enumerates the key's multiset");
            }
            Op::Update(i, j) => {
                let old_ck = canon(&pool[i]);
                let entry = model.get_mut(&old_ck).and_then(|e| e.pop());
                let Some((h, v)) = entry else { continue };
                let old_key = sut.record(h).unwrap().key.clone();
                sut.record_mut(h).unwrap().key = pool[j].clone();
                let new_ck = canon(&pool[j]);
                let dup = unique
                    && new_ck != old_ck
                    && model.get(&new_ck).is_some_and(|e| !e.is_empty());
                match sut.update(h, &old_key) {
                    Ok(h2) => {
                        prop_assert!(!dup, "update must fail on duplicate");
                        prop_assert_eq!(h2, h);
                        model.entry(new_ck).or_default().push((h, v));
                    }
                    Err(UpdateError::DuplicateKey(r)) => {
                        prop_assert!(dup, "duplicate error only when new key is live");
                        prop_assert_eq!(r.val, v, "record removed and handed back");
                        stale.push(h);
                    }
                    Err(UpdateError::NotFound) => {
                        prop_assert!(false, "live handle with correct old key");
                    }
                }
            }
            Op::Replace(i, v) => {
                let ck = canon(&pool[i]);
                let slot = model.get_mut(&ck).and_then(|e| e.last_mut());
                let Some(entry) = slot else { continue };
                let (h, old_v) = *entry;
                let same_key = sut.record(h).unwrap().key.clone();
                let old = sut
                    .replace(h, Rec { key: same_key, val: v })
                    .expect("live handle must replace");
                prop_assert_eq!(old.val, old_v);
                entry.1 = v;
            }
            Op::Iterate => {
                let mut got: Vec<u32> = sut.iter().map(|(_, r)| r.val).collect();
                let mut want: Vec<u32> = model
                    .values()
                    .flat_map(|e| e.iter().map(|&(_, v)| v))
                    .collect();
                got.sort_unstable();
                want.sort_unstable();
                prop_assert_eq!(got, want, "full walk visits each live entry once");
            }
            Op::Clear => {
                for e in model.values() {
                    stale.extend(e.iter().map(|&(h, _)| h));
                }
                model.clear();
                sut.clear();
                prop_assert_eq!(sut.bucket_count(), 1);
            }
        }

        // Post-conditions after every op.
        sut.check_invariants();
        prop_assert_eq!(sut.len(), model_len(&model));
        prop_assert_eq!(sut.is_empty(), model_len(&model) == 0);
        for &h in &stale {
            prop_assert!(h.record(&sut).is_none(), "stale handle must not resolve");
        }
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    // State-machine equivalence against a per-key multiset model, unique and
    // non-unique, with the structural audit after every operation.
    #[test]
    fn prop_state_machine_non_unique((pool, ops) in arb_scenario()) {
        run_scenario(Binary::default(), false, pool, ops)?;
    }

    #[test]
    fn prop_state_machine_unique((pool, ops) in arb_scenario()) {
        run_scenario(Binary::default(), true, pool, ops)?;
    }

    // Worst-case chains: every key hashes to the same value, so all entries
    // share one chain per bucket cycle. Stresses equality probing, identity
    // unlinking, and split/merge relocation.
    #[test]
    fn prop_state_machine_with_collisions((pool, ops) in arb_scenario()) {
        #[derive(Clone, Default)]
        struct ConstHash;
        impl Collation for ConstHash {
            fn hash(&self, _key: &[u8]) -> u64 { 0 }
            fn eq(&self, a: &[u8], b: &[u8]) -> bool { a == b }
        }
        run_scenario(ConstHash, false, pool, ops)?;
    }
}
