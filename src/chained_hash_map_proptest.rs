#![cfg(test)]

// Property tests for ChainedHashMap, compiled with the crate's unit tests so
// they share its dev-dependencies without a feature gate.

use crate::chained_hash_map::{ChainedHashMap, Cursor};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;
use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::hash::{BuildHasher, Hasher};
use std::rc::Rc;

// Key newtype with Borrow<str> to exercise borrowed lookup.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
struct Key(String);
impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
impl std::borrow::Borrow<str> for Key {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Pool-indexed operations: indices shrink toward earlier keys.
#[derive(Clone, Debug)]
enum Op {
    Insert(usize, i32),
    TryEmplace(usize, i32),
    Erase(usize),
    Find(usize),
    Contains(String),
    Mutate(usize, i32),
    IndexDefault(usize),
    Rehash(usize),
    Reserve(usize),
    Clear,
    Walk,
    SetMaxLoadFactor(f32),
}

fn key_from(pool: &[String], i: usize) -> Key {
    Key(pool[i].clone())
}

fn arb_scenario() -> impl Strategy<Value = (usize, Vec<String>, Vec<Op>)> {
    (1usize..=8, proptest::collection::vec("[a-z]{0,4}", 1..=12)).prop_flat_map(|(buckets, pool)| {
        let idx = proptest::sample::select((0..pool.len()).collect::<Vec<_>>());
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::Insert(i, v)),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, v)| Op::TryEmplace(i, v)),
            3 => idx.clone().prop_map(Op::Erase),
            2 => idx.clone().prop_map(Op::Find),
            1 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,4}".prop_map(|s| s)
            ]
            .prop_map(Op::Contains),
            2 => (idx.clone(), any::<i32>()).prop_map(|(i, d)| Op::Mutate(i, d)),
            1 => idx.prop_map(Op::IndexDefault),
            2 => (0usize..40, any::<bool>())
                .prop_map(|(n, reserve)| if reserve { Op::Reserve(n) } else { Op::Rehash(n) }),
            3 => (0usize..3, proptest::sample::select(vec![0.5f32, 1.0, 2.0, 4.0])).prop_map(
                |(which, ml)| match which {
                    0 => Op::Clear,
                    1 => Op::Walk,
                    _ => Op::SetMaxLoadFactor(ml),
                }
            ),
        ];
        proptest::collection::vec(op, 1..80).prop_map(move |ops| (buckets, pool.clone(), ops))
    })
}

// Drives `sut` and a std HashMap through the same operations.
// Invariants checked after every step:
// - Insert-if-absent: the first value for a key wins; lazy values run only on insert.
// - `find`/`contains` parity with the model; misses yield the end cursor.
// - Erase reports presence; cursors to erased records never resolve again.
// - Every record sits in exactly one bucket.
// - `load_factor() <= max_load_factor()`, except after lowering the max until the
//   next insertion, rehash, reserve or clear.
// - A cursor walk from `begin()` visits the model's key set exactly once.
fn run_scenario<S: BuildHasher>(
    mut sut: ChainedHashMap<Key, i32, S>,
    pool: &[String],
    ops: Vec<Op>,
) -> Result<(), TestCaseError> {
    let mut model: HashMap<Key, i32> = HashMap::new();
    let mut stale: Vec<Cursor> = Vec::new();
    let lazy_calls = Rc::new(Cell::new(0));
    let mut lowered = false;

    for op in ops {
        let len_before = model.len();
        match op {
            Op::Insert(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let (c, inserted) = sut.insert(k.clone(), v);
                prop_assert_eq!(inserted, !already);
                model.entry(k.clone()).or_insert(v);
                prop_assert_eq!(c.key(&sut), Some(&k));
                prop_assert_eq!(c.value(&sut), model.get(&k));
            }
            Op::TryEmplace(i, v) => {
                let k = key_from(pool, i);
                let already = model.contains_key(&k);
                let counter = lazy_calls.clone();
                let before = counter.get();
                let (_, inserted) = sut.try_emplace(k.clone(), move || {
                    counter.set(counter.get() + 1);
                    v
                });
                prop_assert_eq!(inserted, !already);
                let expected_calls = if already { before } else { before + 1 };
                prop_assert_eq!(lazy_calls.get(), expected_calls);
                model.entry(k).or_insert(v);
            }
            Op::Erase(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                let erased = sut.erase(&k);
                prop_assert_eq!(erased, model.remove(&k).is_some());
                if erased {
                    stale.push(c);
                }
                prop_assert!(!sut.erase(&k), "second erase must report absence");
            }
            Op::Find(i) => {
                let k = key_from(pool, i);
                let c = sut.find(&k);
                prop_assert_eq!(c.is_end(&sut), !model.contains_key(&k));
                prop_assert_eq!(c.value(&sut), model.get(&k));
                if !c.is_end(&sut) {
                    prop_assert_eq!(c.bucket(), sut.bucket(&k));
                }
            }
            Op::Contains(s) => {
                let has_model = model.keys().any(|k| k.0 == s);
                prop_assert_eq!(sut.contains(s.as_str()), has_model);
            }
            Op::Mutate(i, d) => {
                let k = key_from(pool, i);
                if let Some(v) = sut.get_mut(&k) {
                    *v = v.saturating_add(d);
                    let mv = model.get_mut(&k).expect("present in model");
                    *mv = mv.saturating_add(d);
                } else {
                    prop_assert!(!model.contains_key(&k));
                }
            }
            Op::IndexDefault(i) => {
                let k = key_from(pool, i);
                let v = *sut.get_or_insert_default(k.clone());
                prop_assert_eq!(v, *model.entry(k).or_default());
            }
            Op::Rehash(n) => {
                sut.rehash(n);
                prop_assert!(sut.bucket_count() >= n.max(1));
                lowered = false;
            }
            Op::Reserve(n) => {
                sut.reserve(n);
                lowered = false;
            }
            Op::Clear => {
                lowered = false;
                stale.extend(model.keys().map(|k| sut.find(k)));
                sut.clear();
                model.clear();
                prop_assert_eq!(sut.begin(), sut.end());
            }
            Op::Walk => {
                let mut seen = BTreeSet::new();
                let mut c = sut.begin();
                while !c.is_end(&sut) {
                    let k = c.key(&sut).expect("walk cursor resolves").clone();
                    prop_assert!(seen.insert(k), "record visited twice");
                    c = sut.next_cursor(c).expect("walk cursor advances");
                }
                let m_keys: BTreeSet<_> = model.keys().cloned().collect();
                prop_assert_eq!(seen, m_keys);
            }
            Op::SetMaxLoadFactor(ml) => {
                let buckets = sut.bucket_count();
                lowered |= ml < sut.max_load_factor();
                sut.set_max_load_factor(ml);
                prop_assert_eq!(sut.max_load_factor(), ml);
                prop_assert_eq!(sut.bucket_count(), buckets);
            }
        }
        if model.len() > len_before {
            lowered = false;
        }

        for c in &stale {
            prop_assert!(c.value(&sut).is_none());
        }
        prop_assert_eq!(sut.len(), model.len());
        prop_assert_eq!(sut.is_empty(), model.is_empty());
        if !lowered {
            prop_assert!(sut.load_factor() <= sut.max_load_factor());
        }
        let chained: usize = (0..sut.bucket_count()).map(|b| sut.bucket_size(b)).sum();
        prop_assert_eq!(chained, sut.len());
    }

    let s_pairs: BTreeSet<_> = sut.iter().map(|(k, v)| (k.clone(), *v)).collect();
    let m_pairs: BTreeSet<_> = model.into_iter().collect();
    prop_assert_eq!(s_pairs, m_pairs);
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((buckets, pool, ops) in arb_scenario()) {
        run_scenario(ChainedHashMap::with_bucket_count(buckets), &pool, ops)?;
    }
}

// Collision variant using a constant hasher: every record shares bucket 0,
// so lookups and erases resolve by equality alone.
#[derive(Clone, Default)]
struct ConstBuildHasher;
struct ConstHasher;
impl BuildHasher for ConstBuildHasher {
    type Hasher = ConstHasher;
    fn build_hasher(&self) -> Self::Hasher {
        ConstHasher
    }
}
impl Hasher for ConstHasher {
    fn write(&mut self, _bytes: &[u8]) {}
    fn finish(&self) -> u64 {
        0
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine_with_collisions((buckets, pool, ops) in arb_scenario()) {
        let sut = ChainedHashMap::with_bucket_count_and_hasher(buckets, ConstBuildHasher);
        run_scenario(sut, &pool, ops)?;
    }
}
