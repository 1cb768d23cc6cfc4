//! chain-hashmap: a separate-chaining hash map assembled from two small
//! containers that are useful on their own.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep each layer small enough that its invariants can be checked
//!   in isolation, then compose them.
//! - Layers:
//!   - DynArray<T>: contiguous growable storage with an explicit capacity
//!     policy (exact `reserve`, doubling `push`, `clear` keeps the block).
//!   - ForwardList<T>: singly linked list over a generational arena with a
//!     before-begin sentinel and O(1) append. Positions are copyable and
//!     go stale instead of dangling.
//!   - ChainedHashMap<K, V, S>: a `DynArray` of `ForwardList` buckets.
//!     Records are `(K, V)` pairs chained in bucket `hash(key) % buckets`.
//!
//! Growth and rehashing
//! - Defaults: 1024 buckets, max load factor 2.0.
//! - An insertion that pushes `len` above `max_load_factor * buckets`
//!   rebuilds the table at `len * 2` buckets before placing the record.
//! - `rehash(n)` never leaves the map above its load factor: `n` is raised
//!   to `ceil(len / max_load_factor)` and to at least one bucket.
//! - Rehashing calls `K: Hash` for every record; hashes are not cached.
//!
//! Cursors
//! - `Cursor` is a plain `Copy` value: table id, bucket index, and chain
//!   position. Accessors take the map explicitly and return `Option`.
//! - Each table built by the map gets a fresh id, so cursors from before a
//!   rehash, or from another map, resolve to `None`.
//! - The end cursor is `(last bucket, Position::End)`; every walk that runs
//!   out of records lands on it.
//!
//! Reentrancy
//! - Sections that call `K: Hash`/`K: Eq` are wrapped in a debug-only guard;
//!   reaching back into the same map from those impls panics in debug
//!   builds.
//!
//! Notes and non-goals
//! - Single-threaded; no internal synchronization.
//! - The table never shrinks on its own; `rehash` with a small count does.
//!
//! ```
//! use chain_hashmap::ChainedHashMap;
//!
//! let mut m: ChainedHashMap<String, u32> = ChainedHashMap::with_bucket_count(1);
//! m.insert("a".into(), 1);
//! m.insert("b".into(), 2);
//! assert_eq!(m.load_factor(), 2.0);
//!
//! let (_, inserted) = m.insert("c".into(), 3);
//! assert!(inserted);
//! assert!(m.load_factor() <= m.max_load_factor());
//! assert_eq!(m["c"], 3);
//! ```

pub mod array;
pub mod chained_hash_map;
mod chained_hash_map_proptest;
mod config;
mod error;
pub mod forward_list;
mod reentrancy;

// Public surface
pub use array::DynArray;
pub use chained_hash_map::{ChainedHashMap, Cursor};
pub use config::{MapConfig, DEFAULT_BUCKET_COUNT, DEFAULT_MAX_LOAD_FACTOR};
pub use error::CursorError;
pub use fnv::FnvBuildHasher;
pub use forward_list::{ForwardList, Position};
