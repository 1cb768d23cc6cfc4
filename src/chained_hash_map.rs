//! ChainedHashMap: separate-chaining hash map over a `DynArray` of
//! `ForwardList` buckets.
//!
//! A record lives in bucket `hash(key) % bucket_count`, appended to that
//! bucket's chain. The bucket index is recomputed on every lookup and never
//! stored on the record. After an insertion pushes `len` above
//! `max_load_factor * bucket_count`, the table is rebuilt at `len * 2`
//! buckets before the new record is placed.
//!
//! Cursors are `(table id, bucket, chain position)` triples. Every table the
//! map builds gets a fresh id, so a cursor taken before a rehash (or from a
//! different map) resolves to `None` instead of a wrong record.

use crate::array::DynArray;
use crate::config::{check_load_factor, MapConfig};
use crate::error::CursorError;
use crate::forward_list::{self, ForwardList, Position};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use core::sync::atomic::{AtomicU64, Ordering};
use fnv::FnvBuildHasher;
use std::collections::TryReserveError;

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
}

type Bucket<K, V> = ForwardList<Entry<K, V>>;

static NEXT_TABLE_ID: AtomicU64 = AtomicU64::new(0);

fn next_table_id() -> u64 {
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}

fn bucket_for<Q, S>(hasher: &S, q: &Q, bucket_count: usize) -> usize
where
    Q: ?Sized + Hash,
    S: BuildHasher,
{
    (hasher.hash_one(q) % bucket_count as u64) as usize
}

/// Position of a record in a `ChainedHashMap`.
///
/// The past-the-end cursor is `(last bucket, Position::End)` regardless of
/// where a walk ran out of records.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Cursor {
    table: u64,
    bucket: usize,
    position: Position,
}

impl Cursor {
    /// Bucket index this cursor points into.
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Position within the bucket's chain.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Key of the record, or `None` for the end cursor or a stale cursor.
    pub fn key<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a K> {
        map.cursor_entry(*self).map(|e| &e.key)
    }

    /// Shared value of the record, or `None` if the cursor does not resolve.
    pub fn value<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<&'a V> {
        map.cursor_entry(*self).map(|e| &e.value)
    }

    /// Mutable value of the record, or `None` if the cursor does not resolve.
    pub fn value_mut<'a, K, V, S>(&self, map: &'a mut ChainedHashMap<K, V, S>) -> Option<&'a mut V> {
        map.cursor_entry_mut(*self).map(|e| &mut e.value)
    }

    /// `(key, value)` of the record, or `None` if the cursor does not resolve.
    pub fn entry<'a, K, V, S>(&self, map: &'a ChainedHashMap<K, V, S>) -> Option<(&'a K, &'a V)> {
        map.cursor_entry(*self).map(|e| (&e.key, &e.value))
    }

    /// Whether this is `map.end()`.
    pub fn is_end<K, V, S>(&self, map: &ChainedHashMap<K, V, S>) -> bool {
        *self == map.end()
    }
}

pub struct ChainedHashMap<K, V, S = FnvBuildHasher> {
    hasher: S,
    buckets: DynArray<Bucket<K, V>>,
    len: usize,
    max_load_factor: f32,
    table: u64,
    reentrancy: DebugReentrancy,
}

impl<K, V> ChainedHashMap<K, V, FnvBuildHasher> {
    /// Empty map with 1024 buckets and a max load factor of 2.0.
    pub fn new() -> Self {
        Self::with_hasher(FnvBuildHasher::default())
    }

    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self::with_bucket_count_and_hasher(bucket_count, FnvBuildHasher::default())
    }

    pub fn with_config(config: MapConfig) -> Self {
        Self::with_config_and_hasher(config, FnvBuildHasher::default())
    }
}

impl<K, V, S: Default> Default for ChainedHashMap<K, V, S> {
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> ChainedHashMap<K, V, S> {
    pub fn with_hasher(hasher: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default(), hasher)
    }

    pub fn with_bucket_count_and_hasher(bucket_count: usize, hasher: S) -> Self {
        Self::with_config_and_hasher(MapConfig::default().bucket_count(bucket_count), hasher)
    }

    /// # Panics
    ///
    /// Panics if the configured max load factor is not finite and positive.
    pub fn with_config_and_hasher(config: MapConfig, hasher: S) -> Self {
        check_load_factor(config.max_load_factor);
        Self {
            hasher,
            buckets: DynArray::with_len(config.bucket_count.max(1)),
            len: 0,
            max_load_factor: config.max_load_factor,
            table: next_table_id(),
            reentrancy: DebugReentrancy::new(),
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.len
    }
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every record; the bucket count is kept.
    pub fn clear(&mut self) {
        for chain in self.buckets.iter_mut() {
            chain.clear();
        }
        self.len = 0;
    }

    /// Exchange contents, tables and hashers with `other`. Cursors follow
    /// their table to the other map.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// The hash builder used to place keys.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Number of buckets in the current table; never zero.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Number of records chained in bucket `n`.
    ///
    /// # Panics
    ///
    /// Panics if `n >= bucket_count()`.
    pub fn bucket_size(&self, n: usize) -> usize {
        self.buckets[n].len()
    }

    /// Average chain length: `len / bucket_count`.
    pub fn load_factor(&self) -> f32 {
        self.len as f32 / self.buckets.len() as f32
    }

    /// Load factor above which an insertion grows the table.
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Takes effect on the next insertion; the table is not rebuilt here.
    ///
    /// # Panics
    ///
    /// Panics if `ml` is not finite and positive.
    pub fn set_max_load_factor(&mut self, ml: f32) {
        check_load_factor(ml);
        self.max_load_factor = ml;
    }

    pub fn begin(&self) -> Cursor {
        if self.is_empty() {
            return self.end();
        }
        self.first_from(0)
    }

    pub fn end(&self) -> Cursor {
        let last = self.buckets.len() - 1;
        self.cursor_at(last, Position::End)
    }

    /// Cursor following `cursor`, skipping empty buckets. Advancing past the
    /// last record yields `end()`.
    pub fn next_cursor(&self, cursor: Cursor) -> Result<Cursor, CursorError> {
        if cursor.table != self.table {
            return Err(CursorError::Stale);
        }
        let chain = self.buckets.get(cursor.bucket).ok_or(CursorError::Stale)?;
        let next = chain.next(cursor.position)?;
        if let Position::Node(_) = next {
            return Ok(self.cursor_at(cursor.bucket, next));
        }
        if cursor.bucket + 1 >= self.buckets.len() {
            return Ok(self.end());
        }
        Ok(self.first_from(cursor.bucket + 1))
    }

    pub fn iter(&self) -> Iter<'_, K, V, S> {
        Iter {
            map: self,
            cursor: self.begin(),
            remaining: self.len,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            remaining: self.len,
            buckets: self.buckets.iter_mut(),
            chain: None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.iter_mut().map(|(_, v)| v)
    }

    fn cursor_at(&self, bucket: usize, position: Position) -> Cursor {
        Cursor {
            table: self.table,
            bucket,
            position,
        }
    }

    // First record at or after bucket `start`. The last bucket is never
    // scanned past: its begin() is either a record or the end position.
    fn first_from(&self, start: usize) -> Cursor {
        let last = self.buckets.len() - 1;
        let bucket = (start..last)
            .find(|&b| !self.buckets[b].is_empty())
            .unwrap_or(last);
        self.cursor_at(bucket, self.buckets[bucket].begin())
    }

    fn cursor_entry(&self, cursor: Cursor) -> Option<&Entry<K, V>> {
        if cursor.table != self.table {
            return None;
        }
        self.buckets.get(cursor.bucket)?.get(cursor.position)
    }

    fn cursor_entry_mut(&mut self, cursor: Cursor) -> Option<&mut Entry<K, V>> {
        if cursor.table != self.table {
            return None;
        }
        self.buckets.get_mut(cursor.bucket)?.get_mut(cursor.position)
    }

    fn exceeds_load_factor(&self, len: usize) -> bool {
        len as f64 > f64::from(self.max_load_factor) * self.buckets.len() as f64
    }

    fn resolve_bucket_count(&self, count: usize) -> usize {
        self.bucket_count_for(self.len, count)
    }

    // Smallest bucket count >= `count` that keeps `len` records within the
    // load factor.
    fn bucket_count_for(&self, len: usize, count: usize) -> usize {
        let floor = (len as f64 / f64::from(self.max_load_factor)).ceil() as usize;
        count.max(floor).max(1)
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Bucket that `key` hashes to under the current bucket count.
    pub fn bucket<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash,
    {
        let _g = self.reentrancy.enter();
        bucket_for(&self.hasher, key, self.buckets.len())
    }

    /// Cursor to the record for `key`, or `end()` when absent.
    pub fn find<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        match self.locate(key) {
            Some((bucket, pos)) => self.cursor_at(bucket, pos),
            None => self.end(),
        }
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        self.locate(key).is_some()
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let (bucket, pos) = self.locate(key)?;
        self.buckets[bucket].get(pos).map(|e| (&e.key, &e.value))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (bucket, pos) = {
            let _g = self.reentrancy.enter();
            self.locate(key)?
        };
        self.buckets[bucket].get_mut(pos).map(|e| &mut e.value)
    }

    /// Insert `key -> value` unless `key` is already present. Returns the
    /// record's cursor and whether an insertion happened; an existing record
    /// is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> (Cursor, bool) {
        self.try_emplace(key, || value)
    }

    /// Same as `insert`; the record is built from the given parts.
    pub fn emplace(&mut self, key: K, value: V) -> (Cursor, bool) {
        self.insert(key, value)
    }

    /// Insert with a lazily built value: `make` runs only when `key` is absent.
    pub fn try_emplace<F>(&mut self, key: K, make: F) -> (Cursor, bool)
    where
        F: FnOnce() -> V,
    {
        let existing = {
            let _g = self.reentrancy.enter();
            self.locate(&key)
        };
        if let Some((bucket, pos)) = existing {
            return (self.cursor_at(bucket, pos), false);
        }

        // User code (`make`, `K: Hash`) runs before `len` changes.
        let value = make();
        let grown = self.len + 1;
        if self.exceeds_load_factor(grown) {
            log::trace!(
                "Load factor exceeded ({} records in {} buckets), growing",
                grown,
                self.buckets.len()
            );
            let count = self.bucket_count_for(grown, grown * 2);
            self.rebuild(DynArray::with_len(count));
        }

        let bucket = self.bucket(&key);
        let pos = self.buckets[bucket].push_back(Entry { key, value });
        self.len = grown;
        (self.cursor_at(bucket, pos), true)
    }

    /// Indexed access: the value for `key`, inserting `V::default()` first
    /// when absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        let (cursor, _) = self.try_emplace(key, V::default);
        self.cursor_entry_mut(cursor)
            .map(|e| &mut e.value)
            .expect("cursor returned by try_emplace must resolve")
    }

    /// Erase the record for `key`. Returns whether one existed.
    pub fn erase<Q>(&mut self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).is_some()
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let _g = self.reentrancy.enter();
        let bucket = bucket_for(&self.hasher, key, self.buckets.len());
        let chain = &mut self.buckets[bucket];

        // Walk with a trailing predecessor so the match can be unlinked in O(1).
        let mut prev = chain.before_begin();
        let mut hit = None;
        for (pos, entry) in chain.iter_positions() {
            if entry.key.borrow() == key {
                hit = Some(prev);
                break;
            }
            prev = pos;
        }

        let entry = chain.remove_after(hit?).ok().flatten()?;
        self.len -= 1;
        Some((entry.key, entry.value))
    }

    /// Rebuild the table with at least `count` buckets, raised as needed so
    /// that `load_factor() <= max_load_factor()`. Invalidates every cursor.
    pub fn rehash(&mut self, count: usize) {
        let count = self.resolve_bucket_count(count);
        let table = DynArray::with_len(count);
        self.rebuild(table);
    }

    /// Fallible `rehash`: the new table is reserved before any record moves,
    /// so on error the map is unchanged.
    pub fn try_rehash(&mut self, count: usize) -> Result<(), TryReserveError> {
        let count = self.resolve_bucket_count(count);
        let mut table = DynArray::new();
        table.try_reserve(count)?;
        table.resize(count);
        self.rebuild(table);
        Ok(())
    }

    /// Size the table for `count` records without exceeding the load factor.
    pub fn reserve(&mut self, count: usize) {
        log::trace!("Reserving room for {count} records");
        self.rehash(self.buckets_for(count));
    }

    pub fn try_reserve(&mut self, count: usize) -> Result<(), TryReserveError> {
        self.try_rehash(self.buckets_for(count))
    }

    fn buckets_for(&self, count: usize) -> usize {
        (count as f64 / f64::from(self.max_load_factor)).ceil() as usize
    }

    fn locate<Q>(&self, key: &Q) -> Option<(usize, Position)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let bucket = bucket_for(&self.hasher, key, self.buckets.len());
        self.buckets[bucket]
            .iter_positions()
            .find(|(_, e)| e.key.borrow() == key)
            .map(|(pos, _)| (bucket, pos))
    }

    // Move every record into `table` through its chain's append, then swap it
    // in. Target buckets are hashed up front: once records start moving no
    // user code runs, so a panicking `K: Hash` leaves the live table intact.
    fn rebuild(&mut self, mut table: DynArray<Bucket<K, V>>) {
        let _g = self.reentrancy.enter();
        let count = table.len();
        log::debug!(
            "Rehashing {} records from {} to {} buckets",
            self.len,
            self.buckets.len(),
            count
        );

        let mut targets = Vec::with_capacity(self.len);
        for chain in self.buckets.iter() {
            targets.extend(chain.iter().map(|e| bucket_for(&self.hasher, &e.key, count)));
        }

        let drained = self
            .buckets
            .iter_mut()
            .flat_map(|chain| core::iter::from_fn(move || chain.pop_front()));
        for (entry, bucket) in drained.zip(targets) {
            table[bucket].push_back(entry);
        }
        self.buckets = table;
        self.table = next_table_id();
    }
}

impl<K, V, S> ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    pub fn from_iter_with_bucket_count<I>(iter: I, bucket_count: usize) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut map = Self::with_bucket_count_and_hasher(bucket_count, S::default());
        map.extend(iter);
        map
    }
}

impl<K: Clone, V: Clone, S: Clone> Clone for ChainedHashMap<K, V, S> {
    /// Deep copy with the same bucket layout, hasher and load factor.
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            buckets: self.buckets.clone(),
            len: self.len,
            max_load_factor: self.max_load_factor,
            table: next_table_id(),
            reentrancy: DebugReentrancy::new(),
        }
    }
}

impl<K, V, S> PartialEq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K, V, S> Eq for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K: core::fmt::Debug, V: core::fmt::Debug, S> core::fmt::Debug for ChainedHashMap<K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, Q, V, S> core::ops::Index<&Q> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if `key` is not present.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("key not present in ChainedHashMap")
    }
}

impl<K, V, S> Extend<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for ChainedHashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher(S::default());
        map.extend(iter);
        map
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for ChainedHashMap<K, V, FnvBuildHasher>
where
    K: Eq + Hash,
{
    fn from(items: [(K, V); N]) -> Self {
        items.into_iter().collect()
    }
}

/// Cursor-driven iterator over `(&K, &V)`.
pub struct Iter<'a, K, V, S> {
    map: &'a ChainedHashMap<K, V, S>,
    cursor: Cursor,
    remaining: usize,
}

impl<'a, K, V, S> Iterator for Iter<'a, K, V, S> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let map = self.map;
        let entry = map.cursor_entry(self.cursor)?;
        self.cursor = map.next_cursor(self.cursor).unwrap_or_else(|_| map.end());
        self.remaining = self.remaining.saturating_sub(1);
        Some((&entry.key, &entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator over `(&K, &mut V)`, bucket by bucket.
pub struct IterMut<'a, K, V> {
    buckets: core::slice::IterMut<'a, Bucket<K, V>>,
    chain: Option<forward_list::IterMut<'a, Entry<K, V>>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.as_mut().and_then(Iterator::next) {
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&entry.key, &mut entry.value));
            }
            let chain = self.buckets.next()?;
            self.chain = if chain.is_empty() {
                None
            } else {
                Some(chain.iter_mut())
            };
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Owning iterator over `(K, V)`.
pub struct IntoIter<K, V> {
    buckets: std::vec::IntoIter<Bucket<K, V>>,
    chain: Option<forward_list::IntoIter<Entry<K, V>>>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain.as_mut().and_then(Iterator::next) {
                return Some((entry.key, entry.value));
            }
            self.chain = Some(self.buckets.next()?.into_iter());
        }
    }
}

impl<K, V, S> IntoIterator for ChainedHashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;
    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter {
            buckets: self.buckets.into_iter(),
            chain: None,
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, S>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut ChainedHashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
