//! DynArray: contiguous, owned, growable storage with a doubling growth policy.
//!
//! Capacity is managed explicitly rather than left to `Vec`'s amortization
//! strategy: appending into a full array doubles the capacity (8 on the first
//! growth from empty), `reserve(n)` allocates exactly `n` slots, and `clear`
//! keeps the allocation. The bucket table of `ChainedHashMap` lives here.

use core::ops::{Deref, DerefMut};
use std::collections::TryReserveError;

/// Capacity used on the first growth of an empty array.
const MIN_GROW_CAPACITY: usize = 8;

pub struct DynArray<T> {
    buf: Vec<T>,
}

impl<T> DynArray<T> {
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn front(&self) -> Option<&T> {
        self.buf.first()
    }
    pub fn front_mut(&mut self) -> Option<&mut T> {
        self.buf.first_mut()
    }
    pub fn back(&self) -> Option<&T> {
        self.buf.last()
    }
    pub fn back_mut(&mut self) -> Option<&mut T> {
        self.buf.last_mut()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buf
    }
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.buf
    }

    /// Grow the allocation to exactly `new_cap` slots. No-op when
    /// `new_cap <= capacity()`.
    pub fn reserve(&mut self, new_cap: usize) {
        if new_cap <= self.buf.capacity() {
            return;
        }
        self.buf.reserve_exact(new_cap - self.buf.len());
    }

    /// Fallible `reserve`. On error the array is left untouched.
    pub fn try_reserve(&mut self, new_cap: usize) -> Result<(), TryReserveError> {
        if new_cap <= self.buf.capacity() {
            return Ok(());
        }
        self.buf.try_reserve_exact(new_cap - self.buf.len())
    }

    /// Drop every element; the allocation is retained.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn push(&mut self, value: T) {
        if self.buf.len() == self.buf.capacity() {
            let cap = self.buf.capacity();
            let grown = if cap == 0 {
                MIN_GROW_CAPACITY
            } else {
                cap.saturating_mul(2)
            };
            self.reserve(grown);
        }
        self.buf.push(value);
    }

    pub fn pop(&mut self) -> Option<T> {
        self.buf.pop()
    }

    /// Resize to `new_len`, filling new slots with `fill()`.
    pub fn resize_with<F>(&mut self, new_len: usize, mut fill: F)
    where
        F: FnMut() -> T,
    {
        if new_len > self.buf.len() {
            self.reserve(new_len);
            while self.buf.len() < new_len {
                self.buf.push(fill());
            }
        } else {
            self.buf.truncate(new_len);
        }
    }

    /// Exchange storage with `other` without touching any element.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(&mut self.buf, &mut other.buf);
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.buf.iter()
    }
    pub fn iter_mut(&mut self) -> core::slice::IterMut<'_, T> {
        self.buf.iter_mut()
    }
}

impl<T: Default> DynArray<T> {
    /// `count` default-constructed elements; capacity is exactly `count`.
    pub fn with_len(count: usize) -> Self {
        let mut a = Self::new();
        a.resize(count);
        a
    }

    pub fn resize(&mut self, new_len: usize) {
        self.resize_with(new_len, T::default);
    }
}

impl<T: Clone> DynArray<T> {
    /// `count` copies of `value`; capacity is exactly `count`.
    pub fn from_elem(count: usize, value: T) -> Self {
        let mut a = Self::new();
        a.resize_with_value(count, value);
        a
    }

    pub fn resize_with_value(&mut self, new_len: usize, value: T) {
        self.resize_with(new_len, || value.clone());
    }
}

impl<T> Default for DynArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for DynArray<T> {
    /// Deep copy of the live elements into a block sized to the source's
    /// capacity.
    fn clone(&self) -> Self {
        let mut buf = Vec::with_capacity(self.buf.capacity());
        buf.extend_from_slice(&self.buf);
        Self { buf }
    }

    fn clone_from(&mut self, source: &Self) {
        self.buf.clear();
        self.reserve(source.buf.capacity());
        self.buf.extend_from_slice(&source.buf);
    }
}

impl<T> Deref for DynArray<T> {
    type Target = [T];
    fn deref(&self) -> &[T] {
        &self.buf
    }
}

impl<T> DerefMut for DynArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        &mut self.buf
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for DynArray<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.buf.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for DynArray<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buf == other.buf
    }
}

impl<T: Eq> Eq for DynArray<T> {}

impl<T> From<Vec<T>> for DynArray<T> {
    fn from(buf: Vec<T>) -> Self {
        Self { buf }
    }
}

impl<T, const N: usize> From<[T; N]> for DynArray<T> {
    fn from(items: [T; N]) -> Self {
        Self {
            buf: Vec::from(items),
        }
    }
}

impl<T> Extend<T> for DynArray<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push(value);
        }
    }
}

impl<T> FromIterator<T> for DynArray<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut a = Self::new();
        a.extend(iter);
        a
    }
}

impl<T> IntoIterator for DynArray<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DynArray<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut DynArray<T> {
    type Item = &'a mut T;
    type IntoIter = core::slice::IterMut<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.buf.iter_mut()
    }
}
