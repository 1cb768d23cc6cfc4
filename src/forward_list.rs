//! ForwardList: singly-linked sequence with a before-head sentinel and a
//! cached tail.
//!
//! Nodes live in a generational arena (`SlotMap`) and link to their successor
//! by key, so insert-after/erase-after are O(1) without raw pointers. The
//! sentinel is not a node: it is the `Position::BeforeBegin` value, and its
//! successor link is the list's `head`. Positions that refer to an erased
//! node resolve to `CursorError::Stale` instead of aliasing a reused slot.

use crate::error::CursorError;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Arena key of a list node.
    pub struct NodeKey;
}

/// A position in a `ForwardList`.
///
/// `BeforeBegin` addresses the sentinel and is never dereferenceable; `End`
/// is one past the tail and has no successor.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Position {
    BeforeBegin,
    Node(NodeKey),
    End,
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    next: Option<NodeKey>,
}

pub struct ForwardList<T> {
    nodes: SlotMap<NodeKey, Node<T>>,
    // Successor of the sentinel.
    head: Option<NodeKey>,
    tail: Option<NodeKey>,
}

impl<T> ForwardList<T> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            head: None,
            tail: None,
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn before_begin(&self) -> Position {
        Position::BeforeBegin
    }

    pub fn begin(&self) -> Position {
        Self::position_of(self.head)
    }

    pub fn end(&self) -> Position {
        Position::End
    }

    pub fn front(&self) -> Option<&T> {
        self.head.and_then(|k| self.nodes.get(k)).map(|n| &n.value)
    }
    pub fn front_mut(&mut self) -> Option<&mut T> {
        let k = self.head?;
        self.nodes.get_mut(k).map(|n| &mut n.value)
    }
    pub fn back(&self) -> Option<&T> {
        self.tail.and_then(|k| self.nodes.get(k)).map(|n| &n.value)
    }
    pub fn back_mut(&mut self) -> Option<&mut T> {
        let k = self.tail?;
        self.nodes.get_mut(k).map(|n| &mut n.value)
    }

    /// Value at `pos`; `None` for the sentinel, `End`, or a stale node.
    pub fn get(&self, pos: Position) -> Option<&T> {
        match pos {
            Position::Node(k) => self.nodes.get(k).map(|n| &n.value),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, pos: Position) -> Option<&mut T> {
        match pos {
            Position::Node(k) => self.nodes.get_mut(k).map(|n| &mut n.value),
            _ => None,
        }
    }

    /// Position following `pos`.
    pub fn next(&self, pos: Position) -> Result<Position, CursorError> {
        let anchor = self.anchor(pos)?;
        Ok(Self::position_of(self.link_after(anchor)))
    }

    /// Insert `value` right after `pos` and return its position.
    pub fn insert_after(&mut self, pos: Position, value: T) -> Result<Position, CursorError> {
        let anchor = self.anchor(pos)?;
        Ok(Position::Node(self.link_new(anchor, value)))
    }

    /// Erase the node following `pos`, returning the position that now follows
    /// `pos`. Erasing after the tail is a no-op that returns `End`.
    pub fn erase_after(&mut self, pos: Position) -> Result<Position, CursorError> {
        let anchor = self.anchor(pos)?;
        drop(self.unlink_after(anchor));
        Ok(Self::position_of(self.link_after(anchor)))
    }

    /// Like `erase_after`, but hands the removed value back.
    pub fn remove_after(&mut self, pos: Position) -> Result<Option<T>, CursorError> {
        let anchor = self.anchor(pos)?;
        Ok(self.unlink_after(anchor))
    }

    pub fn push_front(&mut self, value: T) -> Position {
        Position::Node(self.link_new(None, value))
    }

    pub fn push_back(&mut self, value: T) -> Position {
        Position::Node(self.link_new(self.tail, value))
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.unlink_after(None)
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            inner: self.iter_positions(),
        }
    }

    /// Iterate values together with their positions, in chain order.
    pub fn iter_positions(&self) -> Positions<'_, T> {
        Positions {
            nodes: &self.nodes,
            next: self.head,
            remaining: self.nodes.len(),
        }
    }

    /// Iterate mutable values in chain order.
    ///
    /// Chains of up to one node are walked in place. Longer chains first
    /// rank their nodes in a side table, which allocates `O(len)`.
    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        if self.nodes.len() <= 1 {
            return IterMut {
                single: self.nodes.values_mut().next().map(|n| &mut n.value),
                rest: Vec::new().into_iter().flatten(),
            };
        }
        // Arena slot order differs from chain order: rank the nodes by chain
        // position first, then hand out the disjoint borrows in that order.
        let mut rank: SecondaryMap<NodeKey, usize> = SecondaryMap::with_capacity(self.nodes.len());
        let mut at = self.head;
        let mut i = 0;
        while let Some(k) = at {
            rank.insert(k, i);
            i += 1;
            at = self.nodes.get(k).and_then(|n| n.next);
        }

        let mut ordered: Vec<Option<&mut T>> = Vec::with_capacity(i);
        ordered.resize_with(i, || None);
        for (k, node) in self.nodes.iter_mut() {
            if let Some(&r) = rank.get(k) {
                ordered[r] = Some(&mut node.value);
            }
        }
        IterMut {
            single: None,
            rest: ordered.into_iter().flatten(),
        }
    }

    fn position_of(link: Option<NodeKey>) -> Position {
        link.map_or(Position::End, Position::Node)
    }

    // Resolve `pos` to the node it names; `None` stands for the sentinel.
    fn anchor(&self, pos: Position) -> Result<Option<NodeKey>, CursorError> {
        match pos {
            Position::BeforeBegin => Ok(None),
            Position::Node(k) if self.nodes.contains_key(k) => Ok(Some(k)),
            Position::Node(_) => Err(CursorError::Stale),
            Position::End => Err(CursorError::End),
        }
    }

    fn link_after(&self, anchor: Option<NodeKey>) -> Option<NodeKey> {
        match anchor {
            None => self.head,
            Some(k) => self.nodes.get(k).and_then(|n| n.next),
        }
    }

    fn set_link_after(&mut self, anchor: Option<NodeKey>, link: Option<NodeKey>) {
        match anchor {
            None => self.head = link,
            Some(k) => {
                if let Some(n) = self.nodes.get_mut(k) {
                    n.next = link;
                }
            }
        }
    }

    fn link_new(&mut self, anchor: Option<NodeKey>, value: T) -> NodeKey {
        let next = self.link_after(anchor);
        let key = self.nodes.insert(Node { value, next });
        self.set_link_after(anchor, Some(key));
        if next.is_none() {
            self.tail = Some(key);
        }
        key
    }

    fn unlink_after(&mut self, anchor: Option<NodeKey>) -> Option<T> {
        let victim = self.link_after(anchor)?;
        let node = self.nodes.remove(victim)?;
        self.set_link_after(anchor, node.next);
        if self.tail == Some(victim) {
            // `anchor` is None only when the list just became empty.
            self.tail = anchor;
        }
        Some(node.value)
    }
}

impl<T: Default> ForwardList<T> {
    /// `count` default-constructed values.
    pub fn with_len(count: usize) -> Self {
        let mut list = Self::new();
        for _ in 0..count {
            list.push_back(T::default());
        }
        list
    }
}

impl<T: Clone> ForwardList<T> {
    /// `count` copies of `value`.
    pub fn from_elem(count: usize, value: T) -> Self {
        let mut list = Self::new();
        for _ in 0..count {
            list.push_back(value.clone());
        }
        list
    }
}

impl<T> Default for ForwardList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> Clone for ForwardList<T> {
    fn clone(&self) -> Self {
        self.iter().cloned().collect()
    }
}

impl<T: core::fmt::Debug> core::fmt::Debug for ForwardList<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: PartialEq> PartialEq for ForwardList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Eq> Eq for ForwardList<T> {}

impl<T> Extend<T> for ForwardList<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.push_back(value);
        }
    }
}

impl<T> FromIterator<T> for ForwardList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut list = Self::new();
        list.extend(iter);
        list
    }
}

impl<T, const N: usize> From<[T; N]> for ForwardList<T> {
    fn from(items: [T; N]) -> Self {
        items.into_iter().collect()
    }
}

/// Iterator over `(Position, &T)` in chain order.
pub struct Positions<'a, T> {
    nodes: &'a SlotMap<NodeKey, Node<T>>,
    next: Option<NodeKey>,
    remaining: usize,
}

impl<'a, T> Iterator for Positions<'a, T> {
    type Item = (Position, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let k = self.next?;
        let node = self.nodes.get(k)?;
        self.next = node.next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((Position::Node(k), &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator over shared references in chain order.
pub struct Iter<'a, T> {
    inner: Positions<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Iterator over mutable references in chain order.
pub struct IterMut<'a, T> {
    single: Option<&'a mut T>,
    rest: core::iter::Flatten<std::vec::IntoIter<Option<&'a mut T>>>,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = &'a mut T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.single.take().or_else(|| self.rest.next())
    }
}

/// Owning iterator; pops from the front.
pub struct IntoIter<T> {
    list: ForwardList<T>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.list.pop_front()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.list.len(), Some(self.list.len()))
    }
}

impl<T> IntoIterator for ForwardList<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;
    fn into_iter(self) -> IntoIter<T> {
        IntoIter { list: self }
    }
}

impl<'a, T> IntoIterator for &'a ForwardList<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;
    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<'a, T> IntoIterator for &'a mut ForwardList<T> {
    type Item = &'a mut T;
    type IntoIter = IterMut<'a, T>;
    fn into_iter(self) -> IterMut<'a, T> {
        self.iter_mut()
    }
}
