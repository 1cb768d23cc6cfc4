//! Debug-only reentrancy detection for sections that call user code.
//!
//! `ChainedHashMap` invokes `K: Hash` and `K: Eq` while a bucket scan or a
//! rehash is in flight. A key impl that reaches back into the same map at
//! that point would observe a half-moved table, so debug builds panic on
//! nested entry. Release builds carry no state and no checks.

use core::cell::Cell;
use core::marker::PhantomData;

#[derive(Debug)]
pub(crate) struct DebugReentrancy {
    #[cfg(debug_assertions)]
    active: Cell<bool>,
    // Single-threaded: keep the owner !Sync.
    _nosync: PhantomData<Cell<()>>,
}

impl DebugReentrancy {
    pub(crate) const fn new() -> Self {
        Self {
            #[cfg(debug_assertions)]
            active: Cell::new(false),
            _nosync: PhantomData,
        }
    }

    /// Mark the start of a section that may run user code. The section ends
    /// when the returned guard drops.
    #[inline]
    pub(crate) fn enter(&self) -> Section<'_> {
        #[cfg(debug_assertions)]
        {
            assert!(
                !self.active.replace(true),
                "reentrancy detected: map accessed from inside its own Hash/Eq call"
            );
            Section { owner: self }
        }

        #[cfg(not(debug_assertions))]
        {
            Section { _lt: PhantomData }
        }
    }
}

impl Default for DebugReentrancy {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII marker for an active section.
pub(crate) struct Section<'a> {
    #[cfg(debug_assertions)]
    owner: &'a DebugReentrancy,
    #[cfg(not(debug_assertions))]
    _lt: PhantomData<&'a ()>,
}

impl Drop for Section<'_> {
    fn drop(&mut self) {
        #[cfg(debug_assertions)]
        self.owner.active.set(false);
    }
}
