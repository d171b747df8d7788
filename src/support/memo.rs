//! Bounded memoization keyed on the exact bit pattern of floating-point arguments.
//!
//! Implicit solvers re-evaluate boundary callbacks at the very same time
//! value several times while iterating a step. [`ExactMemo`] caches those
//! repeats. Keys compare by bit pattern, so `t` and `t + f64::EPSILON` are
//! different entries, as are `0.0` and `-0.0`.
//!
//! The memo keeps only the most recent `capacity` entries.

use std::{cell::RefCell, collections::VecDeque};

/// Argument types that can be compared by exact bit pattern.
pub trait ExactKey {
    /// Bitwise representation used for comparison.
    type Bits: Copy + Eq;

    /// Returns the bitwise representation of `self`.
    fn exact_bits(&self) -> Self::Bits;
}

impl ExactKey for f64 {
    type Bits = u64;

    fn exact_bits(&self) -> u64 {
        self.to_bits()
    }
}

impl ExactKey for (f64, f64) {
    type Bits = (u64, u64);

    fn exact_bits(&self) -> (u64, u64) {
        (self.0.to_bits(), self.1.to_bits())
    }
}

/// A small most-recent-first cache with exact key matching.
///
/// Interior mutability lets pure `&self` geometry queries populate the cache.
/// The type is intentionally `!Sync`.
#[derive(Debug)]
pub struct ExactMemo<K: ExactKey, V> {
    capacity: usize,
    entries: RefCell<VecDeque<(K::Bits, V)>>,
}

impl<K: ExactKey, V: Clone> ExactMemo<K, V> {
    /// Creates an empty memo holding at most `capacity` entries.
    ///
    /// A capacity of zero is bumped to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: RefCell::new(VecDeque::with_capacity(capacity)),
        }
    }

    /// Returns the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_insert_with(&self, key: &K, compute: impl FnOnce() -> V) -> V {
        match self.get_or_try_insert_with(key, || Ok::<_, std::convert::Infallible>(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    /// Fallible variant of [`ExactMemo::get_or_insert_with`].
    ///
    /// Errors are returned to the caller and never cached.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `compute`.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: &K,
        compute: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        let bits = key.exact_bits();

        if let Some(value) = self.lookup(bits) {
            return Ok(value);
        }

        // The borrow is released before `compute` so nested memos can be queried.
        let value = compute()?;

        let mut entries = self.entries.borrow_mut();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back((bits, value.clone()));

        Ok(value)
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns `true` if nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    fn lookup(&self, bits: K::Bits) -> Option<V> {
        self.entries
            .borrow()
            .iter()
            .rev()
            .find(|(key, _)| *key == bits)
            .map(|(_, value)| value.clone())
    }
}
