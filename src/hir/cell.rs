//! Resolution cells: compute-once slots with re-entrancy detection.
//!
//! Every resolved accessor on a semantic element (a property's type, a
//! structured type's base, an annotation's term, ...) is backed by one
//! [`ResolutionCell`]. The first read runs the compute function and caches
//! the result; later reads return the cached value.
//!
//! A read that arrives while the same cell is still computing is the cycle
//! signal: the cell hands back the caller supplied `on_cycle` value without
//! recursing and without caching it. The outer (original) computation keeps
//! going and stores the real value when it finishes.
//!
//! ```text
//! Unevaluated ──get──▶ InProgress ──compute done──▶ Resolved(v)
//!                          │
//!                          └─ re-entrant get ──▶ on_cycle() (not cached)
//! ```
//!
//! The state lives behind a `parking_lot::Mutex`, which is released while
//! `compute` runs. A fully resolved cell is therefore safe to read from many
//! threads. Two threads touching the *same* unevaluated cell at the same
//! time is not supported: the second one sees `InProgress` and receives the
//! cycle default. Warm the model with `Model::resolve_all` before sharing it.

use parking_lot::Mutex;

/// Evaluation state of a [`ResolutionCell`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CellState {
    Unevaluated,
    InProgress,
    Resolved,
}

enum Slot<T> {
    Unevaluated,
    InProgress,
    Resolved(T),
}

/// A lazily computed, memoized value.
pub struct ResolutionCell<T> {
    slot: Mutex<Slot<T>>,
}

impl<T> Default for ResolutionCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ResolutionCell<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Unevaluated),
        }
    }

    pub fn state(&self) -> CellState {
        match &*self.slot.lock() {
            Slot::Unevaluated => CellState::Unevaluated,
            Slot::InProgress => CellState::InProgress,
            Slot::Resolved(_) => CellState::Resolved,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.state() == CellState::Resolved
    }
}

impl<T: Clone> ResolutionCell<T> {
    /// Return the cached value, computing it on first access.
    ///
    /// `on_cycle` is only invoked when this call re-enters a cell whose
    /// computation is still running further up the stack.
    pub fn get_or_compute(&self, compute: impl FnOnce() -> T, on_cycle: impl FnOnce() -> T) -> T {
        {
            let mut slot = self.slot.lock();
            if let Slot::Resolved(value) = &*slot {
                return value.clone();
            }
            if matches!(*slot, Slot::InProgress) {
                drop(slot);
                tracing::trace!("[CELL] re-entrant access, returning cycle default");
                return on_cycle();
            }
            *slot = Slot::InProgress;
        }

        let value = compute();
        *self.slot.lock() = Slot::Resolved(value.clone());
        value
    }

    /// The cached value, if the cell has been resolved.
    pub fn get(&self) -> Option<T> {
        match &*self.slot.lock() {
            Slot::Resolved(value) => Some(value.clone()),
            _ => None,
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ResolutionCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.slot.lock() {
            Slot::Unevaluated => f.write_str("ResolutionCell(<unevaluated>)"),
            Slot::InProgress => f.write_str("ResolutionCell(<in progress>)"),
            Slot::Resolved(value) => f.debug_tuple("ResolutionCell").field(value).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_computes_once() {
        let cell = ResolutionCell::new();
        let calls = Cell::new(0);
        let compute = || {
            calls.set(calls.get() + 1);
            42
        };

        assert_eq!(cell.get_or_compute(compute, || -1), 42);
        assert_eq!(cell.get_or_compute(|| unreachable!(), || -1), 42);
        assert_eq!(calls.get(), 1);
        assert_eq!(cell.state(), CellState::Resolved);
    }

    #[test]
    fn test_reentrant_access_returns_default_without_caching_it() {
        let cell: ResolutionCell<i32> = ResolutionCell::new();
        let value = cell.get_or_compute(
            || {
                assert_eq!(cell.state(), CellState::InProgress);
                let inner = cell.get_or_compute(|| unreachable!(), || -1);
                assert_eq!(inner, -1);
                inner + 10
            },
            || -1,
        );

        assert_eq!(value, 9);
        assert_eq!(cell.get(), Some(9));
    }

    #[test]
    fn test_unevaluated_cell_has_no_value() {
        let cell: ResolutionCell<String> = ResolutionCell::default();
        assert_eq!(cell.get(), None);
        assert!(!cell.is_resolved());
        assert_eq!(format!("{cell:?}"), "ResolutionCell(<unevaluated>)");
    }
}
