// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! State-change listener registration.
//!
//! Listeners are held through `Weak` references: the registry never keeps a
//! listener alive, and a listener that has been dropped is skipped and
//! pruned instead of being invoked.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Token returned by registration, used to unregister a listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Receiver of accepted state transitions.
///
/// Called synchronously on the thread that changed the state, outside the
/// cell lock. Implementations must not block.
pub trait StateListener<T>: Send + Sync {
    fn on_state_change(&self, id: &str, old: &T, new: &T);
}

impl<T, F> StateListener<T> for F
where
    F: Fn(&str, &T, &T) + Send + Sync,
{
    fn on_state_change(&self, id: &str, old: &T, new: &T) {
        self(id, old, new)
    }
}

/// Ordered list of weakly held listeners.
pub(crate) struct ListenerSet<T> {
    entries: Vec<(ListenerId, Weak<dyn StateListener<T>>)>,
}

impl<T> Default for ListenerSet<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T: 'static> ListenerSet<T> {
    pub(crate) fn register<L>(&mut self, listener: &Arc<L>) -> ListenerId
    where
        L: StateListener<T> + 'static,
    {
        let id = ListenerId::new();
        let strong: Arc<dyn StateListener<T>> = listener.clone();
        self.entries.push((id, Arc::downgrade(&strong)));
        id
    }

    pub(crate) fn unregister(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(lid, _)| *lid != id);
        self.entries.len() != before
    }

    /// Number of listeners that are still alive.
    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|(_, weak)| weak.strong_count() > 0)
            .count()
    }

    /// Drop dead entries and return the live ones in registration order.
    pub(crate) fn prune_and_snapshot(&mut self) -> Vec<Weak<dyn StateListener<T>>> {
        self.entries.retain(|(_, weak)| weak.strong_count() > 0);
        self.entries.iter().map(|(_, weak)| weak.clone()).collect()
    }
}

/// Invoke each listener that can still be upgraded.
pub(crate) fn dispatch<T>(listeners: &[Weak<dyn StateListener<T>>], id: &str, old: &T, new: &T) {
    for weak in listeners {
        if let Some(listener) = weak.upgrade() {
            listener.on_state_change(id, old, new);
        }
    }
}
