// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Identity-bearing state holder that logs and broadcasts every change.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::listener::{dispatch, ListenerId, ListenerSet, StateListener};
use super::record::{StateLog, StateRecord};

struct Inner<T> {
    value: T,
    listeners: ListenerSet<T>,
}

/// Typed state value with change notification.
///
/// A transition is accepted only when the new value differs from the
/// current one. For each accepted transition the record is appended to the
/// attached [`StateLog`] before any listener runs. Transitions reach the
/// log and the listeners in the order the values were swapped.
///
/// Listeners run outside the value lock, so they may call
/// [`get_state`](Self::get_state) on the cell. They must not change the
/// cell that is notifying them: the transition sequence is still held and
/// a nested `set_state` would block forever.
pub struct ObservableCell<T> {
    id: String,
    describe: fn(&T) -> String,
    inner: Mutex<Inner<T>>,
    /// Held from the swap until logging and dispatch are done.
    sequence: Mutex<()>,
    log: Option<Arc<StateLog>>,
}

impl<T> ObservableCell<T> {
    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl<T> fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableCell")
            .field("id", &self.id)
            .field("state", &(self.describe)(&self.lock().value))
            .finish()
    }
}

impl<T> ObservableCell<T>
where
    T: PartialEq + Clone + 'static,
{
    pub fn new(id: impl Into<String>, initial: T, describe: fn(&T) -> String) -> Self {
        Self {
            id: id.into(),
            describe,
            inner: Mutex::new(Inner {
                value: initial,
                listeners: ListenerSet::default(),
            }),
            sequence: Mutex::new(()),
            log: None,
        }
    }

    /// Attach the diagnostic log that receives one record per transition.
    pub fn with_log(mut self, log: Arc<StateLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn get_state(&self) -> T {
        self.lock().value.clone()
    }

    pub fn describe(&self, value: &T) -> String {
        (self.describe)(value)
    }

    /// Set a new value. Returns `false` without side effects when the value
    /// is unchanged.
    pub fn set_state(&self, new: T) -> bool {
        self.update(|current| (*current != new).then(|| new.clone()))
            .is_some()
    }

    /// Compute the next value from the current one under the cell lock.
    ///
    /// `next` returning `None`, or a value equal to the current one, leaves
    /// the cell untouched. On an accepted transition the `(old, new)` pair
    /// is returned after logging and notification have completed.
    pub fn update<F>(&self, next: F) -> Option<(T, T)>
    where
        F: FnOnce(&T) -> Option<T>,
    {
        let _sequence = self.sequence.lock().unwrap_or_else(PoisonError::into_inner);
        let (old, new, listeners) = {
            let mut inner = self.lock();
            let new = next(&inner.value).filter(|candidate| *candidate != inner.value)?;
            let old = std::mem::replace(&mut inner.value, new.clone());
            (old, new, inner.listeners.prune_and_snapshot())
        };

        if let Some(log) = &self.log {
            log.append(StateRecord::new(
                self.id.clone(),
                (self.describe)(&old),
                (self.describe)(&new),
            ));
        }
        dispatch(&listeners, &self.id, &old, &new);
        Some((old, new))
    }

    /// Register a listener without taking ownership of it.
    pub fn register_listener<L>(&self, listener: &Arc<L>) -> ListenerId
    where
        L: StateListener<T> + 'static,
    {
        self.lock().listeners.register(listener)
    }

    pub fn unregister_listener(&self, id: ListenerId) -> bool {
        self.lock().listeners.unregister(id)
    }

    /// Number of registered listeners that are still alive.
    pub fn listener_count(&self) -> usize {
        self.lock().listeners.live_count()
    }
}
