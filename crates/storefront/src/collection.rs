//! Generic entity collection over the key-value store.
//!
//! A collection is a set of entities of one kind, stored as a single
//! enveloped JSON array under one key. Every mutation reads the whole array,
//! changes it in memory and writes the whole array back.
//!
//! Within one process, every write to a collection (including the empty
//! array written on first access) happens under its lock, so read-modify-write
//! cycles are serialized and never lost. Two processes sharing a [`FileStore`](crate::store::FileStore)
//! are not coordinated: the last writer wins.

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::events::{Notifier, StateChange};
use crate::store::{KeyValueStore, StoreError, envelope, keys};

/// An item that lives in a [`Collection`].
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// Identity key; at most one entity per key is kept.
    type Key: Copy + PartialEq + fmt::Debug;

    /// This entity's identity.
    fn key(&self) -> Self::Key;
}

/// What to do when a stored payload cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorruptDataPolicy {
    /// Keep a copy under `<key>.corrupt`, log a warning and start empty.
    #[default]
    Reset,
    /// Return [`StoreError::Corrupt`] to the caller.
    Fail,
}

impl std::str::FromStr for CorruptDataPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reset" => Ok(Self::Reset),
            "fail" => Ok(Self::Fail),
            _ => Err(format!("expected `reset` or `fail`, got {s:?}")),
        }
    }
}

/// Result of a [`Collection::mutate`] closure.
#[derive(Debug)]
pub enum Edit<R> {
    /// Write the modified items back and notify subscribers.
    Save(R),
    /// Leave the stored collection untouched.
    Discard(R),
}

/// Durable set of entities under one storage key.
pub struct Collection<E> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    change: StateChange,
    notifier: Notifier,
    policy: CorruptDataPolicy,
    write_lock: Mutex<()>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("key", &self.key)
            .field("change", &self.change)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Collection<E> {
    /// Create a collection stored under `key` that publishes `change` on writes.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: &'static str,
        change: StateChange,
        notifier: Notifier,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            store,
            key,
            change,
            notifier,
            policy,
            write_lock: Mutex::new(()),
            _entity: PhantomData,
        }
    }

    /// The storage key.
    #[must_use]
    pub const fn key(&self) -> &'static str {
        self.key
    }

    /// Read all entities.
    ///
    /// A collection that was never written is initialized to an empty array.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store fails, if the payload is from a newer
    /// schema, or if it is malformed and the policy is [`CorruptDataPolicy::Fail`].
    pub fn load(&self) -> Result<Vec<E>, StoreError> {
        if let Some(raw) = self.store.get(self.key)?
            && let Ok(items) = envelope::decode::<Vec<E>>(self.key, &raw)
        {
            return Ok(items);
        }

        // Bootstrap and reset both write, so re-read under the lock.
        let _guard = self.lock();
        self.load_locked()
    }

    /// Overwrite the stored collection with `items` and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the store write fails.
    pub fn persist(&self, items: &[E]) -> Result<(), StoreError> {
        let _guard = self.lock();
        self.persist_locked(items)
    }

    /// Find the entity with `key`.
    ///
    /// # Errors
    ///
    /// Propagates [`Collection::load`] errors.
    pub fn find(&self, key: E::Key) -> Result<Option<E>, StoreError> {
        Ok(self.load()?.into_iter().find(|e| e.key() == key))
    }

    /// All entities matching `predicate`, in stored order.
    ///
    /// # Errors
    ///
    /// Propagates [`Collection::load`] errors.
    pub fn query(&self, predicate: impl Fn(&E) -> bool) -> Result<Vec<E>, StoreError> {
        Ok(self.load()?.into_iter().filter(|e| predicate(e)).collect())
    }

    /// Remove the entity with `key`. Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// Propagates load and store errors.
    pub fn remove(&self, key: E::Key) -> Result<bool, StoreError> {
        self.mutate(|items| {
            let before = items.len();
            items.retain(|e| e.key() != key);
            if items.len() == before {
                Edit::Discard(false)
            } else {
                Edit::Save(true)
            }
        })
    }

    /// Run a read-modify-write cycle.
    ///
    /// The closure receives the current items; returning [`Edit::Save`] writes
    /// them back (one store write, one notification).
    ///
    /// # Errors
    ///
    /// Propagates load and store errors.
    pub fn mutate<R>(&self, f: impl FnOnce(&mut Vec<E>) -> Edit<R>) -> Result<R, StoreError> {
        let _guard = self.lock();

        let mut items = self.load_locked()?;
        match f(&mut items) {
            Edit::Save(result) => {
                self.persist_locked(&items)?;
                Ok(result)
            }
            Edit::Discard(result) => Ok(result),
        }
    }

    /// Delete the stored collection entirely.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store write fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock();
        self.store.remove(self.key)?;
        self.notifier.notify(self.change);
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds `write_lock`.
    fn load_locked(&self) -> Result<Vec<E>, StoreError> {
        let Some(raw) = self.store.get(self.key)? else {
            debug!(key = self.key, "Initializing empty collection");
            self.write(&[])?;
            return Ok(Vec::new());
        };

        match envelope::decode::<Vec<E>>(self.key, &raw) {
            Ok(items) => Ok(items),
            Err(err @ StoreError::Corrupt { .. }) if self.policy == CorruptDataPolicy::Reset => {
                let backup = keys::quarantine(self.key);
                warn!(
                    key = self.key,
                    backup = %backup,
                    error = %err,
                    "Stored collection is malformed, resetting to empty"
                );
                self.store.set(&backup, &raw)?;
                self.write(&[])?;
                Ok(Vec::new())
            }
            Err(err) => Err(err),
        }
    }

    /// Caller holds `write_lock`.
    fn persist_locked(&self, items: &[E]) -> Result<(), StoreError> {
        self.write(items)?;
        self.notifier.notify(self.change);
        Ok(())
    }

    fn write(&self, items: &[E]) -> Result<(), StoreError> {
        let raw = envelope::encode(self.key, items)?;
        self.store.set(self.key, &raw)
    }
}

/// A single optional value under one storage key (the session slot).
///
/// Decoding follows the same envelope and [`CorruptDataPolicy`] rules as
/// [`Collection`], except that a reset leaves the slot empty rather than
/// writing an empty value.
pub struct Slot<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    change: Option<StateChange>,
    notifier: Notifier,
    policy: CorruptDataPolicy,
    write_lock: Mutex<()>,
    _value: PhantomData<fn() -> T>,
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("key", &self.key)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<T: Serialize + DeserializeOwned> Slot<T> {
    /// Create a slot stored under `key` that publishes `change` on writes.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        key: &'static str,
        change: StateChange,
        notifier: Notifier,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            store,
            key,
            change: Some(change),
            notifier,
            policy,
            write_lock: Mutex::new(()),
            _value: PhantomData,
        }
    }

    /// Create a slot for bookkeeping values that nobody subscribes to.
    #[must_use]
    pub fn untracked(
        store: Arc<dyn KeyValueStore>,
        key: &'static str,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            store,
            key,
            change: None,
            notifier: Notifier::new(1),
            policy,
            write_lock: Mutex::new(()),
            _value: PhantomData,
        }
    }

    /// Read the value, if any.
    ///
    /// # Errors
    ///
    /// Same as [`Collection::load`].
    pub fn load(&self) -> Result<Option<T>, StoreError> {
        if let Some(raw) = self.store.get(self.key)?
            && let Ok(value) = envelope::decode::<T>(self.key, &raw)
        {
            return Ok(Some(value));
        }

        let _guard = self.lock();
        self.load_locked()
    }

    /// Replace the value and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if encoding or the store write fails.
    pub fn save(&self, value: &T) -> Result<(), StoreError> {
        let raw = envelope::encode(self.key, value)?;
        let _guard = self.lock();
        self.store.set(self.key, &raw)?;
        self.notify();
        Ok(())
    }

    /// Empty the slot and notify subscribers.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store write fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.lock();
        self.store.remove(self.key)?;
        self.notify();
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Caller holds `write_lock`.
    fn load_locked(&self) -> Result<Option<T>, StoreError> {
        let Some(raw) = self.store.get(self.key)? else {
            return Ok(None);
        };

        match envelope::decode::<T>(self.key, &raw) {
            Ok(value) => Ok(Some(value)),
            Err(err @ StoreError::Corrupt { .. }) if self.policy == CorruptDataPolicy::Reset => {
                let backup = keys::quarantine(self.key);
                warn!(
                    key = self.key,
                    backup = %backup,
                    error = %err,
                    "Stored value is malformed, clearing it"
                );
                self.store.set(&backup, &raw)?;
                self.store.remove(self.key)?;
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn notify(&self) {
        if let Some(change) = self.change {
            self.notifier.notify(change);
        }
    }
}
