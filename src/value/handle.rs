//! Non-owning handles to stored values
//!
//! The registry owns every slot. A [`ValueRef`] only points at one, so it
//! can read and write the value in place while the name stays registered,
//! and reports [`RegistryError::Stale`] once the name has been deleted.

use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use super::typed::Slot;
use crate::error::{RegistryError, RegistryResult};

/// In-place accessor for the value stored under one name.
///
/// Closures passed to [`ValueRef::with`] and [`ValueRef::with_mut`] run
/// while this value's slot is locked. Registry operations never hold the
/// registry lock while waiting on a slot, so a closure may call into the
/// registry, and handles for other names are fine too. It must not
/// touch this same value again: re-adding the name, `get_value` on it, or
/// using any handle to it would wait on the slot the closure already holds
/// and block the thread forever.
pub struct ValueRef<T> {
    name: Arc<str>,
    slot: Weak<RwLock<T>>,
}

impl<T> ValueRef<T> {
    pub(crate) fn new(name: &str, slot: &Slot<T>) -> Self {
        Self {
            name: Arc::from(name),
            slot: Arc::downgrade(slot),
        }
    }

    /// Name the value is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the value is still registered
    pub fn is_live(&self) -> bool {
        self.slot.strong_count() > 0
    }

    /// Whether both handles address the same slot
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Weak::ptr_eq(&self.slot, &other.slot)
    }

    fn upgrade(&self) -> RegistryResult<Slot<T>> {
        self.slot
            .upgrade()
            .ok_or_else(|| RegistryError::Stale(self.name.to_string()))
    }

    /// Run `f` with a shared borrow of the value
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> RegistryResult<R> {
        let slot = self.upgrade()?;
        let value = slot.read().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(f(&value))
    }

    /// Run `f` with a mutable borrow of the value
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> RegistryResult<R> {
        let slot = self.upgrade()?;
        let mut value = slot.write().map_err(|_| RegistryError::LockPoisoned)?;
        Ok(f(&mut value))
    }

    /// Overwrite the value in place
    pub fn set(&self, value: T) -> RegistryResult<()> {
        self.with_mut(|slot| *slot = value)
    }
}

impl<T: Clone> ValueRef<T> {
    /// Copy of the current value
    pub fn read(&self) -> RegistryResult<T> {
        self.with(T::clone)
    }
}

impl<T> Clone for ValueRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: Arc::clone(&self.name),
            slot: Weak::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for ValueRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRef")
            .field("name", &self.name)
            .field("live", &self.is_live())
            .finish()
    }
}
