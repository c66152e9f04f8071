// src/gps/store.rs
//! Shared holder of the one fix record

use super::{data::Fix, nmea::Sentence};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Handle to the process-wide fix.
///
/// Clones share the same record. The whole record sits behind a single lock,
/// so a sentence is applied in one critical section and a snapshot never
/// observes it half-applied. The lock is never held across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct FixStore {
    inner: Arc<RwLock<Fix>>,
}

impl FixStore {
    /// Create a store holding the all-sentinel fix
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a decoded sentence into the stored fix
    pub fn update(&self, sentence: &Sentence) {
        self.write().apply(sentence);
    }

    /// Overwrite the whole record, used when replaying recorded tracks
    pub fn replace(&self, fix: Fix) {
        *self.write() = fix;
    }

    /// Owned copy of the current fix; no lock is held once this returns
    pub fn snapshot(&self) -> Fix {
        self.read().clone()
    }

    // A panicking writer cannot leave the plain-data record torn, so poisoning
    // is ignored rather than surfaced.
    fn read(&self) -> RwLockReadGuard<'_, Fix> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Fix> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}
