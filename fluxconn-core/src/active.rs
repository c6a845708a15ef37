//! Process-wide handle to the currently selected connection
//!
//! Downstream consumers (the query engine, status display) need cheap read
//! access to the selected connection without re-deriving it from the full
//! registry. The handle is passed by clone, never exposed as an ambient
//! global, and its contents mirror the registry's active record.

use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::ConnectionRecord;

/// Shared, cloneable reference to the active connection
///
/// Lifecycle: initialized empty, set whenever the registry's active record
/// changes, cleared only when the registry becomes empty.
#[derive(Clone, Default)]
pub struct ActiveConnection {
    inner: Arc<RwLock<Option<ConnectionRecord>>>,
}

impl ActiveConnection {
    /// Creates an empty handle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the active record, if any
    #[must_use]
    pub fn get(&self) -> Option<ConnectionRecord> {
        self.inner.read().clone()
    }

    /// Returns the id of the active record, if any
    #[must_use]
    pub fn id(&self) -> Option<Uuid> {
        self.inner.read().as_ref().map(|r| r.id)
    }

    /// Replaces the active record
    pub fn set(&self, record: ConnectionRecord) {
        *self.inner.write() = Some(record);
    }

    /// Clears the handle
    pub fn clear(&self) {
        *self.inner.write() = None;
    }

    /// Returns `true` if no connection is currently selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_none()
    }
}

impl std::fmt::Debug for ActiveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveConnection")
            .field("id", &self.id())
            .finish()
    }
}
