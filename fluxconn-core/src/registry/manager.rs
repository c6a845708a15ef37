//! Connection registry with invariant enforcement
//!
//! This module provides the `ConnectionRegistry` which owns list, upsert,
//! switch, and delete operations over the persisted registry, enforcing the
//! single-active-connection invariant and driving tree-view notifications.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::active::ActiveConnection;
use crate::config::ConnectionStore;
use crate::error::{RegistryError, RegistryResult};
use crate::models::{ConnectionRecord, Registry};
use crate::tree::TreeNotifier;

/// Registry of saved connections
///
/// Every operation is a whole-blob read-modify-write against the
/// [`ConnectionStore`]: load the latest registry, apply the change, save the
/// full map. Mutations take `&mut self`, so a given registry handle
/// serializes its own operations; concurrent handles over the same store race
/// last-write-wins, which is accepted for a single-user local configuration
/// store.
///
/// The in-memory view is optimistic: a failed save is reported to the caller
/// and the active-connection handle is left as already updated rather than
/// rolled back.
#[derive(Debug)]
pub struct ConnectionRegistry {
    /// Persistence boundary
    store: ConnectionStore,
    /// Process-wide mirror of the active record
    active: ActiveConnection,
    /// Change notification channel shared with the tree view
    notifier: TreeNotifier,
}

impl ConnectionRegistry {
    /// Creates a registry over the given store, active handle, and notifier
    #[must_use]
    pub const fn new(
        store: ConnectionStore,
        active: ActiveConnection,
        notifier: TreeNotifier,
    ) -> Self {
        Self {
            store,
            active,
            notifier,
        }
    }

    /// Returns a clone of the active-connection handle
    #[must_use]
    pub fn active(&self) -> ActiveConnection {
        self.active.clone()
    }

    /// Lists all connections in map order, self-healing invariant violations
    ///
    /// Healing rules:
    /// - exactly one record: it is marked active regardless of its stored flag
    /// - more than one record flagged active: the previously known active id
    ///   wins if it is among them, otherwise the first in map order; the rest
    ///   are cleared
    /// - zero active among several records: left alone (no re-election)
    ///
    /// Healed flags are persisted so the stored blob satisfies the invariant
    /// too. The active-connection handle is updated as a side effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read, or written after healing.
    pub fn list(&mut self) -> RegistryResult<Vec<ConnectionRecord>> {
        let mut registry = self.store.load()?.unwrap_or_default();

        if self.self_heal(&mut registry) {
            debug!(count = registry.len(), "healed active flags on list");
            self.store.save(&registry)?;
        }

        match registry.values().find(|r| r.is_active) {
            Some(record) => self.active.set(record.clone()),
            None if registry.is_empty() => self.active.clear(),
            None => {
                // No active record among several; stays that way until a
                // switch or save, and the handle keeps its last value.
                debug!(count = registry.len(), "registry has no active record");
            }
        }

        Ok(registry.into_values().collect())
    }

    /// Creates or replaces a record, activating it
    ///
    /// A fresh id is assigned when `is_new` is set; otherwise the record's id
    /// is kept as supplied. Saving always switches the selection to the saved
    /// record: the target becomes active and every other record is cleared.
    /// The caller supplies a complete record; fields are never merged.
    ///
    /// Returns the record as persisted.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    #[tracing::instrument(skip(self, record))]
    pub fn upsert(
        &mut self,
        mut record: ConnectionRecord,
        is_new: bool,
    ) -> RegistryResult<ConnectionRecord> {
        let mut registry = self.store.load()?.unwrap_or_default();

        if is_new {
            record.id = Self::fresh_id(&registry);
        }

        for existing in registry.values_mut() {
            existing.is_active = false;
        }
        record.is_active = true;
        registry.insert(record.id, record.clone());

        self.store.save(&registry)?;
        self.active.set(record.clone());
        self.notifier.notify();

        debug!(connection_id = %record.id, is_new, "connection saved and activated");
        Ok(record)
    }

    /// Switches the selection to the given record
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::NotFound` if the id is absent; the store and
    /// the active handle are left untouched in that case.
    #[tracing::instrument(skip(self))]
    pub fn switch_active(&mut self, id: Uuid) -> RegistryResult<()> {
        let mut registry = self.store.load()?.unwrap_or_default();

        if !registry.contains_key(&id) {
            warn!(connection_id = %id, "switch to unknown connection");
            return Err(RegistryError::NotFound(id));
        }

        let mut target = None;
        for (record_id, record) in &mut registry {
            record.is_active = *record_id == id;
            if record.is_active {
                target = Some(record.clone());
            }
        }

        self.store.save(&registry)?;
        if let Some(record) = target {
            self.active.set(record);
        }
        self.notifier.notify();

        debug!(connection_id = %id, "switched active connection");
        Ok(())
    }

    /// Removes a record unconditionally
    ///
    /// Confirmation is a UI-layer concern. Deleting the active record does
    /// not elect a new one; the next [`Self::list`] call self-heals only if
    /// exactly one record remains. The active handle is cleared only when
    /// the registry becomes empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or written.
    #[tracing::instrument(skip(self))]
    pub fn delete(&mut self, id: Uuid) -> RegistryResult<()> {
        let mut registry = self.store.load()?.unwrap_or_default();

        if registry.remove(&id).is_none() {
            debug!(connection_id = %id, "delete of unknown connection");
        }

        self.store.save(&registry)?;
        if registry.is_empty() {
            self.active.clear();
        }
        self.notifier.notify();

        debug!(connection_id = %id, remaining = registry.len(), "connection deleted");
        Ok(())
    }

    /// Gets a record by id
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn get(&self, id: Uuid) -> RegistryResult<Option<ConnectionRecord>> {
        let registry = self.store.load()?.unwrap_or_default();
        Ok(registry.get(&id).cloned())
    }

    /// Returns the number of saved connections
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn len(&self) -> RegistryResult<usize> {
        Ok(self.store.load()?.map_or(0, |r| r.len()))
    }

    /// Returns `true` if no connections are saved
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn is_empty(&self) -> RegistryResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Checks whether a display name is already taken by another record
    ///
    /// Duplicate names are allowed; this only feeds the UI-level warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn name_in_use(&self, name: &str, exclude: Option<Uuid>) -> RegistryResult<bool> {
        let registry = self.store.load()?.unwrap_or_default();
        Ok(registry
            .values()
            .any(|r| r.name == name && Some(r.id) != exclude))
    }

    /// Applies the read-time healing rules; returns `true` if anything changed
    fn self_heal(&self, registry: &mut Registry) -> bool {
        let mut changed = false;

        if registry.len() == 1 {
            if let Some(record) = registry.values_mut().next() {
                if !record.is_active {
                    record.is_active = true;
                    changed = true;
                }
            }
            return changed;
        }

        let active_ids: Vec<Uuid> = registry
            .values()
            .filter(|r| r.is_active)
            .map(|r| r.id)
            .collect();

        if active_ids.len() > 1 {
            let keeper = self
                .active
                .id()
                .filter(|id| active_ids.contains(id))
                .unwrap_or(active_ids[0]);
            for record in registry.values_mut() {
                if record.is_active && record.id != keeper {
                    record.is_active = false;
                    changed = true;
                }
            }
        }

        changed
    }

    /// Generates an id that is not present in the given registry
    ///
    /// A v4 collision is vanishingly unlikely; the loop keeps the
    /// never-reused guarantee unconditional.
    fn fresh_id(registry: &Registry) -> Uuid {
        loop {
            let id = Uuid::new_v4();
            if !registry.contains_key(&id) {
                return id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::TreeEvent;
    use tempfile::TempDir;

    fn create_test_registry() -> (ConnectionRegistry, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = ConnectionStore::with_config_dir(temp_dir.path().to_path_buf());
        let registry = ConnectionRegistry::new(store, ActiveConnection::new(), TreeNotifier::new());
        (registry, temp_dir)
    }

    fn record(name: &str) -> ConnectionRecord {
        ConnectionRecord::new(name, "localhost:8086", "t0ken", "myorg")
    }

    fn active_count(records: &[ConnectionRecord]) -> usize {
        records.iter().filter(|r| r.is_active).count()
    }

    #[test]
    fn test_upsert_new_assigns_fresh_active_record() {
        let (mut registry, _temp) = create_test_registry();

        let saved = registry.upsert(record("local"), true).unwrap();
        let records = registry.list().unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, saved.id);
        assert!(records[0].is_active);
    }

    #[test]
    fn test_upsert_new_replaces_supplied_id() {
        let (mut registry, _temp) = create_test_registry();

        let supplied = record("local");
        let supplied_id = supplied.id;
        let first = registry.upsert(supplied.clone(), true).unwrap();
        // A second is_new save of the same payload must not collide
        let second = registry.upsert(supplied, true).unwrap();

        assert_ne!(first.id, second.id);
        assert_ne!(second.id, supplied_id);
        assert_eq!(registry.len().unwrap(), 2);
    }

    #[test]
    fn test_id_stable_across_edits() {
        let (mut registry, _temp) = create_test_registry();

        let saved = registry.upsert(record("local"), true).unwrap();
        let mut edited = saved.clone();
        edited.name = "renamed".to_string();
        let after_edit = registry.upsert(edited, false).unwrap();

        assert_eq!(after_edit.id, saved.id);
        assert_eq!(registry.len().unwrap(), 1);
        assert_eq!(registry.get(saved.id).unwrap().unwrap().name, "renamed");
    }

    #[test]
    fn test_round_trip_preserves_all_fields_except_active() {
        let (mut registry, _temp) = create_test_registry();

        let original = record("local");
        let saved = registry.upsert(original.clone(), false).unwrap();
        let records = registry.list().unwrap();

        let listed = records.iter().find(|r| r.id == saved.id).unwrap();
        assert!(listed.is_active);
        let mut expected = original;
        expected.is_active = true;
        assert_eq!(*listed, expected);
    }

    #[test]
    fn test_single_active_invariant_over_operation_sequences() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let b = registry.upsert(record("b"), true).unwrap();
        let c = registry.upsert(record("c"), true).unwrap();
        assert!(active_count(&registry.list().unwrap()) <= 1);

        registry.switch_active(a.id).unwrap();
        assert!(active_count(&registry.list().unwrap()) <= 1);

        let mut edited = b.clone();
        edited.org = "other".to_string();
        registry.upsert(edited, false).unwrap();
        assert!(active_count(&registry.list().unwrap()) <= 1);

        registry.delete(c.id).unwrap();
        assert!(active_count(&registry.list().unwrap()) <= 1);
    }

    #[test]
    fn test_save_always_activates_even_on_edit_of_inactive_record() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let b = registry.upsert(record("b"), true).unwrap();
        registry.switch_active(a.id).unwrap();

        // Editing b's name while a is selected also switches selection to b
        let mut edited = b.clone();
        edited.name = "b-renamed".to_string();
        registry.upsert(edited, false).unwrap();

        let records = registry.list().unwrap();
        let a_rec = records.iter().find(|r| r.id == a.id).unwrap();
        let b_rec = records.iter().find(|r| r.id == b.id).unwrap();
        assert!(!a_rec.is_active);
        assert!(b_rec.is_active);
        assert_eq!(registry.active().id(), Some(b.id));
    }

    #[test]
    fn test_switch_exclusivity() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let b = registry.upsert(record("b"), true).unwrap();
        let c = registry.upsert(record("c"), true).unwrap();
        registry.switch_active(a.id).unwrap();

        registry.switch_active(b.id).unwrap();

        let records = registry.list().unwrap();
        for rec in &records {
            assert_eq!(rec.is_active, rec.id == b.id);
        }
        assert_eq!(registry.active().id(), Some(b.id));
        let _ = c;
    }

    #[test]
    fn test_switch_unknown_id_fails_without_changes() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let before = registry.list().unwrap();

        let result = registry.switch_active(Uuid::new_v4());
        assert!(matches!(result, Err(RegistryError::NotFound(_))));

        assert_eq!(registry.list().unwrap(), before);
        assert_eq!(registry.active().id(), Some(a.id));
    }

    #[test]
    fn test_delete_active_does_not_reelect() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let _b = registry.upsert(record("b"), true).unwrap();
        let x = registry.upsert(record("x"), true).unwrap();
        let _ = a;

        registry.delete(x.id).unwrap();

        let records = registry.list().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(active_count(&records), 0);
    }

    #[test]
    fn test_sole_remaining_record_is_auto_elected() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let b = registry.upsert(record("b"), true).unwrap();

        // b is active; deleting it leaves only a, inactive until list()
        registry.delete(b.id).unwrap();

        let records = registry.list().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_active);
        assert_eq!(records[0].id, a.id);
        assert_eq!(registry.active().id(), Some(a.id));
    }

    #[test]
    fn test_auto_election_ignores_stored_flag() {
        let (mut registry, _temp) = create_test_registry();

        // Seed the store directly with a single inactive record
        let store = registry.store.clone();
        let mut blob = Registry::new();
        let rec = record("only");
        blob.insert(rec.id, rec.clone());
        store.save(&blob).unwrap();

        let records = registry.list().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_active);

        // Healing is persisted
        let stored = store.load().unwrap().unwrap();
        assert!(stored.get(&rec.id).unwrap().is_active);
    }

    #[test]
    fn test_multi_active_heal_prefers_known_active_id() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        let b = registry.upsert(record("b"), true).unwrap();
        registry.switch_active(b.id).unwrap();

        // Corrupt the store: flag both records active
        let store = registry.store.clone();
        let mut blob = store.load().unwrap().unwrap();
        for rec in blob.values_mut() {
            rec.is_active = true;
        }
        store.save(&blob).unwrap();

        let records = registry.list().unwrap();
        assert_eq!(active_count(&records), 1);
        let active = records.iter().find(|r| r.is_active).unwrap();
        assert_eq!(active.id, b.id);
        let _ = a;

        // The corrected flags reached the store
        let stored = store.load().unwrap().unwrap();
        assert_eq!(stored.values().filter(|r| r.is_active).count(), 1);
    }

    #[test]
    fn test_multi_active_heal_without_known_id_is_deterministic() {
        let (mut registry, _temp) = create_test_registry();

        let store = registry.store.clone();
        let mut blob = Registry::new();
        for name in ["a", "b", "c"] {
            let mut rec = record(name);
            rec.is_active = true;
            blob.insert(rec.id, rec);
        }
        store.save(&blob).unwrap();
        let first_id = *blob.keys().next().unwrap();

        let records = registry.list().unwrap();
        assert_eq!(active_count(&records), 1);
        assert_eq!(records.iter().find(|r| r.is_active).unwrap().id, first_id);
    }

    #[test]
    fn test_delete_last_record_clears_active_handle() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("a"), true).unwrap();
        assert_eq!(registry.active().id(), Some(a.id));

        registry.delete(a.id).unwrap();
        assert!(registry.active().is_empty());
        assert!(registry.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_unknown_id_is_success() {
        let (mut registry, _temp) = create_test_registry();

        registry.upsert(record("a"), true).unwrap();
        registry.delete(Uuid::new_v4()).unwrap();
        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn test_each_mutation_notifies_exactly_once() {
        let (mut registry, _temp) = create_test_registry();
        let mut rx = registry.notifier.subscribe();

        let a = registry.upsert(record("a"), true).unwrap();
        registry.switch_active(a.id).unwrap();
        registry.delete(a.id).unwrap();

        for _ in 0..3 {
            assert_eq!(rx.try_recv().unwrap(), TreeEvent::Refresh);
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failed_switch_does_not_notify() {
        let (mut registry, _temp) = create_test_registry();
        registry.upsert(record("a"), true).unwrap();

        let mut rx = registry.notifier.subscribe();
        let _ = registry.switch_active(Uuid::new_v4());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_name_in_use() {
        let (mut registry, _temp) = create_test_registry();

        let a = registry.upsert(record("local"), true).unwrap();
        assert!(registry.name_in_use("local", None).unwrap());
        assert!(!registry.name_in_use("local", Some(a.id)).unwrap());
        assert!(!registry.name_in_use("other", None).unwrap());
    }
}
