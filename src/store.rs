// 🗃️ Store - persistence seam for the equipment registry
//
// The registry only talks to this trait. `append` reads the counter, stores
// the record under it, advances the counter and logs the audit event as one
// step: either everything lands or nothing does.

use crate::equipment::{EquipmentRecord, NewEquipment, Principal};
use crate::error::{RegistryError, Result};
use crate::event::Event;
use std::collections::BTreeMap;

pub trait EquipmentStore {
    /// Id the next successful registration will receive
    fn next_id(&self) -> Result<u64>;

    /// Assign the next id to validated `params`, store the record and return it
    fn append(&mut self, params: NewEquipment, owner: Principal) -> Result<EquipmentRecord>;

    fn fetch(&self, id: u64) -> Result<Option<EquipmentRecord>>;

    /// All records in ascending id order
    fn all(&self) -> Result<Vec<EquipmentRecord>>;

    fn count(&self) -> Result<usize>;

    /// Audit trail for one record, oldest first
    fn events_for(&self, id: u64) -> Result<Vec<Event>>;
}

/// Store picked at runtime (memory or SQLite)
pub type DynStore = Box<dyn EquipmentStore + Send>;

impl<T: EquipmentStore + ?Sized> EquipmentStore for Box<T> {
    fn next_id(&self) -> Result<u64> {
        (**self).next_id()
    }

    fn append(&mut self, params: NewEquipment, owner: Principal) -> Result<EquipmentRecord> {
        (**self).append(params, owner)
    }

    fn fetch(&self, id: u64) -> Result<Option<EquipmentRecord>> {
        (**self).fetch(id)
    }

    fn all(&self) -> Result<Vec<EquipmentRecord>> {
        (**self).all()
    }

    fn count(&self) -> Result<usize> {
        (**self).count()
    }

    fn events_for(&self, id: u64) -> Result<Vec<Event>> {
        (**self).events_for(id)
    }
}

/// Successor of `id`; the counter never wraps
pub fn successor(id: u64) -> Result<u64> {
    id.checked_add(1).ok_or(RegistryError::IdSpaceExhausted)
}

// ============================================================================
// MEMORY STORE
// ============================================================================

/// Arena-style store: ordered map plus monotonic counter
#[derive(Debug, Clone)]
pub struct MemoryStore {
    records: BTreeMap<u64, EquipmentRecord>,
    events: Vec<Event>,
    next_id: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            records: BTreeMap::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn starting_at(next_id: u64) -> Self {
        MemoryStore {
            next_id,
            ..Self::new()
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EquipmentStore for MemoryStore {
    fn next_id(&self) -> Result<u64> {
        Ok(self.next_id)
    }

    fn append(&mut self, params: NewEquipment, owner: Principal) -> Result<EquipmentRecord> {
        let id = self.next_id;
        let next_id = successor(id)?;

        let record = EquipmentRecord::from_params(id, params, owner);
        self.events.push(Event::equipment_registered(&record));
        self.records.insert(id, record.clone());
        self.next_id = next_id;

        Ok(record)
    }

    fn fetch(&self, id: u64) -> Result<Option<EquipmentRecord>> {
        Ok(self.records.get(&id).cloned())
    }

    fn all(&self) -> Result<Vec<EquipmentRecord>> {
        Ok(self.records.values().cloned().collect())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn events_for(&self, id: u64) -> Result<Vec<Event>> {
        Ok(self
            .events
            .iter()
            .filter(|e| e.is_for_equipment(id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeder() -> NewEquipment {
        NewEquipment::new("Seeder", "Planting", 40, 200, "Shed 2")
    }

    #[test]
    fn test_memory_store_starts_at_one() {
        let store = MemoryStore::new();
        assert_eq!(store.next_id().unwrap(), 1);
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.fetch(1).unwrap().is_none());
        assert!(store.events_for(1).unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_append_assigns_sequential_ids() {
        let mut store = MemoryStore::new();

        let first = store.append(seeder(), Principal::from("wallet_2")).unwrap();
        let second = store.append(seeder(), Principal::from("wallet_2")).unwrap();

        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(store.next_id().unwrap(), 3);
        assert_eq!(store.fetch(2).unwrap(), Some(second));

        let ids: Vec<u64> = store.all().unwrap().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_memory_store_keeps_audit_trail() {
        let mut store = MemoryStore::new();
        store.append(seeder(), Principal::from("wallet_2")).unwrap();
        store.append(seeder(), Principal::from("wallet_3")).unwrap();

        let events = store.events_for(2).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor, "wallet_3");
    }

    #[test]
    fn test_memory_store_refuses_to_wrap() {
        let mut store = MemoryStore::starting_at(u64::MAX);

        let err = store.append(seeder(), Principal::from("wallet_2")).unwrap_err();
        assert!(matches!(err, RegistryError::IdSpaceExhausted));
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.events_for(u64::MAX).unwrap().is_empty());
    }
}
