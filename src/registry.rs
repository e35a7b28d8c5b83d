// 📒 Equipment Registry - append-only catalog keyed by sequential id
//
// register: validate -> store assigns next id and commits -> return id
// get_equipment: pure read, absence is `None`
//
// Calls are serialized through `&mut self`; shared surfaces wrap the
// registry in a Mutex so one call completes before the next begins.

use crate::equipment::{EquipmentRecord, NewEquipment, Principal};
use crate::error::Result;
use crate::event::Event;
use crate::store::{EquipmentStore, MemoryStore};
use tracing::{debug, info, warn};

pub struct EquipmentRegistry<S = MemoryStore> {
    store: S,
}

impl EquipmentRegistry<MemoryStore> {
    /// Create new empty in-memory registry
    pub fn new() -> Self {
        EquipmentRegistry {
            store: MemoryStore::new(),
        }
    }
}

impl Default for EquipmentRegistry<MemoryStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EquipmentStore> EquipmentRegistry<S> {
    pub fn with_store(store: S) -> Self {
        EquipmentRegistry { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Register equipment on behalf of `caller`, returning its new id.
    ///
    /// Nothing is stored and the counter does not move unless the whole
    /// registration succeeds.
    pub fn register(&mut self, params: NewEquipment, caller: &Principal) -> Result<u64> {
        if let Err(err) = params.validate(caller) {
            warn!(caller = %caller, error = %err, "rejected equipment registration");
            return Err(err);
        }

        let record = self.store.append(params, caller.clone())?;

        info!(
            id = record.id,
            owner = %record.owner,
            name = %record.name,
            category = %record.category,
            "registered equipment"
        );

        Ok(record.id)
    }

    /// Look up equipment by id; unknown ids (including 0) yield `None`
    pub fn get_equipment(&self, id: u64) -> Result<Option<EquipmentRecord>> {
        let record = self.store.fetch(id)?;
        debug!(id, found = record.is_some(), "equipment lookup");
        Ok(record)
    }

    /// Id the next successful registration will receive
    pub fn next_id(&self) -> Result<u64> {
        self.store.next_id()
    }

    pub fn count(&self) -> Result<usize> {
        self.store.count()
    }

    /// All records in ascending id order
    pub fn all_equipment(&self) -> Result<Vec<EquipmentRecord>> {
        self.store.all()
    }

    /// Audit trail of one record; empty for unknown ids
    pub fn equipment_events(&self, id: u64) -> Result<Vec<Event>> {
        self.store.events_for(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RegistryError;

    fn wallet_1() -> Principal {
        Principal::from("ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5")
    }

    fn tractor() -> NewEquipment {
        NewEquipment::new("Tractor", "Heavy Machinery", 100, 500, "Field 1, Village X")
    }

    #[test]
    fn test_register_then_get_returns_same_fields() {
        let mut registry = EquipmentRegistry::new();

        let id = registry.register(tractor(), &wallet_1()).unwrap();
        assert_eq!(id, 1);

        let record = registry.get_equipment(1).unwrap().unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(record.name, "Tractor");
        assert_eq!(record.category, "Heavy Machinery");
        assert_eq!(record.daily_rate, 100);
        assert_eq!(record.deposit, 500);
        assert_eq!(record.location, "Field 1, Village X");
        assert_eq!(record.owner, wallet_1());
    }

    #[test]
    fn test_ids_follow_call_order() {
        let mut registry = EquipmentRegistry::new();

        for expected in 1..=5u64 {
            let params = NewEquipment::new(
                format!("Harrow {}", expected),
                "Tillage",
                expected * 10,
                expected * 50,
                "North field",
            );
            assert_eq!(registry.register(params, &wallet_1()).unwrap(), expected);
        }

        assert_eq!(registry.count().unwrap(), 5);
        assert_eq!(registry.next_id().unwrap(), 6);
    }

    #[test]
    fn test_unknown_id_is_none() {
        let mut registry = EquipmentRegistry::new();
        assert!(registry.get_equipment(1).unwrap().is_none());

        registry.register(tractor(), &wallet_1()).unwrap();

        assert!(registry.get_equipment(0).unwrap().is_none());
        assert!(registry.get_equipment(2).unwrap().is_none());
        assert!(registry.get_equipment(u64::MAX).unwrap().is_none());
    }

    #[test]
    fn test_second_registration_gets_id_two() {
        let mut registry = EquipmentRegistry::new();

        assert_eq!(registry.register(tractor(), &wallet_1()).unwrap(), 1);
        assert!(registry.get_equipment(2).unwrap().is_none());

        let plough = NewEquipment::new("Plough", "Tillage", 30, 150, "Field 2");
        assert_eq!(registry.register(plough, &Principal::from("wallet_2")).unwrap(), 2);

        let second = registry.get_equipment(2).unwrap().unwrap();
        assert_eq!(second.name, "Plough");
        assert_eq!(second.owner, Principal::from("wallet_2"));
    }

    #[test]
    fn test_invalid_registration_does_not_consume_id() {
        let mut registry = EquipmentRegistry::new();

        let cases = vec![
            NewEquipment::new("", "Heavy Machinery", 100, 500, "Field 1"),
            NewEquipment::new("Tractor", "", 100, 500, "Field 1"),
            NewEquipment::new("Tractor", "Heavy Machinery", 100, 500, ""),
        ];

        for params in cases {
            let err = registry.register(params, &wallet_1()).unwrap_err();
            assert!(err.is_invalid_input());
        }

        assert_eq!(registry.count().unwrap(), 0);
        assert_eq!(registry.next_id().unwrap(), 1);
        assert_eq!(registry.register(tractor(), &wallet_1()).unwrap(), 1);
    }

    #[test]
    fn test_empty_caller_is_rejected() {
        let mut registry = EquipmentRegistry::new();

        let err = registry.register(tractor(), &Principal::from("")).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(registry.next_id().unwrap(), 1);
    }

    #[test]
    fn test_repeated_lookups_are_identical() {
        let mut registry = EquipmentRegistry::new();
        registry.register(tractor(), &wallet_1()).unwrap();

        let first = registry.get_equipment(1).unwrap();
        let second = registry.get_equipment(1).unwrap();

        assert_eq!(first, second);
        assert_eq!(registry.count().unwrap(), 1);
        assert_eq!(registry.next_id().unwrap(), 2);
    }

    /// Store that refuses every write
    struct ReadOnlyStore(MemoryStore);

    impl EquipmentStore for ReadOnlyStore {
        fn next_id(&self) -> Result<u64> {
            self.0.next_id()
        }
        fn append(&mut self, _params: NewEquipment, _owner: Principal) -> Result<EquipmentRecord> {
            Err(RegistryError::Storage(anyhow::anyhow!("store is read-only")))
        }
        fn fetch(&self, id: u64) -> Result<Option<EquipmentRecord>> {
            self.0.fetch(id)
        }
        fn all(&self) -> Result<Vec<EquipmentRecord>> {
            self.0.all()
        }
        fn count(&self) -> Result<usize> {
            self.0.count()
        }
        fn events_for(&self, id: u64) -> Result<Vec<Event>> {
            self.0.events_for(id)
        }
    }

    #[test]
    fn test_exhausted_counter_never_wraps() {
        let mut registry = EquipmentRegistry::with_store(MemoryStore::starting_at(u64::MAX));

        let err = registry.register(tractor(), &wallet_1()).unwrap_err();
        assert!(matches!(err, RegistryError::IdSpaceExhausted));
        assert_eq!(registry.count().unwrap(), 0);
        assert_eq!(registry.next_id().unwrap(), u64::MAX);
    }

    #[test]
    fn test_failed_commit_leaves_state_unchanged() {
        let mut registry = EquipmentRegistry::with_store(ReadOnlyStore(MemoryStore::new()));

        let err = registry.register(tractor(), &wallet_1()).unwrap_err();
        assert_eq!(err.code(), crate::error::ERR_STORAGE);
        assert_eq!(registry.next_id().unwrap(), 1);
        assert!(registry.get_equipment(1).unwrap().is_none());
    }

    #[test]
    fn test_amount_above_ceiling_is_invalid_input() {
        let mut registry = EquipmentRegistry::new();

        let huge = NewEquipment::new("Combine", "Harvest", crate::equipment::MAX_AMOUNT + 1, 0, "Depot");
        let err = registry.register(huge, &wallet_1()).unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(registry.next_id().unwrap(), 1);
    }

    #[test]
    fn test_registration_is_audited() {
        let mut registry = EquipmentRegistry::new();
        registry.register(tractor(), &wallet_1()).unwrap();

        let events = registry.equipment_events(1).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor, wallet_1().as_str());
        assert!(registry.equipment_events(2).unwrap().is_empty());
    }

    #[test]
    fn test_all_equipment_in_id_order() {
        let mut registry = EquipmentRegistry::new();
        registry.register(tractor(), &wallet_1()).unwrap();
        registry
            .register(NewEquipment::new("Baler", "Harvest", 80, 400, "Barn"), &wallet_1())
            .unwrap();

        let names: Vec<String> = registry
            .all_equipment()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["Tractor", "Baler"]);
    }
}
