// 🧾 Audit Events - one entry per committed registration

use crate::equipment::EquipmentRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const EQUIPMENT_REGISTERED: &str = "equipment_registered";
pub const EQUIPMENT_ENTITY: &str = "equipment";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }

    /// Registration event; payload holds the descriptive and financial fields
    pub fn equipment_registered(record: &EquipmentRecord) -> Self {
        Self::new(
            EQUIPMENT_REGISTERED,
            EQUIPMENT_ENTITY,
            &record.id.to_string(),
            serde_json::json!({
                "name": record.name,
                "category": record.category,
                "daily_rate": record.daily_rate,
                "deposit": record.deposit,
                "location": record.location,
            }),
            record.owner.as_str(),
        )
    }

    pub fn is_for_equipment(&self, id: u64) -> bool {
        self.entity_type == EQUIPMENT_ENTITY && self.entity_id == id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{NewEquipment, Principal};

    #[test]
    fn test_registration_event_payload() {
        let record = EquipmentRecord::from_params(
            3,
            NewEquipment::new("Baler", "Harvest", 80, 400, "Barn"),
            Principal::from("wallet_3"),
        );

        let event = Event::equipment_registered(&record);

        assert_eq!(event.event_type, "equipment_registered");
        assert_eq!(event.actor, "wallet_3");
        assert_eq!(event.data["deposit"], 400);
        assert!(event.is_for_equipment(3));
        assert!(!event.is_for_equipment(30));
    }
}
