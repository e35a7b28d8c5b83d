// 🚜 Equipment Entity - one shared piece of farm equipment
//
// Identity: sequential id assigned by the registry (never reused)
// Values: descriptive and financial attributes, fixed at registration
// Owner: the principal that registered it, fixed at registration

use crate::error::{RegistryError, Result, ValidationError};
use serde::{Deserialize, Serialize};

// ============================================================================
// PRINCIPAL
// ============================================================================

/// Opaque caller identity supplied by the invoking context
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(value: impl Into<String>) -> Self {
        Principal(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Principal::new(value)
    }
}

// ============================================================================
// REGISTRATION PARAMETERS
// ============================================================================

/// Arguments of `register-equipment`, in call order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEquipment {
    /// Label (e.g., "Tractor")
    pub name: String,

    /// Classification (e.g., "Heavy Machinery")
    pub category: String,

    /// Cost per rental day, smallest currency unit
    pub daily_rate: u64,

    /// Refundable deposit, smallest currency unit
    pub deposit: u64,

    /// Free-text location (e.g., "Field 1, Village X")
    pub location: String,
}

impl NewEquipment {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        daily_rate: u64,
        deposit: u64,
        location: impl Into<String>,
    ) -> Self {
        NewEquipment {
            name: name.into(),
            category: category.into(),
            daily_rate,
            deposit,
            location: location.into(),
        }
    }

    /// Build params from signed amounts (HTTP body, CSV row); negatives become field errors
    pub fn from_signed(
        name: impl Into<String>,
        category: impl Into<String>,
        daily_rate: i128,
        deposit: i128,
        location: impl Into<String>,
    ) -> Result<Self> {
        let daily_rate = non_negative_amount("daily_rate", daily_rate);
        let deposit = non_negative_amount("deposit", deposit);

        match (daily_rate, deposit) {
            (Ok(daily_rate), Ok(deposit)) => Ok(NewEquipment::new(
                name, category, daily_rate, deposit, location,
            )),
            (daily_rate, deposit) => Err(RegistryError::InvalidInput(
                [daily_rate.err(), deposit.err()].into_iter().flatten().collect(),
            )),
        }
    }

    /// Collect every failing field
    pub fn validation_errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for (field, value) in [("daily_rate", self.daily_rate), ("deposit", self.deposit)] {
            if value > MAX_AMOUNT {
                errors.push(ValidationError::new(
                    field,
                    format!("Must be at most {}, got {}", MAX_AMOUNT, value),
                ));
            }
        }

        for (field, value) in [
            ("name", &self.name),
            ("category", &self.category),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                errors.push(ValidationError::new(field, "Required field is empty"));
            }
        }

        errors
    }

    pub fn validate(&self, caller: &Principal) -> Result<()> {
        let mut errors = self.validation_errors();

        if caller.is_empty() {
            errors.push(ValidationError::new("caller", "Caller principal is empty"));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::InvalidInput(errors))
        }
    }
}

/// Largest daily rate or deposit any store accepts (SQLite INTEGER range)
pub const MAX_AMOUNT: u64 = i64::MAX as u64;

/// Narrow a signed amount from an untyped source (CSV, HTTP body, call literal)
pub fn non_negative_amount(field: &str, value: i128) -> std::result::Result<u64, ValidationError> {
    if value < 0 {
        return Err(ValidationError::new(
            field,
            format!("Must be non-negative, got {}", value),
        ));
    }
    u64::try_from(value)
        .ok()
        .filter(|v| *v <= MAX_AMOUNT)
        .ok_or_else(|| ValidationError::new(field, format!("Must be at most {}, got {}", MAX_AMOUNT, value)))
}

// ============================================================================
// EQUIPMENT RECORD
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquipmentRecord {
    pub id: u64,
    pub name: String,
    pub category: String,
    pub daily_rate: u64,
    pub deposit: u64,
    pub location: String,
    pub owner: Principal,
}

impl EquipmentRecord {
    /// Build the record stored for a validated registration
    pub fn from_params(id: u64, params: NewEquipment, owner: Principal) -> Self {
        EquipmentRecord {
            id,
            name: params.name,
            category: params.category,
            daily_rate: params.daily_rate,
            deposit: params.deposit,
            location: params.location,
            owner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tractor() -> NewEquipment {
        NewEquipment::new("Tractor", "Heavy Machinery", 100, 500, "Field 1, Village X")
    }

    #[test]
    fn test_valid_params_pass() {
        let caller = Principal::new("ST1SJ3DTE5DN7X54YDH5D64R3BCB6A2AG2ZQ8YPD5");
        assert!(tractor().validate(&caller).is_ok());
    }

    #[test]
    fn test_zero_amounts_are_valid() {
        let params = NewEquipment::new("Rake", "Hand Tools", 0, 0, "Barn");
        assert!(params.validation_errors().is_empty());
    }

    #[test]
    fn test_blank_text_fields_are_rejected() {
        let params = NewEquipment::new("", "  ", 10, 10, "");
        let fields: Vec<String> = params
            .validation_errors()
            .into_iter()
            .map(|e| e.field)
            .collect();

        assert_eq!(fields, vec!["name", "category", "location"]);
    }

    #[test]
    fn test_empty_caller_is_rejected() {
        let err = tractor().validate(&Principal::new("")).unwrap_err();

        match err {
            RegistryError::InvalidInput(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "caller");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_non_negative_amount() {
        assert_eq!(non_negative_amount("deposit", 500).unwrap(), 500);
        assert_eq!(non_negative_amount("deposit", 0).unwrap(), 0);

        let err = non_negative_amount("daily_rate", -1).unwrap_err();
        assert_eq!(err.field, "daily_rate");
        assert!(err.message.contains("non-negative"));

        assert_eq!(non_negative_amount("deposit", i128::from(i64::MAX)).unwrap(), MAX_AMOUNT);
        assert!(non_negative_amount("deposit", i128::from(i64::MAX) + 1).is_err());
        assert!(non_negative_amount("deposit", i128::from(u64::MAX) + 1).is_err());
    }

    #[test]
    fn test_amount_above_ceiling_is_rejected() {
        let params = NewEquipment::new("Combine", "Harvest", MAX_AMOUNT + 1, MAX_AMOUNT, "Depot");
        let errors = params.validation_errors();

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "daily_rate");
    }

    #[test]
    fn test_from_signed_reports_both_amounts() {
        let params = NewEquipment::from_signed("Tractor", "Heavy Machinery", 100, 500, "Field 1").unwrap();
        assert_eq!(params.daily_rate, 100);
        assert_eq!(params.deposit, 500);

        match NewEquipment::from_signed("Tractor", "Heavy Machinery", -1, -2, "Field 1").unwrap_err() {
            RegistryError::InvalidInput(errors) => {
                let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["daily_rate", "deposit"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_record_keeps_params_and_owner() {
        let owner = Principal::from("wallet_1");
        let record = EquipmentRecord::from_params(7, tractor(), owner.clone());

        assert_eq!(record.id, 7);
        assert_eq!(record.name, "Tractor");
        assert_eq!(record.category, "Heavy Machinery");
        assert_eq!(record.daily_rate, 100);
        assert_eq!(record.deposit, 500);
        assert_eq!(record.location, "Field 1, Village X");
        assert_eq!(record.owner, owner);
    }

    #[test]
    fn test_principal_serializes_as_plain_string() {
        let json = serde_json::to_string(&Principal::from("wallet_1")).unwrap();
        assert_eq!(json, "\"wallet_1\"");
    }
}
