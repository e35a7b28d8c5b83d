// 📜 Contract Surface - named-method calls over the equipment registry
//
// Arguments arrive as host literals (`u100`, `-5`, `"Tractor"`, `'ST1...`),
// results leave as `ok`/`err`/`some`/`none` values. The caller is always
// supplied by the invoking context, never as an argument.

use crate::equipment::{non_negative_amount, EquipmentRecord, NewEquipment, Principal};
use crate::error::{RegistryError, ValidationError, ERR_INVALID_INPUT};
use crate::registry::EquipmentRegistry;
use crate::store::EquipmentStore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

pub const REGISTER_EQUIPMENT: &str = "register-equipment";
pub const GET_EQUIPMENT: &str = "get-equipment";

// ============================================================================
// CONTRACT VALUE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ContractValue {
    UInt(u128),
    Int(i128),
    #[serde(rename = "string")]
    Str(String),
    Principal(Principal),
    Tuple(BTreeMap<String, ContractValue>),
    Ok(Box<ContractValue>),
    Err(Box<ContractValue>),
    Some(Box<ContractValue>),
    None,
}

impl ContractValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            ContractValue::UInt(_) => "uint",
            ContractValue::Int(_) => "int",
            ContractValue::Str(_) => "string",
            ContractValue::Principal(_) => "principal",
            ContractValue::Tuple(_) => "tuple",
            ContractValue::Ok(_) => "ok",
            ContractValue::Err(_) => "err",
            ContractValue::Some(_) => "some",
            ContractValue::None => "none",
        }
    }

    pub fn ok(value: ContractValue) -> Self {
        ContractValue::Ok(Box::new(value))
    }

    pub fn err_code(code: u32) -> Self {
        ContractValue::Err(Box::new(ContractValue::UInt(u128::from(code))))
    }

    pub fn some(value: ContractValue) -> Self {
        ContractValue::Some(Box::new(value))
    }

    /// Inner value of `ok`/`err`/`some`
    pub fn inner(&self) -> Option<&ContractValue> {
        match self {
            ContractValue::Ok(v) | ContractValue::Err(v) | ContractValue::Some(v) => Some(v),
            _ => None,
        }
    }

    /// Parse one host call literal
    pub fn parse_literal(input: &str) -> Result<Self, ContractError> {
        let literal = input.trim();
        let bad = || ContractError::BadLiteral(input.to_string());

        if let Some(digits) = literal.strip_prefix('u') {
            if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            return digits.parse().map(ContractValue::UInt).map_err(|_| bad());
        }

        if let Some(principal) = literal.strip_prefix('\'') {
            if principal.is_empty() {
                return Err(bad());
            }
            return Ok(ContractValue::Principal(Principal::new(principal)));
        }

        if literal.len() >= 2 && literal.starts_with('"') && literal.ends_with('"') {
            return unescape(&literal[1..literal.len() - 1])
                .map(ContractValue::Str)
                .ok_or_else(bad);
        }

        let unsigned = literal.strip_prefix('-').unwrap_or(literal);
        if !unsigned.is_empty() && unsigned.bytes().all(|b| b.is_ascii_digit()) {
            return literal.parse().map(ContractValue::Int).map_err(|_| bad());
        }

        Err(bad())
    }

    pub fn parse_args<I, T>(literals: I) -> Result<Vec<Self>, ContractError>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        literals
            .into_iter()
            .map(|l| Self::parse_literal(l.as_ref()))
            .collect()
    }
}

impl std::fmt::Display for ContractValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContractValue::UInt(v) => write!(f, "u{}", v),
            ContractValue::Int(v) => write!(f, "{}", v),
            ContractValue::Str(v) => write!(f, "{:?}", v),
            ContractValue::Principal(p) => write!(f, "'{}", p),
            ContractValue::Tuple(fields) => {
                write!(f, "(tuple")?;
                for (key, value) in fields {
                    write!(f, " ({} {})", key, value)?;
                }
                write!(f, ")")
            }
            ContractValue::Ok(v) => write!(f, "(ok {})", v),
            ContractValue::Err(v) => write!(f, "(err {})", v),
            ContractValue::Some(v) => write!(f, "(some {})", v),
            ContractValue::None => write!(f, "none"),
        }
    }
}

fn unescape(body: &str) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next()? {
                '"' => out.push('"'),
                '\\' => out.push('\\'),
                'n' => out.push('\n'),
                _ => return None,
            },
            '"' => return None,
            other => out.push(other),
        }
    }

    Some(out)
}

impl From<&EquipmentRecord> for ContractValue {
    fn from(record: &EquipmentRecord) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("name".to_string(), ContractValue::Str(record.name.clone()));
        fields.insert("category".to_string(), ContractValue::Str(record.category.clone()));
        fields.insert("daily-rate".to_string(), ContractValue::UInt(u128::from(record.daily_rate)));
        fields.insert("deposit".to_string(), ContractValue::UInt(u128::from(record.deposit)));
        fields.insert("location".to_string(), ContractValue::Str(record.location.clone()));
        fields.insert("owner".to_string(), ContractValue::Principal(record.owner.clone()));
        ContractValue::Tuple(fields)
    }
}

// ============================================================================
// CONTRACT ERROR
// ============================================================================

/// Faults in the call itself, as opposed to `(err uN)` results
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("Bad arguments for {method}: {message}")]
    BadArguments { method: String, message: String },

    #[error("Bad literal: {0}")]
    BadLiteral(String),

    /// Store fault during a read-only call
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

// ============================================================================
// EQUIPMENT CONTRACT
// ============================================================================

pub struct EquipmentContract<S: EquipmentStore> {
    registry: EquipmentRegistry<S>,
}

impl<S: EquipmentStore> EquipmentContract<S> {
    pub fn new(registry: EquipmentRegistry<S>) -> Self {
        EquipmentContract { registry }
    }

    pub fn registry(&self) -> &EquipmentRegistry<S> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut EquipmentRegistry<S> {
        &mut self.registry
    }

    /// State-changing call; registry failures come back as `(err uN)`
    pub fn call_public(
        &mut self,
        method: &str,
        args: &[ContractValue],
        caller: &Principal,
    ) -> Result<ContractValue, ContractError> {
        debug!(method, caller = %caller, args = args.len(), "public call");

        match method {
            REGISTER_EQUIPMENT => Ok(self.register_equipment(args, caller)),
            _ => Err(ContractError::UnknownMethod(method.to_string())),
        }
    }

    /// Read-only call; never mutates state
    pub fn call_read_only(
        &self,
        method: &str,
        args: &[ContractValue],
        caller: &Principal,
    ) -> Result<ContractValue, ContractError> {
        debug!(method, caller = %caller, args = args.len(), "read-only call");

        match method {
            GET_EQUIPMENT => self.get_equipment(args),
            _ => Err(ContractError::UnknownMethod(method.to_string())),
        }
    }

    fn register_equipment(&mut self, args: &[ContractValue], caller: &Principal) -> ContractValue {
        let params = match register_params(args) {
            Ok(params) => params,
            Err(errors) => {
                debug!(errors = errors.len(), "register-equipment arguments rejected");
                return ContractValue::err_code(ERR_INVALID_INPUT);
            }
        };

        match self.registry.register(params, caller) {
            Ok(id) => ContractValue::ok(ContractValue::UInt(u128::from(id))),
            Err(err) => ContractValue::err_code(err.code()),
        }
    }

    fn get_equipment(&self, args: &[ContractValue]) -> Result<ContractValue, ContractError> {
        let [id] = args else {
            return Err(ContractError::BadArguments {
                method: GET_EQUIPMENT.to_string(),
                message: format!("expected 1 argument, got {}", args.len()),
            });
        };

        // Negative, zero, or oversized ids can never have been assigned
        let id = match id {
            ContractValue::UInt(v) => u64::try_from(*v).ok(),
            ContractValue::Int(v) => u64::try_from(*v).ok(),
            other => {
                return Err(ContractError::BadArguments {
                    method: GET_EQUIPMENT.to_string(),
                    message: format!("id must be an integer, got {}", other.type_name()),
                })
            }
        };

        let record = match id {
            Some(id) => self.registry.get_equipment(id)?,
            None => None,
        };

        Ok(match record {
            Some(record) => ContractValue::some(ContractValue::from(&record)),
            None => ContractValue::None,
        })
    }
}

/// Map `[name, category, daily-rate, deposit, location]` to typed params
fn register_params(args: &[ContractValue]) -> Result<NewEquipment, Vec<ValidationError>> {
    let [name, category, daily_rate, deposit, location] = args else {
        return Err(vec![ValidationError::new(
            "args",
            format!("expected 5 arguments, got {}", args.len()),
        )]);
    };

    let mut errors = Vec::new();

    let mut text = |field: &str, value: &ContractValue| match value {
        ContractValue::Str(s) => s.clone(),
        other => {
            errors.push(ValidationError::new(
                field,
                format!("expected string, got {}", other.type_name()),
            ));
            String::new()
        }
    };
    let name = text("name", name);
    let category = text("category", category);
    let location = text("location", location);

    let mut amount = |field: &str, value: &ContractValue| {
        let signed = match value {
            ContractValue::UInt(v) => i128::try_from(*v).unwrap_or(i128::MAX),
            ContractValue::Int(v) => *v,
            other => {
                errors.push(ValidationError::new(
                    field,
                    format!("expected integer, got {}", other.type_name()),
                ));
                return 0;
            }
        };
        non_negative_amount(field, signed).unwrap_or_else(|e| {
            errors.push(e);
            0
        })
    };
    let daily_rate = amount("daily_rate", daily_rate);
    let deposit = amount("deposit", deposit);

    if errors.is_empty() {
        Ok(NewEquipment::new(name, category, daily_rate, deposit, location))
    } else {
        Err(errors)
    }
}
