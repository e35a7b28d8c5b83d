// Farm Equipment Sharing - Core Library
// Exposes the registry for use in CLI, API server, and tests

pub mod config;
pub mod contract;
pub mod db;
pub mod equipment;
pub mod error;
pub mod event;
pub mod import;
pub mod logging;
pub mod registry;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use contract::{ContractError, ContractValue, EquipmentContract, GET_EQUIPMENT, REGISTER_EQUIPMENT};
pub use db::{open_store, SqliteStore};
pub use equipment::{EquipmentRecord, NewEquipment, Principal};
pub use error::{RegistryError, ValidationError};
pub use event::Event;
pub use import::{import_csv, import_csv_file, ImportSummary, RejectedRow};
pub use registry::EquipmentRegistry;
pub use store::{DynStore, EquipmentStore, MemoryStore};
