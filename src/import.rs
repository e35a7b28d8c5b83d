// 📥 Bulk Import - register equipment from CSV
//
// Headers: name,category,daily_rate,deposit,location
// Each row is one registration call. Rejected rows are reported and skipped;
// they never consume an id.

use crate::equipment::{NewEquipment, Principal};
use crate::error::RegistryError;
use crate::registry::EquipmentRegistry;
use crate::store::EquipmentStore;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use tracing::{info, warn};

/// Raw CSV row; amounts are signed so negative values surface as validation errors
#[derive(Debug, Deserialize)]
struct EquipmentRow {
    name: String,
    category: String,
    daily_rate: i64,
    deposit: i64,
    location: String,
}

impl EquipmentRow {
    fn into_params(self) -> std::result::Result<NewEquipment, RegistryError> {
        NewEquipment::from_signed(
            self.name,
            self.category,
            i128::from(self.daily_rate),
            i128::from(self.deposit),
            self.location,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based CSV line, header included
    pub line: u64,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportSummary {
    pub registered: Vec<u64>,
    pub rejected: Vec<RejectedRow>,
}

pub fn import_csv<S: EquipmentStore>(
    registry: &mut EquipmentRegistry<S>,
    reader: impl Read,
    caller: &Principal,
) -> Result<ImportSummary> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers().context("Failed to read CSV headers")?.clone();
    let mut summary = ImportSummary::default();

    for result in rdr.records() {
        let (line, parsed) = match result {
            Ok(record) => (
                record.position().map(|p| p.line()).unwrap_or_default(),
                record
                    .deserialize::<EquipmentRow>(Some(&headers))
                    .map_err(|e| e.to_string())
                    .and_then(|row| row.into_params().map_err(|e| e.to_string())),
            ),
            Err(e) => (
                e.position().map(|p| p.line()).unwrap_or_default(),
                Err(e.to_string()),
            ),
        };

        let outcome = match parsed {
            Ok(params) => match registry.register(params, caller) {
                Ok(id) => Ok(id),
                Err(RegistryError::Storage(e)) => {
                    return Err(e.context(format!("Import aborted at line {}", line)));
                }
                Err(err) => Err(err.to_string()),
            },
            Err(reason) => Err(reason),
        };

        match outcome {
            Ok(id) => summary.registered.push(id),
            Err(reason) => {
                warn!(line, reason = %reason, "skipped equipment row");
                summary.rejected.push(RejectedRow { line, reason });
            }
        }
    }

    info!(
        registered = summary.registered.len(),
        rejected = summary.rejected.len(),
        "equipment import finished"
    );

    Ok(summary)
}

pub fn import_csv_file<S: EquipmentStore>(
    registry: &mut EquipmentRegistry<S>,
    csv_path: &Path,
    caller: &Principal,
) -> Result<ImportSummary> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open CSV file {}", csv_path.display()))?;
    import_csv(registry, file, caller)
}
