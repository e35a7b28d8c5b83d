use crate::equipment::{EquipmentRecord, NewEquipment, Principal};
use crate::error::Result as RegistryResult;
use crate::event::{Event, EQUIPMENT_ENTITY};
use crate::store::{successor, DynStore, EquipmentStore, MemoryStore};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a writer waits for another process holding the database lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Equipment Table (id assigned by the registry, never AUTOINCREMENT)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS equipment (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            category TEXT NOT NULL,
            daily_rate INTEGER NOT NULL CHECK (daily_rate >= 0),
            deposit INTEGER NOT NULL CHECK (deposit >= 0),
            location TEXT NOT NULL,
            owner TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Registry Meta (id counter)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS registry_meta (
            key TEXT PRIMARY KEY,
            value INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO registry_meta (key, value) VALUES ('next_id', 1)",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_equipment_owner ON equipment(owner)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity, oldest first
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY id ASC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let timestamp_str: String = row.get(1)?;
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: DateTime::parse_from_rfc3339(&timestamp_str)
                    .map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?
                    .with_timezone(&Utc),
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        5,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(events)
}

pub fn verify_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM equipment", [], |row| row.get(0))?;
    Ok(count)
}

fn read_counter(conn: &Connection) -> Result<u64> {
    let next: i64 = conn.query_row(
        "SELECT value FROM registry_meta WHERE key = 'next_id'",
        [],
        |row| row.get(0),
    )?;
    u64::try_from(next).context("Corrupt next_id counter")
}

fn to_sql_int(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value).with_context(|| format!("{} {} exceeds SQLite integer range", field, value))
}

fn unsigned_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<EquipmentRecord> {
    let owner: String = row.get(6)?;
    Ok(EquipmentRecord {
        id: unsigned_column(row, 0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        daily_rate: unsigned_column(row, 3)?,
        deposit: unsigned_column(row, 4)?,
        location: row.get(5)?,
        owner: Principal::new(owner),
    })
}

/// SQLite store when a path is configured, in-memory store otherwise
pub fn open_store(db_path: Option<&Path>) -> Result<DynStore> {
    match db_path {
        Some(path) => Ok(Box::new(SqliteStore::open(path)?)),
        None => {
            warn!("no database configured, registry will not outlive this process");
            Ok(Box::new(MemoryStore::new()))
        }
    }
}

// ============================================================================
// SQLITE STORE
// ============================================================================

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) a registry database; an existing counter is resumed
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        setup_database(&conn)?;
        info!(path = %path.display(), "opened equipment database");
        Ok(SqliteStore { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl EquipmentStore for SqliteStore {
    fn next_id(&self) -> RegistryResult<u64> {
        Ok(read_counter(&self.conn)?)
    }

    fn append(&mut self, params: NewEquipment, owner: Principal) -> RegistryResult<EquipmentRecord> {
        // IMMEDIATE takes the write lock up front, so the counter read below
        // cannot race another connection on the same database file
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let id = read_counter(&tx)?;
        let next_id = to_sql_int("next_id", successor(id)?)?;
        let record = EquipmentRecord::from_params(id, params, owner);
        let event = Event::equipment_registered(&record);

        tx.execute(
            "INSERT INTO equipment (id, name, category, daily_rate, deposit, location, owner)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                to_sql_int("id", record.id)?,
                record.name,
                record.category,
                to_sql_int("daily_rate", record.daily_rate)?,
                to_sql_int("deposit", record.deposit)?,
                record.location,
                record.owner.as_str(),
            ],
        )?;

        tx.execute(
            "UPDATE registry_meta SET value = ?1 WHERE key = 'next_id'",
            params![next_id],
        )?;

        insert_event(&tx, &event)?;

        // Any early return above drops `tx` and rolls everything back
        tx.commit()?;
        debug!(id = record.id, event_id = %event.event_id, "committed equipment row");

        Ok(record)
    }

    fn fetch(&self, id: u64) -> RegistryResult<Option<EquipmentRecord>> {
        // Ids past i64::MAX were never stored
        let Ok(id) = i64::try_from(id) else {
            return Ok(None);
        };

        let record = self
            .conn
            .query_row(
                "SELECT id, name, category, daily_rate, deposit, location, owner
                 FROM equipment WHERE id = ?1",
                params![id],
                record_from_row,
            )
            .optional()?;

        Ok(record)
    }

    fn all(&self) -> RegistryResult<Vec<EquipmentRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, category, daily_rate, deposit, location, owner
             FROM equipment ORDER BY id ASC",
        )?;

        let records = stmt
            .query_map([], record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count(&self) -> RegistryResult<usize> {
        let count = verify_count(&self.conn)?;
        Ok(usize::try_from(count).context("Negative equipment count")?)
    }

    fn events_for(&self, id: u64) -> RegistryResult<Vec<Event>> {
        Ok(get_events_for_entity(&self.conn, EQUIPMENT_ENTITY, &id.to_string())?)
    }
}
