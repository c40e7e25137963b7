use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::{Mutex, MutexGuard};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};

use crate::machine::{Machine, MachineKind};
use crate::repository::{MachineRepository, RepositoryError};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SELECT_MACHINE: &str = "SELECT id, name, kind, make, model, cpu, ram_gb, storage_tb,
        location, serial, notes, created_at, updated_at
     FROM machines";

/// SQLite-backed store. The database runs in WAL mode with one connection for
/// writes and a separate query-only connection for reads, so a read sees the
/// last committed snapshot instead of waiting behind an open write
/// transaction. Writers that lose the race for the write lock wait up to
/// `BUSY_TIMEOUT` instead of failing.
pub struct SqliteMachineRepository {
    writer: Arc<Mutex<Connection>>,
    /// `None` for in-memory databases, which cannot be shared between
    /// connections; reads then go through the writer.
    reader: Option<Arc<Mutex<Connection>>>,
}

impl SqliteMachineRepository {
    pub fn open(path: &str) -> Result<Self, RepositoryError> {
        let writer = Connection::open(path).map_err(store_error)?;
        let mode: String = writer
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(store_error)?;
        writer.busy_timeout(BUSY_TIMEOUT).map_err(store_error)?;

        let reader = Connection::open(path).map_err(store_error)?;
        reader.busy_timeout(BUSY_TIMEOUT).map_err(store_error)?;
        reader
            .pragma_update(None, "query_only", true)
            .map_err(store_error)?;

        tracing::debug!(path, journal_mode = %mode, "opened machine store");
        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            reader: Some(Arc::new(Mutex::new(reader))),
        })
    }

    pub fn open_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory().map_err(store_error)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(conn)),
            reader: None,
        })
    }

    fn read_conn(&self) -> MutexGuard<'_, Connection> {
        self.reader.as_ref().unwrap_or(&self.writer).lock()
    }

    pub fn ensure_schema(&self) -> Result<(), RepositoryError> {
        let conn = self.writer.lock();
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS machines (
                id         TEXT PRIMARY KEY,
                name       TEXT NOT NULL CHECK (name <> ''),
                kind       TEXT NOT NULL,
                make       TEXT NOT NULL CHECK (make <> ''),
                model      TEXT NOT NULL CHECK (model <> ''),
                cpu        TEXT NOT NULL DEFAULT '',
                ram_gb     INTEGER NOT NULL DEFAULT 0,
                storage_tb REAL NOT NULL DEFAULT 0,
                location   TEXT NOT NULL DEFAULT '',
                serial     TEXT NOT NULL DEFAULT '',
                notes      TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_machines_kind ON machines(kind);
            CREATE INDEX IF NOT EXISTS idx_machines_name ON machines(name);",
        )
        .map_err(store_error)?;
        Ok(())
    }
}

impl MachineRepository for SqliteMachineRepository {
    fn create(&self, machine: &Machine) -> Result<(), RepositoryError> {
        let conn = self.writer.lock();
        conn.execute(
            "INSERT INTO machines (id, name, kind, make, model, cpu, ram_gb, storage_tb,
                location, serial, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            params![
                machine.id,
                machine.name,
                machine.kind.as_str(),
                machine.make,
                machine.model,
                machine.cpu,
                machine.ram_gb,
                machine.storage_tb,
                machine.location,
                machine.serial,
                machine.notes,
                format_timestamp(&machine.created_at),
                format_timestamp(&machine.updated_at),
            ],
        )
        .map_err(|err| {
            if is_primary_key_violation(&err) {
                RepositoryError::Conflict(machine.id.clone())
            } else {
                store_error(err)
            }
        })?;
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Machine>, RepositoryError> {
        let conn = self.read_conn();
        let row = conn
            .query_row(
                &format!("{SELECT_MACHINE} WHERE id = ?1"),
                params![id],
                MachineRow::from_row,
            )
            .optional()
            .map_err(store_error)?;
        row.map(MachineRow::into_machine).transpose()
    }

    fn list(&self, kind: Option<MachineKind>) -> Result<Vec<Machine>, RepositoryError> {
        let conn = self.read_conn();
        let rows = match kind {
            Some(kind) => {
                let mut stmt = conn
                    .prepare(&format!("{SELECT_MACHINE} WHERE kind = ?1"))
                    .map_err(store_error)?;
                let rows = stmt
                    .query_map(params![kind.as_str()], MachineRow::from_row)
                    .map_err(store_error)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(store_error)?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(SELECT_MACHINE).map_err(store_error)?;
                let rows = stmt
                    .query_map([], MachineRow::from_row)
                    .map_err(store_error)?
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(store_error)?;
                rows
            }
        };
        rows.into_iter().map(MachineRow::into_machine).collect()
    }

    fn update(&self, machine: &Machine) -> Result<(), RepositoryError> {
        let conn = self.writer.lock();
        let changed = conn
            .execute(
                "UPDATE machines
                 SET name = ?1, kind = ?2, make = ?3, model = ?4, cpu = ?5, ram_gb = ?6,
                     storage_tb = ?7, location = ?8, serial = ?9, notes = ?10, updated_at = ?11
                 WHERE id = ?12",
                params![
                    machine.name,
                    machine.kind.as_str(),
                    machine.make,
                    machine.model,
                    machine.cpu,
                    machine.ram_gb,
                    machine.storage_tb,
                    machine.location,
                    machine.serial,
                    machine.notes,
                    format_timestamp(&machine.updated_at),
                    machine.id,
                ],
            )
            .map_err(store_error)?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(machine.id.clone()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), RepositoryError> {
        let conn = self.writer.lock();
        let changed = conn
            .execute("DELETE FROM machines WHERE id = ?1", params![id])
            .map_err(store_error)?;
        if changed == 0 {
            return Err(RepositoryError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn ping(&self) -> Result<(), RepositoryError> {
        let conn = self.read_conn();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
            .map_err(store_error)?;
        Ok(())
    }
}

struct MachineRow {
    id: String,
    name: String,
    kind: String,
    make: String,
    model: String,
    cpu: String,
    ram_gb: i64,
    storage_tb: f64,
    location: String,
    serial: String,
    notes: String,
    created_at: String,
    updated_at: String,
}

impl MachineRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            kind: row.get(2)?,
            make: row.get(3)?,
            model: row.get(4)?,
            cpu: row.get(5)?,
            ram_gb: row.get(6)?,
            storage_tb: row.get(7)?,
            location: row.get(8)?,
            serial: row.get(9)?,
            notes: row.get(10)?,
            created_at: row.get(11)?,
            updated_at: row.get(12)?,
        })
    }

    fn into_machine(self) -> Result<Machine, RepositoryError> {
        let kind = self
            .kind
            .parse::<MachineKind>()
            .map_err(|err| RepositoryError::Serialization(format!("machine {}: {err}", self.id)))?;
        let created_at = parse_timestamp(&self.id, "created_at", &self.created_at)?;
        let updated_at = parse_timestamp(&self.id, "updated_at", &self.updated_at)?;
        Ok(Machine {
            id: self.id,
            name: self.name,
            kind,
            make: self.make,
            model: self.model,
            cpu: self.cpu,
            ram_gb: self.ram_gb,
            storage_tb: self.storage_tb,
            location: self.location,
            serial: self.serial,
            notes: self.notes,
            created_at,
            updated_at,
        })
    }
}

fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(id: &str, column: &str, value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|err| {
            RepositoryError::Serialization(format!("machine {id}: parse {column} {value:?}: {err}"))
        })
}

fn is_primary_key_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY
    )
}

fn store_error(err: rusqlite::Error) -> RepositoryError {
    RepositoryError::Store(err.to_string())
}
