use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OptionalExtension, params};

use crate::model::PartRow;
use crate::util::now_utc_string;

use super::records::{MeasurementRecord, MeasurementTable};

pub(crate) const DB_SCHEMA_VERSION: &str = "1.0.0";
const BUSY_TIMEOUT: Duration = Duration::from_secs(30);

const COUNTED_TABLES: [&str; 5] = [
    "materials",
    "parts",
    "part_characteristics",
    "benchtop_filament_diameter",
    "material_thermal_characteristics",
];

/// Opens (creating if needed) the store and brings its schema up to date.
pub(crate) fn open_store(db_path: &Path) -> Result<Connection> {
    let connection = Connection::open(db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)
        .with_context(|| format!("failed to configure {}", db_path.display()))?;
    ensure_schema(&connection)
        .with_context(|| format!("failed to initialize schema in {}", db_path.display()))?;
    Ok(connection)
}

/// Opens an existing store for reads; never creates one.
pub(crate) fn open_existing_store(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        bail!("database not found: {}", db_path.display());
    }
    open_store(db_path)
}

pub(crate) fn configure_connection(connection: &Connection) -> rusqlite::Result<()> {
    let _mode: String =
        connection.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    connection.pragma_update(None, "synchronous", "NORMAL")?;
    connection.pragma_update(None, "foreign_keys", "ON")?;
    connection.busy_timeout(BUSY_TIMEOUT)?;
    Ok(())
}

pub(crate) fn ensure_schema(connection: &Connection) -> rusqlite::Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS materials (
          material_id TEXT PRIMARY KEY,
          vendor TEXT
        );

        CREATE TABLE IF NOT EXISTS parts (
          part_id TEXT PRIMARY KEY COLLATE NOCASE,
          material_id TEXT NOT NULL,
          vendor TEXT,
          part_type TEXT,
          FOREIGN KEY(material_id) REFERENCES materials(material_id)
        );

        CREATE TABLE IF NOT EXISTS part_characteristics (
          part_id TEXT NOT NULL COLLATE NOCASE,
          time_elapsed TEXT NOT NULL,
          characteristic_name TEXT NOT NULL,
          characteristic_value TEXT,
          FOREIGN KEY(part_id) REFERENCES parts(part_id)
        );

        CREATE TABLE IF NOT EXISTS benchtop_filament_diameter (
          part_id TEXT NOT NULL COLLATE NOCASE,
          position TEXT NOT NULL,
          characteristic_name TEXT NOT NULL,
          characteristic_value TEXT,
          FOREIGN KEY(part_id) REFERENCES parts(part_id)
        );

        CREATE TABLE IF NOT EXISTS material_thermal_characteristics (
          material_id TEXT NOT NULL,
          run_label TEXT,
          time_elapsed TEXT NOT NULL,
          characteristic_name TEXT NOT NULL,
          characteristic_value TEXT,
          FOREIGN KEY(material_id) REFERENCES materials(material_id)
        );

        CREATE INDEX IF NOT EXISTS idx_parts_material ON parts(material_id);
        CREATE INDEX IF NOT EXISTS idx_part_characteristics_part ON part_characteristics(part_id, characteristic_name);
        CREATE INDEX IF NOT EXISTS idx_benchtop_diameter_part ON benchtop_filament_diameter(part_id, characteristic_name);
        CREATE INDEX IF NOT EXISTS idx_thermal_material ON material_thermal_characteristics(material_id, characteristic_name);
        ",
    )?;

    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now_utc_string()],
    )?;

    Ok(())
}

/// Insert-or-ignore. Returns whether a new row was written.
pub(crate) fn ensure_material(
    connection: &Connection,
    material_id: &str,
    vendor: &str,
) -> rusqlite::Result<bool> {
    let inserted = connection.execute(
        "INSERT INTO materials(material_id, vendor) VALUES(?1, ?2)
         ON CONFLICT(material_id) DO NOTHING",
        params![material_id, vendor],
    )?;
    Ok(inserted > 0)
}

/// Insert-or-ignore keyed on `part_id` (case-insensitive). The material must
/// already exist; the foreign key rejects the part otherwise.
pub(crate) fn ensure_part(
    connection: &Connection,
    part_id: &str,
    material_id: &str,
    vendor: &str,
    part_type: &str,
) -> rusqlite::Result<bool> {
    let inserted = connection.execute(
        "INSERT INTO parts(part_id, material_id, vendor, part_type) VALUES(?1, ?2, ?3, ?4)
         ON CONFLICT(part_id) DO NOTHING",
        params![part_id, material_id, vendor, part_type],
    )?;
    Ok(inserted > 0)
}

/// Appends every record for `owner_id`. Rows are never deduplicated, so
/// ingesting the same file twice stores its measurements twice.
pub(crate) fn insert_measurements(
    connection: &Connection,
    table: MeasurementTable,
    owner_id: &str,
    records: &[MeasurementRecord],
) -> rusqlite::Result<usize> {
    let mut statement = connection.prepare_cached(table.insert_sql())?;

    for record in records {
        if table.carries_run_label() {
            statement.execute(params![
                owner_id,
                &record.index,
                &record.characteristic_name,
                &record.characteristic_value,
                &record.run_label,
            ])?;
        } else {
            statement.execute(params![
                owner_id,
                &record.index,
                &record.characteristic_name,
                &record.characteristic_value,
            ])?;
        }
    }

    Ok(records.len())
}

/// `part_id` as first stored, whatever casing the caller used.
pub(crate) fn stored_part_id(connection: &Connection, part_id: &str) -> rusqlite::Result<String> {
    connection.query_row(
        "SELECT part_id FROM parts WHERE part_id = ?1",
        [part_id],
        |row| row.get(0),
    )
}

pub(crate) fn list_materials(connection: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut statement =
        connection.prepare("SELECT material_id FROM materials ORDER BY material_id ASC")?;
    let rows = statement.query_map([], |row| row.get(0))?;
    rows.collect()
}

pub(crate) fn list_parts(connection: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut statement = connection.prepare("SELECT part_id FROM parts ORDER BY part_id ASC")?;
    let rows = statement.query_map([], |row| row.get(0))?;
    rows.collect()
}

pub(crate) fn find_part(
    connection: &Connection,
    part_id: &str,
) -> rusqlite::Result<Option<PartRow>> {
    connection
        .query_row(
            "SELECT part_id, material_id, vendor, part_type FROM parts WHERE part_id = ?1",
            [part_id],
            |row| {
                Ok(PartRow {
                    part_id: row.get(0)?,
                    material_id: row.get(1)?,
                    vendor: row.get(2)?,
                    part_type: row.get(3)?,
                })
            },
        )
        .optional()
}

pub(crate) fn schema_version(connection: &Connection) -> rusqlite::Result<Option<String>> {
    connection
        .query_row(
            "SELECT value FROM metadata WHERE key = 'db_schema_version'",
            [],
            |row| row.get(0),
        )
        .optional()
}

pub(crate) fn table_counts(connection: &Connection) -> rusqlite::Result<Vec<(&'static str, i64)>> {
    COUNTED_TABLES
        .iter()
        .map(|table| {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            let count = connection.query_row(&sql, [], |row| row.get(0))?;
            Ok((*table, count))
        })
        .collect()
}
