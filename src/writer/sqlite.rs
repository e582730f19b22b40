use anyhow::{Context, Result};
use indexmap::IndexMap;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use super::schema_gen::{generate_create_table, generate_indexes, generate_insert};
use crate::parser::{read_records, Record, SqlValue};
use crate::schema::{TableSchema, ALL_TABLES, BOX, FILE, WELL, WELL_FILE};
use crate::store::BoxNum;
use crate::ui::{Phase, Tally, Ui};

/// Collection name given to files when none is configured
pub const DEFAULT_COLLECTION: &str = "OLD CORE";

/// Outcome of a bulk load
#[derive(Debug, Default)]
pub struct LoadReport {
    pub wells: usize,
    pub files: usize,
    pub boxes: usize,
    /// One line per file (or well) that was rolled back
    pub failures: Vec<String>,
}

impl LoadReport {
    pub fn summary(&self) -> String {
        format!(
            "{} wells, {} files, {} boxes loaded; {} failures",
            self.wells,
            self.files,
            self.boxes,
            self.failures.len()
        )
    }

    pub fn tally(&self) -> Tally {
        Tally {
            wells: self.wells,
            files: self.files,
            boxes: self.boxes,
        }
    }
}

/// Connection settings every handle on a store uses
pub fn configure_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;
    Ok(())
}

/// Create any missing tables and indexes
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    for schema in ALL_TABLES {
        conn.execute(&generate_create_table(schema), [])?;
        for index_sql in generate_indexes(schema) {
            conn.execute(&index_sql, [])?;
        }
    }
    Ok(())
}

pub struct SqliteWriter {
    conn: Connection,
}

impl SqliteWriter {
    pub fn new(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path).context("Failed to open database")?;
        configure_connection(&conn).context("Failed to configure database")?;
        Ok(Self { conn })
    }

    pub fn create_tables(&self) -> Result<()> {
        create_schema(&self.conn).context("Failed to create tables")
    }

    /// Empty every table, children first
    pub fn clear_tables(&self) -> Result<()> {
        for schema in ALL_TABLES.iter().rev() {
            self.conn
                .execute(&format!("DELETE FROM {}", schema.name), [])
                .with_context(|| format!("Failed to clear table: {}", schema.name))?;
        }
        Ok(())
    }

    /// Load cleaned records, one transaction per well and one savepoint per file.
    ///
    /// A file that fails is rolled back and reported; loading carries on with
    /// the next file.
    pub fn load_records(
        &mut self,
        records: &[Record],
        collection: &str,
        ui: &mut impl Ui,
    ) -> Result<LoadReport> {
        let mut wells: IndexMap<i64, IndexMap<&str, Vec<&Record>>> = IndexMap::new();
        for record in records {
            wells
                .entry(record.api)
                .or_default()
                .entry(record.file_num.as_str())
                .or_default()
                .push(record);
        }

        let total_wells = wells.len();
        let mut report = LoadReport::default();

        for (done, (api, files)) in wells.iter().enumerate() {
            let mut tx = self.conn.transaction()?;

            // Well attributes come from the first row seen for the API
            let Some(first) = files.values().flatten().next() else {
                continue;
            };
            if let Err(err) = insert_row(&tx, &WELL, &record_row(&WELL, first)) {
                let line = format!("error: well {}: {}", api, err);
                tracing::warn!(api, error = %err, "well not loaded");
                ui.file_failed(&line);
                report.failures.push(line);
                ui.well_loaded(done + 1, total_wells, report.tally());
                continue;
            }
            report.wells += 1;

            for (file_num, rows) in files {
                let sp = tx.savepoint()?;
                match load_file(&sp, *api, rows, collection) {
                    Ok(boxes) => {
                        sp.commit()?;
                        report.files += 1;
                        report.boxes += boxes;
                    }
                    Err(err) => {
                        drop(sp);
                        let line = format!(
                            "error: file {} (api {}, {} rows): {}",
                            file_num,
                            api,
                            rows.len(),
                            err
                        );
                        tracing::warn!(file = *file_num, api, error = %err, "file not loaded");
                        ui.file_failed(&line);
                        report.failures.push(line);
                    }
                }
            }

            tx.commit()?;
            ui.well_loaded(done + 1, total_wells, report.tally());
        }

        Ok(report)
    }

    pub fn finalize(self) -> Result<()> {
        self.conn.execute_batch("PRAGMA optimize;")?;
        Ok(())
    }
}

/// Insert one File with its Well_File link and all of its boxes
fn load_file(
    conn: &Connection,
    api: i64,
    rows: &[&Record],
    collection: &str,
) -> crate::Result<usize> {
    let first = rows[0];

    let mut file_row = record_row(&FILE, first);
    set(&mut file_row, "collection", SqlValue::from(collection));
    set(&mut file_row, "box_count", SqlValue::from(rows.len() as i64));
    insert_row(conn, &FILE, &file_row)?;

    insert_row(
        conn,
        &WELL_FILE,
        &[
            ("api", SqlValue::Integer(api)),
            ("file_num", SqlValue::from(first.file_num.as_str())),
        ],
    )?;

    let mut unnumbered = 0;
    for record in rows {
        let box_num = match record.box_num {
            Some(n) => BoxNum::Numbered(n),
            None => {
                unnumbered += 1;
                BoxNum::Unnumbered(unnumbered)
            }
        };
        let mut box_row = record_row(&BOX, record);
        set(&mut box_row, "box_num", SqlValue::from(box_num));
        insert_row(conn, &BOX, &box_row)?;
    }

    Ok(rows.len())
}

/// Column values for a table taken from a record through each column's `csv_field`
fn record_row(schema: &TableSchema, record: &Record) -> Vec<(&'static str, SqlValue)> {
    schema
        .columns
        .iter()
        .filter_map(|col| {
            let field = col.csv_field?;
            Some((col.name, record.value(field).unwrap_or(SqlValue::Null)))
        })
        .collect()
}

fn set(row: &mut Vec<(&'static str, SqlValue)>, column: &'static str, value: SqlValue) {
    match row.iter_mut().find(|(name, _)| *name == column) {
        Some(slot) => slot.1 = value,
        None => row.push((column, value)),
    }
}

pub(crate) fn insert_row(
    conn: &Connection,
    schema: &TableSchema,
    row: &[(&'static str, SqlValue)],
) -> crate::Result<()> {
    let columns: Vec<&str> = row.iter().map(|(name, _)| *name).collect();
    let sql = generate_insert(schema, &columns);
    tracing::debug!(%sql, "insert");
    let mut stmt = conn.prepare_cached(&sql)?;
    stmt.execute(params_from_iter(row.iter().map(|(_, value)| value)))?;
    Ok(())
}

/// Read a cleaned record file and load it into a fresh copy of the store
pub fn build_database(
    cleaned: &Path,
    db_path: &Path,
    collection: &str,
    ui: &mut impl Ui,
) -> Result<LoadReport> {
    ui.set_phase(Phase::Reading);
    ui.set_source(cleaned);
    let records = read_records(cleaned)
        .with_context(|| format!("Failed to read cleaned records: {:?}", cleaned))?;
    ui.note(&format!("Read {} cleaned rows", records.len()));

    ui.set_phase(Phase::Loading);
    let mut writer = SqliteWriter::new(db_path)?;
    writer.create_tables()?;
    writer.clear_tables()?;
    let report = writer.load_records(&records, collection, ui)?;
    writer.finalize()?;

    tracing::info!(
        wells = report.wells,
        files = report.files,
        boxes = report.boxes,
        failed = report.failures.len(),
        "load complete"
    );
    Ok(report)
}
