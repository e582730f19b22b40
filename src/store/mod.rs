//! Access layer over a core sample store.
//!
//! Reads go straight to the database. Writes need an [`EditSession`] from
//! [`CoreStore::authorize`]; everything done under a session stays in one open
//! transaction until [`CoreStore::end_edit`] commits it, so other connections
//! see either none or all of an edit.

mod fields;
mod model;
mod search;

pub use fields::{BoxField, EntityField, Fields, FileField, WellField};
pub use model::{BoxKey, BoxNum, CoreBox, CoreFile, Well, WellEntry};
pub use search::SearchKind;

use rusqlite::{params, params_from_iter, Connection, OpenFlags, ToSql};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::parser::{parse_api, SqlValue};
use crate::schema::{TableSchema, BOX, FILE, WELL, WELL_FILE};
use crate::writer::{
    configure_connection, create_schema, generate_delete, generate_exists, generate_update,
    insert_row,
};

static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Write authorization for one edit on one store handle.
///
/// Becomes stale once the edit is committed or discarded.
#[derive(Debug, PartialEq, Eq)]
pub struct EditSession {
    id: u64,
}

pub struct CoreStore {
    conn: Connection,
    active: Option<u64>,
}

impl CoreStore {
    /// Open an existing store
    pub fn open(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::NotFound(format!("store {:?}", path)));
        }
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Self::from_connection(conn)
    }

    /// Open a store, creating the file and any missing tables
    pub fn create(path: &Path) -> Result<Self> {
        let store = Self::from_connection(Connection::open(path)?)?;
        create_schema(&store.conn)?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self::from_connection(Connection::open_in_memory()?)?;
        create_schema(&store.conn)?;
        Ok(store)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        configure_connection(&conn)?;
        Ok(Self { conn, active: None })
    }

    // ---------------------------------------------------------------------
    // Edit sessions
    // ---------------------------------------------------------------------

    /// Start an edit. While an edit is already open the same session is
    /// handed out again.
    pub fn authorize(&mut self) -> Result<EditSession> {
        if let Some(id) = self.active {
            return Ok(EditSession { id });
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        let id = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        self.active = Some(id);
        tracing::info!(session = id, "edit authorized");
        Ok(EditSession { id })
    }

    /// Commit everything done under `session` and revoke it
    pub fn end_edit(&mut self, session: &EditSession) -> Result<()> {
        self.check(session)?;
        self.conn.execute_batch("COMMIT")?;
        self.active = None;
        tracing::info!(session = session.id, "edit committed");
        Ok(())
    }

    /// Roll back everything done under `session` and revoke it
    pub fn discard_edit(&mut self, session: &EditSession) -> Result<()> {
        self.check(session)?;
        self.conn.execute_batch("ROLLBACK")?;
        self.active = None;
        tracing::info!(session = session.id, "edit discarded");
        Ok(())
    }

    fn check(&self, session: &EditSession) -> Result<()> {
        match self.active {
            Some(id) if id == session.id => Ok(()),
            _ => Err(Error::Unauthorized),
        }
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    /// Wells matching `value`, each with its files and their boxes
    pub fn search(&self, kind: SearchKind, value: &str) -> Result<Vec<WellEntry>> {
        search::search(&self.conn, kind, value)
    }

    fn exists(&self, schema: &TableSchema, key: &[&dyn ToSql]) -> Result<bool> {
        let sql = generate_exists(schema);
        Ok(self.conn.query_row(&sql, key, |row| row.get(0))?)
    }

    // ---------------------------------------------------------------------
    // Inserts
    // ---------------------------------------------------------------------

    pub fn add_well(&mut self, session: &EditSession, fields: &Fields<WellField>) -> Result<i64> {
        self.check(session)?;
        let api = required_api(fields.get(WellField::Api))?;
        if self.exists(&WELL, &[&api])? {
            return Err(Error::KeyConflict(format!("well {}", api)));
        }

        let mut row = fields.row()?;
        replace(&mut row, "api", SqlValue::Integer(api));

        let sp = self.conn.savepoint()?;
        insert_row(&sp, &WELL, &row)?;
        sp.commit()?;
        tracing::debug!(api, "well added");
        Ok(api)
    }

    /// Insert a file and link it to well `api`
    pub fn add_file(
        &mut self,
        session: &EditSession,
        api: i64,
        fields: &Fields<FileField>,
    ) -> Result<String> {
        self.check(session)?;
        let file_num = required_key(fields.get(FileField::FileNum), "file_num")?;
        if !self.exists(&WELL, &[&api])? {
            return Err(Error::ForeignKeyViolation(format!("no well with api {}", api)));
        }
        if self.exists(&FILE, &[&file_num])? {
            return Err(Error::KeyConflict(format!("file {}", file_num)));
        }

        let mut row = fields.row()?;
        replace(&mut row, "file_num", SqlValue::from(file_num.as_str()));
        row.push(("box_count", SqlValue::Integer(0)));

        let sp = self.conn.savepoint()?;
        insert_row(&sp, &FILE, &row)?;
        insert_row(
            &sp,
            &WELL_FILE,
            &[
                ("api", SqlValue::Integer(api)),
                ("file_num", SqlValue::from(file_num.as_str())),
            ],
        )?;
        sp.commit()?;
        tracing::debug!(api, file = %file_num, "file added");
        Ok(file_num)
    }

    /// Insert a box into file `file_num` and recount the file's boxes
    pub fn add_box(
        &mut self,
        session: &EditSession,
        file_num: &str,
        fields: &Fields<BoxField>,
    ) -> Result<BoxKey> {
        self.check(session)?;
        let box_num = required_box_num(file_num, fields.get(BoxField::BoxNum))?;
        if !self.exists(&FILE, &[&file_num])? {
            return Err(Error::ForeignKeyViolation(format!("no file {}", file_num)));
        }
        let box_text = box_num.to_string();
        if self.exists(&BOX, &[&file_num, &box_text])? {
            return Err(Error::KeyConflict(format!("box {} in file {}", box_num, file_num)));
        }

        let mut row = fields.row()?;
        replace(&mut row, "box_num", SqlValue::from(box_num));
        row.insert(0, ("file_num", SqlValue::from(file_num)));

        let sp = self.conn.savepoint()?;
        insert_row(&sp, &BOX, &row)?;
        recount_boxes(&sp, file_num)?;
        sp.commit()?;
        tracing::debug!(file = file_num, %box_num, "box added");
        Ok(BoxKey {
            file_num: file_num.to_string(),
            box_num,
        })
    }

    // ---------------------------------------------------------------------
    // Updates
    // ---------------------------------------------------------------------

    pub fn modify_well(
        &mut self,
        session: &EditSession,
        api: i64,
        fields: &Fields<WellField>,
    ) -> Result<()> {
        self.check(session)?;
        if !self.exists(&WELL, &[&api])? {
            return Err(Error::NotFound(format!("well {}", api)));
        }
        let mut row = fields.row()?;
        if let Some(new_api) = fields.get(WellField::Api) {
            replace(&mut row, "api", SqlValue::Integer(required_api(Some(new_api))?));
        }
        self.update(&WELL, row, vec![SqlValue::Integer(api)])
    }

    pub fn modify_file(
        &mut self,
        session: &EditSession,
        file_num: &str,
        fields: &Fields<FileField>,
    ) -> Result<()> {
        self.check(session)?;
        if !self.exists(&FILE, &[&file_num])? {
            return Err(Error::NotFound(format!("file {}", file_num)));
        }
        let mut row = fields.row()?;
        if let Some(new_num) = fields.get(FileField::FileNum) {
            let new_num = required_key(Some(new_num), "file_num")?;
            replace(&mut row, "file_num", SqlValue::Text(new_num));
        }
        self.update(&FILE, row, vec![SqlValue::from(file_num)])
    }

    pub fn modify_box(
        &mut self,
        session: &EditSession,
        file_num: &str,
        box_num: BoxNum,
        fields: &Fields<BoxField>,
    ) -> Result<()> {
        self.check(session)?;
        if !self.exists(&BOX, &[&file_num, &box_num.to_string()])? {
            return Err(Error::NotFound(format!("box {} in file {}", box_num, file_num)));
        }
        let mut row = fields.row()?;
        if let Some(new_num) = fields.get(BoxField::BoxNum) {
            let new_num = required_box_num(file_num, Some(new_num))?;
            replace(&mut row, "box_num", SqlValue::from(new_num));
        }
        self.update(
            &BOX,
            row,
            vec![SqlValue::from(file_num), SqlValue::from(box_num)],
        )
    }

    fn update(
        &mut self,
        schema: &TableSchema,
        row: Vec<(&'static str, SqlValue)>,
        key: Vec<SqlValue>,
    ) -> Result<()> {
        if row.is_empty() {
            return Ok(());
        }
        let columns: Vec<&str> = row.iter().map(|(name, _)| *name).collect();
        let sql = generate_update(schema, &columns);
        tracing::debug!(%sql, "update");

        let values = row.into_iter().map(|(_, v)| v).chain(key);
        let sp = self.conn.savepoint()?;
        sp.execute(&sql, params_from_iter(values))?;
        sp.commit()?;
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Deletes
    // ---------------------------------------------------------------------

    /// Delete a well. Fails with `ForeignKeyViolation` while files are linked to it.
    pub fn remove_well(&mut self, session: &EditSession, api: i64) -> Result<()> {
        self.check(session)?;
        if !self.exists(&WELL, &[&api])? {
            return Err(Error::NotFound(format!("well {}", api)));
        }
        let sp = self.conn.savepoint()?;
        sp.execute(&generate_delete(&WELL), params![api])?;
        sp.commit()?;
        Ok(())
    }

    /// Delete a file and its well links. Fails with `ForeignKeyViolation`
    /// while the file still holds boxes.
    pub fn remove_file(&mut self, session: &EditSession, file_num: &str) -> Result<()> {
        self.check(session)?;
        if !self.exists(&FILE, &[&file_num])? {
            return Err(Error::NotFound(format!("file {}", file_num)));
        }
        let sp = self.conn.savepoint()?;
        sp.execute(
            "DELETE FROM Well_File WHERE \"file_num\" = ?1",
            params![file_num],
        )?;
        sp.execute(&generate_delete(&FILE), params![file_num])?;
        sp.commit()?;
        Ok(())
    }

    pub fn remove_box(&mut self, session: &EditSession, file_num: &str, box_num: BoxNum) -> Result<()> {
        self.check(session)?;
        let box_text = box_num.to_string();
        if !self.exists(&BOX, &[&file_num, &box_text])? {
            return Err(Error::NotFound(format!("box {} in file {}", box_num, file_num)));
        }
        let sp = self.conn.savepoint()?;
        sp.execute(&generate_delete(&BOX), params![file_num, box_text])?;
        recount_boxes(&sp, file_num)?;
        sp.commit()?;
        Ok(())
    }
}

impl Drop for CoreStore {
    fn drop(&mut self) {
        if let Some(id) = self.active {
            tracing::warn!(session = id, "store closed with an open edit; changes discarded");
        }
    }
}

fn recount_boxes(conn: &Connection, file_num: &str) -> Result<()> {
    conn.execute(
        "UPDATE File SET \"box_count\" = (SELECT COUNT(*) FROM Box WHERE \"file_num\" = ?1)
         WHERE \"file_num\" = ?1",
        params![file_num],
    )?;
    Ok(())
}

fn replace(row: &mut [(&'static str, SqlValue)], column: &str, value: SqlValue) {
    if let Some(slot) = row.iter_mut().find(|(name, _)| *name == column) {
        slot.1 = value;
    }
}

fn required_api(value: Option<&SqlValue>) -> Result<i64> {
    match value {
        None | Some(SqlValue::Null) => Err(Error::MissingField("api")),
        Some(SqlValue::Integer(api)) => Ok(*api),
        Some(SqlValue::Text(text)) => {
            parse_api(text).ok_or_else(|| Error::malformed("", "api", text))
        }
        Some(SqlValue::Real(f)) => Err(Error::malformed("", "api", &f.to_string())),
    }
}

fn required_key(value: Option<&SqlValue>, field: &'static str) -> Result<String> {
    let text = value
        .and_then(SqlValue::to_plain_string)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(Error::MissingField(field));
    }
    Ok(text)
}

fn required_box_num(file_num: &str, value: Option<&SqlValue>) -> Result<BoxNum> {
    let text = required_key(value, "box_num")?;
    text.parse()
        .map_err(|_| Error::malformed(file_num, "box_num", &text))
}
