use rusqlite::{params, Connection};
use std::fmt;
use std::str::FromStr;

use super::model::{CoreBox, CoreFile, Well, WellEntry};
use crate::error::{Error, Result};
use crate::parser::{parse_api, SqlValue};
use crate::schema::{TableSchema, BOX, FILE, WELL};

/// What a search value is matched against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Exact `File.file_num`
    File,
    /// Exact `Well.api`
    Api,
    /// Exact `Well.well_num`
    Well,
    /// Substring of `Well.operator`
    Operator,
    /// Substring of `Well.lease`
    Lease,
    /// Substring of `Box.formation`
    Formation,
}

impl SearchKind {
    pub const ALL: &'static [SearchKind] = &[
        SearchKind::File,
        SearchKind::Api,
        SearchKind::Well,
        SearchKind::Operator,
        SearchKind::Lease,
        SearchKind::Formation,
    ];

    fn name(self) -> &'static str {
        match self {
            SearchKind::File => "FILE",
            SearchKind::Api => "API",
            SearchKind::Well => "WELL",
            SearchKind::Operator => "OPERATOR",
            SearchKind::Lease => "LEASE",
            SearchKind::Formation => "FORMATION",
        }
    }

    fn condition(self) -> &'static str {
        match self {
            SearchKind::File => "File.\"file_num\" = ?1",
            SearchKind::Api => "Well.\"api\" = ?1",
            SearchKind::Well => "Well.\"well_num\" = ?1",
            SearchKind::Operator => "Well.\"operator\" LIKE ?1 ESCAPE '\\'",
            SearchKind::Lease => "Well.\"lease\" LIKE ?1 ESCAPE '\\'",
            SearchKind::Formation => "Box.\"formation\" LIKE ?1 ESCAPE '\\'",
        }
    }

    /// Bound parameter for a user-supplied value
    fn parameter(self, value: &str) -> Result<SqlValue> {
        match self {
            SearchKind::Api => parse_api(value)
                .map(SqlValue::Integer)
                .ok_or_else(|| Error::malformed("", "API", value)),
            SearchKind::File | SearchKind::Well => Ok(SqlValue::from(value)),
            SearchKind::Operator | SearchKind::Lease | SearchKind::Formation => {
                Ok(SqlValue::Text(format!("%{}%", escape_like(value))))
            }
        }
    }
}

impl fmt::Display for SearchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SearchKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SearchKind::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidArgument(format!("unknown search kind: {:?}", s)))
    }
}

fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn select_list(alias: &str, schema: &TableSchema) -> Vec<String> {
    schema
        .columns
        .iter()
        .map(|c| format!("{}.\"{}\"", alias, c.name))
        .collect()
}

/// Flat join of every well with its files and boxes, filtered by `kind`
pub(crate) fn search_sql(kind: SearchKind) -> String {
    let mut columns = select_list("Well", &WELL);
    columns.extend(select_list("File", &FILE));
    columns.extend(select_list("Box", &BOX));

    format!(
        "SELECT {}
         FROM Well
         LEFT JOIN Well_File ON Well_File.\"api\" = Well.\"api\"
         LEFT JOIN File ON File.\"file_num\" = Well_File.\"file_num\"
         LEFT JOIN Box ON Box.\"file_num\" = File.\"file_num\"
         WHERE {}
         ORDER BY Well.\"api\", Well_File.rowid, Box.rowid",
        columns.join(", "),
        kind.condition()
    )
}

pub(crate) fn search(conn: &Connection, kind: SearchKind, value: &str) -> Result<Vec<WellEntry>> {
    let param = kind.parameter(value)?;
    let sql = search_sql(kind);
    tracing::debug!(%kind, value, "search");

    let mut stmt = conn.prepare_cached(&sql)?;
    let mut rows = stmt.query(params![param])?;

    let file_at = Well::WIDTH;
    let box_at = file_at + CoreFile::WIDTH;
    let mut entries: Vec<WellEntry> = Vec::new();

    while let Some(row) = rows.next()? {
        let api: i64 = row.get(0)?;
        if entries.last().map(|e| e.well.api) != Some(api) {
            entries.push(WellEntry {
                well: Well::from_row(row, 0)?,
                files: Vec::new(),
            });
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };

        let Some(file) = CoreFile::from_row(row, file_at)? else {
            continue;
        };
        if entry.files.last().map(|f| f.file_num.as_str()) != Some(file.file_num.as_str()) {
            entry.files.push(file);
        }

        if let (Some(core_box), Some(file)) = (CoreBox::from_row(row, box_at)?, entry.files.last_mut()) {
            file.boxes.push(core_box);
        }
    }

    Ok(entries)
}
