use rusqlite::Row;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::parser::SqlValue;

/// A box number: declared (`7`) or a placeholder for an unnumbered box (`N-3`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoxNum {
    Numbered(u32),
    Unnumbered(u32),
}

impl fmt::Display for BoxNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoxNum::Numbered(n) => write!(f, "{}", n),
            BoxNum::Unnumbered(k) => write!(f, "N-{}", k),
        }
    }
}

impl FromStr for BoxNum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (make, digits): (fn(u32) -> BoxNum, &str) = match s.strip_prefix("N-") {
            Some(rest) => (BoxNum::Unnumbered, rest),
            None => (BoxNum::Numbered, s),
        };
        match digits.parse::<u32>() {
            Ok(n) if n > 0 && digits.bytes().all(|b| b.is_ascii_digit()) => Ok(make(n)),
            _ => Err(Error::InvalidArgument(format!("box number {:?}", s))),
        }
    }
}

impl From<BoxNum> for SqlValue {
    fn from(v: BoxNum) -> Self {
        SqlValue::Text(v.to_string())
    }
}

/// Key of a stored box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxKey {
    pub file_num: String,
    pub box_num: BoxNum,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Well {
    pub api: i64,
    pub operator: Option<String>,
    pub lease: Option<String>,
    pub well_num: Option<String>,
    pub sec: Option<i64>,
    pub twn: Option<i64>,
    pub twn_d: Option<String>,
    pub rng: Option<i64>,
    pub rng_d: Option<String>,
    pub qq: Option<String>,
    pub lat: Option<f64>,
    pub long: Option<f64>,
    pub county: Option<String>,
    pub state: Option<String>,
    pub field: Option<String>,
}

impl Well {
    /// Number of columns read by `from_row`
    pub const WIDTH: usize = 15;

    pub(crate) fn from_row(row: &Row, at: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            api: row.get(at)?,
            operator: row.get(at + 1)?,
            lease: row.get(at + 2)?,
            well_num: row.get(at + 3)?,
            sec: row.get(at + 4)?,
            twn: row.get(at + 5)?,
            twn_d: row.get(at + 6)?,
            rng: row.get(at + 7)?,
            rng_d: row.get(at + 8)?,
            qq: row.get(at + 9)?,
            lat: row.get(at + 10)?,
            long: row.get(at + 11)?,
            county: row.get(at + 12)?,
            state: row.get(at + 13)?,
            field: row.get(at + 14)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreFile {
    pub file_num: String,
    pub collection: Option<String>,
    pub sample_type: Option<String>,
    pub box_count: Option<i64>,
    pub box_type: Option<String>,
    pub diameter: Option<String>,
    pub location: Option<String>,
    pub boxes: Vec<CoreBox>,
}

impl CoreFile {
    pub const WIDTH: usize = 7;

    pub(crate) fn from_row(row: &Row, at: usize) -> rusqlite::Result<Option<Self>> {
        let Some(file_num) = row.get::<_, Option<String>>(at)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            file_num,
            collection: row.get(at + 1)?,
            sample_type: row.get(at + 2)?,
            box_count: row.get(at + 3)?,
            box_type: row.get(at + 4)?,
            diameter: row.get(at + 5)?,
            location: row.get(at + 6)?,
            boxes: Vec::new(),
        }))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoreBox {
    pub file_num: String,
    pub box_num: String,
    pub top: Option<f64>,
    pub bottom: Option<f64>,
    pub formation: Option<String>,
    pub condition: Option<String>,
    pub comments: Option<String>,
}

impl CoreBox {
    pub const WIDTH: usize = 7;

    pub(crate) fn from_row(row: &Row, at: usize) -> rusqlite::Result<Option<Self>> {
        let Some(file_num) = row.get::<_, Option<String>>(at)? else {
            return Ok(None);
        };
        Ok(Some(Self {
            file_num,
            box_num: row.get(at + 1)?,
            top: row.get(at + 2)?,
            bottom: row.get(at + 3)?,
            formation: row.get(at + 4)?,
            condition: row.get(at + 5)?,
            comments: row.get(at + 6)?,
        }))
    }
}

/// One search hit: a well with the files reachable from it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WellEntry {
    pub well: Well,
    pub files: Vec<CoreFile>,
}
