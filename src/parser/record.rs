use rusqlite::types::{ToSql, ToSqlOutput, Value};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A dynamically typed value bound into generated statements
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl SqlValue {
    /// Render the value the way it would appear in a record file cell
    pub fn to_plain_string(&self) -> Option<String> {
        match self {
            SqlValue::Null => None,
            SqlValue::Integer(i) => Some(i.to_string()),
            SqlValue::Real(f) => Some(f.to_string()),
            SqlValue::Text(s) => Some(s.clone()),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Null => ToSqlOutput::Owned(Value::Null),
            SqlValue::Integer(i) => ToSqlOutput::from(*i),
            SqlValue::Real(f) => ToSqlOutput::from(*f),
            SqlValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(v.into())
    }
}

impl From<u32> for SqlValue {
    fn from(v: u32) -> Self {
        SqlValue::Integer(v.into())
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// A row of the inventory spreadsheet exactly as read, every cell optional text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawRecord {
    #[serde(rename = "File #")]
    pub file_num: Option<String>,
    #[serde(rename = "Box")]
    pub box_num: Option<String>,
    #[serde(rename = "Total")]
    pub total: Option<String>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "API")]
    pub api: Option<String>,
    #[serde(rename = "Operator")]
    pub operator: Option<String>,
    #[serde(rename = "Lease")]
    pub lease: Option<String>,
    #[serde(rename = "Well #")]
    pub well_num: Option<String>,
    #[serde(rename = "Sec")]
    pub sec: Option<String>,
    #[serde(rename = "Tw")]
    pub twn: Option<String>,
    #[serde(rename = "TwD")]
    pub twn_d: Option<String>,
    #[serde(rename = "Rg")]
    pub rng: Option<String>,
    #[serde(rename = "RgD")]
    pub rng_d: Option<String>,
    #[serde(rename = "Quarter")]
    pub qq: Option<String>,
    #[serde(rename = "Latitude")]
    pub lat: Option<String>,
    #[serde(rename = "Longitude")]
    pub long: Option<String>,
    #[serde(rename = "County")]
    pub county: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Formation")]
    pub formation: Option<String>,
    #[serde(rename = "Field")]
    pub field: Option<String>,
    #[serde(rename = "Top")]
    pub top: Option<String>,
    #[serde(rename = "Bottom")]
    pub bottom: Option<String>,
    #[serde(rename = "Type")]
    pub sample_type: Option<String>,
    #[serde(rename = "Box Type")]
    pub box_type: Option<String>,
    #[serde(rename = "Condition")]
    pub condition: Option<String>,
    #[serde(rename = "Diameter")]
    pub diameter: Option<String>,
    #[serde(rename = "Restrictions")]
    pub restrictions: Option<String>,
    #[serde(rename = "Comments")]
    pub comments: Option<String>,
}

impl RawRecord {
    /// File number used for grouping; blank cells group under ""
    pub fn file_key(&self) -> &str {
        self.file_num.as_deref().map(str::trim).unwrap_or("")
    }
}

/// A row of the cleaned record file with identifiers coerced to their types.
///
/// Field order is the column order of the cleaned record file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "File #")]
    pub file_num: String,
    #[serde(rename = "Box")]
    pub box_num: Option<u32>,
    #[serde(rename = "Total")]
    pub total: Option<u32>,
    #[serde(rename = "Location")]
    pub location: Option<String>,
    #[serde(rename = "API")]
    pub api: i64,
    #[serde(rename = "Operator")]
    pub operator: Option<String>,
    #[serde(rename = "Lease")]
    pub lease: Option<String>,
    #[serde(rename = "Well #")]
    pub well_num: Option<String>,
    #[serde(rename = "Sec")]
    pub sec: Option<i32>,
    #[serde(rename = "Tw")]
    pub twn: Option<i32>,
    #[serde(rename = "TwD")]
    pub twn_d: Option<String>,
    #[serde(rename = "Rg")]
    pub rng: Option<i32>,
    #[serde(rename = "RgD")]
    pub rng_d: Option<String>,
    #[serde(rename = "Quarter")]
    pub qq: Option<String>,
    #[serde(rename = "Latitude")]
    pub lat: Option<f64>,
    #[serde(rename = "Longitude")]
    pub long: Option<f64>,
    #[serde(rename = "County")]
    pub county: Option<String>,
    #[serde(rename = "State")]
    pub state: Option<String>,
    #[serde(rename = "Formation")]
    pub formation: Option<String>,
    #[serde(rename = "Field")]
    pub field: Option<String>,
    #[serde(rename = "Top")]
    pub top: Option<String>,
    #[serde(rename = "Bottom")]
    pub bottom: Option<String>,
    #[serde(rename = "Type")]
    pub sample_type: Option<String>,
    #[serde(rename = "Box Type")]
    pub box_type: Option<String>,
    #[serde(rename = "Condition")]
    pub condition: Option<String>,
    #[serde(rename = "Diameter")]
    pub diameter: Option<String>,
    #[serde(rename = "Restrictions")]
    pub restrictions: Option<String>,
    #[serde(rename = "Comments")]
    pub comments: Option<String>,
}

impl Record {
    /// Coerce a raw spreadsheet row. API, Sec, Tw, Rg, Box and Total must be
    /// well formed when present; Latitude/Longitude fall back to null.
    pub fn from_raw(raw: &RawRecord) -> Result<Self> {
        let file_num = raw.file_key();
        if file_num.is_empty() {
            return Err(Error::malformed("", "File #", raw.file_num.as_deref().unwrap_or("")));
        }

        let api_text = raw.api.as_deref().unwrap_or("");
        let api = parse_api(api_text).ok_or_else(|| Error::malformed(file_num, "API", api_text))?;

        Ok(Self {
            file_num: file_num.to_string(),
            box_num: parse_count_field(file_num, "Box", raw.box_num.as_deref())?,
            total: parse_count_field(file_num, "Total", raw.total.as_deref())?,
            location: raw.location.clone(),
            api,
            operator: raw.operator.clone(),
            lease: raw.lease.clone(),
            well_num: raw.well_num.clone(),
            sec: parse_int_field(file_num, "Sec", raw.sec.as_deref())?,
            twn: parse_int_field(file_num, "Tw", raw.twn.as_deref())?,
            twn_d: raw.twn_d.clone(),
            rng: parse_int_field(file_num, "Rg", raw.rng.as_deref())?,
            rng_d: raw.rng_d.clone(),
            qq: raw.qq.clone(),
            lat: parse_lenient_float(raw.lat.as_deref()),
            long: parse_lenient_float(raw.long.as_deref()),
            county: raw.county.clone(),
            state: raw.state.clone(),
            formation: raw.formation.clone(),
            field: raw.field.clone(),
            top: raw.top.clone(),
            bottom: raw.bottom.clone(),
            sample_type: raw.sample_type.clone(),
            box_type: raw.box_type.clone(),
            condition: raw.condition.clone(),
            diameter: raw.diameter.clone(),
            restrictions: raw.restrictions.clone(),
            comments: raw.comments.clone(),
        })
    }

    /// Neither a box position nor a box count
    pub fn is_boxless(&self) -> bool {
        self.box_num.is_none() && self.total.is_none()
    }

    /// Look up a cell by its record-file column header
    pub fn value(&self, column: &str) -> Option<SqlValue> {
        let value = match column {
            "File #" => SqlValue::from(self.file_num.as_str()),
            "Box" => self.box_num.into(),
            "Total" => self.total.into(),
            "Location" => self.location.clone().into(),
            "API" => self.api.into(),
            "Operator" => self.operator.clone().into(),
            "Lease" => self.lease.clone().into(),
            "Well #" => self.well_num.clone().into(),
            "Sec" => self.sec.into(),
            "Tw" => self.twn.into(),
            "TwD" => self.twn_d.clone().into(),
            "Rg" => self.rng.into(),
            "RgD" => self.rng_d.clone().into(),
            "Quarter" => self.qq.clone().into(),
            "Latitude" => self.lat.into(),
            "Longitude" => self.long.into(),
            "County" => self.county.clone().into(),
            "State" => self.state.clone().into(),
            "Formation" => self.formation.clone().into(),
            "Field" => self.field.clone().into(),
            "Top" => parse_lenient_float(self.top.as_deref()).into(),
            "Bottom" => parse_lenient_float(self.bottom.as_deref()).into(),
            "Type" => self.sample_type.clone().into(),
            "Box Type" => self.box_type.clone().into(),
            "Condition" => self.condition.clone().into(),
            "Diameter" => self.diameter.clone().into(),
            "Restrictions" => self.restrictions.clone().into(),
            "Comments" => self.comments.clone().into(),
            _ => return None,
        };
        Some(value)
    }
}

/// API numbers are decimal digits only
pub fn parse_api(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Non-negative integer, also accepting integral float spellings like "3.0"
pub fn parse_count(text: &str) -> Option<u32> {
    let text = text.trim();
    if let Ok(n) = text.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = text.parse().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= f64::from(u32::MAX) {
        Some(f as u32)
    } else {
        None
    }
}

/// Float coercion where failure means null
pub fn parse_lenient_float(text: Option<&str>) -> Option<f64> {
    text.and_then(|t| t.trim().parse::<f64>().ok())
        .filter(|f| f.is_finite())
}

fn is_blank(text: Option<&str>) -> bool {
    text.map_or(true, |t| t.trim().is_empty())
}

fn parse_count_field(file_num: &str, field: &'static str, text: Option<&str>) -> Result<Option<u32>> {
    match text {
        _ if is_blank(text) => Ok(None),
        Some(t) => parse_count(t)
            .map(Some)
            .ok_or_else(|| Error::malformed(file_num, field, t)),
        None => Ok(None),
    }
}

fn parse_int_field(file_num: &str, field: &'static str, text: Option<&str>) -> Result<Option<i32>> {
    match text {
        _ if is_blank(text) => Ok(None),
        Some(t) => {
            let trimmed = t.trim();
            let parsed = trimmed.parse::<i32>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && f.abs() <= f64::from(i32::MAX))
                    .map(|f| f as i32)
            });
            parsed
                .map(Some)
                .ok_or_else(|| Error::malformed(file_num, field, t))
        }
        None => Ok(None),
    }
}
