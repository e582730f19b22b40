
use crate::error::{Error, Result};
use crate::parser::SqlValue;

/// Column storage class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

impl ColumnType {
    pub fn sql(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
    /// Cleaned record file header this column is loaded from, if any
    pub csv_field: Option<&'static str>,
    /// Unconvertible values are stored as null rather than rejected
    pub lenient: bool,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
            csv_field: None,
            lenient: false,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
            csv_field: None,
            lenient: false,
        }
    }

    /// Set the record file header the column is read from
    pub const fn csv(self, field: &'static str) -> Self {
        Self {
            csv_field: Some(field),
            ..self
        }
    }

    pub const fn lenient(self) -> Self {
        Self {
            lenient: true,
            ..self
        }
    }

    /// Convert a value to the column's storage class.
    ///
    /// Integral text or floats become integers, numeric text becomes a real,
    /// blank text becomes null. Anything else is an `InvalidArgument`, or null
    /// for a lenient column.
    pub fn coerce(&self, value: SqlValue) -> Result<SqlValue> {
        let converted = match (self.col_type, &value) {
            (_, SqlValue::Null) => Some(SqlValue::Null),
            (ColumnType::Text, SqlValue::Text(_)) => Some(value.clone()),
            (ColumnType::Text, other) => other.to_plain_string().map(SqlValue::Text),
            (ColumnType::Integer, SqlValue::Integer(i)) => Some(SqlValue::Integer(*i)),
            (ColumnType::Integer, SqlValue::Real(f)) => integral(*f).map(SqlValue::Integer),
            (ColumnType::Integer, SqlValue::Text(t)) => match t.trim() {
                "" => Some(SqlValue::Null),
                t => t
                    .parse::<i64>()
                    .ok()
                    .or_else(|| t.parse::<f64>().ok().and_then(integral))
                    .map(SqlValue::Integer),
            },
            (ColumnType::Real, SqlValue::Integer(i)) => Some(SqlValue::Real(*i as f64)),
            (ColumnType::Real, SqlValue::Real(f)) => finite(*f).map(SqlValue::Real),
            (ColumnType::Real, SqlValue::Text(t)) => match t.trim() {
                "" => Some(SqlValue::Null),
                t => t.parse::<f64>().ok().and_then(finite).map(SqlValue::Real),
            },
        };

        match converted {
            Some(v) => Ok(v),
            None if self.lenient => Ok(SqlValue::Null),
            None => Err(Error::InvalidArgument(format!(
                "{} expects {}, got {:?}",
                self.name,
                self.col_type.sql(),
                value.to_plain_string().unwrap_or_default()
            ))),
        }
    }
}

/// Foreign key reference, always `ON UPDATE CASCADE`
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub column: &'static str,
    pub references_table: &'static str,
    pub references_column: &'static str,
}

impl ForeignKey {
    pub const fn new(
        column: &'static str,
        references_table: &'static str,
        references_column: &'static str,
    ) -> Self {
        Self {
            column,
            references_table,
            references_column,
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    /// Key columns; several for composite keys
    pub primary_key: &'static [&'static str],
    pub foreign_keys: &'static [ForeignKey],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }
}

fn finite(f: f64) -> Option<f64> {
    f.is_finite().then_some(f)
}

fn integral(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then(|| f as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_coercion() {
        let sec = Column::new("sec", ColumnType::Integer);
        assert_eq!(sec.coerce("12".into()).unwrap(), SqlValue::Integer(12));
        assert_eq!(sec.coerce(" 7.0 ".into()).unwrap(), SqlValue::Integer(7));
        assert_eq!(sec.coerce(SqlValue::Real(3.0)).unwrap(), SqlValue::Integer(3));
        assert_eq!(sec.coerce("".into()).unwrap(), SqlValue::Null);
        assert!(matches!(sec.coerce("NE".into()), Err(Error::InvalidArgument(_))));
        assert!(matches!(sec.coerce(SqlValue::Real(2.5)), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_real_coercion_and_lenient_columns() {
        let top = Column::new("top", ColumnType::Real);
        assert_eq!(top.coerce("4500.5".into()).unwrap(), SqlValue::Real(4500.5));
        assert_eq!(top.coerce(4500i64.into()).unwrap(), SqlValue::Real(4500.0));
        assert!(matches!(top.coerce("n/a".into()), Err(Error::InvalidArgument(_))));

        let lat = Column::new("lat", ColumnType::Real).lenient();
        assert_eq!(lat.coerce("n/a".into()).unwrap(), SqlValue::Null);
        assert_eq!(lat.coerce("34.5".into()).unwrap(), SqlValue::Real(34.5));
    }

    #[test]
    fn test_text_columns_take_any_value() {
        let well_num = Column::new("well_num", ColumnType::Text);
        assert_eq!(well_num.coerce(2i64.into()).unwrap(), SqlValue::Text("2".into()));
        assert_eq!(well_num.coerce("1-A".into()).unwrap(), SqlValue::Text("1-A".into()));
    }
}
