//! Typed column maps for inserts and partial updates.
//!
//! Each entity gets a closed enum of the columns a caller may set, so an
//! unknown column name cannot be expressed. Computed columns (`File.box_count`)
//! and columns fixed by the key argument (`Box.file_num`) are left out.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::Result;
use crate::parser::SqlValue;
use crate::schema::{TableSchema, BOX, FILE, WELL};

pub trait EntityField: Copy + Ord + fmt::Debug {
    fn table() -> &'static TableSchema;
    fn column(self) -> &'static str;
}

macro_rules! entity_fields {
    ($(#[$meta:meta])* $name:ident => $table:path { $($variant:ident => $column:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl EntityField for $name {
            fn table() -> &'static TableSchema {
                &$table
            }

            fn column(self) -> &'static str {
                match self {
                    $($name::$variant => $column),+
                }
            }
        }
    };
}

entity_fields!(
    /// Settable columns of `Well`
    WellField => WELL {
        Api => "api",
        Operator => "operator",
        Lease => "lease",
        WellNum => "well_num",
        Sec => "sec",
        Twn => "twn",
        TwnD => "twn_d",
        Rng => "rng",
        RngD => "rng_d",
        Qq => "qq",
        Lat => "lat",
        Long => "long",
        County => "county",
        State => "state",
        Field => "field",
    }
);

entity_fields!(
    /// Settable columns of `File`
    FileField => FILE {
        FileNum => "file_num",
        Collection => "collection",
        SampleType => "sample_type",
        BoxType => "box_type",
        Diameter => "diameter",
        Location => "location",
    }
);

entity_fields!(
    /// Settable columns of `Box`
    BoxField => BOX {
        BoxNum => "box_num",
        Top => "top",
        Bottom => "bottom",
        Formation => "formation",
        Condition => "condition",
        Comments => "comments",
    }
);

/// A set of column values for one entity
#[derive(Debug, Clone, PartialEq)]
pub struct Fields<F: EntityField> {
    values: BTreeMap<F, SqlValue>,
}

impl<F: EntityField> Default for Fields<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<F: EntityField> Fields<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `set`
    pub fn with(mut self, field: F, value: impl Into<SqlValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: F, value: impl Into<SqlValue>) {
        self.values.insert(field, value.into());
    }

    pub fn get(&self, field: F) -> Option<&SqlValue> {
        self.values.get(&field)
    }

    /// Column/value pairs in field declaration order, each value converted
    /// to its column's storage class
    pub fn row(&self) -> Result<Vec<(&'static str, SqlValue)>> {
        let table = F::table();
        self.values
            .iter()
            .map(|(f, v)| {
                let value = match table.column(f.column()) {
                    Some(column) => column.coerce(v.clone())?,
                    None => v.clone(),
                };
                Ok((f.column(), value))
            })
            .collect()
    }
}
