//! Table definitions for the core sample store.
//!
//! Column names and order are the on-disk contract shared with existing
//! databases; do not reorder.

use super::types::*;

pub static WELL: TableSchema = TableSchema {
    name: "Well",
    columns: &[
        Column::required("api", ColumnType::Integer).csv("API"),
        Column::new("operator", ColumnType::Text).csv("Operator"),
        Column::new("lease", ColumnType::Text).csv("Lease"),
        Column::new("well_num", ColumnType::Text).csv("Well #"),
        Column::new("sec", ColumnType::Integer).csv("Sec"),
        Column::new("twn", ColumnType::Integer).csv("Tw"),
        Column::new("twn_d", ColumnType::Text).csv("TwD"),
        Column::new("rng", ColumnType::Integer).csv("Rg"),
        Column::new("rng_d", ColumnType::Text).csv("RgD"),
        Column::new("qq", ColumnType::Text).csv("Quarter"),
        Column::new("lat", ColumnType::Real).csv("Latitude").lenient(),
        Column::new("long", ColumnType::Real).csv("Longitude").lenient(),
        Column::new("county", ColumnType::Text).csv("County"),
        Column::new("state", ColumnType::Text).csv("State"),
        Column::new("field", ColumnType::Text).csv("Field"),
    ],
    primary_key: &["api"],
    foreign_keys: &[],
};

pub static FILE: TableSchema = TableSchema {
    name: "File",
    columns: &[
        Column::required("file_num", ColumnType::Text).csv("File #"),
        // Not in the record file; supplied per load
        Column::new("collection", ColumnType::Text),
        Column::new("sample_type", ColumnType::Text).csv("Type"),
        Column::new("box_count", ColumnType::Integer),
        Column::new("box_type", ColumnType::Text).csv("Box Type"),
        Column::new("diameter", ColumnType::Text).csv("Diameter"),
        Column::new("location", ColumnType::Text).csv("Location"),
    ],
    primary_key: &["file_num"],
    foreign_keys: &[],
};

pub static BOX: TableSchema = TableSchema {
    name: "Box",
    columns: &[
        Column::required("file_num", ColumnType::Text).csv("File #"),
        Column::required("box_num", ColumnType::Text),
        Column::new("top", ColumnType::Real).csv("Top"),
        Column::new("bottom", ColumnType::Real).csv("Bottom"),
        Column::new("formation", ColumnType::Text).csv("Formation"),
        Column::new("condition", ColumnType::Text).csv("Condition"),
        Column::new("comments", ColumnType::Text).csv("Comments"),
    ],
    primary_key: &["file_num", "box_num"],
    foreign_keys: &[ForeignKey::new("file_num", "File", "file_num")],
};

pub static WELL_FILE: TableSchema = TableSchema {
    name: "Well_File",
    columns: &[
        Column::required("api", ColumnType::Integer).csv("API"),
        Column::required("file_num", ColumnType::Text).csv("File #"),
    ],
    primary_key: &["api", "file_num"],
    foreign_keys: &[
        ForeignKey::new("api", "Well", "api"),
        ForeignKey::new("file_num", "File", "file_num"),
    ],
};

/// All tables, parents before children
pub static ALL_TABLES: &[&TableSchema] = &[&WELL, &FILE, &BOX, &WELL_FILE];
