//! End-to-end tests for the clean and build pipelines.
//!
//! A small raw export is cleaned and loaded once into a temporary directory;
//! the tests then check the cleaned file, the side file and the store.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use core_inventory::expander::{clean_inventory, expand, CleanReport};
use core_inventory::parser::{read_raw_records, read_records, read_rows, RawRecord, Record};
use core_inventory::store::{CoreStore, SearchKind};
use core_inventory::writer::{build_database, LoadReport, DEFAULT_COLLECTION};
use core_inventory::SilentUi;

/// Random seed for reproducible interleavings
const RANDOM_SEED: u64 = 42;

const RAW_EXPORT: &str = "\
Unnamed: 0,File #,Box,Total,API,Operator,Lease,Well #,Sec,Tw,Rg,Latitude,Formation,Top,Bottom,Type
0,7A,,3,35019200350000,Big Hoss' Drlg Co,Toadlick,1,12,3,4,34.5,Hunton,100,130,CORE
1,7A,1,1,35019200350000,Big Hoss' Drlg Co,Toadlick,1,12,3,4,34.5,Viola,130,131.5,CORE
2,8,,2,35019200350000,Big Hoss' Drlg Co,Toadlick,1,12,3,4,N/A,Hunton,200,220,CHIPS
3,9,2,5,42000000000001,Sinclair,Mudflat,2,7,10,11,,Woodford,,,CORE
4,9,,,42000000000001,Sinclair,Mudflat,2,7,10,11,,Woodford,,,CORE
5,BAD,,2,Disposal,Nobody,Nowhere,,,,,,,,,CORE
6,11,,,42000000000002,Phillips,Sandy,3,,,,,Arbuckle,,,SLAB
";

// =============================================================================
// Shared Fixture
// =============================================================================

struct Fixture {
    _dir: TempDir,
    cleaned: PathBuf,
    boxless: PathBuf,
    rejected: PathBuf,
    db: PathBuf,
    clean_report: CleanReport,
    load_report: LoadReport,
}

static FIXTURE: Lazy<Fixture> = Lazy::new(|| {
    let dir = tempfile::tempdir().expect("temp dir");
    let raw = dir.path().join("raw.csv");
    let cleaned = dir.path().join("cleaned.csv");
    let boxless = dir.path().join("nullboxes.csv");
    let rejected = dir.path().join("no_api.csv");
    let db = dir.path().join("core.db");
    fs::write(&raw, RAW_EXPORT).expect("write raw export");

    let clean_report = clean_inventory(&raw, &cleaned, &boxless, &rejected, &mut SilentUi::new())
        .expect("clean");
    let load_report =
        build_database(&cleaned, &db, DEFAULT_COLLECTION, &mut SilentUi::new()).expect("build");

    Fixture {
        _dir: dir,
        cleaned,
        boxless,
        rejected,
        db,
        clean_report,
        load_report,
    }
});

fn raw_rows() -> Vec<RawRecord> {
    read_rows(RAW_EXPORT.as_bytes()).unwrap()
}

fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |r| r.get(0)).unwrap()
}

// =============================================================================
// Clean
// =============================================================================

#[test]
fn test_clean_report_counts() {
    let report = &FIXTURE.clean_report;
    assert_eq!(report.rows_read, 7);
    assert_eq!(report.boxes_written, 7);
    assert_eq!(report.boxless, 2);
    assert_eq!(report.rejected, 1);
    assert!(report.empty_files.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].contains("\"BAD\""), "{}", report.failures[0]);
    assert!(report.failures[0].contains("Disposal"));
}

#[test]
fn test_cleaned_file_has_one_row_per_box_then_boxless_rows() {
    let records = read_records(&FIXTURE.cleaned).unwrap();
    assert_eq!(records.len(), 9);

    let file_7a: Vec<&Record> = records.iter().filter(|r| r.file_num == "7A").collect();
    assert_eq!(
        file_7a.iter().map(|r| r.box_num).collect::<Vec<_>>(),
        vec![Some(1), Some(2), Some(3), Some(4)]
    );
    assert!(file_7a.iter().all(|r| r.total == Some(4)));
    assert_eq!(file_7a[3].formation.as_deref(), Some("Viola"));
    assert_eq!(file_7a[3].bottom.as_deref(), Some("131.5"));

    let file_8: Vec<&Record> = records.iter().filter(|r| r.file_num == "8").collect();
    assert_eq!(file_8[0].lat, None);

    assert!(records.iter().all(|r| r.file_num != "BAD"));
    assert!(records[7..].iter().all(Record::is_boxless));
    assert_eq!(records[7].file_num, "9");
    assert_eq!(records[8].file_num, "11");
}

#[test]
fn test_boxless_side_file() {
    let boxless = read_records(&FIXTURE.boxless).unwrap();
    assert_eq!(
        boxless.iter().map(|r| r.file_num.as_str()).collect::<Vec<_>>(),
        vec!["9", "11"]
    );
}

#[test]
fn test_rows_of_failed_files_are_set_aside() {
    let rejected = read_raw_records(&FIXTURE.rejected).unwrap();
    assert_eq!(rejected.len(), 1);
    assert_eq!(rejected[0].file_num.as_deref(), Some("BAD"));
    assert_eq!(rejected[0].api.as_deref(), Some("Disposal"));
    assert_eq!(rejected[0].total.as_deref(), Some("2"));
}

#[test]
fn test_cleaning_cleaned_output_changes_nothing() {
    let cleaned = read_records(&FIXTURE.cleaned).unwrap();
    let again = expand(&read_raw_records(&FIXTURE.cleaned).unwrap());
    assert!(again.failures.is_empty());
    assert_eq!(again.records, cleaned);
}

#[test]
fn test_file_interleaving_does_not_change_expansion() {
    let rows = raw_rows();
    let baseline = by_file(expand(&rows).records);

    let mut queues: IndexMap<String, Vec<RawRecord>> = IndexMap::new();
    for row in rows {
        queues.entry(row.file_key().to_string()).or_default().push(row);
    }

    let mut rng = StdRng::seed_from_u64(RANDOM_SEED);
    for _ in 0..20 {
        let mut pending: Vec<std::vec::IntoIter<RawRecord>> =
            queues.values().cloned().map(Vec::into_iter).collect();
        let mut shuffled = Vec::new();
        while !pending.is_empty() {
            let pick = rng.gen_range(0..pending.len());
            match pending[pick].next() {
                Some(row) => shuffled.push(row),
                None => {
                    pending.swap_remove(pick);
                }
            }
        }

        assert_eq!(by_file(expand(&shuffled).records), baseline);
    }
}

fn by_file(records: Vec<Record>) -> IndexMap<String, Vec<Record>> {
    let mut files: IndexMap<String, Vec<Record>> = IndexMap::new();
    for record in records {
        files.entry(record.file_num.clone()).or_default().push(record);
    }
    files.sort_keys();
    files
}

// =============================================================================
// Build
// =============================================================================

#[test]
fn test_load_report_counts() {
    let report = &FIXTURE.load_report;
    assert!(report.failures.is_empty(), "{:?}", report.failures);
    assert_eq!(report.wells, 3);
    assert_eq!(report.files, 4);
    assert_eq!(report.boxes, 9);
}

#[test]
fn test_box_counts_match_store_rows() {
    let conn = Connection::open(&FIXTURE.db).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM Box"), 9);
    assert_eq!(
        count(
            &conn,
            "SELECT COUNT(*) FROM File f
             WHERE f.box_count != (SELECT COUNT(*) FROM Box b WHERE b.file_num = f.file_num)"
        ),
        0
    );
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM File WHERE collection = 'OLD CORE'"),
        4
    );
}

#[test]
fn test_boxless_rows_get_placeholder_numbers() {
    let store = CoreStore::open(&FIXTURE.db).unwrap();
    let hits = store.search(SearchKind::File, "11").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].well.api, 42000000000002);

    let boxes = &hits[0].files[0].boxes;
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].box_num, "N-1");

    let hits = store.search(SearchKind::File, "9").unwrap();
    let numbers: Vec<&str> = hits[0].files[0]
        .boxes
        .iter()
        .map(|b| b.box_num.as_str())
        .collect();
    assert_eq!(numbers, vec!["1", "N-1"]);
}

#[test]
fn test_search_operator_is_case_insensitive_substring() {
    let store = CoreStore::open(&FIXTURE.db).unwrap();
    let hits = store.search(SearchKind::Operator, "hoss").unwrap();
    assert_eq!(hits.len(), 1);

    let entry = &hits[0];
    assert_eq!(entry.well.lease.as_deref(), Some("Toadlick"));
    assert_eq!(entry.well.sec, Some(12));
    assert_eq!(entry.well.lat, Some(34.5));
    assert_eq!(
        entry.files.iter().map(|f| f.file_num.as_str()).collect::<Vec<_>>(),
        vec!["7A", "8"]
    );
    assert_eq!(entry.files[0].boxes.len(), 4);
    assert_eq!(entry.files[0].boxes[0].top, Some(100.0));
    assert_eq!(entry.files[0].boxes[2].bottom, Some(130.0));
    assert_eq!(entry.files[1].boxes.len(), 2);
}

#[test]
fn test_search_by_well_and_formation() {
    let store = CoreStore::open(&FIXTURE.db).unwrap();

    let hits = store.search(SearchKind::Well, "2").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].well.operator.as_deref(), Some("Sinclair"));

    let hits = store.search(SearchKind::Formation, "ARBUCKLE").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].files[0].file_num, "11");

    assert!(store.search(SearchKind::Lease, "%").unwrap().is_empty());
    assert!(store.search(SearchKind::Api, "1").unwrap().is_empty());
}

#[test]
fn test_rebuild_replaces_previous_contents() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("core.db");
    build_database(&FIXTURE.cleaned, &db, "FIRST", &mut SilentUi::new()).unwrap();
    let report = build_database(&FIXTURE.cleaned, &db, "SECOND", &mut SilentUi::new()).unwrap();
    assert!(report.failures.is_empty());

    let conn = Connection::open(&db).unwrap();
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM File"), 4);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM File WHERE collection = 'SECOND'"),
        4
    );
}
