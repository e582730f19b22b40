//! Row expansion: one spreadsheet row per box range in, one row per physical box out.
//!
//! A raw row may stand for several boxes. Its `Box`/`Total` cells decide how many:
//!
//! | Box  | Total | boxes in row        |
//! |------|-------|---------------------|
//! | set  | set   | 1                   |
//! | null | n     | n                   |
//! | k    | null  | k                   |
//! | null | null  | none, row is boxless |
//!
//! Boxes get fresh sequential numbers per file, the row's `Top` lands on its
//! first box and its `Bottom` on its last box.

mod pipeline;

pub use pipeline::{clean_inventory, CleanReport};

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::parser::{RawRecord, Record};

/// Result of expanding a whole record set
#[derive(Debug, Default)]
pub struct Expansion {
    /// Expanded boxes of every successful file, followed by the boxless rows
    pub records: Vec<Record>,
    /// Rows with neither `Box` nor `Total`, also present at the tail of `records`
    pub boxless: Vec<Record>,
    /// Raw rows of every file whose expansion was abandoned
    pub rejected: Vec<RawRecord>,
    /// Files that expanded to nothing (every row had a zero count)
    pub empty_files: Vec<String>,
    /// One entry per file whose expansion was abandoned
    pub failures: Vec<Error>,
}

impl Expansion {
    pub fn box_count(&self) -> usize {
        self.records.len() - self.boxless.len()
    }
}

/// Upper bound on the boxes one file may expand to
pub const MAX_BOXES_PER_FILE: u32 = 100_000;

/// Running state carried across the rows of one file
#[derive(Debug, Clone, Copy)]
struct BoxCursor {
    next: u32,
}

impl BoxCursor {
    fn new() -> Self {
        Self { next: 1 }
    }
}

/// Expand every file of a raw record set.
///
/// Files are processed in first-seen order. A malformed row fails its whole
/// file, the remaining files are still expanded.
pub fn expand(rows: &[RawRecord]) -> Expansion {
    let mut files: IndexMap<&str, Vec<&RawRecord>> = IndexMap::new();
    for row in rows {
        files.entry(row.file_key()).or_default().push(row);
    }

    let mut expansion = Expansion::default();
    for (file_num, file_rows) in files {
        match expand_file(file_num, &file_rows) {
            Ok((boxes, boxless)) if boxes.is_empty() && boxless.is_empty() => {
                tracing::warn!(file = file_num, rows = file_rows.len(), "file has no boxes");
                expansion.empty_files.push(file_num.to_string());
            }
            Ok((boxes, boxless)) => {
                expansion.records.extend(boxes);
                expansion.boxless.extend(boxless);
            }
            Err(err) => {
                tracing::warn!(file = file_num, error = %err, "file not expanded");
                expansion.failures.push(err);
                expansion
                    .rejected
                    .extend(file_rows.iter().map(|row| (*row).clone()));
            }
        }
    }

    expansion.records.extend(expansion.boxless.iter().cloned());
    expansion
}

/// Expand the rows of a single file.
///
/// Returns the file's boxes and, separately, its boxless rows. Nothing is
/// returned for a file containing any row that fails coercion.
pub fn expand_file(file_num: &str, rows: &[&RawRecord]) -> Result<(Vec<Record>, Vec<Record>)> {
    let records = rows
        .iter()
        .map(|raw| Record::from_raw(raw))
        .collect::<Result<Vec<_>>>()?;

    let (boxless, ranged): (Vec<Record>, Vec<Record>) =
        records.into_iter().partition(Record::is_boxless);

    let mut total: u32 = 0;
    for row in &ranged {
        let count = boxes_in_row(row);
        total = total
            .checked_add(count)
            .filter(|n| *n <= MAX_BOXES_PER_FILE)
            .ok_or_else(|| Error::malformed(file_num, count_field(row), &count.to_string()))?;
    }

    let (_, mut boxes) = ranged.iter().fold(
        (BoxCursor::new(), Vec::new()),
        |(cursor, mut acc), row| {
            let cursor = expand_row(row, cursor, &mut acc);
            (cursor, acc)
        },
    );

    for record in &mut boxes {
        record.total = Some(total);
    }

    Ok((boxes, boxless))
}

/// Column a row's box count was read from
fn count_field(record: &Record) -> &'static str {
    match (record.box_num, record.total) {
        (Some(_), None) => "Box",
        _ => "Total",
    }
}

/// Number of physical boxes a row stands for
pub fn boxes_in_row(record: &Record) -> u32 {
    match (record.box_num, record.total) {
        (Some(_), Some(_)) => 1,
        (None, Some(total)) => total,
        (Some(position), None) => position,
        (None, None) => 0,
    }
}

fn expand_row(row: &Record, mut cursor: BoxCursor, out: &mut Vec<Record>) -> BoxCursor {
    let count = boxes_in_row(row);
    for i in 0..count {
        let mut record = row.clone();
        record.box_num = Some(cursor.next);
        record.total = None;
        record.top = if i == 0 { row.top.clone() } else { None };
        record.bottom = if i + 1 == count { row.bottom.clone() } else { None };
        out.push(record);
        cursor.next += 1;
    }
    cursor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(file: &str, box_num: Option<&str>, total: Option<&str>) -> RawRecord {
        RawRecord {
            file_num: Some(file.to_string()),
            box_num: box_num.map(String::from),
            total: total.map(String::from),
            api: Some("35019200350000".to_string()),
            formation: Some("Hunton".to_string()),
            ..Default::default()
        }
    }

    fn depths(mut raw: RawRecord, top: &str, bottom: &str) -> RawRecord {
        raw.top = Some(top.to_string());
        raw.bottom = Some(bottom.to_string());
        raw
    }

    #[test]
    fn test_range_row_splits_depths() {
        let rows = vec![depths(row("7A", None, Some("3")), "100", "130")];
        let expansion = expand(&rows);

        assert!(expansion.failures.is_empty());
        let boxes = &expansion.records;
        assert_eq!(boxes.len(), 3);
        assert_eq!(
            boxes.iter().map(|b| b.box_num).collect::<Vec<_>>(),
            vec![Some(1), Some(2), Some(3)]
        );
        assert_eq!(boxes[0].top.as_deref(), Some("100"));
        assert_eq!(boxes[0].bottom, None);
        assert_eq!(boxes[1].top, None);
        assert_eq!(boxes[1].bottom, None);
        assert_eq!(boxes[2].top, None);
        assert_eq!(boxes[2].bottom.as_deref(), Some("130"));
        assert!(boxes.iter().all(|b| b.total == Some(3)));
        assert!(boxes.iter().all(|b| b.formation.as_deref() == Some("Hunton")));
    }

    #[test]
    fn test_single_box_row_keeps_both_depths() {
        let rows = vec![depths(row("9", Some("4"), Some("10")), "50", "60")];
        let boxes = expand(&rows).records;
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].box_num, Some(1));
        assert_eq!(boxes[0].total, Some(1));
        assert_eq!(boxes[0].top.as_deref(), Some("50"));
        assert_eq!(boxes[0].bottom.as_deref(), Some("60"));
    }

    #[test]
    fn test_position_without_total_expands_to_position() {
        let rows = vec![row("12", Some("4"), None)];
        let boxes = expand(&rows).records;
        assert_eq!(boxes.len(), 4);
        assert_eq!(boxes.last().unwrap().box_num, Some(4));
    }

    #[test]
    fn test_numbering_runs_across_rows_and_ignores_declared_positions() {
        let rows = vec![
            row("3", Some("17"), Some("1")),
            row("3", None, Some("2")),
            row("3", Some("40"), Some("9")),
        ];
        let boxes = expand(&rows).records;
        assert_eq!(
            boxes.iter().map(|b| b.box_num.unwrap()).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert!(boxes.iter().all(|b| b.total == Some(4)));
    }

    #[test]
    fn test_each_row_places_its_own_depths() {
        let rows = vec![
            depths(row("5", None, Some("2")), "10", "20"),
            depths(row("5", None, Some("2")), "20", "30"),
        ];
        let boxes = expand(&rows).records;
        let tops: Vec<_> = boxes.iter().map(|b| b.top.as_deref()).collect();
        let bottoms: Vec<_> = boxes.iter().map(|b| b.bottom.as_deref()).collect();
        assert_eq!(tops, vec![Some("10"), None, Some("20"), None]);
        assert_eq!(bottoms, vec![None, Some("20"), None, Some("30")]);
    }

    #[test]
    fn test_boxless_rows_go_last_and_untouched() {
        let rows = vec![
            row("1", None, None),
            row("1", None, Some("2")),
            row("2", Some("1"), Some("1")),
        ];
        let expansion = expand(&rows);
        assert_eq!(expansion.records.len(), 4);
        assert_eq!(expansion.box_count(), 3);
        assert_eq!(expansion.boxless.len(), 1);

        let last = expansion.records.last().unwrap();
        assert_eq!(last.file_num, "1");
        assert_eq!(last.box_num, None);
        assert_eq!(last.total, None);
        assert_eq!(&expansion.boxless[0], last);
    }

    #[test]
    fn test_zero_total_produces_no_boxes() {
        let rows = vec![row("8", None, Some("0")), row("8", None, Some("1"))];
        let boxes = expand(&rows).records;
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].box_num, Some(1));
        assert_eq!(boxes[0].total, Some(1));
    }

    #[test]
    fn test_malformed_count_fails_only_that_file() {
        let rows = vec![
            row("bad", None, Some("3")),
            row("bad", None, Some("a few")),
            row("bad", None, None),
            row("good", None, Some("2")),
        ];
        let expansion = expand(&rows);

        assert_eq!(expansion.failures.len(), 1);
        assert!(matches!(
            &expansion.failures[0],
            Error::MalformedIdentifier { file_num, field: "Total", .. } if file_num == "bad"
        ));
        assert!(expansion.records.iter().all(|r| r.file_num == "good"));
        assert!(expansion.boxless.is_empty());
        assert_eq!(expansion.records.len(), 2);
    }

    #[test]
    fn test_file_of_zero_counts_is_reported_empty() {
        let rows = vec![row("8", None, Some("0")), row("9", None, Some("1"))];
        let expansion = expand(&rows);
        assert_eq!(expansion.empty_files, vec!["8".to_string()]);
        assert!(expansion.failures.is_empty());
        assert_eq!(expansion.records.len(), 1);
    }

    #[test]
    fn test_oversized_counts_fail_the_file() {
        let rows = vec![
            row("huge", None, Some("4000000000")),
            row("split", None, Some("60000")),
            row("split", Some("60000"), None),
            row("ok", None, Some("2")),
        ];
        let expansion = expand(&rows);

        assert_eq!(expansion.failures.len(), 2);
        assert!(matches!(
            &expansion.failures[0],
            Error::MalformedIdentifier { file_num, field: "Total", .. } if file_num == "huge"
        ));
        assert!(matches!(
            &expansion.failures[1],
            Error::MalformedIdentifier { file_num, field: "Box", .. } if file_num == "split"
        ));
        assert_eq!(expansion.records.len(), 2);
        assert_eq!(expansion.rejected.len(), 3);
    }

    #[test]
    fn test_rejected_files_keep_their_raw_rows() {
        let mut bad_api = row("A", None, Some("1"));
        bad_api.api = Some("Combined into 12".into());
        let boxless = RawRecord {
            api: Some("Combined into 12".into()),
            ..row("A", None, None)
        };
        let rows = vec![bad_api.clone(), row("B", None, Some("1")), boxless.clone()];
        let expansion = expand(&rows);

        assert_eq!(expansion.rejected, vec![bad_api, boxless]);
        assert!(expansion.boxless.is_empty());
        assert_eq!(expansion.records.len(), 1);
    }

    #[test]
    fn test_failures_are_aggregated() {
        let mut no_api = row("A", None, Some("1"));
        no_api.api = None;
        let mut text_api = row("B", None, Some("1"));
        text_api.api = Some("Combined into 12".into());
        let expansion = expand(&[no_api, text_api, row("C", None, Some("1"))]);

        assert_eq!(expansion.failures.len(), 2);
        assert_eq!(expansion.records.len(), 1);
    }

    #[test]
    fn test_boxes_in_row_cases() {
        let record = |b: Option<u32>, t: Option<u32>| {
            let mut r = Record::from_raw(&row("x", None, None)).unwrap();
            r.box_num = b;
            r.total = t;
            r
        };
        assert_eq!(boxes_in_row(&record(Some(2), Some(8))), 1);
        assert_eq!(boxes_in_row(&record(None, Some(8))), 8);
        assert_eq!(boxes_in_row(&record(Some(2), None)), 2);
        assert_eq!(boxes_in_row(&record(None, None)), 0);
    }
}
