use anyhow::{Context, Result};
use std::path::Path;

use super::expand;
use crate::parser::{read_raw_records, write_raw_records, write_records};
use crate::ui::{Phase, Ui};

/// Outcome of a clean run
#[derive(Debug, Default)]
pub struct CleanReport {
    pub rows_read: usize,
    pub boxes_written: usize,
    pub boxless: usize,
    /// Raw rows set aside because their file failed
    pub rejected: usize,
    /// Files whose rows all had a zero count
    pub empty_files: Vec<String>,
    /// Human-readable failure lines, one per abandoned file
    pub failures: Vec<String>,
}

impl CleanReport {
    pub fn summary(&self) -> String {
        format!(
            "{} rows read, {} boxes written, {} boxless rows, {} files failed ({} rows set aside), {} empty files",
            self.rows_read,
            self.boxes_written,
            self.boxless,
            self.failures.len(),
            self.rejected,
            self.empty_files.len()
        )
    }
}

/// Expand a raw inventory export into the cleaned record file, plus side files
/// for boxless rows and for the rows of files that could not be expanded
pub fn clean_inventory(
    input: &Path,
    output: &Path,
    boxless_path: &Path,
    rejected_path: &Path,
    ui: &mut impl Ui,
) -> Result<CleanReport> {
    ui.set_phase(Phase::Reading);
    ui.set_source(input);
    let rows = read_raw_records(input)
        .with_context(|| format!("Failed to read raw records: {:?}", input))?;
    ui.note(&format!("Read {} rows", rows.len()));

    ui.set_phase(Phase::Expanding);
    let expansion = expand(&rows);
    for failure in &expansion.failures {
        ui.file_failed(&failure.to_string());
    }

    ui.set_phase(Phase::Writing);
    write_records(output, &expansion.records)
        .with_context(|| format!("Failed to write cleaned records: {:?}", output))?;
    write_records(boxless_path, &expansion.boxless)
        .with_context(|| format!("Failed to write boxless records: {:?}", boxless_path))?;
    ui.note(&format!(
        "Saved {} boxless rows to {:?}",
        expansion.boxless.len(),
        boxless_path
    ));

    write_raw_records(rejected_path, &expansion.rejected)
        .with_context(|| format!("Failed to write rejected rows: {:?}", rejected_path))?;
    if !expansion.rejected.is_empty() {
        ui.note(&format!(
            "Set aside {} rows of failed files in {:?}",
            expansion.rejected.len(),
            rejected_path
        ));
    }

    let report = CleanReport {
        rows_read: rows.len(),
        boxes_written: expansion.box_count(),
        boxless: expansion.boxless.len(),
        rejected: expansion.rejected.len(),
        empty_files: expansion.empty_files.clone(),
        failures: expansion.failures.iter().map(|e| e.to_string()).collect(),
    };
    tracing::info!(
        rows = report.rows_read,
        boxes = report.boxes_written,
        boxless = report.boxless,
        rejected = report.rejected,
        failed = report.failures.len(),
        "clean complete"
    );

    Ok(report)
}
