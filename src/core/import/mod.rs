//! CSV import reconciliation.
//!
//! Both importers follow the same shape: map header columns to ledger coordinates, match
//! each row to a member, then apply the row's cells through the payment or attendance
//! ledger inside a per-row transaction. A bad row is recorded on the summary and skipped;
//! the rest of the file still commits. Every write is an upsert, so importing the same
//! file twice leaves the ledger as it was after the first run.

/// Attendance import
pub mod attendance;
/// Header conventions (month table, column patterns)
pub mod headers;
/// Payment import
pub mod payments;

pub use attendance::import_attendance;
pub use payments::import_payments;

use chrono::NaiveDate;
use std::io::Read;

/// Outcome of an import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Ledger records written
    pub imported: usize,
    /// Rows that could not be reconciled
    pub skipped: usize,
    /// Every error, prefixed with its row number
    pub errors: Vec<String>,
    /// Years touched by a payment import
    pub years_processed: Vec<i32>,
    /// Dates touched by an attendance import
    pub dates_processed: Vec<NaiveDate>,
    /// Sessions created by an attendance import
    pub sessions_created: usize,
    /// Per-row diagnostics for reconciled rows
    pub messages: Vec<String>,
}

impl ImportSummary {
    fn row_error(&mut self, row: usize, message: impl std::fmt::Display) {
        self.errors.push(format!("Row {row}: {message}"));
    }

    fn skip_row(&mut self, row: usize, message: impl std::fmt::Display) {
        self.skipped += 1;
        self.row_error(row, message);
    }
}

/// Formats an import summary, including every error, for display to an operator.
#[must_use]
pub fn format_import_summary(summary: &ImportSummary) -> String {
    use std::fmt::Write;

    let mut out = format!(
        "Imported {} records | skipped {} rows | {} errors\n",
        summary.imported,
        summary.skipped,
        summary.errors.len()
    );
    if !summary.years_processed.is_empty() {
        let years: Vec<String> = summary
            .years_processed
            .iter()
            .map(ToString::to_string)
            .collect();
        let _ = writeln!(out, "Years: {}", years.join(", "));
    }
    if !summary.dates_processed.is_empty() {
        let _ = writeln!(
            out,
            "Dates: {} ({} new sessions)",
            summary.dates_processed.len(),
            summary.sessions_created
        );
    }
    for message in &summary.messages {
        let _ = writeln!(out, "  {message}");
    }
    for error in &summary.errors {
        let _ = writeln!(out, "  ! {error}");
    }
    out
}

/// CSV reader configured the way historical export files need: trimmed cells and rows
/// that may be shorter or longer than the header.
fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader)
}

/// Non-empty trimmed cell at `index`.
fn cell(record: &csv::StringRecord, index: Option<usize>) -> Option<&str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

/// 1-based line number of a data row, counting the header as row 1.
const fn row_number(index: usize) -> usize {
    index + 2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_import_summary_lists_errors() {
        let mut summary = ImportSummary {
            imported: 3,
            years_processed: vec![2024, 2025],
            ..ImportSummary::default()
        };
        summary.skip_row(4, "no member matches");
        summary.messages.push("Row 2: member #12 Ana - 3 records".to_string());

        let text = format_import_summary(&summary);
        assert!(text.contains("Imported 3 records | skipped 1 rows | 1 errors"));
        assert!(text.contains("Years: 2024, 2025"));
        assert!(text.contains("! Row 4: no member matches"));
        assert!(text.contains("member #12 Ana"));
    }

    #[test]
    fn test_cell_trims_and_drops_empty() {
        let record = csv::StringRecord::from(vec![" a ", "", "  "]);
        assert_eq!(cell(&record, Some(0)), Some("a"));
        assert_eq!(cell(&record, Some(1)), None);
        assert_eq!(cell(&record, Some(2)), None);
        assert_eq!(cell(&record, Some(9)), None);
        assert_eq!(cell(&record, None), None);
    }
}
