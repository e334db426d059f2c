//! Attendance history import.
//!
//! Columns named like `4-Sep` become dates in the year supplied by the caller, since the
//! headers carry no year. Rows are matched by membership number only. Cells hold `TRUE`
//! or `FALSE` in any case; an empty cell reads as absent. All sessions are created with
//! the default session type.

use super::{ImportSummary, cell, csv_reader, row_number};
use crate::{
    core::attendance::{
        DEFAULT_SESSION_TYPE, ensure_session_type, find_or_create_session, mark_attendance,
    },
    core::import::headers::{HeaderParser, identity_columns, is_header_label},
    core::member::find_by_membership_number,
    errors::{Error, Result},
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use tracing::{info, instrument, warn};

/// Interprets an attendance cell.
pub fn parse_presence(value: &str) -> std::result::Result<bool, String> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else {
        Err(format!("expected TRUE or FALSE, found '{value}'"))
    }
}

/// Writes one row's marks in a single transaction.
async fn apply_marks(
    db: &DatabaseConnection,
    member_id: i64,
    marks: &[(i64, bool)],
) -> Result<()> {
    let txn = db.begin().await?;
    for &(session_id, present) in marks {
        mark_attendance(&txn, member_id, session_id, present).await?;
    }
    txn.commit().await?;
    Ok(())
}

/// Imports attendance history from CSV for dates in `year`.
///
/// Rejects the whole file when no header matches the day-month pattern or when there is
/// no membership number column. Sessions for every date column are found or created
/// before any row is read.
#[instrument(skip(db, reader))]
pub async fn import_attendance<R: Read>(
    db: &DatabaseConnection,
    reader: R,
    year: i32,
) -> Result<ImportSummary> {
    let parser = HeaderParser::new()?;
    let mut csv = csv_reader(reader);
    let headers = csv.headers()?.clone();

    let columns = parser.date_columns(&headers, year)?;
    let Some(number_column) = identity_columns(&headers).membership_number else {
        return Err(Error::validation(
            "Attendance import needs a membership number column",
        ));
    };

    let mut summary = ImportSummary::default();

    // Column index -> session id; repeated dates share one session
    let mut session_for_column = BTreeMap::new();
    let txn = db.begin().await?;
    let session_type = ensure_session_type(&txn, DEFAULT_SESSION_TYPE).await?;
    for column in &columns {
        let (session, created) = find_or_create_session(&txn, column.date, session_type.id).await?;
        if created {
            summary.sessions_created += 1;
        }
        session_for_column.insert(column.index, session.id);
    }
    txn.commit().await?;

    summary.dates_processed = columns
        .iter()
        .map(|c| c.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    for (index, record) in csv.records().enumerate() {
        let row = row_number(index);
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                summary.skip_row(row, e);
                continue;
            }
        };
        if record.iter().all(|value| value.trim().is_empty()) {
            continue;
        }

        let number = cell(&record, Some(number_column)).unwrap_or("");
        if number.is_empty() || is_header_label(number) {
            summary.skip_row(row, format!("no membership number ('{number}')"));
            continue;
        }
        let Ok(parsed) = number.parse::<i64>() else {
            summary.skip_row(row, format!("invalid membership number '{number}'"));
            continue;
        };
        let member = match find_by_membership_number(db, parsed).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                summary.skip_row(row, format!("no member with membership number {parsed}"));
                continue;
            }
            Err(e) => {
                summary.skip_row(row, e);
                continue;
            }
        };

        let mut marks = Vec::new();
        for column in &columns {
            let value = record.get(column.index).unwrap_or("");
            match parse_presence(value) {
                Ok(present) => {
                    if let Some(&session_id) = session_for_column.get(&column.index) {
                        marks.push((session_id, present));
                    }
                }
                Err(message) => summary.row_error(
                    row,
                    format!("{} ({})", message, headers.get(column.index).unwrap_or("?")),
                ),
            }
        }

        match apply_marks(db, member.id, &marks).await {
            Ok(()) => {
                let attended = marks.iter().filter(|(_, present)| *present).count();
                summary.imported += marks.len();
                summary.messages.push(format!(
                    "Row {row}: member #{} {} - attended {attended} of {}",
                    member.membership_number,
                    member.name,
                    marks.len()
                ));
            }
            Err(e) => {
                warn!(row, member_id = member.id, error = %e, "attendance row rolled back");
                summary.skip_row(row, e);
            }
        }
    }

    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        sessions_created = summary.sessions_created,
        "attendance import finished"
    );
    Ok(summary)
}
