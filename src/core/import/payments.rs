//! Payment history import.
//!
//! Columns named like `JAN_2025` become (year, month) slots. Rows are matched to members
//! by membership number first, then by email. Each cell becomes a paid or exempt record:
//! numbers are cash payments dated on the first of the column's month, and the tokens
//! `pocasni`, `saradnik`, `free` and `exempt` mark exempt months.

use super::{ImportSummary, cell, csv_reader, row_number};
use crate::{
    core::import::headers::{HeaderParser, MonthColumn, identity_columns, is_header_label},
    core::member::{
        ExemptionStatus, backfill_email, find_by_email, find_by_membership_number,
        set_exemption_status,
    },
    core::payment::{ExemptionReason, PaymentChanges, PaymentKey, PaymentMethod, upsert_payment},
    entities::member,
    errors::{Error, Result},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::BTreeSet;
use std::io::Read;
use tracing::{info, instrument, warn};

/// What one cell asks the ledger to record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellIntent {
    /// Cash payment of the amount
    Paid(f64),
    /// Exempt month; `member_status` is pushed onto the member when set
    Exempt {
        /// Reason stored on the record
        reason: ExemptionReason,
        /// Member-level exemption implied by the token
        member_status: Option<ExemptionStatus>,
    },
}

/// Interprets a payment cell. Empty cells yield `Ok(None)`.
pub fn interpret_cell(value: &str) -> std::result::Result<Option<CellIntent>, String> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }

    match value.to_lowercase().as_str() {
        "pocasni" | "počasni" => {
            return Ok(Some(CellIntent::Exempt {
                reason: ExemptionReason::Pocasni,
                member_status: Some(ExemptionStatus::Pocasni),
            }));
        }
        "saradnik" => {
            return Ok(Some(CellIntent::Exempt {
                reason: ExemptionReason::Saradnik,
                member_status: Some(ExemptionStatus::Saradnik),
            }));
        }
        "free" | "exempt" => {
            return Ok(Some(CellIntent::Exempt {
                reason: ExemptionReason::Other,
                member_status: None,
            }));
        }
        _ => {}
    }

    let amount = parse_amount(value).ok_or_else(|| format!("unrecognized value '{value}'"))?;
    if amount < 0.0 {
        return Err(format!("negative amount '{value}'"));
    }
    Ok(Some(CellIntent::Paid(amount)))
}

/// Parses `2500`, `2500.50`, `2500,50` and `2,500.50`.
fn parse_amount(value: &str) -> Option<f64> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let normalized = if compact.contains('.') {
        compact.replace(',', "")
    } else {
        compact.replace(',', ".")
    };
    normalized.parse::<f64>().ok().filter(|a| a.is_finite())
}

/// Finds the member a row refers to: membership number first, then email.
async fn match_member<C>(
    db: &C,
    number: Option<&str>,
    email: Option<&str>,
) -> Result<Option<member::Model>>
where
    C: ConnectionTrait,
{
    if let Some(number) = number.filter(|n| !is_header_label(n)) {
        if let Ok(number) = number.parse::<i64>() {
            if let Some(found) = find_by_membership_number(db, number).await? {
                return Ok(Some(found));
            }
        }
    }

    if let Some(email) = email {
        return find_by_email(db, email).await;
    }
    Ok(None)
}

/// Writes one row's intents in a single transaction and returns how many records it wrote.
async fn apply_row(
    db: &DatabaseConnection,
    member: member::Model,
    intents: &[(MonthColumn, CellIntent)],
    email: Option<&str>,
    actor: &str,
) -> Result<usize> {
    let txn = db.begin().await?;

    let member = match email {
        Some(email) => backfill_email(&txn, member, email).await?,
        None => member,
    };

    for (column, intent) in intents {
        let key = PaymentKey::new(member.id, column.year, column.month);
        let first_day = key.first_day()?;

        let changes = match *intent {
            CellIntent::Paid(amount) => PaymentChanges {
                payment_date: Some(first_day),
                ..PaymentChanges::paid(amount, PaymentMethod::Cash)
            },
            CellIntent::Exempt {
                reason,
                member_status,
            } => {
                if let Some(status) = member_status {
                    set_exemption_status(&txn, member.id, status).await?;
                }
                PaymentChanges::exempt(reason)
            }
        };
        upsert_payment(&txn, key, changes, actor, first_day).await?;
    }

    txn.commit().await?;
    Ok(intents.len())
}

/// Imports payment history from CSV.
///
/// Rejects the whole file when no header matches the month pattern or when neither a
/// membership number nor an email column exists. Otherwise every row is reconciled on
/// its own; failures are collected on the summary.
#[instrument(skip(db, reader))]
pub async fn import_payments<R: Read>(
    db: &DatabaseConnection,
    reader: R,
    actor: &str,
) -> Result<ImportSummary> {
    let parser = HeaderParser::new()?;
    let mut csv = csv_reader(reader);
    let headers = csv.headers()?.clone();

    let columns = parser.month_columns(&headers)?;
    let identity = identity_columns(&headers);
    if identity.membership_number.is_none() && identity.email.is_none() {
        return Err(Error::validation(
            "Payment import needs a membership number or email column",
        ));
    }

    let mut summary = ImportSummary {
        years_processed: columns
            .iter()
            .map(|c| c.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
        ..ImportSummary::default()
    };

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

        let number = cell(&record, identity.membership_number);
        let email = cell(&record, identity.email);

        let matched = match match_member(db, number, email).await {
            Ok(matched) => matched,
            Err(e) => {
                summary.skip_row(row, e);
                continue;
            }
        };
        let Some(member) = matched else {
            summary.skip_row(
                row,
                format!(
                    "no member matches membership number '{}' or email '{}'",
                    number.unwrap_or(""),
                    email.unwrap_or("")
                ),
            );
            continue;
        };

        let mut intents = Vec::new();
        for column in &columns {
            let value = record.get(column.index).unwrap_or("");
            match interpret_cell(value) {
                Ok(Some(intent)) => intents.push((*column, intent)),
                Ok(None) => {}
                Err(message) => summary.row_error(
                    row,
                    format!("{} ({})", message, headers.get(column.index).unwrap_or("?")),
                ),
            }
        }

        let (member_id, member_number, member_name) =
            (member.id, member.membership_number, member.name.clone());
        match apply_row(db, member, &intents, email, actor).await {
            Ok(written) => {
                summary.imported += written;
                summary.messages.push(format!(
                    "Row {row}: member #{member_number} {member_name} - {written} records"
                ));
            }
            Err(e) => {
                warn!(row, member_id, error = %e, "payment row rolled back");
                summary.skip_row(row, e);
            }
        }
    }

    info!(
        imported = summary.imported,
        skipped = summary.skipped,
        errors = summary.errors.len(),
        "payment import finished"
    );
    Ok(summary)
}
