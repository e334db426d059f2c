//! Year initialization business logic
//!
//! Creates the twelve payment slots of a year for every active member. Billed members get
//! `pending` slots carrying the month's expected amount; exempt members get `exempt` slots
//! whose reason mirrors their exemption status. Slots that already exist are never touched,
//! so the operation can be re-run after members join mid-year.

use crate::{
    core::member::{ExemptionStatus, exemption_status_of, list_active_members},
    core::payment::{ExemptionReason, PaymentStatus},
    entities::{Payment, payment},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{Set, TransactionTrait, prelude::*};
use std::collections::{BTreeMap, HashSet};
use tracing::{info, instrument};

/// Represents the result of initializing a year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InitializationResult {
    /// Year that was initialized
    pub year: i32,
    /// Number of slots created by this run
    pub created_count: usize,
    /// Number of slots that already existed and were left alone
    pub existing_count: usize,
    /// Number of active members processed
    pub members_processed: usize,
}

/// Creates every missing (member, month) slot of `year` for active members.
///
/// `monthly_rates` maps month (1-12) to the expected amount; months without a rate get
/// `0.0`. All inserts run in one transaction, so either every missing slot is created or
/// none is.
#[instrument(skip(db, monthly_rates))]
pub async fn initialize_year(
    db: &DatabaseConnection,
    year: i32,
    monthly_rates: &BTreeMap<u32, f64>,
    actor: &str,
) -> Result<InitializationResult> {
    for (&month, &rate) in monthly_rates {
        if !(1..=12).contains(&month) {
            return Err(Error::validation(format!(
                "Rate schedule month {month} is outside 1-12"
            )));
        }
        if !rate.is_finite() || rate < 0.0 {
            return Err(Error::InvalidAmount { amount: rate });
        }
    }

    // Start a database transaction to ensure atomicity
    let txn = db.begin().await?;

    let members = list_active_members(&txn).await?;

    let existing: HashSet<(i64, i32)> = Payment::find()
        .filter(payment::Column::PaymentYear.eq(year))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.member_id, p.payment_month))
        .collect();

    let now = Utc::now().naive_utc();
    let mut result = InitializationResult {
        year,
        members_processed: members.len(),
        ..InitializationResult::default()
    };

    for member in &members {
        let exemption = exemption_status_of(member)?;
        let (status, reason) = match exemption {
            ExemptionStatus::None => (PaymentStatus::Pending, None),
            ExemptionStatus::Pocasni => (PaymentStatus::Exempt, Some(ExemptionReason::Pocasni)),
            ExemptionStatus::Saradnik => {
                (PaymentStatus::Exempt, Some(ExemptionReason::Saradnik))
            }
        };

        for month in 1..=12_i32 {
            if existing.contains(&(member.id, month)) {
                result.existing_count += 1;
                continue;
            }

            let rate = u32::try_from(month)
                .ok()
                .and_then(|m| monthly_rates.get(&m))
                .copied()
                .unwrap_or(0.0);

            let slot = payment::ActiveModel {
                member_id: Set(member.id),
                payment_year: Set(year),
                payment_month: Set(month),
                expected_amount: Set(Some(rate)),
                paid_amount: Set(None),
                status: Set(status.to_column()),
                exemption_reason: Set(reason.map(|r| r.as_str().to_string())),
                payment_date: Set(None),
                payment_method: Set(None),
                notes: Set(None),
                is_annual_payment: Set(false),
                annual_payment_group_id: Set(None),
                created_by: Set(actor.to_string()),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            };
            slot.insert(&txn).await?;
            result.created_count += 1;
        }
    }

    // Commit the transaction - all slots are created or none are
    txn.commit().await?;

    info!(
        year,
        created = result.created_count,
        existing = result.existing_count,
        members = result.members_processed,
        "year initialized"
    );
    Ok(result)
}

/// Formats an initialization result into a human-readable summary string.
#[must_use]
pub fn format_initialization_summary(result: &InitializationResult) -> String {
    format!(
        "Initialized {} - {} members | {} records created | {} already present",
        result.year, result.members_processed, result.created_count, result.existing_count
    )
}
