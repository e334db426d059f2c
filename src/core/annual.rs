//! Annual payment allocation.
//!
//! One lump-sum annual payment covers twelve consecutive months starting at any month,
//! so it may straddle two calendar years. All twelve records are flagged as annual and
//! share one group id, but only the first month carries the collected amount; the other
//! eleven carry `0.0`. Summing `paid_amount` over any range therefore counts the cash once.

use crate::{
    core::payment::{PaymentKey, PaymentMethod, PaymentStatus, find_payment},
    core::settings,
    entities::{Payment, payment},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{info, instrument};
use uuid::Uuid;

/// Number of months one annual payment covers.
pub const ANNUAL_MONTHS: usize = 12;

/// Request to record an annual payment.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnualPayment {
    /// Paying member
    pub member_id: i64,
    /// Year of the first covered month
    pub start_year: i32,
    /// First covered month, 1-12
    pub start_month: u32,
    /// Total amount collected
    pub amount: f64,
    /// How it was paid
    pub method: PaymentMethod,
    /// When it was paid
    pub payment_date: NaiveDate,
}

/// The twelve (year, month) slots starting at `start_month` of `start_year`.
pub fn annual_months(start_year: i32, start_month: u32) -> Result<Vec<(i32, u32)>> {
    if !(1..=12).contains(&start_month) {
        return Err(Error::validation(format!(
            "Start month {start_month} is outside 1-12"
        )));
    }

    let mut year = start_year;
    let mut month = start_month;
    let mut months = Vec::with_capacity(ANNUAL_MONTHS);
    for _ in 0..ANNUAL_MONTHS {
        months.push((year, month));
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
    Ok(months)
}

/// Records an annual payment as twelve paid records, overwriting whatever the slots held.
///
/// Runs in one database transaction; on any failure no slot is changed.
#[instrument(skip(db, request), fields(member_id = request.member_id))]
pub async fn pay_annual(
    db: &DatabaseConnection,
    request: AnnualPayment,
    actor: &str,
) -> Result<Vec<payment::Model>> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(Error::InvalidAmount {
            amount: request.amount,
        });
    }
    let months = annual_months(request.start_year, request.start_month)?;

    let txn = db.begin().await?;

    crate::core::member::find_member(&txn, request.member_id)
        .await?
        .ok_or_else(|| Error::not_found("Member", request.member_id))?;

    let group_id = Uuid::new_v4().to_string();
    let now = Utc::now().naive_utc();
    let mut records = Vec::with_capacity(ANNUAL_MONTHS);

    for (index, (year, month)) in months.into_iter().enumerate() {
        let key = PaymentKey::new(request.member_id, year, month);
        let paid_amount = if index == 0 { request.amount } else { 0.0 };

        let record = match find_payment(&txn, key).await? {
            Some(existing) => {
                let mut active_model: payment::ActiveModel = existing.into();
                mark_annual(&mut active_model, &request, paid_amount, &group_id, now);
                active_model.update(&txn).await?
            }
            None => {
                let mut active_model = payment::ActiveModel {
                    member_id: Set(key.member_id),
                    payment_year: Set(year),
                    payment_month: Set(i32::try_from(month).map_err(|_| {
                        Error::validation(format!("Month {month} is outside 1-12"))
                    })?),
                    expected_amount: Set(None),
                    notes: Set(None),
                    created_by: Set(actor.to_string()),
                    created_at: Set(now),
                    ..Default::default()
                };
                mark_annual(&mut active_model, &request, paid_amount, &group_id, now);
                active_model.insert(&txn).await?
            }
        };
        records.push(record);
    }

    txn.commit().await?;

    info!(
        group_id = %group_id,
        start = %format!("{}-{:02}", request.start_year, request.start_month),
        amount = request.amount,
        "annual payment recorded"
    );
    Ok(records)
}

fn mark_annual(
    model: &mut payment::ActiveModel,
    request: &AnnualPayment,
    paid_amount: f64,
    group_id: &str,
    now: NaiveDateTime,
) {
    model.status = Set(PaymentStatus::Paid.to_column());
    model.paid_amount = Set(Some(paid_amount));
    model.exemption_reason = Set(None);
    model.payment_date = Set(Some(request.payment_date));
    model.payment_method = Set(Some(request.method.as_str().to_string()));
    model.is_annual_payment = Set(true);
    model.annual_payment_group_id = Set(Some(group_id.to_string()));
    model.updated_at = Set(now);
}

/// Lists the records of one annual allocation in calendar order.
pub async fn annual_group<C>(db: &C, group_id: &str) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::AnnualPaymentGroupId.eq(group_id))
        .order_by_asc(payment::Column::PaymentYear)
        .order_by_asc(payment::Column::PaymentMonth)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Uses the explicit amount when given, otherwise the configured annual amount.
pub async fn resolve_annual_amount<C>(db: &C, explicit: Option<f64>) -> Result<f64>
where
    C: ConnectionTrait,
{
    if let Some(amount) = explicit {
        return Ok(amount);
    }
    settings::get_annual_amount(db)
        .await?
        .ok_or_else(|| Error::Config {
            message: "No annual amount given and none configured".to_string(),
        })
}
