//! Payment ledger business logic - Per-member, per-month dues records.
//!
//! Every record is addressed by a [`PaymentKey`] (member, year, month) and written through
//! [`upsert_payment`], which merges only the fields the caller provides. The ledger never
//! moves a record between states on its own: every status change comes from an
//! administrator action or an import.
//!
//! Status is a five-valued concept where [`PaymentStatus::Unset`] (stored as NULL) means the
//! slot exists but nobody has triaged it yet. It is not the same as `Pending`.

use crate::{
    entities::{Payment, payment},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Triage state of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PaymentStatus {
    /// Slot reserved but not yet triaged (NULL in storage)
    Unset,
    /// Expected but unpaid
    Pending,
    /// Amount received
    Paid,
    /// Member not billed this month
    Exempt,
    /// Marked late by an administrator
    Overdue,
}

impl PaymentStatus {
    /// Reads the nullable `status` column.
    pub fn from_column(value: Option<&str>) -> Result<Self> {
        value.map_or(Ok(Self::Unset), str::parse)
    }

    /// Value written to the nullable `status` column.
    #[must_use]
    pub fn to_column(self) -> Option<String> {
        match self {
            Self::Unset => None,
            other => Some(other.as_str().to_string()),
        }
    }

    /// Stable text form; `Unset` renders as an empty string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unset => "",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Exempt => "exempt",
            Self::Overdue => "overdue",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" => Ok(Self::Unset),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "exempt" => Ok(Self::Exempt),
            "overdue" => Ok(Self::Overdue),
            other => Err(Error::validation(format!("Unknown payment status '{other}'"))),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.pad("unset"),
            other => f.pad(other.as_str()),
        }
    }
}

/// Why a month is exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExemptionReason {
    /// Honorary member
    Pocasni,
    /// Associate member
    Saradnik,
    /// Any other waiver
    Other,
}

impl ExemptionReason {
    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pocasni => "pocasni",
            Self::Saradnik => "saradnik",
            Self::Other => "other",
        }
    }
}

impl FromStr for ExemptionReason {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pocasni" => Ok(Self::Pocasni),
            "saradnik" => Ok(Self::Saradnik),
            "other" => Ok(Self::Other),
            other => Err(Error::validation(format!(
                "Unknown exemption reason '{other}'"
            ))),
        }
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    /// Cash
    Cash,
    /// Card
    Card,
    /// Bank transfer
    BankTransfer,
}

impl PaymentMethod {
    /// Stored text form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::BankTransfer => "bank_transfer",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "cash" => Ok(Self::Cash),
            "card" => Ok(Self::Card),
            "bank_transfer" => Ok(Self::BankTransfer),
            other => Err(Error::validation(format!(
                "Unknown payment method '{other}'"
            ))),
        }
    }
}

/// Address of one payment slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PaymentKey {
    /// Member the slot belongs to
    pub member_id: i64,
    /// Calendar year
    pub year: i32,
    /// Calendar month, 1-12
    pub month: u32,
}

impl PaymentKey {
    /// Builds a key without validation; see [`PaymentKey::validate`].
    #[must_use]
    pub const fn new(member_id: i64, year: i32, month: u32) -> Self {
        Self {
            member_id,
            year,
            month,
        }
    }

    /// Rejects months outside 1-12.
    pub fn validate(&self) -> Result<()> {
        if !(1..=12).contains(&self.month) {
            return Err(Error::validation(format!(
                "Month {} is outside 1-12",
                self.month
            )));
        }
        Ok(())
    }

    /// First calendar day of the slot's month.
    pub fn first_day(&self) -> Result<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            Error::validation(format!("Invalid month {}-{}", self.year, self.month))
        })
    }
}

/// Fields to merge into a slot. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentChanges {
    /// Expected amount
    pub expected_amount: Option<f64>,
    /// Amount received
    pub paid_amount: Option<f64>,
    /// New status; `Some(PaymentStatus::Unset)` clears it back to NULL
    pub status: Option<PaymentStatus>,
    /// Exemption reason
    pub exemption_reason: Option<ExemptionReason>,
    /// Payment date
    pub payment_date: Option<NaiveDate>,
    /// Payment method
    pub payment_method: Option<PaymentMethod>,
    /// Notes
    pub notes: Option<String>,
    /// Annual payment flag
    pub is_annual_payment: Option<bool>,
    /// Annual payment group
    pub annual_payment_group_id: Option<String>,
}

impl PaymentChanges {
    /// A payment of `amount` received by `method`.
    #[must_use]
    pub fn paid(amount: f64, method: PaymentMethod) -> Self {
        Self {
            status: Some(PaymentStatus::Paid),
            paid_amount: Some(amount),
            payment_method: Some(method),
            ..Self::default()
        }
    }

    /// An exempt month with the given reason.
    #[must_use]
    pub fn exempt(reason: ExemptionReason) -> Self {
        Self {
            status: Some(PaymentStatus::Exempt),
            exemption_reason: Some(reason),
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        for amount in [self.expected_amount, self.paid_amount].into_iter().flatten() {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Error::InvalidAmount { amount });
            }
        }
        Ok(())
    }
}

/// Typed status of a stored record.
pub fn status_of(record: &payment::Model) -> Result<PaymentStatus> {
    PaymentStatus::from_column(record.status.as_deref())
}

/// Finds the record for a slot, if any.
pub async fn find_payment<C>(db: &C, key: PaymentKey) -> Result<Option<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find()
        .filter(payment::Column::MemberId.eq(key.member_id))
        .filter(payment::Column::PaymentYear.eq(key.year))
        .filter(payment::Column::PaymentMonth.eq(month_column(key.month)))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a record by id.
pub async fn get_payment<C>(db: &C, payment_id: i64) -> Result<Option<payment::Model>>
where
    C: ConnectionTrait,
{
    Payment::find_by_id(payment_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates or merges the record for `key`.
///
/// When the resulting status is `paid`, the record was not already paid with a date, and no
/// `payment_date` is supplied, `today` is stamped as the payment date.
pub async fn upsert_payment<C>(
    db: &C,
    key: PaymentKey,
    changes: PaymentChanges,
    actor: &str,
    today: NaiveDate,
) -> Result<payment::Model>
where
    C: ConnectionTrait,
{
    key.validate()?;
    changes.validate()?;

    crate::core::member::find_member(db, key.member_id)
        .await?
        .ok_or_else(|| Error::not_found("Member", key.member_id))?;

    let now = Utc::now().naive_utc();

    if let Some(existing) = find_payment(db, key).await? {
        let already_dated_paid =
            status_of(&existing)? == PaymentStatus::Paid && existing.payment_date.is_some();
        let stamp = changes.status == Some(PaymentStatus::Paid)
            && changes.payment_date.is_none()
            && !already_dated_paid;

        let mut active_model: payment::ActiveModel = existing.into();
        apply_changes(&mut active_model, changes);
        if stamp {
            active_model.payment_date = Set(Some(today));
        }
        active_model.updated_at = Set(now);
        return Ok(active_model.update(db).await?);
    }

    let stamp = changes.status == Some(PaymentStatus::Paid) && changes.payment_date.is_none();
    let mut active_model = payment::ActiveModel {
        member_id: Set(key.member_id),
        payment_year: Set(key.year),
        payment_month: Set(month_column(key.month)),
        expected_amount: Set(None),
        paid_amount: Set(None),
        status: Set(None),
        exemption_reason: Set(None),
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
    apply_changes(&mut active_model, changes);
    if stamp {
        active_model.payment_date = Set(Some(today));
    }
    Ok(active_model.insert(db).await?)
}

fn apply_changes(model: &mut payment::ActiveModel, changes: PaymentChanges) {
    if let Some(amount) = changes.expected_amount {
        model.expected_amount = Set(Some(amount));
    }
    if let Some(amount) = changes.paid_amount {
        model.paid_amount = Set(Some(amount));
    }
    if let Some(status) = changes.status {
        model.status = Set(status.to_column());
    }
    if let Some(reason) = changes.exemption_reason {
        model.exemption_reason = Set(Some(reason.as_str().to_string()));
    }
    if let Some(date) = changes.payment_date {
        model.payment_date = Set(Some(date));
    }
    if let Some(method) = changes.payment_method {
        model.payment_method = Set(Some(method.as_str().to_string()));
    }
    if let Some(notes) = changes.notes {
        model.notes = Set(Some(notes));
    }
    if let Some(flag) = changes.is_annual_payment {
        model.is_annual_payment = Set(flag);
    }
    if let Some(group) = changes.annual_payment_group_id {
        model.annual_payment_group_id = Set(Some(group));
    }
}

/// Deletes a record. No other records are touched.
pub async fn delete_payment<C>(db: &C, payment_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let record = get_payment(db, payment_id)
        .await?
        .ok_or_else(|| Error::not_found("Payment", payment_id))?;
    record.delete(db).await?;
    Ok(())
}

/// Optional filters for [`list_payments`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PaymentFilter {
    /// Restrict to one year
    pub year: Option<i32>,
    /// Restrict to one month
    pub month: Option<u32>,
    /// Restrict to one member
    pub member_id: Option<i64>,
    /// Restrict to one status (`Unset` selects NULL)
    pub status: Option<PaymentStatus>,
}

/// Lists records ordered by year, month and member.
pub async fn list_payments<C>(db: &C, filter: PaymentFilter) -> Result<Vec<payment::Model>>
where
    C: ConnectionTrait,
{
    let mut query = Payment::find();
    if let Some(year) = filter.year {
        query = query.filter(payment::Column::PaymentYear.eq(year));
    }
    if let Some(month) = filter.month {
        query = query.filter(payment::Column::PaymentMonth.eq(month_column(month)));
    }
    if let Some(member_id) = filter.member_id {
        query = query.filter(payment::Column::MemberId.eq(member_id));
    }
    match filter.status.map(PaymentStatus::to_column) {
        Some(Some(status)) => query = query.filter(payment::Column::Status.eq(status)),
        Some(None) => query = query.filter(payment::Column::Status.is_null()),
        None => {}
    }

    query
        .order_by_asc(payment::Column::PaymentYear)
        .order_by_asc(payment::Column::PaymentMonth)
        .order_by_asc(payment::Column::MemberId)
        .all(db)
        .await
        .map_err(Into::into)
}

/// A member's twelve slots for one year, index 0 being January.
pub async fn member_year<C>(
    db: &C,
    member_id: i64,
    year: i32,
) -> Result<Vec<Option<payment::Model>>>
where
    C: ConnectionTrait,
{
    let records = list_payments(
        db,
        PaymentFilter {
            year: Some(year),
            member_id: Some(member_id),
            ..PaymentFilter::default()
        },
    )
    .await?;

    let mut months: Vec<Option<payment::Model>> = vec![None; 12];
    for record in records {
        if let Some(slot) = usize::try_from(record.payment_month - 1)
            .ok()
            .and_then(|index| months.get_mut(index))
        {
            *slot = Some(record);
        }
    }
    Ok(months)
}

/// Count and sums for one status.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusTotals {
    /// Number of records
    pub count: usize,
    /// Sum of expected amounts
    pub expected: f64,
    /// Sum of paid amounts
    pub paid: f64,
}

/// Aggregated view of a year's records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentStatistics {
    /// Year the statistics cover
    pub year: i32,
    /// Totals grouped by status
    pub by_status: BTreeMap<PaymentStatus, StatusTotals>,
    /// Number of records
    pub record_count: usize,
    /// Sum of expected amounts
    pub total_expected: f64,
    /// Cash actually collected; annual payments count once
    pub total_collected: f64,
}

/// Groups a year's records by status and sums their amounts.
pub async fn year_statistics<C>(db: &C, year: i32) -> Result<PaymentStatistics>
where
    C: ConnectionTrait,
{
    let records = list_payments(
        db,
        PaymentFilter {
            year: Some(year),
            ..PaymentFilter::default()
        },
    )
    .await?;

    let mut stats = PaymentStatistics {
        year,
        ..PaymentStatistics::default()
    };
    for record in &records {
        let expected = record.expected_amount.unwrap_or(0.0);
        let paid = record.paid_amount.unwrap_or(0.0);

        let totals = stats.by_status.entry(status_of(record)?).or_default();
        totals.count += 1;
        totals.expected += expected;
        totals.paid += paid;

        stats.total_expected += expected;
        stats.total_collected += paid;
    }
    stats.record_count = records.len();
    Ok(stats)
}

/// Formats year statistics into a human-readable summary string.
#[must_use]
pub fn format_statistics_summary(stats: &PaymentStatistics) -> String {
    use std::fmt::Write;

    let mut summary = format!(
        "Payments {} - {} records | expected {:.2} | collected {:.2}\n",
        stats.year, stats.record_count, stats.total_expected, stats.total_collected
    );
    for (status, totals) in &stats.by_status {
        // Writing to a String cannot fail
        let _ = writeln!(
            summary,
            "  {status:<8} {:>5} | expected {:>10.2} | paid {:>10.2}",
            totals.count, totals.expected, totals.paid
        );
    }
    summary
}

fn month_column(month: u32) -> i32 {
    i32::try_from(month).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_upsert_rejects_invalid_month() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        for month in [0, 13] {
            let result = upsert_payment(
                &db,
                PaymentKey::new(1, 2025, month),
                PaymentChanges::default(),
                ACTOR,
                today(),
            )
            .await;
            assert!(matches!(result, Err(Error::Validation { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_amounts() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        for amount in [-1.0, f64::NAN, f64::INFINITY] {
            let result = upsert_payment(
                &db,
                PaymentKey::new(1, 2025, 1),
                PaymentChanges::paid(amount, PaymentMethod::Cash),
                ACTOR,
                today(),
            )
            .await;
            assert!(matches!(result, Err(Error::InvalidAmount { .. })));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_unknown_member() -> Result<()> {
        let db = setup_test_db().await?;
        let result = upsert_payment(
            &db,
            PaymentKey::new(42, 2025, 1),
            PaymentChanges::default(),
            ACTOR,
            today(),
        )
        .await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Member", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_creates_unset_slot() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let record = upsert_payment(
            &db,
            PaymentKey::new(member.id, 2027, 3),
            PaymentChanges {
                expected_amount: Some(2500.0),
                ..PaymentChanges::default()
            },
            ACTOR,
            today(),
        )
        .await?;

        assert_eq!(record.status, None);
        assert_eq!(status_of(&record)?, PaymentStatus::Unset);
        assert_eq!(record.expected_amount, Some(2500.0));
        assert_eq!(record.created_by, ACTOR);
        assert!(!record.is_annual_payment);
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_merges_into_single_record() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let key = PaymentKey::new(member.id, 2025, 2);

        upsert_payment(
            &db,
            key,
            PaymentChanges {
                expected_amount: Some(2500.0),
                status: Some(PaymentStatus::Pending),
                notes: Some("first".to_string()),
                ..PaymentChanges::default()
            },
            ACTOR,
            today(),
        )
        .await?;
        upsert_payment(
            &db,
            key,
            PaymentChanges {
                status: Some(PaymentStatus::Overdue),
                notes: Some("second".to_string()),
                ..PaymentChanges::default()
            },
            ACTOR,
            today(),
        )
        .await?;

        let records = list_payments(
            &db,
            PaymentFilter {
                member_id: Some(member.id),
                ..PaymentFilter::default()
            },
        )
        .await?;
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(status_of(record)?, PaymentStatus::Overdue);
        assert_eq!(record.expected_amount, Some(2500.0));
        assert_eq!(record.notes.as_deref(), Some("second"));
        Ok(())
    }

    #[tokio::test]
    async fn test_upsert_same_changes_twice_is_idempotent() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let key = PaymentKey::new(member.id, 2025, 4);
        let changes = PaymentChanges {
            payment_date: Some(ymd(2025, 4, 3)),
            ..PaymentChanges::paid(2500.0, PaymentMethod::Card)
        };

        let first = upsert_payment(&db, key, changes.clone(), ACTOR, today()).await?;
        let second = upsert_payment(&db, key, changes, ACTOR, today()).await?;

        assert_eq!(first.id, second.id);
        assert_eq!(second.paid_amount, Some(2500.0));
        assert_eq!(second.payment_method.as_deref(), Some("card"));
        assert_eq!(second.payment_date, Some(ymd(2025, 4, 3)));
        Ok(())
    }

    #[tokio::test]
    async fn test_paid_transition_stamps_today() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let key = PaymentKey::new(member.id, 2025, 5);
        let stamp_day = ymd(2025, 5, 20);

        upsert_payment(
            &db,
            key,
            PaymentChanges {
                status: Some(PaymentStatus::Pending),
                ..PaymentChanges::default()
            },
            ACTOR,
            stamp_day,
        )
        .await?;
        let paid = upsert_payment(
            &db,
            key,
            PaymentChanges::paid(2500.0, PaymentMethod::Cash),
            ACTOR,
            stamp_day,
        )
        .await?;
        assert_eq!(paid.payment_date, Some(stamp_day));

        // A later edit that keeps the record paid does not move the date
        let edited = upsert_payment(
            &db,
            key,
            PaymentChanges::paid(3000.0, PaymentMethod::Cash),
            ACTOR,
            ymd(2025, 6, 1),
        )
        .await?;
        assert_eq!(edited.payment_date, Some(stamp_day));
        assert_eq!(edited.paid_amount, Some(3000.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_explicit_payment_date_wins() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let record = upsert_payment(
            &db,
            PaymentKey::new(member.id, 2024, 11),
            PaymentChanges {
                payment_date: Some(ymd(2024, 11, 1)),
                ..PaymentChanges::paid(2000.0, PaymentMethod::BankTransfer)
            },
            ACTOR,
            ymd(2025, 1, 15),
        )
        .await?;
        assert_eq!(record.payment_date, Some(ymd(2024, 11, 1)));
        Ok(())
    }

    #[tokio::test]
    async fn test_status_can_be_cleared_to_unset() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let key = PaymentKey::new(member.id, 2025, 8);
        upsert_payment(
            &db,
            key,
            PaymentChanges {
                status: Some(PaymentStatus::Pending),
                ..PaymentChanges::default()
            },
            ACTOR,
            today(),
        )
        .await?;
        let cleared = upsert_payment(
            &db,
            key,
            PaymentChanges {
                status: Some(PaymentStatus::Unset),
                ..PaymentChanges::default()
            },
            ACTOR,
            today(),
        )
        .await?;
        assert_eq!(cleared.status, None);

        let unset = list_payments(
            &db,
            PaymentFilter {
                status: Some(PaymentStatus::Unset),
                ..PaymentFilter::default()
            },
        )
        .await?;
        assert_eq!(unset.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_payment() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        let record = upsert_payment(
            &db,
            PaymentKey::new(member.id, 2025, 1),
            PaymentChanges::exempt(ExemptionReason::Other),
            ACTOR,
            today(),
        )
        .await?;

        delete_payment(&db, record.id).await?;
        assert!(get_payment(&db, record.id).await?.is_none());

        let again = delete_payment(&db, record.id).await;
        assert!(matches!(again, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_member_year_places_records_by_month() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        for month in [1, 6, 12] {
            upsert_payment(
                &db,
                PaymentKey::new(member.id, 2025, month),
                PaymentChanges::paid(100.0, PaymentMethod::Cash),
                ACTOR,
                today(),
            )
            .await?;
        }

        let months = member_year(&db, member.id, 2025).await?;
        assert_eq!(months.len(), 12);
        let filled: Vec<usize> = months
            .iter()
            .enumerate()
            .filter_map(|(i, m)| m.as_ref().map(|_| i))
            .collect();
        assert_eq!(filled, vec![0, 5, 11]);
        Ok(())
    }

    #[tokio::test]
    async fn test_year_statistics_groups_by_status() -> Result<()> {
        let (db, member) = setup_with_member().await?;
        upsert_payment(
            &db,
            PaymentKey::new(member.id, 2025, 1),
            PaymentChanges {
                expected_amount: Some(2500.0),
                ..PaymentChanges::paid(2500.0, PaymentMethod::Cash)
            },
            ACTOR,
            today(),
        )
        .await?;
        upsert_payment(
            &db,
            PaymentKey::new(member.id, 2025, 2),
            PaymentChanges {
                expected_amount: Some(2500.0),
                status: Some(PaymentStatus::Pending),
                ..PaymentChanges::default()
            },
            ACTOR,
            today(),
        )
        .await?;
        upsert_payment(
            &db,
            PaymentKey::new(member.id, 2026, 1),
            PaymentChanges::paid(999.0, PaymentMethod::Cash),
            ACTOR,
            today(),
        )
        .await?;

        let stats = year_statistics(&db, 2025).await?;
        assert_eq!(stats.record_count, 2);
        assert_eq!(stats.total_expected, 5000.0);
        assert_eq!(stats.total_collected, 2500.0);
        assert_eq!(stats.by_status[&PaymentStatus::Paid].count, 1);
        assert_eq!(stats.by_status[&PaymentStatus::Pending].count, 1);
        assert!(!stats.by_status.contains_key(&PaymentStatus::Exempt));

        let summary = format_statistics_summary(&stats);
        assert!(summary.contains("Payments 2025"));
        assert!(summary.contains("pending"));
        Ok(())
    }

    #[test]
    fn test_status_column_round_trip_keeps_unset_distinct() {
        assert_eq!(PaymentStatus::from_column(None).unwrap(), PaymentStatus::Unset);
        assert_eq!(
            PaymentStatus::from_column(Some("pending")).unwrap(),
            PaymentStatus::Pending
        );
        assert_eq!(PaymentStatus::Unset.to_column(), None);
        assert_eq!(PaymentStatus::Pending.to_column().as_deref(), Some("pending"));
        assert!(PaymentStatus::from_column(Some("late")).is_err());
    }

    #[test]
    fn test_payment_method_parsing() {
        assert_eq!(
            "Bank Transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
        assert_eq!("CASH".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }
}
