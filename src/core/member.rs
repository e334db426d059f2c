//! Member business logic - Handles member creation, lookup and updates.
//!
//! Every read of a single member and every write touching the birth date re-runs
//! category classification, so age-based categories stay current without a scheduler.

use crate::{
    core::category::refresh_member_category,
    entities::{Member, member},
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{QueryOrder, Set, prelude::*};
use std::fmt;
use std::str::FromStr;

/// Whether a member is billed for dues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExemptionStatus {
    /// Regular, billed member
    None,
    /// Honorary member
    Pocasni,
    /// Associate member
    Saradnik,
}

impl ExemptionStatus {
    /// Value stored in the `exemption_status` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pocasni => "pocasni",
            Self::Saradnik => "saradnik",
        }
    }

    /// Whether the member is exempt from dues.
    #[must_use]
    pub const fn is_exempt(self) -> bool {
        !matches!(self, Self::None)
    }
}

impl FromStr for ExemptionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "pocasni" => Ok(Self::Pocasni),
            "saradnik" => Ok(Self::Saradnik),
            other => Err(Error::validation(format!(
                "Unknown exemption status '{other}'"
            ))),
        }
    }
}

impl fmt::Display for ExemptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads the typed exemption status of a member row.
pub fn exemption_status_of(member: &member::Model) -> Result<ExemptionStatus> {
    member.exemption_status.parse()
}

/// Input for creating a member.
#[derive(Debug, Clone)]
pub struct NewMember {
    /// Full name
    pub name: String,
    /// Optional contact email
    pub email: Option<String>,
    /// Explicit membership number; assigned as current maximum + 1 when `None`
    pub membership_number: Option<i64>,
    /// Optional birth date
    pub date_of_birth: Option<NaiveDate>,
    /// Manually chosen category
    pub category_id: Option<i64>,
    /// Exemption status
    pub exemption_status: ExemptionStatus,
    /// Whether the member is active
    pub is_active: bool,
}

impl NewMember {
    /// An active, billed member with only a name set.
    #[must_use]
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            email: None,
            membership_number: None,
            date_of_birth: None,
            category_id: None,
            exemption_status: ExemptionStatus::None,
            is_active: true,
        }
    }
}

/// Returns the next free membership number (current maximum + 1, starting at 1).
pub async fn next_membership_number<C>(db: &C) -> Result<i64>
where
    C: ConnectionTrait,
{
    let highest = Member::find()
        .order_by_desc(member::Column::MembershipNumber)
        .one(db)
        .await?;
    Ok(highest.map_or(1, |m| m.membership_number + 1))
}

/// Creates a member and classifies it into an age-based category when possible.
pub async fn create_member<C>(db: &C, new: NewMember, as_of: NaiveDate) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let name = new.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Member name cannot be empty"));
    }

    let membership_number = match new.membership_number {
        Some(number) => {
            if find_by_membership_number(db, number).await?.is_some() {
                return Err(Error::Conflict {
                    message: format!("Membership number {number} is already taken"),
                });
            }
            number
        }
        None => next_membership_number(db).await?,
    };

    let now = Utc::now().naive_utc();
    let model = member::ActiveModel {
        name: Set(name),
        email: Set(new.email.map(|e| e.trim().to_string()).filter(|e| !e.is_empty())),
        membership_number: Set(membership_number),
        date_of_birth: Set(new.date_of_birth),
        category_id: Set(new.category_id),
        exemption_status: Set(new.exemption_status.as_str().to_string()),
        is_active: Set(new.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = model.insert(db).await?;
    refresh_member_category(db, created, as_of).await
}

/// Loads a member by id, refreshing its category as of `as_of`.
pub async fn get_member<C>(db: &C, member_id: i64, as_of: NaiveDate) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let member = Member::find_by_id(member_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Member", member_id))?;
    refresh_member_category(db, member, as_of).await
}

/// Finds a member by id without any side effects.
pub async fn find_member<C>(db: &C, member_id: i64) -> Result<Option<member::Model>>
where
    C: ConnectionTrait,
{
    Member::find_by_id(member_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a member by membership number.
pub async fn find_by_membership_number<C>(
    db: &C,
    membership_number: i64,
) -> Result<Option<member::Model>>
where
    C: ConnectionTrait,
{
    Member::find()
        .filter(member::Column::MembershipNumber.eq(membership_number))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a member by email, ignoring case.
pub async fn find_by_email<C>(db: &C, email: &str) -> Result<Option<member::Model>>
where
    C: ConnectionTrait,
{
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Ok(None);
    }

    Member::find()
        .filter(Expr::expr(Func::lower(Expr::col(member::Column::Email))).eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists active members ordered by membership number.
pub async fn list_active_members<C>(db: &C) -> Result<Vec<member::Model>>
where
    C: ConnectionTrait,
{
    Member::find()
        .filter(member::Column::IsActive.eq(true))
        .order_by_asc(member::Column::MembershipNumber)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn require_member<C>(db: &C, member_id: i64) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    find_member(db, member_id)
        .await?
        .ok_or_else(|| Error::not_found("Member", member_id))
}

/// Changes a member's birth date and reclassifies.
pub async fn update_date_of_birth<C>(
    db: &C,
    member_id: i64,
    date_of_birth: Option<NaiveDate>,
    as_of: NaiveDate,
) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let member = require_member(db, member_id).await?;

    let mut active_model: member::ActiveModel = member.into();
    active_model.date_of_birth = Set(date_of_birth);
    active_model.updated_at = Set(Utc::now().naive_utc());
    let updated = active_model.update(db).await?;

    refresh_member_category(db, updated, as_of).await
}

/// Manually assigns a category. Passing a non-age-based category pins the member to it.
pub async fn assign_category<C>(
    db: &C,
    member_id: i64,
    category_id: Option<i64>,
) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let member = require_member(db, member_id).await?;
    if let Some(id) = category_id {
        crate::core::category::get_category_by_id(db, id)
            .await?
            .ok_or_else(|| Error::not_found("Category", id))?;
    }

    let mut active_model: member::ActiveModel = member.into();
    active_model.category_id = Set(category_id);
    active_model.updated_at = Set(Utc::now().naive_utc());
    Ok(active_model.update(db).await?)
}

/// Sets a member's exemption status. Returns the member unchanged if it already matches.
pub async fn set_exemption_status<C>(
    db: &C,
    member_id: i64,
    status: ExemptionStatus,
) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let member = require_member(db, member_id).await?;
    if member.exemption_status == status.as_str() {
        return Ok(member);
    }

    let mut active_model: member::ActiveModel = member.into();
    active_model.exemption_status = Set(status.as_str().to_string());
    active_model.updated_at = Set(Utc::now().naive_utc());
    Ok(active_model.update(db).await?)
}

/// Fills in a member's email if none is recorded yet.
pub async fn backfill_email<C>(db: &C, member: member::Model, email: &str) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let email = email.trim();
    if member.email.is_some() || email.is_empty() {
        return Ok(member);
    }

    let mut active_model: member::ActiveModel = member.into();
    active_model.email = Set(Some(email.to_string()));
    active_model.updated_at = Set(Utc::now().naive_utc());
    Ok(active_model.update(db).await?)
}

/// Marks a member active or inactive.
pub async fn set_active<C>(db: &C, member_id: i64, is_active: bool) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let member = require_member(db, member_id).await?;

    let mut active_model: member::ActiveModel = member.into();
    active_model.is_active = Set(is_active);
    active_model.updated_at = Set(Utc::now().naive_utc());
    Ok(active_model.update(db).await?)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_create_member_rejects_empty_name() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let result = create_member(&db, NewMember::named("   "), today()).await;
        assert!(matches!(result, Err(Error::Validation { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_membership_numbers_are_sequential() -> Result<()> {
        let db = setup_test_db().await?;

        let first = create_member(&db, NewMember::named("Ana"), today()).await?;
        let second = create_member(&db, NewMember::named("Bojan"), today()).await?;
        let explicit = create_member(
            &db,
            NewMember {
                membership_number: Some(40),
                ..NewMember::named("Ceca")
            },
            today(),
        )
        .await?;
        let after_gap = create_member(&db, NewMember::named("Dragan"), today()).await?;

        assert_eq!(first.membership_number, 1);
        assert_eq!(second.membership_number, 2);
        assert_eq!(explicit.membership_number, 40);
        assert_eq!(after_gap.membership_number, 41);

        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_membership_number_conflicts() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_member_with_number(&db, "Ana", 7).await?;

        let result = create_member(
            &db,
            NewMember {
                membership_number: Some(7),
                ..NewMember::named("Bojan")
            },
            today(),
        )
        .await;
        assert!(matches!(result, Err(Error::Conflict { .. })));

        Ok(())
    }

    #[tokio::test]
    async fn test_find_by_email_ignores_case() -> Result<()> {
        let db = setup_test_db().await?;
        let created = create_member(
            &db,
            NewMember {
                email: Some("Ana.Petrovic@Example.com".to_string()),
                ..NewMember::named("Ana")
            },
            today(),
        )
        .await?;

        let found = find_by_email(&db, "  ana.petrovic@example.COM ").await?;
        assert_eq!(found.map(|m| m.id), Some(created.id));
        assert!(find_by_email(&db, "").await?.is_none());
        assert!(find_by_email(&db, "nobody@example.com").await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_list_active_members_skips_inactive() -> Result<()> {
        let db = setup_test_db().await?;
        let ana = create_test_member(&db, "Ana").await?;
        let bojan = create_test_member(&db, "Bojan").await?;
        set_active(&db, bojan.id, false).await?;

        let active = list_active_members(&db).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, ana.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_exemption_status() -> Result<()> {
        let db = setup_test_db().await?;
        let member = create_test_member(&db, "Ana").await?;
        assert_eq!(exemption_status_of(&member)?, ExemptionStatus::None);

        let updated = set_exemption_status(&db, member.id, ExemptionStatus::Saradnik).await?;
        assert_eq!(exemption_status_of(&updated)?, ExemptionStatus::Saradnik);

        Ok(())
    }

    #[tokio::test]
    async fn test_get_member_not_found() -> Result<()> {
        let db = setup_test_db().await?;
        let result = get_member(&db, 999, today()).await;
        assert!(matches!(result, Err(Error::NotFound { entity: "Member", .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_backfill_email_only_when_missing() -> Result<()> {
        let db = setup_test_db().await?;
        let member = create_test_member(&db, "Ana").await?;

        let filled = backfill_email(&db, member, "ana@example.com").await?;
        assert_eq!(filled.email.as_deref(), Some("ana@example.com"));

        let unchanged = backfill_email(&db, filled, "other@example.com").await?;
        assert_eq!(unchanged.email.as_deref(), Some("ana@example.com"));

        Ok(())
    }

    #[test]
    fn test_exemption_status_parsing() {
        assert_eq!("POCASNI".parse::<ExemptionStatus>().unwrap(), ExemptionStatus::Pocasni);
        assert_eq!("".parse::<ExemptionStatus>().unwrap(), ExemptionStatus::None);
        assert!("vip".parse::<ExemptionStatus>().is_err());
    }
}
