//! Shared test utilities for the club ledger.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        attendance::{DEFAULT_SESSION_TYPE, create_session, ensure_session_type},
        category::create_category,
        member::{NewMember, create_member},
    },
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::{ConnectionTrait, DatabaseConnection};

/// Actor recorded as `created_by` in tests.
pub const ACTOR: &str = "test_user";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Builds a date, panicking on invalid input. Test use only.
#[allow(clippy::unwrap_used)]
pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

/// Fixed "today" so classification results do not depend on the clock.
pub fn today() -> NaiveDate {
    ymd(2025, 6, 1)
}

/// Creates an active, billed member with the next free membership number.
pub async fn create_test_member(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::member::Model> {
    create_member(db, NewMember::named(name), today()).await
}

/// Creates a member with an explicit membership number.
pub async fn create_test_member_with_number(
    db: &DatabaseConnection,
    name: &str,
    membership_number: i64,
) -> Result<entities::member::Model> {
    create_member(
        db,
        NewMember {
            membership_number: Some(membership_number),
            ..NewMember::named(name)
        },
        today(),
    )
    .await
}

/// Creates a member with an email on record.
pub async fn create_member_with_email(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
) -> Result<entities::member::Model> {
    create_member(
        db,
        NewMember {
            email: Some(email.to_string()),
            ..NewMember::named(name)
        },
        today(),
    )
    .await
}

/// Sets up a complete test environment with one member.
/// Returns (db, member) for common test scenarios.
pub async fn setup_with_member() -> Result<(DatabaseConnection, entities::member::Model)> {
    let db = setup_test_db().await?;
    let member = create_test_member(&db, "Test Member").await?;
    Ok((db, member))
}

/// Creates Junior (0-17), Senior (18-99) and a non-age-based Honorary category.
pub async fn create_standard_categories(
    db: &DatabaseConnection,
) -> Result<(
    entities::category::Model,
    entities::category::Model,
    entities::category::Model,
)> {
    let junior = create_category(db, "Junior", true, Some(0), Some(17)).await?;
    let senior = create_category(db, "Senior", true, Some(18), Some(99)).await?;
    let honorary = create_category(db, "Honorary", false, None, None).await?;
    Ok((junior, senior, honorary))
}

/// Creates a session of the default type on `date`.
pub async fn create_test_session(
    db: &DatabaseConnection,
    date: NaiveDate,
) -> Result<entities::attendance_session::Model> {
    let session_type = ensure_session_type(db, DEFAULT_SESSION_TYPE).await?;
    create_session(db, date, session_type.id, None).await
}

/// Installs a trigger that aborts any payment insert for `month`, to force a write
/// failure part-way through a batch.
pub async fn fail_payment_inserts_for_month(db: &DatabaseConnection, month: u32) -> Result<()> {
    db.execute_unprepared(&format!(
        "CREATE TRIGGER fail_payment_month_{month} BEFORE INSERT ON payments \
         WHEN NEW.payment_month = {month} \
         BEGIN SELECT RAISE(ABORT, 'payment month {month} is locked'); END;"
    ))
    .await?;
    Ok(())
}
