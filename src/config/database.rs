//! Database configuration module for the club ledger.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! and the composite uniqueness rules of the ledger (one payment per member-month, one
//! attendance record per member-session, one session per type per day) are added as
//! unique indexes on top.

use crate::entities::{
    AttendanceRecord, AttendanceSession, Category, Member, Payment, PaymentRatePreset,
    PaymentSetting, SessionType, attendance_record, attendance_session, payment,
};
use crate::errors::Result;
use sea_orm::sea_query::{Index, IndexCreateStatement};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://club_ledger.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a default local `SQLite` file if not found.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    debug!(url = %database_url, "connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all tables and unique indexes if they do not exist yet.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Category).await?;
    create_table(db, &schema, Member).await?;
    create_table(db, &schema, Payment).await?;
    create_table(db, &schema, SessionType).await?;
    create_table(db, &schema, AttendanceSession).await?;
    create_table(db, &schema, AttendanceRecord).await?;
    create_table(db, &schema, PaymentRatePreset).await?;
    create_table(db, &schema, PaymentSetting).await?;

    create_index(
        db,
        Index::create()
            .name("idx_payments_member_slot")
            .table(Payment)
            .col(payment::Column::MemberId)
            .col(payment::Column::PaymentYear)
            .col(payment::Column::PaymentMonth)
            .unique()
            .if_not_exists()
            .to_owned(),
    )
    .await?;
    create_index(
        db,
        Index::create()
            .name("idx_attendance_records_member_session")
            .table(AttendanceRecord)
            .col(attendance_record::Column::MemberId)
            .col(attendance_record::Column::SessionId)
            .unique()
            .if_not_exists()
            .to_owned(),
    )
    .await?;
    create_index(
        db,
        Index::create()
            .name("idx_attendance_sessions_date_type")
            .table(AttendanceSession)
            .col(attendance_session::Column::Date)
            .col(attendance_session::Column::SessionTypeId)
            .unique()
            .if_not_exists()
            .to_owned(),
    )
    .await?;

    info!("Database tables ensured");
    Ok(())
}

async fn create_table<E: EntityTrait>(
    db: &DatabaseConnection,
    schema: &Schema,
    entity: E,
) -> Result<()> {
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

async fn create_index(db: &DatabaseConnection, statement: IndexCreateStatement) -> Result<()> {
    let builder = db.get_database_backend();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        attendance_record::Model as AttendanceRecordModel, category::Model as CategoryModel,
        member::Model as MemberModel, payment::Model as PaymentModel,
        payment_setting::Model as PaymentSettingModel,
    };
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<MemberModel> = Member::find().limit(1).all(&db).await?;
        let _: Vec<CategoryModel> = Category::find().limit(1).all(&db).await?;
        let _: Vec<PaymentModel> = Payment::find().limit(1).all(&db).await?;
        let _: Vec<AttendanceRecordModel> = AttendanceRecord::find().limit(1).all(&db).await?;
        let _: Vec<PaymentSettingModel> = PaymentSetting::find().limit(1).all(&db).await?;

        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_repeatable() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;
        Ok(())
    }
}
