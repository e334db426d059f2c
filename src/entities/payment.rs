//! Payment entity - One member's dues record for one month of one year.
//!
//! Records are unique on (`member_id`, `payment_year`, `payment_month`). The `status`
//! column is nullable: NULL means the slot exists but has not been triaged yet, which
//! is distinct from `"pending"`.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    /// Unique identifier for the payment record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the member this record belongs to
    pub member_id: i64,
    /// Calendar year of the dues month
    pub payment_year: i32,
    /// Calendar month of the dues, 1 through 12
    pub payment_month: i32,
    /// Amount the member is expected to pay for this month
    pub expected_amount: Option<f64>,
    /// Amount actually received
    pub paid_amount: Option<f64>,
    /// `"pending"`, `"paid"`, `"exempt"`, `"overdue"`, or NULL when untriaged
    pub status: Option<String>,
    /// `"pocasni"`, `"saradnik"` or `"other"` for exempt months
    pub exemption_reason: Option<String>,
    /// Date the payment was received
    pub payment_date: Option<Date>,
    /// `"cash"`, `"card"` or `"bank_transfer"`
    pub payment_method: Option<String>,
    /// Free-form administrator notes
    pub notes: Option<String>,
    /// Whether this month was covered by an annual payment
    pub is_annual_payment: bool,
    /// Correlates the twelve records produced by one annual payment
    pub annual_payment_group_id: Option<String>,
    /// Actor who created the record
    pub created_by: String,
    /// When the record was created
    pub created_at: DateTime,
    /// When the record was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Payment and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each payment record belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
