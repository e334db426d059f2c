//! Member entity - Represents a club member whose dues and attendance are tracked.
//!
//! Each member carries a unique membership number, an optional birth date used for
//! age-based category assignment, and an exemption status that controls billing.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Member database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "members")]
pub struct Model {
    /// Unique identifier for the member
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Full name of the member
    pub name: String,
    /// Contact email, matched case-insensitively during CSV imports
    pub email: Option<String>,
    /// Club-issued membership number, unique across all members
    #[sea_orm(unique)]
    pub membership_number: i64,
    /// Birth date, drives automatic category assignment
    pub date_of_birth: Option<Date>,
    /// Current category, either auto-assigned by age or chosen manually
    pub category_id: Option<i64>,
    /// Exemption status: `"none"`, `"pocasni"` or `"saradnik"`
    pub exemption_status: String,
    /// Inactive members are excluded from year initialization and attendance grids
    pub is_active: bool,
    /// When the member was created
    pub created_at: DateTime,
    /// When the member was last modified
    pub updated_at: DateTime,
}

/// Defines relationships between Member and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each member optionally belongs to one category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
    /// One member has many payment records
    #[sea_orm(has_many = "super::payment::Entity")]
    Payments,
    /// One member has many attendance records
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    AttendanceRecords,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::payment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payments.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AttendanceRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
