//! Attendance session entity - A single club session on a calendar day.
//!
//! At most one session of each type may exist per day.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance session database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_sessions")]
pub struct Model {
    /// Unique identifier for the session
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Day the session took place
    pub date: Date,
    /// ID of the session type
    pub session_type_id: i64,
    /// Optional notes about the session
    pub notes: Option<String>,
}

/// Defines relationships between `AttendanceSession` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each session has one type
    #[sea_orm(
        belongs_to = "super::session_type::Entity",
        from = "Column::SessionTypeId",
        to = "super::session_type::Column::Id"
    )]
    SessionType,
    /// One session has many attendance records
    #[sea_orm(has_many = "super::attendance_record::Entity")]
    Records,
}

impl Related<super::session_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionType.def()
    }
}

impl Related<super::attendance_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Records.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
