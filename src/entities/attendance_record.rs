//! Attendance record entity - Whether a member was present at a session.
//!
//! Unique on (`member_id`, `session_id`). A missing record reads as "not present".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Attendance record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "attendance_records")]
pub struct Model {
    /// Unique identifier for the record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the member
    pub member_id: i64,
    /// ID of the session
    pub session_id: i64,
    /// Whether the member attended
    pub present: bool,
}

/// Defines relationships between `AttendanceRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record belongs to one member
    #[sea_orm(
        belongs_to = "super::member::Entity",
        from = "Column::MemberId",
        to = "super::member::Column::Id"
    )]
    Member,
    /// Each record belongs to one session
    #[sea_orm(
        belongs_to = "super::attendance_session::Entity",
        from = "Column::SessionId",
        to = "super::attendance_session::Column::Id"
    )]
    Session,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Member.def()
    }
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Session.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
