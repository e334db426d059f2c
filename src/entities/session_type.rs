//! Session type entity - Kinds of club sessions (e.g., "Training", "Match").

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Session type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "session_types")]
pub struct Model {
    /// Unique identifier for the session type
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Name of the session type
    #[sea_orm(unique)]
    pub name: String,
}

/// Defines relationships between `SessionType` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One session type has many sessions
    #[sea_orm(has_many = "super::attendance_session::Entity")]
    Sessions,
}

impl Related<super::attendance_session::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sessions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
