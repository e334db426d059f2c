//! Category entity - Membership categories such as "Junior" or "Honorary".
//!
//! Age-based categories carry an inclusive `[min_age, max_age]` window and are assigned
//! automatically; all other categories are only ever set by an administrator.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Junior", "Senior")
    #[sea_orm(unique)]
    pub name: String,
    /// Whether the classifier may assign this category automatically
    pub is_age_based: bool,
    /// Lower age bound, inclusive
    pub min_age: Option<i32>,
    /// Upper age bound, inclusive
    pub max_age: Option<i32>,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many members
    #[sea_orm(has_many = "super::member::Entity")]
    Members,
}

impl Related<super::member::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Members.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
