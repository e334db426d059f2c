//! Payment rate preset entity - Named shortcut mapping a month range to a monthly rate.
//!
//! Used to build the month-to-rate schedule consumed by year initialization.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment rate preset database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_rate_presets")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Preset name (e.g., "season", "summer")
    #[sea_orm(unique)]
    pub name: String,
    /// First month covered, inclusive
    pub start_month: i32,
    /// Last month covered, inclusive
    pub end_month: i32,
    /// Monthly rate applied to every covered month
    pub rate: f64,
}

/// Rate presets have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
