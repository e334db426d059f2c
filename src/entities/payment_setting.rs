//! Payment setting entity - Stores key-value pairs for payment configuration,
//! such as the scalar annual membership amount.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Payment setting database model - stores key-value configuration pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Configuration key (e.g., `"annual_amount"`)
    #[sea_orm(unique)]
    pub key: String,
    /// Configuration value stored as string
    pub value: String,
    /// When this setting was last modified
    pub updated_at: DateTime,
}

/// `PaymentSetting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
