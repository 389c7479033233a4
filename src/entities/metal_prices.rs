//! `SeaORM` Entity for metal_prices table
//!
//! At most one row per (metal_id, timestamp), enforced by a unique index.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "metal_prices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub metal_id: i32,
    #[sea_orm(column_type = "Double")]
    pub price: f64,
    pub timestamp: DateTimeUtc,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
