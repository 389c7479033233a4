//! `SeaORM` Entity for metal_analyses table (append-only analysis snapshots)

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "metal_analyses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub metal_id: i32,
    /// 'up', 'down', 'unchanged'
    pub trend: String,
    /// 'low', 'medium', 'high'
    pub volatility: String,
    /// 'positive', 'negative', 'neutral'
    pub sentiment: String,
    pub period_start: DateTimeUtc,
    pub period_end: DateTimeUtc,
    pub created_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
