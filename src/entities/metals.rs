//! `SeaORM` Entity for metals table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "metals")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Internal code, e.g. "GOLD"
    #[sea_orm(unique)]
    pub symbol: String,
    pub name: String,
    /// Quotation unit with a currency prefix, e.g. "USD/oz"
    pub unit: String,
    pub created_at: Option<DateTimeUtc>,
    pub updated_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Currency the metal is quoted in, taken from the unit prefix ("USD/oz" -> "USD").
    ///
    /// Returns `None` when the unit carries no currency, e.g. a bare "gram".
    pub fn base_currency(&self) -> Option<String> {
        let (prefix, _) = self.unit.split_once('/')?;
        let prefix = prefix.trim();
        if prefix.len() == 3 && prefix.chars().all(|c| c.is_ascii_alphabetic()) {
            Some(prefix.to_uppercase())
        } else {
            None
        }
    }
}
