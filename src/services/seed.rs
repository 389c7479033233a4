use chrono::Utc;
use sea_orm::{DatabaseConnection, EntityTrait, Set};

use crate::entities::{metals, prelude::*};
use crate::error::MetalsError;

/// (symbol, name, unit). The central-bank listing quotes rubles per gram.
pub const DEFAULT_METALS: [(&str, &str, &str); 4] = [
    ("GOLD", "Gold", "RUB/g"),
    ("SILVER", "Silver", "RUB/g"),
    ("PLATINUM", "Platinum", "RUB/g"),
    ("PALLADIUM", "Palladium", "RUB/g"),
];

/// Insert the default metals when the table is empty. Returns how many rows
/// were created.
pub async fn seed_metals(db: &DatabaseConnection) -> Result<usize, MetalsError> {
    if Metals::find().one(db).await?.is_some() {
        tracing::debug!("Metals already present, skipping seed");
        return Ok(0);
    }

    let now = Utc::now();
    let rows = DEFAULT_METALS.iter().map(|(symbol, name, unit)| metals::ActiveModel {
        symbol: Set(symbol.to_string()),
        name: Set(name.to_string()),
        unit: Set(unit.to_string()),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    });

    Metals::insert_many(rows).exec(db).await?;
    tracing::info!("Seeded {} metals", DEFAULT_METALS.len());

    Ok(DEFAULT_METALS.len())
}
