//! Merges freshly scraped observations into `metal_prices`.
//!
//! Upserts by (metal, timestamp) inside one transaction per batch, then
//! appends the merged batch to the audit log.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::entities::{metal_prices, prelude::*};
use crate::error::MetalsError;
use crate::scrapers::PriceObservation;
use crate::services::audit_log::AuditLog;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    pub received: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Observations naming a metal that is not in the store
    pub skipped: usize,
}

impl ReconcileStats {
    pub fn merged(&self) -> usize {
        self.inserted + self.updated
    }
}

pub struct PriceReconciler {
    db: DatabaseConnection,
    audit: Arc<AuditLog>,
}

impl PriceReconciler {
    pub fn new(db: DatabaseConnection, audit: Arc<AuditLog>) -> Self {
        Self { db, audit }
    }

    /// Apply `batch` in order. A later observation for the same metal and
    /// timestamp overwrites the earlier price. Any store error rolls back
    /// the whole batch.
    pub async fn reconcile(
        &self,
        batch: &[PriceObservation],
    ) -> Result<ReconcileStats, MetalsError> {
        let mut stats = ReconcileStats {
            received: batch.len(),
            ..Default::default()
        };

        if batch.is_empty() {
            return Ok(stats);
        }

        let metal_ids: HashMap<String, i32> = Metals::find()
            .all(&self.db)
            .await?
            .into_iter()
            .map(|metal| (metal.symbol.to_uppercase(), metal.id))
            .collect();

        let mut resolved = Vec::with_capacity(batch.len());
        for observation in batch {
            match metal_ids.get(&observation.symbol.to_uppercase()) {
                Some(metal_id) => resolved.push((*metal_id, observation)),
                None => {
                    let e = MetalsError::UnknownEntity(observation.symbol.clone());
                    warn!(error = %e, "Skipping observation");
                    stats.skipped += 1;
                }
            }
        }

        if resolved.is_empty() {
            info!("No observations matched a known metal, nothing to merge");
            return Ok(stats);
        }

        let txn = self.db.begin().await?;

        if let Err(e) = apply_batch(&txn, &resolved, &mut stats).await {
            error!(error = %e, "Price batch failed, rolling back");
            if let Err(rollback_err) = txn.rollback().await {
                error!(error = %rollback_err, "Rollback failed");
            }
            return Err(e.into());
        }

        txn.commit().await?;

        info!(
            inserted = stats.inserted,
            updated = stats.updated,
            skipped = stats.skipped,
            "Merged price batch"
        );

        // Prices are already committed; an audit failure is only reported
        let merged: Vec<PriceObservation> = resolved.into_iter().map(|(_, o)| o.clone()).collect();
        if let Err(e) = self.audit.append(&merged).await {
            error!(error = %e, "Failed to append batch to audit log");
        }

        Ok(stats)
    }
}

/// Upsert every resolved observation on `txn`, in batch order.
async fn apply_batch(
    txn: &DatabaseTransaction,
    resolved: &[(i32, &PriceObservation)],
    stats: &mut ReconcileStats,
) -> Result<(), DbErr> {
    let now = Utc::now();

    for (metal_id, observation) in resolved {
        let existing = MetalPrices::find()
            .filter(metal_prices::Column::MetalId.eq(*metal_id))
            .filter(metal_prices::Column::Timestamp.eq(observation.timestamp))
            .one(txn)
            .await?;

        match existing {
            Some(row) => {
                if row.price != observation.price {
                    debug!(
                        symbol = %observation.symbol,
                        timestamp = %observation.timestamp,
                        old = row.price,
                        new = observation.price,
                        "Overwriting revised price"
                    );
                }
                let mut active: metal_prices::ActiveModel = row.into();
                active.price = Set(observation.price);
                active.update(txn).await?;
                stats.updated += 1;
            }
            None => {
                metal_prices::ActiveModel {
                    metal_id: Set(*metal_id),
                    price: Set(observation.price),
                    timestamp: Set(observation.timestamp),
                    created_at: Set(Some(now)),
                    ..Default::default()
                }
                .insert(txn)
                .await?;
                stats.inserted += 1;
            }
        }
    }

    Ok(())
}
