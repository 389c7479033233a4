use std::sync::Arc;
use tokio::sync::Mutex;

use crate::error::MetalsError;
use crate::scrapers::{PriceObservation, PriceSource};
use crate::services::reconciler::{PriceReconciler, ReconcileStats};

/// One fetch-and-merge pass. Shared by the scheduler and the manual
/// trigger; passes never overlap.
pub struct PriceIngestion {
    source: Arc<dyn PriceSource>,
    reconciler: PriceReconciler,
    cycle_lock: Mutex<()>,
}

impl PriceIngestion {
    pub fn new(source: Arc<dyn PriceSource>, reconciler: PriceReconciler) -> Self {
        Self {
            source,
            reconciler,
            cycle_lock: Mutex::new(()),
        }
    }

    pub async fn run_cycle(&self) -> Result<ReconcileStats, MetalsError> {
        let _guard = self.cycle_lock.lock().await;

        let observations = self.source.fetch().await?;
        let batch: Vec<PriceObservation> = observations
            .into_iter()
            .map(|mut observation| {
                observation.symbol = observation.symbol.trim().to_uppercase();
                observation
            })
            .collect();

        self.reconciler.reconcile(&batch).await
    }
}
