//! Price Updater Job
//!
//! Background loop that runs one ingestion cycle, then sleeps for the
//! configured interval, until stopped. A failed cycle is logged and retried
//! on the next tick; there is no backoff.
//!
//! Stopping is cooperative: the token is only observed between cycles, so an
//! in-flight fetch/merge always finishes before the loop exits.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::services::ingestion::PriceIngestion;

struct RunningLoop {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct PriceUpdater {
    ingestion: Arc<PriceIngestion>,
    interval: Duration,
    running: Mutex<Option<RunningLoop>>,
}

impl PriceUpdater {
    pub fn new(ingestion: Arc<PriceIngestion>, interval: Duration) -> Self {
        Self {
            ingestion,
            interval,
            running: Mutex::new(None),
        }
    }

    /// Launch the background loop. No-op (returns `false`) when it is
    /// already running. Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut running = self.running.lock();

        if let Some(current) = running.as_ref() {
            if !current.handle.is_finished() {
                debug!("Price updater already running");
                return false;
            }
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(update_loop(
            self.ingestion.clone(),
            self.interval,
            cancel.clone(),
        ));

        info!(interval_secs = self.interval.as_secs(), "Price updater started");
        *running = Some(RunningLoop { cancel, handle });
        true
    }

    /// Signal the loop to exit and wait until it has fully terminated.
    pub async fn stop(&self) {
        let running = self.running.lock().take();
        let Some(running) = running else {
            return;
        };

        running.cancel.cancel();
        if let Err(e) = running.handle.await {
            error!(error = %e, "Price updater task ended abnormally");
        }

        info!("Price updater stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .as_ref()
            .is_some_and(|current| !current.handle.is_finished())
    }
}

async fn update_loop(ingestion: Arc<PriceIngestion>, interval: Duration, cancel: CancellationToken) {
    let mut cycle: u64 = 0;

    while !cancel.is_cancelled() {
        cycle += 1;

        // Separate task so a panic inside a cycle cannot take the loop down
        let ingestion = ingestion.clone();
        let outcome = tokio::spawn(async move { ingestion.run_cycle().await }).await;

        match outcome {
            Ok(Ok(stats)) => info!(
                cycle,
                received = stats.received,
                inserted = stats.inserted,
                updated = stats.updated,
                skipped = stats.skipped,
                "Price update cycle complete"
            ),
            Ok(Err(e)) => error!(cycle, error = %e, "Price update cycle failed"),
            Err(e) => error!(cycle, error = %e, "Price update cycle panicked"),
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
    }

    debug!(cycles = cycle, "Price update loop exited");
}
