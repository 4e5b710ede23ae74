use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::ledger::SuccessLedger;

/// Cadence of the aggregate success report.
pub const REPORT_PERIOD: Duration = Duration::from_secs(12 * 60 * 60);

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Periodically snapshots the success ledger, clears it, and emits one line
/// per worker. Runs for the life of the process; the only way it stops is
/// process exit.
pub struct Reporter {
    ledger: Arc<SuccessLedger>,
    period: Duration,
}

impl Reporter {
    pub fn new(ledger: Arc<SuccessLedger>, period: Duration) -> Self {
        Self { ledger, period }
    }

    /// Start the reporting loop on its own task. The first report lands one
    /// full period after start; a delayed tick shifts the schedule rather
    /// than bursting.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.emit();
            }
        })
    }

    fn emit(&self) {
        let snapshot = self.ledger.snapshot_and_clear();
        info!(
            window_closed = %Utc::now().to_rfc3339(),
            "successful transfers this reporting window"
        );
        for worker in 0..self.ledger.workers() {
            let count = snapshot.get(&worker).copied().unwrap_or(0);
            // Defensive double-clamp; the ledger already caps at quota.
            let count = count.min(self.ledger.quota(worker));
            info!(worker, successes = count, quota = self.ledger.quota(worker), "window total");
        }
    }
}
