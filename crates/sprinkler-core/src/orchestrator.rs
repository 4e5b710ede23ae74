use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{error, info};

use crate::config::{Bounds, Config};
use crate::error::{Result, SprinklerError};
use crate::ledger::SuccessLedger;
use crate::reporter::{Reporter, REPORT_PERIOD};
use crate::transfer::TransferOperation;
use crate::worker::Worker;

/// Draw one quota per account from the configured bounds, clamped to max.
fn draw_quotas<R: Rng>(rng: &mut R, accounts: usize, bounds: Bounds<u32>) -> Vec<u32> {
    (0..accounts)
        .map(|_| rng.gen_range(bounds.min..=bounds.max).min(bounds.max))
        .collect()
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Builds one worker per sender key, each with an independently randomized
/// quota, launches them all concurrently along with the reporter, and keeps
/// the process alive until externally terminated.
pub struct Orchestrator {
    config: Config,
    keys: Vec<String>,
    recipients: Arc<[String]>,
}

impl Orchestrator {
    pub fn new(config: Config, keys: Vec<String>, recipients: Vec<String>) -> Result<Self> {
        if keys.is_empty() {
            return Err(SprinklerError::InvalidConfig(
                "cannot start without sender keys".into(),
            ));
        }
        if recipients.is_empty() {
            return Err(SprinklerError::InvalidConfig(
                "cannot start with an empty recipient pool".into(),
            ));
        }
        Ok(Self {
            config,
            keys,
            recipients: Arc::from(recipients),
        })
    }

    /// Spawn all workers and the reporter, wait for every worker to finish,
    /// then park on the reporter so the process keeps running. Worker
    /// failures are contained: a crashed worker is logged and the rest keep
    /// going.
    pub async fn run(self, op: Arc<dyn TransferOperation>) {
        let mut seed_rng = match self.config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let quotas = draw_quotas(
            &mut seed_rng,
            self.keys.len(),
            self.config.total_transactions,
        );
        let ledger = Arc::new(SuccessLedger::new(quotas.clone()));

        info!(
            workers = self.keys.len(),
            recipients = self.recipients.len(),
            mode = self.config.mode.as_str(),
            "starting transfer scheduler"
        );

        let reporter = Reporter::new(Arc::clone(&ledger), REPORT_PERIOD).spawn();

        let mut handles = Vec::with_capacity(self.keys.len());
        for (id, key) in self.keys.into_iter().enumerate() {
            let rng = match self.config.seed {
                Some(seed) => ChaCha8Rng::seed_from_u64(seed + id as u64),
                None => ChaCha8Rng::from_entropy(),
            };
            info!(worker = id, quota = quotas[id], "scheduling worker");
            let worker = Worker::new(
                id,
                key,
                quotas[id],
                &self.config,
                Arc::clone(&self.recipients),
                Arc::clone(&ledger),
                Arc::clone(&op),
                rng,
            );
            handles.push(tokio::spawn(worker.run()));
        }

        for (id, handle) in handles.into_iter().enumerate() {
            if let Err(e) = handle.await {
                error!(worker = id, error = %e, "worker crashed; remaining quota unfulfilled");
            }
        }

        info!("all workers finished; reporter keeps running until process exit");
        let _ = reporter.await;
    }
}
