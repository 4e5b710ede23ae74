use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::config::{Config, Mode};
use crate::ledger::{Credit, SuccessLedger, WorkerId};
use crate::pacing::Pacing;
use crate::transfer::{TransferOperation, TransferRequest};

/// How long a worker rests after a success that would overshoot its quota.
/// A safety valve against runaway crediting when ledger resets interleave
/// with quota bookkeeping, not a scheduling feature.
pub const REST_PERIOD: Duration = Duration::from_secs(6 * 60 * 60);

/// Transient-retry cap applied in fixed-count mode when the config leaves
/// `maxRetries` unset.
const DEFAULT_FIXED_COUNT_RETRIES: u32 = 5;

/// What a single scheduled attempt amounted to, after any transient retries.
enum Attempt {
    /// Success recorded in the ledger; carries the worker's running count.
    Credited(u32),
    /// Fatal failure, exhausted retries, or an overshoot rest — the attempt
    /// is spent with nothing recorded.
    Spent,
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

/// One account's full workload: a sequential loop of transfer attempts,
/// paced and retried per the configured mode, crediting the shared ledger
/// on success. Owns its key exclusively; shares only the ledger and the
/// read-only recipient pool.
pub struct Worker {
    id: WorkerId,
    key: String,
    recipients: Arc<[String]>,
    quota: u32,
    mode: Mode,
    max_retries: Option<u32>,
    pacing: Pacing,
    ledger: Arc<SuccessLedger>,
    op: Arc<dyn TransferOperation>,
    rng: ChaCha8Rng,
}

impl Worker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: WorkerId,
        key: String,
        quota: u32,
        config: &Config,
        recipients: Arc<[String]>,
        ledger: Arc<SuccessLedger>,
        op: Arc<dyn TransferOperation>,
        rng: ChaCha8Rng,
    ) -> Self {
        Self {
            id,
            key,
            recipients,
            quota,
            mode: config.mode,
            max_retries: config.max_retries,
            pacing: Pacing::from_config(config),
            ledger,
            op,
            rng,
        }
    }

    /// Drive the workload to completion. Within one worker attempts are
    /// strictly sequential; attempt n+1 never starts before n resolves.
    pub async fn run(mut self) {
        match self.mode {
            Mode::UntilQuota => self.run_until_quota().await,
            Mode::FixedCount => self.run_fixed_count().await,
        }
        info!(worker = self.id, quota = self.quota, "worker done");
    }

    /// Loop until this worker has recorded `quota` lifetime successes.
    async fn run_until_quota(&mut self) {
        let mut completed = 0u32;
        while completed < self.quota {
            if let Attempt::Credited(_) = self.attempt().await {
                completed += 1;
            }
            if completed < self.quota {
                let pause = self.pacing.interval(&mut self.rng);
                sleep(pause).await;
            }
        }
    }

    /// Run exactly `quota` iterations after a randomized staggered start;
    /// failed iterations are not made up.
    async fn run_fixed_count(&mut self) {
        let stagger = self.rng.gen_range(0..=self.pacing.max_interval());
        sleep(Duration::from_millis(stagger)).await;
        for iteration in 0..self.quota {
            self.attempt().await;
            if iteration + 1 < self.quota {
                let pause = self.pacing.interval(&mut self.rng);
                sleep(pause).await;
            }
        }
    }

    /// One scheduled attempt: draw a fresh (recipient, amount) pair, invoke
    /// the transfer operation, and retry transient failures with randomized
    /// backoff. Retries redraw the pair — no attempt identity survives.
    async fn attempt(&mut self) -> Attempt {
        let mut retries = 0u32;
        loop {
            let idx = self.rng.gen_range(0..self.recipients.len());
            let amount = self.pacing.amount(&mut self.rng);
            let to = self.recipients[idx].as_str();
            let req = TransferRequest {
                key: &self.key,
                to,
                amount,
                worker: self.id,
            };

            match self.op.transfer(req).await {
                Ok(receipt) => match self.ledger.increment(self.id) {
                    Credit::Recorded(count) => {
                        info!(
                            worker = self.id,
                            success = count,
                            amount,
                            to,
                            from = %receipt.from,
                            tx = receipt.reference(),
                            "transfer confirmed"
                        );
                        return Attempt::Credited(count);
                    }
                    Credit::AtQuota => {
                        info!(
                            worker = self.id,
                            quota = self.quota,
                            "ledger already at quota, resting"
                        );
                        sleep(REST_PERIOD).await;
                        info!(worker = self.id, "resuming after rest");
                        return Attempt::Spent;
                    }
                },
                Err(err) if err.is_transient() => {
                    retries += 1;
                    if let Some(cap) = self.retry_cap() {
                        if retries > cap {
                            warn!(
                                worker = self.id,
                                retries = cap,
                                error = %err,
                                "transient retries exhausted, abandoning attempt"
                            );
                            return Attempt::Spent;
                        }
                    }
                    let backoff = self.pacing.backoff(&mut self.rng);
                    warn!(
                        worker = self.id,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    sleep(backoff).await;
                }
                Err(err) => {
                    warn!(worker = self.id, error = %err, "transfer failed");
                    return Attempt::Spent;
                }
            }
        }
    }

    fn retry_cap(&self) -> Option<u32> {
        match self.mode {
            Mode::UntilQuota => self.max_retries,
            Mode::FixedCount => Some(self.max_retries.unwrap_or(DEFAULT_FIXED_COUNT_RETRIES)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Bounds, ChainConfig};
    use crate::transfer::{TransferError, TransferReceipt};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Copy)]
    enum Step {
        Success,
        Transient,
        Fatal,
    }

    /// Plays back a scripted sequence of outcomes, then repeats `fallback`.
    struct ScriptedOp {
        steps: Mutex<VecDeque<Step>>,
        fallback: Step,
        calls: AtomicUsize,
    }

    impl ScriptedOp {
        fn new(steps: Vec<Step>, fallback: Step) -> Arc<Self> {
            Arc::new(Self {
                steps: Mutex::new(steps.into()),
                fallback,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransferOperation for ScriptedOp {
        async fn transfer(
            &self,
            req: TransferRequest<'_>,
        ) -> Result<TransferReceipt, TransferError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let step = self
                .steps
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(self.fallback);
            match step {
                Step::Success => Ok(TransferReceipt {
                    tx_hash: format!("0xfeed{}", req.worker),
                    from: "0xsender".into(),
                    explorer: None,
                }),
                Step::Transient => Err(TransferError::transient("connection refused")),
                Step::Fatal => Err(TransferError::fatal("insufficient funds")),
            }
        }
    }

    fn test_config(mode: Mode, max_retries: Option<u32>) -> Config {
        Config {
            min_amount: 0.001,
            max_amount: 0.01,
            total_transactions: Bounds { min: 1, max: 10 },
            interval: Bounds { min: 1, max: 2 },
            delay: Bounds { min: 1, max: 2 },
            mode,
            max_retries,
            seed: Some(1),
            chain: ChainConfig::default(),
        }
    }

    fn build_worker(
        quota: u32,
        config: &Config,
        ledger: &Arc<SuccessLedger>,
        op: &Arc<ScriptedOp>,
    ) -> Worker {
        Worker::new(
            0,
            "ab".repeat(32),
            quota,
            config,
            Arc::from(vec!["0xaaa".to_string(), "0xbbb".to_string()]),
            Arc::clone(ledger),
            Arc::clone(op) as Arc<dyn TransferOperation>,
            ChaCha8Rng::seed_from_u64(3),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_retry_until_success() {
        let config = test_config(Mode::UntilQuota, None);
        let ledger = Arc::new(SuccessLedger::new(vec![1]));
        let op = ScriptedOp::new(vec![Step::Transient, Step::Transient], Step::Success);

        build_worker(1, &config, &ledger, &op).run().await;

        assert_eq!(op.calls(), 3);
        assert_eq!(ledger.count(0), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_failures_are_never_retried() {
        let config = test_config(Mode::FixedCount, None);
        let ledger = Arc::new(SuccessLedger::new(vec![3]));
        let op = ScriptedOp::new(vec![], Step::Fatal);

        build_worker(3, &config, &ledger, &op).run().await;

        // One call per iteration: fatal outcomes consume the iteration
        // without entering the backoff path.
        assert_eq!(op.calls(), 3);
        assert_eq!(ledger.count(0), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn until_quota_stops_exactly_at_quota() {
        let config = test_config(Mode::UntilQuota, None);
        let ledger = Arc::new(SuccessLedger::new(vec![5]));
        let op = ScriptedOp::new(vec![], Step::Success);

        build_worker(5, &config, &ledger, &op).run().await;

        assert_eq!(op.calls(), 5);
        assert_eq!(ledger.count(0), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn overshoot_guard_rests_instead_of_crediting() {
        let config = test_config(Mode::UntilQuota, None);
        let ledger = Arc::new(SuccessLedger::new(vec![2]));
        ledger.increment(0);
        ledger.increment(0);
        let op = ScriptedOp::new(vec![], Step::Success);

        let worker = build_worker(2, &config, &ledger, &op);
        let handle = tokio::spawn(worker.run());

        // Long enough for at least two rest cycles in virtual time.
        sleep(Duration::from_secs(13 * 60 * 60)).await;
        handle.abort();

        assert!(op.calls() >= 2, "worker should keep attempting after rest");
        assert_eq!(ledger.count(0), 2, "ledger must never exceed quota");
    }

    #[tokio::test(start_paused = true)]
    async fn until_quota_respects_configured_retry_cap() {
        let config = test_config(Mode::UntilQuota, Some(1));
        let ledger = Arc::new(SuccessLedger::new(vec![1]));
        let op = ScriptedOp::new(vec![Step::Transient, Step::Transient], Step::Success);

        build_worker(1, &config, &ledger, &op).run().await;

        // First attempt: transient, one retry (also transient), cap hit,
        // attempt abandoned. Second attempt succeeds.
        assert_eq!(op.calls(), 3);
        assert_eq!(ledger.count(0), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_count_bounds_transient_retries() {
        let config = test_config(Mode::FixedCount, Some(2));
        let ledger = Arc::new(SuccessLedger::new(vec![1]));
        let op = ScriptedOp::new(vec![], Step::Transient);

        build_worker(1, &config, &ledger, &op).run().await;

        // Initial call plus two bounded retries, then the iteration is spent.
        assert_eq!(op.calls(), 3);
        assert_eq!(ledger.count(0), 0);
    }
}
