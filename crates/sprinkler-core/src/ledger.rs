use std::collections::HashMap;
use std::sync::Mutex;

/// Index of a worker unit; doubles as the index into the quota table.
pub type WorkerId = usize;

/// Outcome of recording a success in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credit {
    /// The success was recorded; carries the worker's new count.
    Recorded(u32),
    /// The worker's count already sits at its quota; nothing was recorded.
    AtQuota,
}

// ---------------------------------------------------------------------------
// SuccessLedger
// ---------------------------------------------------------------------------

/// Shared table of successful-transfer counts per worker since the last
/// reporting cycle.
///
/// Entries are created lazily on a worker's first success and taken wholesale
/// by [`SuccessLedger::snapshot_and_clear`]. A single mutex guards the map, so
/// a snapshot-and-clear is one atomic step with respect to every concurrent
/// increment: an increment lands either entirely before the clear (visible in
/// the snapshot) or entirely after it (visible in the next one), never both
/// and never neither.
///
/// Invariant: no stored count ever exceeds that worker's quota.
#[derive(Debug)]
pub struct SuccessLedger {
    quotas: Vec<u32>,
    counts: Mutex<HashMap<WorkerId, u32>>,
}

impl SuccessLedger {
    pub fn new(quotas: Vec<u32>) -> Self {
        Self {
            quotas,
            counts: Mutex::new(HashMap::new()),
        }
    }

    pub fn workers(&self) -> usize {
        self.quotas.len()
    }

    pub fn quota(&self, worker: WorkerId) -> u32 {
        self.quotas[worker]
    }

    /// Record one successful transfer for `worker`, capped at its quota.
    pub fn increment(&self, worker: WorkerId) -> Credit {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = counts.entry(worker).or_insert(0);
        if *count >= self.quotas[worker] {
            return Credit::AtQuota;
        }
        *count += 1;
        Credit::Recorded(*count)
    }

    pub fn count(&self, worker: WorkerId) -> u32 {
        let counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        counts.get(&worker).copied().unwrap_or(0)
    }

    /// Take the whole table, leaving it empty, in one atomic step.
    pub fn snapshot_and_clear(&self) -> HashMap<WorkerId, u32> {
        let mut counts = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *counts)
    }
}
