use crate::ledger::WorkerId;
use async_trait::async_trait;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Request / receipt
// ---------------------------------------------------------------------------

/// One transfer attempt, created fresh per attempt. Carries no identity that
/// survives a retry: retried attempts are simply new requests.
#[derive(Debug, Clone, Copy)]
pub struct TransferRequest<'a> {
    /// Sender secret, exclusively owned by the issuing worker.
    pub key: &'a str,
    /// Destination identifier, drawn from the shared recipient pool.
    pub to: &'a str,
    pub amount: f64,
    pub worker: WorkerId,
}

/// Proof of a broadcast transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub tx_hash: String,
    pub from: String,
    /// Block-explorer link, when the chain config names one.
    pub explorer: Option<String>,
}

impl TransferReceipt {
    /// Human-facing reference for log lines: the explorer link when
    /// available, the bare hash otherwise.
    pub fn reference(&self) -> &str {
        self.explorer.as_deref().unwrap_or(&self.tx_hash)
    }
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

/// How a failed attempt should be treated by the worker's retry loop.
///
/// The implementor of [`TransferOperation`] decides this once, at the
/// collaborator boundary; the scheduler never inspects error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connectivity or RPC-shape trouble expected to resolve itself;
    /// eligible for backoff-and-retry.
    Transient,
    /// Anything else (insufficient balance, invalid parameters, rejected
    /// transaction). The attempt is abandoned, never retried.
    Fatal,
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransferError {
    pub kind: FailureKind,
    pub message: String,
}

impl TransferError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Fatal,
            message: message.into(),
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind == FailureKind::Transient
    }
}

// ---------------------------------------------------------------------------
// TransferOperation
// ---------------------------------------------------------------------------

/// The external collaborator contract: perform one value-transfer attempt
/// and classify its outcome.
///
/// Implementations own everything network-shaped — endpoint connection,
/// sender derivation from the key, nonce retrieval, fee fields, signing,
/// broadcast — and are expected to enforce their own call timeout. The
/// scheduler only sees the receipt or the classified failure.
#[async_trait]
pub trait TransferOperation: Send + Sync {
    async fn transfer(&self, req: TransferRequest<'_>) -> Result<TransferReceipt, TransferError>;
}
