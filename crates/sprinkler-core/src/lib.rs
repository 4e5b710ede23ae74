//! `sprinkler-core` — the concurrent transfer scheduler.
//!
//! One worker per sender account drives a bounded, randomized workload of
//! value transfers against a remote ledger service through the
//! [`transfer::TransferOperation`] contract. Workers share exactly two
//! things: the read-only recipient pool and the [`ledger::SuccessLedger`],
//! which the [`reporter::Reporter`] snapshots and clears on a fixed cadence.

pub mod config;
pub mod error;
pub mod inputs;
pub mod ledger;
pub mod orchestrator;
pub mod pacing;
pub mod reporter;
pub mod transfer;
pub mod worker;

pub use config::{Bounds, ChainConfig, Config, Mode};
pub use error::{Result, SprinklerError};
pub use ledger::{Credit, SuccessLedger, WorkerId};
pub use orchestrator::Orchestrator;
pub use transfer::{
    FailureKind, TransferError, TransferOperation, TransferReceipt, TransferRequest,
};
