//! `evm-sender` — the ledger-network collaborator for the sprinkler
//! workspace.
//!
//! Implements [`sprinkler_core::TransferOperation`] against an EVM JSON-RPC
//! endpoint: one call performs the whole attempt (sender derivation, nonce
//! retrieval, EIP-1559 construction with fixed priority/ceiling fees,
//! signing, raw broadcast) and classifies every failure as transient or
//! fatal before the scheduler ever sees it.

pub mod client;

pub use client::{EvmSender, EvmSenderError};
