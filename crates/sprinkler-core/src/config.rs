use crate::error::{Result, SprinklerError};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// An inclusive `[min, max]` pair. Every randomized draw in the scheduler is
/// bounded by one of these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds<T> {
    pub min: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> Bounds<T> {
    fn ordered(&self) -> bool {
        self.min <= self.max
    }
}

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// The two observed deployment variants of the worker loop.
///
/// `UntilQuota` drives each worker until it has recorded its quota of
/// successful transfers, retrying transient failures indefinitely and
/// resting after an overshoot. `FixedCount` runs exactly quota iterations
/// with bounded transient retry and a staggered start.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    UntilQuota,
    FixedCount,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::UntilQuota => "until-quota",
            Mode::FixedCount => "fixed-count",
        }
    }
}

// ---------------------------------------------------------------------------
// ChainConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    #[serde(default = "default_chain_id")]
    pub chain_id: u64,
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Block-explorer transaction URL prefix; success log lines link here.
    #[serde(default = "default_scan_url")]
    pub scan_url: Option<String>,
    #[serde(default = "default_symbol")]
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default = "default_priority_fee")]
    pub max_priority_fee_gwei: u64,
    #[serde(default = "default_max_fee")]
    pub max_fee_gwei: u64,
}

fn default_chain_id() -> u64 {
    10218
}

fn default_rpc_url() -> String {
    "https://tea-sepolia.g.alchemy.com/public".to_string()
}

fn default_scan_url() -> Option<String> {
    Some("https://sepolia.tea.xyz/tx".to_string())
}

fn default_symbol() -> String {
    "TEA".to_string()
}

fn default_decimals() -> u8 {
    18
}

fn default_priority_fee() -> u64 {
    2
}

fn default_max_fee() -> u64 {
    100
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            rpc_url: default_rpc_url(),
            scan_url: default_scan_url(),
            symbol: default_symbol(),
            decimals: default_decimals(),
            max_priority_fee_gwei: default_priority_fee(),
            max_fee_gwei: default_max_fee(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub min_amount: f64,
    pub max_amount: f64,
    /// Per-worker quota bounds; each worker draws once at startup.
    pub total_transactions: Bounds<u32>,
    /// Pacing delay between attempts, milliseconds.
    pub interval: Bounds<u64>,
    /// Transient-failure backoff window, milliseconds.
    #[serde(default = "default_delay")]
    pub delay: Bounds<u64>,
    #[serde(default)]
    pub mode: Mode,
    /// Cap on transient retries per attempt. `None` retries indefinitely in
    /// until-quota mode; fixed-count mode falls back to 5.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Seed for reproducible runs; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub chain: ChainConfig,
}

fn default_delay() -> Bounds<u64> {
    Bounds {
        min: 3_000,
        max: 7_000,
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_amount > 0.0) {
            return Err(SprinklerError::InvalidConfig(
                "minAmount must be positive".into(),
            ));
        }
        if self.min_amount > self.max_amount {
            return Err(SprinklerError::InvalidConfig(
                "minAmount must not exceed maxAmount".into(),
            ));
        }
        if self.total_transactions.min == 0 {
            return Err(SprinklerError::InvalidConfig(
                "totalTransactions.min must be at least 1".into(),
            ));
        }
        if !self.total_transactions.ordered() {
            return Err(SprinklerError::InvalidConfig(
                "totalTransactions.min must not exceed totalTransactions.max".into(),
            ));
        }
        if !self.interval.ordered() {
            return Err(SprinklerError::InvalidConfig(
                "interval.min must not exceed interval.max".into(),
            ));
        }
        if !self.delay.ordered() {
            return Err(SprinklerError::InvalidConfig(
                "delay.min must not exceed delay.max".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
