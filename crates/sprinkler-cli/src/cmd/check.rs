use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use sprinkler_core::{inputs, Config};

use crate::output::{print_json, print_kv};

#[derive(Serialize)]
struct CheckSummary {
    accounts: usize,
    recipients: usize,
    mode: &'static str,
    min_amount: f64,
    max_amount: f64,
    quota_min: u32,
    quota_max: u32,
    interval_ms_min: u64,
    interval_ms_max: u64,
    rpc_url: String,
    chain_id: u64,
}

/// Validate the config and both input files, then print what a `run` would
/// schedule. Never touches the network.
pub fn run(
    config_path: &Path,
    keys_path: &Path,
    recipients_path: &Path,
    json: bool,
) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let keys = inputs::load_keys(keys_path)?;
    let recipients = inputs::load_recipients(recipients_path)?;

    let summary = CheckSummary {
        accounts: keys.len(),
        recipients: recipients.len(),
        mode: config.mode.as_str(),
        min_amount: config.min_amount,
        max_amount: config.max_amount,
        quota_min: config.total_transactions.min,
        quota_max: config.total_transactions.max,
        interval_ms_min: config.interval.min,
        interval_ms_max: config.interval.max,
        rpc_url: config.chain.rpc_url.clone(),
        chain_id: config.chain.chain_id,
    };

    if json {
        print_json(&summary)?;
    } else {
        print_kv(&[
            ("accounts", summary.accounts.to_string()),
            ("recipients", summary.recipients.to_string()),
            ("mode", summary.mode.to_string()),
            (
                "amount",
                format!("{} ..= {}", summary.min_amount, summary.max_amount),
            ),
            (
                "quota",
                format!("{} ..= {}", summary.quota_min, summary.quota_max),
            ),
            (
                "interval",
                format!("{}ms ..= {}ms", summary.interval_ms_min, summary.interval_ms_max),
            ),
            ("rpc", summary.rpc_url.clone()),
            ("chain id", summary.chain_id.to_string()),
        ]);
    }
    Ok(())
}
