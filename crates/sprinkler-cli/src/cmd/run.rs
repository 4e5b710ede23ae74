use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use evm_sender::EvmSender;
use sprinkler_core::{inputs, Config, Orchestrator, TransferOperation};
use tracing::info;

/// Load everything, build the RPC sender, and hand off to the orchestrator.
/// Only returns on a startup-fatal error; a healthy scheduler runs until the
/// process is killed.
pub async fn run(config_path: &Path, keys_path: &Path, recipients_path: &Path) -> anyhow::Result<()> {
    let config = Config::load(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let keys = inputs::load_keys(keys_path)?;
    let recipients = inputs::load_recipients(recipients_path)?;

    info!(
        accounts = keys.len(),
        recipients = recipients.len(),
        rpc = %config.chain.rpc_url,
        chain_id = config.chain.chain_id,
        "inputs loaded"
    );

    let sender = EvmSender::new(&config.chain)?;
    let orchestrator = Orchestrator::new(config, keys, recipients)?;
    orchestrator
        .run(Arc::new(sender) as Arc<dyn TransferOperation>)
        .await;
    Ok(())
}
