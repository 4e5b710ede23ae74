use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_network::{eip2718::Encodable2718, TxSignerSync};
use alloy_primitives::U256;
use alloy_provider::{Provider, ProviderBuilder, RootProvider};
use alloy_signer_local::PrivateKeySigner;
use alloy_transport::{RpcError, TransportErrorKind};
use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use sprinkler_core::{
    ChainConfig, TransferError, TransferOperation, TransferReceipt, TransferRequest,
};

/// A plain value transfer always costs exactly this much gas.
const GAS_LIMIT: u64 = 21_000;

const GWEI: u128 = 1_000_000_000;

#[derive(Debug, Error)]
pub enum EvmSenderError {
    #[error("invalid RPC url '{url}': {reason}")]
    InvalidRpcUrl { url: String, reason: String },
}

// ---------------------------------------------------------------------------
// EvmSender
// ---------------------------------------------------------------------------

/// Sends signed EIP-1559 value transfers to a single JSON-RPC endpoint.
///
/// Stateless per attempt: the sender key arrives with each request and the
/// nonce is fetched fresh, so one instance is shared by every worker.
pub struct EvmSender {
    provider: RootProvider,
    chain_id: u64,
    max_fee_per_gas: u128,
    max_priority_fee_per_gas: u128,
    decimals: u8,
    symbol: String,
    scan_url: Option<String>,
}

impl EvmSender {
    pub fn new(chain: &ChainConfig) -> Result<Self, EvmSenderError> {
        let url = chain
            .rpc_url
            .parse()
            .map_err(|e| EvmSenderError::InvalidRpcUrl {
                url: chain.rpc_url.clone(),
                reason: format!("{e}"),
            })?;
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(url);
        Ok(Self {
            provider,
            chain_id: chain.chain_id,
            max_fee_per_gas: u128::from(chain.max_fee_gwei) * GWEI,
            max_priority_fee_per_gas: u128::from(chain.max_priority_fee_gwei) * GWEI,
            decimals: chain.decimals,
            symbol: chain.symbol.clone(),
            scan_url: chain.scan_url.clone(),
        })
    }
}

#[async_trait]
impl TransferOperation for EvmSender {
    async fn transfer(&self, req: TransferRequest<'_>) -> Result<TransferReceipt, TransferError> {
        let signer: PrivateKeySigner = req
            .key
            .parse()
            .map_err(|e| TransferError::fatal(format!("invalid private key: {e}")))?;
        let from = signer.address();

        let to: alloy_primitives::Address = req
            .to
            .parse()
            .map_err(|e| TransferError::fatal(format!("invalid recipient '{}': {e}", req.to)))?;

        let nonce = self
            .provider
            .get_transaction_count(from)
            .await
            .map_err(classify)?;

        let mut tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: GAS_LIMIT,
            max_fee_per_gas: self.max_fee_per_gas,
            max_priority_fee_per_gas: self.max_priority_fee_per_gas,
            to: to.into(),
            value: to_wei(req.amount, self.decimals),
            access_list: Default::default(),
            input: Default::default(),
        };

        let signature = signer
            .sign_transaction_sync(&mut tx)
            .map_err(|e| TransferError::fatal(format!("signing failed: {e}")))?;

        let envelope = TxEnvelope::Eip1559(tx.into_signed(signature));
        let mut encoded = Vec::new();
        envelope.encode_2718(&mut encoded);

        debug!(
            worker = req.worker,
            amount = req.amount,
            symbol = %self.symbol,
            nonce,
            "broadcasting transfer"
        );

        let pending = self
            .provider
            .send_raw_transaction(&encoded)
            .await
            .map_err(classify)?;
        let tx_hash = pending.tx_hash().to_string();

        let explorer = self
            .scan_url
            .as_ref()
            .map(|scan| format!("{}/{tx_hash}", scan.trim_end_matches('/')));

        Ok(TransferReceipt {
            tx_hash,
            from: from.to_string(),
            explorer,
        })
    }
}

// ---------------------------------------------------------------------------
// Classification / conversion
// ---------------------------------------------------------------------------

/// Decide once, at the boundary, how the scheduler must treat an RPC error.
///
/// Transport-level trouble and malformed responses are expected to resolve
/// themselves; an error *response* means the endpoint understood us and
/// rejected the transaction, which no retry of the same attempt will fix.
fn classify(err: RpcError<TransportErrorKind>) -> TransferError {
    match &err {
        RpcError::Transport(_) | RpcError::NullResp | RpcError::DeserError { .. } => {
            TransferError::transient(err.to_string())
        }
        _ => TransferError::fatal(err.to_string()),
    }
}

/// Scale a decimal token amount to its integer base-unit representation,
/// flooring below one base unit.
fn to_wei(amount: f64, decimals: u8) -> U256 {
    U256::from((amount * 10f64.powi(i32::from(decimals))).floor() as u128)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use sprinkler_core::FailureKind;

    /// Anvil's well-known first dev account.
    const TEST_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_RECIPIENT: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

    fn chain_config(rpc_url: &str, scan_url: Option<&str>) -> ChainConfig {
        ChainConfig {
            chain_id: 31337,
            rpc_url: rpc_url.to_string(),
            scan_url: scan_url.map(str::to_string),
            ..ChainConfig::default()
        }
    }

    fn request(amount: f64) -> TransferRequest<'static> {
        TransferRequest {
            key: TEST_KEY,
            to: TEST_RECIPIENT,
            amount,
            worker: 0,
        }
    }

    /// JSON-RPC response body that echoes the request id.
    fn rpc_response(result: Value) -> impl Fn(&mockito::Request) -> Vec<u8> + Send + Sync {
        move |req| {
            let body: Value = serde_json::from_slice(req.body().unwrap()).unwrap();
            json!({"jsonrpc": "2.0", "id": body["id"], "result": result})
                .to_string()
                .into_bytes()
        }
    }

    fn rpc_error(code: i64, message: &str) -> impl Fn(&mockito::Request) -> Vec<u8> + Send + Sync {
        let message = message.to_string();
        move |req| {
            let body: Value = serde_json::from_slice(req.body().unwrap()).unwrap();
            json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "error": {"code": code, "message": message}
            })
            .to_string()
            .into_bytes()
        }
    }

    #[test]
    fn to_wei_scales_and_floors() {
        assert_eq!(to_wei(1.5, 18), U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(to_wei(0.0001, 18), U256::from(100_000_000_000_000u128));
        assert_eq!(to_wei(2.0, 6), U256::from(2_000_000u64));
        // Below one base unit floors to zero.
        assert_eq!(to_wei(0.4, 0), U256::ZERO);
    }

    #[test]
    fn invalid_rpc_url_is_rejected() {
        let err = EvmSender::new(&chain_config("not a url", None));
        assert!(matches!(err, Err(EvmSenderError::InvalidRpcUrl { .. })));
    }

    #[tokio::test]
    async fn bad_key_is_fatal_without_touching_the_network() {
        let sender = EvmSender::new(&chain_config("http://127.0.0.1:9", None)).unwrap();
        let err = sender
            .transfer(TransferRequest {
                key: "not-a-key",
                ..request(0.1)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);
    }

    #[tokio::test]
    async fn bad_recipient_is_fatal_without_touching_the_network() {
        let sender = EvmSender::new(&chain_config("http://127.0.0.1:9", None)).unwrap();
        let err = sender
            .transfer(TransferRequest {
                to: "clearly-not-an-address",
                ..request(0.1)
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);
    }

    #[tokio::test]
    async fn refused_connection_is_transient() {
        // Port 9 (discard) is never listening in the test environment.
        let sender = EvmSender::new(&chain_config("http://127.0.0.1:9", None)).unwrap();
        let err = sender.transfer(request(0.1)).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Transient);
    }

    #[tokio::test]
    async fn rpc_error_response_is_fatal() {
        let mut server = mockito::Server::new_async().await;
        let _nonce = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                json!({"method": "eth_getTransactionCount"}),
            ))
            .with_body_from_request(rpc_error(-32000, "insufficient funds"))
            .create_async()
            .await;

        let sender = EvmSender::new(&chain_config(&server.url(), None)).unwrap();
        let err = sender.transfer(request(0.1)).await.unwrap_err();
        assert_eq!(err.kind, FailureKind::Fatal);
        assert!(err.message.contains("insufficient funds"));
    }

    #[tokio::test]
    async fn happy_path_returns_broadcast_hash_and_explorer_link() {
        let hash = "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b";
        let mut server = mockito::Server::new_async().await;
        let _nonce = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                json!({"method": "eth_getTransactionCount"}),
            ))
            .with_body_from_request(rpc_response(json!("0x0")))
            .create_async()
            .await;
        let _send = server
            .mock("POST", "/")
            .match_body(mockito::Matcher::PartialJson(
                json!({"method": "eth_sendRawTransaction"}),
            ))
            .with_body_from_request(rpc_response(json!(hash)))
            .create_async()
            .await;

        let sender =
            EvmSender::new(&chain_config(&server.url(), Some("https://scan.example/tx"))).unwrap();
        let receipt = sender.transfer(request(0.25)).await.unwrap();

        assert_eq!(receipt.tx_hash, hash);
        assert_eq!(
            receipt.explorer.as_deref(),
            Some(format!("https://scan.example/tx/{hash}").as_str())
        );
        // The sender address is derived from the key, not configured.
        assert_eq!(
            receipt.from.to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }
}
