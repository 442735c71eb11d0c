//! HttpRpc - minimal JSON-RPC 2.0 client for a Solana cluster.
//!
//! Methods used:
//! - `requestAirdrop`
//! - `getSignatureStatuses`
//! - `getBalance`
//! - `getLatestBlockhash`
//! - `sendTransaction` (bincode bytes, base64 encoded)
//!
//! Runs on reqwest, so the same client works natively and in the browser
//! (fetch). Nothing here retries: a failed call is returned as-is.

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use futures_timer::Delay;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

use super::ClusterRpc;
use crate::config::{BridgeConfig, Commitment};
use crate::core::{with_timeout, Elapsed};
use crate::error::RpcError;

#[derive(Serialize)]
struct Request<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct WithContext<T> {
    value: T,
}

#[derive(Deserialize)]
struct BlockhashValue {
    blockhash: String,
}

/// One entry of a `getSignatureStatuses` reply.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SignatureStatus {
    pub slot: u64,
    /// `None` once the block is rooted.
    pub confirmations: Option<u64>,
    pub err: Option<Value>,
    pub confirmation_status: Option<Commitment>,
}

impl SignatureStatus {
    /// Commitment this status represents. Older nodes omit
    /// `confirmationStatus`; a null confirmation count then means rooted.
    pub fn commitment(&self) -> Commitment {
        match (self.confirmation_status, self.confirmations) {
            (Some(level), _) => level,
            (None, None) => Commitment::Finalized,
            (None, Some(_)) => Commitment::Processed,
        }
    }
}

pub struct HttpRpc {
    url: String,
    client: reqwest::Client,
    commitment: Commitment,
    confirm_timeout: Duration,
    poll_interval: Duration,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl std::fmt::Debug for HttpRpc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpRpc")
            .field("url", &self.url)
            .field("commitment", &self.commitment)
            .finish_non_exhaustive()
    }
}

impl HttpRpc {
    pub fn new(config: &BridgeConfig) -> Self {
        Self {
            url: config.cluster.url().to_string(),
            client: reqwest::Client::new(),
            commitment: config.commitment,
            confirm_timeout: config.confirm_timeout,
            poll_interval: config.poll_interval,
            request_timeout: config.request_timeout,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn commitment(&self) -> Commitment {
        self.commitment
    }

    async fn call<R: DeserializeOwned>(&self, method: &str, params: Value) -> Result<R, RpcError> {
        let request = Request {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let round_trip = async {
            let resp = self.client.post(&self.url).json(&request).send().await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(RpcError::Node {
                    method: method.to_string(),
                    code: i64::from(status.as_u16()),
                    message: format!("HTTP {}", status),
                });
            }
            let body: Value = resp.json().await?;
            decode_envelope(method, body)
        };

        with_timeout(self.request_timeout, round_trip)
            .await
            .map_err(|Elapsed(waited)| RpcError::RequestTimeout { method: method.to_string(), waited })?
    }

    /// Current status of one signature, `None` if the cluster has not seen it.
    pub async fn signature_status(&self, signature: &Signature) -> Result<Option<SignatureStatus>, RpcError> {
        let reply: WithContext<Vec<Option<SignatureStatus>>> = self
            .call(
                "getSignatureStatuses",
                json!([[signature.to_string()], {"searchTransactionHistory": true}]),
            )
            .await?;
        Ok(reply.value.into_iter().next().flatten())
    }
}

/// Unwrap a JSON-RPC reply body into its `result`.
pub(crate) fn decode_envelope<R: DeserializeOwned>(method: &str, body: Value) -> Result<R, RpcError> {
    let envelope: Envelope<R> = serde_json::from_value(body)
        .map_err(|e| RpcError::Decode(format!("{method}: {e}")))?;
    if let Some(err) = envelope.error {
        return Err(RpcError::Node { method: method.to_string(), code: err.code, message: err.message });
    }
    envelope
        .result
        .ok_or_else(|| RpcError::Decode(format!("{method}: missing result")))
}

fn parse_signature(method: &str, raw: &str) -> Result<Signature, RpcError> {
    Signature::from_str(raw).map_err(|e| RpcError::Decode(format!("{method}: bad signature {raw}: {e}")))
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl ClusterRpc for HttpRpc {
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        let raw: String = self
            .call(
                "requestAirdrop",
                json!([pubkey.to_string(), lamports, {"commitment": self.commitment.as_str()}]),
            )
            .await?;
        parse_signature("requestAirdrop", &raw)
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<(), RpcError> {
        let poll = async {
            loop {
                if let Some(status) = self.signature_status(signature).await? {
                    if let Some(err) = status.err {
                        return Err(RpcError::Rejected { signature: *signature, reason: err.to_string() });
                    }
                    let reached = status.commitment();
                    if self.commitment.is_satisfied_by(reached) {
                        debug!(signature = %signature, commitment = reached.as_str(), "Signature confirmed");
                        return Ok(());
                    }
                }
                Delay::new(self.poll_interval).await;
            }
        };

        match with_timeout(self.confirm_timeout, poll).await {
            Ok(result) => result,
            Err(Elapsed(waited)) => Err(RpcError::Timeout { signature: *signature, waited }),
        }
    }

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        let reply: WithContext<u64> = self
            .call("getBalance", json!([pubkey.to_string(), {"commitment": self.commitment.as_str()}]))
            .await?;
        Ok(reply.value)
    }

    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        let reply: WithContext<BlockhashValue> = self
            .call("getLatestBlockhash", json!([{"commitment": self.commitment.as_str()}]))
            .await?;
        Hash::from_str(&reply.value.blockhash)
            .map_err(|e| RpcError::Decode(format!("getLatestBlockhash: {e}")))
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        let bytes = bincode::serialize(transaction).map_err(|e| RpcError::Encode(e.to_string()))?;
        let encoded = general_purpose::STANDARD.encode(bytes);
        let raw: String = self
            .call(
                "sendTransaction",
                json!([encoded, {"encoding": "base64", "preflightCommitment": self.commitment.as_str()}]),
            )
            .await?;
        let signature = parse_signature("sendTransaction", &raw)?;
        debug!(signature = %signature, "Transaction submitted");
        self.await_confirmation(&signature).await?;
        Ok(signature)
    }
}
