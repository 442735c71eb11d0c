//! Error taxonomy. Every async boundary converts failures into one of these
//! before they reach a caller; none are retried.

use solana_sdk::signature::Signature;
use std::time::Duration;
use thiserror::Error;

/// Which side of a transfer is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Party {
    Sender,
    Recipient,
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Party::Sender => f.write_str("local keypair"),
            Party::Recipient => f.write_str("external public key"),
        }
    }
}

/// Failures reported by the injected wallet provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The user declined the request in the extension.
    #[error("user rejected the request: {0}")]
    Rejected(String),
    /// The provider answered with something that is not a usable value.
    #[error("malformed provider response: {0}")]
    Malformed(String),
    /// Any other extension-side failure.
    #[error("provider error: {0}")]
    Other(String),
}

/// Failures from the cluster RPC endpoint.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rpc error (method {method}) code={code} message={message}")]
    Node { method: String, code: i64, message: String },
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
    /// The cluster processed the transaction and reported it failed.
    #[error("transaction {signature} rejected: {reason}")]
    Rejected { signature: Signature, reason: String },
    #[error("transaction {signature} not confirmed within {waited:?}")]
    Timeout { signature: Signature, waited: Duration },
    #[error("{method} timed out after {waited:?}")]
    RequestTimeout { method: String, waited: Duration },
}

/// Wallet session failures. A missing provider is not among them: it is a
/// valid state and `connect` is a no-op there.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("wallet connection rejected: {0}")]
    ConnectionRejected(#[source] ProviderError),
    #[error("cannot {action} while {state}")]
    InvalidTransition { action: &'static str, state: &'static str },
}

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("airdrop request failed: {0}")]
    FundingRequest(#[source] RpcError),
    #[error("airdrop confirmation failed: {0}")]
    Confirmation(#[source] RpcError),
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("transfer needs a {0}")]
    MissingParty(Party),
    #[error("signing failed: {0}")]
    Signing(String),
    #[error("submission failed: {0}")]
    Submission(#[source] RpcError),
    #[error("transaction {signature} submitted but not confirmed within {waited:?}")]
    ConfirmationTimeout { signature: Signature, waited: Duration },
}

impl From<RpcError> for TransferError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::Timeout { signature, waited } => {
                TransferError::ConfirmationTimeout { signature, waited }
            }
            other => TransferError::Submission(other),
        }
    }
}

/// Post-transfer balance query failure. Logged as a warning, never returned
/// as a transfer failure.
#[derive(Debug, Error)]
#[error("balance report for {party} failed: {source}")]
pub struct ReportingError {
    pub party: Party,
    #[source]
    pub source: RpcError,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}
