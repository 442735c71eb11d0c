//! RPC - the cluster endpoint as a named capability set.
//!
//! One shared client serves both the provisioner and the transfer pipeline;
//! it holds no session state and every call stands alone.

mod http;

pub use http::{HttpRpc, SignatureStatus};

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;

use crate::core::MaybeSend;
use crate::error::RpcError;

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait ClusterRpc: MaybeSend {
    /// Ask the faucet for `lamports`. Returns the airdrop signature.
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, RpcError>;

    /// Wait until `signature` reaches the configured commitment.
    async fn await_confirmation(&self, signature: &Signature) -> Result<(), RpcError>;

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError>;

    async fn latest_blockhash(&self) -> Result<Hash, RpcError>;

    /// Submit a signed transaction and wait for confirmation, as one step.
    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, RpcError>;
}
