//! Account provisioning - an ephemeral, airdrop-funded local keypair.
//!
//! The keypair lives in memory for the session only. It is never written
//! anywhere, serialized, or sent over the wire.

use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signer};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::{format_sol, LAMPORTS_PER_SOL};
use crate::error::ProvisioningError;
use crate::rpc::ClusterRpc;

/// Airdrop requested for every new keypair (2 SOL).
pub const FUNDING_LAMPORTS: u64 = 2 * LAMPORTS_PER_SOL;

/// A funded, confirmed local keypair. Cheap to clone; clones share the key.
#[derive(Clone)]
pub struct LocalAccount {
    keypair: Arc<Keypair>,
}

impl LocalAccount {
    pub(crate) fn new(keypair: Keypair) -> Self {
        Self { keypair: Arc::new(keypair) }
    }

    pub fn pubkey(&self) -> Pubkey {
        self.keypair.pubkey()
    }

    pub(crate) fn keypair(&self) -> &Keypair {
        &self.keypair
    }
}

impl std::fmt::Debug for LocalAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalAccount")
            .field("pubkey", &self.pubkey())
            .finish_non_exhaustive()
    }
}

pub struct AccountProvisioner<R> {
    rpc: Arc<R>,
}

impl<R: ClusterRpc> AccountProvisioner<R> {
    pub fn new(rpc: Arc<R>) -> Self {
        Self { rpc }
    }

    /// Generate, fund, and wait for the airdrop to confirm. Only a confirmed
    /// account is returned; every failure is terminal for this call.
    pub async fn provision(&self) -> Result<LocalAccount, ProvisioningError> {
        let keypair = Keypair::new();
        let pubkey = keypair.pubkey();
        info!(pubkey = %pubkey, "Sender account generated");

        let signature = self
            .rpc
            .request_airdrop(&pubkey, FUNDING_LAMPORTS)
            .await
            .map_err(|e| {
                error!(pubkey = %pubkey, error = %e, "Airdrop request failed");
                ProvisioningError::FundingRequest(e)
            })?;

        self.rpc.await_confirmation(&signature).await.map_err(|e| {
            error!(pubkey = %pubkey, signature = %signature, error = %e, "Airdrop not confirmed");
            ProvisioningError::Confirmation(e)
        })?;
        info!(pubkey = %pubkey, signature = %signature, "Airdrop confirmed");

        match self.rpc.get_balance(&pubkey).await {
            Ok(lamports) => info!(pubkey = %pubkey, balance = %format_sol(lamports), "Wallet balance"),
            Err(e) => warn!(pubkey = %pubkey, error = %e, "Balance lookup after airdrop failed"),
        }

        Ok(LocalAccount::new(keypair))
    }
}
