//! Bridge - the explicit session object a UI shell owns.
//!
//! Four actions (`provision`, `connect`, `disconnect`, `transfer`) and three
//! observables (`provider_available`, `external_public_key`,
//! `local_public_key`). Every failed action is logged before it is returned.
//! Calls are not serialized here: the shell must not overlap the same action.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::info;

use crate::account::{AccountProvisioner, LocalAccount};
use crate::config::BridgeConfig;
use crate::error::{ProvisioningError, SessionError, TransferError};
use crate::provider::{locate, ConnectOptions, ProviderHost};
use crate::rpc::{ClusterRpc, HttpRpc};
use crate::session::{EventListener, SessionState, WalletSession};
use crate::transfer::{TransferParties, TransferPipeline, TransferReceipt, TRANSFER_LAMPORTS};

/// Observable state for the view layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub provider_available: bool,
    pub state: &'static str,
    pub external_public_key: Option<String>,
    pub local_public_key: Option<String>,
}

pub struct Bridge<H: ProviderHost, R> {
    host: H,
    session: WalletSession<H::Provider>,
    provisioner: AccountProvisioner<R>,
    pipeline: TransferPipeline<R>,
    local: RwLock<Option<LocalAccount>>,
}

impl<H: ProviderHost> Bridge<H, HttpRpc> {
    /// Bridge talking JSON-RPC to the configured cluster.
    pub fn over_http(host: H, config: &BridgeConfig) -> Self {
        info!(cluster = config.cluster.as_str(), commitment = config.commitment.as_str(), "Opening bridge");
        Self::new(host, Arc::new(HttpRpc::new(config)))
    }
}

impl<H: ProviderHost, R: ClusterRpc> Bridge<H, R> {
    /// Build the bridge and look for a provider once.
    pub fn new(host: H, rpc: Arc<R>) -> Self {
        let bridge = Self {
            host,
            session: WalletSession::new(),
            provisioner: AccountProvisioner::new(Arc::clone(&rpc)),
            pipeline: TransferPipeline::new(rpc),
            local: RwLock::new(None),
        };
        bridge.discover();
        bridge
    }

    /// Run the locator if no provider is attached yet. Safe to call often.
    pub fn discover(&self) -> bool {
        if self.session.provider_available() {
            return true;
        }
        match locate(&self.host) {
            Some(provider) => {
                self.session.attach(provider);
                true
            }
            None => false,
        }
    }

    /// Consumer for provider notifications; spawn `run()` once.
    pub fn event_listener(&self) -> Option<EventListener<H::Provider>> {
        self.session.listener()
    }

    pub fn session(&self) -> &WalletSession<H::Provider> {
        &self.session
    }

    /// Create and fund a fresh local keypair. It replaces the current one
    /// only once the airdrop has confirmed.
    pub async fn provision(&self) -> Result<Pubkey, ProvisioningError> {
        let account = self.provisioner.provision().await?;
        let pubkey = account.pubkey();
        *self.local.write().unwrap_or_else(PoisonError::into_inner) = Some(account);
        info!(pubkey = %pubkey, "Local keypair ready");
        Ok(pubkey)
    }

    pub async fn connect(&self) -> Result<Option<Pubkey>, SessionError> {
        self.discover();
        self.session.connect(ConnectOptions::default()).await
    }

    pub async fn connect_trusted(&self) -> Result<Option<Pubkey>, SessionError> {
        self.discover();
        self.session.connect_trusted().await
    }

    pub async fn disconnect(&self) -> bool {
        self.session.disconnect().await
    }

    /// Send `TRANSFER_LAMPORTS` from the local keypair to the connected wallet.
    pub async fn transfer(&self) -> Result<TransferReceipt, TransferError> {
        self.pipeline.transfer(TRANSFER_LAMPORTS, self).await
    }

    pub fn provider_available(&self) -> bool {
        self.session.provider_available()
    }

    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    pub fn external_public_key(&self) -> Option<Pubkey> {
        self.session.external_public_key()
    }

    pub fn local_account(&self) -> Option<LocalAccount> {
        self.local.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn local_public_key(&self) -> Option<Pubkey> {
        self.local_account().map(|a| a.pubkey())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state();
        SessionSnapshot {
            provider_available: self.provider_available(),
            state: state.as_str(),
            external_public_key: state.public_key().map(|pk| pk.to_string()),
            local_public_key: self.local_public_key().map(|pk| pk.to_string()),
        }
    }
}

impl<H: ProviderHost, R: ClusterRpc> TransferParties for Bridge<H, R> {
    fn sender(&self) -> Option<LocalAccount> {
        self.local_account()
    }

    fn recipient(&self) -> Option<Pubkey> {
        self.external_public_key()
    }
}
