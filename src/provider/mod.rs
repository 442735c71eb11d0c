//! Provider - the injected wallet as a named capability set.
//!
//! ```text
//! ProviderHost (window, test double)
//!     │ injected()
//!     ▼
//! candidate ──is_phantom()?──► locate() ──► Some(provider) / None
//!     │
//!     └── subscribe(EventSender) ──► ProviderEvent ──► WalletSession
//! ```

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::mpsc;

use crate::core::MaybeSend;
use crate::error::ProviderError;

/// Sink the provider pushes its notifications into.
pub type EventSender = mpsc::UnboundedSender<ProviderEvent>;

/// Notifications the extension fires on its own, outside any app call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    Connect(Pubkey),
    Disconnect,
    /// The user switched accounts inside the extension. `None` means the
    /// new account has not approved this site.
    AccountChanged(Option<Pubkey>),
}

/// Options for `connect`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnectOptions {
    /// Only succeed silently if the user already trusts this site.
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    pub fn trusted() -> Self {
        Self { only_if_trusted: true }
    }
}

/// Capabilities consumed from the injected wallet.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait WalletProvider: MaybeSend {
    /// Brand flag; look-alike objects answer false.
    fn is_phantom(&self) -> bool;
    fn public_key(&self) -> Option<Pubkey>;
    fn is_connected(&self) -> bool;
    async fn connect(&self, options: ConnectOptions) -> Result<Pubkey, ProviderError>;
    async fn disconnect(&self) -> Result<(), ProviderError>;
    /// Register for `connect`, `disconnect` and `accountChanged`.
    fn subscribe(&self, events: EventSender);
}

/// Where a provider may have been injected.
pub trait ProviderHost: MaybeSend {
    type Provider: WalletProvider + 'static;

    /// Whatever object is currently registered, branded or not.
    fn injected(&self) -> Option<Self::Provider>;
}

/// Find a genuine provider. Pure and repeatable: the host may only inject
/// it after a delay, so callers retry on `None`.
pub fn locate<H: ProviderHost>(host: &H) -> Option<H::Provider> {
    let candidate = host.injected()?;
    if candidate.is_phantom() {
        Some(candidate)
    } else {
        tracing::debug!("Ignoring injected wallet object without the provider brand");
        None
    }
}
