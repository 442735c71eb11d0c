//! Solbridge: an injected Solana wallet on one side, a cluster RPC on the other.
//!
//! # Architecture
//!
//! ```text
//! Bridge (entry point, owned by the UI shell)
//!   │
//!   ├── WalletSession (provider state machine)
//!   │     ├── ProviderHost → locate() → WalletProvider (window.solana, test double)
//!   │     └── EventListener (connect / disconnect / accountChanged)
//!   │
//!   ├── AccountProvisioner (fresh keypair → airdrop → confirm)
//!   │
//!   └── TransferPipeline (blockhash → sign → submit+confirm → report)
//!         └── ClusterRpc (HttpRpc over JSON-RPC, shared with the provisioner)
//! ```
//!
//! # Actions
//!
//! | Action | Method | Description |
//! |--------|--------|-------------|
//! | provision | `bridge.provision()` | Create and fund a local keypair |
//! | connect | `bridge.connect()` | Ask the wallet for its public key |
//! | disconnect | `bridge.disconnect()` | Drop the wallet connection |
//! | transfer | `bridge.transfer()` | Send 1 SOL local → wallet |
//!
//! # Features
//!
//! - `native` - Native platform (CLI shells, tests, stderr logging)
//! - `wasm` - WASM platform (browser, `window.solana`, fetch)
//!
//! # Usage
//!
//! ```ignore
//! use solbridge::{Bridge, BridgeConfig};
//!
//! let bridge = Bridge::over_http(host, &BridgeConfig::devnet());
//! if let Some(listener) = bridge.event_listener() {
//!     tokio::spawn(listener.run());
//! }
//!
//! bridge.provision().await?;
//! bridge.connect().await?;
//! let receipt = bridge.transfer().await?;
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod account;
pub mod bridge;
pub mod config;
pub mod core;
pub mod error;
pub mod provider;
pub mod rpc;
pub mod session;
pub mod transfer;

#[cfg(any(feature = "native", feature = "wasm"))]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use account::{AccountProvisioner, LocalAccount, FUNDING_LAMPORTS};
pub use bridge::{Bridge, SessionSnapshot};
pub use config::{BridgeConfig, Cluster, Commitment};
pub use error::{
    ConfigError, Party, ProviderError, ProvisioningError, ReportingError, RpcError, SessionError,
    TransferError,
};
pub use provider::{locate, ConnectOptions, ProviderEvent, ProviderHost, WalletProvider};
pub use rpc::{ClusterRpc, HttpRpc};
pub use session::{EventListener, SessionState, WalletSession};
pub use transfer::{
    build_transfer, BalanceReport, RecipientBalance, TransferParties, TransferPipeline,
    TransferReceipt, TRANSFER_LAMPORTS,
};

pub use solana_sdk::pubkey::Pubkey;
pub use solana_sdk::signature::Signature;

// =============================================================================
// Re-exports: Native
// =============================================================================
#[cfg(feature = "native")]
pub use logging::init_logging;

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{BrowserHost, PhantomProvider, WasmBridge};
