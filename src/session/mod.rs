//! WalletSession - connection state machine over an injected provider.
//!
//! ```text
//! NoProvider ──attach──► ProviderAvailable ──connect──► Connecting ──ok──► Connected(pk)
//!                              ▲    ▲                       │                 │   │
//!                              │    └──────── rejected ─────┘                 │   │
//!                              │                                   disconnect │   │ Disconnect /
//!                              │                                              ▼   │ AccountChanged(None)
//!                              └──────────────── clear_connection ◄── Disconnecting◄┘
//! ```
//!
//! User-initiated `disconnect()` and provider-fired notifications both end in
//! `clear_if`, so the two paths cannot disagree about the end state. A user
//! disconnect only clears a session still in `Disconnecting`.
//! The external key only exists inside `Connected`.

use solana_sdk::pubkey::Pubkey;
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::SessionError;
use crate::provider::{ConnectOptions, EventSender, ProviderEvent, WalletProvider};

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NoProvider,
    ProviderAvailable,
    Connecting,
    Connected(Pubkey),
    Disconnecting,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::NoProvider => "no-provider",
            SessionState::ProviderAvailable => "provider-available",
            SessionState::Connecting => "connecting",
            SessionState::Connected(_) => "connected",
            SessionState::Disconnecting => "disconnecting",
        }
    }

    pub fn public_key(&self) -> Option<Pubkey> {
        match self {
            SessionState::Connected(pk) => Some(*pk),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }
}

struct SessionInner<P> {
    state: RwLock<SessionState>,
    provider: RwLock<Option<Arc<P>>>,
    events: EventSender,
    receiver: Mutex<Option<mpsc::UnboundedReceiver<ProviderEvent>>>,
}

/// Wallet session. Clones share state.
pub struct WalletSession<P> {
    inner: Arc<SessionInner<P>>,
}

impl<P> Clone for WalletSession<P> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner) }
    }
}

impl<P: WalletProvider> Default for WalletSession<P> {
    fn default() -> Self { Self::new() }
}

impl<P: WalletProvider> WalletSession<P> {
    pub fn new() -> Self {
        let (events, receiver) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(SessionInner {
                state: RwLock::new(SessionState::NoProvider),
                provider: RwLock::new(None),
                events,
                receiver: Mutex::new(Some(receiver)),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        *self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn external_public_key(&self) -> Option<Pubkey> {
        self.state().public_key()
    }

    pub fn provider_available(&self) -> bool {
        self.provider().is_some()
    }

    pub fn provider(&self) -> Option<Arc<P>> {
        self.inner.provider.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Adopt a located provider and subscribe to its notifications.
    /// Returns false if one is already attached.
    pub fn attach(&self, provider: P) -> bool {
        let provider = Arc::new(provider);
        {
            let mut slot = self.inner.provider.write().unwrap_or_else(PoisonError::into_inner);
            if slot.is_some() {
                return false;
            }
            *slot = Some(Arc::clone(&provider));
        }
        provider.subscribe(self.inner.events.clone());
        self.with_state(|state| {
            if *state == SessionState::NoProvider {
                *state = SessionState::ProviderAvailable;
            }
        });
        info!("Wallet provider available");
        true
    }

    /// The session's notification consumer. Handed out once.
    pub fn listener(&self) -> Option<EventListener<P>> {
        let rx = self.inner.receiver.lock().unwrap_or_else(PoisonError::into_inner).take()?;
        Some(EventListener { session: Arc::downgrade(&self.inner), rx })
    }

    /// Ask the provider for a connection. `Ok(None)` without a provider.
    pub async fn connect(&self, options: ConnectOptions) -> Result<Option<Pubkey>, SessionError> {
        let Some(provider) = self.provider() else {
            debug!("connect ignored: no wallet provider");
            return Ok(None);
        };

        self.with_state(|state| match *state {
            SessionState::ProviderAvailable => {
                *state = SessionState::Connecting;
                Ok(())
            }
            other => Err(SessionError::InvalidTransition { action: "connect", state: other.as_str() }),
        })?;

        match provider.connect(options).await {
            Ok(pubkey) => {
                self.with_state(|state| *state = SessionState::Connected(pubkey));
                info!(pubkey = %pubkey, "Connected to wallet");
                Ok(Some(pubkey))
            }
            Err(e) => {
                self.with_state(|state| {
                    if *state == SessionState::Connecting {
                        *state = SessionState::ProviderAvailable;
                    }
                });
                error!(error = %e, "Error connecting to wallet");
                Err(SessionError::ConnectionRejected(e))
            }
        }
    }

    /// Reconnect silently if the site is already trusted.
    pub async fn connect_trusted(&self) -> Result<Option<Pubkey>, SessionError> {
        self.connect(ConnectOptions::trusted()).await
    }

    /// Tear down the connection. Returns false (no-op) unless `Connected`.
    pub async fn disconnect(&self) -> bool {
        let Some(provider) = self.provider() else { return false };

        let started = self.with_state(|state| match *state {
            SessionState::Connected(_) => {
                *state = SessionState::Disconnecting;
                true
            }
            _ => false,
        });
        if !started {
            debug!(state = self.state().as_str(), "disconnect ignored: not connected");
            return false;
        }

        if let Err(e) = provider.disconnect().await {
            warn!(error = %e, "Provider disconnect reported an error; clearing session anyway");
        }
        // An event may have settled the state while the provider was busy.
        self.clear_if("user", |state| *state == SessionState::Disconnecting);
        true
    }

    /// Apply a provider notification and return the resulting state.
    pub fn apply(&self, event: ProviderEvent) -> SessionState {
        match event {
            ProviderEvent::Disconnect => {
                self.clear_connection("provider");
            }
            ProviderEvent::Connect(pubkey) => {
                let adopted = self.with_state(|state| match *state {
                    SessionState::ProviderAvailable
                    | SessionState::Connecting
                    | SessionState::Connected(_) => {
                        *state = SessionState::Connected(pubkey);
                        true
                    }
                    _ => false,
                });
                if adopted {
                    info!(pubkey = %pubkey, "Wallet connected from extension");
                }
            }
            ProviderEvent::AccountChanged(Some(pubkey)) => {
                let switched = self.with_state(|state| match *state {
                    SessionState::Connected(_) => {
                        *state = SessionState::Connected(pubkey);
                        true
                    }
                    _ => false,
                });
                if switched {
                    info!(pubkey = %pubkey, "Wallet account changed");
                }
            }
            ProviderEvent::AccountChanged(None) => {
                self.clear_connection("account change");
            }
        }
        self.state()
    }

    /// Single exit from a connection. Idempotent.
    fn clear_connection(&self, origin: &'static str) -> bool {
        self.clear_if(origin, |state| {
            matches!(state, SessionState::Connected(_) | SessionState::Disconnecting)
        })
    }

    fn clear_if(&self, origin: &'static str, applies: impl FnOnce(&SessionState) -> bool) -> bool {
        let cleared = self.with_state(|state| {
            if applies(state) {
                *state = SessionState::ProviderAvailable;
                true
            } else {
                false
            }
        });
        if cleared {
            info!(origin, "Wallet disconnected");
        }
        cleared
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut state = self.inner.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

/// Drains provider notifications into the session. Spawn `run()` on the
/// host executor; it returns once the session is dropped.
pub struct EventListener<P> {
    session: Weak<SessionInner<P>>,
    rx: mpsc::UnboundedReceiver<ProviderEvent>,
}

impl<P: WalletProvider> EventListener<P> {
    pub async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            let Some(inner) = self.session.upgrade() else { break };
            let state = WalletSession { inner }.apply(event.clone());
            debug!(?event, state = state.as_str(), "Provider event applied");
        }
    }
}
