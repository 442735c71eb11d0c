//! Shared test doubles: an in-memory ledger and a scripted wallet provider.
//!
//! Nothing here touches the network.

#![allow(dead_code)]

use async_trait::async_trait;
use solana_sdk::hash::Hash;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction::SystemInstruction;
use solana_sdk::system_program;
use solana_sdk::transaction::Transaction;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use solbridge::provider::EventSender;
use solbridge::{
    ClusterRpc, ConnectOptions, ProviderError, ProviderEvent, ProviderHost, RpcError, WalletProvider,
};

/// Flat fee charged per signature, as on a real cluster.
pub const FEE_LAMPORTS: u64 = 5_000;

pub fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

// =============================================================================
// Ledger
// =============================================================================

/// Failure switches. Each one makes the matching call fail until cleared.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub airdrop: bool,
    pub confirmation: bool,
    pub blockhash: bool,
    pub send: bool,
    /// Transaction lands but confirmation never arrives.
    pub send_timeout: bool,
    pub balance: bool,
}

#[derive(Default)]
struct Books {
    balances: HashMap<Pubkey, u64>,
    signatures: HashSet<Signature>,
    airdrops: usize,
    sends: usize,
}

#[derive(Default)]
pub struct MemoryLedger {
    books: Mutex<Books>,
    faults: Mutex<Faults>,
    calls: AtomicUsize,
    /// Fires once a transaction has been applied, before it is confirmed.
    pub submitted: Notify,
    confirm_gate: Mutex<Option<Arc<Notify>>>,
    blockhash_gate: Mutex<Option<Arc<Notify>>>,
}

impl MemoryLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_faults(&self, faults: Faults) {
        *lock(&self.faults) = faults;
    }

    pub fn faults(&self) -> Faults {
        lock(&self.faults).clone()
    }

    /// Hold every `send_and_confirm` after submission until the returned
    /// handle is notified.
    pub fn hold_confirmation(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.confirm_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Hold the next `latest_blockhash` until the returned handle is notified.
    pub fn hold_blockhash(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.blockhash_gate) = Some(Arc::clone(&gate));
        gate
    }

    pub fn balance(&self, pubkey: &Pubkey) -> u64 {
        lock(&self.books).balances.get(pubkey).copied().unwrap_or(0)
    }

    pub fn fund(&self, pubkey: &Pubkey, lamports: u64) {
        *lock(&self.books).balances.entry(*pubkey).or_default() += lamports;
    }

    /// Every `ClusterRpc` call made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn airdrops(&self) -> usize {
        lock(&self.books).airdrops
    }

    pub fn sends(&self) -> usize {
        lock(&self.books).sends
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn node_error(method: &str, message: &str) -> RpcError {
        RpcError::Node { method: method.to_string(), code: -32002, message: message.to_string() }
    }

    fn apply(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        transaction
            .verify()
            .map_err(|e| Self::node_error("sendTransaction", &format!("signature verification failed: {e}")))?;

        let message = &transaction.message;
        let [ix] = message.instructions.as_slice() else {
            return Err(Self::node_error("sendTransaction", "expected exactly one instruction"));
        };
        if message.account_keys[ix.program_id_index as usize] != system_program::id() {
            return Err(Self::node_error("sendTransaction", "not a system program instruction"));
        }
        let SystemInstruction::Transfer { lamports } = bincode::deserialize::<SystemInstruction>(&ix.data)
            .map_err(|e| Self::node_error("sendTransaction", &e.to_string()))?
        else {
            return Err(Self::node_error("sendTransaction", "not a transfer"));
        };
        let from = message.account_keys[ix.accounts[0] as usize];
        let to = message.account_keys[ix.accounts[1] as usize];
        let fee = FEE_LAMPORTS * transaction.signatures.len() as u64;

        let mut books = lock(&self.books);
        let available = books.balances.get(&from).copied().unwrap_or(0);
        if available < lamports + fee {
            return Err(Self::node_error("sendTransaction", "insufficient funds for transfer"));
        }
        books.balances.insert(from, available - lamports - fee);
        *books.balances.entry(to).or_default() += lamports;

        let signature = transaction.signatures[0];
        books.signatures.insert(signature);
        books.sends += 1;
        Ok(signature)
    }
}

#[async_trait]
impl ClusterRpc for MemoryLedger {
    async fn request_airdrop(&self, pubkey: &Pubkey, lamports: u64) -> Result<Signature, RpcError> {
        self.touch();
        if self.faults().airdrop {
            return Err(Self::node_error("requestAirdrop", "airdrop request limit reached"));
        }
        let signature = Signature::new_unique();
        let mut books = lock(&self.books);
        *books.balances.entry(*pubkey).or_default() += lamports;
        books.signatures.insert(signature);
        books.airdrops += 1;
        Ok(signature)
    }

    async fn await_confirmation(&self, signature: &Signature) -> Result<(), RpcError> {
        self.touch();
        if self.faults().confirmation {
            return Err(RpcError::Timeout { signature: *signature, waited: Duration::from_secs(60) });
        }
        if lock(&self.books).signatures.contains(signature) {
            Ok(())
        } else {
            Err(Self::node_error("getSignatureStatuses", "unknown signature"))
        }
    }

    async fn get_balance(&self, pubkey: &Pubkey) -> Result<u64, RpcError> {
        self.touch();
        if self.faults().balance {
            return Err(Self::node_error("getBalance", "node is behind"));
        }
        Ok(self.balance(pubkey))
    }

    async fn latest_blockhash(&self) -> Result<Hash, RpcError> {
        self.touch();
        if self.faults().blockhash {
            return Err(Self::node_error("getLatestBlockhash", "node is unhealthy"));
        }
        let gate = lock(&self.blockhash_gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(Hash::new_unique())
    }

    async fn send_and_confirm(&self, transaction: &Transaction) -> Result<Signature, RpcError> {
        self.touch();
        let faults = self.faults();
        if faults.send {
            return Err(Self::node_error("sendTransaction", "Transaction simulation failed"));
        }
        let signature = self.apply(transaction)?;
        self.submitted.notify_one();

        let gate = lock(&self.confirm_gate).clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if faults.send_timeout {
            return Err(RpcError::Timeout { signature, waited: Duration::from_secs(60) });
        }
        Ok(signature)
    }
}

// =============================================================================
// Provider
// =============================================================================

/// What the scripted extension does. Shared between the host, every provider
/// handle it injects, and the test.
pub struct Script {
    pub present: AtomicBool,
    pub branded: AtomicBool,
    wallet: Mutex<Result<Pubkey, ProviderError>>,
    disconnect_error: Mutex<Option<ProviderError>>,
    connected: AtomicBool,
    sink: Mutex<Option<EventSender>>,
    connect_gate: Mutex<Option<Arc<Notify>>>,
    disconnect_gate: Mutex<Option<Arc<Notify>>>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub subscriptions: AtomicUsize,
}

impl Script {
    /// A branded provider that approves connection as `wallet`.
    pub fn approving(wallet: Pubkey) -> Arc<Self> {
        Arc::new(Self {
            present: AtomicBool::new(true),
            branded: AtomicBool::new(true),
            wallet: Mutex::new(Ok(wallet)),
            disconnect_error: Mutex::new(None),
            connected: AtomicBool::new(false),
            sink: Mutex::new(None),
            connect_gate: Mutex::new(None),
            disconnect_gate: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            subscriptions: AtomicUsize::new(0),
        })
    }

    pub fn absent() -> Arc<Self> {
        let script = Self::approving(Pubkey::new_unique());
        script.present.store(false, Ordering::SeqCst);
        script
    }

    /// An injected object that is not the branded provider.
    pub fn look_alike() -> Arc<Self> {
        let script = Self::approving(Pubkey::new_unique());
        script.branded.store(false, Ordering::SeqCst);
        script
    }

    pub fn reject_with(&self, error: ProviderError) {
        *lock(&self.wallet) = Err(error);
    }

    pub fn approve_as(&self, wallet: Pubkey) {
        *lock(&self.wallet) = Ok(wallet);
    }

    pub fn fail_disconnect_with(&self, error: ProviderError) {
        *lock(&self.disconnect_error) = Some(error);
    }

    /// Hold the next `connect` until the returned handle is notified.
    pub fn hold_connect(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.connect_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Hold the next `disconnect` until the returned handle is notified.
    pub fn hold_disconnect(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *lock(&self.disconnect_gate) = Some(Arc::clone(&gate));
        gate
    }

    /// Fire an extension-side notification. False if nobody subscribed.
    pub fn emit(&self, event: ProviderEvent) -> bool {
        match event {
            ProviderEvent::Connect(_) | ProviderEvent::AccountChanged(Some(_)) => {
                self.connected.store(true, Ordering::SeqCst)
            }
            _ => self.connected.store(false, Ordering::SeqCst),
        }
        lock(&self.sink).as_ref().is_some_and(|tx| tx.send(event).is_ok())
    }
}

pub struct ScriptedProvider {
    script: Arc<Script>,
}

#[async_trait]
impl WalletProvider for ScriptedProvider {
    fn is_phantom(&self) -> bool {
        self.script.branded.load(Ordering::SeqCst)
    }

    fn public_key(&self) -> Option<Pubkey> {
        if self.is_connected() {
            lock(&self.script.wallet).as_ref().ok().copied()
        } else {
            None
        }
    }

    fn is_connected(&self) -> bool {
        self.script.connected.load(Ordering::SeqCst)
    }

    async fn connect(&self, _options: ConnectOptions) -> Result<Pubkey, ProviderError> {
        self.script.connect_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.script.connect_gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let result = lock(&self.script.wallet).clone();
        if result.is_ok() {
            self.script.connected.store(true, Ordering::SeqCst);
        }
        result
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        self.script.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let gate = lock(&self.script.disconnect_gate).take();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.script.connected.store(false, Ordering::SeqCst);
        match lock(&self.script.disconnect_error).clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn subscribe(&self, events: EventSender) {
        self.script.subscriptions.fetch_add(1, Ordering::SeqCst);
        *lock(&self.script.sink) = Some(events);
    }
}

/// Host whose injection slot is driven by a `Script`.
pub struct ScriptedHost {
    script: Arc<Script>,
}

impl ScriptedHost {
    pub fn new(script: &Arc<Script>) -> Self {
        Self { script: Arc::clone(script) }
    }
}

impl ProviderHost for ScriptedHost {
    type Provider = ScriptedProvider;

    fn injected(&self) -> Option<ScriptedProvider> {
        self.script
            .present
            .load(Ordering::SeqCst)
            .then(|| ScriptedProvider { script: Arc::clone(&self.script) })
    }
}

// =============================================================================
// Fixtures
// =============================================================================

pub type TestBridge = solbridge::Bridge<ScriptedHost, MemoryLedger>;

pub fn bridge(script: &Arc<Script>, ledger: &Arc<MemoryLedger>) -> TestBridge {
    solbridge::Bridge::new(ScriptedHost::new(script), Arc::clone(ledger))
}

/// Poll until `check` passes; panics after one second.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..100 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within 1s");
}
