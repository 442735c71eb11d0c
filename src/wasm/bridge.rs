//! WasmBridge: the bridge exposed to JavaScript via wasm-bindgen

use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use super::phantom::BrowserHost;
use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::rpc::HttpRpc;
use crate::transfer::{RecipientBalance, TransferReceipt};

fn js_error(message: impl ToString) -> JsValue {
    JsValue::from_str(&message.to_string())
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsReceipt {
    signature: String,
    lamports: u64,
    sender: String,
    recipient: String,
    sender_balance: Option<u64>,
    /// `None` when the wallet disconnected before reporting.
    recipient_balance: Option<u64>,
    recipient_known: bool,
}

impl From<&TransferReceipt> for JsReceipt {
    fn from(r: &TransferReceipt) -> Self {
        let (recipient_known, recipient_balance) = match r.report.recipient {
            RecipientBalance::Known { lamports, .. } => (true, lamports),
            RecipientBalance::Unknown => (false, None),
        };
        Self {
            signature: r.signature.to_string(),
            lamports: r.lamports,
            sender: r.sender.to_string(),
            recipient: r.recipient.to_string(),
            sender_balance: r.report.sender,
            recipient_balance,
            recipient_known,
        }
    }
}

/// Browser session: one injected wallet, one ephemeral funded keypair.
#[wasm_bindgen]
pub struct WasmBridge {
    inner: Bridge<BrowserHost, HttpRpc>,
}

#[wasm_bindgen]
impl WasmBridge {
    /// `cluster` is `devnet` (default), `testnet`, `localnet`, or an RPC URL.
    #[wasm_bindgen(constructor)]
    pub fn new(cluster: Option<String>) -> Result<WasmBridge, JsValue> {
        let config = match cluster {
            Some(name) => BridgeConfig::new(name.parse().map_err(js_error)?),
            None => BridgeConfig::devnet(),
        };
        let inner = Bridge::over_http(BrowserHost, &config);
        if let Some(listener) = inner.event_listener() {
            spawn_local(listener.run());
        }
        Ok(Self { inner })
    }

    /// Look for `window.solana` again (it may be injected late).
    #[wasm_bindgen]
    pub fn discover(&self) -> bool {
        self.inner.discover()
    }

    /// Create and fund a local keypair; resolves to its public key.
    #[wasm_bindgen]
    pub async fn provision(&self) -> Result<String, JsValue> {
        self.inner.provision().await.map(|pk| pk.to_string()).map_err(js_error)
    }

    /// Resolves to the wallet public key, or null without a provider.
    #[wasm_bindgen]
    pub async fn connect(&self) -> Result<Option<String>, JsValue> {
        self.inner.connect().await.map(|pk| pk.map(|k| k.to_string())).map_err(js_error)
    }

    #[wasm_bindgen(js_name = "connectTrusted")]
    pub async fn connect_trusted(&self) -> Result<Option<String>, JsValue> {
        self.inner.connect_trusted().await.map(|pk| pk.map(|k| k.to_string())).map_err(js_error)
    }

    #[wasm_bindgen]
    pub async fn disconnect(&self) -> bool {
        self.inner.disconnect().await
    }

    #[wasm_bindgen]
    pub async fn transfer(&self) -> Result<JsValue, JsValue> {
        let receipt = self.inner.transfer().await.map_err(js_error)?;
        to_js(&JsReceipt::from(&receipt))
    }

    #[wasm_bindgen(getter, js_name = "providerAvailable")]
    pub fn provider_available(&self) -> bool {
        self.inner.provider_available()
    }

    #[wasm_bindgen(getter, js_name = "externalPublicKey")]
    pub fn external_public_key(&self) -> Option<String> {
        self.inner.external_public_key().map(|pk| pk.to_string())
    }

    #[wasm_bindgen(getter, js_name = "localPublicKey")]
    pub fn local_public_key(&self) -> Option<String> {
        self.inner.local_public_key().map(|pk| pk.to_string())
    }

    #[wasm_bindgen]
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&self.inner.snapshot())
    }
}
