//! `window.solana` as a `WalletProvider`.
//!
//! Everything goes through `Reflect` so a page without the extension (or with
//! a half-initialised object) yields `None`/errors instead of panics.

use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect};
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::ProviderError;
use crate::provider::{ConnectOptions, EventSender, ProviderEvent, ProviderHost, WalletProvider};

/// Phantom's "user rejected the request" code.
const USER_REJECTED: f64 = 4001.0;

/// The page's global object.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserHost;

impl ProviderHost for BrowserHost {
    type Provider = PhantomProvider;

    fn injected(&self) -> Option<PhantomProvider> {
        let window = web_sys::window()?;
        let inner = prop(&window, "solana")?;
        Some(PhantomProvider { inner })
    }
}

/// Handle over the injected extension object.
pub struct PhantomProvider {
    inner: JsValue,
}

fn prop(target: &JsValue, key: &str) -> Option<JsValue> {
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn call(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, ProviderError> {
    let func: Function = prop(target, method)
        .and_then(|f| f.dyn_into::<Function>().ok())
        .ok_or_else(|| ProviderError::Malformed(format!("missing method {method}")))?;
    let argv: Array = args.iter().collect();
    func.apply(target, &argv).map_err(js_error)
}

async fn call_async(target: &JsValue, method: &str, args: &[JsValue]) -> Result<JsValue, ProviderError> {
    let promise: Promise = call(target, method, args)?
        .dyn_into()
        .map_err(|_| ProviderError::Malformed(format!("{method} did not return a promise")))?;
    JsFuture::from(promise).await.map_err(js_error)
}

fn js_error(value: JsValue) -> ProviderError {
    let message = prop(&value, "message")
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    match prop(&value, "code").and_then(|c| c.as_f64()) {
        Some(code) if code == USER_REJECTED => ProviderError::Rejected(message),
        _ => ProviderError::Other(message),
    }
}

/// Accepts a `PublicKey` object (`toBase58()`) or a base58 string.
fn pubkey_from_js(value: &JsValue) -> Result<Pubkey, ProviderError> {
    let text = match value.as_string() {
        Some(text) => text,
        None => call(value, "toBase58", &[])?
            .as_string()
            .ok_or_else(|| ProviderError::Malformed("toBase58 returned a non-string".into()))?,
    };
    Pubkey::from_str(&text).map_err(|e| ProviderError::Malformed(format!("public key {text}: {e}")))
}

impl PhantomProvider {
    fn on(&self, event: &str, handler: Closure<dyn FnMut(JsValue)>) {
        if let Err(e) = call(&self.inner, "on", &[JsValue::from_str(event), handler.as_ref().clone()]) {
            tracing::warn!(event, error = %e, "Could not subscribe to provider event");
        }
        // Lives as long as the page's provider object.
        handler.forget();
    }
}

#[async_trait(?Send)]
impl WalletProvider for PhantomProvider {
    fn is_phantom(&self) -> bool {
        prop(&self.inner, "isPhantom").and_then(|v| v.as_bool()) == Some(true)
    }

    fn public_key(&self) -> Option<Pubkey> {
        prop(&self.inner, "publicKey").and_then(|v| pubkey_from_js(&v).ok())
    }

    fn is_connected(&self) -> bool {
        prop(&self.inner, "isConnected").and_then(|v| v.as_bool()).unwrap_or(false)
    }

    async fn connect(&self, options: ConnectOptions) -> Result<Pubkey, ProviderError> {
        let opts = Object::new();
        if options.only_if_trusted {
            Reflect::set(&opts, &JsValue::from_str("onlyIfTrusted"), &JsValue::TRUE).map_err(js_error)?;
        }
        let reply = call_async(&self.inner, "connect", &[opts.into()]).await?;
        let key = prop(&reply, "publicKey")
            .ok_or_else(|| ProviderError::Malformed("connect resolved without publicKey".into()))?;
        pubkey_from_js(&key)
    }

    async fn disconnect(&self) -> Result<(), ProviderError> {
        call_async(&self.inner, "disconnect", &[]).await.map(|_| ())
    }

    fn subscribe(&self, events: EventSender) {
        let tx = events.clone();
        self.on(
            "connect",
            Closure::new(move |key: JsValue| match pubkey_from_js(&key) {
                Ok(pubkey) => {
                    let _ = tx.send(ProviderEvent::Connect(pubkey));
                }
                Err(e) => tracing::warn!(error = %e, "connect event without a usable key"),
            }),
        );

        let tx = events.clone();
        self.on(
            "disconnect",
            Closure::new(move |_: JsValue| {
                let _ = tx.send(ProviderEvent::Disconnect);
            }),
        );

        let tx = events;
        self.on(
            "accountChanged",
            Closure::new(move |key: JsValue| {
                let next = if key.is_null() || key.is_undefined() {
                    None
                } else {
                    pubkey_from_js(&key).ok()
                };
                let _ = tx.send(ProviderEvent::AccountChanged(next));
            }),
        );
    }
}
