//! WASM module: the bridge inside a browser page
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │          WasmBridge (JS API)            │
//! │  provision, connect, disconnect,        │
//! │  transfer + observable getters          │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │     Bridge<BrowserHost, HttpRpc>        │
//! └───────┬─────────────────────────┬───────┘
//!         │                         │
//! ┌───────▼─────────┐     ┌─────────▼───────┐
//! │ PhantomProvider │     │ HttpRpc (fetch) │
//! │ window.solana   │     │ cluster JSON-RPC│
//! └─────────────────┘     └─────────────────┘
//! ```

mod bridge;
mod phantom;

pub use bridge::WasmBridge;
pub use phantom::{BrowserHost, PhantomProvider};

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    crate::logging::init_browser_logging("info");
}

/// Log to browser console
pub fn console_log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}
