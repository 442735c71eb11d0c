//! Core helpers shared by every component: units, send bounds, timeouts.

pub mod timeout;
pub mod units;

pub use timeout::{with_timeout, Elapsed};
pub use units::{format_sol, LAMPORTS_PER_SOL};

/// `Send + Sync` on native targets, nothing on wasm32.
///
/// Browser handles (`JsValue`) and fetch futures are single-threaded, so the
/// capability traits only demand thread safety where it exists.
#[cfg(not(target_arch = "wasm32"))]
pub trait MaybeSend: Send + Sync {}
#[cfg(not(target_arch = "wasm32"))]
impl<T: Send + Sync + ?Sized> MaybeSend for T {}

#[cfg(target_arch = "wasm32")]
pub trait MaybeSend {}
#[cfg(target_arch = "wasm32")]
impl<T: ?Sized> MaybeSend for T {}
