//! Runtime-agnostic timeout built on `futures-timer` (works on wasm32).

use futures::future::{self, Either};
use futures_timer::Delay;
use std::future::Future;
use std::time::Duration;

/// The deadline passed before the wrapped future resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Elapsed(pub Duration);

impl std::fmt::Display for Elapsed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "deadline of {:?} elapsed", self.0)
    }
}

impl std::error::Error for Elapsed {}

/// Race `fut` against a timer. The future is dropped if the timer wins.
pub async fn with_timeout<F: Future>(limit: Duration, fut: F) -> Result<F::Output, Elapsed> {
    let fut = std::pin::pin!(fut);
    match future::select(fut, Delay::new(limit)).await {
        Either::Left((output, _)) => Ok(output),
        Either::Right(((), _)) => Err(Elapsed(limit)),
    }
}
