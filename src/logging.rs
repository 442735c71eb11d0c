//! Subscriber setup. Library code only emits `tracing` events; the shell
//! picks one of these once at startup. Both are safe to call twice.

use tracing_subscriber::{fmt, EnvFilter};

/// Native subscriber on stderr. `RUST_LOG` picks the filter (default
/// `info`); `SOLBRIDGE_LOG_JSON=1` switches to one JSON object per event
/// for log shippers.
#[cfg(feature = "native")]
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("SOLBRIDGE_LOG_JSON").is_ok_and(|value| value == "1");
    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let _ = if json { builder.json().try_init() } else { builder.pretty().try_init() };
}

/// Browser variant: formatted lines go to `console.log`. No timestamps,
/// since wasm32 has no system clock.
#[cfg(feature = "wasm")]
pub fn init_browser_logging(level: &str) {
    let env_filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_ansi(false)
        .without_time()
        .with_writer(console::ConsoleWriter::default)
        .try_init();
}

#[cfg(feature = "wasm")]
mod console {
    use std::io;

    /// Buffers one formatted event and flushes it as a single console line.
    #[derive(Default)]
    pub struct ConsoleWriter {
        buf: Vec<u8>,
    }

    impl io::Write for ConsoleWriter {
        fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
            self.buf.extend_from_slice(bytes);
            Ok(bytes.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            if !self.buf.is_empty() {
                let line = String::from_utf8_lossy(&self.buf);
                crate::wasm::console_log(line.trim_end());
                self.buf.clear();
            }
            Ok(())
        }
    }

    impl Drop for ConsoleWriter {
        fn drop(&mut self) {
            let _ = io::Write::flush(self);
        }
    }
}
