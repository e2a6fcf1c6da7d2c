//! Tracing setup shared by the CLI and the server.
//!
//! Reads `RUST_LOG`; falls back to `default_directive` when it is unset.
//! Output goes to stderr in compact format so CLI stdout stays parseable.
//!
//! # Example
//! ```bash
//! RUST_LOG=polls=debug polls vote anxiety A
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .init();
}
