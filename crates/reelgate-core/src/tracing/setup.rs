//! Tracing initialization.

use std::sync::Once;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

static INIT: Once = Once::new();

/// Initialize logging for reelgate.
///
/// Reads `REELGATE_LOG` for per-crate levels, e.g.
/// `REELGATE_LOG=reelgate_gates=debug,reelgate_storage=warn`.
/// Falls back to `reelgate=info` when unset or unparsable.
///
/// `REELGATE_LOG_FORMAT=json` switches to one JSON object per event.
///
/// Idempotent; later calls are no-ops.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("REELGATE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("reelgate=info"));
        let json = std::env::var("REELGATE_LOG_FORMAT")
            .map(|v| v.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let registry = tracing_subscriber::registry().with(filter);
        let result = if json {
            registry
                .with(fmt::layer().json().with_target(true).with_thread_ids(true))
                .try_init()
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_file(true)
                        .with_line_number(true),
                )
                .try_init()
        };
        // Another subscriber may already be installed by the host process.
        let _ = result;
    });
}
