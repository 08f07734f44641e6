//! Log output for test runs.
//!
//! GUIcheck itself only emits `tracing` events. Retried attempts are logged
//! at `debug`, idle cycles and locator hits at `trace`, and a dispatch that
//! is abandoned because the event loop went away at `warn`. Test binaries
//! install a subscriber with [`init_test_logging`].
//!
//! Environment variables:
//! - `GUICHECK_LOG` - filter directive (default: "warn")

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable holding the filter directive
pub const LOG_ENV: &str = "GUICHECK_LOG";

/// Filter used when `GUICHECK_LOG` is unset or invalid
pub const DEFAULT_FILTER: &str = "warn";

/// Install a stderr subscriber suitable for `cargo test`.
///
/// Output goes through the test writer so it is captured per test. Calling
/// this from every test is fine; only the first call installs anything.
pub fn init_test_logging() {
    let filter = env_filter(DEFAULT_FILTER);
    let layer = fmt::layer().with_target(true).with_test_writer();
    let _ = Registry::default().with(filter).with(layer).try_init();
}

/// Install a JSON subscriber on stderr, for CI logs.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_json_logging(default_filter: &str) -> bool {
    let filter = env_filter(default_filter);
    let layer = fmt::layer()
        .json()
        .with_thread_names(true)
        .with_writer(std::io::stderr);
    Registry::default().with(filter).with(layer).try_init().is_ok()
}

fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter))
}
