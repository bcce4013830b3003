//! Test log output.

use tracing_subscriber::EnvFilter;

/// Installs a fmt subscriber that writes through the test harness's captured
/// output. The filter comes from `RUST_LOG` and defaults to `warn`, so leak
/// reports show up on failing tests.
///
/// Safe to call from every test; only the first call installs a subscriber.
pub fn init_test_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
