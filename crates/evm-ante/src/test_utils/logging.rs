use tracing_subscriber::{fmt, EnvFilter};

/// Installs a test-friendly tracing subscriber once per test binary.
///
/// The filter comes from `RUST_LOG` and defaults to no output. Events go through the test writer
/// so they are captured per test.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
    let _ = fmt().with_env_filter(filter).with_test_writer().try_init();
}
