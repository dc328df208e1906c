//! Diagnostic logging.
//!
//! Logs go to stderr so they never mix with prompts on stdout. The filter
//! comes from `MAGNETIC_LABEL_LOG`, then `RUST_LOG`, defaulting to `warn`.

use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MAGNETIC_LABEL_LOG";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // A second init (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
