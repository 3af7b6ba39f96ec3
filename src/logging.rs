//! Log output setup.
//!
//! Filter directives come from `ISEGRID_LOG` (e.g. `isegrid_core=debug`),
//! falling back to `warn`. Logs go to stderr so command output on stdout
//! stays machine-readable.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "ISEGRID_LOG";

pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second init (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
