/*!
Logging initialisation for the command line host.

Logs go to stderr so that progress lines and the JSON report on stdout stay
machine readable. `RUST_LOG` takes precedence; otherwise debug builds log at
DEBUG and release builds at INFO.

With the `profiling` feature, the library's instrumented functions emit
tracing spans (`profiling/profile-with-tracing`), which the same subscriber
picks up.
*/

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Filter used when `RUST_LOG` is unset or invalid
pub fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber. Call once, before any work starts.
pub fn setup_logging() {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_filter()),
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    #[cfg(feature = "profiling")]
    tracing::info!("Logging initialized (profiling spans enabled)");
    #[cfg(not(feature = "profiling"))]
    tracing::debug!("Logging initialized");
}

pub fn log_version_info() {
    tracing::info!("{}", short_version_info());
}

pub fn short_version_info() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}
