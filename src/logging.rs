//! Logging setup
//!
//! Logs go to stderr; stdout is reserved for the Alfred JSON document.

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `DEBUG` is set
const DEFAULT_FILTER: &str = "warn";

/// Picks the log filter directive.
///
/// `RUST_LOG` wins when present. Otherwise a non-empty `DEBUG` variable turns on
/// debug output for this crate.
pub fn filter_directive(rust_log: Option<&str>, debug: Option<&str>) -> String {
    match (rust_log, debug) {
        (Some(directive), _) if !directive.is_empty() => directive.to_string(),
        (_, Some(flag)) if !flag.is_empty() => format!("{},appsearch=debug", DEFAULT_FILTER),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs the global stderr subscriber
pub fn init() {
    let rust_log = std::env::var("RUST_LOG").ok();
    let debug = std::env::var("DEBUG").ok();
    let directive = filter_directive(rust_log.as_deref(), debug.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
