//! One-shot `tracing` subscriber setup.
//!
//! Filtering follows `RUST_LOG` (default `info`).  Set
//! `SUBSUME_LOG_FORMAT=json` to emit newline-delimited JSON suitable for log
//! aggregators; the default is a compact human format.

/// Install the global tracing subscriber.
///
/// Safe to call more than once: a second call (as happens when several tests
/// initialise logging) is a no-op rather than a panic.
pub fn init_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("SUBSUME_LOG_FORMAT").as_deref() == Ok("json") {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .try_init();
    }
}
