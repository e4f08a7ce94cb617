//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g. `RUST_LOG=stackedu=debug`
/// to see every block assignment.
///
/// # Example
/// ```
/// stackedu::core::logging::init();
/// log::info!("Stack scene started");
/// ```
pub fn init() {
    init_with_default("info");
}

/// Initialize logging with `filter` used when RUST_LOG is unset.
///
/// Calling it again after logging is set up is a no-op.
pub fn init_with_default(filter: &str) {
    let result = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(filter)
    )
    .format_timestamp_millis()
    .try_init();

    if result.is_err() {
        log::debug!("Logger already initialized");
    }
}
