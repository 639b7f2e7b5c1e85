//! Logging setup shared by binaries and integration harnesses.

/// Subscriber configuration (format, filters).
pub mod logging;

pub use logging::LogFormat;

/// Initialize process-wide logging from the environment.
///
/// Safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    logging::init();
}
