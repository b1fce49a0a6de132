//! Process-wide tracing setup.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing with the format chosen by `LOG_FORMAT`.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    subscriber::init(LogFormat::from_env());
}
