//! Process-wide tracing setup shared by the ledger binaries.

pub mod tracing;

pub use self::tracing::LogFormat;

/// Initialize tracing using `RUST_LOG` and `LOG_FORMAT`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    tracing::init_with(LogFormat::from_env());
}
