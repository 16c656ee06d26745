//! Process-wide tracing setup for casetrack binaries.

pub mod subscriber;

pub use subscriber::LogFormat;

/// Initialize tracing with the format named by `LOG_FORMAT` (JSON unless
/// set to `pretty`) and the filter from `RUST_LOG` (default `info`).
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    let format = std::env::var("LOG_FORMAT")
        .map(|v| LogFormat::parse(&v))
        .unwrap_or_default();
    subscriber::init(format);
}
