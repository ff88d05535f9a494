//! Proxy Probe - Concurrent Proxy Validator
//!
//! Validates a list of proxies by sending a request through each one,
//! measuring latency and sorting them into fast, normal, slow and broken.
//! Working proxies can be exported as plain text, JSON or CSV.

pub mod export;
pub mod proxy;

pub use export::{ExportFormat, ExportSink, FileSink};
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
