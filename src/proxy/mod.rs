//! Proxy module for parsing and checking proxies
//!
//! This module provides functionality for:
//! - Parsing proxy descriptors from list lines
//! - Probing proxies through an HTTP transport with a timeout and one retry
//! - Running probes under a bounded pool and streaming results as they complete
//! - Classifying results into latency tiers

pub mod checker;
pub mod models;
pub mod parser;
pub mod report;
pub mod results;
pub mod transport;

pub use checker::{CheckerConfig, ProxyChecker, UrlSelector, DEFAULT_TEST_URLS};
pub use models::{FailureReason, ProbeOutcome, ProbeReport, Proxy, ProxyAuth, ProxyType};
pub use parser::ProxyParser;
pub use report::{classify, Classification, RunSummary, Tier, DEFAULT_THRESHOLD_MS};
pub use results::RunResult;
pub use transport::{ProbeTransport, ReqwestTransport, TransportError};
