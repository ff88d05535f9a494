//! Proxy checker module for probing proxies concurrently

use crate::proxy::models::{FailureReason, ProbeOutcome, ProbeReport, Proxy};
use crate::proxy::parser::ProxyParser;
use crate::proxy::results::RunResult;
use crate::proxy::transport::{ProbeTransport, ReqwestTransport, TransportError};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Default timeout for a single attempt in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Default number of concurrent probes
const DEFAULT_CONCURRENCY: usize = 10;

/// "What is my IP" endpoints probed when no override URL is given
pub const DEFAULT_TEST_URLS: &[&str] = &[
    "https://httpbin.org/ip",
    "https://ifconfig.me/ip",
    "https://api.ipify.org?format=json",
];

/// Configuration for proxy checker
#[derive(Debug, Clone)]
pub struct CheckerConfig {
    /// Timeout for the first attempt; the retry gets twice this
    pub timeout: Duration,
    /// Maximum number of probes in flight
    pub concurrency: usize,
    /// URLs a probe picks from at random
    pub test_urls: Vec<String>,
    /// Fixed URL that replaces the random pick
    pub override_url: Option<String>,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            test_urls: DEFAULT_TEST_URLS.iter().map(|s| s.to_string()).collect(),
            override_url: None,
        }
    }
}

impl CheckerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero is clamped to one
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_test_urls(mut self, urls: Vec<String>) -> Self {
        self.test_urls = urls;
        self
    }

    pub fn with_override_url(mut self, url: String) -> Self {
        self.override_url = Some(url);
        self
    }

    /// Timeout used for the single retry after a timed out attempt
    pub fn retry_timeout(&self) -> Duration {
        self.timeout * 2
    }
}

/// Source of randomness for picking a test URL on every probe
pub struct UrlSelector {
    rng: Mutex<StdRng>,
}

impl UrlSelector {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic selector for reproducible runs
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Pick one URL uniformly at random
    pub fn pick<'a>(&self, urls: &'a [String]) -> Option<&'a str> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        urls.choose(&mut *rng).map(String::as_str)
    }
}

impl Default for UrlSelector {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Proxy checker for validating proxies
pub struct ProxyChecker<T = ReqwestTransport> {
    config: CheckerConfig,
    transport: T,
    selector: UrlSelector,
}

impl ProxyChecker<ReqwestTransport> {
    /// Create a new proxy checker with default configuration
    pub fn new() -> Self {
        Self::with_config(CheckerConfig::default())
    }

    /// Create a new proxy checker with custom configuration
    pub fn with_config(config: CheckerConfig) -> Self {
        Self::with_transport(config, ReqwestTransport::new())
    }
}

impl Default for ProxyChecker<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ProbeTransport> ProxyChecker<T> {
    /// Create a proxy checker that sends its requests through `transport`
    pub fn with_transport(config: CheckerConfig, transport: T) -> Self {
        Self {
            config,
            transport,
            selector: UrlSelector::from_entropy(),
        }
    }

    pub fn with_selector(mut self, selector: UrlSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn config(&self) -> &CheckerConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn select_url(&self) -> Option<String> {
        match self.config.override_url {
            Some(ref url) => Some(url.clone()),
            None => self.selector.pick(&self.config.test_urls).map(String::from),
        }
    }

    /// One timed GET; returns the status code and the elapsed milliseconds
    async fn attempt(
        &self,
        proxy: &Proxy,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<(u16, f64), TransportError> {
        debug!(proxy = %proxy, url, timeout_ms = timeout.as_millis() as u64, "probing");
        let start = Instant::now();
        let status = self.transport.get(proxy, url, timeout).await?;
        Ok((status, start.elapsed().as_secs_f64() * 1000.0))
    }

    /// Probe a single proxy.
    ///
    /// `None` means the line did not parse and yields `BadFormat` without any
    /// request. A timed out attempt is retried once with twice the timeout;
    /// every failure of that retry is reported as `Timeout`.
    pub async fn probe(&self, proxy: Option<&Proxy>) -> ProbeOutcome {
        let Some(proxy) = proxy else {
            return ProbeOutcome::failure(FailureReason::BadFormat);
        };

        let Some(url) = self.select_url() else {
            warn!("no test URL configured");
            return ProbeOutcome::failure(FailureReason::RequestError);
        };

        match self.attempt(proxy, &url, self.config.timeout).await {
            Ok((200, latency_ms)) => ProbeOutcome::success(latency_ms),
            Ok((status, _)) => ProbeOutcome::failure(FailureReason::HttpStatus(status)),
            Err(TransportError::Timeout) => {
                debug!(proxy = %proxy, "timed out, retrying with doubled timeout");
                match self.attempt(proxy, &url, self.config.retry_timeout()).await {
                    Ok((200, latency_ms)) => ProbeOutcome::success(latency_ms),
                    _ => ProbeOutcome::failure(FailureReason::Timeout),
                }
            }
            Err(TransportError::Connect) => ProbeOutcome::failure(FailureReason::ConnectionFailed),
            Err(TransportError::Other(msg)) => {
                debug!(proxy = %proxy, error = %msg, "request error");
                ProbeOutcome::failure(FailureReason::RequestError)
            }
        }
    }

    /// Parse and probe one raw input line
    pub async fn probe_line(&self, line: &str) -> ProbeOutcome {
        let proxy = ProxyParser::parse_line(line);
        self.probe(proxy.as_ref()).await
    }
}

impl<T: ProbeTransport + 'static> ProxyChecker<T> {
    /// Check every line with at most `concurrency` checks in flight.
    ///
    /// Each line runs as its own task holding a semaphore permit, so a slow
    /// consumer never stalls a check that is already running. Reports arrive
    /// in completion order and the channel closes once every line has
    /// produced exactly one report. Tasks keep running to completion even
    /// if the receiver is dropped early.
    pub fn check_stream(
        self: Arc<Self>,
        lines: Vec<String>,
    ) -> mpsc::UnboundedReceiver<ProbeReport> {
        let concurrency = self.config.concurrency.max(1);
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let (tx, rx) = mpsc::unbounded_channel();

        info!(total = lines.len(), concurrency, "starting proxy check");

        for line in lines {
            let checker = Arc::clone(&self);
            let sem = Arc::clone(&semaphore);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _permit = sem.acquire_owned().await.ok();
                let outcome = checker.probe_line(&line).await;
                if tx.send(ProbeReport::new(line, outcome)).is_err() {
                    debug!("report receiver dropped, discarding result");
                }
            });
        }

        rx
    }

    /// Check every line and collect the reports
    pub async fn check_all(self: Arc<Self>, lines: Vec<String>) -> RunResult {
        let mut rx = self.check_stream(lines);
        let mut run = RunResult::new();
        while let Some(report) = rx.recv().await {
            run.record(report);
        }
        info!(total = run.len(), working = run.working().len(), "proxy check finished");
        run
    }
}
