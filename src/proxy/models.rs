//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Proxy type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProxyType {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "http"),
            ProxyType::Https => write!(f, "https"),
            ProxyType::Socks4 => write!(f, "socks4"),
            ProxyType::Socks5 => write!(f, "socks5"),
        }
    }
}

impl FromStr for ProxyType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "http" => Ok(ProxyType::Http),
            "https" => Ok(ProxyType::Https),
            "socks4" => Ok(ProxyType::Socks4),
            "socks5" => Ok(ProxyType::Socks5),
            _ => Err(anyhow::anyhow!(
                "Invalid proxy type: {}. Use: http, https, socks4, socks5",
                s
            )),
        }
    }
}

/// Proxy authentication credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyAuth {
    pub username: String,
    pub password: String,
}

impl ProxyAuth {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

/// A single proxy endpoint parsed from one line of the input list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proxy {
    pub host: String,
    pub port: u16,
    pub proxy_type: ProxyType,
    pub auth: Option<ProxyAuth>,
}

impl Proxy {
    /// Create a new proxy without authentication
    pub fn new(host: String, port: u16, proxy_type: ProxyType) -> Self {
        Self {
            host,
            port,
            proxy_type,
            auth: None,
        }
    }

    /// Create a new proxy with authentication
    pub fn with_auth(
        host: String,
        port: u16,
        proxy_type: ProxyType,
        username: String,
        password: String,
    ) -> Self {
        Self {
            host,
            port,
            proxy_type,
            auth: Some(ProxyAuth::new(username, password)),
        }
    }

    /// Connection string used to route outbound traffic through this proxy.
    ///
    /// Credentials are embedded only when both parts are non-empty.
    pub fn url(&self) -> String {
        let auth_part = self
            .auth
            .as_ref()
            .filter(|auth| !auth.username.is_empty() && !auth.password.is_empty())
            .map_or(String::new(), |auth| {
                format!("{}:{}@", auth.username, auth.password)
            });

        format!("{}://{}{}:{}", self.proxy_type, auth_part, self.host, self.port)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url())
    }
}

/// Why a probe did not produce a working result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureReason {
    /// The input line could not be parsed; no request was made
    BadFormat,
    /// The proxy answered with a status other than 200
    HttpStatus(u16),
    /// The request timed out, and so did the retry
    Timeout,
    /// Network-level refusal or unreachable proxy
    ConnectionFailed,
    /// Any other client-side failure
    RequestError,
    Unknown,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::BadFormat => write!(f, "Invalid format"),
            FailureReason::HttpStatus(code) => write!(f, "HTTP {}", code),
            FailureReason::Timeout => write!(f, "Timeout (after retry)"),
            FailureReason::ConnectionFailed => write!(f, "Connection failed"),
            FailureReason::RequestError => write!(f, "Request error"),
            FailureReason::Unknown => write!(f, "Unknown error"),
        }
    }
}

/// Result of probing a single input line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProbeOutcome {
    Success { latency_ms: f64 },
    Failure { reason: FailureReason },
}

impl ProbeOutcome {
    pub fn success(latency_ms: f64) -> Self {
        ProbeOutcome::Success { latency_ms }
    }

    pub fn failure(reason: FailureReason) -> Self {
        ProbeOutcome::Failure { reason }
    }

    pub fn is_working(&self) -> bool {
        matches!(self, ProbeOutcome::Success { .. })
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self {
            ProbeOutcome::Success { latency_ms } => Some(*latency_ms),
            ProbeOutcome::Failure { .. } => None,
        }
    }
}

/// A completed probe, keyed by the raw input line that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub line: String,
    pub outcome: ProbeOutcome,
}

impl ProbeReport {
    pub fn new(line: String, outcome: ProbeOutcome) -> Self {
        Self { line, outcome }
    }

    pub fn is_working(&self) -> bool {
        self.outcome.is_working()
    }
}
