//! Outbound HTTP through a proxy
//!
//! The checker never talks to the network directly; it goes through a
//! [`ProbeTransport`] so the retry and classification logic can be driven
//! by a scripted transport in tests.

use crate::proxy::models::{Proxy, ProxyType};
use async_trait::async_trait;
use hyper::{Body, Request};
use reqwest::{Client, Proxy as ReqwestProxy};
use std::fmt;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_socks::tcp::Socks4Stream;
use tracing::debug;
use url::Url;

/// Request-level failure reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The attempt exceeded its timeout
    Timeout,
    /// The proxy refused the connection or could not be reached
    Connect,
    /// Anything else, including a proxy URL the client rejects
    Other(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Timeout => write!(f, "request timed out"),
            TransportError::Connect => write!(f, "connection failed"),
            TransportError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        // A connect timeout is both; it counts as a timeout.
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_connect() {
            TransportError::Connect
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

impl From<tokio_socks::Error> for TransportError {
    fn from(e: tokio_socks::Error) -> Self {
        match e {
            tokio_socks::Error::ProxyServerUnreachable | tokio_socks::Error::Io(_) => {
                TransportError::Connect
            }
            other => TransportError::Other(other.to_string()),
        }
    }
}

fn other<E: fmt::Display>(e: E) -> TransportError {
    TransportError::Other(e.to_string())
}

/// Issues a single GET request through a proxy and returns the HTTP status code
#[async_trait]
pub trait ProbeTransport: Send + Sync {
    async fn get(
        &self,
        proxy: &Proxy,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<u16, TransportError>;
}

/// Transport backed by a fresh reqwest client per request.
///
/// reqwest has no SOCKS4 support, so `socks4` proxies are tunnelled with
/// tokio-socks and the request is sent over the tunnel with hyper.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReqwestTransport;

impl ReqwestTransport {
    pub fn new() -> Self {
        Self
    }

    /// Create a reqwest client that sends both plain and TLS traffic through the proxy
    fn create_client(&self, proxy: &Proxy, timeout: Duration) -> reqwest::Result<Client> {
        let reqwest_proxy = ReqwestProxy::all(proxy.url())?;

        Client::builder()
            .proxy(reqwest_proxy)
            .timeout(timeout)
            .pool_max_idle_per_host(0)
            .build()
    }

    async fn get_with_reqwest(
        &self,
        proxy: &Proxy,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<u16, TransportError> {
        let client = self.create_client(proxy, timeout).map_err(other)?;
        let response = client.get(url).send().await?;
        Ok(response.status().as_u16())
    }
}

#[async_trait]
impl ProbeTransport for ReqwestTransport {
    async fn get(
        &self,
        proxy: &Proxy,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<u16, TransportError> {
        let request = async {
            match proxy.proxy_type {
                ProxyType::Socks4 => get_over_socks4(proxy, url).await,
                _ => self.get_with_reqwest(proxy, url, timeout).await,
            }
        };

        match tokio::time::timeout(timeout, request).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout),
        }
    }
}

/// GET `url` through a SOCKS4 proxy; domain targets use the 4a extension.
///
/// A username is sent as the SOCKS4 user id; SOCKS4 has no password.
async fn get_over_socks4(proxy: &Proxy, url: &str) -> std::result::Result<u16, TransportError> {
    let target = Url::parse(url).map_err(other)?;
    let host = target
        .host_str()
        .ok_or_else(|| TransportError::Other(format!("test URL {} has no host", url)))?
        .to_string();
    let port = target
        .port_or_known_default()
        .ok_or_else(|| TransportError::Other(format!("test URL {} has no port", url)))?;

    let proxy_addr = (proxy.host.as_str(), proxy.port);
    let stream = match proxy.auth {
        Some(ref auth) => {
            Socks4Stream::connect_with_userid(proxy_addr, (host.as_str(), port), &auth.username)
                .await?
        }
        None => Socks4Stream::connect(proxy_addr, (host.as_str(), port)).await?,
    };

    let host_header = match target.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.clone(),
    };
    let path = match target.query() {
        Some(query) => format!("{}?{}", target.path(), query),
        None => target.path().to_string(),
    };

    if target.scheme() == "https" {
        let connector = native_tls::TlsConnector::new().map_err(other)?;
        let tls = tokio_native_tls::TlsConnector::from(connector)
            .connect(&host, stream)
            .await
            .map_err(other)?;
        send_get(tls, &host_header, &path).await
    } else {
        send_get(stream, &host_header, &path).await
    }
}

async fn send_get<S>(io: S, host: &str, path: &str) -> std::result::Result<u16, TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = hyper::client::conn::handshake(io).await.map_err(other)?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            debug!(error = %e, "socks4 tunnel closed");
        }
    });

    let request = Request::get(path)
        .header(hyper::header::HOST, host)
        .body(Body::empty())
        .map_err(other)?;
    let response = sender.send_request(request).await.map_err(other)?;
    Ok(response.status().as_u16())
}
