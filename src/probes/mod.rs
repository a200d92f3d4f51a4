//! Network probes used as test functions
//!
//! Builds one test per configured target: a TCP connect for `host:port`
//! targets and a GET for HTTP(S) URLs. Probe errors render to short,
//! stable messages so they group well in the error-cause histogram.

use anyhow::{Context, Result};
use reqwest::Client;
use std::io;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::info;

use crate::config::Input;
use crate::results::Results;

/// Probe failures
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connect to {addr} failed: {kind}")]
    Connect { addr: String, kind: io::ErrorKind },

    #[error("connect to {addr} timed out after {after:?}")]
    ConnectTimeout { addr: String, after: Duration },

    #[error("GET {url} failed: {reason}")]
    Request { url: String, reason: &'static str },

    #[error("GET {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),
}

/// A parsed probe target
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Tcp(String),
    Http(String),
}

impl Target {
    pub fn parse(raw: &str) -> Result<Self, ProbeError> {
        let raw = raw.trim();
        if let Some(addr) = raw.strip_prefix("tcp://") {
            return Self::tcp(addr, raw);
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Target::Http(raw.to_string()));
        }
        if raw.contains("://") {
            return Err(ProbeError::InvalidTarget(raw.to_string()));
        }
        Self::tcp(raw, raw)
    }

    fn tcp(addr: &str, raw: &str) -> Result<Self, ProbeError> {
        match addr.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Target::Tcp(addr.to_string()))
            }
            _ => Err(ProbeError::InvalidTarget(raw.to_string())),
        }
    }

    /// Test name the target is registered under
    pub fn name(&self) -> String {
        match self {
            Target::Tcp(addr) => format!("tcp:{addr}"),
            Target::Http(url) => format!("http:{url}"),
        }
    }
}

/// Open and immediately drop a TCP connection
pub async fn tcp_connect(addr: &str, limit: Duration) -> Result<(), ProbeError> {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(_stream)) => Ok(()),
        Ok(Err(e)) => Err(ProbeError::Connect {
            addr: addr.to_string(),
            kind: e.kind(),
        }),
        Err(_) => Err(ProbeError::ConnectTimeout {
            addr: addr.to_string(),
            after: limit,
        }),
    }
}

/// GET `url`; any non-2xx/3xx status is a failure
pub async fn http_get(client: &Client, url: &str, host: Option<&str>) -> Result<(), ProbeError> {
    let mut request = client.get(url);
    if let Some(host) = host {
        request = request.header(reqwest::header::HOST, host);
    }

    let response = request.send().await.map_err(|e| ProbeError::Request {
        url: url.to_string(),
        reason: request_failure(&e),
    })?;

    let status = response.status();
    if status.is_success() || status.is_redirection() {
        Ok(())
    } else {
        Err(ProbeError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        })
    }
}

fn request_failure(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection error"
    } else if e.is_redirect() {
        "redirect loop"
    } else {
        "request error"
    }
}

/// Register one probe per target in `input`, returning how many were added
pub fn register_suite(results: &mut Results, input: &Input) -> Result<usize> {
    let limit = input.timeout();
    let client = Client::builder()
        .timeout(limit)
        .danger_accept_invalid_certs(input.insecure_skip_verify)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .context("Failed to create HTTP client")?;

    let mut registered = 0;

    if let Some(keyserver) = &input.keyserver {
        let addr = keyserver.clone();
        results.register_test("keyserver", move || {
            let addr = addr.clone();
            async move { tcp_connect(&addr, limit).await.map_err(anyhow::Error::from) }
        });
        info!("Registered keyserver");
        registered += 1;
    }

    for raw in &input.targets {
        let target = Target::parse(raw)?;
        let name = target.name();
        match target {
            Target::Tcp(addr) => {
                results.register_test(name.clone(), move || {
                    let addr = addr.clone();
                    async move { tcp_connect(&addr, limit).await.map_err(anyhow::Error::from) }
                });
            }
            Target::Http(url) => {
                let client = client.clone();
                let host = input.domain.clone();
                results.register_test(name.clone(), move || {
                    let client = client.clone();
                    let url = url.clone();
                    let host = host.clone();
                    async move {
                        http_get(&client, &url, host.as_deref())
                            .await
                            .map_err(anyhow::Error::from)
                    }
                });
            }
        }
        info!("Registered {}", name);
        registered += 1;
    }

    Ok(registered)
}
