//! One-shot TCP exchange with an AMAS gateway.
//!
//! Each call opens a fresh connection, writes one framed request, reads one
//! response and closes. There is no pooling, retry or reconnect: every
//! failure is turned into an `ExchangeOutcome::Failed` carrying the error
//! text for the operator.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::wire::framing::{
    declared_length, extract_body, length_mismatch, ResponseBody, HEADER_LEN,
};
use crate::wire::request::{PreparedRequest, RequestError};

/// Default gateway host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 15021;

/// Default budget for connect + send + receive, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Size of the single bounded read.
pub const RECV_BUFFER_SIZE: usize = 4096;

/// Address of the gateway under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
}

impl Target {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// How the response is read off the socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReadStrategy {
    /// One read of up to `RECV_BUFFER_SIZE` bytes; whatever arrives is the response.
    #[default]
    Single,
    /// Read the header, then exactly the number of body bytes it declares.
    ///
    /// The declared length is trusted up to the 8-digit limit, but memory is
    /// only allocated as body bytes arrive, and the exchange timeout still
    /// bounds the whole read.
    DeclaredLength,
}

impl ReadStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadStrategy::Single => "single",
            ReadStrategy::DeclaredLength => "declared-length",
        }
    }
}

impl FromStr for ReadStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" => Ok(ReadStrategy::Single),
            "declared-length" | "declared" | "full" => Ok(ReadStrategy::DeclaredLength),
            other => Err(format!(
                "Unknown read strategy '{}' (expected 'single' or 'declared-length')",
                other
            )),
        }
    }
}

/// Per-exchange settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeOptions {
    /// Budget for the whole exchange.
    pub timeout: Duration,
    pub read_strategy: ReadStrategy,
}

impl Default for ExchangeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            read_strategy: ReadStrategy::default(),
        }
    }
}

/// Progress of a single exchange, used for tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    Connecting,
    SentRequest,
    AwaitingResponse,
    Done,
    Failed,
}

/// Transport-level failures.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Could not resolve or connect to the gateway.
    #[error("Connection to {target} failed: {source}")]
    ConnectionFailed {
        target: String,
        #[source]
        source: std::io::Error,
    },

    /// The exchange did not finish within the budget.
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// Declared-length read found a header it could not parse.
    #[error("Malformed response header: {0:?}")]
    MalformedHeader(String),

    /// Declared-length read hit end of stream before the full body.
    #[error("Connection closed after {received} of {declared} declared body bytes")]
    Truncated { declared: usize, received: usize },

    /// The response bytes are not UTF-8 text.
    #[error("Response is not valid UTF-8: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// I/O error on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Send a framed request and return the raw response bytes.
///
/// The timeout covers connect, send and receive together.
///
/// # Errors
///
/// Returns `ExchangeError` for resolve/connect failures, timeouts, socket
/// errors and (with `ReadStrategy::DeclaredLength`) malformed headers.
pub async fn exchange(
    target: &Target,
    request: &[u8],
    options: &ExchangeOptions,
) -> Result<Vec<u8>, ExchangeError> {
    debug!(%target, state = ?ExchangeState::Idle, "Starting exchange");

    let attempt = connect_send_receive(target, request, options.read_strategy);
    let result = match timeout(options.timeout, attempt).await {
        Ok(result) => result,
        Err(_) => Err(ExchangeError::Timeout(options.timeout)),
    };

    match &result {
        Ok(response) => {
            debug!(%target, state = ?ExchangeState::Done, bytes = response.len(), "Exchange complete")
        }
        Err(e) => debug!(%target, state = ?ExchangeState::Failed, error = %e, "Exchange failed"),
    }

    result
}

async fn connect_send_receive(
    target: &Target,
    request: &[u8],
    strategy: ReadStrategy,
) -> Result<Vec<u8>, ExchangeError> {
    debug!(%target, state = ?ExchangeState::Connecting);
    let mut stream = TcpStream::connect((target.host.as_str(), target.port))
        .await
        .map_err(|source| ExchangeError::ConnectionFailed {
            target: target.to_string(),
            source,
        })?;

    stream.write_all(request).await?;
    stream.flush().await?;
    debug!(%target, state = ?ExchangeState::SentRequest, bytes = request.len());

    debug!(%target, state = ?ExchangeState::AwaitingResponse, strategy = strategy.as_str());
    match strategy {
        ReadStrategy::Single => read_single(&mut stream).await,
        ReadStrategy::DeclaredLength => read_declared(&mut stream).await,
    }
}

/// One bounded read. A peer that closes without writing yields an empty response.
async fn read_single<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ExchangeError> {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    let n = reader.read(&mut buf).await?;
    buf.truncate(n);
    Ok(buf)
}

/// Read the 10-byte header, then exactly the declared body.
///
/// The returned bytes include the header so the result unwraps the same way
/// as a single read.
async fn read_declared<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ExchangeError> {
    let mut message = vec![0u8; HEADER_LEN];
    reader.read_exact(&mut message).await?;

    let body_len = declared_length(&message).ok_or_else(|| {
        ExchangeError::MalformedHeader(String::from_utf8_lossy(&message).into_owned())
    })?;

    // The buffer grows with the bytes that actually arrive, not with the header's claim
    reader.take(body_len as u64).read_to_end(&mut message).await?;
    let received = message.len() - HEADER_LEN;
    if received < body_len {
        return Err(ExchangeError::Truncated {
            declared: body_len,
            received,
        });
    }
    Ok(message)
}

/// Result of one exchange as the operator sees it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExchangeOutcome {
    /// The gateway answered (possibly with something unparseable).
    Response {
        body: ResponseBody,
        /// Decoded response text, header included.
        raw: String,
        /// `(declared, received)` body lengths when the header disagrees with the data.
        length_mismatch: Option<(usize, usize)>,
    },
    /// Transport failure, already rendered for display.
    Failed(String),
}

impl ExchangeOutcome {
    /// Decode raw response bytes, or render a transport error.
    pub fn from_result(result: Result<Vec<u8>, ExchangeError>) -> Self {
        let decoded = result.and_then(|bytes| String::from_utf8(bytes).map_err(ExchangeError::from));

        match decoded {
            Ok(raw) => {
                let length_mismatch = length_mismatch(&raw);
                if let Some((declared, received)) = length_mismatch {
                    warn!(
                        declared,
                        received, "Response header length disagrees with received body"
                    );
                }
                ExchangeOutcome::Response {
                    body: extract_body(&raw),
                    raw,
                    length_mismatch,
                }
            }
            Err(e) => {
                warn!(error = %e, "Exchange failed");
                ExchangeOutcome::Failed(format!("Error: {}", e))
            }
        }
    }

    /// Text for the response pane.
    pub fn display_text(&self) -> String {
        match self {
            ExchangeOutcome::Response { body, .. } => body.display_text(),
            ExchangeOutcome::Failed(message) => message.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExchangeOutcome::Response { .. })
    }

    /// Leading header text of the response as received, if any arrived.
    ///
    /// Responses shorter than a header are returned whole.
    pub fn header(&self) -> Option<&str> {
        match self {
            ExchangeOutcome::Response { raw, .. } if !raw.is_empty() => {
                Some(raw.get(..HEADER_LEN).unwrap_or(raw.as_str()))
            }
            _ => None,
        }
    }

    /// Note about a header/body length disagreement, if any.
    pub fn note(&self) -> Option<String> {
        match self {
            ExchangeOutcome::Response {
                length_mismatch: Some((declared, received)),
                ..
            } => Some(format!(
                "Header declares {} bytes, received {}",
                declared, received
            )),
            _ => None,
        }
    }
}

/// Send an already-prepared request.
pub async fn send_prepared(
    target: &Target,
    request: &PreparedRequest,
    options: &ExchangeOptions,
) -> ExchangeOutcome {
    info!(%target, framed = %request.framed, "Sending request");
    ExchangeOutcome::from_result(exchange(target, request.as_bytes(), options).await)
}

/// Validate, frame and send request text, returning the operator-facing outcome.
///
/// # Errors
///
/// Returns `RequestError` without touching the network when the text is not
/// valid JSON or is too large to frame. Transport problems are not errors
/// here; they come back as `ExchangeOutcome::Failed`.
pub async fn round_trip(
    target: &Target,
    request_text: &str,
    options: &ExchangeOptions,
) -> Result<ExchangeOutcome, RequestError> {
    let request = PreparedRequest::parse(request_text)?;
    Ok(send_prepared(target, &request, options).await)
}
