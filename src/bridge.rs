//! Background exchange worker.
//!
//! The console's event loop must never block on the network. `BridgeHandle`
//! spawns a dedicated worker thread that owns a single-threaded Tokio runtime
//! and runs one exchange at a time, so the UI thread keeps drawing at 60fps
//! while a request is in flight.
//!
//! ```text
//! UI thread ── BridgeRequest ──► worker thread ── TCP ──► gateway
//!     ▲                              │
//!     └──────── BridgeResponse ──────┘
//! ```

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::runtime::Runtime;

use crate::wire::{send_prepared, ExchangeOptions, ExchangeOutcome, PreparedRequest, Target};

// =============================================================================
// Service Trait for Dependency Injection
// =============================================================================

/// Trait for exchange worker operations.
///
/// Lets the console state be tested with a mock instead of real sockets.
pub trait ExchangeService {
    /// Queue an exchange (non-blocking).
    fn request_exchange(&self, job: ExchangeJob) -> Result<()>;

    /// Poll for a finished exchange (non-blocking).
    fn poll_response(&self) -> Option<BridgeResponse>;
}

/// Everything the worker needs to run one exchange.
#[derive(Debug, Clone)]
pub struct ExchangeJob {
    /// Echoed back in the response so stale results can be discarded.
    pub request_id: usize,
    pub target: Target,
    pub request: PreparedRequest,
    pub options: ExchangeOptions,
}

/// Messages for the worker thread.
#[derive(Debug)]
pub enum BridgeRequest {
    /// Graceful shutdown signal - worker exits after receiving this.
    Shutdown,
    Exchange(ExchangeJob),
}

/// A finished exchange.
#[derive(Debug, Clone)]
pub struct BridgeResponse {
    pub request_id: usize,
    pub outcome: ExchangeOutcome,
    pub elapsed: Duration,
}

/// Maximum number of queued requests/responses before backpressure.
const CHANNEL_BOUND: usize = 64;

/// Handle to the exchange worker thread.
///
/// When dropped, sends a Shutdown request and waits briefly for the worker to exit.
pub struct BridgeHandle {
    request_tx: SyncSender<BridgeRequest>,
    response_rx: Receiver<BridgeResponse>,
    worker_handle: Option<thread::JoinHandle<()>>,
}

impl BridgeHandle {
    /// Start the worker thread and its runtime.
    pub fn spawn() -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to build exchange runtime")?;

        let (request_tx, request_rx) = mpsc::sync_channel::<BridgeRequest>(CHANNEL_BOUND);
        let (response_tx, response_rx) = mpsc::sync_channel::<BridgeResponse>(CHANNEL_BOUND);

        let worker_handle = thread::Builder::new()
            .name("exchange-worker".to_string())
            .spawn(move || bridge_worker_loop(runtime, request_rx, response_tx))
            .context("Failed to spawn exchange worker thread")?;

        Ok(Self {
            request_tx,
            response_rx,
            worker_handle: Some(worker_handle),
        })
    }

    /// Send a request to the worker using try_send (non-blocking).
    fn try_send_request(&self, request: BridgeRequest) -> Result<()> {
        match self.request_tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                Err(anyhow::anyhow!("Exchange worker busy - try again in a moment"))
            }
            Err(TrySendError::Disconnected(_)) => {
                Err(anyhow::anyhow!("Exchange worker disconnected"))
            }
        }
    }
}

impl ExchangeService for BridgeHandle {
    fn request_exchange(&self, job: ExchangeJob) -> Result<()> {
        self.try_send_request(BridgeRequest::Exchange(job))
    }

    fn poll_response(&self) -> Option<BridgeResponse> {
        self.response_rx.try_recv().ok()
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        // Ignore errors - the worker may have already exited.
        let _ = self.request_tx.try_send(BridgeRequest::Shutdown);

        // A worker stuck in an exchange finishes within its timeout; don't
        // hold up exit for it.
        if let Some(handle) = self.worker_handle.take() {
            const QUICK_CHECK_INTERVAL: Duration = Duration::from_millis(10);
            const MAX_QUICK_CHECKS: u32 = 10;

            for _ in 0..MAX_QUICK_CHECKS {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        tracing::warn!("Exchange worker panicked during shutdown: {:?}", e);
                    } else {
                        tracing::debug!("Exchange worker shut down gracefully");
                    }
                    return;
                }
                thread::sleep(QUICK_CHECK_INTERVAL);
            }

            tracing::debug!(
                "Exchange worker still running after {}ms - detaching",
                QUICK_CHECK_INTERVAL.as_millis() * MAX_QUICK_CHECKS as u128
            );
        }
    }
}

/// Worker loop: blocks on the request channel and runs exchanges in order.
fn bridge_worker_loop(
    runtime: Runtime,
    request_rx: Receiver<BridgeRequest>,
    response_tx: SyncSender<BridgeResponse>,
) {
    while let Ok(request) = request_rx.recv() {
        let job = match request {
            BridgeRequest::Shutdown => {
                tracing::info!("Exchange worker received shutdown signal, exiting");
                break;
            }
            BridgeRequest::Exchange(job) => job,
        };

        let started = Instant::now();
        let outcome = runtime.block_on(send_prepared(&job.target, &job.request, &job.options));
        let response = BridgeResponse {
            request_id: job.request_id,
            outcome,
            elapsed: started.elapsed(),
        };

        if response_tx.send(response).is_err() {
            // UI thread gone
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    fn wait_for_response(handle: &BridgeHandle) -> BridgeResponse {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(response) = handle.poll_response() {
                return response;
            }
            assert!(Instant::now() < deadline, "Timed out waiting for worker");
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn job(request_id: usize, target: Target) -> ExchangeJob {
        ExchangeJob {
            request_id,
            target,
            request: PreparedRequest::parse(r#"{"cmd":"heartBeat","sessionId":"s1"}"#).unwrap(),
            options: ExchangeOptions::default(),
        }
    }

    #[test]
    fn test_worker_runs_exchange_off_thread() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = thread::spawn(move || {
            let (mut socket, _) = listener.accept().unwrap();
            let mut buf = [0u8; 256];
            let n = socket.read(&mut buf).unwrap();
            socket.write_all(b"(00000015){\"result\":\"ok\"}").unwrap();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        let handle = BridgeHandle::spawn().unwrap();
        handle
            .request_exchange(job(7, Target::new("127.0.0.1", port)))
            .unwrap();

        let response = wait_for_response(&handle);
        assert_eq!(response.request_id, 7);
        assert_eq!(response.outcome.display_text(), "{\n  \"result\": \"ok\"\n}");

        let sent = server.join().unwrap();
        assert!(sent.starts_with("(00000036)"), "{}", sent);
    }

    #[test]
    fn test_worker_reports_connection_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let handle = BridgeHandle::spawn().unwrap();
        handle
            .request_exchange(job(1, Target::new("127.0.0.1", port)))
            .unwrap();

        let response = wait_for_response(&handle);
        assert!(!response.outcome.is_success());
        assert!(response.outcome.display_text().starts_with("Error: "));
    }

    #[test]
    fn test_drop_shuts_down_idle_worker() {
        let handle = BridgeHandle::spawn().unwrap();
        drop(handle);
    }
}
