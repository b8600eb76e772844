//! IPC server for the countdown daemon.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Dispatch to the shared [`TimerEngine`]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::types::{
    validate_duration, IpcRequest, IpcResponse, ResponseData, StartParams, TimerStatus,
};

use super::timer::TimerEngine;

// ============================================================================
// Constants
// ============================================================================

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Connection closed before a complete request arrived
    #[error("Connection closed by client")]
    ConnectionClosed,

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// A stale socket file is removed and the parent directory is created.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Reads one JSON request from the stream.
    ///
    /// Reads until the buffer holds a complete JSON value, the client closes
    /// its write half, or [`MAX_REQUEST_SIZE`] is exceeded.
    ///
    /// # Errors
    ///
    /// Returns an error on timeout, oversized or malformed requests.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let mut buffer = Vec::with_capacity(512);
        let mut chunk = [0u8; 512];

        loop {
            let n = match timeout(Duration::from_secs(READ_TIMEOUT_SECS), stream.read(&mut chunk))
                .await
            {
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(IpcError::ReadError(e.to_string()).into()),
                Err(_) => return Err(IpcError::Timeout.into()),
            };

            if n == 0 {
                if buffer.is_empty() {
                    return Err(IpcError::ConnectionClosed.into());
                }
                return serde_json::from_slice(&buffer)
                    .context("Failed to deserialize IPC request");
            }

            buffer.extend_from_slice(&chunk[..n]);
            if buffer.len() > MAX_REQUEST_SIZE {
                return Err(IpcError::RequestTooLarge.into());
            }

            match serde_json::from_slice::<IpcRequest>(&buffer) {
                Ok(request) => return Ok(request),
                Err(e) if e.is_eof() => continue,
                Err(e) => return Err(e).context("Failed to deserialize IPC request"),
            }
        }
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Serves one request on an accepted connection.
    ///
    /// Malformed requests get an error response rather than a dropped connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the response cannot be written.
    pub async fn handle_connection(mut stream: UnixStream, handler: &RequestHandler) -> Result<()> {
        let response = match Self::receive_request(&mut stream).await {
            Ok(request) => {
                debug!("IPC request: {:?}", request);
                handler.handle(request).await
            }
            Err(e) => {
                warn!("Invalid IPC request: {:#}", e);
                IpcResponse::error(format!("不正なリクエストです: {}", e))
            }
        };
        Self::send_response(&mut stream, &response).await
    }

    /// Accepts connections forever, one task per connection.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails.
    pub async fn serve(&self, handler: Arc<RequestHandler>) -> Result<()> {
        loop {
            let stream = self.accept().await?;
            let handler = handler.clone();
            tokio::spawn(async move {
                if let Err(e) = Self::handle_connection(stream, &handler).await {
                    warn!("IPC connection error: {:#}", e);
                }
            });
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to the shared [`TimerEngine`].
pub struct RequestHandler {
    engine: Arc<Mutex<TimerEngine>>,
    /// Duration used when a start request omits one
    default_duration_seconds: i64,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(engine: Arc<Mutex<TimerEngine>>, default_duration_seconds: i64) -> Self {
        Self {
            engine,
            default_duration_seconds,
        }
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start { params } => self.handle_start(params).await,
            IpcRequest::Toggle => self.handle_toggle().await,
            IpcRequest::Cancel => self.handle_cancel().await,
            IpcRequest::Status => self.handle_status().await,
        }
    }

    async fn handle_start(&self, params: StartParams) -> IpcResponse {
        let duration = params
            .duration_seconds
            .unwrap_or(self.default_duration_seconds);

        // Non-positive durations are left to the engine to reject.
        if duration > 0 {
            if let Err(e) = validate_duration(duration) {
                return IpcResponse::error(e);
            }
        }

        let mut engine = self.engine.lock().await;
        match engine.start(duration) {
            Ok(()) => IpcResponse::success(
                "タイマーを開始しました",
                Some(ResponseData::from_snapshot(&engine.snapshot())),
            ),
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_toggle(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        match engine.toggle() {
            Ok(status) => {
                let message = match status {
                    TimerStatus::Paused => "タイマーを一時停止しました",
                    _ => "タイマーを再開しました",
                };
                IpcResponse::success(message, Some(ResponseData::from_snapshot(&engine.snapshot())))
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    async fn handle_cancel(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        let message = if engine.cancel() {
            "タイマーをキャンセルしました"
        } else {
            "タイマーは実行されていません"
        };
        IpcResponse::success(message, Some(ResponseData::from_snapshot(&engine.snapshot())))
    }

    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        IpcResponse::success("", Some(ResponseData::from_snapshot(&engine.snapshot())))
    }
}

// ============================================================================
// Tests
// ============================================================================
