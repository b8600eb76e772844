//! IPC client for communicating with the countdown daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::cli::commands::StartArgs;
use crate::types::{default_socket_path, IpcRequest, IpcResponse, StartParams};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 200;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let socket_path = default_socket_path().context("ホームディレクトリが見つかりません")?;
        Ok(Self::with_socket_path(socket_path))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self, args: &StartArgs) -> Result<IpcResponse> {
        let request = IpcRequest::Start {
            params: StartParams {
                duration_seconds: args.duration,
            },
        };
        self.send_request(&request).await
    }

    /// Sends a toggle command to the daemon.
    pub async fn toggle(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Toggle).await
    }

    /// Sends a cancel command to the daemon.
    pub async fn cancel(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Cancel).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Status).await
    }

    /// Connects to the daemon, retrying while the socket is not accepting.
    ///
    /// Only connecting is retried. Once a request has been written it is
    /// never resent, since start and toggle are not idempotent.
    async fn connect_with_retry(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt >= MAX_RETRIES => return Err(e),
                Err(e) => {
                    tracing::warn!("接続失敗 (試行 {}/{}): {:#}", attempt, MAX_RETRIES, e);
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn connect(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("接続がタイムアウトしました")?
            .context("Daemonに接続できません。'countdown daemon' を起動してください")
    }

    /// Sends a single request to the daemon.
    ///
    /// Error responses are returned as `Err` carrying the daemon's message.
    async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = self.connect_with_retry().await?;

        let request_json =
            serde_json::to_vec(request).context("リクエストのシリアライズに失敗しました")?;

        let io_timeout = Duration::from_secs(IO_TIMEOUT_SECS);

        timeout(io_timeout, stream.write_all(&request_json))
            .await
            .context("書き込みがタイムアウトしました")?
            .context("リクエストの送信に失敗しました")?;

        timeout(io_timeout, stream.flush())
            .await
            .context("フラッシュがタイムアウトしました")?
            .context("フラッシュに失敗しました")?;

        // Signal end of request
        stream
            .shutdown()
            .await
            .context("シャットダウンに失敗しました")?;

        let mut buffer = Vec::new();
        timeout(
            io_timeout,
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("読み込みがタイムアウトしました")?
        .context("レスポンスの受信に失敗しました")?;

        if buffer.is_empty() {
            anyhow::bail!("Daemonからの応答がありませんでした");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer).context("レスポンスのパースに失敗しました")?;

        if !response.is_success() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
