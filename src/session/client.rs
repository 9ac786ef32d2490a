//! Async client for the session worker process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::{oneshot, Mutex};
use tracing::warn;

use super::error::{SessionError, SessionResult};
use super::protocol::{ErrorInfo, RequestEnvelope, ResponseEnvelope};
use crate::config::Settings;

/// Default timeout for requests (30 seconds).
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Async client for the session worker.
///
/// The client spawns the worker as a child process and communicates via
/// NDJSON (newline-delimited JSON) over stdin/stdout. Each request has a
/// unique ID for correlation with responses, so requests may be issued
/// concurrently even though the dashboard runs panels sequentially.
pub struct WorkerClient {
    /// Writer for sending requests to worker stdin.
    stdin: Arc<Mutex<BufWriter<ChildStdin>>>,

    /// Map of pending request IDs to response channels.
    pending: Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>,

    /// Handle to the worker child process.
    _child: Child,

    /// Handle to the background reader task.
    _reader_task: tokio::task::JoinHandle<()>,

    /// Request timeout duration.
    timeout: Duration,
}

impl WorkerClient {
    /// Spawn a new worker process.
    pub async fn spawn<P: AsRef<Path>>(worker_path: P) -> SessionResult<Self> {
        Self::spawn_with_timeout(worker_path, Duration::from_secs(DEFAULT_TIMEOUT_SECS)).await
    }

    /// Spawn a worker using settings configuration: the configured path if
    /// set, otherwise common locations and `PATH`.
    pub async fn spawn_with_settings(settings: &Settings) -> SessionResult<Self> {
        let worker_path = Self::resolve_worker_path(settings)?;
        let timeout = Duration::from_secs(
            settings
                .worker
                .timeout_seconds
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );
        Self::spawn_with_timeout(&worker_path, timeout).await
    }

    /// Resolve the worker binary path from settings.
    fn resolve_worker_path(settings: &Settings) -> SessionResult<PathBuf> {
        if let Some(path) = settings.worker_path() {
            return Ok(path);
        }

        // Try PATH
        if let Ok(output) = std::process::Command::new("which")
            .arg("snowscope-worker")
            .output()
        {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        Err(SessionError::SpawnFailed(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Worker binary not found. Set worker.path in snowscope.toml",
        )))
    }

    /// Spawn a new worker process with a custom request timeout.
    pub async fn spawn_with_timeout<P: AsRef<Path>>(
        worker_path: P,
        timeout: Duration,
    ) -> SessionResult<Self> {
        let mut child = Command::new(worker_path.as_ref())
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(SessionError::SpawnFailed)?;

        let stdin = child.stdin.take().expect("stdin not captured");
        let stdout = child.stdout.take().expect("stdout not captured");

        let stdin = Arc::new(Mutex::new(BufWriter::new(stdin)));
        let pending: Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>> =
            Arc::new(Mutex::new(HashMap::new()));

        let reader_task = Self::spawn_reader_task(stdout, pending.clone());

        Ok(Self {
            stdin,
            pending,
            _child: child,
            _reader_task: reader_task,
            timeout,
        })
    }

    /// Spawn the background task that reads responses from the worker.
    fn spawn_reader_task(
        stdout: ChildStdout,
        pending: Arc<Mutex<HashMap<String, oneshot::Sender<ResponseEnvelope>>>>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut reader = BufReader::new(stdout);
            let mut line = String::new();

            loop {
                line.clear();
                match reader.read_line(&mut line).await {
                    Ok(0) => {
                        // EOF - worker exited
                        break;
                    }
                    Ok(_) => match serde_json::from_str::<ResponseEnvelope>(&line) {
                        Ok(resp) => {
                            let mut pending = pending.lock().await;
                            if let Some(tx) = pending.remove(&resp.id) {
                                let _ = tx.send(resp);
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "failed to parse worker response");
                        }
                    },
                    Err(e) => {
                        warn!(error = %e, "worker read error");
                        break;
                    }
                }
            }

            // Worker exited - fail all pending requests
            let mut pending = pending.lock().await;
            for (id, tx) in pending.drain() {
                let error_response = ResponseEnvelope {
                    id,
                    success: false,
                    result: None,
                    error: Some(ErrorInfo {
                        code: "WORKER_EXITED".to_string(),
                        message: "Worker process exited unexpectedly".to_string(),
                    }),
                };
                let _ = tx.send(error_response);
            }
        })
    }

    /// Send a request to the worker and wait for a response.
    pub async fn request<P, R>(&self, method: &str, params: P) -> SessionResult<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let id = uuid::Uuid::new_v4().to_string();

        let request = RequestEnvelope {
            id: id.clone(),
            method: method.to_string(),
            params: serde_json::to_value(params).map_err(SessionError::SerializeFailed)?,
        };

        // Register response channel
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(id.clone(), tx);
        }

        // Send request
        {
            let mut stdin = self.stdin.lock().await;
            let line =
                serde_json::to_string(&request).map_err(SessionError::SerializeFailed)? + "\n";
            stdin
                .write_all(line.as_bytes())
                .await
                .map_err(SessionError::WriteFailed)?;
            stdin.flush().await.map_err(SessionError::WriteFailed)?;
        }

        // Wait for response with timeout
        let response = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(resp)) => resp,
            Ok(Err(_)) => {
                // Channel closed - worker exited
                return Err(SessionError::ChannelClosed);
            }
            Err(_) => {
                // Timeout - drop the pending entry so it cannot leak
                let mut pending = self.pending.lock().await;
                pending.remove(&id);
                return Err(SessionError::Timeout(self.timeout.as_secs()));
            }
        };

        if response.success {
            let result = response.result.unwrap_or(serde_json::Value::Null);
            serde_json::from_value(result).map_err(SessionError::DeserializeFailed)
        } else {
            let error = response.error.unwrap_or_else(|| ErrorInfo {
                code: "UNKNOWN".to_string(),
                message: "Unknown error".to_string(),
            });
            Err(Self::classify_error(&error.code, &error.message))
        }
    }

    /// Classify a worker error into a more specific error type.
    fn classify_error(code: &str, message: &str) -> SessionError {
        match code {
            "LOGIN_FAILED" => SessionError::LoginFailed(message.to_string()),
            "SESSION_EXPIRED" => SessionError::SessionExpired(message.to_string()),
            "QUERY_FAILED" => SessionError::QueryFailed(message.to_string()),
            "INVALID_REQUEST" => SessionError::InvalidRequest(message.to_string()),
            "METHOD_NOT_FOUND" => SessionError::MethodNotFound(message.to_string()),
            _ => SessionError::remote(code, message),
        }
    }

    /// Check if the worker is still running.
    pub fn is_alive(&self) -> bool {
        !self._reader_task.is_finished()
    }

    /// Get the current request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert!(matches!(
            WorkerClient::classify_error("LOGIN_FAILED", "bad credentials"),
            SessionError::LoginFailed(_)
        ));
        assert!(matches!(
            WorkerClient::classify_error("SESSION_EXPIRED", "ttl elapsed"),
            SessionError::SessionExpired(_)
        ));
        assert!(matches!(
            WorkerClient::classify_error("QUERY_FAILED", "syntax error"),
            SessionError::QueryFailed(_)
        ));
        assert!(matches!(
            WorkerClient::classify_error("METHOD_NOT_FOUND", "nope"),
            SessionError::MethodNotFound(_)
        ));
        assert!(matches!(
            WorkerClient::classify_error("SOMETHING_ELSE", "??"),
            SessionError::Remote { .. }
        ));
    }
}
