//! One-shot control exchange with the message worker.
//!
//! Each exchange opens a fresh connection, writes one request, resolves on
//! the first data the worker sends back, and closes the connection
//! immediately. Anything the worker writes after its first response is never
//! observed. No retries, no multiple round-trips.

use std::path::PathBuf;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::constants::CONNECT_TIMEOUT;
use crate::error::RelayError;

/// Client for the message worker's request/response socket.
///
/// Stateless per exchange; cheap to clone.
#[derive(Debug, Clone)]
pub struct ControlChannel {
    socket_path: PathBuf,
}

impl ControlChannel {
    /// Create a channel targeting the given worker socket.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    /// Perform one request/response exchange.
    ///
    /// Resolves with the first chunk of response bytes the worker sends,
    /// then closes the connection.
    ///
    /// # Errors
    ///
    /// - [`RelayError::ConnectError`] / [`RelayError::ConnectTimeout`] if the
    ///   worker cannot be reached.
    /// - [`RelayError::WriteFailure`] if the request cannot be written.
    /// - [`RelayError::NoResponse`] if the connection closes or fails
    ///   before the worker sends anything.
    pub async fn exchange(&self, request: &[u8]) -> Result<Vec<u8>, RelayError> {
        let mut stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| RelayError::ConnectTimeout)?
            .map_err(RelayError::ConnectError)?;

        stream
            .write_all(request)
            .await
            .map_err(RelayError::WriteFailure)?;

        // Resolve on the first data event; the connection is dropped right
        // after, so later worker output is never observed.
        let mut buf = vec![0u8; 64 * 1024];
        let n = stream.read(&mut buf).await.map_err(|_| RelayError::NoResponse)?;
        if n == 0 {
            return Err(RelayError::NoResponse);
        }
        buf.truncate(n);
        log::debug!("[Control] Exchange complete ({} response bytes)", n);
        Ok(buf)
    }

    /// Send a UTF-8 text message and return the worker's response text.
    pub async fn send_message(&self, message: &str) -> Result<String, RelayError> {
        log::info!("[Control] Sending message ({} bytes)", message.len());
        let response = self.exchange(message.as_bytes()).await?;
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    /// Dispatch a `start_call` command for the given destination SDR.
    ///
    /// Range validation of the id belongs to the request layer; the command
    /// carries the id as supplied.
    pub async fn send_call_command(&self, destination_id: u8) -> Result<String, RelayError> {
        let command = json!({
            "command": "start_call",
            "destination_id": destination_id,
        });
        log::info!("[Control] Sending call command for SDR ID {destination_id}");
        let response = self.exchange(command.to_string().as_bytes()).await?;
        Ok(String::from_utf8_lossy(&response).into_owned())
    }
}
