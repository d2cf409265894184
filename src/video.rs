//! Persistent video connection to the video worker.
//!
//! Unlike the call session there is no tick loop here: the caller pushes
//! frames as they arrive from the capture side, and each one goes out with
//! a 4-byte big-endian length prefix (the video framing profile).

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::constants::CONNECT_TIMEOUT;
use crate::error::RelayError;
use crate::framing::{self, Profile};

/// Connection to the video worker socket.
#[derive(Debug)]
pub struct VideoStream {
    socket_path: PathBuf,
    stream: Option<UnixStream>,
}

impl VideoStream {
    /// Create a disconnected stream targeting the given worker socket.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            stream: None,
        }
    }

    /// Connect to the video worker. A no-op when already connected.
    ///
    /// # Errors
    ///
    /// [`RelayError::ConnectError`] if the worker cannot be reached (a
    /// missing socket or refused connection means the video worker is not
    /// running), [`RelayError::ConnectTimeout`] if it does not accept in
    /// time.
    pub async fn connect(&mut self) -> Result<(), RelayError> {
        if self.stream.is_some() {
            return Ok(());
        }
        let stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| RelayError::ConnectTimeout)?
            .map_err(|e| {
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::ConnectionRefused
                ) {
                    log::error!(
                        "[Video] Video worker not available at {}",
                        self.socket_path.display()
                    );
                }
                RelayError::ConnectError(e)
            })?;
        log::info!("[Video] Connected to video worker");
        self.stream = Some(stream);
        Ok(())
    }

    /// Send one video frame.
    ///
    /// # Errors
    ///
    /// [`RelayError::NotConnected`] if [`connect`](Self::connect) has not
    /// succeeded, [`RelayError::FrameTooLarge`] past the video profile cap,
    /// [`RelayError::WriteFailure`] if the send fails — the connection is
    /// dropped so the caller can reconnect.
    pub async fn send_frame(&mut self, frame: &[u8]) -> Result<(), RelayError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(RelayError::NotConnected);
        };
        let encoded = framing::encode(Profile::Video, frame)?;
        if let Err(e) = stream.write_all(&encoded).await {
            log::error!("[Video] Failed to send frame: {e}");
            self.stream = None;
            return Err(RelayError::WriteFailure(e));
        }
        log::trace!("[Video] Sent video frame: {} bytes", frame.len());
        Ok(())
    }

    /// Drop the worker connection. Idempotent.
    pub fn disconnect(&mut self) {
        if self.stream.take().is_some() {
            log::info!("[Video] Disconnected from video worker");
        }
    }

    /// Whether a worker connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }
}
