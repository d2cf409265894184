//! Exclusive call session against the call worker.
//!
//! At most one outbound audio stream exists at a time. The session is a
//! small state machine (`Idle → Connecting → Streaming → Stopping → Idle`)
//! behind a shared handle; request handlers hold a clone and call
//! [`CallSession::start`], [`CallSession::stop`], and
//! [`CallSession::status`].
//!
//! Two tasks serve a streaming session: a self-rescheduling frame producer
//! (one 64-byte audio frame every 100 ms) and a watcher on the read half
//! that turns an unsolicited worker disconnect into an implicit stop. Every
//! state transition and every producer tick serialize on one mutex, so
//! teardown can never interleave with a frame send.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use crate::constants::{
    AUDIO_FRAME_SIZE, CONNECT_TIMEOUT, FORCE_CLOSE_GRACE, FRAME_INTERVAL, PRE_START_SETTLE,
    SDR_ID_MASK,
};
use crate::error::RelayError;
use crate::framing::{self, Profile};

/// Lifecycle state of the call session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    /// No call in progress.
    Idle,
    /// `start()` is connecting to the call worker.
    Connecting,
    /// Frames are being produced.
    Streaming,
    /// Teardown in progress.
    Stopping,
}

/// Snapshot returned by [`CallSession::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Current lifecycle state.
    pub state: SessionState,
    /// Destination SDR id (0 when idle).
    pub destination_id: u8,
    /// Whether a worker connection is held.
    pub has_connection: bool,
}

struct Inner {
    state: SessionState,
    destination_id: u8,
    writer: Option<OwnedWriteHalf>,
    producer: Option<JoinHandle<()>>,
    watcher: Option<JoinHandle<()>>,
}

impl Inner {
    /// Full teardown: cancel the producer before touching the connection
    /// (no frame send can race the close), detach the watcher so the
    /// disconnect path cannot re-enter, then half-close gracefully with the
    /// forced-close grace as the bound. Dropping the write half afterwards
    /// forces the close if the graceful shutdown did not complete.
    ///
    /// A session task invoking this must take its own handle out first;
    /// aborting the running task would leave the teardown half-done.
    async fn teardown(&mut self) {
        self.state = SessionState::Stopping;
        if let Some(handle) = self.producer.take() {
            handle.abort();
        }
        if let Some(handle) = self.watcher.take() {
            handle.abort();
        }
        if let Some(mut writer) = self.writer.take() {
            let _ = timeout(FORCE_CLOSE_GRACE, writer.shutdown()).await;
        }
        self.destination_id = 0;
        self.state = SessionState::Idle;
    }
}

/// Handle to the relay's single exclusive call session.
///
/// Cheap to clone; all clones share the same session state.
#[derive(Clone)]
pub struct CallSession {
    socket_path: PathBuf,
    inner: Arc<Mutex<Inner>>,
}

impl std::fmt::Debug for CallSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallSession")
            .field("socket_path", &self.socket_path)
            .finish_non_exhaustive()
    }
}

impl CallSession {
    /// Create an idle session targeting the given call worker socket.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            inner: Arc::new(Mutex::new(Inner {
                state: SessionState::Idle,
                destination_id: 0,
                writer: None,
                producer: None,
                watcher: None,
            })),
        }
    }

    /// Start streaming audio frames to the given destination SDR.
    ///
    /// The id is masked into the 7-bit identifier space (`id & 0x7F`) rather
    /// than rejected; range validation belongs to the request layer. Resolves
    /// once the connection is established and the first frame's send has been
    /// scheduled.
    ///
    /// # Errors
    ///
    /// - [`RelayError::SessionBusy`] if a session is already in progress —
    ///   no queueing, callers must stop first.
    /// - [`RelayError::ConnectError`] / [`RelayError::ConnectTimeout`] if the
    ///   call worker cannot be reached; the session returns to idle.
    pub async fn start(&self, destination_id: u8) -> Result<(), RelayError> {
        let masked = destination_id & SDR_ID_MASK;
        {
            let mut inner = self.inner.lock().await;
            if inner.state != SessionState::Idle {
                log::warn!(
                    "[Call] Start rejected, call already in progress (SDR ID {})",
                    inner.destination_id
                );
                return Err(RelayError::SessionBusy {
                    current: inner.destination_id,
                });
            }
            // Defensive cleanup against residual state from a caller that
            // skipped stop().
            inner.teardown().await;
            inner.state = SessionState::Connecting;
            inner.destination_id = masked;
        }

        // Give the worker time to release any previous connection before we
        // knock again. Empirical; see constants::PRE_START_SETTLE.
        sleep(PRE_START_SETTLE).await;

        log::info!("[Call] Connecting to call worker for SDR ID {masked}");
        let stream = match timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.reset_after_failed_connect().await;
                log::error!("[Call] Connect failed: {e}");
                return Err(RelayError::ConnectError(e));
            }
            Err(_) => {
                self.reset_after_failed_connect().await;
                log::error!("[Call] Connect timed out");
                return Err(RelayError::ConnectTimeout);
            }
        };

        let (read_half, write_half) = stream.into_split();
        let mut inner = self.inner.lock().await;
        if inner.state != SessionState::Connecting {
            // A stop() raced the connect and won; honor it.
            drop(inner);
            return Err(RelayError::ConnectError(std::io::Error::new(
                std::io::ErrorKind::Interrupted,
                "session stopped during connect",
            )));
        }
        inner.writer = Some(write_half);
        inner.producer = Some(tokio::spawn(frame_loop(Arc::clone(&self.inner))));
        inner.watcher = Some(tokio::spawn(watch_peer(Arc::clone(&self.inner), read_half)));
        inner.state = SessionState::Streaming;
        log::info!("[Call] Streaming to SDR ID {masked}");
        Ok(())
    }

    /// Stop the current call.
    ///
    /// Idempotent: stopping an idle session is a no-op. Returns once teardown
    /// has run; a caller that needs the worker-side connection fully released
    /// should wait the forced-close grace before starting a new session
    /// (`start()` waits the settle interval itself, which covers it).
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        if inner.state == SessionState::Idle && inner.writer.is_none() && inner.producer.is_none()
        {
            log::debug!("[Call] Stop on idle session (no-op)");
            return;
        }
        let old_id = inner.destination_id;
        inner.teardown().await;
        log::info!("[Call] Call stopped (was connected to SDR ID {old_id})");
    }

    /// Snapshot of the current session state. Never blocks on I/O, never
    /// fails.
    pub async fn status(&self) -> SessionStatus {
        let inner = self.inner.lock().await;
        SessionStatus {
            state: inner.state,
            destination_id: inner.destination_id,
            has_connection: inner.writer.is_some(),
        }
    }

    async fn reset_after_failed_connect(&self) {
        let mut inner = self.inner.lock().await;
        inner.destination_id = 0;
        inner.state = SessionState::Idle;
    }
}

/// Frame producer: one audio frame per tick, self-rescheduling.
///
/// Sleeps *after* each send rather than on a fixed-rate clock, so two ticks
/// can never overlap. Exits silently when the session has left `Streaming`;
/// on a write failure it tears the session down itself and does not
/// reschedule.
async fn frame_loop(inner: Arc<Mutex<Inner>>) {
    loop {
        {
            let mut guard = inner.lock().await;
            if guard.state != SessionState::Streaming {
                return;
            }
            let payload = dummy_audio_frame(guard.destination_id);
            let frame = match framing::encode(Profile::Audio, &payload) {
                Ok(frame) => frame,
                Err(e) => {
                    // Unreachable for a 64-byte payload, but never panic here.
                    log::error!("[Call] Frame encode failed: {e}");
                    return;
                }
            };
            let Some(writer) = guard.writer.as_mut() else {
                return;
            };
            if let Err(e) = writer.write_all(&frame).await {
                log::error!("[Call] Error sending audio frame: {e}");
                // Detach our own handle, then tear down the rest.
                drop(guard.producer.take());
                guard.teardown().await;
                return;
            }
            log::trace!(
                "[Call] Sent audio frame of {} bytes for SDR ID {}",
                payload.len(),
                guard.destination_id
            );
        }
        sleep(FRAME_INTERVAL).await;
    }
}

/// Watches the read half for an unsolicited worker disconnect and turns it
/// into an implicit stop. Aborted (detached) by explicit teardown before the
/// connection is touched, so it cannot re-enter a stop already in progress.
async fn watch_peer(inner: Arc<Mutex<Inner>>, mut reader: OwnedReadHalf) {
    let mut buf = [0u8; 256];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                log::info!("[Call] Call worker disconnected");
                break;
            }
            Ok(_) => {
                // The call worker sends nothing meaningful; drain and ignore.
            }
            Err(e) => {
                log::error!("[Call] Read error from call worker: {e}");
                break;
            }
        }
    }
    drop(reader);

    let mut guard = inner.lock().await;
    if guard.state == SessionState::Streaming {
        drop(guard.watcher.take());
        guard.teardown().await;
    }
}

/// Synthesized audio frame: masked destination id in the first byte, then a
/// sine-pattern fill standing in for real codec output.
fn dummy_audio_frame(sdr_id: u8) -> Vec<u8> {
    let mut frame = vec![0u8; AUDIO_FRAME_SIZE];
    frame[0] = sdr_id;
    for (i, sample) in frame.iter_mut().enumerate().skip(1) {
        let phase = 2.0 * std::f64::consts::PI * (i as f64) / 32.0;
        *sample = ((127.0 * phase.sin()).floor() + 128.0) as u8;
    }
    frame
}
