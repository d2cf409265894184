//! Timing and sizing constants for the relay core.
//!
//! Centralizes the magic numbers shared by the session, transfer, and
//! control units. Constants are grouped by domain with documentation
//! explaining their purpose.

use std::time::Duration;

// ============================================================================
// Timeouts
// ============================================================================

/// Timeout for establishing a connection to any worker socket.
///
/// Workers are local processes, so a connect either succeeds quickly or the
/// worker is down; 5 seconds leaves room for a worker that is mid-restart.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Overall timeout for a whole file transfer (connect + body + response).
///
/// Generous because payloads may be large and the radio link behind the
/// worker is slow. Tunable per client via `FileTransferClient::with_timeout`.
pub const TRANSFER_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Session timing
// ============================================================================

/// Interval between outbound audio frames.
///
/// The producer is self-rescheduling: it sleeps this long *after* each send,
/// so jitter accumulates but no two ticks ever overlap.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);

/// Settle delay before connecting a new call session.
///
/// The call worker holds its accept slot briefly after a disconnect; waiting
/// this long before reconnecting avoids racing a worker that has not yet
/// released the previous connection. Empirical — the worker protocol has no
/// explicit socket-release acknowledgment to wait on instead.
pub const PRE_START_SETTLE: Duration = Duration::from_millis(100);

/// Grace period allowed for a graceful half-close during session teardown.
///
/// If the graceful shutdown has not completed within this window the
/// connection is dropped outright. Callers that need a
/// connection-fully-released guarantee wait this long before restarting;
/// `start()` itself waits [`PRE_START_SETTLE`], which covers it.
pub const FORCE_CLOSE_GRACE: Duration = Duration::from_millis(50);

// ============================================================================
// Wire sizes
// ============================================================================

/// Size of one synthesized audio frame payload, identifier byte included.
pub const AUDIO_FRAME_SIZE: usize = 64;

/// Maximum audio frame payload — the 2-byte length prefix's full range.
pub const MAX_AUDIO_PAYLOAD: usize = u16::MAX as usize;

/// Maximum video frame payload (10 MB).
///
/// Matches the frame-size cap the upstream request layer enforces, so a
/// frame the relay accepts is always encodable.
pub const MAX_VIDEO_PAYLOAD: usize = 10 * 1024 * 1024;

/// Chunk size for streaming file bodies to the file worker.
pub const TRANSFER_CHUNK_SIZE: usize = 1024;

/// Mask confining a destination SDR id to the 7-bit identifier space of the
/// 128-node network. Out-of-range ids are masked, not rejected; range
/// validation belongs to the request layer above the relay.
pub const SDR_ID_MASK: u8 = 0x7F;
