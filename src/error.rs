//! Failure taxonomy for the relay core.
//!
//! Every operation resolves to a success value or one of these errors;
//! nothing here is fatal to the process. Connection-level errors during an
//! active call are absorbed by forcing a stop (observable via
//! `CallSession::status`); transfer and control errors always surface to
//! the caller.

/// Errors produced by the session, framing, transfer, and control units.
#[derive(Debug)]
pub enum RelayError {
    /// A call session is already active; carries the current destination id.
    SessionBusy {
        /// Destination SDR id of the in-progress session.
        current: u8,
    },
    /// Could not reach the worker socket.
    ConnectError(std::io::Error),
    /// The worker did not accept the connection in time.
    ConnectTimeout,
    /// A mid-stream send failed; the session has been stopped.
    WriteFailure(std::io::Error),
    /// The stream ended before a complete frame could be read.
    TruncatedFrame,
    /// A frame's declared length exceeds the profile maximum.
    FrameTooLarge {
        /// Declared payload length.
        length: usize,
        /// Profile maximum.
        max: usize,
    },
    /// The file transfer exceeded its overall deadline.
    TransferTimeout,
    /// The file worker responded without `SUCCESS`; carries the raw response.
    TransferRejected(String),
    /// The byte source failed before the full body was streamed.
    SourceReadError(std::io::Error),
    /// The transfer name would corrupt the metadata line.
    InvalidName(String),
    /// Operation requires a connection that is not established.
    NotConnected,
    /// The worker closed the connection before sending any response.
    NoResponse,
}

impl std::fmt::Display for RelayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SessionBusy { current } => {
                write!(f, "Call already in progress (SDR ID {current})")
            }
            Self::ConnectError(e) => write!(f, "Failed to connect to worker: {e}"),
            Self::ConnectTimeout => write!(f, "Connection to worker timed out"),
            Self::WriteFailure(e) => write!(f, "Send to worker failed: {e}"),
            Self::TruncatedFrame => write!(f, "Stream ended mid-frame"),
            Self::FrameTooLarge { length, max } => {
                write!(f, "Frame too large: {length} bytes (max {max})")
            }
            Self::TransferTimeout => write!(f, "File transfer timed out"),
            Self::TransferRejected(response) => {
                write!(f, "File transfer failed: {response}")
            }
            Self::SourceReadError(e) => write!(f, "File source read error: {e}"),
            Self::InvalidName(name) => {
                write!(f, "Invalid transfer name (embedded newline): {name:?}")
            }
            Self::NotConnected => write!(f, "Not connected to worker"),
            Self::NoResponse => write!(f, "Worker closed the connection without responding"),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConnectError(e) | Self::WriteFailure(e) | Self::SourceReadError(e) => Some(e),
            _ => None,
        }
    }
}
