//! Length-prefix frame codec for worker streaming sockets.
//!
//! Two profiles, distinguished by prefix width:
//!
//! ```text
//! Audio: [u16 BE length] [payload: length bytes]   payload <= 65535
//! Video: [u32 BE length] [payload: length bytes]   payload <= 10 MB
//! ```
//!
//! Payload content is opaque at this layer. By convention the first byte of
//! an audio payload carries the 7-bit destination SDR id; that convention
//! lives in the session producer, not here.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::constants::{MAX_AUDIO_PAYLOAD, MAX_VIDEO_PAYLOAD};
use crate::error::RelayError;

/// Framing profile: prefix width and payload cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// 2-byte big-endian prefix, for call audio frames.
    Audio,
    /// 4-byte big-endian prefix, for video frames.
    Video,
}

impl Profile {
    /// Width of the length prefix in bytes.
    pub fn prefix_width(self) -> usize {
        match self {
            Self::Audio => 2,
            Self::Video => 4,
        }
    }

    /// Maximum payload length this profile can carry.
    pub fn max_payload(self) -> usize {
        match self {
            Self::Audio => MAX_AUDIO_PAYLOAD,
            Self::Video => MAX_VIDEO_PAYLOAD,
        }
    }
}

/// Encode a payload as `[BE length prefix][payload]`.
///
/// # Errors
///
/// Returns [`RelayError::FrameTooLarge`] if the payload exceeds the
/// profile's maximum.
pub fn encode(profile: Profile, payload: &[u8]) -> Result<Vec<u8>, RelayError> {
    if payload.len() > profile.max_payload() {
        return Err(RelayError::FrameTooLarge {
            length: payload.len(),
            max: profile.max_payload(),
        });
    }

    let mut buf = Vec::with_capacity(profile.prefix_width() + payload.len());
    match profile {
        Profile::Audio => buf.extend_from_slice(&(payload.len() as u16).to_be_bytes()),
        Profile::Video => buf.extend_from_slice(&(payload.len() as u32).to_be_bytes()),
    }
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Read exactly one frame from `reader` and return its payload.
///
/// Reads the prefix, validates the declared length against the profile
/// maximum, then reads exactly that many payload bytes. Does not buffer
/// beyond the frame, so consecutive calls on the same reader yield
/// consecutive frames.
///
/// # Errors
///
/// - [`RelayError::TruncatedFrame`] if the stream ends (or fails) before a
///   complete frame is available — a closed stream never hangs the read.
/// - [`RelayError::FrameTooLarge`] if the declared length exceeds the
///   profile maximum; the payload is not consumed.
pub async fn read_frame<R>(profile: Profile, reader: &mut R) -> Result<Vec<u8>, RelayError>
where
    R: AsyncRead + Unpin,
{
    let length = match profile {
        Profile::Audio => {
            let mut prefix = [0u8; 2];
            reader
                .read_exact(&mut prefix)
                .await
                .map_err(|_| RelayError::TruncatedFrame)?;
            u16::from_be_bytes(prefix) as usize
        }
        Profile::Video => {
            let mut prefix = [0u8; 4];
            reader
                .read_exact(&mut prefix)
                .await
                .map_err(|_| RelayError::TruncatedFrame)?;
            u32::from_be_bytes(prefix) as usize
        }
    };

    if length > profile.max_payload() {
        return Err(RelayError::FrameTooLarge {
            length,
            max: profile.max_payload(),
        });
    }

    let mut payload = vec![0u8; length];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| RelayError::TruncatedFrame)?;
    Ok(payload)
}
