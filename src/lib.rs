//! MANET SDR relay - session and framing core.
//!
//! A local relay between a web dashboard and a set of SDR worker processes
//! reachable only through Unix domain stream sockets. The HTTP layer above
//! and the workers below are external collaborators; this crate owns the
//! session lifecycle, the binary framing, and the per-socket exchange
//! patterns in between.
//!
//! # Architecture
//!
//! ```text
//! Request layer (external)
//!      │
//!      ├── ControlChannel ───► /tmp/msg_socket    one-shot request/response
//!      ├── CallSession ──────► /tmp/call_socket   exclusive audio stream
//!      ├── FileTransferClient► /tmp/file_socket   metadata + body + EOF
//!      └── VideoStream ──────► /tmp/video_socket  caller-pushed frames
//! ```
//!
//! Exactly one call session may be active at a time; that exclusivity is the
//! crate's central invariant and lives in [`session`]. Framing for the two
//! streaming sockets is in [`framing`]; every failure is a typed value from
//! [`error`], never a process abort.

pub mod config;
pub mod constants;
pub mod control;
pub mod error;
pub mod framing;
pub mod session;
pub mod transfer;
pub mod video;

pub use config::Config;
pub use control::ControlChannel;
pub use error::RelayError;
pub use framing::Profile;
pub use session::{CallSession, SessionState, SessionStatus};
pub use transfer::{FileTransferClient, TransferOutcome};
pub use video::VideoStream;
