//! Worker socket configuration.
//!
//! Handles reading the relay configuration file. Socket addresses are
//! deployment configuration; defaults match the stock worker install under
//! `/tmp`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

/// Socket endpoints for the four worker processes.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Config {
    /// Message worker socket (control/command exchange).
    pub msg_socket: PathBuf,
    /// Call worker socket (audio frame streaming).
    pub call_socket: PathBuf,
    /// File worker socket (whole-file transfer).
    pub file_socket: PathBuf,
    /// Video worker socket (video frame streaming).
    pub video_socket: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            msg_socket: PathBuf::from("/tmp/msg_socket"),
            call_socket: PathBuf::from("/tmp/call_socket"),
            file_socket: PathBuf::from("/tmp/file_socket"),
            video_socket: PathBuf::from("/tmp/video_socket"),
        }
    }
}

impl Config {
    /// Loads configuration with environment variable overrides.
    ///
    /// Reads `$RELAY_CONFIG` (a JSON file) if set, otherwise starts from the
    /// defaults; individual `RELAY_*_SOCKET` variables override either way.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("RELAY_CONFIG") {
            Ok(path) => {
                let content = fs::read_to_string(&path)?;
                serde_json::from_str(&content)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("RELAY_MSG_SOCKET") {
            self.msg_socket = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("RELAY_CALL_SOCKET") {
            self.call_socket = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("RELAY_FILE_SOCKET") {
            self.file_socket = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("RELAY_VIDEO_SOCKET") {
            self.video_socket = PathBuf::from(path);
        }
    }
}
