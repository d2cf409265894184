//! Whole-file transfer to the file worker.
//!
//! Wire format, in order: one metadata line `"<name>:<size>\n"`, exactly
//! `size` body bytes, the literal marker `"EOF\n"`, then one response line
//! from the worker. A response containing `SUCCESS` means the transfer was
//! accepted; anything else fails the transfer with the raw response text.
//! Only the first response is honored — the connection is closed as soon as
//! it arrives.
//!
//! Each transfer is stateless and owns its own connection; concurrent
//! transfers need no coordination at this layer.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::constants::{CONNECT_TIMEOUT, TRANSFER_CHUNK_SIZE, TRANSFER_TIMEOUT};
use crate::error::RelayError;

/// Result of a completed transfer.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    /// Display name the file was sent under.
    pub name: String,
    /// Number of body bytes transferred.
    pub size: u64,
    /// The worker's raw response line.
    pub response: String,
}

/// Client for the file worker socket.
#[derive(Debug, Clone)]
pub struct FileTransferClient {
    socket_path: PathBuf,
    deadline: Duration,
}

impl FileTransferClient {
    /// Create a client targeting the given worker socket.
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            deadline: TRANSFER_TIMEOUT,
        }
    }

    /// Override the overall transfer deadline (connect + body + response).
    pub fn with_timeout(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Transfer a file from disk under the given display name.
    ///
    /// The size is taken from filesystem metadata before streaming begins.
    pub async fn send_file(
        &self,
        path: impl AsRef<Path>,
        name: &str,
    ) -> Result<TransferOutcome, RelayError> {
        let file = tokio::fs::File::open(path.as_ref())
            .await
            .map_err(RelayError::SourceReadError)?;
        let size = file
            .metadata()
            .await
            .map_err(RelayError::SourceReadError)?
            .len();
        self.send_stream(file, name, size).await
    }

    /// Transfer `size` bytes from an arbitrary source under the given name.
    ///
    /// Bytes are forwarded in source order, 1 KB at a time; chunks are never
    /// reordered or interleaved. The whole operation is bounded by the
    /// client's deadline.
    ///
    /// # Errors
    ///
    /// Exactly one terminal outcome per call:
    /// - `Ok` with the worker's `SUCCESS` response;
    /// - [`RelayError::TransferRejected`] carrying a non-`SUCCESS` response;
    /// - [`RelayError::ConnectError`] / [`RelayError::ConnectTimeout`];
    /// - [`RelayError::WriteFailure`] / [`RelayError::NoResponse`] for a
    ///   connection that fails mid-transfer;
    /// - [`RelayError::SourceReadError`] if the source fails or ends short;
    /// - [`RelayError::TransferTimeout`] if the deadline elapses;
    /// - [`RelayError::InvalidName`] for a name with an embedded newline.
    pub async fn send_stream<R>(
        &self,
        source: R,
        name: &str,
        size: u64,
    ) -> Result<TransferOutcome, RelayError>
    where
        R: AsyncRead + Unpin,
    {
        if name.contains('\n') || name.contains('\r') {
            return Err(RelayError::InvalidName(name.to_string()));
        }

        timeout(self.deadline, self.run(source, name, size))
            .await
            .map_err(|_| RelayError::TransferTimeout)?
    }

    async fn run<R>(&self, source: R, name: &str, size: u64) -> Result<TransferOutcome, RelayError>
    where
        R: AsyncRead + Unpin,
    {
        let mut stream = timeout(CONNECT_TIMEOUT, UnixStream::connect(&self.socket_path))
            .await
            .map_err(|_| RelayError::ConnectTimeout)?
            .map_err(RelayError::ConnectError)?;

        log::info!("[Transfer] Starting file transfer: {name} ({size} bytes)");

        let metadata = format!("{name}:{size}\n");
        stream
            .write_all(metadata.as_bytes())
            .await
            .map_err(RelayError::WriteFailure)?;

        // Stream the body in order, never past the declared size.
        let mut source = source.take(size);
        let mut chunk = vec![0u8; TRANSFER_CHUNK_SIZE];
        let mut sent: u64 = 0;
        let mut next_progress = size / 10;
        loop {
            let n = source
                .read(&mut chunk)
                .await
                .map_err(RelayError::SourceReadError)?;
            if n == 0 {
                break;
            }
            stream
                .write_all(&chunk[..n])
                .await
                .map_err(RelayError::WriteFailure)?;
            sent += n as u64;

            if size > 0 && sent >= next_progress {
                log::debug!(
                    "[Transfer] Progress: {:.1}% ({sent}/{size} bytes)",
                    (sent as f64 / size as f64) * 100.0
                );
                next_progress = sent + size / 10;
            }
        }
        if sent != size {
            return Err(RelayError::SourceReadError(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!("source ended after {sent} of {size} bytes"),
            )));
        }

        stream
            .write_all(b"EOF\n")
            .await
            .map_err(RelayError::WriteFailure)?;

        let response = read_response_line(&mut stream).await?;
        log::info!("[Transfer] Worker response: {response}");

        // First response wins; drop the connection without looking further.
        drop(stream);

        if response.contains("SUCCESS") {
            Ok(TransferOutcome {
                name: name.to_string(),
                size,
                response,
            })
        } else {
            Err(RelayError::TransferRejected(response))
        }
    }
}

/// Read until one response line arrives (or the worker closes the stream
/// after sending something). Returns the trimmed first line.
async fn read_response_line(stream: &mut UnixStream) -> Result<String, RelayError> {
    let mut collected = Vec::new();
    let mut buf = [0u8; 1024];
    loop {
        let n = stream.read(&mut buf).await.map_err(|_| RelayError::NoResponse)?;
        if n == 0 {
            if collected.is_empty() {
                return Err(RelayError::NoResponse);
            }
            break;
        }
        collected.extend_from_slice(&buf[..n]);
        if collected.contains(&b'\n') {
            break;
        }
    }
    let line = collected.split(|&b| b == b'\n').next().unwrap_or(&[]);
    Ok(String::from_utf8_lossy(line).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::UnixListener;

    /// Mock file worker: accepts one connection, reads the metadata line and
    /// the body up to the `EOF\n` marker, then sends `reply`. Returns the
    /// parsed header and the body length it observed.
    fn spawn_worker(
        listener: UnixListener,
        reply: &'static [u8],
    ) -> tokio::task::JoinHandle<(String, usize)> {
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            let mut buf = [0u8; 4096];
            while !received.ends_with(b"EOF\n") {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "client closed before EOF marker");
                received.extend_from_slice(&buf[..n]);
            }

            let header_end = received.iter().position(|&b| b == b'\n').unwrap();
            let header = String::from_utf8(received[..header_end].to_vec()).unwrap();
            let body_len = received.len() - header_end - 1 - b"EOF\n".len();

            stream.write_all(reply).await.unwrap();
            (header, body_len)
        })
    }

    #[tokio::test]
    async fn test_successful_transfer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sock_path = tmp.path().join("file.sock");
        let worker = spawn_worker(UnixListener::bind(&sock_path).unwrap(), b"SUCCESS\n");

        let body = vec![0xA5u8; 5000]; // spans several chunks
        let client = FileTransferClient::new(&sock_path);
        let outcome = client
            .send_stream(body.as_slice(), "capture.bin", body.len() as u64)
            .await
            .unwrap();

        assert_eq!(outcome.name, "capture.bin");
        assert_eq!(outcome.size, 5000);
        assert!(outcome.response.contains("SUCCESS"));

        let (header, body_len) = worker.await.unwrap();
        assert_eq!(header, "capture.bin:5000");
        assert_eq!(body_len, 5000);
    }

    #[tokio::test]
    async fn test_empty_file_transfer() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sock_path = tmp.path().join("file.sock");
        let worker = spawn_worker(UnixListener::bind(&sock_path).unwrap(), b"SUCCESS\n");

        let client = FileTransferClient::new(&sock_path);
        let outcome = client.send_stream(&[][..], "empty.txt", 0).await.unwrap();
        assert_eq!(outcome.size, 0);

        let (header, body_len) = worker.await.unwrap();
        assert_eq!(header, "empty.txt:0");
        assert_eq!(body_len, 0);
    }

    #[tokio::test]
    async fn test_worker_rejection_carries_response() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sock_path = tmp.path().join("file.sock");
        let _worker = spawn_worker(UnixListener::bind(&sock_path).unwrap(), b"ERROR bad size\n");

        let client = FileTransferClient::new(&sock_path);
        match client.send_stream(&b"data"[..], "f.bin", 4).await {
            Err(RelayError::TransferRejected(response)) => {
                assert_eq!(response, "ERROR bad size");
            }
            other => panic!("Expected TransferRejected, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_silent_worker_times_out() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sock_path = tmp.path().join("file.sock");
        let listener = UnixListener::bind(&sock_path).unwrap();

        // Worker accepts and reads but never responds.
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
        });

        let client =
            FileTransferClient::new(&sock_path).with_timeout(Duration::from_millis(200));
        match client.send_stream(&b"data"[..], "f.bin", 4).await {
            Err(RelayError::TransferTimeout) => {}
            other => panic!("Expected TransferTimeout, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_source_is_source_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sock_path = tmp.path().join("file.sock");
        let listener = UnixListener::bind(&sock_path).unwrap();
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            while stream.read(&mut buf).await.unwrap_or(0) > 0 {}
        });

        let client = FileTransferClient::new(&sock_path);
        // Source has 4 bytes but the metadata promises 10.
        match client.send_stream(&b"data"[..], "f.bin", 10).await {
            Err(RelayError::SourceReadError(_)) => {}
            other => panic!("Expected SourceReadError, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_newline_in_name_rejected_up_front() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = FileTransferClient::new(tmp.path().join("file.sock"));
        match client.send_stream(&b"x"[..], "bad\nname", 1).await {
            Err(RelayError::InvalidName(name)) => assert_eq!(name, "bad\nname"),
            other => panic!("Expected InvalidName, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_file_reads_size_from_disk() {
        let tmp = tempfile::TempDir::new().unwrap();
        let sock_path = tmp.path().join("file.sock");
        let worker = spawn_worker(UnixListener::bind(&sock_path).unwrap(), b"SUCCESS\n");

        let file_path = tmp.path().join("payload.dat");
        std::fs::write(&file_path, vec![1u8; 2048]).unwrap();

        let client = FileTransferClient::new(&sock_path);
        let outcome = client.send_file(&file_path, "payload.dat").await.unwrap();
        assert_eq!(outcome.size, 2048);

        let (header, body_len) = worker.await.unwrap();
        assert_eq!(header, "payload.dat:2048");
        assert_eq!(body_len, 2048);
    }

    #[tokio::test]
    async fn test_missing_socket_is_connect_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        let client = FileTransferClient::new(tmp.path().join("no-such.sock"));
        match client.send_stream(&b"x"[..], "f", 1).await {
            Err(RelayError::ConnectError(_)) => {}
            other => panic!("Expected ConnectError, got: {other:?}"),
        }
    }
}
