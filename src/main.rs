//! MANET relay CLI - drives the worker sockets directly.
//!
//! This is a small operational driver for the relay core: send a control
//! message, place a timed demo call, or transfer a file, against the same
//! worker sockets the dashboard relay uses. See the `manet_relay` library
//! for the core functionality.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use manet_relay::{CallSession, Config, ControlChannel, FileTransferClient};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "manet-relay", about = "MANET SDR worker relay driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a text message through the message worker.
    Send {
        /// Message text to deliver.
        message: String,
    },
    /// Place a demo call: dispatch the start_call command, stream audio
    /// frames for a while, then hang up.
    Call {
        /// Destination SDR id (0-127; out-of-range values are masked).
        destination: u8,
        /// Seconds to keep the call up.
        #[arg(long, default_value_t = 5)]
        duration: u64,
    },
    /// Transfer a file to the file worker.
    Upload {
        /// File to transfer.
        path: PathBuf,
        /// Display name sent to the worker (defaults to the file name).
        #[arg(long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = Config::load()?;

    match cli.command {
        Command::Send { message } => {
            let channel = ControlChannel::new(&config.msg_socket);
            let response = channel.send_message(&message).await?;
            println!("Worker response: {response}");
        }
        Command::Call {
            destination,
            duration,
        } => {
            let channel = ControlChannel::new(&config.msg_socket);
            let response = channel.send_call_command(destination).await?;
            println!("Call command response: {response}");

            let session = CallSession::new(&config.call_socket);
            session.start(destination).await?;
            println!("Call started to SDR ID {destination}, streaming for {duration}s...");
            tokio::time::sleep(Duration::from_secs(duration)).await;

            session.stop().await;
            let status = session.status().await;
            println!("Call stopped, final status: {status:?}");
        }
        Command::Upload { path, name } => {
            let name = match name {
                Some(name) => name,
                None => path
                    .file_name()
                    .context("Upload path has no file name")?
                    .to_string_lossy()
                    .into_owned(),
            };
            let client = FileTransferClient::new(&config.file_socket);
            let outcome = client.send_file(&path, &name).await?;
            println!(
                "File {} transferred successfully ({} bytes): {}",
                outcome.name, outcome.size, outcome.response
            );
        }
    }

    Ok(())
}
