//! Error types for P-touch printer operations.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for P-touch printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Opening the printer character device failed.
    ///
    /// Fatal unless the caller requested simulate mode, in which case the
    /// driver keeps running with no device and suppresses all writes.
    #[error("failed to open printer device {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// A command could not be written to the device.
    ///
    /// Writes are not retried by this layer; the caller decides whether to
    /// abort the job.
    #[error("failed to write command to printer: {0}")]
    Write(#[source] io::Error),

    /// The background status reader could not be started.
    #[error("failed to start status reader: {0}")]
    Reader(#[source] io::Error),

    /// A malformed status frame, surfaced only by the codec itself.
    ///
    /// The background reader recovers from these locally and never
    /// propagates them.
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Codec-level errors for the 32-byte status frame.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("status frame must be 32 bytes, got {0}")]
    Length(usize),
}
