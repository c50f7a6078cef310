//! Error types for blog-pipeline
//!
//! This module provides the error taxonomy for a pipeline run:
//! - Upstream failures from the content and image services
//! - Decoding failures for malformed responses
//! - Deadline failures for slow services
//! - Upload and record-write failures for the storage stages
//! - Local I/O, configuration and run-lock errors
//!
//! Each variant carries enough context (service, key, record id) to be logged
//! on its own, and maps to a machine-readable [`Error::error_code`] and a
//! process [`exit_code`].

use crate::types::Stage;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for blog-pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes for the `blog-pipeline` binary
///
/// | Code | Constant | Description |
/// |------|----------|-------------|
/// | 0 | `SUCCESS` | Run finished with `success` or `partial` status |
/// | 1 | `RUN_FAILED` | At least one run finished with `failed` status |
/// | 2 | `CONFIG` | Invalid configuration or CLI arguments |
/// | 9 | `LOCK_HELD` | Another run holds the run lock |
/// | 130 | `INTERRUPTED` | Terminated by SIGINT/SIGTERM |
pub mod exit_code {
    /// Run finished with `success` or `partial` status
    pub const SUCCESS: i32 = 0;
    /// At least one run finished with `failed` status
    pub const RUN_FAILED: i32 = 1;
    /// Invalid configuration or CLI arguments
    pub const CONFIG: i32 = 2;
    /// Another run holds the run lock
    pub const LOCK_HELD: i32 = 9;
    /// Terminated by a signal while a run was in progress
    pub const INTERRUPTED: i32 = 130;
}

/// Main error type for blog-pipeline
#[derive(Debug, Error)]
pub enum Error {
    /// Remote service answered with a failure (non-2xx or a failed job)
    #[error("{service} returned failure (status {status}): {body}")]
    Upstream {
        /// Which service failed (e.g., "content-api", "image-api")
        service: &'static str,
        /// HTTP status code, or 0 when the failure came from the payload
        status: u16,
        /// Truncated response body or service error message
        body: String,
    },

    /// Response could not be decoded into the expected shape
    #[error("{service} response could not be parsed: {reason}")]
    Parse {
        /// Which service produced the response
        service: &'static str,
        /// What was wrong with the response
        reason: String,
    },

    /// Service did not answer within its deadline
    #[error("{service} timed out after {after:?}")]
    Timeout {
        /// Which service timed out
        service: &'static str,
        /// The deadline that was exceeded
        after: Duration,
    },

    /// Object store upload failed
    #[error("upload of {key} failed: {reason}")]
    Upload {
        /// The object key that could not be written
        key: String,
        /// Why the upload failed
        reason: String,
    },

    /// Record store write failed
    #[error("write of record {id} failed: {reason}")]
    Write {
        /// The record id that could not be written
        id: String,
        /// Why the write failed
        reason: String,
        /// Whether the failure is transient (throttling, unavailable) and worth retrying
        transient: bool,
    },

    /// Local I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "CONTENT_API_URL")
        key: Option<String>,
    },

    /// Transport-level HTTP error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLx database error
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Image could not be decoded or re-encoded
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Another run holds the run lock
    #[error("another run is in progress (pid {pid}, lock {lock_path})")]
    AlreadyRunning {
        /// PID recorded in the existing lock file
        pid: u32,
        /// Path of the lock file
        lock_path: PathBuf,
    },

    /// Run lock could not be created or read
    #[error("run lock error: {0}")]
    Lock(String),

    /// Run was interrupted by a termination signal
    #[error("run interrupted during {stage} stage")]
    Interrupted {
        /// The stage that was executing when the signal arrived
        stage: Stage,
    },
}

impl Error {
    /// Create a configuration error tied to a specific key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Get the machine-readable error code used in structured logs
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Upstream { .. } => "upstream_error",
            Error::Parse { .. } => "parse_error",
            Error::Timeout { .. } => "timeout_error",
            Error::Upload { .. } => "upload_error",
            Error::Write { .. } => "write_error",
            Error::Io(_) => "io_error",
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::Sqlx(_) => "database_error",
            Error::Image(_) => "image_error",
            Error::AlreadyRunning { .. } => "already_running",
            Error::Lock(_) => "lock_error",
            Error::Interrupted { .. } => "interrupted",
        }
    }

    /// Map this error to the process exit code when it ends the program
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Config { .. } => exit_code::CONFIG,
            Error::AlreadyRunning { .. } => exit_code::LOCK_HELD,
            Error::Interrupted { .. } => exit_code::INTERRUPTED,
            _ => exit_code::RUN_FAILED,
        }
    }

    /// Map a transport error from a given service, separating deadline failures
    pub(crate) fn from_http(service: &'static str, deadline: Duration, e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout {
                service,
                after: deadline,
            }
        } else {
            Error::Network(e)
        }
    }
}
