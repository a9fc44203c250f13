//! Error types for fetchtv
//!
//! Two layers:
//! - [`Error`] covers conditions that end the whole run (no device, bad
//!   config, nothing to download, discovery could not start).
//! - [`DownloadError`] covers a single queued item. The download engine
//!   records these as a failed outcome and moves on to the next item.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fetchtv operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetchtv
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "scan_delay")
        key: Option<String>,
    },

    /// Device discovery could not be started
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// No matching set-top box was found during the scan window
    #[error("no Fetch set-top box found")]
    NoDevice,

    /// The content directory collaborator failed to answer a browse request
    #[error("content directory error: {0}")]
    Directory(String),

    /// Every selector resolved to zero items
    #[error("nothing to download")]
    NothingToDownload,

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors for a single queued download
///
/// None of these abort the queue.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The item could not be looked up in the content directory
    #[error("item {id} not found on the device")]
    MetadataUnavailable {
        /// The item id that was requested
        id: String,
    },

    /// The item has no media URI or reports a non-positive size
    #[error("item {id} cannot be downloaded: {reason}")]
    NotDownloadable {
        /// The item id
        id: String,
        /// Why the item was rejected
        reason: String,
    },

    /// The output file could not be opened
    #[error("file {} can not be opened: {source}", path.display())]
    FileOpen {
        /// Output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Writing to the output file failed
    #[error("write to {} failed: {source}", path.display())]
    Write {
        /// Output path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The device answered the GET with a non-success status
    #[error("item {id}: HTTP {status}")]
    HttpStatus {
        /// The item id
        id: String,
        /// HTTP status code
        status: u16,
    },

    /// The transfer failed for a reason other than the device hanging up
    #[error("item {id}: transfer failed: {message}")]
    Stream {
        /// The item id
        id: String,
        /// Error description from the transport
        message: String,
    },
}

impl Error {
    /// Shorthand for a configuration error tied to a key
    pub fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
