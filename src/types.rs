//! Core types for fetchtv

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::progress::ProgressReport;

/// A UPnP device as reported by discovery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Stable device identifier
    pub uuid: String,
    /// Network address the device was found at
    pub host: String,
    /// Model name from the device description
    pub model_name: String,
}

/// Classification of a content directory node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// A storage folder that may contain further records
    Folder,
    /// A movie or video item
    Video,
    /// Anything else (music, pictures, playlists)
    #[default]
    Other,
}

/// One node of the content directory, as returned by a browse request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryRecord {
    /// Node kind
    #[serde(default)]
    pub kind: RecordKind,
    /// Object id
    pub id: String,
    /// Id of the containing folder
    #[serde(default)]
    pub parent_id: String,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Size in bytes (0 = unknown)
    #[serde(default)]
    pub size: u64,
    /// Recording date
    #[serde(default)]
    pub date: Option<NaiveDateTime>,
    /// Media stream URI (empty for folders)
    #[serde(default)]
    pub uri: String,
    /// Play length as reported by the device, e.g. `0:42:10`
    #[serde(default)]
    pub duration: Option<String>,
}

/// A downloadable recording with its derived filename
///
/// Built once by [`crate::catalog::CatalogBuilder`] and never mutated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Object id used to re-fetch the item
    pub id: String,
    /// Title of the recording
    pub title: String,
    /// Title of the folder holding the recording
    pub series: String,
    /// Filesystem-safe name for the saved file
    pub filename: String,
    /// Media stream URI
    pub uri: String,
    /// Size in bytes (0 = unknown)
    pub filesize: u64,
    /// Recording date, if the device reported one
    pub date: Option<NaiveDateTime>,
}

/// Active stage of a single queued download
///
/// Reported with a failure to say where the item was abandoned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Looking the item up on the device
    MetadataFetching,
    /// Opening or creating the output file
    FileOpening,
    /// Receiving bytes
    Streaming,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::MetadataFetching => "fetching metadata",
            Stage::FileOpening => "opening file",
            Stage::Streaming => "streaming",
        };
        f.write_str(name)
    }
}

/// Final result of one queued download
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// File saved
    Completed {
        /// Item id
        id: String,
        /// Saved file
        path: PathBuf,
        /// Bytes written during this run
        bytes: u64,
    },
    /// Item abandoned; the queue continued
    Failed {
        /// Item id
        id: String,
        /// Stage the item was in when it failed
        stage: Stage,
        /// Error message
        error: String,
    },
    /// Interrupted by shutdown; the partial file stays on disk
    Cancelled {
        /// Item id
        id: String,
        /// Bytes written during this run before the interruption
        written: u64,
    },
}

impl DownloadOutcome {
    /// Item id this outcome belongs to
    pub fn id(&self) -> &str {
        match self {
            DownloadOutcome::Completed { id, .. }
            | DownloadOutcome::Failed { id, .. }
            | DownloadOutcome::Cancelled { id, .. } => id,
        }
    }

    /// True if the file was saved
    pub fn is_completed(&self) -> bool {
        matches!(self, DownloadOutcome::Completed { .. })
    }
}

/// Events emitted by the download engine
///
/// Consumers subscribe via [`crate::downloader::DownloadEngine::subscribe`].
#[derive(Clone, Debug)]
pub enum Event {
    /// Metadata fetched, download about to begin
    Started {
        /// Item id
        id: String,
        /// Folder title
        series: String,
        /// Item title
        title: String,
        /// Size reported by the device
        size: u64,
    },

    /// Output file opened and request sent
    Transferring {
        /// Item id
        id: String,
        /// Media URI
        uri: String,
        /// Output file
        path: PathBuf,
        /// Size of the existing partial file when resuming
        resume_from: Option<u64>,
    },

    /// Transfer progress
    Progress {
        /// Item id
        id: String,
        /// Throughput and time estimate
        report: ProgressReport,
    },

    /// File saved
    Completed {
        /// Item id
        id: String,
        /// Saved file
        path: PathBuf,
        /// Bytes written during this run
        bytes: u64,
    },

    /// Item abandoned
    Failed {
        /// Item id
        id: String,
        /// Stage the item was in
        stage: Stage,
        /// Error message
        error: String,
    },

    /// Every queued item has been attempted
    QueueFinished {
        /// Number of saved files
        completed: usize,
        /// Number of failed items
        failed: usize,
    },
}
