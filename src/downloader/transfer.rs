//! Output file handling and the streaming loop for a single item.

use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use super::network::PeerClosed;
use crate::error::DownloadError;
use crate::progress::ProgressReporter;
use crate::types::Event;

/// Size of one MPEG transport stream packet
pub const TS_PACKET_SIZE: u64 = 188;

/// An opened output file
pub(super) struct OutputFile {
    pub(super) file: File,
    pub(super) path: PathBuf,
    /// Size of the partial file being appended to, if resuming
    pub(super) existing: Option<u64>,
}

impl OutputFile {
    /// Open `path` for writing
    ///
    /// With `resume` set and a non-empty file already present, the file is
    /// opened for appending. Otherwise it is created or truncated.
    pub(super) async fn open(path: &Path, resume: bool) -> Result<Self, DownloadError> {
        let existing = if resume {
            tokio::fs::metadata(path)
                .await
                .ok()
                .map(|m| m.len())
                .filter(|&len| len > 0)
        } else {
            None
        };

        let mut options = OpenOptions::new();
        if existing.is_some() {
            options.append(true);
        } else {
            options.write(true).create(true).truncate(true);
        }

        let file = options.open(path).await.map_err(|source| DownloadError::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self {
            file,
            path: path.to_path_buf(),
            existing,
        })
    }

    /// Byte offset for the `Range` header when resuming
    pub(super) fn range_start(&self) -> Option<u64> {
        self.existing.map(|len| len.saturating_sub(TS_PACKET_SIZE))
    }

    /// Strip to apply to a resumed response body
    pub(super) fn resume_strip(&self) -> ResumeStrip {
        match (self.existing, self.range_start()) {
            (Some(len), Some(start)) => ResumeStrip::new(len - start),
            _ => ResumeStrip::none(),
        }
    }

    /// Drop the partial content; used when the device ignores the range
    pub(super) async fn restart(&mut self) -> Result<(), DownloadError> {
        self.file.set_len(0).await.map_err(|source| DownloadError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.existing = None;
        Ok(())
    }
}

/// Discards the leading bytes of a resumed transfer that the file already has
///
/// The total discarded never exceeds the amount given at construction, no
/// matter how the body is split into chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeStrip {
    remaining: u64,
}

impl ResumeStrip {
    /// Discard the first `bytes` bytes
    pub fn new(bytes: u64) -> Self {
        Self { remaining: bytes }
    }

    /// Discard nothing
    pub fn none() -> Self {
        Self { remaining: 0 }
    }

    /// Return the part of `chunk` that should be written
    pub fn apply<'c>(&mut self, chunk: &'c [u8]) -> &'c [u8] {
        let skip = self.remaining.min(chunk.len() as u64);
        self.remaining -= skip;
        &chunk[skip as usize..]
    }

    /// Bytes still to be discarded
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}

/// How the streaming loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum StreamEnd {
    /// Body fully received (or the device hung up near the end)
    Finished { written: u64 },
    /// Shutdown requested mid-transfer
    Cancelled { written: u64 },
}

/// Everything the streaming loop needs besides the response
pub(super) struct StreamParams<'a> {
    pub(super) id: &'a str,
    pub(super) output: OutputFile,
    pub(super) strip: ResumeStrip,
    pub(super) event_tx: &'a broadcast::Sender<Event>,
    pub(super) cancel: &'a CancellationToken,
}

/// Copy the response body into the output file
///
/// The file is flushed and closed on every exit path, including
/// cancellation, so a partial file is left in a state `--resume` can pick up.
pub(super) async fn stream_body(
    mut response: reqwest::Response,
    params: StreamParams<'_>,
) -> Result<StreamEnd, DownloadError> {
    let StreamParams {
        id,
        output,
        mut strip,
        event_tx,
        cancel,
    } = params;

    let path = output.path;
    let mut writer = BufWriter::new(output.file);
    let total = response.content_length().unwrap_or(0);
    let mut reporter = ProgressReporter::start();
    let mut received: u64 = 0;
    let mut written: u64 = 0;

    let write_error = |source| DownloadError::Write {
        path: path.clone(),
        source,
    };

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                writer.flush().await.map_err(write_error)?;
                tracing::info!(item_id = id, written, "Download interrupted, partial file kept");
                return Ok(StreamEnd::Cancelled { written });
            }
            chunk = response.chunk() => chunk,
        };

        match next {
            Ok(Some(chunk)) => {
                received += chunk.len() as u64;
                let data = strip.apply(&chunk);
                writer.write_all(data).await.map_err(write_error)?;
                written += data.len() as u64;

                if reporter.should_emit() {
                    event_tx
                        .send(Event::Progress {
                            id: id.to_string(),
                            report: reporter.report(received, total),
                        })
                        .ok();
                }
            }
            Ok(None) => break,
            Err(e) if e.is_peer_closed() => {
                tracing::debug!(item_id = id, received, error = %e, "Device closed the connection, treating as end of stream");
                break;
            }
            Err(e) => {
                // keep what we have for a later resume
                writer.flush().await.ok();
                return Err(DownloadError::Stream {
                    id: id.to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    writer.flush().await.map_err(write_error)?;
    writer.into_inner().sync_all().await.map_err(write_error)?;

    event_tx
        .send(Event::Progress {
            id: id.to_string(),
            report: reporter.report(received, total),
        })
        .ok();

    Ok(StreamEnd::Finished { written })
}
