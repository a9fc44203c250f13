//! Sequential, resumable download engine.
//!
//! The engine is split into focused submodules:
//! - [`queue`] - FIFO of resolved item ids
//! - [`transfer`] - output file handling, resume strip and the streaming loop
//! - [`network`] - recognising the device hanging up mid-stream
//!
//! Each dequeued item moves through the [`Stage`]s
//! `MetadataFetching → FileOpening → Streaming` and ends as a
//! [`DownloadOutcome`]: completed, failed in one of those stages, or
//! cancelled. A failed item never stops the queue.

mod network;
mod queue;
mod transfer;

pub use network::{PeerClosed, error_chain_is_peer_closed};
pub use queue::DownloadQueue;
pub use transfer::{ResumeStrip, TS_PACKET_SIZE};

use reqwest::StatusCode;
use reqwest::header::RANGE;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogBuilder;
use crate::config::Config;
use crate::error::{DownloadError, Result};
use crate::types::{CatalogEntry, Device, DownloadOutcome, Event, Stage};

use transfer::{OutputFile, StreamEnd, StreamParams};

/// Capacity of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Downloads queued items one at a time from a single device
#[derive(Clone)]
pub struct DownloadEngine {
    catalog: CatalogBuilder,
    device: Device,
    client: reqwest::Client,
    output_dir: PathBuf,
    resume: bool,
    queue_delay: Duration,
    event_tx: broadcast::Sender<Event>,
}

/// A failure tagged with the stage it happened in
struct StageError {
    stage: Stage,
    error: DownloadError,
}

impl StageError {
    fn new(stage: Stage, error: DownloadError) -> Self {
        Self { stage, error }
    }
}

impl DownloadEngine {
    /// Create an engine for `device`, looking items up through `catalog`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(catalog: CatalogBuilder, device: Device, config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.download.connect_timeout)
            .build()?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Ok(Self {
            catalog,
            device,
            client,
            output_dir: config.output_dir(),
            resume: config.download.resume,
            queue_delay: config.download.queue_delay,
            event_tx,
        })
    }

    /// Subscribe to engine events
    ///
    /// Multiple subscribers are supported; each gets every event sent after
    /// it subscribed.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Directory files are saved to
    pub fn output_dir(&self) -> &std::path::Path {
        &self.output_dir
    }

    /// Download every queued item, strictly one after another
    ///
    /// Returns one outcome per attempted item, in queue order. Cancelling
    /// `cancel` interrupts the current transfer (the partial file is kept)
    /// and leaves the rest of the queue untouched.
    pub async fn run(&self, mut queue: DownloadQueue, cancel: CancellationToken) -> Vec<DownloadOutcome> {
        tracing::info!(device = %self.device.host, items = queue.len(), "Starting download queue");
        let mut outcomes = Vec::with_capacity(queue.len());

        while let Some(id) = queue.dequeue() {
            let outcome = self.download_one(&id, &cancel).await;
            let stop = matches!(outcome, DownloadOutcome::Cancelled { .. });
            outcomes.push(outcome);

            if stop || cancel.is_cancelled() {
                break;
            }

            if !queue.is_empty() && !self.queue_delay.is_zero() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.queue_delay) => {}
                }
            }
        }

        let completed = outcomes.iter().filter(|o| o.is_completed()).count();
        let failed = outcomes
            .iter()
            .filter(|o| matches!(o, DownloadOutcome::Failed { .. }))
            .count();
        tracing::info!(completed, failed, skipped = queue.len(), "Download queue finished");
        self.event_tx
            .send(Event::QueueFinished { completed, failed })
            .ok();

        outcomes
    }

    async fn download_one(&self, id: &str, cancel: &CancellationToken) -> DownloadOutcome {
        match self.try_download(id, cancel).await {
            Ok(outcome) => outcome,
            Err(StageError { stage, error }) => {
                let message = error.to_string();
                tracing::warn!(item_id = id, stage = %stage, error = %message, "Download failed");
                self.event_tx
                    .send(Event::Failed {
                        id: id.to_string(),
                        stage,
                        error: message.clone(),
                    })
                    .ok();
                DownloadOutcome::Failed {
                    id: id.to_string(),
                    stage,
                    error: message,
                }
            }
        }
    }

    async fn try_download(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<DownloadOutcome, StageError> {
        // Metadata is fetched again here so the download reflects the device's current state
        let entry = self.fetch_entry(id).await?;

        self.event_tx
            .send(Event::Started {
                id: id.to_string(),
                series: entry.series.clone(),
                title: entry.title.clone(),
                size: entry.filesize,
            })
            .ok();

        validate(&entry).map_err(|e| StageError::new(Stage::MetadataFetching, e))?;

        let path = self.output_dir.join(&entry.filename);
        let mut output = OutputFile::open(&path, self.resume)
            .await
            .map_err(|e| StageError::new(Stage::FileOpening, e))?;

        let range_start = output.range_start();
        self.event_tx
            .send(Event::Transferring {
                id: id.to_string(),
                uri: entry.uri.clone(),
                path: path.clone(),
                resume_from: output.existing,
            })
            .ok();

        let mut request = self.client.get(&entry.uri);
        if let Some(start) = range_start {
            tracing::info!(item_id = id, existing = ?output.existing, start, "Resuming partial download");
            request = request.header(RANGE, format!("bytes={}-", start));
        }

        let streaming = |e| StageError::new(Stage::Streaming, e);

        let response = request.send().await.map_err(|e| {
            streaming(DownloadError::Stream {
                id: id.to_string(),
                message: e.to_string(),
            })
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(streaming(DownloadError::HttpStatus {
                id: id.to_string(),
                status: status.as_u16(),
            }));
        }

        if range_start.is_some() && status != StatusCode::PARTIAL_CONTENT {
            tracing::warn!(item_id = id, status = %status, "Device ignored the range request, restarting from zero");
            output.restart().await.map_err(streaming)?;
        }

        let strip = output.resume_strip();
        let end = transfer::stream_body(
            response,
            StreamParams {
                id,
                output,
                strip,
                event_tx: &self.event_tx,
                cancel,
            },
        )
        .await
        .map_err(streaming)?;

        match end {
            StreamEnd::Finished { written } => {
                tracing::info!(item_id = id, path = %path.display(), bytes = written, "Download complete");
                self.event_tx
                    .send(Event::Completed {
                        id: id.to_string(),
                        path: path.clone(),
                        bytes: written,
                    })
                    .ok();
                Ok(DownloadOutcome::Completed {
                    id: id.to_string(),
                    path,
                    bytes: written,
                })
            }
            StreamEnd::Cancelled { written } => Ok(DownloadOutcome::Cancelled {
                id: id.to_string(),
                written,
            }),
        }
    }

    async fn fetch_entry(&self, id: &str) -> std::result::Result<CatalogEntry, StageError> {
        let metadata = |e| StageError::new(Stage::MetadataFetching, e);
        match self.catalog.get(&self.device, id).await {
            Ok(Some(entry)) => Ok(entry),
            Ok(None) => Err(metadata(DownloadError::MetadataUnavailable { id: id.to_string() })),
            Err(e) => {
                tracing::debug!(item_id = id, error = %e, "Metadata lookup failed");
                Err(metadata(DownloadError::MetadataUnavailable { id: id.to_string() }))
            }
        }
    }
}

fn validate(entry: &CatalogEntry) -> std::result::Result<(), DownloadError> {
    let reject = |reason: String| DownloadError::NotDownloadable {
        id: entry.id.clone(),
        reason,
    };

    if entry.uri.is_empty() {
        return Err(reject("no media URI".into()));
    }
    if entry.filesize == 0 {
        return Err(reject("size is zero or unknown".into()));
    }
    url::Url::parse(&entry.uri).map_err(|e| reject(format!("invalid media URI: {}", e)))?;
    Ok(())
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
