//! Shared test helpers for creating DownloadEngine instances in tests.

use crate::catalog::CatalogBuilder;
use crate::config::Config;
use crate::directory::{Snapshot, SnapshotDirectory};
use crate::downloader::DownloadEngine;
use crate::types::{Device, DirectoryRecord, Event, RecordKind};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

pub(crate) fn stb() -> Device {
    Device {
        uuid: "uuid:fetch-stb".into(),
        host: "127.0.0.1".into(),
        model_name: "Fetch Mighty".into(),
    }
}

pub(crate) fn folder(id: &str, title: &str) -> DirectoryRecord {
    DirectoryRecord {
        kind: RecordKind::Folder,
        id: id.into(),
        parent_id: "0".into(),
        title: title.into(),
        ..Default::default()
    }
}

pub(crate) fn video(id: &str, parent: &str, title: &str, uri: String, size: u64) -> DirectoryRecord {
    DirectoryRecord {
        kind: RecordKind::Video,
        id: id.into(),
        parent_id: parent.into(),
        title: title.into(),
        size,
        uri,
        ..Default::default()
    }
}

/// Build an engine over `records` that saves into a fresh temp directory.
/// Returns the engine and the tempdir (which must be kept alive).
pub(crate) fn create_test_engine(
    records: Vec<DirectoryRecord>,
    resume: bool,
) -> (DownloadEngine, tempfile::TempDir) {
    create_test_engine_with(records, |config| config.download.resume = resume)
}

/// Like [`create_test_engine`], with `adjust` applied to the config last
pub(crate) fn create_test_engine_with(
    records: Vec<DirectoryRecord>,
    adjust: impl FnOnce(&mut Config),
) -> (DownloadEngine, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = Some(temp_dir.path().to_path_buf());
    config.download.queue_delay = Duration::ZERO;
    adjust(&mut config);

    let directory = SnapshotDirectory::new(Snapshot {
        devices: vec![stb()],
        records,
    });
    let catalog = CatalogBuilder::new(Arc::new(directory), ".tts");
    let engine = DownloadEngine::new(catalog, stb(), &config).unwrap();

    (engine, temp_dir)
}

/// Drain every event already sent to `rx`
pub(crate) fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
