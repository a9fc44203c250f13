//! Snapshot fixtures and session builders

use chrono::NaiveDate;
use fetchtv::directory::Snapshot;
use fetchtv::{Config, Device, DirectoryRecord, RecordKind, Session};
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Host the primary test box is announced at
pub const STB_HOST: &str = "192.168.1.20";

/// A Fetch box announced at `host`
pub fn fetch_box(uuid: &str, host: &str) -> Device {
    Device {
        uuid: uuid.to_string(),
        host: host.to_string(),
        model_name: "Fetch Mighty".to_string(),
    }
}

/// A top-level folder
pub fn folder(id: &str, title: &str) -> DirectoryRecord {
    DirectoryRecord {
        kind: RecordKind::Folder,
        id: id.to_string(),
        parent_id: "0".to_string(),
        title: title.to_string(),
        ..Default::default()
    }
}

/// A recording in `parent`, dated at 20:30 on the given day
pub fn recording(
    id: &str,
    parent: &str,
    title: &str,
    uri: &str,
    size: u64,
    day: (i32, u32, u32),
) -> DirectoryRecord {
    DirectoryRecord {
        kind: RecordKind::Video,
        id: id.to_string(),
        parent_id: parent.to_string(),
        title: title.to_string(),
        size,
        date: NaiveDate::from_ymd_opt(day.0, day.1, day.2).and_then(|d| d.and_hms_opt(20, 30, 0)),
        uri: uri.to_string(),
        duration: Some("0:30:00".to_string()),
    }
}

/// A snapshot with one Fetch box, one foreign device and a small library
///
/// Media URIs point at `media_base` (a mock server URI in download tests).
pub fn library(media_base: &str) -> Snapshot {
    Snapshot {
        devices: vec![
            fetch_box("uuid:fetch-1", STB_HOST),
            Device {
                uuid: "uuid:tv".to_string(),
                host: "192.168.1.30".to_string(),
                model_name: "Living Room TV".to_string(),
            },
        ],
        records: vec![
            folder("10", "News"),
            folder("20", "Movies"),
            recording(
                "101",
                "10",
                "News Tonight",
                &format!("{}/media/101", media_base),
                4000,
                (2024, 3, 4),
            ),
            recording(
                "102",
                "10",
                "Late Edition",
                &format!("{}/media/102", media_base),
                3000,
                (2024, 3, 5),
            ),
            recording(
                "201",
                "20",
                "Inception",
                &format!("{}/media/201", media_base),
                6000,
                (2024, 3, 5),
            ),
        ],
    }
}

/// Write `snapshot` into `dir` and return a fast config using it
pub fn snapshot_config(dir: &TempDir, snapshot: &Snapshot) -> Config {
    let snapshot_path = dir.path().join("snapshot.json");
    write_json(&snapshot_path, snapshot);

    let download_dir = dir.path().join("recordings");
    std::fs::create_dir_all(&download_dir).expect("create download dir");

    let mut config = Config::default();
    config.discovery.snapshot = Some(snapshot_path);
    config.discovery.scan_delay = Duration::from_millis(50);
    config.download.queue_delay = Duration::ZERO;
    config.download.download_dir = Some(download_dir);
    config
}

/// Build a session from `snapshot`, returning the temp dir holding its files
pub async fn create_test_session(snapshot: &Snapshot) -> (Session, TempDir) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = snapshot_config(&dir, snapshot);
    let session = Session::from_config(config)
        .await
        .expect("session from snapshot");
    (session, dir)
}

/// Deterministic transport-stream-like payload
pub fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn write_json(path: &Path, snapshot: &Snapshot) {
    let json = serde_json::to_string_pretty(snapshot).expect("serialize snapshot");
    std::fs::write(path, json).expect("write snapshot");
}
