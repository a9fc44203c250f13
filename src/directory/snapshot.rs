//! Offline content directory backed by a JSON dump

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::mpsc;

use super::traits::ContentDirectory;
use crate::discovery::DeviceDiscovery;
use crate::error::{Error, Result};
use crate::types::{Device, DirectoryRecord};

/// Id of the root folder; records with this parent (or none) are top level
pub const ROOT_FOLDER_ID: &str = "0";

/// Serialized form of a snapshot file
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Devices announced by discovery, in announcement order
    #[serde(default)]
    pub devices: Vec<Device>,
    /// Content directory records, in browse order
    #[serde(default)]
    pub records: Vec<DirectoryRecord>,
}

/// Answers discovery and browse requests from a [`Snapshot`]
///
/// Every device in the snapshot serves the same record set. Browsing on a
/// device that is not in the snapshot is a directory error.
#[derive(Clone, Debug)]
pub struct SnapshotDirectory {
    snapshot: Snapshot,
}

impl SnapshotDirectory {
    /// Wrap an in-memory snapshot
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot file
    ///
    /// # Errors
    ///
    /// A missing or unreadable file is a discovery failure; malformed JSON
    /// is a serialization error.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::Discovery(format!("cannot read snapshot {}: {}", path.display(), e))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            devices = snapshot.devices.len(),
            records = snapshot.records.len(),
            "Loaded content directory snapshot"
        );
        Ok(Self::new(snapshot))
    }

    /// The wrapped snapshot
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    fn check_device(&self, device: &Device) -> Result<()> {
        if self.snapshot.devices.iter().any(|d| d.uuid == device.uuid) {
            Ok(())
        } else {
            Err(Error::Directory(format!("unknown device {}", device.uuid)))
        }
    }
}

#[async_trait]
impl DeviceDiscovery for SnapshotDirectory {
    async fn start(&self, tx: mpsc::Sender<Device>) -> Result<()> {
        for device in &self.snapshot.devices {
            if tx.send(device.clone()).await.is_err() {
                // receiver gone, scan window closed
                break;
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}

#[async_trait]
impl ContentDirectory for SnapshotDirectory {
    async fn browse_children(&self, device: &Device, folder_id: &str) -> Result<Vec<DirectoryRecord>> {
        self.check_device(device)?;

        let folder = if folder_id.is_empty() {
            ROOT_FOLDER_ID
        } else {
            folder_id
        };
        let at_root = folder == ROOT_FOLDER_ID;

        Ok(self
            .snapshot
            .records
            .iter()
            .filter(|r| r.parent_id == folder || (at_root && r.parent_id.is_empty()))
            .cloned()
            .collect())
    }

    async fn browse_metadata(&self, device: &Device, item_id: &str) -> Result<Option<DirectoryRecord>> {
        self.check_device(device)?;
        Ok(self.snapshot.records.iter().find(|r| r.id == item_id).cloned())
    }

    fn name(&self) -> &'static str {
        "snapshot"
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKind;

    fn stb() -> Device {
        Device {
            uuid: "uuid:stb-1".into(),
            host: "192.168.1.20".into(),
            model_name: "Fetch Mighty".into(),
        }
    }

    fn record(kind: RecordKind, id: &str, parent: &str, title: &str) -> DirectoryRecord {
        DirectoryRecord {
            kind,
            id: id.into(),
            parent_id: parent.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    fn directory() -> SnapshotDirectory {
        SnapshotDirectory::new(Snapshot {
            devices: vec![stb()],
            records: vec![
                record(RecordKind::Folder, "10", "0", "News"),
                record(RecordKind::Video, "11", "10", "Tonight"),
                record(RecordKind::Folder, "20", "", "Movies"),
                record(RecordKind::Video, "12", "10", "Late"),
            ],
        })
    }

    #[tokio::test]
    async fn test_empty_folder_id_is_root() {
        let children = directory().browse_children(&stb(), "").await.unwrap();
        let ids: Vec<_> = children.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "20"]);
    }

    #[tokio::test]
    async fn test_children_keep_snapshot_order() {
        let children = directory().browse_children(&stb(), "10").await.unwrap();
        let ids: Vec<_> = children.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["11", "12"]);
    }

    #[tokio::test]
    async fn test_metadata_lookup() {
        let dir = directory();
        let found = dir.browse_metadata(&stb(), "11").await.unwrap().unwrap();
        assert_eq!(found.title, "Tonight");
        assert!(dir.browse_metadata(&stb(), "999").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_device_is_error() {
        let other = Device {
            uuid: "uuid:other".into(),
            ..stb()
        };
        let result = directory().browse_children(&other, "").await;
        assert!(matches!(result, Err(Error::Directory(_))));
    }

    #[tokio::test]
    async fn test_start_announces_devices() {
        let (tx, mut rx) = mpsc::channel(4);
        directory().start(tx).await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), stb());
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        std::fs::write(
            &path,
            r#"{"devices": [{"uuid": "u", "host": "h", "model_name": "Fetch"}],
                "records": [{"kind": "folder", "id": "1", "parent_id": "0", "title": "Kids"}]}"#,
        )
        .unwrap();

        let loaded = SnapshotDirectory::load(&path).await.unwrap();
        assert_eq!(loaded.snapshot().devices.len(), 1);
        assert_eq!(loaded.snapshot().records[0].title, "Kids");

        let missing = SnapshotDirectory::load(&dir.path().join("nope.json")).await;
        assert!(matches!(missing, Err(Error::Discovery(_))));
    }
}
