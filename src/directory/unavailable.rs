//! Stand-in collaborator used when nothing answers discovery or browsing

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::traits::ContentDirectory;
use crate::discovery::DeviceDiscovery;
use crate::error::{Error, Result};
use crate::types::{Device, DirectoryRecord};

/// Collaborator that fails every request
///
/// Used by the binary when no snapshot is configured, so the run ends with a
/// discovery failure instead of silently finding nothing.
///
/// ```
/// use fetchtv::directory::UnavailableDirectory;
/// use fetchtv::discovery::DeviceDiscovery;
///
/// # #[tokio::main]
/// # async fn main() {
/// let (tx, _rx) = tokio::sync::mpsc::channel(1);
/// assert!(UnavailableDirectory.start(tx).await.is_err());
/// # }
/// ```
pub struct UnavailableDirectory;

#[async_trait]
impl DeviceDiscovery for UnavailableDirectory {
    async fn start(&self, _tx: mpsc::Sender<Device>) -> Result<()> {
        Err(Error::Discovery(
            "no discovery source configured. \
             Pass --snapshot or set snapshot in the config file."
                .into(),
        ))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

#[async_trait]
impl ContentDirectory for UnavailableDirectory {
    async fn browse_children(&self, _device: &Device, _folder_id: &str) -> Result<Vec<DirectoryRecord>> {
        Err(Error::Directory("no content directory configured".into()))
    }

    async fn browse_metadata(&self, _device: &Device, _item_id: &str) -> Result<Option<DirectoryRecord>> {
        Err(Error::Directory("no content directory configured".into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
