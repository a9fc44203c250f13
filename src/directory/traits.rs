//! Trait for browsing a device's content directory

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{Device, DirectoryRecord};

/// Browse access to the appliance's folder/item tree
///
/// Implementations talk to the device (or stand in for it) and hand back
/// structured records. Errors are reserved for the collaborator itself
/// failing; an unknown id is not an error.
#[async_trait]
pub trait ContentDirectory: Send + Sync {
    /// List the direct children of `folder_id`, in the device's order
    ///
    /// An empty `folder_id` means the root of the content directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the browse request could not be answered.
    async fn browse_children(&self, device: &Device, folder_id: &str)
    -> Result<Vec<DirectoryRecord>>;

    /// Look up a single record by id
    ///
    /// Returns `Ok(None)` if the device does not know the id.
    ///
    /// # Errors
    ///
    /// Returns an error if the browse request could not be answered.
    async fn browse_metadata(&self, device: &Device, item_id: &str)
    -> Result<Option<DirectoryRecord>>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
