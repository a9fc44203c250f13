//! Flattening the content directory into a download catalog
//!
//! [`CatalogBuilder::build`] walks the folder tree depth-first and returns
//! every video item as a [`CatalogEntry`], in traversal order. Folder nodes
//! never appear in the result; their titles become the `series` of the items
//! they hold.

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;

use crate::directory::ContentDirectory;
use crate::error::Result;
use crate::progress::format_size;
use crate::types::{CatalogEntry, Device, DirectoryRecord, RecordKind};

/// Characters stripped from derived filenames
const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '/', '\\', '"', '|', '?', '*'];

/// Date layout used by `list` output
const LIST_DATE_FORMAT: &str = "%a %b %-d %H:%M:%S %Y";

/// Builds catalog entries from a [`ContentDirectory`]
#[derive(Clone)]
pub struct CatalogBuilder {
    directory: Arc<dyn ContentDirectory>,
    extension: String,
}

impl CatalogBuilder {
    /// Create a builder that names files with `extension` (e.g. `.tts`)
    pub fn new(directory: Arc<dyn ContentDirectory>, extension: impl Into<String>) -> Self {
        Self {
            directory,
            extension: extension.into(),
        }
    }

    /// Flatten the tree under `root_id` into catalog entries
    ///
    /// An empty `root_id` starts at the top of the content directory. A
    /// child folder's subtree is complete before its next sibling is visited,
    /// so the order is stable for an unchanged tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a browse request fails. A failed parent lookup is
    /// not an error; the entry gets an empty series instead.
    pub async fn build(&self, device: &Device, root_id: &str) -> Result<Vec<CatalogEntry>> {
        let mut entries = Vec::new();
        let mut parent_titles = HashMap::new();
        self.walk(device, root_id.to_string(), &mut parent_titles, &mut entries)
            .await?;
        tracing::debug!(
            device = %device.uuid,
            root = root_id,
            entries = entries.len(),
            "Catalog built"
        );
        Ok(entries)
    }

    fn walk<'a>(
        &'a self,
        device: &'a Device,
        folder_id: String,
        parent_titles: &'a mut HashMap<String, String>,
        entries: &'a mut Vec<CatalogEntry>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let children = self.directory.browse_children(device, &folder_id).await?;
            for child in children {
                match child.kind {
                    RecordKind::Folder => {
                        self.walk(device, child.id, parent_titles, entries).await?;
                    }
                    RecordKind::Video => {
                        let series = match parent_titles.get(&child.parent_id) {
                            Some(title) => title.clone(),
                            None => {
                                let title = self.parent_title(device, &child).await;
                                parent_titles.insert(child.parent_id.clone(), title.clone());
                                title
                            }
                        };
                        entries.push(self.entry(child, series));
                    }
                    RecordKind::Other => {
                        tracing::trace!(id = %child.id, "Skipping non-video record");
                    }
                }
            }
            Ok(())
        })
    }

    /// Look up a single item and its parent, without visiting siblings
    ///
    /// Returns `Ok(None)` if the id is unknown or is not a video item.
    ///
    /// # Errors
    ///
    /// Returns an error if the item lookup itself fails.
    pub async fn get(&self, device: &Device, id: &str) -> Result<Option<CatalogEntry>> {
        let Some(record) = self.directory.browse_metadata(device, id).await? else {
            return Ok(None);
        };
        if record.kind != RecordKind::Video {
            tracing::debug!(id, kind = ?record.kind, "Requested id is not a video item");
            return Ok(None);
        }
        let series = self.parent_title(device, &record).await;
        Ok(Some(self.entry(record, series)))
    }

    /// Render the tree under `folder_id` the way the `list` command prints it
    ///
    /// Folders print their title; videos print
    /// `[<id>] <title> [<duration>] <size>\t<date>`. Each nesting level adds
    /// one tab of indentation.
    ///
    /// # Errors
    ///
    /// Returns an error if a browse request fails.
    pub async fn list_tree(&self, device: &Device, folder_id: &str) -> Result<Vec<String>> {
        let mut lines = Vec::new();
        self.list_level(device, folder_id.to_string(), String::new(), &mut lines)
            .await?;
        Ok(lines)
    }

    fn list_level<'a>(
        &'a self,
        device: &'a Device,
        folder_id: String,
        indent: String,
        lines: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            for child in self.directory.browse_children(device, &folder_id).await? {
                match child.kind {
                    RecordKind::Folder => {
                        lines.push(format!("{}{}", indent, child.title));
                        self.list_level(device, child.id, format!("{}\t", indent), lines)
                            .await?;
                    }
                    RecordKind::Video => lines.push(format!("{}{}", indent, list_line(&child))),
                    RecordKind::Other => {}
                }
            }
            Ok(())
        })
    }

    async fn parent_title(&self, device: &Device, record: &DirectoryRecord) -> String {
        match self.directory.browse_metadata(device, &record.parent_id).await {
            Ok(Some(parent)) => parent.title,
            Ok(None) => {
                tracing::warn!(id = %record.id, parent = %record.parent_id, "Parent folder not found");
                String::new()
            }
            Err(e) => {
                tracing::warn!(
                    id = %record.id,
                    parent = %record.parent_id,
                    error = %e,
                    "Parent folder lookup failed"
                );
                String::new()
            }
        }
    }

    fn entry(&self, record: DirectoryRecord, series: String) -> CatalogEntry {
        CatalogEntry {
            filename: derive_filename(&series, &record.title, &self.extension),
            id: record.id,
            title: record.title,
            series,
            uri: record.uri,
            filesize: record.size,
            date: record.date,
        }
    }
}

fn list_line(record: &DirectoryRecord) -> String {
    format!(
        "[{}] {} [{}] {}\t{}",
        record.id,
        record.title,
        record.duration.as_deref().unwrap_or_default(),
        format_size(record.size),
        record
            .date
            .map(|d| d.format(LIST_DATE_FORMAT).to_string())
            .unwrap_or_default()
    )
}

/// Derive the saved filename for an item
///
/// The series is prepended unless the title already starts with it. The
/// result is passed through [`sanitize_filename`].
///
/// ```
/// use fetchtv::catalog::derive_filename;
///
/// assert_eq!(derive_filename("News", "Tonight", ".tts"), "News Tonight.tts");
/// assert_eq!(derive_filename("Movies", "Movies: Inception", ".tts"), "Movies Inception.tts");
/// ```
pub fn derive_filename(series: &str, title: &str, extension: &str) -> String {
    let name = if title.starts_with(series) {
        format!("{}{}", title, extension)
    } else {
        format!("{} {}{}", series, title, extension)
    };
    sanitize_filename(&name)
}

/// Remove characters that are not allowed in filenames on common platforms
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .filter(|c| !INVALID_FILENAME_CHARS.contains(c))
        .collect()
}
