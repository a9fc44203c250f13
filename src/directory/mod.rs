//! Content directory access
//!
//! The appliance exposes its recordings as a tree of folders and items. This
//! module defines the [`ContentDirectory`] seam the catalog is built through,
//! plus two implementations:
//!
//! - [`SnapshotDirectory`]: answers discovery and browse requests from an
//!   offline JSON dump of one or more devices
//! - [`UnavailableDirectory`]: stand-in used when no collaborator is
//!   configured; every request fails with a descriptive error
//!
//! ## Snapshot format
//!
//! ```json
//! {
//!   "devices": [
//!     { "uuid": "uuid:stb-1", "host": "192.168.1.20", "model_name": "Fetch Mighty" }
//!   ],
//!   "records": [
//!     { "kind": "folder", "id": "10", "parent_id": "0", "title": "News" },
//!     { "kind": "video", "id": "11", "parent_id": "10", "title": "Tonight",
//!       "size": 1048576, "date": "2020-06-01T18:00:00", "uri": "http://192.168.1.20:49152/11.ts" }
//!   ]
//! }
//! ```

mod snapshot;
mod traits;
mod unavailable;

pub use snapshot::{ROOT_FOLDER_ID, Snapshot, SnapshotDirectory};
pub use traits::ContentDirectory;
pub use unavailable::UnavailableDirectory;
