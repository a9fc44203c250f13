//! # fetchtv
//!
//! Client library for the Fetch set-top box: find the box on the local
//! network, flatten its recordings into a catalog, pick recordings with
//! simple selectors and download them, resuming interrupted files.
//!
//! ## Pipeline
//!
//! discovery → [`DeviceSelector`] → [`CatalogBuilder`] → [`Selector`] →
//! [`DownloadEngine`] → filesystem, with [`ProgressReport`]s on the side.
//!
//! Device discovery and content-directory browsing are collaborators behind
//! the [`DeviceDiscovery`] and [`ContentDirectory`] traits.
//! [`SnapshotDirectory`] implements both from an offline JSON dump.
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetchtv::{Config, Session};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.discovery.snapshot = Some("fetch-snapshot.json".into());
//!
//!     let session = Session::from_config(config).await?;
//!     let device = session.target_device().await?;
//!     let queue = session.prepare_queue(&device, &["News".to_string()]).await?;
//!
//!     let engine = session.engine(device)?;
//!     let mut events = engine.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     engine.run(queue, CancellationToken::new()).await;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Catalog building from the content directory
pub mod catalog;
/// Configuration types
pub mod config;
/// Content directory collaborator and implementations
pub mod directory;
/// Device discovery collaborator and target-device selection
pub mod discovery;
/// Sequential, resumable download engine
pub mod downloader;
/// Error types
pub mod error;
/// Throughput, remaining time and size formatting
pub mod progress;
/// Download selector classification and resolution
pub mod selector;
/// Orchestration of one client invocation
pub mod session;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use catalog::CatalogBuilder;
pub use config::{Config, DiscoveryConfig, DownloadConfig};
pub use directory::{ContentDirectory, SnapshotDirectory, UnavailableDirectory};
pub use discovery::{DeviceDiscovery, DeviceSelector};
pub use downloader::{DownloadEngine, DownloadQueue};
pub use error::{DownloadError, Error, Result};
pub use progress::{ProgressReport, ProgressReporter};
pub use selector::Selector;
pub use session::{Command, ExitStatus, Session};
pub use types::{CatalogEntry, Device, DirectoryRecord, DownloadOutcome, Event, RecordKind, Stage};
