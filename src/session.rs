//! One invocation of the client, from discovery to the download run.
//!
//! [`Session`] wires the collaborators to the core: it scans for the target
//! device, builds the catalog when a selector needs it, resolves selectors
//! into a [`DownloadQueue`] and hands out a [`DownloadEngine`]. Rendering and
//! argument parsing stay in the binary.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::catalog::CatalogBuilder;
use crate::config::Config;
use crate::directory::{ContentDirectory, SnapshotDirectory, UnavailableDirectory};
use crate::discovery::{DeviceDiscovery, DeviceSelector, collect_devices};
use crate::downloader::{DownloadEngine, DownloadQueue};
use crate::error::{Error, Result};
use crate::selector::{Selector, resolve_all};
use crate::types::{Device, DownloadOutcome};

/// What the user asked for
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Print the content directory tree
    List,
    /// Download everything the selectors resolve to
    Download {
        /// Raw selector arguments, in the order given
        selectors: Vec<String>,
    },
    /// Print usage
    Help,
}

impl Command {
    /// Interpret the positional arguments
    ///
    /// A missing or unrecognised command means `list`.
    pub fn from_args(command: Option<&str>, args: &[String]) -> Self {
        match command {
            Some("download") => Command::Download {
                selectors: args.to_vec(),
            },
            Some("help") => Command::Help,
            Some("list") | None => Command::List,
            Some(other) => {
                tracing::debug!(command = other, "Unknown command, listing instead");
                Command::List
            }
        }
    }
}

/// Process exit status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Exit code 0
    Success,
    /// Exit code 1
    Failure,
}

impl ExitStatus {
    /// Numeric process exit code
    pub fn code(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
        }
    }

    /// Status for a finished download run
    ///
    /// Individual failed items do not fail the run; an interrupted run does.
    pub fn from_outcomes(outcomes: &[DownloadOutcome]) -> Self {
        if outcomes
            .iter()
            .any(|o| matches!(o, DownloadOutcome::Cancelled { .. }))
        {
            ExitStatus::Failure
        } else {
            ExitStatus::Success
        }
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Collaborators and settings for one run
pub struct Session {
    config: Config,
    discovery: Arc<dyn DeviceDiscovery>,
    directory: Arc<dyn ContentDirectory>,
}

impl Session {
    /// Create a session over explicit collaborators
    pub fn new(
        config: Config,
        discovery: Arc<dyn DeviceDiscovery>,
        directory: Arc<dyn ContentDirectory>,
    ) -> Self {
        Self {
            config,
            discovery,
            directory,
        }
    }

    /// Create a session with the collaborators the config names
    ///
    /// With `snapshot` set, a [`SnapshotDirectory`] answers both discovery
    /// and browsing. Otherwise every request fails, so discovery reports an
    /// initialization error.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be loaded.
    pub async fn from_config(config: Config) -> Result<Self> {
        match &config.discovery.snapshot {
            Some(path) => {
                let snapshot = Arc::new(SnapshotDirectory::load(path).await?);
                Ok(Self::new(config, snapshot.clone(), snapshot))
            }
            None => Ok(Self::new(
                config,
                Arc::new(UnavailableDirectory),
                Arc::new(UnavailableDirectory),
            )),
        }
    }

    /// Settings for this run
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Scan for matching devices for the configured scan delay
    ///
    /// # Errors
    ///
    /// Returns an error if discovery cannot be started.
    pub async fn discover(&self) -> Result<Vec<Device>> {
        let selector = DeviceSelector::new(
            self.config.discovery.model_prefix.clone(),
            self.config.discovery.target_host.clone(),
        );
        collect_devices(
            self.discovery.as_ref(),
            selector,
            self.config.discovery.scan_delay,
        )
        .await
    }

    /// The device to work with: the first one found
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDevice`] if nothing matched during the scan.
    pub async fn target_device(&self) -> Result<Device> {
        self.discover().await?.into_iter().next().ok_or(Error::NoDevice)
    }

    /// Catalog builder over this session's content directory
    pub fn catalog(&self) -> CatalogBuilder {
        CatalogBuilder::new(
            self.directory.clone(),
            self.config.download.file_extension.clone(),
        )
    }

    /// Lines of the `list` output for every device found
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoDevice`] if nothing was found, or a browse error.
    pub async fn list(&self) -> Result<Vec<String>> {
        let devices = self.discover().await?;
        if devices.is_empty() {
            return Err(Error::NoDevice);
        }

        let catalog = self.catalog();
        let mut lines = Vec::new();
        for device in &devices {
            lines.extend(catalog.list_tree(device, "").await?);
        }
        Ok(lines)
    }

    /// Resolve raw selectors into a queue of item ids
    ///
    /// The catalog is only built if some selector needs it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToDownload`] if the selectors resolve to no
    /// ids, or a browse error from building the catalog.
    pub async fn prepare_queue(&self, device: &Device, raw: &[String]) -> Result<DownloadQueue> {
        let selectors: Vec<Selector> = raw.iter().map(|s| Selector::classify(s)).collect();

        let catalog = if selectors.iter().any(Selector::needs_catalog) {
            self.catalog().build(device, "").await?
        } else {
            Vec::new()
        };

        let ids = resolve_all(&selectors, &catalog);
        if ids.is_empty() {
            return Err(Error::NothingToDownload);
        }
        tracing::info!(items = ids.len(), "Download queue prepared");
        Ok(ids.into_iter().collect())
    }

    /// Engine that downloads from `device` with this session's settings
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn engine(&self, device: Device) -> Result<DownloadEngine> {
        DownloadEngine::new(self.catalog(), device, &self.config)
    }
}

/// Cancel `token` when the process is asked to stop
///
/// - **Unix:** SIGTERM and SIGINT, falling back to Ctrl+C if registration fails.
/// - **Windows/other:** Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn cancel_on_signal(token: CancellationToken) {
    tokio::select! {
        _ = wait_for_signal() => token.cancel(),
        _ = token.cancelled() => {}
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, stopping"),
                _ = sigint.recv() => tracing::info!("Received SIGINT (Ctrl+C), stopping"),
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, stopping"),
        Err(e) => tracing::error!(error = %e, "Failed to listen for Ctrl+C"),
    }
}
