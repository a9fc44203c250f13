//! Device discovery seam and target-device selection.
//!
//! Discovery itself (SSDP) lives behind [`DeviceDiscovery`]. This module only
//! decides which announced devices are the set-top box we are after, and
//! bounds the wait with the configured scan delay.

use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::types::Device;

/// Buffer size for the device announcement channel
const DISCOVERY_CHANNEL_BUFFER: usize = 64;

/// Source of device announcements
///
/// Implementations push one [`Device`] per announcement into `tx`. The same
/// device may be announced more than once. Returning an error means
/// discovery could not be started at all.
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// Start discovery and feed announcements into `tx`
    ///
    /// May return as soon as discovery is running; announcements can keep
    /// arriving afterwards for as long as `tx` is alive.
    async fn start(&self, tx: mpsc::Sender<Device>) -> Result<()>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Filters announced devices down to the target appliance
///
/// Accepted devices are kept in announcement order. Re-announcements are
/// kept too; callers use the first entry.
#[derive(Debug, Clone)]
pub struct DeviceSelector {
    model_prefix: String,
    target_host: Option<String>,
    accepted: Vec<Device>,
}

impl DeviceSelector {
    /// Create a selector for devices whose model starts with `model_prefix`,
    /// optionally pinned to one host
    pub fn new(model_prefix: impl Into<String>, target_host: Option<String>) -> Self {
        Self {
            model_prefix: model_prefix.into(),
            target_host,
            accepted: Vec::new(),
        }
    }

    /// Consider one announcement; returns true if it was accepted
    pub fn offer(&mut self, device: Device) -> bool {
        if !device.model_name.starts_with(&self.model_prefix) {
            return false;
        }

        if let Some(target) = &self.target_host
            && *target != device.host
        {
            tracing::info!(host = %device.host, uuid = %device.uuid, "Fetch STB skipped");
            return false;
        }

        tracing::info!(host = %device.host, uuid = %device.uuid, "Fetch STB found");
        self.accepted.push(device);
        true
    }

    /// Devices accepted so far, in announcement order
    pub fn devices(&self) -> &[Device] {
        &self.accepted
    }

    /// The device downstream code works with
    pub fn first(&self) -> Option<&Device> {
        self.accepted.first()
    }

    /// Consume the selector, returning the accepted devices
    pub fn into_devices(self) -> Vec<Device> {
        self.accepted
    }
}

/// Run discovery for at most `scan_delay` and return the accepted devices
///
/// Returns early if the discovery source finishes before the deadline.
/// Only a failure to start discovery is an error; finding nothing is not.
pub async fn collect_devices(
    discovery: &dyn DeviceDiscovery,
    mut selector: DeviceSelector,
    scan_delay: Duration,
) -> Result<Vec<Device>> {
    tracing::debug!(source = discovery.name(), ?scan_delay, "Scanning for devices");

    let (tx, mut rx) = mpsc::channel(DISCOVERY_CHANNEL_BUFFER);
    let start = discovery.start(tx);
    tokio::pin!(start);
    let deadline = tokio::time::sleep(scan_delay);
    tokio::pin!(deadline);
    let mut started = false;

    loop {
        tokio::select! {
            result = &mut start, if !started => {
                started = true;
                result?;
            }
            announcement = rx.recv() => match announcement {
                Some(device) => {
                    selector.offer(device);
                }
                None => {
                    if !started {
                        (&mut start).await?;
                    }
                    break;
                }
            },
            _ = &mut deadline => break,
        }
    }

    let devices = selector.into_devices();
    tracing::debug!(count = devices.len(), "Scan finished");
    Ok(devices)
}
