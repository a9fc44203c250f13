//! Configuration types for fetchtv

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Device discovery settings
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// How long to listen for device announcements before acting (default: 2000 ms)
    #[serde(default = "default_scan_delay", with = "duration_ms_serde")]
    pub scan_delay: Duration,

    /// Model name prefix that identifies the appliance (default: "Fetch")
    #[serde(default = "default_model_prefix")]
    pub model_prefix: String,

    /// Only accept the device at this host (None = accept every match)
    #[serde(default)]
    pub target_host: Option<String>,

    /// Offline content directory dump answering discovery and browse requests
    #[serde(default)]
    pub snapshot: Option<PathBuf>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            scan_delay: default_scan_delay(),
            model_prefix: default_model_prefix(),
            target_host: None,
            snapshot: None,
        }
    }
}

/// Download behavior settings
///
/// Used as a flattened sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Output directory (None = directory of the running executable)
    #[serde(default)]
    pub download_dir: Option<PathBuf>,

    /// Pause between consecutive downloads (default: 2000 ms)
    #[serde(default = "default_queue_delay", with = "duration_ms_serde")]
    pub queue_delay: Duration,

    /// Timeout for establishing the HTTP connection (default: 10000 ms)
    ///
    /// The transfer itself is never time-limited.
    #[serde(default = "default_connect_timeout", with = "duration_ms_serde")]
    pub connect_timeout: Duration,

    /// Extension appended to every saved recording (default: ".tts")
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Append to existing partial files instead of truncating them
    #[serde(default)]
    pub resume: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            queue_delay: default_queue_delay(),
            connect_timeout: default_connect_timeout(),
            file_extension: default_file_extension(),
            resume: false,
        }
    }
}

/// Main configuration
///
/// Sub-configs are flattened, so the JSON file is a single flat object:
///
/// ```json
/// { "scan_delay": 3000, "download_dir": "/srv/recordings", "resume": true }
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Discovery settings
    #[serde(flatten)]
    pub discovery: DiscoveryConfig,

    /// Download settings
    #[serde(flatten)]
    pub download: DownloadConfig,
}

impl Config {
    /// Load configuration from a JSON file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("cannot read {}: {}", path.display(), e),
            key: None,
        })?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.discovery.model_prefix.is_empty() {
            return Err(Error::config("must not be empty", "model_prefix"));
        }
        if !self.download.file_extension.starts_with('.') {
            return Err(Error::config("must start with '.'", "file_extension"));
        }
        if crate::catalog::sanitize_filename(&self.download.file_extension)
            != self.download.file_extension
        {
            return Err(Error::config(
                "contains characters not allowed in filenames",
                "file_extension",
            ));
        }
        Ok(())
    }

    /// Directory downloads are written to
    ///
    /// Falls back to the directory holding the executable, then to the
    /// current directory.
    pub fn output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.download.download_dir {
            return dir.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_scan_delay() -> Duration {
    Duration::from_millis(2000)
}

fn default_queue_delay() -> Duration {
    Duration::from_millis(2000)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_model_prefix() -> String {
    "Fetch".to_string()
}

fn default_file_extension() -> String {
    ".tts".to_string()
}

// Duration serialization helper (milliseconds)
mod duration_ms_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
