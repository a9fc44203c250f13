//! Transfer progress: throughput, remaining time and human-readable sizes.

use std::fmt;
use std::time::{Duration, Instant};

/// Minimum elapsed time before a throughput figure is reported
const MIN_ELAPSED_MS: u64 = 1000;

/// Interval between progress event emissions
const PROGRESS_UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Snapshot of a transfer's progress
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProgressReport {
    /// Bytes received so far in this transfer
    pub received: u64,
    /// Bytes expected in this transfer (0 = unknown)
    pub total: u64,
    /// Throughput in bytes per second, once at least a second has passed
    pub speed_bps: Option<u64>,
    /// Estimated seconds left, once a throughput is known
    pub remaining_secs: Option<i64>,
}

impl ProgressReport {
    /// Derive throughput and remaining time from raw counters
    ///
    /// Same inputs always give the same report.
    pub fn compute(received: u64, total: u64, elapsed_ms: u64) -> Self {
        if elapsed_ms < MIN_ELAPSED_MS {
            return Self {
                received,
                total,
                speed_bps: None,
                remaining_secs: None,
            };
        }

        let speed = received / (elapsed_ms / 1000);
        let left = total as i64 - received as i64;
        Self {
            received,
            total,
            speed_bps: Some(speed),
            remaining_secs: Some(left / speed.max(1) as i64),
        }
    }

    /// Remaining time as a sentence, e.g. `3 minutes and 20 seconds remaining`
    pub fn remaining(&self) -> String {
        format_remaining(self.remaining_secs)
    }
}

impl fmt::Display for ProgressReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} at {} per second. {}",
            format_size(self.received),
            format_size(self.total),
            format_size(self.speed_bps.unwrap_or(0)),
            self.remaining()
        )
    }
}

/// Tracks one transfer's start time and paces progress emissions
#[derive(Debug)]
pub struct ProgressReporter {
    start: Instant,
    last_emit: Option<Instant>,
}

impl ProgressReporter {
    /// Start timing a transfer now
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
            last_emit: None,
        }
    }

    /// Build a report from the counters and the time since [`start`](Self::start)
    pub fn report(&self, received: u64, total: u64) -> ProgressReport {
        ProgressReport::compute(received, total, self.start.elapsed().as_millis() as u64)
    }

    /// Returns true at most once per update interval
    pub fn should_emit(&mut self) -> bool {
        let now = Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < PROGRESS_UPDATE_INTERVAL => false,
            _ => {
                self.last_emit = Some(now);
                true
            }
        }
    }
}

fn unit(value: i64, singular: &'static str, plural: &'static str) -> &'static str {
    if value.abs() == 1 { singular } else { plural }
}

/// Format a remaining-time estimate
///
/// Zero leading components are dropped: hours and minutes when there are
/// hours, minutes and seconds when there are minutes, otherwise seconds only.
pub fn format_remaining(secs: Option<i64>) -> String {
    let Some(s) = secs else {
        return "Unknown time remaining".to_string();
    };

    let hours = s / 3600;
    let minutes = (s % 3600) / 60;
    let seconds = s % 60;

    if hours != 0 {
        format!(
            "{} {} and {} {} remaining",
            hours,
            unit(hours, "hour", "hours"),
            minutes.abs(),
            unit(minutes, "minute", "minutes")
        )
    } else if minutes != 0 {
        format!(
            "{} {} and {} {} remaining",
            minutes,
            unit(minutes, "minute", "minutes"),
            seconds.abs(),
            unit(seconds, "second", "seconds")
        )
    } else {
        format!("{} {} remaining", seconds, unit(seconds, "second", "seconds"))
    }
}

/// Format a byte count with IEC units and two decimals
///
/// ```
/// use fetchtv::progress::format_size;
///
/// assert_eq!(format_size(512), "512 bytes");
/// assert_eq!(format_size(1536), "1.50 KiB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["KiB", "MiB", "GiB", "TiB", "PiB"];

    if bytes < 1024 {
        return format!("{} bytes", bytes);
    }

    let mut value = bytes as f64 / 1024.0;
    let mut index = 0;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }
    format!("{:.2} {}", value, UNITS[index])
}
