//! Telemetry publisher.
//!
//! Builds one [`TelemetryRecord`] from the latest snapshot and label and
//! pushes it to the cloud datastore.  Fire-and-forget: a failed push is
//! logged and dropped, never queued.

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::Serialize;

use crate::app::ports::TelemetrySink;
use crate::error::PublishError;
use crate::sensors::SensorSnapshot;

/// Placeholder timestamp while the wall clock is unsynchronised.
pub const UNSYNCED_TIMESTAMP: &str = "NA";

/// Wire shape of one telemetry document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub timestamp: String,
    pub ph: f32,
    pub tds_ppm: f32,
    pub temperature_c: f32,
    /// Percent scale, kept under the datastore's historic key.
    pub turbidity_ntu: f32,
    pub contamination_type: String,
}

impl TelemetryRecord {
    pub fn new(snap: &SensorSnapshot, label: &str, unix_time: Option<i64>) -> Self {
        Self {
            timestamp: format_timestamp(unix_time),
            ph: snap.ph,
            tds_ppm: snap.tds_ppm,
            temperature_c: snap.temperature_c,
            turbidity_ntu: snap.turbidity_pct,
            contamination_type: label.to_string(),
        }
    }

    pub fn has_timestamp(&self) -> bool {
        self.timestamp != UNSYNCED_TIMESTAMP
    }
}

/// ISO-8601 UTC with a literal `Z`, or [`UNSYNCED_TIMESTAMP`].
pub fn format_timestamp(unix_time: Option<i64>) -> String {
    unix_time
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map_or_else(
            || UNSYNCED_TIMESTAMP.to_string(),
            |dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
        )
}

pub struct TelemetryPublisher {
    path: String,
    published: u32,
    failed: u32,
}

impl TelemetryPublisher {
    pub fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            published: 0,
            failed: 0,
        }
    }

    /// Push one record.  Returns [`PublishError::NotReady`] without
    /// touching the sink when it has no session.
    pub fn publish(
        &mut self,
        sink: &mut dyn TelemetrySink,
        snap: &SensorSnapshot,
        label: &str,
        unix_time: Option<i64>,
    ) -> Result<(), PublishError> {
        if !sink.is_ready() {
            return Err(PublishError::NotReady);
        }
        let record = TelemetryRecord::new(snap, label, unix_time);
        if !record.has_timestamp() {
            warn!("Telemetry: clock not synchronised, timestamp sent as {UNSYNCED_TIMESTAMP}");
        }
        match sink.push(&self.path, &record) {
            Ok(()) => {
                self.published = self.published.saturating_add(1);
                info!("Telemetry: pushed to {} ({})", self.path, record.timestamp);
                Ok(())
            }
            Err(e) => {
                self.failed = self.failed.saturating_add(1);
                warn!("Telemetry: push to {} failed: {}", self.path, e);
                Err(e)
            }
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn published_count(&self) -> u32 {
        self.published
    }

    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}
