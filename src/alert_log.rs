//! Record logging policy and the CSV record format.
//!
//! Two paths write to the SD log:
//!
//! - **Continuous**: the loop's own 1000 ms cadence, gated on storage
//!   presence and [`LoggingMode::Continuous`].
//! - **On threshold**: exactly one record per `BecameContaminated` edge,
//!   decided by [`AlertLogPolicy::should_log`].
//!
//! The two never overlap because the policy is silent in continuous mode.

use core::fmt::Write as _;

use crate::config::LoggingMode;
use crate::monitor::ContaminationEvent;
use crate::sensors::SensorSnapshot;

/// File name on the SD card root.
pub const LOG_PATH: &str = "/log.csv";

/// First line of a fresh log file.
pub const CSV_HEADER: &str = "Time,Temperature,PH,TDS,Turbidity,Contamination_Type";

/// Stateless decision for the on-threshold path.
pub struct AlertLogPolicy;

impl AlertLogPolicy {
    /// `true` only for a contamination edge while in
    /// [`LoggingMode::OnThreshold`] with a usable store.  Recovery edges
    /// are never logged.
    pub fn should_log(event: ContaminationEvent, mode: LoggingMode, storage_available: bool) -> bool {
        event == ContaminationEvent::BecameContaminated
            && mode == LoggingMode::OnThreshold
            && storage_available
    }

    /// Gate for the continuous cadence.  Checked before the cadence so a
    /// missing card does not consume the interval.
    pub fn continuous_enabled(mode: LoggingMode, storage_available: bool) -> bool {
        mode == LoggingMode::Continuous && storage_available
    }
}

/// One persisted row.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Uptime at write time (ms).
    pub time_ms: u64,
    pub temperature_c: f32,
    pub ph: f32,
    pub tds_ppm: f32,
    pub turbidity_pct: f32,
    pub label: String,
}

impl LogRecord {
    pub fn new(time_ms: u64, snap: &SensorSnapshot, label: &str) -> Self {
        Self {
            time_ms,
            temperature_c: snap.temperature_c,
            ph: snap.ph,
            tds_ppm: snap.tds_ppm,
            turbidity_pct: snap.turbidity_pct,
            label: label.to_string(),
        }
    }

    /// Render as one CSV line, without the trailing newline.
    pub fn to_csv_row(&self) -> String {
        let mut row = String::with_capacity(64);
        // Writing into a String cannot fail.
        let _ = write!(
            row,
            "{},{:.2},{:.2},{:.2},{:.2},{}",
            self.time_ms, self.temperature_c, self.ph, self.tds_ppm, self.turbidity_pct, self.label
        );
        row
    }
}
