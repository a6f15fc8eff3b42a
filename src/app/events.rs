//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them (serial log, diagnostics buffer).

use crate::config::{LoggingMode, ThresholdConfig};
use crate::error::{Error, TransportError};
use crate::monitor::{ContaminationEvent, Violations};
use crate::sensors::SensorSnapshot;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service finished its first acquisition.
    Started(SensorSnapshot),

    /// The contamination state machine crossed an edge.
    Transition {
        event: ContaminationEvent,
        violations: Violations,
        snapshot: SensorSnapshot,
    },

    /// A relay command was attempted.
    RelayCommanded {
        on: bool,
        manual: bool,
        outcome: Result<(), TransportError>,
    },

    /// A CSV record reached the SD card.
    RecordLogged { time_ms: u64, on_threshold: bool },

    /// Periodic status report.
    Status(StatusReport),

    /// A telemetry record was accepted by the datastore.
    TelemetryPublished { timestamp: String },

    /// A responsibility failed this pass; the others carried on.
    Degraded(Error),

    /// Thresholds or logging mode were edited.
    ConfigChanged,

    /// Persisting the config failed.
    ConfigSaveFailed,
}

/// A point-in-time view of the whole device.
#[derive(Debug, Clone)]
pub struct StatusReport {
    pub snapshot: SensorSnapshot,
    pub label: String,
    pub logging_mode: LoggingMode,
    pub relay_on: bool,
    pub storage_available: bool,
    /// SSID when connected.
    pub network: Option<String>,
    pub thresholds: ThresholdConfig,
}
