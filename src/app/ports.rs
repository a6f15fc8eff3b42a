//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (sensors, relay transport, SD card, cloud, display)
//! implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them through [`Ports`], so the domain core never touches
//! hardware or sockets directly.

use crate::alert_log::LogRecord;
use crate::config::SystemConfig;
use crate::error::{PublishError, StorageError};
use crate::sensors::RawReadings;
use crate::telemetry::TelemetryRecord;
use crate::ui::Frame;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: one raw acquisition of every probe.
pub trait SensorPort {
    fn read_raw(&mut self) -> RawReadings;
}

// ───────────────────────────────────────────────────────────────
// Relay transport (driven adapter: domain → remote actuator)
// ───────────────────────────────────────────────────────────────

/// Why a relay request produced no status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestFault {
    /// No connection or no answer within the timeout.
    Timeout,
    /// Socket or protocol failure.
    Io,
}

/// Issues a single bodiless HTTP GET.  Implementations must bound the
/// connect phase by `timeout_ms` and must not retry on their own.
pub trait RelayTransport {
    /// Returns the response status code.
    fn get(&mut self, url: &str, timeout_ms: u32) -> Result<u16, RequestFault>;
}

// ───────────────────────────────────────────────────────────────
// Record store (driven adapter: domain → SD card)
// ───────────────────────────────────────────────────────────────

/// Append-only record log on removable storage.
pub trait RecordStore {
    /// Whether a card is mounted and the log file is usable.
    fn is_available(&self) -> bool;

    fn append(&mut self, record: &LogRecord) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Telemetry sink (driven adapter: domain → cloud datastore)
// ───────────────────────────────────────────────────────────────

pub trait TelemetrySink {
    /// Session established and credentials present.
    fn is_ready(&self) -> bool;

    /// Push one record under `path`.  One attempt, bounded by the
    /// adapter's timeout.
    fn push(&mut self, path: &str, record: &TelemetryRecord) -> Result<(), PublishError>;
}

// ───────────────────────────────────────────────────────────────
// Classifier (driven adapter: inference model)
// ───────────────────────────────────────────────────────────────

/// One class score from the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassScore {
    pub label: &'static str,
    pub confidence: f32,
}

/// The inference model failed to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassifierError;

/// Runs the model over `[temperature, ph, tds, turbidity]`.  Label
/// selection is done by [`crate::classifier::select_label`], not here.
pub trait Classifier {
    fn scores(&mut self, features: &[f32; 4]) -> Result<Vec<ClassScore>, ClassifierError>;
}

// ───────────────────────────────────────────────────────────────
// Network & time
// ───────────────────────────────────────────────────────────────

/// Station-mode connectivity as seen by the domain.
pub trait NetworkPort {
    fn is_connected(&self) -> bool;

    /// SSID of the joined network, if any.
    fn ssid(&self) -> Option<String>;

    /// Run the provisioning portal.  Blocks up to `timeout_secs`.
    /// Returns `true` once connected.
    fn start_portal(&mut self, timeout_secs: u32) -> bool;
}

/// Monotonic and wall-clock time.
pub trait ClockPort {
    /// Milliseconds since boot.
    fn uptime_ms(&self) -> u64;

    /// Unix seconds, or `None` until NTP has synchronised the clock.
    fn unix_time(&self) -> Option<i64>;
}

// ───────────────────────────────────────────────────────────────
// UI
// ───────────────────────────────────────────────────────────────

/// Raw logic levels of the four menu buttons (`true` = HIGH).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ButtonLevels {
    pub up: bool,
    pub down: bool,
    pub enter: bool,
    pub back: bool,
}

pub trait InputPort {
    fn levels(&mut self) -> ButtonLevels;
}

/// 20x4 character display.
pub trait DisplayPort {
    fn show(&mut self, frame: &Frame);
}

// ───────────────────────────────────────────────────────────────
// Event sink (driven adapter: domain → logging / diagnostics)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations reject non-finite thresholds and zero cadences with
/// [`ConfigError::ValidationFailed`].  Cross-field relations (e.g. pH
/// low above pH high) are deliberately accepted.
pub trait ConfigPort {
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Port bundle
// ───────────────────────────────────────────────────────────────

/// Every driven port the control loop touches in one pass.  Borrowed
/// fresh each iteration so the main loop keeps ownership of adapters.
pub struct Ports<'a> {
    pub sensors: &'a mut dyn SensorPort,
    pub relay: &'a mut dyn RelayTransport,
    pub store: &'a mut dyn RecordStore,
    pub cloud: &'a mut dyn TelemetrySink,
    pub classifier: &'a mut dyn Classifier,
    pub network: &'a mut dyn NetworkPort,
    pub clock: &'a dyn ClockPort,
    pub input: &'a mut dyn InputPort,
    pub display: &'a mut dyn DisplayPort,
    pub sink: &'a mut dyn EventSink,
}
