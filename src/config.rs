//! System configuration parameters
//!
//! All tunable parameters for the AquaSentry monitor.
//! Thresholds and the logging mode are edited from the menu UI and
//! persisted to NVS; everything else is set at provisioning time.

use serde::{Deserialize, Serialize};

/// Alert thresholds.  Five independent scalar limits; a reading is out of
/// bounds when any single comparison trips.
///
/// No cross-field invariant is enforced: the menu allows `ph_low` to be
/// raised above `ph_high`, which makes every pH reading out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Lowest acceptable pH (exclusive bound).
    pub ph_low: f32,
    /// Highest acceptable pH (exclusive bound).
    pub ph_high: f32,
    /// Maximum total dissolved solids (ppm).
    pub tds_max: f32,
    /// Maximum turbidity (%).
    pub turbidity_max: f32,
    /// Maximum water temperature (°C).
    pub temp_max: f32,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            ph_low: 6.5,
            ph_high: 8.5,
            tds_max: 150.0,
            turbidity_max: 5.0,
            temp_max: 30.0,
        }
    }
}

/// Which threshold the menu cursor is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdField {
    PhLow,
    PhHigh,
    TdsMax,
    TurbidityMax,
    TempMax,
}

impl ThresholdField {
    /// Menu order.
    pub const ALL: [Self; 5] = [
        Self::PhLow,
        Self::PhHigh,
        Self::TdsMax,
        Self::TurbidityMax,
        Self::TempMax,
    ];

    pub fn from_index(idx: usize) -> Self {
        Self::ALL[idx % Self::ALL.len()]
    }
}

impl ThresholdConfig {
    pub fn get(&self, field: ThresholdField) -> f32 {
        match field {
            ThresholdField::PhLow => self.ph_low,
            ThresholdField::PhHigh => self.ph_high,
            ThresholdField::TdsMax => self.tds_max,
            ThresholdField::TurbidityMax => self.turbidity_max,
            ThresholdField::TempMax => self.temp_max,
        }
    }

    /// Add `delta` to one threshold.  Unclamped, matching the menu.
    pub fn adjust(&mut self, field: ThresholdField, delta: f32) {
        let slot = match field {
            ThresholdField::PhLow => &mut self.ph_low,
            ThresholdField::PhHigh => &mut self.ph_high,
            ThresholdField::TdsMax => &mut self.tds_max,
            ThresholdField::TurbidityMax => &mut self.turbidity_max,
            ThresholdField::TempMax => &mut self.temp_max,
        };
        *slot += delta;
    }
}

/// How readings reach the SD card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoggingMode {
    /// One record per log cadence, regardless of alerts.
    #[default]
    Continuous,
    /// One record per `BecameContaminated` edge.
    OnThreshold,
}

impl LoggingMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Continuous => "Continuous",
            Self::OnThreshold => "On Threshold",
        }
    }
}

/// Per-field increments applied by one up/down press in the thresholds menu.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSteps {
    pub ph: f32,
    pub tds: f32,
    pub turbidity: f32,
    pub temperature: f32,
}

impl Default for ThresholdSteps {
    fn default() -> Self {
        Self {
            ph: 0.1,
            tds: 10.0,
            turbidity: 1.0,
            temperature: 0.5,
        }
    }
}

impl ThresholdSteps {
    pub fn for_field(&self, field: ThresholdField) -> f32 {
        match field {
            ThresholdField::PhLow | ThresholdField::PhHigh => self.ph,
            ThresholdField::TdsMax => self.tds,
            ThresholdField::TurbidityMax => self.turbidity,
            ThresholdField::TempMax => self.temperature,
        }
    }
}

/// Realtime-database instance the device reports to when the build does
/// not name one.
pub const DEFAULT_DATABASE_URL: &str =
    "https://esp-waterquality-default-rtdb.asia-southeast1.firebasedatabase.app/";

/// Cloud datastore credentials.  Telemetry stays disabled while the
/// database URL is empty.
///
/// Defaults are fixed at build time: `AQUASENTRY_DB_URL` and
/// `AQUASENTRY_DB_AUTH` override the built-in instance and (empty) token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub database_url: String,
    pub auth_token: String,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            database_url: option_env!("AQUASENTRY_DB_URL")
                .unwrap_or(DEFAULT_DATABASE_URL)
                .to_string(),
            auth_token: option_env!("AQUASENTRY_DB_AUTH").unwrap_or("").to_string(),
        }
    }
}

/// Station credentials used by the WiFi adapter and the provisioning portal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiConfig {
    pub ssid: String,
    pub password: String,
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Alerting ---
    pub thresholds: ThresholdConfig,
    pub threshold_steps: ThresholdSteps,
    pub logging_mode: LoggingMode,

    // --- Cadences (milliseconds) ---
    /// Sensor sampling + threshold evaluation.
    pub sensor_read_interval_ms: u32,
    /// Continuous-mode SD logging.
    pub log_interval_ms: u32,
    /// Serial status report.
    pub status_interval_ms: u32,
    /// Cloud telemetry push.
    pub telemetry_interval_ms: u32,
    /// Minimum spacing between two accepted button presses.
    pub debounce_ms: u32,

    // --- Remote relay ---
    /// Host (or IP) of the relay actuator.
    pub relay_host: String,
    /// Connect timeout for one relay request.
    pub relay_timeout_ms: u32,
    /// Delivery attempts per decided command (1 = single attempt).
    pub relay_max_attempts: u8,

    // --- Telemetry ---
    /// Collection path records are pushed under.
    pub telemetry_path: String,
    pub telemetry_timeout_ms: u32,
    pub cloud: CloudConfig,

    // --- Network ---
    pub wifi: WifiConfig,
    /// Provisioning portal timeout (seconds).
    pub portal_timeout_secs: u32,
    /// SSID of the provisioning access point.
    pub portal_ap_name: String,
    pub ntp_server: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            thresholds: ThresholdConfig::default(),
            threshold_steps: ThresholdSteps::default(),
            logging_mode: LoggingMode::Continuous,

            sensor_read_interval_ms: 1000,
            log_interval_ms: 1000,
            status_interval_ms: 5000,
            telemetry_interval_ms: 5000,
            debounce_ms: 50,

            relay_host: String::from("192.168.117.53"),
            relay_timeout_ms: 1000,
            relay_max_attempts: 1,

            telemetry_path: String::from("/sensor_data"),
            telemetry_timeout_ms: 1000,
            cloud: CloudConfig::default(),

            wifi: WifiConfig::default(),
            portal_timeout_secs: 180,
            portal_ap_name: String::from("WaterMonitorSetup"),
            ntp_server: String::from("pool.ntp.org"),
        }
    }
}
