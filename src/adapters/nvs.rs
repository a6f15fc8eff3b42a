//! Persisted configuration in NVS.
//!
//! [`NvsAdapter`] serves [`ConfigPort`].  The whole [`SystemConfig`] is one
//! postcard blob, key `syscfg` in namespace `aquasentry`, so a save is a
//! single atomic NVS commit.  A missing blob loads as defaults; a blob that
//! does not decode or fails [`validate_config`] is reported, never used.

use core::cell::RefCell;

use log::info;

use crate::app::ports::{ConfigError, ConfigPort};
use crate::config::SystemConfig;

#[cfg(target_os = "espidf")]
use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
#[cfg(target_os = "espidf")]
use log::warn;

const NAMESPACE: &str = "aquasentry";
const CONFIG_KEY: &str = "syscfg";
/// Larger than any encoded config; guards the read buffer.
#[cfg(target_os = "espidf")]
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsAdapter {
    #[cfg(target_os = "espidf")]
    nvs: RefCell<EspNvs<NvsDefault>>,
    #[cfg(not(target_os = "espidf"))]
    blob: RefCell<Option<Vec<u8>>>,
}

impl NvsAdapter {
    /// Open the config namespace read-write on the default partition.
    #[cfg(target_os = "espidf")]
    pub fn new(partition: EspDefaultNvsPartition) -> Result<Self, ConfigError> {
        let nvs = EspNvs::new(partition, NAMESPACE, true).map_err(|e| {
            warn!("NVS: cannot open '{}': {:?}", NAMESPACE, e);
            ConfigError::IoError
        })?;
        info!("NVS: namespace '{}' open", NAMESPACE);
        Ok(Self { nvs: RefCell::new(nvs) })
    }

    /// In-memory store for host builds.
    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self { blob: RefCell::new(None) }
    }

    /// Overwrite the stored blob with arbitrary bytes.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_put_raw(&self, bytes: &[u8]) {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
    }

    #[cfg(target_os = "espidf")]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        let nvs = self.nvs.borrow();
        let len = match nvs.blob_len(CONFIG_KEY) {
            Ok(Some(len)) if len <= MAX_BLOB_SIZE => len,
            Ok(Some(len)) => {
                warn!("NVS: '{}' is {} bytes, ignoring", CONFIG_KEY, len);
                return Err(ConfigError::Corrupted);
            }
            Ok(None) => return Ok(None),
            Err(e) => {
                warn!("NVS: read failed: {:?}", e);
                return Err(ConfigError::IoError);
            }
        };
        let mut buf = vec![0u8; len];
        match nvs.get_blob(CONFIG_KEY, &mut buf) {
            Ok(Some(bytes)) => Ok(Some(bytes.to_vec())),
            Ok(None) => Ok(None),
            Err(e) => {
                warn!("NVS: read failed: {:?}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_blob(&self) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.blob.borrow().clone())
    }

    #[cfg(target_os = "espidf")]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        self.nvs.borrow_mut().set_blob(CONFIG_KEY, bytes).map_err(|e| {
            warn!("NVS: write failed: {:?}", e);
            ConfigError::IoError
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn write_blob(&self, bytes: &[u8]) -> Result<(), ConfigError> {
        *self.blob.borrow_mut() = Some(bytes.to_vec());
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for NvsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

/// Range checks applied before every save and after every load.
///
/// Threshold *relations* are not checked: an inverted pH band is a
/// legitimate (if odd) operator choice.
pub fn validate_config(cfg: &SystemConfig) -> Result<(), ConfigError> {
    let t = &cfg.thresholds;
    if ![t.ph_low, t.ph_high, t.tds_max, t.turbidity_max, t.temp_max]
        .iter()
        .all(|v| v.is_finite())
    {
        return Err(ConfigError::ValidationFailed("thresholds must be finite"));
    }
    let s = &cfg.threshold_steps;
    if ![s.ph, s.tds, s.turbidity, s.temperature]
        .iter()
        .all(|v| v.is_finite() && *v > 0.0)
    {
        return Err(ConfigError::ValidationFailed("threshold steps must be positive"));
    }
    if cfg.sensor_read_interval_ms == 0
        || cfg.log_interval_ms == 0
        || cfg.status_interval_ms == 0
        || cfg.telemetry_interval_ms == 0
    {
        return Err(ConfigError::ValidationFailed("cadence intervals must be > 0"));
    }
    if cfg.relay_max_attempts == 0 {
        return Err(ConfigError::ValidationFailed("relay_max_attempts must be >= 1"));
    }
    if cfg.relay_host.trim().is_empty() {
        return Err(ConfigError::ValidationFailed("relay_host must not be empty"));
    }
    if !(100..=10_000).contains(&cfg.relay_timeout_ms) {
        return Err(ConfigError::ValidationFailed(
            "relay_timeout_ms must be 100–10000",
        ));
    }
    if !cfg.telemetry_path.starts_with('/') {
        return Err(ConfigError::ValidationFailed(
            "telemetry_path must start with '/'",
        ));
    }
    if cfg.portal_ap_name.is_empty() || cfg.portal_ap_name.len() > 32 {
        return Err(ConfigError::ValidationFailed(
            "portal_ap_name must be 1–32 bytes",
        ));
    }
    Ok(())
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        let Some(bytes) = self.read_blob()? else {
            info!("NVS: no stored config, using defaults");
            return Ok(SystemConfig::default());
        };
        let cfg: SystemConfig = postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
        validate_config(&cfg)?;
        info!("NVS: config loaded ({} bytes)", bytes.len());
        Ok(cfg)
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        validate_config(config)?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.write_blob(&bytes)?;
        info!("NVS: config saved ({} bytes)", bytes.len());
        Ok(())
    }
}
