//! ESP32 time adapter.
//!
//! Implements [`ClockPort`]: monotonic uptime plus NTP-backed wall clock.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer and `gettimeofday()` for wall time.
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` and
//!   `SystemTime` for host-side testing and simulation.

use crate::app::ports::ClockPort;

/// Anything before 2020-01-01 means SNTP has not set the clock yet.
const EPOCH_2020: i64 = 1_577_836_800;

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn raw_unix_secs(&self) -> Option<i64> {
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, core::ptr::null_mut()) } != 0 {
            return None;
        }
        Some(tv.tv_sec as i64)
    }

    #[cfg(not(target_os = "espidf"))]
    fn raw_unix_secs(&self) -> Option<i64> {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs() as i64)
    }
}

impl ClockPort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn uptime_ms(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn unix_time(&self) -> Option<i64> {
        self.raw_unix_secs().filter(|&secs| secs >= EPOCH_2020)
    }
}

/// Start SNTP against `server`.  The returned handle must stay alive for
/// the clock to keep syncing.
#[cfg(target_os = "espidf")]
pub fn start_sntp(
    server: &str,
) -> Result<esp_idf_svc::sntp::EspSntp<'static>, esp_idf_svc::sys::EspError> {
    use esp_idf_svc::sntp::{EspSntp, SntpConf};

    let mut conf = SntpConf::default();
    conf.servers[0] = server;
    let sntp = EspSntp::new(&conf)?;
    log::info!("SNTP: started against {}", server);
    Ok(sntp)
}
