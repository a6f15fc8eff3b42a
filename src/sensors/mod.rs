//! Sensor subsystem: calibration formulas and the [`SensorReader`].
//!
//! Acquisition is behind [`SensorPort`]; this module only turns raw
//! counts into physical units.  Each tick produces one immutable
//! [`SensorSnapshot`] that the rest of the loop consumes.

pub mod ph;
pub mod tds;
pub mod turbidity;

use log::debug;

use crate::app::ports::SensorPort;

/// ADC reference voltage (V).
pub const VREF: f32 = 3.3;
/// Full-scale count of the 12-bit ADC.
pub const ADC_MAX: f32 = 4095.0;

/// One raw acquisition: three ADC channels plus the thermocouple, which
/// the MAX6675 already reports in °C.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RawReadings {
    pub ph_raw: u16,
    pub tds_raw: u16,
    pub turbidity_raw: u16,
    /// `NaN` when the thermocouple is open or unreadable.
    pub temperature_c: f32,
}

/// A point-in-time set of the four calibrated readings.
///
/// `turbidity_pct` is always within `[0, 100]` and `tds_ppm` is never
/// negative; calibration enforces both.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorSnapshot {
    pub temperature_c: f32,
    pub ph: f32,
    pub tds_ppm: f32,
    pub turbidity_pct: f32,
    /// Monotonic uptime at acquisition (ms).
    pub timestamp_ms: u64,
}

impl SensorSnapshot {
    /// Feature vector in the order the classifier was trained on.
    pub fn features(&self) -> [f32; 4] {
        [self.temperature_c, self.ph, self.tds_ppm, self.turbidity_pct]
    }
}

/// Converts raw acquisitions into snapshots.
#[derive(Debug, Default)]
pub struct SensorReader {
    samples: u64,
}

impl SensorReader {
    pub fn new() -> Self {
        Self { samples: 0 }
    }

    /// Read every channel through `port` and calibrate.
    pub fn sample(&mut self, port: &mut dyn SensorPort, now_ms: u64) -> SensorSnapshot {
        let raw = port.read_raw();
        self.samples = self.samples.wrapping_add(1);
        let snap = calibrate(&raw, now_ms);
        debug!(
            "sample #{}: raw pH={} tds={} turb={} → pH={:.2} tds={:.0} turb={:.0}% T={:.1}",
            self.samples,
            raw.ph_raw,
            raw.tds_raw,
            raw.turbidity_raw,
            snap.ph,
            snap.tds_ppm,
            snap.turbidity_pct,
            snap.temperature_c
        );
        snap
    }

    /// Number of samples taken since boot.
    pub fn sample_count(&self) -> u64 {
        self.samples
    }
}

/// Pure calibration of one raw acquisition.
pub fn calibrate(raw: &RawReadings, timestamp_ms: u64) -> SensorSnapshot {
    SensorSnapshot {
        temperature_c: raw.temperature_c,
        ph: ph::raw_to_ph(raw.ph_raw),
        tds_ppm: tds::raw_to_ppm(raw.tds_raw),
        turbidity_pct: turbidity::raw_to_percent(raw.turbidity_raw),
        timestamp_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPort(RawReadings);

    impl SensorPort for FixedPort {
        fn read_raw(&mut self) -> RawReadings {
            self.0
        }
    }

    #[test]
    fn sample_calibrates_every_channel() {
        let mut port = FixedPort(RawReadings {
            ph_raw: 2048,
            tds_raw: 0,
            turbidity_raw: 2800,
            temperature_c: 24.75,
        });
        let mut reader = SensorReader::new();
        let snap = reader.sample(&mut port, 1234);
        assert!((snap.ph - 7.0).abs() < 1e-4);
        assert_eq!(snap.tds_ppm, 0.0);
        assert_eq!(snap.turbidity_pct, 0.0);
        assert_eq!(snap.temperature_c, 24.75);
        assert_eq!(snap.timestamp_ms, 1234);
        assert_eq!(reader.sample_count(), 1);
    }

    #[test]
    fn open_thermocouple_passes_through_as_nan() {
        let snap = calibrate(
            &RawReadings {
                temperature_c: f32::NAN,
                ..Default::default()
            },
            0,
        );
        assert!(snap.temperature_c.is_nan());
    }

    #[test]
    fn feature_order_is_temp_ph_tds_turbidity() {
        let snap = SensorSnapshot {
            temperature_c: 1.0,
            ph: 2.0,
            tds_ppm: 3.0,
            turbidity_pct: 4.0,
            timestamp_ms: 0,
        };
        assert_eq!(snap.features(), [1.0, 2.0, 3.0, 4.0]);
    }
}
