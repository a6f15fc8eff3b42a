//! Analog pH probe calibration.
//!
//! Linear model referenced to the ADC mid-scale: a reading of
//! [`NEUTRAL_OFFSET`] counts is pH 7, and every 59.16 mV away from it is one
//! pH unit (Nernst slope at 25 °C).

use super::{ADC_MAX, VREF};

/// ADC counts that correspond to pH 7.0.
pub const NEUTRAL_OFFSET: f32 = 2048.0;

/// Probe slope in millivolts per pH unit.
pub const MV_PER_PH: f32 = 59.16;

/// Convert a raw 12-bit ADC count into pH.  Out-of-range counts are
/// converted anyway; the result is not clamped to 0–14.
pub fn raw_to_ph(raw: u16) -> f32 {
    7.0 - ((NEUTRAL_OFFSET - f32::from(raw)) * VREF * 1000.0) / (MV_PER_PH * ADC_MAX)
}
