//! Total dissolved solids probe calibration.
//!
//! Cubic conductivity fit over the probe voltage, scaled by a flat 0.5
//! temperature-compensation factor and clamped at zero.

use super::{ADC_MAX, VREF};

/// Flat compensation factor applied to the cubic fit.
pub const COMPENSATION: f32 = 0.5;

/// Convert a raw 12-bit ADC count into ppm.  Never negative.
pub fn raw_to_ppm(raw: u16) -> f32 {
    let v = f32::from(raw) * VREF / ADC_MAX;
    let fit = 133.42 * v * v * v - 255.86 * v * v + 857.39 * v;
    (fit * COMPENSATION).max(0.0)
}
