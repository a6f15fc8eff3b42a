//! Turbidity probe calibration.
//!
//! The probe output drops as water gets cloudier, so the mapping is an
//! inverse linear one: 0 counts → 100 %, 2800 counts → 0 %.  Integer
//! arithmetic with truncation toward zero, as the reference device does.

/// Raw count that reads as perfectly clear water.
pub const CLEAR_WATER_RAW: i32 = 2800;

/// Convert a raw 12-bit ADC count into a turbidity percentage in `[0, 100]`.
pub fn raw_to_percent(raw: u16) -> f32 {
    let raw = i32::from(raw);
    let mapped = (raw * -100) / CLEAR_WATER_RAW + 100;
    mapped.clamp(0, 100) as f32
}
