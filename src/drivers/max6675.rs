//! MAX6675 K-type thermocouple converter (read-only SPI).
//!
//! ## Frame
//!
//! | bits  | meaning                          |
//! |-------|----------------------------------|
//! | 15    | dummy sign bit (always 0)        |
//! | 14..3 | temperature, 0.25 °C per count   |
//! | 2     | thermocouple input open          |
//! | 1..0  | device ID / state                |
//!
//! An open input reads as `NaN`, which the threshold monitor never
//! treats as over-temperature.

use embedded_hal::spi::SpiDevice;
use log::warn;

const OPEN_INPUT_BIT: u16 = 0b100;
const DEG_PER_COUNT: f32 = 0.25;

/// Decode one 16-bit frame.
pub fn decode_frame(frame: u16) -> f32 {
    if frame & OPEN_INPUT_BIT != 0 {
        return f32::NAN;
    }
    f32::from((frame >> 3) & 0x0FFF) * DEG_PER_COUNT
}

pub struct Max6675<SPI> {
    spi: SPI,
    open_reported: bool,
}

impl<SPI: SpiDevice> Max6675<SPI> {
    pub fn new(spi: SPI) -> Self {
        Self {
            spi,
            open_reported: false,
        }
    }

    /// Degrees Celsius, or `NaN` on an open thermocouple or bus error.
    pub fn read_celsius(&mut self) -> f32 {
        let mut buf = [0u8; 2];
        if self.spi.read(&mut buf).is_err() {
            warn!("MAX6675: SPI read failed");
            return f32::NAN;
        }
        let temp = decode_frame(u16::from_be_bytes(buf));
        if temp.is_nan() {
            if !self.open_reported {
                warn!("MAX6675: thermocouple input open");
                self.open_reported = true;
            }
        } else {
            self.open_reported = false;
        }
        temp
    }
}
