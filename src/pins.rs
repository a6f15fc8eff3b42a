//! GPIO / peripheral pin assignments for the monitor board (ESP32 DevKit).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Water-quality probes, analog (ADC1)
// ---------------------------------------------------------------------------

/// pH probe amplifier.  ADC1 channel 6.
pub const PH_ADC_GPIO: i32 = 34;
/// TDS probe.  ADC1 channel 7.
pub const TDS_ADC_GPIO: i32 = 35;
/// Turbidity probe.  ADC1 channel 4.
pub const TURBIDITY_ADC_GPIO: i32 = 32;

pub const ADC1_CH_PH: u32 = 6;
pub const ADC1_CH_TDS: u32 = 7;
pub const ADC1_CH_TURBIDITY: u32 = 4;

// ---------------------------------------------------------------------------
// Thermocouple (MAX6675 on VSPI, read-only)
// ---------------------------------------------------------------------------

pub const THERMO_SCK_GPIO: i32 = 18;
pub const THERMO_CS_GPIO: i32 = 5;
pub const THERMO_SO_GPIO: i32 = 19;

// ---------------------------------------------------------------------------
// SD card (HSPI)
// ---------------------------------------------------------------------------

pub const SD_SCLK_GPIO: i32 = 14;
pub const SD_MISO_GPIO: i32 = 12;
pub const SD_MOSI_GPIO: i32 = 13;
pub const SD_CS_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// I²C bus (20x4 character LCD behind a PCF8574 backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;
pub const LCD_I2C_ADDR: u8 = 0x27;

// ---------------------------------------------------------------------------
// Menu buttons (active HIGH, external pull-downs)
// ---------------------------------------------------------------------------

pub const BTN_UP_GPIO: i32 = 26;
pub const BTN_DOWN_GPIO: i32 = 25;
pub const BTN_ENTER_GPIO: i32 = 33;
pub const BTN_BACK_GPIO: i32 = 27;

pub const BUTTON_GPIOS: [i32; 4] = [BTN_UP_GPIO, BTN_DOWN_GPIO, BTN_ENTER_GPIO, BTN_BACK_GPIO];
