//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! [`HardwareAdapter`] owns the thermocouple driver and reads the probe
//! channels through [`hw_init`](crate::drivers::hw_init), exposing them
//! as [`SensorPort`].  [`ButtonPanel`] reads the menu buttons as
//! [`InputPort`].  On non-espidf targets the ADC and GPIO reads hit the
//! simulation stubs, so the same adapters run in host tests.

use embedded_hal::spi::SpiDevice;

use crate::app::ports::{ButtonLevels, InputPort, SensorPort};
use crate::drivers::hw_init::{adc1_read, gpio_read};
use crate::drivers::max6675::Max6675;
use crate::pins;
use crate::sensors::RawReadings;

/// Concrete adapter that combines the probes behind [`SensorPort`].
pub struct HardwareAdapter<SPI> {
    thermocouple: Max6675<SPI>,
}

impl<SPI: SpiDevice> HardwareAdapter<SPI> {
    pub fn new(thermocouple: Max6675<SPI>) -> Self {
        Self { thermocouple }
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<SPI: SpiDevice> SensorPort for HardwareAdapter<SPI> {
    fn read_raw(&mut self) -> RawReadings {
        RawReadings {
            ph_raw: adc1_read(pins::ADC1_CH_PH),
            tds_raw: adc1_read(pins::ADC1_CH_TDS),
            turbidity_raw: adc1_read(pins::ADC1_CH_TURBIDITY),
            temperature_c: self.thermocouple.read_celsius(),
        }
    }
}

// ── InputPort implementation ──────────────────────────────────

/// The four menu buttons on their GPIOs.
#[derive(Debug, Default)]
pub struct ButtonPanel;

impl InputPort for ButtonPanel {
    fn levels(&mut self) -> ButtonLevels {
        ButtonLevels {
            up: gpio_read(pins::BTN_UP_GPIO),
            down: gpio_read(pins::BTN_DOWN_GPIO),
            enter: gpio_read(pins::BTN_ENTER_GPIO),
            back: gpio_read(pins::BTN_BACK_GPIO),
        }
    }
}
