//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements          | Connects to                   |
//! |--------------|---------------------|-------------------------------|
//! | `cloud`      | TelemetrySink       | Firebase RTDB over HTTPS      |
//! | `hardware`   | SensorPort          | ESP32 ADC1, MAX6675           |
//! |              | InputPort           | Menu button GPIOs             |
//! | `http_relay` | RelayTransport      | Remote relay module (HTTP)    |
//! | `log_sink`   | EventSink           | Serial log output             |
//! | `nvs`        | ConfigPort          | NVS / in-memory store         |
//! | `sd_card`    | RecordStore         | FAT on SD card (SPI)          |
//! | `time`       | ClockPort           | ESP32 system timer, SNTP      |
//! | `wifi`       | NetworkPort         | ESP-IDF WiFi STA + portal AP  |
//!
//! The classifier port is served by
//! [`CentroidClassifier`](crate::classifier::CentroidClassifier) and the
//! display port by [`Lcd`](crate::drivers::lcd::Lcd).

pub mod cloud;
pub mod hardware;
pub mod http_relay;
pub mod log_sink;
pub mod nvs;
pub mod sd_card;
pub mod time;
pub mod wifi;
