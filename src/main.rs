//! AquaSentry firmware entry point
//!
//! Hexagonal architecture around a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   ButtonPanel    Lcd          Esp32Time       │
//! │  (SensorPort)      (InputPort)    (Display)    (ClockPort)     │
//! │  HttpRelay         SdCardStore    CloudSink    WifiAdapter     │
//! │  (RelayTransport)  (RecordStore)  (Telemetry)  (NetworkPort)   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  Monitor · Relay · Alert log · Telemetry · Menu        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  NvsAdapter (ConfigPort, auto-save)                            │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::path::Path;

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::fs::fatfs::Fatfs;
use esp_idf_svc::hal::delay::{Delay, FreeRtos};
use esp_idf_svc::hal::gpio::AnyIOPin;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::spi::config::{Config as SpiConfig, DriverConfig};
use esp_idf_svc::hal::spi::{Dma, SpiDeviceDriver, SpiDriver};
use esp_idf_svc::io::vfs::MountedFatfs;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sd::spi::SdSpiHostDriver;
use esp_idf_svc::sd::{SdCardConfiguration, SdCardDriver};
use esp_idf_svc::wifi::{BlockingWifi, EspWifi};

use aquasentry::adapters::cloud::CloudSink;
use aquasentry::adapters::hardware::{ButtonPanel, HardwareAdapter};
use aquasentry::adapters::http_relay::HttpRelayTransport;
use aquasentry::adapters::log_sink::LogEventSink;
use aquasentry::adapters::nvs::NvsAdapter;
use aquasentry::adapters::sd_card::{MOUNT_POINT, SdCardStore};
use aquasentry::adapters::time::{Esp32TimeAdapter, start_sntp};
use aquasentry::adapters::wifi::WifiAdapter;
use aquasentry::app::events::AppEvent;
use aquasentry::app::ports::{ClockPort, ConfigPort, DisplayPort, EventSink, Ports};
use aquasentry::app::service::AppService;
use aquasentry::classifier::CentroidClassifier;
use aquasentry::config::SystemConfig;
use aquasentry::drivers::hw_init;
use aquasentry::drivers::lcd::Lcd;
use aquasentry::drivers::max6675::Max6675;
use aquasentry::error::Error;
use aquasentry::pins;
use aquasentry::ui::Frame;

/// Pause between loop passes.  Every cadence is far coarser than this.
const LOOP_IDLE_MS: u32 = 10;
const SPLASH_MS: u32 = 2000;

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  AquaSentry v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let mut log_sink = LogEventSink::new();

    // ── 2. Raw ADC + button GPIO ──────────────────────────────
    if let Err(e) = hw_init::init_peripherals() {
        // Without the probes there is nothing to monitor.
        error!("HAL init failed: {}; halting", e);
        #[allow(clippy::empty_loop)]
        loop {}
    }

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs_part = EspDefaultNvsPartition::take()?;
    let nvs = match NvsAdapter::new(nvs_part.clone()) {
        Ok(n) => Some(n),
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            None
        }
    };
    let config = match nvs.as_ref().map(ConfigPort::load) {
        Some(Ok(cfg)) => {
            info!("Config loaded from NVS");
            cfg
        }
        Some(Err(e)) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };

    let p = Peripherals::take()?;

    // ── 4. LCD + splash ───────────────────────────────────────
    let i2c = I2cDriver::new(
        p.i2c0,
        p.pins.gpio21,
        p.pins.gpio22,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    let mut lcd = Lcd::new(i2c, Delay::new_default(), pins::LCD_I2C_ADDR);
    if lcd.init().is_err() {
        warn!("LCD: init failed, continuing headless");
    }
    let version = format!("Water Monitor v{}", env!("CARGO_PKG_VERSION"));
    lcd.show(&Frame::message(&[version.as_str(), "Initializing..."]));
    FreeRtos::delay_ms(SPLASH_MS);

    // ── 5. Thermocouple (VSPI, read-only) ─────────────────────
    let thermo_bus = SpiDriver::new_without_sdo(
        p.spi3,
        p.pins.gpio18,
        p.pins.gpio19,
        &DriverConfig::new(),
    )?;
    let thermo_dev = SpiDeviceDriver::new(
        thermo_bus,
        Some(p.pins.gpio5),
        &SpiConfig::new().baudrate(1.MHz().into()),
    )?;
    let mut hw = HardwareAdapter::new(Max6675::new(thermo_dev));
    let mut buttons = ButtonPanel;

    // ── 6. SD card (HSPI) ─────────────────────────────────────
    let sd_mount = (move || -> Result<_> {
        let bus = SpiDriver::new(
            p.spi2,
            p.pins.gpio14,
            p.pins.gpio13,
            Some(p.pins.gpio12),
            &DriverConfig::default().dma(Dma::Auto(4096)),
        )?;
        let host = SdSpiHostDriver::new(
            bus,
            Some(p.pins.gpio15),
            AnyIOPin::none(),
            AnyIOPin::none(),
            AnyIOPin::none(),
            None,
        )?;
        let card = SdCardDriver::new_spi(host, &SdCardConfiguration::new())?;
        Ok(MountedFatfs::mount(Fatfs::new_sdcard(0, card)?, MOUNT_POINT, 4)?)
    })();
    let sd_mount = match sd_mount {
        Ok(m) => Some(m),
        Err(e) => {
            warn!("SD: mount failed ({})", e);
            log_sink.emit(&AppEvent::Degraded(Error::Init("sd card mount")));
            None
        }
    };
    let mut store = SdCardStore::new(Path::new(MOUNT_POINT), sd_mount.is_some());
    if sd_mount.is_some() {
        if let Err(e) = store.ensure_header() {
            warn!("SD: header write failed ({})", e);
        }
    }

    // ── 7. WiFi + SNTP ────────────────────────────────────────
    let sysloop = EspSystemEventLoop::take()?;
    let esp_wifi = EspWifi::new(p.modem, sysloop.clone(), Some(nvs_part))?;
    let mut wifi = WifiAdapter::new(BlockingWifi::wrap(esp_wifi, sysloop)?, &config.portal_ap_name);

    let have_credentials = if config.wifi.ssid.is_empty() {
        wifi.restore_stored_credentials()
    } else {
        wifi.set_credentials(&config.wifi.ssid, &config.wifi.password)
            .map_err(|e| warn!("WiFi: stored credentials invalid ({})", e))
            .is_ok()
    };
    let connected = have_credentials && wifi.connect().is_ok();
    if !connected {
        // Brief portal window at boot; the full one is in the menu.
        use aquasentry::app::ports::NetworkPort;
        if !wifi.start_portal(1) {
            warn!("WiFi: offline, use the menu to provision");
        }
    }

    let _sntp = match start_sntp(&config.ntp_server) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("SNTP start failed ({}), telemetry timestamps stay NA", e);
            None
        }
    };

    // ── 8. Remaining adapters ─────────────────────────────────
    let clock = Esp32TimeAdapter::new();
    let mut relay = HttpRelayTransport::new();
    let mut cloud = CloudSink::new(&config.cloud, config.telemetry_timeout_ms);
    let mut classifier = CentroidClassifier::default();

    // ── 9. App service ────────────────────────────────────────
    let mut app = AppService::new(config);
    {
        let mut ports = Ports {
            sensors: &mut hw,
            relay: &mut relay,
            store: &mut store,
            cloud: &mut cloud,
            classifier: &mut classifier,
            network: &mut wifi,
            clock: &clock,
            input: &mut buttons,
            display: &mut lcd,
            sink: &mut log_sink,
        };
        app.start(&mut ports);
    }

    info!("System ready. Entering main loop.");

    // ── 10. Main loop ─────────────────────────────────────────
    loop {
        wifi.poll(clock.uptime_ms());

        let mut ports = Ports {
            sensors: &mut hw,
            relay: &mut relay,
            store: &mut store,
            cloud: &mut cloud,
            classifier: &mut classifier,
            network: &mut wifi,
            clock: &clock,
            input: &mut buttons,
            display: &mut lcd,
            sink: &mut log_sink,
        };
        app.poll(&mut ports);

        // Config auto-save (5s debounce after last change).
        if let Some(nvs) = nvs.as_ref() {
            app.auto_save_if_needed(nvs, &mut log_sink, clock.uptime_ms());
        }

        FreeRtos::delay_ms(LOOP_IDLE_MS);
    }
}
