//! Full-stack runs with the host simulation adapters instead of mocks.
//!
//! ADC counts are injected through `hw_init::sim_set_adc`; the relay,
//! SD card, cloud and WiFi adapters run their non-espidf backends.

use core::convert::Infallible;
use std::path::PathBuf;

use embedded_hal::spi::{ErrorType, Operation, SpiDevice};

use aquasentry::adapters::cloud::CloudSink;
use aquasentry::adapters::hardware::{ButtonPanel, HardwareAdapter};
use aquasentry::adapters::http_relay::HttpRelayTransport;
use aquasentry::adapters::log_sink::LogEventSink;
use aquasentry::adapters::nvs::NvsAdapter;
use aquasentry::adapters::sd_card::SdCardStore;
use aquasentry::adapters::wifi::WifiAdapter;
use aquasentry::alert_log::CSV_HEADER;
use aquasentry::app::ports::{ClockPort, ConfigPort, Ports};
use aquasentry::app::service::AppService;
use aquasentry::classifier::CentroidClassifier;
use aquasentry::config::{CloudConfig, LoggingMode, SystemConfig};
use aquasentry::drivers::hw_init::{self, sim_set_adc};
use aquasentry::drivers::max6675::Max6675;
use aquasentry::monitor::ContaminationState;
use aquasentry::pins;

use crate::mock_hw::{MockClock, MockDisplay};

/// Thermocouple frame for 24 °C.
struct Thermo;

impl ErrorType for Thermo {
    type Error = Infallible;
}

impl SpiDevice for Thermo {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Infallible> {
        let frame: u16 = 96 << 3;
        for op in operations {
            if let Operation::Read(buf) = op {
                buf.copy_from_slice(&frame.to_be_bytes()[..buf.len()]);
            }
        }
        Ok(())
    }
}

fn scratch_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("aquasentry-sim-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

// One test owns the process-global sim ADC.
#[test]
fn simulated_device_runs_an_alert_episode() {
    hw_init::init_peripherals().unwrap();
    sim_set_adc(pins::ADC1_CH_PH, 2048);
    sim_set_adc(pins::ADC1_CH_TDS, 100);
    sim_set_adc(pins::ADC1_CH_TURBIDITY, 2800);

    let nvs = NvsAdapter::new();
    let mut config = nvs.load().unwrap();
    config.logging_mode = LoggingMode::OnThreshold;

    let mut hw = HardwareAdapter::new(Max6675::new(Thermo));
    let mut buttons = ButtonPanel;
    let mut relay = HttpRelayTransport::new();
    let dir = scratch_dir();
    let mut store = SdCardStore::new(&dir, true);
    let mut cloud = CloudSink::new(&config.cloud, config.telemetry_timeout_ms);
    let mut classifier = CentroidClassifier::default();
    let mut wifi = WifiAdapter::new(&config.portal_ap_name);
    wifi.set_credentials("lab-net", "password1").unwrap();
    wifi.connect().unwrap();
    let clock = MockClock {
        now_ms: Default::default(),
        unix: std::cell::Cell::new(Some(1_700_000_000)),
    };
    let mut display = MockDisplay::default();
    let mut sink = LogEventSink::new();

    let mut app = AppService::new(config.clone());
    macro_rules! ports {
        () => {
            Ports {
                sensors: &mut hw,
                relay: &mut relay,
                store: &mut store,
                cloud: &mut cloud,
                classifier: &mut classifier,
                network: &mut wifi,
                clock: &clock,
                input: &mut buttons,
                display: &mut display,
                sink: &mut sink,
            }
        };
    }
    app.start(&mut ports!());
    assert_eq!(app.latest().temperature_c, 24.0);

    let mut step = |app: &mut AppService, t: u64| {
        clock.now_ms.set(t);
        app.poll(&mut ports!());
    };

    step(&mut app, 1000);
    assert_eq!(app.label(), "Clean");

    sim_set_adc(pins::ADC1_CH_TDS, 800);
    step(&mut app, 2000);
    step(&mut app, 3000);
    assert_eq!(app.contamination_state(), ContaminationState::Contaminated);

    sim_set_adc(pins::ADC1_CH_TDS, 100);
    step(&mut app, 4000);
    step(&mut app, 5000);
    drop(step);

    assert_eq!(app.contamination_state(), ContaminationState::Clean);
    assert_eq!(
        relay.sim_sent(),
        ["http://192.168.117.53/on", "http://192.168.117.53/off"]
    );

    let csv = std::fs::read_to_string(store.path()).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], CSV_HEADER);
    assert!(lines[1].starts_with("2000,24.00,7.00,"));

    // No cloud settings were stored: the built-in instance is used.
    let expected_url = format!(
        "{}/sensor_data.json",
        CloudConfig::default().database_url.trim_end_matches('/')
    );
    assert_eq!(cloud.sim_pushed().len(), 1);
    assert!(cloud.sim_pushed()[0].0.starts_with(&expected_url));
    assert!(sink.emitted() > 0);
    assert!(clock.uptime_ms() == 5000);

    // First minute of uptime, one pass per second.
    for t in (6000..=60_000).step_by(1000) {
        clock.now_ms.set(t);
        app.poll(&mut ports!());
    }
    assert_eq!(cloud.sim_pushed().len(), 12);
    assert!(cloud.sim_pushed().iter().all(|(url, _)| url.starts_with(&expected_url)));

    // Persist the edited config and read it back.
    nvs.save(&config).unwrap();
    let reloaded: SystemConfig = nvs.load().unwrap();
    assert_eq!(reloaded.logging_mode, LoggingMode::OnThreshold);
}
