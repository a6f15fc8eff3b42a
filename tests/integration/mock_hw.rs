//! Mock adapters for integration tests.
//!
//! Every port gets a recording double so tests can assert on the full
//! request / record / event history without touching real peripherals.
//! [`Rig`] owns one of each and lends them out as a [`Ports`] bundle.

use std::cell::{Cell, RefCell};

use aquasentry::alert_log::LogRecord;
use aquasentry::app::events::AppEvent;
use aquasentry::app::ports::{
    ButtonLevels, ClassScore, Classifier, ClassifierError, ClockPort, ConfigError, ConfigPort,
    DisplayPort, EventSink, InputPort, NetworkPort, Ports, RecordStore, RelayTransport,
    RequestFault, SensorPort, TelemetrySink,
};
use aquasentry::config::SystemConfig;
use aquasentry::error::{PublishError, StorageError};
use aquasentry::sensors::RawReadings;
use aquasentry::telemetry::TelemetryRecord;
use aquasentry::ui::Frame;

// ── Canned readings ───────────────────────────────────────────

/// pH 7.0, ~34 ppm, 0 % turbidity, 24 °C.  Inside every default limit.
pub const CLEAN: RawReadings = RawReadings {
    ph_raw: 2048,
    tds_raw: 100,
    turbidity_raw: 2800,
    temperature_c: 24.0,
};

/// Same as [`CLEAN`] but ~240 ppm dissolved solids (limit 150).
pub const HIGH_TDS: RawReadings = RawReadings {
    tds_raw: 800,
    ..CLEAN
};

// ── Sensors ───────────────────────────────────────────────────

pub struct MockSensors {
    pub raw: RawReadings,
    pub reads: u32,
}

impl SensorPort for MockSensors {
    fn read_raw(&mut self) -> RawReadings {
        self.reads += 1;
        self.raw
    }
}

// ── Relay transport ───────────────────────────────────────────

pub struct MockRelay {
    pub sent: Vec<String>,
    pub response: Result<u16, RequestFault>,
}

impl RelayTransport for MockRelay {
    fn get(&mut self, url: &str, _timeout_ms: u32) -> Result<u16, RequestFault> {
        self.sent.push(url.to_string());
        self.response
    }
}

// ── Record store ──────────────────────────────────────────────

pub struct MockStore {
    pub available: bool,
    pub fail_writes: bool,
    pub records: Vec<LogRecord>,
}

impl RecordStore for MockStore {
    fn is_available(&self) -> bool {
        self.available
    }

    fn append(&mut self, record: &LogRecord) -> Result<(), StorageError> {
        if !self.available {
            return Err(StorageError::Unavailable);
        }
        if self.fail_writes {
            return Err(StorageError::WriteFailed);
        }
        self.records.push(record.clone());
        Ok(())
    }
}

// ── Cloud ─────────────────────────────────────────────────────

pub struct MockCloud {
    pub ready: bool,
    pub outcome: Result<(), PublishError>,
    pub pushed: Vec<(String, TelemetryRecord)>,
}

impl TelemetrySink for MockCloud {
    fn is_ready(&self) -> bool {
        self.ready
    }

    fn push(&mut self, path: &str, record: &TelemetryRecord) -> Result<(), PublishError> {
        self.outcome?;
        self.pushed.push((path.to_string(), record.clone()));
        Ok(())
    }
}

// ── Classifier ────────────────────────────────────────────────

pub struct FixedClassifier {
    pub label: &'static str,
    pub fail: bool,
}

impl Classifier for FixedClassifier {
    fn scores(&mut self, _features: &[f32; 4]) -> Result<Vec<ClassScore>, ClassifierError> {
        if self.fail {
            return Err(ClassifierError);
        }
        Ok(vec![
            ClassScore { label: "Other", confidence: 0.1 },
            ClassScore { label: self.label, confidence: 0.9 },
        ])
    }
}

// ── Network ───────────────────────────────────────────────────

pub struct MockNetwork {
    pub connected: bool,
    pub ssid: &'static str,
    /// Connection state after a portal run.
    pub portal_connects: bool,
    pub portal_runs: u32,
}

impl NetworkPort for MockNetwork {
    fn is_connected(&self) -> bool {
        self.connected
    }

    fn ssid(&self) -> Option<String> {
        self.connected.then(|| self.ssid.to_string())
    }

    fn start_portal(&mut self, _timeout_secs: u32) -> bool {
        self.portal_runs += 1;
        self.connected = self.portal_connects;
        self.connected
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct MockClock {
    pub now_ms: Cell<u64>,
    pub unix: Cell<Option<i64>>,
}

impl ClockPort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn unix_time(&self) -> Option<i64> {
        self.unix.get()
    }
}

// ── UI ────────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockInput {
    pub levels: ButtonLevels,
}

impl InputPort for MockInput {
    fn levels(&mut self) -> ButtonLevels {
        self.levels
    }
}

#[derive(Default)]
pub struct MockDisplay {
    pub frames: Vec<Frame>,
}

impl MockDisplay {
    pub fn last(&self) -> &Frame {
        self.frames.last().expect("nothing drawn yet")
    }
}

impl DisplayPort for MockDisplay {
    fn show(&mut self, frame: &Frame) {
        self.frames.push(frame.clone());
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Config store ──────────────────────────────────────────────

#[derive(Default)]
pub struct MemConfigStore {
    pub saved: RefCell<Option<SystemConfig>>,
}

impl ConfigPort for MemConfigStore {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.saved.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        *self.saved.borrow_mut() = Some(config.clone());
        Ok(())
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// One of every mock, wired for the happy path: network up, card
/// present, cloud ready, relay answering 200.
pub struct Rig {
    pub sensors: MockSensors,
    pub relay: MockRelay,
    pub store: MockStore,
    pub cloud: MockCloud,
    pub classifier: FixedClassifier,
    pub network: MockNetwork,
    pub clock: MockClock,
    pub input: MockInput,
    pub display: MockDisplay,
    pub sink: RecordingSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new() -> Self {
        Self {
            sensors: MockSensors { raw: CLEAN, reads: 0 },
            relay: MockRelay { sent: Vec::new(), response: Ok(200) },
            store: MockStore { available: true, fail_writes: false, records: Vec::new() },
            cloud: MockCloud { ready: true, outcome: Ok(()), pushed: Vec::new() },
            classifier: FixedClassifier { label: "Clean", fail: false },
            network: MockNetwork {
                connected: true,
                ssid: "lab-net",
                portal_connects: true,
                portal_runs: 0,
            },
            clock: MockClock {
                now_ms: Cell::new(0),
                unix: Cell::new(Some(1_700_000_000)),
            },
            input: MockInput::default(),
            display: MockDisplay::default(),
            sink: RecordingSink::default(),
        }
    }

    pub fn ports(&mut self) -> Ports<'_> {
        Ports {
            sensors: &mut self.sensors,
            relay: &mut self.relay,
            store: &mut self.store,
            cloud: &mut self.cloud,
            classifier: &mut self.classifier,
            network: &mut self.network,
            clock: &self.clock,
            input: &mut self.input,
            display: &mut self.display,
            sink: &mut self.sink,
        }
    }

    pub fn set_time(&self, ms: u64) {
        self.clock.now_ms.set(ms);
    }

    /// Count emitted events matching `pred`.
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.sink.events.iter().filter(|e| pred(e)).count()
    }
}
