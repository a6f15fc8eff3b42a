//! Integration tests: AppService driven pass by pass against mock ports.

use aquasentry::app::events::AppEvent;
use aquasentry::app::ports::{ButtonLevels, RequestFault};
use aquasentry::app::service::{AppService, PassReport};
use aquasentry::config::{LoggingMode, SystemConfig};
use aquasentry::error::{Error, PublishError, TransportError};
use aquasentry::monitor::{ContaminationEvent, ContaminationState};
use aquasentry::telemetry::UNSYNCED_TIMESTAMP;
use aquasentry::ui::Screen;

use crate::mock_hw::{CLEAN, HIGH_TDS, MemConfigStore, Rig};

const ON_URL: &str = "http://192.168.117.53/on";
const OFF_URL: &str = "http://192.168.117.53/off";

fn started(config: SystemConfig) -> (AppService, Rig) {
    let mut rig = Rig::new();
    let mut app = AppService::new(config);
    app.start(&mut rig.ports());
    (app, rig)
}

fn tick(app: &mut AppService, rig: &mut Rig, t: u64) -> PassReport {
    rig.set_time(t);
    app.poll(&mut rig.ports())
}

fn on_threshold_config() -> SystemConfig {
    SystemConfig {
        logging_mode: LoggingMode::OnThreshold,
        ..Default::default()
    }
}

/// Press and release one button, 10 ms apart.
fn press(app: &mut AppService, rig: &mut Rig, levels: ButtonLevels, t: u64) {
    rig.input.levels = levels;
    tick(app, rig, t);
    rig.input.levels = ButtonLevels::default();
    tick(app, rig, t + 10);
}

const UP: ButtonLevels = ButtonLevels { up: true, down: false, enter: false, back: false };
const DOWN: ButtonLevels = ButtonLevels { up: false, down: true, enter: false, back: false };
const ENTER: ButtonLevels = ButtonLevels { up: false, down: false, enter: true, back: false };

// ── Lifecycle ─────────────────────────────────────────────────

#[test]
fn start_samples_once_without_evaluating() {
    let mut rig = Rig::new();
    rig.sensors.raw = HIGH_TDS;
    let mut app = AppService::new(SystemConfig::default());
    app.start(&mut rig.ports());

    assert_eq!(rig.sensors.reads, 1);
    assert_eq!(app.contamination_state(), ContaminationState::Clean);
    assert!(rig.relay.sent.is_empty());
    assert!(matches!(rig.sink.events[0], AppEvent::Started(_)));
    assert_eq!(rig.display.last().line(0), "> Sensor Readings");
}

#[test]
fn nothing_is_due_before_first_interval() {
    let (mut app, mut rig) = started(SystemConfig::default());
    let report = tick(&mut app, &mut rig, 999);
    assert!(!report.sampled);
    assert_eq!(report.records_logged, 0);
    assert!(report.telemetry.is_none());
}

// ── Edge-triggered relay control ──────────────────────────────

#[test]
fn contamination_cycle_sends_one_on_and_one_off() {
    let (mut app, mut rig) = started(SystemConfig::default());

    tick(&mut app, &mut rig, 1000);
    assert!(rig.relay.sent.is_empty());

    rig.sensors.raw = HIGH_TDS;
    let report = tick(&mut app, &mut rig, 2000);
    assert_eq!(report.event, Some(ContaminationEvent::BecameContaminated));
    assert_eq!(report.relay, Some(Ok(())));
    assert!(app.relay_on());

    // Level stays high: no further requests.
    let report = tick(&mut app, &mut rig, 3000);
    assert_eq!(report.event, Some(ContaminationEvent::NoChange));
    assert!(report.relay.is_none());

    rig.sensors.raw = CLEAN;
    let report = tick(&mut app, &mut rig, 4000);
    assert_eq!(report.event, Some(ContaminationEvent::BecameClean));

    assert_eq!(rig.relay.sent, [ON_URL, OFF_URL]);
    assert!(!app.relay_on());
    assert_eq!(
        rig.count(|e| matches!(e, AppEvent::Transition { .. })),
        2
    );
}

#[test]
fn offline_contamination_sends_nothing() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.network.connected = false;
    rig.sensors.raw = HIGH_TDS;

    let report = tick(&mut app, &mut rig, 1000);

    assert_eq!(report.relay, Some(Err(TransportError::Unreachable)));
    assert!(rig.relay.sent.is_empty());
    assert_eq!(app.contamination_state(), ContaminationState::Contaminated);
    assert!(!app.relay_on());
    assert_eq!(
        rig.count(|e| matches!(e, AppEvent::Degraded(Error::Transport(TransportError::Unreachable)))),
        1
    );
}

#[test]
fn failed_relay_does_not_block_logging_or_telemetry() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.relay.response = Err(RequestFault::Timeout);
    for t in [1000, 2000, 3000, 4000] {
        tick(&mut app, &mut rig, t);
    }
    let logged_before = rig.store.records.len();

    rig.sensors.raw = HIGH_TDS;
    let report = tick(&mut app, &mut rig, 5000);

    assert_eq!(report.relay, Some(Err(TransportError::CommandFailed)));
    assert_eq!(report.records_logged, 1);
    assert_eq!(rig.store.records.len(), logged_before + 1);
    assert!(report.status_reported);
    assert_eq!(report.telemetry, Some(Ok(())));
    assert_eq!(rig.relay.sent, [ON_URL]);
    assert!(!app.relay_on());
}

#[test]
fn zero_status_counts_as_failure() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.relay.response = Ok(0);
    rig.sensors.raw = HIGH_TDS;
    let report = tick(&mut app, &mut rig, 1000);
    assert_eq!(report.relay, Some(Err(TransportError::CommandFailed)));
    assert!(!app.relay_on());
}

#[test]
fn retry_budget_bounds_requests() {
    let config = SystemConfig {
        relay_max_attempts: 3,
        ..Default::default()
    };
    let (mut app, mut rig) = started(config);
    rig.relay.response = Err(RequestFault::Io);
    rig.sensors.raw = HIGH_TDS;
    tick(&mut app, &mut rig, 1000);
    assert_eq!(rig.relay.sent.len(), 3);
    assert_eq!(app.relay_requests(), 3);
}

// ── Alert logging ─────────────────────────────────────────────

#[test]
fn on_threshold_mode_logs_one_record_per_episode() {
    let (mut app, mut rig) = started(on_threshold_config());
    rig.classifier.label = "Chemical";

    rig.sensors.raw = HIGH_TDS;
    for t in [1000, 2000, 3000] {
        tick(&mut app, &mut rig, t);
    }
    rig.sensors.raw = CLEAN;
    tick(&mut app, &mut rig, 4000);

    assert_eq!(rig.store.records.len(), 1);
    let record = &rig.store.records[0];
    assert_eq!(record.time_ms, 1000);
    assert_eq!(record.label, "Chemical");
    assert_eq!(
        rig.count(|e| matches!(e, AppEvent::RecordLogged { on_threshold: true, .. })),
        1
    );
}

#[test]
fn continuous_mode_logs_every_interval_and_never_on_edges() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.sensors.raw = HIGH_TDS;
    for t in [1000, 2000, 3000] {
        tick(&mut app, &mut rig, t);
    }
    assert_eq!(rig.store.records.len(), 3);
    assert_eq!(
        rig.count(|e| matches!(e, AppEvent::RecordLogged { on_threshold: true, .. })),
        0
    );
}

#[test]
fn missing_card_is_silent() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.store.available = false;
    rig.sensors.raw = HIGH_TDS;
    for t in [1000, 2000] {
        tick(&mut app, &mut rig, t);
    }
    assert!(rig.store.records.is_empty());
    assert_eq!(rig.count(|e| matches!(e, AppEvent::Degraded(Error::Storage(_)))), 0);
}

#[test]
fn write_failure_is_reported() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.store.fail_writes = true;
    let report = tick(&mut app, &mut rig, 1000);
    assert_eq!(report.records_logged, 0);
    assert_eq!(rig.count(|e| matches!(e, AppEvent::Degraded(Error::Storage(_)))), 1);
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_waits_for_network_without_losing_its_slot() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.network.connected = false;
    let report = tick(&mut app, &mut rig, 5000);
    assert!(report.telemetry.is_none());

    rig.network.connected = true;
    let report = tick(&mut app, &mut rig, 5100);
    assert_eq!(report.telemetry, Some(Ok(())));
    let (path, record) = &rig.cloud.pushed[0];
    assert_eq!(path, "/sensor_data");
    assert_eq!(record.timestamp, "2023-11-14T22:13:20Z");
}

#[test]
fn unsynced_clock_publishes_placeholder_timestamp() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.clock.unix.set(None);
    let report = tick(&mut app, &mut rig, 5000);
    assert_eq!(report.telemetry, Some(Ok(())));
    assert_eq!(rig.cloud.pushed[0].1.timestamp, UNSYNCED_TIMESTAMP);
    assert_eq!(rig.count(|e| matches!(e, AppEvent::Degraded(Error::TimeUnsynchronized))), 1);
}

#[test]
fn rejected_push_is_dropped_not_retried() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.cloud.outcome = Err(PublishError::Rejected(401));
    let report = tick(&mut app, &mut rig, 5000);
    assert_eq!(report.telemetry, Some(Err(PublishError::Rejected(401))));

    rig.cloud.outcome = Ok(());
    let report = tick(&mut app, &mut rig, 6000);
    assert!(report.telemetry.is_none());
}

// ── Classifier ────────────────────────────────────────────────

#[test]
fn classifier_failure_keeps_previous_label() {
    let (mut app, mut rig) = started(SystemConfig::default());
    tick(&mut app, &mut rig, 1000);
    assert_eq!(app.label(), "Clean");

    rig.classifier.fail = true;
    tick(&mut app, &mut rig, 2000);
    assert_eq!(app.label(), "Clean");
    assert_eq!(rig.count(|e| matches!(e, AppEvent::Degraded(Error::Classifier))), 1);
}

// ── Menu ──────────────────────────────────────────────────────

#[test]
fn manual_relay_through_menu_sends_two_requests_and_no_records() {
    let (mut app, mut rig) = started(on_threshold_config());

    // Main → Remote Relay → RelayControl → Turn ON
    press(&mut app, &mut rig, DOWN, 100);
    press(&mut app, &mut rig, DOWN, 200);
    press(&mut app, &mut rig, ENTER, 300);
    assert_eq!(app.menu().screen(), Screen::Relay);
    press(&mut app, &mut rig, ENTER, 400);
    assert_eq!(rig.display.last().line(2), "> Turn ON");
    press(&mut app, &mut rig, ENTER, 500);
    assert!(app.relay_on());
    assert_eq!(rig.display.last().line(2), "Status: ON");

    // RelayControl now preselects Turn OFF.
    press(&mut app, &mut rig, ENTER, 600);
    assert_eq!(rig.display.last().line(3), "> Turn OFF");
    press(&mut app, &mut rig, ENTER, 700);

    assert_eq!(rig.relay.sent, [ON_URL, OFF_URL]);
    assert!(rig.store.records.is_empty());
    assert_eq!(
        rig.count(|e| matches!(e, AppEvent::RelayCommanded { manual: true, .. })),
        2
    );
    assert_eq!(app.contamination_state(), ContaminationState::Clean);
}

#[test]
fn logging_mode_edit_is_auto_saved_after_quiet_period() {
    let (mut app, mut rig) = started(SystemConfig::default());
    let nvs = MemConfigStore::default();

    press(&mut app, &mut rig, DOWN, 100);
    press(&mut app, &mut rig, ENTER, 200);
    assert_eq!(app.menu().screen(), Screen::Logging);
    assert_eq!(rig.display.last().line(2), "> Continuous");
    press(&mut app, &mut rig, DOWN, 300);
    press(&mut app, &mut rig, ENTER, 400);

    assert_eq!(app.config().logging_mode, LoggingMode::OnThreshold);
    assert_eq!(app.menu().screen(), Screen::Main);
    assert_eq!(rig.count(|e| matches!(e, AppEvent::ConfigChanged)), 1);

    assert!(!app.auto_save_if_needed(&nvs, &mut rig.sink, 4_000));
    assert!(app.auto_save_if_needed(&nvs, &mut rig.sink, 5_400));
    let saved = nvs.saved.borrow().clone().unwrap();
    assert_eq!(saved.logging_mode, LoggingMode::OnThreshold);
}

#[test]
fn threshold_edit_changes_next_evaluation() {
    let (mut app, mut rig) = started(SystemConfig::default());

    // Main → Edit Thresholds, move to TDS, raise it well past the reading.
    press(&mut app, &mut rig, UP, 100);
    press(&mut app, &mut rig, UP, 200);
    press(&mut app, &mut rig, ENTER, 300);
    assert_eq!(app.menu().screen(), Screen::Thresholds);
    press(&mut app, &mut rig, ENTER, 400);
    press(&mut app, &mut rig, ENTER, 500);
    assert_eq!(rig.display.last().line(2), ">TDS:     150");
    for i in 0..10 {
        press(&mut app, &mut rig, UP, 600 + i * 60);
    }
    assert_eq!(app.config().thresholds.tds_max, 250.0);

    rig.sensors.raw = HIGH_TDS;
    let report = tick(&mut app, &mut rig, 2100);
    assert_eq!(report.event, Some(ContaminationEvent::NoChange));
    assert!(rig.relay.sent.is_empty());
}

#[test]
fn portal_shows_result_then_returns_to_main() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.network.connected = false;

    press(&mut app, &mut rig, UP, 100);
    press(&mut app, &mut rig, ENTER, 200);
    assert_eq!(rig.display.last().line(2), "Not Connected.");
    press(&mut app, &mut rig, ENTER, 300);

    assert_eq!(rig.network.portal_runs, 1);
    assert_eq!(app.menu().screen(), Screen::Main);
    assert_eq!(rig.display.last().line(0), "WiFi Connected!");
    assert!(rig
        .display
        .frames
        .iter()
        .any(|f| f.line(0) == "Starting Portal..." && f.line(1) == "AP: WaterMonitorSetup"));

    // Notice is held, then the main menu comes back.
    tick(&mut app, &mut rig, 1500);
    assert_eq!(rig.display.last().line(0), "WiFi Connected!");
    tick(&mut app, &mut rig, 2400);
    assert_eq!(rig.display.last().line(0), "> Sensor Readings");
}

#[test]
fn portal_timeout_is_shown() {
    let (mut app, mut rig) = started(SystemConfig::default());
    rig.network.connected = false;
    rig.network.portal_connects = false;

    press(&mut app, &mut rig, UP, 100);
    press(&mut app, &mut rig, ENTER, 200);
    press(&mut app, &mut rig, ENTER, 300);

    assert_eq!(rig.display.last().line(0), "Portal Timed Out");
    assert!(!app.relay_on());
}
