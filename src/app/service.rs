//! Application service: the hexagonal core.
//!
//! [`AppService`] owns every piece of mutable device state: the threshold
//! monitor, the relay controller, the latest snapshot and label, the menu
//! and the live configuration.  All I/O flows through the [`Ports`]
//! bundle injected at each call, making the entire service testable with
//! mock adapters.
//!
//! ```text
//!   SensorPort ──▶ ┌──────────────────────────────┐ ──▶ RelayTransport
//!   Classifier ──▶ │          AppService          │ ──▶ RecordStore
//!    InputPort ──▶ │ Monitor · Relay · Publisher  │ ──▶ TelemetrySink
//!    ClockPort ──▶ │     Cadences · Menu          │ ──▶ DisplayPort
//!                  └──────────────────────────────┘ ──▶ EventSink
//! ```
//!
//! Each responsibility in a pass is isolated: a relay, storage or
//! publish failure is reported as [`AppEvent::Degraded`] and the rest of
//! the pass still runs.

use log::{info, warn};

use crate::alert_log::{AlertLogPolicy, LogRecord};
use crate::classifier::{self, INITIAL_LABEL};
use crate::config::SystemConfig;
use crate::drivers::button::ButtonBank;
use crate::error::{Error, PublishError, TransportError};
use crate::monitor::{ContaminationEvent, ContaminationState, ThresholdMonitor};
use crate::relay::RelayController;
use crate::scheduler::Cadences;
use crate::sensors::{SensorReader, SensorSnapshot};
use crate::telemetry::TelemetryPublisher;
use crate::ui::{Frame, Menu, MenuView, Screen};

use super::commands::AppCommand;
use super::events::{AppEvent, StatusReport};
use super::ports::{ConfigPort, EventSink, Ports};

/// Quiet period after the last config edit before it is persisted.
const AUTO_SAVE_DELAY_MS: u64 = 5_000;
/// How long a portal result notice stays on screen.
const NOTICE_HOLD_MS: u64 = 2_000;

// ───────────────────────────────────────────────────────────────
// Pass report
// ───────────────────────────────────────────────────────────────

/// What one [`AppService::poll`] pass did.  `None` means the
/// responsibility was not due (or its gate was closed).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    pub presses: usize,
    pub sampled: bool,
    pub event: Option<ContaminationEvent>,
    pub relay: Option<Result<(), TransportError>>,
    pub records_logged: u8,
    pub status_reported: bool,
    pub telemetry: Option<Result<(), PublishError>>,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: SystemConfig,
    reader: SensorReader,
    monitor: ThresholdMonitor,
    relay: RelayController,
    publisher: TelemetryPublisher,
    cadences: Cadences,
    buttons: ButtonBank,
    menu: Menu,
    latest: SensorSnapshot,
    label: &'static str,
    records_logged: u32,
    config_dirty: bool,
    dirty_since_ms: u64,
    /// Deferred redraw after a transient notice.
    redraw_at_ms: Option<u64>,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch any port; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            reader: SensorReader::new(),
            monitor: ThresholdMonitor::new(),
            relay: RelayController::new(&config),
            publisher: TelemetryPublisher::new(&config.telemetry_path),
            cadences: Cadences::from_config(&config),
            buttons: ButtonBank::new(config.debounce_ms),
            menu: Menu::new(),
            latest: SensorSnapshot::default(),
            label: INITIAL_LABEL,
            records_logged: 0,
            config_dirty: false,
            dirty_since_ms: 0,
            redraw_at_ms: None,
            config,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Take the boot-time reading and draw the main menu.  The reading
    /// is not evaluated; the first evaluation happens on the first
    /// sampling tick.
    pub fn start(&mut self, ports: &mut Ports<'_>) {
        let now = ports.clock.uptime_ms();
        self.latest = self.reader.sample(ports.sensors, now);
        self.redraw(ports);
        ports.sink.emit(&AppEvent::Started(self.latest));
        info!(
            "AppService started: relay host {}, logging {}",
            self.config.relay_host,
            self.config.logging_mode.label()
        );
    }

    // ── Per-pass orchestration ────────────────────────────────

    /// Run one pass of the cooperative loop: buttons, then every cadence
    /// that is due, in a fixed order.
    pub fn poll(&mut self, ports: &mut Ports<'_>) -> PassReport {
        let mut report = PassReport::default();
        let now = ports.clock.uptime_ms();

        // 1. Buttons → menu → commands
        let presses = self.buttons.poll(ports.input.levels(), now);
        report.presses = presses.len();
        for button in presses {
            let cmd = self
                .menu
                .handle(button, self.relay.relay_state(), self.config.logging_mode);
            if let Some(cmd) = cmd {
                if let Some(outcome) = self.handle_command(cmd, ports) {
                    report.relay = Some(outcome);
                }
            }
        }
        if report.presses > 0 && self.redraw_at_ms.is_none() {
            self.redraw(ports);
        }

        // 2. Sampling → classification → threshold evaluation
        if self.cadences.sampling.is_due(now) {
            self.sample_and_evaluate(ports, now, &mut report);
        }

        // 3. Continuous logging
        let storage_available = ports.store.is_available();
        if AlertLogPolicy::continuous_enabled(self.config.logging_mode, storage_available)
            && self.cadences.continuous_log.is_due(now)
            && self.write_record(ports, now, false)
        {
            report.records_logged += 1;
        }

        // 4. Status report
        if self.cadences.status.is_due(now) {
            let status = self.build_status(ports);
            ports.sink.emit(&AppEvent::Status(status));
            report.status_reported = true;
        }

        // 5. Telemetry
        if ports.network.is_connected()
            && ports.cloud.is_ready()
            && self.cadences.telemetry.is_due(now)
        {
            report.telemetry = Some(self.publish(ports));
        }

        // 6. Deferred redraw after a notice
        if self.redraw_at_ms.is_some_and(|at| now >= at) {
            self.redraw_at_ms = None;
            self.redraw(ports);
        }

        report
    }

    fn sample_and_evaluate(&mut self, ports: &mut Ports<'_>, now: u64, report: &mut PassReport) {
        self.latest = self.reader.sample(ports.sensors, now);
        report.sampled = true;

        match classifier::classify(ports.classifier, &self.latest.features()) {
            Some(label) => self.label = label,
            None => ports.sink.emit(&AppEvent::Degraded(Error::Classifier)),
        }

        if self.menu.screen() == Screen::Readings && self.redraw_at_ms.is_none() {
            self.redraw(ports);
        }

        let event = self.monitor.evaluate(&self.latest, &self.config.thresholds);
        report.event = Some(event);
        if !event.is_transition() {
            return;
        }

        ports.sink.emit(&AppEvent::Transition {
            event,
            violations: self.monitor.last_violations(),
            snapshot: self.latest,
        });

        let turn_on = event == ContaminationEvent::BecameContaminated;
        report.relay = Some(self.command_relay(ports, turn_on, false));

        if AlertLogPolicy::should_log(event, self.config.logging_mode, ports.store.is_available())
            && self.write_record(ports, now, true)
        {
            report.records_logged += 1;
        }
    }

    fn command_relay(
        &mut self,
        ports: &mut Ports<'_>,
        turn_on: bool,
        manual: bool,
    ) -> Result<(), TransportError> {
        let outcome = self.relay.set_relay(&*ports.network, &mut *ports.relay, turn_on);
        ports.sink.emit(&AppEvent::RelayCommanded {
            on: turn_on,
            manual,
            outcome,
        });
        if let Err(e) = outcome {
            ports.sink.emit(&AppEvent::Degraded(e.into()));
        }
        outcome
    }

    /// Append one CSV record from the latest snapshot.  Returns `true`
    /// when the store accepted it.
    fn write_record(&mut self, ports: &mut Ports<'_>, now: u64, on_threshold: bool) -> bool {
        let record = LogRecord::new(now, &self.latest, self.label);
        match ports.store.append(&record) {
            Ok(()) => {
                self.records_logged = self.records_logged.saturating_add(1);
                ports.sink.emit(&AppEvent::RecordLogged {
                    time_ms: now,
                    on_threshold,
                });
                true
            }
            Err(e) => {
                warn!("Record log append failed: {}", e);
                ports.sink.emit(&AppEvent::Degraded(e.into()));
                false
            }
        }
    }

    fn publish(&mut self, ports: &mut Ports<'_>) -> Result<(), PublishError> {
        let unix_time = ports.clock.unix_time();
        if unix_time.is_none() {
            ports.sink.emit(&AppEvent::Degraded(Error::TimeUnsynchronized));
        }
        let outcome = self
            .publisher
            .publish(ports.cloud, &self.latest, self.label, unix_time);
        match outcome {
            Ok(()) => ports.sink.emit(&AppEvent::TelemetryPublished {
                timestamp: crate::telemetry::format_timestamp(unix_time),
            }),
            Err(e) => ports.sink.emit(&AppEvent::Degraded(e.into())),
        }
        outcome
    }

    // ── Command handling ──────────────────────────────────────

    /// Process a command from the menu or another adapter.  Returns the
    /// relay outcome when the command drove the relay.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        ports: &mut Ports<'_>,
    ) -> Option<Result<(), TransportError>> {
        let now = ports.clock.uptime_ms();
        match cmd {
            AppCommand::SetRelay(on) => {
                info!("Manual relay command: {}", if on { "ON" } else { "OFF" });
                return Some(self.command_relay(ports, on, true));
            }
            AppCommand::SetLoggingMode(mode) => {
                self.config.logging_mode = mode;
                info!("Logging mode set to {}", mode.label());
                self.mark_config_dirty(now);
                ports.sink.emit(&AppEvent::ConfigChanged);
            }
            AppCommand::AdjustThreshold(field, direction) => {
                let step = self.config.threshold_steps.for_field(field);
                self.config.thresholds.adjust(field, direction.sign() * step);
                self.mark_config_dirty(now);
                ports.sink.emit(&AppEvent::ConfigChanged);
            }
            AppCommand::StartProvisioning => {
                self.run_portal(ports);
            }
        }
        None
    }

    /// Blocking provisioning portal.  Leaves the result notice on screen
    /// for a moment before the main menu comes back.
    fn run_portal(&mut self, ports: &mut Ports<'_>) {
        let ap_line = format!("AP: {}", self.config.portal_ap_name);
        ports
            .display
            .show(&Frame::message(&["Starting Portal...", &ap_line]));
        let connected = ports.network.start_portal(self.config.portal_timeout_secs);
        if connected {
            info!("Provisioning portal: connected");
            ports.display.show(&Frame::message(&["WiFi Connected!"]));
        } else {
            warn!("Provisioning portal timed out");
            ports.display.show(&Frame::message(&["Portal Timed Out"]));
        }
        self.menu.go_main();
        self.redraw_at_ms = Some(ports.clock.uptime_ms() + NOTICE_HOLD_MS);
    }

    // ── Display ───────────────────────────────────────────────

    fn redraw(&self, ports: &mut Ports<'_>) {
        let ssid = if ports.network.is_connected() {
            ports.network.ssid()
        } else {
            None
        };
        let view = MenuView {
            snapshot: &self.latest,
            thresholds: &self.config.thresholds,
            logging_mode: self.config.logging_mode,
            relay_on: self.relay.relay_state(),
            storage_available: ports.store.is_available(),
            ssid: ssid.as_deref(),
        };
        ports.display.show(&self.menu.render(&view));
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build the periodic status report.
    pub fn build_status(&self, ports: &Ports<'_>) -> StatusReport {
        StatusReport {
            snapshot: self.latest,
            label: self.label.to_string(),
            logging_mode: self.config.logging_mode,
            relay_on: self.relay.relay_state(),
            storage_available: ports.store.is_available(),
            network: if ports.network.is_connected() {
                ports.network.ssid()
            } else {
                None
            },
            thresholds: self.config.thresholds,
        }
    }

    pub fn contamination_state(&self) -> ContaminationState {
        self.monitor.state()
    }

    /// Last commanded relay state.
    pub fn relay_on(&self) -> bool {
        self.relay.relay_state()
    }

    /// Relay requests put on the wire since boot.
    pub fn relay_requests(&self) -> u32 {
        self.relay.requests_sent()
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn latest(&self) -> &SensorSnapshot {
        &self.latest
    }

    pub fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Records accepted by the store since boot.
    pub fn records_logged(&self) -> u32 {
        self.records_logged
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.  Every edit restarts the quiet period.
    pub fn mark_config_dirty(&mut self, now_ms: u64) {
        self.config_dirty = true;
        self.dirty_since_ms = now_ms;
    }

    /// Persist the config once it has been quiet for 5 seconds.
    /// Returns `true` if the config was saved; a failure is reported as
    /// [`AppEvent::ConfigSaveFailed`].
    pub fn auto_save_if_needed(
        &mut self,
        storage: &impl ConfigPort,
        sink: &mut dyn EventSink,
        now_ms: u64,
    ) -> bool {
        if !self.config_dirty {
            return false;
        }
        if now_ms.saturating_sub(self.dirty_since_ms) < AUTO_SAVE_DELAY_MS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                info!("Config auto-saved to NVS");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                sink.emit(&AppEvent::ConfigSaveFailed);
                // Back off for another quiet period instead of retrying every pass.
                self.dirty_since_ms = now_ms;
                false
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}
