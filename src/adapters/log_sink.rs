//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).  Every line
//! starts with a fixed tag so the serial stream stays greppable:
//! `START`, `ALERT`, `RELAY`, `SDLOG`, `STATUS`, `TELEM`, `FAULT`, `CONFIG`.

use log::{info, warn};

use crate::app::events::{AppEvent, StatusReport};
use crate::app::ports::EventSink;
use crate::monitor::ContaminationEvent;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self { emitted: 0 }
    }

    /// Events seen since boot.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

fn log_status(s: &StatusReport) {
    info!(
        "STATUS | T={:.1}\u{00b0}C pH={:.2} TDS={:.0}ppm turb={:.0}% | class={} | \
         mode={} relay={} sd={} wifi={}",
        s.snapshot.temperature_c,
        s.snapshot.ph,
        s.snapshot.tds_ppm,
        s.snapshot.turbidity_pct,
        s.label,
        s.logging_mode.label(),
        if s.relay_on { "ON" } else { "OFF" },
        if s.storage_available { "OK" } else { "ABSENT" },
        s.network.as_deref().unwrap_or("-"),
    );
    let t = &s.thresholds;
    info!(
        "STATUS | limits pH {:.1}..{:.1} TDS<{:.0} turb<{:.0} T<{:.1}",
        t.ph_low, t.ph_high, t.tds_max, t.turbidity_max, t.temp_max
    );
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started(snap) => {
                info!(
                    "START | T={:.1} pH={:.2} TDS={:.0} turb={:.0}",
                    snap.temperature_c, snap.ph, snap.tds_ppm, snap.turbidity_pct
                );
            }
            AppEvent::Transition {
                event,
                violations,
                snapshot,
            } => match event {
                ContaminationEvent::BecameContaminated => warn!(
                    "ALERT | contamination detected ({}) pH={:.2} TDS={:.0} turb={:.0} T={:.1}",
                    violations,
                    snapshot.ph,
                    snapshot.tds_ppm,
                    snapshot.turbidity_pct,
                    snapshot.temperature_c
                ),
                ContaminationEvent::BecameClean => info!("ALERT | water back within limits"),
                ContaminationEvent::NoChange => {}
            },
            AppEvent::RelayCommanded {
                on,
                manual,
                outcome,
            } => {
                let source = if *manual { "manual" } else { "auto" };
                let target = if *on { "ON" } else { "OFF" };
                match outcome {
                    Ok(()) => info!("RELAY | {} {} ok", source, target),
                    Err(e) => warn!("RELAY | {} {} failed: {}", source, target, e),
                }
            }
            AppEvent::RecordLogged {
                time_ms,
                on_threshold,
            } => {
                let kind = if *on_threshold { "alert" } else { "periodic" };
                info!("SDLOG | {} record t={}ms", kind, time_ms);
            }
            AppEvent::Status(report) => log_status(report),
            AppEvent::TelemetryPublished { timestamp } => {
                info!("TELEM | published at {}", timestamp);
            }
            AppEvent::Degraded(err) => {
                warn!("FAULT | {}", err);
            }
            AppEvent::ConfigChanged => {
                info!("CONFIG | edited, save pending");
            }
            AppEvent::ConfigSaveFailed => {
                warn!("CONFIG | save failed");
            }
        }
    }
}
