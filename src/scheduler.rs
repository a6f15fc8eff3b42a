//! Cadence scheduler.
//!
//! The control loop is cooperative: it spins as fast as the peripherals
//! allow and each periodic job checks its own [`Cadence`] against the
//! monotonic clock.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      AppService.poll()                       │
//! │                                                              │
//! │  ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌──────────┐   │
//! │  │ sampling  │  │ continuous│  │ status    │  │ telemetry│   │
//! │  │ 1000 ms   │  │ log 1000ms│  │ 5000 ms   │  │ 5000 ms  │   │
//! │  └─────┬─────┘  └─────┬─────┘  └─────┬─────┘  └─────┬────┘   │
//! │        │ gate?        │ gate?        │              │ gate?  │
//! │        ▼              ▼              ▼              ▼        │
//! │                   Cadence::is_due(now)                       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! A gate (SD present, cloud ready) is checked *before* `is_due`, so a
//! closed gate does not consume the interval and the job runs on the
//! first pass after the gate opens.

use crate::config::SystemConfig;

// ═══════════════════════════════════════════════════════════════
//  Cadence
// ═══════════════════════════════════════════════════════════════

/// One periodic job: fires when at least `interval_ms` has elapsed since
/// the last fire.  Missed periods are not replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadence {
    interval_ms: u64,
    last_ms: u64,
}

impl Cadence {
    pub fn new(interval_ms: u32) -> Self {
        Self {
            interval_ms: u64::from(interval_ms),
            last_ms: 0,
        }
    }

    /// Returns `true` and re-arms when the interval has elapsed.
    pub fn is_due(&mut self, now_ms: u64) -> bool {
        if now_ms.saturating_sub(self.last_ms) >= self.interval_ms {
            self.last_ms = now_ms;
            true
        } else {
            false
        }
    }

}

// ═══════════════════════════════════════════════════════════════
//  Loop cadences
// ═══════════════════════════════════════════════════════════════

/// The four periodic jobs of the main loop.
#[derive(Debug, Clone, Copy)]
pub struct Cadences {
    pub sampling: Cadence,
    pub continuous_log: Cadence,
    pub status: Cadence,
    pub telemetry: Cadence,
}

impl Cadences {
    pub fn from_config(config: &SystemConfig) -> Self {
        Self {
            sampling: Cadence::new(config.sensor_read_interval_ms),
            continuous_log: Cadence::new(config.log_interval_ms),
            status: Cadence::new(config.status_interval_ms),
            telemetry: Cadence::new(config.telemetry_interval_ms),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
