//! Threshold monitor: the contamination state machine.
//!
//! Runs once per sampling tick.  Each of the five limits is checked
//! independently and the result is accumulated into a [`Violations`]
//! bitmask; any set bit means the reading is out of bounds.
//!
//! ## Transition table
//!
//! | current      | out of bounds | next         | event                |
//! |--------------|---------------|--------------|----------------------|
//! | Clean        | no            | Clean        | `NoChange`           |
//! | Clean        | yes           | Contaminated | `BecameContaminated` |
//! | Contaminated | yes           | Contaminated | `NoChange`           |
//! | Contaminated | no            | Clean        | `BecameClean`        |
//!
//! Edge-triggered: downstream actions (relay command, alert record) hang
//! off the two transition events only, never off the level.  There is no
//! hysteresis band; a single borderline reading flips the state.

use core::fmt;

use log::{info, warn};

use crate::config::ThresholdConfig;
use crate::sensors::SensorSnapshot;

// ---------------------------------------------------------------------------
// State and events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContaminationState {
    #[default]
    Clean,
    Contaminated,
}

/// Result of one evaluation.  Consumed once per tick, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContaminationEvent {
    NoChange,
    BecameContaminated,
    BecameClean,
}

impl ContaminationEvent {
    pub fn is_transition(self) -> bool {
        self != Self::NoChange
    }
}

// ---------------------------------------------------------------------------
// Violations
// ---------------------------------------------------------------------------

/// A single threshold comparison that tripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Violation {
    PhLow = 0b0000_0001,
    PhHigh = 0b0000_0010,
    TdsHigh = 0b0000_0100,
    TurbidityHigh = 0b0000_1000,
    TemperatureHigh = 0b0001_0000,
}

impl Violation {
    pub const ALL: [Self; 5] = [
        Self::PhLow,
        Self::PhHigh,
        Self::TdsHigh,
        Self::TurbidityHigh,
        Self::TemperatureHigh,
    ];

    pub const fn mask(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::PhLow => "pH low",
            Self::PhHigh => "pH high",
            Self::TdsHigh => "TDS high",
            Self::TurbidityHigh => "turbidity high",
            Self::TemperatureHigh => "temperature high",
        }
    }
}

/// Bitmask of tripped limits for one snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Violations(u8);

impl Violations {
    pub const NONE: Self = Self(0);

    /// Compare every reading against its limit.  Strict inequalities: a
    /// reading exactly on a limit is in bounds.  NaN compares false and
    /// never trips a limit.
    pub fn evaluate(snap: &SensorSnapshot, t: &ThresholdConfig) -> Self {
        let mut v = Self::NONE;
        v.set(Violation::PhLow, snap.ph < t.ph_low);
        v.set(Violation::PhHigh, snap.ph > t.ph_high);
        v.set(Violation::TdsHigh, snap.tds_ppm > t.tds_max);
        v.set(Violation::TurbidityHigh, snap.turbidity_pct > t.turbidity_max);
        v.set(Violation::TemperatureHigh, snap.temperature_c > t.temp_max);
        v
    }

    fn set(&mut self, violation: Violation, condition: bool) {
        if condition {
            self.0 |= violation.mask();
        }
    }

    pub fn any(self) -> bool {
        self.0 != 0
    }

    pub fn contains(self, violation: Violation) -> bool {
        self.0 & violation.mask() != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn iter(self) -> impl Iterator<Item = Violation> {
        Violation::ALL.into_iter().filter(move |v| self.contains(*v))
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.any() {
            return write!(f, "none");
        }
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v.label())?;
        }
        Ok(())
    }
}

/// `true` when any of the five limits trips.
pub fn is_out_of_bounds(snap: &SensorSnapshot, t: &ThresholdConfig) -> bool {
    Violations::evaluate(snap, t).any()
}

// ---------------------------------------------------------------------------
// Monitor
// ---------------------------------------------------------------------------

/// Owns the process-wide [`ContaminationState`].
#[derive(Debug, Default)]
pub struct ThresholdMonitor {
    state: ContaminationState,
    last_violations: Violations,
    transitions: u32,
}

impl ThresholdMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate one snapshot and advance the state machine.
    pub fn evaluate(&mut self, snap: &SensorSnapshot, t: &ThresholdConfig) -> ContaminationEvent {
        let violations = Violations::evaluate(snap, t);
        self.last_violations = violations;

        let (next, event) = match (self.state, violations.any()) {
            (ContaminationState::Clean, false) => {
                (ContaminationState::Clean, ContaminationEvent::NoChange)
            }
            (ContaminationState::Clean, true) => (
                ContaminationState::Contaminated,
                ContaminationEvent::BecameContaminated,
            ),
            (ContaminationState::Contaminated, true) => {
                (ContaminationState::Contaminated, ContaminationEvent::NoChange)
            }
            (ContaminationState::Contaminated, false) => {
                (ContaminationState::Clean, ContaminationEvent::BecameClean)
            }
        };

        match event {
            ContaminationEvent::BecameContaminated => {
                warn!("ALERT: contamination detected ({violations})");
            }
            ContaminationEvent::BecameClean => {
                info!("Water is clean again");
            }
            ContaminationEvent::NoChange => {}
        }
        if event.is_transition() {
            self.transitions = self.transitions.saturating_add(1);
        }

        self.state = next;
        event
    }

    pub fn state(&self) -> ContaminationState {
        self.state
    }

    /// Limits tripped by the most recent evaluation.
    pub fn last_violations(&self) -> Violations {
        self.last_violations
    }

    /// Transition edges seen since boot.
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }
}
