//! Unified error types for the AquaSentry firmware.
//!
//! Every variant here is non-fatal: the control loop reports it through
//! the event sink and carries on with the next cadence tick.  All types
//! are `Copy` so they can ride inside [`AppEvent`](crate::app::events::AppEvent)s
//! without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every degraded-mode condition in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The relay actuator could not be commanded.
    Transport(TransportError),
    /// The SD card is missing or a record could not be written.
    Storage(StorageError),
    /// A telemetry push was rejected or timed out.
    Publish(PublishError),
    /// Wall-clock time has not been set from NTP yet.
    TimeUnsynchronized,
    /// The classifier failed to run on the latest snapshot.
    Classifier,
    /// Peripheral initialisation failed.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "relay: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Publish(e) => write!(f, "telemetry: {e}"),
            Self::TimeUnsynchronized => write!(f, "time: clock not synchronised"),
            Self::Classifier => write!(f, "classifier: inference failed"),
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Relay transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// No network path; nothing was sent.
    Unreachable,
    /// A request was sent but no positive response came back.
    CommandFailed,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreachable => write!(f, "network unreachable"),
            Self::CommandFailed => write!(f, "command failed"),
        }
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Record storage errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Card not inserted or not mountable.
    Unavailable,
    /// Card present but the append failed.
    WriteFailed,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "SD card unavailable"),
            Self::WriteFailed => write!(f, "write failed"),
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

// ---------------------------------------------------------------------------
// Telemetry errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// Network or cloud session not ready.
    NotReady,
    /// The datastore answered with a non-success status.
    Rejected(u16),
    /// No answer within the timeout.
    TimedOut,
    /// The record could not be encoded.
    Encode,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotReady => write!(f, "service not ready"),
            Self::Rejected(status) => write!(f, "rejected (HTTP {status})"),
            Self::TimedOut => write!(f, "timed out"),
            Self::Encode => write!(f, "record encoding failed"),
        }
    }
}

impl From<PublishError> for Error {
    fn from(e: PublishError) -> Self {
        Self::Publish(e)
    }
}
