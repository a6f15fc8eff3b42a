//! Inbound commands to the application service.
//!
//! These represent actions requested through the menu buttons that the
//! [`AppService`](super::service::AppService) interprets and acts upon.

use crate::config::{LoggingMode, ThresholdField};

/// Direction of a menu threshold edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjust {
    Increase,
    Decrease,
}

impl Adjust {
    pub fn sign(self) -> f32 {
        match self {
            Self::Increase => 1.0,
            Self::Decrease => -1.0,
        }
    }
}

/// Commands that adapters and the menu can send into the application core.
#[derive(Debug, Clone)]
pub enum AppCommand {
    /// Manual relay command (same delivery path as automatic control).
    SetRelay(bool),

    /// Switch between continuous and on-threshold logging.
    SetLoggingMode(LoggingMode),

    /// Nudge one threshold by its configured step.
    AdjustThreshold(ThresholdField, Adjust),

    /// Run the Wi-Fi provisioning portal (blocking).
    StartProvisioning,
}
