//! Remote relay controller.
//!
//! Turns ON/OFF decisions into `GET http://<relay-host>/on` or `/off`.
//! [`RelayController::relay_state`] is the *last commanded* state (there
//! is no feedback channel from the actuator), so it only changes after a
//! positive response.
//!
//! Delivery is best-effort: one attempt by default.  When
//! `relay_max_attempts > 1` the same decided command is re-sent up to that
//! many times; the decision itself is never re-evaluated here.

use log::{info, warn};

use crate::app::ports::{NetworkPort, RelayTransport};
use crate::config::SystemConfig;
use crate::error::TransportError;

/// The two actuator endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCommand {
    On,
    Off,
}

impl RelayCommand {
    pub fn from_bool(turn_on: bool) -> Self {
        if turn_on { Self::On } else { Self::Off }
    }

    pub fn path(self) -> &'static str {
        match self {
            Self::On => "/on",
            Self::Off => "/off",
        }
    }

    pub fn is_on(self) -> bool {
        self == Self::On
    }
}

pub struct RelayController {
    host: String,
    timeout_ms: u32,
    max_attempts: u8,
    /// Last successfully commanded state.
    state: bool,
    requests_sent: u32,
}

impl RelayController {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            host: config.relay_host.clone(),
            timeout_ms: config.relay_timeout_ms,
            max_attempts: config.relay_max_attempts.max(1),
            state: false,
            requests_sent: 0,
        }
    }

    /// Full URL for `cmd`.
    pub fn command_url(&self, cmd: RelayCommand) -> String {
        format!("http://{}{}", self.host, cmd.path())
    }

    /// Command the relay.  Fails fast with [`TransportError::Unreachable`]
    /// when the station is offline; any non-positive status, timeout or
    /// socket error yields [`TransportError::CommandFailed`].  The stored
    /// state is untouched on every error path.
    pub fn set_relay(
        &mut self,
        network: &dyn NetworkPort,
        transport: &mut dyn RelayTransport,
        turn_on: bool,
    ) -> Result<(), TransportError> {
        if !network.is_connected() {
            warn!("Relay: network unreachable, {} not sent", if turn_on { "ON" } else { "OFF" });
            return Err(TransportError::Unreachable);
        }

        let url = self.command_url(RelayCommand::from_bool(turn_on));
        for attempt in 1..=self.max_attempts {
            self.requests_sent = self.requests_sent.saturating_add(1);
            match transport.get(&url, self.timeout_ms) {
                Ok(status) if status > 0 => {
                    self.state = turn_on;
                    info!("Relay: GET {} -> {} (attempt {})", url, status, attempt);
                    return Ok(());
                }
                Ok(status) => {
                    warn!("Relay: GET {} -> status {} (attempt {})", url, status, attempt);
                }
                Err(fault) => {
                    warn!("Relay: GET {} failed: {:?} (attempt {})", url, fault, attempt);
                }
            }
        }
        Err(TransportError::CommandFailed)
    }

    /// Last commanded state (`true` = ON).
    pub fn relay_state(&self) -> bool {
        self.state
    }

    /// Requests put on the wire since boot, retries included.
    pub fn requests_sent(&self) -> u32 {
        self.requests_sent
    }
}
