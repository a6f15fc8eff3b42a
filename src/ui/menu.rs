//! Menu state machine.
//!
//! ```text
//!                 ┌──────────┐
//!      ┌─────────▶│   Main   │◀──────── Back (any screen but RelayControl)
//!      │          └────┬─────┘
//!      │  Enter on item│
//!      │   ┌───────────┼───────────┬─────────────┬──────────┐
//!      │   ▼           ▼           ▼             ▼          ▼
//!      │ Readings   Logging      Relay       Thresholds    Wifi
//!      │              │ Enter     │ Enter ▲                 │ Enter
//!      └──────────────┘           ▼       │ Enter/Back      ▼
//!                              RelayControl             portal, → Main
//! ```
//!
//! The menu never performs I/O.  Presses that change device state come
//! back as an [`AppCommand`] for the service to execute.

use crate::app::commands::{Adjust, AppCommand};
use crate::config::{LoggingMode, ThresholdConfig, ThresholdField};
use crate::drivers::button::Button;
use crate::sensors::SensorSnapshot;

use super::{Frame, ROWS};

const MAIN_ITEMS: [&str; 5] = [
    "Sensor Readings",
    "Data Logging",
    "Remote Relay",
    "Edit Thresholds",
    "WiFi Settings",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Main,
    Readings,
    Logging,
    Relay,
    RelayControl,
    Thresholds,
    Wifi,
}

/// Everything the menu needs to draw a screen.
pub struct MenuView<'a> {
    pub snapshot: &'a SensorSnapshot,
    pub thresholds: &'a ThresholdConfig,
    pub logging_mode: LoggingMode,
    pub relay_on: bool,
    pub storage_available: bool,
    pub ssid: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct Menu {
    screen: Screen,
    cursor: usize,
    /// RelayControl: 0 = Turn ON, 1 = Turn OFF.
    relay_choice: usize,
}

impl Menu {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Return to the main screen with the cursor on the first item.
    pub fn go_main(&mut self) {
        self.screen = Screen::Main;
        self.cursor = 0;
    }

    /// Apply one press.  `relay_on` and `mode` pick initial cursors.
    pub fn handle(&mut self, button: Button, relay_on: bool, mode: LoggingMode) -> Option<AppCommand> {
        match button {
            Button::Up => self.up(),
            Button::Down => self.down(),
            Button::Enter => self.enter(relay_on, mode),
            Button::Back => {
                if self.screen == Screen::RelayControl {
                    self.screen = Screen::Relay;
                } else {
                    self.go_main();
                }
                None
            }
        }
    }

    fn up(&mut self) -> Option<AppCommand> {
        match self.screen {
            Screen::Main => self.cursor = wrap_prev(self.cursor, MAIN_ITEMS.len()),
            Screen::Logging => self.cursor = wrap_prev(self.cursor, 2),
            Screen::RelayControl => self.relay_choice = 0,
            Screen::Thresholds => {
                return Some(AppCommand::AdjustThreshold(
                    ThresholdField::from_index(self.cursor),
                    Adjust::Increase,
                ));
            }
            Screen::Readings | Screen::Relay | Screen::Wifi => {}
        }
        None
    }

    fn down(&mut self) -> Option<AppCommand> {
        match self.screen {
            Screen::Main => self.cursor = (self.cursor + 1) % MAIN_ITEMS.len(),
            Screen::Logging => self.cursor = (self.cursor + 1) % 2,
            Screen::RelayControl => self.relay_choice = 1,
            Screen::Thresholds => {
                return Some(AppCommand::AdjustThreshold(
                    ThresholdField::from_index(self.cursor),
                    Adjust::Decrease,
                ));
            }
            Screen::Readings | Screen::Relay | Screen::Wifi => {}
        }
        None
    }

    fn enter(&mut self, relay_on: bool, mode: LoggingMode) -> Option<AppCommand> {
        match self.screen {
            Screen::Main => {
                match self.cursor {
                    0 => self.screen = Screen::Readings,
                    1 => {
                        self.screen = Screen::Logging;
                        self.cursor = match mode {
                            LoggingMode::Continuous => 0,
                            LoggingMode::OnThreshold => 1,
                        };
                    }
                    2 => self.screen = Screen::Relay,
                    3 => {
                        self.screen = Screen::Thresholds;
                        self.cursor = 0;
                    }
                    _ => self.screen = Screen::Wifi,
                }
                None
            }
            Screen::Logging => {
                let mode = if self.cursor == 0 {
                    LoggingMode::Continuous
                } else {
                    LoggingMode::OnThreshold
                };
                self.go_main();
                Some(AppCommand::SetLoggingMode(mode))
            }
            Screen::Relay => {
                self.screen = Screen::RelayControl;
                // Preselect the action that changes the state.
                self.relay_choice = usize::from(relay_on);
                None
            }
            Screen::RelayControl => {
                self.screen = Screen::Relay;
                Some(AppCommand::SetRelay(self.relay_choice == 0))
            }
            Screen::Thresholds => {
                self.cursor = (self.cursor + 1) % ThresholdField::ALL.len();
                None
            }
            Screen::Wifi => Some(AppCommand::StartProvisioning),
            Screen::Readings => None,
        }
    }

    // -------------------------------------------------------------------
    // Rendering
    // -------------------------------------------------------------------

    pub fn render(&self, view: &MenuView<'_>) -> Frame {
        let mut f = Frame::new();
        match self.screen {
            Screen::Main => {
                let start = self.cursor.saturating_sub(ROWS - 1);
                for (row, idx) in (start..MAIN_ITEMS.len()).take(ROWS).enumerate() {
                    f.set_fmt(row, format_args!("{}{}", marker(self.cursor == idx), MAIN_ITEMS[idx]));
                }
            }
            Screen::Readings => {
                let s = view.snapshot;
                f.set_fmt(0, format_args!("Temperature: {:.1} C", s.temperature_c));
                f.set_fmt(1, format_args!("pH: {:.2}", s.ph));
                f.set_fmt(2, format_args!("TDS: {:.0} PPM", s.tds_ppm));
                f.set_fmt(3, format_args!("Turbidity: {:.1} %", s.turbidity_pct));
            }
            Screen::Logging => {
                let card = if view.storage_available { "Detected" } else { "Not Found" };
                f.set_fmt(0, format_args!("SD Card: {card}"));
                f.set_fmt(2, format_args!("{}Continuous", marker(self.cursor == 0)));
                f.set_fmt(3, format_args!("{}On Threshold", marker(self.cursor == 1)));
            }
            Screen::Relay => {
                f.set(0, "Remote Relay");
                f.set_fmt(2, format_args!("Status: {}", on_off(view.relay_on)));
                f.set(3, "ENTER to change");
            }
            Screen::RelayControl => {
                f.set(0, "Set Relay State");
                f.set_fmt(2, format_args!("{}Turn ON", marker(self.relay_choice == 0)));
                f.set_fmt(3, format_args!("{}Turn OFF", marker(self.relay_choice == 1)));
            }
            Screen::Thresholds => {
                let start = self.cursor.saturating_sub(ROWS - 1);
                for (row, field) in ThresholdField::ALL.into_iter().enumerate().skip(start).take(ROWS) {
                    let selected = if self.cursor == row { ">" } else { " " };
                    f.set_fmt(
                        row - start,
                        format_args!("{selected}{}", threshold_line(field, view.thresholds)),
                    );
                }
            }
            Screen::Wifi => {
                f.set(0, "WiFi Settings");
                match view.ssid {
                    Some(ssid) => {
                        f.set(2, "Connected: ");
                        f.set(3, ssid);
                    }
                    None => {
                        f.set(2, "Not Connected.");
                        f.set(3, "ENTER to connect.");
                    }
                }
            }
        }
        f
    }
}

fn wrap_prev(cursor: usize, len: usize) -> usize {
    if cursor == 0 { len - 1 } else { cursor - 1 }
}

fn marker(selected: bool) -> &'static str {
    if selected { "> " } else { "  " }
}

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

fn threshold_line(field: ThresholdField, t: &ThresholdConfig) -> String {
    match field {
        ThresholdField::PhLow => format!("PH Low:  {:.1}", t.ph_low),
        ThresholdField::PhHigh => format!("PH High: {:.1}", t.ph_high),
        ThresholdField::TdsMax => format!("TDS:     {:.0}", t.tds_max),
        ThresholdField::TurbidityMax => format!("Turbid:  {:.0}", t.turbidity_max),
        ThresholdField::TempMax => format!("Temp:    {:.1}", t.temp_max),
    }
}
