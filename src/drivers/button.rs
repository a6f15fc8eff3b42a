//! Polled, debounced menu buttons.
//!
//! ## Hardware
//!
//! Four momentary switches wired active-high (pressed = HIGH).  The
//! main loop samples their levels once per pass and [`ButtonBank::poll`]
//! turns LOW→HIGH edges into [`Button`] events.
//!
//! ## Debounce
//!
//! One debounce window is shared across all four buttons: a press is
//! accepted only if more than `debounce_ms` has passed since the last
//! accepted press on *any* button.  Edge tracking is per button and is
//! updated even when the press is rejected, so holding a button never
//! produces a second event.

use crate::app::ports::ButtonLevels;

/// Menu buttons in polling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Up,
    Down,
    Enter,
    Back,
}

impl Button {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Enter, Self::Back];

    fn level(self, levels: &ButtonLevels) -> bool {
        match self {
            Self::Up => levels.up,
            Self::Down => levels.down,
            Self::Enter => levels.enter,
            Self::Back => levels.back,
        }
    }
}

/// Up to four accepted presses from one poll.
pub type Presses = heapless::Vec<Button, 4>;

pub struct ButtonBank {
    debounce_ms: u64,
    last_level: [bool; 4],
    last_press_ms: u64,
}

impl ButtonBank {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            debounce_ms: u64::from(debounce_ms),
            last_level: [false; 4],
            last_press_ms: 0,
        }
    }

    /// Sample one set of levels.  Returns accepted presses in
    /// Up, Down, Enter, Back order.
    pub fn poll(&mut self, levels: ButtonLevels, now_ms: u64) -> Presses {
        let mut presses = Presses::new();
        for (i, button) in Button::ALL.into_iter().enumerate() {
            let level = button.level(&levels);
            let rising = level && !self.last_level[i];
            if rising && now_ms.saturating_sub(self.last_press_ms) > self.debounce_ms {
                self.last_press_ms = now_ms;
                // Capacity equals the number of buttons.
                let _ = presses.push(button);
            }
            self.last_level[i] = level;
        }
        presses
    }
}
