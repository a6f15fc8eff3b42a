//! HD44780 20x4 character LCD behind a PCF8574 I²C backpack.
//!
//! The expander drives the controller in 4-bit mode:
//!
//! | PCF8574 | P0 | P1 | P2 | P3        | P4..P7 |
//! |---------|----|----|----|-----------|--------|
//! | LCD     | RS | RW | EN | backlight | D4..D7 |
//!
//! [`Lcd::show`] rewrites only rows that changed since the last frame and
//! pads every row to the full width, so the screen is never cleared
//! between frames.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use log::warn;

use crate::app::ports::DisplayPort;
use crate::ui::{COLS, Frame, ROWS};

const RS: u8 = 0b0000_0001;
const EN: u8 = 0b0000_0100;
const BACKLIGHT: u8 = 0b0000_1000;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM start address of each row on a 20x4 module.
const ROW_OFFSETS: [u8; ROWS] = [0x00, 0x40, 0x14, 0x54];

pub struct Lcd<I2C, D> {
    i2c: I2C,
    delay: D,
    addr: u8,
    shown: Option<Frame>,
    faulted: bool,
}

impl<I2C: I2c, D: DelayNs> Lcd<I2C, D> {
    pub fn new(i2c: I2C, delay: D, addr: u8) -> Self {
        Self {
            i2c,
            delay,
            addr,
            shown: None,
            faulted: false,
        }
    }

    /// Power-on initialisation into 4-bit, two-line mode.
    pub fn init(&mut self) -> Result<(), I2C::Error> {
        self.delay.delay_ms(50);
        self.expander_write(0)?;
        // Three 8-bit "function set" nibbles, then switch to 4-bit.
        for wait_us in [4_500, 4_500, 150] {
            self.write_nibble(0x30, false)?;
            self.delay.delay_us(wait_us);
        }
        self.write_nibble(0x20, false)?;
        self.command(CMD_FUNCTION_4BIT_2LINE)?;
        self.command(CMD_DISPLAY_ON)?;
        self.clear()?;
        self.command(CMD_ENTRY_MODE_INC)?;
        self.shown = None;
        Ok(())
    }

    pub fn clear(&mut self) -> Result<(), I2C::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_ms(2);
        self.shown = None;
        Ok(())
    }

    pub fn set_cursor(&mut self, col: u8, row: usize) -> Result<(), I2C::Error> {
        let offset = ROW_OFFSETS.get(row).copied().unwrap_or(0);
        self.command(CMD_SET_DDRAM | (offset + col))
    }

    /// Write text at the cursor.  Non-ASCII characters become `?`.
    pub fn print(&mut self, text: &str) -> Result<(), I2C::Error> {
        for ch in text.chars() {
            let byte = if ch.is_ascii() { ch as u8 } else { b'?' };
            self.send(byte, true)?;
        }
        Ok(())
    }

    fn draw(&mut self, frame: &Frame) -> Result<(), I2C::Error> {
        for row in 0..ROWS {
            let line = frame.line(row);
            let unchanged = self.shown.as_ref().is_some_and(|s| s.line(row) == line);
            if unchanged {
                continue;
            }
            self.set_cursor(0, row)?;
            self.print(line)?;
            for _ in line.chars().count()..COLS {
                self.send(b' ', true)?;
            }
        }
        self.shown = Some(frame.clone());
        Ok(())
    }

    fn command(&mut self, cmd: u8) -> Result<(), I2C::Error> {
        self.send(cmd, false)
    }

    fn send(&mut self, byte: u8, data: bool) -> Result<(), I2C::Error> {
        self.write_nibble(byte & 0xF0, data)?;
        self.write_nibble((byte << 4) & 0xF0, data)
    }

    fn write_nibble(&mut self, high_nibble: u8, data: bool) -> Result<(), I2C::Error> {
        let bits = high_nibble | BACKLIGHT | if data { RS } else { 0 };
        self.expander_write(bits | EN)?;
        self.delay.delay_us(1);
        self.expander_write(bits & !EN)?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn expander_write(&mut self, bits: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.addr, &[bits])
    }
}

impl<I2C: I2c, D: DelayNs> DisplayPort for Lcd<I2C, D> {
    fn show(&mut self, frame: &Frame) {
        match self.draw(frame) {
            Ok(()) => self.faulted = false,
            Err(_) => {
                // Force a full redraw once the bus recovers.
                self.shown = None;
                if !self.faulted {
                    warn!("LCD: I2C write failed");
                    self.faulted = true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::i2c::{ErrorType, Operation, SevenBitAddress};

    #[derive(Default)]
    struct Bus {
        writes: Vec<u8>,
    }

    impl ErrorType for Bus {
        type Error = Infallible;
    }

    impl I2c<SevenBitAddress> for Bus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Infallible> {
            assert_eq!(address, 0x27);
            for op in operations {
                if let Operation::Write(bytes) = op {
                    self.writes.extend_from_slice(bytes);
                }
            }
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    /// Reassemble (rs, byte) pairs from the strobed nibbles.
    fn decode(writes: &[u8]) -> Vec<(bool, u8)> {
        let strobes: Vec<u8> = writes.iter().copied().filter(|b| b & EN != 0).collect();
        strobes
            .chunks(2)
            .filter(|c| c.len() == 2)
            .map(|c| (c[0] & RS != 0, (c[0] & 0xF0) | (c[1] >> 4)))
            .collect()
    }

    #[test]
    fn show_positions_rows_and_pads() {
        let mut lcd = Lcd::new(Bus::default(), NoDelay, 0x27);
        let frame = Frame::message(&["Hi", "", "", "x"]);
        lcd.show(&frame);
        let sent = decode(&lcd.i2c.writes);
        assert_eq!(sent[0], (false, CMD_SET_DDRAM));
        assert_eq!(sent[1], (true, b'H'));
        assert_eq!(sent[2], (true, b'i'));
        assert_eq!(sent[3], (true, b' '));
        // 1 cursor command + 20 characters per row.
        assert_eq!(sent.len(), ROWS * (1 + COLS));
        assert!(sent.contains(&(false, CMD_SET_DDRAM | 0x54)));
    }

    #[test]
    fn unchanged_rows_are_skipped() {
        let mut lcd = Lcd::new(Bus::default(), NoDelay, 0x27);
        lcd.show(&Frame::message(&["a", "b", "c", "d"]));
        lcd.i2c.writes.clear();
        lcd.show(&Frame::message(&["a", "B", "c", "d"]));
        let sent = decode(&lcd.i2c.writes);
        assert_eq!(sent.len(), 1 + COLS);
        assert_eq!(sent[0], (false, CMD_SET_DDRAM | 0x40));
        assert_eq!(sent[1], (true, b'B'));
    }

    #[test]
    fn backlight_stays_on() {
        let mut lcd = Lcd::new(Bus::default(), NoDelay, 0x27);
        lcd.init().unwrap();
        assert!(lcd.i2c.writes.iter().skip(1).all(|b| b & BACKLIGHT != 0));
    }
}
