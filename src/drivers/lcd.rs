//! HD44780 16×2 character LCD behind a PCF8574 I²C backpack.
//!
//! The expander drives the LCD in 4-bit mode:
//!
//! | PCF8574 bit | LCD line |
//! |-------------|----------|
//! | P0          | RS       |
//! | P1          | RW (tied to write) |
//! | P2          | EN       |
//! | P3          | backlight |
//! | P4–P7       | D4–D7    |

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

/// Usual address of a PCF8574 backpack.
pub const DEFAULT_ADDRESS: u8 = 0x27;

pub const COLUMNS: u8 = 16;
pub const ROWS: u8 = 2;

const RS: u8 = 0x01;
const EN: u8 = 0x04;
const BACKLIGHT: u8 = 0x08;

const CMD_CLEAR: u8 = 0x01;
const CMD_ENTRY_MODE_INC: u8 = 0x06;
const CMD_DISPLAY_ON: u8 = 0x0C;
const CMD_FUNCTION_4BIT_2LINE: u8 = 0x28;
const CMD_SET_DDRAM: u8 = 0x80;

/// DDRAM address of the first column of each row.
const ROW_OFFSETS: [u8; ROWS as usize] = [0x00, 0x40];

/// Map a character to the HD44780 A00 ROM.  Unknown characters become `?`.
pub fn rom_code(c: char) -> u8 {
    match c {
        ' '..='}' => c as u8,
        '°' => 0xDF,
        'ä' => 0xE1,
        'ß' => 0xE2,
        'ö' => 0xEF,
        'ü' => 0xF5,
        _ => b'?',
    }
}

pub struct Lcd1602<I, D> {
    i2c: I,
    delay: D,
    address: u8,
    backlight: bool,
    col: u8,
}

impl<I: I2c, D: DelayNs> Lcd1602<I, D> {
    /// Run the 4-bit initialisation sequence and clear the display.
    pub fn new(i2c: I, delay: D, address: u8) -> Result<Self, I::Error> {
        let mut lcd = Self {
            i2c,
            delay,
            address,
            backlight: true,
            col: 0,
        };

        // Power-on: wait for Vcc to settle, then force 8-bit mode three
        // times before switching to 4-bit.
        lcd.delay.delay_ms(50);
        lcd.write_nibble(0x03, false)?;
        lcd.delay.delay_us(4_500);
        lcd.write_nibble(0x03, false)?;
        lcd.delay.delay_us(4_500);
        lcd.write_nibble(0x03, false)?;
        lcd.delay.delay_us(150);
        lcd.write_nibble(0x02, false)?;

        lcd.command(CMD_FUNCTION_4BIT_2LINE)?;
        lcd.command(CMD_DISPLAY_ON)?;
        lcd.command(CMD_ENTRY_MODE_INC)?;
        lcd.clear()?;
        Ok(lcd)
    }

    pub fn clear(&mut self) -> Result<(), I::Error> {
        self.command(CMD_CLEAR)?;
        self.delay.delay_us(2_000);
        self.col = 0;
        Ok(())
    }

    /// Move the cursor.  Out-of-range positions are clamped to the grid.
    pub fn move_to(&mut self, col: u8, row: u8) -> Result<(), I::Error> {
        let col = col.min(COLUMNS - 1);
        let row = row.min(ROWS - 1);
        self.col = col;
        self.command(CMD_SET_DDRAM | (col + ROW_OFFSETS[row as usize]))
    }

    /// Write text at the cursor.  Anything past the last column is dropped.
    pub fn putstr(&mut self, text: &str) -> Result<(), I::Error> {
        for c in text.chars() {
            if self.col >= COLUMNS {
                break;
            }
            self.data(rom_code(c))?;
            self.col += 1;
        }
        Ok(())
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), I::Error> {
        self.backlight = on;
        let level = self.backlight_bit();
        self.i2c.write(self.address, &[level])
    }

    pub fn release(self) -> (I, D) {
        (self.i2c, self.delay)
    }

    fn command(&mut self, byte: u8) -> Result<(), I::Error> {
        self.write_byte(byte, false)
    }

    fn data(&mut self, byte: u8) -> Result<(), I::Error> {
        self.write_byte(byte, true)
    }

    fn write_byte(&mut self, byte: u8, rs: bool) -> Result<(), I::Error> {
        self.write_nibble(byte >> 4, rs)?;
        self.write_nibble(byte & 0x0F, rs)
    }

    /// Latch one nibble: present it with EN high, then drop EN.
    fn write_nibble(&mut self, nibble: u8, rs: bool) -> Result<(), I::Error> {
        let mut bits = (nibble << 4) | self.backlight_bit();
        if rs {
            bits |= RS;
        }
        self.i2c.write(self.address, &[bits | EN, bits])?;
        self.delay.delay_us(50);
        Ok(())
    }

    fn backlight_bit(&self) -> u8 {
        if self.backlight { BACKLIGHT } else { 0 }
    }
}
