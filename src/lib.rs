#![no_std]
//! Driver for RGB1602 character LCD modules like the [Waveshare LCD1602 RGB] with 16x2
//! characters. The module carries two I2C slaves on the same bus: the character controller at
//! [`LCD_ADDRESS`] and the RGB backlight driver at [`RGB_ADDRESS`]. The driver requires an I2C
//! instance implementing [`embedded_hal::i2c::I2c`] and an instance to delay execution with
//! [`embedded_hal::delay::DelayNs`].
//!
//! Usage:
//! ```ignore
//! // Create a I2C instance, needs to implement embedded_hal::i2c::I2c, this
//! // particular uses the arduino_hal crate for avr microcontrollers like the arduinos.
//! let dp = arduino_hal::Peripherals::take().unwrap();
//! let pins = arduino_hal::pins!(dp);
//! let mut i2c = arduino_hal::I2c::new(
//!     dp.TWI, //
//!     pins.a4.into_pull_up_input(), // use respective pins
//!     pins.a5.into_pull_up_input(),
//!     50000,
//! );
//! let mut delay = arduino_hal::Delay::new();
//!
//! let mut lcd = lcd_rgb1602_i2c::sync_lcd::Lcd::new(&mut i2c, &mut delay)
//!     .with_columns(16)
//!     .with_rows(2) // two rows
//!     .init()
//!     .unwrap();
//!
//! lcd.set_color(255, 255, 0).unwrap();
//! lcd.set_cursor(0, 1).unwrap();
//! lcd.print("Hello").unwrap();
//! lcd.print(&42u16).unwrap();
//! ```
//!
//! Text is sent byte by byte. The character ROM of the display is a single byte charset, so
//! multi-byte UTF-8 sequences show up as several unrelated glyphs.
//!
//! [Waveshare LCD1602 RGB]: https://www.waveshare.com/wiki/LCD1602_RGB_Module

#[cfg(feature = "async")]
pub mod async_lcd;
pub mod sync_lcd;
#[cfg(test)]
mod test_support;

/// 7-bit address of the character controller (8-bit write address `0x7C`).
pub const LCD_ADDRESS: u8 = 0x7C >> 1;
/// 7-bit address of the backlight driver (8-bit write address `0xC0`).
pub const RGB_ADDRESS: u8 = 0xC0 >> 1;

/// Set DDRAM address instruction for the start of the first and second row.
const ROW_OFFSETS: [u8; 2] = [
    Command::SetDdramAddr as u8,
    Command::SetDdramAddr as u8 | 0x40,
];

/// Errors returned by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// A bus transaction failed (NACK, timeout, arbitration loss, ...).
    Bus(E),
    /// The controller has not completed its initialization sequence.
    NotInitialized,
}

/// Lifecycle of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    /// `begin` has not run or did not complete.
    Uninitialized,
    /// Initialization completed, operations reach the hardware.
    Ready,
    /// A bus transaction failed after initialization.
    Faulted,
}

/// Leading control byte of every transaction to the character controller.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlByte {
    Command = 0x80,
    Data = 0x40,
}

/// Instruction codes of the character controller.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    Clear = 0x01,
    ReturnHome = 0x02,
    EntryModeSet = 0x04,
    DisplayControl = 0x08,
    CursorShift = 0x10,
    FunctionSet = 0x20,
    SetDdramAddr = 0x80,
}

/// Registers of the backlight driver.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    Mode1 = 0x00,
    Mode2 = 0x01,
    Blue = 0x02,
    Green = 0x03,
    Red = 0x04,
    Output = 0x08,
}

/// Register values written while bringing up the backlight.
const MODE1_NORMAL: u8 = 0x00;
/// Every LED output driven by its PWM and the group PWM register.
const OUTPUT_PWM_GROUP: u8 = 0xFF;
/// DMBLNK set, group control in blinking mode.
const MODE2_DMBLNK: u8 = 0x20;

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitMode {
    Bit4 = 0x0 << 4,
    Bit8 = 0x1 << 4,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lines {
    One = 0x00,
    Two = 0x08,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Font {
    Font5x8 = 0x00,
    Font5x10 = 0x04,
}

/// Text direction of the entry mode.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CursorMoveDir {
    Right = 0x00,
    Left = 0x02,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayShift {
    Decrement = 0x00,
    Increment = 0x01,
}

/// Flags of the cursor/display shift command.
#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ShiftTarget {
    Cursor = 0x00,
    Display = 0x08,
}

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum ShiftDir {
    Left = 0x00,
    Right = 0x04,
}

/// Payload of the function set command: bus width, line count and font.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FunctionSet {
    pub bit_mode: BitMode,
    pub lines: Lines,
    pub font: Font,
}

impl FunctionSet {
    /// 4 bit bus and 5x8 font, two line mode for anything taller than one row.
    pub const fn for_rows(rows: u8) -> Self {
        Self {
            bit_mode: BitMode::Bit4,
            lines: if rows > 1 { Lines::Two } else { Lines::One },
            font: Font::Font5x8,
        }
    }

    pub const fn bits(self) -> u8 {
        self.bit_mode as u8 | self.lines as u8 | self.font as u8
    }
}

/// Payload of the display on/off control command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayControl {
    pub display: bool,
    pub cursor: bool,
    pub blink: bool,
}

impl DisplayControl {
    const DISPLAY_ON: u8 = 0x04;
    const CURSOR_ON: u8 = 0x02;
    const BLINK_ON: u8 = 0x01;

    pub const fn bits(self) -> u8 {
        let mut bits = 0;
        if self.display {
            bits |= Self::DISPLAY_ON;
        }
        if self.cursor {
            bits |= Self::CURSOR_ON;
        }
        if self.blink {
            bits |= Self::BLINK_ON;
        }
        bits
    }
}

impl Default for DisplayControl {
    /// Display on, no cursor, no blinking.
    fn default() -> Self {
        Self {
            display: true,
            cursor: false,
            blink: false,
        }
    }
}

/// Payload of the entry mode set command.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EntryMode {
    pub direction: CursorMoveDir,
    pub shift: DisplayShift,
}

impl EntryMode {
    pub const fn bits(self) -> u8 {
        self.direction as u8 | self.shift as u8
    }
}

impl Default for EntryMode {
    /// Left to right text without shifting the display.
    fn default() -> Self {
        Self {
            direction: CursorMoveDir::Left,
            shift: DisplayShift::Decrement,
        }
    }
}

/// Backlight color, one PWM duty value per channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Register writes in the order the backlight driver expects them.
    const fn registers(self) -> [(Register, u8); 3] {
        [
            (Register::Red, self.r),
            (Register::Green, self.g),
            (Register::Blue, self.b),
        ]
    }
}

/// Set DDRAM address instruction for the given position. Any row but the first maps onto the
/// second line, columns are not checked.
const fn ddram_address(col: u8, row: u8) -> u8 {
    let base = if row == 0 { ROW_OFFSETS[0] } else { ROW_OFFSETS[1] };
    col | base
}

const fn shift_command(target: ShiftTarget, dir: ShiftDir) -> u8 {
    Command::CursorShift as u8 | target as u8 | dir as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn addresses_are_shifted_write_addresses() {
        assert_eq!(LCD_ADDRESS, 0x3E);
        assert_eq!(RGB_ADDRESS, 0x60);
    }

    #[test]
    fn function_set_has_two_lines_only_for_multiple_rows() {
        assert_eq!(FunctionSet::for_rows(1).lines, Lines::One);
        assert_eq!(FunctionSet::for_rows(1).bits(), 0x00);
        assert_eq!(FunctionSet::for_rows(0).bits(), 0x00);
        for rows in 2..=u8::MAX {
            let flags = FunctionSet::for_rows(rows);
            assert_eq!(flags.bits() & Lines::Two as u8, Lines::Two as u8);
            assert_eq!(flags.bits(), 0x08);
        }
    }

    #[test]
    fn display_control_bits() {
        assert_eq!(DisplayControl::default().bits(), 0x04);
        let all = DisplayControl {
            display: true,
            cursor: true,
            blink: true,
        };
        assert_eq!(all.bits(), 0x07);
        let off = DisplayControl {
            display: false,
            ..all
        };
        assert_eq!(off.bits(), 0x03);
    }

    #[test]
    fn entry_mode_defaults_to_left_to_right() {
        assert_eq!(EntryMode::default().bits(), 0x02);
        assert_eq!(Command::EntryModeSet as u8 | EntryMode::default().bits(), 0x06);
    }

    #[test]
    fn ddram_address_per_row() {
        assert_eq!(ROW_OFFSETS, [Command::SetDdramAddr as u8, 0xC0]);
        for col in 0..40 {
            assert_eq!(ddram_address(col, 0), 0x80 | col);
            for row in 1..4 {
                assert_eq!(ddram_address(col, row), 0xC0 | col);
            }
        }
    }

    #[test]
    fn color_registers_are_red_green_blue() {
        let regs = Rgb::new(1, 2, 3).registers();
        assert_eq!(regs[0], (Register::Red, 1));
        assert_eq!(regs[1], (Register::Green, 2));
        assert_eq!(regs[2], (Register::Blue, 3));
        assert_eq!(Register::Red as u8, 4);
        assert_eq!(Register::Green as u8, 3);
        assert_eq!(Register::Blue as u8, 2);
    }

    #[test]
    fn shift_commands() {
        assert_eq!(shift_command(ShiftTarget::Display, ShiftDir::Left), 0x18);
        assert_eq!(shift_command(ShiftTarget::Display, ShiftDir::Right), 0x1C);
        assert_eq!(shift_command(ShiftTarget::Cursor, ShiftDir::Left), 0x10);
        assert_eq!(shift_command(ShiftTarget::Cursor, ShiftDir::Right), 0x14);
    }
}
