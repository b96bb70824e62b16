use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use ufmt::{uDisplay, uwrite};
use ufmt_write::uWrite;

use crate::{
    ddram_address, shift_command, Command, ControlByte, DisplayControl, EntryMode, Error,
    FunctionSet, Register, Rgb, ShiftDir, ShiftTarget, State, LCD_ADDRESS, MODE1_NORMAL,
    MODE2_DMBLNK, OUTPUT_PWM_GROUP, RGB_ADDRESS,
};

/// Same driver under the name used by older RGB1602 libraries.
pub type LcdController<'a, I, D> = Lcd<'a, I, D>;

/// API to write to the LCD and to set the backlight color.
pub struct Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    i2c: &'a mut I,
    delay: &'a mut D,
    columns: u8,
    rows: u8,
    function_set: FunctionSet,
    display_control: DisplayControl,
    entry_mode: EntryMode,
    current_line: u8,
    state: State,
}

impl<'a, I, D> Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Create new instance with only the I2C and delay instance. Geometry defaults to 16x2.
    pub fn new(i2c: &'a mut I, delay: &'a mut D) -> Self {
        Self {
            i2c,
            delay,
            columns: 16,
            rows: 2,
            function_set: FunctionSet::for_rows(2),
            display_control: DisplayControl::default(),
            entry_mode: EntryMode::default(),
            current_line: 0,
            state: State::Uninitialized,
        }
    }

    /// Number of character columns.
    pub fn with_columns(mut self, columns: u8) -> Self {
        self.columns = columns;
        self
    }

    /// Number of rows, anything above one selects two line mode.
    pub fn with_rows(mut self, rows: u8) -> Self {
        self.rows = rows;
        self
    }

    /// Initializes the hardware and hands back a ready controller.
    ///
    /// On error the controller is dropped, the bus and delay borrows end with it.
    pub fn init(mut self) -> Result<Self, Error<I::Error>> {
        self.begin()?;
        Ok(self)
    }

    /// Runs the power on sequence of both chips.
    ///
    /// The function set is sent four times, the first three tolerate whatever state the
    /// controller is in after power on, the last one latches the configuration. Any bus error
    /// aborts the sequence and leaves the controller [`State::Uninitialized`].
    pub fn begin(&mut self) -> Result<(), Error<I::Error>> {
        self.state = State::Uninitialized;
        self.init_sequence()?;
        self.state = State::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd ready, {=u8}x{=u8}", self.columns, self.rows);

        Ok(())
    }

    fn init_sequence(&mut self) -> Result<(), Error<I::Error>> {
        self.function_set = FunctionSet::for_rows(self.rows);
        self.current_line = 0;

        // Initial delay to wait for init after power on.
        self.delay.delay_ms(50);

        let function_set = Command::FunctionSet as u8 | self.function_set.bits();
        self.send_command(function_set)?;
        self.delay.delay_ms(5);
        self.send_command(function_set)?;
        self.delay.delay_ms(5);
        self.send_command(function_set)?;
        self.send_command(function_set)?;

        self.display_control = DisplayControl::default();
        self.update_display_control()?;
        self.clear_display()?;

        self.entry_mode = EntryMode::default();
        self.send_command(Command::EntryModeSet as u8 | self.entry_mode.bits())?;

        self.write_register(Register::Mode1, MODE1_NORMAL)?;
        self.write_register(Register::Output, OUTPUT_PWM_GROUP)?;
        self.write_register(Register::Mode2, MODE2_DMBLNK)?;
        self.write_color(Rgb::WHITE)
    }

    /// Give back the bus and the delay.
    pub fn release(self) -> (&'a mut I, &'a mut D) {
        (self.i2c, self.delay)
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn columns(&self) -> u8 {
        self.columns
    }

    pub fn rows(&self) -> u8 {
        self.rows
    }

    /// Row of the last [`Lcd::set_cursor`] call.
    pub fn current_line(&self) -> u8 {
        self.current_line
    }

    pub fn function_set(&self) -> FunctionSet {
        self.function_set
    }

    pub fn display_control(&self) -> DisplayControl {
        self.display_control
    }

    pub fn entry_mode(&self) -> EntryMode {
        self.entry_mode
    }

    fn ensure_ready(&self) -> Result<(), Error<I::Error>> {
        match self.state {
            State::Uninitialized => Err(Error::NotInitialized),
            State::Ready | State::Faulted => Ok(()),
        }
    }

    /// Record a bus failure of a public operation.
    fn track<T>(&mut self, result: Result<T, Error<I::Error>>) -> Result<T, Error<I::Error>> {
        if let Err(Error::Bus(_)) = result {
            self.state = State::Faulted;
        }
        result
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        self.i2c.write(address, bytes).map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c write to {=u8:#x} failed", address);
            Error::Bus(e)
        })
    }

    fn send(&mut self, data: u8, control: ControlByte) -> Result<(), Error<I::Error>> {
        self.write(LCD_ADDRESS, &[control as u8, data])
    }

    fn send_command(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.send(data, ControlByte::Command)
    }

    fn write_register(&mut self, register: Register, value: u8) -> Result<(), Error<I::Error>> {
        self.write(RGB_ADDRESS, &[register as u8, value])
    }

    fn write_color(&mut self, color: Rgb) -> Result<(), Error<I::Error>> {
        for (register, value) in color.registers() {
            self.write_register(register, value)?;
        }
        Ok(())
    }

    fn update_display_control(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Command::DisplayControl as u8 | self.display_control.bits())
    }

    fn clear_display(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Command::Clear as u8)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Send a raw instruction to the character controller.
    pub fn command(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.send_command(data);
        self.track(result)
    }

    /// Write one byte of character data at the cursor.
    pub fn write_char(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.send(data, ControlByte::Data);
        self.track(result)
    }

    /// Write a register of the backlight driver.
    pub fn set_register(&mut self, register: Register, value: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.write_register(register, value);
        self.track(result)
    }

    /// Set the backlight color, one PWM duty value per channel.
    pub fn set_color(&mut self, r: u8, g: u8, b: u8) -> Result<(), Error<I::Error>> {
        self.set_rgb(Rgb::new(r, g, b))
    }

    pub fn set_rgb(&mut self, color: Rgb) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.write_color(color);
        self.track(result)
    }

    pub fn set_color_white(&mut self) -> Result<(), Error<I::Error>> {
        self.set_rgb(Rgb::WHITE)
    }

    /// Set the cursor to (col, row). Coordinates are zero-based and not checked against the
    /// geometry, every row but the first addresses the second line.
    pub fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.write(
            LCD_ADDRESS,
            &[ControlByte::Command as u8, ddram_address(col, row)],
        );
        self.track(result)?;
        self.current_line = row;
        Ok(())
    }

    /// Clear the display
    pub fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.clear_display();
        self.track(result)
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub fn return_home(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.send_command(Command::ReturnHome as u8);
        self.track(result)?;
        self.delay.delay_ms(2);
        Ok(())
    }

    /// Write string to display, one data transaction per UTF-8 byte.
    pub fn write_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        for byte in data.bytes() {
            let result = self.send(byte, ControlByte::Data);
            self.track(result)?;
        }
        Ok(())
    }

    /// Print anything [`ufmt`] can display, numbers are written in decimal.
    pub fn print<T>(&mut self, value: &T) -> Result<(), Error<I::Error>>
    where
        T: uDisplay + ?Sized,
    {
        self.ensure_ready()?;
        uwrite!(self, "{}", value)
    }

    /// Turn the display on, cursor and blink settings are kept.
    pub fn display(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.display = true;
        let result = self.update_display_control();
        self.track(result)
    }

    /// Turn the display off without losing its content.
    pub fn no_display(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.display = false;
        let result = self.update_display_control();
        self.track(result)
    }

    /// Set the cursor visibility
    pub fn cursor_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.cursor = on;
        let result = self.update_display_control();
        self.track(result)
    }

    /// Set if the cursor is blinking
    pub fn cursor_blink(&mut self, blink: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.blink = blink;
        let result = self.update_display_control();
        self.track(result)
    }

    /// Scrolls the display one char to the left
    pub fn scroll_display_left(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Display, ShiftDir::Left))
    }

    /// Scrolls the display one char to the right
    pub fn scroll_display_right(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Display, ShiftDir::Right))
    }

    /// Moves the cursor one char to the left
    pub fn move_cursor_left(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Cursor, ShiftDir::Left))
    }

    /// Moves the cursor one char to the right
    pub fn move_cursor_right(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Cursor, ShiftDir::Right))
    }
}

impl<'a, I, D> uWrite for Lcd<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    type Error = Error<I::Error>;

    fn write_str(&mut self, s: &str) -> Result<(), Self::Error> {
        self.write_str(s)
    }
}
