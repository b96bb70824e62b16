use embedded_hal_async::{delay::DelayNs, i2c::I2c};

use heapless::String;
use ufmt::uwrite;

use crate::{
    ddram_address, shift_command, Command, ControlByte, DisplayControl, EntryMode, Error,
    FunctionSet, Register, Rgb, ShiftDir, ShiftTarget, State, LCD_ADDRESS, MODE1_NORMAL,
    MODE2_DMBLNK, OUTPUT_PWM_GROUP, RGB_ADDRESS,
};

pub type LcdController<'a, I, D> = Lcd<'a, I, D>;

/// Digits and sign of the longest integer, `i64::MIN`.
const NUMBER_LEN: usize = 20;

/// Value accepted by [`Lcd::print`]: text is sent as is, integers in decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Printable<'s> {
    Text(&'s str),
    Number(String<NUMBER_LEN>),
}

impl Printable<'_> {
    fn as_bytes(&self) -> &[u8] {
        match self {
            Printable::Text(text) => text.as_bytes(),
            Printable::Number(digits) => digits.as_bytes(),
        }
    }
}

impl<'s> From<&'s str> for Printable<'s> {
    fn from(text: &'s str) -> Self {
        Printable::Text(text)
    }
}

macro_rules! printable_integer {
    ($($int:ty),*) => {$(
        impl From<$int> for Printable<'_> {
            fn from(value: $int) -> Self {
                let mut digits = String::new();
                // Fits, NUMBER_LEN covers every implementing integer type.
                let _ = uwrite!(&mut digits, "{}", value);
                Printable::Number(digits)
            }
        }
    )*};
}

printable_integer!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

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
    pub async fn init(mut self) -> Result<Self, Error<I::Error>> {
        self.begin().await?;
        Ok(self)
    }

    /// Runs the power on sequence of both chips, see [`crate::sync_lcd::Lcd::begin`].
    pub async fn begin(&mut self) -> Result<(), Error<I::Error>> {
        self.state = State::Uninitialized;
        self.init_sequence().await?;
        self.state = State::Ready;

        #[cfg(feature = "defmt")]
        defmt::debug!("lcd ready, {=u8}x{=u8}", self.columns, self.rows);

        Ok(())
    }

    async fn init_sequence(&mut self) -> Result<(), Error<I::Error>> {
        self.function_set = FunctionSet::for_rows(self.rows);
        self.current_line = 0;

        // Initial delay to wait for init after power on.
        self.delay.delay_ms(50).await;

        let function_set = Command::FunctionSet as u8 | self.function_set.bits();
        self.send_command(function_set).await?;
        self.delay.delay_ms(5).await;
        self.send_command(function_set).await?;
        self.delay.delay_ms(5).await;
        self.send_command(function_set).await?;
        self.send_command(function_set).await?;

        self.display_control = DisplayControl::default();
        self.update_display_control().await?;
        self.clear_display().await?;

        self.entry_mode = EntryMode::default();
        self.send_command(Command::EntryModeSet as u8 | self.entry_mode.bits())
            .await?;

        self.write_register(Register::Mode1, MODE1_NORMAL).await?;
        self.write_register(Register::Output, OUTPUT_PWM_GROUP).await?;
        self.write_register(Register::Mode2, MODE2_DMBLNK).await?;
        self.write_color(Rgb::WHITE).await
    }

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

    fn track<T>(&mut self, result: Result<T, Error<I::Error>>) -> Result<T, Error<I::Error>> {
        if let Err(Error::Bus(_)) = result {
            self.state = State::Faulted;
        }
        result
    }

    async fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        self.i2c.write(address, bytes).await.map_err(|e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("i2c write to {=u8:#x} failed", address);
            Error::Bus(e)
        })
    }

    async fn send(&mut self, data: u8, control: ControlByte) -> Result<(), Error<I::Error>> {
        self.write(LCD_ADDRESS, &[control as u8, data]).await
    }

    async fn send_command(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.send(data, ControlByte::Command).await
    }

    async fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.write(RGB_ADDRESS, &[register as u8, value]).await
    }

    async fn write_color(&mut self, color: Rgb) -> Result<(), Error<I::Error>> {
        for (register, value) in color.registers() {
            self.write_register(register, value).await?;
        }
        Ok(())
    }

    async fn update_display_control(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Command::DisplayControl as u8 | self.display_control.bits())
            .await
    }

    async fn clear_display(&mut self) -> Result<(), Error<I::Error>> {
        self.send_command(Command::Clear as u8).await?;
        self.delay.delay_ms(2).await;
        Ok(())
    }

    async fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<I::Error>> {
        for &byte in bytes {
            let result = self.send(byte, ControlByte::Data).await;
            self.track(result)?;
        }
        Ok(())
    }

    pub async fn command(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.send_command(data).await;
        self.track(result)
    }

    pub async fn write_char(&mut self, data: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.send(data, ControlByte::Data).await;
        self.track(result)
    }

    pub async fn set_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.write_register(register, value).await;
        self.track(result)
    }

    pub async fn set_color(&mut self, r: u8, g: u8, b: u8) -> Result<(), Error<I::Error>> {
        self.set_rgb(Rgb::new(r, g, b)).await
    }

    pub async fn set_rgb(&mut self, color: Rgb) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.write_color(color).await;
        self.track(result)
    }

    pub async fn set_color_white(&mut self) -> Result<(), Error<I::Error>> {
        self.set_rgb(Rgb::WHITE).await
    }

    /// Set the cursor to (col, row). Coordinates are zero-based.
    pub async fn set_cursor(&mut self, col: u8, row: u8) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self
            .write(
                LCD_ADDRESS,
                &[ControlByte::Command as u8, ddram_address(col, row)],
            )
            .await;
        self.track(result)?;
        self.current_line = row;
        Ok(())
    }

    /// Clear the display
    pub async fn clear(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.clear_display().await;
        self.track(result)
    }

    /// Return cursor to upper left corner, i.e. (0,0).
    pub async fn return_home(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let result = self.send_command(Command::ReturnHome as u8).await;
        self.track(result)?;
        self.delay.delay_ms(2).await;
        Ok(())
    }

    /// Write string to display.
    pub async fn write_str(&mut self, data: &str) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.write_bytes(data.as_bytes()).await
    }

    /// Print text or an integer, integers are written in decimal.
    pub async fn print<'s>(
        &mut self,
        value: impl Into<Printable<'s>>,
    ) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        let value = value.into();
        self.write_bytes(value.as_bytes()).await
    }

    pub async fn display(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.display = true;
        let result = self.update_display_control().await;
        self.track(result)
    }

    pub async fn no_display(&mut self) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.display = false;
        let result = self.update_display_control().await;
        self.track(result)
    }

    /// Set the cursor visibility
    pub async fn cursor_on(&mut self, on: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.cursor = on;
        let result = self.update_display_control().await;
        self.track(result)
    }

    /// Set if the cursor is blinking
    pub async fn cursor_blink(&mut self, blink: bool) -> Result<(), Error<I::Error>> {
        self.ensure_ready()?;
        self.display_control.blink = blink;
        let result = self.update_display_control().await;
        self.track(result)
    }

    /// Scrolls the display one char to the left
    pub async fn scroll_display_left(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Display, ShiftDir::Left))
            .await
    }

    /// Scrolls the display one char to the right
    pub async fn scroll_display_right(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Display, ShiftDir::Right))
            .await
    }

    pub async fn move_cursor_left(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Cursor, ShiftDir::Left))
            .await
    }

    pub async fn move_cursor_right(&mut self) -> Result<(), Error<I::Error>> {
        self.command(shift_command(ShiftTarget::Cursor, ShiftDir::Right))
            .await
    }
}
