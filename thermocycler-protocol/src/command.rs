//! Setpoint command encoding
//!
//! The controller accepts a single command: `t<temperature>\n`. It enables
//! the Peltier element and regulates to the given temperature. The
//! temperature is always rendered with a decimal point (`t94.0`, `t48.5`).

use core::fmt::Write;

use heapless::String;

/// Command prefix for "set temperature"
pub const SETPOINT_PREFIX: char = 't';

/// Maximum encoded command length, including the newline
pub const MAX_COMMAND_LEN: usize = 64;

/// Errors that can occur while encoding or decoding commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Temperature is NaN or infinite
    InvalidTemperature,
    /// Buffer too small for encoding
    BufferTooSmall,
    /// Line is not a setpoint command
    InvalidCommand,
}

/// Set the controller's target temperature
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetpointCommand {
    /// Target temperature in °C
    pub temperature_c: f32,
}

impl SetpointCommand {
    /// Create a setpoint command
    pub fn new(temperature_c: f32) -> Result<Self, CommandError> {
        if !temperature_c.is_finite() {
            return Err(CommandError::InvalidTemperature);
        }
        Ok(Self { temperature_c })
    }

    /// Encode this command as a newline-terminated line
    pub fn encode_to_string(&self) -> Result<String<MAX_COMMAND_LEN>, CommandError> {
        if !self.temperature_c.is_finite() {
            return Err(CommandError::InvalidTemperature);
        }

        let mut line = String::new();
        write!(line, "{}{}", SETPOINT_PREFIX, self.temperature_c)
            .map_err(|_| CommandError::BufferTooSmall)?;

        // Display drops the fraction of integral values ("94"), the
        // controller expects a decimal number
        if !line.contains('.') {
            line.push_str(".0").map_err(|_| CommandError::BufferTooSmall)?;
        }
        line.push('\n').map_err(|_| CommandError::BufferTooSmall)?;

        Ok(line)
    }

    /// Encode this command into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, CommandError> {
        let line = self.encode_to_string()?;
        let bytes = line.as_bytes();
        if buffer.len() < bytes.len() {
            return Err(CommandError::BufferTooSmall);
        }
        buffer[..bytes.len()].copy_from_slice(bytes);
        Ok(bytes.len())
    }

    /// Parse a command line (as the controller would)
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let value = line
            .trim()
            .strip_prefix(SETPOINT_PREFIX)
            .ok_or(CommandError::InvalidCommand)?;
        let temperature_c = value
            .parse::<f32>()
            .map_err(|_| CommandError::InvalidCommand)?;
        Self::new(temperature_c)
    }
}
