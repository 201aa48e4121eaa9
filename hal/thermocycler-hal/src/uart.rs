//! Line-oriented serial communication abstractions
//!
//! The controller speaks newline-terminated text in both directions. These
//! traits hide the transport (USB CDC, UART, a scripted test double) behind
//! blocking line reads and writes.

/// Shared error type for the transmit and receive halves
pub trait ErrorType {
    /// Error type for channel operations
    type Error;
}

/// Channel transmitter
pub trait LineTx: ErrorType {
    /// Write data to the channel
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Channel receiver
pub trait LineRx: ErrorType {
    /// Read one line from the channel
    ///
    /// Blocks for at most the channel's poll interval. Returns
    /// `Ok(Some(len))` with the line (terminator stripped) in `buf[..len]`,
    /// or `Ok(None)` if no complete line arrived in time. Bytes that do
    /// not fit in `buf` are discarded.
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, Self::Error>;
}

/// Combined channel interface
///
/// For links that provide both directions on a single port.
pub trait LineChannel: LineTx + LineRx {}

// Blanket implementation
impl<T: LineTx + LineRx> LineChannel for T {}

/// Serial port configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
