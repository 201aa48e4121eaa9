//! Serial port line channel
//!
//! Wraps a `serialport` handle (or any `Read + Write` stream) as a
//! [`LineChannel`](thermocycler_hal::LineChannel). Reads block for at most
//! the port timeout; bytes of an incomplete line are kept until the rest
//! arrives.

use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{SerialPort, SerialPortType};
use thermocycler_hal::{DataBits, ErrorType, LineRx, LineTx, Parity, StopBits, UartConfig};

/// Bytes buffered without a terminator before they are delivered as a line
const MAX_PENDING: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    #[error("cannot open {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialport error: {0}")]
    Serialport(#[from] serialport::Error),
}

/// Summary of an available port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub port_name: String,
    pub description: Option<String>,
}

/// List ports the operating system reports
pub fn available_ports() -> Result<Vec<PortInfo>, SerialError> {
    let ports = serialport::available_ports()?;

    Ok(ports
        .into_iter()
        .map(|port| {
            let description = match port.port_type {
                SerialPortType::UsbPort(usb) => Some(format!(
                    "USB {:04x}:{:04x} {}",
                    usb.vid,
                    usb.pid,
                    usb.product.unwrap_or_default()
                )),
                SerialPortType::BluetoothPort => Some("Bluetooth".to_string()),
                SerialPortType::PciPort => Some("PCI".to_string()),
                SerialPortType::Unknown => None,
            };
            PortInfo {
                port_name: port.port_name,
                description,
            }
        })
        .collect())
}

/// Line channel over a byte stream
pub struct SerialChannel<P> {
    port: P,
    pending: Vec<u8>,
}

impl SerialChannel<Box<dyn SerialPort>> {
    /// Open a serial port
    ///
    /// `poll_interval` bounds how long a single `read_line` blocks.
    pub fn open(path: &str, uart: &UartConfig, poll_interval: Duration) -> Result<Self, SerialError> {
        let port = serialport::new(path, uart.baudrate)
            .data_bits(data_bits(uart.data_bits))
            .parity(parity(uart.parity))
            .stop_bits(stop_bits(uart.stop_bits))
            .timeout(poll_interval)
            .open()
            .map_err(|source| SerialError::Open {
                port: path.to_string(),
                source,
            })?;

        log::debug!("Opened {} at {} baud", path, uart.baudrate);
        Ok(Self::new(port))
    }
}

impl<P> SerialChannel<P> {
    pub fn new(port: P) -> Self {
        Self {
            port,
            pending: Vec::new(),
        }
    }

    /// Move the next complete line into `buf`
    fn take_line(&mut self, buf: &mut [u8]) -> Option<usize> {
        let end = match self.pending.iter().position(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None if self.pending.len() >= MAX_PENDING => self.pending.len(),
            None => return None,
        };

        let mut line: Vec<u8> = self.pending.drain(..end).collect();
        while matches!(line.last(), Some(b'\n' | b'\r')) {
            line.pop();
        }

        let len = line.len().min(buf.len());
        buf[..len].copy_from_slice(&line[..len]);
        Some(len)
    }
}

impl<P> ErrorType for SerialChannel<P> {
    type Error = SerialError;
}

impl<P: Write> LineTx for SerialChannel<P> {
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), SerialError> {
        self.port.write_all(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SerialError> {
        self.port.flush()?;
        Ok(())
    }
}

impl<P: Read> LineRx for SerialChannel<P> {
    fn read_line(&mut self, buf: &mut [u8]) -> Result<Option<usize>, SerialError> {
        let mut chunk = [0u8; 64];

        loop {
            if let Some(len) = self.take_line(buf) {
                return Ok(Some(len));
            }

            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(None),
                Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn data_bits(bits: DataBits) -> serialport::DataBits {
    match bits {
        DataBits::Seven => serialport::DataBits::Seven,
        DataBits::Eight => serialport::DataBits::Eight,
    }
}

fn parity(parity: Parity) -> serialport::Parity {
    match parity {
        Parity::None => serialport::Parity::None,
        Parity::Even => serialport::Parity::Even,
        Parity::Odd => serialport::Parity::Odd,
    }
}

fn stop_bits(bits: StopBits) -> serialport::StopBits {
    match bits {
        StopBits::One => serialport::StopBits::One,
        StopBits::Two => serialport::StopBits::Two,
    }
}
