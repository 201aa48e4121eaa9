//! Telemetry line decoding
//!
//! Classifies one line from the controller as either a structured status
//! sample or an opaque diagnostic message. The layout of a status line is
//! described once by a [`StatusSchema`]; [`STATUS_LINE`] is the layout the
//! Peltier controller firmware emits.

use heapless::Vec;

/// Maximum number of fields a status schema may declare
pub const MAX_STATUS_FIELDS: usize = 16;

/// Layout of a structured status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusSchema {
    /// Field separator character
    pub separator: char,
    /// Number of fields that marks a line as a status line
    pub field_count: usize,
    /// Position of the measured temperature
    pub temperature_field: usize,
}

impl StatusSchema {
    /// Create a schema, validating field positions
    ///
    /// Returns None if the temperature field lies outside the line or the
    /// field count exceeds [`MAX_STATUS_FIELDS`].
    pub const fn new(separator: char, field_count: usize, temperature_field: usize) -> Option<Self> {
        if field_count == 0 || field_count > MAX_STATUS_FIELDS || temperature_field >= field_count {
            return None;
        }
        Some(Self {
            separator,
            field_count,
            temperature_field,
        })
    }
}

/// Status line layout of the Peltier controller firmware
pub const STATUS_LINE: StatusSchema = StatusSchema {
    separator: '\t',
    field_count: 8,
    temperature_field: 3,
};

/// Recoverable decoding failures
///
/// Neither is fatal to a run: the line is reported and skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TelemetryError {
    /// Line has the status field count but the temperature is not a finite number
    MalformedSample,
    /// Line is not valid UTF-8
    InvalidEncoding,
}

/// A structured status sample
#[derive(Debug, Clone, PartialEq)]
pub struct StatusSample<'a> {
    /// Measured temperature in °C
    pub measured_temperature: f32,
    /// All fields of the line, in order
    pub raw_fields: Vec<&'a str, MAX_STATUS_FIELDS>,
    /// Number of fields on the line
    pub field_count: usize,
}

impl<'a> StatusSample<'a> {
    /// Get a raw field by position
    pub fn field(&self, index: usize) -> Option<&'a str> {
        self.raw_fields.get(index).copied()
    }
}

/// A free-form diagnostic line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InfoMessage<'a> {
    /// The trimmed line text
    pub text: &'a str,
}

/// A classified telemetry line
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry<'a> {
    /// Structured status sample
    Status(StatusSample<'a>),
    /// Diagnostic text
    Info(InfoMessage<'a>),
}

/// Classify a line against the controller's status layout
pub fn parse_line(line: &str) -> Result<Telemetry<'_>, TelemetryError> {
    parse_line_with(&STATUS_LINE, line)
}

/// Classify a line against an explicit status layout
///
/// Surrounding whitespace (including the line terminator) is trimmed
/// before the line is split.
pub fn parse_line_with<'a>(
    schema: &StatusSchema,
    line: &'a str,
) -> Result<Telemetry<'a>, TelemetryError> {
    let text = line.trim();

    let field_count = text.split(schema.separator).count();
    if field_count != schema.field_count {
        return Ok(Telemetry::Info(InfoMessage { text }));
    }

    let mut raw_fields = Vec::new();
    for field in text.split(schema.separator) {
        raw_fields
            .push(field)
            .map_err(|_| TelemetryError::MalformedSample)?;
    }

    let measured_temperature = raw_fields
        .get(schema.temperature_field)
        .and_then(|field| field.trim().parse::<f32>().ok())
        .filter(|t| t.is_finite())
        .ok_or(TelemetryError::MalformedSample)?;

    Ok(Telemetry::Status(StatusSample {
        measured_temperature,
        raw_fields,
        field_count,
    }))
}

/// Decode raw line bytes and classify them
pub fn decode_line(bytes: &[u8]) -> Result<Telemetry<'_>, TelemetryError> {
    let line = core::str::from_utf8(bytes).map_err(|_| TelemetryError::InvalidEncoding)?;
    parse_line(line)
}
