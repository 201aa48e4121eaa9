//! Thermocycler Serial Protocol
//!
//! This crate defines the text protocol between the host sequencer and the
//! Peltier controller. Both directions are newline-terminated ASCII lines.
//!
//! # Protocol Overview
//!
//! Host → controller, one line per setpoint change:
//! ```text
//! t<temperature>\n          e.g. "t94.0\n"
//! ```
//!
//! Controller → host, one line per message, tab separated:
//! ```text
//! ┌──────┬──────┬──────┬─────────────┬──────┬──────┬──────┬──────┐
//! │ f0   │ f1   │ f2   │ TEMPERATURE │ f4   │ f5   │ f6   │ f7   │
//! └──────┴──────┴──────┴─────────────┴──────┴──────┴──────┴──────┘
//! ```
//! Exactly eight fields make a status line; anything else is a free-form
//! diagnostic message.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod telemetry;

pub use command::{CommandError, SetpointCommand, MAX_COMMAND_LEN, SETPOINT_PREFIX};
pub use telemetry::{
    decode_line, parse_line, parse_line_with, InfoMessage, StatusSample, StatusSchema, Telemetry,
    TelemetryError, STATUS_LINE,
};
