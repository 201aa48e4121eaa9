//! Thermocycler Hardware Abstraction Layer
//!
//! This crate defines the traits the sequencer needs from the outside
//! world: a line-oriented serial channel to the Peltier controller and a
//! monotonic clock. Host binaries and test harnesses implement them.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  thermocycler-core (step sequencer)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  thermocycler-hal (this crate - traits) │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ serial port   │       │ scripted test │
//! │ (host binary) │       │   channels    │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`uart::LineTx`], [`uart::LineRx`] - Line-oriented serial communication
//! - [`clock::Monotonic`] - Monotonic time source

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod uart;

pub use clock::Monotonic;
pub use uart::{DataBits, ErrorType, LineChannel, LineRx, LineTx, Parity, StopBits, UartConfig};
