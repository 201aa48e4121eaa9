//! # Thermocycler
//!
//! Runs PCR programs against a Peltier controller on a serial port.
//!
//! ## Usage
//!
//! ```bash
//! # Run the program from a config file
//! thermocycler run --config pcr.toml --port /dev/ttyACM0
//!
//! # Validate a config and print the program
//! thermocycler check --config pcr.toml
//!
//! # List serial ports
//! thermocycler ports
//! ```
//!
//! While a run is active, type `q` and Enter to command the safe
//! temperature and stop.

mod abort;
mod clock;
mod config;
mod reporter;
mod serial;

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use thermocycler_core::{Program, Sequencer, SequencerError};

use crate::clock::SystemClock;
use crate::config::HostConfig;
use crate::reporter::{format_duration, LogReporter};
use crate::serial::SerialChannel;

/// Thermocycler - PCR program runner for Peltier controllers
#[derive(Parser)]
#[command(name = "thermocycler")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program on the controller
    Run {
        /// Configuration file (defaults to the built-in program)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Serial port, overrides [serial] port
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate, overrides [serial] baudrate
        #[arg(short, long)]
        baud: Option<u32>,

        /// Resume at this step (1-based, as printed in progress lines)
        #[arg(long, value_name = "STEP")]
        start_step: Option<usize>,
    },

    /// Validate a configuration and print its program
    Check {
        /// Configuration file (defaults to the built-in program)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// List available serial ports
    Ports,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Progress is reported at info level, so that is the floor
    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Run {
            config,
            port,
            baud,
            start_step,
        } => run_program(config.as_deref(), port, baud, start_step),
        Commands::Check { config } => run_check(config.as_deref()),
        Commands::Ports => run_ports(),
    }
}

fn load_config(path: Option<&Path>) -> Result<HostConfig> {
    match path {
        Some(path) => config::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display())),
        None => Ok(HostConfig::default()),
    }
}

/// Execute a program on the controller
fn run_program(
    config_path: Option<&Path>,
    port: Option<String>,
    baud: Option<u32>,
    start_step: Option<usize>,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(port) = port {
        config.serial.port = Some(port);
    }
    if let Some(baud) = baud {
        config.serial.baudrate = baud;
    }
    config.validate()?;

    let program = config.program()?;
    let mut run_config = config.run_config();
    if let Some(step) = start_step {
        if step == 0 || step > program.len() {
            bail!("--start-step must be between 1 and {}", program.len());
        }
        run_config.start_step = step - 1;
    }

    let port_name = config
        .serial
        .port
        .clone()
        .context("No serial port configured; pass --port or set [serial] port")?;

    for line in program_table(&program) {
        info!("{line}");
    }

    let channel = SerialChannel::open(&port_name, &config.serial.uart(), config.serial.poll_interval())
        .context("Failed to open controller port")?;
    info!("Waiting for controller on {port_name} to answer...");

    let cancel = Arc::new(AtomicBool::new(false));
    abort::spawn_watcher(Arc::clone(&cancel)).context("Failed to start console watcher")?;
    info!("Type 'q' and Enter to abort");

    let mut sequencer = Sequencer::new(channel, SystemClock::new(), LogReporter, run_config);
    match sequencer.run(program.steps(), &cancel) {
        Ok(()) => {
            info!("Program finished");
            Ok(())
        }
        Err(err) => bail!(
            "{}",
            stop_message(&err, sequencer.state().step_index(), program.len())
        ),
    }
}

/// Describe why a run stopped, with a hint when the link to the controller failed
fn stop_message<E: Debug>(err: &SequencerError<E>, step: usize, total: usize) -> String {
    let message = format!("Run stopped in step {}/{}: {:?}", step + 1, total, err);
    if err.is_channel_error() {
        format!(
            "{message}. Check the controller cable and port, then resume with --start-step {}",
            step + 1
        )
    } else {
        message
    }
}

/// Validate a configuration without opening a port
fn run_check(config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let program = config.program()?;

    println!("Configuration OK");
    match &config.serial.port {
        Some(port) => println!("Port: {} @ {} baud", port, config.serial.baudrate),
        None => println!("Port: (not set)"),
    }
    println!("Tolerance: ±{:.2} °C", config.run.tolerance);
    for line in program_table(&program) {
        println!("{line}");
    }

    Ok(())
}

/// List serial ports
fn run_ports() -> Result<()> {
    let ports = serial::available_ports().context("Failed to enumerate serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found");
    }
    for port in ports {
        match port.description {
            Some(description) => println!("{}  {}", port.port_name, description),
            None => println!("{}", port.port_name),
        }
    }

    Ok(())
}

/// One line per step, then the total hold time
fn program_table(program: &Program) -> Vec<String> {
    let mut lines = Vec::with_capacity(program.len() + 2);
    lines.push(format!("{:>5}  {:>8}  {:>10}", "Step", "Target", "Hold"));
    for (index, step) in program.steps().iter().enumerate() {
        lines.push(format!(
            "{:>5}  {:>5.1} °C  {:>10}",
            index + 1,
            step.target_temperature_c(),
            format_duration(step.hold())
        ));
    }
    lines.push(format!(
        "{} steps, at least {} of holding",
        program.len(),
        format_duration(program.total_hold())
    ));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_arguments() {
        let cli = Cli::parse_from([
            "thermocycler",
            "-v",
            "run",
            "--port",
            "/dev/ttyACM0",
            "--start-step",
            "4",
        ]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run {
                port, start_step, ..
            } => {
                assert_eq!(port.as_deref(), Some("/dev/ttyACM0"));
                assert_eq!(start_step, Some(4));
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn test_stop_message_hints_on_link_failure() {
        let err: SequencerError<&str> = SequencerError::ChannelRead("unplugged");
        assert_eq!(
            stop_message(&err, 4, 93),
            "Run stopped in step 5/93: ChannelRead(\"unplugged\"). \
             Check the controller cable and port, then resume with --start-step 5"
        );

        let err: SequencerError<&str> = SequencerError::ChannelTimeout;
        assert!(stop_message(&err, 0, 93).ends_with("--start-step 1"));
    }

    #[test]
    fn test_stop_message_plain_for_other_errors() {
        let err: SequencerError<&str> = SequencerError::Cancelled;
        assert_eq!(stop_message(&err, 2, 93), "Run stopped in step 3/93: Cancelled");

        let err: SequencerError<&str> = SequencerError::OverTemperature;
        assert!(!stop_message(&err, 2, 93).contains("--start-step"));
    }

    #[test]
    fn test_program_table_summary() {
        let program = HostConfig::default().program().unwrap();
        let lines = program_table(&program);

        assert_eq!(lines.len(), program.len() + 2);
        assert!(lines[1].contains("94.0"));
        assert!(lines[1].contains("3m 00s"));
        assert!(lines.last().unwrap().starts_with("93 steps"));
    }
}
