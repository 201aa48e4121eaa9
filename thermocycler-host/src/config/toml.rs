//! TOML configuration parsing
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyACM0"
//! baudrate = 115200
//! poll_interval_ms = 200
//!
//! [run]
//! tolerance = 1.5
//! handshake_lines = 3
//! safe_temperature = 25.0
//! telemetry_timeout_s = 30
//! max_temperature = 105.0
//!
//! [program]
//! cycles = 30
//! start = { temperatures = [94.0], hold_s = [180] }
//! cycle = { temperatures = [94.0, 48.0, 68.0], hold_s = [30, 30, 45] }
//! end   = { temperatures = [68.0, 10.0], hold_s = [300, 18000] }
//! ```

use super::{ConfigError, HostConfig};

/// Parse and validate a configuration document
pub fn parse_config(input: &str) -> Result<HostConfig, ConfigError> {
    let config: HostConfig = ::toml::from_str(input)?;
    config.validate()?;
    Ok(config)
}
