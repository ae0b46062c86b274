use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::crc;
use crate::error::ConfigError;

/// Checksum parameters threaded through frame construction and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecksumConfig {
    pub seed: u16,
}

impl ChecksumConfig {
    pub const fn with_seed(seed: u16) -> Self {
        Self { seed }
    }

    pub fn checksum(&self, payload: &[u8]) -> u16 {
        crc::crc16(payload, self.seed)
    }

    /// Make this seed the process-wide default. See [`crc::set_default_seed`].
    pub fn install(self) -> Result<(), ConfigError> {
        crc::set_default_seed(self.seed)
    }
}

impl Default for ChecksumConfig {
    fn default() -> Self {
        Self { seed: crc::default_seed() }
    }
}

/// Switches applied when decoding frames.
///
/// ```toml
/// validate = true
/// validate_checksum = true
///
/// [checksum]
/// seed = 0x1d0f
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FrameOptions {
    /// Check header and declared length.
    pub validate: bool,
    /// Extract the trailing checksum and compare it with the payload CRC.
    pub validate_checksum: bool,
    pub checksum: ChecksumConfig,
}

impl FrameOptions {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Skip header, length and checksum checks entirely.
    pub fn unchecked() -> Self {
        Self { validate: false, validate_checksum: false, ..Self::default() }
    }
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self { validate: true, validate_checksum: false, checksum: ChecksumConfig::default() }
    }
}
