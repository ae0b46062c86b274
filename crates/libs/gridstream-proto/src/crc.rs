//! CRC-16 checksum over frame payloads.
//!
//! # Parameters
//!
//! | Parameter | Value |
//! |-----------|-------|
//! | Polynomial | 0x1021 |
//! | Init | configurable seed, default 0x0000 |
//! | RefIn | false |
//! | RefOut | false |
//! | XorOut | 0x0000 |
//!
//! With the default seed this is CRC-16/XMODEM. A seed of `0xFFFF` yields
//! CRC-16/CCITT-FALSE and `0x1D0F` yields CRC-16/AUG-CCITT.
//!
//! ```
//! use gridstream_proto::crc::crc16;
//!
//! assert_eq!(crc16(b"123456789", 0x0000), 0x31C3);
//! assert_eq!(crc16(b"123456789", 0xFFFF), 0x29B1);
//! ```

use std::sync::OnceLock;

use crate::error::ConfigError;

const POLY: u16 = 0x1021;

/// Seed used until [`set_default_seed`] installs another one.
pub const XMODEM_SEED: u16 = 0x0000;

static DEFAULT_SEED: OnceLock<u16> = OnceLock::new();

const CRC_TABLE: [u16; 256] = {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u16) << 8;
        let mut j = 0;
        while j < 8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// Checksum `data` starting from `seed`.
#[inline]
#[must_use]
pub fn crc16(data: &[u8], seed: u16) -> u16 {
    crc16_update(seed, data)
}

/// Feed more data into a running checksum.
#[inline]
#[must_use]
pub fn crc16_update(crc: u16, data: &[u8]) -> u16 {
    let mut crc = crc;
    for &byte in data {
        let index = ((crc >> 8) ^ u16::from(byte)) as usize;
        crc = (crc << 8) ^ CRC_TABLE[index];
    }
    crc
}

/// The process-wide seed picked up by [`ChecksumConfig::default`](crate::ChecksumConfig).
pub fn default_seed() -> u16 {
    DEFAULT_SEED.get().copied().unwrap_or(XMODEM_SEED)
}

/// Install the process-wide default seed.
///
/// This is the only way to change the default and it succeeds once per
/// process. Call it during startup, before any frames are built. Frames keep
/// the seed they were constructed with.
pub fn set_default_seed(seed: u16) -> Result<(), ConfigError> {
    DEFAULT_SEED.set(seed).map_err(|_| ConfigError::SeedAlreadySet { current: default_seed() })?;
    log::debug!("crc: default seed set to 0x{seed:04x}");
    Ok(())
}
