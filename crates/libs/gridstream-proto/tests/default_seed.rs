//! The default seed is process-wide, so these checks live in their own test
//! binary and run as a single test.

use gridstream_proto::crc::{self, XMODEM_SEED};
use gridstream_proto::{ChecksumConfig, ConfigError, Frame};

#[test]
fn default_seed_is_set_once() {
    assert_eq!(crc::default_seed(), XMODEM_SEED);
    let before = Frame::builder(0x55).payload([0x30, 0x01]).build().expect("frame");
    assert_eq!(before.checksum_config().seed, XMODEM_SEED);

    ChecksumConfig::with_seed(0xFFFF).install().expect("first install");
    assert_eq!(crc::default_seed(), 0xFFFF);
    assert_eq!(ChecksumConfig::default().checksum(b"123456789"), 0x29B1);

    let err = crc::set_default_seed(0x1D0F).expect_err("second install");
    assert!(matches!(err, ConfigError::SeedAlreadySet { current: 0xFFFF }));
    assert_eq!(crc::default_seed(), 0xFFFF);

    // Frames built earlier keep their seed.
    assert_eq!(before.checksum_config().seed, XMODEM_SEED);
    let after = Frame::builder(0x55).payload([0x30, 0x01]).build().expect("frame");
    assert_ne!(before.generate_checksum(), after.generate_checksum());
}
