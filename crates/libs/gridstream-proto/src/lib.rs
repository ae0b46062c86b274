//! # gridstream-proto
//!
//! Frame and packet codec for the Gridstream mesh metering protocol.
//!
//! The codec is layered. A [`Frame`] is the wire envelope; it carries a
//! [`Packet`] whose bytes are described field by field with [`Field`]
//! descriptors.
//!
//! ## Frame Wire Format
//!
//! ```text
//! [magic:3][type:1][length:2][payload:length-2][crc16:2]
//!  00 ff 2a  enum   u16 BE     packet bytes      u16 BE over payload
//! ```
//!
//! ## Example
//!
//! ```rust
//! use gridstream_proto::packets::routing;
//! use gridstream_proto::{Frame, FrameOptions, Packet};
//!
//! let mut arp = Packet::zeroed(routing::arp());
//! arp.set("sequence", 7u8).unwrap();
//! arp.set("uptime", 86_400u32).unwrap();
//!
//! let wire = Frame::wrap(&arp).unwrap().encode();
//!
//! let options = FrameOptions { validate_checksum: true, ..FrameOptions::default() };
//! let frame = Frame::decode(&wire, &options).unwrap();
//! let packet = frame.packet().unwrap();
//! assert_eq!(packet.kind().name(), "ArpPacket");
//! assert_eq!(packet.get_integer("uptime").unwrap(), 86_400);
//! ```
//!
//! Decoding never touches I/O: callers hand in complete byte buffers and get
//! back owned values. The only process-wide state is the default CRC seed,
//! see [`crc::set_default_seed`].

pub mod config;
pub mod crc;
pub mod error;
pub mod field;
pub mod frame;
pub mod packet;
pub mod packets;

pub use config::{ChecksumConfig, FrameOptions};
pub use error::{
    ConfigError, ConstructionError, FieldError, FrameError, PacketError, ValidationError,
};
pub use field::{ByteOrder, Conversion, Field, FieldLength, Validator, Value};
pub use frame::{
    Frame, FrameBuilder, FrameKind, FrameRegistry, HexPayload, WireEncode, MAX_PAYLOAD_LEN,
};
pub use packet::{
    LayoutEntry, LayoutSlot, Packet, PacketFamily, PacketKind, PacketKindBuilder, SlotRole,
};

/// Magic bytes opening every frame.
pub const MAGIC: [u8; 3] = [0x00, 0xFF, 0x2A];

/// Bytes preceding the payload: magic (3) + type (1) + length (2).
pub const FRAME_HEADER_SIZE: usize = 6;

/// Trailing checksum size.
pub const CHECKSUM_SIZE: usize = 2;

/// The wire length field counts the payload plus this fixed overhead.
pub const LENGTH_OVERHEAD: usize = 2;
