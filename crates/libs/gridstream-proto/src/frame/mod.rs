//! Frame envelope encode/decode.
//!
//! ```text
//! [magic:3][type:1][length:2][payload:length-2][crc16:2]
//! ```
//!
//! The length field counts the payload plus a fixed two-byte overhead. The
//! checksum covers the payload only and is read and written big-endian.

mod registry;

use core::fmt;
use std::cell::OnceCell;
use std::sync::Arc;

use crate::config::{ChecksumConfig, FrameOptions};
use crate::error::{ConstructionError, FrameError, PacketError, ValidationError};
use crate::packet::Packet;
use crate::{CHECKSUM_SIZE, FRAME_HEADER_SIZE, LENGTH_OVERHEAD, MAGIC};

pub use registry::{FrameKind, FrameRegistry};

/// Largest payload the 16-bit length field can describe.
pub const MAX_PAYLOAD_LEN: usize = u16::MAX as usize - LENGTH_OVERHEAD;

/// Anything that can produce its canonical byte representation.
pub trait WireEncode {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError>;
}

impl WireEncode for [u8] {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        Ok(self.to_vec())
    }
}

impl WireEncode for Vec<u8> {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        Ok(self.clone())
    }
}

impl<const N: usize> WireEncode for [u8; N] {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        Ok(self.to_vec())
    }
}

impl WireEncode for Packet {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        Ok(self.as_bytes().to_vec())
    }
}

impl<T: WireEncode + ?Sized> WireEncode for &T {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        (**self).wire_bytes()
    }
}

/// Hex-encoded payload, e.g. from a capture log. Whitespace is ignored.
#[derive(Debug, Clone, Copy)]
pub struct HexPayload<'a>(pub &'a str);

impl WireEncode for HexPayload<'_> {
    fn wire_bytes(&self) -> Result<Vec<u8>, ConstructionError> {
        let compact: String = self.0.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(hex::decode(compact)?)
    }
}

/// A validated frame envelope around a packet payload.
#[derive(Debug, Clone)]
pub struct Frame {
    kind: Arc<FrameKind>,
    header: [u8; 3],
    frame_type: u8,
    length: usize,
    payload: Vec<u8>,
    checksum: Option<u16>,
    config: ChecksumConfig,
    packet: OnceCell<Packet>,
}

impl Frame {
    /// Start a frame of `frame_type` against the standard registry.
    pub fn builder(frame_type: u8) -> FrameBuilder<'static> {
        FrameRegistry::standard().builder(frame_type)
    }

    /// Frame `packet` in the frame type its kind is bound to, resolved against
    /// the standard registry. Use [`FrameRegistry::wrap`] for extension kinds.
    pub fn wrap(packet: &Packet) -> Result<Self, FrameError> {
        FrameRegistry::standard().wrap(packet)
    }

    /// Decode wire bytes against the standard registry.
    pub fn decode(data: &[u8], options: &FrameOptions) -> Result<Self, FrameError> {
        Self::decode_with(FrameRegistry::standard(), data, options)
    }

    /// Decode a hex-encoded capture against the standard registry.
    pub fn from_hex(input: &str, options: &FrameOptions) -> Result<Self, FrameError> {
        let data = HexPayload(input).wire_bytes()?;
        Self::decode(&data, options)
    }

    fn decode_with(
        registry: &FrameRegistry,
        data: &[u8],
        options: &FrameOptions,
    ) -> Result<Self, FrameError> {
        if data.len() < FRAME_HEADER_SIZE {
            return Err(ConstructionError::Truncated {
                actual: data.len(),
                minimum: FRAME_HEADER_SIZE,
            }
            .into());
        }

        let mut header = [0u8; 3];
        header.copy_from_slice(&data[..3]);
        let frame_type = data[3];
        let wire_length = u16::from_be_bytes([data[4], data[5]]);

        if options.validate {
            check_header(&header)?;
        }

        let declared = match usize::from(wire_length).checked_sub(LENGTH_OVERHEAD) {
            Some(declared) => declared,
            None if options.validate => {
                return Err(ValidationError::WireLength {
                    wire: wire_length,
                    overhead: LENGTH_OVERHEAD,
                }
                .into());
            }
            None => 0,
        };

        let payload_end = (FRAME_HEADER_SIZE + declared).min(data.len());
        let mut frame = Self {
            kind: Arc::clone(registry.resolve(frame_type)),
            header,
            frame_type,
            length: declared,
            payload: data[FRAME_HEADER_SIZE..payload_end].to_vec(),
            checksum: None,
            config: options.checksum,
            packet: OnceCell::new(),
        };

        if options.validate {
            frame.validate_structure()?;
        }

        if options.validate_checksum {
            let offset = FRAME_HEADER_SIZE + declared;
            let bytes = data
                .get(offset..offset + CHECKSUM_SIZE)
                .ok_or(ConstructionError::MissingChecksum { actual: data.len(), offset })?;
            frame.checksum = Some(u16::from_be_bytes([bytes[0], bytes[1]]));
            frame.verify_checksum()?;
        }

        log::trace!("frame: << {frame}");
        Ok(frame)
    }

    pub fn kind(&self) -> &FrameKind {
        &self.kind
    }

    pub fn header(&self) -> [u8; 3] {
        self.header
    }

    pub fn frame_type(&self) -> u8 {
        self.frame_type
    }

    /// Declared payload length.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Checksum supplied at construction or read from the wire.
    pub fn checksum(&self) -> Option<u16> {
        self.checksum
    }

    pub fn checksum_config(&self) -> ChecksumConfig {
        self.config
    }

    /// CRC16 of the payload under this frame's seed.
    pub fn generate_checksum(&self) -> u16 {
        self.config.checksum(&self.payload)
    }

    /// Structural checks followed by the checksum check.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_structure()?;
        self.verify_checksum()
    }

    /// Header and declared length.
    pub fn validate_structure(&self) -> Result<(), ValidationError> {
        check_header(&self.header)?;
        if self.length != self.payload.len() {
            return Err(ValidationError::Length {
                declared: self.length,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    /// Compare the supplied checksum, if any, with the generated one.
    pub fn verify_checksum(&self) -> Result<(), ValidationError> {
        let Some(provided) = self.checksum else {
            return Ok(());
        };
        let computed = self.generate_checksum();
        if provided != computed {
            log::debug!(
                "frame: checksum mismatch on {} (0x{provided:04x} != 0x{computed:04x})",
                self.kind.name()
            );
            return Err(ValidationError::Checksum { provided, computed });
        }
        Ok(())
    }

    /// The enclosed packet, decoded through this frame kind's family on first
    /// access and cached afterwards.
    pub fn packet(&self) -> Result<&Packet, PacketError> {
        if let Some(packet) = self.packet.get() {
            return Ok(packet);
        }
        let packet = self.kind.family().decode(self.payload.as_slice())?;
        Ok(self.packet.get_or_init(|| packet))
    }

    pub fn into_packet(mut self) -> Result<Packet, PacketError> {
        match self.packet.take() {
            Some(packet) => Ok(packet),
            None => self.kind.family().decode(self.payload),
        }
    }

    /// Wire bytes: header, type, length, payload, checksum.
    pub fn encode(&self) -> Vec<u8> {
        let wire_length = u16::try_from(self.payload.len() + LENGTH_OVERHEAD).unwrap_or(u16::MAX);
        let mut out =
            Vec::with_capacity(FRAME_HEADER_SIZE + self.payload.len() + CHECKSUM_SIZE);
        out.extend_from_slice(&self.header);
        out.push(self.frame_type);
        out.extend_from_slice(&wire_length.to_be_bytes());
        out.extend_from_slice(&self.payload);
        out.extend_from_slice(&self.generate_checksum().to_be_bytes());
        out
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.encode())
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} 0x{:02x} ({} bytes)]",
            self.kind.name(),
            self.frame_type,
            self.payload.len()
        )
    }
}

fn check_header(header: &[u8; 3]) -> Result<(), ValidationError> {
    if *header != MAGIC {
        return Err(ValidationError::Header { expected: MAGIC, actual: *header });
    }
    Ok(())
}

fn check_payload_len(len: usize) -> Result<(), ConstructionError> {
    if len > MAX_PAYLOAD_LEN {
        return Err(ConstructionError::PayloadTooLarge { len, max: MAX_PAYLOAD_LEN });
    }
    Ok(())
}

/// Assembles a [`Frame`] from parts. Validation runs in [`FrameBuilder::build`].
#[derive(Debug)]
pub struct FrameBuilder<'r> {
    registry: &'r FrameRegistry,
    header: [u8; 3],
    frame_type: u8,
    length: Option<usize>,
    payload: Option<Result<Vec<u8>, ConstructionError>>,
    checksum: Option<u16>,
    config: ChecksumConfig,
    validate: bool,
    validate_checksum: bool,
}

impl<'r> FrameBuilder<'r> {
    fn new(registry: &'r FrameRegistry, frame_type: u8) -> Self {
        Self {
            registry,
            header: MAGIC,
            frame_type,
            length: None,
            payload: None,
            checksum: None,
            config: ChecksumConfig::default(),
            validate: true,
            validate_checksum: true,
        }
    }

    pub fn header(mut self, header: [u8; 3]) -> Self {
        self.header = header;
        self
    }

    /// Declared payload length. Without a payload the frame carries this many
    /// zero bytes.
    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }

    pub fn payload<P: WireEncode>(mut self, payload: P) -> Self {
        self.payload = Some(payload.wire_bytes());
        self
    }

    /// Checksum to verify against the payload.
    pub fn checksum(mut self, checksum: u16) -> Self {
        self.checksum = Some(checksum);
        self
    }

    pub fn checksum_config(mut self, config: ChecksumConfig) -> Self {
        self.config = config;
        self
    }

    /// Skip header and length checks.
    pub fn skip_validation(mut self) -> Self {
        self.validate = false;
        self
    }

    /// Keep a supplied checksum without verifying it.
    pub fn skip_checksum_validation(mut self) -> Self {
        self.validate_checksum = false;
        self
    }

    pub fn build(self) -> Result<Frame, FrameError> {
        if let Some(length) = self.length {
            check_payload_len(length)?;
        }
        let payload = match self.payload {
            Some(payload) => payload?,
            None => vec![0u8; self.length.unwrap_or(0)],
        };
        check_payload_len(payload.len())?;

        let frame = Frame {
            kind: Arc::clone(self.registry.resolve(self.frame_type)),
            header: self.header,
            frame_type: self.frame_type,
            length: self.length.unwrap_or(payload.len()),
            payload,
            checksum: self.checksum,
            config: self.config,
            packet: OnceCell::new(),
        };

        if self.validate {
            frame.validate_structure()?;
        }
        if self.validate_checksum {
            frame.verify_checksum()?;
        }
        Ok(frame)
    }
}
