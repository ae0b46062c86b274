use thiserror::Error;

use crate::field::Value;

/// Errors raised by a single [`Field`](crate::Field) read or write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("field `{field}` rejected value {value}: failed validator `{validator}`")]
    Validation { field: String, value: Value, validator: &'static str },

    #[error(
        "field `{field}` expected {expected} bytes, received {actual} bytes [{}] after conversion",
        hex::encode(.bytes)
    )]
    Conversion { field: String, expected: usize, actual: usize, bytes: Vec<u8> },

    #[error("field `{field}` cannot store {value} as {expected}")]
    TypeMismatch { field: String, expected: &'static str, value: Value },

    #[error("field `{field}` spans {start}..{end} but the buffer holds {len} bytes")]
    OutOfBounds { field: String, start: usize, end: usize, len: usize },
}

/// Errors from packet kind declaration, registration and field access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PacketError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("{kind} has no field named `{name}`")]
    UnknownField { kind: String, name: String },

    #[error("{kind}: field `{name}` does not hold {expected}")]
    ValueType { kind: String, name: String, expected: &'static str },

    #[error("{kind} requires at least {required} bytes, buffer holds {actual}")]
    TooShort { kind: String, required: usize, actual: usize },

    #[error("{kind}: field `{name}` is already declared")]
    DuplicateField { kind: String, name: String },

    #[error("{kind}: field `{name}` at offset {offset} overlaps `{previous}` ending at {previous_end}")]
    OverlappingFields {
        kind: String,
        name: String,
        offset: usize,
        previous: String,
        previous_end: usize,
    },

    #[error("{kind}: field `{name}` is invalid: {reason}")]
    InvalidField { kind: String, name: String, reason: String },

    #[error("discriminant 0x{discriminant:02x} is already registered to {existing}")]
    DuplicateDiscriminant { discriminant: u8, existing: String },

    #[error("{kind} declares no discriminant and cannot be registered")]
    MissingDiscriminant { kind: String },

    #[error("{kind} does not descend from family root {root}")]
    ForeignKind { kind: String, root: String },
}

/// Envelope integrity failures. Every variant carries the expected and the
/// observed value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid header: expected {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    Header { expected: [u8; 3], actual: [u8; 3] },

    #[error("provided length ({declared}) does not match length of payload ({actual})")]
    Length { declared: usize, actual: usize },

    #[error("wire length 0x{wire:04x} is smaller than the fixed {overhead}-byte overhead")]
    WireLength { wire: u16, overhead: usize },

    #[error(
        "provided checksum does not match generated checksum (0x{provided:04x} != 0x{computed:04x})"
    )]
    Checksum { provided: u16, computed: u16 },
}

/// The input could not be turned into a frame payload buffer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructionError {
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("payload of {len} bytes exceeds the {max}-byte frame limit")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("frame too short: {actual} bytes (minimum {minimum})")]
    Truncated { actual: usize, minimum: usize },

    #[error("checksum missing: frame holds {actual} bytes, checksum expected at {offset}")]
    MissingChecksum { actual: usize, offset: usize },

    #[error("{kind} is not bound to a frame type")]
    NoFrameType { kind: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FrameError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Construction(#[from] ConstructionError),

    #[error(transparent)]
    Packet(#[from] PacketError),

    #[error("frame type 0x{0:02x} is already registered")]
    DuplicateFrameType(u8),
}

impl From<hex::FromHexError> for FrameError {
    fn from(err: hex::FromHexError) -> Self {
        Self::Construction(ConstructionError::Hex(err))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("default checksum seed is already set to 0x{current:04x}")]
    SeedAlreadySet { current: u16 },
}
