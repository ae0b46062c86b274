//! Field descriptors: named byte ranges with typed conversions.
//!
//! A [`Field`] never owns bytes. It knows where its range sits inside a
//! packet buffer and how to turn that range into a [`Value`] and back.
//! Descriptors are declared once per packet kind and shared read-only by
//! every packet of that kind.

use core::fmt;
use core::ops::Range;
use std::borrow::Cow;
use std::sync::Arc;

use crate::error::FieldError;

/// Widest integer a [`Field::integer`] can hold.
pub const MAX_INTEGER_WIDTH: usize = 8;

/// Decoded field content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bytes(Vec<u8>),
    Integer(u64),
}

impl Value {
    pub fn as_integer(&self) -> Option<u64> {
        match self {
            Self::Integer(value) => Some(*value),
            Self::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            Self::Integer(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => write!(f, "0x[{}]", hex::encode(bytes)),
            Self::Integer(value) => write!(f, "{value}"),
        }
    }
}

impl From<u8> for Value {
    fn from(value: u8) -> Self {
        Self::Integer(u64::from(value))
    }
}

impl From<u16> for Value {
    fn from(value: u16) -> Self {
        Self::Integer(u64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Integer(u64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

impl<const N: usize> From<[u8; N]> for Value {
    fn from(bytes: [u8; N]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    Big,
    Little,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldLength {
    Fixed(usize),
    /// Runs to the end of the buffer.
    Open,
}

/// Byte/value conversion used by a field.
///
/// `to_bytes` returns `None` when the value has the wrong shape for this
/// conversion. It may return more or fewer bytes than `width`; the field
/// rejects any length mismatch before touching the buffer.
pub trait Conversion: fmt::Debug + Send + Sync {
    /// Value shape this conversion produces, for error messages.
    fn kind(&self) -> &'static str;

    fn to_value(&self, raw: &[u8]) -> Value;

    fn to_bytes(&self, value: &Value, width: usize) -> Option<Vec<u8>>;

    /// Widest fixed length this conversion supports, `None` if unbounded.
    fn max_width(&self) -> Option<usize> {
        None
    }
}

/// Identity conversion.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawBytes;

impl Conversion for RawBytes {
    fn kind(&self) -> &'static str {
        "bytes"
    }

    fn to_value(&self, raw: &[u8]) -> Value {
        Value::Bytes(raw.to_vec())
    }

    fn to_bytes(&self, value: &Value, _width: usize) -> Option<Vec<u8>> {
        value.as_bytes().map(<[u8]>::to_vec)
    }
}

/// A single byte read as an unsigned integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsignedByte;

impl Conversion for UnsignedByte {
    fn kind(&self) -> &'static str {
        "byte"
    }

    fn to_value(&self, raw: &[u8]) -> Value {
        Value::Integer(raw.first().copied().map(u64::from).unwrap_or_default())
    }

    fn to_bytes(&self, value: &Value, width: usize) -> Option<Vec<u8>> {
        Integer(ByteOrder::Big).to_bytes(value, width)
    }

    fn max_width(&self) -> Option<usize> {
        Some(1)
    }
}

/// Unsigned integer in the given byte order.
#[derive(Debug, Clone, Copy)]
pub struct Integer(pub ByteOrder);

impl Conversion for Integer {
    fn kind(&self) -> &'static str {
        "integer"
    }

    fn to_value(&self, raw: &[u8]) -> Value {
        let fold = |acc: u64, byte: &u8| (acc << 8) | u64::from(*byte);
        let value = match self.0 {
            ByteOrder::Big => raw.iter().fold(0, fold),
            ByteOrder::Little => raw.iter().rev().fold(0, fold),
        };
        Value::Integer(value)
    }

    fn to_bytes(&self, value: &Value, width: usize) -> Option<Vec<u8>> {
        let value = value.as_integer()?;
        // Values too large for the field come back wider than `width`.
        let significant = MAX_INTEGER_WIDTH - (value.leading_zeros() as usize / 8);
        let width = width.max(significant).clamp(1, MAX_INTEGER_WIDTH);
        let bytes = value.to_be_bytes();
        let mut out = bytes[MAX_INTEGER_WIDTH - width..].to_vec();
        if self.0 == ByteOrder::Little {
            out.reverse();
        }
        Some(out)
    }

    fn max_width(&self) -> Option<usize> {
        Some(MAX_INTEGER_WIDTH)
    }
}

/// Named predicate run against a value before it is written.
#[derive(Clone)]
pub struct Validator {
    name: &'static str,
    check: Arc<dyn Fn(&Value) -> bool + Send + Sync>,
}

impl Validator {
    pub fn new<F>(name: &'static str, check: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self { name, check: Arc::new(check) }
    }

    /// Accepts integers up to and including `max`.
    pub fn max_integer(name: &'static str, max: u64) -> Self {
        Self::new(name, move |value| value.as_integer().map_or(true, |v| v <= max))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn accepts(&self, value: &Value) -> bool {
        (self.check)(value)
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Validator").field(&self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct Field {
    name: Cow<'static, str>,
    offset: usize,
    length: FieldLength,
    conversion: Arc<dyn Conversion>,
    validators: Vec<Validator>,
}

impl Field {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        offset: usize,
        length: FieldLength,
        conversion: Arc<dyn Conversion>,
    ) -> Self {
        Self { name: name.into(), offset, length, conversion, validators: Vec::new() }
    }

    /// Raw byte range.
    pub fn bytes(name: impl Into<Cow<'static, str>>, offset: usize, length: usize) -> Self {
        Self::new(name, offset, FieldLength::Fixed(length), Arc::new(RawBytes))
    }

    /// Raw bytes from `offset` to the end of the buffer.
    pub fn open_bytes(name: impl Into<Cow<'static, str>>, offset: usize) -> Self {
        Self::new(name, offset, FieldLength::Open, Arc::new(RawBytes))
    }

    /// One byte as an integer in `0..=255`.
    pub fn byte(name: impl Into<Cow<'static, str>>, offset: usize) -> Self {
        Self::new(name, offset, FieldLength::Fixed(1), Arc::new(UnsignedByte))
            .with_validator(Validator::max_integer("0..=255", u64::from(u8::MAX)))
    }

    /// Unsigned integer of `length` bytes (1 to [`MAX_INTEGER_WIDTH`]).
    pub fn integer(
        name: impl Into<Cow<'static, str>>,
        offset: usize,
        length: usize,
        order: ByteOrder,
    ) -> Self {
        Self::new(name, offset, FieldLength::Fixed(length), Arc::new(Integer(order)))
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn length(&self) -> FieldLength {
        self.length
    }

    /// Exclusive end offset, `None` for open fields.
    pub fn end(&self) -> Option<usize> {
        match self.length {
            FieldLength::Fixed(length) => Some(self.offset + length),
            FieldLength::Open => None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.length == FieldLength::Open
    }

    pub fn conversion(&self) -> &dyn Conversion {
        self.conversion.as_ref()
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    /// Byte range this field covers in a buffer of `len` bytes.
    pub fn range(&self, len: usize) -> Range<usize> {
        self.offset..self.end().unwrap_or(len.max(self.offset))
    }

    pub fn read(&self, buffer: &[u8]) -> Result<Value, FieldError> {
        let raw = self.slice(buffer)?;
        Ok(self.conversion.to_value(raw))
    }

    /// Validate, convert and copy `value` into this field's range of `buffer`.
    pub fn write(&self, buffer: &mut [u8], value: &Value) -> Result<(), FieldError> {
        self.validate(value)?;
        let range = self.checked_range(buffer.len())?;
        let expected = range.len();
        let bytes = self.conversion.to_bytes(value, expected).ok_or_else(|| {
            FieldError::TypeMismatch {
                field: self.name.to_string(),
                expected: self.conversion.kind(),
                value: value.clone(),
            }
        })?;
        if bytes.len() != expected {
            return Err(FieldError::Conversion {
                field: self.name.to_string(),
                expected,
                actual: bytes.len(),
                bytes,
            });
        }
        buffer[range].copy_from_slice(&bytes);
        Ok(())
    }

    pub fn validate(&self, value: &Value) -> Result<(), FieldError> {
        match self.validators.iter().find(|validator| !validator.accepts(value)) {
            Some(validator) => Err(FieldError::Validation {
                field: self.name.to_string(),
                value: value.clone(),
                validator: validator.name(),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn slice<'a>(&self, buffer: &'a [u8]) -> Result<&'a [u8], FieldError> {
        let range = self.checked_range(buffer.len())?;
        Ok(&buffer[range])
    }

    fn checked_range(&self, len: usize) -> Result<Range<usize>, FieldError> {
        let range = self.range(len);
        if range.end > len {
            return Err(FieldError::OutOfBounds {
                field: self.name.to_string(),
                start: range.start,
                end: range.end,
                len,
            });
        }
        Ok(range)
    }
}
