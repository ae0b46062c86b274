//! Packets: typed views over a payload buffer.
//!
//! A [`PacketKind`] is declared once with [`PacketKind::builder`] and holds the
//! merged field set of the kind and all of its ancestors together with the
//! precomputed [`Layout`]. A [`Packet`] is a buffer bound to a kind; field
//! access goes through the kind's descriptors by name.

mod family;
mod layout;

use core::fmt;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::PacketError;
use crate::field::{Field, FieldLength, Value};

pub use family::PacketFamily;
pub use layout::{Layout, LayoutEntry, LayoutSlot, SlotRole, FILLER_NAME, TAIL_NAME};

/// Offset of the discriminant byte every kind dispatches on.
pub const DISCRIMINANT_OFFSET: usize = 0;

#[derive(Debug)]
pub struct PacketKind {
    name: Cow<'static, str>,
    parent: Option<Arc<PacketKind>>,
    discriminant: Option<u8>,
    frame_type: Option<u8>,
    fields: Vec<Arc<Field>>,
    index: BTreeMap<String, usize>,
    layout: Layout,
}

impl PacketKind {
    pub fn builder(name: impl Into<Cow<'static, str>>) -> PacketKindBuilder {
        PacketKindBuilder {
            name: name.into(),
            parent: None,
            discriminant: None,
            frame_type: None,
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<&Arc<PacketKind>> {
        self.parent.as_ref()
    }

    /// Leading byte this kind is registered under, if any.
    pub fn discriminant(&self) -> Option<u8> {
        self.discriminant
    }

    /// Frame type this kind travels in, inherited from the nearest ancestor
    /// that declares one.
    pub fn frame_type(&self) -> Option<u8> {
        self.frame_type
    }

    /// Declared fields of this kind and its ancestors, in offset order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().map(AsRef::as_ref)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.index.get(name).map(|&i| self.fields[i].as_ref())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Smallest buffer a packet of this kind accepts.
    pub fn min_len(&self) -> usize {
        self.layout.extent()
    }

    /// This kind followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = &PacketKind> {
        core::iter::successors(Some(self), |kind| kind.parent.as_deref())
    }

    pub fn is_descendant_of(&self, ancestor: &PacketKind) -> bool {
        self.lineage().any(|kind| core::ptr::eq(kind, ancestor))
    }

    fn field_or_err(&self, name: &str) -> Result<&Field, PacketError> {
        self.field(name).ok_or_else(|| PacketError::UnknownField {
            kind: self.name.to_string(),
            name: name.to_string(),
        })
    }
}

pub struct PacketKindBuilder {
    name: Cow<'static, str>,
    parent: Option<Arc<PacketKind>>,
    discriminant: Option<u8>,
    frame_type: Option<u8>,
    fields: Vec<Field>,
}

impl PacketKindBuilder {
    /// Inherit every field of `parent`. Inherited offsets and lengths are fixed.
    pub fn extends(mut self, parent: &Arc<PacketKind>) -> Self {
        self.parent = Some(Arc::clone(parent));
        self
    }

    pub fn discriminant(mut self, discriminant: u8) -> Self {
        self.discriminant = Some(discriminant);
        self
    }

    pub fn frame_type(mut self, frame_type: u8) -> Self {
        self.frame_type = Some(frame_type);
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Merge fields, check them and compute the layout.
    pub fn build(self) -> Result<Arc<PacketKind>, PacketError> {
        let kind = self.name.to_string();
        let mut fields: Vec<Arc<Field>> =
            self.parent.as_ref().map(|parent| parent.fields.clone()).unwrap_or_default();

        for field in self.fields {
            if fields.iter().any(|existing| existing.name() == field.name()) {
                return Err(PacketError::DuplicateField { kind, name: field.name().to_string() });
            }
            check_width(&kind, &field)?;
            fields.push(Arc::new(field));
        }
        fields.sort_by_key(|field| field.offset());

        let layout = Layout::build(&kind, &fields)?;
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, field)| (field.name().to_string(), i))
            .collect();
        let frame_type =
            self.frame_type.or_else(|| self.parent.as_ref().and_then(|p| p.frame_type));

        log::trace!(
            "packet: built kind {} ({} fields, min {} bytes)",
            kind,
            fields.len(),
            layout.extent()
        );

        Ok(Arc::new(PacketKind {
            name: self.name,
            parent: self.parent,
            discriminant: self.discriminant,
            frame_type,
            fields,
            index,
            layout,
        }))
    }
}

fn check_width(kind: &str, field: &Field) -> Result<(), PacketError> {
    let Some(max) = field.conversion().max_width() else {
        return Ok(());
    };
    let reason = match field.length() {
        FieldLength::Open => format!("{} conversion needs a fixed length", field.conversion().kind()),
        FieldLength::Fixed(length) if length == 0 || length > max => format!(
            "{} conversion supports 1..={max} bytes, declared {length}",
            field.conversion().kind()
        ),
        FieldLength::Fixed(_) => return Ok(()),
    };
    Err(PacketError::InvalidField { kind: kind.to_string(), name: field.name().to_string(), reason })
}

/// A payload buffer bound to its packet kind.
#[derive(Debug, Clone)]
pub struct Packet {
    kind: Arc<PacketKind>,
    buffer: Vec<u8>,
}

impl Packet {
    /// Decode through the generic family, see [`crate::packets::generic`].
    pub fn decode(buffer: impl Into<Vec<u8>>) -> Result<Self, PacketError> {
        crate::packets::generic().decode(buffer)
    }

    /// Bind `buffer` to `kind`. Fails if the buffer is shorter than the kind's
    /// fixed fields.
    pub fn new(kind: Arc<PacketKind>, buffer: impl Into<Vec<u8>>) -> Result<Self, PacketError> {
        let buffer = buffer.into();
        if buffer.len() < kind.min_len() {
            return Err(PacketError::TooShort {
                kind: kind.name().to_string(),
                required: kind.min_len(),
                actual: buffer.len(),
            });
        }
        Ok(Self { kind, buffer })
    }

    /// A zero-filled packet of the minimum size with the kind's discriminant in
    /// place, ready for [`Packet::set`].
    pub fn zeroed(kind: &Arc<PacketKind>) -> Self {
        let mut buffer = vec![0u8; kind.min_len()];
        if let Some(discriminant) = kind.discriminant() {
            match buffer.get_mut(DISCRIMINANT_OFFSET) {
                Some(slot) => *slot = discriminant,
                None => buffer.push(discriminant),
            }
        }
        Self { kind: Arc::clone(kind), buffer }
    }

    pub fn kind(&self) -> &PacketKind {
        &self.kind
    }

    pub fn kind_arc(&self) -> &Arc<PacketKind> {
        &self.kind
    }

    /// First byte of the buffer.
    pub fn discriminant(&self) -> Option<u8> {
        self.buffer.get(DISCRIMINANT_OFFSET).copied()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// The encoded packet. No transformation is applied.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn get(&self, name: &str) -> Result<Value, PacketError> {
        Ok(self.kind.field_or_err(name)?.read(&self.buffer)?)
    }

    pub fn get_integer(&self, name: &str) -> Result<u64, PacketError> {
        self.get(name)?.as_integer().ok_or_else(|| self.value_type(name, "an integer"))
    }

    pub fn get_bytes(&self, name: &str) -> Result<Vec<u8>, PacketError> {
        match self.get(name)? {
            Value::Bytes(bytes) => Ok(bytes),
            Value::Integer(_) => Err(self.value_type(name, "bytes")),
        }
    }

    /// Write `value` into the named field. The buffer is untouched on error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), PacketError> {
        let field = self.kind.field_or_err(name)?;
        field.write(&mut self.buffer, &value.into())?;
        Ok(())
    }

    /// Every byte of the buffer, attributed to a declared, filler or tail field.
    pub fn layout(&self) -> Result<Vec<LayoutEntry<'_>>, PacketError> {
        self.kind.layout().entries(&self.buffer)
    }

    fn value_type(&self, name: &str, expected: &'static str) -> PacketError {
        PacketError::ValueType { kind: self.kind.name().to_string(), name: name.to_string(), expected }
    }
}

impl PartialEq for Packet {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.kind, &other.kind) && self.buffer == other.buffer
    }
}

impl Eq for Packet {}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} ({} bytes)]", self.kind.name(), self.buffer.len())
    }
}
