use core::ops::Range;
use std::sync::Arc;

use crate::error::PacketError;
use crate::field::{Field, Value};

/// Name given to synthesized gap fields.
pub const FILLER_NAME: &str = "Unknown";

/// Name given to the open-ended field after the last fixed field.
pub const TAIL_NAME: &str = "tail";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotRole {
    Declared,
    Filler,
    Tail,
}

#[derive(Debug, Clone)]
pub struct LayoutSlot {
    field: Arc<Field>,
    role: SlotRole,
}

impl LayoutSlot {
    pub fn field(&self) -> &Field {
        &self.field
    }

    pub fn role(&self) -> SlotRole {
        self.role
    }
}

/// One row of a decoded packet, for diagnostic dumps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutEntry<'a> {
    pub offset: usize,
    pub name: &'a str,
    pub range: Range<usize>,
    pub bytes: &'a [u8],
    pub value: Value,
    pub role: SlotRole,
}

/// Contiguous field table of a packet kind.
///
/// Built once when the kind is built: declared fixed-length fields in offset
/// order, `Unknown` fillers over gaps, and a `tail` covering whatever follows
/// the last fixed field.
#[derive(Debug, Clone)]
pub struct Layout {
    slots: Vec<LayoutSlot>,
    extent: usize,
}

impl Layout {
    /// `fields` must be sorted by offset.
    pub(crate) fn build(kind: &str, fields: &[Arc<Field>]) -> Result<Self, PacketError> {
        let mut slots = Vec::with_capacity(fields.len() * 2 + 1);
        let mut last = 0usize;
        let mut previous: Option<&Field> = None;

        for field in fields {
            let Some(end) = field.end() else {
                continue;
            };
            if field.offset() < last {
                let previous = previous.map(|p| p.name().to_string()).unwrap_or_default();
                return Err(PacketError::OverlappingFields {
                    kind: kind.to_string(),
                    name: field.name().to_string(),
                    offset: field.offset(),
                    previous,
                    previous_end: last,
                });
            }
            if field.offset() > last {
                slots.push(LayoutSlot {
                    field: Arc::new(Field::bytes(FILLER_NAME, last, field.offset() - last)),
                    role: SlotRole::Filler,
                });
            }
            slots.push(LayoutSlot { field: Arc::clone(field), role: SlotRole::Declared });
            last = end;
            previous = Some(field.as_ref());
        }

        slots.push(LayoutSlot {
            field: Arc::new(Field::open_bytes(TAIL_NAME, last)),
            role: SlotRole::Tail,
        });

        Ok(Self { slots, extent: last })
    }

    pub fn slots(&self) -> &[LayoutSlot] {
        &self.slots
    }

    /// Minimum buffer length: the end of the last fixed field.
    pub fn extent(&self) -> usize {
        self.extent
    }

    pub fn entries<'a>(&'a self, buffer: &'a [u8]) -> Result<Vec<LayoutEntry<'a>>, PacketError> {
        self.slots
            .iter()
            .map(|slot| -> Result<LayoutEntry<'a>, PacketError> {
                let field = slot.field();
                Ok(LayoutEntry {
                    offset: field.offset(),
                    name: field.name(),
                    range: field.range(buffer.len()),
                    bytes: field.slice(buffer)?,
                    value: field.read(buffer)?,
                    role: slot.role,
                })
            })
            .collect()
    }
}
