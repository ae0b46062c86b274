use std::collections::BTreeMap;
use std::sync::Arc;

use super::{Packet, PacketKind, DISCRIMINANT_OFFSET};
use crate::error::PacketError;

/// A root packet kind and the subtypes registered under it by discriminant.
#[derive(Debug, Clone)]
pub struct PacketFamily {
    root: Arc<PacketKind>,
    kinds: BTreeMap<u8, Arc<PacketKind>>,
}

impl PacketFamily {
    pub fn new(root: Arc<PacketKind>) -> Self {
        Self { root, kinds: BTreeMap::new() }
    }

    pub fn root(&self) -> &Arc<PacketKind> {
        &self.root
    }

    /// Register `kind` under its discriminant. The kind must descend from the
    /// family root and the discriminant must be free.
    pub fn register(&mut self, kind: Arc<PacketKind>) -> Result<(), PacketError> {
        let Some(discriminant) = kind.discriminant() else {
            return Err(PacketError::MissingDiscriminant { kind: kind.name().to_string() });
        };
        if !kind.is_descendant_of(&self.root) {
            return Err(PacketError::ForeignKind {
                kind: kind.name().to_string(),
                root: self.root.name().to_string(),
            });
        }
        if let Some(existing) = self.kinds.get(&discriminant) {
            return Err(PacketError::DuplicateDiscriminant {
                discriminant,
                existing: existing.name().to_string(),
            });
        }
        log::trace!(
            "packet: registered {} as 0x{:02x} in {} family",
            kind.name(),
            discriminant,
            self.root.name()
        );
        self.kinds.insert(discriminant, kind);
        Ok(())
    }

    pub fn with(mut self, kind: Arc<PacketKind>) -> Result<Self, PacketError> {
        self.register(kind)?;
        Ok(self)
    }

    /// Registered kinds in discriminant order.
    pub fn kinds(&self) -> impl Iterator<Item = (u8, &Arc<PacketKind>)> {
        self.kinds.iter().map(|(discriminant, kind)| (*discriminant, kind))
    }

    /// Kind registered for `discriminant`, or the root.
    pub fn resolve(&self, discriminant: Option<u8>) -> &Arc<PacketKind> {
        match discriminant.and_then(|d| self.kinds.get(&d)) {
            Some(kind) => kind,
            None => {
                if let Some(d) = discriminant {
                    log::debug!(
                        "packet: discriminant 0x{:02x} not registered, decoding as {}",
                        d,
                        self.root.name()
                    );
                }
                &self.root
            }
        }
    }

    /// Peek the discriminant byte and bind the buffer to the most specific
    /// registered kind.
    pub fn decode(&self, buffer: impl Into<Vec<u8>>) -> Result<Packet, PacketError> {
        let buffer = buffer.into();
        let kind = self.resolve(buffer.get(DISCRIMINANT_OFFSET).copied());
        log::trace!("packet: << {} ({} bytes)", kind.name(), buffer.len());
        Packet::new(Arc::clone(kind), buffer)
    }
}
