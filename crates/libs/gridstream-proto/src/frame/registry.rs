use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use super::{Frame, FrameBuilder};
use crate::config::FrameOptions;
use crate::error::{ConstructionError, FrameError};
use crate::packet::{Packet, PacketFamily};
use crate::packets::{self, data, routing};

/// A frame subtype: the packet family its payload decodes into.
#[derive(Debug)]
pub struct FrameKind {
    name: &'static str,
    frame_type: Option<u8>,
    family: Arc<PacketFamily>,
}

impl FrameKind {
    pub fn new(name: &'static str, frame_type: Option<u8>, family: Arc<PacketFamily>) -> Self {
        Self { name, frame_type, family }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type byte this kind is registered under; `None` for the generic kind.
    pub fn frame_type(&self) -> Option<u8> {
        self.frame_type
    }

    pub fn family(&self) -> &Arc<PacketFamily> {
        &self.family
    }
}

/// Frame type byte to [`FrameKind`] table.
#[derive(Debug, Clone)]
pub struct FrameRegistry {
    generic: Arc<FrameKind>,
    kinds: BTreeMap<u8, Arc<FrameKind>>,
}

impl FrameRegistry {
    /// An empty registry; unregistered types decode into `generic`.
    pub fn new(generic: Arc<PacketFamily>) -> Self {
        Self { generic: Arc::new(FrameKind::new("Frame", None, generic)), kinds: BTreeMap::new() }
    }

    /// Routing (`0x55`) and data (`0xD5`) frames over the packet catalog.
    pub fn with_standard_kinds() -> Self {
        let mut kinds = BTreeMap::new();
        for (name, frame_type, family) in [
            ("RoutingFrame", routing::ROUTING_FRAME_TYPE, routing::family()),
            ("DataFrame", data::DATA_FRAME_TYPE, data::family()),
        ] {
            kinds.insert(
                frame_type,
                Arc::new(FrameKind::new(name, Some(frame_type), Arc::clone(family))),
            );
        }
        Self { kinds, ..Self::new(Arc::clone(packets::generic())) }
    }

    /// Shared registry holding the standard kinds, built on first use.
    pub fn standard() -> &'static FrameRegistry {
        static STANDARD: OnceLock<FrameRegistry> = OnceLock::new();
        STANDARD.get_or_init(Self::with_standard_kinds)
    }

    pub fn register(
        &mut self,
        name: &'static str,
        frame_type: u8,
        family: Arc<PacketFamily>,
    ) -> Result<(), FrameError> {
        if self.kinds.contains_key(&frame_type) {
            return Err(FrameError::DuplicateFrameType(frame_type));
        }
        log::trace!("frame: registered {name} as 0x{frame_type:02x}");
        self.kinds.insert(frame_type, Arc::new(FrameKind::new(name, Some(frame_type), family)));
        Ok(())
    }

    pub fn generic(&self) -> &Arc<FrameKind> {
        &self.generic
    }

    /// Registered kinds in type order.
    pub fn kinds(&self) -> impl Iterator<Item = &Arc<FrameKind>> {
        self.kinds.values()
    }

    /// Kind registered for `frame_type`, or the generic kind.
    pub fn resolve(&self, frame_type: u8) -> &Arc<FrameKind> {
        self.kinds.get(&frame_type).unwrap_or_else(|| {
            log::debug!("frame: type 0x{frame_type:02x} not registered, using {}", self.generic.name);
            &self.generic
        })
    }

    pub fn builder(&self, frame_type: u8) -> FrameBuilder<'_> {
        FrameBuilder::new(self, frame_type)
    }

    /// Frame `packet` in the frame type its kind is bound to.
    pub fn wrap(&self, packet: &Packet) -> Result<Frame, FrameError> {
        let kind = packet.kind();
        let frame_type = kind
            .frame_type()
            .ok_or_else(|| ConstructionError::NoFrameType { kind: kind.name().to_string() })?;
        self.builder(frame_type).payload(packet).build()
    }

    pub fn decode(&self, data: &[u8], options: &FrameOptions) -> Result<Frame, FrameError> {
        Frame::decode_with(self, data, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{ByteOrder, Field};
    use crate::packet::PacketKind;

    #[test]
    fn standard_kinds_bind_packet_families() {
        let registry = FrameRegistry::standard();
        let routing_kind = registry.resolve(0x55);
        assert_eq!(routing_kind.name(), "RoutingFrame");
        assert!(Arc::ptr_eq(routing_kind.family(), routing::family()));
        let data_kind = registry.resolve(0xD5);
        assert_eq!(data_kind.name(), "DataFrame");
        assert!(Arc::ptr_eq(data_kind.family(), data::family()));
    }

    #[test]
    fn unknown_type_resolves_to_generic() {
        let kind = FrameRegistry::standard().resolve(0x01);
        assert_eq!(kind.name(), "Frame");
        assert_eq!(kind.frame_type(), None);
        assert!(Arc::ptr_eq(kind.family(), packets::generic()));
    }

    #[test]
    fn extension_kinds_register_without_touching_the_standard_set() {
        let root = PacketKind::builder("MeterPacket")
            .extends(packets::base())
            .frame_type(0x51)
            .build()
            .expect("kind");
        let mut registry = FrameRegistry::with_standard_kinds();
        registry.register("MeterFrame", 0x51, Arc::new(PacketFamily::new(root))).expect("register");
        assert_eq!(registry.resolve(0x51).name(), "MeterFrame");
        assert_eq!(FrameRegistry::standard().resolve(0x51).name(), "Frame");
        let types: Vec<_> = registry.kinds().filter_map(|kind| kind.frame_type()).collect();
        assert_eq!(types, vec![0x51, 0x55, 0xD5]);
    }

    #[test]
    fn wrap_uses_extension_kinds() {
        let root = PacketKind::builder("MeterPacket")
            .extends(packets::base())
            .frame_type(0x51)
            .field(Field::integer("reading", 1, 4, ByteOrder::Big))
            .build()
            .expect("kind");
        let mut registry = FrameRegistry::with_standard_kinds();
        registry
            .register("MeterFrame", 0x51, Arc::new(PacketFamily::new(Arc::clone(&root))))
            .expect("register");

        let mut reading = Packet::zeroed(&root);
        reading.set("reading", 1_234u32).expect("reading");
        let frame = registry.wrap(&reading).expect("wrap");
        assert_eq!(frame.kind().name(), "MeterFrame");
        let packet = frame.packet().expect("packet");
        assert!(Arc::ptr_eq(packet.kind_arc(), &root));
        assert_eq!(packet.get_integer("reading"), Ok(1_234));

        // The standard registry does not know 0x51.
        let frame = Frame::wrap(&reading).expect("wrap");
        assert_eq!(frame.kind().name(), "Frame");
    }

    #[test]
    fn duplicate_frame_type_is_rejected() {
        let mut registry = FrameRegistry::with_standard_kinds();
        let err = registry
            .register("Impostor", 0x55, Arc::clone(packets::generic()))
            .expect_err("0x55 taken");
        assert_eq!(err, FrameError::DuplicateFrameType(0x55));
    }
}
