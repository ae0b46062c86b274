//! Routing packets, carried in frame type [`ROUTING_FRAME_TYPE`].

use std::sync::Arc;

use super::catalog;
use crate::field::{ByteOrder, Field};
use crate::packet::{PacketFamily, PacketKind};

pub const ROUTING_FRAME_TYPE: u8 = 0x55;

pub const ARP_PACKET_TYPE: u8 = 0x30;

pub(super) fn root_kind(base: &Arc<PacketKind>) -> Arc<PacketKind> {
    PacketKind::builder("RoutingPacket")
        .extends(base)
        .frame_type(ROUTING_FRAME_TYPE)
        .build()
        .expect("routing packet kind is well-formed")
}

pub(super) fn arp_kind(root: &Arc<PacketKind>) -> Arc<PacketKind> {
    PacketKind::builder("ArpPacket")
        .extends(root)
        .discriminant(ARP_PACKET_TYPE)
        .field(Field::bytes("destination", 1, 6))
        .field(Field::bytes("source", 7, 6))
        .field(Field::byte("sequence", 13))
        .field(Field::integer("uptime", 14, 4, ByteOrder::Big))
        .field(Field::bytes("lan_address", 20, 4))
        .field(Field::integer("timing", 29, 2, ByteOrder::Big))
        .build()
        .expect("arp packet kind is well-formed")
}

pub fn root() -> &'static Arc<PacketKind> {
    &catalog().routing_root
}

/// Address resolution announcement.
pub fn arp() -> &'static Arc<PacketKind> {
    &catalog().arp
}

pub fn family() -> &'static Arc<PacketFamily> {
    &catalog().routing
}
